//! The access boundary: `can_*` checks and the folder access listing.
//!
//! Every check resolves the actor through the directory and loads a fresh
//! folder snapshot before consulting the evaluator. Store reads are bounded
//! by the configured I/O timeout; any failure on the way to a decision,
//! including a timeout, answers `false`.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use docshare_auth::{Decision, DirectoryService, Operation, PolicyEvaluator};
use docshare_core::error::AppError;
use docshare_core::result::AppResult;
use docshare_core::types::{FileId, FolderId, UserId};
use docshare_database::{FileStore, FolderStore};
use docshare_entity::Department;
use docshare_entity::activity::NewActivity;
use docshare_entity::file::{File, ShareGrant};
use docshare_entity::folder::Folder;
use docshare_entity::user::Actor;

use crate::context::RequestContext;
use crate::ledger::ActivityLedger;

/// The actor and resources an allowed decision was made against.
#[derive(Debug, Clone)]
pub struct Authorized {
    /// The resolved actor.
    pub actor: Actor,
    /// The folder snapshot the decision used.
    pub folder: Folder,
    /// The file snapshot the decision used, if any.
    pub file: Option<File>,
}

/// Read-only projection of a folder's access settings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListing {
    /// The folder.
    pub folder_id: FolderId,
    /// The folder's current name.
    pub folder_name: String,
    /// Public visibility.
    pub is_public: bool,
    /// Departments granted access.
    pub allowed_departments: BTreeSet<Department>,
    /// Users granted access.
    pub allowed_users: BTreeSet<UserId>,
    /// Users whose access is revoked.
    pub denied_users: BTreeSet<UserId>,
    /// Live files carrying at least one sharing grant.
    pub shared_files: Vec<SharedFileSummary>,
}

/// A shared file in an [`AccessListing`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedFileSummary {
    /// The file.
    pub file_id: FileId,
    /// The file's name.
    pub file_name: String,
    /// Its sharing grants.
    pub shared_with: Vec<ShareGrant>,
}

/// Answers authorization questions about folders and files.
#[derive(Clone)]
pub struct AccessService {
    directory: Arc<dyn DirectoryService>,
    folders: Arc<dyn FolderStore>,
    files: Arc<dyn FileStore>,
    ledger: Arc<ActivityLedger>,
    evaluator: PolicyEvaluator,
    io_timeout: Duration,
}

impl AccessService {
    /// Creates a new access service.
    pub fn new(
        directory: Arc<dyn DirectoryService>,
        folders: Arc<dyn FolderStore>,
        files: Arc<dyn FileStore>,
        ledger: Arc<ActivityLedger>,
        io_timeout: Duration,
    ) -> Self {
        Self {
            directory,
            folders,
            files,
            ledger,
            evaluator: PolicyEvaluator::new(),
            io_timeout,
        }
    }

    /// The evaluator used for every decision.
    pub fn evaluator(&self) -> &PolicyEvaluator {
        &self.evaluator
    }

    /// May the user see the folder, or the given file in it?
    pub async fn can_view(&self, user: UserId, folder_id: FolderId, file_id: Option<FileId>) -> bool {
        self.allowed(user, folder_id, file_id, Operation::View).await
    }

    /// May the user add files to the folder?
    pub async fn can_upload(&self, user: UserId, folder_id: FolderId) -> bool {
        self.allowed(user, folder_id, None, Operation::Upload).await
    }

    /// May the user change the folder's settings and sharing?
    pub async fn can_manage(&self, user: UserId, folder_id: FolderId) -> bool {
        self.allowed(user, folder_id, None, Operation::Manage).await
    }

    /// May the user delete the folder or its files?
    pub async fn can_delete(&self, user: UserId, folder_id: FolderId) -> bool {
        self.allowed(user, folder_id, None, Operation::Delete).await
    }

    /// May the user put `target` on the folder's deny list?
    pub async fn can_block(&self, user: UserId, folder_id: FolderId, target: UserId) -> bool {
        self.allowed(user, folder_id, None, Operation::Block(target))
            .await
    }

    /// The decision for one operation, as data.
    ///
    /// Fails with `NotFound` for an unknown user or a missing or deleted
    /// folder or file, and with `Timeout` if the reads exceed the deadline.
    pub async fn check(
        &self,
        user: UserId,
        folder_id: FolderId,
        file_id: Option<FileId>,
        operation: Operation,
    ) -> AppResult<Decision> {
        let (actor, folder, file) = self.load(user, folder_id, file_id).await?;
        Ok(self
            .evaluator
            .decide(&actor, &folder, file.as_ref(), operation))
    }

    /// Resolve and load, then require an allowed decision.
    ///
    /// A denial becomes an `Authorization` error carrying only the reason
    /// code.
    pub async fn authorize(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        file_id: Option<FileId>,
        operation: Operation,
    ) -> AppResult<Authorized> {
        let (actor, folder, file) = self.load(ctx.user_id, folder_id, file_id).await?;
        let decision = self
            .evaluator
            .decide(&actor, &folder, file.as_ref(), operation);
        self.finish(actor, folder, file, operation, decision)
    }

    /// Like [`Self::authorize`] for fetching a file's bytes.
    pub async fn authorize_download(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        file_id: FileId,
    ) -> AppResult<Authorized> {
        let (actor, folder, file) = self.load(ctx.user_id, folder_id, Some(file_id)).await?;
        let file = file.ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))?;
        let decision = self.evaluator.decide_download(&actor, &folder, &file);
        self.finish(actor, folder, Some(file), Operation::View, decision)
    }

    /// Like [`Self::authorize`] for replacing a file's content.
    pub async fn authorize_replace(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        file_id: FileId,
    ) -> AppResult<Authorized> {
        let (actor, folder, file) = self.load(ctx.user_id, folder_id, Some(file_id)).await?;
        let file = file.ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))?;
        let decision = self.evaluator.decide_replace(&actor, &folder, &file);
        self.finish(actor, folder, Some(file), Operation::Upload, decision)
    }

    /// The folder's allow/deny lists and shared files.
    ///
    /// Requires manage rights, so the deny list is never shown to someone
    /// checking their own access.
    pub async fn list_access(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
    ) -> AppResult<AccessListing> {
        let granted = self
            .authorize(ctx, folder_id, None, Operation::Manage)
            .await?;
        let folder = granted.folder;

        let files = self
            .bounded(self.files.list_by_folder(folder.id, false))
            .await?;
        let shared_files = files
            .into_iter()
            .filter(|f| !f.shared_with.is_empty())
            .map(|f| SharedFileSummary {
                file_id: f.id,
                file_name: f.name,
                shared_with: f.shared_with,
            })
            .collect();

        Ok(AccessListing {
            folder_id: folder.id,
            folder_name: folder.name,
            is_public: folder.is_public,
            allowed_departments: folder.access_control.allowed_departments,
            allowed_users: folder.access_control.allowed_users,
            denied_users: folder.access_control.denied_users,
            shared_files,
        })
    }

    /// Record a routine event after the caller's action succeeded.
    ///
    /// Never fails; a lost entry is reported on the operational channel.
    pub async fn record(&self, event: NewActivity) {
        self.ledger.append(event).await;
    }

    /// Resolve a user through the directory within the I/O deadline.
    pub async fn resolve_actor(&self, user: UserId) -> AppResult<Actor> {
        self.bounded(self.directory.resolve_actor(user)).await
    }

    /// Load a live folder within the I/O deadline.
    pub async fn live_folder(&self, folder_id: FolderId) -> AppResult<Folder> {
        match self.bounded(self.folders.find_by_id(folder_id)).await? {
            Some(folder) if !folder.is_deleted => Ok(folder),
            _ => Err(AppError::not_found(format!("Folder {folder_id} not found"))),
        }
    }

    /// Load a live file of the given folder within the I/O deadline.
    pub async fn live_file(&self, folder_id: FolderId, file_id: FileId) -> AppResult<File> {
        match self.bounded(self.files.find_by_id(file_id)).await? {
            Some(file) if !file.is_deleted && file.folder_id == folder_id => Ok(file),
            _ => Err(AppError::not_found(format!("File {file_id} not found"))),
        }
    }

    async fn allowed(
        &self,
        user: UserId,
        folder_id: FolderId,
        file_id: Option<FileId>,
        operation: Operation,
    ) -> bool {
        match self.check(user, folder_id, file_id, operation).await {
            Ok(decision) => decision.is_allowed(),
            Err(e) => {
                debug!(
                    actor_id = %user,
                    folder_id = %folder_id,
                    operation = %operation,
                    error = %e,
                    "Access check failed closed"
                );
                false
            }
        }
    }

    async fn load(
        &self,
        user: UserId,
        folder_id: FolderId,
        file_id: Option<FileId>,
    ) -> AppResult<(Actor, Folder, Option<File>)> {
        let actor = self.resolve_actor(user).await?;
        let folder = self.live_folder(folder_id).await?;
        let file = match file_id {
            Some(id) => Some(self.live_file(folder_id, id).await?),
            None => None,
        };
        Ok((actor, folder, file))
    }

    fn finish(
        &self,
        actor: Actor,
        folder: Folder,
        file: Option<File>,
        operation: Operation,
        decision: Decision,
    ) -> AppResult<Authorized> {
        if let Decision::Deny(reason) = decision {
            debug!(
                actor_id = %actor.id,
                folder_id = %folder.id,
                operation = %operation,
                reason = reason.code(),
                "Access denied"
            );
        }
        decision.require()?;
        Ok(Authorized {
            actor,
            folder,
            file,
        })
    }

    async fn bounded<T>(&self, fut: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        tokio::time::timeout(self.io_timeout, fut)
            .await
            .map_err(|_| AppError::timeout("Store read exceeded the access deadline"))?
    }
}
