//! Folder lifecycle: create, rename, delete, list.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use docshare_auth::{DenyReason, Operation};
use docshare_core::error::AppError;
use docshare_core::result::AppResult;
use docshare_core::types::{FolderId, PageRequest, PageResponse, UserId};
use docshare_database::{AtomicStore, FolderStore};
use docshare_entity::Department;
use docshare_entity::activity::{ActivityAction, ActivityDetails, NewActivity};
use docshare_entity::folder::{AccessControl, CreateFolder, Folder, UpdateFolder};

use crate::access::AccessService;
use crate::context::RequestContext;
use crate::ledger::ActivityLedger;

/// Request to create a new folder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    /// Folder name, unique among live folders.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Department label.
    pub department: String,
    /// Public visibility.
    #[serde(default)]
    pub is_public: bool,
    /// Extra departments granted access at creation.
    #[serde(default)]
    pub allowed_departments: Vec<String>,
    /// Users granted access at creation.
    #[serde(default)]
    pub allowed_users: Vec<UserId>,
}

/// Manages folder CRUD operations.
#[derive(Clone)]
pub struct FolderService {
    access: Arc<AccessService>,
    folders: Arc<dyn FolderStore>,
    atomic: Arc<dyn AtomicStore>,
    ledger: Arc<ActivityLedger>,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        access: Arc<AccessService>,
        folders: Arc<dyn FolderStore>,
        atomic: Arc<dyn AtomicStore>,
        ledger: Arc<ActivityLedger>,
    ) -> Self {
        Self {
            access,
            folders,
            atomic,
            ledger,
        }
    }

    /// Creates a folder owned by the caller.
    ///
    /// Administrators may create folders for any department; everyone else
    /// only for their own.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        req: CreateFolderRequest,
    ) -> AppResult<Folder> {
        let department = Department::from_str(&req.department)?;
        let mut access_control = AccessControl::default();
        for label in &req.allowed_departments {
            access_control.allow_department(Department::from_str(label)?);
        }
        for user in &req.allowed_users {
            access_control.allow_user(*user);
        }

        let data = CreateFolder {
            name: req.name.trim().to_string(),
            description: req.description,
            department,
            is_public: req.is_public,
            created_by: ctx.user_id,
            access_control,
        };
        data.validate()
            .map_err(|e| AppError::validation(format!("Invalid folder: {e}")))?;

        let actor = self.access.resolve_actor(ctx.user_id).await?;
        if !actor.is_admin() && actor.department != department {
            return Err(AppError::forbidden(
                DenyReason::InsufficientPrivilege.code(),
            ));
        }

        if self.folders.find_by_name(&data.name).await?.is_some() {
            return Err(AppError::conflict(format!(
                "A folder named '{}' already exists",
                data.name
            )));
        }

        let folder = self.folders.insert(&Folder::from_create(data)).await?;

        let details = ActivityDetails::new()
            .with("department", folder.department.as_str())
            .with("is_public", folder.is_public);
        self.ledger
            .append(
                NewActivity::new(ActivityAction::FolderCreate, ctx.user_id)
                    .folder(folder.id, &folder.name)
                    .details(details),
            )
            .await;

        info!(
            actor_id = %ctx.user_id,
            folder_id = %folder.id,
            name = %folder.name,
            department = %folder.department,
            "Folder created"
        );
        Ok(folder)
    }

    /// Gets a folder the caller may view.
    pub async fn get_folder(&self, ctx: &RequestContext, folder_id: FolderId) -> AppResult<Folder> {
        let granted = self
            .access
            .authorize(ctx, folder_id, None, Operation::View)
            .await?;
        Ok(granted.folder)
    }

    /// Renames a folder or changes its description.
    pub async fn update_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        mut changes: UpdateFolder,
    ) -> AppResult<Folder> {
        if let Some(name) = changes.name.as_mut() {
            *name = name.trim().to_string();
        }
        changes
            .validate()
            .map_err(|e| AppError::validation(format!("Invalid folder update: {e}")))?;

        let granted = self
            .access
            .authorize(ctx, folder_id, None, Operation::Manage)
            .await?;
        let folder = granted.folder;

        if let Some(name) = &changes.name {
            if *name != folder.name && self.folders.find_by_name(name).await?.is_some() {
                return Err(AppError::conflict(format!(
                    "A folder named '{name}' already exists"
                )));
            }
        }

        let updated = self
            .folders
            .update_metadata(folder.id, folder.revision, &changes)
            .await?;

        info!(
            actor_id = %ctx.user_id,
            folder_id = %folder.id,
            name = %updated.name,
            "Folder updated"
        );
        Ok(updated)
    }

    /// Soft-deletes a folder.
    ///
    /// Fails with `Conflict` while the folder still has live files, unless
    /// `cascade` is set, in which case those files are soft-deleted with it.
    /// Files uploaded while the deletion runs are deleted too.
    pub async fn delete_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        cascade: bool,
    ) -> AppResult<Folder> {
        let granted = self
            .access
            .authorize(ctx, folder_id, None, Operation::Delete)
            .await?;
        let folder = granted.folder;

        let deletion = self
            .atomic
            .delete_folder(&folder, cascade, ctx.user_id, Utc::now())
            .await?;

        for file in &deletion.files {
            let details = ActivityDetails::new()
                .with("scope", "file")
                .with("cascade", true)
                .with("size", file.size);
            self.ledger
                .append(
                    NewActivity::new(ActivityAction::Delete, ctx.user_id)
                        .folder(folder.id, &folder.name)
                        .file(file.id, &file.name)
                        .details(details),
                )
                .await;
        }

        let details = ActivityDetails::new()
            .with("scope", "folder")
            .with("cascade", cascade);
        self.ledger
            .append(
                NewActivity::new(ActivityAction::Delete, ctx.user_id)
                    .folder(folder.id, &folder.name)
                    .details(details),
            )
            .await;

        info!(
            actor_id = %ctx.user_id,
            folder_id = %folder.id,
            files = deletion.files.len(),
            "Folder deleted"
        );
        Ok(deletion.folder)
    }

    /// Lists the live folders the caller may view, ordered by name.
    pub async fn list_folders(
        &self,
        ctx: &RequestContext,
        page: PageRequest,
    ) -> AppResult<PageResponse<Folder>> {
        let actor = self.access.resolve_actor(ctx.user_id).await?;
        let evaluator = self.access.evaluator();
        let visible: Vec<Folder> = self
            .folders
            .list(false)
            .await?
            .into_iter()
            .filter(|f| {
                evaluator
                    .decide(&actor, f, None, Operation::View)
                    .is_allowed()
            })
            .collect();
        Ok(page.apply(visible))
    }
}
