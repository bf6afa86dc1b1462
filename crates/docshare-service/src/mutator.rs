//! The access-control mutator.
//!
//! This service is the only writer of a folder's allow/deny lists and
//! public flag, and of a file's sharing grants. Each change is made in
//! three steps:
//!
//! 1. re-check the actor's rights against a fresh snapshot
//! 2. validate and stamp the matching ledger entry with
//!    [`ActivityLedger::prepare`]
//! 3. hand the change and the entry to the [`AtomicStore`], which commits
//!    both or neither, conditioned on the snapshot's revision
//!
//! A ledger failure surfaces as `LedgerWrite` and leaves the change
//! unapplied.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use docshare_auth::{DirectoryService, Operation};
use docshare_core::error::AppError;
use docshare_core::result::AppResult;
use docshare_core::types::{FileId, FolderId, UserId};
use docshare_database::AtomicStore;
use docshare_entity::Department;
use docshare_entity::activity::{ActivityAction, ActivityDetails, NewActivity};
use docshare_entity::file::{AccessType, File, Grantee, ShareGrant};
use docshare_entity::folder::{AccessControl, Folder};

use crate::access::AccessService;
use crate::context::RequestContext;
use crate::ledger::ActivityLedger;

/// Departments and users to add to or remove from a folder's allow lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessGrantRequest {
    /// Department labels, e.g. `"Finance"` or `"HR & Admin"`.
    #[serde(default)]
    pub departments: Vec<String>,
    /// Individual users.
    #[serde(default)]
    pub users: Vec<UserId>,
}

impl AccessGrantRequest {
    /// A request naming departments only.
    pub fn departments<I, S>(departments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            departments: departments.into_iter().map(Into::into).collect(),
            users: Vec::new(),
        }
    }

    /// A request naming users only.
    pub fn users(users: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            departments: Vec::new(),
            users: users.into_iter().collect(),
        }
    }

    fn parse_departments(&self) -> AppResult<Vec<Department>> {
        if self.departments.is_empty() && self.users.is_empty() {
            return Err(AppError::validation(
                "Access request names no departments or users",
            ));
        }
        self.departments
            .iter()
            .map(|d| Department::from_str(d))
            .collect()
    }

    fn scope(&self) -> &'static str {
        match (self.departments.is_empty(), self.users.is_empty()) {
            (false, true) => "department",
            (true, false) => "user",
            _ => "mixed",
        }
    }
}

/// Applies and audits access-control changes.
#[derive(Clone)]
pub struct AccessControlService {
    access: Arc<AccessService>,
    directory: Arc<dyn DirectoryService>,
    atomic: Arc<dyn AtomicStore>,
    ledger: Arc<ActivityLedger>,
}

impl AccessControlService {
    /// Creates a new access-control service.
    pub fn new(
        access: Arc<AccessService>,
        directory: Arc<dyn DirectoryService>,
        atomic: Arc<dyn AtomicStore>,
        ledger: Arc<ActivityLedger>,
    ) -> Self {
        Self {
            access,
            directory,
            atomic,
            ledger,
        }
    }

    /// Add departments and users to the folder's allow lists.
    ///
    /// A granted user who was on the deny list is taken off it.
    pub async fn grant_access(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        req: AccessGrantRequest,
    ) -> AppResult<Folder> {
        let departments = req.parse_departments()?;
        let granted = self
            .access
            .authorize(ctx, folder_id, None, Operation::Manage)
            .await?;
        let folder = granted.folder;

        let mut acl = folder.access_control.clone();
        let mut unblocked = false;
        for department in &departments {
            acl.allow_department(*department);
        }
        for user in &req.users {
            unblocked |= acl.allow_user(*user);
        }
        if acl == folder.access_control {
            return Ok(folder);
        }

        let mut details = grantee_details(&departments, &req.users).with("scope", req.scope());
        if unblocked {
            details.insert("unblocked", true);
        }
        let event = NewActivity::new(ActivityAction::AccessGranted, ctx.user_id)
            .folder(folder.id, &folder.name)
            .details(details);

        let updated = self
            .commit_folder(&folder, acl, folder.is_public, event)
            .await?;
        info!(
            actor_id = %ctx.user_id,
            folder_id = %folder.id,
            departments = departments.len(),
            users = req.users.len(),
            "Folder access granted"
        );
        Ok(updated)
    }

    /// Remove departments and users from the folder's allow lists.
    ///
    /// File-level sharing grants are left untouched.
    pub async fn revoke_access(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        req: AccessGrantRequest,
    ) -> AppResult<Folder> {
        let departments = req.parse_departments()?;
        let granted = self
            .access
            .authorize(ctx, folder_id, None, Operation::Manage)
            .await?;
        let folder = granted.folder;

        let mut acl = folder.access_control.clone();
        for department in &departments {
            acl.revoke_department(department);
        }
        for user in &req.users {
            acl.revoke_user(user);
        }
        if acl == folder.access_control {
            return Ok(folder);
        }

        let details = grantee_details(&departments, &req.users).with("scope", req.scope());
        let event = NewActivity::new(ActivityAction::AccessRevoked, ctx.user_id)
            .folder(folder.id, &folder.name)
            .details(details);

        let updated = self
            .commit_folder(&folder, acl, folder.is_public, event)
            .await?;
        info!(
            actor_id = %ctx.user_id,
            folder_id = %folder.id,
            "Folder access revoked"
        );
        Ok(updated)
    }

    /// Put a user on the folder's deny list, dropping any allow grant.
    ///
    /// Administrators cannot be blocked, and neither can the folder's creator
    /// unless the actor is an administrator.
    pub async fn block_user(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        target: UserId,
    ) -> AppResult<Folder> {
        let granted = self
            .access
            .authorize(ctx, folder_id, None, Operation::Block(target))
            .await?;
        let folder = granted.folder;

        let target_actor = self.directory.resolve_actor(target).await?;
        if target_actor.is_admin() {
            return Err(AppError::validation("Administrators cannot be blocked"));
        }

        let mut acl = folder.access_control.clone();
        if acl.is_denied(&target) {
            return Ok(folder);
        }
        acl.deny_user(target);

        let details = ActivityDetails::new()
            .with("scope", "user")
            .with("target_user_id", target.to_string())
            .with("blocked", true);
        let event = NewActivity::new(ActivityAction::AccessRevoked, ctx.user_id)
            .folder(folder.id, &folder.name)
            .details(details);

        let updated = self
            .commit_folder(&folder, acl, folder.is_public, event)
            .await?;
        info!(
            actor_id = %ctx.user_id,
            folder_id = %folder.id,
            target_id = %target,
            "User blocked from folder"
        );
        Ok(updated)
    }

    /// Take a user off the folder's deny list. Does not restore any grant
    /// the block removed.
    pub async fn unblock_user(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        target: UserId,
    ) -> AppResult<Folder> {
        let granted = self
            .access
            .authorize(ctx, folder_id, None, Operation::Manage)
            .await?;
        let folder = granted.folder;

        let mut acl = folder.access_control.clone();
        if !acl.undeny_user(&target) {
            return Ok(folder);
        }

        let details = ActivityDetails::new()
            .with("scope", "user")
            .with("target_user_id", target.to_string())
            .with("unblocked", true);
        let event = NewActivity::new(ActivityAction::AccessGranted, ctx.user_id)
            .folder(folder.id, &folder.name)
            .details(details);

        let updated = self
            .commit_folder(&folder, acl, folder.is_public, event)
            .await?;
        info!(
            actor_id = %ctx.user_id,
            folder_id = %folder.id,
            target_id = %target,
            "User unblocked"
        );
        Ok(updated)
    }

    /// Make the folder visible to everyone, or take that back.
    pub async fn set_public(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        is_public: bool,
    ) -> AppResult<Folder> {
        let granted = self
            .access
            .authorize(ctx, folder_id, None, Operation::Manage)
            .await?;
        let folder = granted.folder;
        if folder.is_public == is_public {
            return Ok(folder);
        }

        let action = if is_public {
            ActivityAction::AccessGranted
        } else {
            ActivityAction::AccessRevoked
        };
        let details = ActivityDetails::new()
            .with("scope", "public")
            .with("is_public", is_public);
        let event = NewActivity::new(action, ctx.user_id)
            .folder(folder.id, &folder.name)
            .details(details);

        let acl = folder.access_control.clone();
        let updated = self.commit_folder(&folder, acl, is_public, event).await?;
        info!(
            actor_id = %ctx.user_id,
            folder_id = %folder.id,
            is_public,
            "Folder visibility changed"
        );
        Ok(updated)
    }

    /// Share a file with a user or department, or change an existing
    /// grant's access type.
    pub async fn share_file(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        file_id: FileId,
        grantee: Grantee,
        access_type: AccessType,
    ) -> AppResult<File> {
        let granted = self
            .access
            .authorize(ctx, folder_id, Some(file_id), Operation::Manage)
            .await?;
        let (folder, file) = (granted.folder, require_file(granted.file, file_id)?);

        let previous = file.grant_for(&grantee).map(|g| g.access_type);
        if previous == Some(access_type) {
            return Ok(file);
        }

        let grant = ShareGrant {
            grantee,
            access_type,
            shared_at: Utc::now(),
            shared_by: ctx.user_id,
        };
        let mut grants = file.shared_with.clone();
        match grants.iter_mut().find(|g| g.grantee == grantee) {
            Some(existing) => *existing = grant,
            None => grants.push(grant),
        }

        let mut details = ActivityDetails::new()
            .with("grantee", grantee.to_string())
            .with("access_type", access_type.as_str());
        if let Some(previous) = previous {
            details.insert("previous_access_type", previous.as_str());
        }
        let event = NewActivity::new(ActivityAction::Share, ctx.user_id)
            .folder(folder.id, &folder.name)
            .file(file.id, &file.name)
            .details(details);

        let updated = self.commit_sharing(&file, grants, event).await?;
        info!(
            actor_id = %ctx.user_id,
            file_id = %file.id,
            grantee = %grantee,
            access_type = %access_type,
            "File shared"
        );
        Ok(updated)
    }

    /// Remove a grantee's sharing grant from a file.
    pub async fn unshare_file(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        file_id: FileId,
        grantee: Grantee,
    ) -> AppResult<File> {
        let granted = self
            .access
            .authorize(ctx, folder_id, Some(file_id), Operation::Manage)
            .await?;
        let (folder, file) = (granted.folder, require_file(granted.file, file_id)?);

        let Some(previous) = file.grant_for(&grantee).map(|g| g.access_type) else {
            return Ok(file);
        };
        let grants: Vec<ShareGrant> = file
            .shared_with
            .iter()
            .filter(|g| g.grantee != grantee)
            .cloned()
            .collect();

        let details = ActivityDetails::new()
            .with("scope", "share")
            .with("grantee", grantee.to_string())
            .with("access_type", previous.as_str());
        let event = NewActivity::new(ActivityAction::AccessRevoked, ctx.user_id)
            .folder(folder.id, &folder.name)
            .file(file.id, &file.name)
            .details(details);

        let updated = self.commit_sharing(&file, grants, event).await?;
        info!(
            actor_id = %ctx.user_id,
            file_id = %file.id,
            grantee = %grantee,
            "File unshared"
        );
        Ok(updated)
    }

    async fn commit_folder(
        &self,
        folder: &Folder,
        acl: AccessControl,
        is_public: bool,
        event: NewActivity,
    ) -> AppResult<Folder> {
        let entry = self.ledger.prepare(event)?;
        let updated = self
            .atomic
            .update_access(folder, &acl, is_public, &entry)
            .await?;
        debug!(entry_id = %entry.id, action = %entry.action, "Activity recorded");
        Ok(updated)
    }

    async fn commit_sharing(
        &self,
        file: &File,
        grants: Vec<ShareGrant>,
        event: NewActivity,
    ) -> AppResult<File> {
        let entry = self.ledger.prepare(event)?;
        let updated = self.atomic.update_sharing(file, &grants, &entry).await?;
        debug!(entry_id = %entry.id, action = %entry.action, "Activity recorded");
        Ok(updated)
    }
}

fn require_file(file: Option<File>, file_id: FileId) -> AppResult<File> {
    file.ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))
}

fn grantee_details(departments: &[Department], users: &[UserId]) -> ActivityDetails {
    let mut details = ActivityDetails::new();
    if !departments.is_empty() {
        let labels: Vec<&str> = departments.iter().map(|d| d.as_str()).collect();
        details.insert("department", labels.join(","));
    }
    if !users.is_empty() {
        let ids: Vec<String> = users.iter().map(|u| u.to_string()).collect();
        details.insert("target_user_id", ids.join(","));
    }
    details
}
