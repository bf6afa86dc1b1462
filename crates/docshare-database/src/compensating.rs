//! [`AtomicStore`] over independent stores.
//!
//! Without a shared transaction, an access or sharing change is applied
//! first and the ledger entry appended second. If the append fails, this
//! change alone is reversed against a fresh read of the row, so edits that
//! other writers made in between survive. The reversal retries on
//! `Conflict`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{error, warn};

use docshare_core::error::{AppError, ErrorKind};
use docshare_core::result::AppResult;
use docshare_core::types::UserId;
use docshare_entity::activity::ActivityLogEntry;
use docshare_entity::file::{File, ShareGrant};
use docshare_entity::folder::{AccessControl, Folder};

use crate::store::{ActivityStore, AtomicStore, FileStore, FolderDeletion, FolderStore};

const RESTORE_ATTEMPTS: usize = 8;

/// Apply-then-append writes with compensation on ledger failure.
#[derive(Clone)]
pub struct CompensatingStore {
    folders: Arc<dyn FolderStore>,
    files: Arc<dyn FileStore>,
    activity: Arc<dyn ActivityStore>,
    append_timeout: Duration,
}

impl CompensatingStore {
    /// Creates a store that gives each ledger append `append_timeout`.
    pub fn new(
        folders: Arc<dyn FolderStore>,
        files: Arc<dyn FileStore>,
        activity: Arc<dyn ActivityStore>,
        append_timeout: Duration,
    ) -> Self {
        Self {
            folders,
            files,
            activity,
            append_timeout,
        }
    }

    async fn append(&self, entry: &ActivityLogEntry) -> AppResult<()> {
        match tokio::time::timeout(self.append_timeout, self.activity.append(entry)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(AppError::with_source(
                ErrorKind::LedgerWrite,
                format!("Failed to write {} entry", entry.action),
                e,
            )),
            Err(_) => Err(AppError::ledger_write(format!(
                "Timed out writing {} entry",
                entry.action
            ))),
        }
    }

    async fn restore_access(&self, before: &Folder, applied: &AccessControl, applied_public: bool) {
        for _ in 0..RESTORE_ATTEMPTS {
            let current = match self.folders.find_by_id(before.id).await {
                Ok(Some(folder)) => folder,
                Ok(None) => return,
                Err(e) => {
                    error!(folder_id = %before.id, error = %e, "Failed to reload folder for restore");
                    return;
                }
            };

            let mut acl = current.access_control.clone();
            acl.revert(&before.access_control, applied);
            let is_public = if before.is_public != applied_public && current.is_public == applied_public {
                before.is_public
            } else {
                current.is_public
            };
            if acl == current.access_control && is_public == current.is_public {
                return;
            }

            match self
                .folders
                .update_access(current.id, current.revision, &acl, is_public)
                .await
            {
                Ok(_) => {
                    warn!(folder_id = %before.id, "Folder access restored after ledger failure");
                    return;
                }
                Err(e) if e.is(ErrorKind::Conflict) => continue,
                Err(e) => {
                    error!(folder_id = %before.id, error = %e, "Failed to restore folder access");
                    return;
                }
            }
        }
        error!(
            folder_id = %before.id,
            attempts = RESTORE_ATTEMPTS,
            "Gave up restoring folder access after repeated conflicts"
        );
    }

    async fn restore_sharing(&self, before: &File, applied: &[ShareGrant]) {
        for _ in 0..RESTORE_ATTEMPTS {
            let current = match self.files.find_by_id(before.id).await {
                Ok(Some(file)) => file,
                Ok(None) => return,
                Err(e) => {
                    error!(file_id = %before.id, error = %e, "Failed to reload file for restore");
                    return;
                }
            };

            let grants = revert_grants(&current.shared_with, &before.shared_with, applied);
            if grants == current.shared_with {
                return;
            }

            match self
                .files
                .update_sharing(current.id, current.revision, &grants)
                .await
            {
                Ok(_) => {
                    warn!(file_id = %before.id, "File sharing restored after ledger failure");
                    return;
                }
                Err(e) if e.is(ErrorKind::Conflict) => continue,
                Err(e) => {
                    error!(file_id = %before.id, error = %e, "Failed to restore file sharing");
                    return;
                }
            }
        }
        error!(
            file_id = %before.id,
            attempts = RESTORE_ATTEMPTS,
            "Gave up restoring file sharing after repeated conflicts"
        );
    }
}

/// Put back the grants that changed between `before` and `applied`, unless
/// another writer has since replaced them.
fn revert_grants(current: &[ShareGrant], before: &[ShareGrant], applied: &[ShareGrant]) -> Vec<ShareGrant> {
    let mut grants = current.to_vec();
    let grantees = before.iter().chain(applied).map(|g| g.grantee);
    for grantee in grantees {
        let was = before.iter().find(|g| g.grantee == grantee);
        let now = applied.iter().find(|g| g.grantee == grantee);
        if was == now {
            continue;
        }
        let slot = grants.iter().position(|g| g.grantee == grantee);
        if slot.map(|i| &grants[i]) != now {
            continue;
        }
        match (slot, was) {
            (Some(i), Some(grant)) => grants[i] = grant.clone(),
            (Some(i), None) => {
                grants.remove(i);
            }
            (None, Some(grant)) => grants.push(grant.clone()),
            (None, None) => {}
        }
    }
    grants
}

#[async_trait]
impl AtomicStore for CompensatingStore {
    async fn update_access(
        &self,
        folder: &Folder,
        access_control: &AccessControl,
        is_public: bool,
        entry: &ActivityLogEntry,
    ) -> AppResult<Folder> {
        let updated = self
            .folders
            .update_access(folder.id, folder.revision, access_control, is_public)
            .await?;

        if let Err(e) = self.append(entry).await {
            self.restore_access(folder, access_control, is_public).await;
            return Err(e);
        }
        Ok(updated)
    }

    async fn update_sharing(
        &self,
        file: &File,
        shared_with: &[ShareGrant],
        entry: &ActivityLogEntry,
    ) -> AppResult<File> {
        let updated = self
            .files
            .update_sharing(file.id, file.revision, shared_with)
            .await?;

        if let Err(e) = self.append(entry).await {
            self.restore_sharing(file, shared_with).await;
            return Err(e);
        }
        Ok(updated)
    }

    async fn delete_folder(
        &self,
        folder: &Folder,
        cascade: bool,
        by: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<FolderDeletion> {
        if !cascade {
            let live = self.files.list_by_folder(folder.id, false).await?;
            if !live.is_empty() {
                return Err(AppError::conflict(format!(
                    "Folder '{}' still contains {} file(s)",
                    folder.name,
                    live.len()
                )));
            }
        }

        // Deleted first, so uploads that re-check the folder see it gone.
        let mut deleted = self
            .folders
            .mark_deleted(folder.id, folder.revision, by, at)
            .await?;
        let files = self
            .files
            .mark_deleted_in_folder(folder.id, by, at)
            .await
            .inspect_err(|e| {
                error!(folder_id = %folder.id, error = %e, "Folder deleted but its files were not swept");
            })?;

        if !files.is_empty() {
            match self.folders.set_aggregates(folder.id, 0, 0, at).await {
                Ok(()) => {
                    deleted.file_count = 0;
                    deleted.total_size = 0;
                    deleted.last_modified = at;
                }
                Err(e) => warn!(folder_id = %folder.id, error = %e, "Failed to reset folder aggregates"),
            }
        }
        Ok(FolderDeletion {
            folder: deleted,
            files,
        })
    }
}
