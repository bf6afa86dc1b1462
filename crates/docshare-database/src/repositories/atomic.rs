//! Transactional multi-row writes for PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use docshare_core::error::{AppError, ErrorKind};
use docshare_core::result::AppResult;
use docshare_core::types::UserId;
use docshare_entity::activity::ActivityLogEntry;
use docshare_entity::file::{File, ShareGrant};
use docshare_entity::folder::{AccessControl, Folder};

use super::activity::insert_entry;
use super::file::{FileRepository, sweep_folder_rows, update_sharing_row};
use super::folder::{FolderRepository, update_access_row};
use super::db_error;
use crate::store::{AtomicStore, FolderDeletion};

/// Runs each multi-row write in one transaction.
#[derive(Debug, Clone)]
pub struct PgAtomicStore {
    pool: PgPool,
    folders: FolderRepository,
    files: FileRepository,
}

impl PgAtomicStore {
    /// Create a new transactional store.
    pub fn new(pool: PgPool) -> Self {
        Self {
            folders: FolderRepository::new(pool.clone()),
            files: FileRepository::new(pool.clone()),
            pool,
        }
    }
}

fn ledger_error(entry: &ActivityLogEntry) -> impl FnOnce(sqlx::Error) -> AppError + '_ {
    move |e| {
        AppError::with_source(
            ErrorKind::LedgerWrite,
            format!("Failed to write {} entry", entry.action),
            e,
        )
    }
}

#[async_trait]
impl AtomicStore for PgAtomicStore {
    async fn update_access(
        &self,
        folder: &Folder,
        access_control: &AccessControl,
        is_public: bool,
        entry: &ActivityLogEntry,
    ) -> AppResult<Folder> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let updated = update_access_row(
            &mut *tx,
            folder.id,
            folder.revision,
            access_control,
            is_public,
        )
        .await
        .map_err(db_error("Failed to update folder access"))?;
        let Some(updated) = updated else {
            drop(tx);
            return Err(self.folders.missing_or_stale(folder.id, folder.revision).await);
        };

        insert_entry(&mut *tx, entry)
            .await
            .map_err(ledger_error(entry))?;
        tx.commit().await.map_err(ledger_error(entry))?;
        Ok(updated)
    }

    async fn update_sharing(
        &self,
        file: &File,
        shared_with: &[ShareGrant],
        entry: &ActivityLogEntry,
    ) -> AppResult<File> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let updated = update_sharing_row(&mut *tx, file.id, file.revision, shared_with)
            .await
            .map_err(db_error("Failed to update file sharing"))?;
        let Some(updated) = updated else {
            drop(tx);
            return Err(self.files.missing_or_stale(file.id, file.revision).await);
        };

        insert_entry(&mut *tx, entry)
            .await
            .map_err(ledger_error(entry))?;
        tx.commit().await.map_err(ledger_error(entry))?;
        Ok(updated)
    }

    async fn delete_folder(
        &self,
        folder: &Folder,
        cascade: bool,
        by: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<FolderDeletion> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        // The row lock also holds back file inserts, whose foreign-key check
        // needs a share lock on the folder.
        let current = sqlx::query_as::<_, (i64, bool)>(
            "SELECT revision, is_deleted FROM folders WHERE id = $1 FOR UPDATE",
        )
        .bind(folder.id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to lock folder"))?;
        match current {
            None | Some((_, true)) => {
                return Err(AppError::not_found(format!("Folder {} not found", folder.id)));
            }
            Some((revision, false)) if revision != folder.revision => {
                return Err(AppError::conflict(format!(
                    "Folder {} was modified concurrently (expected revision {}, found {revision})",
                    folder.id, folder.revision
                )));
            }
            Some(_) => {}
        }

        if !cascade {
            let live = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM files WHERE folder_id = $1 AND NOT is_deleted",
            )
            .bind(folder.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("Failed to count folder files"))?;
            if live > 0 {
                return Err(AppError::conflict(format!(
                    "Folder '{}' still contains {live} file(s)",
                    folder.name
                )));
            }
        }

        let files = sweep_folder_rows(&mut *tx, folder.id, by, at)
            .await
            .map_err(db_error("Failed to delete folder files"))?;
        let deleted = sqlx::query_as::<_, Folder>(
            "UPDATE folders SET is_deleted = TRUE, deleted_at = $2, deleted_by = $3, \
             file_count = 0, total_size = 0, revision = revision + 1, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(folder.id)
        .bind(at)
        .bind(by)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to delete folder"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit folder deletion"))?;
        Ok(FolderDeletion {
            folder: deleted,
            files,
        })
    }
}
