//! File repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use sqlx::types::Json;

use docshare_core::error::AppError;
use docshare_core::result::AppResult;
use docshare_core::types::{FileId, FolderId, UserId};
use docshare_entity::file::{DownloadRecord, File, ShareGrant};

use super::db_error;
use crate::store::{ContentUpdate, FileStore};

/// Repository for the `files` table.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) async fn missing_or_stale(&self, id: FileId, expected_revision: i64) -> AppError {
        match sqlx::query_scalar::<_, i64>("SELECT revision FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(Some(actual)) => AppError::conflict(format!(
                "File {id} was modified concurrently (expected revision {expected_revision}, found {actual})"
            )),
            Ok(None) => AppError::not_found(format!("File {id} not found")),
            Err(e) => db_error("Failed to re-read file revision")(e),
        }
    }
}

/// Conditional write of a file's sharing grants.
pub(crate) async fn update_sharing_row<'e, E: PgExecutor<'e>>(
    executor: E,
    id: FileId,
    expected_revision: i64,
    shared_with: &[ShareGrant],
) -> Result<Option<File>, sqlx::Error> {
    sqlx::query_as::<_, File>(
        "UPDATE files SET shared_with = $3, revision = revision + 1 \
         WHERE id = $1 AND revision = $2 RETURNING *",
    )
    .bind(id)
    .bind(expected_revision)
    .bind(Json(shared_with))
    .fetch_optional(executor)
    .await
}

/// Soft-delete every live file of a folder.
pub(crate) async fn sweep_folder_rows<'e, E: PgExecutor<'e>>(
    executor: E,
    folder_id: FolderId,
    by: UserId,
    at: DateTime<Utc>,
) -> Result<Vec<File>, sqlx::Error> {
    let mut swept = sqlx::query_as::<_, File>(
        "UPDATE files SET is_deleted = TRUE, deleted_at = $2, deleted_by = $3, \
         revision = revision + 1 WHERE folder_id = $1 AND NOT is_deleted RETURNING *",
    )
    .bind(folder_id)
    .bind(at)
    .bind(by)
    .fetch_all(executor)
    .await?;
    swept.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at).then(a.id.cmp(&b.id)));
    Ok(swept)
}

#[async_trait]
impl FileStore for FileRepository {
    async fn find_by_id(&self, id: FileId) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find file"))
    }

    async fn list_by_folder(
        &self,
        folder_id: FolderId,
        include_deleted: bool,
    ) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE folder_id = $1 AND ($2 OR NOT is_deleted) \
             ORDER BY uploaded_at ASC, id ASC",
        )
        .bind(folder_id)
        .bind(include_deleted)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list files"))
    }

    async fn insert(&self, file: &File) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "INSERT INTO files (id, folder_id, name, mimetype, size, path, public_id, \
             uploaded_by, uploaded_at, shared_with, downloads, download_log, versions, \
             is_deleted, revision) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, FALSE, $14) \
             RETURNING *",
        )
        .bind(file.id)
        .bind(file.folder_id)
        .bind(&file.name)
        .bind(&file.mimetype)
        .bind(file.size)
        .bind(&file.path)
        .bind(file.public_id.as_deref())
        .bind(file.uploaded_by)
        .bind(file.uploaded_at)
        .bind(Json(&file.shared_with))
        .bind(file.downloads)
        .bind(Json(&file.download_log))
        .bind(Json(&file.versions))
        .bind(file.revision)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to insert file"))
    }

    async fn update_sharing(
        &self,
        id: FileId,
        expected_revision: i64,
        shared_with: &[ShareGrant],
    ) -> AppResult<File> {
        let updated = update_sharing_row(&self.pool, id, expected_revision, shared_with)
            .await
            .map_err(db_error("Failed to update file sharing"))?;

        match updated {
            Some(file) => Ok(file),
            None => Err(self.missing_or_stale(id, expected_revision).await),
        }
    }

    async fn replace_content(
        &self,
        id: FileId,
        expected_revision: i64,
        update: &ContentUpdate,
    ) -> AppResult<File> {
        let updated = sqlx::query_as::<_, File>(
            "UPDATE files SET versions = versions || $3::jsonb, path = $4, public_id = $5, \
             mimetype = $6, size = $7, revision = revision + 1 \
             WHERE id = $1 AND revision = $2 RETURNING *",
        )
        .bind(id)
        .bind(expected_revision)
        .bind(Json(vec![&update.previous]))
        .bind(&update.path)
        .bind(update.public_id.as_deref())
        .bind(&update.mimetype)
        .bind(update.size)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to replace file content"))?;

        match updated {
            Some(file) => Ok(file),
            None => Err(self.missing_or_stale(id, expected_revision).await),
        }
    }

    async fn record_download(&self, id: FileId, record: &DownloadRecord) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET downloads = downloads + 1, \
             download_log = download_log || $2::jsonb WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(Json(vec![record]))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to record download"))?
        .ok_or_else(|| AppError::not_found(format!("File {id} not found")))
    }

    async fn mark_deleted(
        &self,
        id: FileId,
        expected_revision: i64,
        by: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<File> {
        let updated = sqlx::query_as::<_, File>(
            "UPDATE files SET is_deleted = TRUE, deleted_at = $3, deleted_by = $4, \
             revision = revision + 1 WHERE id = $1 AND revision = $2 RETURNING *",
        )
        .bind(id)
        .bind(expected_revision)
        .bind(at)
        .bind(by)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to delete file"))?;

        match updated {
            Some(file) => Ok(file),
            None => Err(self.missing_or_stale(id, expected_revision).await),
        }
    }

    async fn mark_deleted_in_folder(
        &self,
        folder_id: FolderId,
        by: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<Vec<File>> {
        sweep_folder_rows(&self.pool, folder_id, by, at)
            .await
            .map_err(db_error("Failed to delete folder files"))
    }
}
