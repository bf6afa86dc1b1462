//! Folder repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use sqlx::types::Json;

use docshare_core::error::AppError;
use docshare_core::result::AppResult;
use docshare_core::types::{FolderId, UserId};
use docshare_entity::folder::{AccessControl, Folder, UpdateFolder};

use super::{db_error, unique_or_db_error};
use crate::store::FolderStore;

/// Repository for the `folders` table.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Turn an empty conditional update into `NotFound` or `Conflict`.
    pub(crate) async fn missing_or_stale(&self, id: FolderId, expected_revision: i64) -> AppError {
        match sqlx::query_scalar::<_, i64>("SELECT revision FROM folders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(Some(actual)) => AppError::conflict(format!(
                "Folder {id} was modified concurrently (expected revision {expected_revision}, found {actual})"
            )),
            Ok(None) => AppError::not_found(format!("Folder {id} not found")),
            Err(e) => db_error("Failed to re-read folder revision")(e),
        }
    }
}

/// Conditional write of the allow/deny lists and public flag.
pub(crate) async fn update_access_row<'e, E: PgExecutor<'e>>(
    executor: E,
    id: FolderId,
    expected_revision: i64,
    access_control: &AccessControl,
    is_public: bool,
) -> Result<Option<Folder>, sqlx::Error> {
    sqlx::query_as::<_, Folder>(
        "UPDATE folders SET access_control = $3, is_public = $4, \
         revision = revision + 1, updated_at = NOW() \
         WHERE id = $1 AND revision = $2 RETURNING *",
    )
    .bind(id)
    .bind(expected_revision)
    .bind(Json(access_control))
    .bind(is_public)
    .fetch_optional(executor)
    .await
}

#[async_trait]
impl FolderStore for FolderRepository {
    async fn find_by_id(&self, id: FolderId) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find folder"))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE name = $1 AND NOT is_deleted")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find folder by name"))
    }

    async fn list(&self, include_deleted: bool) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE $1 OR NOT is_deleted ORDER BY name ASC",
        )
        .bind(include_deleted)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list folders"))
    }

    async fn insert(&self, folder: &Folder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (id, name, description, department, is_public, created_by, \
             access_control, file_count, total_size, last_modified, is_deleted, revision, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE, $11, $12, $13) RETURNING *",
        )
        .bind(folder.id)
        .bind(&folder.name)
        .bind(&folder.description)
        .bind(folder.department)
        .bind(folder.is_public)
        .bind(folder.created_by)
        .bind(Json(&folder.access_control))
        .bind(folder.file_count)
        .bind(folder.total_size)
        .bind(folder.last_modified)
        .bind(folder.revision)
        .bind(folder.created_at)
        .bind(folder.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unique_or_db_error(
            "Failed to insert folder",
            format!("A folder named '{}' already exists", folder.name),
        ))
    }

    async fn update_metadata(
        &self,
        id: FolderId,
        expected_revision: i64,
        changes: &UpdateFolder,
    ) -> AppResult<Folder> {
        let updated = sqlx::query_as::<_, Folder>(
            "UPDATE folders SET name = COALESCE($3, name), \
             description = COALESCE($4, description), \
             revision = revision + 1, updated_at = NOW() \
             WHERE id = $1 AND revision = $2 RETURNING *",
        )
        .bind(id)
        .bind(expected_revision)
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(unique_or_db_error(
            "Failed to update folder",
            format!(
                "A folder named '{}' already exists",
                changes.name.as_deref().unwrap_or_default()
            ),
        ))?;

        match updated {
            Some(folder) => Ok(folder),
            None => Err(self.missing_or_stale(id, expected_revision).await),
        }
    }

    async fn update_access(
        &self,
        id: FolderId,
        expected_revision: i64,
        access_control: &AccessControl,
        is_public: bool,
    ) -> AppResult<Folder> {
        let updated =
            update_access_row(&self.pool, id, expected_revision, access_control, is_public)
                .await
                .map_err(db_error("Failed to update folder access"))?;

        match updated {
            Some(folder) => Ok(folder),
            None => Err(self.missing_or_stale(id, expected_revision).await),
        }
    }

    async fn mark_deleted(
        &self,
        id: FolderId,
        expected_revision: i64,
        by: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<Folder> {
        let updated = sqlx::query_as::<_, Folder>(
            "UPDATE folders SET is_deleted = TRUE, deleted_at = $3, deleted_by = $4, \
             revision = revision + 1, updated_at = NOW() \
             WHERE id = $1 AND revision = $2 RETURNING *",
        )
        .bind(id)
        .bind(expected_revision)
        .bind(at)
        .bind(by)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to delete folder"))?;

        match updated {
            Some(folder) => Ok(folder),
            None => Err(self.missing_or_stale(id, expected_revision).await),
        }
    }

    async fn adjust_aggregates(
        &self,
        id: FolderId,
        file_delta: i64,
        size_delta: i64,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE folders SET file_count = GREATEST(file_count + $2, 0), \
             total_size = GREATEST(total_size + $3, 0), last_modified = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(file_delta)
        .bind(size_delta)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to adjust folder aggregates"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Folder {id} not found")));
        }
        Ok(())
    }

    async fn set_aggregates(
        &self,
        id: FolderId,
        file_count: i64,
        total_size: i64,
        last_modified: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE folders SET file_count = $2, total_size = $3, last_modified = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(file_count)
        .bind(total_size)
        .bind(last_modified)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to set folder aggregates"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Folder {id} not found")));
        }
        Ok(())
    }
}
