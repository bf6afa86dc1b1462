//! Activity log repository implementation.

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};
use sqlx::types::Json;

use docshare_core::result::AppResult;
use docshare_entity::activity::{ActivityCursor, ActivityFilter, ActivityLogEntry};

use super::db_error;
use crate::store::ActivityStore;

/// Repository for the `activity_log` table. Insert and select only.
#[derive(Debug, Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    /// Create a new activity repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Insert one ledger row.
pub(crate) async fn insert_entry<'e, E: PgExecutor<'e>>(
    executor: E,
    entry: &ActivityLogEntry,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO activity_log (id, action, user_id, file_id, folder_id, file_name, \
         folder_name, details, \"timestamp\") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(entry.id)
    .bind(entry.action)
    .bind(entry.user_id)
    .bind(entry.file_id)
    .bind(entry.folder_id)
    .bind(entry.file_name.as_deref())
    .bind(entry.folder_name.as_deref())
    .bind(Json(&entry.details))
    .bind(entry.timestamp)
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl ActivityStore for ActivityRepository {
    async fn append(&self, entry: &ActivityLogEntry) -> AppResult<()> {
        insert_entry(&self.pool, entry)
            .await
            .map_err(db_error("Failed to append activity entry"))
    }

    async fn page(
        &self,
        filter: &ActivityFilter,
        after: Option<ActivityCursor>,
        limit: u32,
    ) -> AppResult<Vec<ActivityLogEntry>> {
        sqlx::query_as::<_, ActivityLogEntry>(
            "SELECT * FROM activity_log \
             WHERE ($1::uuid IS NULL OR folder_id = $1) \
               AND ($2::uuid IS NULL OR file_id = $2) \
               AND ($3::uuid IS NULL OR user_id = $3) \
               AND ($4::activity_action IS NULL OR action = $4) \
               AND ($5::timestamptz IS NULL OR \"timestamp\" >= $5) \
               AND ($6::timestamptz IS NULL OR \"timestamp\" < $6) \
               AND ($7::timestamptz IS NULL OR (\"timestamp\", id) > ($7, $8)) \
             ORDER BY \"timestamp\" ASC, id ASC LIMIT $9",
        )
        .bind(filter.folder_id)
        .bind(filter.file_id)
        .bind(filter.user_id)
        .bind(filter.action)
        .bind(filter.from)
        .bind(filter.until)
        .bind(after.map(|c| c.timestamp))
        .bind(after.map(|c| c.id))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to query activity log"))
    }
}
