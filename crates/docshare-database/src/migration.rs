//! Schema migrations for the PostgreSQL backend.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use docshare_core::error::{AppError, ErrorKind};
use docshare_core::result::AppResult;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Schema version after a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaVersion {
    /// Number of migrations bundled into the binary.
    pub known: usize,
    /// Highest bundled migration version.
    pub latest: Option<i64>,
}

/// Apply every pending migration for the folder, file, user and activity tables.
pub async fn run_migrations(pool: &PgPool) -> AppResult<SchemaVersion> {
    let version = SchemaVersion {
        known: MIGRATOR.iter().count(),
        latest: MIGRATOR.iter().map(|m| m.version).max(),
    };
    info!(known = version.known, "Applying schema migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Schema migration failed: {e}"),
            e,
        )
    })?;

    info!(latest = ?version.latest, "Schema is up to date");
    Ok(version)
}
