//! PostgreSQL connection pool management.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use docshare_core::config::DatabaseConfig;
use docshare_core::error::{AppError, ErrorKind};

use crate::repositories::{
    ActivityRepository, FileRepository, FolderRepository, PgAtomicStore, UserRepository,
};

/// Wrapper around the sqlx PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

/// The PostgreSQL-backed repositories sharing one pool.
#[derive(Debug, Clone)]
pub struct PgRepositories {
    /// Folder store.
    pub folders: Arc<FolderRepository>,
    /// File store.
    pub files: Arc<FileRepository>,
    /// Activity ledger store.
    pub activity: Arc<ActivityRepository>,
    /// Directory lookups.
    pub users: Arc<UserRepository>,
    /// Transactional multi-row writes.
    pub atomic: Arc<PgAtomicStore>,
}

impl DatabasePool {
    /// Connect using the pool settings from configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            url = %mask_password(&config.url),
            max_connections = config.max_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to connect to database: {e}"),
                    e,
                )
            })?;

        Ok(Self { pool })
    }

    /// Return a reference to the underlying sqlx pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Build every repository over this pool.
    pub fn repositories(&self) -> PgRepositories {
        PgRepositories {
            folders: Arc::new(FolderRepository::new(self.pool.clone())),
            files: Arc::new(FileRepository::new(self.pool.clone())),
            activity: Arc::new(ActivityRepository::new(self.pool.clone())),
            users: Arc::new(UserRepository::new(self.pool.clone())),
            atomic: Arc::new(PgAtomicStore::new(self.pool.clone())),
        }
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

/// Mask the password portion of a database URL for safe logging.
fn mask_password(url: &str) -> String {
    let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
    match url.rfind('@') {
        Some(at) if at > scheme_end => match url[scheme_end..at].find(':') {
            Some(colon) => format!("{}:****{}", &url[..scheme_end + colon], &url[at..]),
            None => url.to_string(),
        },
        _ => url.to_string(),
    }
}
