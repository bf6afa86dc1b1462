//! CLI command definitions and dispatch.

pub mod access;
pub mod audit;
pub mod migrate;
pub mod repair;
pub mod seed;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use docshare_auth::PgDirectory;
use docshare_core::config::AppConfig;
use docshare_core::error::AppError;
use docshare_database::DatabasePool;
use docshare_service::Engine;

use crate::output::OutputFormat;

/// DocShare folder access and audit administration
#[derive(Debug, Parser)]
#[command(name = "docshare-admin", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding `default.toml` and environment overlays
    #[arg(short, long, default_value = "config")]
    pub config_dir: String,

    /// Environment overlay to load (`config/<env>.toml`)
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate(migrate::MigrateArgs),
    /// Create the configured default folders if missing
    Seed(seed::SeedArgs),
    /// Query the activity ledger
    Audit(audit::AuditArgs),
    /// Show a folder's allow/deny lists and shared files
    Access(access::AccessArgs),
    /// Recompute cached folder aggregates
    Repair(repair::RepairArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, config).await,
            Commands::Seed(args) => seed::execute(args, config, self.format).await,
            Commands::Audit(args) => audit::execute(args, config, self.format).await,
            Commands::Access(args) => access::execute(args, config, self.format).await,
            Commands::Repair(args) => repair::execute(args, config, self.format).await,
        }
    }
}

/// Helper: connect to the configured database
pub async fn connect(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(config.require_database()?).await
}

/// Helper: build the services over PostgreSQL
pub fn engine(pool: &DatabasePool, config: &AppConfig) -> Engine {
    let repos = pool.repositories();
    Engine::with_atomic_store(
        Arc::new(PgDirectory::new(repos.users)),
        repos.folders,
        repos.files,
        repos.activity,
        repos.atomic,
        &config.access,
    )
}
