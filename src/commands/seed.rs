//! Default-folder seeding command.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use docshare_core::config::AppConfig;
use docshare_core::error::AppError;
use docshare_core::types::UserId;
use docshare_service::{Engine, SeedReport, seed_default_folders};

use crate::output::{self, OutputFormat};

/// Arguments for the seed command
#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Owner recorded on created folders (defaults to the nil user)
    #[arg(long)]
    pub owner: Option<UserId>,
}

/// Seed display row
#[derive(Debug, Serialize, Tabled)]
struct SeedRow {
    /// Folder name
    folder: String,
    /// Outcome
    status: &'static str,
}

/// Create every configured default folder that is missing
pub async fn execute(
    args: &SeedArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let pool = super::connect(config).await?;
    let engine = super::engine(&pool, config);
    let report = seed(&engine, config, args.owner).await?;

    let rows: Vec<SeedRow> = report
        .created
        .iter()
        .map(|name| SeedRow {
            folder: name.clone(),
            status: "created",
        })
        .chain(report.existing.iter().map(|name| SeedRow {
            folder: name.clone(),
            status: "exists",
        }))
        .collect();
    output::print_list(&rows, format);

    pool.close().await;
    Ok(())
}

/// Seed with the configured folder list
pub async fn seed(
    engine: &Engine,
    config: &AppConfig,
    owner: Option<UserId>,
) -> Result<SeedReport, AppError> {
    let owner = owner.unwrap_or_else(|| UserId::from_uuid(uuid::Uuid::nil()));
    seed_default_folders(
        engine.folder_store.as_ref(),
        &engine.ledger,
        &config.bootstrap.default_folders,
        owner,
    )
    .await
}
