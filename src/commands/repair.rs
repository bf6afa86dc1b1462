//! Folder aggregate repair command.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use docshare_core::config::AppConfig;
use docshare_core::error::AppError;
use docshare_core::types::FolderId;
use docshare_service::AggregateReport;

use crate::output::{self, OutputFormat};

/// Arguments for the repair command
#[derive(Debug, Args)]
pub struct RepairArgs {
    /// Only this folder (default: every live folder)
    #[arg(long)]
    pub folder: Option<FolderId>,
}

/// Repair display row
#[derive(Debug, Serialize, Tabled)]
struct RepairRow {
    /// Folder name
    folder: String,
    /// Files before
    files_before: i64,
    /// Files after
    files_after: i64,
    /// Bytes before
    bytes_before: i64,
    /// Bytes after
    bytes_after: i64,
    /// Whether anything changed
    repaired: bool,
}

impl From<&AggregateReport> for RepairRow {
    fn from(r: &AggregateReport) -> Self {
        Self {
            folder: r.folder_name.clone(),
            files_before: r.previous_file_count,
            files_after: r.file_count,
            bytes_before: r.previous_total_size,
            bytes_after: r.total_size,
            repaired: r.changed(),
        }
    }
}

/// Recompute folder aggregates from their live files
pub async fn execute(
    args: &RepairArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let pool = super::connect(config).await?;
    let engine = super::engine(&pool, config);

    let reports = match args.folder {
        Some(id) => vec![engine.aggregates.recompute_aggregates(id).await?],
        None => engine.aggregates.recompute_all().await?,
    };
    let rows: Vec<RepairRow> = reports.iter().map(RepairRow::from).collect();
    output::print_list(&rows, format);

    pool.close().await;
    Ok(())
}
