//! Activity ledger query command.

use chrono::{DateTime, Utc};
use clap::Args;
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;
use tabled::Tabled;

use docshare_core::config::AppConfig;
use docshare_core::error::AppError;
use docshare_core::types::{FileId, FolderId, UserId};
use docshare_entity::activity::{ActivityAction, ActivityFilter, ActivityLogEntry};

use crate::output::{self, OutputFormat};

/// Arguments for the audit command
#[derive(Debug, Args)]
pub struct AuditArgs {
    /// Filter by folder
    #[arg(long)]
    pub folder: Option<FolderId>,
    /// Filter by file
    #[arg(long)]
    pub file: Option<FileId>,
    /// Filter by actor
    #[arg(long)]
    pub user: Option<UserId>,
    /// Filter by action, e.g. `access_granted`
    #[arg(short, long)]
    pub action: Option<ActivityAction>,
    /// Inclusive lower bound (RFC 3339)
    #[arg(long)]
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound (RFC 3339)
    #[arg(long)]
    pub until: Option<DateTime<Utc>>,
    /// Maximum number of entries
    #[arg(short, long, default_value = "100")]
    pub limit: usize,
}

/// Audit display row
#[derive(Debug, Serialize, Tabled)]
struct AuditRow {
    /// Time
    time: String,
    /// Action
    action: String,
    /// Actor ID
    actor: String,
    /// Folder name at the time
    folder: String,
    /// File name at the time
    file: String,
    /// Details
    details: String,
}

impl From<&ActivityLogEntry> for AuditRow {
    fn from(e: &ActivityLogEntry) -> Self {
        Self {
            time: e.timestamp.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            action: e.action.to_string(),
            actor: e.user_id.to_string(),
            folder: e.folder_name.clone().unwrap_or_default(),
            file: e.file_name.clone().unwrap_or_default(),
            details: e
                .details
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Stream matching ledger entries in time order
pub async fn execute(
    args: &AuditArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let pool = super::connect(config).await?;
    let engine = super::engine(&pool, config);

    let filter = ActivityFilter {
        folder_id: args.folder,
        file_id: args.file,
        user_id: args.user,
        action: args.action,
        from: args.from,
        until: args.until,
    };
    let entries: Vec<ActivityLogEntry> = engine
        .ledger
        .query(filter)
        .take(args.limit)
        .try_collect()
        .await?;

    match format {
        OutputFormat::Json => output::print_json(&entries),
        OutputFormat::Table => {
            let rows: Vec<AuditRow> = entries.iter().map(AuditRow::from).collect();
            output::print_list(&rows, format);
        }
    }

    pool.close().await;
    Ok(())
}
