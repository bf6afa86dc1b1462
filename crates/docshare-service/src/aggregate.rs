//! Rebuilds cached folder aggregates from a scan of live files.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use docshare_core::error::AppError;
use docshare_core::result::AppResult;
use docshare_core::types::FolderId;
use docshare_database::{FileStore, FolderStore};
use docshare_entity::folder::Folder;

/// Result of recomputing one folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateReport {
    /// The folder.
    pub folder_id: FolderId,
    /// The folder's name.
    pub folder_name: String,
    /// Cached file count before the repair.
    pub previous_file_count: i64,
    /// Cached total size before the repair.
    pub previous_total_size: i64,
    /// Recomputed file count.
    pub file_count: i64,
    /// Recomputed total size.
    pub total_size: i64,
}

impl AggregateReport {
    /// Whether the cached values were wrong.
    pub fn changed(&self) -> bool {
        self.previous_file_count != self.file_count || self.previous_total_size != self.total_size
    }
}

/// Recomputes `file_count`, `total_size` and `last_modified`.
#[derive(Clone)]
pub struct AggregateService {
    folders: Arc<dyn FolderStore>,
    files: Arc<dyn FileStore>,
}

impl AggregateService {
    /// Creates a new aggregate service.
    pub fn new(folders: Arc<dyn FolderStore>, files: Arc<dyn FileStore>) -> Self {
        Self { folders, files }
    }

    /// Recompute one folder's aggregates.
    pub async fn recompute_aggregates(&self, folder_id: FolderId) -> AppResult<AggregateReport> {
        let folder = self
            .folders
            .find_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;
        self.recompute(&folder).await
    }

    /// Recompute every live folder.
    pub async fn recompute_all(&self) -> AppResult<Vec<AggregateReport>> {
        let mut reports = Vec::new();
        for folder in self.folders.list(false).await? {
            reports.push(self.recompute(&folder).await?);
        }
        let repaired = reports.iter().filter(|r| r.changed()).count();
        info!(
            folders = reports.len(),
            repaired, "Folder aggregates recomputed"
        );
        Ok(reports)
    }

    async fn recompute(&self, folder: &Folder) -> AppResult<AggregateReport> {
        let files = self.files.list_by_folder(folder.id, false).await?;
        let file_count = files.len() as i64;
        let total_size = files.iter().map(|f| f.size).sum();
        let last_modified = files
            .iter()
            .map(|f| f.uploaded_at)
            .max()
            .map_or(folder.last_modified, |latest| latest.max(folder.last_modified));

        self.folders
            .set_aggregates(folder.id, file_count, total_size, last_modified)
            .await?;

        let report = AggregateReport {
            folder_id: folder.id,
            folder_name: folder.name.clone(),
            previous_file_count: folder.file_count,
            previous_total_size: folder.total_size,
            file_count,
            total_size,
        };
        if report.changed() {
            info!(
                folder_id = %folder.id,
                file_count,
                total_size,
                "Repaired folder aggregates"
            );
        }
        Ok(report)
    }
}
