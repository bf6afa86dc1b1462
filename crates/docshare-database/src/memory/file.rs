//! In-memory file store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use docshare_core::error::AppError;
use docshare_core::result::AppResult;
use docshare_core::types::{FileId, FolderId, UserId};
use docshare_entity::file::{DownloadRecord, File, ShareGrant};

use super::check_revision;
use crate::store::{ContentUpdate, FileStore};

/// Files keyed by id.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    files: DashMap<FileId, File>,
}

impl MemoryFileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn update_with<F>(&self, id: FileId, expected_revision: Option<i64>, apply: F) -> AppResult<File>
    where
        F: FnOnce(&mut File),
    {
        let mut file = self
            .files
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;
        if let Some(expected) = expected_revision {
            check_revision("File", id, expected, file.revision)?;
            file.revision += 1;
        }
        apply(&mut file);
        Ok(file.value().clone())
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn find_by_id(&self, id: FileId) -> AppResult<Option<File>> {
        Ok(self.files.get(&id).map(|f| f.value().clone()))
    }

    async fn list_by_folder(
        &self,
        folder_id: FolderId,
        include_deleted: bool,
    ) -> AppResult<Vec<File>> {
        let mut files: Vec<File> = self
            .files
            .iter()
            .filter(|f| f.folder_id == folder_id && (include_deleted || !f.is_deleted))
            .map(|f| f.value().clone())
            .collect();
        files.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at).then(a.id.cmp(&b.id)));
        Ok(files)
    }

    async fn insert(&self, file: &File) -> AppResult<File> {
        if self.files.contains_key(&file.id) {
            return Err(AppError::conflict(format!("File {} already exists", file.id)));
        }
        self.files.insert(file.id, file.clone());
        Ok(file.clone())
    }

    async fn update_sharing(
        &self,
        id: FileId,
        expected_revision: i64,
        shared_with: &[ShareGrant],
    ) -> AppResult<File> {
        self.update_with(id, Some(expected_revision), |file| {
            file.shared_with = shared_with.to_vec();
        })
    }

    async fn replace_content(
        &self,
        id: FileId,
        expected_revision: i64,
        update: &ContentUpdate,
    ) -> AppResult<File> {
        self.update_with(id, Some(expected_revision), |file| {
            file.versions.push(update.previous.clone());
            file.path = update.path.clone();
            file.public_id = update.public_id.clone();
            file.mimetype = update.mimetype.clone();
            file.size = update.size;
        })
    }

    async fn record_download(&self, id: FileId, record: &DownloadRecord) -> AppResult<File> {
        self.update_with(id, None, |file| {
            file.downloads += 1;
            file.download_log.push(record.clone());
        })
    }

    async fn mark_deleted(
        &self,
        id: FileId,
        expected_revision: i64,
        by: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<File> {
        self.update_with(id, Some(expected_revision), |file| {
            file.is_deleted = true;
            file.deleted_at = Some(at);
            file.deleted_by = Some(by);
        })
    }

    async fn mark_deleted_in_folder(
        &self,
        folder_id: FolderId,
        by: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<Vec<File>> {
        let mut swept = Vec::new();
        for mut file in self.files.iter_mut() {
            if file.folder_id == folder_id && !file.is_deleted {
                file.is_deleted = true;
                file.deleted_at = Some(at);
                file.deleted_by = Some(by);
                file.revision += 1;
                swept.push(file.value().clone());
            }
        }
        swept.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at).then(a.id.cmp(&b.id)));
        Ok(swept)
    }
}
