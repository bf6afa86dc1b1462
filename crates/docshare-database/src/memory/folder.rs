//! In-memory folder store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use docshare_core::error::AppError;
use docshare_core::result::AppResult;
use docshare_core::types::{FolderId, UserId};
use docshare_entity::folder::{AccessControl, Folder, UpdateFolder};

use super::check_revision;
use crate::store::FolderStore;

/// Folders keyed by id, plus an index of live folder names.
#[derive(Debug, Default)]
pub struct MemoryFolderStore {
    folders: DashMap<FolderId, Folder>,
    names: DashMap<String, FolderId>,
}

impl MemoryFolderStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn update_with<F>(&self, id: FolderId, expected_revision: i64, apply: F) -> AppResult<Folder>
    where
        F: FnOnce(&mut Folder),
    {
        let mut folder = self
            .folders
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;
        check_revision("Folder", id, expected_revision, folder.revision)?;
        apply(&mut folder);
        folder.revision += 1;
        folder.updated_at = Utc::now();
        Ok(folder.value().clone())
    }

    fn claim_name(&self, name: &str, id: FolderId) -> AppResult<bool> {
        match self.names.entry(name.to_string()) {
            Entry::Occupied(existing) if *existing.get() == id => Ok(false),
            Entry::Occupied(_) => Err(AppError::conflict(format!(
                "A folder named '{name}' already exists"
            ))),
            Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(true)
            }
        }
    }

    fn release_name(&self, name: &str, id: FolderId) {
        self.names.remove_if(name, |_, owner| *owner == id);
    }
}

#[async_trait]
impl FolderStore for MemoryFolderStore {
    async fn find_by_id(&self, id: FolderId) -> AppResult<Option<Folder>> {
        Ok(self.folders.get(&id).map(|f| f.value().clone()))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Folder>> {
        let Some(id) = self.names.get(name).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self
            .folders
            .get(&id)
            .filter(|f| !f.is_deleted)
            .map(|f| f.value().clone()))
    }

    async fn list(&self, include_deleted: bool) -> AppResult<Vec<Folder>> {
        let mut folders: Vec<Folder> = self
            .folders
            .iter()
            .filter(|f| include_deleted || !f.is_deleted)
            .map(|f| f.value().clone())
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(folders)
    }

    async fn insert(&self, folder: &Folder) -> AppResult<Folder> {
        self.claim_name(&folder.name, folder.id)?;
        self.folders.insert(folder.id, folder.clone());
        Ok(folder.clone())
    }

    async fn update_metadata(
        &self,
        id: FolderId,
        expected_revision: i64,
        changes: &UpdateFolder,
    ) -> AppResult<Folder> {
        let old_name = self
            .folders
            .get(&id)
            .map(|f| f.name.clone())
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;

        let renamed = match &changes.name {
            Some(name) if *name != old_name => Some(name.clone()),
            _ => None,
        };
        if let Some(name) = &renamed {
            self.claim_name(name, id)?;
        }

        let result = self.update_with(id, expected_revision, |folder| {
            if let Some(name) = &renamed {
                folder.name = name.clone();
            }
            if let Some(description) = &changes.description {
                folder.description = description.clone();
            }
        });

        if let Some(name) = &renamed {
            match &result {
                Ok(_) => self.release_name(&old_name, id),
                Err(_) => self.release_name(name, id),
            }
        }
        result
    }

    async fn update_access(
        &self,
        id: FolderId,
        expected_revision: i64,
        access_control: &AccessControl,
        is_public: bool,
    ) -> AppResult<Folder> {
        self.update_with(id, expected_revision, |folder| {
            folder.access_control = access_control.clone();
            folder.is_public = is_public;
        })
    }

    async fn mark_deleted(
        &self,
        id: FolderId,
        expected_revision: i64,
        by: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<Folder> {
        let folder = self.update_with(id, expected_revision, |folder| {
            folder.is_deleted = true;
            folder.deleted_at = Some(at);
            folder.deleted_by = Some(by);
        })?;
        self.release_name(&folder.name, id);
        Ok(folder)
    }

    async fn adjust_aggregates(
        &self,
        id: FolderId,
        file_delta: i64,
        size_delta: i64,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut folder = self
            .folders
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;
        folder.file_count = (folder.file_count + file_delta).max(0);
        folder.total_size = (folder.total_size + size_delta).max(0);
        folder.last_modified = at;
        Ok(())
    }

    async fn set_aggregates(
        &self,
        id: FolderId,
        file_count: i64,
        total_size: i64,
        last_modified: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut folder = self
            .folders
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;
        folder.file_count = file_count;
        folder.total_size = total_size;
        folder.last_modified = last_modified;
        Ok(())
    }
}
