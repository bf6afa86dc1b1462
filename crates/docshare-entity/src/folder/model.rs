//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use docshare_core::types::{FolderId, UserId};

use super::access::AccessControl;
use crate::department::Department;

/// A shared document folder.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// Folder name, unique among live folders.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// The department that owns the folder.
    pub department: Department,
    /// When true every authenticated user may view.
    pub is_public: bool,
    /// The creator. Never changes.
    pub created_by: UserId,
    /// Explicit allow and deny lists.
    #[sqlx(json)]
    pub access_control: AccessControl,
    /// Number of non-deleted files (advisory).
    pub file_count: i64,
    /// Total size in bytes of non-deleted files (advisory).
    pub total_size: i64,
    /// Last time a file was added or removed.
    pub last_modified: DateTime<Utc>,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// When the folder was soft-deleted.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Who soft-deleted the folder.
    pub deleted_by: Option<UserId>,
    /// Optimistic-concurrency revision, bumped by every conditional update.
    pub revision: i64,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder metadata was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Build a fresh, empty folder from a validated create request.
    pub fn from_create(data: CreateFolder) -> Self {
        let now = Utc::now();
        Self {
            id: FolderId::new(),
            name: data.name,
            description: data.description,
            department: data.department,
            is_public: data.is_public,
            created_by: data.created_by,
            access_control: data.access_control,
            file_count: 0,
            total_size: 0,
            last_modified: now,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the folder was created by the given user.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.created_by == *user
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFolder {
    /// Folder name.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Description.
    #[validate(length(max = 500))]
    pub description: String,
    /// Owning department.
    pub department: Department,
    /// Public visibility.
    pub is_public: bool,
    /// The creating user.
    pub created_by: UserId,
    /// Initial allow lists.
    pub access_control: AccessControl,
}

/// Metadata changes to an existing folder. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateFolder {
    /// New name.
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    /// New description.
    #[validate(length(max = 500))]
    pub description: Option<String>,
}
