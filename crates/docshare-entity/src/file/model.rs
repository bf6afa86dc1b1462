//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use docshare_core::types::{FileId, FolderId, UserId};

use super::download::DownloadRecord;
use super::share::{AccessType, Grantee, ShareGrant};
use super::version::FileVersion;
use crate::department::Department;

/// A file inside a folder. Bytes live in an external store referenced by
/// `path`/`public_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: FileId,
    /// The owning folder.
    pub folder_id: FolderId,
    /// File name (including extension).
    pub name: String,
    /// MIME type.
    pub mimetype: String,
    /// Size in bytes of the current version.
    pub size: i64,
    /// Storage path of the current version.
    pub path: String,
    /// Identifier in the external object store, if any.
    pub public_id: Option<String>,
    /// Who uploaded the first version.
    pub uploaded_by: UserId,
    /// When the first version was uploaded.
    pub uploaded_at: DateTime<Utc>,
    /// Additive sharing grants, in grant order.
    #[sqlx(json)]
    pub shared_with: Vec<ShareGrant>,
    /// Number of downloads.
    pub downloads: i64,
    /// Append-only download history.
    #[sqlx(json)]
    pub download_log: Vec<DownloadRecord>,
    /// Superseded uploads, oldest first.
    #[sqlx(json)]
    pub versions: Vec<FileVersion>,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// When the file was soft-deleted.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Who soft-deleted the file.
    pub deleted_by: Option<UserId>,
    /// Optimistic-concurrency revision.
    pub revision: i64,
}

impl File {
    /// Build a fresh file record from a validated upload.
    pub fn from_create(data: CreateFile) -> Self {
        Self {
            id: FileId::new(),
            folder_id: data.folder_id,
            name: data.name,
            mimetype: data.mimetype,
            size: data.size,
            path: data.path,
            public_id: data.public_id,
            uploaded_by: data.uploaded_by,
            uploaded_at: Utc::now(),
            shared_with: Vec::new(),
            downloads: 0,
            download_log: Vec::new(),
            versions: Vec::new(),
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
            revision: 0,
        }
    }

    /// The strongest grant covering this user, if any.
    pub fn share_access_for(&self, user: &UserId, department: Department) -> Option<AccessType> {
        self.shared_with
            .iter()
            .filter(|g| g.grantee.covers(user, department))
            .map(|g| g.access_type)
            .max()
    }

    /// The grant for exactly this grantee, if present.
    pub fn grant_for(&self, grantee: &Grantee) -> Option<&ShareGrant> {
        self.shared_with.iter().find(|g| g.grantee == *grantee)
    }
}

/// Data required to register an uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFile {
    /// Target folder.
    pub folder_id: FolderId,
    /// File name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// MIME type.
    pub mimetype: String,
    /// Size in bytes.
    #[validate(range(min = 0))]
    pub size: i64,
    /// Storage path.
    #[validate(length(min = 1))]
    pub path: String,
    /// Object store id.
    pub public_id: Option<String>,
    /// The uploader.
    pub uploaded_by: UserId,
}
