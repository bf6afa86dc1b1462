//! Store traits for folders, files, and ledger entries.
//!
//! Every update that touches authorization-relevant state (access control,
//! visibility, sharing grants, soft-delete flags) is conditioned on the
//! revision the caller loaded. A mismatch fails with
//! [`ErrorKind::Conflict`](docshare_core::ErrorKind::Conflict); a missing
//! row fails with `NotFound`. Aggregate counters are not revisioned.
//!
//! Writes spanning more than one row go through [`AtomicStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use docshare_core::result::AppResult;
use docshare_core::types::{FileId, FolderId, UserId};
use docshare_entity::activity::{ActivityCursor, ActivityFilter, ActivityLogEntry};
use docshare_entity::file::{DownloadRecord, File, FileVersion, ShareGrant};
use docshare_entity::folder::{AccessControl, Folder, UpdateFolder};

/// New content for an existing file.
#[derive(Debug, Clone)]
pub struct ContentUpdate {
    /// Storage path of the new content.
    pub path: String,
    /// Object store id of the new content.
    pub public_id: Option<String>,
    /// MIME type of the new content.
    pub mimetype: String,
    /// Size in bytes of the new content.
    pub size: i64,
    /// Snapshot of the content being superseded.
    pub previous: FileVersion,
}

/// Persistence for folders.
#[async_trait]
pub trait FolderStore: Send + Sync + 'static {
    /// Find a folder by id, including soft-deleted ones.
    async fn find_by_id(&self, id: FolderId) -> AppResult<Option<Folder>>;

    /// Find a live folder by exact name.
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Folder>>;

    /// List folders ordered by name.
    async fn list(&self, include_deleted: bool) -> AppResult<Vec<Folder>>;

    /// Insert a new folder. Fails with `Conflict` if a live folder already
    /// has the same name.
    async fn insert(&self, folder: &Folder) -> AppResult<Folder>;

    /// Apply name/description changes.
    async fn update_metadata(
        &self,
        id: FolderId,
        expected_revision: i64,
        changes: &UpdateFolder,
    ) -> AppResult<Folder>;

    /// Replace the allow/deny lists and the public flag as one write.
    async fn update_access(
        &self,
        id: FolderId,
        expected_revision: i64,
        access_control: &AccessControl,
        is_public: bool,
    ) -> AppResult<Folder>;

    /// Soft-delete the folder.
    async fn mark_deleted(
        &self,
        id: FolderId,
        expected_revision: i64,
        by: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<Folder>;

    /// Add deltas to the cached aggregates, clamping at zero.
    async fn adjust_aggregates(
        &self,
        id: FolderId,
        file_delta: i64,
        size_delta: i64,
        at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Overwrite the cached aggregates with recomputed values.
    async fn set_aggregates(
        &self,
        id: FolderId,
        file_count: i64,
        total_size: i64,
        last_modified: DateTime<Utc>,
    ) -> AppResult<()>;
}

/// Persistence for files.
#[async_trait]
pub trait FileStore: Send + Sync + 'static {
    /// Find a file by id, including soft-deleted ones.
    async fn find_by_id(&self, id: FileId) -> AppResult<Option<File>>;

    /// Files of a folder ordered by upload time.
    async fn list_by_folder(&self, folder_id: FolderId, include_deleted: bool)
    -> AppResult<Vec<File>>;

    /// Insert a new file.
    async fn insert(&self, file: &File) -> AppResult<File>;

    /// Replace the sharing grants.
    async fn update_sharing(
        &self,
        id: FileId,
        expected_revision: i64,
        shared_with: &[ShareGrant],
    ) -> AppResult<File>;

    /// Swap in new content, appending the superseded snapshot to `versions`.
    async fn replace_content(
        &self,
        id: FileId,
        expected_revision: i64,
        update: &ContentUpdate,
    ) -> AppResult<File>;

    /// Append a download record and bump the download counter.
    async fn record_download(&self, id: FileId, record: &DownloadRecord) -> AppResult<File>;

    /// Soft-delete the file.
    async fn mark_deleted(
        &self,
        id: FileId,
        expected_revision: i64,
        by: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<File>;

    /// Soft-delete every live file of a folder, returning them in upload
    /// order.
    async fn mark_deleted_in_folder(
        &self,
        folder_id: FolderId,
        by: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<Vec<File>>;
}

/// Append-only persistence for ledger entries.
#[async_trait]
pub trait ActivityStore: Send + Sync + 'static {
    /// Persist one entry.
    async fn append(&self, entry: &ActivityLogEntry) -> AppResult<()>;

    /// Up to `limit` matching entries strictly after `after`, in
    /// `(timestamp, id)` order.
    async fn page(
        &self,
        filter: &ActivityFilter,
        after: Option<ActivityCursor>,
        limit: u32,
    ) -> AppResult<Vec<ActivityLogEntry>>;
}

/// A soft-deleted folder and the files swept with it.
#[derive(Debug, Clone)]
pub struct FolderDeletion {
    /// The folder after deletion.
    pub folder: Folder,
    /// Files that were live until this deletion.
    pub files: Vec<File>,
}

/// Writes that touch several rows and must land together.
///
/// Access-control and sharing changes commit together with the ledger
/// entry that records them: when the entry cannot be stored the call fails
/// with `LedgerWrite` and the change is not left in place. Each call is
/// conditioned on the revision of the snapshot it is given.
#[async_trait]
pub trait AtomicStore: Send + Sync + 'static {
    /// Replace a folder's allow/deny lists and public flag, and append
    /// `entry`.
    async fn update_access(
        &self,
        folder: &Folder,
        access_control: &AccessControl,
        is_public: bool,
        entry: &ActivityLogEntry,
    ) -> AppResult<Folder>;

    /// Replace a file's sharing grants, and append `entry`.
    async fn update_sharing(
        &self,
        file: &File,
        shared_with: &[ShareGrant],
        entry: &ActivityLogEntry,
    ) -> AppResult<File>;

    /// Soft-delete a folder and every file still live in it.
    ///
    /// Without `cascade` the call fails with `Conflict` while the folder
    /// holds live files. Files that arrive while the deletion is under way
    /// are swept with it, so a deleted folder never keeps a live file.
    async fn delete_folder(
        &self,
        folder: &Folder,
        cascade: bool,
        by: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<FolderDeletion>;
}
