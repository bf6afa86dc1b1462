//! Shared test helpers for integration tests.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use futures::future::{BoxFuture, FutureExt};

use docshare_auth::InMemoryDirectory;
use docshare_core::config::access::AccessConfig;
use docshare_core::error::AppError;
use docshare_core::result::AppResult;
use docshare_core::types::{FileId, FolderId, UserId};
use docshare_database::memory::{MemoryActivityStore, MemoryFileStore, MemoryFolderStore};
use docshare_database::store::ContentUpdate;
use docshare_database::{ActivityStore, FileStore, FolderStore};
use docshare_entity::Department;
use docshare_entity::activity::{ActivityCursor, ActivityFilter, ActivityLogEntry};
use docshare_entity::file::{DownloadRecord, File, ShareGrant};
use docshare_entity::folder::Folder;
use docshare_entity::user::UserRole;
use docshare_service::{CreateFolderRequest, Engine, RequestContext, UploadRequest};

/// Activity store whose writes can be made to fail on demand.
#[derive(Default)]
pub struct FaultyActivityStore {
    inner: MemoryActivityStore,
    failing: AtomicBool,
    before_failure: Mutex<Option<BoxFuture<'static, ()>>>,
}

impl FaultyActivityStore {
    /// Make subsequent writes fail (or succeed again).
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Run `write` inside the next failing append, before it reports the
    /// failure.
    pub fn before_next_failure(&self, write: impl Future<Output = ()> + Send + 'static) {
        *self.before_failure.lock().unwrap() = Some(write.boxed());
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.inner.len().await
    }
}

#[async_trait]
impl ActivityStore for FaultyActivityStore {
    async fn append(&self, entry: &ActivityLogEntry) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            let write = self.before_failure.lock().unwrap().take();
            if let Some(write) = write {
                write.await;
            }
            return Err(AppError::database("injected ledger fault"));
        }
        self.inner.append(entry).await
    }

    async fn page(
        &self,
        filter: &ActivityFilter,
        after: Option<ActivityCursor>,
        limit: u32,
    ) -> AppResult<Vec<ActivityLogEntry>> {
        self.inner.page(filter, after, limit).await
    }
}

/// File store that lets a test land writes at exact points of another
/// operation.
pub struct RacingFileStore {
    inner: MemoryFileStore,
    folders: Arc<MemoryFolderStore>,
    after_scan: Mutex<Option<File>>,
    delete_before_insert: Mutex<Option<FolderId>>,
}

impl RacingFileStore {
    fn new(folders: Arc<MemoryFolderStore>) -> Self {
        Self {
            inner: MemoryFileStore::new(),
            folders,
            after_scan: Mutex::new(None),
            delete_before_insert: Mutex::new(None),
        }
    }

    /// Insert `file` right after the next listing of live files.
    pub fn insert_after_next_scan(&self, file: File) {
        *self.after_scan.lock().unwrap() = Some(file);
    }

    /// Soft-delete `folder` just before the next file insert.
    pub fn delete_folder_before_next_insert(&self, folder: FolderId) {
        *self.delete_before_insert.lock().unwrap() = Some(folder);
    }
}

#[async_trait]
impl FileStore for RacingFileStore {
    async fn find_by_id(&self, id: FileId) -> AppResult<Option<File>> {
        self.inner.find_by_id(id).await
    }

    async fn list_by_folder(
        &self,
        folder_id: FolderId,
        include_deleted: bool,
    ) -> AppResult<Vec<File>> {
        let files = self.inner.list_by_folder(folder_id, include_deleted).await?;
        let late = self.after_scan.lock().unwrap().take();
        if let Some(late) = late {
            self.inner.insert(&late).await?;
        }
        Ok(files)
    }

    async fn insert(&self, file: &File) -> AppResult<File> {
        let doomed = self.delete_before_insert.lock().unwrap().take();
        if let Some(id) = doomed {
            let folder = self.folders.find_by_id(id).await?.expect("folder exists");
            self.folders
                .mark_deleted(id, folder.revision, folder.created_by, Utc::now())
                .await?;
        }
        self.inner.insert(file).await
    }

    async fn update_sharing(
        &self,
        id: FileId,
        expected_revision: i64,
        shared_with: &[ShareGrant],
    ) -> AppResult<File> {
        self.inner.update_sharing(id, expected_revision, shared_with).await
    }

    async fn replace_content(
        &self,
        id: FileId,
        expected_revision: i64,
        update: &ContentUpdate,
    ) -> AppResult<File> {
        self.inner.replace_content(id, expected_revision, update).await
    }

    async fn record_download(&self, id: FileId, record: &DownloadRecord) -> AppResult<File> {
        self.inner.record_download(id, record).await
    }

    async fn mark_deleted(
        &self,
        id: FileId,
        expected_revision: i64,
        by: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<File> {
        self.inner.mark_deleted(id, expected_revision, by, at).await
    }

    async fn mark_deleted_in_folder(
        &self,
        folder_id: FolderId,
        by: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<Vec<File>> {
        self.inner.mark_deleted_in_folder(folder_id, by, at).await
    }
}

/// Test application context
pub struct TestApp {
    /// Every service.
    pub engine: Engine,
    /// Users and their departments.
    pub directory: Arc<InMemoryDirectory>,
    /// Ledger storage with fault injection.
    pub activity: Arc<FaultyActivityStore>,
}

impl TestApp {
    /// Create a new test application over empty stores.
    pub fn new() -> Self {
        Self::build(
            Arc::new(MemoryFolderStore::new()),
            Arc::new(MemoryFileStore::new()),
        )
    }

    /// Create a test application whose file store can interleave writes.
    pub fn racing() -> (Self, Arc<RacingFileStore>) {
        let folders = Arc::new(MemoryFolderStore::new());
        let files = Arc::new(RacingFileStore::new(folders.clone()));
        (Self::build(folders, files.clone()), files)
    }

    fn build(folders: Arc<dyn FolderStore>, files: Arc<dyn FileStore>) -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        let activity = Arc::new(FaultyActivityStore::default());
        let config = AccessConfig {
            ledger_page_size: 4,
            ..AccessConfig::default()
        };
        let engine = Engine::new(directory.clone(), folders, files, activity.clone(), &config);
        Self {
            engine,
            directory,
            activity,
        }
    }

    /// Register a user and return its id.
    pub fn user(&self, role: UserRole, department: Department) -> UserId {
        let id = UserId::new();
        self.directory.upsert(id, role, department);
        id
    }

    /// A request context for the user.
    pub fn ctx(&self, user: UserId) -> RequestContext {
        RequestContext::new(user)
    }

    /// Create a folder as `owner` in the owner's department.
    pub async fn folder(
        &self,
        owner: UserId,
        name: &str,
        department: Department,
        is_public: bool,
    ) -> Folder {
        self.engine
            .folders
            .create_folder(
                &self.ctx(owner),
                CreateFolderRequest {
                    name: name.to_string(),
                    department: department.to_string(),
                    is_public,
                    ..Default::default()
                },
            )
            .await
            .expect("create folder")
    }

    /// Upload a file as `user`.
    pub async fn upload(&self, user: UserId, folder: FolderId, name: &str, size: i64) -> File {
        self.engine
            .files
            .upload(
                &self.ctx(user),
                UploadRequest {
                    folder_id: folder,
                    name: name.to_string(),
                    mimetype: "application/pdf".to_string(),
                    size,
                    path: format!("uploads/{name}"),
                    public_id: None,
                },
            )
            .await
            .expect("upload")
    }

    /// Reload a folder, including deleted ones.
    pub async fn reload_folder(&self, id: FolderId) -> Folder {
        self.engine
            .folder_store
            .find_by_id(id)
            .await
            .expect("find folder")
            .expect("folder exists")
    }

    /// Every ledger entry matching the filter, in order.
    pub async fn entries(&self, filter: ActivityFilter) -> Vec<ActivityLogEntry> {
        self.engine
            .ledger
            .query(filter)
            .try_collect()
            .await
            .expect("ledger query")
    }
}
