//! Wires the stores, directory, and services together.

use std::sync::Arc;

use docshare_auth::DirectoryService;
use docshare_core::config::access::AccessConfig;
use docshare_database::memory::{MemoryActivityStore, MemoryFileStore, MemoryFolderStore};
use docshare_database::{ActivityStore, AtomicStore, CompensatingStore, FileStore, FolderStore};

use crate::access::AccessService;
use crate::aggregate::AggregateService;
use crate::file::FileService;
use crate::folder::FolderService;
use crate::ledger::ActivityLedger;
use crate::mutator::AccessControlService;

/// Every DocShare service, sharing one set of stores.
#[derive(Clone)]
pub struct Engine {
    /// Folder store.
    pub folder_store: Arc<dyn FolderStore>,
    /// File store.
    pub file_store: Arc<dyn FileStore>,
    /// Activity ledger.
    pub ledger: Arc<ActivityLedger>,
    /// `can_*` checks and access listings.
    pub access: Arc<AccessService>,
    /// Allow/deny lists, visibility, and sharing.
    pub access_control: Arc<AccessControlService>,
    /// Folder lifecycle.
    pub folders: Arc<FolderService>,
    /// File lifecycle.
    pub files: Arc<FileService>,
    /// Aggregate repair.
    pub aggregates: Arc<AggregateService>,
}

impl Engine {
    /// Build the services over the given stores. Multi-row writes are
    /// compensated on ledger failure rather than run in a transaction.
    pub fn new(
        directory: Arc<dyn DirectoryService>,
        folder_store: Arc<dyn FolderStore>,
        file_store: Arc<dyn FileStore>,
        activity_store: Arc<dyn ActivityStore>,
        config: &AccessConfig,
    ) -> Self {
        let atomic = Arc::new(CompensatingStore::new(
            Arc::clone(&folder_store),
            Arc::clone(&file_store),
            Arc::clone(&activity_store),
            config.io_timeout(),
        ));
        Self::with_atomic_store(
            directory,
            folder_store,
            file_store,
            activity_store,
            atomic,
            config,
        )
    }

    /// Build the services over the given stores, with `atomic` handling
    /// writes that span several rows.
    pub fn with_atomic_store(
        directory: Arc<dyn DirectoryService>,
        folder_store: Arc<dyn FolderStore>,
        file_store: Arc<dyn FileStore>,
        activity_store: Arc<dyn ActivityStore>,
        atomic: Arc<dyn AtomicStore>,
        config: &AccessConfig,
    ) -> Self {
        let ledger = Arc::new(ActivityLedger::new(
            activity_store,
            config.ledger_page_size,
            config.io_timeout(),
        ));
        let access = Arc::new(AccessService::new(
            Arc::clone(&directory),
            Arc::clone(&folder_store),
            Arc::clone(&file_store),
            Arc::clone(&ledger),
            config.io_timeout(),
        ));
        let access_control = Arc::new(AccessControlService::new(
            Arc::clone(&access),
            directory,
            Arc::clone(&atomic),
            Arc::clone(&ledger),
        ));
        let folders = Arc::new(FolderService::new(
            Arc::clone(&access),
            Arc::clone(&folder_store),
            atomic,
            Arc::clone(&ledger),
        ));
        let files = Arc::new(FileService::new(
            Arc::clone(&access),
            Arc::clone(&folder_store),
            Arc::clone(&file_store),
            Arc::clone(&ledger),
        ));
        let aggregates = Arc::new(AggregateService::new(
            Arc::clone(&folder_store),
            Arc::clone(&file_store),
        ));

        Self {
            folder_store,
            file_store,
            ledger,
            access,
            access_control,
            folders,
            files,
            aggregates,
        }
    }

    /// Build the services over fresh in-memory stores.
    pub fn in_memory(directory: Arc<dyn DirectoryService>, config: &AccessConfig) -> Self {
        Self::new(
            directory,
            Arc::new(MemoryFolderStore::new()),
            Arc::new(MemoryFileStore::new()),
            Arc::new(MemoryActivityStore::new()),
            config,
        )
    }
}
