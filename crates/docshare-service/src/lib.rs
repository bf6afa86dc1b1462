//! # docshare-service
//!
//! Use cases for DocShare. Each service takes its stores and collaborators
//! as `Arc` references at construction time.
//!
//! - [`ActivityLedger`] appends and queries the audit trail
//! - [`AccessService`] answers `can_*` questions and lists folder access
//! - [`AccessControlService`] is the only writer of allow/deny lists,
//!   visibility, and sharing grants
//! - [`FolderService`] and [`FileService`] run the folder and file lifecycle
//! - [`AggregateService`] rebuilds cached folder counters
//! - [`bootstrap`] seeds the default folders

pub mod access;
pub mod aggregate;
pub mod bootstrap;
pub mod context;
pub mod engine;
pub mod file;
pub mod folder;
pub mod ledger;
pub mod mutator;

pub use access::{AccessListing, AccessService, Authorized, SharedFileSummary};
pub use aggregate::{AggregateReport, AggregateService};
pub use bootstrap::{SeedReport, seed_default_folders};
pub use context::RequestContext;
pub use engine::Engine;
pub use file::{FileService, NewVersionRequest, UploadRequest};
pub use folder::{CreateFolderRequest, FolderService};
pub use ledger::ActivityLedger;
pub use mutator::{AccessControlService, AccessGrantRequest};
