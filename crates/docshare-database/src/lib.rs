//! # docshare-database
//!
//! The resource store adapter for DocShare: store traits with
//! optimistic-concurrency semantics, an in-memory backend, and a PostgreSQL
//! backend with its connection pool and migrations.

pub mod compensating;
pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use compensating::CompensatingStore;
pub use connection::DatabasePool;
pub use store::{ActivityStore, AtomicStore, FileStore, FolderStore};
