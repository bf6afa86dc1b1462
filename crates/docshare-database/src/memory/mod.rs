//! In-memory store backend built on `dashmap`.
//!
//! Each conditional update holds the row's shard lock while it checks the
//! revision and applies the change, so concurrent writers see either the
//! whole update or none of it.

pub mod activity;
pub mod file;
pub mod folder;

pub use activity::MemoryActivityStore;
pub use file::MemoryFileStore;
pub use folder::MemoryFolderStore;

use docshare_core::error::AppError;

/// Fail with `Conflict` when the stored revision moved on.
pub(crate) fn check_revision(
    entity: &str,
    id: impl std::fmt::Display,
    expected: i64,
    actual: i64,
) -> Result<(), AppError> {
    if expected == actual {
        Ok(())
    } else {
        Err(AppError::conflict(format!(
            "{entity} {id} was modified concurrently (expected revision {expected}, found {actual})"
        )))
    }
}
