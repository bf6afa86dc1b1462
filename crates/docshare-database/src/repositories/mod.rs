//! PostgreSQL repository implementations of the store traits.

pub mod activity;
pub mod atomic;
pub mod file;
pub mod folder;
pub mod user;

pub use activity::ActivityRepository;
pub use atomic::PgAtomicStore;
pub use file::FileRepository;
pub use folder::FolderRepository;
pub use user::UserRepository;

use docshare_core::error::{AppError, ErrorKind};

/// Map a sqlx error into a database error with context.
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}

/// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
pub(crate) fn unique_or_db_error(
    context: &'static str,
    conflict_message: String,
) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        let is_unique = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if is_unique {
            AppError::conflict(conflict_message)
        } else {
            AppError::with_source(ErrorKind::Database, context, e)
        }
    }
}
