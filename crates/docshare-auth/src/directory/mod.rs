//! Directory service: who is this user right now?
//!
//! Role and department are looked up fresh for every decision and never
//! cached on folders or files.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryDirectory;
pub use postgres::PgDirectory;

use async_trait::async_trait;

use docshare_core::result::AppResult;
use docshare_core::types::UserId;
use docshare_entity::user::Actor;

/// Resolves user ids to actors.
#[async_trait]
pub trait DirectoryService: Send + Sync + 'static {
    /// Resolve a user. Fails with `NotFound` if the user is unknown or inactive.
    async fn resolve_actor(&self, user_id: UserId) -> AppResult<Actor>;
}
