//! Directory backed by the `users` table.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use docshare_core::error::AppError;
use docshare_core::result::AppResult;
use docshare_core::types::UserId;
use docshare_database::repositories::UserRepository;
use docshare_entity::user::Actor;

use super::DirectoryService;

/// Resolves actors with one query per call.
#[derive(Debug, Clone)]
pub struct PgDirectory {
    users: Arc<UserRepository>,
}

impl PgDirectory {
    /// Create a directory over the user repository.
    pub fn new(users: Arc<UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl DirectoryService for PgDirectory {
    async fn resolve_actor(&self, user_id: UserId) -> AppResult<Actor> {
        let actor = self
            .users
            .find_actor(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;
        debug!(user_id = %user_id, role = %actor.role, department = %actor.department, "Actor resolved");
        Ok(actor)
    }
}
