//! In-memory directory, for embedding and tests.

use async_trait::async_trait;
use dashmap::DashMap;

use docshare_core::error::AppError;
use docshare_core::result::AppResult;
use docshare_core::types::UserId;
use docshare_entity::Department;
use docshare_entity::user::{Actor, UserRole};

use super::DirectoryService;

/// A mutable map of users. Changing a user's department or role takes
/// effect on the very next decision.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: DashMap<UserId, Actor>,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user.
    pub fn upsert(&self, id: UserId, role: UserRole, department: Department) -> Actor {
        let actor = Actor::new(id, role, department);
        self.users.insert(id, actor.clone());
        actor
    }

    /// Move a user to another department.
    pub fn set_department(&self, id: UserId, department: Department) -> AppResult<()> {
        let mut actor = self
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        actor.department = department;
        Ok(())
    }

    /// Remove a user.
    pub fn remove(&self, id: UserId) -> bool {
        self.users.remove(&id).is_some()
    }
}

#[async_trait]
impl DirectoryService for InMemoryDirectory {
    async fn resolve_actor(&self, user_id: UserId) -> AppResult<Actor> {
        self.users
            .get(&user_id)
            .map(|a| a.value().clone())
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
    }
}
