//! Directory lookups against the `users` table.

use sqlx::PgPool;

use docshare_core::result::AppResult;
use docshare_core::types::UserId;
use docshare_entity::user::Actor;

use super::db_error;

/// Read-only access to user role and department.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Current role and department of a user.
    pub async fn find_actor(&self, id: UserId) -> AppResult<Option<Actor>> {
        sqlx::query_as::<_, Actor>(
            "SELECT id, role, department FROM users WHERE id = $1 AND is_active",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to resolve user"))
    }
}
