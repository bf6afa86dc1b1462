//! The resolved identity an access decision is made for.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use docshare_core::types::UserId;

use super::role::UserRole;
use crate::department::Department;

/// A user together with the role and department the directory reports for
/// them right now. Never cached on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Actor {
    /// The user's identifier.
    pub id: UserId,
    /// The user's current role.
    pub role: UserRole,
    /// The user's current department.
    pub department: Department,
}

impl Actor {
    /// Construct an actor.
    pub fn new(id: UserId, role: UserRole, department: Department) -> Self {
        Self {
            id,
            role,
            department,
        }
    }

    /// Check if this actor is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Check if this actor manages the given department.
    pub fn manages(&self, department: Department) -> bool {
        self.role == UserRole::Manager && self.department == department
    }
}
