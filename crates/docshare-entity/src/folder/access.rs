//! Folder-level allow and deny lists.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use docshare_core::types::UserId;

use crate::department::Department;

/// Explicit grants and revocations attached to a folder.
///
/// `allowed_users` and `denied_users` are kept disjoint by the mutating
/// methods below. The policy evaluator still checks the deny list first, so
/// a row that violates this (e.g. edited by hand) fails closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessControl {
    /// Departments whose members may view and upload.
    #[serde(default)]
    pub allowed_departments: BTreeSet<Department>,
    /// Individual users who may view and upload.
    #[serde(default)]
    pub allowed_users: BTreeSet<UserId>,
    /// Users who may do nothing at all on the folder.
    #[serde(default)]
    pub denied_users: BTreeSet<UserId>,
}

impl AccessControl {
    /// Check whether a user is on the deny list.
    pub fn is_denied(&self, user: &UserId) -> bool {
        self.denied_users.contains(user)
    }

    /// Grant a user access. Returns `true` if the user was on the deny list
    /// and has been lifted off it.
    pub fn allow_user(&mut self, user: UserId) -> bool {
        let was_denied = self.denied_users.remove(&user);
        self.allowed_users.insert(user);
        was_denied
    }

    /// Grant a department access.
    pub fn allow_department(&mut self, department: Department) -> bool {
        self.allowed_departments.insert(department)
    }

    /// Remove a user's explicit grant. Does not deny them.
    pub fn revoke_user(&mut self, user: &UserId) -> bool {
        self.allowed_users.remove(user)
    }

    /// Remove a department's grant.
    pub fn revoke_department(&mut self, department: &Department) -> bool {
        self.allowed_departments.remove(department)
    }

    /// Put a user on the deny list, dropping any explicit grant first.
    /// Returns `true` if the user held an explicit grant.
    pub fn deny_user(&mut self, user: UserId) -> bool {
        let had_grant = self.allowed_users.remove(&user);
        self.denied_users.insert(user);
        had_grant
    }

    /// Take a user off the deny list.
    pub fn undeny_user(&mut self, user: &UserId) -> bool {
        self.denied_users.remove(user)
    }

    /// Undo the change that turned `before` into `after`, leaving every
    /// other entry as it is now.
    ///
    /// Restored denials win over grants made in the meantime.
    pub fn revert(&mut self, before: &AccessControl, after: &AccessControl) {
        for department in after.allowed_departments.difference(&before.allowed_departments) {
            self.allowed_departments.remove(department);
        }
        for user in after.allowed_users.difference(&before.allowed_users) {
            self.allowed_users.remove(user);
        }
        for user in after.denied_users.difference(&before.denied_users) {
            self.denied_users.remove(user);
        }

        for department in before.allowed_departments.difference(&after.allowed_departments) {
            self.allowed_departments.insert(*department);
        }
        for user in before.allowed_users.difference(&after.allowed_users) {
            if !self.is_denied(user) {
                self.allowed_users.insert(*user);
            }
        }
        for user in before.denied_users.difference(&after.denied_users) {
            self.deny_user(*user);
        }
    }
}
