//! The access policy evaluator.
//!
//! Rules are evaluated in a fixed order and the first one that matches
//! decides:
//!
//! 1. admins may do anything
//! 2. a deny-listed actor may do nothing
//! 3. the folder's creator may manage and delete it
//! 4. view/upload require folder eligibility (public, allowed user, allowed
//!    department, or same department); view is also granted by any sharing
//!    grant on the requested file
//! 5. other managers need the manager role in the folder's department
//! 6. block requires manage rights, and the folder's creator cannot be blocked
//! 7. everything else is denied
//!
//! The evaluator is pure. It reads only the folder and file it is handed and
//! never logs or mutates anything.

use docshare_entity::file::{AccessType, File};
use docshare_entity::folder::Folder;
use docshare_entity::user::Actor;

use super::decision::{Decision, DenyReason};
use super::operation::Operation;

/// Stateless policy evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyEvaluator;

impl PolicyEvaluator {
    /// Creates a new evaluator.
    pub fn new() -> Self {
        Self
    }

    /// Decide whether `actor` may perform `operation` on `folder`, optionally
    /// scoped to one `file` inside it.
    ///
    /// A file that does not belong to the folder, or that has been
    /// soft-deleted, is ignored, so its grants cannot open the folder.
    pub fn decide(
        &self,
        actor: &Actor,
        folder: &Folder,
        file: Option<&File>,
        operation: Operation,
    ) -> Decision {
        if actor.is_admin() {
            return Decision::Allow;
        }

        if folder.access_control.is_denied(&actor.id) {
            return Decision::Deny(DenyReason::ExplicitlyDenied);
        }

        if matches!(operation, Operation::Manage | Operation::Delete)
            && folder.is_owned_by(&actor.id)
        {
            return Decision::Allow;
        }

        let file = file.filter(|f| f.folder_id == folder.id && !f.is_deleted);

        match operation {
            Operation::View => {
                let shared = file.is_some_and(|f| {
                    f.share_access_for(&actor.id, actor.department).is_some()
                });
                if self.is_folder_eligible(actor, folder) || shared {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::NoMatchingRule)
                }
            }
            Operation::Upload => {
                if file.is_none() && self.is_folder_eligible(actor, folder) {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::NoMatchingRule)
                }
            }
            Operation::Manage | Operation::Delete => {
                if actor.manages(folder.department) {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::InsufficientPrivilege)
                }
            }
            Operation::Block(target) => match self.decide(actor, folder, None, Operation::Manage) {
                Decision::Allow if folder.is_owned_by(&target) => {
                    Decision::Deny(DenyReason::OwnerCannotBeBlocked)
                }
                other => other,
            },
        }
    }

    /// Whether the actor reaches the folder through folder-level policy:
    /// public, allowed user, allowed department, or same department.
    ///
    /// Does not consider the deny list; callers go through [`Self::decide`].
    pub fn is_folder_eligible(&self, actor: &Actor, folder: &Folder) -> bool {
        let acl = &folder.access_control;
        folder.is_public
            || acl.allowed_users.contains(&actor.id)
            || acl.allowed_departments.contains(&actor.department)
            || actor.department == folder.department
    }

    /// Decide whether the actor may fetch the file's bytes.
    ///
    /// Equivalent to `View` when the actor reaches the folder on its own.
    /// An actor who sees the file only through a sharing grant additionally
    /// needs a `download` or `edit` grant.
    pub fn decide_download(&self, actor: &Actor, folder: &Folder, file: &File) -> Decision {
        let view = self.decide(actor, folder, Some(file), Operation::View);
        if !view.is_allowed() || actor.is_admin() || self.is_folder_eligible(actor, folder) {
            return view;
        }
        match file.share_access_for(&actor.id, actor.department) {
            Some(access) if access.allows_download() => Decision::Allow,
            _ => Decision::Deny(DenyReason::InsufficientPrivilege),
        }
    }

    /// Decide whether the actor may replace the file's content with a new
    /// version.
    ///
    /// Anyone who may upload into the folder may replace its files. Beyond
    /// that an `edit` sharing grant is enough.
    pub fn decide_replace(&self, actor: &Actor, folder: &Folder, file: &File) -> Decision {
        let upload = self.decide(actor, folder, None, Operation::Upload);
        if upload.is_allowed() || upload == Decision::Deny(DenyReason::ExplicitlyDenied) {
            return upload;
        }
        let view = self.decide(actor, folder, Some(file), Operation::View);
        if !view.is_allowed() {
            return view;
        }
        match file.share_access_for(&actor.id, actor.department) {
            Some(AccessType::Edit) => Decision::Allow,
            _ => Decision::Deny(DenyReason::InsufficientPrivilege),
        }
    }
}
