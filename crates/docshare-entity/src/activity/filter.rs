//! Ledger query filters and cursors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docshare_core::types::{ActivityId, FileId, FolderId, UserId};

use super::action::ActivityAction;
use super::model::ActivityLogEntry;

/// Conjunctive filter over ledger entries. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFilter {
    /// Entries about this folder.
    pub folder_id: Option<FolderId>,
    /// Entries about this file.
    pub file_id: Option<FileId>,
    /// Entries by this actor.
    pub user_id: Option<UserId>,
    /// Entries of this kind.
    pub action: Option<ActivityAction>,
    /// Inclusive lower time bound.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper time bound.
    pub until: Option<DateTime<Utc>>,
}

impl ActivityFilter {
    /// Check a single entry against the filter.
    pub fn matches(&self, entry: &ActivityLogEntry) -> bool {
        self.folder_id.is_none_or(|id| entry.folder_id == Some(id))
            && self.file_id.is_none_or(|id| entry.file_id == Some(id))
            && self.user_id.is_none_or(|id| entry.user_id == id)
            && self.action.is_none_or(|a| entry.action == a)
            && self.from.is_none_or(|t| entry.timestamp >= t)
            && self.until.is_none_or(|t| entry.timestamp < t)
    }
}

/// Position in the ledger's `(timestamp, id)` order. A query resumed from a
/// cursor returns only entries strictly after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActivityCursor {
    /// Timestamp of the last entry seen.
    pub timestamp: DateTime<Utc>,
    /// Id of the last entry seen.
    pub id: ActivityId,
}

impl ActivityCursor {
    /// The cursor positioned at an entry.
    pub fn of(entry: &ActivityLogEntry) -> Self {
        Self {
            timestamp: entry.timestamp,
            id: entry.id,
        }
    }
}
