//! Activity log entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use docshare_core::types::{ActivityId, FileId, FolderId, UserId};

use super::action::ActivityAction;
use super::details::ActivityDetails;

/// An immutable record of an authorization-relevant event.
///
/// `file_name`/`folder_name` are snapshots taken when the event happened and
/// survive later renames and deletions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ActivityLogEntry {
    /// Unique, time-ordered entry identifier.
    pub id: ActivityId,
    /// What happened.
    pub action: ActivityAction,
    /// Who did it.
    pub user_id: UserId,
    /// The file involved, if any.
    pub file_id: Option<FileId>,
    /// The folder involved, if any.
    pub folder_id: Option<FolderId>,
    /// File name at event time.
    pub file_name: Option<String>,
    /// Folder name at event time.
    pub folder_name: Option<String>,
    /// Action-specific details.
    #[sqlx(json)]
    pub details: ActivityDetails,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
}

/// An event to be recorded. The ledger assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivity {
    /// What happened.
    pub action: ActivityAction,
    /// Who did it.
    pub user_id: UserId,
    /// The file involved, if any.
    pub file_id: Option<FileId>,
    /// The folder involved, if any.
    pub folder_id: Option<FolderId>,
    /// File name snapshot.
    pub file_name: Option<String>,
    /// Folder name snapshot.
    pub folder_name: Option<String>,
    /// Action-specific details.
    pub details: ActivityDetails,
}

impl NewActivity {
    /// Start an event with no resource attached.
    pub fn new(action: ActivityAction, user_id: UserId) -> Self {
        Self {
            action,
            user_id,
            file_id: None,
            folder_id: None,
            file_name: None,
            folder_name: None,
            details: ActivityDetails::new(),
        }
    }

    /// Attach the folder, snapshotting its name.
    pub fn folder(mut self, id: FolderId, name: &str) -> Self {
        self.folder_id = Some(id);
        self.folder_name = Some(name.to_string());
        self
    }

    /// Attach the file, snapshotting its name.
    pub fn file(mut self, id: FileId, name: &str) -> Self {
        self.file_id = Some(id);
        self.file_name = Some(name.to_string());
        self
    }

    /// Replace the details.
    pub fn details(mut self, details: ActivityDetails) -> Self {
        self.details = details;
        self
    }

    /// Turn the event into an entry stamped with the given time.
    pub fn into_entry(self, timestamp: DateTime<Utc>) -> ActivityLogEntry {
        ActivityLogEntry {
            id: ActivityId::new(),
            action: self.action,
            user_id: self.user_id,
            file_id: self.file_id,
            folder_id: self.folder_id,
            file_name: self.file_name,
            folder_name: self.folder_name,
            details: self.details,
            timestamp,
        }
    }
}
