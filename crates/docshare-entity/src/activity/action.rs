//! Ledger action kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use docshare_core::AppError;

/// The kind of event an activity entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    /// A file (or a new version of one) was uploaded.
    Upload,
    /// A file was downloaded.
    Download,
    /// A file or folder was soft-deleted.
    Delete,
    /// A file was shared or its grant changed.
    Share,
    /// A file was viewed.
    View,
    /// A folder was created.
    FolderCreate,
    /// Folder-level access was widened.
    AccessGranted,
    /// Folder- or file-level access was narrowed.
    AccessRevoked,
}

impl ActivityAction {
    /// Every action kind.
    pub const ALL: [ActivityAction; 8] = [
        Self::Upload,
        Self::Download,
        Self::Delete,
        Self::Share,
        Self::View,
        Self::FolderCreate,
        Self::AccessGranted,
        Self::AccessRevoked,
    ];

    /// Return the action as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
            Self::Delete => "delete",
            Self::Share => "share",
            Self::View => "view",
            Self::FolderCreate => "folder_create",
            Self::AccessGranted => "access_granted",
            Self::AccessRevoked => "access_revoked",
        }
    }

    /// Whether the action changes who can do what. Entries of these kinds
    /// must be written before the change is reported as applied.
    pub fn is_access_change(&self) -> bool {
        matches!(self, Self::Share | Self::AccessGranted | Self::AccessRevoked)
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActivityAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown activity action: '{s}'")))
    }
}
