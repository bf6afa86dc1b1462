//! Operations an actor can ask to perform on a folder.

use std::fmt;

use serde::{Deserialize, Serialize};

use docshare_core::types::UserId;

/// An operation subject to folder policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "operation", content = "target")]
pub enum Operation {
    /// See the folder, or a file in it.
    View,
    /// Add a file to the folder.
    Upload,
    /// Change the folder's metadata, lists, or file sharing.
    Manage,
    /// Delete the folder or files in it.
    Delete,
    /// Put the given user on the folder's deny list.
    Block(UserId),
}

impl Operation {
    /// Return the operation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Upload => "upload",
            Self::Manage => "manage",
            Self::Delete => "delete",
            Self::Block(_) => "block",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
