//! Prior upload snapshots of a file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docshare_core::types::UserId;

/// A superseded upload. The file's own `path`/`size` describe the latest one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileVersion {
    /// Storage reference of the superseded content.
    pub storage_ref: String,
    /// When that content was uploaded.
    pub uploaded_at: DateTime<Utc>,
    /// Who uploaded it.
    pub uploaded_by: UserId,
    /// Its size in bytes.
    pub size: i64,
}
