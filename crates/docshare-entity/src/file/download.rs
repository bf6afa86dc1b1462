//! Download log entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docshare_core::types::UserId;

/// One download of a file. Written once, never edited or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRecord {
    /// Who downloaded.
    pub user_id: UserId,
    /// When.
    pub downloaded_at: DateTime<Utc>,
    /// Client address, if the boundary layer knew it.
    pub ip_address: Option<String>,
}
