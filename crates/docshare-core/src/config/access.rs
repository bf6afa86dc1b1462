//! Authorization engine settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the access boundary and the activity ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Deadline in milliseconds for store and ledger reads on authorization
    /// paths. An expired deadline is answered as a denial.
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,
    /// Number of entries fetched per round trip by lazy ledger queries.
    #[serde(default = "default_ledger_page_size")]
    pub ledger_page_size: u32,
}

impl AccessConfig {
    /// The I/O deadline as a [`Duration`].
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            io_timeout_ms: default_io_timeout_ms(),
            ledger_page_size: default_ledger_page_size(),
        }
    }
}

fn default_io_timeout_ms() -> u64 {
    2_000
}

fn default_ledger_page_size() -> u32 {
    200
}
