//! Request context carrying the acting user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docshare_core::types::UserId;

/// Context for one caller request.
///
/// Only the user id is carried. Role and department are resolved through
/// the directory on every decision so that a department move takes effect
/// immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: UserId,
    /// IP address of the request origin, recorded on downloads.
    pub ip_address: Option<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            ip_address: None,
            request_time: Utc::now(),
        }
    }

    /// Attach the origin address.
    pub fn with_ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }
}
