//! Typed detail bag attached to activity entries.
//!
//! Details are a flat map of primitive values. Each action kind accepts a
//! fixed set of keys so that entries stay queryable.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use docshare_core::AppError;

use super::action::ActivityAction;

/// A primitive detail value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Text(String),
}

impl fmt::Display for DetailValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for DetailValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for DetailValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for DetailValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for DetailValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for DetailValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Key/value details for one activity entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityDetails(BTreeMap<String, DetailValue>);

impl ActivityDetails {
    /// An empty detail bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<DetailValue>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: &str, value: impl Into<DetailValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&DetailValue> {
        self.0.get(key)
    }

    /// Whether no details are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the details in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DetailValue)> {
        self.0.iter()
    }

    /// Reject keys the action kind does not define.
    pub fn validate_for(&self, action: ActivityAction) -> Result<(), AppError> {
        let allowed = allowed_keys(action);
        match self.0.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(key) => Err(AppError::validation(format!(
                "Detail key '{key}' is not defined for action '{action}'"
            ))),
            None => Ok(()),
        }
    }
}

fn allowed_keys(action: ActivityAction) -> &'static [&'static str] {
    match action {
        ActivityAction::Upload => &["size", "mimetype", "version"],
        ActivityAction::Download => &["ip_address", "via_share"],
        ActivityAction::Delete => &["scope", "cascade", "size"],
        ActivityAction::Share => &["grantee", "access_type", "previous_access_type"],
        ActivityAction::View => &["via_share"],
        ActivityAction::FolderCreate => &["department", "is_public", "bootstrap"],
        ActivityAction::AccessGranted | ActivityAction::AccessRevoked => &[
            "scope",
            "department",
            "target_user_id",
            "grantee",
            "access_type",
            "blocked",
            "unblocked",
            "is_public",
        ],
    }
}
