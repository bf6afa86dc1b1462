//! Per-file sharing grants.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docshare_core::AppError;
use docshare_core::types::UserId;

use crate::department::Department;

/// Capability carried by a sharing grant.
///
/// Ordered by privilege: Edit > Download > View.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    /// May see the file.
    View,
    /// May see and download the file.
    Download,
    /// May see, download and replace the file.
    Edit,
}

impl AccessType {
    /// Whether this grant lets the holder fetch the file's bytes.
    pub fn allows_download(&self) -> bool {
        matches!(self, Self::Download | Self::Edit)
    }

    /// Return the access type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Download => "download",
            Self::Edit => "edit",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccessType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "view" => Ok(Self::View),
            "download" => Ok(Self::Download),
            "edit" => Ok(Self::Edit),
            _ => Err(AppError::validation(format!(
                "Invalid access type: '{s}'. Expected one of: view, download, edit"
            ))),
        }
    }
}

/// Who a grant is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Grantee {
    /// A single user.
    UserId(UserId),
    /// Every member of a department.
    Department(Department),
}

impl Grantee {
    /// Whether a user with this id and department is covered by the grant.
    pub fn covers(&self, user: &UserId, department: Department) -> bool {
        match self {
            Self::UserId(id) => id == user,
            Self::Department(d) => *d == department,
        }
    }
}

impl fmt::Display for Grantee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserId(id) => write!(f, "user:{id}"),
            Self::Department(d) => write!(f, "department:{d}"),
        }
    }
}

/// A sharing grant layered on top of folder-level access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareGrant {
    /// Who the file is shared with.
    #[serde(flatten)]
    pub grantee: Grantee,
    /// What the grantee may do.
    pub access_type: AccessType,
    /// When the grant was made or last changed.
    pub shared_at: DateTime<Utc>,
    /// Who made the grant.
    pub shared_by: UserId,
}
