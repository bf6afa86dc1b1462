//! Allow/deny results with machine-readable reason codes.

use std::fmt;

use serde::{Deserialize, Serialize};

use docshare_core::error::AppError;

/// Why a request was denied. Only the category is exposed; nothing about
/// the folder's lists leaks through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DenyReason {
    /// The actor is on the folder's deny list.
    ExplicitlyDenied,
    /// The actor may see the folder but not administer it.
    InsufficientPrivilege,
    /// The block target created the folder.
    OwnerCannotBeBlocked,
    /// No rule grants the operation.
    NoMatchingRule,
}

impl DenyReason {
    /// The stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ExplicitlyDenied => "explicitly-denied",
            Self::InsufficientPrivilege => "insufficient-privilege",
            Self::OwnerCannotBeBlocked => "owner-cannot-be-blocked",
            Self::NoMatchingRule => "no-matching-rule",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision", content = "reason")]
pub enum Decision {
    /// The operation may proceed.
    Allow,
    /// The operation must not proceed.
    Deny(DenyReason),
}

impl Decision {
    /// Whether the decision allows the operation.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// The denial reason, if denied.
    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            Self::Allow => None,
            Self::Deny(reason) => Some(*reason),
        }
    }

    /// Convert into a result for services that must abort on denial.
    /// The error message is the bare reason code.
    pub fn require(self) -> Result<(), AppError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(AppError::forbidden(reason.code())),
        }
    }
}
