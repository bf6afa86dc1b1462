//! The fixed set of organisational departments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use docshare_core::AppError;

/// A department a folder belongs to or a user is a member of.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "department")]
pub enum Department {
    /// Company-wide.
    Company,
    /// Finance.
    Finance,
    /// HR and administration.
    #[serde(rename = "HR & Admin")]
    #[sqlx(rename = "HR & Admin")]
    HrAdmin,
    /// Information technology.
    #[serde(rename = "IT")]
    #[sqlx(rename = "IT")]
    It,
    /// Supply chain.
    #[serde(rename = "Supply Chain")]
    #[sqlx(rename = "Supply Chain")]
    SupplyChain,
    /// Technical / engineering.
    Technical,
}

impl Department {
    /// Every department, in display order.
    pub const ALL: [Department; 6] = [
        Self::Company,
        Self::Finance,
        Self::HrAdmin,
        Self::It,
        Self::SupplyChain,
        Self::Technical,
    ];

    /// Return the department label as stored and displayed.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "Company",
            Self::Finance => "Finance",
            Self::HrAdmin => "HR & Admin",
            Self::It => "IT",
            Self::SupplyChain => "Supply Chain",
            Self::Technical => "Technical",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Department {
    type Err = AppError;

    /// Labels match case-insensitively; anything outside the fixed set is a
    /// validation error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::validation(format!("Unknown department: '{s}'")))
    }
}
