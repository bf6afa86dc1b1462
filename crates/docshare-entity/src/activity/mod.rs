//! Activity ledger entities.

pub mod action;
pub mod details;
pub mod filter;
pub mod model;

pub use action::ActivityAction;
pub use details::{ActivityDetails, DetailValue};
pub use filter::{ActivityCursor, ActivityFilter};
pub use model::{ActivityLogEntry, NewActivity};
