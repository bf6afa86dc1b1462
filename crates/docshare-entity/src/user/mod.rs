//! Users as seen by the authorization engine.

pub mod actor;
pub mod role;

pub use actor::Actor;
pub use role::UserRole;
