//! # docshare-auth
//!
//! Authorization for DocShare folders and files.
//!
//! ## Modules
//!
//! - `directory` - resolves a user id to the user's current role and department
//! - `policy` - the pure access policy evaluator and its decision types

pub mod directory;
pub mod policy;

pub use directory::{DirectoryService, InMemoryDirectory, PgDirectory};
pub use policy::{Decision, DenyReason, Operation, PolicyEvaluator};
