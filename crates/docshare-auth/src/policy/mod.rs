//! Folder and file access policy.

pub mod decision;
pub mod evaluator;
pub mod operation;

pub use decision::{Decision, DenyReason};
pub use evaluator::PolicyEvaluator;
pub use operation::Operation;
