//! # docshare-core
//!
//! Core crate for DocShare. Contains the unified error system, typed
//! identifiers, pagination types, and configuration schemas.
//!
//! This crate has **no** internal dependencies on other DocShare crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
