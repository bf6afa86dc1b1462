//! # docshare-entity
//!
//! Domain entity models for DocShare. Every persisted struct in this crate
//! represents a database row and derives `sqlx::FromRow`; nested access
//! structures are stored as JSON columns.

pub mod activity;
pub mod department;
pub mod file;
pub mod folder;
pub mod user;

pub use department::Department;
