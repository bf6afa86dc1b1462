//! Folder domain entities.

pub mod access;
pub mod model;

pub use access::AccessControl;
pub use model::{CreateFolder, Folder, UpdateFolder};
