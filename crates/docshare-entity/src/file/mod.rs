//! File domain entities.

pub mod download;
pub mod model;
pub mod share;
pub mod version;

pub use download::DownloadRecord;
pub use model::{CreateFile, File};
pub use share::{AccessType, Grantee, ShareGrant};
pub use version::FileVersion;
