//! Default-folder seeding configuration.

use serde::{Deserialize, Serialize};

/// Folders created on startup if no live folder with the same name exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Whether `docshare-admin seed` runs automatically after migrations.
    #[serde(default)]
    pub seed_default_folders: bool,
    /// The folders to seed.
    #[serde(default = "default_folders")]
    pub default_folders: Vec<DefaultFolder>,
}

/// One folder to seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultFolder {
    /// Folder name (the idempotency key).
    pub name: String,
    /// Folder description.
    #[serde(default)]
    pub description: String,
    /// Department label, e.g. `"HR & Admin"`.
    pub department: String,
    /// Whether every authenticated user may view the folder.
    #[serde(default)]
    pub is_public: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            seed_default_folders: false,
            default_folders: default_folders(),
        }
    }
}

fn default_folders() -> Vec<DefaultFolder> {
    [
        ("Company Policies", "Company", true),
        ("Finance Reports", "Finance", false),
        ("HR Documents", "HR & Admin", false),
        ("IT Resources", "IT", false),
        ("Supply Chain", "Supply Chain", false),
        ("Technical Docs", "Technical", false),
    ]
    .into_iter()
    .map(|(name, department, is_public)| DefaultFolder {
        name: name.to_string(),
        description: format!("{department} shared documents"),
        department: department.to_string(),
        is_public,
    })
    .collect()
}
