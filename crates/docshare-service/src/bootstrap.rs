//! Default-folder seeding.
//!
//! Runs outside the authorization engine with a system owner. Seeding is
//! keyed by folder name: a folder that already exists is left alone, so the
//! seed can run on every start.

use std::str::FromStr;

use serde::Serialize;
use tracing::info;

use docshare_core::config::bootstrap::DefaultFolder;
use docshare_core::error::ErrorKind;
use docshare_core::result::AppResult;
use docshare_core::types::UserId;
use docshare_database::FolderStore;
use docshare_entity::Department;
use docshare_entity::activity::{ActivityAction, ActivityDetails, NewActivity};
use docshare_entity::folder::{AccessControl, CreateFolder, Folder};

use crate::ledger::ActivityLedger;

/// What a seeding run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedReport {
    /// Names of folders created.
    pub created: Vec<String>,
    /// Names of folders that already existed.
    pub existing: Vec<String>,
}

/// Create every configured default folder that does not exist yet.
pub async fn seed_default_folders(
    folders: &dyn FolderStore,
    ledger: &ActivityLedger,
    defaults: &[DefaultFolder],
    owner: UserId,
) -> AppResult<SeedReport> {
    let mut report = SeedReport::default();

    for default in defaults {
        let department = Department::from_str(&default.department)?;
        if folders.find_by_name(&default.name).await?.is_some() {
            report.existing.push(default.name.clone());
            continue;
        }

        let folder = Folder::from_create(CreateFolder {
            name: default.name.clone(),
            description: default.description.clone(),
            department,
            is_public: default.is_public,
            created_by: owner,
            access_control: AccessControl::default(),
        });
        let folder = match folders.insert(&folder).await {
            Ok(folder) => folder,
            Err(e) if e.is(ErrorKind::Conflict) => {
                report.existing.push(default.name.clone());
                continue;
            }
            Err(e) => return Err(e),
        };

        let details = ActivityDetails::new()
            .with("department", folder.department.as_str())
            .with("is_public", folder.is_public)
            .with("bootstrap", true);
        ledger
            .append(
                NewActivity::new(ActivityAction::FolderCreate, owner)
                    .folder(folder.id, &folder.name)
                    .details(details),
            )
            .await;

        info!(folder_id = %folder.id, name = %folder.name, "Seeded default folder");
        report.created.push(folder.name);
    }

    Ok(report)
}
