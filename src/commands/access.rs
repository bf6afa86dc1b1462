//! Folder access listing command.

use clap::Args;

use docshare_core::config::AppConfig;
use docshare_core::error::AppError;
use docshare_core::types::{FolderId, UserId};
use docshare_service::RequestContext;

use crate::output::{self, OutputFormat};

/// Arguments for the access command
#[derive(Debug, Args)]
pub struct AccessArgs {
    /// Folder to inspect
    pub folder: FolderId,
    /// User to act as; must be allowed to manage the folder
    #[arg(long = "as")]
    pub as_user: UserId,
}

/// Print a folder's access settings
pub async fn execute(
    args: &AccessArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let pool = super::connect(config).await?;
    let engine = super::engine(&pool, config);

    let ctx = RequestContext::new(args.as_user);
    let listing = engine.access.list_access(&ctx, args.folder).await?;

    match format {
        OutputFormat::Json => output::print_json(&listing),
        OutputFormat::Table => {
            println!("{} ({})", listing.folder_name, listing.folder_id);
            output::print_kv("Public", &listing.is_public.to_string());
            output::print_kv("Allowed departments", &join(&listing.allowed_departments));
            output::print_kv("Allowed users", &join(&listing.allowed_users));
            output::print_kv("Denied users", &join(&listing.denied_users));
            for shared in &listing.shared_files {
                let grants: Vec<String> = shared
                    .shared_with
                    .iter()
                    .map(|g| format!("{}={}", g.grantee, g.access_type))
                    .collect();
                output::print_kv(&shared.file_name, &grants.join(", "));
            }
        }
    }

    pool.close().await;
    Ok(())
}

fn join<T: std::fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    let parts: Vec<String> = items.into_iter().map(|i| i.to_string()).collect();
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(", ")
    }
}
