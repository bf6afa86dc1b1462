//! Database migration command.

use clap::Args;

use docshare_core::config::AppConfig;
use docshare_core::error::AppError;
use docshare_database::migration::run_migrations;

use crate::output;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Seed default folders afterwards even if `bootstrap.seed_default_folders` is off
    #[arg(long)]
    pub seed: bool,
}

/// Run all pending migrations, then seed if configured
pub async fn execute(args: &MigrateArgs, config: &AppConfig) -> Result<(), AppError> {
    let pool = super::connect(config).await?;
    let schema = run_migrations(pool.pool()).await?;
    match schema.latest {
        Some(version) => output::print_success(&format!(
            "Schema at version {version} ({} migration(s) known).",
            schema.known
        )),
        None => output::print_success("No migrations bundled."),
    }

    if args.seed || config.bootstrap.seed_default_folders {
        let engine = super::engine(&pool, config);
        let report = super::seed::seed(&engine, config, None).await?;
        output::print_success(&format!(
            "Seeded {} folder(s), {} already present.",
            report.created.len(),
            report.existing.len()
        ));
    }

    pool.close().await;
    Ok(())
}
