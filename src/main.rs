//! XtraBackup restore tool
//!
//! Fetches a restore manifest, then restores the described backup chain into
//! the live MySQL data directory.

// restoretool/src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use restoretool::config::{Cli, RestoreOptions};
use restoretool::manifest::fetch_manifest;
use restoretool::restore::run_restore_flow;

#[tokio::main]
async fn main() -> ExitCode {
    match run_app().await {
        Ok(target_dir) => {
            println!(
                "✅ Restore completed successfully. Prepared data set is in {}",
                target_dir.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<PathBuf> {
    let cli = Cli::parse();
    let options = RestoreOptions::from_cli(&cli)?;

    let client = reqwest::Client::new();
    let manifest = fetch_manifest(&client, &cli.uri, &cli.token)
        .await
        .context("Failed to fetch restore manifest")?;

    run_restore_flow(manifest, options)
        .await
        .context("Restore process failed")
}
