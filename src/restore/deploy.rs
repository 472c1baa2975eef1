// restoretool/src/restore/deploy.rs
use std::path::Path;
use tokio::process::Command;

use crate::config::RestoreOptions;
use crate::errors::{Result, RestoreError};

/// Preparer bookkeeping files that must not reach the live data directory.
const DEPLOY_EXCLUDES: [&str; 2] = ["xtrabackup_checkpoints", "xtrabackup_logfile"];

/// Syncs the finalized target directory into the live data directory,
/// excluding the preparer's checkpoint and log marker files.
pub async fn deploy_target_dir(target_dir: &Path, options: &RestoreOptions) -> Result<()> {
    // Trailing slash so rsync copies the directory's contents, not the
    // directory itself.
    let source = format!("{}/", target_dir.display());
    println!(
        "🚚 Syncing {} into {}",
        source,
        options.data_dir.display()
    );

    let mut cmd = Command::new(&options.rsync_bin);
    cmd.arg("-rvt");
    for name in DEPLOY_EXCLUDES {
        cmd.arg("--exclude").arg(name);
    }
    cmd.arg(&source).arg(&options.data_dir);

    let exit = cmd.status().await.map_err(|e| RestoreError::Deploy {
        target_dir: target_dir.display().to_string(),
        data_dir: options.data_dir.display().to_string(),
        reason: format!("failed to spawn {}: {}", options.rsync_bin.display(), e),
    })?;

    if !exit.success() {
        return Err(RestoreError::Deploy {
            target_dir: target_dir.display().to_string(),
            data_dir: options.data_dir.display().to_string(),
            reason: format!("rsync exited with {}", exit),
        });
    }

    println!("✅ Backup moved into {}", options.data_dir.display());
    Ok(())
}
