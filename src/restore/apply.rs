// restoretool/src/restore/apply.rs
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::config::RestoreOptions;
use crate::errors::{Result, RestoreError};
use crate::restore::run::{BackupRun, RunKind};

/// What the apply stage produced: the shared target directory (once a base
/// run established it), how many runs were applied, and every workspace that
/// was consumed, for the post-deploy cleanup policy.
#[derive(Debug)]
pub struct ApplyOutcome {
    pub target_dir: Option<PathBuf>,
    pub applied: usize,
    pub workspaces: Vec<PathBuf>,
}

/// Apply stage: consumes extracted runs strictly in delivery order and merges
/// each onto the shared target directory with a redo-only log apply.
///
/// The first run delivered must be the base; its workspace becomes the target
/// directory for the rest of the session. An incremental arriving first means
/// the manifest is malformed or the stages desynchronized, and is fatal.
/// Applying is deliberately sequential: each incremental mutates redo state
/// built up by the previous one.
pub async fn apply_runs(
    mut extracted: mpsc::Receiver<BackupRun>,
    options: &RestoreOptions,
) -> Result<ApplyOutcome> {
    let mut target_dir: Option<PathBuf> = None;
    let mut applied = 0;
    let mut workspaces = Vec::new();

    while let Some(run) = extracted.recv().await {
        let workspace = run.workspace()?.to_path_buf();
        println!("🔄 Applying {} run from {}", run.kind, workspace.display());

        let target = match &target_dir {
            Some(dir) => dir.clone(),
            None => {
                if run.kind != RunKind::Base {
                    return Err(RestoreError::OrderingViolation {
                        url: run.source_url.clone(),
                    });
                }
                println!("📂 Target directory is {}", workspace.display());
                target_dir = Some(workspace.clone());
                workspace.clone()
            }
        };

        let mut cmd = Command::new(&options.preparer_bin);
        cmd.arg("--apply-log").arg("--redo-only").arg(&target);
        if run.kind == RunKind::Incremental {
            cmd.arg("--incremental-dir").arg(&workspace);
        }

        let exit = cmd.status().await.map_err(|e| RestoreError::Apply {
            kind: run.kind.to_string(),
            workspace: workspace.display().to_string(),
            reason: format!("failed to spawn {}: {}", options.preparer_bin.display(), e),
        })?;

        if !exit.success() {
            if options.strict_apply {
                return Err(RestoreError::Apply {
                    kind: run.kind.to_string(),
                    workspace: workspace.display().to_string(),
                    reason: format!("preparer exited with {}", exit),
                });
            }
            eprintln!(
                "⚠️ Preparer exited with {} applying {} run from {}; continuing (lenient apply)",
                exit,
                run.kind,
                workspace.display()
            );
        }

        workspaces.push(workspace);
        applied += 1;
    }

    println!("✓ Done applying {} run(s)", applied);
    Ok(ApplyOutcome {
        target_dir,
        applied,
        workspaces,
    })
}

/// Final consolidation: one non-redo-only log apply that turns the merged
/// target directory into a consistent, startable data set. Always fatal on a
/// non-zero exit, regardless of the per-run strictness policy.
pub async fn finalize_target_dir(target_dir: &Path, options: &RestoreOptions) -> Result<()> {
    println!("🔧 Running final consolidation on {}", target_dir.display());

    let exit = Command::new(&options.preparer_bin)
        .arg("--apply-log")
        .arg(target_dir)
        .status()
        .await
        .map_err(|e| RestoreError::Finalize {
            target_dir: target_dir.display().to_string(),
            reason: format!("failed to spawn {}: {}", options.preparer_bin.display(), e),
        })?;

    if !exit.success() {
        return Err(RestoreError::Finalize {
            target_dir: target_dir.display().to_string(),
            reason: format!("preparer exited with {}", exit),
        });
    }

    println!("✓ Backup is prepared in {}", target_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_options() -> RestoreOptions {
        RestoreOptions {
            extractor_bin: PathBuf::from("/nonexistent/xbstream"),
            preparer_bin: PathBuf::from("/nonexistent/innobackupex"),
            rsync_bin: PathBuf::from("/nonexistent/rsync"),
            data_dir: PathBuf::from("/nonexistent/live"),
            workspace_root: None,
            strict_apply: true,
            cleanup_workspaces: false,
        }
    }

    #[tokio::test]
    async fn test_incremental_first_is_an_ordering_violation() -> anyhow::Result<()> {
        let (tx, rx) = mpsc::channel(4);
        let mut run = BackupRun::incremental("http://backups.local/run-1.gz".to_string());
        run.workspace = Some(PathBuf::from("/tmp/backup-run-xyz"));
        tx.send(run).await?;
        drop(tx);

        // Fails before the preparer is ever invoked, so the bogus binary
        // path is never touched.
        let err = apply_runs(rx, &test_options()).await.unwrap_err();
        assert!(matches!(err, RestoreError::OrderingViolation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_run_without_workspace_is_desync() -> anyhow::Result<()> {
        let (tx, rx) = mpsc::channel(4);
        tx.send(BackupRun::base("http://backups.local/run-0.gz".to_string()))
            .await?;
        drop(tx);

        let err = apply_runs(rx, &test_options()).await.unwrap_err();
        assert!(matches!(err, RestoreError::MissingWorkspace { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_queue_yields_empty_outcome() -> anyhow::Result<()> {
        let (tx, rx) = mpsc::channel::<BackupRun>(4);
        drop(tx);

        let outcome = apply_runs(rx, &test_options()).await?;
        assert_eq!(outcome.applied, 0);
        assert!(outcome.target_dir.is_none());
        assert!(outcome.workspaces.is_empty());
        Ok(())
    }
}
