// restoretool/src/restore/logic.rs
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::RestoreOptions;
use crate::manifest::RestoreManifest;
use crate::restore::apply::{apply_runs, finalize_target_dir};
use crate::restore::deploy::deploy_target_dir;
use crate::restore::fetch_extract::fetch_and_extract_runs;

/// Depth of the two inter-stage queues. Extraction may race this far ahead
/// of the apply stage.
const QUEUE_DEPTH: usize = 100;

/// One restore session: owns the manifest, the inter-stage queues, and the
/// session options, and sequences the pipeline from dispatch to deploy.
pub struct RestoreSession {
    manifest: RestoreManifest,
    options: Arc<RestoreOptions>,
}

impl RestoreSession {
    pub fn new(manifest: RestoreManifest, options: RestoreOptions) -> Self {
        RestoreSession {
            manifest,
            options: Arc::new(options),
        }
    }

    /// Drives the whole pipeline: dispatches the ordered run list to the
    /// fetch-and-extract stage, waits for the apply stage to account for
    /// every run, then finalizes and deploys the target directory.
    ///
    /// Returns the target directory holding the prepared data set.
    pub async fn run(self) -> Result<PathBuf> {
        let runs = self.manifest.runs();
        let expected = runs.len();
        println!(
            "🚀 Restoring {}: 1 base + {} incremental(s), taken at {}",
            self.manifest.databases,
            expected - 1,
            self.manifest.created_at
        );

        let (pending_tx, pending_rx) = mpsc::channel(QUEUE_DEPTH);
        let (extracted_tx, extracted_rx) = mpsc::channel(QUEUE_DEPTH);

        let client = reqwest::Client::new();
        let fetch_options = Arc::clone(&self.options);
        let fetch_task = tokio::spawn(fetch_and_extract_runs(
            pending_rx,
            extracted_tx,
            client,
            fetch_options,
        ));

        let apply_options = Arc::clone(&self.options);
        let apply_task =
            tokio::spawn(async move { apply_runs(extracted_rx, &apply_options).await });

        for run in runs {
            if pending_tx.send(run).await.is_err() {
                // Fetch stage already bailed out; its error surfaces below.
                break;
            }
        }
        // No more runs will ever be added.
        drop(pending_tx);

        let (fetch_result, apply_result) = tokio::join!(fetch_task, apply_task);
        fetch_result
            .context("Fetch-and-extract task panicked")?
            .context("Fetch-and-extract stage failed")?;
        let outcome = apply_result
            .context("Apply task panicked")?
            .context("Apply stage failed")?;

        if outcome.applied != expected {
            anyhow::bail!(
                "Applied {} run(s) but the manifest describes {}; pipeline desynchronized",
                outcome.applied,
                expected
            );
        }
        let target_dir = outcome
            .target_dir
            .context("No target directory was established by the apply stage")?;

        finalize_target_dir(&target_dir, &self.options)
            .await
            .context("Final consolidation failed")?;

        deploy_target_dir(&target_dir, &self.options)
            .await
            .context("Deploy into the live data directory failed")?;

        if self.options.cleanup_workspaces {
            cleanup_workspaces(&outcome.workspaces);
        }

        Ok(target_dir)
    }
}

/// Removes run workspaces after a successful deploy. Failures are reported
/// but not fatal: the restore itself already succeeded.
fn cleanup_workspaces(workspaces: &[PathBuf]) {
    for workspace in workspaces {
        match std::fs::remove_dir_all(workspace) {
            Ok(()) => println!("🧹 Removed workspace {}", workspace.display()),
            Err(e) => eprintln!(
                "⚠️ Failed to remove workspace {}: {}",
                workspace.display(),
                e
            ),
        }
    }
}
