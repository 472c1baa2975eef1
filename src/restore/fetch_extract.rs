// restoretool/src/restore/fetch_extract.rs
use async_compression::tokio::bufread::GzipDecoder;
use futures_util::TryStreamExt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;

use crate::config::RestoreOptions;
use crate::errors::{Result, RestoreError};
use crate::restore::run::BackupRun;

/// Fetch-and-extract stage: consumes pending runs, downloads and unpacks each
/// into a fresh workspace, and forwards the run to the apply stage.
///
/// Runs are forwarded in the same relative order they were received; the
/// apply stage has no reordering logic and relies on that FIFO discipline.
/// Extraction of the next run deliberately overlaps the apply of the previous
/// one. Any fetch or extraction failure aborts the stage without forwarding
/// the failed run, which closes the apply queue.
pub async fn fetch_and_extract_runs(
    mut pending: mpsc::Receiver<BackupRun>,
    extracted: mpsc::Sender<BackupRun>,
    client: reqwest::Client,
    options: Arc<RestoreOptions>,
) -> Result<()> {
    while let Some(mut run) = pending.recv().await {
        let workspace = extract_run(&client, &run, &options).await?;
        run.workspace = Some(workspace);

        if extracted.send(run).await.is_err() {
            // Apply stage is gone; its own failure is what the orchestrator
            // will report.
            break;
        }
    }
    Ok(())
}

/// Downloads one run's archive, decompresses the stream, and pipes it into
/// the extractor subprocess. Returns the freshly created workspace directory.
async fn extract_run(
    client: &reqwest::Client,
    run: &BackupRun,
    options: &RestoreOptions,
) -> Result<PathBuf> {
    println!("⬇️ Downloading {} run from {}", run.kind, run.source_url);

    let workspace = create_workspace(options)?;
    println!("📂 Extracting into workspace {}", workspace.display());

    let response = client
        .get(&run.source_url)
        .send()
        .await
        .map_err(|e| RestoreError::Fetch {
            url: run.source_url.clone(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(RestoreError::Fetch {
            url: run.source_url.clone(),
            reason: format!("non-success status {}", status),
        });
    }

    if let Some(length) = response.content_length() {
        println!("   {} bytes compressed", length);
    }

    let stream = Box::pin(response.bytes_stream().map_err(std::io::Error::other));
    let mut decoder = GzipDecoder::new(StreamReader::new(stream));

    let mut child = Command::new(&options.extractor_bin)
        .arg("-x")
        .arg("-C")
        .arg(&workspace)
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| RestoreError::Extract {
            url: run.source_url.clone(),
            workspace: workspace.display().to_string(),
            reason: format!("failed to spawn {}: {}", options.extractor_bin.display(), e),
        })?;

    let mut stdin = child.stdin.take().ok_or_else(|| RestoreError::Extract {
        url: run.source_url.clone(),
        workspace: workspace.display().to_string(),
        reason: "extractor stdin was not piped".to_string(),
    })?;

    let copied = tokio::io::copy(&mut decoder, &mut stdin)
        .await
        .map_err(|e| RestoreError::Extract {
            url: run.source_url.clone(),
            workspace: workspace.display().to_string(),
            reason: format!("failed streaming decompressed archive: {}", e),
        })?;
    drop(stdin);

    let exit = child.wait().await.map_err(|e| RestoreError::Extract {
        url: run.source_url.clone(),
        workspace: workspace.display().to_string(),
        reason: format!("failed waiting for extractor: {}", e),
    })?;

    if !exit.success() {
        return Err(RestoreError::Extract {
            url: run.source_url.clone(),
            workspace: workspace.display().to_string(),
            reason: format!("extractor exited with {}", exit),
        });
    }

    println!(
        "✓ Extracted {} bytes into {}",
        copied,
        workspace.display()
    );
    Ok(workspace)
}

/// Creates a uniquely-named workspace directory for one run. Workspaces are
/// persisted rather than temp-scoped: they outlive the process unless the
/// cleanup policy removes them after deploy.
fn create_workspace(options: &RestoreOptions) -> Result<PathBuf> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("backup-run-");

    let dir = match &options.workspace_root {
        Some(root) => {
            std::fs::create_dir_all(root)?;
            builder.tempdir_in(root)?
        }
        None => builder.tempdir()?,
    };
    Ok(dir.into_path())
}
