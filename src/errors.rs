use thiserror::Error;

/// Tagged failure classes for the restore pipeline. Each stage returns one of
/// these so the orchestrator can report which run and which stage failed
/// before tearing the session down.
#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Failed to fetch backup stream from {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Extraction of {url} into {workspace} failed: {reason}")]
    Extract {
        url: String,
        workspace: String,
        reason: String,
    },

    #[error("Apply failed for {kind} run in {workspace}: {reason}")]
    Apply {
        kind: String,
        workspace: String,
        reason: String,
    },

    #[error(
        "Ordering violation: incremental run from {url} reached the apply stage before a base run established the target directory"
    )]
    OrderingViolation { url: String },

    #[error("Final consolidation of {target_dir} failed: {reason}")]
    Finalize { target_dir: String, reason: String },

    #[error("Deploy of {target_dir} into {data_dir} failed: {reason}")]
    Deploy {
        target_dir: String,
        data_dir: String,
        reason: String,
    },

    #[error("Run from {url} has no workspace recorded; stages are desynchronized")]
    MissingWorkspace { url: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RestoreError>;
