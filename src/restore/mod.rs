mod logic;
pub(crate) mod apply;
pub(crate) mod deploy;
pub(crate) mod fetch_extract;
pub mod run;

pub use logic::RestoreSession;

use anyhow::Result;
use std::path::PathBuf;

use crate::config::RestoreOptions;
use crate::manifest::RestoreManifest;

/// Public entry point for the restore process: runs one full session for the
/// given manifest and returns the prepared target directory.
pub async fn run_restore_flow(
    manifest: RestoreManifest,
    options: RestoreOptions,
) -> Result<PathBuf> {
    RestoreSession::new(manifest, options).run().await
}
