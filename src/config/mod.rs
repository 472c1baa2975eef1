// restoretool/src/config/mod.rs
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use which::which;

/// Default manifest endpoint, overridable with `--uri`.
pub const DEFAULT_MANIFEST_URI: &str = "http://ops-deploybot.scprdev.org/backups/restore_json";

/// Default live data directory the finished restore is synced into.
pub const DEFAULT_DATA_DIR: &str = "/var/lib/mysql";

/// Restores a MySQL data directory from a chain of remote XtraBackup archives.
#[derive(Parser, Debug)]
#[command(name = "restoretool", version, about)]
pub struct Cli {
    /// Token used to authenticate the restore manifest download
    pub token: String,

    /// URI of the restore manifest endpoint
    #[arg(long, default_value = DEFAULT_MANIFEST_URI)]
    pub uri: String,

    /// Live data directory the prepared backup is synced into
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Tolerate a non-zero exit from a per-run apply instead of aborting.
    /// The final consolidation pass is always fatal on failure.
    #[arg(long)]
    pub lenient_apply: bool,

    /// Remove extracted workspaces after a successful deploy
    #[arg(long)]
    pub cleanup_workspaces: bool,
}

/// Resolved settings for one restore session: external tool paths plus the
/// policy knobs that govern apply strictness and workspace retention.
#[derive(Debug, Clone)]
pub struct RestoreOptions {
    pub extractor_bin: PathBuf,
    pub preparer_bin: PathBuf,
    pub rsync_bin: PathBuf,
    pub data_dir: PathBuf,
    /// Parent directory for per-run workspaces. None means the system temp dir.
    pub workspace_root: Option<PathBuf>,
    pub strict_apply: bool,
    pub cleanup_workspaces: bool,
}

impl RestoreOptions {
    /// Builds session options from CLI arguments, resolving the external
    /// tools up front so a missing binary fails before any download starts.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Ok(RestoreOptions {
            extractor_bin: find_tool("xbstream")?,
            preparer_bin: find_tool("innobackupex")?,
            rsync_bin: find_tool("rsync")?,
            data_dir: cli.data_dir.clone(),
            workspace_root: None,
            strict_apply: !cli.lenient_apply,
            cleanup_workspaces: cli.cleanup_workspaces,
        })
    }
}

fn find_tool(name: &str) -> Result<PathBuf> {
    which(name).with_context(|| {
        format!(
            "{} executable not found in PATH. Please ensure the XtraBackup tools and rsync are installed.",
            name
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["restoretool", "sekrit"])?;
        assert_eq!(cli.token, "sekrit");
        assert_eq!(cli.uri, DEFAULT_MANIFEST_URI);
        assert_eq!(cli.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert!(!cli.lenient_apply);
        assert!(!cli.cleanup_workspaces);
        Ok(())
    }

    #[test]
    fn test_cli_flags() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "restoretool",
            "sekrit",
            "--uri",
            "http://localhost:9999/restore_json",
            "--data-dir",
            "/srv/mysql",
            "--lenient-apply",
            "--cleanup-workspaces",
        ])?;
        assert_eq!(cli.uri, "http://localhost:9999/restore_json");
        assert_eq!(cli.data_dir, PathBuf::from("/srv/mysql"));
        assert!(cli.lenient_apply);
        assert!(cli.cleanup_workspaces);
        Ok(())
    }

    #[test]
    fn test_cli_requires_token() {
        assert!(Cli::try_parse_from(["restoretool"]).is_err());
    }
}
