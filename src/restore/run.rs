// restoretool/src/restore/run.rs
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::{Result, RestoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Base,
    Incremental,
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunKind::Base => write!(f, "base"),
            RunKind::Incremental => write!(f, "incremental"),
        }
    }
}

/// One unit of restore work: the full backup or one incremental.
///
/// The workspace is unset until the fetch-and-extract stage has unpacked the
/// run, and is set exactly once. Runs move by ownership through the pipeline,
/// so a run is never visible to the apply stage before extraction completes.
#[derive(Debug, Clone)]
pub struct BackupRun {
    pub kind: RunKind,
    /// Authenticated download URL for this run's archive.
    pub source_url: String,
    /// Directory this run was extracted into, once known.
    pub workspace: Option<PathBuf>,
}

impl BackupRun {
    pub fn base(source_url: String) -> Self {
        BackupRun {
            kind: RunKind::Base,
            source_url,
            workspace: None,
        }
    }

    pub fn incremental(source_url: String) -> Self {
        BackupRun {
            kind: RunKind::Incremental,
            source_url,
            workspace: None,
        }
    }

    /// The workspace this run was extracted into. An unset workspace on a run
    /// that reached the apply stage means the stages are desynchronized.
    pub fn workspace(&self) -> Result<&Path> {
        self.workspace
            .as_deref()
            .ok_or_else(|| RestoreError::MissingWorkspace {
                url: self.source_url.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_kind_display() {
        assert_eq!(RunKind::Base.to_string(), "base");
        assert_eq!(RunKind::Incremental.to_string(), "incremental");
    }

    #[test]
    fn test_workspace_unset_is_an_error() {
        let run = BackupRun::incremental("http://backups.local/run-1.gz".to_string());
        let err = run.workspace().unwrap_err();
        assert!(matches!(err, RestoreError::MissingWorkspace { .. }));
    }

    #[test]
    fn test_workspace_set_round_trips() -> anyhow::Result<()> {
        let mut run = BackupRun::base("http://backups.local/run-0.gz".to_string());
        run.workspace = Some(PathBuf::from("/tmp/backup-run-abc123"));
        assert_eq!(run.workspace()?, Path::new("/tmp/backup-run-abc123"));
        Ok(())
    }
}
