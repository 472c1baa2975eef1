// restoretool/src/manifest/mod.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

use crate::restore::run::BackupRun;

/// Description of one backup chain, fetched from the manifest endpoint.
///
/// The order of `incrementals` is semantically significant: it is the order
/// in which the deltas must be merged onto the base. The endpoint historically
/// emits PascalCase keys, so both spellings are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct RestoreManifest {
    /// Authenticated download URL for the full backup.
    #[serde(alias = "Base")]
    pub base: String,

    #[serde(alias = "CreatedAt")]
    pub created_at: DateTime<Utc>,

    /// Identifier of the database set covered by this chain.
    #[serde(alias = "Databases")]
    pub databases: String,

    /// Download URLs for the incremental backups, in chain order.
    #[serde(alias = "Incrementals", default)]
    pub incrementals: Vec<String>,
}

impl RestoreManifest {
    /// Decomposes the manifest into the ordered run list: the base first,
    /// then every incremental in manifest order.
    pub fn runs(&self) -> Vec<BackupRun> {
        let mut runs = Vec::with_capacity(1 + self.incrementals.len());
        runs.push(BackupRun::base(self.base.clone()));
        runs.extend(
            self.incrementals
                .iter()
                .cloned()
                .map(BackupRun::incremental),
        );
        runs
    }
}

/// Fetches and decodes the restore manifest, authenticating with the caller's
/// token as a query parameter. Any non-200 response or decode failure is
/// fatal at startup.
pub async fn fetch_manifest(
    client: &reqwest::Client,
    endpoint: &str,
    token: &str,
) -> Result<RestoreManifest> {
    let mut url = Url::parse(endpoint)
        .with_context(|| format!("Invalid manifest endpoint URI: {}", endpoint))?;
    url.query_pairs_mut().append_pair("token", token);

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch restore manifest from {}", endpoint))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        anyhow::bail!(
            "Non-200 response from attempt to read restore manifest at {}: {}",
            endpoint,
            status
        );
    }

    response
        .json::<RestoreManifest>()
        .await
        .with_context(|| format!("Failed to decode restore manifest from {}", endpoint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restore::run::RunKind;
    use serde_json::json;

    #[test]
    fn test_manifest_decodes_snake_case() -> anyhow::Result<()> {
        let manifest: RestoreManifest = serde_json::from_value(json!({
            "base": "http://backups.local/run-0.gz",
            "created_at": "2024-03-01T04:30:00Z",
            "databases": "wordpress",
            "incrementals": ["http://backups.local/run-1.gz"]
        }))?;
        assert_eq!(manifest.base, "http://backups.local/run-0.gz");
        assert_eq!(manifest.databases, "wordpress");
        assert_eq!(manifest.incrementals.len(), 1);
        Ok(())
    }

    #[test]
    fn test_manifest_decodes_pascal_case() -> anyhow::Result<()> {
        let manifest: RestoreManifest = serde_json::from_value(json!({
            "Base": "http://backups.local/run-0.gz",
            "CreatedAt": "2024-03-01T04:30:00Z",
            "Databases": "wordpress",
            "Incrementals": ["http://backups.local/run-1.gz", "http://backups.local/run-2.gz"]
        }))?;
        assert_eq!(manifest.incrementals.len(), 2);
        Ok(())
    }

    #[test]
    fn test_manifest_missing_incrementals_defaults_empty() -> anyhow::Result<()> {
        let manifest: RestoreManifest = serde_json::from_value(json!({
            "base": "http://backups.local/run-0.gz",
            "created_at": "2024-03-01T04:30:00Z",
            "databases": "wordpress"
        }))?;
        assert!(manifest.incrementals.is_empty());
        Ok(())
    }

    #[test]
    fn test_runs_ordering_base_first_then_chain_order() -> anyhow::Result<()> {
        let manifest: RestoreManifest = serde_json::from_value(json!({
            "base": "run-0",
            "created_at": "2024-03-01T04:30:00Z",
            "databases": "wordpress",
            "incrementals": ["run-1", "run-2", "run-3"]
        }))?;

        let runs = manifest.runs();
        assert_eq!(runs.len(), 4);
        assert_eq!(runs[0].kind, RunKind::Base);
        assert_eq!(runs[0].source_url, "run-0");
        for (i, run) in runs.iter().enumerate().skip(1) {
            assert_eq!(run.kind, RunKind::Incremental);
            assert_eq!(run.source_url, format!("run-{}", i));
            assert!(run.workspace.is_none());
        }
        Ok(())
    }
}
