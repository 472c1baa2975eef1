//! Percona XtraBackup restore pipeline.
//!
//! Downloads a chain of gzip-compressed xbstream archives (one full backup
//! plus any number of incrementals), extracts each into its own workspace,
//! applies them in chain order onto a shared target directory, and finally
//! consolidates and rsyncs the result into the live data directory.

pub mod config;
pub mod errors;
pub mod manifest;
pub mod restore;
