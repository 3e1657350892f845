//! Recovery Module
//!
//! Bulk state transitions between the store and its on-disk forms.
//!
//! ## Responsibilities
//! - Startup replay of every durability file
//! - Snapshot capture from a consistent read view
//! - Full-state restore from a named snapshot
//!
//! The two paths stay independent: durability files give per-key crash
//! recovery, snapshots give point-in-time backups that go stale as soon as
//! any key changes after capture.

mod manager;

pub use manager::{RecoveryManager, MAX_NAME_ATTEMPTS};

use std::path::PathBuf;

/// Result of a durability replay
#[derive(Debug, Default, Clone)]
pub struct RecoveryReport {
    /// Number of record files found
    pub files_scanned: u64,

    /// Number of records applied to the store
    pub records_recovered: u64,

    /// Number of files skipped as unreadable or malformed
    pub records_corrupted: u64,

    /// Paths of the skipped files
    pub corrupted_files: Vec<PathBuf>,
}
