//! Engine Module
//!
//! Lifecycle controller that wires the storage components together.
//!
//! ## Responsibilities
//! - Create the durability and snapshot directories
//! - Build the store and replay durability files into it
//! - Expose get/set/update/delete and the snapshot operations
//!
//! The engine knows nothing about roles; access policy is enforced by the
//! API layer before any of these methods is called.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::durability::DurabilityDir;
use crate::error::Result;
use crate::recovery::{RecoveryManager, RecoveryReport};
use crate::store::{SetOutcome, Store};

/// The main storage engine
///
/// ## Concurrency Model
///
/// All state lives in the `Store`, which owns the only lock:
/// - Reads (`get`, snapshot capture) share it
/// - Mutations (`set`, `update`, `delete`, restore) take it exclusively,
///   including the durability file I/O they trigger
///
/// The engine is `Send + Sync`; share it as `Arc<Engine>`.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// In-memory state (internal RwLock)
    store: Arc<Store>,

    /// Replay, snapshot capture and restore
    recovery: RecoveryManager,

    /// Outcome of the startup replay
    last_recovery: RecoveryReport,
}

impl Engine {
    /// Open an engine with the given config
    ///
    /// On startup:
    /// 1. Create storage and snapshot directories (failure is fatal)
    /// 2. Build an empty store
    /// 3. Replay every durability file into it
    /// 4. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        // Step 1: Directories
        fs::create_dir_all(&config.storage_dir)?;
        fs::create_dir_all(&config.snapshot_dir)?;

        // Step 2: Store backed by the durability directory
        let durability = Arc::new(DurabilityDir::open(
            &config.storage_dir,
            config.durability_sync,
        )?);
        let store = Arc::new(Store::new(durability));

        // Step 3: Replay
        let recovery = RecoveryManager::new(Arc::clone(&store), &config.snapshot_dir);
        let last_recovery = recovery.restore_from_storage()?;

        if last_recovery.records_corrupted > 0 {
            tracing::warn!(
                "{} durability files could not be recovered",
                last_recovery.records_corrupted
            );
        }

        Ok(Self {
            config,
            store,
            recovery,
            last_recovery,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with `storage/` and `snapshots/` under `path`
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::rooted_at(path))
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<String> {
        self.store.get(key)
    }

    /// Insert or overwrite a key, persisting it before returning
    pub fn set(&self, key: &str, value: &str) -> Result<SetOutcome> {
        self.store.set(key, value)
    }

    /// Overwrite an existing key; `KeyNotFound` if it is absent
    pub fn update(&self, key: &str, value: &str) -> Result<()> {
        self.store.update(key, value)
    }

    /// Delete a key; `KeyNotFound` if it is absent
    pub fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(key)
    }

    /// Write a new snapshot of the whole store, returning its path
    pub fn take_snapshot(&self) -> Result<PathBuf> {
        self.recovery.take_snapshot()
    }

    /// Replace the whole store with the contents of a snapshot
    ///
    /// `path` is either a bare snapshot file name or a full path.
    pub fn restore_from_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        self.recovery.restore_from_snapshot(path.as_ref())
    }

    /// Snapshot files on disk, oldest first
    pub fn list_snapshots(&self) -> Result<Vec<PathBuf>> {
        self.recovery.list_snapshots()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the durability directory path
    pub fn storage_dir(&self) -> &Path {
        &self.config.storage_dir
    }

    /// Get the snapshot directory path
    pub fn snapshot_dir(&self) -> &Path {
        &self.config.snapshot_dir
    }

    /// Get the number of keys
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Get the startup replay report
    pub fn last_recovery(&self) -> &RecoveryReport {
        &self.last_recovery
    }

    /// Get the underlying store
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
