//! Configuration for EmberKV
//!
//! Centralized configuration with sensible defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{EmberError, Result};

/// Main configuration for an EmberKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding one durability file per live key
    pub storage_dir: PathBuf,

    /// Directory holding timestamp-named snapshot files
    pub snapshot_dir: PathBuf,

    /// Sync strategy for durability file writes
    pub durability_sync: DurabilitySync,

    // -------------------------------------------------------------------------
    // Request Limits
    // -------------------------------------------------------------------------
    /// Max combined key + value size (in bytes), enforced by the API layer
    pub max_item_size: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address for client traffic
    pub listen_addr: String,

    /// Inter-node address. Reserved; no protocol is served on it.
    pub internal_addr: String,

    /// Operating role, checked by the API layer before each request
    pub role: Role,

    /// Number of connection worker threads
    pub worker_threads: usize,

    /// Connection read timeout (milliseconds)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds)
    pub write_timeout_ms: u64,
}

/// Durability file sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilitySync {
    /// fsync every record before it replaces the previous file (safest)
    EveryWrite,

    /// Leave flushing to the OS page cache (faster, loses writes on power failure)
    OsBuffered,
}

/// Operating role of a server instance
///
/// This is an access-control gate only. No data moves between nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Accepts reads, writes, snapshots and restores
    Primary,

    /// Read-only
    Replica,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Primary => f.write_str("primary"),
            Role::Replica => f.write_str("replica"),
        }
    }
}

impl FromStr for Role {
    type Err = EmberError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "primary" | "master" => Ok(Role::Primary),
            "replica" => Ok(Role::Replica),
            other => Err(EmberError::Config(format!("unknown role: {}", other))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./storage"),
            snapshot_dir: PathBuf::from("./snapshots"),
            durability_sync: DurabilitySync::EveryWrite,
            max_item_size: 1024 * 1000, // ~1 MB
            listen_addr: "127.0.0.1:8080".to_string(),
            internal_addr: "127.0.0.1:8090".to_string(),
            role: Role::Primary,
            worker_threads: 16,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Default config with both directories placed under `root`
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            storage_dir: root.join("storage"),
            snapshot_dir: root.join("snapshots"),
            ..Self::default()
        }
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == 0 {
            return Err(EmberError::Config(
                "worker_threads must be at least 1".to_string(),
            ));
        }
        if self.max_item_size == 0 {
            return Err(EmberError::Config(
                "max_item_size must be greater than 0".to_string(),
            ));
        }
        if self.storage_dir == self.snapshot_dir {
            return Err(EmberError::Config(format!(
                "storage_dir and snapshot_dir must differ (both {})",
                self.storage_dir.display()
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the durability file directory
    pub fn storage_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage_dir = path.into();
        self
    }

    /// Set the snapshot directory
    pub fn snapshot_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.snapshot_dir = path.into();
        self
    }

    /// Set the durability sync strategy
    pub fn durability_sync(mut self, sync: DurabilitySync) -> Self {
        self.config.durability_sync = sync;
        self
    }

    /// Set the max combined key + value size (in bytes)
    pub fn max_item_size(mut self, size: usize) -> Self {
        self.config.max_item_size = size;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the internal (inter-node) address
    pub fn internal_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.internal_addr = addr.into();
        self
    }

    /// Set the operating role
    pub fn role(mut self, role: Role) -> Self {
        self.config.role = role;
        self
    }

    /// Set the number of connection worker threads
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
