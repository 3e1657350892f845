//! # EmberKV
//!
//! An in-memory key-value store with:
//! - One durability file per key, rewritten on every change
//! - Whole-store snapshots for point-in-time backup and restore
//! - Startup replay that survives individual corrupted files
//! - Single lock: concurrent readers, exclusive writers
//! - TCP protocol with a primary/replica access gate
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │                  (Multiple Clients)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Request Handler                             │
//! │          (Role gate, request validation)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Engine                                  │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌─────────────────┐               ┌───────────────────┐
//!   │      Store      │◄──────────────│  RecoveryManager  │
//!   │    (RwLock)     │               │ (replay/snapshot) │
//!   └────────┬────────┘               └─────────┬─────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌─────────────────┐               ┌───────────────────┐
//!   │ Durability files│               │  Snapshot files   │
//!   │ (sha256(key))   │               │ (timestamp named) │
//!   └─────────────────┘               └───────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod durability;
pub mod snapshot;
pub mod store;
pub mod recovery;
pub mod engine;

pub mod protocol;
pub mod api;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{EmberError, Result};
pub use config::{Config, Role};
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of EmberKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
