//! Store Module
//!
//! The in-memory mapping and the single point of concurrency control.
//!
//! ## Responsibilities
//! - Hold the current key-value state
//! - Shared access for reads, exclusive access for every mutation
//! - Persist each live mutation to its durability file under the same guard
//! - Bulk replay and whole-map replacement for recovery
//!
//! ## Data Structure Choice
//! `HashMap` behind a `parking_lot::RwLock`:
//! - No ordering requirement (nothing is flushed in key order)
//! - Readers never block each other
//! - Durability I/O happens while the write guard is held, so a slow disk
//!   serializes writers and stalls readers for that duration

mod table;

pub use table::Store;

/// Whether a `set` created a new key or replaced an existing value
///
/// Both end in the same durability file state; callers use it for replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Created,
    Updated,
}
