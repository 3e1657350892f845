//! Snapshot Module
//!
//! Whole-store backups: one self-contained file per capture.
//!
//! ## Responsibilities
//! - Serialize the complete mapping into one checksummed blob
//! - Decode a blob into a fresh mapping (never touching live state)
//! - Timestamp-based file naming with collision suffixes
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Header (26 bytes)                                            │
//! │   Magic: "EKVS" (4) | Version: u16 (2) | Count: u64 (8)      │
//! │   PayloadLen: u64 (8) | PayloadCRC: u32 (4)                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Payload (bincode)                                            │
//! │   created_at: i64 | entries: map<string, string>             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! bincode length-prefixes every string, so empty values and values
//! containing spaces round-trip exactly.

mod codec;
mod naming;

pub use codec::{SnapshotBody, SnapshotCodec, HEADER_SIZE, MAGIC};
pub use naming::{file_name, is_snapshot_file_name, parse_file_name, timestamp, EXTENSION, PREFIX};
