//! Durability File Module
//!
//! Persists every live key as its own file so a restart can rebuild the
//! store key by key.
//!
//! ## Responsibilities
//! - Content-addressed file naming (SHA-256 of the key, hex encoded)
//! - Flat encode/decode of a single record
//! - Whole-file rewrite on every update (write temp, then rename)
//! - Enumerating record files for replay
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Header (17 bytes)                                            │
//! │ ┌──────────┬─────────┬──────────┬──────────┬──────────────┐ │
//! │ │Magic (4) │ Ver (1) │KeyLen (4)│ValLen (4)│ CRC32 (4)    │ │
//! │ └──────────┴─────────┴──────────┴──────────┴──────────────┘ │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Key bytes | Value bytes                                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Files written by older deployments contain `key + " " + value` with no
//! header. They are still readable (split on the first space) and get
//! rewritten in the framed format on the next update of that key.

mod dir;
mod record;

pub use dir::DurabilityDir;
pub use record::{file_name_for, is_record_file_name, DurabilityRecord, HEADER_SIZE, MAGIC};
