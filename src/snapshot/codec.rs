//! Snapshot codec
//!
//! Encodes the full mapping into one blob and back.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{EmberError, Result};

/// Magic bytes identifying an EmberKV snapshot file
pub const MAGIC: &[u8; 4] = b"EKVS";

/// Current snapshot format version
pub const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + Count (8) + PayloadLen (8) + CRC (4)
pub const HEADER_SIZE: usize = 26;

/// Decoded snapshot contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotBody {
    /// Capture time (unix seconds)
    pub created_at: i64,

    /// Every key-value pair at capture time
    pub entries: HashMap<String, String>,
}

/// Borrowed twin of `SnapshotBody` so encoding does not clone the map.
/// bincode writes both identically.
#[derive(Serialize)]
struct SnapshotBodyRef<'a> {
    created_at: i64,
    entries: &'a HashMap<String, String>,
}

/// Stateless encoder/decoder for snapshot blobs
pub struct SnapshotCodec;

impl SnapshotCodec {
    /// Serialize `entries` into a self-describing, checksummed blob
    pub fn encode(entries: &HashMap<String, String>, created_at: i64) -> Result<Vec<u8>> {
        let payload = bincode::serialize(&SnapshotBodyRef {
            created_at,
            entries,
        })
        .map_err(|e| EmberError::Serialization(e.to_string()))?;

        let crc = crc32fast::hash(&payload);

        let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.extend_from_slice(&(entries.len() as u64).to_le_bytes());
        buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        buf.extend_from_slice(&crc.to_le_bytes());
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    /// Decode a blob into a fresh `SnapshotBody`
    ///
    /// Truncated, corrupted or foreign input fails with `Decode`.
    pub fn decode(bytes: &[u8]) -> Result<SnapshotBody> {
        if bytes.len() < HEADER_SIZE {
            return Err(EmberError::Decode(format!(
                "Incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        if &bytes[0..4] != MAGIC {
            return Err(EmberError::Decode("Bad magic bytes".to_string()));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(EmberError::Decode(format!(
                "Unsupported snapshot version: {}",
                version
            )));
        }

        let entry_count = read_u64(&bytes[6..14]);
        let payload_len = read_u64(&bytes[14..22]);
        let stored_crc = u32::from_le_bytes([bytes[22], bytes[23], bytes[24], bytes[25]]);

        let payload = &bytes[HEADER_SIZE..];
        if payload.len() as u64 != payload_len {
            return Err(EmberError::Decode(format!(
                "Payload length mismatch: header says {} bytes, file has {}",
                payload_len,
                payload.len()
            )));
        }

        let computed_crc = crc32fast::hash(payload);
        if computed_crc != stored_crc {
            return Err(EmberError::Decode(format!(
                "CRC mismatch: stored {:08x}, computed {:08x}",
                stored_crc, computed_crc
            )));
        }

        let body: SnapshotBody =
            bincode::deserialize(payload).map_err(|e| EmberError::Decode(e.to_string()))?;

        if body.entries.len() as u64 != entry_count {
            return Err(EmberError::Decode(format!(
                "Entry count mismatch: header says {}, payload has {}",
                entry_count,
                body.entries.len()
            )));
        }

        Ok(body)
    }
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    u64::from_le_bytes(raw)
}
