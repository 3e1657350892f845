//! Durability record codec
//!
//! Maps keys to file names and encodes/decodes one key-value record.

use sha2::{Digest, Sha256};

use crate::error::{EmberError, Result};

/// Magic bytes opening every framed record. The leading NUL keeps it from
/// ever matching a legacy `key value` text file.
pub const MAGIC: &[u8; 4] = b"\0EKV";

/// Current record format version
pub const VERSION: u8 = 1;

/// Header size: Magic (4) + Version (1) + KeyLen (4) + ValLen (4) + CRC (4)
pub const HEADER_SIZE: usize = 17;

/// Separator used by the legacy `key value` layout
const LEGACY_SEPARATOR: u8 = b' ';

/// Length of a hex-encoded SHA-256 digest
const FILE_NAME_LEN: usize = 64;

/// Deterministic file name for a key: lowercase hex of SHA-256(key)
pub fn file_name_for(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{:x}", digest)
}

/// Whether `name` looks like a record file produced by [`file_name_for`]
pub fn is_record_file_name(name: &str) -> bool {
    name.len() == FILE_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// A single key-value record as stored in its durability file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurabilityRecord {
    pub key: String,
    pub value: String,
}

impl DurabilityRecord {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Encode a record in the framed format
    ///
    /// Format: magic (4) + version (1) + key_len (4) + value_len (4) + crc (4) + key + value
    pub fn encode(key: &str, value: &str) -> Vec<u8> {
        let key = key.as_bytes();
        let value = value.as_bytes();

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(key);
        hasher.update(value);
        let crc = hasher.finalize();

        let mut buf = Vec::with_capacity(HEADER_SIZE + key.len() + value.len());
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
        buf.extend_from_slice(&crc.to_le_bytes());
        buf.extend_from_slice(key);
        buf.extend_from_slice(value);
        buf
    }

    /// Decode the contents of a durability file
    ///
    /// Framed files are fully validated. Anything without the magic prefix
    /// is read as a legacy `key value` file.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(MAGIC) {
            Self::decode_framed(bytes)
        } else {
            Self::decode_legacy(bytes)
        }
    }

    fn decode_framed(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(EmberError::Parse(format!(
                "Incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let version = bytes[4];
        if version != VERSION {
            return Err(EmberError::Parse(format!(
                "Unsupported record version: {}",
                version
            )));
        }

        let key_len = u32::from_le_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]) as usize;
        let value_len = u32::from_le_bytes([bytes[9], bytes[10], bytes[11], bytes[12]]) as usize;
        let stored_crc = u32::from_le_bytes([bytes[13], bytes[14], bytes[15], bytes[16]]);

        let expected_len = HEADER_SIZE
            .checked_add(key_len)
            .and_then(|n| n.checked_add(value_len))
            .ok_or_else(|| EmberError::Parse("Record lengths overflow".to_string()))?;

        if bytes.len() != expected_len {
            return Err(EmberError::Parse(format!(
                "Record length mismatch: expected {} bytes, got {}",
                expected_len,
                bytes.len()
            )));
        }

        let key = &bytes[HEADER_SIZE..HEADER_SIZE + key_len];
        let value = &bytes[HEADER_SIZE + key_len..];

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(key);
        hasher.update(value);
        let computed_crc = hasher.finalize();
        if computed_crc != stored_crc {
            return Err(EmberError::Parse(format!(
                "CRC mismatch: stored {:08x}, computed {:08x}",
                stored_crc, computed_crc
            )));
        }

        Ok(Self {
            key: utf8(key, "key")?,
            value: utf8(value, "value")?,
        })
    }

    /// Split on the first separator; everything after it is the value
    fn decode_legacy(bytes: &[u8]) -> Result<Self> {
        let split = bytes
            .iter()
            .position(|&b| b == LEGACY_SEPARATOR)
            .ok_or_else(|| EmberError::Parse("Missing key/value separator".to_string()))?;

        Ok(Self {
            key: utf8(&bytes[..split], "key")?,
            value: utf8(&bytes[split + 1..], "value")?,
        })
    }
}

fn utf8(bytes: &[u8], what: &str) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| EmberError::Parse(format!("Invalid UTF-8 in {}: {}", what, e)))
}
