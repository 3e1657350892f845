//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type
//! - GET, DELETE:  key_len (4 bytes) + key
//! - SET, UPDATE:  key_len (4 bytes) + key + value
//! - RESTORE:      snapshot name
//! - PING, SNAPSHOT, LIST_SNAPSHOTS: empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! All integers are big-endian. Keys, values and names must be UTF-8.

use std::io::{Read, Write};

use bytes::{Buf, BufMut};

use crate::error::{EmberError, Result};

use super::{Command, Response, Status};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Vec<u8> {
    let payload = match command {
        Command::Get { key } | Command::Delete { key } => keyed_payload(key, ""),
        Command::Set { key, value } | Command::Update { key, value } => {
            keyed_payload(key, value)
        }
        Command::Restore { name } => name.as_bytes().to_vec(),
        Command::Ping | Command::Snapshot | Command::ListSnapshots => Vec::new(),
    };

    frame(command.command_type() as u8, &payload)
}

/// key_len (4) + key + value
fn keyed_payload(key: &str, value: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(4 + key.len() + value.len());
    payload.put_u32(key.len() as u32);
    payload.put_slice(key.as_bytes());
    payload.put_slice(value.as_bytes());
    payload
}

/// header + payload
fn frame(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(tag);
    message.put_u32(payload.len() as u32);
    message.put_slice(payload);
    message
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (cmd_type, payload) = split_frame(bytes, "")?;

    match cmd_type {
        0x01 => {
            let (key, rest) = decode_key(payload, "GET")?;
            expect_empty(rest, "GET")?;
            Ok(Command::Get { key })
        }
        0x02 => {
            let (key, rest) = decode_key(payload, "SET")?;
            let value = utf8(rest, "SET value")?;
            Ok(Command::Set { key, value })
        }
        0x03 => {
            let (key, rest) = decode_key(payload, "DELETE")?;
            expect_empty(rest, "DELETE")?;
            Ok(Command::Delete { key })
        }
        0x04 => {
            expect_empty(payload, "PING")?;
            Ok(Command::Ping)
        }
        0x05 => {
            let (key, rest) = decode_key(payload, "UPDATE")?;
            let value = utf8(rest, "UPDATE value")?;
            Ok(Command::Update { key, value })
        }
        0x06 => {
            expect_empty(payload, "SNAPSHOT")?;
            Ok(Command::Snapshot)
        }
        0x07 => {
            let name = utf8(payload, "RESTORE name")?;
            Ok(Command::Restore { name })
        }
        0x08 => {
            expect_empty(payload, "LIST_SNAPSHOTS")?;
            Ok(Command::ListSnapshots)
        }
        _ => Err(EmberError::Protocol(format!(
            "Unknown command type: 0x{:02x}",
            cmd_type
        ))),
    }
}

/// Check the header and return (tag, payload)
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(EmberError::Protocol(format!(
            "Incomplete {}header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_SIZE];
    let tag = header.get_u8();
    let payload_len = header.get_u32();
    check_payload_len(payload_len)?;

    let total_len = HEADER_SIZE + payload_len as usize;
    if bytes.len() < total_len {
        return Err(EmberError::Protocol(format!(
            "Incomplete {}payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((tag, &bytes[HEADER_SIZE..total_len]))
}

fn check_payload_len(payload_len: u32) -> Result<()> {
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(EmberError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

/// Read key_len + key, returning the key and whatever follows it
fn decode_key<'a>(payload: &'a [u8], command: &str) -> Result<(String, &'a [u8])> {
    let mut cursor = payload;
    if cursor.remaining() < 4 {
        return Err(EmberError::Protocol(format!(
            "{} command: missing key length",
            command
        )));
    }

    let key_len = cursor.get_u32() as usize;
    if cursor.remaining() < key_len {
        return Err(EmberError::Protocol(format!(
            "{} command: incomplete key (expected {}, got {})",
            command,
            key_len,
            cursor.remaining()
        )));
    }

    let key = utf8(&cursor[..key_len], command)?;
    Ok((key, &cursor[key_len..]))
}

fn expect_empty(rest: &[u8], command: &str) -> Result<()> {
    if !rest.is_empty() {
        return Err(EmberError::Protocol(format!(
            "{} command: unexpected {} trailing bytes",
            command,
            rest.len()
        )));
    }
    Ok(())
}

fn utf8(bytes: &[u8], what: &str) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| EmberError::Protocol(format!("{}: invalid UTF-8", what)))
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    frame(response.status as u8, payload)
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes, "response ")?;

    let status = Status::from_byte(status_byte).ok_or_else(|| {
        EmberError::Protocol(format!("Unknown response status: 0x{:02x}", status_byte))
    })?;

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one frame (header + payload) from a stream
fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = (&header[1..]).get_u32();
    check_payload_len(payload_len)?;

    let mut message = vec![0u8; HEADER_SIZE + payload_len as usize];
    message[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }
    Ok(message)
}

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let message = read_frame(reader)?;
    decode_command(&message)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writer.write_all(&encode_command(command))?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_frame(reader)?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response))?;
    writer.flush()?;
    Ok(())
}
