//! Codec Tests
//!
//! Tests for command and response encoding/decoding.

use std::io::Cursor;

use emberkv::protocol::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, Command, CommandType, Response, Status,
    HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
use emberkv::EmberError;

// =============================================================================
// Helper Functions
// =============================================================================

fn roundtrip(cmd: Command) -> Command {
    decode_command(&encode_command(&cmd)).unwrap()
}

fn is_protocol_error<T: std::fmt::Debug>(result: emberkv::Result<T>) -> bool {
    matches!(result, Err(EmberError::Protocol(_)))
}

// =============================================================================
// Command Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_get() {
    let cmd = Command::Get {
        key: "hello".to_string(),
    };
    assert_eq!(roundtrip(cmd.clone()), cmd);
}

#[test]
fn test_encode_decode_set() {
    let cmd = Command::Set {
        key: "mykey".to_string(),
        value: "my value with spaces".to_string(),
    };
    assert_eq!(roundtrip(cmd.clone()), cmd);
}

#[test]
fn test_encode_decode_update() {
    let cmd = Command::Update {
        key: "mykey".to_string(),
        value: "newer".to_string(),
    };
    assert_eq!(roundtrip(cmd.clone()), cmd);
}

#[test]
fn test_encode_decode_delete() {
    let cmd = Command::Delete {
        key: "todelete".to_string(),
    };
    assert_eq!(roundtrip(cmd.clone()), cmd);
}

#[test]
fn test_encode_decode_payloadless_commands() {
    for cmd in [Command::Ping, Command::Snapshot, Command::ListSnapshots] {
        let encoded = encode_command(&cmd);
        assert_eq!(encoded.len(), HEADER_SIZE);
        assert_eq!(decode_command(&encoded).unwrap(), cmd);
    }
}

#[test]
fn test_encode_decode_restore() {
    let cmd = Command::Restore {
        name: "snapshot-2023-06-27-22:08:35.snap".to_string(),
    };
    assert_eq!(roundtrip(cmd.clone()), cmd);
}

#[test]
fn test_encode_decode_empty_key_and_value() {
    let cmd = Command::Set {
        key: String::new(),
        value: String::new(),
    };
    assert_eq!(roundtrip(cmd.clone()), cmd);
}

#[test]
fn test_encode_decode_unicode() {
    let cmd = Command::Set {
        key: "clé".to_string(),
        value: "värde 値".to_string(),
    };
    assert_eq!(roundtrip(cmd.clone()), cmd);
}

#[test]
fn test_command_type_classification() {
    assert!(CommandType::Set.is_write());
    assert!(CommandType::Update.is_write());
    assert!(CommandType::Delete.is_write());
    assert!(CommandType::Snapshot.is_write());
    assert!(CommandType::Restore.is_write());
    assert!(!CommandType::Get.is_write());
    assert!(!CommandType::Ping.is_write());
    assert!(!CommandType::ListSnapshots.is_write());

    assert_eq!(CommandType::Delete.name(), "DEL");
    assert_eq!(Command::ListSnapshots.command_type(), CommandType::ListSnapshots);
}

// =============================================================================
// Response Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_response_ok() {
    let resp = Response::ok(Some(b"value".to_vec()));
    let decoded = decode_response(&encode_response(&resp)).unwrap();

    assert_eq!(decoded, resp);
    assert_eq!(decoded.payload_text(), "value");
}

#[test]
fn test_encode_decode_response_ok_no_payload() {
    let resp = Response::ok(None);
    let decoded = decode_response(&encode_response(&resp)).unwrap();

    assert_eq!(decoded.status, Status::Ok);
    assert_eq!(decoded.payload, None);
}

#[test]
fn test_encode_decode_response_statuses() {
    let responses = [
        Response::created(),
        Response::not_found(),
        Response::error("disk on fire"),
        Response::forbidden("replica is read-only"),
        Response::bad_request("empty key"),
    ];

    for resp in responses {
        let decoded = decode_response(&encode_response(&resp)).unwrap();
        assert_eq!(decoded, resp);
    }
}

#[test]
fn test_status_from_byte() {
    assert_eq!(Status::from_byte(0x03), Some(Status::Created));
    assert_eq!(Status::from_byte(0x05), Some(Status::BadRequest));
    assert_eq!(Status::from_byte(0x42), None);
}

// =============================================================================
// Malformed Input Tests
// =============================================================================

#[test]
fn test_incomplete_header() {
    assert!(is_protocol_error(decode_command(&[0x01, 0x00])));
    assert!(is_protocol_error(decode_response(&[])));
}

#[test]
fn test_incomplete_payload() {
    let encoded = encode_command(&Command::Get {
        key: "hello".to_string(),
    });
    assert!(is_protocol_error(decode_command(&encoded[..encoded.len() - 1])));
}

#[test]
fn test_unknown_command_type() {
    assert!(is_protocol_error(decode_command(&[0xFF, 0, 0, 0, 0])));
}

#[test]
fn test_unknown_response_status() {
    assert!(is_protocol_error(decode_response(&[0xFF, 0, 0, 0, 0])));
}

#[test]
fn test_get_missing_key_length() {
    assert!(is_protocol_error(decode_command(&[0x01, 0, 0, 0, 2, 0, 0])));
}

#[test]
fn test_key_length_exceeds_payload() {
    // key_len says 10, only 3 key bytes follow
    let bytes = [0x01, 0, 0, 0, 7, 0, 0, 0, 10, b'a', b'b', b'c'];
    assert!(is_protocol_error(decode_command(&bytes)));
}

#[test]
fn test_get_with_trailing_bytes() {
    let bytes = [0x01, 0, 0, 0, 6, 0, 0, 0, 1, b'k', b'!'];
    assert!(is_protocol_error(decode_command(&bytes)));
}

#[test]
fn test_ping_with_unexpected_payload() {
    assert!(is_protocol_error(decode_command(&[0x04, 0, 0, 0, 1, 0xAA])));
}

#[test]
fn test_invalid_utf8_key() {
    let bytes = [0x01, 0, 0, 0, 5, 0, 0, 0, 1, 0xFF];
    assert!(is_protocol_error(decode_command(&bytes)));
}

#[test]
fn test_oversized_payload_rejected() {
    let mut bytes = vec![0x02];
    bytes.extend_from_slice(&(MAX_PAYLOAD_SIZE + 1).to_be_bytes());

    assert!(is_protocol_error(decode_command(&bytes)));
    assert!(is_protocol_error(read_command(&mut Cursor::new(bytes))));
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_write_read_command() {
    let cmd = Command::Set {
        key: "stream_key".to_string(),
        value: "stream_value".to_string(),
    };

    let mut buffer = Vec::new();
    write_command(&mut buffer, &cmd).unwrap();

    let mut cursor = Cursor::new(buffer);
    assert_eq!(read_command(&mut cursor).unwrap(), cmd);
}

#[test]
fn test_stream_write_read_response() {
    let resp = Response::ok(Some(b"stream_response".to_vec()));

    let mut buffer = Vec::new();
    write_response(&mut buffer, &resp).unwrap();

    let mut cursor = Cursor::new(buffer);
    assert_eq!(read_response(&mut cursor).unwrap(), resp);
}

#[test]
fn test_stream_multiple_commands() {
    let commands = vec![
        Command::Ping,
        Command::Set {
            key: "k1".to_string(),
            value: "v1".to_string(),
        },
        Command::Get {
            key: "k1".to_string(),
        },
        Command::Snapshot,
        Command::Delete {
            key: "k1".to_string(),
        },
    ];

    let mut buffer = Vec::new();
    for cmd in &commands {
        write_command(&mut buffer, cmd).unwrap();
    }

    let mut cursor = Cursor::new(buffer);
    for expected in &commands {
        assert_eq!(&read_command(&mut cursor).unwrap(), expected);
    }

    // Stream exhausted: clean EOF surfaces as an I/O error
    assert!(matches!(read_command(&mut cursor), Err(EmberError::Io(_))));
}

// =============================================================================
// Wire Format Tests
// =============================================================================

#[test]
fn test_wire_format_get() {
    let encoded = encode_command(&Command::Get {
        key: "ab".to_string(),
    });

    // cmd=0x01, len=6, key_len=2, key="ab"
    assert_eq!(encoded, vec![0x01, 0, 0, 0, 6, 0, 0, 0, 2, b'a', b'b']);
}

#[test]
fn test_wire_format_set() {
    let encoded = encode_command(&Command::Set {
        key: "k".to_string(),
        value: "v w".to_string(),
    });

    assert_eq!(
        encoded,
        vec![0x02, 0, 0, 0, 8, 0, 0, 0, 1, b'k', b'v', b' ', b'w']
    );
}

#[test]
fn test_wire_format_response_created() {
    assert_eq!(encode_response(&Response::created()), vec![0x03, 0, 0, 0, 0]);
}
