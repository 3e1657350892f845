//! Snapshot file naming

use chrono::{DateTime, Local};

/// Every snapshot file name starts with this
pub const PREFIX: &str = "snapshot-";

/// Snapshot file extension
pub const EXTENSION: &str = "snap";

/// Length of a `YYYY-MM-DD-HH:MM:SS` stamp
const STAMP_LEN: usize = 19;

/// Capture time at second granularity: `YYYY-MM-DD-HH:MM:SS`
pub fn timestamp(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d-%H:%M:%S").to_string()
}

/// File name for a capture at `stamp`
///
/// Attempt 0 is the plain name; later attempts (same-second captures)
/// get a `-<n>` suffix.
/// "2024-01-02-03:04:05", 0 → "snapshot-2024-01-02-03:04:05.snap"
/// "2024-01-02-03:04:05", 2 → "snapshot-2024-01-02-03:04:05-2.snap"
pub fn file_name(stamp: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("{}{}.{}", PREFIX, stamp, EXTENSION)
    } else {
        format!("{}{}-{}.{}", PREFIX, stamp, attempt, EXTENSION)
    }
}

/// Split a snapshot file name into its stamp and attempt number
///
/// "snapshot-2024-01-02-03:04:05-2.snap" → Some(("2024-01-02-03:04:05", 2))
pub fn parse_file_name(name: &str) -> Option<(&str, u32)> {
    let rest = name.strip_prefix(PREFIX)?;
    let rest = rest.strip_suffix(EXTENSION)?.strip_suffix('.')?;
    if rest.len() < STAMP_LEN || !rest.is_char_boundary(STAMP_LEN) {
        return None;
    }

    let (stamp, suffix) = rest.split_at(STAMP_LEN);
    let attempt = if suffix.is_empty() {
        0
    } else {
        suffix.strip_prefix('-')?.parse().ok()?
    };
    Some((stamp, attempt))
}

/// Whether `name` looks like a snapshot file
pub fn is_snapshot_file_name(name: &str) -> bool {
    parse_file_name(name).is_some()
}
