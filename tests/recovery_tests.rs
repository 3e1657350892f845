//! Tests for the Recovery Manager
//!
//! These tests verify:
//! - Replay of durability files into an empty store
//! - Replay continues past corrupted, misnamed and legacy files
//! - Snapshot capture naming and same-second collision handling
//! - Snapshot restore overwrite semantics and error cases
//! - Snapshot listing order

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use emberkv::config::DurabilitySync;
use emberkv::durability::{file_name_for, DurabilityDir};
use emberkv::recovery::RecoveryManager;
use emberkv::snapshot::{self, SnapshotCodec};
use emberkv::store::Store;
use emberkv::EmberError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

struct Fixture {
    temp: TempDir,
    store: Arc<Store>,
    recovery: RecoveryManager,
}

impl Fixture {
    fn storage_dir(&self) -> std::path::PathBuf {
        self.temp.path().join("storage")
    }

    fn snapshot_dir(&self) -> std::path::PathBuf {
        self.temp.path().join("snapshots")
    }
}

fn setup() -> Fixture {
    let temp = TempDir::new().unwrap();
    open_at(temp)
}

/// Fresh store + manager over an existing directory (simulated restart)
fn open_at(temp: TempDir) -> Fixture {
    let durability = Arc::new(
        DurabilityDir::open(&temp.path().join("storage"), DurabilitySync::OsBuffered).unwrap(),
    );
    let store = Arc::new(Store::new(durability));
    let recovery = RecoveryManager::new(Arc::clone(&store), &temp.path().join("snapshots"));
    Fixture {
        temp,
        store,
        recovery,
    }
}

fn restart(fixture: Fixture) -> Fixture {
    let Fixture { temp, .. } = fixture;
    open_at(temp)
}

fn write_snapshot_file(dir: &Path, name: &str, entries: &[(&str, &str)]) {
    let entries: HashMap<String, String> = entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), SnapshotCodec::encode(&entries, 0).unwrap()).unwrap();
}

// =============================================================================
// Restore From Storage Tests
// =============================================================================

#[test]
fn test_replay_empty_directory() {
    let fixture = setup();

    let report = fixture.recovery.restore_from_storage().unwrap();

    assert_eq!(report.files_scanned, 0);
    assert_eq!(report.records_recovered, 0);
    assert_eq!(report.records_corrupted, 0);
    assert!(fixture.store.is_empty());
}

#[test]
fn test_replay_restores_written_keys() {
    let fixture = setup();
    for i in 0..20 {
        fixture
            .store
            .set(&format!("key{}", i), &format!("value {}", i))
            .unwrap();
    }
    fixture.store.delete("key7").unwrap();
    let before = fixture.store.entries();

    let fixture = restart(fixture);
    assert!(fixture.store.is_empty());

    let report = fixture.recovery.restore_from_storage().unwrap();

    assert_eq!(report.records_recovered, 19);
    assert_eq!(report.records_corrupted, 0);
    assert_eq!(fixture.store.entries(), before);
}

#[test]
fn test_replay_does_not_rewrite_files() {
    let fixture = setup();
    fixture.store.set("key", "value").unwrap();
    let path = fixture.storage_dir().join(file_name_for("key"));
    let modified = fs::metadata(&path).unwrap().modified().unwrap();

    let fixture = restart(fixture);
    fixture.recovery.restore_from_storage().unwrap();

    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), modified);
}

#[test]
fn test_replay_skips_corrupted_file_and_continues() {
    let fixture = setup();
    fixture.store.set("good1", "a").unwrap();
    fixture.store.set("good2", "b").unwrap();
    fixture.store.set("bad", "c").unwrap();

    // Flip the last byte of one record so its CRC no longer matches
    let bad_path = fixture.storage_dir().join(file_name_for("bad"));
    let mut bytes = fs::read(&bad_path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&bad_path, bytes).unwrap();

    let fixture = restart(fixture);
    let report = fixture.recovery.restore_from_storage().unwrap();

    assert_eq!(report.files_scanned, 3);
    assert_eq!(report.records_recovered, 2);
    assert_eq!(report.records_corrupted, 1);
    assert_eq!(report.corrupted_files, vec![bad_path]);
    assert_eq!(fixture.store.get("good1"), Some("a".to_string()));
    assert_eq!(fixture.store.get("good2"), Some("b".to_string()));
    assert_eq!(fixture.store.get("bad"), None);
}

#[test]
fn test_replay_skips_misnamed_record() {
    let fixture = setup();
    fixture.store.set("real", "v").unwrap();

    // Valid record stored under another key's name
    let wrong_name = fixture.storage_dir().join(file_name_for("someone-else"));
    fs::copy(fixture.storage_dir().join(file_name_for("real")), &wrong_name).unwrap();

    let fixture = restart(fixture);
    let report = fixture.recovery.restore_from_storage().unwrap();

    assert_eq!(report.records_recovered, 1);
    assert_eq!(report.corrupted_files, vec![wrong_name]);
}

#[test]
fn test_replay_reads_legacy_files() {
    let fixture = setup();
    fs::write(
        fixture.storage_dir().join(file_name_for("motto")),
        b"motto carpe diem",
    )
    .unwrap();

    let report = fixture.recovery.restore_from_storage().unwrap();

    assert_eq!(report.records_recovered, 1);
    assert_eq!(fixture.store.get("motto"), Some("carpe diem".to_string()));
}

#[test]
fn test_replay_ignores_interrupted_writes() {
    let fixture = setup();
    fixture.store.set("key", "committed").unwrap();
    fs::write(
        fixture
            .storage_dir()
            .join(format!("{}.tmp", file_name_for("key"))),
        b"half written",
    )
    .unwrap();

    let fixture = restart(fixture);
    let report = fixture.recovery.restore_from_storage().unwrap();

    assert_eq!(report.files_scanned, 1);
    assert_eq!(fixture.store.get("key"), Some("committed".to_string()));
}

// =============================================================================
// Take Snapshot Tests
// =============================================================================

#[test]
fn test_take_snapshot_writes_named_file() {
    let fixture = setup();
    fixture.store.set("a", "1").unwrap();

    let path = fixture.recovery.take_snapshot().unwrap();

    assert_eq!(path.parent().unwrap(), fixture.snapshot_dir());
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(snapshot::is_snapshot_file_name(&name), "bad name {}", name);

    let body = SnapshotCodec::decode(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(body.entries.get("a"), Some(&"1".to_string()));
}

#[test]
fn test_take_snapshot_of_empty_store() {
    let fixture = setup();

    let path = fixture.recovery.take_snapshot().unwrap();

    let body = SnapshotCodec::decode(&fs::read(&path).unwrap()).unwrap();
    assert!(body.entries.is_empty());
}

#[test]
fn test_snapshots_in_same_second_never_overwrite() {
    let fixture = setup();

    let mut paths = Vec::new();
    for i in 0..5 {
        fixture.store.set("counter", &i.to_string()).unwrap();
        paths.push(fixture.recovery.take_snapshot().unwrap());
    }

    let mut unique = paths.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 5);

    // Each file still holds the value current at its capture
    for (i, path) in paths.iter().enumerate() {
        let body = SnapshotCodec::decode(&fs::read(path).unwrap()).unwrap();
        assert_eq!(body.entries["counter"], i.to_string());
    }
}

// =============================================================================
// Restore From Snapshot Tests
// =============================================================================

#[test]
fn test_restore_overwrites_instead_of_merging() {
    let fixture = setup();
    fixture.store.set("a", "1").unwrap();
    fixture.store.set("b", "2").unwrap();
    let snap = fixture.recovery.take_snapshot().unwrap();
    let captured = fixture.store.entries();

    fixture.store.delete("a").unwrap();
    fixture.store.set("b", "changed").unwrap();
    fixture.store.set("c", "later").unwrap();

    fixture.recovery.restore_from_snapshot(&snap).unwrap();

    assert_eq!(fixture.store.entries(), captured);
}

#[test]
fn test_restore_by_bare_file_name() {
    let fixture = setup();
    write_snapshot_file(
        &fixture.snapshot_dir(),
        "snapshot-2023-06-27-22:08:35.snap",
        &[("x", "y")],
    );

    fixture
        .recovery
        .restore_from_snapshot(Path::new("snapshot-2023-06-27-22:08:35.snap"))
        .unwrap();

    assert_eq!(fixture.store.get("x"), Some("y".to_string()));
}

#[test]
fn test_restore_is_durable_across_restart() {
    let fixture = setup();
    fixture.store.set("a", "1").unwrap();
    let snap = fixture.recovery.take_snapshot().unwrap();
    fixture.store.delete("a").unwrap();
    fixture.store.set("b", "2").unwrap();

    fixture.recovery.restore_from_snapshot(&snap).unwrap();

    let fixture = restart(fixture);
    fixture.recovery.restore_from_storage().unwrap();
    assert_eq!(fixture.store.get("a"), Some("1".to_string()));
    assert_eq!(fixture.store.get("b"), None);
}

#[test]
fn test_restore_missing_snapshot() {
    let fixture = setup();
    fixture.store.set("a", "1").unwrap();

    let result = fixture
        .recovery
        .restore_from_snapshot(Path::new("snapshot-1999-01-01-00:00:00.snap"));

    assert!(matches!(result, Err(EmberError::SnapshotNotFound(_))));
    assert_eq!(fixture.store.get("a"), Some("1".to_string()));
}

#[test]
fn test_restore_corrupted_snapshot_leaves_store_untouched() {
    let fixture = setup();
    fixture.store.set("a", "1").unwrap();
    let snap = fixture.recovery.take_snapshot().unwrap();

    let bytes = fs::read(&snap).unwrap();
    fs::write(&snap, &bytes[..bytes.len() / 2]).unwrap();
    fixture.store.set("b", "2").unwrap();
    let before = fixture.store.entries();

    let result = fixture.recovery.restore_from_snapshot(&snap);

    assert!(matches!(result, Err(EmberError::Decode(_))));
    assert_eq!(fixture.store.entries(), before);
}

// =============================================================================
// List Snapshot Tests
// =============================================================================

#[test]
fn test_list_snapshots_chronological() {
    let fixture = setup();
    let dir = fixture.snapshot_dir();
    write_snapshot_file(&dir, "snapshot-2023-06-27-22:08:36.snap", &[]);
    write_snapshot_file(&dir, "snapshot-2023-06-27-22:08:35-1.snap", &[]);
    write_snapshot_file(&dir, "snapshot-2023-06-27-22:08:35.snap", &[]);
    fs::write(dir.join("notes.txt"), b"ignore me").unwrap();

    let names: Vec<String> = fixture
        .recovery
        .list_snapshots()
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();

    assert_eq!(
        names,
        vec![
            "snapshot-2023-06-27-22:08:35.snap",
            "snapshot-2023-06-27-22:08:35-1.snap",
            "snapshot-2023-06-27-22:08:36.snap",
        ]
    );
}

#[test]
fn test_list_snapshots_without_directory() {
    let fixture = setup();
    assert!(fixture.recovery.list_snapshots().unwrap().is_empty());
}
