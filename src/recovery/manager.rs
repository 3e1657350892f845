//! Recovery Manager
//!
//! Replays durability files, captures snapshots and restores them.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;

use crate::durability::{file_name_for, DurabilityDir, DurabilityRecord};
use crate::error::{EmberError, Result};
use crate::snapshot::{self, SnapshotCodec};
use crate::store::Store;

use super::RecoveryReport;

/// How many suffixed names are tried for same-second snapshots
pub const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Drives replay, snapshot capture and snapshot restore against one store
pub struct RecoveryManager {
    /// Store being recovered into / captured from
    store: Arc<Store>,

    /// Source of per-key records
    durability: Arc<DurabilityDir>,

    /// Where snapshot files live
    snapshot_dir: PathBuf,
}

impl RecoveryManager {
    pub fn new(store: Arc<Store>, snapshot_dir: &Path) -> Self {
        let durability = Arc::clone(store.durability());
        Self {
            store,
            durability,
            snapshot_dir: snapshot_dir.to_path_buf(),
        }
    }

    /// Replay every durability file into the store
    ///
    /// Files are read and decoded without holding the store lock; the good
    /// records are then applied in one exclusive section, without being
    /// persisted again. A bad file is logged and counted but does not stop
    /// the rest of the replay. Only failing to list the directory aborts.
    pub fn restore_from_storage(&self) -> Result<RecoveryReport> {
        tracing::info!("Replaying durability files from {}", self.durability.dir().display());

        let paths = self.durability.scan()?;
        let mut report = RecoveryReport {
            files_scanned: paths.len() as u64,
            ..RecoveryReport::default()
        };

        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            match self.load_record(&path) {
                Ok(record) => records.push((record.key, record.value)),
                Err(e) => {
                    tracing::warn!("Skipping durability file {}: {}", path.display(), e);
                    report.records_corrupted += 1;
                    report.corrupted_files.push(path);
                }
            }
        }

        report.records_recovered = self.store.apply_during_replay(records) as u64;

        tracing::info!(
            "Replay finished: {} files, {} recovered, {} corrupted",
            report.files_scanned,
            report.records_recovered,
            report.records_corrupted
        );
        Ok(report)
    }

    /// Read one record and check it sits under the name its key hashes to
    fn load_record(&self, path: &Path) -> Result<DurabilityRecord> {
        let record = self.durability.read_record(path)?;

        let expected = file_name_for(&record.key);
        let actual = path.file_name().map(|n| n.to_string_lossy());
        if actual.as_deref() != Some(expected.as_str()) {
            return Err(EmberError::Parse(format!(
                "file name does not match key hash (expected {})",
                expected
            )));
        }

        Ok(record)
    }

    /// Capture the whole store into a new snapshot file
    ///
    /// Encoding runs under the store's read lock, so the snapshot is a
    /// single point-in-time view; writers wait until it is encoded.
    /// Same-second captures get a numeric suffix. An existing snapshot is
    /// never overwritten.
    pub fn take_snapshot(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.snapshot_dir)?;

        let now = Local::now();
        let (bytes, entry_count) = self.store.with_read(|entries| {
            SnapshotCodec::encode(entries, now.timestamp()).map(|bytes| (bytes, entries.len()))
        })?;

        let stamp = snapshot::timestamp(now);
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self.snapshot_dir.join(snapshot::file_name(&stamp, attempt));

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            let written = file.write_all(&bytes).and_then(|()| file.sync_all());
            if let Err(e) = written {
                drop(file);
                let _ = fs::remove_file(&path);
                return Err(e.into());
            }

            tracing::info!(
                "Snapshot written: {} ({} entries, {} bytes)",
                path.display(),
                entry_count,
                bytes.len()
            );
            return Ok(path);
        }

        Err(EmberError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free snapshot name for {} after {} attempts", stamp, MAX_NAME_ATTEMPTS),
        )))
    }

    /// Replace the store's contents with a snapshot
    ///
    /// A bare file name is looked up in the snapshot directory; any path
    /// with a directory component is used as given. The snapshot is fully
    /// decoded before the store is touched, so a bad file leaves the store
    /// as it was.
    pub fn restore_from_snapshot(&self, path: &Path) -> Result<()> {
        let path = self.resolve(path);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(EmberError::SnapshotNotFound(path))
            }
            Err(e) => return Err(e.into()),
        };

        let body = SnapshotCodec::decode(&bytes)?;
        let restored = body.entries.len();
        self.store.replace_all(body.entries)?;

        tracing::info!(
            "Restored {} entries from {} (captured at {})",
            restored,
            path.display(),
            body.created_at
        );
        Ok(())
    }

    /// Snapshot files in the snapshot directory, oldest first
    pub fn list_snapshots(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.snapshot_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some((stamp, attempt)) = snapshot::parse_file_name(&name) {
                found.push((stamp.to_string(), attempt, entry.path()));
            }
        }

        found.sort();
        Ok(found.into_iter().map(|(_, _, path)| path).collect())
    }

    /// Resolve a caller-supplied snapshot reference to a file path
    fn resolve(&self, path: &Path) -> PathBuf {
        let bare = path.parent().map_or(true, |p| p.as_os_str().is_empty());
        if bare {
            self.snapshot_dir.join(path)
        } else {
            path.to_path_buf()
        }
    }

    /// Get the snapshot directory path
    pub fn snapshot_dir(&self) -> &Path {
        &self.snapshot_dir
    }
}
