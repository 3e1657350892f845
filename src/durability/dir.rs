//! Durability directory
//!
//! Reads, writes and removes record files inside the durability directory.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::config::DurabilitySync;
use crate::error::{EmberError, Result};

use super::record::{file_name_for, is_record_file_name, DurabilityRecord};

/// Suffix of the scratch file a record is written to before the rename
const TMP_SUFFIX: &str = "tmp";

/// Handle on the directory holding one durability file per key
///
/// Stateless apart from its path: every method goes straight to the
/// filesystem, so callers decide what locking surrounds it.
#[derive(Debug)]
pub struct DurabilityDir {
    /// Directory holding the record files
    dir: PathBuf,

    /// Whether each write is fsynced before it becomes visible
    sync: DurabilitySync,
}

impl DurabilityDir {
    /// Open (and create if needed) a durability directory
    pub fn open(path: &Path, sync: DurabilitySync) -> Result<Self> {
        fs::create_dir_all(path)?;
        Ok(Self {
            dir: path.to_path_buf(),
            sync,
        })
    }

    /// Path of the durability file for `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(file_name_for(key))
    }

    /// Write (or fully rewrite) the durability file for `key`
    ///
    /// The record goes to `<hash>.tmp` first and is renamed into place, so
    /// a crash mid-write leaves the previous version intact.
    pub fn write_record(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp_path = path.with_extension(TMP_SUFFIX);
        let bytes = DurabilityRecord::encode(key, value);

        let written = self.write_file(&tmp_path, &bytes).and_then(|()| {
            fs::rename(&tmp_path, &path)?;
            Ok(())
        });

        if written.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        written
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(bytes)?;
        if self.sync == DurabilitySync::EveryWrite {
            file.sync_all()?;
        }
        Ok(())
    }

    /// Remove the durability file for `key`
    ///
    /// Returns `KeyNotFound` if there was no file.
    pub fn remove_record(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(EmberError::KeyNotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Read and decode one durability file
    pub fn read_record(&self, path: &Path) -> Result<DurabilityRecord> {
        let bytes = fs::read(path)?;
        DurabilityRecord::decode(&bytes)
    }

    /// List every record file in the directory, sorted by name
    ///
    /// Leftover `.tmp` files and foreign names are skipped.
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let name = entry.file_name();
            let name = name.to_string_lossy();
            if is_record_file_name(&name) {
                paths.push(path);
            } else if path.extension().map_or(false, |ext| ext == TMP_SUFFIX) {
                tracing::debug!("Skipping interrupted write {}", path.display());
            } else {
                tracing::warn!("Skipping unexpected file in durability dir: {}", path.display());
            }
        }

        paths.sort();
        Ok(paths)
    }

    /// Get the directory path
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
