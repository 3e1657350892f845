//! Store implementation
//!
//! HashMap-based store with RwLock for concurrency.

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::durability::DurabilityDir;
use crate::error::{EmberError, Result};

use super::SetOutcome;

/// The single source of truth for current key-value state
///
/// ## Concurrency
/// - `get`, `with_read`: shared guard, run concurrently
/// - `set`, `update`, `delete`, `replace_all`, `apply_during_replay`:
///   exclusive guard, mutually exclusive with everything else
/// - Not reentrant: never call back into the store from `with_read`
pub struct Store {
    /// Key → value
    data: RwLock<HashMap<String, String>>,

    /// Where live mutations are persisted
    durability: Arc<DurabilityDir>,
}

impl Store {
    /// Create an empty store persisting into `durability`
    pub fn new(durability: Arc<DurabilityDir>) -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            durability,
        }
    }

    /// Get a value by key (read lock)
    ///
    /// `None` is a normal outcome, not an error.
    pub fn get(&self, key: &str) -> Option<String> {
        self.data.read().get(key).cloned()
    }

    /// Insert or overwrite a key and persist it (write lock)
    ///
    /// The write counts as done only once the durability file is written.
    /// If that fails the in-memory value stays applied and `Persist` is
    /// returned.
    pub fn set(&self, key: &str, value: &str) -> Result<SetOutcome> {
        let mut data = self.data.write();

        let outcome = match data.insert(key.to_string(), value.to_string()) {
            Some(_) => SetOutcome::Updated,
            None => SetOutcome::Created,
        };

        self.durability
            .write_record(key, value)
            .map_err(|e| persist_error(key, e))?;

        tracing::debug!(key, ?outcome, "set");
        Ok(outcome)
    }

    /// Overwrite an existing key (write lock)
    ///
    /// Returns `KeyNotFound` without touching anything if the key is absent.
    pub fn update(&self, key: &str, value: &str) -> Result<()> {
        let mut data = self.data.write();

        match data.get_mut(key) {
            Some(slot) => *slot = value.to_string(),
            None => return Err(EmberError::KeyNotFound),
        }

        self.durability
            .write_record(key, value)
            .map_err(|e| persist_error(key, e))?;

        tracing::debug!(key, "update");
        Ok(())
    }

    /// Remove a key and its durability file (write lock)
    ///
    /// A key that was never set returns `KeyNotFound`. A missing file for a
    /// present key is not an error.
    pub fn delete(&self, key: &str) -> Result<()> {
        let mut data = self.data.write();

        if data.remove(key).is_none() {
            return Err(EmberError::KeyNotFound);
        }

        match self.durability.remove_record(key) {
            Ok(()) | Err(EmberError::KeyNotFound) => {}
            Err(e) => return Err(persist_error(key, e)),
        }

        tracing::debug!(key, "delete");
        Ok(())
    }

    /// Apply already-durable records without persisting them again
    ///
    /// Holds the write lock for the whole batch. Returns how many records
    /// were applied.
    pub fn apply_during_replay<I>(&self, records: I) -> usize
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut data = self.data.write();
        let mut applied = 0;
        for (key, value) in records {
            data.insert(key, value);
            applied += 1;
        }
        applied
    }

    /// Swap in a whole new mapping and re-persist it (write lock)
    ///
    /// Concurrent readers see either the old or the new mapping. After the
    /// swap, durability files are rewritten for every key in the new state
    /// and removed for keys that are gone, so a later restart replays the
    /// restored state. The swap stays applied even if some of that I/O
    /// fails; the first failure is returned.
    pub fn replace_all(&self, entries: HashMap<String, String>) -> Result<()> {
        let mut data = self.data.write();
        let previous = mem::replace(&mut *data, entries);

        let mut first_error: Option<EmberError> = None;
        let mut failures = 0usize;

        for key in previous.keys().filter(|key| !data.contains_key(*key)) {
            match self.durability.remove_record(key) {
                Ok(()) | Err(EmberError::KeyNotFound) => {}
                Err(e) => {
                    failures += 1;
                    first_error.get_or_insert_with(|| persist_error(key, e));
                }
            }
        }

        for (key, value) in data.iter() {
            if let Err(e) = self.durability.write_record(key, value) {
                failures += 1;
                first_error.get_or_insert_with(|| persist_error(key, e));
            }
        }

        tracing::debug!(
            previous = previous.len(),
            restored = data.len(),
            failures,
            "replace_all"
        );

        match first_error {
            Some(e) => {
                tracing::warn!("{} durability files not synced after restore", failures);
                Err(e)
            }
            None => Ok(()),
        }
    }

    /// Run `f` against a consistent view of the mapping (read lock)
    ///
    /// Writers are blocked until `f` returns.
    pub fn with_read<R>(&self, f: impl FnOnce(&HashMap<String, String>) -> R) -> R {
        let data = self.data.read();
        f(&data)
    }

    /// Copy of every entry
    pub fn entries(&self) -> HashMap<String, String> {
        self.data.read().clone()
    }

    /// Whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Get entry count
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Get the durability directory handle
    pub fn durability(&self) -> &Arc<DurabilityDir> {
        &self.durability
    }
}

fn persist_error(key: &str, err: EmberError) -> EmberError {
    match err {
        EmberError::Io(source) => EmberError::persist(key, source),
        other => other,
    }
}
