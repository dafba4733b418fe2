//! Persistence of the two records that outlive a process.
//!
//! The core only ever touches two keys: the integer high score and the
//! 36-byte calibration blob. Stores are read once at startup and written once
//! at teardown by `GameContext`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

mod json_file;

pub use json_file::JsonFileStore;

/// Persist keys used by the game
pub struct StoreKey {}

impl StoreKey {
    /// Integer high score
    pub const HIGH_SCORE: u32 = 10;

    /// Calibration profile blob
    pub const CALIBRATION: u32 = 11;
}

/// Value held under one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoredValue {
    Int(i32),
    Blob(Vec<u8>),
}

/// Key-value persistence collaborator
pub trait PersistenceStore {
    /// Read a record; `Ok(None)` when the key was never written
    fn load(&self, key: u32) -> Result<Option<StoredValue>, StorageError>;

    /// Write a record, replacing any previous value
    fn save(&mut self, key: u32, value: StoredValue) -> Result<(), StorageError>;

    /// Make previous saves durable
    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// In-process store, used by tests and replays
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    records: BTreeMap<u32, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PersistenceStore for MemoryStore {
    fn load(&self, key: u32) -> Result<Option<StoredValue>, StorageError> {
        Ok(self.records.get(&key).cloned())
    }

    fn save(&mut self, key: u32, value: StoredValue) -> Result<(), StorageError> {
        self.records.insert(key, value);
        Ok(())
    }
}

impl<S: PersistenceStore + ?Sized> PersistenceStore for Box<S> {
    fn load(&self, key: u32) -> Result<Option<StoredValue>, StorageError> {
        (**self).load(key)
    }

    fn save(&mut self, key: u32, value: StoredValue) -> Result<(), StorageError> {
        (**self).save(key, value)
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        (**self).flush()
    }
}
