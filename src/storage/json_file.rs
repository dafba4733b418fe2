// JsonFileStore - single JSON document on disk
//
// Records are kept in memory after `open` and written back only on `flush`.
// The write goes to a sibling temp file first and is then renamed over the
// target, so a crash mid-write leaves the previous document intact.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{PersistenceStore, StoredValue};
use crate::error::{log_storage_error, StorageError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    records: BTreeMap<u32, StoredValue>,
}

/// File-backed persistence store
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    document: StoreDocument,
    dirty: bool,
}

impl JsonFileStore {
    /// Open the store at `path`
    ///
    /// A missing file yields an empty store. A file that cannot be parsed is
    /// logged and treated as empty; it is replaced on the next flush.
    ///
    /// # Errors
    /// Returns `StorageError::Io` when the file exists but cannot be read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let document = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<StoreDocument>(&contents) {
                Ok(document) => document,
                Err(err) => {
                    log_storage_error(&StorageError::from(err), "JsonFileStore::open");
                    log::warn!("[Storage] Ignoring unreadable store {:?}", path);
                    StoreDocument::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::debug!("[Storage] No store at {:?}, starting empty", path);
                StoreDocument::default()
            }
            Err(err) => return Err(io_error(&path, &err)),
        };

        Ok(Self {
            path,
            document,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether there are saves not yet flushed
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Drop every record; takes effect on disk at the next flush
    pub fn clear(&mut self) {
        self.document.records.clear();
        self.dirty = true;
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PersistenceStore for JsonFileStore {
    fn load(&self, key: u32) -> Result<Option<StoredValue>, StorageError> {
        Ok(self.document.records.get(&key).cloned())
    }

    fn save(&mut self, key: u32, value: StoredValue) -> Result<(), StorageError> {
        self.document.records.insert(key, value);
        self.dirty = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| io_error(parent, &err))?;
            }
        }

        let json = serde_json::to_string_pretty(&self.document)?;
        let temp = self.temp_path();
        fs::write(&temp, json).map_err(|err| io_error(&temp, &err))?;
        fs::rename(&temp, &self.path).map_err(|err| io_error(&self.path, &err))?;

        self.dirty = false;
        log::info!(
            "[Storage] Flushed {} record(s) to {:?}",
            self.document.records.len(),
            self.path
        );
        Ok(())
    }
}

fn io_error(path: &Path, err: &std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        details: err.to_string(),
    }
}
