// Storage error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Storage error code constants
///
/// Error code range: 3001-3004
pub struct StorageErrorCodes {}

impl StorageErrorCodes {
    /// Reading or writing the backing file failed
    pub const IO: i32 = 3001;

    /// A persisted record exists but cannot be decoded
    pub const CORRUPT: i32 = 3002;

    /// The store document could not be serialized
    pub const SERIALIZATION: i32 = 3003;

    /// Calibration blob has the wrong size
    pub const INVALID_BLOB: i32 = 3004;
}

/// Log a storage error with structured context
pub fn log_storage_error(err: &StorageError, context: &str) {
    error!(
        "Storage error in {}: code={}, component=PersistenceStore, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Persistence-related errors
///
/// The core never fails on these at startup: a record that cannot be read is
/// replaced by its default. They surface only when saving at teardown.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// Filesystem failure
    Io { path: String, details: String },

    /// Record present but unreadable
    Corrupt { key: u32, reason: String },

    /// Store document failed to (de)serialize
    Serialization { reason: String },

    /// Calibration blob length mismatch
    InvalidBlob { expected: usize, actual: usize },
}

impl ErrorCode for StorageError {
    fn code(&self) -> i32 {
        match self {
            StorageError::Io { .. } => StorageErrorCodes::IO,
            StorageError::Corrupt { .. } => StorageErrorCodes::CORRUPT,
            StorageError::Serialization { .. } => StorageErrorCodes::SERIALIZATION,
            StorageError::InvalidBlob { .. } => StorageErrorCodes::INVALID_BLOB,
        }
    }

    fn message(&self) -> String {
        match self {
            StorageError::Io { path, details } => {
                format!("I/O failure on {}: {}", path, details)
            }
            StorageError::Corrupt { key, reason } => {
                format!("Record {} is corrupt: {}", key, reason)
            }
            StorageError::Serialization { reason } => {
                format!("Store serialization failed: {}", reason)
            }
            StorageError::InvalidBlob { expected, actual } => {
                format!(
                    "Calibration blob must be {} bytes (got {})",
                    expected, actual
                )
            }
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StorageError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for StorageError {}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_codes() {
        assert_eq!(
            StorageError::Io {
                path: "a".to_string(),
                details: "b".to_string()
            }
            .code(),
            StorageErrorCodes::IO
        );
        assert_eq!(
            StorageError::Corrupt {
                key: 10,
                reason: "x".to_string()
            }
            .code(),
            3002
        );
        assert_eq!(
            StorageError::Serialization {
                reason: "x".to_string()
            }
            .code(),
            3003
        );
        assert_eq!(
            StorageError::InvalidBlob {
                expected: 36,
                actual: 12
            }
            .code(),
            3004
        );
    }

    #[test]
    fn test_storage_error_messages() {
        let err = StorageError::InvalidBlob {
            expected: 36,
            actual: 12,
        };
        assert_eq!(err.message(), "Calibration blob must be 36 bytes (got 12)");

        let err = StorageError::Corrupt {
            key: 11,
            reason: "not a blob".to_string(),
        };
        assert!(err.message().contains("Record 11"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: StorageError = json_err.into();
        assert_eq!(err.code(), StorageErrorCodes::SERIALIZATION);
    }
}
