// Error types for the reflex trainer
//
// This module defines custom error types for persistence, sensor and
// configuration failures. None of them are fatal to the game core: they are
// logged and replaced by defaults or skipped ticks.

mod sensor;
mod storage;

pub use sensor::{ConfigError, ConfigErrorCodes, SensorError, SensorErrorCodes};
pub use storage::{log_storage_error, StorageError, StorageErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_trait_objects() {
        let errors: Vec<Box<dyn ErrorCode>> = vec![
            Box::new(SensorError::Unavailable),
            Box::new(StorageError::InvalidBlob {
                expected: 36,
                actual: 0,
            }),
        ];
        let codes: Vec<i32> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec![4001, 3004]);
    }
}
