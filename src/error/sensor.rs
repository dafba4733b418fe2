// Sensor and configuration error types

use crate::error::ErrorCode;
use std::fmt;

/// Sensor error code constants
///
/// Error code range: 4001-4002
pub struct SensorErrorCodes {}

impl SensorErrorCodes {
    /// No reading available right now
    pub const UNAVAILABLE: i32 = 4001;

    /// Driver gone or script exhausted
    pub const DISCONNECTED: i32 = 4002;
}

/// Accelerometer read failures
///
/// Always absorbed by the sampling loop as a skipped tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    Unavailable,
    Disconnected,
}

impl ErrorCode for SensorError {
    fn code(&self) -> i32 {
        match self {
            SensorError::Unavailable => SensorErrorCodes::UNAVAILABLE,
            SensorError::Disconnected => SensorErrorCodes::DISCONNECTED,
        }
    }

    fn message(&self) -> String {
        match self {
            SensorError::Unavailable => "Accelerometer reading unavailable".to_string(),
            SensorError::Disconnected => "Accelerometer disconnected".to_string(),
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SensorError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SensorError {}

/// Configuration error code constants
pub struct ConfigErrorCodes {}

impl ConfigErrorCodes {
    pub const INVALID: i32 = 5001;
}

/// Rejected configuration values
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Invalid { field: String, reason: String },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::Invalid { .. } => ConfigErrorCodes::INVALID,
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::Invalid { field, reason } => {
                format!("Invalid config field {}: {}", field, reason)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigError {}
