//! Configuration management for game tuning
//!
//! This module provides runtime configuration loading from JSON files, so the
//! round timing, sampling rate and calibration policy can be tuned without
//! recompilation. A missing or invalid file falls back to the defaults, which
//! reproduce the original handheld game.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Health, scoring and round timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Health at session start; the session ends when it reaches 0
    pub initial_health: u32,
    /// Points awarded per fulfilled round
    pub points_per_round: u32,
    /// Round window at session start
    pub initial_interval_ms: u64,
    /// Amount the window shrinks after every evaluated round
    pub interval_step_ms: u64,
    /// The window never shrinks below this
    pub min_interval_ms: u64,
    /// Fixed RNG seed for deterministic target sequences
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_health: 3,
            points_per_round: 10,
            initial_interval_ms: 2500,
            interval_step_ms: 10,
            min_interval_ms: 1500,
            seed: None,
        }
    }
}

/// Event loop periods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Accelerometer polling period
    pub sample_period_ms: u64,
    /// Snapshot publication period for the renderer
    pub redraw_period_ms: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: 20,
            redraw_period_ms: 100,
        }
    }
}

/// Where a new calibration capture starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationSeed {
    /// Start from the stored profile; calibration can only raise thresholds
    Profile,
    /// Start from zero; thresholds track this capture only
    Zero,
}

/// Calibration capture policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub seed: CalibrationSeed,
    /// End calibration automatically after this long (None = explicit command only)
    pub window_ms: Option<u64>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            seed: CalibrationSeed::Profile,
            window_ms: None,
        }
    }
}

/// Persistent store location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("reflex_store.json"),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration. If the file doesn't exist, the JSON is
    /// invalid, or validation fails, returns the default config.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                return Self::default();
            }
        };

        let config: AppConfig = match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                log::warn!(
                    "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                return Self::default();
            }
        };

        match config.validate() {
            Ok(()) => {
                log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                config
            }
            Err(err) => {
                log::warn!("[Config] {}. Using defaults.", err);
                Self::default()
            }
        }
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        Self::load_from_file("assets/reflex_config.json")
    }

    /// Check the invariants the game engine relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, reason: &str| ConfigError::Invalid {
            field: field.to_string(),
            reason: reason.to_string(),
        };

        if self.game.initial_health == 0 {
            return Err(invalid("game.initial_health", "must be at least 1"));
        }
        if self.game.min_interval_ms == 0 {
            return Err(invalid("game.min_interval_ms", "must be positive"));
        }
        if self.game.min_interval_ms > self.game.initial_interval_ms {
            return Err(invalid(
                "game.min_interval_ms",
                "must not exceed game.initial_interval_ms",
            ));
        }
        if self.sampling.sample_period_ms == 0 {
            return Err(invalid("sampling.sample_period_ms", "must be positive"));
        }
        if self.sampling.redraw_period_ms == 0 {
            return Err(invalid("sampling.redraw_period_ms", "must be positive"));
        }
        if self.calibration.window_ms == Some(0) {
            return Err(invalid("calibration.window_ms", "must be positive when set"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.game.initial_health, 3);
        assert_eq!(config.game.points_per_round, 10);
        assert_eq!(config.game.initial_interval_ms, 2500);
        assert_eq!(config.game.interval_step_ms, 10);
        assert_eq!(config.game.min_interval_ms, 1500);
        assert_eq!(config.sampling.sample_period_ms, 20);
        assert_eq!(config.sampling.redraw_period_ms, 100);
        assert_eq!(config.calibration.seed, CalibrationSeed::Profile);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "game": { "seed": 9 }, "calibration": { "seed": "zero" } }"#;
        let parsed: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.game.seed, Some(9));
        assert_eq!(parsed.game.initial_interval_ms, 2500);
        assert_eq!(parsed.calibration.seed, CalibrationSeed::Zero);
        assert_eq!(parsed.sampling.sample_period_ms, 20);
    }

    #[test]
    fn test_validate_rejects_floor_above_start() {
        let mut config = AppConfig::default();
        config.game.min_interval_ms = 3000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("game.min_interval_ms"));
    }

    #[test]
    fn test_validate_rejects_zero_health() {
        let mut config = AppConfig::default();
        config.game.initial_health = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from_file("/definitely/not/here.json");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "game": {{ "initial_health": 0 }} }}"#).unwrap();
        let config = AppConfig::load_from_file(file.path());
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_valid_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "game": {{ "seed": 5, "points_per_round": 20 }} }}"#).unwrap();
        let config = AppConfig::load_from_file(file.path());
        assert_eq!(config.game.seed, Some(5));
        assert_eq!(config.game.points_per_round, 20);
    }
}
