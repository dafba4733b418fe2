// CalibrationProfile - per-gesture threshold storage
//
// Each actionable gesture keeps a full (x, y, z) threshold triple, but the
// classifier only reads one axis per gesture:
// - Punch.x, positive, sample must be above it
// - Duck.z, negative, sample must be below it
// - Block.y, positive, sample must be above it
//
// The profile is persisted as a fixed 36-byte blob: nine little-endian i32 in
// Punch, Duck, Block order, each as x, y, z.

use crate::error::StorageError;

/// Size of the persisted profile blob
pub const PROFILE_BLOB_LEN: usize = 9 * 4;

/// Default threshold magnitude in sensor units (~1.5 g)
pub const DEFAULT_THRESHOLD: i32 = 1500;

/// Accelerometer axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Threshold triple for one gesture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AxisThresholds {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl AxisThresholds {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn get(&self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

/// Thresholds used by the gesture classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationProfile {
    pub punch: AxisThresholds,
    pub duck: AxisThresholds,
    pub block: AxisThresholds,
}

impl Default for CalibrationProfile {
    fn default() -> Self {
        Self::new_default()
    }
}

impl CalibrationProfile {
    /// Create the profile used before any calibration has been stored
    ///
    /// - Punch (1500, 0, 0)
    /// - Duck (0, 0, -1500)
    /// - Block (0, 1500, 0)
    pub fn new_default() -> Self {
        Self {
            punch: AxisThresholds::new(DEFAULT_THRESHOLD, 0, 0),
            duck: AxisThresholds::new(0, 0, -DEFAULT_THRESHOLD),
            block: AxisThresholds::new(0, DEFAULT_THRESHOLD, 0),
        }
    }

    /// Build a profile from captured per-axis extrema
    ///
    /// Magnitudes are kept and signs forced to the classifier's convention
    /// (x and y positive, z negative). Every gesture receives the same triple.
    pub fn from_extremes(extremes: AxisThresholds) -> Self {
        let triple = AxisThresholds::new(
            extremes.x.saturating_abs(),
            extremes.y.saturating_abs(),
            -extremes.z.saturating_abs(),
        );
        Self {
            punch: triple,
            duck: triple,
            block: triple,
        }
    }

    /// The axis values the classifier actually reads, as one triple
    ///
    /// Used to seed a calibration capture so it starts at the current settings.
    pub fn active_thresholds(&self) -> AxisThresholds {
        AxisThresholds::new(self.punch.x, self.block.y, self.duck.z)
    }

    /// Encode as the fixed-size persisted blob
    pub fn to_blob(&self) -> [u8; PROFILE_BLOB_LEN] {
        let mut blob = [0u8; PROFILE_BLOB_LEN];
        let values = [
            self.punch.x,
            self.punch.y,
            self.punch.z,
            self.duck.x,
            self.duck.y,
            self.duck.z,
            self.block.x,
            self.block.y,
            self.block.z,
        ];
        for (chunk, value) in blob.chunks_exact_mut(4).zip(values) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        blob
    }

    /// Decode the persisted blob
    ///
    /// # Errors
    /// `StorageError::InvalidBlob` when the length is not exactly 36 bytes.
    pub fn from_blob(blob: &[u8]) -> Result<Self, StorageError> {
        if blob.len() != PROFILE_BLOB_LEN {
            return Err(StorageError::InvalidBlob {
                expected: PROFILE_BLOB_LEN,
                actual: blob.len(),
            });
        }

        let mut values = [0i32; 9];
        for (value, chunk) in values.iter_mut().zip(blob.chunks_exact(4)) {
            *value = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        Ok(Self {
            punch: AxisThresholds::new(values[0], values[1], values[2]),
            duck: AxisThresholds::new(values[3], values[4], values[5]),
            block: AxisThresholds::new(values[6], values[7], values[8]),
        })
    }
}
