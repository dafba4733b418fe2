// Calibration module - per-gesture thresholds and the capture workflow
//
// This module provides two main components:
// 1. CalibrationProfile: thresholds read by the gesture classifier
// 2. Calibrator: captures sensor extremes while calibration mode is active
//
// The calibration workflow:
// 1. begin() seeds a capture from the current profile
// 2. every sampling tick folds the reading into the capture
// 3. end() commits the captured extrema as the new profile

pub mod capture;
pub mod profile;

pub use capture::{CalibrationCapture, Calibrator};
pub use profile::{Axis, AxisThresholds, CalibrationProfile, PROFILE_BLOB_LEN};
