// Calibrator - sensor extreme capture workflow
//
// While calibration mode is active every sample is folded into a running
// per-axis maximum by absolute value. Ending calibration writes those extrema
// into the CalibrationProfile. The capture itself is never persisted.
//
// With the default seed policy the capture starts from the stored profile, so
// a calibration pass can only raise thresholds, never lower them.

use crate::calibration::profile::{AxisThresholds, CalibrationProfile};
use crate::config::CalibrationSeed;
use crate::sensor::AccelSample;

/// Running extrema observed during calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationCapture {
    /// Signed reading with the largest magnitude seen per axis
    pub extremes: AxisThresholds,
    /// Samples folded in since begin()
    pub samples_seen: u32,
}

impl CalibrationCapture {
    pub fn seeded(extremes: AxisThresholds) -> Self {
        Self {
            extremes,
            samples_seen: 0,
        }
    }

    /// Fold one sample in; returns true when any axis extremum changed
    pub fn observe(&mut self, sample: &AccelSample) -> bool {
        self.samples_seen = self.samples_seen.saturating_add(1);
        let x = Self::keep_larger(&mut self.extremes.x, sample.x);
        let y = Self::keep_larger(&mut self.extremes.y, sample.y);
        let z = Self::keep_larger(&mut self.extremes.z, sample.z);
        x || y || z
    }

    fn keep_larger(stored: &mut i32, incoming: i32) -> bool {
        if incoming.unsigned_abs() > stored.unsigned_abs() {
            *stored = incoming;
            true
        } else {
            false
        }
    }
}

/// Calibrator owns the capture for the duration of calibration mode
#[derive(Debug, Clone)]
pub struct Calibrator {
    capture: Option<CalibrationCapture>,
    seed: CalibrationSeed,
}

impl Calibrator {
    pub fn new(seed: CalibrationSeed) -> Self {
        Self {
            capture: None,
            seed,
        }
    }

    /// Whether calibration mode is active
    pub fn is_active(&self) -> bool {
        self.capture.is_some()
    }

    /// Current capture state for the calibration UI
    pub fn capture(&self) -> Option<&CalibrationCapture> {
        self.capture.as_ref()
    }

    /// Enter calibration mode
    ///
    /// # Returns
    /// `false` if calibration was already active (the capture is left untouched)
    pub fn begin(&mut self, profile: &CalibrationProfile) -> bool {
        if self.capture.is_some() {
            return false;
        }

        let seed = match self.seed {
            CalibrationSeed::Profile => profile.active_thresholds(),
            CalibrationSeed::Zero => AxisThresholds::default(),
        };
        log::info!("[Calibrator] Calibration started (seed {:?}: {:?})", self.seed, seed);
        self.capture = Some(CalibrationCapture::seeded(seed));
        true
    }

    /// Fold one sample into the capture; ignored when not calibrating
    pub fn on_sample(&mut self, sample: &AccelSample) -> bool {
        match self.capture.as_mut() {
            Some(capture) => capture.observe(sample),
            None => false,
        }
    }

    /// Leave calibration mode, committing the capture into `profile`
    ///
    /// A capture that never saw a sample is discarded and the profile kept.
    ///
    /// # Returns
    /// The committed profile, or `None` if nothing was written
    pub fn end(&mut self, profile: &mut CalibrationProfile) -> Option<CalibrationProfile> {
        let capture = self.capture.take()?;

        if capture.samples_seen == 0 {
            log::warn!("[Calibrator] Calibration ended without samples; keeping current profile");
            return None;
        }

        *profile = CalibrationProfile::from_extremes(capture.extremes);
        log::info!(
            "[Calibrator] Calibration committed after {} samples: {:?}",
            capture.samples_seen,
            profile.active_thresholds()
        );
        Some(*profile)
    }
}
