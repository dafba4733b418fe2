// Classifier - single-axis threshold gesture detection
//
// Decides whether one accelerometer sample fulfills the active target under
// the current CalibrationProfile. Exactly one axis is checked per target:
//
// Punch: sample.x > profile.punch.x
// Duck:  sample.z < profile.duck.z
// Block: sample.y > profile.block.y
//
// Samples flagged as settling (taken while the hint vibration was running)
// never match, otherwise the motor itself would fulfill the round.

use crate::calibration::{Axis, CalibrationProfile};
use crate::game::Gesture;
use crate::sensor::AccelSample;

/// How a sample axis is compared with its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Above,
    Below,
}

/// The rule a target gesture is detected with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureRule {
    pub axis: Axis,
    pub comparison: Comparison,
    pub threshold: i32,
}

impl GestureRule {
    /// Apply the rule to one sample
    pub fn is_met(&self, sample: &AccelSample) -> bool {
        let value = match self.axis {
            Axis::X => sample.x,
            Axis::Y => sample.y,
            Axis::Z => sample.z,
        };
        match self.comparison {
            Comparison::Above => value > self.threshold,
            Comparison::Below => value < self.threshold,
        }
    }
}

/// Stateless gesture classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct GestureClassifier;

impl GestureClassifier {
    /// Detection rule for a target, or `None` for display-only states
    pub fn rule_for(target: Gesture, profile: &CalibrationProfile) -> Option<GestureRule> {
        let (thresholds, axis, comparison) = match target {
            Gesture::Punch => (profile.punch, Axis::X, Comparison::Above),
            Gesture::Duck => (profile.duck, Axis::Z, Comparison::Below),
            Gesture::Block => (profile.block, Axis::Y, Comparison::Above),
            Gesture::Waiting | Gesture::Finished => return None,
        };
        Some(GestureRule {
            axis,
            comparison,
            threshold: thresholds.get(axis),
        })
    }

    /// Whether `sample` performs `target`
    ///
    /// Pure function of its inputs. Callers only pass playable targets;
    /// Waiting and Finished always return false.
    pub fn matches(sample: &AccelSample, target: Gesture, profile: &CalibrationProfile) -> bool {
        if sample.settling {
            return false;
        }
        match Self::rule_for(target, profile) {
            Some(rule) => rule.is_met(sample),
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
