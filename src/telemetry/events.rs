//! Game event types published to the telemetry collector and surfaced by the
//! CLI as JSON lines.

use serde::{Deserialize, Serialize};

use crate::calibration::AxisThresholds;
use crate::game::Gesture;

/// Session and calibration events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum GameEvent {
    SessionStarted {
        target: Gesture,
        interval_ms: u64,
    },
    GestureMatched {
        round: u32,
        target: Gesture,
    },
    RoundEvaluated {
        round: u32,
        target: Gesture,
        fulfilled: bool,
        health: u32,
        points: u32,
        interval_ms: u64,
        /// Share of fulfilled rounds over the recent window
        hit_rate: f32,
    },
    SessionFinished {
        points: u32,
        high_score: u32,
        new_record: bool,
    },
    CalibrationStarted {
        seed: AxisThresholds,
    },
    CalibrationCommitted {
        thresholds: AxisThresholds,
        samples: u32,
    },
    SampleDropped {
        code: i32,
        reason: String,
    },
}
