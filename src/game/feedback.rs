//! Haptic feedback collaborators.
//!
//! The engine fires one advisory cue per round when a new target is chosen.
//! How the cue is rendered (vibration motor, sound, nothing) is up to the
//! platform; nothing is returned to the engine.

use crate::game::gesture::{Gesture, HintPattern};

/// Receiver of per-round gesture cues
pub trait FeedbackSink: Send {
    fn hint(&mut self, gesture: Gesture, pattern: HintPattern);
}

/// Fire the cue for `gesture`, if it has one
pub fn signal_hint(feedback: &mut dyn FeedbackSink, gesture: Gesture) {
    if let Some(pattern) = gesture.hint_pattern() {
        feedback.hint(gesture, pattern);
    }
}

/// Sink that only logs cues
#[derive(Debug, Default)]
pub struct LogFeedback;

impl FeedbackSink for LogFeedback {
    fn hint(&mut self, gesture: Gesture, pattern: HintPattern) {
        log::debug!("[Feedback] {:?} -> {:?}", gesture, pattern);
    }
}

/// Sink that keeps every cue, for replays and assertions
#[derive(Debug, Default)]
pub struct RecordingFeedback {
    pub hints: Vec<(Gesture, HintPattern)>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<Gesture> {
        self.hints.last().map(|(gesture, _)| *gesture)
    }
}

impl FeedbackSink for RecordingFeedback {
    fn hint(&mut self, gesture: Gesture, pattern: HintPattern) {
        self.hints.push((gesture, pattern));
    }
}
