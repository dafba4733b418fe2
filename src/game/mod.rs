// Game module - targets, session state and round scoring
//
// Components:
// - gesture: playable targets, display states and their haptic cues
// - feedback: FeedbackSink collaborator for cues
// - session: per-game mutable record
// - engine: SessionEngine state machine (start, evaluate, finalize)

pub mod engine;
pub mod feedback;
pub mod gesture;
pub mod session;

pub use engine::{NextRound, RoundOutcome, SessionEngine};
pub use feedback::{signal_hint, FeedbackSink, LogFeedback, RecordingFeedback};
pub use gesture::{Gesture, HintPattern};
pub use session::{Session, SessionPhase};
