// Reflex Trainer Core - accelerometer reaction game engine
// Session state machine plus single-axis gesture recognition over streamed samples

// Module declarations
pub mod analysis;
pub mod calibration;
pub mod config;
pub mod context;
pub mod error;
pub mod game;
pub mod runtime;
pub mod sensor;
pub mod storage;
pub mod telemetry;

// Re-exports for convenience
pub use analysis::GestureClassifier;
pub use calibration::{CalibrationProfile, Calibrator};
pub use config::AppConfig;
pub use context::{GameContext, GameSnapshot, SampleOutcome};
pub use game::{Gesture, SessionEngine, SessionPhase};
pub use runtime::{GameCommand, GameHandle, GameLoop, ReplayDriver};
pub use sensor::{AccelSample, SensorSource};
pub use storage::{JsonFileStore, MemoryStore, PersistenceStore, StoreKey, StoredValue};
