// GameContext: single owner of all game state
//
// Replaces process-wide globals with one value passed explicitly to the event
// loop. It owns the calibration profile, the session engine (which owns the
// high score), the calibrator, the target RNG, the feedback sink and the
// telemetry collector.
//
// Ownership rules:
// - only the Calibrator writes the profile (through end_calibration)
// - only the SessionEngine writes session fields and the high score
// - commands issued in the wrong state are silent no-ops

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::analysis::GestureClassifier;
use crate::calibration::{CalibrationCapture, CalibrationProfile, Calibrator};
use crate::config::AppConfig;
use crate::error::{log_storage_error, ErrorCode, StorageError};
use crate::game::{FeedbackSink, Gesture, NextRound, RoundOutcome, SessionEngine, SessionPhase};
use crate::sensor::{read_sample, AccelSample, SensorSource};
use crate::storage::{PersistenceStore, StoreKey, StoredValue};
use crate::telemetry::{GameEvent, HitRateTracker, TelemetryCollector, TelemetrySnapshot};

/// Read-only view of the game for renderers
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GameSnapshot {
    pub current_target: Gesture,
    pub health: u32,
    pub points: u32,
    pub high_score: u32,
    pub running: bool,
    pub is_calibrating: bool,
    pub phase: SessionPhase,
    pub interval_ms: u64,
    pub round: u32,
    /// Live capture while calibrating
    pub calibration: Option<CalibrationCapture>,
}

/// What one sampling tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Sample folded into the calibration capture
    Calibrated,
    /// Sample fulfilled the current target
    Matched,
    /// Sample read but nothing changed
    Ignored,
    /// Sensor had no reading this tick
    NoSample,
    /// Sensor reported an error; the tick was skipped
    Dropped,
}

/// Owner of profile, engine, calibrator and collaborators
pub struct GameContext {
    config: AppConfig,
    profile: CalibrationProfile,
    engine: SessionEngine,
    calibrator: Calibrator,
    rng: StdRng,
    feedback: Box<dyn FeedbackSink>,
    telemetry: TelemetryCollector,
    hit_rate: HitRateTracker,
    /// Last poll failed; only the first failure of a run is published
    sensor_failing: bool,
}

impl GameContext {
    /// Create a context with no persisted state (high score 0, default profile)
    pub fn new(config: AppConfig, feedback: Box<dyn FeedbackSink>) -> Self {
        Self::with_state(config, feedback, 0, CalibrationProfile::new_default())
    }

    /// Create a context from already-loaded persistent state
    pub fn with_state(
        config: AppConfig,
        feedback: Box<dyn FeedbackSink>,
        high_score: u32,
        profile: CalibrationProfile,
    ) -> Self {
        let rng = match config.game.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            engine: SessionEngine::new(config.game.clone(), high_score),
            calibrator: Calibrator::new(config.calibration.seed),
            profile,
            rng,
            feedback,
            telemetry: TelemetryCollector::default(),
            hit_rate: HitRateTracker::default(),
            sensor_failing: false,
            config,
        }
    }

    /// Build a context from the persistence store
    ///
    /// Missing records fall back to their defaults. Unreadable records are
    /// logged and also replaced by defaults; startup never fails.
    pub fn load<S: PersistenceStore + ?Sized>(
        store: &S,
        config: AppConfig,
        feedback: Box<dyn FeedbackSink>,
    ) -> Self {
        let high_score = load_high_score(store);
        let profile = load_profile(store);
        log::info!(
            "[GameContext] Loaded high_score={}, thresholds={:?}",
            high_score,
            profile.active_thresholds()
        );
        Self::with_state(config, feedback, high_score, profile)
    }

    /// Write high score and profile back to the store and flush it
    pub fn persist<S: PersistenceStore + ?Sized>(&self, store: &mut S) -> Result<(), StorageError> {
        let high_score = i32::try_from(self.engine.high_score()).unwrap_or(i32::MAX);
        store.save(StoreKey::HIGH_SCORE, StoredValue::Int(high_score))?;
        store.save(
            StoreKey::CALIBRATION,
            StoredValue::Blob(self.profile.to_blob().to_vec()),
        )?;
        store.flush()?;
        log::info!("[GameContext] Persisted high_score={}", high_score);
        Ok(())
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    /// Start a session
    ///
    /// # Returns
    /// Delay until the first round evaluation, or `None` when ignored
    /// (already playing, or calibration in progress).
    pub fn start_session(&mut self) -> Option<Duration> {
        if self.calibrator.is_active() {
            log::debug!("[GameContext] start_session ignored while calibrating");
            return None;
        }
        let delay = self
            .engine
            .start_session(&mut self.rng, self.feedback.as_mut())?;

        self.hit_rate.reset();
        let session = self.engine.session();
        self.telemetry.publish(GameEvent::SessionStarted {
            target: session.current_target,
            interval_ms: session.interval_ms,
        });
        Some(delay)
    }

    /// Enter calibration mode; ignored while playing or already calibrating
    pub fn begin_calibration(&mut self) -> bool {
        if self.engine.is_playing() {
            log::debug!("[GameContext] begin_calibration ignored while playing");
            return false;
        }
        if !self.calibrator.begin(&self.profile) {
            return false;
        }
        if let Some(capture) = self.calibrator.capture() {
            self.telemetry.publish(GameEvent::CalibrationStarted {
                seed: capture.extremes,
            });
        }
        true
    }

    /// Leave calibration mode, committing the capture
    ///
    /// # Returns
    /// The new profile, or `None` when ignored or nothing was captured
    pub fn end_calibration(&mut self) -> Option<CalibrationProfile> {
        if self.engine.is_playing() {
            log::debug!("[GameContext] end_calibration ignored while playing");
            return None;
        }
        let samples = self
            .calibrator
            .capture()
            .map(|capture| capture.samples_seen)
            .unwrap_or(0);
        let committed = self.calibrator.end(&mut self.profile)?;
        self.telemetry.publish(GameEvent::CalibrationCommitted {
            thresholds: committed.active_thresholds(),
            samples,
        });
        Some(committed)
    }

    // ========================================================================
    // TICKS
    // ========================================================================

    /// Sampling tick: poll the sensor once and route the reading
    pub fn poll_sensor<S: SensorSource + ?Sized>(&mut self, sensor: &mut S) -> SampleOutcome {
        let reading = read_sample(sensor);
        if reading.is_ok() && self.sensor_failing {
            log::info!("[GameContext] Sensor recovered");
            self.sensor_failing = false;
        }
        match reading {
            Ok(Some(sample)) => self.on_sample(&sample),
            Ok(None) => SampleOutcome::NoSample,
            Err(err) => {
                log::debug!("[GameContext] Skipping sample tick: {}", err);
                if !self.sensor_failing {
                    self.sensor_failing = true;
                    self.telemetry.publish(GameEvent::SampleDropped {
                        code: err.code(),
                        reason: err.message(),
                    });
                }
                SampleOutcome::Dropped
            }
        }
    }

    /// Route one sample to the calibrator or the classifier
    pub fn on_sample(&mut self, sample: &AccelSample) -> SampleOutcome {
        if self.calibrator.is_active() {
            self.calibrator.on_sample(sample);
            return SampleOutcome::Calibrated;
        }

        let Some(target) = self.engine.pending_target() else {
            return SampleOutcome::Ignored;
        };
        if !GestureClassifier::matches(sample, target, &self.profile) {
            return SampleOutcome::Ignored;
        }
        if !self.engine.on_classified() {
            return SampleOutcome::Ignored;
        }

        let round = self.engine.session().round.saturating_add(1);
        log::debug!("[GameContext] Round {} fulfilled by {:?}", round, sample);
        self.telemetry.publish(GameEvent::GestureMatched { round, target });
        SampleOutcome::Matched
    }

    /// Round timer fired: evaluate the round
    ///
    /// The returned outcome's `next.delay()` is the delay until the next
    /// evaluation; `None` there means the round clock stops.
    pub fn on_round_timer(&mut self) -> Option<RoundOutcome> {
        let outcome = self
            .engine
            .evaluate_round(&mut self.rng, self.feedback.as_mut())?;

        let hit_rate = self.hit_rate.observe(outcome.fulfilled);
        self.telemetry.publish(GameEvent::RoundEvaluated {
            round: outcome.round,
            target: outcome.target,
            fulfilled: outcome.fulfilled,
            health: outcome.health,
            points: outcome.points,
            interval_ms: self.engine.session().interval_ms,
            hit_rate,
        });
        if let NextRound::SessionOver {
            high_score,
            new_record,
        } = outcome.next
        {
            self.telemetry.publish(GameEvent::SessionFinished {
                points: outcome.points,
                high_score,
                new_record,
            });
        }
        Some(outcome)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn snapshot(&self) -> GameSnapshot {
        let session = self.engine.session();
        GameSnapshot {
            current_target: session.current_target,
            health: session.health,
            points: session.points,
            high_score: self.engine.high_score(),
            running: session.running,
            is_calibrating: self.calibrator.is_active(),
            phase: self.engine.phase(),
            interval_ms: session.interval_ms,
            round: session.round,
            calibration: self.calibrator.capture().copied(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    pub fn high_score(&self) -> u32 {
        self.engine.high_score()
    }

    pub fn phase(&self) -> SessionPhase {
        self.engine.phase()
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibrator.is_active()
    }

    /// Auto-end delay for calibration, if configured
    pub fn calibration_window(&self) -> Option<Duration> {
        self.config.calibration.window_ms.map(Duration::from_millis)
    }

    pub fn telemetry_snapshot(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }

    /// Take the events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.telemetry.drain()
    }
}

impl std::fmt::Debug for GameContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameContext")
            .field("profile", &self.profile)
            .field("engine", &self.engine)
            .field("calibrator", &self.calibrator)
            .field("telemetry", &self.telemetry)
            .finish()
    }
}

fn load_high_score<S: PersistenceStore + ?Sized>(store: &S) -> u32 {
    match store.load(StoreKey::HIGH_SCORE) {
        Ok(Some(StoredValue::Int(value))) => u32::try_from(value).unwrap_or_else(|_| {
            log::warn!("[GameContext] Negative high score {} reset to 0", value);
            0
        }),
        Ok(Some(StoredValue::Blob(_))) => {
            log_storage_error(
                &StorageError::Corrupt {
                    key: StoreKey::HIGH_SCORE,
                    reason: "expected an integer, found a blob".to_string(),
                },
                "GameContext::load",
            );
            0
        }
        Ok(None) => 0,
        Err(err) => {
            log_storage_error(&err, "GameContext::load");
            0
        }
    }
}

fn load_profile<S: PersistenceStore + ?Sized>(store: &S) -> CalibrationProfile {
    let decoded = match store.load(StoreKey::CALIBRATION) {
        Ok(Some(StoredValue::Blob(bytes))) => CalibrationProfile::from_blob(&bytes),
        Ok(Some(StoredValue::Int(_))) => Err(StorageError::Corrupt {
            key: StoreKey::CALIBRATION,
            reason: "expected a blob, found an integer".to_string(),
        }),
        Ok(None) => return CalibrationProfile::new_default(),
        Err(err) => Err(err),
    };

    decoded.unwrap_or_else(|err| {
        log_storage_error(&err, "GameContext::load");
        log::warn!("[GameContext] Using default calibration profile");
        CalibrationProfile::new_default()
    })
}
