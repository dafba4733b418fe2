// ReplayDriver - deterministic virtual-clock driver
//
// Steps a GameContext through a sensor script one sampling period at a time,
// with no real timers. At each virtual instant the due round deadline fires
// first, then the due calibration deadline, then the sensor is polled, the
// same priority order the async GameLoop uses.

use crate::calibration::CalibrationProfile;
use crate::context::{GameContext, SampleOutcome};
use crate::game::{NextRound, RoundOutcome, SessionPhase};
use crate::sensor::SensorSource;
use crate::telemetry::GameEvent;

/// Result of a replayed session
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReplaySummary {
    pub rounds: u32,
    pub points: u32,
    pub health: u32,
    pub high_score: u32,
    pub new_record: bool,
    /// Session reached health 0 (as opposed to hitting the round limit)
    pub finished: bool,
    pub elapsed_ms: u64,
}

/// What happened during one virtual tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStep {
    pub at_ms: u64,
    pub round: Option<RoundOutcome>,
    pub calibration_committed: bool,
    pub sample: SampleOutcome,
}

/// Virtual-clock driver over a sensor script
pub struct ReplayDriver<S: SensorSource> {
    ctx: GameContext,
    sensor: S,
    now_ms: u64,
    sample_period_ms: u64,
    next_round_ms: Option<u64>,
    calibration_end_ms: Option<u64>,
}

impl<S: SensorSource> ReplayDriver<S> {
    pub fn new(ctx: GameContext, sensor: S) -> Self {
        let sample_period_ms = ctx.config().sampling.sample_period_ms.max(1);
        Self {
            ctx,
            sensor,
            now_ms: 0,
            sample_period_ms,
            next_round_ms: None,
            calibration_end_ms: None,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn context(&self) -> &GameContext {
        &self.ctx
    }

    pub fn into_context(self) -> GameContext {
        self.ctx
    }

    /// Virtual time of the next round evaluation, if one is scheduled
    pub fn next_round_ms(&self) -> Option<u64> {
        self.next_round_ms
    }

    pub fn start_session(&mut self) -> bool {
        match self.ctx.start_session() {
            Some(delay) => {
                self.next_round_ms = Some(self.now_ms + delay.as_millis() as u64);
                true
            }
            None => false,
        }
    }

    pub fn begin_calibration(&mut self) -> bool {
        if !self.ctx.begin_calibration() {
            return false;
        }
        self.calibration_end_ms = self
            .ctx
            .calibration_window()
            .map(|window| self.now_ms + window.as_millis() as u64);
        true
    }

    pub fn end_calibration(&mut self) -> Option<CalibrationProfile> {
        self.calibration_end_ms = None;
        self.ctx.end_calibration()
    }

    /// Process the current virtual instant, then advance by one sampling period
    pub fn step(&mut self) -> ReplayStep {
        let at_ms = self.now_ms;

        let round = match self.next_round_ms {
            Some(deadline) if deadline <= at_ms => {
                let outcome = self.ctx.on_round_timer();
                self.next_round_ms = outcome
                    .and_then(|outcome| outcome.next.delay())
                    .map(|delay| deadline + delay.as_millis() as u64);
                outcome
            }
            _ => None,
        };

        let calibration_committed = match self.calibration_end_ms {
            Some(deadline) if deadline <= at_ms => {
                self.calibration_end_ms = None;
                self.ctx.end_calibration().is_some()
            }
            _ => false,
        };

        let sample = self.ctx.poll_sensor(&mut self.sensor);
        self.now_ms += self.sample_period_ms;

        ReplayStep {
            at_ms,
            round,
            calibration_committed,
            sample,
        }
    }

    /// Play one session from start to finish
    ///
    /// Stops when health runs out or after `max_rounds` evaluations.
    /// A session that cannot start (already playing, or calibrating) is
    /// reported as is without stepping.
    pub fn run_session(&mut self, max_rounds: Option<u32>) -> ReplaySummary {
        self.replay_session(max_rounds, None::<fn(GameEvent)>)
    }

    /// Like [`run_session`](Self::run_session), handing every telemetry
    /// event to `on_event` as soon as the step that produced it returns
    ///
    /// Events are drained from the context, so none are lost to the bounded
    /// history however long the session runs.
    pub fn run_session_with<F>(&mut self, max_rounds: Option<u32>, on_event: F) -> ReplaySummary
    where
        F: FnMut(GameEvent),
    {
        self.replay_session(max_rounds, Some(on_event))
    }

    fn replay_session<F>(
        &mut self,
        max_rounds: Option<u32>,
        mut on_event: Option<F>,
    ) -> ReplaySummary
    where
        F: FnMut(GameEvent),
    {
        let started_at = self.now_ms;
        let mut rounds = 0u32;
        let mut new_record = false;
        let mut finished = false;

        if self.start_session() {
            forward_events(&mut self.ctx, &mut on_event);
            loop {
                let step = self.step();
                forward_events(&mut self.ctx, &mut on_event);
                if let Some(outcome) = step.round {
                    rounds += 1;
                    if let NextRound::SessionOver {
                        new_record: record, ..
                    } = outcome.next
                    {
                        new_record = record;
                        finished = true;
                        break;
                    }
                }
                if matches!(max_rounds, Some(limit) if rounds >= limit) {
                    break;
                }
            }
        }

        let session = self.ctx.engine().session();
        let summary = ReplaySummary {
            rounds,
            points: session.points,
            health: session.health,
            high_score: self.ctx.high_score(),
            new_record,
            finished,
            elapsed_ms: self.now_ms - started_at,
        };
        log::info!("[Replay] Session replayed: {:?}", summary);
        summary
    }

    /// Calibrate for `duration_ms` of virtual time and commit
    pub fn run_calibration(&mut self, duration_ms: u64) -> Option<CalibrationProfile> {
        if self.ctx.phase() == SessionPhase::Playing || !self.begin_calibration() {
            return None;
        }
        let end = self.now_ms + duration_ms;
        while self.now_ms < end && self.ctx.is_calibrating() {
            self.step();
        }
        if self.ctx.is_calibrating() {
            self.end_calibration()
        } else {
            // Window elapsed inside step()
            Some(*self.ctx.profile())
        }
    }
}

fn forward_events<F: FnMut(GameEvent)>(ctx: &mut GameContext, on_event: &mut Option<F>) {
    if let Some(on_event) = on_event.as_mut() {
        for event in ctx.drain_events() {
            on_event(event);
        }
    }
}
