// SessionEngine - round-by-round game state machine
//
// State machine:
//   Idle --start_session--> Playing
//   Playing --evaluate_round (health >= 1)--> Playing
//   Playing --evaluate_round (health < 1)--> Finished
//   Finished --start_session--> Playing
//
// The engine never owns a timer. start_session and evaluate_round return the
// delay after which the caller must invoke evaluate_round next; a finished
// session returns no delay, which is what stops the round clock.

use std::time::Duration;

use rand::Rng;

use crate::config::GameConfig;
use crate::game::feedback::{signal_hint, FeedbackSink};
use crate::game::gesture::Gesture;
use crate::game::session::{Session, SessionPhase};

/// What happens after an evaluated round
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextRound {
    /// A new target was chosen; evaluate again after `delay_ms`
    Scheduled { target: Gesture, delay_ms: u64 },
    /// Health ran out
    SessionOver { high_score: u32, new_record: bool },
}

impl NextRound {
    pub fn delay(&self) -> Option<Duration> {
        match self {
            NextRound::Scheduled { delay_ms, .. } => Some(Duration::from_millis(*delay_ms)),
            NextRound::SessionOver { .. } => None,
        }
    }
}

/// Result of one round evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoundOutcome {
    /// 1-based index of the evaluated round
    pub round: u32,
    /// Target that was being asked for
    pub target: Gesture,
    pub fulfilled: bool,
    pub health: u32,
    pub points: u32,
    pub next: NextRound,
}

/// Game state machine and scoring policy
#[derive(Debug, Clone)]
pub struct SessionEngine {
    rules: GameConfig,
    session: Session,
    phase: SessionPhase,
    high_score: u32,
}

impl SessionEngine {
    pub fn new(rules: GameConfig, high_score: u32) -> Self {
        let session = Session::idle(&rules);
        Self {
            rules,
            session,
            phase: SessionPhase::Idle,
            high_score,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn is_playing(&self) -> bool {
        self.phase == SessionPhase::Playing
    }

    /// Target the sampling loop should classify against, if any
    ///
    /// `None` when no session is running or the round is already fulfilled.
    pub fn pending_target(&self) -> Option<Gesture> {
        if self.is_playing() && !self.session.fulfilled && self.session.current_target.is_playable()
        {
            Some(self.session.current_target)
        } else {
            None
        }
    }

    /// Start a new session
    ///
    /// Resets every session field, picks the first target and fires its hint.
    ///
    /// # Returns
    /// Delay until the first `evaluate_round`, or `None` if a session is
    /// already playing (the call is ignored).
    pub fn start_session<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        feedback: &mut dyn FeedbackSink,
    ) -> Option<Duration> {
        if self.is_playing() {
            log::debug!("[SessionEngine] start_session ignored: session already playing");
            return None;
        }

        let target = Gesture::random(rng);
        self.session = Session::started(&self.rules, target);
        self.phase = SessionPhase::Playing;
        signal_hint(feedback, target);

        log::info!(
            "[SessionEngine] Session started: target={:?}, interval={}ms",
            target,
            self.session.interval_ms
        );
        Some(Duration::from_millis(self.session.interval_ms))
    }

    /// Evaluate the round whose interval just elapsed
    ///
    /// # Returns
    /// The round outcome, or `None` when no session is playing (a stale
    /// timer firing after finalization is ignored).
    pub fn evaluate_round<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        feedback: &mut dyn FeedbackSink,
    ) -> Option<RoundOutcome> {
        if !self.is_playing() {
            return None;
        }

        let target = self.session.current_target;
        let fulfilled = self.session.fulfilled;
        self.session.round = self.session.round.saturating_add(1);

        if fulfilled {
            self.session.points = self
                .session
                .points
                .saturating_add(self.rules.points_per_round);
        } else {
            self.session.health = self.session.health.saturating_sub(1);
        }

        let next = if self.session.health < 1 {
            let new_record = self.finalize_session();
            NextRound::SessionOver {
                high_score: self.high_score,
                new_record,
            }
        } else {
            self.session.shorten_interval(&self.rules);
            self.session.fulfilled = false;
            let next_target = Gesture::random(rng);
            self.session.current_target = next_target;
            signal_hint(feedback, next_target);
            NextRound::Scheduled {
                target: next_target,
                delay_ms: self.session.interval_ms,
            }
        };

        let outcome = RoundOutcome {
            round: self.session.round,
            target,
            fulfilled,
            health: self.session.health,
            points: self.session.points,
            next,
        };
        log::debug!("[SessionEngine] Round evaluated: {:?}", outcome);
        Some(outcome)
    }

    /// Mark the current round as fulfilled
    ///
    /// # Returns
    /// `true` if this call set the flag; `false` if no session is playing or
    /// the round was already fulfilled.
    pub fn on_classified(&mut self) -> bool {
        if !self.is_playing() || self.session.fulfilled {
            return false;
        }
        self.session.fulfilled = true;
        true
    }

    /// End the session, updating the high score when beaten
    ///
    /// # Returns
    /// `true` when the session set a new high score; `false` as well when no
    /// session is playing, in which case nothing changes.
    pub fn finalize_session(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }
        let new_record = self.session.points > self.high_score;
        if new_record {
            self.high_score = self.session.points;
        }
        self.session.running = false;
        self.session.current_target = Gesture::Finished;
        self.phase = SessionPhase::Finished;

        log::info!(
            "[SessionEngine] Session finished: points={}, high_score={}, new_record={}",
            self.session.points,
            self.high_score,
            new_record
        );
        new_record
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
