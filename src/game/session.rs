// Session - per-game mutable record
//
// Created by start_session, mutated once per round by the SessionEngine and
// fully re-initialized by the next start_session. The high score lives on the
// engine, not here, because it outlives every session.

use crate::config::GameConfig;
use crate::game::gesture::Gesture;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No session played yet
    Idle,
    /// Rounds are running
    Playing,
    /// Health ran out; waiting for an explicit restart
    Finished,
}

/// Health, score and round state of one game
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Session {
    pub health: u32,
    pub points: u32,
    pub current_target: Gesture,
    /// Target performed during the current round
    pub fulfilled: bool,
    /// Length of the current round window
    pub interval_ms: u64,
    pub running: bool,
    /// Rounds evaluated so far
    pub round: u32,
}

impl Session {
    /// Record shown before the first game
    pub fn idle(rules: &GameConfig) -> Self {
        Self {
            health: rules.initial_health,
            points: 0,
            current_target: Gesture::Waiting,
            fulfilled: false,
            interval_ms: rules.initial_interval_ms,
            running: false,
            round: 0,
        }
    }

    /// Fresh record for a new game with its first target
    pub fn started(rules: &GameConfig, first_target: Gesture) -> Self {
        Self {
            current_target: first_target,
            running: true,
            ..Self::idle(rules)
        }
    }

    /// Shrink the round window by one step, stopping at the floor
    pub fn shorten_interval(&mut self, rules: &GameConfig) {
        self.interval_ms = self
            .interval_ms
            .saturating_sub(rules.interval_step_ms)
            .max(rules.min_interval_ms);
    }
}
