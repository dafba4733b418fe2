//! Game telemetry collector.
//!
//! The collector keeps a bounded history of [`GameEvent`]s plus a broadcast
//! stream for live subscribers. It is owned by the `GameContext` and only
//! mutated from the event loop.

use std::collections::VecDeque;

use tokio::sync::broadcast;

pub mod events;

pub use events::GameEvent;

/// Snapshot of collector state for CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<GameEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based collector retaining a bounded history of events.
pub struct TelemetryCollector {
    tx: broadcast::Sender<GameEvent>,
    history: VecDeque<GameEvent>,
    history_capacity: usize,
    total_events: u64,
    dropped_history: u64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: VecDeque::with_capacity(history_capacity),
            history_capacity,
            total_events: 0,
            dropped_history: 0,
        }
    }

    pub fn publish(&mut self, event: GameEvent) {
        self.total_events += 1;
        if self.history_capacity == 0 {
            self.dropped_history += 1;
        } else {
            if self.history.len() == self.history_capacity {
                self.history.pop_front();
                self.dropped_history += 1;
            }
            self.history.push_back(event.clone());
        }

        // No subscribers is not an error
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            recent: self.history.iter().cloned().collect(),
            total_events: self.total_events,
            dropped_events: self.dropped_history,
        }
    }

    /// Take the retained history, leaving it empty
    pub fn drain(&mut self) -> Vec<GameEvent> {
        self.history.drain(..).collect()
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

impl std::fmt::Debug for TelemetryCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryCollector")
            .field("history_len", &self.history.len())
            .field("total_events", &self.total_events)
            .field("dropped_events", &self.dropped_history)
            .finish()
    }
}

/// Rolling hit-rate over the most recent rounds.
#[derive(Debug, Clone)]
pub struct HitRateTracker {
    rounds: VecDeque<bool>,
    max_rounds: usize,
}

impl HitRateTracker {
    pub fn new(max_rounds: usize) -> Self {
        Self {
            rounds: VecDeque::with_capacity(max_rounds),
            max_rounds: max_rounds.max(1),
        }
    }

    /// Record one round and return the updated rate in [0, 1]
    pub fn observe(&mut self, fulfilled: bool) -> f32 {
        if self.rounds.len() == self.max_rounds {
            self.rounds.pop_front();
        }
        self.rounds.push_back(fulfilled);
        self.rate()
    }

    pub fn rate(&self) -> f32 {
        if self.rounds.is_empty() {
            return 0.0;
        }
        let hits = self.rounds.iter().filter(|hit| **hit).count();
        hits as f32 / self.rounds.len() as f32
    }

    pub fn reset(&mut self) {
        self.rounds.clear();
    }
}

impl Default for HitRateTracker {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Gesture;

    fn matched(round: u32) -> GameEvent {
        GameEvent::GestureMatched {
            round,
            target: Gesture::Punch,
        }
    }

    #[test]
    fn collector_preserves_order_within_history() {
        let mut collector = TelemetryCollector::new(8, 3);
        collector.publish(matched(1));
        collector.publish(GameEvent::SessionStarted {
            target: Gesture::Duck,
            interval_ms: 2500,
        });
        collector.publish(matched(2));

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 3);
        assert_eq!(snapshot.recent[0], matched(1));
        assert!(matches!(
            snapshot.recent[1],
            GameEvent::SessionStarted { .. }
        ));
        assert_eq!(snapshot.total_events, 3);
    }

    #[test]
    fn collector_drops_history_when_full() {
        let mut collector = TelemetryCollector::new(8, 2);
        collector.publish(matched(1));
        collector.publish(matched(2));
        collector.publish(matched(3));

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent, vec![matched(2), matched(3)]);
        assert_eq!(snapshot.dropped_events, 1);
        assert_eq!(snapshot.total_events, 3);
    }

    #[test]
    fn collector_broadcasts_to_subscribers() {
        let mut collector = TelemetryCollector::new(8, 8);
        let mut rx = collector.subscribe();
        collector.publish(matched(4));
        assert_eq!(rx.try_recv().unwrap(), matched(4));
    }

    #[test]
    fn drain_empties_history_but_keeps_counts() {
        let mut collector = TelemetryCollector::new(8, 8);
        collector.publish(matched(1));
        collector.publish(matched(2));
        assert_eq!(collector.drain().len(), 2);

        let snapshot = collector.snapshot();
        assert!(snapshot.recent.is_empty());
        assert_eq!(snapshot.total_events, 2);
    }

    #[test]
    fn event_json_is_tagged() {
        let json = serde_json::to_string(&matched(1)).unwrap();
        assert_eq!(
            json,
            r#"{"type":"gesture_matched","payload":{"round":1,"target":"punch"}}"#
        );
    }

    #[test]
    fn hit_rate_tracks_recent_window() {
        let mut tracker = HitRateTracker::new(4);
        assert_eq!(tracker.rate(), 0.0);
        tracker.observe(true);
        tracker.observe(false);
        assert!((tracker.rate() - 0.5).abs() < f32::EPSILON);

        for _ in 0..4 {
            tracker.observe(true);
        }
        assert!((tracker.rate() - 1.0).abs() < f32::EPSILON);

        tracker.reset();
        assert_eq!(tracker.rate(), 0.0);
    }
}
