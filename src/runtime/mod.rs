//! Event loop driving a [`GameContext`].
//!
//! One task owns the context and multiplexes, in priority order:
//! commands from [`GameHandle`]s, the round deadline, the optional
//! calibration window deadline, the sampling tick and the redraw tick.
//! Nothing is shared across threads, so the context needs no locks.
//!
//! The round deadline is re-armed from the interval returned by each
//! evaluation, so the delay always reflects the shrunken window. A finished
//! session clears it and the round clock stays silent until the next start.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::context::{GameContext, GameSnapshot};
use crate::sensor::SensorSource;

pub mod replay;

pub use replay::{ReplayDriver, ReplaySummary};

const COMMAND_BUFFER: usize = 32;
const SNAPSHOT_BUFFER: usize = 16;

/// Commands accepted by the event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameCommand {
    StartSession,
    BeginCalibration,
    EndCalibration,
    Shutdown,
}

/// Cloneable handle for sending commands and watching snapshots
#[derive(Debug, Clone)]
pub struct GameHandle {
    command_tx: mpsc::Sender<GameCommand>,
    snapshot_tx: broadcast::Sender<GameSnapshot>,
}

impl GameHandle {
    /// Queue a command for the loop
    pub async fn send(
        &self,
        command: GameCommand,
    ) -> Result<(), mpsc::error::SendError<GameCommand>> {
        self.command_tx.send(command).await
    }

    pub async fn start_session(&self) -> Result<(), mpsc::error::SendError<GameCommand>> {
        self.send(GameCommand::StartSession).await
    }

    pub async fn begin_calibration(&self) -> Result<(), mpsc::error::SendError<GameCommand>> {
        self.send(GameCommand::BeginCalibration).await
    }

    pub async fn end_calibration(&self) -> Result<(), mpsc::error::SendError<GameCommand>> {
        self.send(GameCommand::EndCalibration).await
    }

    pub async fn shutdown(&self) -> Result<(), mpsc::error::SendError<GameCommand>> {
        self.send(GameCommand::Shutdown).await
    }

    /// Receive a snapshot on every redraw tick and after every command
    pub fn subscribe(&self) -> broadcast::Receiver<GameSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Whether the loop has stopped accepting commands
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }
}

/// Single-task game driver
pub struct GameLoop<S: SensorSource> {
    ctx: GameContext,
    sensor: S,
    command_rx: mpsc::Receiver<GameCommand>,
    snapshot_tx: broadcast::Sender<GameSnapshot>,
}

impl<S: SensorSource> GameLoop<S> {
    pub fn new(ctx: GameContext, sensor: S) -> (Self, GameHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, _) = broadcast::channel(SNAPSHOT_BUFFER);
        let handle = GameHandle {
            command_tx,
            snapshot_tx: snapshot_tx.clone(),
        };
        (
            Self {
                ctx,
                sensor,
                command_rx,
                snapshot_tx,
            },
            handle,
        )
    }

    /// Run until `Shutdown` arrives or every handle is dropped
    ///
    /// Returns the context so the caller can persist it.
    pub async fn run(mut self) -> GameContext {
        // tokio panics on a zero-length interval
        let sample_period_ms = self.ctx.config().sampling.sample_period_ms.max(1);
        let redraw_period_ms = self.ctx.config().sampling.redraw_period_ms.max(1);
        let mut sample_tick = time::interval(Duration::from_millis(sample_period_ms));
        sample_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut redraw_tick = time::interval(Duration::from_millis(redraw_period_ms));
        redraw_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut round_deadline: Option<Instant> = None;
        let mut calibration_deadline: Option<Instant> = None;

        tracing::info!(
            sample_period_ms,
            redraw_period_ms,
            "Game loop started"
        );

        loop {
            tokio::select! {
                biased;

                command = self.command_rx.recv() => {
                    let command = command.unwrap_or(GameCommand::Shutdown);
                    tracing::debug!(?command, "Command received");
                    match command {
                        GameCommand::Shutdown => break,
                        GameCommand::StartSession => {
                            if let Some(delay) = self.ctx.start_session() {
                                round_deadline = Some(Instant::now() + delay);
                            }
                        }
                        GameCommand::BeginCalibration => {
                            if self.ctx.begin_calibration() {
                                calibration_deadline = self
                                    .ctx
                                    .calibration_window()
                                    .map(|window| Instant::now() + window);
                            }
                        }
                        GameCommand::EndCalibration => {
                            if self.ctx.is_calibrating() {
                                self.ctx.end_calibration();
                                calibration_deadline = None;
                            }
                        }
                    }
                    self.publish_snapshot();
                }

                _ = sleep_until_opt(round_deadline) => {
                    let fired_at = round_deadline.unwrap_or_else(Instant::now);
                    round_deadline = self
                        .ctx
                        .on_round_timer()
                        .and_then(|outcome| outcome.next.delay())
                        .map(|delay| fired_at + delay);
                    if round_deadline.is_none() {
                        tracing::info!("Round clock stopped");
                    }
                }

                _ = sleep_until_opt(calibration_deadline) => {
                    calibration_deadline = None;
                    tracing::info!("Calibration window elapsed");
                    self.ctx.end_calibration();
                }

                _ = sample_tick.tick() => {
                    self.ctx.poll_sensor(&mut self.sensor);
                }

                _ = redraw_tick.tick() => {
                    self.publish_snapshot();
                }
            }
        }

        tracing::info!(
            high_score = self.ctx.high_score(),
            "Game loop stopped"
        );
        self.ctx
    }

    fn publish_snapshot(&self) {
        // Nobody watching is fine
        let _ = self.snapshot_tx.send(self.ctx.snapshot());
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::game::{Gesture, LogFeedback, SessionPhase};
    use crate::sensor::{AccelSample, ScriptedSensor};

    fn context(config: AppConfig) -> GameContext {
        GameContext::new(config, Box::new(LogFeedback))
    }

    fn seeded() -> AppConfig {
        let mut config = AppConfig::default();
        config.game.seed = Some(3);
        config
    }

    /// Reading that satisfies every target under the default profile
    fn hits_everything() -> ScriptedSensor {
        ScriptedSensor::constant(AccelSample::new(2000, 2000, -2000))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fulfilled_rounds_score() {
        let (game_loop, handle) = GameLoop::new(context(seeded()), hits_everything());
        let task = tokio::spawn(game_loop.run());

        handle.start_session().await.unwrap();
        // Rounds fire at 2500, 4990 and 7470
        time::sleep(Duration::from_millis(7480)).await;
        handle.shutdown().await.unwrap();

        let ctx = task.await.unwrap();
        let snapshot = ctx.snapshot();
        assert_eq!(snapshot.round, 3);
        assert_eq!(snapshot.points, 30);
        assert_eq!(snapshot.health, 3);
        assert_eq!(snapshot.interval_ms, 2470);
        assert!(snapshot.running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_sensor_finishes_session() {
        let (game_loop, handle) = GameLoop::new(context(seeded()), ScriptedSensor::silent());
        let task = tokio::spawn(game_loop.run());

        handle.start_session().await.unwrap();
        time::sleep(Duration::from_millis(20_000)).await;
        handle.shutdown().await.unwrap();

        let ctx = task.await.unwrap();
        let snapshot = ctx.snapshot();
        assert_eq!(snapshot.phase, SessionPhase::Finished);
        assert_eq!(snapshot.current_target, Gesture::Finished);
        assert_eq!(snapshot.health, 0);
        assert_eq!(snapshot.round, 3, "No rounds after finalization");
        assert!(!snapshot.running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_calibration_window_ends_automatically() {
        let mut config = seeded();
        config.calibration.window_ms = Some(500);
        let sensor = ScriptedSensor::constant(AccelSample::new(2500, -2200, -2700));
        let (game_loop, handle) = GameLoop::new(context(config), sensor);
        let task = tokio::spawn(game_loop.run());

        handle.begin_calibration().await.unwrap();
        handle.start_session().await.unwrap();
        time::sleep(Duration::from_millis(600)).await;
        handle.shutdown().await.unwrap();

        let ctx = task.await.unwrap();
        assert!(!ctx.is_calibrating());
        assert_eq!(ctx.phase(), SessionPhase::Idle, "Start ignored while calibrating");
        let thresholds = ctx.profile().active_thresholds();
        assert_eq!((thresholds.x, thresholds.y, thresholds.z), (2500, 2200, -2700));
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_end_calibration() {
        let sensor = ScriptedSensor::constant(AccelSample::new(1800, 100, -100));
        let (game_loop, handle) = GameLoop::new(context(seeded()), sensor);
        let task = tokio::spawn(game_loop.run());

        handle.begin_calibration().await.unwrap();
        time::sleep(Duration::from_millis(100)).await;
        handle.end_calibration().await.unwrap();
        handle.shutdown().await.unwrap();

        let ctx = task.await.unwrap();
        assert!(!ctx.is_calibrating());
        assert_eq!(ctx.profile().punch.x, 1800);
        assert_eq!(ctx.profile().block.y, 1500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshots_are_published() {
        let (game_loop, handle) = GameLoop::new(context(seeded()), ScriptedSensor::silent());
        let mut snapshots = handle.subscribe();
        let task = tokio::spawn(game_loop.run());

        handle.start_session().await.unwrap();
        let first = snapshots.recv().await.unwrap();
        assert_eq!(first.health, 3);

        let mut saw_running = first.running;
        for _ in 0..5 {
            let snapshot = snapshots.recv().await.unwrap();
            saw_running |= snapshot.running;
        }
        assert!(saw_running);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
        assert!(handle.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_periods_run_at_one_millisecond() {
        let mut config = seeded();
        config.sampling.sample_period_ms = 0;
        config.sampling.redraw_period_ms = 0;
        let (game_loop, handle) = GameLoop::new(context(config), hits_everything());
        let task = tokio::spawn(game_loop.run());

        handle.start_session().await.unwrap();
        time::sleep(Duration::from_millis(2510)).await;
        handle.shutdown().await.unwrap();

        let ctx = task.await.unwrap();
        assert_eq!(ctx.snapshot().round, 1);
        assert_eq!(ctx.snapshot().points, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_every_handle_stops_loop() {
        let (game_loop, handle) = GameLoop::new(context(seeded()), ScriptedSensor::silent());
        let task = tokio::spawn(game_loop.run());
        drop(handle);
        let ctx = task.await.unwrap();
        assert_eq!(ctx.phase(), SessionPhase::Idle);
    }
}
