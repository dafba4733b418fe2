use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reflex_trainer::calibration::CalibrationProfile;
use reflex_trainer::config::AppConfig;
use reflex_trainer::context::GameContext;
use reflex_trainer::game::LogFeedback;
use reflex_trainer::runtime::{GameLoop, ReplayDriver};
use reflex_trainer::sensor::{ScriptedSensor, SensorFixture};
use reflex_trainer::storage::JsonFileStore;
use serde::Serialize;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "reflex_cli",
    about = "Deterministic session replay and calibration harness for Reflex Trainer"
)]
struct Cli {
    /// JSON config file (defaults to assets/reflex_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Persistence store file (overrides storage.path from the config)
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    /// Fixed RNG seed for the target sequence
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay one session against a sensor fixture on a virtual clock
    Replay {
        #[arg(long)]
        fixture: PathBuf,
        #[arg(long, default_value_t = 1000)]
        max_rounds: u32,
    },
    /// Calibrate from a sensor fixture and save the profile
    Calibrate {
        #[arg(long)]
        fixture: PathBuf,
        /// Virtual capture length (defaults to one pass over the fixture)
        #[arg(long)]
        duration_ms: Option<u64>,
    },
    /// Run the live event loop fed by a looping fixture
    Play {
        #[arg(long)]
        fixture: PathBuf,
        #[arg(long, default_value_t = 10_000)]
        watch_ms: u64,
    },
    /// Print the persisted high score and calibration profile
    Show,
    /// Remove every persisted record
    Reset,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };
    if cli.seed.is_some() {
        config.game.seed = cli.seed;
    }
    let store_path = cli
        .store
        .clone()
        .unwrap_or_else(|| config.storage.path.clone());

    match cli.command {
        Commands::Replay {
            fixture,
            max_rounds,
        } => run_replay(config, &store_path, &fixture, max_rounds),
        Commands::Calibrate {
            fixture,
            duration_ms,
        } => run_calibrate(config, &store_path, &fixture, duration_ms),
        Commands::Play { fixture, watch_ms } => run_play(config, &store_path, &fixture, watch_ms),
        Commands::Show => run_show(config, &store_path),
        Commands::Reset => run_reset(&store_path),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(path: &Path) -> Result<JsonFileStore> {
    JsonFileStore::open(path).with_context(|| format!("opening store {}", path.display()))
}

fn load_fixture(path: &Path) -> Result<SensorFixture> {
    SensorFixture::load_from_file(path)
        .with_context(|| format!("loading fixture {}", path.display()))
}

fn run_replay(
    config: AppConfig,
    store_path: &Path,
    fixture_path: &Path,
    max_rounds: u32,
) -> Result<ExitCode> {
    let mut store = open_store(store_path)?;
    let fixture = load_fixture(fixture_path)?;
    let ctx = GameContext::load(&store, config, Box::new(LogFeedback));

    let mut driver = ReplayDriver::new(ctx, ScriptedSensor::from_fixture(fixture));
    let mut events = Vec::new();
    let summary = driver.run_session_with(Some(max_rounds), |event| events.push(event));

    for event in &events {
        println!("{}", serde_json::to_string(event)?);
    }
    println!("{}", serde_json::to_string(&summary)?);

    driver
        .into_context()
        .persist(&mut store)
        .with_context(|| format!("saving store {}", store_path.display()))?;
    Ok(ExitCode::from(0))
}

fn run_calibrate(
    config: AppConfig,
    store_path: &Path,
    fixture_path: &Path,
    duration_ms: Option<u64>,
) -> Result<ExitCode> {
    let mut store = open_store(store_path)?;
    let fixture = load_fixture(fixture_path)?;
    let default_duration = fixture.frames.len() as u64 * config.sampling.sample_period_ms;
    let duration_ms = duration_ms.unwrap_or(default_duration);
    let ctx = GameContext::load(&store, config, Box::new(LogFeedback));

    let mut driver = ReplayDriver::new(ctx, ScriptedSensor::from_fixture(fixture));
    let committed = driver.run_calibration(duration_ms);
    let ctx = driver.into_context();

    match committed {
        Some(profile) => {
            println!("{}", serde_json::to_string_pretty(&profile)?);
            ctx.persist(&mut store)
                .with_context(|| format!("saving store {}", store_path.display()))?;
            Ok(ExitCode::from(0))
        }
        None => {
            eprintln!("No samples captured; profile unchanged");
            Ok(ExitCode::from(2))
        }
    }
}

fn run_play(
    config: AppConfig,
    store_path: &Path,
    fixture_path: &Path,
    watch_ms: u64,
) -> Result<ExitCode> {
    let mut store = open_store(store_path)?;
    let mut fixture = load_fixture(fixture_path)?;
    fixture.looping = true;
    let ctx = GameContext::load(&store, config, Box::new(LogFeedback));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("building event loop runtime")?;

    let ctx = runtime.block_on(async move {
        let (game_loop, handle) = GameLoop::new(ctx, ScriptedSensor::from_fixture(fixture));
        let mut snapshots = handle.subscribe();
        let task = tokio::spawn(game_loop.run());

        handle.start_session().await?;
        let deadline = tokio::time::sleep(Duration::from_millis(watch_ms));
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = &mut deadline => break,
                snapshot = snapshots.recv() => match snapshot {
                    Ok(snapshot) => println!("{}", serde_json::to_string(&snapshot)?),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Snapshot subscriber lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        handle.shutdown().await?;
        task.await.context("joining game loop")
    })?;

    ctx.persist(&mut store)
        .with_context(|| format!("saving store {}", store_path.display()))?;
    Ok(ExitCode::from(0))
}

#[derive(Serialize)]
struct StoreReport {
    high_score: u32,
    profile: CalibrationProfile,
}

fn run_show(config: AppConfig, store_path: &Path) -> Result<ExitCode> {
    let store = open_store(store_path)?;
    let ctx = GameContext::load(&store, config, Box::new(LogFeedback));
    let report = StoreReport {
        high_score: ctx.high_score(),
        profile: *ctx.profile(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

fn run_reset(store_path: &Path) -> Result<ExitCode> {
    use reflex_trainer::storage::PersistenceStore;

    let mut store = open_store(store_path)?;
    store.clear();
    store
        .flush()
        .with_context(|| format!("saving store {}", store_path.display()))?;
    println!("Cleared {}", store_path.display());
    Ok(ExitCode::from(0))
}
