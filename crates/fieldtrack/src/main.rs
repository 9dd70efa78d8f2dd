//! fieldtrack - travel-day tracker
//!
//! Wires together:
//! - Configuration loading
//! - Event store
//! - Tracking session (classifier + state machine)
//! - Replay of recorded input, or a live loop over stdin

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use fieldtrack::{load_session_events, parse_input_line, read_inputs, replay};
use fieldtrack_config::{load_config, TrackerConfig};
use fieldtrack_core::{compute_timers, TrackingSession};
use fieldtrack_store::{EventStore, SqliteStore};
use fieldtrack_util::{
    default_config_path, format_minutes, Clock, ManualClock, SessionId, SystemClock,
    DATABASE_FILENAME, FIELDTRACK_DATA_DIR_ENV,
};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader as AsyncBufReader};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// fieldtrack - classify a field worker's day into travel, work and return
#[derive(Parser, Debug)]
#[command(name = "fieldtrack")]
#[command(about = "Classify a field worker's travel day from GPS fixes", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/fieldtrack/config.toml)
    #[arg(short, long, global = true, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set FIELDTRACK_DATA_DIR env var)
    #[arg(short, long, global = true, env = FIELDTRACK_DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay recorded NDJSON input and print the resulting events and totals
    Replay {
        /// NDJSON file of location updates and decisions
        input: PathBuf,

        /// Session to append to (default: a fresh random id)
        #[arg(long)]
        session: Option<String>,

        /// Measure the live phase at this time (RFC 3339)
        #[arg(long, value_parser = parse_time)]
        now: Option<DateTime<Local>>,
    },

    /// Track live input read from stdin until EOF or a signal
    Track {
        /// Session to track (default: today's date)
        #[arg(long)]
        session: Option<String>,

        /// Seconds between status reports
        #[arg(long, default_value_t = 60)]
        tick_seconds: u64,
    },

    /// Print a session's event log
    Events {
        #[arg(long)]
        session: String,
    },

    /// Print a session's totals
    Totals {
        #[arg(long)]
        session: String,

        /// Measure the live phase at this time (RFC 3339, default: now)
        #[arg(long, value_parser = parse_time)]
        now: Option<DateTime<Local>>,
    },

    /// List sessions in the store
    Sessions,
}

fn parse_time(s: &str) -> std::result::Result<DateTime<Local>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|e| format!("expected RFC 3339 time: {}", e))
}

/// Loaded config plus the store it points at
struct App {
    config: Option<TrackerConfig>,
    store: Arc<SqliteStore>,
}

impl App {
    /// Commands that classify need the config; read-only ones only need a
    /// data directory.
    fn open(args: &Args, require_config: bool) -> Result<Self> {
        let config = if require_config || args.data_dir.is_none() {
            let config = load_config(&args.config)
                .with_context(|| format!("Failed to load config from {:?}", args.config))?;
            info!(
                config_path = %args.config.display(),
                home = %config.classifier.home.name,
                "Configuration loaded"
            );
            Some(config)
        } else {
            None
        };

        let data_dir = args
            .data_dir
            .clone()
            .or_else(|| config.as_ref().map(|c| c.data_dir.clone()))
            .context("No data directory configured")?;

        let store = open_store(&data_dir)?;
        Ok(Self { config, store })
    }

    fn config(&self) -> Result<&TrackerConfig> {
        self.config.as_ref().context("Configuration not loaded")
    }
}

fn open_store(data_dir: &Path) -> Result<Arc<SqliteStore>> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    let db_path = data_dir.join(DATABASE_FILENAME);
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;

    if !store.is_healthy() {
        anyhow::bail!("Database {:?} failed its health check", db_path);
    }

    info!(db_path = %db_path.display(), "Store initialized");
    Ok(Arc::new(store))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_replay(
    app: &App,
    input: &Path,
    session: Option<String>,
    now: Option<DateTime<Local>>,
) -> Result<()> {
    let config = app.config()?;
    let file = File::open(input).with_context(|| format!("Failed to open input {:?}", input))?;
    let inputs = read_inputs(BufReader::new(file))
        .with_context(|| format!("Failed to read input {:?}", input))?;

    let Some(start) = inputs.iter().find_map(|i| i.timestamp()) else {
        warn!(input = %input.display(), "Input has no timestamped records");
        return Ok(());
    };

    let session_id = session.map(SessionId::new).unwrap_or_else(SessionId::generate);
    let clock = Arc::new(ManualClock::new(start));
    let mut session =
        TrackingSession::resume(session_id, config, app.store.clone(), clock.clone())
            .context("Failed to load session")?;

    info!(
        session_id = %session.session_id(),
        records = inputs.len(),
        "Replaying input"
    );

    let report = replay(&mut session, &clock, inputs, now);
    print_json(&report)
}

async fn run_track(app: &App, session: Option<String>, tick_seconds: u64) -> Result<()> {
    let config = app.config()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let session_id = session
        .map(SessionId::new)
        .unwrap_or_else(|| SessionId::new(clock.now().format("%Y-%m-%d").to_string()));

    let mut session = TrackingSession::resume(session_id, config, app.store.clone(), clock.clone())
        .context("Failed to load session")?;

    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

    let mut lines = AsyncBufReader::new(tokio::io::stdin()).lines();
    let mut tick_timer = tokio::time::interval(Duration::from_secs(tick_seconds.max(1)));

    info!(
        session_id = %session.session_id(),
        state = %session.state(),
        "Tracking"
    );

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully");
                break;
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully");
                break;
            }

            // Status report and liveness check
            _ = tick_timer.tick() => {
                let now = clock.now();
                if session.is_fix_stale(now) {
                    warn!(
                        last_fix = ?session.last_fix().map(|f| f.timestamp),
                        "No location fix received recently"
                    );
                }

                let totals = session.totals(now);
                info!(
                    state = %session.state(),
                    travel = %format_minutes(totals.travel_minutes),
                    work = %format_minutes(totals.work_minutes),
                    ret = %format_minutes(totals.return_minutes),
                    live = ?totals.live.as_ref().map(|l| (l.phase, l.elapsed_minutes)),
                    "Status"
                );
            }

            line = lines.next_line() => {
                let line = line.context("Failed to read stdin")?;
                let Some(line) = line else {
                    info!("Input closed");
                    break;
                };

                match parse_input_line(&line) {
                    Ok(Some(input)) => {
                        if let Some(event) = session.handle(input) {
                            println!("{}", serde_json::to_string(&event)?);
                        }
                        if let Some(prompt) = session.pending_prompt() {
                            debug!(state = %session.state(), ?prompt, "Awaiting decision");
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Skipping malformed input"),
                }
            }
        }
    }

    let totals = session.totals(clock.now());
    info!(
        session_id = %session.session_id(),
        state = %session.state(),
        closed_minutes = totals.total_closed_minutes(),
        "Shutdown complete"
    );
    print_json(&totals)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout is reserved for JSON output
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "fieldtrack starting");

    match &args.command {
        Command::Replay {
            input,
            session,
            now,
        } => {
            let app = App::open(&args, true)?;
            run_replay(&app, input, session.clone(), *now)
        }
        Command::Track {
            session,
            tick_seconds,
        } => {
            let app = App::open(&args, true)?;
            run_track(&app, session.clone(), *tick_seconds).await
        }
        Command::Events { session } => {
            let app = App::open(&args, false)?;
            print_json(&load_session_events(&*app.store, &SessionId::new(session))?)
        }
        Command::Totals { session, now } => {
            let app = App::open(&args, false)?;
            let events = load_session_events(&*app.store, &SessionId::new(session))?;
            let now = now.unwrap_or_else(|| SystemClock.now());
            print_json(&compute_timers(&events, now))
        }
        Command::Sessions => {
            let app = App::open(&args, false)?;
            let sessions = app.store.list_sessions().context("Failed to list sessions")?;
            print_json(&sessions)
        }
    }
}
