//! Studyspot CLI - Binary entry point and terminal session management.
//!
//! # Architecture
//!
//! The CLI bridges [`studyspot_engine`] (screen state and capture cycle) and
//! [`studyspot_tui`] (rendering), providing RAII-based terminal management
//! with guaranteed cleanup.
//!
//! ```text
//! main() -> App::from_config() -> app.start() -> TerminalSession::new() -> run_app()
//!                                     |
//!                                     +--> --once: run_once() -> JSON on stdout
//! ```
//!
//! # Event Loop
//!
//! Full-screen mode renders on a fixed 16ms cadence:
//!
//! 1. Wait for frame tick
//! 2. Drain input queue (non-blocking via [`studyspot_tui::InputPump`])
//! 3. Advance application state (`app.tick()`): auto-refresh and completions
//! 4. Render frame
//! 5. Check for quit

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use serde_json::json;
use std::{
    env,
    fs::{self, OpenOptions},
    io::{Stdout, Write, stdout},
    path::PathBuf,
    process::ExitCode,
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use studyspot_config::{StudyspotConfig, config_dir};
use studyspot_engine::{App, CycleState, PermissionState};
use studyspot_tui::{InputPump, draw, handle_events};

const USAGE: &str = "\
Usage: studyspot [--once]

Counts people in a campus library study space from a camera frame.

Options:
  --once       Run one capture cycle, print the result as JSON, and exit
  -h, --help   Show this help
  -V, --version

Configuration: ~/.studyspot/config.toml
Environment:   STUDYSPOT_DETECT_URL, STUDYSPOT_CAMERA_SOURCE, RUST_LOG";

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file: prefer "no logs" over corrupting the TUI.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.studyspot/logs/studyspot.log
    if let Some(dir) = config_dir() {
        candidates.push(dir.join("logs").join("studyspot.log"));
    }

    // Fallback: ./.studyspot/logs/studyspot.log
    candidates.push(PathBuf::from(".studyspot").join("logs").join("studyspot.log"));

    candidates
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Interactive,
    Once,
    Help,
    Version,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Command> {
    let mut command = Command::Interactive;
    for arg in args {
        match arg.as_str() {
            "--once" => command = Command::Once,
            "-h" | "--help" => return Ok(Command::Help),
            "-V" | "--version" => return Ok(Command::Version),
            other => anyhow::bail!("unknown argument: {other}\n\n{USAGE}"),
        }
    }
    Ok(command)
}

/// RAII guard for terminal state.
///
/// Enables raw mode and the alternate screen on creation. On drop, all
/// terminal state is restored, so the terminal stays usable after panics or
/// early returns.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;

        let mut out = stdout();
        if let Err(err) = execute!(out, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err.into());
        }

        let terminal = match Terminal::new(CrosstermBackend::new(out)) {
            Ok(t) => t,
            Err(err) => {
                let _ = disable_raw_mode();
                let _ = execute!(stdout(), LeaveAlternateScreen);
                return Err(err.into());
            }
        };

        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let command = parse_args(env::args().skip(1))?;
    match command {
        Command::Help => {
            println!("{USAGE}");
            return Ok(ExitCode::SUCCESS);
        }
        Command::Version => {
            println!("studyspot {}", env!("CARGO_PKG_VERSION"));
            return Ok(ExitCode::SUCCESS);
        }
        Command::Interactive | Command::Once => {}
    }

    init_tracing();

    let config = match StudyspotConfig::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            eprintln!("Warning: {err}; using defaults");
            StudyspotConfig::default()
        }
    };
    let mut app = App::from_config(&config).context("failed to set up detection client")?;
    app.start().await;

    let code = if command == Command::Once {
        run_once(&mut app).await?
    } else {
        let result = {
            let mut session = TerminalSession::new()?;
            run_app(&mut session.terminal, &mut app).await
        };
        if let Err(err) = result {
            eprintln!("Error: {err:?}");
        }
        ExitCode::SUCCESS
    };

    app.shutdown();
    Ok(code)
}

const FRAME_DURATION: Duration = Duration::from_millis(16);

async fn run_app<B>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B: Backend + Write,
    B::Error: Send + Sync + 'static,
{
    let mut input = InputPump::new();
    let mut frames = tokio::time::interval(FRAME_DURATION);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result: Result<()> = loop {
        frames.tick().await;

        // Non-blocking input (drain queue only)
        match handle_events(app, &mut input) {
            Ok(true) => break Ok(()),
            Ok(false) => {}
            Err(e) => break Err(e),
        }

        app.tick();

        if let Err(e) = terminal.draw(|frame| draw(frame, app)) {
            break Err(e.into());
        }
    };

    input.shutdown().await;
    result
}

/// One capture cycle without a terminal UI.
async fn run_once(app: &mut App) -> Result<ExitCode> {
    if app.permission() != PermissionState::Granted {
        let report = json!({
            "error": "camera permission not granted",
            "permission": app.permission().as_str(),
            "camera": app.camera_label(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(ExitCode::FAILURE);
    }

    app.trigger_capture();
    let state = tokio::select! {
        state = app.settle() => state.clone(),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
            return Ok(ExitCode::FAILURE);
        }
    };

    let (report, code) = match &state {
        CycleState::Succeeded(result) => (
            json!({
                "people_count": result.people_count(),
                "image": app.last_saved().map(|saved| saved.image.display().to_string()),
                "occupancy": app.camera_occupancy(),
            }),
            ExitCode::SUCCESS,
        ),
        CycleState::Failed(failure) => (
            json!({
                "error": failure.message(),
                "kind": failure.kind().as_str(),
                "detail": failure.detail(),
            }),
            ExitCode::FAILURE,
        ),
        CycleState::Idle | CycleState::InFlight { .. } => (
            json!({ "error": "capture did not complete" }),
            ExitCode::FAILURE,
        ),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(code)
}
