//! PostureWatch: host replay entry point.
//!
//! Replays recorded pose-detector output through the detection loop and
//! prints every published analysis as one JSON line on stdout.
//!
//! ```text
//! posturewatch <frames.jsonl> [config.json] [--background]
//! ```
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ReplayDetector ──▶ DetectionLoop ──▶ HostSink               │
//! │                     (PostureEngine)    ├─ LogEventSink (log) │
//! │                                        └─ ChannelSink ──┐    │
//! │                                                         ▼    │
//! │                               consumer task: stdout JSON     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! `RUST_LOG` selects the log level (default `posturewatch=info`).

use anyhow::{Context, Result, bail};
use log::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use posturewatch::adapters::channel_sink::{ChannelSink, EngineOutputs};
use posturewatch::adapters::json_config::JsonFileConfig;
use posturewatch::adapters::log_sink::LogEventSink;
use posturewatch::adapters::replay::ReplayDetector;
use posturewatch::adapters::time::MonotonicClock;
use posturewatch::adapters::visibility::StaticVisibility;
use posturewatch::analysis::PostureAnalysis;
use posturewatch::app::detection_loop::{DetectionLoop, LoopControl};
use posturewatch::app::events::EngineEvent;
use posturewatch::app::ports::{ConfigPort, EventSink};
use posturewatch::{EngineConfig, PostureEngine};

const USAGE: &str = "usage: posturewatch <frames.jsonl> [config.json] [--background]";

// ── Sink fan-out ──────────────────────────────────────────────

/// Sends every event to the log and to the consumer channel.
struct HostSink<'a> {
    log: LogEventSink,
    channel: ChannelSink<'a>,
}

impl EventSink for HostSink<'_> {
    fn emit(&mut self, event: &EngineEvent) {
        self.log.emit(event);
        self.channel.emit(event);
    }
}

// ── Arguments ─────────────────────────────────────────────────

struct Args {
    frames: String,
    config: Option<String>,
    background: bool,
}

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut background = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--background" => background = true,
            "-h" | "--help" => bail!(USAGE),
            s if s.starts_with("--") => bail!("unknown flag '{s}'\n{USAGE}"),
            _ => positional.push(arg),
        }
    }
    let mut positional = positional.into_iter();
    let Some(frames) = positional.next() else {
        bail!(USAGE);
    };
    let config = positional.next();
    if positional.next().is_some() {
        bail!("too many arguments\n{USAGE}");
    }
    Ok(Args {
        frames,
        config,
        background,
    })
}

fn print_analysis(analysis: &PostureAnalysis) {
    match serde_json::to_string(analysis) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!("Failed to encode analysis: {}", e),
    }
}

/// Consumer task: one JSON line per published analysis.
async fn print_analyses(outputs: &EngineOutputs) {
    loop {
        let analysis = outputs.next_analysis().await;
        print_analysis(&analysis);
    }
}

/// Consumer task: surface detector failures from the error channel.
async fn report_errors(outputs: &EngineOutputs) {
    loop {
        let err = outputs.next_error().await;
        eprintln!("posturewatch: {err}");
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("posturewatch=info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    info!("PostureWatch v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => {
            let port = JsonFileConfig::new(path);
            port
                .load()
                .with_context(|| format!("loading config from {}", port.path().display()))?
        }
        None => EngineConfig::default(),
    };

    // ── 3. Adapters ───────────────────────────────────────────
    let mut detector = ReplayDetector::from_path(&args.frames)
        .with_context(|| format!("reading frames from {}", args.frames))?;
    let clock = MonotonicClock::new();
    let visibility = StaticVisibility::new(!args.background);
    let outputs = EngineOutputs::new();
    let mut sink = HostSink {
        log: LogEventSink::new(),
        channel: outputs.sink(),
    };
    let control = LoopControl::new();
    let mut engine = PostureEngine::new(config);

    // ── 4. Executor: consumer task + detection loop ───────────
    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
    executor.spawn(print_analyses(&outputs)).detach();
    executor.spawn(report_errors(&outputs)).detach();

    let mut detection =
        DetectionLoop::new(&mut engine, &mut detector, &mut sink, &clock, &visibility);
    let stats = futures_lite::future::block_on(executor.run(detection.run(&control)))
        .context("detection loop failed to start")?;

    // The consumer may not have picked up the final analysis yet.
    if let Some(last) = outputs.try_analysis() {
        print_analysis(&last);
    }
    while let Some(err) = outputs.try_error() {
        eprintln!("posturewatch: {err}");
    }

    info!(
        "Replay finished: {} frames, {} skipped, {} analyses published",
        stats.frames, stats.detector_errors, stats.emitted
    );
    Ok(())
}
