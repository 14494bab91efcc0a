//! Cooperative detection loop.
//!
//! Single-threaded and reactor-driven: `edge-executor` schedules the
//! loop alongside any consumer tasks, `async-io-mini` supplies the tick
//! timers, and every await point is raced against a stop signal.
//!
//! ```text
//!   ┌─────────────┐    ┌─────────────────┐    ┌──────────────┐
//!   │ detect() ⏳ │──▶ │ process_frame() │──▶ │ Timer ⏱ tick │──┐
//!   └─────────────┘    └─────────────────┘    └──────────────┘  │
//!          ▲                                                    │
//!          └────────────────────────────────────────────────────┘
//!               any await  ◀── or ──  LoopControl::stop
//! ```
//!
//! Per-frame detector failures are logged, reported on the error
//! channel and skipped; the loop always reschedules.  A failed `init`
//! is fatal and the loop never starts.  Losing a race drops the pending
//! inference or timer, which is how stop cancels them.

use core::future::Future;
use core::time::Duration;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use embassy_sync::signal::Signal;
use log::{error, info, warn};

use crate::error::{DetectionError, Result};
use crate::scheduler::TickScheduler;

use super::commands::EngineCommand;
use super::events::EngineEvent;
use super::ports::{Clock, EventSink, PoseDetector, VisibilityPort};
use super::service::PostureEngine;

/// Inbound command queue depth.
pub const COMMAND_DEPTH: usize = 4;

// ── Loop control ─────────────────────────────────────────────

/// Stop signal plus inbound command queue, shared by reference between
/// the loop and whoever drives it.
pub struct LoopControl {
    stop: Signal<NoopRawMutex, ()>,
    commands: Channel<NoopRawMutex, EngineCommand, COMMAND_DEPTH>,
}

impl Default for LoopControl {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopControl {
    pub const fn new() -> Self {
        Self {
            stop: Signal::new(),
            commands: Channel::new(),
        }
    }

    /// Ask the loop to stop at its next await point.
    pub fn request_stop(&self) {
        self.stop.signal(());
    }

    /// True if a stop is pending and not yet consumed by the loop.
    pub fn stop_pending(&self) -> bool {
        self.stop.signaled()
    }

    /// Queue a command for the loop.  Hands the command back if full.
    pub fn send(&self, cmd: EngineCommand) -> core::result::Result<(), EngineCommand> {
        self.commands.try_send(cmd).map_err(|TrySendError::Full(cmd)| cmd)
    }
}

// ── Stats ────────────────────────────────────────────────────

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopExit {
    /// Stop was requested.
    #[default]
    Stopped,
    /// The detector reported it has no more frames.
    SourceExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopStats {
    /// Frames that made it through the pipeline.
    pub frames: u64,
    /// Per-frame detector failures that were skipped.
    pub detector_errors: u64,
    /// Analyses published by the emitter.
    pub emitted: u64,
    /// Commands applied (including rejected config updates).
    pub commands: u64,
    pub exit: LoopExit,
}

// ── Racing helper ────────────────────────────────────────────

enum Race<T> {
    Done(T),
    Stopped,
}

/// Run `fut` unless the stop signal fires first.  Stop is polled first
/// so a pending stop always wins.
async fn until_stopped<F: Future>(stop: &Signal<NoopRawMutex, ()>, fut: F) -> Race<F::Output> {
    futures_lite::future::or(
        async {
            stop.wait().await;
            Race::Stopped
        },
        async { Race::Done(fut.await) },
    )
    .await
}

// ── Detection loop ───────────────────────────────────────────

/// Wires an engine to its driven ports for one detection session.
pub struct DetectionLoop<'a, D, S, C, V> {
    engine: &'a mut PostureEngine,
    detector: &'a mut D,
    sink: &'a mut S,
    clock: &'a C,
    visibility: &'a V,
    ticks: TickScheduler,
}

impl<'a, D, S, C, V> DetectionLoop<'a, D, S, C, V>
where
    D: PoseDetector,
    S: EventSink,
    C: Clock,
    V: VisibilityPort,
{
    pub fn new(
        engine: &'a mut PostureEngine,
        detector: &'a mut D,
        sink: &'a mut S,
        clock: &'a C,
        visibility: &'a V,
    ) -> Self {
        let ticks = TickScheduler::new(&engine.config().scheduler);
        Self {
            engine,
            detector,
            sink,
            clock,
            visibility,
            ticks,
        }
    }

    /// Initialise the detector, then detect → analyse → tick until
    /// stopped or the detector is exhausted.
    pub async fn run(&mut self, control: &LoopControl) -> Result<LoopStats> {
        let mut stats = LoopStats::default();

        match until_stopped(&control.stop, self.detector.init()).await {
            Race::Stopped => {
                info!("Detection loop: stopped before detector init completed");
                return Ok(stats);
            }
            Race::Done(Err(e)) => {
                error!("Detection loop: detector init failed: {}", e);
                self.sink
                    .emit(&EngineEvent::DetectorError(format!("initialization failed: {e}")));
                return Err(e);
            }
            Race::Done(Ok(())) => {}
        }

        self.engine.start(&mut *self.sink);

        stats.exit = loop {
            stats.commands += self.drain_commands(control);

            let started_ms = self.clock.now_ms();
            match until_stopped(&control.stop, self.detector.detect()).await {
                Race::Stopped => break LoopExit::Stopped,
                Race::Done(Ok(frame)) => {
                    let outcome = self.engine.process_frame(frame, self.clock, &mut *self.sink);
                    stats.frames += 1;
                    if outcome.emitted.is_some() {
                        stats.emitted += 1;
                    }
                }
                Race::Done(Err(DetectionError::Exhausted)) => {
                    info!("Detection loop: frame source exhausted");
                    break LoopExit::SourceExhausted;
                }
                Race::Done(Err(e)) => {
                    warn!("Detection loop: frame skipped: {}", e);
                    stats.detector_errors += 1;
                    self.sink.emit(&EngineEvent::DetectorError(e.to_string()));
                }
            }

            let elapsed = Duration::from_millis(self.clock.now_ms().saturating_sub(started_ms));
            let delay = self
                .ticks
                .next_delay(self.visibility.is_foreground(), elapsed);
            if let Race::Stopped =
                until_stopped(&control.stop, async_io_mini::Timer::after(delay)).await
            {
                break LoopExit::Stopped;
            }
        };

        self.engine.stop(&mut *self.sink);
        info!(
            "Detection loop: {:?} after {} frames ({} skipped, {} published)",
            stats.exit, stats.frames, stats.detector_errors, stats.emitted
        );
        Ok(stats)
    }

    pub fn ticks(&self) -> &TickScheduler {
        &self.ticks
    }

    fn drain_commands(&mut self, control: &LoopControl) -> u64 {
        let mut applied = 0;
        while let Ok(cmd) = control.commands.try_receive() {
            let reconfigures = matches!(cmd, EngineCommand::UpdateConfig(_));
            if self.engine.handle_command(cmd, &mut *self.sink).is_ok() && reconfigures {
                self.ticks = TickScheduler::new(&self.engine.config().scheduler);
            }
            applied += 1;
        }
        applied
    }
}

/// Drive one detection session to completion on a fresh local executor.
pub fn run_blocking<D, S, C, V>(
    mut detection: DetectionLoop<'_, D, S, C, V>,
    control: &LoopControl,
) -> Result<LoopStats>
where
    D: PoseDetector,
    S: EventSink,
    C: Clock,
    V: VisibilityPort,
{
    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
    futures_lite::future::block_on(executor.run(detection.run(control)))
}
