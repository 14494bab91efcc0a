//! Detection tick scheduling.
//!
//! The detection loop asks the scheduler how long to wait before the
//! next inference.  Two interchangeable [`TickSource`] strategies exist
//! and a visibility signal picks between them each tick.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      TickScheduler                         │
//! │                                                            │
//! │   VisibilityPort::is_foreground()                          │
//! │          │                                                 │
//! │          ├── true ──▶ FrameSyncedTicks  (period − elapsed) │
//! │          │                                                 │
//! │          └── false ─▶ FixedDelayTicks   (constant delay)   │
//! │                                                            │
//! │                        ▼                                   │
//! │              Timer::after(delay) in the loop               │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Frame-synced ticks run the detector once per display-frame period,
//! absorbing however long the frame itself took.  The fixed-delay
//! fallback keeps the loop alive at a reduced rate while backgrounded.

use core::time::Duration;

use log::info;

use crate::config::SchedulerConfig;

// ═══════════════════════════════════════════════════════════════
//  Tick sources
// ═══════════════════════════════════════════════════════════════

/// A strategy for pacing detection ticks.
pub trait TickSource {
    /// Delay before the next tick, given how long the last frame took.
    fn next_delay(&mut self, frame_elapsed: Duration) -> Duration;

    /// Short label for logs.
    fn label(&self) -> &'static str;
}

/// High-priority, frame-synced ticks: one tick per `period`.
#[derive(Debug, Clone)]
pub struct FrameSyncedTicks {
    period: Duration,
}

impl FrameSyncedTicks {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

impl TickSource for FrameSyncedTicks {
    fn next_delay(&mut self, frame_elapsed: Duration) -> Duration {
        self.period.saturating_sub(frame_elapsed)
    }

    fn label(&self) -> &'static str {
        "frame-synced"
    }
}

/// Low-rate fallback: a constant delay after every frame.
#[derive(Debug, Clone)]
pub struct FixedDelayTicks {
    delay: Duration,
}

impl FixedDelayTicks {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl TickSource for FixedDelayTicks {
    fn next_delay(&mut self, _frame_elapsed: Duration) -> Duration {
        self.delay
    }

    fn label(&self) -> &'static str {
        "fixed-delay"
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

/// Which tick source is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMode {
    Foreground,
    Background,
}

/// Owns both strategies and switches on the visibility signal.
pub struct TickScheduler {
    foreground: FrameSyncedTicks,
    background: FixedDelayTicks,
    mode: Option<TickMode>,
    switches: u32,
}

impl TickScheduler {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            foreground: FrameSyncedTicks::new(Duration::from_millis(config.foreground_interval_ms)),
            background: FixedDelayTicks::new(Duration::from_millis(config.background_delay_ms)),
            mode: None,
            switches: 0,
        }
    }

    /// Pick the strategy for this tick.  Logs when the mode changes.
    pub fn select(&mut self, foreground: bool) -> &mut dyn TickSource {
        let mode = if foreground {
            TickMode::Foreground
        } else {
            TickMode::Background
        };
        if self.mode != Some(mode) {
            if self.mode.is_some() {
                self.switches = self.switches.saturating_add(1);
            }
            self.mode = Some(mode);
            let source: &dyn TickSource = match mode {
                TickMode::Foreground => &self.foreground,
                TickMode::Background => &self.background,
            };
            info!("Scheduler: {:?} mode, {} ticks", mode, source.label());
        }
        match mode {
            TickMode::Foreground => &mut self.foreground,
            TickMode::Background => &mut self.background,
        }
    }

    /// Convenience: select and compute the next delay in one call.
    pub fn next_delay(&mut self, foreground: bool, frame_elapsed: Duration) -> Duration {
        self.select(foreground).next_delay(frame_elapsed)
    }

    /// Mode used by the last tick, `None` before the first.
    pub fn mode(&self) -> Option<TickMode> {
        self.mode
    }

    /// Number of foreground/background switches so far.
    pub fn switches(&self) -> u32 {
        self.switches
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
