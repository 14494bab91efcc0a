//! Channel-backed event sink.
//!
//! Bridges the detection loop to consumer tasks on the same executor
//! using `embassy-sync` primitives, without heap-shared state.
//!
//! ```text
//! ┌────────────────┐  Signal<PostureAnalysis>   ┌──────────────┐
//! │ Detection loop │ ─────────────────────────▶ │  UI consumer │
//! │  (ChannelSink) │ ─────────────────────────▶ │  (async)     │
//! └────────────────┘  Channel<String, 8> errors └──────────────┘
//! ```
//!
//! The analysis slot holds at most one value: a newer analysis replaces
//! one the consumer has not picked up yet.  Errors queue up to
//! [`ERROR_DEPTH`]; when full the oldest report is kept and the new one
//! is dropped with a warning.

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use log::warn;

use crate::analysis::PostureAnalysis;
use crate::app::events::EngineEvent;
use crate::app::ports::EventSink;

/// Error channel depth.
pub const ERROR_DEPTH: usize = 8;

/// Consumer-facing end: one analysis slot plus an error queue.
pub struct EngineOutputs {
    analysis: Signal<NoopRawMutex, PostureAnalysis>,
    errors: Channel<NoopRawMutex, String, ERROR_DEPTH>,
}

impl Default for EngineOutputs {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineOutputs {
    pub const fn new() -> Self {
        Self {
            analysis: Signal::new(),
            errors: Channel::new(),
        }
    }

    /// Wait for the next published analysis.
    pub async fn next_analysis(&self) -> PostureAnalysis {
        self.analysis.wait().await
    }

    /// Take the pending analysis, if any.
    pub fn try_analysis(&self) -> Option<PostureAnalysis> {
        self.analysis.try_take()
    }

    /// Wait for the next error report.
    pub async fn next_error(&self) -> String {
        self.errors.receive().await
    }

    pub fn try_error(&self) -> Option<String> {
        self.errors.try_receive().ok()
    }

    /// Producer-side sink writing into these outputs.
    pub fn sink(&self) -> ChannelSink<'_> {
        ChannelSink { outputs: self }
    }
}

/// [`EventSink`] that forwards analyses and errors into [`EngineOutputs`].
/// Other events are ignored.
pub struct ChannelSink<'a> {
    outputs: &'a EngineOutputs,
}

impl EventSink for ChannelSink<'_> {
    fn emit(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::Analysis(a) => self.outputs.analysis.signal(a.clone()),
            EngineEvent::DetectorError(msg) => {
                if self.outputs.errors.try_send(msg.clone()).is_err() {
                    warn!("ChannelSink: error channel full, dropping report");
                }
            }
            _ => {}
        }
    }
}
