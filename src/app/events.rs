//! Outbound engine events.
//!
//! The [`PostureEngine`](super::service::PostureEngine) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log them, hand the latest analysis
//! to a UI, forward errors to a notification channel.

use crate::analysis::{IssueKind, PostureAnalysis};

/// Structured events emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The engine has started a detection session.
    Started,

    /// A rate-limited, smoothed analysis was published.
    Analysis(PostureAnalysis),

    /// An issue passed its consistency threshold and is now shown.
    IssueRaised(IssueKind),

    /// A shown issue stopped qualifying.
    IssueCleared(IssueKind),

    /// Consistency counters were cleared (high score or explicit command).
    CountersReset,

    /// Human-readable detector or initialisation failure.
    DetectorError(String),

    /// The engine stopped and dropped its derived state.
    Stopped,
}
