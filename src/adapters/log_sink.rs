//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every engine event as one
//! structured log line.  A UI adapter would implement the same trait.

use log::{debug, info, warn};

use crate::app::events::EngineEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`EngineEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink {
    published: u64,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of analyses logged so far.
    pub fn published(&self) -> u64 {
        self.published
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::Analysis(a) => {
                self.published += 1;
                let m = &a.metrics;
                info!(
                    "ANALYSIS | score={:.1} | issues={:?} | neck={:.1} shoulders={:.1} \
                     spine={:.1} head={:.1} height={:.2}",
                    a.score,
                    a.issues.as_slice(),
                    m.neck_angle,
                    m.shoulder_alignment,
                    m.spine_alignment,
                    m.head_position,
                    m.shoulder_height,
                );
            }
            EngineEvent::IssueRaised(kind) => {
                info!("ISSUE | raised {}", kind);
            }
            EngineEvent::IssueCleared(kind) => {
                info!("ISSUE | cleared {}", kind);
            }
            EngineEvent::CountersReset => {
                debug!("ISSUE | counters reset");
            }
            EngineEvent::DetectorError(msg) => {
                warn!("DETECTOR | {}", msg);
            }
            EngineEvent::Started => {
                info!("START | engine running");
            }
            EngineEvent::Stopped => {
                info!("STOP | engine stopped ({} analyses)", self.published);
            }
        }
    }
}
