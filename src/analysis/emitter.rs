//! Output emitter.
//!
//! Rate-limits publication of finished analyses so consumers see one
//! update per interval regardless of detector frame rate.  The first
//! analysis after construction (or [`OutputEmitter::reset`]) is always
//! published.

use crate::config::EmitConfig;

pub struct OutputEmitter {
    min_interval_ms: u64,
    last_emit_ms: Option<u64>,
}

impl OutputEmitter {
    pub fn new(config: &EmitConfig) -> Self {
        Self {
            min_interval_ms: config.min_interval_ms,
            last_emit_ms: None,
        }
    }

    pub fn reconfigure(&mut self, config: &EmitConfig) {
        self.min_interval_ms = config.min_interval_ms;
    }

    /// True if an analysis completed at `now_ms` should be published.
    /// Records `now_ms` as the last emit time when it returns true.
    pub fn should_emit(&mut self, now_ms: u64) -> bool {
        let due = match self.last_emit_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.min_interval_ms,
        };
        if due {
            self.last_emit_ms = Some(now_ms);
        }
        due
    }

    /// Milliseconds until the next emit is allowed, `0` if one is due now.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.last_emit_ms.map_or(0, |last| {
            self.min_interval_ms
                .saturating_sub(now_ms.saturating_sub(last))
        })
    }

    pub fn last_emit_ms(&self) -> Option<u64> {
        self.last_emit_ms
    }

    /// Forget the last emit time.
    pub fn reset(&mut self) {
        self.last_emit_ms = None;
    }
}
