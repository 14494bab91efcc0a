//! Inbound commands to the posture engine.
//!
//! These represent actions requested by the outside world (settings UI,
//! test harness) that the [`PostureEngine`](super::service::PostureEngine)
//! interprets and acts upon.

use crate::config::EngineConfig;

/// Commands that external adapters can send into the engine.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Hot-reload configuration.  Validated before it is applied.
    UpdateConfig(EngineConfig),

    /// Clear every consistency counter.
    ClearCounters,

    /// Drop smoothing windows, analysis history and the current analysis.
    ResetHistory,
}
