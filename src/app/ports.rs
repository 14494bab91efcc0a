//! Port traits: the hexagonal boundary between the posture engine and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PostureEngine (domain)
//! ```
//!
//! Driven adapters (pose detector, event sinks, config storage, clocks)
//! implement these traits.  The [`PostureEngine`](super::service::PostureEngine)
//! and the [detection loop](super::detection_loop) consume them via
//! generics, so the domain core never touches a camera or a file directly.
//!
//! All port errors are typed; callers must handle every variant explicitly.

use crate::config::EngineConfig;
use crate::error::{DetectionError, Error};
use crate::landmarks::LandmarkFrame;

// ───────────────────────────────────────────────────────────────
// Pose detector port (driven adapter: model → domain)
// ───────────────────────────────────────────────────────────────

/// The external pose-estimation model.
///
/// Both methods may suspend.  The detection loop races every call
/// against its stop signal, so an in-flight inference is dropped when
/// the engine stops.
#[allow(async_fn_in_trait)]
pub trait PoseDetector {
    /// Load the model.  Failure here is fatal to the engine instance.
    async fn init(&mut self) -> Result<(), Error>;

    /// Run one inference and return the decoded landmark frame.
    async fn detect(&mut self) -> Result<LandmarkFrame, DetectionError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → UI / logging)
// ───────────────────────────────────────────────────────────────

/// The engine emits structured [`EngineEvent`](super::events::EngineEvent)s
/// through this port.  Adapters decide where they go (log lines, a
/// single-slot channel for a UI, a test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::EngineEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists engine configuration.
///
/// Implementations MUST validate before persisting.  Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], never clamped.
pub trait ConfigPort {
    /// Load configuration.
    /// Returns [`EngineConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<EngineConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &EngineConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock used for emit rate-limiting and tick pacing.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Visibility port (foreground/background signal)
// ───────────────────────────────────────────────────────────────

/// Whether the consumer is currently in the foreground.  Selects the
/// frame-synced or fixed-delay tick strategy.
pub trait VisibilityPort {
    fn is_foreground(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage.
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::NotFound => Self::Config("not found"),
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::IoError => Self::Config("I/O error"),
        }
    }
}
