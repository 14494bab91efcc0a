//! PostureWatch posture-analysis engine.
//!
//! Turns a stream of body-landmark detections into a smoothed posture
//! score, flicker-resistant issue list and coaching text.  The pipeline
//! is pure and synchronous; the pose model, clocks, config storage and
//! consumers plug in through the port traits in [`app::ports`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │  ReplayDetector  LogEventSink  ChannelSink  JsonFileConfig   │
//! │  MonotonicClock  StaticVisibility                            │
//! │  ───────────────── Port Trait Boundary ─────────────────     │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  PostureEngine: smoother · metrics · classifier ·      │  │
//! │  │                 score · history · emitter              │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │  DetectionLoop (edge-executor) · TickScheduler               │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

pub mod adapters;
pub mod analysis;
pub mod app;
pub mod config;
pub mod error;
pub mod landmarks;
pub mod scheduler;

pub use analysis::{IssueKind, MetricSet, PostureAnalysis};
pub use app::service::{FrameOutcome, PostureEngine};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use landmarks::{Keypoint, Landmark, LandmarkFrame};
