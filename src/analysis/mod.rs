//! Posture analysis pipeline.
//!
//! ```text
//!   LandmarkFrame ─▶ smoother ─▶ metrics ─▶ classifier ─▶ score ─▶ history ─▶ emitter
//! ```
//!
//! Everything here is synchronous and infallible.  The stateful stages
//! (smoother, classifier, history, emitter) are plain structs owned by
//! one [`PostureEngine`](crate::app::service::PostureEngine).

pub mod classifier;
pub mod coaching;
pub mod emitter;
pub mod metrics;
pub mod score;
pub mod smoother;

pub use classifier::{IssueClassifier, IssueKind, IssueSet};
pub use emitter::OutputEmitter;
pub use metrics::{MetricSet, PostureSignals};
pub use score::{AnalysisHistory, PostureAnalysis};
pub use smoother::LandmarkSmoother;
