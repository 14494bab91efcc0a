//! Score aggregation and analysis history.
//!
//! A per-frame score starts at the baseline and loses a capped penalty
//! for every potential issue, then clamps to `[floor, baseline]`.  A
//! visibility gate in front of it short-circuits frames where the user
//! is barely seen.
//!
//! [`AnalysisHistory`] keeps recent per-frame analyses and produces the
//! smoothed analysis: mean score and metrics, latest issues.

use heapless::Deque;
use serde::Serialize;

use crate::analysis::classifier::{IssueKind, IssueSet, Tier, tiered_issues};
use crate::analysis::coaching::{self, Messages};
use crate::analysis::metrics::{MetricSet, PostureSignals};
use crate::config::{IssueThresholds, MAX_ANALYSIS_WINDOW, ScoreConfig, VisibilityConfig};
use crate::landmarks::{Keypoint, LandmarkFrame};

/// The unit of output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostureAnalysis {
    /// Quality in `[floor, baseline]`, or a fixed degraded value.
    pub score: f32,
    /// Coaching lines in reporting order.
    pub issues: Messages,
    pub metrics: MetricSet,
}

impl PostureAnalysis {
    /// Fixed low-visibility analysis with zeroed metrics.
    pub fn degraded(score: f32, message: &'static str) -> Self {
        let mut issues = Messages::new();
        let _ = issues.push(message);
        Self {
            score,
            issues,
            metrics: MetricSet::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Visibility gate
// ---------------------------------------------------------------------------

/// Returns the degraded analysis when too few of nose and shoulders are
/// seen, `None` when the frame may be scored normally.
pub fn visibility_gate(frame: &LandmarkFrame, cfg: &VisibilityConfig) -> Option<PostureAnalysis> {
    let core = [Keypoint::Nose, Keypoint::LeftShoulder, Keypoint::RightShoulder];
    let seen = core
        .iter()
        .filter(|kp| frame.get(**kp).visible(cfg.gate_threshold))
        .count();
    if seen >= usize::from(cfg.gate_min_visible) {
        return None;
    }

    let separation =
        (frame.get(Keypoint::LeftShoulder).x - frame.get(Keypoint::RightShoulder).x).abs();
    if separation < cfg.tiny_shoulder_separation {
        Some(PostureAnalysis::degraded(
            cfg.too_far_score,
            coaching::TOO_FAR_FROM_CAMERA,
        ))
    } else {
        Some(PostureAnalysis::degraded(
            cfg.reposition_score,
            coaching::REPOSITION,
        ))
    }
}

// ---------------------------------------------------------------------------
// Per-frame score
// ---------------------------------------------------------------------------

/// Sum of penalties for every issue in `potential`.
pub fn total_penalty(metrics: &MetricSet, potential: IssueSet, cfg: &IssueThresholds) -> f32 {
    let mut penalty = 0.0;
    for (value, tiers, severe, slight) in tiered_issues(metrics, cfg) {
        if let Some(tier) = tiers.classify(value) {
            let kind = match tier {
                Tier::Severe => severe,
                Tier::Slight => slight,
            };
            if potential.contains(kind) {
                penalty += tiers.penalty(tier, value);
            }
        }
    }
    for (kind, flat) in [
        (IssueKind::Slouching, cfg.slouching_penalty),
        (IssueKind::TooClose, cfg.too_close_penalty),
        (IssueKind::TooFar, cfg.too_far_penalty),
    ] {
        if potential.contains(kind) {
            penalty += flat;
        }
    }
    penalty
}

/// Baseline minus penalties, clamped to `[floor, baseline]`.
///
/// `max`/`min` rather than `clamp`: an inverted or NaN bound must not panic.
pub fn frame_score(
    metrics: &MetricSet,
    potential: IssueSet,
    issues: &IssueThresholds,
    score: &ScoreConfig,
) -> f32 {
    (score.baseline - total_penalty(metrics, potential, issues))
        .max(score.floor)
        .min(score.baseline)
}

/// Build the per-frame analysis from its parts.
pub fn build_analysis(
    metrics: MetricSet,
    signals: &PostureSignals,
    potential: IssueSet,
    shown: IssueSet,
    issues: &IssueThresholds,
    score: &ScoreConfig,
) -> PostureAnalysis {
    let value = frame_score(&metrics, potential, issues, score);
    log::trace!(
        "Score: {value:.2} (head/neck {:.2}, potential {:#06x})",
        signals.head_neck_score,
        potential.bits()
    );
    PostureAnalysis {
        score: value,
        issues: coaching::describe(shown, value),
        metrics,
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Rolling window of per-frame analyses.
pub struct AnalysisHistory {
    window: Deque<PostureAnalysis, MAX_ANALYSIS_WINDOW>,
    capacity: usize,
}

impl AnalysisHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: Deque::new(),
            capacity: capacity.clamp(1, MAX_ANALYSIS_WINDOW),
        }
    }

    /// Change the window length, trimming the oldest entries if needed.
    pub fn resize(&mut self, capacity: usize) {
        self.capacity = capacity.clamp(1, MAX_ANALYSIS_WINDOW);
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }
    }

    pub fn push(&mut self, analysis: PostureAnalysis) {
        if self.window.len() >= self.capacity {
            self.window.pop_front();
        }
        let _ = self.window.push_back(analysis);
    }

    /// Mean score and metrics over the window, issues from the newest
    /// entry only.  `None` while empty.
    pub fn smoothed(&self) -> Option<PostureAnalysis> {
        let latest = self.window.back()?;
        let n = self.window.len() as f32;
        let score = self.window.iter().map(|a| a.score).sum::<f32>() / n;
        Some(PostureAnalysis {
            score,
            issues: latest.issues.clone(),
            metrics: MetricSet::mean(self.window.iter().map(|a| &a.metrics)),
        })
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}
