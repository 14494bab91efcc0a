//! Engine configuration parameters
//!
//! All tunable parameters for the posture engine: window sizes, visibility
//! gates, hysteresis constants, per-issue thresholds and penalties, emit
//! interval and scheduling.  Values can be overridden from a JSON file via
//! [`ConfigPort`](crate::app::ports::ConfigPort) or hot-reloaded through
//! [`EngineCommand::UpdateConfig`](crate::app::commands::EngineCommand).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Upper bound on the landmark smoothing window (heapless capacity).
pub const MAX_FRAME_WINDOW: usize = 32;

/// Upper bound on the analysis history window (heapless capacity).
pub const MAX_ANALYSIS_WINDOW: usize = 64;

/// Core engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub smoothing: SmoothingConfig,
    pub visibility: VisibilityConfig,
    pub classifier: ClassifierConfig,
    pub score: ScoreConfig,
    pub issues: IssueThresholds,
    pub framing: FramingConfig,
    pub head_neck: HeadNeckConfig,
    pub emit: EmitConfig,
    pub scheduler: SchedulerConfig,
}

impl EngineConfig {
    /// Range-check every section.  Invalid values are rejected, never
    /// clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.smoothing;
        if s.frame_window == 0 || s.frame_window > MAX_FRAME_WINDOW {
            return Err(ConfigError::ValidationFailed(
                "smoothing.frame_window must be 1..=32",
            ));
        }
        if s.analysis_window == 0 || s.analysis_window > MAX_ANALYSIS_WINDOW {
            return Err(ConfigError::ValidationFailed(
                "smoothing.analysis_window must be 1..=64",
            ));
        }
        if !(0.0..=1.0).contains(&s.min_visibility) {
            return Err(ConfigError::ValidationFailed(
                "smoothing.min_visibility must be within [0, 1]",
            ));
        }

        let v = &self.visibility;
        if !(0.0..=1.0).contains(&v.metric_threshold) || !(0.0..=1.0).contains(&v.gate_threshold) {
            return Err(ConfigError::ValidationFailed(
                "visibility thresholds must be within [0, 1]",
            ));
        }
        if v.gate_min_visible == 0 || v.gate_min_visible > 3 {
            return Err(ConfigError::ValidationFailed(
                "visibility.gate_min_visible must be 1..=3",
            ));
        }

        let c = &self.classifier;
        if c.consistency_threshold == 0 || c.increment == 0 || c.decrement == 0 {
            return Err(ConfigError::ValidationFailed(
                "classifier steps and threshold must be non-zero",
            ));
        }

        // Range checks are written so NaN fails them.
        let sc = &self.score;
        if !sc.baseline.is_finite() || !(0.0..=sc.baseline).contains(&sc.floor) {
            return Err(ConfigError::ValidationFailed(
                "score.floor must be within [0, baseline]",
            ));
        }
        if c.reset_score.is_nan() || c.reset_score > sc.baseline {
            return Err(ConfigError::ValidationFailed(
                "classifier.reset_score must not exceed score.baseline",
            ));
        }

        for tiers in [
            &self.issues.neck_angle,
            &self.issues.shoulder_alignment,
            &self.issues.spine_alignment,
            &self.issues.head_position,
            &self.issues.shoulder_height,
        ] {
            let ordered = tiers.slight < tiers.severe;
            if !(ordered && tiers.slight.is_finite() && tiers.severe.is_finite()) {
                return Err(ConfigError::ValidationFailed(
                    "issue tiers require finite slight < severe",
                ));
            }
            if ![tiers.slight_cap, tiers.slight_scale, tiers.severe_cap, tiers.severe_scale]
                .iter()
                .all(|v| v.is_finite() && *v >= 0.0)
            {
                return Err(ConfigError::ValidationFailed(
                    "issue penalty caps and scales must be finite and non-negative",
                ));
            }
        }
        let i = &self.issues;
        if ![i.slouching_penalty, i.too_close_penalty, i.too_far_penalty]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
        {
            return Err(ConfigError::ValidationFailed(
                "flat issue penalties must be finite and non-negative",
            ));
        }

        if self.emit.min_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "emit.min_interval_ms must be non-zero",
            ));
        }
        if self.scheduler.foreground_interval_ms == 0 || self.scheduler.background_delay_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "scheduler intervals must be non-zero",
            ));
        }
        Ok(())
    }
}

// --- Smoothing ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Number of landmark frames averaged per joint.
    pub frame_window: usize,
    /// Number of per-frame analyses averaged for the emitted score/metrics.
    pub analysis_window: usize,
    /// Window entries at or below this visibility are ignored by the mean.
    pub min_visibility: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            frame_window: 6,
            analysis_window: 12,
            min_visibility: 0.1,
        }
    }
}

// --- Visibility gates ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Joints at or below this visibility zero out the metrics using them.
    pub metric_threshold: f32,
    /// Visibility a core joint (nose, shoulders) needs to pass the gate.
    pub gate_threshold: f32,
    /// How many of the three core joints must pass the gate.
    pub gate_min_visible: u8,
    /// Shoulder x-separation below which a gated frame reads "too far".
    pub tiny_shoulder_separation: f32,
    /// Score of the gated "too far from camera" analysis.
    pub too_far_score: f32,
    /// Score of the gated "reposition yourself" analysis.
    pub reposition_score: f32,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            metric_threshold: 0.5,
            gate_threshold: 0.2,
            gate_min_visible: 2,
            tiny_shoulder_separation: 0.05,
            too_far_score: 5.0,
            reposition_score: 7.5,
        }
    }
}

// --- Hysteresis ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Counter value an issue needs before it is shown.
    pub consistency_threshold: u32,
    /// Counter step while the issue is flagged.
    pub increment: u32,
    /// Counter step while the issue is not flagged.
    pub decrement: u32,
    /// Smoothed score at or above which every counter is cleared.
    pub reset_score: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            consistency_threshold: 3,
            increment: 1,
            decrement: 3,
            reset_score: 8.0,
        }
    }
}

// --- Score ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    pub baseline: f32,
    pub floor: f32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            baseline: 10.0,
            floor: 2.0,
        }
    }
}

// --- Issue thresholds ---

/// Two-tier threshold with a capped linear penalty per tier.
///
/// `slight` fires for `slight < v <= severe`, `severe` for `v > severe`.
/// Penalty is `min(cap, v * scale)` for whichever tier fired.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub slight: f32,
    pub severe: f32,
    pub slight_cap: f32,
    pub slight_scale: f32,
    pub severe_cap: f32,
    pub severe_scale: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueThresholds {
    pub neck_angle: TierThresholds,
    pub shoulder_alignment: TierThresholds,
    pub spine_alignment: TierThresholds,
    pub head_position: TierThresholds,
    pub shoulder_height: TierThresholds,
    pub slouching_penalty: f32,
    pub too_close_penalty: f32,
    pub too_far_penalty: f32,
}

impl Default for IssueThresholds {
    fn default() -> Self {
        Self {
            neck_angle: TierThresholds {
                slight: 20.0,
                severe: 30.0,
                slight_cap: 1.0,
                slight_scale: 0.04,
                severe_cap: 2.0,
                severe_scale: 0.08,
            },
            shoulder_alignment: TierThresholds {
                slight: 5.0,
                severe: 10.0,
                slight_cap: 0.7,
                slight_scale: 0.07,
                severe_cap: 1.5,
                severe_scale: 0.10,
            },
            spine_alignment: TierThresholds {
                slight: 8.0,
                severe: 15.0,
                slight_cap: 1.0,
                slight_scale: 0.07,
                severe_cap: 2.0,
                severe_scale: 0.10,
            },
            head_position: TierThresholds {
                slight: 8.0,
                severe: 15.0,
                slight_cap: 0.7,
                slight_scale: 0.06,
                severe_cap: 1.5,
                severe_scale: 0.10,
            },
            shoulder_height: TierThresholds {
                slight: 0.3,
                severe: 0.6,
                slight_cap: 0.5,
                slight_scale: 0.8,
                severe_cap: 1.0,
                severe_scale: 1.0,
            },
            slouching_penalty: 1.3,
            too_close_penalty: 2.0,
            too_far_penalty: 2.0,
        }
    }
}

// --- Framing (distance to camera, slouch) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingConfig {
    /// Horizontal shoulder-midpoint lead over hip-midpoint that reads as slouching.
    pub slouch_offset: f32,
    /// Shoulder width (fraction of frame width) above which the user is too close.
    pub too_close_shoulder_width: f32,
    /// Nose-to-shoulder-centre distance above which the user is too close.
    pub too_close_head_drop: f32,
    /// Shoulder width below which the user is too far.
    pub too_far_shoulder_width: f32,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            slouch_offset: 0.10,
            too_close_shoulder_width: 0.55,
            too_close_head_drop: 0.35,
            too_far_shoulder_width: 0.15,
        }
    }
}

// --- Head/neck composite ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadNeckConfig {
    /// Penalty per degree of head tilt not explained by shoulder tilt.
    pub mismatch_weight: f32,
    pub mismatch_cap: f32,
    /// Penalty per degree of absolute head tilt.
    pub tilt_weight: f32,
    pub tilt_cap: f32,
    /// Penalty per shoulder-width of nose offset from the shoulder centre.
    pub forward_weight: f32,
    pub forward_cap: f32,
}

impl Default for HeadNeckConfig {
    fn default() -> Self {
        Self {
            mismatch_weight: 0.1,
            mismatch_cap: 3.0,
            tilt_weight: 0.1,
            tilt_cap: 3.0,
            forward_weight: 4.0,
            forward_cap: 4.0,
        }
    }
}

// --- Emission ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitConfig {
    /// Minimum time between published analyses (milliseconds).
    pub min_interval_ms: u64,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 2000,
        }
    }
}

// --- Scheduling ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Frame-synced tick period while the consumer is in the foreground.
    pub foreground_interval_ms: u64,
    /// Fixed delay between frames while backgrounded.
    pub background_delay_ms: u64,
    /// Keep consistency counters across stop/start.
    pub retain_counters_on_restart: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            foreground_interval_ms: 33, // ~30 Hz
            background_delay_ms: 100,   // 10 Hz
            retain_counters_on_restart: true,
        }
    }
}
