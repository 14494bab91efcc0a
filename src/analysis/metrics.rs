//! Posture metric calculation.
//!
//! Pure geometry: a smoothed [`LandmarkFrame`] in, a [`MetricSet`] out.
//! Every metric gates on the visibility of the joints it uses; when any
//! of them is at or below the threshold the metric is `0.0`, which means
//! "unknown" and is never read as "good".
//!
//! | Metric               | Geometry                                             |
//! |----------------------|------------------------------------------------------|
//! | `neck_angle`         | 180° − joint angle at the ear (shoulder·ear·nose)    |
//! | `shoulder_alignment` | shoulder line vs horizontal                          |
//! | `spine_alignment`    | shoulder-mid → hip-mid line vs vertical              |
//! | `head_position`      | ear line vs horizontal (head tilt)                   |
//! | `shoulder_height`    | \|Δy\| of the shoulders × 10                         |
//!
//! All angles are in degrees and non-negative.

use serde::{Deserialize, Serialize};

use crate::config::{FramingConfig, HeadNeckConfig};
use crate::landmarks::{Keypoint, Landmark, LandmarkFrame};

/// Scale applied to the shoulder |Δy| so it sits in the same order of
/// magnitude as the angle metrics.
const SHOULDER_HEIGHT_SCALE: f32 = 10.0;

/// Vectors shorter than this are treated as degenerate.
const MIN_SEGMENT: f32 = 1e-4;

/// Degree-like posture metrics for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSet {
    pub neck_angle: f32,
    pub shoulder_alignment: f32,
    pub spine_alignment: f32,
    pub head_position: f32,
    pub shoulder_height: f32,
}

impl MetricSet {
    /// Arithmetic mean of a set of metric snapshots.  Empty input yields
    /// all zeros.
    pub fn mean<'a>(items: impl IntoIterator<Item = &'a MetricSet>) -> MetricSet {
        let mut acc = MetricSet::default();
        let mut n = 0_u32;
        for m in items {
            acc.neck_angle += m.neck_angle;
            acc.shoulder_alignment += m.shoulder_alignment;
            acc.spine_alignment += m.spine_alignment;
            acc.head_position += m.head_position;
            acc.shoulder_height += m.shoulder_height;
            n += 1;
        }
        if n == 0 {
            return acc;
        }
        let n = n as f32;
        MetricSet {
            neck_angle: acc.neck_angle / n,
            shoulder_alignment: acc.shoulder_alignment / n,
            spine_alignment: acc.spine_alignment / n,
            head_position: acc.head_position / n,
            shoulder_height: acc.shoulder_height / n,
        }
    }
}

/// Boolean and composite signals derived alongside the metrics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PostureSignals {
    /// Shoulder midpoint leads the hip midpoint horizontally, on either
    /// side: a frontal camera cannot tell which way is forward.
    pub slouching: bool,
    pub too_close: bool,
    pub too_far: bool,
    /// 0..=10 composite of head tilt, tilt/shoulder mismatch and nose offset.
    pub head_neck_score: f32,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Compute every metric for a frame.  `threshold` is the per-joint
/// visibility gate (commonly 0.5).
pub fn compute_metrics(frame: &LandmarkFrame, threshold: f32) -> MetricSet {
    MetricSet {
        neck_angle: neck_angle(frame, threshold),
        shoulder_alignment: shoulder_alignment(frame, threshold),
        spine_alignment: spine_alignment(frame, threshold),
        head_position: head_position(frame, threshold),
        shoulder_height: shoulder_height(frame, threshold),
    }
}

/// Forward-head deviation: 0 when shoulder, ear and nose are collinear.
///
/// Uses whichever side has the better-seen ear/shoulder pair.
pub fn neck_angle(frame: &LandmarkFrame, threshold: f32) -> f32 {
    let nose = frame.get(Keypoint::Nose);
    if !nose.visible(threshold) {
        return 0.0;
    }

    let sides = [
        (frame.get(Keypoint::LeftEar), frame.get(Keypoint::LeftShoulder)),
        (frame.get(Keypoint::RightEar), frame.get(Keypoint::RightShoulder)),
    ];
    let best = sides
        .into_iter()
        .filter(|(ear, shoulder)| ear.visible(threshold) && shoulder.visible(threshold))
        .max_by(|a, b| {
            let va = a.0.visibility.min(a.1.visibility);
            let vb = b.0.visibility.min(b.1.visibility);
            va.total_cmp(&vb)
        });

    let Some((ear, shoulder)) = best else {
        return 0.0;
    };
    match joint_angle(shoulder, ear, nose) {
        Some(angle) => (180.0 - angle).max(0.0),
        None => 0.0,
    }
}

/// Tilt of the shoulder line relative to horizontal.
pub fn shoulder_alignment(frame: &LandmarkFrame, threshold: f32) -> f32 {
    let (ls, rs) = shoulders(frame);
    if !(ls.visible(threshold) && rs.visible(threshold)) {
        return 0.0;
    }
    tilt_from_horizontal(ls.x, ls.y, rs.x, rs.y)
}

/// Lean of the torso (shoulder midpoint → hip midpoint) relative to vertical.
pub fn spine_alignment(frame: &LandmarkFrame, threshold: f32) -> f32 {
    let (ls, rs) = shoulders(frame);
    let (lh, rh) = (frame.get(Keypoint::LeftHip), frame.get(Keypoint::RightHip));
    if ![ls, rs, lh, rh].iter().all(|lm| lm.visible(threshold)) {
        return 0.0;
    }
    let (sx, sy) = ls.midpoint(rs);
    let (hx, hy) = lh.midpoint(rh);
    let (dx, dy) = ((hx - sx).abs(), (hy - sy).abs());
    if dx < MIN_SEGMENT && dy < MIN_SEGMENT {
        return 0.0;
    }
    dx.atan2(dy).to_degrees()
}

/// Head tilt: ear line relative to horizontal.
pub fn head_position(frame: &LandmarkFrame, threshold: f32) -> f32 {
    let (le, re) = (frame.get(Keypoint::LeftEar), frame.get(Keypoint::RightEar));
    if !(le.visible(threshold) && re.visible(threshold)) {
        return 0.0;
    }
    tilt_from_horizontal(le.x, le.y, re.x, re.y)
}

/// Vertical shoulder offset, scaled ×10.
pub fn shoulder_height(frame: &LandmarkFrame, threshold: f32) -> f32 {
    let (ls, rs) = shoulders(frame);
    if !(ls.visible(threshold) && rs.visible(threshold)) {
        return 0.0;
    }
    (ls.y - rs.y).abs() * SHOULDER_HEIGHT_SCALE
}

// ---------------------------------------------------------------------------
// Derived signals
// ---------------------------------------------------------------------------

/// Slouching, camera distance and the head/neck composite.
pub fn derive_signals(
    frame: &LandmarkFrame,
    metrics: &MetricSet,
    threshold: f32,
    framing: &FramingConfig,
    head_neck: &HeadNeckConfig,
) -> PostureSignals {
    let (ls, rs) = shoulders(frame);
    let nose = frame.get(Keypoint::Nose);
    let shoulders_seen = ls.visible(threshold) && rs.visible(threshold);

    let slouching = shoulders_seen && {
        let (lh, rh) = (frame.get(Keypoint::LeftHip), frame.get(Keypoint::RightHip));
        lh.visible(threshold) && rh.visible(threshold) && {
            let (sx, _) = ls.midpoint(rs);
            let (hx, _) = lh.midpoint(rh);
            (sx - hx).abs() > framing.slouch_offset
        }
    };

    let (too_close, too_far) = if shoulders_seen {
        let width = ls.distance_to(rs);
        let head_drop = if nose.visible(threshold) {
            let (cx, cy) = ls.midpoint(rs);
            nose.distance_to(&Landmark::new(cx, cy, 1.0))
        } else {
            0.0
        };
        let close = width > framing.too_close_shoulder_width
            || head_drop > framing.too_close_head_drop;
        let far = !close && width < framing.too_far_shoulder_width;
        (close, far)
    } else {
        (false, false)
    };

    PostureSignals {
        slouching,
        too_close,
        too_far,
        head_neck_score: head_neck_score(frame, metrics, threshold, head_neck),
    }
}

/// 10 minus penalties for head tilt, tilt not explained by the shoulders,
/// and horizontal nose offset from the shoulder centre.  Floors at 0.
pub fn head_neck_score(
    frame: &LandmarkFrame,
    metrics: &MetricSet,
    threshold: f32,
    cfg: &HeadNeckConfig,
) -> f32 {
    let mismatch = (metrics.head_position - metrics.shoulder_alignment).abs();
    let mut score = 10.0;
    score -= (mismatch * cfg.mismatch_weight).min(cfg.mismatch_cap);
    score -= (metrics.head_position * cfg.tilt_weight).min(cfg.tilt_cap);

    let (ls, rs) = shoulders(frame);
    let nose = frame.get(Keypoint::Nose);
    if nose.visible(threshold) && ls.visible(threshold) && rs.visible(threshold) {
        let width = (ls.x - rs.x).abs();
        if width > MIN_SEGMENT {
            let (cx, _) = ls.midpoint(rs);
            let offset = (nose.x - cx).abs() / width;
            score -= (offset * cfg.forward_weight).min(cfg.forward_cap);
        }
    }
    score.max(0.0)
}

// ---------------------------------------------------------------------------
// Geometry helpers
// ---------------------------------------------------------------------------

fn shoulders(frame: &LandmarkFrame) -> (&Landmark, &Landmark) {
    (
        frame.get(Keypoint::LeftShoulder),
        frame.get(Keypoint::RightShoulder),
    )
}

/// Angle at `vertex` between `vertex→a` and `vertex→b`, in degrees.
/// `None` if either segment is degenerate.
///
/// Uses dot product: cos(θ) = (v1 · v2) / (|v1| × |v2|)
fn joint_angle(a: &Landmark, vertex: &Landmark, b: &Landmark) -> Option<f32> {
    let v1 = (a.x - vertex.x, a.y - vertex.y);
    let v2 = (b.x - vertex.x, b.y - vertex.y);
    let mag1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let mag2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
    if mag1 < MIN_SEGMENT || mag2 < MIN_SEGMENT {
        return None;
    }
    let cos = ((v1.0 * v2.0 + v1.1 * v2.1) / (mag1 * mag2)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// |angle| of the segment relative to horizontal, folded into `[0, 90]`.
fn tilt_from_horizontal(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let (dx, dy) = ((x2 - x1).abs(), (y2 - y1).abs());
    if dx < MIN_SEGMENT && dy < MIN_SEGMENT {
        return 0.0;
    }
    dy.atan2(dx).to_degrees()
}
