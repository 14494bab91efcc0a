//! Issue classifier.
//!
//! Turns continuous metrics into a sparse set of named posture issues
//! and filters them through per-issue consistency counters.
//!
//! ## Counter lifecycle
//!
//! 1. Each frame the metrics are thresholded into a *potential* set.
//! 2. Tracked issues missing from the potential set decay by
//!    `decrement` (floor 0; a zero counter is untracked).
//! 3. Issues in the potential set grow by `increment` (uncapped).
//! 4. An issue is **shown** only while it is flagged this frame *and*
//!    its counter has reached `consistency_threshold`.
//! 5. The engine calls [`IssueClassifier::reset_counters`] when the
//!    smoothed score rises above the reset cutoff.
//!
//! Appearance is slow (several qualifying frames) while disappearance
//! is instant: a shown issue vanishes on the first frame it stops
//! qualifying, whatever its counter still reads.

use core::fmt;

use log::{debug, info};
use serde::Serialize;

use crate::analysis::metrics::{MetricSet, PostureSignals};
use crate::config::{ClassifierConfig, IssueThresholds, TierThresholds};

// ---------------------------------------------------------------------------
// Issue identity
// ---------------------------------------------------------------------------

/// Every issue the classifier can raise, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum IssueKind {
    ForwardHead = 0,
    SlightForwardHead = 1,
    UnevenShoulders = 2,
    SlightUnevenShoulders = 3,
    SpineMisaligned = 4,
    SlightSpineMisaligned = 5,
    HeadTilt = 6,
    SlightHeadTilt = 7,
    ShoulderHeight = 8,
    SlightShoulderHeight = 9,
    Slouching = 10,
    TooClose = 11,
    TooFar = 12,
}

impl IssueKind {
    pub const COUNT: usize = 13;

    pub const ALL: [IssueKind; Self::COUNT] = [
        Self::ForwardHead,
        Self::SlightForwardHead,
        Self::UnevenShoulders,
        Self::SlightUnevenShoulders,
        Self::SpineMisaligned,
        Self::SlightSpineMisaligned,
        Self::HeadTilt,
        Self::SlightHeadTilt,
        Self::ShoulderHeight,
        Self::SlightShoulderHeight,
        Self::Slouching,
        Self::TooClose,
        Self::TooFar,
    ];

    /// Bit for this issue inside an [`IssueSet`].
    pub const fn mask(self) -> u16 {
        1 << (self as u8)
    }

    /// Stable machine key.
    pub const fn key(self) -> &'static str {
        match self {
            Self::ForwardHead => "forward_head",
            Self::SlightForwardHead => "slight_forward_head",
            Self::UnevenShoulders => "uneven_shoulders",
            Self::SlightUnevenShoulders => "slight_uneven_shoulders",
            Self::SpineMisaligned => "spine_misaligned",
            Self::SlightSpineMisaligned => "slight_spine_misaligned",
            Self::HeadTilt => "head_tilt",
            Self::SlightHeadTilt => "slight_head_tilt",
            Self::ShoulderHeight => "shoulder_height",
            Self::SlightShoulderHeight => "slight_shoulder_height",
            Self::Slouching => "slouching",
            Self::TooClose => "too_close",
            Self::TooFar => "too_far",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// IssueSet
// ---------------------------------------------------------------------------

/// Bitmask of issues.  Iterates in [`IssueKind::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IssueSet(u16);

impl IssueSet {
    pub const EMPTY: Self = Self(0);

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub fn insert(&mut self, kind: IssueKind) {
        self.0 |= kind.mask();
    }

    pub fn set(&mut self, kind: IssueKind, on: bool) {
        if on {
            self.insert(kind);
        } else {
            self.0 &= !kind.mask();
        }
    }

    pub const fn contains(self, kind: IssueKind) -> bool {
        self.0 & kind.mask() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Issues in `self` but not in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = IssueKind> {
        IssueKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl FromIterator<IssueKind> for IssueSet {
    fn from_iter<I: IntoIterator<Item = IssueKind>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

// ---------------------------------------------------------------------------
// Thresholding
// ---------------------------------------------------------------------------

/// Which tier of a two-tier threshold a value falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Slight,
    Severe,
}

impl TierThresholds {
    /// `Slight` for `slight < v <= severe`, `Severe` for `v > severe`.
    pub fn classify(&self, value: f32) -> Option<Tier> {
        if value > self.severe {
            Some(Tier::Severe)
        } else if value > self.slight {
            Some(Tier::Slight)
        } else {
            None
        }
    }

    /// Capped linear penalty for `value` in the given tier.
    pub fn penalty(&self, tier: Tier, value: f32) -> f32 {
        match tier {
            Tier::Slight => (value * self.slight_scale).min(self.slight_cap),
            Tier::Severe => (value * self.severe_scale).min(self.severe_cap),
        }
    }
}

/// The metric-backed issues paired with their (severe, slight) kinds.
pub(crate) fn tiered_issues(
    metrics: &MetricSet,
    cfg: &IssueThresholds,
) -> [(f32, TierThresholds, IssueKind, IssueKind); 5] {
    [
        (
            metrics.neck_angle,
            cfg.neck_angle,
            IssueKind::ForwardHead,
            IssueKind::SlightForwardHead,
        ),
        (
            metrics.shoulder_alignment,
            cfg.shoulder_alignment,
            IssueKind::UnevenShoulders,
            IssueKind::SlightUnevenShoulders,
        ),
        (
            metrics.spine_alignment,
            cfg.spine_alignment,
            IssueKind::SpineMisaligned,
            IssueKind::SlightSpineMisaligned,
        ),
        (
            metrics.head_position,
            cfg.head_position,
            IssueKind::HeadTilt,
            IssueKind::SlightHeadTilt,
        ),
        (
            metrics.shoulder_height,
            cfg.shoulder_height,
            IssueKind::ShoulderHeight,
            IssueKind::SlightShoulderHeight,
        ),
    ]
}

/// Threshold one frame's metrics and signals into its potential issues.
pub fn potential_issues(
    metrics: &MetricSet,
    signals: &PostureSignals,
    cfg: &IssueThresholds,
) -> IssueSet {
    let mut set = IssueSet::EMPTY;
    for (value, tiers, severe, slight) in tiered_issues(metrics, cfg) {
        match tiers.classify(value) {
            Some(Tier::Severe) => set.insert(severe),
            Some(Tier::Slight) => set.insert(slight),
            None => {}
        }
    }
    set.set(IssueKind::Slouching, signals.slouching);
    set.set(IssueKind::TooClose, signals.too_close);
    set.set(IssueKind::TooFar, signals.too_far);
    set
}

// ---------------------------------------------------------------------------
// Hysteresis state
// ---------------------------------------------------------------------------

/// Per-engine consistency counters.
pub struct IssueClassifier {
    counters: [u32; IssueKind::COUNT],
    /// Issues shown after the previous update, for transition logging.
    shown: IssueSet,
    threshold: u32,
    increment: u32,
    decrement: u32,
}

impl IssueClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            counters: [0; IssueKind::COUNT],
            shown: IssueSet::EMPTY,
            threshold: config.consistency_threshold,
            increment: config.increment,
            decrement: config.decrement,
        }
    }

    /// Apply new step sizes and threshold.  Counters are kept.
    pub fn reconfigure(&mut self, config: &ClassifierConfig) {
        self.threshold = config.consistency_threshold;
        self.increment = config.increment;
        self.decrement = config.decrement;
    }

    /// Advance every counter by one frame and return the issues to show.
    pub fn update(&mut self, potential: IssueSet) -> IssueSet {
        let mut shown = IssueSet::EMPTY;
        for kind in IssueKind::ALL {
            let counter = &mut self.counters[kind as usize];
            if potential.contains(kind) {
                *counter = counter.saturating_add(self.increment);
                if *counter >= self.threshold {
                    shown.insert(kind);
                }
            } else if *counter > 0 {
                *counter = counter.saturating_sub(self.decrement);
                if *counter == 0 {
                    debug!("Classifier: '{kind}' counter decayed to zero");
                }
            }
        }

        for kind in shown.difference(self.shown).iter() {
            info!("ISSUE RAISED: {kind} (count {})", self.counters[kind as usize]);
        }
        for kind in self.shown.difference(shown).iter() {
            info!("ISSUE CLEARED: {kind}");
        }
        self.shown = shown;
        shown
    }

    /// Drop every counter back to zero.  Issues must re-accumulate from
    /// scratch before they show again.
    pub fn reset_counters(&mut self) {
        if self.is_tracking() {
            debug!("Classifier: counters reset");
        }
        self.counters = [0; IssueKind::COUNT];
    }

    /// Counter for one issue (0 when untracked).
    pub fn counter(&self, kind: IssueKind) -> u32 {
        self.counters[kind as usize]
    }

    /// Tracked issues and their counters, in reporting order.
    pub fn active(&self) -> impl Iterator<Item = (IssueKind, u32)> + '_ {
        IssueKind::ALL
            .into_iter()
            .map(|k| (k, self.counters[k as usize]))
            .filter(|(_, c)| *c > 0)
    }

    /// True if any issue has a non-zero counter.
    pub fn is_tracking(&self) -> bool {
        self.counters.iter().any(|c| *c > 0)
    }

    /// Issues shown by the most recent update.
    pub fn shown(&self) -> IssueSet {
        self.shown
    }

    /// Forget the shown set without touching counters (used on stop).
    pub fn forget_shown(&mut self) {
        self.shown = IssueSet::EMPTY;
    }
}
