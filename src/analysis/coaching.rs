//! Coaching text.
//!
//! Fixed human-readable strings for every issue key, the two degraded
//! visibility messages and the positive-feedback bands used when no
//! issue is shown.

use heapless::Vec;

use crate::analysis::classifier::{IssueKind, IssueSet};

/// Capacity of an analysis' issue list: every issue plus one feedback line.
pub const MAX_MESSAGES: usize = 16;

pub type Messages = Vec<&'static str, MAX_MESSAGES>;

pub const TOO_FAR_FROM_CAMERA: &str = "too far from camera";
pub const REPOSITION: &str = "reposition yourself";

pub const EXCELLENT: &str = "Excellent posture! Keep it up.";
pub const GOOD: &str = "Good posture - keep your shoulders relaxed.";
pub const OKAY: &str = "Posture is okay - stay mindful of your alignment.";

pub const fn message(kind: IssueKind) -> &'static str {
    match kind {
        IssueKind::ForwardHead => "forward head posture - bring your ears back over your shoulders",
        IssueKind::SlightForwardHead => "slight forward head - tuck your chin a little",
        IssueKind::UnevenShoulders => "uneven shoulders - level them out",
        IssueKind::SlightUnevenShoulders => "shoulders slightly uneven",
        IssueKind::SpineMisaligned => "spine misaligned - sit up straight",
        IssueKind::SlightSpineMisaligned => "slight lean - straighten your back",
        IssueKind::HeadTilt => "head tilted - keep your head level",
        IssueKind::SlightHeadTilt => "head slightly tilted",
        IssueKind::ShoulderHeight => "one shoulder raised - relax both shoulders",
        IssueKind::SlightShoulderHeight => "shoulders at slightly different heights",
        IssueKind::Slouching => "slouching - pull your shoulders back",
        IssueKind::TooClose => "too close to the screen - lean back",
        IssueKind::TooFar => "too far from the screen - move closer",
    }
}

/// Band message for a score with no shown issues.
pub fn positive_feedback(score: f32) -> &'static str {
    if score >= 9.0 {
        EXCELLENT
    } else if score >= 7.0 {
        GOOD
    } else {
        OKAY
    }
}

/// Coaching list for one analysis: one line per shown issue in reporting
/// order, or a single positive-feedback line when nothing is shown.
pub fn describe(shown: IssueSet, score: f32) -> Messages {
    let mut out = Messages::new();
    if shown.is_empty() {
        // Capacity exceeds IssueKind::COUNT, pushes cannot fail.
        let _ = out.push(positive_feedback(score));
        return out;
    }
    for kind in shown.iter() {
        let _ = out.push(message(kind));
    }
    out
}
