//! End-to-end tests for `PostureEngine` driven frame by frame.
//!
//! A one-frame landmark window keeps each frame's geometry sharp so the
//! hysteresis and history assertions line up with exact frame counts.

use posturewatch::analysis::coaching;
use posturewatch::app::commands::EngineCommand;
use posturewatch::app::events::EngineEvent;
use posturewatch::app::ports::ConfigError;
use posturewatch::{EngineConfig, IssueKind, LandmarkFrame, MetricSet, PostureEngine};

use super::mock_ports::{ManualClock, RecordingSink, barely_seen, forward_head, upright};

fn sharp_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.smoothing.frame_window = 1;
    config
}

struct Harness {
    engine: PostureEngine,
    clock: ManualClock,
    sink: RecordingSink,
}

impl Harness {
    fn new(config: EngineConfig) -> Self {
        let mut sink = RecordingSink::new();
        let mut engine = PostureEngine::new(config);
        engine.start(&mut sink);
        Self {
            engine,
            clock: ManualClock::new(),
            sink,
        }
    }

    /// Feed one frame 100 ms after the previous one.
    fn feed(&mut self, frame: LandmarkFrame) -> posturewatch::FrameOutcome {
        let out = self.engine.process_frame(frame, &self.clock, &mut self.sink);
        self.clock.advance(100);
        out
    }

    fn forward_head_shown(&self) -> bool {
        self.engine.shown_issues().contains(IssueKind::ForwardHead)
    }
}

// ── Hysteresis ───────────────────────────────────────────────

#[test]
fn issue_appears_on_third_consecutive_frame() {
    let mut h = Harness::new(sharp_config());

    let first = h.feed(forward_head());
    assert!(!h.forward_head_shown());
    assert_eq!(first.analysis.score, 8.0);
    assert!(
        !first.analysis.issues.iter().any(|m| m.starts_with("forward head")),
        "unconfirmed issue must not be described"
    );

    h.feed(forward_head());
    assert!(!h.forward_head_shown());

    let third = h.feed(forward_head());
    assert!(h.forward_head_shown());
    assert_eq!(
        third.analysis.issues.as_slice(),
        [coaching::message(IssueKind::ForwardHead)]
    );
    assert_eq!(h.sink.raised(), [IssueKind::ForwardHead]);
}

#[test]
fn issue_disappears_as_soon_as_it_stops_qualifying() {
    let mut h = Harness::new(sharp_config());
    for _ in 0..5 {
        h.feed(forward_head());
    }
    assert!(h.forward_head_shown());

    h.feed(upright());
    assert!(!h.forward_head_shown());
    assert_eq!(h.sink.cleared(), [IssueKind::ForwardHead]);
}

#[test]
fn high_smoothed_score_clears_counters_and_forces_reaccumulation() {
    let mut h = Harness::new(sharp_config());
    for _ in 0..4 {
        h.feed(forward_head());
    }
    // Four 8.0 frames average exactly 8.0, which is not above the cutoff.
    assert_eq!(h.sink.count(&EngineEvent::CountersReset), 0);
    assert_eq!(h.engine.active_counters().count(), 1);

    // An upright frame lifts the mean to 8.4.
    h.feed(upright());
    assert_eq!(h.sink.count(&EngineEvent::CountersReset), 1);
    assert_eq!(h.engine.active_counters().count(), 0);

    // With the history dropped the mean sits at 8.0 again, so counters
    // are allowed to build: two frames are not enough, three are.
    h.engine
        .handle_command(EngineCommand::ResetHistory, &mut h.sink)
        .expect("reset history");
    h.feed(forward_head());
    h.feed(forward_head());
    assert!(!h.forward_head_shown());
    h.feed(forward_head());
    assert!(h.forward_head_shown());
}

#[test]
fn counter_reset_is_not_repeated_while_nothing_is_tracked() {
    let mut h = Harness::new(sharp_config());
    for _ in 0..20 {
        h.feed(upright());
    }
    assert_eq!(h.sink.count(&EngineEvent::CountersReset), 0);
}

// ── Visibility gate ──────────────────────────────────────────

#[test]
fn unseen_user_with_shoulders_together_is_too_far() {
    let mut h = Harness::new(sharp_config());
    let out = h.feed(LandmarkFrame::placeholder());
    assert!(out.degraded);
    assert_eq!(out.analysis.score, 5.0);
    assert_eq!(out.analysis.issues.as_slice(), [coaching::TOO_FAR_FROM_CAMERA]);
    assert_eq!(out.analysis.metrics, MetricSet::default());
}

#[test]
fn barely_seen_user_is_asked_to_reposition() {
    let mut h = Harness::new(sharp_config());
    let out = h.feed(barely_seen());
    assert!(out.degraded);
    assert_eq!(out.analysis.score, 7.5);
    assert_eq!(out.analysis.issues.as_slice(), [coaching::REPOSITION]);
}

#[test]
fn degraded_frames_leave_counters_untouched() {
    let mut h = Harness::new(sharp_config());
    h.feed(forward_head());
    h.feed(forward_head());
    h.feed(barely_seen());
    assert_eq!(h.engine.active_counters().collect::<Vec<_>>(), [(IssueKind::ForwardHead, 2)]);

    h.feed(forward_head());
    assert!(h.forward_head_shown());
}

// ── History and emission ─────────────────────────────────────

#[test]
fn smoothed_score_is_mean_of_last_twelve_frames() {
    let mut h = Harness::new(sharp_config());
    for _ in 0..12 {
        h.feed(LandmarkFrame::placeholder());
    }
    for _ in 0..6 {
        h.feed(upright());
    }
    assert_eq!(h.engine.history_len(), 12);
    let smoothed = h.engine.smoothed_analysis().expect("history is not empty");
    assert!((smoothed.score - 7.5).abs() < 1e-5, "got {}", smoothed.score);
    assert_eq!(smoothed.issues.as_slice(), [coaching::EXCELLENT]);

    for _ in 0..6 {
        h.feed(upright());
    }
    let smoothed = h.engine.smoothed_analysis().expect("history is not empty");
    assert_eq!(smoothed.score, 10.0);
}

#[test]
fn publishes_at_most_once_per_interval() {
    let mut h = Harness::new(EngineConfig::default());
    // 61 frames 100 ms apart span exactly 6 s.
    let emitted = (0..61).filter(|_| h.feed(upright()).emitted.is_some()).count();
    assert_eq!(emitted, 4);
    assert_eq!(h.sink.analyses().len(), 4);
    assert_eq!(h.engine.current_analysis(), h.sink.analyses().last().copied());
}

#[test]
fn first_frame_is_published_immediately() {
    let mut h = Harness::new(EngineConfig::default());
    h.clock.set(123_456);
    let out = h.feed(upright());
    assert!(out.emitted.is_some());
    assert_eq!(out.emitted.map(|a| a.score), Some(10.0));
}

// ── Lifecycle ────────────────────────────────────────────────

#[test]
fn stop_clears_session_state() {
    let mut h = Harness::new(sharp_config());
    for _ in 0..3 {
        h.feed(forward_head());
    }
    h.engine.stop(&mut h.sink);

    assert!(!h.engine.is_running());
    assert!(h.engine.current_analysis().is_none());
    assert!(h.engine.smoothed_analysis().is_none());
    assert!(h.engine.shown_issues().is_empty());
    // Counters are retained across restarts by default.
    assert_eq!(h.engine.active_counters().count(), 1);
    assert_eq!(h.sink.events.first(), Some(&EngineEvent::Started));
    assert_eq!(h.sink.events.last(), Some(&EngineEvent::Stopped));

    // A restart publishes straight away again.
    h.engine.start(&mut h.sink);
    assert!(h.feed(upright()).emitted.is_some());
}

#[test]
fn stop_drops_counters_when_not_retained() {
    let mut config = sharp_config();
    config.scheduler.retain_counters_on_restart = false;
    let mut h = Harness::new(config);
    h.feed(forward_head());
    h.feed(forward_head());
    h.engine.stop(&mut h.sink);
    assert_eq!(h.engine.active_counters().count(), 0);
}

#[test]
fn engines_do_not_share_state() {
    let mut a = Harness::new(sharp_config());
    let mut b = Harness::new(sharp_config());
    for _ in 0..3 {
        a.feed(forward_head());
    }
    b.feed(upright());
    assert!(a.forward_head_shown());
    assert!(!b.forward_head_shown());
    assert_eq!(b.engine.active_counters().count(), 0);
}

// ── Commands ─────────────────────────────────────────────────

#[test]
fn clear_counters_command_resets_hysteresis() {
    let mut h = Harness::new(sharp_config());
    h.feed(forward_head());
    h.feed(forward_head());
    h.engine
        .handle_command(EngineCommand::ClearCounters, &mut h.sink)
        .expect("clear counters");
    assert_eq!(h.sink.count(&EngineEvent::CountersReset), 1);

    h.feed(forward_head());
    assert!(!h.forward_head_shown());
}

#[test]
fn config_update_applies_new_emit_interval() {
    let mut h = Harness::new(EngineConfig::default());
    let mut faster = EngineConfig::default();
    faster.emit.min_interval_ms = 100;
    h.engine
        .handle_command(EngineCommand::UpdateConfig(faster), &mut h.sink)
        .expect("valid config");

    let emitted = (0..5).filter(|_| h.feed(upright()).emitted.is_some()).count();
    assert_eq!(emitted, 5);
}

#[test]
fn rejected_config_update_keeps_previous_settings() {
    let mut h = Harness::new(EngineConfig::default());
    let mut bad = EngineConfig::default();
    bad.score.floor = 20.0;
    let err = h
        .engine
        .handle_command(EngineCommand::UpdateConfig(bad), &mut h.sink)
        .expect_err("floor above baseline");
    assert!(matches!(err, ConfigError::ValidationFailed(_)));
    assert_eq!(h.engine.config(), &EngineConfig::default());
}
