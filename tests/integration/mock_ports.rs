//! Mock port adapters and landmark fixtures for integration tests.
//!
//! The clock is advanced by hand (or by the scripted detector), and the
//! sink records every event so tests can assert on the full history.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use posturewatch::app::events::EngineEvent;
use posturewatch::app::ports::{Clock, EventSink, PoseDetector};
use posturewatch::error::{DetectionError, Error};
use posturewatch::{IssueKind, Keypoint, Landmark, LandmarkFrame, PostureAnalysis};

// ── ManualClock ───────────────────────────────────────────────

/// Shared, hand-driven millisecond clock.  Clones see the same time.
#[derive(Clone, Default)]
pub struct ManualClock(Rc<Cell<u64>>);

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.0.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<EngineEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyses(&self) -> Vec<&PostureAnalysis> {
        self.events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Analysis(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    pub fn raised(&self) -> Vec<IssueKind> {
        self.events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::IssueRaised(k) => Some(*k),
                _ => None,
            })
            .collect()
    }

    pub fn cleared(&self) -> Vec<IssueKind> {
        self.events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::IssueCleared(k) => Some(*k),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::DetectorError(msg) => Some(msg.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &EngineEvent) -> usize {
        self.events.iter().filter(|e| *e == wanted).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &EngineEvent) {
        self.events.push(event.clone());
    }
}

// ── ScriptedDetector ──────────────────────────────────────────

/// One scripted detector response.
#[allow(dead_code)]
pub enum Step {
    Frame(LandmarkFrame),
    Fail(DetectionError),
    /// Never completes; only a stop can end it.
    Hang,
}

/// Plays back a script, advancing the shared clock by `frame_ms` per
/// inference.  An empty script reports `Exhausted`.
pub struct ScriptedDetector {
    script: VecDeque<Step>,
    clock: ManualClock,
    frame_ms: u64,
    pub init_error: Option<Error>,
    pub init_calls: u32,
    pub detect_calls: u32,
}

#[allow(dead_code)]
impl ScriptedDetector {
    pub fn new(script: impl IntoIterator<Item = Step>, clock: ManualClock, frame_ms: u64) -> Self {
        Self {
            script: script.into_iter().collect(),
            clock,
            frame_ms,
            init_error: None,
            init_calls: 0,
            detect_calls: 0,
        }
    }

    pub fn failing_init(mut self, err: Error) -> Self {
        self.init_error = Some(err);
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl PoseDetector for ScriptedDetector {
    async fn init(&mut self) -> Result<(), Error> {
        self.init_calls += 1;
        match self.init_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn detect(&mut self) -> Result<LandmarkFrame, DetectionError> {
        self.detect_calls += 1;
        self.clock.advance(self.frame_ms);
        match self.script.pop_front() {
            Some(Step::Frame(frame)) => Ok(frame),
            Some(Step::Fail(e)) => Err(e),
            Some(Step::Hang) => core::future::pending().await,
            None => Err(DetectionError::Exhausted),
        }
    }
}

// ── Landmark fixtures ─────────────────────────────────────────

fn seen(x: f32, y: f32) -> Landmark {
    Landmark::new(x, y, 0.9)
}

/// Level, centred user with ear and nose on the shoulder line: every
/// metric reads zero and the score is 10.
pub fn upright() -> LandmarkFrame {
    LandmarkFrame::placeholder()
        .with(Keypoint::Nose, seen(0.50, 0.20))
        .with(Keypoint::LeftEar, seen(0.55, 0.30))
        .with(Keypoint::RightEar, seen(0.45, 0.30))
        .with(Keypoint::LeftShoulder, seen(0.65, 0.50))
        .with(Keypoint::RightShoulder, seen(0.35, 0.50))
        .with(Keypoint::LeftHip, seen(0.60, 0.90))
        .with(Keypoint::RightHip, seen(0.40, 0.90))
}

/// Nose rotated 35° forward off the shoulder→ear line on the left side;
/// the right ear is unseen so only the neck metric is non-zero.
pub fn forward_head() -> LandmarkFrame {
    let (s, c) = 35.0_f32.to_radians().sin_cos();
    upright()
        .with(Keypoint::LeftEar, seen(0.65, 0.30))
        .with(Keypoint::RightEar, Landmark::placeholder())
        .with(Keypoint::Nose, seen(0.65 - 0.1 * s, 0.30 - 0.1 * c))
}

/// Nose and shoulders barely seen, shoulders still well apart.
pub fn barely_seen() -> LandmarkFrame {
    LandmarkFrame::placeholder()
        .with(Keypoint::Nose, Landmark::new(0.5, 0.2, 0.1))
        .with(Keypoint::LeftShoulder, Landmark::new(0.65, 0.5, 0.1))
        .with(Keypoint::RightShoulder, Landmark::new(0.35, 0.5, 0.1))
}
