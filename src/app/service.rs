//! Posture engine: the hexagonal core.
//!
//! [`PostureEngine`] owns every piece of per-instance state: the landmark
//! window, consistency counters, analysis history and last-emit time.
//! Two engines never share anything, so tests and concurrent sessions
//! are independent.  All I/O flows through port traits passed in at
//! call sites.
//!
//! ```text
//!  LandmarkFrame ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                    │         PostureEngine        │
//!          Clock ──▶ │ Smoother · Metrics · Issues  │
//!                    │ Score · History · Emitter    │
//!                    └──────────────────────────────┘
//! ```

use log::{debug, info, trace, warn};

use crate::analysis::classifier::potential_issues;
use crate::analysis::metrics::{compute_metrics, derive_signals};
use crate::analysis::score::{build_analysis, visibility_gate};
use crate::analysis::{
    AnalysisHistory, IssueClassifier, IssueKind, IssueSet, LandmarkSmoother, OutputEmitter,
    PostureAnalysis, PostureSignals,
};
use crate::config::EngineConfig;
use crate::landmarks::LandmarkFrame;

use super::commands::EngineCommand;
use super::events::EngineEvent;
use super::ports::{Clock, ConfigError, EventSink};

/// Result of running one frame through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    /// This frame's own analysis (before history smoothing).
    pub analysis: PostureAnalysis,
    /// Derived signals; all defaults when the visibility gate tripped.
    pub signals: PostureSignals,
    /// `true` if the visibility gate short-circuited the frame.
    pub degraded: bool,
    /// The smoothed analysis, if the emitter published one this frame.
    pub emitted: Option<PostureAnalysis>,
}

// ───────────────────────────────────────────────────────────────
// PostureEngine
// ───────────────────────────────────────────────────────────────

pub struct PostureEngine {
    config: EngineConfig,
    smoother: LandmarkSmoother,
    classifier: IssueClassifier,
    history: AnalysisHistory,
    emitter: OutputEmitter,
    /// Most recently published analysis.
    current: Option<PostureAnalysis>,
    running: bool,
    frame_count: u64,
}

impl PostureEngine {
    /// Construct an engine from configuration.  An invalid config is
    /// replaced by the defaults.
    ///
    /// Does **not** start a session; call [`start`](Self::start) next.
    pub fn new(config: EngineConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!("PostureEngine: {}, falling back to default configuration", e);
                EngineConfig::default()
            }
        };
        Self {
            smoother: LandmarkSmoother::new(&config.smoothing),
            classifier: IssueClassifier::new(&config.classifier),
            history: AnalysisHistory::new(config.smoothing.analysis_window),
            emitter: OutputEmitter::new(&config.emit),
            current: None,
            running: false,
            frame_count: 0,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.running = true;
        sink.emit(&EngineEvent::Started);
        info!(
            "PostureEngine started (frame window {}, analysis window {}, emit every {} ms)",
            self.config.smoothing.frame_window,
            self.config.smoothing.analysis_window,
            self.config.emit.min_interval_ms
        );
    }

    /// End the session: drop the current analysis, both windows and the
    /// last-emit time.  Counters survive only if
    /// `scheduler.retain_counters_on_restart` is set.
    pub fn stop(&mut self, sink: &mut impl EventSink) {
        self.running = false;
        self.clear_derived_state();
        self.classifier.forget_shown();
        if !self.config.scheduler.retain_counters_on_restart {
            self.classifier.reset_counters();
        }
        sink.emit(&EngineEvent::Stopped);
        info!("PostureEngine stopped after {} frames", self.frame_count);
    }

    // ── Per-frame pipeline ────────────────────────────────────

    /// Run one detector frame through smoothing, metrics, classification,
    /// scoring, history and emission.  Never fails.
    pub fn process_frame(
        &mut self,
        frame: LandmarkFrame,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) -> FrameOutcome {
        self.frame_count += 1;
        let cfg = &self.config;

        // 1. Temporal smoothing
        let smoothed = self.smoother.push(frame);

        // 2. Visibility gate, or metrics → issues → score
        let (analysis, signals, degraded) =
            if let Some(gated) = visibility_gate(&smoothed, &cfg.visibility) {
                debug!("Frame {}: visibility gate ({})", self.frame_count, gated.score);
                (gated, PostureSignals::default(), true)
            } else {
                let threshold = cfg.visibility.metric_threshold;
                let metrics = compute_metrics(&smoothed, threshold);
                let signals =
                    derive_signals(&smoothed, &metrics, threshold, &cfg.framing, &cfg.head_neck);
                trace!("Frame {}: {:?} {:?}", self.frame_count, metrics, signals);

                let potential = potential_issues(&metrics, &signals, &cfg.issues);
                let previous = self.classifier.shown();
                let shown = self.classifier.update(potential);
                emit_transitions(previous, shown, sink);

                let analysis =
                    build_analysis(metrics, &signals, potential, shown, &cfg.issues, &cfg.score);
                (analysis, signals, false)
            };

        // 3. History and smoothed view
        self.history.push(analysis.clone());
        let smoothed_analysis = self.history.smoothed();

        // 4. High-quality cutoff clears every counter
        if let Some(s) = &smoothed_analysis {
            if s.score > self.config.classifier.reset_score && self.classifier.is_tracking() {
                debug!("Smoothed score {:.2} above cutoff, clearing counters", s.score);
                self.classifier.reset_counters();
                sink.emit(&EngineEvent::CountersReset);
            }
        }

        // 5. Rate-limited publication
        let mut emitted = None;
        if let Some(s) = smoothed_analysis {
            if self.emitter.should_emit(clock.now_ms()) {
                sink.emit(&EngineEvent::Analysis(s.clone()));
                self.current = Some(s.clone());
                emitted = Some(s);
            }
        }

        FrameOutcome {
            analysis,
            signals,
            degraded,
            emitted,
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.  Only `UpdateConfig` can fail, and
    /// a rejected config leaves the engine untouched.
    pub fn handle_command(
        &mut self,
        cmd: EngineCommand,
        sink: &mut impl EventSink,
    ) -> Result<(), ConfigError> {
        match cmd {
            EngineCommand::UpdateConfig(new_config) => {
                if let Err(e) = new_config.validate() {
                    warn!("Configuration update rejected: {}", e);
                    return Err(e);
                }
                self.apply_config(new_config);
                info!("Configuration updated at runtime");
            }
            EngineCommand::ClearCounters => {
                self.classifier.reset_counters();
                sink.emit(&EngineEvent::CountersReset);
                info!("Consistency counters cleared on request");
            }
            EngineCommand::ResetHistory => {
                self.clear_derived_state();
                info!("Analysis history reset on request");
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// The most recently published analysis, `None` before the first
    /// emit and after [`stop`](Self::stop).
    pub fn current_analysis(&self) -> Option<&PostureAnalysis> {
        self.current.as_ref()
    }

    /// Tracked issues and their consistency counters.
    pub fn active_counters(&self) -> impl Iterator<Item = (IssueKind, u32)> + '_ {
        self.classifier.active()
    }

    /// Issues shown by the last classified frame.
    pub fn shown_issues(&self) -> IssueSet {
        self.classifier.shown()
    }

    /// Smoothed analysis over the current history, regardless of the
    /// emit interval.
    pub fn smoothed_analysis(&self) -> Option<PostureAnalysis> {
        self.history.smoothed()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames processed since construction.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn apply_config(&mut self, config: EngineConfig) {
        self.smoother.reconfigure(&config.smoothing);
        self.history.resize(config.smoothing.analysis_window);
        self.classifier.reconfigure(&config.classifier);
        self.emitter.reconfigure(&config.emit);
        self.config = config;
    }

    fn clear_derived_state(&mut self) {
        self.current = None;
        self.history.clear();
        self.smoother.clear();
        self.emitter.reset();
    }
}

/// Report shown-set changes as events.
fn emit_transitions(previous: IssueSet, shown: IssueSet, sink: &mut impl EventSink) {
    for kind in shown.difference(previous).iter() {
        sink.emit(&EngineEvent::IssueRaised(kind));
    }
    for kind in previous.difference(shown).iter() {
        sink.emit(&EngineEvent::IssueCleared(kind));
    }
}
