//! Detection loop tests: scripted detector, manual clock, real timers.
//!
//! Scheduler intervals are shrunk to 1 ms so the loop runs quickly; the
//! scripted detector advances the clock by 100 ms per inference, so the
//! engine sees a realistic 10 Hz stream.

use core::time::Duration;

use posturewatch::adapters::visibility::StaticVisibility;
use posturewatch::app::commands::EngineCommand;
use posturewatch::app::detection_loop::{DetectionLoop, LoopControl, LoopExit, run_blocking};
use posturewatch::app::events::EngineEvent;
use posturewatch::error::{DetectionError, Error};
use posturewatch::scheduler::TickMode;
use posturewatch::{EngineConfig, PostureEngine};

use super::mock_ports::{ManualClock, RecordingSink, ScriptedDetector, Step, upright};

fn fast_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.scheduler.foreground_interval_ms = 1;
    config.scheduler.background_delay_ms = 1;
    config
}

fn frames(n: usize) -> Vec<Step> {
    (0..n).map(|_| Step::Frame(upright())).collect()
}

#[test]
fn exhausted_source_ends_the_session() {
    let clock = ManualClock::new();
    let mut detector = ScriptedDetector::new(frames(5), clock.clone(), 100);
    let mut engine = PostureEngine::new(fast_config());
    let mut sink = RecordingSink::new();
    let visibility = StaticVisibility::default();
    let control = LoopControl::new();

    let detection = DetectionLoop::new(&mut engine, &mut detector, &mut sink, &clock, &visibility);
    let stats = run_blocking(detection, &control).expect("loop runs");

    assert_eq!(stats.exit, LoopExit::SourceExhausted);
    assert_eq!(stats.frames, 5);
    assert_eq!(stats.detector_errors, 0);
    assert_eq!(detector.init_calls, 1);
    assert!(!engine.is_running());
    assert_eq!(sink.events.first(), Some(&EngineEvent::Started));
    assert_eq!(sink.events.last(), Some(&EngineEvent::Stopped));
    assert_eq!(sink.analyses().len(), 1);
}

#[test]
fn emits_every_two_seconds_of_detector_time() {
    let clock = ManualClock::new();
    let mut detector = ScriptedDetector::new(frames(61), clock.clone(), 100);
    let mut engine = PostureEngine::new(fast_config());
    let mut sink = RecordingSink::new();
    let visibility = StaticVisibility::default();
    let control = LoopControl::new();

    let detection = DetectionLoop::new(&mut engine, &mut detector, &mut sink, &clock, &visibility);
    let stats = run_blocking(detection, &control).expect("loop runs");

    assert_eq!(stats.frames, 61);
    assert_eq!(stats.emitted, 4);
    assert_eq!(sink.analyses().len(), 4);
}

#[test]
fn detector_failures_are_reported_and_skipped() {
    let clock = ManualClock::new();
    let script = vec![
        Step::Frame(upright()),
        Step::Fail(DetectionError::InferenceFailed),
        Step::Frame(upright()),
    ];
    let mut detector = ScriptedDetector::new(script, clock.clone(), 100);
    let mut engine = PostureEngine::new(fast_config());
    let mut sink = RecordingSink::new();
    let visibility = StaticVisibility::default();
    let control = LoopControl::new();

    let detection = DetectionLoop::new(&mut engine, &mut detector, &mut sink, &clock, &visibility);
    let stats = run_blocking(detection, &control).expect("loop survives detector errors");

    assert_eq!(stats.frames, 2);
    assert_eq!(stats.detector_errors, 1);
    assert_eq!(stats.exit, LoopExit::SourceExhausted);
    assert_eq!(sink.errors(), ["inference failed"]);
    assert_eq!(engine.frame_count(), 2);
}

#[test]
fn failed_init_never_starts_the_engine() {
    let clock = ManualClock::new();
    let mut detector = ScriptedDetector::new(frames(3), clock.clone(), 100)
        .failing_init(Error::Init("model missing"));
    let mut engine = PostureEngine::new(fast_config());
    let mut sink = RecordingSink::new();
    let visibility = StaticVisibility::default();
    let control = LoopControl::new();

    let detection = DetectionLoop::new(&mut engine, &mut detector, &mut sink, &clock, &visibility);
    let err = run_blocking(detection, &control).expect_err("init failure is fatal");

    assert_eq!(err, Error::Init("model missing"));
    assert_eq!(detector.detect_calls, 0);
    assert_eq!(detector.remaining(), 3);
    assert_eq!(engine.frame_count(), 0);
    assert_eq!(sink.count(&EngineEvent::Started), 0);
    assert_eq!(sink.errors(), ["initialization failed: init: model missing"]);
}

#[test]
fn pending_stop_wins_before_init() {
    let clock = ManualClock::new();
    let mut detector = ScriptedDetector::new(frames(3), clock.clone(), 100);
    let mut engine = PostureEngine::new(fast_config());
    let mut sink = RecordingSink::new();
    let visibility = StaticVisibility::default();
    let control = LoopControl::new();
    control.request_stop();
    assert!(control.stop_pending());

    let detection = DetectionLoop::new(&mut engine, &mut detector, &mut sink, &clock, &visibility);
    let stats = run_blocking(detection, &control).expect("stop is not an error");

    assert_eq!(stats.exit, LoopExit::Stopped);
    assert_eq!(stats.frames, 0);
    assert_eq!(detector.init_calls, 0);
    assert!(sink.events.is_empty());
    assert!(!control.stop_pending(), "the loop consumes the stop request");
}

#[test]
fn stop_cancels_a_pending_inference() {
    let clock = ManualClock::new();
    let mut script = frames(3);
    script.push(Step::Hang);
    let mut detector = ScriptedDetector::new(script, clock.clone(), 100);
    let mut engine = PostureEngine::new(fast_config());
    let mut sink = RecordingSink::new();
    let visibility = StaticVisibility::default();
    let control = LoopControl::new();

    let stats = {
        let mut detection =
            DetectionLoop::new(&mut engine, &mut detector, &mut sink, &clock, &visibility);
        let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
        executor
            .spawn(async {
                async_io_mini::Timer::after(Duration::from_millis(50)).await;
                control.request_stop();
            })
            .detach();
        futures_lite::future::block_on(executor.run(detection.run(&control)))
    }
    .expect("loop runs");

    assert_eq!(stats.exit, LoopExit::Stopped);
    assert_eq!(stats.frames, 3);
    assert_eq!(detector.detect_calls, 4);
    assert!(!engine.is_running());
    assert!(engine.current_analysis().is_none());
    assert_eq!(sink.events.last(), Some(&EngineEvent::Stopped));
}

#[test]
fn queued_commands_are_applied_before_the_next_frame() {
    let clock = ManualClock::new();
    let mut detector = ScriptedDetector::new(frames(2), clock.clone(), 100);
    let mut engine = PostureEngine::new(fast_config());
    let mut sink = RecordingSink::new();
    let visibility = StaticVisibility::default();
    let control = LoopControl::new();

    let mut faster = fast_config();
    faster.emit.min_interval_ms = 50;
    let mut invalid = fast_config();
    invalid.smoothing.analysis_window = 0;
    control.send(EngineCommand::ClearCounters).expect("queue has room");
    control.send(EngineCommand::UpdateConfig(invalid)).expect("queue has room");
    control.send(EngineCommand::UpdateConfig(faster)).expect("queue has room");

    let detection = DetectionLoop::new(&mut engine, &mut detector, &mut sink, &clock, &visibility);
    let stats = run_blocking(detection, &control).expect("loop runs");

    assert_eq!(stats.commands, 3);
    assert_eq!(sink.count(&EngineEvent::CountersReset), 1);
    assert_eq!(engine.config().emit.min_interval_ms, 50);
    // Both frames are 100 ms apart, past the new 50 ms interval.
    assert_eq!(stats.emitted, 2);
}

#[test]
fn full_command_queue_hands_the_command_back() {
    let control = LoopControl::new();
    for _ in 0..posturewatch::app::detection_loop::COMMAND_DEPTH {
        control.send(EngineCommand::ResetHistory).expect("queue has room");
    }
    assert!(matches!(
        control.send(EngineCommand::ClearCounters),
        Err(EngineCommand::ClearCounters)
    ));
}

#[test]
fn background_visibility_switches_to_fixed_delay_ticks() {
    let clock = ManualClock::new();
    let mut detector = ScriptedDetector::new(frames(3), clock.clone(), 100);
    let mut engine = PostureEngine::new(fast_config());
    let mut sink = RecordingSink::new();
    let visibility = StaticVisibility::new(false);
    let control = LoopControl::new();

    let mut detection =
        DetectionLoop::new(&mut engine, &mut detector, &mut sink, &clock, &visibility);
    let stats = futures_lite::future::block_on(detection.run(&control)).expect("loop runs");

    assert_eq!(stats.frames, 3);
    assert_eq!(detection.ticks().mode(), Some(TickMode::Background));
    assert_eq!(detection.ticks().switches(), 0);
}
