//! Fuzz target: replay record decoding and the per-frame pipeline
//!
//! Feeds arbitrary input lines through `decode_record` and every frame
//! that decodes through a `PostureEngine`.  The pipeline must never
//! panic and scores must stay within the configured bounds.
//!
//! cargo fuzz run fuzz_replay_record

#![no_main]

use libfuzzer_sys::fuzz_target;
use posturewatch::adapters::replay::decode_record;
use posturewatch::app::events::EngineEvent;
use posturewatch::app::ports::{Clock, EventSink};
use posturewatch::{EngineConfig, PostureEngine};

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &EngineEvent) {}
}

struct Tick(u64);

impl Clock for Tick {
    fn now_ms(&self) -> u64 {
        self.0
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    let mut engine = PostureEngine::new(EngineConfig::default());
    let mut sink = Discard;
    for (i, line) in text.lines().enumerate() {
        let Ok(frame) = decode_record(line) else {
            continue;
        };
        let out = engine.process_frame(frame, &Tick(i as u64 * 33), &mut sink);
        assert!(
            (2.0..=10.0).contains(&out.analysis.score),
            "score {} out of bounds",
            out.analysis.score
        );
    }
});
