//! Replay pose detector.
//!
//! Implements [`PoseDetector`] by reading recorded detector output, one
//! JSON record per line.  Accepted line shapes:
//!
//! - a bare keypoint list: `[{"name":"nose","x":0.5,"y":0.3,"score":0.9}, ...]`
//! - an object with a list: `{"keypoints": [...]}`
//! - a recorded failure: `{"error": "inference timed out"}`
//!
//! Blank lines and lines starting with `#` are skipped.  When every
//! record has been served the detector reports
//! [`DetectionError::Exhausted`].

use std::collections::VecDeque;
use std::io::BufRead;
use std::path::Path;

use log::{debug, info, warn};
use serde::Deserialize;

use crate::app::ports::PoseDetector;
use crate::error::{DetectionError, Error, InputError};
use crate::landmarks::{LandmarkFrame, RawKeypoint};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplayRecord {
    Bare(Vec<RawKeypoint>),
    Frame { keypoints: Vec<RawKeypoint> },
    Failure { error: String },
}

/// Decode one replay line into a frame, mapping recorded failures to
/// [`DetectionError::InferenceFailed`].
pub fn decode_record(line: &str) -> Result<LandmarkFrame, DetectionError> {
    let record: ReplayRecord =
        serde_json::from_str(line).map_err(|_| DetectionError::Malformed(InputError::Syntax))?;
    match record {
        ReplayRecord::Bare(keypoints) | ReplayRecord::Frame { keypoints } => {
            Ok(LandmarkFrame::from_keypoints(&keypoints)?)
        }
        ReplayRecord::Failure { error } => {
            debug!("Replay: recorded failure '{}'", error);
            Err(DetectionError::InferenceFailed)
        }
    }
}

pub struct ReplayDetector {
    lines: VecDeque<String>,
    initialised: bool,
    served: u64,
}

impl ReplayDetector {
    /// Buffer every non-blank, non-comment line of `reader`.
    pub fn from_reader(reader: impl BufRead) -> std::io::Result<Self> {
        let mut lines = VecDeque::new();
        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            lines.push_back(trimmed.to_string());
        }
        Ok(Self::from_lines(lines))
    }

    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn from_lines(lines: impl IntoIterator<Item = String>) -> Self {
        Self {
            lines: lines.into_iter().collect(),
            initialised: false,
            served: 0,
        }
    }

    /// Records not yet served.
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }

    pub fn served(&self) -> u64 {
        self.served
    }
}

impl PoseDetector for ReplayDetector {
    async fn init(&mut self) -> Result<(), Error> {
        if self.lines.is_empty() {
            warn!("Replay: no records to play back");
            return Err(Error::Init("replay source is empty"));
        }
        self.initialised = true;
        info!("Replay: {} records queued", self.lines.len());
        Ok(())
    }

    async fn detect(&mut self) -> Result<LandmarkFrame, DetectionError> {
        if !self.initialised {
            return Err(DetectionError::NotInitialized);
        }
        let line = self.lines.pop_front().ok_or(DetectionError::Exhausted)?;
        self.served += 1;
        decode_record(&line)
    }
}
