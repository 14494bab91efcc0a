//! Unified error types for the posture engine.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! detection loop's error handling uniform.  Variants are `Copy` so they
//! can be passed through the loop and the event sink without allocation.
//!
//! Note that the per-frame analysis pipeline itself never fails: low
//! visibility and degenerate geometry degrade to defined values instead.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level engine error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The pose detector failed for one frame.
    Detection(DetectionError),
    /// The detector (or another collaborator) could not be initialised.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detection(e) => write!(f, "detection: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Detection errors
// ---------------------------------------------------------------------------

/// Per-frame detector failures.  Recovered locally by the detection loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionError {
    /// Model inference returned an error.
    InferenceFailed,
    /// `detect` was called before a successful `init`.
    NotInitialized,
    /// The frame source has no more frames (replay finished).
    Exhausted,
    /// The detector produced output that could not be decoded.
    Malformed(InputError),
}

impl fmt::Display for DetectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InferenceFailed => write!(f, "inference failed"),
            Self::NotInitialized => write!(f, "detector not initialised"),
            Self::Exhausted => write!(f, "frame source exhausted"),
            Self::Malformed(e) => write!(f, "malformed detector output ({e})"),
        }
    }
}

impl From<DetectionError> for Error {
    fn from(e: DetectionError) -> Self {
        Self::Detection(e)
    }
}

// ---------------------------------------------------------------------------
// Input errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    /// A keypoint carried a name outside the 17-joint set.
    UnknownKeypoint,
    /// More keypoints than the 17-joint set were supplied.
    TooManyKeypoints,
    /// The keypoint record itself could not be parsed.
    Syntax,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKeypoint => write!(f, "unknown keypoint name"),
            Self::TooManyKeypoints => write!(f, "too many keypoints"),
            Self::Syntax => write!(f, "unparsable keypoint record"),
        }
    }
}

impl From<InputError> for DetectionError {
    fn from(e: InputError) -> Self {
        Self::Malformed(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_nests_inner_error() {
        let e: Error = DetectionError::Malformed(InputError::UnknownKeypoint).into();
        assert_eq!(
            e.to_string(),
            "detection: malformed detector output (unknown keypoint name)"
        );
    }

    #[test]
    fn input_error_lifts_into_detection_error() {
        let d: DetectionError = InputError::TooManyKeypoints.into();
        assert_eq!(d, DetectionError::Malformed(InputError::TooManyKeypoints));
    }
}
