//! Body landmark types.
//!
//! The pose detector reports 17 COCO-ordered keypoints per frame in
//! image-normalised coordinates (`0.0..=1.0` on both axes, `y` grows
//! downwards).  A [`LandmarkFrame`] is the immutable per-tick snapshot that
//! flows through the analysis pipeline.
//!
//! Low or zero visibility is valid data: it means "not confidently seen",
//! never "absent".  Consumers gate on visibility themselves.

use serde::{Deserialize, Serialize};

use crate::error::InputError;

// ---------------------------------------------------------------------------
// Keypoint identity
// ---------------------------------------------------------------------------

/// 17-joint keypoint set in detector output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Keypoint {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl Keypoint {
    /// Total number of keypoints, sizes the frame array.
    pub const COUNT: usize = 17;

    /// Every keypoint in detector order.
    pub const ALL: [Keypoint; Self::COUNT] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    /// Canonical snake_case name as emitted by the detector.
    pub fn name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }

    /// Look a keypoint up by name.  Accepts both `left_shoulder` and
    /// `leftShoulder` spellings, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let mut folded: heapless::String<24> = heapless::String::new();
        for c in name.chars().filter(|c| *c != '_' && *c != '-') {
            folded.push(c.to_ascii_lowercase()).ok()?;
        }
        Self::ALL.into_iter().find(|kp| {
            kp.name()
                .chars()
                .filter(|c| *c != '_')
                .eq(folded.chars())
        })
    }
}

// ---------------------------------------------------------------------------
// Landmark
// ---------------------------------------------------------------------------

/// A single tracked joint.  `z` is carried for completeness but unused by
/// the 2D metrics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Detector confidence in `[0, 1]`.
    pub visibility: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility,
        }
    }

    /// Zero position, zero visibility.
    pub const fn placeholder() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// True if the detector is more confident than `threshold`.
    pub fn visible(&self, threshold: f32) -> bool {
        self.visibility > threshold
    }

    pub fn midpoint(&self, other: &Self) -> (f32, f32) {
        ((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn distance_to(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

// ---------------------------------------------------------------------------
// Raw detector output
// ---------------------------------------------------------------------------

/// One keypoint as reported by the pose detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawKeypoint {
    /// Optional joint name; when absent the list position decides the joint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub x: f32,
    pub y: f32,
    /// Detector confidence, `[0, 1]`.
    #[serde(alias = "confidence", alias = "visibility")]
    pub score: f32,
}

// ---------------------------------------------------------------------------
// LandmarkFrame
// ---------------------------------------------------------------------------

/// All 17 landmarks for one detector tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkFrame {
    points: [Landmark; Keypoint::COUNT],
}

impl Default for LandmarkFrame {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl LandmarkFrame {
    /// Every joint at the origin with zero visibility.
    pub const fn placeholder() -> Self {
        Self {
            points: [Landmark::placeholder(); Keypoint::COUNT],
        }
    }

    pub const fn from_points(points: [Landmark; Keypoint::COUNT]) -> Self {
        Self { points }
    }

    /// Decode the detector's keypoint list.
    ///
    /// Named keypoints are placed by name; unnamed ones by list position.
    /// Joints the detector did not report stay as zero-visibility
    /// placeholders.  Non-finite coordinates or scores are treated as
    /// "not seen" rather than rejected.
    pub fn from_keypoints(keypoints: &[RawKeypoint]) -> Result<Self, InputError> {
        if keypoints.len() > Keypoint::COUNT {
            return Err(InputError::TooManyKeypoints);
        }

        let mut frame = Self::placeholder();
        for (idx, raw) in keypoints.iter().enumerate() {
            let kp = match raw.name.as_deref() {
                Some(name) => Keypoint::from_name(name).ok_or(InputError::UnknownKeypoint)?,
                None => Keypoint::from_index(idx).ok_or(InputError::TooManyKeypoints)?,
            };

            let finite = raw.x.is_finite() && raw.y.is_finite() && raw.score.is_finite();
            frame.points[kp as usize] = if finite {
                Landmark::new(raw.x, raw.y, raw.score.clamp(0.0, 1.0))
            } else {
                Landmark::placeholder()
            };
        }
        Ok(frame)
    }

    pub fn get(&self, kp: Keypoint) -> &Landmark {
        &self.points[kp as usize]
    }

    pub fn set(&mut self, kp: Keypoint, landmark: Landmark) {
        self.points[kp as usize] = landmark;
    }

    pub fn points(&self) -> &[Landmark; Keypoint::COUNT] {
        &self.points
    }

    /// Builder-style setter, handy for constructing fixtures.
    #[must_use]
    pub fn with(mut self, kp: Keypoint, landmark: Landmark) -> Self {
        self.set(kp, landmark);
        self
    }
}
