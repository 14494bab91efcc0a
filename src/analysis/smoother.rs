//! Landmark smoother.
//!
//! Keeps the last K landmark frames in a fixed-capacity ring and averages
//! each joint across the window.  Damps detector jitter with at most a
//! few frames of lag.
//!
//! Per joint:
//! - mean of x/y/z over entries whose visibility exceeds the floor;
//! - if no entry passes, the most recent entry is used as-is;
//! - with an empty window, a zero-position, zero-visibility placeholder.

use heapless::Deque;

use crate::config::{MAX_FRAME_WINDOW, SmoothingConfig};
use crate::landmarks::{Keypoint, Landmark, LandmarkFrame};

pub struct LandmarkSmoother {
    window: Deque<LandmarkFrame, MAX_FRAME_WINDOW>,
    /// Runtime window length (`<= MAX_FRAME_WINDOW`).
    capacity: usize,
    min_visibility: f32,
}

impl LandmarkSmoother {
    pub fn new(config: &SmoothingConfig) -> Self {
        Self {
            window: Deque::new(),
            capacity: config.frame_window.clamp(1, MAX_FRAME_WINDOW),
            min_visibility: config.min_visibility,
        }
    }

    /// Apply a new window length; oldest frames are dropped if it shrank.
    pub fn reconfigure(&mut self, config: &SmoothingConfig) {
        self.capacity = config.frame_window.clamp(1, MAX_FRAME_WINDOW);
        self.min_visibility = config.min_visibility;
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }
    }

    /// Push a frame and return the smoothed frame over the current window.
    pub fn push(&mut self, frame: LandmarkFrame) -> LandmarkFrame {
        if self.window.len() >= self.capacity {
            self.window.pop_front();
        }
        // Capacity is bounded by MAX_FRAME_WINDOW, so this cannot fail.
        let _ = self.window.push_back(frame);
        self.smoothed()
    }

    /// Smoothed frame over the current window contents.
    pub fn smoothed(&self) -> LandmarkFrame {
        let mut out = LandmarkFrame::placeholder();
        for kp in Keypoint::ALL {
            out.set(kp, self.smooth_joint(kp));
        }
        out
    }

    fn smooth_joint(&self, kp: Keypoint) -> Landmark {
        let Some(latest) = self.window.back() else {
            return Landmark::placeholder();
        };

        let (mut sx, mut sy, mut sz, mut sv) = (0.0_f32, 0.0_f32, 0.0_f32, 0.0_f32);
        let mut n = 0_u32;
        for frame in self.window.iter() {
            let lm = frame.get(kp);
            if lm.visibility > self.min_visibility {
                sx += lm.x;
                sy += lm.y;
                sz += lm.z;
                sv += lm.visibility;
                n += 1;
            }
        }

        if n == 0 {
            return *latest.get(kp);
        }
        let n = n as f32;
        Landmark {
            x: sx / n,
            y: sy / n,
            z: sz / n,
            visibility: sv / n,
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}
