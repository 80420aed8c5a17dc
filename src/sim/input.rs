//! Input sampling
//!
//! Turns the raw two-stick input of a tick into effective control vectors,
//! applying per-side inversion and cross-side interference.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Four-direction key state for one side (WASD on the left, IJKL on the right)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl AxisKeys {
    /// Axis vector with components in {-1, 0, 1}, normalized when diagonal
    pub fn to_vector(self) -> Vec2 {
        let mut v = Vec2::ZERO;
        if self.left {
            v.x -= 1.0;
        }
        if self.right {
            v.x += 1.0;
        }
        if self.down {
            v.y -= 1.0;
        }
        if self.up {
            v.y += 1.0;
        }
        v.normalize_or_zero()
    }
}

/// Raw per-side input for a single tick
///
/// A missing device is simply the zero vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    pub left: Vec2,
    pub right: Vec2,
}

impl RawInput {
    pub fn new(left: Vec2, right: Vec2) -> Self {
        Self { left, right }
    }

    pub fn from_keys(left: AxisKeys, right: AxisKeys) -> Self {
        Self {
            left: left.to_vector(),
            right: right.to_vector(),
        }
    }
}

/// Effective control vectors for a tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlInput {
    pub left: Vec2,
    pub right: Vec2,
    /// Push on the left point caused by the right input
    pub left_interference: Vec2,
    /// Push on the right point caused by the left input
    pub right_interference: Vec2,
}

impl ControlInput {
    /// Direct input plus interference for the left point
    pub fn left_drive(&self) -> Vec2 {
        self.left + self.left_interference
    }

    /// Direct input plus interference for the right point
    pub fn right_drive(&self) -> Vec2 {
        self.right + self.right_interference
    }
}

/// Applies the stage's inversion and interference settings to raw input
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSampler {
    invert_left: bool,
    invert_right: bool,
    interference: f32,
}

impl InputSampler {
    pub fn new(invert_left: bool, invert_right: bool, interference: f32) -> Self {
        let mut sampler = Self::default();
        sampler.configure(invert_left, invert_right, interference);
        sampler
    }

    /// Re-apply stage settings (called on every initialize)
    pub fn configure(&mut self, invert_left: bool, invert_right: bool, interference: f32) {
        self.invert_left = invert_left;
        self.invert_right = invert_right;
        self.interference = interference.clamp(0.0, 1.0);
    }

    pub fn interference(&self) -> f32 {
        self.interference
    }

    /// Sample one tick of input
    ///
    /// Interference is computed from the post-inversion vectors: each side
    /// pushes the other point against the direction it is itself moving.
    pub fn sample(&self, raw: &RawInput) -> ControlInput {
        let mut left = raw.left.normalize_or_zero();
        let mut right = raw.right.normalize_or_zero();

        if self.invert_left {
            left = -left;
        }
        if self.invert_right {
            right = -right;
        }

        ControlInput {
            left,
            right,
            left_interference: -right * self.interference,
            right_interference: -left * self.interference,
        }
    }
}
