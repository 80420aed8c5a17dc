//! Axis-aligned bounds for control areas and zones
//!
//! Plain min/max rectangles in panel space. Points are clamped into them,
//! zones are tested against them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle stored as inclusive min/max corners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Build from an origin corner plus width/height (x, y, w, h)
    pub fn from_rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    /// Build a rectangle of `size` centered on `center`
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// True when min <= max on both axes
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    /// Inclusive containment test
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Clamp a point into the rectangle, component-wise
    #[inline]
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }

    /// Shrink every edge by `padding`
    ///
    /// Collapses to the center on any axis where the padding exceeds half the
    /// extent, so the result is always valid.
    pub fn shrink(&self, padding: Vec2) -> Self {
        let center = self.center();
        let half = (self.size() * 0.5 - padding).max(Vec2::ZERO);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Range of centers at which a rectangle of `size` stays fully inside
    pub fn center_range(&self, size: Vec2) -> Self {
        self.shrink(size * 0.5)
    }
}

/// Linear interpolation with `t` clamped to [0, 1]
#[inline]
pub fn lerp_clamped(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}
