//! Tuning state and core simulation types
//!
//! Everything the controller mutates per tick lives here. Reset wholesale on
//! every (re)initialization.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bounds::Bounds;

/// Which control point / panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Step of the automatic restart after an overheat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestartStage {
    /// Holding on the failure screen
    Delay,
    /// Screen fading to black; reinitialize when it completes
    FadingOut,
}

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Phase {
    /// No stage loaded; ticks do nothing
    Inactive,
    /// Active play
    Running,
    /// Stability reached 1.0 (terminal)
    Succeeded,
    /// Overheat reached; restart starts on the next tick
    GameOver,
    /// Timed restart sequence
    Restarting { stage: RestartStage, elapsed: f32 },
}

/// A player-driven point
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub pos: Vec2,
    pub vel: Vec2,
}

impl ControlPoint {
    pub fn at(pos: Vec2) -> Self {
        Self { pos, vel: Vec2::ZERO }
    }
}

/// The zone a control point is chasing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetZone {
    /// Placement center; orbit anchor for moving targets
    pub base: Vec2,
    /// Current center
    pub center: Vec2,
    pub size: Vec2,
}

impl TargetZone {
    pub fn new(base: Vec2, size: Vec2) -> Self {
        Self {
            base,
            center: base,
            size,
        }
    }
}

/// A rectangle that penalizes the point occupying it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardZone {
    pub center: Vec2,
    pub size: Vec2,
}

impl HazardZone {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    pub fn rect(&self) -> Bounds {
        Bounds::centered(self.center, self.size)
    }

    /// Axis-aligned containment, edges inclusive
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        self.rect().contains(point)
    }
}

/// One panel: its point, target and hazards
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SideState {
    pub point: ControlPoint,
    pub target: Option<TargetZone>,
    pub hazards: Vec<HazardZone>,
    /// Alignment score with the target (0-1)
    pub sync: f32,
    pub in_hazard: bool,
    /// Sync above the lock threshold
    pub locked: bool,
}

impl SideState {
    pub fn in_any_hazard(&self) -> bool {
        self.hazards.iter().any(|h| h.contains(self.point.pos))
    }
}

/// Complete simulation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningState {
    pub phase: Phase,
    pub left: SideState,
    pub right: SideState,
    /// left.sync * right.sync
    pub total_sync: f32,
    /// Sustained alignment (0-1); 1.0 wins
    pub stability: f32,
    /// Accumulated hazard time (0..=threshold)
    pub overheat_timer: f32,
    /// Current velocity damping; never below the stage's base inertia
    pub inertia: f32,
    /// Seconds since the last (re)initialization, drives target orbits
    pub elapsed: f32,
}

impl Default for TuningState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuningState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Inactive,
            left: SideState::default(),
            right: SideState::default(),
            total_sync: 0.0,
            stability: 0.0,
            overheat_timer: 0.0,
            inertia: 0.0,
            elapsed: 0.0,
        }
    }

    pub fn side(&self, side: Side) -> &SideState {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut SideState {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    pub fn any_in_hazard(&self) -> bool {
        self.left.in_hazard || self.right.in_hazard
    }
}
