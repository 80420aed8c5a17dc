//! Stage configuration
//!
//! One `StageConfig` per chapter. Read once at session start and never
//! mutated by the simulation. Tables can be authored as JSON.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TuningError};
use crate::sim::{Bounds, Side};

/// Per-side movement tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideConfig {
    /// Acceleration applied per unit of input
    pub move_force: f32,
    /// Speed cap for the control point
    pub max_speed: f32,
    /// Flip this side's input
    pub inverted: bool,
    /// Area the control point may move in
    pub bounds: Bounds,
    /// Where the control point sits after (re)initialization
    pub start: Vec2,
    /// Fixed target center; random placement when absent
    pub target_position: Option<Vec2>,
    /// Number of hazard zones placed on this side
    pub hazard_count: u32,
}

impl Default for SideConfig {
    fn default() -> Self {
        Self {
            move_force: 100.0,
            max_speed: 300.0,
            inverted: false,
            bounds: Bounds::from_rect(-200.0, -200.0, 400.0, 400.0),
            start: Vec2::ZERO,
            target_position: None,
            hazard_count: 1,
        }
    }
}

/// Tunables for a single tuning session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub left: SideConfig,
    pub right: SideConfig,

    // === Targets ===
    /// Tolerance radius in units of `consts::TOLERANCE_SCALE`
    pub target_tolerance: f32,
    /// Inset from the movement bounds for random target placement
    pub target_padding: f32,
    /// Targets orbit their base position
    pub moving_target: bool,
    /// Angular speed of the orbit (rad/s)
    pub target_move_speed: f32,
    /// Orbit amplitude
    pub target_orbit_radius: f32,

    // === Input ===
    /// Share of one side's input pushed against the other side (0-1)
    pub interference_strength: f32,

    // === Inertia / penalty ===
    /// Damping applied to velocity at rest
    pub base_inertia: f32,
    /// Inertia gained per second while a point is in a hazard
    pub penalty_rate: f32,
    /// Rate at which inertia relaxes back to base
    pub recovery_speed: f32,
    /// Seconds of hazard time before overheat
    pub overheat_threshold: f32,

    // === Hazards ===
    /// Width/height of each hazard rectangle
    pub hazard_size: Vec2,
    /// Minimum distance between a hazard center and the target, the start
    /// point and other zones
    pub safe_margin: f32,

    // === Stability ===
    /// Total sync needed for the gauge to rise (0-1)
    pub stability_threshold: f32,
    /// Gauge loss per second below the threshold
    pub stability_decay: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            left: SideConfig::default(),
            right: SideConfig::default(),

            target_tolerance: 0.5,
            target_padding: 40.0,
            moving_target: false,
            target_move_speed: 1.0,
            target_orbit_radius: 50.0,

            interference_strength: 0.0,

            base_inertia: 5.0,
            penalty_rate: 2.0,
            recovery_speed: 1.0,
            overheat_threshold: 5.0,

            hazard_size: Vec2::new(80.0, 80.0),
            safe_margin: 100.0,

            stability_threshold: 0.8,
            stability_decay: 0.2,
        }
    }
}

impl StageConfig {
    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        fn invalid<T>(msg: String) -> Result<T> {
            Err(TuningError::InvalidConfig(msg))
        }

        // NaN slips past every range check below
        for (name, side) in [("left", &self.left), ("right", &self.right)] {
            let finite = side.move_force.is_finite()
                && side.max_speed.is_finite()
                && side.bounds.min.is_finite()
                && side.bounds.max.is_finite()
                && side.start.is_finite()
                && side.target_position.is_none_or(|p| p.is_finite());
            if !finite {
                return invalid(format!("{name} side has a non-finite value"));
            }
        }
        let scalars = [
            ("target_tolerance", self.target_tolerance),
            ("target_padding", self.target_padding),
            ("target_move_speed", self.target_move_speed),
            ("target_orbit_radius", self.target_orbit_radius),
            ("interference_strength", self.interference_strength),
            ("base_inertia", self.base_inertia),
            ("penalty_rate", self.penalty_rate),
            ("recovery_speed", self.recovery_speed),
            ("overheat_threshold", self.overheat_threshold),
            ("hazard_size.x", self.hazard_size.x),
            ("hazard_size.y", self.hazard_size.y),
            ("safe_margin", self.safe_margin),
            ("stability_threshold", self.stability_threshold),
            ("stability_decay", self.stability_decay),
        ];
        if let Some((name, value)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
            return invalid(format!("{name} must be finite, got {value}"));
        }

        for (name, side) in [("left", &self.left), ("right", &self.right)] {
            if !side.bounds.is_valid() {
                return invalid(format!("{name} bounds have min > max"));
            }
            if side.move_force < 0.0 || side.max_speed < 0.0 {
                return invalid(format!("{name} force and speed must be non-negative"));
            }
        }
        if self.target_tolerance <= 0.0 {
            return invalid(format!("target_tolerance must be > 0, got {}", self.target_tolerance));
        }
        if self.overheat_threshold <= 0.0 {
            return invalid(format!(
                "overheat_threshold must be > 0, got {}",
                self.overheat_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.interference_strength) {
            return invalid(format!(
                "interference_strength must be in [0, 1], got {}",
                self.interference_strength
            ));
        }
        if !(0.0..=1.0).contains(&self.stability_threshold) {
            return invalid(format!(
                "stability_threshold must be in [0, 1], got {}",
                self.stability_threshold
            ));
        }
        if self.base_inertia < 0.0
            || self.penalty_rate < 0.0
            || self.recovery_speed < 0.0
            || self.stability_decay < 0.0
            || self.safe_margin < 0.0
            || self.target_padding < 0.0
        {
            return invalid("rates, margins and padding must be non-negative".to_string());
        }
        if self.hazard_size.x < 0.0 || self.hazard_size.y < 0.0 {
            return invalid("hazard_size must be non-negative".to_string());
        }
        Ok(())
    }

    pub fn side(&self, side: Side) -> &SideConfig {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

/// Stage configs indexed by chapter (chapter 1 = first entry)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageTable {
    pub stages: Vec<StageConfig>,
}

impl StageTable {
    pub fn new(stages: Vec<StageConfig>) -> Self {
        Self { stages }
    }

    /// Built-in chapter progression
    ///
    /// Chapter 1 is the plain tutorial layout, chapter 2 adds inversion and
    /// interference, chapter 3 adds orbiting targets. Chapter 3 points get
    /// more force so they can keep pace with the orbit.
    pub fn builtin() -> Self {
        let chapter1 = StageConfig::default();

        let mut chapter2 = StageConfig {
            interference_strength: 0.3,
            penalty_rate: 3.0,
            stability_decay: 0.3,
            ..StageConfig::default()
        };
        chapter2.right.inverted = true;
        chapter2.left.hazard_count = 2;
        chapter2.right.hazard_count = 2;

        let mut chapter3 = StageConfig {
            interference_strength: 0.5,
            moving_target: true,
            target_move_speed: 0.4,
            target_orbit_radius: 30.0,
            target_tolerance: 0.8,
            target_padding: 80.0,
            penalty_rate: 4.0,
            overheat_threshold: 4.0,
            stability_threshold: 0.7,
            stability_decay: 0.35,
            ..StageConfig::default()
        };
        chapter3.left.inverted = true;
        chapter3.right.inverted = true;
        chapter3.left.hazard_count = 3;
        chapter3.right.hazard_count = 3;
        for side in [&mut chapter3.left, &mut chapter3.right] {
            side.move_force = 300.0;
            side.max_speed = 260.0;
        }

        Self::new(vec![chapter1, chapter2, chapter3])
    }

    /// Stage for a 1-based chapter, clamped into the table
    ///
    /// Chapters past the end reuse the last stage; chapter 0 maps to the
    /// first. `None` only when the table is empty.
    pub fn for_chapter(&self, chapter: u32) -> Option<&StageConfig> {
        if self.stages.is_empty() {
            return None;
        }
        let index = (chapter.saturating_sub(1) as usize).min(self.stages.len() - 1);
        self.stages.get(index)
    }

    /// Parse a table from JSON and validate every stage
    pub fn from_json(json: &str) -> Result<Self> {
        let table: StageTable = serde_json::from_str(json)?;
        for (i, stage) in table.stages.iter().enumerate() {
            stage.validate().map_err(|e| match e {
                TuningError::InvalidConfig(msg) => {
                    TuningError::InvalidConfig(format!("chapter {}: {msg}", i + 1))
                }
                other => other,
            })?;
        }
        log::info!("Loaded {} tuning stages", table.stages.len());
        Ok(table)
    }

    /// Read and parse a JSON table from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
