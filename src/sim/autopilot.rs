//! Idle/demo steering
//!
//! Produces key-style input that walks each point to its target and skirts
//! hazards. Leads orbiting targets and pre-compensates the cross-side
//! interference. Used by the headless runner; not meant to be optimal.

use glam::Vec2;

use super::bounds::Bounds;
use super::input::RawInput;
use super::state::{Side, SideState, TuningState};
use super::tick::orbit_offset;
use crate::stage::StageConfig;

/// Offsets smaller than this along an axis count as arrived
const ARRIVE_DEADZONE: f32 = 1.5;
/// Extra clearance kept around hazards
const HAZARD_CLEARANCE: f32 = 20.0;
/// How far ahead (seconds) to aim along a target's orbit
const ORBIT_LEAD: f32 = 0.1;

fn axis(delta: f32) -> f32 {
    if delta.abs() <= ARRIVE_DEADZONE {
        0.0
    } else {
        delta.signum()
    }
}

/// Where the point should head for: the target center, or a little ahead
/// on its orbit
fn aim_point(side: Side, state: &TuningState, config: &StageConfig) -> Option<Vec2> {
    let target = state.side(side).target?;
    if !config.moving_target {
        return Some(target.center);
    }
    let t = (state.elapsed + ORBIT_LEAD) * config.target_move_speed;
    Some(target.base + orbit_offset(side, t) * config.target_orbit_radius)
}

/// Desired effective direction for one side, before inversion
fn desired_direction(side: &SideState, aim: Option<Vec2>) -> Vec2 {
    let Some(aim) = aim else {
        return Vec2::ZERO;
    };
    let pos = side.point.pos;
    let to_target = aim - pos;
    let mut dir = Vec2::new(axis(to_target.x), axis(to_target.y));

    // Inside a hazard's clearance box: stop pushing inward on the shallow
    // axis and slide along the other one until clear. Skipped when the aim
    // itself sits in the box, as an orbit can graze its corner.
    let near = side.hazards.iter().find(|h| {
        let clearance = Bounds::centered(h.center, h.size + Vec2::splat(HAZARD_CLEARANCE * 2.0));
        clearance.contains(pos) && !clearance.contains(aim)
    });
    if let Some(hazard) = near {
        let offset = pos - hazard.center;
        let depth = hazard.size * 0.5 + HAZARD_CLEARANCE - offset.abs();
        let slide = |toward: f32, off: f32| {
            if toward != 0.0 {
                toward
            } else if off >= 0.0 {
                1.0
            } else {
                -1.0
            }
        };
        if depth.x < depth.y {
            dir.x = if dir.x * offset.x < 0.0 { 0.0 } else { dir.x };
            dir.y = slide(dir.y, offset.y);
        } else {
            dir.y = if dir.y * offset.y < 0.0 { 0.0 } else { dir.y };
            dir.x = slide(dir.x, offset.x);
        }
    }

    dir.normalize_or_zero()
}

/// Input direction that, after the other side's interference, still pushes
/// along `own`
///
/// A side that wants to hold still gets no input; its feedback loop corrects
/// whatever push it receives.
fn compensate(own: Vec2, other: Vec2, interference: f32) -> Vec2 {
    if own == Vec2::ZERO {
        return Vec2::ZERO;
    }
    (own + other * interference).normalize_or_zero()
}

/// Input that drives both points toward their targets
pub fn steer(state: &TuningState, config: &StageConfig) -> RawInput {
    let [left, right] = Side::BOTH
        .map(|side| desired_direction(state.side(side), aim_point(side, state, config)));
    let k = config.interference_strength;
    let left_input = compensate(left, right, k);
    let right_input = compensate(right, left, k);

    let raw = |side: Side, v: Vec2| if config.side(side).inverted { -v } else { v };
    RawInput::new(raw(Side::Left, left_input), raw(Side::Right, right_input))
}
