//! Fixed timestep simulation step
//!
//! One `step` advances a running session: integrate, move targets, score,
//! penalize, accumulate stability, then check for a terminal outcome.
//! Lifecycle handling (restart timing, events, sinks) is the controller's job.

use glam::Vec2;

use super::bounds::lerp_clamped;
use super::input::ControlInput;
use super::state::{ControlPoint, Side, SideState, TargetZone, TuningState};
use crate::consts::*;
use crate::stage::{SideConfig, StageConfig};

/// Terminal result of a step, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Success,
    Overheat,
}

/// Per-side changes worth reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Sides whose sync crossed into the lock range this step
    pub newly_locked: [bool; 2],
}

/// Advance a point's velocity and position by one step
pub fn integrate_point(point: &mut ControlPoint, drive: Vec2, side: &SideConfig, inertia: f32, dt: f32) {
    point.vel += drive * side.move_force * dt;
    point.vel = point.vel.lerp(Vec2::ZERO, (inertia * dt).clamp(0.0, 1.0));
    point.vel = point.vel.clamp_length_max(side.max_speed);
    point.pos = side.bounds.clamp(point.pos + point.vel * dt);
}

/// Orbit offset for a side's target at time `t` (already scaled by speed)
///
/// Each axis runs at its own frequency so the path never closes into a
/// simple circle.
pub fn orbit_offset(side: Side, t: f32) -> Vec2 {
    match side {
        Side::Left => Vec2::new(t.sin(), (t * 0.7).cos()),
        Side::Right => Vec2::new((t * 0.8).cos(), (t * 1.1).sin()),
    }
}

fn move_target(target: &mut TargetZone, side: Side, config: &StageConfig, elapsed: f32) {
    let t = elapsed * config.target_move_speed;
    target.center = target.base + orbit_offset(side, t) * config.target_orbit_radius;
}

/// Alignment score between a point and its target
///
/// `1 - clamp01(distance / (tolerance * TOLERANCE_SCALE))`. No target scores 0.
pub fn side_sync(point: Vec2, target: Option<&TargetZone>, tolerance: f32) -> f32 {
    let Some(target) = target else {
        return 0.0;
    };
    let radius = tolerance * TOLERANCE_SCALE;
    if radius <= 0.0 {
        return 0.0;
    }
    1.0 - (point.distance(target.center) / radius).clamp(0.0, 1.0)
}

fn score_side(side: &mut SideState, tolerance: f32) -> bool {
    side.sync = side_sync(side.point.pos, side.target.as_ref(), tolerance);
    let was_locked = side.locked;
    side.locked = side.sync > TARGET_LOCK_SYNC;
    side.locked && !was_locked
}

/// Inertia and overheat bookkeeping for one step
fn apply_penalty(state: &mut TuningState, config: &StageConfig, dt: f32) {
    state.left.in_hazard = state.left.in_any_hazard();
    state.right.in_hazard = state.right.in_any_hazard();

    if state.any_in_hazard() {
        state.inertia += config.penalty_rate * dt;
        state.overheat_timer = (state.overheat_timer + dt).min(config.overheat_threshold);
    } else {
        state.inertia = lerp_clamped(state.inertia, config.base_inertia, config.recovery_speed * dt);
        state.overheat_timer = (state.overheat_timer - dt * OVERHEAT_COOLDOWN_RATIO).max(0.0);
    }
}

fn accumulate_stability(state: &mut TuningState, config: &StageConfig, dt: f32) {
    if state.total_sync >= config.stability_threshold {
        state.stability += state.total_sync * dt;
    } else {
        state.stability -= config.stability_decay * dt;
    }
    state.stability = state.stability.clamp(0.0, 1.0);
}

/// Advance a running session by one fixed step
pub fn step(
    state: &mut TuningState,
    config: &StageConfig,
    control: &ControlInput,
    dt: f32,
) -> (StepOutcome, StepReport) {
    let mut report = StepReport::default();
    state.elapsed += dt;

    // Integration
    let inertia = state.inertia;
    integrate_point(&mut state.left.point, control.left_drive(), &config.left, inertia, dt);
    integrate_point(&mut state.right.point, control.right_drive(), &config.right, inertia, dt);

    // Target motion
    if config.moving_target {
        let elapsed = state.elapsed;
        for side in Side::BOTH {
            if let Some(target) = state.side_mut(side).target.as_mut() {
                move_target(target, side, config, elapsed);
            }
        }
    }

    // Sync scoring (AND-gate: both sides must align)
    report.newly_locked[0] = score_side(&mut state.left, config.target_tolerance);
    report.newly_locked[1] = score_side(&mut state.right, config.target_tolerance);
    state.total_sync = state.left.sync * state.right.sync;

    apply_penalty(state, config, dt);
    accumulate_stability(state, config, dt);

    // Success wins a tie with overheat
    let outcome = if state.stability >= 1.0 {
        StepOutcome::Success
    } else if state.overheat_timer >= config.overheat_threshold {
        StepOutcome::Overheat
    } else {
        StepOutcome::Continue
    };
    (outcome, report)
}
