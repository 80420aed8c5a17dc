//! Zone placement
//!
//! Targets are sampled uniformly inside padded bounds. Hazards are rejection
//! sampled so their centers keep a minimum distance from the target, the
//! start point and every zone already placed.

use glam::Vec2;
use rand::Rng;

use super::bounds::Bounds;
use super::state::{HazardZone, TargetZone};

/// Rejection sampling attempts before falling back
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 50;

/// Sample a point uniformly in `range`, tolerating degenerate axes
fn sample_in<R: Rng + ?Sized>(range: &Bounds, rng: &mut R) -> Vec2 {
    let axis = |min: f32, max: f32, rng: &mut R| {
        if max > min {
            rng.random_range(min..=max)
        } else {
            min
        }
    };
    let x = axis(range.min.x, range.max.x, rng);
    let y = axis(range.min.y, range.max.y, rng);
    Vec2::new(x, y)
}

/// Pick a target center uniformly inside `bounds` shrunk by `padding`
pub fn place_target<R: Rng + ?Sized>(bounds: &Bounds, padding: f32, rng: &mut R) -> Vec2 {
    sample_in(&bounds.shrink(Vec2::splat(padding)), rng)
}

/// True when `candidate` keeps `margin` from every point in `avoid`
fn clear_of(candidate: Vec2, margin: f32, avoid: impl IntoIterator<Item = Vec2>) -> bool {
    avoid
        .into_iter()
        .all(|p| candidate.distance(p) >= margin)
}

/// Rejection-sample a hazard center, `None` once the attempt cap is spent
pub fn try_place_hazard<R: Rng + ?Sized>(
    bounds: &Bounds,
    size: Vec2,
    target: Vec2,
    start: Vec2,
    safe_margin: f32,
    existing: &[Vec2],
    rng: &mut R,
) -> Option<Vec2> {
    let range = bounds.center_range(size);
    (0..MAX_PLACEMENT_ATTEMPTS)
        .map(|_| sample_in(&range, rng))
        .find(|&candidate| {
            clear_of(
                candidate,
                safe_margin,
                [target, start].into_iter().chain(existing.iter().copied()),
            )
        })
}

/// Deterministic placement used when sampling is exhausted
///
/// Offsets from the target by `safe_margin`, away from the origin (+X when
/// the target sits on it), then clamps so the rectangle stays in bounds.
/// The clamp can pull the hazard back inside the margin; the layout is
/// degraded but always playable and reproducible.
pub fn fallback_hazard(bounds: &Bounds, size: Vec2, target: Vec2, safe_margin: f32) -> Vec2 {
    let dir = target.try_normalize().unwrap_or(Vec2::X);
    bounds.center_range(size).clamp(target + dir * safe_margin)
}

/// Place one hazard; never fails
pub fn place_hazard<R: Rng + ?Sized>(
    bounds: &Bounds,
    size: Vec2,
    target: Vec2,
    start: Vec2,
    safe_margin: f32,
    existing: &[Vec2],
    rng: &mut R,
) -> Vec2 {
    match try_place_hazard(bounds, size, target, start, safe_margin, existing, rng) {
        Some(pos) => pos,
        None => {
            let pos = fallback_hazard(bounds, size, target, safe_margin);
            log::debug!(
                "Hazard placement exhausted after {} attempts, fallback at ({:.1}, {:.1})",
                MAX_PLACEMENT_ATTEMPTS,
                pos.x,
                pos.y
            );
            pos
        }
    }
}

/// Parameters for laying out one side
#[derive(Debug, Clone, Copy)]
pub struct LayoutSpec {
    pub bounds: Bounds,
    pub start: Vec2,
    /// Fixed target center; sampled when `None`
    pub fixed_target: Option<Vec2>,
    pub target_size: Vec2,
    pub target_padding: f32,
    pub hazard_size: Vec2,
    pub hazard_count: u32,
    pub safe_margin: f32,
}

/// Target first, then hazards, each hazard avoiding those placed before it
pub fn place_layout<R: Rng + ?Sized>(spec: &LayoutSpec, rng: &mut R) -> (TargetZone, Vec<HazardZone>) {
    let target_pos = spec
        .fixed_target
        .unwrap_or_else(|| place_target(&spec.bounds, spec.target_padding, rng));

    let mut placed: Vec<Vec2> = Vec::with_capacity(spec.hazard_count as usize);
    for _ in 0..spec.hazard_count {
        let pos = place_hazard(
            &spec.bounds,
            spec.hazard_size,
            target_pos,
            spec.start,
            spec.safe_margin,
            &placed,
            rng,
        );
        placed.push(pos);
    }

    let hazards = placed
        .into_iter()
        .map(|c| HazardZone::new(c, spec.hazard_size))
        .collect();
    (TargetZone::new(target_pos, spec.target_size), hazards)
}
