//! Rigid-body motion for ships, projectiles and supplies
//!
//! Newtonian drift: thrust adds velocity along the heading, nothing takes it
//! away except the speed cap. Ships wrap around the screen edges;
//! projectiles die the moment they leave it.

use glam::Vec2;
use rand::Rng;

use super::spec::ShipSpec;
use super::state::EntityState;
use crate::{Bounds, clamp_speed, heading_vector, normalize_heading};

/// What to do with an entity that crosses the screen edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryPolicy {
    /// Re-enter from the opposite edge, velocity unchanged
    Wrap,
    /// Mark the entity dead
    Destroy,
}

/// Steering for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Controls {
    pub thrust: bool,
    /// -1 (counter-clockwise), 0, or 1 (clockwise)
    pub turn: f32,
}

/// Advance a ship by `dt` seconds
///
/// Applies rotation and thrust, clamps speed to `spec.max_speed`, moves the
/// ship and counts down its weapon and hyperspace cooldowns. Boundary policy
/// is applied separately by [`apply_boundary`].
pub fn advance(entity: &mut EntityState, spec: &ShipSpec, controls: Controls, dt: f32) {
    debug_assert!(dt.is_finite() && dt >= 0.0, "dt must be finite and non-negative");

    let turn = controls.turn.clamp(-1.0, 1.0);
    if turn != 0.0 {
        entity.heading = normalize_heading(entity.heading + spec.rotation_rate * dt * turn);
    }

    if controls.thrust {
        let accel = heading_vector(entity.heading) * spec.thrust_accel;
        entity.velocity += accel * dt;
    }
    entity.velocity = clamp_speed(entity.velocity, spec.max_speed);

    integrate(entity, dt);
    tick_cooldowns(entity, dt);
}

/// position += velocity·dt
#[inline]
pub fn integrate(entity: &mut EntityState, dt: f32) {
    entity.position += entity.velocity * dt;
}

/// Count weapon and jump cooldowns down toward zero
pub fn tick_cooldowns(entity: &mut EntityState, dt: f32) {
    let ms = dt * 1000.0;
    entity.cooldown_remaining_ms = (entity.cooldown_remaining_ms - ms).max(0.0);
    entity.hyperspace_cooldown_ms = (entity.hyperspace_cooldown_ms - ms).max(0.0);
}

/// Enforce the screen edge after integration
pub fn apply_boundary(entity: &mut EntityState, policy: BoundaryPolicy, bounds: Bounds) {
    match policy {
        BoundaryPolicy::Wrap => entity.position = bounds.wrap(entity.position),
        BoundaryPolicy::Destroy => {
            if !bounds.contains(entity.position) {
                entity.alive = false;
            }
        }
    }
}

/// Spawn position and velocity of a shot fired from `ship`
///
/// The shot inherits the ship's momentum.
pub fn muzzle(ship: &EntityState, spec: &ShipSpec, muzzle_offset: f32) -> (Vec2, Vec2) {
    let dir = heading_vector(ship.heading);
    let position = ship.position + dir * muzzle_offset;
    let velocity = ship.velocity + dir * spec.projectile_speed;
    (position, velocity)
}

/// Fire if the weapon is ready
///
/// Returns the spawn position and velocity of the new shot and resets the
/// cooldown; returns `None` while cooling down.
pub fn try_fire(ship: &mut EntityState, spec: &ShipSpec, muzzle_offset: f32) -> Option<(Vec2, Vec2)> {
    if ship.cooldown_remaining_ms > 0.0 {
        return None;
    }
    ship.cooldown_remaining_ms = spec.fire_cooldown_ms;
    Some(muzzle(ship, spec, muzzle_offset))
}

/// Teleport to a uniformly random point on screen, keeping velocity
pub fn hyperspace<R: Rng + ?Sized>(entity: &mut EntityState, bounds: Bounds, rng: &mut R) {
    let x = rng.random_range(0.0..bounds.width);
    let y = rng.random_range(0.0..bounds.height);
    entity.position = bounds.wrap(Vec2::new(x, y));
}
