//! Fixed timestep simulation tick
//!
//! Core game loop that advances the arena deterministically. Each tick runs
//! its phases in a fixed order: player states, motion, collisions,
//! particles, cleanup.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{self, CollisionEvent};
use super::context::keys;
use super::motion::{self, BoundaryPolicy, Controls};
use super::player_state::{PlayerState, StateTag};
use super::state::{Arena, EntityState, PlayerId, Projectile, RoundOutcome, RoundPhase, Supply};
use crate::platform::InputSource;
use crate::render::SpriteSource;

/// One player's controls for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub thrust: bool,
    /// -1 (counter-clockwise), 0, or 1 (clockwise)
    pub rotate_dir: i8,
    pub fire: bool,
    pub hyperspace: bool,
    /// Held to keep the shield raised
    pub shield: bool,
    /// Emergency brake: zero the velocity
    pub stop: bool,
}

impl PlayerInput {
    pub fn turn(&self) -> f32 {
        self.rotate_dir.signum() as f32
    }
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub players: [PlayerInput; 2],
}

impl TickInput {
    pub fn new(one: PlayerInput, two: PlayerInput) -> Self {
        Self { players: [one, two] }
    }

    /// Sample both players from an input collaborator
    pub fn poll<S: InputSource + ?Sized>(source: &mut S) -> Self {
        Self::new(source.poll(PlayerId::One), source.poll(PlayerId::Two))
    }

    pub fn player(&self, id: PlayerId) -> &PlayerInput {
        &self.players[id.index()]
    }
}

/// Advance the arena by one fixed timestep
pub fn tick<S: SpriteSource + ?Sized>(arena: &mut Arena, input: &TickInput, dt: f32, sprites: &mut S) {
    debug_assert!(dt.is_finite() && dt >= 0.0, "dt must be finite and non-negative");

    match arena.phase {
        RoundPhase::Finished | RoundPhase::Aborted => return,
        RoundPhase::Over { hold_remaining } => {
            // Only effects animate while the result is on screen
            arena.time_ticks += 1;
            arena.particles.update(dt);
            let hold_remaining = hold_remaining - dt;
            if hold_remaining <= 0.0 {
                arena.phase = RoundPhase::Finished;
                log::info!("Round {} finished", arena.round);
            } else {
                arena.phase = RoundPhase::Over { hold_remaining };
            }
            return;
        }
        RoundPhase::Playing => {}
    }

    arena.time_ticks += 1;
    arena.elapsed += dt;
    arena.context.set(keys::ELAPSED, arena.elapsed);

    update_player_states(arena, input, dt);
    move_ships(arena, input, dt);
    move_projectiles(arena, dt);
    fire_weapons(arena, input);
    update_supplies(arena, dt);

    let events = collision::run(
        &mut arena.ships,
        &mut arena.projectiles,
        &mut arena.supplies,
        &mut arena.contacts,
        sprites,
        arena.config.combat.ram_damage,
    );
    apply_collision_events(arena, &events);
    settle_destroyed(arena);

    arena.particles.update(dt);

    // Cleanup: remove dead projectiles and supplies; wrecks stay for the round
    arena.projectiles.retain(|p| p.body.alive);
    arena.supplies.retain(|s| s.body.alive);
    arena.normalize_order();

    if arena.context.round_over() {
        arena.phase = RoundPhase::Over {
            hold_remaining: arena.config.round.over_hold,
        };
        match arena.outcome() {
            Some(RoundOutcome::Winner(id)) => log::info!("Round {}: {} wins", arena.round, id),
            _ => log::info!("Round {}: draw", arena.round),
        }
    }
}

fn update_player_states(arena: &mut Arena, input: &TickInput, dt: f32) {
    let bounds = arena.bounds();
    let duration = arena.config.combat.hyperspace_duration;
    let mut ctx = std::mem::take(&mut arena.context);
    for ship in &mut arena.ships {
        let controls = input.player(ship.id);
        let (machine, mut pilot) = ship.split(&mut arena.rng, bounds, duration);
        ctx = machine.update(&mut pilot, dt, controls, ctx);
    }
    arena.context = ctx;
}

fn move_ships(arena: &mut Arena, input: &TickInput, dt: f32) {
    let bounds = arena.bounds();
    for ship in &mut arena.ships {
        if !ship.in_play() {
            continue;
        }
        let controls = input.player(ship.id);
        if controls.stop && matches!(ship.state(), StateTag::Alive | StateTag::Shielded) {
            ship.body.velocity = Vec2::ZERO;
        }
        motion::advance(
            &mut ship.body,
            &ship.spec,
            Controls {
                thrust: controls.thrust,
                turn: controls.turn(),
            },
            dt,
        );
        motion::apply_boundary(&mut ship.body, BoundaryPolicy::Wrap, bounds);

        if controls.thrust {
            arena
                .particles
                .thrust(ship.body.position, ship.body.heading, ship.body.velocity);
        }
    }
}

fn move_projectiles(arena: &mut Arena, dt: f32) {
    let bounds = arena.bounds();
    for shot in &mut arena.projectiles {
        motion::integrate(&mut shot.body, dt);
        motion::apply_boundary(&mut shot.body, BoundaryPolicy::Destroy, bounds);
        shot.body.expire(dt);
    }
}

fn fire_weapons(arena: &mut Arena, input: &TickInput) {
    let tuning = arena.config.projectile;
    let mut shots = Vec::new();
    for ship in &mut arena.ships {
        if !input.player(ship.id).fire || !ship.in_play() || !ship.state().can_fire() {
            continue;
        }
        if let Some((position, velocity)) = motion::try_fire(&mut ship.body, &ship.spec, tuning.muzzle_offset) {
            shots.push((ship.id, position, velocity));
        }
    }

    for (owner, position, velocity) in shots {
        let damage = arena.rng.random_range(tuning.damage_min..=tuning.damage_max);
        let id = arena.next_entity_id();
        log::trace!("{} fired shot {} ({:.0} dmg)", owner, id, damage);
        arena.projectiles.push(Projectile {
            id,
            owner,
            body: EntityState::expiring(position, velocity, tuning.lifetime),
            damage,
        });
    }
}

fn update_supplies(arena: &mut Arena, dt: f32) {
    for supply in &mut arena.supplies {
        supply.body.expire(dt);
        if !supply.body.alive {
            log::debug!("Supply {} expired", supply.id);
        }
    }

    if arena.supplies.iter().any(|s| s.body.alive) {
        return;
    }

    let tuning = arena.config.supply;
    let roll: f32 = arena.rng.random();
    if roll >= tuning.spawn_probability {
        return;
    }

    let bounds = arena.bounds();
    let x = arena.rng.random_range(tuning.margin..=bounds.width - tuning.margin);
    let y = arena.rng.random_range(tuning.margin..=bounds.height - tuning.margin);
    let jitter = i32::try_from(tuning.heal_jitter).unwrap_or(i32::MAX);
    let heal_amount = (tuning.base_heal + arena.rng.random_range(-jitter..=jitter) as f32).max(0.0);
    let lifetime_ms = tuning.lifetime_ms + arena.rng.random_range(0.0..=tuning.lifetime_jitter_ms);

    let id = arena.next_entity_id();
    log::debug!("Supply {} spawned at ({:.0}, {:.0}) healing {:.0}", id, x, y, heal_amount);
    arena.supplies.push(Supply {
        id,
        body: EntityState::expiring(Vec2::new(x, y), Vec2::ZERO, lifetime_ms / 1000.0),
        heal_amount,
    });
}

fn apply_collision_events(arena: &mut Arena, events: &[CollisionEvent]) {
    for event in events {
        match *event {
            CollisionEvent::ShipHit {
                victim,
                attacker,
                point,
                ..
            } => {
                arena.context.set(keys::LAST_HIT_ATTACKER, attacker);
                arena.context.set(keys::LAST_HIT_VICTIM, victim);
                arena.particles.spark(point);
            }
            CollisionEvent::Ram { a, b, point } => {
                // A wrecked hull is recorded last so the context names who rammed it
                let mut hits = [(b, a), (a, b)];
                hits.sort_by_key(|(victim, _)| arena.ship(*victim).is_some_and(|s| s.body.is_wrecked()));
                for (victim, attacker) in hits {
                    arena.context.set(keys::LAST_HIT_ATTACKER, attacker);
                    arena.context.set(keys::LAST_HIT_VICTIM, victim);
                }
                arena.particles.spark(point);
            }
            CollisionEvent::SupplyConsumed { .. } => {}
        }
    }
}

/// Move wrecked ships to Destroyed, then everyone still flying to RoundOver
fn settle_destroyed(arena: &mut Arena) {
    let bounds = arena.bounds();
    let duration = arena.config.combat.hyperspace_duration;
    let mut ctx = std::mem::take(&mut arena.context);

    for ship in &mut arena.ships {
        if !ship.in_play() || !ship.body.is_wrecked() {
            continue;
        }
        arena.particles.explosion(ship.body.position);
        let (machine, mut pilot) = ship.split(&mut arena.rng, bounds, duration);
        ctx = machine.transition(&mut pilot, PlayerState::Destroyed, ctx);
    }

    if ctx.round_over() {
        for ship in &mut arena.ships {
            if ship.state().in_play() {
                let (machine, mut pilot) = ship.split(&mut arena.rng, bounds, duration);
                ctx = machine.transition(&mut pilot, PlayerState::RoundOver, ctx);
            }
        }
    }

    arena.context = ctx;
}
