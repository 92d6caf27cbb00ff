//! Entity state and the arena that owns it
//!
//! All state that feeds the deterministic tick lives here.

use std::fmt;
use std::sync::Arc;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Contacts;
use super::context::{Context, keys};
use super::particles::ParticleSystem;
use super::player_state::{Pilot, PlayerMachine, StateTag};
use super::spec::{ShipKind, ShipSpec, SpecCatalog};
use crate::config::{ConfigError, GameConfig};
use crate::consts::SPAWN_INSET;
use crate::{Bounds, normalize_heading};

/// The two seats of a duel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    #[serde(rename = "player1")]
    One,
    #[serde(rename = "player2")]
    Two,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    pub fn index(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerId::One => f.write_str("player1"),
            PlayerId::Two => f.write_str("player2"),
        }
    }
}

/// Mutable runtime state of a ship, projectile or supply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Radians in [0, 2π)
    pub heading: f32,
    pub health: f32,
    pub shield: f32,
    pub cooldown_remaining_ms: f32,
    pub hyperspace_cooldown_ms: f32,
    /// Seconds left for expiring entities, `None` for ships
    pub time_to_live: Option<f32>,
    pub alive: bool,
}

impl EntityState {
    /// Fresh ship at full health and shield
    pub fn ship(position: Vec2, heading: f32, spec: &ShipSpec) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            heading: normalize_heading(heading),
            health: spec.max_health,
            shield: spec.max_shield,
            cooldown_remaining_ms: 0.0,
            hyperspace_cooldown_ms: 0.0,
            time_to_live: None,
            alive: true,
        }
    }

    /// Free-flying entity with a lifetime (projectiles, supplies)
    pub fn expiring(position: Vec2, velocity: Vec2, time_to_live: f32) -> Self {
        Self {
            position,
            velocity,
            heading: normalize_heading(velocity.y.atan2(velocity.x)),
            health: 0.0,
            shield: 0.0,
            cooldown_remaining_ms: 0.0,
            hyperspace_cooldown_ms: 0.0,
            time_to_live: Some(time_to_live),
            alive: true,
        }
    }

    /// Apply damage, shield first
    ///
    /// Any charge left in the shield soaks the whole hit, whether or not the
    /// shield is raised; excess past zero shield is discarded rather than
    /// carried into health.
    pub fn apply_damage(&mut self, damage: f32) {
        let damage = damage.max(0.0);
        if self.shield > 0.0 {
            self.shield = (self.shield - damage).max(0.0);
        } else {
            self.health = (self.health - damage).max(0.0);
        }
    }

    /// Restore health without exceeding `max_health`
    pub fn heal(&mut self, amount: f32, max_health: f32) {
        self.health = (self.health + amount.max(0.0)).min(max_health);
    }

    /// Burn shield; never replenished
    pub fn drain_shield(&mut self, amount: f32) {
        self.shield = (self.shield - amount.max(0.0)).max(0.0);
    }

    pub fn is_wrecked(&self) -> bool {
        self.health <= 0.0
    }

    /// Count down the lifetime, marking the entity dead when it runs out
    pub fn expire(&mut self, dt: f32) {
        if let Some(ttl) = self.time_to_live.as_mut() {
            *ttl -= dt;
            if *ttl <= 0.0 {
                self.alive = false;
            }
        }
    }
}

/// A player's ship: shared spec, owned state, current state machine
#[derive(Debug, Clone)]
pub struct Ship {
    pub id: PlayerId,
    pub kind: ShipKind,
    pub spec: Arc<ShipSpec>,
    pub body: EntityState,
    pub machine: PlayerMachine,
}

impl Ship {
    pub fn new(id: PlayerId, kind: ShipKind, spec: Arc<ShipSpec>, position: Vec2, heading: f32) -> Self {
        let body = EntityState::ship(position, heading, &spec);
        Self {
            id,
            kind,
            spec,
            body,
            machine: PlayerMachine::new(id),
        }
    }

    pub fn state(&self) -> StateTag {
        self.machine.tag()
    }

    pub fn invulnerable(&self) -> bool {
        self.state() == StateTag::Hyperspacing
    }

    /// Ships in play take part in motion and collisions
    pub fn in_play(&self) -> bool {
        self.body.alive && self.state().in_play()
    }

    /// Borrow the machine alongside a [`Pilot`] over the rest of the ship
    pub(crate) fn split<'a>(
        &'a mut self,
        rng: &'a mut Pcg32,
        bounds: Bounds,
        hyperspace_duration: f32,
    ) -> (&'a mut PlayerMachine, Pilot<'a>) {
        let Ship {
            id, spec, body, machine, ..
        } = self;
        let pilot = Pilot {
            id: *id,
            spec: &**spec,
            body,
            rng,
            bounds,
            hyperspace_duration,
        };
        (machine, pilot)
    }
}

/// A shot in flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub owner: PlayerId,
    pub body: EntityState,
    pub damage: f32,
}

/// A health pickup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supply {
    pub id: u32,
    pub body: EntityState,
    pub heal_amount: f32,
}

/// How the current round stands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Ships are flying
    Playing,
    /// Someone was destroyed; effects keep animating for `hold_remaining` seconds
    Over { hold_remaining: f32 },
    /// Hold expired, ready for `end_round`
    Finished,
    /// Cancelled between ticks
    Aborted,
}

/// Result of a finished round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Winner(PlayerId),
    Draw,
}

/// Owner of every entity collection and the round's context
#[derive(Debug, Clone)]
pub struct Arena {
    pub config: GameConfig,
    pub catalog: SpecCatalog,
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    /// Round number (1-based)
    pub round: u32,
    pub phase: RoundPhase,
    /// Simulated seconds since the round started
    pub elapsed: f32,
    /// Simulation tick counter for the round
    pub time_ticks: u64,
    /// Ships, sorted by id
    pub ships: Vec<Ship>,
    /// Projectiles, sorted by spawn id
    pub projectiles: Vec<Projectile>,
    pub supplies: Vec<Supply>,
    /// Visual particles (not gameplay-affecting)
    pub particles: ParticleSystem,
    /// Ship pairs touching as of the last tick
    pub(crate) contacts: Contacts,
    pub(crate) context: Context,
    next_id: u32,
}

impl Arena {
    /// Validate the config and start round 1
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let catalog = SpecCatalog::from_config(&config.ships);
        let particles = ParticleSystem::new(config.particles, seed);
        let mut arena = Self {
            config,
            catalog,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            round: 0,
            phase: RoundPhase::Aborted,
            elapsed: 0.0,
            time_ticks: 0,
            ships: Vec::new(),
            projectiles: Vec::new(),
            supplies: Vec::new(),
            particles,
            contacts: Contacts::new(),
            context: Context::new(),
            next_id: 1,
        };
        arena.start_round()?;
        Ok(arena)
    }

    pub fn bounds(&self) -> Bounds {
        self.config.screen
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Reset entities, open a fresh context and put both ships into play
    pub fn start_round(&mut self) -> Result<(), ConfigError> {
        let bounds = self.bounds();
        let mut ships = Vec::with_capacity(2);
        for id in PlayerId::ALL {
            let kind = match id {
                PlayerId::One => self.config.ships.player_one,
                PlayerId::Two => self.config.ships.player_two,
            };
            let spec = self.catalog.get(kind).ok_or_else(|| ConfigError::Invalid {
                field: "ships.catalog",
                reason: format!("no spec for ship kind {kind:?}"),
            })?;
            let (position, heading) = spawn_point(id, bounds);
            ships.push(Ship::new(id, kind, spec, position, heading));
        }

        self.round += 1;
        self.phase = RoundPhase::Playing;
        self.elapsed = 0.0;
        self.time_ticks = 0;
        self.ships = ships;
        self.projectiles.clear();
        self.supplies.clear();
        self.particles.clear();
        self.contacts.clear();

        let duration = self.config.combat.hyperspace_duration;
        let mut ctx = Context::new().with(keys::ROUND, self.round).with(keys::ELAPSED, 0.0_f32);
        for ship in &mut self.ships {
            let (machine, mut pilot) = ship.split(&mut self.rng, bounds, duration);
            ctx = machine.start(&mut pilot, ctx);
        }
        self.context = ctx;

        log::info!("Round {} started (seed {})", self.round, self.seed);
        Ok(())
    }

    /// Tear the round down and hand back its final context
    pub fn end_round(&mut self) -> Context {
        let ctx = std::mem::take(&mut self.context);
        log::info!("Round {} ended: {}", self.round, ctx);
        self.projectiles.clear();
        self.supplies.clear();
        self.particles.clear();
        if self.phase == RoundPhase::Playing {
            self.phase = RoundPhase::Aborted;
        } else if self.phase != RoundPhase::Aborted {
            self.phase = RoundPhase::Finished;
        }
        ctx
    }

    /// Cancel the round; takes effect before the next tick
    pub fn abort(&mut self) {
        if matches!(self.phase, RoundPhase::Playing | RoundPhase::Over { .. }) {
            log::info!("Round {} aborted", self.round);
            self.phase = RoundPhase::Aborted;
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn ship(&self, id: PlayerId) -> Option<&Ship> {
        self.ships.iter().find(|s| s.id == id)
    }

    pub fn ship_mut(&mut self, id: PlayerId) -> Option<&mut Ship> {
        self.ships.iter_mut().find(|s| s.id == id)
    }

    /// Winner or draw once the round is over
    pub fn outcome(&self) -> Option<RoundOutcome> {
        if !self.context.round_over() {
            return None;
        }
        Some(match self.context.winner() {
            Some(winner) => RoundOutcome::Winner(winner),
            None => RoundOutcome::Draw,
        })
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, RoundPhase::Finished | RoundPhase::Aborted)
    }

    /// Ensure collections are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.ships.sort_by_key(|s| s.id);
        self.projectiles.sort_by_key(|p| p.id);
        self.supplies.sort_by_key(|s| s.id);
    }
}

/// Starting pose for each seat: opposite corners, facing each other's side
pub fn spawn_point(id: PlayerId, bounds: Bounds) -> (Vec2, f32) {
    match id {
        PlayerId::One => (Vec2::new(SPAWN_INSET, SPAWN_INSET), 0.0),
        PlayerId::Two => (
            Vec2::new(bounds.width - SPAWN_INSET, bounds.height - SPAWN_INSET),
            std::f32::consts::PI,
        ),
    }
}
