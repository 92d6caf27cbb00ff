//! Game tuning loaded from JSON
//!
//! Every section falls back to its defaults, so a config file only needs the
//! values it wants to change.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Bounds;
use crate::sim::spec::{ShipKind, ShipSpec};

/// Error raised while loading or validating a [`GameConfig`]
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid { field, reason } => write!(f, "invalid config value `{field}`: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Ship catalog and the kind each player flies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipsConfig {
    pub catalog: BTreeMap<ShipKind, ShipSpec>,
    pub player_one: ShipKind,
    pub player_two: ShipKind,
}

impl Default for ShipsConfig {
    fn default() -> Self {
        let mut catalog = BTreeMap::new();
        catalog.insert(ShipKind::Needle, ShipSpec::needle());
        catalog.insert(ShipKind::Wedge, ShipSpec::wedge());
        Self {
            catalog,
            player_one: ShipKind::Needle,
            player_two: ShipKind::Wedge,
        }
    }
}

/// Projectile tuning shared by both players
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Seconds before an in-flight projectile expires
    pub lifetime: f32,
    /// Damage is rolled uniformly in `[damage_min, damage_max]` at spawn
    pub damage_min: f32,
    pub damage_max: f32,
    /// Spawn distance ahead of the ship center
    pub muzzle_offset: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            lifetime: 2.0,
            damage_min: 10.0,
            damage_max: 20.0,
            muzzle_offset: 24.0,
        }
    }
}

/// Health supply (power-up) tuning
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplyTuning {
    /// Chance per tick of spawning a supply while none is on screen
    pub spawn_probability: f32,
    pub base_heal: f32,
    /// Heal amount jitter, integer units either side of `base_heal`
    pub heal_jitter: u32,
    pub lifetime_ms: f32,
    pub lifetime_jitter_ms: f32,
    /// Minimum distance from any screen edge at spawn
    pub margin: f32,
}

impl Default for SupplyTuning {
    fn default() -> Self {
        Self {
            spawn_probability: 0.002,
            base_heal: 30.0,
            heal_jitter: 10,
            lifetime_ms: 5000.0,
            lifetime_jitter_ms: 2000.0,
            margin: 50.0,
        }
    }
}

/// Ship-vs-ship and state-machine timing
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Damage each ship takes when two ships collide
    pub ram_damage: f32,
    /// Invulnerable window after a hyperspace jump (seconds)
    pub hyperspace_duration: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            ram_damage: 25.0,
            hyperspace_duration: 1.0,
        }
    }
}

/// Particle effect tuning (visual only)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleTuning {
    pub max_particles: usize,
    pub thrust_per_tick: u32,
    pub hit_burst: u32,
    pub explosion_burst: u32,
    /// Jitter speed range added around the emission bias
    pub speed_min: f32,
    pub speed_max: f32,
    /// Time-to-live range (seconds)
    pub ttl_min: f32,
    pub ttl_max: f32,
    /// Exhaust speed relative to the ship
    pub exhaust_speed: f32,
}

impl Default for ParticleTuning {
    fn default() -> Self {
        Self {
            max_particles: 500,
            thrust_per_tick: 2,
            hit_burst: 24,
            explosion_burst: 100,
            speed_min: 10.0,
            speed_max: 80.0,
            ttl_min: 0.3,
            ttl_max: 1.2,
            exhaust_speed: 60.0,
        }
    }
}

/// Round lifecycle timing
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundTuning {
    /// Seconds the arena keeps animating effects after the round ends
    pub over_hold: f32,
}

impl Default for RoundTuning {
    fn default() -> Self {
        Self { over_hold: 3.0 }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub screen: Bounds,
    pub ships: ShipsConfig,
    pub projectile: ProjectileTuning,
    pub supply: SupplyTuning,
    pub combat: CombatTuning,
    pub particles: ParticleTuning,
    pub round: RoundTuning,
}

impl GameConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.screen.width > 0.0 && self.screen.height > 0.0) {
            return Err(invalid("screen", "width and height must be positive"));
        }

        for kind in [self.ships.player_one, self.ships.player_two] {
            if !self.ships.catalog.contains_key(&kind) {
                return Err(invalid("ships.catalog", format!("no spec for ship kind {kind:?}")));
            }
        }
        for (kind, spec) in &self.ships.catalog {
            spec.validate()
                .map_err(|reason| invalid("ships.catalog", format!("{kind:?}: {reason}")))?;
        }

        let p = &self.projectile;
        if p.lifetime <= 0.0 {
            return Err(invalid("projectile.lifetime", "must be positive"));
        }
        if p.damage_min < 0.0 || p.damage_min > p.damage_max {
            return Err(invalid("projectile.damage_min", "must be within 0..=damage_max"));
        }

        let s = &self.supply;
        if !(0.0..=1.0).contains(&s.spawn_probability) {
            return Err(invalid("supply.spawn_probability", "must be within 0..=1"));
        }
        if s.margin < 0.0 || s.margin * 2.0 >= self.screen.width.min(self.screen.height) {
            return Err(invalid("supply.margin", "leaves no room on screen"));
        }
        if s.heal_jitter > i32::MAX as u32 {
            return Err(invalid("supply.heal_jitter", "too large"));
        }
        if s.lifetime_ms <= 0.0 || s.lifetime_jitter_ms < 0.0 {
            return Err(invalid("supply.lifetime_ms", "must be positive"));
        }

        if self.combat.ram_damage < 0.0 {
            return Err(invalid("combat.ram_damage", "must not be negative"));
        }
        if self.combat.hyperspace_duration < 0.0 {
            return Err(invalid("combat.hyperspace_duration", "must not be negative"));
        }

        let fx = &self.particles;
        if fx.ttl_min <= 0.0 || fx.ttl_min > fx.ttl_max {
            return Err(invalid("particles.ttl_min", "must be within (0, ttl_max]"));
        }
        if fx.speed_min < 0.0 || fx.speed_min > fx.speed_max {
            return Err(invalid("particles.speed_min", "must be within 0..=speed_max"));
        }

        if self.round.over_hold < 0.0 {
            return Err(invalid("round.over_hold", "must not be negative"));
        }

        Ok(())
    }
}
