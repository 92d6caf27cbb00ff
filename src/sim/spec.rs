//! Immutable per-ship-type tunables
//!
//! A [`ShipSpec`] is created once when the catalog loads and is shared by
//! reference between every ship of that kind. Ships differ only by the
//! numbers in their spec, never by type.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::ShipsConfig;

/// Hull designs available to players
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipKind {
    /// Fast and fragile
    Needle,
    /// Heavier hull, quicker thrust, weaker shield
    Wedge,
}

/// Tunables for one ship kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipSpec {
    /// Speed cap (px/s)
    pub max_speed: f32,
    /// Thrust acceleration (px/s²)
    pub thrust_accel: f32,
    /// Turn rate (rad/s)
    pub rotation_rate: f32,
    /// Minimum time between shots
    pub fire_cooldown_ms: f32,
    pub max_health: f32,
    pub max_shield: f32,
    /// Muzzle speed added to the ship's own velocity (px/s)
    pub projectile_speed: f32,
    /// Minimum time between hyperspace jumps
    pub hyperspace_cooldown_ms: f32,
    /// Shield units burned per second while raised
    pub shield_drain_rate: f32,
}

impl ShipSpec {
    pub fn needle() -> Self {
        Self {
            max_speed: 300.0,
            thrust_accel: 200.0,
            rotation_rate: 3.5,
            fire_cooldown_ms: 250.0,
            max_health: 100.0,
            max_shield: 100.0,
            projectile_speed: 400.0,
            hyperspace_cooldown_ms: 3000.0,
            shield_drain_rate: 25.0,
        }
    }

    pub fn wedge() -> Self {
        Self {
            max_speed: 260.0,
            thrust_accel: 240.0,
            rotation_rate: 3.0,
            fire_cooldown_ms: 300.0,
            max_health: 120.0,
            max_shield: 80.0,
            projectile_speed: 380.0,
            hyperspace_cooldown_ms: 2500.0,
            shield_drain_rate: 20.0,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.max_speed <= 0.0 || self.projectile_speed <= 0.0 {
            return Err("speeds must be positive".into());
        }
        if self.thrust_accel < 0.0 || self.rotation_rate < 0.0 {
            return Err("thrust and rotation must not be negative".into());
        }
        if self.max_health <= 0.0 || self.max_shield < 0.0 {
            return Err("max_health must be positive and max_shield non-negative".into());
        }
        if self.fire_cooldown_ms < 0.0 || self.hyperspace_cooldown_ms < 0.0 || self.shield_drain_rate < 0.0 {
            return Err("cooldowns and drain rate must not be negative".into());
        }
        Ok(())
    }
}

/// Read-only registry of shared ship specs
#[derive(Debug, Clone, Default)]
pub struct SpecCatalog {
    specs: BTreeMap<ShipKind, Arc<ShipSpec>>,
}

impl SpecCatalog {
    pub fn from_config(ships: &ShipsConfig) -> Self {
        let specs = ships
            .catalog
            .iter()
            .map(|(kind, spec)| (*kind, Arc::new(spec.clone())))
            .collect();
        Self { specs }
    }

    /// Shared handle to the spec for `kind`
    pub fn get(&self, kind: ShipKind) -> Option<Arc<ShipSpec>> {
        self.specs.get(&kind).cloned()
    }

    pub fn kinds(&self) -> impl Iterator<Item = ShipKind> + '_ {
        self.specs.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
