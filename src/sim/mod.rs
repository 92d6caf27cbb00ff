//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies beyond the sprite masks

pub mod collision;
pub mod context;
pub mod motion;
pub mod particles;
pub mod player_state;
pub mod spec;
pub mod state;
pub mod tick;

pub use collision::{CollisionEvent, CollisionResult, Mask, Rect, rects_overlap, resolve};
pub use context::{Context, ContextValue, keys};
pub use motion::{BoundaryPolicy, Controls, advance, apply_boundary, hyperspace};
pub use particles::{Particle, ParticleKind, ParticleSystem};
pub use player_state::{PlayerMachine, PlayerState, StateTag};
pub use spec::{ShipKind, ShipSpec, SpecCatalog};
pub use state::{Arena, EntityState, PlayerId, Projectile, RoundOutcome, RoundPhase, Ship, Supply};
pub use tick::{PlayerInput, TickInput, tick};
