//! Per-player state machine
//!
//! States form a closed set. Each exposes `enter`, `update` and `exit`; the
//! round [`Context`] is moved through every call and handed back, so a value
//! written during one state's `update` or `exit` is visible to the next
//! state's `enter` within the same tick.
//!
//! ```text
//! Alive ──jump──▶ Hyperspacing ──timer──▶ Alive
//! Alive ──shield─▶ Shielded ──empty/released──▶ Alive
//! Alive/Shielded/Hyperspacing ──health 0──▶ Destroyed ──▶ RoundOver
//! any in-play state ──opponent destroyed──▶ RoundOver
//! ```
//!
//! Requests that make no sense (shield with an empty tank, jumping while the
//! drive cools down, reviving a wreck) are ignored, not reported.

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::context::{Context, keys};
use super::motion;
use super::spec::ShipSpec;
use super::state::{EntityState, PlayerId};
use super::tick::PlayerInput;
use crate::Bounds;

/// Discriminant of a [`PlayerState`], cheap to compare and store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateTag {
    Alive,
    Hyperspacing,
    Shielded,
    Destroyed,
    RoundOver,
}

impl StateTag {
    /// Ship still flies, collides and can be hit
    pub fn in_play(self) -> bool {
        matches!(self, StateTag::Alive | StateTag::Hyperspacing | StateTag::Shielded)
    }

    pub fn can_fire(self) -> bool {
        matches!(self, StateTag::Alive | StateTag::Shielded)
    }

    /// Whether the machine accepts a move from `self` to `next`
    pub fn can_transition_to(self, next: StateTag) -> bool {
        use StateTag::*;
        match (self, next) {
            (Alive, Hyperspacing | Shielded | Destroyed | RoundOver) => true,
            (Hyperspacing, Alive | Destroyed | RoundOver) => true,
            (Shielded, Alive | Destroyed | RoundOver) => true,
            (Destroyed, RoundOver) => true,
            _ => false,
        }
    }

    /// States that hand over to their successor without waiting for a tick
    fn settles_immediately(self) -> bool {
        self == StateTag::Destroyed
    }
}

/// Everything a state may touch on its own ship
pub struct Pilot<'a> {
    pub id: PlayerId,
    pub spec: &'a ShipSpec,
    pub body: &'a mut EntityState,
    pub rng: &'a mut Pcg32,
    pub bounds: Bounds,
    /// Length of the post-jump invulnerable window (seconds)
    pub hyperspace_duration: f32,
}

/// A player's current state, with any state-private data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlayerState {
    Alive,
    Hyperspacing { remaining: f32 },
    Shielded,
    Destroyed,
    RoundOver,
}

impl PlayerState {
    pub fn tag(&self) -> StateTag {
        match self {
            PlayerState::Alive => StateTag::Alive,
            PlayerState::Hyperspacing { .. } => StateTag::Hyperspacing,
            PlayerState::Shielded => StateTag::Shielded,
            PlayerState::Destroyed => StateTag::Destroyed,
            PlayerState::RoundOver => StateTag::RoundOver,
        }
    }

    pub fn enter(&self, pilot: &mut Pilot<'_>, mut ctx: Context) -> Context {
        match self {
            PlayerState::Alive => {
                if let Some(left) = ctx.get_number(keys::SHIELD_LEFT) {
                    ctx.remove(keys::SHIELD_LEFT);
                    if left <= 0.0 {
                        ctx.set(keys::SHIELD_SPENT, pilot.id);
                        log::debug!("{} ran its shield dry", pilot.id);
                    }
                }
            }
            PlayerState::Hyperspacing { .. } => {
                motion::hyperspace(pilot.body, pilot.bounds, pilot.rng);
                pilot.body.hyperspace_cooldown_ms = pilot.spec.hyperspace_cooldown_ms;
                log::debug!(
                    "{} jumped to ({:.1}, {:.1})",
                    pilot.id,
                    pilot.body.position.x,
                    pilot.body.position.y
                );
            }
            PlayerState::Shielded => {
                log::debug!("{} raised shield ({:.1} left)", pilot.id, pilot.body.shield);
            }
            PlayerState::Destroyed => {
                pilot.body.alive = false;
                pilot.body.velocity = glam::Vec2::ZERO;
                match ctx.get_player(keys::DESTROYED) {
                    Some(other) if other != pilot.id => ctx.set(keys::DRAW, true),
                    Some(_) => {}
                    None => ctx.set(keys::DESTROYED, pilot.id),
                }
                log::info!("{} destroyed", pilot.id);
            }
            PlayerState::RoundOver => {
                ctx.set(keys::ROUND_OVER, true);
                if ctx.is_draw() {
                    ctx.remove(keys::WINNER);
                } else if let Some(destroyed) = ctx.get_player(keys::DESTROYED) {
                    ctx.set(keys::WINNER, destroyed.opponent());
                }
            }
        }
        ctx
    }

    /// Advance this state; returns the state to be in afterwards
    pub fn update(
        self,
        pilot: &mut Pilot<'_>,
        dt: f32,
        input: &PlayerInput,
        mut ctx: Context,
    ) -> (PlayerState, Context) {
        let next = match self {
            PlayerState::Alive => {
                if pilot.body.is_wrecked() {
                    PlayerState::Destroyed
                } else if input.hyperspace && pilot.body.hyperspace_cooldown_ms <= 0.0 {
                    PlayerState::Hyperspacing {
                        remaining: pilot.hyperspace_duration,
                    }
                } else if input.shield && pilot.body.shield > 0.0 {
                    PlayerState::Shielded
                } else {
                    PlayerState::Alive
                }
            }
            PlayerState::Hyperspacing { remaining } => {
                let remaining = remaining - dt;
                if pilot.body.is_wrecked() {
                    PlayerState::Destroyed
                } else if remaining <= 0.0 {
                    PlayerState::Alive
                } else {
                    PlayerState::Hyperspacing { remaining }
                }
            }
            PlayerState::Shielded => {
                pilot.body.drain_shield(pilot.spec.shield_drain_rate * dt);
                if pilot.body.is_wrecked() {
                    PlayerState::Destroyed
                } else if pilot.body.shield <= 0.0 || !input.shield {
                    ctx.set(keys::SHIELD_LEFT, pilot.body.shield);
                    PlayerState::Alive
                } else {
                    PlayerState::Shielded
                }
            }
            PlayerState::Destroyed => PlayerState::RoundOver,
            PlayerState::RoundOver => PlayerState::RoundOver,
        };
        (next, ctx)
    }

    pub fn exit(&self, pilot: &mut Pilot<'_>, ctx: Context) -> Context {
        match self {
            PlayerState::Shielded => {
                log::debug!("{} lowered shield ({:.1} left)", pilot.id, pilot.body.shield);
            }
            PlayerState::Hyperspacing { .. } => {
                log::trace!("{} left hyperspace", pilot.id);
            }
            _ => {}
        }
        ctx
    }
}

/// Holds one player's current state and drives its transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMachine {
    owner: PlayerId,
    state: PlayerState,
}

impl PlayerMachine {
    pub fn new(owner: PlayerId) -> Self {
        Self {
            owner,
            state: PlayerState::Alive,
        }
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn tag(&self) -> StateTag {
        self.state.tag()
    }

    /// Reset to Alive and run its `enter`
    pub fn start(&mut self, pilot: &mut Pilot<'_>, ctx: Context) -> Context {
        self.state = PlayerState::Alive;
        self.state.enter(pilot, ctx)
    }

    /// Run the current state's `update` and follow any transition it asks for
    pub fn update(&mut self, pilot: &mut Pilot<'_>, dt: f32, input: &PlayerInput, ctx: Context) -> Context {
        let (next, ctx) = self.state.update(pilot, dt, input, ctx);
        if next.tag() == self.state.tag() {
            self.state = next;
            ctx
        } else {
            self.transition(pilot, next, ctx)
        }
    }

    /// Move to `next` if the move is legal; illegal requests are dropped
    pub fn transition(&mut self, pilot: &mut Pilot<'_>, next: PlayerState, ctx: Context) -> Context {
        let from = self.state.tag();
        let to = next.tag();
        if !from.can_transition_to(to) {
            log::trace!("{}: ignoring {:?} -> {:?}", self.owner, from, to);
            return ctx;
        }

        let ctx = self.state.exit(pilot, ctx);
        self.state = next;
        let ctx = self.state.enter(pilot, ctx);
        log::debug!("{}: {:?} -> {:?}", self.owner, from, to);

        if to.settles_immediately() {
            self.update(pilot, 0.0, &PlayerInput::default(), ctx)
        } else {
            ctx
        }
    }
}
