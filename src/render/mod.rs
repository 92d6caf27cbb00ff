//! Render handoff
//!
//! The simulation never draws. After each tick it produces a flat list of
//! [`RenderCommand`]s naming sprites by semantic key; whatever backend the
//! host uses replays them through the [`Renderer`] trait.

pub mod sprites;

pub use sprites::{ANGLE_STEPS, ProceduralSprites, Sprite, SpriteKey, SpriteKind, SpriteSource, quantize_angle};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::particles::ParticleKind;
use crate::sim::state::{Arena, PlayerId};

/// HUD bar geometry
pub const BAR_WIDTH: f32 = 150.0;
pub const BAR_HEIGHT: f32 = 15.0;
const BAR_MARGIN: f32 = 10.0;
const BAR_GAP: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarKind {
    Health,
    Shield,
}

/// One draw call for the host renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    Sprite {
        key: SpriteKey,
        position: Vec2,
        rotation: f32,
    },
    Bar {
        player: PlayerId,
        kind: BarKind,
        value: f32,
        max: f32,
        /// Top-left corner
        position: Vec2,
    },
    Particle {
        position: Vec2,
        kind: ParticleKind,
        /// Remaining life in [0, 1], for fading
        life: f32,
    },
}

/// Render collaborator
pub trait Renderer {
    fn draw(&mut self, sprite: SpriteKey, position: Vec2, rotation: f32);
    fn draw_bar(&mut self, value: f32, max: f32, position: Vec2);
    fn draw_particle(&mut self, position: Vec2, kind: ParticleKind, life: f32);
}

/// Replay a command list onto a renderer, in order
pub fn submit<R: Renderer + ?Sized>(commands: &[RenderCommand], renderer: &mut R) {
    for command in commands {
        match *command {
            RenderCommand::Sprite {
                key,
                position,
                rotation,
            } => renderer.draw(key, position, rotation),
            RenderCommand::Bar {
                value, max, position, ..
            } => renderer.draw_bar(value, max, position),
            RenderCommand::Particle { position, kind, life } => renderer.draw_particle(position, kind, life),
        }
    }
}

/// Top-left of a player's HUD bar: player 1 on the left, player 2 on the right
fn bar_anchor(player: PlayerId, kind: BarKind, screen_width: f32) -> Vec2 {
    let x = match player {
        PlayerId::One => BAR_MARGIN,
        PlayerId::Two => screen_width - BAR_WIDTH - BAR_MARGIN,
    };
    let y = match kind {
        BarKind::Health => BAR_MARGIN,
        BarKind::Shield => BAR_MARGIN + BAR_HEIGHT + BAR_GAP,
    };
    Vec2::new(x, y)
}

/// Build the draw list for the arena's current state
///
/// Back to front: particles, supplies, projectiles, ships, HUD bars.
pub fn render_commands(arena: &Arena) -> Vec<RenderCommand> {
    let mut commands = Vec::with_capacity(arena.particles.len() + arena.projectiles.len() + 8);

    commands.extend(arena.particles.iter().map(|p| RenderCommand::Particle {
        position: p.position,
        kind: p.kind,
        life: p.life_fraction(),
    }));

    for supply in arena.supplies.iter().filter(|s| s.body.alive) {
        commands.push(RenderCommand::Sprite {
            key: SpriteKey::new(SpriteKind::Supply, 0.0),
            position: supply.body.position,
            rotation: 0.0,
        });
    }

    for shot in arena.projectiles.iter().filter(|p| p.body.alive) {
        commands.push(RenderCommand::Sprite {
            key: SpriteKey::new(SpriteKind::Projectile(shot.owner), shot.body.heading),
            position: shot.body.position,
            rotation: shot.body.heading,
        });
    }

    for ship in arena.ships.iter().filter(|s| s.body.alive) {
        commands.push(RenderCommand::Sprite {
            key: SpriteKey::new(SpriteKind::Ship(ship.kind), ship.body.heading),
            position: ship.body.position,
            rotation: ship.body.heading,
        });
    }

    let width = arena.bounds().width;
    for ship in &arena.ships {
        for (kind, value, max) in [
            (BarKind::Health, ship.body.health, ship.spec.max_health),
            (BarKind::Shield, ship.body.shield, ship.spec.max_shield),
        ] {
            commands.push(RenderCommand::Bar {
                player: ship.id,
                kind,
                value,
                max,
                position: bar_anchor(ship.id, kind, width),
            });
        }
    }

    commands
}

impl Arena {
    /// Draw list for the current state; see [`render_commands`]
    pub fn render_commands(&self) -> Vec<RenderCommand> {
        render_commands(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;
    use crate::consts::SIM_DT;
    use crate::sim::tick::{PlayerInput, TickInput, tick};

    #[derive(Default)]
    struct Recorder {
        sprites: Vec<SpriteKey>,
        bars: Vec<(f32, f32, Vec2)>,
        particles: usize,
    }

    impl Renderer for Recorder {
        fn draw(&mut self, sprite: SpriteKey, _position: Vec2, _rotation: f32) {
            self.sprites.push(sprite);
        }

        fn draw_bar(&mut self, value: f32, max: f32, position: Vec2) {
            self.bars.push((value, max, position));
        }

        fn draw_particle(&mut self, _position: Vec2, _kind: ParticleKind, _life: f32) {
            self.particles += 1;
        }
    }

    #[test]
    fn test_fresh_arena_draws_ships_and_bars() {
        let arena = Arena::new(GameConfig::default(), 1).unwrap();
        let mut recorder = Recorder::default();
        submit(&arena.render_commands(), &mut recorder);

        assert_eq!(recorder.sprites.len(), 2);
        assert_eq!(recorder.sprites[0].kind, SpriteKind::Ship(arena.ships[0].kind));
        // Player 2 spawns facing left
        assert_eq!(recorder.sprites[1].step, ANGLE_STEPS / 2);
        assert_eq!(recorder.bars.len(), 4);
        assert_eq!(recorder.bars[0], (100.0, 100.0, Vec2::new(10.0, 10.0)));
        assert_eq!(recorder.bars[2].2, Vec2::new(800.0 - 160.0, 10.0));
        assert_eq!(recorder.particles, 0);
    }

    #[test]
    fn test_particles_drawn_first() {
        let mut config = GameConfig::default();
        config.supply.spawn_probability = 0.0;
        let mut arena = Arena::new(config, 1).unwrap();
        let mut sprites = ProceduralSprites::new();
        let input = TickInput::new(
            PlayerInput {
                thrust: true,
                fire: true,
                ..Default::default()
            },
            PlayerInput::default(),
        );
        tick(&mut arena, &input, SIM_DT, &mut sprites);

        let commands = arena.render_commands();
        let first_sprite = commands
            .iter()
            .position(|c| matches!(c, RenderCommand::Sprite { .. }))
            .unwrap();
        assert!(first_sprite > 0);
        assert!(commands[..first_sprite]
            .iter()
            .all(|c| matches!(c, RenderCommand::Particle { .. })));
        assert!(commands.iter().any(|c| matches!(
            c,
            RenderCommand::Sprite {
                key: SpriteKey {
                    kind: SpriteKind::Projectile(PlayerId::One),
                    ..
                },
                ..
            }
        )));
    }
}
