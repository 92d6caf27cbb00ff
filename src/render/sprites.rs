//! Procedural sprite silhouettes and the rotated-sprite cache

use std::collections::HashMap;
use std::f32::consts::TAU;
use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::normalize_heading;
use crate::sim::collision::Mask;
use crate::sim::spec::ShipKind;
use crate::sim::state::PlayerId;

/// Orientations per full turn; rotated sprites are cached per step
pub const ANGLE_STEPS: u16 = 72;

/// What a sprite depicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpriteKind {
    Ship(ShipKind),
    /// Shots are tinted by owner
    Projectile(PlayerId),
    Supply,
}

/// Semantic cache key: kind plus quantized orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteKey {
    pub kind: SpriteKind,
    /// Index in `0..ANGLE_STEPS`
    pub step: u16,
}

impl SpriteKey {
    pub fn new(kind: SpriteKind, angle: f32) -> Self {
        Self {
            kind,
            step: quantize_angle(angle),
        }
    }

    /// Orientation the sprite was rasterized at
    pub fn angle(&self) -> f32 {
        self.step as f32 * TAU / ANGLE_STEPS as f32
    }
}

/// Nearest of the `ANGLE_STEPS` orientations
pub fn quantize_angle(angle: f32) -> u16 {
    let step = TAU / ANGLE_STEPS as f32;
    let index = (normalize_heading(angle) / step).round() as u32;
    (index % ANGLE_STEPS as u32) as u16
}

/// A rotated sprite: outline for drawing, mask for collisions
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub key: SpriteKey,
    /// Polygon vertices relative to the sprite center, already rotated
    pub outline: Vec<Vec2>,
    pub mask: Mask,
}

impl Sprite {
    pub fn size(&self) -> Vec2 {
        self.mask.size()
    }
}

/// Image/cache collaborator: hands out rotated sprites by semantic key
///
/// Implementations must return the same sprite for the same kind and
/// quantized angle.
pub trait SpriteSource {
    fn rotated_sprite(&mut self, kind: SpriteKind, angle: f32) -> Arc<Sprite>;
}

/// Rasterizes simple vector silhouettes on first use and memoizes them
#[derive(Debug, Default)]
pub struct ProceduralSprites {
    cache: HashMap<SpriteKey, Arc<Sprite>>,
}

impl ProceduralSprites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl SpriteSource for ProceduralSprites {
    fn rotated_sprite(&mut self, kind: SpriteKind, angle: f32) -> Arc<Sprite> {
        let key = SpriteKey::new(kind, angle);
        self.cache
            .entry(key)
            .or_insert_with(|| {
                log::trace!("Rasterizing {:?} at step {}", key.kind, key.step);
                Arc::new(rasterize(key))
            })
            .clone()
    }
}

/// Silhouette at heading 0 (nose along +x)
fn silhouette(kind: SpriteKind) -> Vec<Vec2> {
    match kind {
        SpriteKind::Ship(ShipKind::Needle) => vec![
            Vec2::new(14.0, 0.0),
            Vec2::new(-10.0, 8.0),
            Vec2::new(-10.0, -8.0),
        ],
        SpriteKind::Ship(ShipKind::Wedge) => vec![
            Vec2::new(12.0, 0.0),
            Vec2::new(-10.0, 11.0),
            Vec2::new(-6.0, 0.0),
            Vec2::new(-10.0, -11.0),
        ],
        SpriteKind::Projectile(_) => circle(2.5, 8),
        SpriteKind::Supply => {
            // Plus sign
            let (a, b) = (3.0, 8.0);
            vec![
                Vec2::new(a, -b),
                Vec2::new(a, -a),
                Vec2::new(b, -a),
                Vec2::new(b, a),
                Vec2::new(a, a),
                Vec2::new(a, b),
                Vec2::new(-a, b),
                Vec2::new(-a, a),
                Vec2::new(-b, a),
                Vec2::new(-b, -a),
                Vec2::new(-a, -a),
                Vec2::new(-a, -b),
            ]
        }
    }
}

fn circle(radius: f32, segments: u32) -> Vec<Vec2> {
    (0..segments)
        .map(|i| {
            let theta = i as f32 / segments as f32 * TAU;
            Vec2::new(radius * theta.cos(), radius * theta.sin())
        })
        .collect()
}

/// Even-odd point-in-polygon test
fn contains(polygon: &[Vec2], p: Vec2) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn rasterize(key: SpriteKey) -> Sprite {
    let base = silhouette(key.kind);
    let reach = base.iter().map(|v| v.length()).fold(0.0f32, f32::max);
    // Square canvas large enough for any rotation, even-sized so it centers
    let side = (reach.ceil() as usize).max(1) * 2;
    let half = side as f32 * 0.5;

    let rotation = Vec2::from_angle(key.angle());
    let outline: Vec<Vec2> = base.iter().map(|v| rotation.rotate(*v)).collect();

    let mask = Mask::from_fn(side, side, |x, y| {
        let p = Vec2::new(x as f32 + 0.5 - half, y as f32 + 0.5 - half);
        contains(&outline, p)
    });

    Sprite { key, outline, mask }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_quantize_wraps() {
        assert_eq!(quantize_angle(0.0), 0);
        assert_eq!(quantize_angle(TAU - 0.001), 0);
        assert_eq!(quantize_angle(-TAU / 72.0), 71);
        assert_eq!(quantize_angle(PI), 36);
    }

    #[test]
    fn test_memoizes_by_quantized_angle() {
        let mut sprites = ProceduralSprites::new();
        let kind = SpriteKind::Ship(ShipKind::Needle);
        let a = sprites.rotated_sprite(kind, 1.0);
        let b = sprites.rotated_sprite(kind, 1.0 + 0.001);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(sprites.cached(), 1);

        let c = sprites.rotated_sprite(kind, 2.0);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(sprites.cached(), 2);
    }

    #[test]
    fn test_masks_are_centered_and_solid() {
        let mut sprites = ProceduralSprites::new();
        for kind in [
            SpriteKind::Ship(ShipKind::Needle),
            SpriteKind::Ship(ShipKind::Wedge),
            SpriteKind::Projectile(PlayerId::One),
            SpriteKind::Supply,
        ] {
            for angle in [0.0, 1.3, PI, 5.0] {
                let sprite = sprites.rotated_sprite(kind, angle);
                let c = (sprite.mask.width() / 2) as isize;
                assert_eq!(sprite.mask.width(), sprite.mask.height());
                // One of the four center pixels is always opaque
                let center = [(c - 1, c - 1), (c, c - 1), (c - 1, c), (c, c)];
                assert!(center.iter().any(|&(x, y)| sprite.mask.get(x, y)), "{kind:?} at {angle}");
            }
        }
    }

    #[test]
    fn test_rotation_turns_the_nose() {
        let mut sprites = ProceduralSprites::new();
        let east = sprites.rotated_sprite(SpriteKind::Ship(ShipKind::Needle), 0.0);
        let south = sprites.rotated_sprite(SpriteKind::Ship(ShipKind::Needle), PI / 2.0);
        let side = east.mask.width() as isize;
        let mid = side / 2;
        // Nose tip region is opaque ahead of the center in each orientation
        assert!(east.mask.get(mid + 10, mid));
        assert!(!east.mask.get(mid, mid + 10));
        assert!(south.mask.get(mid, mid + 10));
        assert!(!south.mask.get(mid + 10, mid));
    }
}
