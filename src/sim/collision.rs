//! Two-phase collision detection and response
//!
//! Broad phase: axis-aligned sprite rectangles. Only pairs whose rectangles
//! overlap pay for the narrow phase, a pixel-by-pixel test of the opaque
//! masks at each entity's current orientation.

use std::collections::BTreeSet;

use glam::Vec2;

use super::spec::ShipSpec;
use super::state::{EntityState, PlayerId, Projectile, Ship, Supply};
use crate::render::{SpriteKind, SpriteSource};

/// Axis-aligned rectangle in screen space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Strict overlap; rectangles that only share an edge do not touch
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Rect {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        })
    }
}

/// Broad-phase test
#[inline]
pub fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    a.overlaps(b)
}

/// Opaque-pixel mask of a sprite, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width * height],
        }
    }

    /// Build a mask by sampling `opaque(x, y)` for every pixel
    pub fn from_fn(width: usize, height: usize, mut opaque: impl FnMut(usize, usize) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                mask.bits[y * width + x] = opaque(x, y);
            }
        }
        mask
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Opaque test; anything outside the mask is transparent
    pub fn get(&self, x: isize, y: isize) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return false;
        }
        self.bits[y as usize * self.width + x as usize]
    }

    pub fn set(&mut self, x: usize, y: usize, opaque: bool) {
        if x < self.width && y < self.height {
            self.bits[y * self.width + x] = opaque;
        }
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }
}

/// A mask placed in the world, centered on `position`
#[derive(Debug, Clone, Copy)]
pub struct Collider<'a> {
    pub position: Vec2,
    pub mask: &'a Mask,
}

impl Collider<'_> {
    pub fn rect(&self) -> Rect {
        Rect::from_center(self.position, self.mask.size())
    }
}

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Centroid of the shared opaque pixels (if hit)
    pub point: Vec2,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
        }
    }
}

/// Full two-phase test between two colliders
pub fn resolve(a: &Collider<'_>, b: &Collider<'_>) -> CollisionResult {
    let ra = a.rect();
    let rb = b.rect();
    if !rects_overlap(&ra, &rb) {
        return CollisionResult::miss();
    }
    match masks_overlap(a.mask, &ra, b.mask, &rb) {
        Some(point) => CollisionResult { hit: true, point },
        None => CollisionResult::miss(),
    }
}

/// Narrow phase: sample pixel centers across the rectangle intersection
fn masks_overlap(a: &Mask, ra: &Rect, b: &Mask, rb: &Rect) -> Option<Vec2> {
    let overlap = ra.intersection(rb)?;
    let x0 = overlap.min.x.floor() as i64;
    let x1 = overlap.max.x.ceil() as i64;
    let y0 = overlap.min.y.floor() as i64;
    let y1 = overlap.max.y.ceil() as i64;

    let mut sum = Vec2::ZERO;
    let mut shared = 0u32;
    for py in y0..y1 {
        for px in x0..x1 {
            let sample = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
            let la = sample - ra.min;
            let lb = sample - rb.min;
            if a.get(la.x.floor() as isize, la.y.floor() as isize)
                && b.get(lb.x.floor() as isize, lb.y.floor() as isize)
            {
                sum += sample;
                shared += 1;
            }
        }
    }

    (shared > 0).then(|| sum / shared as f32)
}

/// Pixels each ship is pushed apart per tick while overlapping without closing
pub const RAM_PUSH: f32 = 1.0;

/// Shot lands on a ship; returns true if the hit wrecked it
pub fn ship_vs_projectile(ship: &mut EntityState, shot: &mut Projectile) -> bool {
    ship.apply_damage(shot.damage);
    shot.body.alive = false;
    ship.is_wrecked()
}

/// Two overlapping ships ram each other
///
/// Ships closing along the contact normal exchange their normal velocity
/// components (equal-mass elastic bounce). Ships resting on each other or
/// already drifting apart are pushed `RAM_PUSH` pixels apart instead, so an
/// overlap never persists. `ram_damage` lands on both hulls, shield first,
/// only on the first tick of a contact. Returns whether damage was dealt.
pub fn ship_vs_ship(a: &mut EntityState, b: &mut EntityState, ram_damage: f32, first_contact: bool) -> bool {
    let mut normal = (b.position - a.position).normalize_or_zero();
    if normal == Vec2::ZERO {
        normal = Vec2::X;
    }
    let approach = (a.velocity - b.velocity).dot(normal);
    if approach > 0.0 {
        a.velocity -= normal * approach;
        b.velocity += normal * approach;
    } else {
        a.position -= normal * RAM_PUSH;
        b.position += normal * RAM_PUSH;
    }

    if first_contact {
        a.apply_damage(ram_damage);
        b.apply_damage(ram_damage);
    }
    first_contact
}

/// Ship collects a supply; health never exceeds the spec maximum
pub fn ship_vs_supply(ship: &mut EntityState, spec: &ShipSpec, supply: &mut Supply) {
    ship.heal(supply.heal_amount, spec.max_health);
    supply.body.alive = false;
}

/// Something the arena reacts to after the collision pass
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionEvent {
    ShipHit {
        victim: PlayerId,
        attacker: PlayerId,
        point: Vec2,
        damage: f32,
    },
    Ram {
        a: PlayerId,
        b: PlayerId,
        point: Vec2,
    },
    SupplyConsumed {
        player: PlayerId,
        amount: f32,
    },
}

fn damageable(ship: &Ship) -> bool {
    ship.in_play() && !ship.invulnerable() && !ship.body.is_wrecked()
}

/// Ship pairs currently touching, smaller id first
pub type Contacts = BTreeSet<(PlayerId, PlayerId)>;

/// Resolve every candidate pair for one tick
///
/// Order is fixed: ship–ship, then ship–projectile, then ship–supply, with
/// ships by id and projectiles/supplies by spawn id, so multi-hit ticks
/// replay identically. `contacts` carries ship pairs that were already
/// touching last tick and is updated in place.
pub fn run<S: SpriteSource + ?Sized>(
    ships: &mut [Ship],
    projectiles: &mut [Projectile],
    supplies: &mut [Supply],
    contacts: &mut Contacts,
    sprites: &mut S,
    ram_damage: f32,
) -> Vec<CollisionEvent> {
    let mut events = Vec::new();

    let hulls: Vec<_> = ships
        .iter()
        .map(|s| sprites.rotated_sprite(SpriteKind::Ship(s.kind), s.body.heading))
        .collect();

    // Ship vs ship
    for i in 0..ships.len() {
        for j in (i + 1)..ships.len() {
            let pair = (ships[i].id.min(ships[j].id), ships[i].id.max(ships[j].id));
            if !damageable(&ships[i]) || !damageable(&ships[j]) {
                contacts.remove(&pair);
                continue;
            }
            let result = resolve(
                &Collider {
                    position: ships[i].body.position,
                    mask: &hulls[i].mask,
                },
                &Collider {
                    position: ships[j].body.position,
                    mask: &hulls[j].mask,
                },
            );
            if !result.hit {
                contacts.remove(&pair);
                continue;
            }
            let first_contact = contacts.insert(pair);
            let (head, tail) = ships.split_at_mut(j);
            let (a, b) = (&mut head[i], &mut tail[0]);
            if ship_vs_ship(&mut a.body, &mut b.body, ram_damage, first_contact) {
                log::debug!("{} rammed {}", a.id, b.id);
                events.push(CollisionEvent::Ram {
                    a: a.id,
                    b: b.id,
                    point: result.point,
                });
            }
        }
    }

    // Ship vs projectile
    for (ship, hull) in ships.iter_mut().zip(&hulls) {
        for shot in projectiles.iter_mut() {
            if !shot.body.alive || shot.owner == ship.id || !damageable(ship) {
                continue;
            }
            let shot_sprite = sprites.rotated_sprite(SpriteKind::Projectile(shot.owner), shot.body.heading);
            let result = resolve(
                &Collider {
                    position: ship.body.position,
                    mask: &hull.mask,
                },
                &Collider {
                    position: shot.body.position,
                    mask: &shot_sprite.mask,
                },
            );
            if !result.hit {
                continue;
            }
            ship_vs_projectile(&mut ship.body, shot);
            log::debug!(
                "{} hit {} for {:.0} (health {:.0}, shield {:.0})",
                shot.owner,
                ship.id,
                shot.damage,
                ship.body.health,
                ship.body.shield
            );
            events.push(CollisionEvent::ShipHit {
                victim: ship.id,
                attacker: shot.owner,
                point: result.point,
                damage: shot.damage,
            });
        }
    }

    // Ship vs supply
    let crate_sprite = sprites.rotated_sprite(SpriteKind::Supply, 0.0);
    for (ship, hull) in ships.iter_mut().zip(&hulls) {
        if !ship.in_play() {
            continue;
        }
        for supply in supplies.iter_mut() {
            if !supply.body.alive {
                continue;
            }
            let result = resolve(
                &Collider {
                    position: ship.body.position,
                    mask: &hull.mask,
                },
                &Collider {
                    position: supply.body.position,
                    mask: &crate_sprite.mask,
                },
            );
            if result.hit {
                ship_vs_supply(&mut ship.body, &ship.spec, supply);
                log::info!("{} picked up supply (+{:.0})", ship.id, supply.heal_amount);
                events.push(CollisionEvent::SupplyConsumed {
                    player: ship.id,
                    amount: supply.heal_amount,
                });
            }
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ProceduralSprites;
    use crate::sim::spec::{ShipKind, ShipSpec};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn solid(w: usize, h: usize) -> Mask {
        Mask::from_fn(w, h, |_, _| true)
    }

    fn ship(id: PlayerId, pos: Vec2) -> Ship {
        Ship::new(id, ShipKind::Needle, Arc::new(ShipSpec::needle()), pos, 0.0)
    }

    fn shot(id: u32, owner: PlayerId, pos: Vec2, damage: f32) -> Projectile {
        Projectile {
            id,
            owner,
            body: EntityState::expiring(pos, Vec2::new(1.0, 0.0), 2.0),
            damage,
        }
    }

    #[test]
    fn test_rect_overlap() {
        let a = Rect::from_center(Vec2::new(10.0, 10.0), Vec2::splat(10.0));
        let b = Rect::from_center(Vec2::new(18.0, 10.0), Vec2::splat(10.0));
        let c = Rect::from_center(Vec2::new(20.0, 10.0), Vec2::splat(10.0));
        assert!(rects_overlap(&a, &b));
        // Shared edge only
        assert!(!rects_overlap(&a, &c));
        let i = a.intersection(&b).unwrap();
        assert_eq!(i.width(), 2.0);
        assert_eq!(i.height(), 10.0);
    }

    #[test]
    fn test_narrow_phase_rejects_transparent_overlap() {
        // Two discs whose rectangles overlap only in transparent corners
        let ring = Mask::from_fn(10, 10, |x, y| {
            let dx = x as f32 - 4.5;
            let dy = y as f32 - 4.5;
            dx * dx + dy * dy <= 9.0
        });
        let a = Collider {
            position: Vec2::new(0.0, 0.0),
            mask: &ring,
        };
        let b = Collider {
            position: Vec2::new(8.0, 8.0),
            mask: &ring,
        };
        assert!(rects_overlap(&a.rect(), &b.rect()));
        assert!(!resolve(&a, &b).hit);
    }

    #[test]
    fn test_narrow_phase_hit_point() {
        let m = solid(4, 4);
        let a = Collider {
            position: Vec2::new(10.0, 10.0),
            mask: &m,
        };
        let b = Collider {
            position: Vec2::new(12.0, 10.0),
            mask: &m,
        };
        let result = resolve(&a, &b);
        assert!(result.hit);
        assert!((result.point - Vec2::new(11.0, 10.0)).length() < 1e-3);
    }

    #[test]
    fn test_projectile_damage_to_health() {
        let mut target = ship(PlayerId::Two, Vec2::ZERO);
        target.body.shield = 0.0;
        let mut bullet = shot(1, PlayerId::One, Vec2::ZERO, 15.0);
        let wrecked = ship_vs_projectile(&mut target.body, &mut bullet);
        assert!(!wrecked);
        assert_eq!(target.body.health, 85.0);
        assert!(!bullet.body.alive);
    }

    #[test]
    fn test_shield_absorbs_and_discards_excess() {
        let mut target = ship(PlayerId::Two, Vec2::ZERO);
        target.body.shield = 30.0;
        target.body.health = 100.0;
        let mut bullet = shot(1, PlayerId::One, Vec2::ZERO, 50.0);
        ship_vs_projectile(&mut target.body, &mut bullet);
        assert_eq!(target.body.shield, 0.0);
        assert_eq!(target.body.health, 100.0);
    }

    #[test]
    fn test_lethal_hit_reports_wreck() {
        let mut target = ship(PlayerId::Two, Vec2::ZERO);
        target.body.health = 10.0;
        target.body.shield = 0.0;
        let mut bullet = shot(1, PlayerId::One, Vec2::ZERO, 12.0);
        assert!(ship_vs_projectile(&mut target.body, &mut bullet));
        assert_eq!(target.body.health, 0.0);
    }

    #[test]
    fn test_supply_heal_capped() {
        let spec = ShipSpec {
            max_health: 100.0,
            ..ShipSpec::needle()
        };
        let mut body = EntityState::ship(Vec2::ZERO, 0.0, &spec);
        body.health = 90.0;
        let mut supply = Supply {
            id: 1,
            body: EntityState::expiring(Vec2::ZERO, Vec2::ZERO, 5.0),
            heal_amount: 50.0,
        };
        ship_vs_supply(&mut body, &spec, &mut supply);
        assert_eq!(body.health, 100.0);
        assert!(!supply.body.alive);
    }

    #[test]
    fn test_ram_bounces_and_damages_once() {
        let spec = ShipSpec::needle();
        let mut a = EntityState::ship(Vec2::new(100.0, 100.0), 0.0, &spec);
        let mut b = EntityState::ship(Vec2::new(110.0, 100.0), 0.0, &spec);
        a.shield = 0.0;
        b.shield = 10.0;
        a.velocity = Vec2::new(50.0, 5.0);
        b.velocity = Vec2::new(-20.0, 0.0);

        assert!(ship_vs_ship(&mut a, &mut b, 25.0, true));
        assert!((a.velocity - Vec2::new(-20.0, 5.0)).length() < 1e-3);
        assert!((b.velocity - Vec2::new(50.0, 0.0)).length() < 1e-3);
        assert_eq!(a.health, 75.0);
        // Shield soaks the ram
        assert_eq!(b.shield, 0.0);
        assert_eq!(b.health, spec.max_health);

        // Same contact, now separating: no second hit
        assert!(!ship_vs_ship(&mut a, &mut b, 25.0, false));
        assert_eq!(a.health, 75.0);
    }

    #[test]
    fn test_resting_overlap_pushes_apart() {
        let spec = ShipSpec::needle();
        let mut a = EntityState::ship(Vec2::new(400.0, 300.0), 0.0, &spec);
        let mut b = EntityState::ship(Vec2::new(402.0, 300.0), 0.0, &spec);
        a.shield = 0.0;
        b.shield = 0.0;

        assert!(ship_vs_ship(&mut a, &mut b, 25.0, true));
        assert_eq!(a.health, 75.0);
        assert_eq!(b.health, 75.0);
        assert_eq!(a.position, Vec2::new(400.0 - RAM_PUSH, 300.0));
        assert_eq!(b.position, Vec2::new(402.0 + RAM_PUSH, 300.0));
        assert_eq!(a.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_run_rams_once_per_contact() {
        let mut sprites = ProceduralSprites::new();
        let mut ships = vec![ship(PlayerId::One, Vec2::new(400.0, 300.0)), ship(PlayerId::Two, Vec2::new(402.0, 300.0))];
        for s in &mut ships {
            s.body.shield = 0.0;
        }
        let mut contacts = Contacts::new();

        let events = run(&mut ships, &mut [], &mut [], &mut contacts, &mut sprites, 25.0);
        assert!(matches!(events[..], [CollisionEvent::Ram { a: PlayerId::One, b: PlayerId::Two, .. }]));
        assert!(contacts.contains(&(PlayerId::One, PlayerId::Two)));

        // Still touching: pushed further apart, no more damage
        let events = run(&mut ships, &mut [], &mut [], &mut contacts, &mut sprites, 25.0);
        assert!(events.is_empty());
        assert_eq!(ships[0].body.health, 75.0);
        assert_eq!(ships[1].body.position.x - ships[0].body.position.x, 2.0 + 4.0 * RAM_PUSH);

        // Far apart: the contact episode ends
        ships[1].body.position.x = 700.0;
        run(&mut ships, &mut [], &mut [], &mut contacts, &mut sprites, 25.0);
        assert!(contacts.is_empty());
    }

    #[test]
    fn test_run_skips_own_shots() {
        let mut sprites = ProceduralSprites::new();
        let mut ships = vec![ship(PlayerId::One, Vec2::new(100.0, 100.0)), ship(PlayerId::Two, Vec2::new(400.0, 300.0))];
        let mut shots = vec![
            shot(1, PlayerId::One, Vec2::new(100.0, 100.0), 10.0),
            shot(2, PlayerId::One, Vec2::new(400.0, 300.0), 10.0),
        ];
        let events = run(&mut ships, &mut shots, &mut [], &mut Contacts::new(), &mut sprites, 25.0);

        assert_eq!(events.len(), 1);
        assert!(shots[0].body.alive);
        assert!(!shots[1].body.alive);
        assert_eq!(ships[1].body.shield, ShipSpec::needle().max_shield - 10.0);
        assert_eq!(ships[1].body.health, 100.0);
        assert!(matches!(
            events[0],
            CollisionEvent::ShipHit { victim: PlayerId::Two, attacker: PlayerId::One, .. }
        ));
    }

    #[test]
    fn test_run_consumes_supply() {
        let mut sprites = ProceduralSprites::new();
        let mut ships = vec![ship(PlayerId::One, Vec2::new(200.0, 200.0)), ship(PlayerId::Two, Vec2::new(600.0, 500.0))];
        ships[0].body.health = 40.0;
        let mut supplies = vec![Supply {
            id: 9,
            body: EntityState::expiring(Vec2::new(205.0, 200.0), Vec2::ZERO, 5.0),
            heal_amount: 30.0,
        }];
        let events = run(&mut ships, &mut [], &mut supplies, &mut Contacts::new(), &mut sprites, 25.0);
        assert_eq!(ships[0].body.health, 70.0);
        assert!(!supplies[0].body.alive);
        assert_eq!(
            events,
            vec![CollisionEvent::SupplyConsumed {
                player: PlayerId::One,
                amount: 30.0
            }]
        );
    }

    fn arb_rect() -> impl Strategy<Value = Rect> {
        (-500.0f32..500.0, -500.0f32..500.0, 0.0f32..200.0, 0.0f32..200.0)
            .prop_map(|(x, y, w, h)| Rect::from_center(Vec2::new(x, y), Vec2::new(w, h)))
    }

    proptest! {
        #[test]
        fn prop_broad_phase_commutes(a in arb_rect(), b in arb_rect()) {
            prop_assert_eq!(rects_overlap(&a, &b), rects_overlap(&b, &a));
        }

        #[test]
        fn prop_full_test_commutes(
            ax in 0.0f32..60.0, ay in 0.0f32..60.0,
            bx in 0.0f32..60.0, by in 0.0f32..60.0,
            ha in 0.0f32..std::f32::consts::TAU,
            hb in 0.0f32..std::f32::consts::TAU,
        ) {
            let mut sprites = ProceduralSprites::new();
            let sa = sprites.rotated_sprite(SpriteKind::Ship(ShipKind::Needle), ha);
            let sb = sprites.rotated_sprite(SpriteKind::Ship(ShipKind::Wedge), hb);
            let a = Collider { position: Vec2::new(ax, ay), mask: &sa.mask };
            let b = Collider { position: Vec2::new(bx, by), mask: &sb.mask };
            prop_assert_eq!(resolve(&a, &b).hit, resolve(&b, &a).hit);
        }
    }
}
