//! Short-lived visual particles (exhaust, hit sparks, explosions)
//!
//! Particles never affect gameplay. They draw from their own RNG stream so
//! that emitting more or fewer of them leaves the gameplay RNG untouched.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::ParticleTuning;
use crate::heading_vector;

/// Stream offset so particles and gameplay never share a sequence
const PARTICLE_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Engine exhaust
    Thrust,
    /// Sparks from a hit or a ram
    Spark,
    /// Debris from a destroyed ship
    Explosion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Seconds left
    pub ttl: f32,
    /// Lifetime at spawn, for fading
    pub max_ttl: f32,
    pub kind: ParticleKind,
}

impl Particle {
    /// 1.0 when fresh, 0.0 when about to vanish
    pub fn life_fraction(&self) -> f32 {
        if self.max_ttl <= 0.0 {
            0.0
        } else {
            (self.ttl / self.max_ttl).clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParticleSystem {
    tuning: ParticleTuning,
    rng: Pcg32,
    particles: Vec<Particle>,
}

impl ParticleSystem {
    pub fn new(tuning: ParticleTuning, seed: u64) -> Self {
        Self {
            tuning,
            rng: Pcg32::seed_from_u64(seed ^ PARTICLE_STREAM),
            particles: Vec::with_capacity(tuning.max_particles),
        }
    }

    /// Spawn up to `count` particles at `origin`
    ///
    /// Each one moves at `bias` plus a random jitter; anything past the
    /// particle cap is dropped. Returns how many were actually spawned.
    pub fn emit(&mut self, kind: ParticleKind, origin: Vec2, bias: Vec2, count: u32) -> usize {
        let room = self.tuning.max_particles.saturating_sub(self.particles.len());
        let n = (count as usize).min(room);
        let t = self.tuning;
        for _ in 0..n {
            let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
            let speed = self.rng.random_range(t.speed_min..=t.speed_max);
            let ttl = self.rng.random_range(t.ttl_min..=t.ttl_max);
            self.particles.push(Particle {
                position: origin,
                velocity: bias + heading_vector(angle) * speed,
                ttl,
                max_ttl: ttl,
                kind,
            });
        }
        n
    }

    /// Exhaust puff behind a thrusting ship
    pub fn thrust(&mut self, ship_pos: Vec2, heading: f32, ship_vel: Vec2) -> usize {
        let back = -heading_vector(heading);
        let bias = ship_vel + back * self.tuning.exhaust_speed;
        self.emit(ParticleKind::Thrust, ship_pos, bias, self.tuning.thrust_per_tick)
    }

    pub fn spark(&mut self, point: Vec2) -> usize {
        self.emit(ParticleKind::Spark, point, Vec2::ZERO, self.tuning.hit_burst)
    }

    pub fn explosion(&mut self, point: Vec2) -> usize {
        self.emit(ParticleKind::Explosion, point, Vec2::ZERO, self.tuning.explosion_burst)
    }

    /// Move every particle and drop the expired ones
    pub fn update(&mut self, dt: f32) {
        for p in &mut self.particles {
            debug_assert!(p.ttl > 0.0, "expired particle survived an update");
            p.position += p.velocity * dt;
            p.ttl -= dt;
        }
        self.particles.retain(|p| p.ttl > 0.0);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tuning() -> ParticleTuning {
        ParticleTuning {
            max_particles: 50,
            ..Default::default()
        }
    }

    #[test]
    fn test_cap_is_respected() {
        let mut fx = ParticleSystem::new(tuning(), 1);
        assert_eq!(fx.emit(ParticleKind::Explosion, Vec2::ZERO, Vec2::ZERO, 40), 40);
        assert_eq!(fx.emit(ParticleKind::Explosion, Vec2::ZERO, Vec2::ZERO, 40), 10);
        assert_eq!(fx.len(), 50);
        assert_eq!(fx.spark(Vec2::ZERO), 0);
    }

    #[test]
    fn test_all_expire() {
        let mut fx = ParticleSystem::new(ParticleTuning::default(), 2);
        fx.explosion(Vec2::new(100.0, 100.0));
        assert_eq!(fx.len(), 100);
        let max_ttl = ParticleTuning::default().ttl_max;
        let steps = (max_ttl / 0.05).ceil() as usize + 1;
        for _ in 0..steps {
            fx.update(0.05);
        }
        assert!(fx.is_empty());
    }

    #[test]
    fn test_exhaust_trails_behind() {
        let t = ParticleTuning {
            speed_min: 0.0,
            speed_max: 0.0,
            ..Default::default()
        };
        let mut fx = ParticleSystem::new(t, 3);
        fx.thrust(Vec2::new(50.0, 50.0), 0.0, Vec2::ZERO);
        assert_eq!(fx.len(), t.thrust_per_tick as usize);
        for p in fx.iter() {
            assert!((p.velocity - Vec2::new(-t.exhaust_speed, 0.0)).length() < 1e-3);
            assert_eq!(p.kind, ParticleKind::Thrust);
        }
    }

    #[test]
    fn test_same_seed_same_particles() {
        let mut a = ParticleSystem::new(ParticleTuning::default(), 77);
        let mut b = ParticleSystem::new(ParticleTuning::default(), 77);
        a.spark(Vec2::ONE);
        b.spark(Vec2::ONE);
        assert!(a.iter().eq(b.iter()));
    }

    proptest! {
        #[test]
        fn prop_update_never_keeps_expired(
            bursts in proptest::collection::vec(0u32..40, 1..10),
            dt in 0.001f32..0.5,
        ) {
            let mut fx = ParticleSystem::new(ParticleTuning::default(), 9);
            for n in bursts {
                fx.emit(ParticleKind::Spark, Vec2::ZERO, Vec2::ZERO, n);
                fx.update(dt);
                prop_assert!(fx.iter().all(|p| p.ttl > 0.0));
                prop_assert!(fx.len() <= ParticleTuning::default().max_particles);
            }
        }
    }
}
