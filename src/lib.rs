//! Spycewar - a two-player Spacewar-style arcade duel
//!
//! Core modules:
//! - `sim`: Deterministic simulation (motion, collisions, particles, player states)
//! - `render`: Render/input handoff (sprite keys, draw commands, input polling)
//! - `platform`: Input sources and frame timing for the host loop
//! - `config`: Data-driven game tuning loaded from JSON
//! - `scoreboard`: Round results for a play session

pub mod config;
pub mod platform;
pub mod render;
pub mod scoreboard;
pub mod sim;

pub use config::{ConfigError, GameConfig};
pub use scoreboard::Scoreboard;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Default screen dimensions
    pub const SCREEN_WIDTH: f32 = 800.0;
    pub const SCREEN_HEIGHT: f32 = 600.0;

    /// Distance of the starting positions from the screen corners
    pub const SPAWN_INSET: f32 = 100.0;
}

/// Screen rectangle `[0, width) x [0, height)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True if the point lies inside the half-open screen rectangle
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x < self.width && p.y >= 0.0 && p.y < self.height
    }

    /// Wrap a point so each axis lands in `[0, dimension)`
    #[inline]
    pub fn wrap(&self, p: Vec2) -> Vec2 {
        Vec2::new(wrap_coordinate(p.x, self.width), wrap_coordinate(p.y, self.height))
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(consts::SCREEN_WIDTH, consts::SCREEN_HEIGHT)
    }
}

/// Normalize a heading to [0, 2π)
#[inline]
pub fn normalize_heading(angle: f32) -> f32 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if a >= TAU { 0.0 } else { a }
}

/// Wrap a single coordinate into [0, size)
#[inline]
pub fn wrap_coordinate(value: f32, size: f32) -> f32 {
    let v = value.rem_euclid(size);
    if v >= size { 0.0 } else { v }
}

/// Unit vector pointing along `heading`
#[inline]
pub fn heading_vector(heading: f32) -> Vec2 {
    Vec2::new(heading.cos(), heading.sin())
}

/// Scale `v` down to `max_len` if it is longer, preserving direction
#[inline]
pub fn clamp_speed(v: Vec2, max_len: f32) -> Vec2 {
    let len_sq = v.length_squared();
    if len_sq > max_len * max_len && len_sq > 0.0 {
        v * (max_len / len_sq.sqrt())
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_heading() {
        assert!((normalize_heading(-PI / 2.0) - 1.5 * PI).abs() < 1e-5);
        assert!((normalize_heading(5.0 * PI) - PI).abs() < 1e-4);
        assert_eq!(normalize_heading(0.0), 0.0);
        assert!(normalize_heading(-1e-9) < TAU);
    }

    #[test]
    fn test_wrap_coordinate() {
        assert_eq!(wrap_coordinate(810.0, 800.0), 10.0);
        assert_eq!(wrap_coordinate(-10.0, 800.0), 790.0);
        assert_eq!(wrap_coordinate(800.0, 800.0), 0.0);
        assert!(wrap_coordinate(-1e-7, 800.0) < 800.0);
    }

    #[test]
    fn test_clamp_speed_preserves_direction() {
        let v = clamp_speed(Vec2::new(30.0, 40.0), 10.0);
        assert!((v.length() - 10.0).abs() < 1e-4);
        assert!((v.x / v.y - 0.75).abs() < 1e-4);

        let slow = Vec2::new(1.0, 1.0);
        assert_eq!(clamp_speed(slow, 10.0), slow);
        assert_eq!(clamp_speed(Vec2::ZERO, 10.0), Vec2::ZERO);
    }
}
