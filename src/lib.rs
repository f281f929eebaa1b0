//! Neon Bubbles - A hex-grid bubble shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid, trajectory, matching, round state)
//! - `config`: Startup tuning loaded from JSON or difficulty presets
//!
//! Rendering, audio and input devices live outside this crate. A host drives
//! the simulation through [`sim::tick`] and reacts to [`sim::GameEvent`]s.

pub mod config;
pub mod sim;

pub use config::{ConfigError, Difficulty, GameConfig};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep for hosts that want one (milliseconds, 120 Hz)
    pub const SIM_DT_MS: f32 = 1000.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Playfield dimensions
    pub const GAME_W: f32 = 480.0;
    pub const GAME_H: f32 = 700.0;

    /// Grid dimensions. Odd rows hold one column fewer.
    pub const COLS: usize = 13;
    pub const ROWS: usize = 14;

    /// Bubble geometry
    pub const BUBBLE_R: f32 = 18.0;
    pub const BUBBLE_D: f32 = BUBBLE_R * 2.0;
    /// Vertical hex spacing (r * √3)
    pub const ROW_H: f32 = BUBBLE_R * 1.732;
    pub const GRID_LEFT: f32 = (GAME_W - COLS as f32 * BUBBLE_D) / 2.0;
    pub const GRID_TOP: f32 = 60.0;

    /// Cannon position
    pub const SHOOT_X: f32 = GAME_W / 2.0;
    pub const SHOOT_Y: f32 = GAME_H - 60.0;

    /// Side walls the projectile reflects off
    pub const WALL_L: f32 = BUBBLE_R;
    pub const WALL_R: f32 = GAME_W - BUBBLE_R;

    /// Number of distinct bubble colors
    pub const PALETTE_SIZE: u8 = 6;

    /// Aim is clamped to [-π + AIM_EPSILON, -AIM_EPSILON]
    pub const AIM_EPSILON: f32 = 0.15;
    /// Shots must target at least this far above the cannon
    pub const MIN_AIM_RISE: f32 = 10.0;

    /// Trajectory prediction
    pub const TRAJECTORY_STEP: f32 = 4.0;
    pub const TRAJECTORY_MAX_STEPS: usize = 600;
    pub const COLLISION_DIST: f32 = BUBBLE_D * 0.9;

    /// Landing cell search window (cells in each direction)
    pub const LANDING_SEARCH_RADIUS: i32 = 3;

    /// Bomb blast radius in row/col space
    pub const BOMB_RADIUS: i32 = 2;

    /// Scoring
    pub const POINTS_PER_CLEAR: u64 = 100;
    pub const POINTS_PER_DROP: u64 = 200;
    pub const POINTS_PER_BOMB_HIT: u64 = 300;
    pub const MAX_COMBO_MULT: u32 = 8;
    pub const POINTS_PER_LEVEL: u64 = 2000;
    pub const MIN_MATCH: usize = 3;

    /// Any bubble at or below this y ends the round
    pub const DANGER_Y: f32 = SHOOT_Y - 50.0;
}

/// Clamp an aim angle to the upward half-plane, away from horizontal
#[inline]
pub fn clamp_aim_angle(angle: f32) -> f32 {
    use std::f32::consts::PI;
    angle.clamp(-PI + consts::AIM_EPSILON, -consts::AIM_EPSILON)
}

/// Angle of the ray from `from` toward `to` (screen space, y grows downward)
#[inline]
pub fn aim_angle(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Unit direction for an angle
#[inline]
pub fn direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_clamp_aim_angle() {
        assert_eq!(clamp_aim_angle(-FRAC_PI_2), -FRAC_PI_2);
        assert_eq!(clamp_aim_angle(0.0), -consts::AIM_EPSILON);
        assert_eq!(clamp_aim_angle(-PI), -PI + consts::AIM_EPSILON);
    }

    #[test]
    fn test_aim_angle_straight_up() {
        let a = aim_angle(Vec2::new(240.0, 640.0), Vec2::new(240.0, 100.0));
        assert!((a + FRAC_PI_2).abs() < 1e-6);
    }
}
