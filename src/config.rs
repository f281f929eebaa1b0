//! Startup tuning
//!
//! Grid geometry is fixed at compile time (see [`crate::consts`]); everything
//! that balances a round lives here and can be loaded from JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{PALETTE_SIZE, ROWS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Relaxed,
    #[default]
    Normal,
    Frantic,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Relaxed => "Relaxed",
            Difficulty::Normal => "Normal",
            Difficulty::Frantic => "Frantic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relaxed" | "easy" => Some(Difficulty::Relaxed),
            "normal" => Some(Difficulty::Normal),
            "frantic" | "hard" => Some(Difficulty::Frantic),
            _ => None,
        }
    }
}

/// Round tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Projectile speed (pixels/s)
    pub shoot_speed: f32,

    // === Descent ===
    /// Time between row pushes at level 0 (ms)
    pub descent_interval_ms: f32,
    /// Interval reduction per level (ms)
    pub descent_speedup_ms_per_level: f32,
    /// Floor for the descent interval (ms)
    pub min_descent_interval_ms: f32,

    // === Generation ===
    /// Chance that any new bubble or projectile is a bomb
    pub bomb_chance: f32,
    /// Number of colors in play (at most `PALETTE_SIZE`)
    pub palette_size: u8,
    /// Fraction of the initial layout left empty
    pub gap_chance: f32,
    /// Rows filled at level 0
    pub start_rows_base: usize,
    /// Cap on initially filled rows
    pub max_start_rows: usize,

    /// Level the round starts at
    pub starting_level: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            shoot_speed: 720.0,

            descent_interval_ms: 12_000.0,
            descent_speedup_ms_per_level: 500.0,
            min_descent_interval_ms: 5_000.0,

            bomb_chance: 0.06,
            palette_size: PALETTE_SIZE,
            gap_chance: 0.15,
            start_rows_base: 4,
            max_start_rows: 6,

            starting_level: 1,
        }
    }
}

impl GameConfig {
    /// Config for a difficulty preset
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        let base = Self::default();
        match difficulty {
            Difficulty::Relaxed => Self {
                descent_interval_ms: 16_000.0,
                min_descent_interval_ms: 8_000.0,
                palette_size: 5,
                max_start_rows: 5,
                ..base
            },
            Difficulty::Normal => base,
            Difficulty::Frantic => Self {
                descent_interval_ms: 9_000.0,
                descent_speedup_ms_per_level: 600.0,
                min_descent_interval_ms: 3_500.0,
                bomb_chance: 0.04,
                start_rows_base: 5,
                max_start_rows: 7,
                ..base
            },
        }
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !(self.shoot_speed > 0.0) {
            return invalid(format!("shoot_speed must be positive, got {}", self.shoot_speed));
        }
        for (name, p) in [("bomb_chance", self.bomb_chance), ("gap_chance", self.gap_chance)] {
            if !(0.0..=1.0).contains(&p) {
                return invalid(format!("{name} must be within [0, 1], got {p}"));
            }
        }
        if self.palette_size == 0 || self.palette_size > PALETTE_SIZE {
            return invalid(format!(
                "palette_size must be within 1..={PALETTE_SIZE}, got {}",
                self.palette_size
            ));
        }
        if !(self.min_descent_interval_ms > 0.0) {
            return invalid("min_descent_interval_ms must be positive".to_string());
        }
        if self.descent_interval_ms < self.min_descent_interval_ms {
            return invalid("descent_interval_ms is below min_descent_interval_ms".to_string());
        }
        if self.descent_speedup_ms_per_level < 0.0 {
            return invalid("descent_speedup_ms_per_level must not be negative".to_string());
        }
        if self.start_rows_base == 0 || self.max_start_rows == 0 || self.max_start_rows >= ROWS {
            return invalid(format!("start rows must be within 1..{ROWS}"));
        }
        if self.starting_level == 0 {
            return invalid("starting_level starts at 1".to_string());
        }
        Ok(())
    }

    /// Descent interval at a level, floor-clamped
    pub fn descent_interval_at(&self, level: u32) -> f32 {
        (self.descent_interval_ms - level as f32 * self.descent_speedup_ms_per_level)
            .max(self.min_descent_interval_ms)
    }
}
