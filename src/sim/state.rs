//! Round state and core simulation types
//!
//! All state that must be persisted for replay/determinism lives here.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::generate::{generate_clustered_grid, pick_next_color, roll_kind, start_rows};
use super::grid::{Bubble, BubbleKind, Grid, PlacementError};
use super::hex::Cell;
use super::trajectory::{Trajectory, predict};
use crate::config::GameConfig;
use crate::consts::*;
use crate::{aim_angle, clamp_aim_angle, direction};

/// Current phase of the round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Projectile waiting at the cannon
    Aiming,
    /// Projectile travelling along its path
    InFlight,
    /// Landing cell chosen, grid being updated (never observed between ticks)
    Resolving,
    /// Timers and projectile frozen
    Paused,
    /// Round ended; nothing mutates any more
    GameOver,
}

/// An in-flight shot following its predicted path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub path: Trajectory,
    /// Distance covered along `path` so far (pixels)
    pub travelled: f32,
}

/// The single projectile at the cannon or in the air
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    /// Pixels per second; zero until fired
    pub vel: Vec2,
    pub kind: BubbleKind,
    pub flight: Option<Flight>,
}

impl Projectile {
    /// A fresh projectile sitting on the cannon
    pub fn new(kind: BubbleKind) -> Self {
        Self {
            pos: Vec2::new(SHOOT_X, SHOOT_Y),
            vel: Vec2::ZERO,
            kind,
            flight: None,
        }
    }

    pub fn is_flying(&self) -> bool {
        self.flight.is_some()
    }
}

/// Why a landed shot was thrown away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    NoLandingCell,
    Rejected(PlacementError),
}

/// Something the presentation layer may want to react to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ProjectileSpawned { kind: BubbleKind, next_color: u8 },
    ShotFired { angle: f32 },
    ShotDiscarded { reason: DiscardReason },
    BubblePlaced { row: i32, col: i32, kind: BubbleKind },
    BubblesCleared { cells: Vec<Cell>, color: u8, combo: u32 },
    BombDetonated { row: i32, col: i32, cells: Vec<Cell> },
    BubblesDropped { count: usize, cells: Vec<Cell> },
    RowPushedDown { row: Vec<Bubble>, discarded: usize },
    ScoreChanged { total: u64, delta: u64 },
    LevelChanged { level: u32 },
    Paused(bool),
    GameOver { final_score: u64 },
}

/// Points for a match of `cleared` bubbles followed by `dropped` falling ones
pub fn clear_score(cleared: usize, dropped: usize, combo: u32) -> u64 {
    let base = cleared as u64 * POINTS_PER_CLEAR + dropped as u64 * POINTS_PER_DROP;
    base * combo.min(MAX_COMBO_MULT) as u64
}

/// Points for a bomb blast. Never combo-multiplied.
pub fn bomb_score(destroyed: usize) -> u64 {
    destroyed as u64 * POINTS_PER_BOMB_HIT
}

/// Level reached with `score` points
pub fn level_for_score(score: u64, starting_level: u32) -> u32 {
    starting_level + (score / POINTS_PER_LEVEL) as u32
}

/// Complete round state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed, if the RNG was created from one
    pub seed: Option<u64>,
    pub config: GameConfig,
    pub rng: Pcg32,
    pub grid: Grid,
    pub phase: GamePhase,
    pub projectile: Option<Projectile>,
    pub score: u64,
    /// Consecutive clearing shots
    pub combo: u32,
    pub level: u32,
    pub shots_without_clear: u32,
    /// Time since the last descent (ms)
    pub descent_timer_ms: f32,
    /// Color of the projectile after the current one
    pub next_color: u8,
    /// Total simulated time (ms)
    pub time_ms: f64,
    /// Phase to resume when unpausing
    resume_phase: Option<GamePhase>,
    /// Pending events for the presentation layer
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// New round with default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, GameConfig::default())
    }

    /// New round with custom tuning. Invalid tuning falls back to defaults.
    pub fn with_config(seed: u64, config: GameConfig) -> Self {
        let mut state = Self::with_rng(config, Pcg32::seed_from_u64(seed));
        state.seed = Some(seed);
        state
    }

    /// New round driven by an injected generator
    pub fn with_rng(config: GameConfig, mut rng: Pcg32) -> Self {
        let config = sanitize(config);
        let level = config.starting_level;
        let mut grid = Grid::new();
        generate_clustered_grid(&mut grid, start_rows(&config, level), level, &config, &mut rng);
        Self::from_grid(config, grid, rng)
    }

    /// Round on a prepared grid (puzzles, replays, tests)
    pub fn from_grid(config: GameConfig, grid: Grid, mut rng: Pcg32) -> Self {
        let config = sanitize(config);
        let level = config.starting_level;
        let next_color = pick_next_color(&grid, level, config.palette_size, &mut rng);
        let mut state = Self {
            seed: None,
            config,
            rng,
            grid,
            phase: GamePhase::Aiming,
            projectile: None,
            score: 0,
            combo: 0,
            level,
            shots_without_clear: 0,
            descent_timer_ms: 0.0,
            next_color,
            time_ms: 0.0,
            resume_phase: None,
            events: Vec::new(),
        };
        log::info!(
            "Round start: level {}, {} bubbles",
            state.level,
            state.grid.len()
        );
        state.spawn_projectile();
        state
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Put a fresh projectile on the cannon and roll the next color
    pub fn spawn_projectile(&mut self) {
        if self.is_game_over() {
            return;
        }
        let kind = roll_kind(self.next_color, self.config.bomb_chance, &mut self.rng);
        self.next_color = pick_next_color(
            &self.grid,
            self.level,
            self.config.palette_size,
            &mut self.rng,
        );
        self.projectile = Some(Projectile::new(kind));
        self.phase = GamePhase::Aiming;
        self.events.push(GameEvent::ProjectileSpawned {
            kind,
            next_color: self.next_color,
        });
    }

    /// Predicted path for aiming at `target`. Pure query.
    ///
    /// Returns `None` unless a projectile is waiting to be fired.
    pub fn predict(&self, target: Vec2) -> Option<Trajectory> {
        if self.phase != GamePhase::Aiming {
            return None;
        }
        let p = self.projectile.as_ref()?;
        let angle = clamp_aim_angle(aim_angle(p.pos, target));
        Some(predict(&self.grid, p.pos, angle))
    }

    /// Fire the waiting projectile toward `target`.
    ///
    /// Ignored unless aiming and the target is above the cannon. Returns
    /// whether the shot was fired.
    pub fn shoot(&mut self, target: Vec2) -> bool {
        if self.phase != GamePhase::Aiming {
            return false;
        }
        let Some(p) = self.projectile.as_mut() else {
            return false;
        };
        if target.y >= p.pos.y - MIN_AIM_RISE {
            return false;
        }
        let angle = clamp_aim_angle(aim_angle(p.pos, target));
        let path = predict(&self.grid, p.pos, angle);
        log::debug!(
            "Shot at {:.3} rad, {} waypoints, ends {:?} at {}",
            angle,
            path.points.len(),
            path.end,
            path.terminal()
        );
        p.vel = direction(angle) * self.config.shoot_speed;
        p.flight = Some(Flight {
            path,
            travelled: 0.0,
        });
        self.phase = GamePhase::InFlight;
        self.events.push(GameEvent::ShotFired { angle });
        true
    }

    /// Pause or resume. No effect once the round is over.
    pub fn toggle_pause(&mut self) {
        match self.phase {
            GamePhase::GameOver | GamePhase::Resolving => {}
            GamePhase::Paused => {
                self.phase = self.resume_phase.take().unwrap_or(GamePhase::Aiming);
                self.events.push(GameEvent::Paused(false));
            }
            phase => {
                self.resume_phase = Some(phase);
                self.phase = GamePhase::Paused;
                self.events.push(GameEvent::Paused(true));
            }
        }
    }

    /// Add points, then recompute the level
    pub fn add_score(&mut self, delta: u64) {
        if delta == 0 || self.is_game_over() {
            return;
        }
        self.score += delta;
        self.events.push(GameEvent::ScoreChanged {
            total: self.score,
            delta,
        });

        let level = level_for_score(self.score, self.config.starting_level);
        if level > self.level {
            self.level = level;
            log::info!("Level up: {}", level);
            self.events.push(GameEvent::LevelChanged { level });
        }
    }

    /// Whether any bubble in the bottom three rows reached the danger line.
    ///
    /// With the fixed board the lowest cell centre sits above `DANGER_Y`, so
    /// this never fires on its own; rounds end through the occupied bottom
    /// row check in `push_row_down`.
    pub fn check_game_over(&self) -> bool {
        let first = ROWS as i32 - 3;
        (first..ROWS as i32)
            .flat_map(|r| self.grid.row_bubbles(r))
            .any(|b| b.cell().center().y >= DANGER_Y)
    }

    /// End the round. Idempotent.
    pub fn trigger_game_over(&mut self) {
        if self.is_game_over() {
            return;
        }
        self.phase = GamePhase::GameOver;
        self.resume_phase = None;
        log::info!("Game over: score {}, level {}", self.score, self.level);
        self.events.push(GameEvent::GameOver {
            final_score: self.score,
        });
    }

    /// Current descent interval (ms)
    pub fn descent_interval_ms(&self) -> f32 {
        self.config.descent_interval_at(self.level)
    }
}

fn sanitize(config: GameConfig) -> GameConfig {
    match config.validate() {
        Ok(()) => config,
        Err(e) => {
            log::warn!("{e}; using default tuning");
            GameConfig::default()
        }
    }
}
