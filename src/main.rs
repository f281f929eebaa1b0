//! Neon Bubbles headless runner
//!
//! Plays a seeded round with a simple auto-aim at a fixed timestep and logs
//! what happens. Useful for soak-testing the simulation without a renderer.
//!
//! Environment:
//! - `NEON_BUBBLES_SEED`: run seed (default 1)
//! - `NEON_BUBBLES_CONFIG`: path to a JSON tuning file
//! - `RUST_LOG`: log filter (e.g. `info`, `debug`)

use glam::Vec2;

use neon_bubbles::GameConfig;
use neon_bubbles::consts::*;
use neon_bubbles::sim::{BubbleKind, GameEvent, GamePhase, GameState, TickInput, tick};

/// Stop after this much simulated time (ms)
const MAX_RUN_MS: f64 = 10.0 * 60.0 * 1000.0;

/// Host loop state
struct Runner {
    state: GameState,
    accumulator: f32,
    shots: u32,
    clears: u32,
    drops: usize,
}

impl Runner {
    fn new(state: GameState) -> Self {
        Self {
            state,
            accumulator: 0.0,
            shots: 0,
            clears: 0,
            drops: 0,
        }
    }

    /// Pick a target: the lowest bubble matching the loaded color, else straight up
    fn choose_target(&self) -> Vec2 {
        let Some(p) = self.state.projectile.as_ref() else {
            return Vec2::new(SHOOT_X, GRID_TOP);
        };
        let wanted = p.kind.color();
        self.state
            .grid
            .bubbles()
            .filter(|b| p.kind == BubbleKind::Bomb || b.kind.color() == wanted)
            .map(|b| b.cell().center())
            .max_by(|a, b| a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or(Vec2::new(SHOOT_X, GRID_TOP))
    }

    /// Run simulation ticks for one host frame
    fn update(&mut self, frame_ms: f32) {
        self.accumulator += frame_ms.min(100.0);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT_MS && substeps < MAX_SUBSTEPS {
            let mut input = TickInput::default();
            if self.state.phase == GamePhase::Aiming {
                input.shoot_at = Some(self.choose_target());
                self.shots += 1;
            }
            tick(&mut self.state, &input, SIM_DT_MS);
            self.accumulator -= SIM_DT_MS;
            substeps += 1;

            for event in self.state.drain_events() {
                self.report(&event);
            }
        }
    }

    fn report(&mut self, event: &GameEvent) {
        match event {
            GameEvent::BubblesCleared { cells, combo, .. } => {
                self.clears += 1;
                log::debug!("Cleared {} (combo x{})", cells.len(), combo);
            }
            GameEvent::BubblesDropped { count, .. } => self.drops += count,
            GameEvent::LevelChanged { level } => log::info!("Reached level {level}"),
            GameEvent::ShotDiscarded { reason } => log::warn!("Shot discarded: {reason:?}"),
            GameEvent::GameOver { final_score } => log::info!("Final score {final_score}"),
            _ => log::trace!("{event:?}"),
        }
    }
}

fn load_config() -> GameConfig {
    let Ok(path) = std::env::var("NEON_BUBBLES_CONFIG") else {
        return GameConfig::default();
    };
    match std::fs::read_to_string(&path) {
        Ok(json) => match GameConfig::from_json(&json) {
            Ok(config) => {
                log::info!("Loaded config from {path}");
                config
            }
            Err(e) => {
                log::warn!("{e}; using defaults");
                GameConfig::default()
            }
        },
        Err(e) => {
            log::warn!("Cannot read {path}: {e}; using defaults");
            GameConfig::default()
        }
    }
}

fn main() {
    env_logger::init();

    let seed = std::env::var("NEON_BUBBLES_SEED")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(1);
    log::info!("Neon Bubbles (headless) starting with seed {seed}");

    let mut runner = Runner::new(GameState::with_config(seed, load_config()));
    // Simulate a 60 Hz host
    while !runner.state.is_game_over() && runner.state.time_ms < MAX_RUN_MS {
        runner.update(1000.0 / 60.0);
    }

    println!(
        "seed {} | score {} | level {} | shots {} | clears {} | dropped {} | {:.1}s{}",
        seed,
        runner.state.score,
        runner.state.level,
        runner.shots,
        runner.clears,
        runner.drops,
        runner.state.time_ms / 1000.0,
        if runner.state.is_game_over() { " | game over" } else { "" }
    );
}
