//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Elapsed time comes from the host, nothing reads a clock
//! - Seeded RNG only
//! - Stable iteration order (row-major over the grid)
//! - No rendering or platform dependencies

pub mod generate;
pub mod grid;
pub mod hex;
pub mod matching;
pub mod state;
pub mod tick;
pub mod trajectory;

pub use grid::{Bubble, BubbleKind, Grid, PlacementError};
pub use hex::{Cell, cols_for_row, grid_to_pixel, neighbor_offsets, pixel_to_grid, valid_cell};
pub use matching::{detonate, drop_floating, flood_fill, grounded_cells};
pub use state::{
    DiscardReason, Flight, GameEvent, GamePhase, GameState, Projectile, bomb_score, clear_score,
    level_for_score,
};
pub use tick::{TickInput, push_row_down, resolve_shot, tick};
pub use trajectory::{PathEnd, Trajectory, predict, predict_heading};
