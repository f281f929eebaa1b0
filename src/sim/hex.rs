//! Staggered hex grid geometry
//!
//! Rows are laid out top to bottom. Even rows hold `COLS` cells, odd rows hold
//! `COLS - 1` and are shifted right by half a cell, so every cell touches at
//! most six neighbors.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// An addressable grid position. May be out of bounds; see [`valid_cell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    #[inline]
    pub fn offset(self, dr: i32, dc: i32) -> Self {
        Self::new(self.row + dr, self.col + dc)
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        valid_cell(self.row, self.col)
    }

    /// The six neighbors, filtered to valid cells
    pub fn neighbors(self) -> impl Iterator<Item = Cell> {
        neighbor_offsets(self.row)
            .iter()
            .map(move |&(dr, dc)| self.offset(dr, dc))
            .filter(|c| c.is_valid())
    }

    /// Pixel center of this cell
    #[inline]
    pub fn center(self) -> Vec2 {
        grid_to_pixel(self.row, self.col)
    }
}

#[inline]
fn is_odd(row: i32) -> bool {
    row.rem_euclid(2) == 1
}

/// Number of columns a row of this parity holds
#[inline]
pub fn cols_for_row(row: i32) -> i32 {
    if is_odd(row) {
        COLS as i32 - 1
    } else {
        COLS as i32
    }
}

/// Single source of truth for cell legality
#[inline]
pub fn valid_cell(row: i32, col: i32) -> bool {
    (0..ROWS as i32).contains(&row) && (0..cols_for_row(row)).contains(&col)
}

/// Pixel center of a cell
pub fn grid_to_pixel(row: i32, col: i32) -> Vec2 {
    let odd_shift = if is_odd(row) { BUBBLE_R } else { 0.0 };
    Vec2::new(
        GRID_LEFT + col as f32 * BUBBLE_D + BUBBLE_R + odd_shift,
        row as f32 * ROW_H + GRID_TOP,
    )
}

/// Nearest cell to a pixel position, clamped into the grid.
///
/// Rounds row first, then column for that row's parity, so it is only an
/// approximation near cell boundaries. Use `Grid::find_best_cell` when the
/// closest empty cell matters.
pub fn pixel_to_grid(pos: Vec2) -> Cell {
    let row = ((pos.y - GRID_TOP) / ROW_H).round() as i32;
    let row = row.clamp(0, ROWS as i32 - 1);
    let odd_shift = if is_odd(row) { BUBBLE_R } else { 0.0 };
    let col = ((pos.x - GRID_LEFT - BUBBLE_R - odd_shift) / BUBBLE_D).round() as i32;
    let col = col.clamp(0, cols_for_row(row) - 1);
    Cell::new(row, col)
}

const EVEN_NEIGHBORS: [(i32, i32); 6] = [(-1, -1), (-1, 0), (0, -1), (0, 1), (1, -1), (1, 0)];
const ODD_NEIGHBORS: [(i32, i32); 6] = [(-1, 0), (-1, 1), (0, -1), (0, 1), (1, 0), (1, 1)];

/// (dr, dc) offsets of the six hex neighbors; depends on row parity
#[inline]
pub fn neighbor_offsets(row: i32) -> &'static [(i32, i32); 6] {
    if is_odd(row) {
        &ODD_NEIGHBORS
    } else {
        &EVEN_NEIGHBORS
    }
}

/// Iterate every valid cell in row-major order
pub fn all_cells() -> impl Iterator<Item = Cell> {
    (0..ROWS as i32).flat_map(|row| (0..cols_for_row(row)).map(move |col| Cell::new(row, col)))
}
