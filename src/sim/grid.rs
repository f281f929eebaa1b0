//! Authoritative bubble grid
//!
//! A fixed `ROWS x COLS` array of optional bubbles. Odd rows never use their
//! last column. Every mutation goes through [`valid_cell`] first.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::hex::{Cell, all_cells, cols_for_row, pixel_to_grid, valid_cell};
use crate::consts::*;

/// What a bubble is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BubbleKind {
    /// Regular bubble with a palette index
    Colored(u8),
    /// Bomb: never matches, detonates on landing
    Bomb,
}

impl BubbleKind {
    /// Palette index, or `None` for bombs
    #[inline]
    pub fn color(self) -> Option<u8> {
        match self {
            BubbleKind::Colored(c) => Some(c),
            BubbleKind::Bomb => None,
        }
    }

    #[inline]
    pub fn is_bomb(self) -> bool {
        self == BubbleKind::Bomb
    }
}

/// A bubble resting in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bubble {
    pub row: i32,
    pub col: i32,
    pub kind: BubbleKind,
}

impl Bubble {
    #[inline]
    pub fn cell(&self) -> Cell {
        Cell::new(self.row, self.col)
    }
}

/// Why a placement was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("cell ({row}, {col}) is outside the grid")]
    InvalidCell { row: i32, col: i32 },
    #[error("cell ({row}, {col}) is already occupied")]
    Occupied { row: i32, col: i32 },
}

type Row = [Option<Bubble>; COLS];

/// The bubble grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    rows: [Row; ROWS],
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    /// Create an empty grid
    pub fn new() -> Self {
        Self {
            rows: [[None; COLS]; ROWS],
        }
    }

    /// Place a new bubble. The only way bubbles enter the grid.
    pub fn place_bubble(&mut self, cell: Cell, kind: BubbleKind) -> Result<(), PlacementError> {
        let Cell { row, col } = cell;
        if !valid_cell(row, col) {
            return Err(PlacementError::InvalidCell { row, col });
        }
        let slot = &mut self.rows[row as usize][col as usize];
        if slot.is_some() {
            return Err(PlacementError::Occupied { row, col });
        }
        *slot = Some(Bubble { row, col, kind });
        Ok(())
    }

    /// Bubble at a cell; `None` for empty or invalid cells
    #[inline]
    pub fn get(&self, cell: Cell) -> Option<&Bubble> {
        if !cell.is_valid() {
            return None;
        }
        self.rows[cell.row as usize][cell.col as usize].as_ref()
    }

    #[inline]
    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.get(cell).is_some()
    }

    /// Remove and return the bubble at a cell; invalid cells are a no-op
    pub fn clear_cell(&mut self, cell: Cell) -> Option<Bubble> {
        if !cell.is_valid() {
            return None;
        }
        self.rows[cell.row as usize][cell.col as usize].take()
    }

    /// All placed bubbles in row-major order
    pub fn bubbles(&self) -> impl Iterator<Item = &Bubble> {
        self.rows.iter().flatten().flatten()
    }

    /// Bubbles in one row (empty iterator for rows outside the grid)
    pub fn row_bubbles(&self, row: i32) -> impl Iterator<Item = &Bubble> {
        let slice: &[Option<Bubble>] = if (0..ROWS as i32).contains(&row) {
            &self.rows[row as usize]
        } else {
            &[]
        };
        slice.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.bubbles().count()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles().next().is_none()
    }

    /// Distinct colors of non-bomb bubbles, ascending
    pub fn colors_present(&self) -> Vec<u8> {
        let mut seen = [false; u8::MAX as usize + 1];
        for b in self.bubbles() {
            if let Some(c) = b.kind.color() {
                seen[c as usize] = true;
            }
        }
        (0..=u8::MAX).filter(|&c| seen[c as usize]).collect()
    }

    /// Closest empty cell to an impact point.
    ///
    /// Searches a square window of `LANDING_SEARCH_RADIUS` cells around the
    /// approximate cell and compares true pixel distances. Returns `None`
    /// only when every cell in the window is occupied.
    pub fn find_best_cell(&self, pos: Vec2) -> Option<Cell> {
        let approx = pixel_to_grid(pos);
        let r = LANDING_SEARCH_RADIUS;
        let mut best: Option<(f32, Cell)> = None;
        for dr in -r..=r {
            for dc in -r..=r {
                let cell = approx.offset(dr, dc);
                if !cell.is_valid() || self.is_occupied(cell) {
                    continue;
                }
                let d = cell.center().distance_squared(pos);
                if best.is_none_or(|(best_d, _)| d < best_d) {
                    best = Some((d, cell));
                }
            }
        }
        best.map(|(_, cell)| cell)
    }

    /// Shift every row down by one and leave row 0 empty.
    ///
    /// The bottom row falls off the grid. Rows swap parity as they move, so a
    /// bubble in the last column of an even row has no slot in the odd row
    /// below; such bubbles are discarded. Returns every discarded bubble.
    pub fn shift_down(&mut self) -> Vec<Bubble> {
        let mut lost: Vec<Bubble> = self.rows[ROWS - 1].iter().flatten().copied().collect();
        self.rows.rotate_right(1);
        self.rows[0] = [None; COLS];
        for row in 1..ROWS as i32 {
            let max_cols = cols_for_row(row) as usize;
            for (col, slot) in self.rows[row as usize].iter_mut().enumerate() {
                let Some(bubble) = slot else { continue };
                if col >= max_cols {
                    lost.push(*bubble);
                    *slot = None;
                    continue;
                }
                bubble.row = row;
            }
        }
        lost
    }

    /// Cells that are empty and valid
    pub fn empty_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        all_cells().filter(|&c| !self.is_occupied(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_and_read() {
        let mut grid = Grid::new();
        let cell = Cell::new(2, 4);
        assert!(grid.place_bubble(cell, BubbleKind::Colored(3)).is_ok());
        let b = grid.get(cell).copied();
        assert_eq!(
            b,
            Some(Bubble {
                row: 2,
                col: 4,
                kind: BubbleKind::Colored(3)
            })
        );
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_place_rejects_occupied() {
        let mut grid = Grid::new();
        let cell = Cell::new(0, 0);
        grid.place_bubble(cell, BubbleKind::Colored(0)).unwrap();
        assert_eq!(
            grid.place_bubble(cell, BubbleKind::Colored(1)),
            Err(PlacementError::Occupied { row: 0, col: 0 })
        );
        assert_eq!(grid.get(cell).map(|b| b.kind), Some(BubbleKind::Colored(0)));
    }

    #[test]
    fn test_place_rejects_invalid() {
        let mut grid = Grid::new();
        let odd_last = Cell::new(1, COLS as i32 - 1);
        assert_eq!(
            grid.place_bubble(odd_last, BubbleKind::Bomb),
            Err(PlacementError::InvalidCell {
                row: 1,
                col: COLS as i32 - 1
            })
        );
        assert!(grid.place_bubble(Cell::new(ROWS as i32, 0), BubbleKind::Bomb).is_err());
        assert!(grid.is_empty());
    }

    #[test]
    fn test_clear_cell() {
        let mut grid = Grid::new();
        let cell = Cell::new(3, 3);
        grid.place_bubble(cell, BubbleKind::Bomb).unwrap();
        assert_eq!(grid.clear_cell(cell).map(|b| b.kind), Some(BubbleKind::Bomb));
        assert_eq!(grid.clear_cell(cell), None);
        assert_eq!(grid.clear_cell(Cell::new(-1, 0)), None);
    }

    #[test]
    fn test_colors_present_ignores_bombs() {
        let mut grid = Grid::new();
        grid.place_bubble(Cell::new(0, 0), BubbleKind::Colored(4)).unwrap();
        grid.place_bubble(Cell::new(0, 1), BubbleKind::Bomb).unwrap();
        grid.place_bubble(Cell::new(0, 2), BubbleKind::Colored(1)).unwrap();
        grid.place_bubble(Cell::new(0, 3), BubbleKind::Colored(4)).unwrap();
        assert_eq!(grid.colors_present(), vec![1, 4]);
    }

    #[test]
    fn test_find_best_cell_at_center() {
        let grid = Grid::new();
        let cell = Cell::new(5, 7);
        assert_eq!(grid.find_best_cell(cell.center()), Some(cell));
    }

    #[test]
    fn test_find_best_cell_skips_occupied() {
        let mut grid = Grid::new();
        let cell = Cell::new(4, 6);
        grid.place_bubble(cell, BubbleKind::Colored(0)).unwrap();
        let found = grid.find_best_cell(cell.center()).unwrap();
        assert_ne!(found, cell);
        assert!(!grid.is_occupied(found));
        // Nearest empty cell must be a direct neighbor
        assert!(cell.neighbors().any(|n| n == found));
    }

    #[test]
    fn test_find_best_cell_none_when_full() {
        let mut grid = Grid::new();
        for cell in all_cells() {
            grid.place_bubble(cell, BubbleKind::Colored(0)).unwrap();
        }
        assert_eq!(grid.find_best_cell(Cell::new(6, 6).center()), None);
    }

    #[test]
    fn test_shift_down_moves_rows_and_drops_overflow() {
        let mut grid = Grid::new();
        let last = COLS as i32 - 1;
        grid.place_bubble(Cell::new(0, 0), BubbleKind::Colored(1)).unwrap();
        grid.place_bubble(Cell::new(0, last), BubbleKind::Colored(2)).unwrap();
        grid.place_bubble(Cell::new(1, 3), BubbleKind::Bomb).unwrap();

        let lost = grid.shift_down();

        assert_eq!(lost.len(), 1);
        assert_eq!(lost[0].kind, BubbleKind::Colored(2));
        assert_eq!(grid.row_bubbles(0).count(), 0);
        let moved = grid.get(Cell::new(1, 0)).unwrap();
        assert_eq!((moved.row, moved.col), (1, 0));
        assert_eq!(grid.get(Cell::new(2, 3)).map(|b| b.kind), Some(BubbleKind::Bomb));
        assert_eq!(grid.len(), 2);
    }
}
