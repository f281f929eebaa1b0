//! Match detection and support resolution
//!
//! Pure connectivity over the six-neighbor adjacency:
//! - same-color flood fill for matches
//! - square blast removal for bombs
//! - BFS from the ceiling row to find unsupported (floating) bubbles

use std::collections::{HashSet, VecDeque};

use super::grid::{Bubble, BubbleKind, Grid};
use super::hex::{Cell, all_cells};
use crate::consts::BOMB_RADIUS;

/// Connected same-color region containing `origin`.
///
/// Only non-bomb bubbles whose color equals `color` are included. The origin
/// itself must satisfy the same rule, otherwise the result is empty. The grid
/// is not modified; callers decide whether the region is large enough to clear.
pub fn flood_fill(grid: &Grid, origin: Cell, color: u8) -> Vec<Cell> {
    let matches = |cell: Cell| {
        grid.get(cell)
            .is_some_and(|b| b.kind == BubbleKind::Colored(color))
    };

    let mut region = Vec::new();
    if !matches(origin) {
        return region;
    }

    let mut visited = HashSet::from([origin]);
    let mut stack = vec![origin];
    while let Some(cell) = stack.pop() {
        region.push(cell);
        for n in cell.neighbors() {
            if matches(n) && visited.insert(n) {
                stack.push(n);
            }
        }
    }
    region
}

/// Remove the bubbles at `cells`, returning those actually removed
pub fn clear_cells(grid: &mut Grid, cells: &[Cell]) -> Vec<Bubble> {
    cells.iter().filter_map(|&c| grid.clear_cell(c)).collect()
}

/// Detonate a bomb at `center`.
///
/// Removes every bubble with |drow| <= BOMB_RADIUS and |dcol| <= BOMB_RADIUS,
/// regardless of color and including other bombs and the bomb itself.
pub fn detonate(grid: &mut Grid, center: Cell) -> Vec<Bubble> {
    let mut destroyed = Vec::new();
    for dr in -BOMB_RADIUS..=BOMB_RADIUS {
        for dc in -BOMB_RADIUS..=BOMB_RADIUS {
            if let Some(b) = grid.clear_cell(center.offset(dr, dc)) {
                destroyed.push(b);
            }
        }
    }
    destroyed
}

/// Cells reachable from any occupied ceiling-row cell through occupied cells
pub fn grounded_cells(grid: &Grid) -> HashSet<Cell> {
    let mut grounded: HashSet<Cell> = grid.row_bubbles(0).map(Bubble::cell).collect();
    let mut queue: VecDeque<Cell> = grounded.iter().copied().collect();

    while let Some(cell) = queue.pop_front() {
        for n in cell.neighbors() {
            if grid.is_occupied(n) && grounded.insert(n) {
                queue.push_back(n);
            }
        }
    }
    grounded
}

/// Remove every bubble not connected to the ceiling row.
///
/// Returns the removed bubbles in row-major order.
pub fn drop_floating(grid: &mut Grid) -> Vec<Bubble> {
    let grounded = grounded_cells(grid);
    let floating: Vec<Cell> = all_cells()
        .filter(|c| grid.is_occupied(*c) && !grounded.contains(c))
        .collect();
    if !floating.is_empty() {
        log::debug!("{} floating bubbles dropped", floating.len());
    }
    clear_cells(grid, &floating)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use proptest::prelude::*;

    fn put(grid: &mut Grid, row: i32, col: i32, kind: BubbleKind) {
        grid.place_bubble(Cell::new(row, col), kind).unwrap();
    }

    #[test]
    fn test_flood_fill_connected_region() {
        let mut grid = Grid::new();
        for col in 0..4 {
            put(&mut grid, 0, col, BubbleKind::Colored(1));
        }
        put(&mut grid, 0, 4, BubbleKind::Colored(2));
        put(&mut grid, 0, 5, BubbleKind::Colored(1)); // same color, cut off by col 4

        let mut region = flood_fill(&grid, Cell::new(0, 0), 1);
        region.sort();
        assert_eq!(region, (0..4).map(|c| Cell::new(0, c)).collect::<Vec<_>>());
        assert_eq!(grid.len(), 6, "flood fill must not mutate");
    }

    #[test]
    fn test_flood_fill_skips_bombs() {
        let mut grid = Grid::new();
        put(&mut grid, 0, 0, BubbleKind::Colored(0));
        put(&mut grid, 0, 1, BubbleKind::Bomb);
        put(&mut grid, 0, 2, BubbleKind::Colored(0));

        let region = flood_fill(&grid, Cell::new(0, 0), 0);
        assert_eq!(region, vec![Cell::new(0, 0)]);
        assert!(flood_fill(&grid, Cell::new(0, 1), 0).is_empty());
    }

    #[test]
    fn test_flood_fill_across_rows() {
        let mut grid = Grid::new();
        // (1,0) on an odd row touches (0,0) and (0,1)
        put(&mut grid, 0, 0, BubbleKind::Colored(3));
        put(&mut grid, 1, 0, BubbleKind::Colored(3));
        put(&mut grid, 2, 1, BubbleKind::Colored(3));
        assert_eq!(flood_fill(&grid, Cell::new(2, 1), 3).len(), 3);
    }

    #[test]
    fn test_drop_floating_removes_only_unsupported() {
        let mut grid = Grid::new();
        // Grounded column hanging from the ceiling
        put(&mut grid, 0, 0, BubbleKind::Colored(0));
        put(&mut grid, 1, 0, BubbleKind::Colored(1));
        put(&mut grid, 2, 0, BubbleKind::Bomb);
        // Floating cluster of five, two rows clear of anything else
        for col in 5..10 {
            put(&mut grid, 6, col, BubbleKind::Colored(2));
        }

        let dropped = drop_floating(&mut grid);
        assert_eq!(dropped.len(), 5);
        assert!(dropped.iter().all(|b| b.row == 6));
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn test_drop_floating_empty_ceiling_drops_everything() {
        let mut grid = Grid::new();
        put(&mut grid, 3, 3, BubbleKind::Colored(0));
        put(&mut grid, 3, 4, BubbleKind::Colored(0));
        assert_eq!(drop_floating(&mut grid).len(), 2);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_detonate_removes_square_window() {
        let mut grid = Grid::new();
        for cell in all_cells() {
            let kind = if cell == Cell::new(6, 7) {
                BubbleKind::Bomb
            } else {
                BubbleKind::Colored((cell.col % 3) as u8)
            };
            grid.place_bubble(cell, kind).unwrap();
        }
        let before = grid.len();
        let center = Cell::new(5, 5);

        let destroyed = detonate(&mut grid, center);

        for b in &destroyed {
            assert!((b.row - center.row).abs() <= BOMB_RADIUS);
            assert!((b.col - center.col).abs() <= BOMB_RADIUS);
        }
        assert!(destroyed.iter().any(|b| b.kind == BubbleKind::Bomb));
        assert_eq!(destroyed.len(), 25);
        assert_eq!(grid.len(), before - 25);
        for cell in all_cells() {
            let inside = (cell.row - center.row).abs() <= BOMB_RADIUS
                && (cell.col - center.col).abs() <= BOMB_RADIUS;
            assert_eq!(grid.is_occupied(cell), !inside, "{cell:?}");
        }
    }

    #[test]
    fn test_detonate_clips_at_edges() {
        let mut grid = Grid::new();
        for cell in all_cells() {
            grid.place_bubble(cell, BubbleKind::Colored(0)).unwrap();
        }
        // Rows 0..=2, cols 0..=2 are all valid
        assert_eq!(detonate(&mut grid, Cell::new(0, 0)).len(), 9);
    }

    fn grid_from(cells: &[Option<u8>]) -> Grid {
        let mut grid = Grid::new();
        for (cell, slot) in all_cells().zip(cells) {
            if let Some(v) = slot {
                // 3 encodes a bomb
                let kind = if *v == 3 {
                    BubbleKind::Bomb
                } else {
                    BubbleKind::Colored(*v)
                };
                grid.place_bubble(cell, kind).unwrap();
            }
        }
        grid
    }

    proptest! {
        #[test]
        fn prop_flood_fill_is_same_color_and_connected(
            cells in prop::collection::vec(prop::option::of(0u8..4), ROWS * COLS),
            start in 0usize..175,
        ) {
            let grid = grid_from(&cells);
            let origin = all_cells().nth(start).unwrap();
            let Some(kind) = grid.get(origin).map(|b| b.kind) else { return Ok(()) };
            let region = flood_fill(&grid, origin, kind.color().unwrap_or(0));
            if kind.is_bomb() {
                prop_assert!(region.is_empty());
                return Ok(());
            }
            let color = kind.color().unwrap();
            let members: HashSet<Cell> = region.iter().copied().collect();
            prop_assert_eq!(members.len(), region.len());
            prop_assert!(members.contains(&origin));
            for cell in &region {
                prop_assert_eq!(grid.get(*cell).map(|b| b.kind), Some(BubbleKind::Colored(color)));
                // Closed under same-color adjacency
                for n in cell.neighbors() {
                    if grid.get(n).map(|b| b.kind) == Some(BubbleKind::Colored(color)) {
                        prop_assert!(members.contains(&n));
                    }
                }
            }
        }

        #[test]
        fn prop_drop_floating_leaves_only_grounded(
            cells in prop::collection::vec(prop::option::of(0u8..4), ROWS * COLS),
        ) {
            let mut grid = grid_from(&cells);
            let grounded = grounded_cells(&grid);
            let dropped = drop_floating(&mut grid);
            prop_assert_eq!(grid.len(), grounded.len());
            for b in &dropped {
                prop_assert!(!grounded.contains(&b.cell()));
            }
            prop_assert!(drop_floating(&mut grid).is_empty());
        }
    }
}
