//! Procedural bubble layouts
//!
//! - Initial grid: blob painting of 3-7 cell clusters, then random gaps
//! - Descent row: runs of 2-4 that continue the colors of the row below
//! - Next projectile color: always one still present in the grid

use std::collections::{HashSet, VecDeque};
use std::ops::RangeInclusive;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use super::grid::{Bubble, BubbleKind, Grid};
use super::hex::{Cell, cols_for_row, neighbor_offsets};
use crate::config::GameConfig;

/// Size range of one painted blob
const CLUSTER_SIZE: RangeInclusive<usize> = 3..=7;
/// Run length of same-colored cells in a descent row
const RUN_LENGTH: RangeInclusive<i32> = 2..=4;
/// Chance a descent row skips a cell
const ROW_GAP_CHANCE: f32 = 0.2;
/// Chance a descent row introduces a color not present below it
const NEW_COLOR_CHANCE: f32 = 0.3;
/// Chance a run copies the color of the bubble directly below
const FOLLOW_BELOW_CHANCE: f32 = 0.5;

/// Roll whether a new bubble is a bomb
pub fn roll_kind<R: Rng + ?Sized>(color: u8, bomb_chance: f32, rng: &mut R) -> BubbleKind {
    if rng.random::<f32>() < bomb_chance {
        BubbleKind::Bomb
    } else {
        BubbleKind::Colored(color)
    }
}

/// Number of colors used by the initial layout at a level
pub fn colors_for_level(level: u32, palette_size: u8) -> u8 {
    (3 + level / 2).min(palette_size as u32) as u8
}

/// Rows filled at the start of a round
pub fn start_rows(config: &GameConfig, level: u32) -> usize {
    (config.start_rows_base + level as usize / 3).min(config.max_start_rows)
}

/// Color for the next projectile.
///
/// Picks uniformly among colors still on the grid so the player always holds
/// something matchable. An empty grid falls back to the level-scaled subset
/// of the palette.
pub fn pick_next_color<R: Rng + ?Sized>(grid: &Grid, level: u32, palette_size: u8, rng: &mut R) -> u8 {
    let present = grid.colors_present();
    match present.choose(rng) {
        Some(&c) => c,
        None => {
            let max = (2 + level).min(palette_size as u32 - 1) as u8;
            rng.random_range(0..=max)
        }
    }
}

/// Fill the top `num_rows` rows with clustered blobs.
///
/// Repeatedly seeds a random empty cell and grows a connected blob of one
/// color by BFS with shuffled neighbor order until every cell is painted,
/// then clears roughly `gap_chance` of the cells.
pub fn generate_clustered_grid<R: Rng + ?Sized>(
    grid: &mut Grid,
    num_rows: usize,
    level: u32,
    config: &GameConfig,
    rng: &mut R,
) {
    let num_rows = num_rows as i32;
    let mut color_map: Vec<Vec<Option<u8>>> = (0..num_rows)
        .map(|r| vec![None; cols_for_row(r) as usize])
        .collect();

    let mut palette: Vec<u8> = (0..config.palette_size).collect();
    palette.shuffle(rng);
    palette.truncate(colors_for_level(level, config.palette_size) as usize);

    let in_area = |c: Cell| (0..num_rows).contains(&c.row) && (0..cols_for_row(c.row)).contains(&c.col);

    loop {
        let empty: Vec<Cell> = (0..num_rows)
            .flat_map(|r| (0..cols_for_row(r)).map(move |c| Cell::new(r, c)))
            .filter(|c| color_map[c.row as usize][c.col as usize].is_none())
            .collect();
        let (Some(&seed), Some(&color)) = (empty.choose(rng), palette.choose(rng)) else {
            break;
        };
        let target = rng.random_range(CLUSTER_SIZE);

        color_map[seed.row as usize][seed.col as usize] = Some(color);
        let mut painted = HashSet::from([seed]);
        let mut queue = VecDeque::from([seed]);
        while painted.len() < target {
            let Some(cur) = queue.pop_front() else { break };
            let mut offsets = *neighbor_offsets(cur.row);
            offsets.shuffle(rng);
            for (dr, dc) in offsets {
                if painted.len() >= target {
                    break;
                }
                let n = cur.offset(dr, dc);
                if !in_area(n) || painted.contains(&n) {
                    continue;
                }
                let slot = &mut color_map[n.row as usize][n.col as usize];
                if slot.is_none() {
                    *slot = Some(color);
                    painted.insert(n);
                    queue.push_back(n);
                }
            }
        }
    }

    for row in color_map.iter_mut() {
        for slot in row.iter_mut() {
            if rng.random::<f32>() < config.gap_chance {
                *slot = None;
            }
        }
    }

    for (r, row) in color_map.iter().enumerate() {
        for (c, slot) in row.iter().enumerate() {
            if let Some(color) = *slot {
                let kind = roll_kind(color, config.bomb_chance, rng);
                if let Err(e) = grid.place_bubble(Cell::new(r as i32, c as i32), kind) {
                    log::warn!("Initial layout skipped a cell: {e}");
                }
            }
        }
    }

    log::debug!(
        "Generated {} rows with {} colors, {} bubbles",
        num_rows,
        palette.len(),
        grid.len()
    );
}

/// Fill the (empty) top row after a descent.
///
/// Reuses the colors of row 1 (the old top row), sometimes adds one unused
/// color, and lays bubbles in runs of 2-4 with occasional gaps. Runs copy the
/// color of the bubble below them half the time. Returns the new row.
pub fn generate_pattern_row<R: Rng + ?Sized>(grid: &mut Grid, config: &GameConfig, rng: &mut R) -> Vec<Bubble> {
    let below: Vec<Option<u8>> = (0..cols_for_row(0))
        .map(|c| grid.get(Cell::new(1, c)).and_then(|b| b.kind.color()))
        .collect();

    let existing: Vec<u8> = {
        let mut seen: Vec<u8> = below.iter().flatten().copied().collect();
        seen.sort_unstable();
        seen.dedup();
        seen
    };
    let mut palette = if existing.is_empty() {
        vec![rng.random_range(0..config.palette_size)]
    } else {
        existing.clone()
    };

    if rng.random::<f32>() < NEW_COLOR_CHANCE && palette.len() < config.palette_size as usize {
        let unused: Vec<u8> = (0..config.palette_size)
            .filter(|c| !existing.contains(c))
            .collect();
        if let Some(&c) = unused.choose(rng) {
            palette.push(c);
        }
    }

    let max_cols = cols_for_row(0);
    let mut col = 0;
    while col < max_cols {
        if rng.random::<f32>() < ROW_GAP_CHANCE {
            col += 1;
            continue;
        }
        let below_color = below.get(col as usize).copied().flatten();
        let color = match below_color {
            Some(c) if rng.random::<f32>() < FOLLOW_BELOW_CHANCE => c,
            // Palette is never empty here
            _ => palette.choose(rng).copied().unwrap_or(0),
        };
        let run = rng.random_range(RUN_LENGTH);
        for _ in 0..run {
            if col >= max_cols {
                break;
            }
            let kind = roll_kind(color, config.bomb_chance, rng);
            if let Err(e) = grid.place_bubble(Cell::new(0, col), kind) {
                log::warn!("Descent row skipped a cell: {e}");
            }
            col += 1;
        }
    }

    grid.row_bubbles(0).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::hex::all_cells;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn config() -> GameConfig {
        GameConfig {
            bomb_chance: 0.0,
            ..GameConfig::default()
        }
    }

    #[test]
    fn test_clustered_grid_stays_in_rows() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut grid = Grid::new();
        generate_clustered_grid(&mut grid, 5, 1, &config(), &mut rng);

        assert!(!grid.is_empty());
        assert!(grid.bubbles().all(|b| b.row < 5));
        // Level 1 uses 3 colors
        assert!(grid.colors_present().len() <= 3);
    }

    #[test]
    fn test_clustered_grid_without_gaps_is_full() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut grid = Grid::new();
        let cfg = GameConfig {
            gap_chance: 0.0,
            ..config()
        };
        generate_clustered_grid(&mut grid, 4, 1, &cfg, &mut rng);
        let expected = all_cells().filter(|c| c.row < 4).count();
        assert_eq!(grid.len(), expected);
    }

    #[test]
    fn test_clustered_grid_is_deterministic() {
        let mut a = Grid::new();
        let mut b = Grid::new();
        generate_clustered_grid(&mut a, 6, 3, &config(), &mut Pcg32::seed_from_u64(99));
        generate_clustered_grid(&mut b, 6, 3, &config(), &mut Pcg32::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_pattern_row_fills_only_row_zero() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut grid = Grid::new();
        for col in 0..cols_for_row(1) {
            grid.place_bubble(Cell::new(1, col), BubbleKind::Colored(2)).unwrap();
        }
        let row = generate_pattern_row(&mut grid, &config(), &mut rng);

        assert!(row.iter().all(|b| b.row == 0));
        assert_eq!(row.len(), grid.row_bubbles(0).count());
        assert_eq!(grid.row_bubbles(1).count(), cols_for_row(1) as usize);
        // Only the color below plus at most one newcomer
        let colors: HashSet<u8> = row.iter().filter_map(|b| b.kind.color()).collect();
        assert!(colors.len() <= 2);
    }

    #[test]
    fn test_pick_next_color_uses_grid_colors() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut grid = Grid::new();
        grid.place_bubble(Cell::new(0, 0), BubbleKind::Colored(5)).unwrap();
        grid.place_bubble(Cell::new(0, 1), BubbleKind::Bomb).unwrap();
        for _ in 0..20 {
            assert_eq!(pick_next_color(&grid, 1, PALETTE_SIZE, &mut rng), 5);
        }
    }

    #[test]
    fn test_pick_next_color_empty_grid_is_level_scaled() {
        let mut rng = Pcg32::seed_from_u64(1);
        let grid = Grid::new();
        for _ in 0..50 {
            assert!(pick_next_color(&grid, 1, PALETTE_SIZE, &mut rng) <= 3);
        }
    }

    #[test]
    fn test_start_rows_capped() {
        let cfg = GameConfig::default();
        assert_eq!(start_rows(&cfg, 1), 4);
        assert_eq!(start_rows(&cfg, 3), 5);
        assert_eq!(start_rows(&cfg, 30), 6);
    }
}
