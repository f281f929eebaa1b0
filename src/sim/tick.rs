//! Simulation tick
//!
//! Advances the round by an elapsed time: shoot input, the descent timer,
//! projectile travel, and shot resolution all happen synchronously here.

use glam::Vec2;

use super::generate::generate_pattern_row;
use super::grid::BubbleKind;
use super::hex::Cell;
use super::matching::{clear_cells, detonate, drop_floating, flood_fill};
use super::state::{DiscardReason, GameEvent, GamePhase, GameState, bomb_score, clear_score};
use super::trajectory::{PathEnd, predict_heading};
use crate::consts::*;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Fire the waiting projectile toward this point (click/tap/space)
    pub shoot_at: Option<Vec2>,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the round by `dt_ms` milliseconds
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: f32) {
    if input.pause {
        state.toggle_pause();
    }

    // Don't tick if paused or game over
    match state.phase {
        GamePhase::Paused | GamePhase::GameOver => return,
        _ => {}
    }

    let dt_ms = dt_ms.max(0.0);
    state.time_ms += dt_ms as f64;

    if let Some(target) = input.shoot_at {
        state.shoot(target);
    }

    state.descent_timer_ms += dt_ms;
    if state.descent_timer_ms >= state.descent_interval_ms() {
        state.descent_timer_ms = 0.0;
        push_row_down(state);
        if state.is_game_over() {
            return;
        }
    }

    if state.phase == GamePhase::InFlight {
        advance_projectile(state, dt_ms);
    }
}

/// Move the in-flight projectile along its path, resolving it on arrival
fn advance_projectile(state: &mut GameState, dt_ms: f32) {
    let speed = state.config.shoot_speed;
    let Some(p) = state.projectile.as_mut() else {
        return;
    };
    let Some(flight) = p.flight.as_mut() else {
        return;
    };

    flight.travelled += speed * dt_ms / 1000.0;
    loop {
        let (pos, heading) = flight.path.sample(flight.travelled);
        p.pos = pos;
        p.vel = heading * speed;

        let length = flight.path.length();
        if flight.travelled < length {
            return;
        }
        if flight.path.end != PathEnd::StepLimit {
            break;
        }
        // Prediction gave up mid-air; keep flying from its end with the overshoot
        flight.travelled -= length;
        flight.path = predict_heading(&state.grid, pos, heading);
    }

    let impact = p.pos;
    resolve_shot(state, impact);
}

/// Land the current projectile at `impact` and apply the consequences.
///
/// Snaps to the closest empty cell, places the bubble, then either detonates
/// it (bomb) or checks for a match. A shot with no landing cell or a refused
/// placement is discarded. Finishes by checking for game over and spawning
/// the next projectile.
pub fn resolve_shot(state: &mut GameState, impact: Vec2) {
    if state.is_game_over() {
        return;
    }
    let Some(projectile) = state.projectile.take() else {
        return;
    };
    state.phase = GamePhase::Resolving;

    let Some(cell) = state.grid.find_best_cell(impact) else {
        log::warn!("No landing cell near {impact}, shot discarded");
        discard_shot(state, DiscardReason::NoLandingCell);
        return;
    };
    if let Err(e) = state.grid.place_bubble(cell, projectile.kind) {
        log::warn!("Shot discarded: {e}");
        discard_shot(state, DiscardReason::Rejected(e));
        return;
    }
    state.events.push(GameEvent::BubblePlaced {
        row: cell.row,
        col: cell.col,
        kind: projectile.kind,
    });

    match projectile.kind {
        BubbleKind::Bomb => resolve_bomb(state, cell),
        BubbleKind::Colored(color) => resolve_match(state, cell, color),
    }

    if state.check_game_over() {
        state.trigger_game_over();
        return;
    }
    state.spawn_projectile();
}

fn discard_shot(state: &mut GameState, reason: DiscardReason) {
    state.events.push(GameEvent::ShotDiscarded { reason });
    state.spawn_projectile();
}

fn resolve_bomb(state: &mut GameState, cell: Cell) {
    let destroyed = detonate(&mut state.grid, cell);
    log::debug!("Bomb at {:?} destroyed {}", cell, destroyed.len());
    state.events.push(GameEvent::BombDetonated {
        row: cell.row,
        col: cell.col,
        cells: destroyed.iter().map(|b| b.cell()).collect(),
    });
    state.add_score(bomb_score(destroyed.len()));
    report_drop(state);
}

fn resolve_match(state: &mut GameState, cell: Cell, color: u8) {
    let region = flood_fill(&state.grid, cell, color);
    if region.len() < MIN_MATCH {
        state.combo = 0;
        state.shots_without_clear += 1;
        return;
    }

    state.combo += 1;
    state.shots_without_clear = 0;
    let cleared = clear_cells(&mut state.grid, &region);
    state.events.push(GameEvent::BubblesCleared {
        cells: region,
        color,
        combo: state.combo,
    });
    let dropped = report_drop(state);

    let points = clear_score(cleared.len(), dropped, state.combo);
    log::debug!(
        "Cleared {} + dropped {} at combo {} for {} points",
        cleared.len(),
        dropped,
        state.combo,
        points
    );
    state.add_score(points);
}

/// Drop unsupported bubbles and report them; returns how many fell
fn report_drop(state: &mut GameState) -> usize {
    let dropped = drop_floating(&mut state.grid);
    if !dropped.is_empty() {
        state.events.push(GameEvent::BubblesDropped {
            count: dropped.len(),
            cells: dropped.iter().map(|b| b.cell()).collect(),
        });
    }
    dropped.len()
}

/// Push every row down one step and generate a new top row.
///
/// Ends the round instead if the bottom row is already occupied. Bubbles that
/// land in a column their new row does not have are discarded. A projectile
/// in flight re-plans its remaining path against the shifted grid.
pub fn push_row_down(state: &mut GameState) {
    if state.is_game_over() {
        return;
    }
    if state.grid.row_bubbles(ROWS as i32 - 1).next().is_some() {
        state.trigger_game_over();
        return;
    }

    let discarded = state.grid.shift_down();
    if !discarded.is_empty() {
        log::debug!("Descent discarded {} bubbles", discarded.len());
    }
    let row = generate_pattern_row(&mut state.grid, &state.config, &mut state.rng);
    log::info!("Row pushed down, {} new bubbles", row.len());
    state.events.push(GameEvent::RowPushedDown {
        row,
        discarded: discarded.len(),
    });

    if let Some(p) = state.projectile.as_mut() {
        if let Some(flight) = p.flight.as_mut() {
            flight.path = predict_heading(&state.grid, p.pos, p.vel);
            flight.travelled = 0.0;
        }
    }

    if state.check_game_over() {
        state.trigger_game_over();
    }
}
