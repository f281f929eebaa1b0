//! Projectile path prediction
//!
//! Marches a point upward in fixed steps, mirroring it off the side walls,
//! until it reaches the ceiling or comes within touching distance of a placed
//! bubble. The resulting polyline drives both the aim guide and the real shot:
//! a fired projectile follows exactly the predicted path.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::Grid;
use crate::consts::*;
use crate::{clamp_aim_angle, direction};

/// Why a predicted path stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathEnd {
    /// Reached the top of the grid
    Ceiling,
    /// Touched a placed bubble
    Bubble,
    /// Ran out of steps without hitting anything
    StepLimit,
}

/// Predicted flight path as a polyline from start to resting point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Start, every wall bounce, and the terminal point
    pub points: Vec<Vec2>,
    pub end: PathEnd,
}

impl Trajectory {
    /// Where the projectile comes to rest
    pub fn terminal(&self) -> Vec2 {
        self.points.last().copied().unwrap_or(Vec2::ZERO)
    }

    /// Total path length
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// Position and heading after travelling `distance` along the path.
    ///
    /// Distances past the end clamp to the terminal point. The heading is the
    /// unit direction of the segment being travelled.
    pub fn sample(&self, distance: f32) -> (Vec2, Vec2) {
        let mut remaining = distance.max(0.0);
        let mut heading = Vec2::NEG_Y;
        for w in self.points.windows(2) {
            let seg = w[1] - w[0];
            let len = seg.length();
            if len <= f32::EPSILON {
                continue;
            }
            heading = seg / len;
            if remaining <= len {
                return (w[0] + heading * remaining, heading);
            }
            remaining -= len;
        }
        (self.terminal(), heading)
    }
}

/// Predict the path of a shot fired at `angle` (radians, -π/2 is straight up).
///
/// The angle is clamped away from horizontal first.
pub fn predict(grid: &Grid, start: Vec2, angle: f32) -> Trajectory {
    predict_heading(grid, start, direction(clamp_aim_angle(angle)))
}

/// Predict the path from an arbitrary position and heading.
///
/// Used to re-plan a projectile already in flight when the grid changes.
pub fn predict_heading(grid: &Grid, start: Vec2, heading: Vec2) -> Trajectory {
    let mut points = vec![start];
    let mut pos = start;
    let mut vel = heading.normalize_or(Vec2::NEG_Y);
    let coll_sq = COLLISION_DIST * COLLISION_DIST;

    for _ in 0..TRAJECTORY_MAX_STEPS {
        pos += vel * TRAJECTORY_STEP;

        // Mirror the overshoot back inside and record the bounce
        if pos.x < WALL_L {
            pos.x = WALL_L + (WALL_L - pos.x);
            vel.x = vel.x.abs();
            points.push(Vec2::new(WALL_L, pos.y));
        } else if pos.x > WALL_R {
            pos.x = WALL_R - (pos.x - WALL_R);
            vel.x = -vel.x.abs();
            points.push(Vec2::new(WALL_R, pos.y));
        }

        if pos.y <= GRID_TOP {
            points.push(Vec2::new(pos.x, GRID_TOP));
            return Trajectory {
                points,
                end: PathEnd::Ceiling,
            };
        }

        // Bubbles more than one row away cannot be within one diameter
        let approx_row = ((pos.y - GRID_TOP) / ROW_H).round() as i32;
        let hit = (approx_row - 1..=approx_row + 1)
            .flat_map(|r| grid.row_bubbles(r))
            .any(|b| b.cell().center().distance_squared(pos) < coll_sq);
        if hit {
            points.push(pos);
            return Trajectory {
                points,
                end: PathEnd::Bubble,
            };
        }
    }

    log::debug!("Trajectory hit step limit at {pos}");
    points.push(pos);
    Trajectory {
        points,
        end: PathEnd::StepLimit,
    }
}
