//! # Visibility Module
//!
//! Field-of-vision computation: a circular radius filter around the observer
//! with one integer Bresenham ray per candidate cell, stopped at the first
//! opaque cell.

use crate::game::{Grid, Level, Position};

impl Level {
    /// Recomputes the visible set around `origin`.
    ///
    /// Every `visible` flag on the grid is cleared first, then rays are cast
    /// to all cells of the `(2·radius+1)²` bounding square whose Euclidean
    /// distance from the origin is within `radius`. `seen` flags only ever
    /// accumulate. Monsters and items never occlude; only wall/blank terrain
    /// and closed doors stop a ray.
    pub fn refresh_visibility(&mut self, origin: Position, radius: i32) {
        self.grid.clear_visible();
        for y in (origin.y - radius)..=(origin.y + radius) {
            for x in (origin.x - radius)..=(origin.x + radius) {
                let target = Position::new(x, y);
                if origin.euclidean_distance(target) <= radius as f64 {
                    cast_ray(&mut self.grid, origin, target);
                }
            }
        }
    }
}

/// Rasterizes the ray from `start` to `end`, marking every traversed cell
/// visible and seen, and stops at (and including) the first opaque cell.
///
/// Standard integer Bresenham: the steep branch swaps axes so the primary
/// axis always advances one cell per step while accumulated error decides
/// secondary-axis steps. The walk always begins at `start`, so occlusion is
/// evaluated from the observer outward.
fn cast_ray(grid: &mut Grid, start: Position, end: Position) {
    let steep = (end.y - start.y).abs() > (end.x - start.x).abs();
    let (start, end) = if steep {
        (
            Position::new(start.y, start.x),
            Position::new(end.y, end.x),
        )
    } else {
        (start, end)
    };

    let delta_y = (end.y - start.y).abs();
    let y_step = if start.y >= end.y { -1 } else { 1 };
    let x_step = if start.x > end.x { -1 } else { 1 };
    let delta_x = (end.x - start.x).abs();

    let mut err = 0;
    let mut y = start.y;
    let mut x = start.x;
    loop {
        let cell = if steep {
            Position::new(y, x)
        } else {
            Position::new(x, y)
        };
        // Out-of-grid cells terminate the ray without being marked.
        let Some(tile) = grid.get_mut(cell) else {
            return;
        };
        tile.visible = true;
        tile.seen = true;
        if !tile.is_transparent() {
            return;
        }
        if x == end.x {
            return;
        }
        x += x_step;
        err += delta_y;
        if 2 * err >= delta_x {
            y += y_step;
            err -= delta_x;
        }
    }
}
