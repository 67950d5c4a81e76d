//! Background dot grid.

use crate::constants::{GRID_MAX_POINTS, GRID_MIN_ZOOM};
use crate::geometry::{Rect, Vec2};

/// World-space dot positions covering `visible`, aligned to multiples of `grid_size`.
///
/// Empty when zoomed out below [`GRID_MIN_ZOOM`] or when `grid_size` is not
/// positive. The step doubles until at most [`GRID_MAX_POINTS`] dots remain.
pub fn dot_grid(visible: &Rect, grid_size: f32, zoom: f32) -> Vec<Vec2> {
    if zoom < GRID_MIN_ZOOM
        || grid_size.is_nan()
        || grid_size <= 0.0
        || !visible.width.is_finite()
        || !visible.height.is_finite()
    {
        return Vec::new();
    }

    let mut step = grid_size;
    let count = |step: f32| {
        let cols = ((visible.width / step).floor() as usize).saturating_add(2);
        let rows = ((visible.height / step).floor() as usize).saturating_add(2);
        cols.saturating_mul(rows)
    };
    while count(step) > GRID_MAX_POINTS {
        step *= 2.0;
    }

    let left = (visible.left() / step).floor() * step;
    let top = (visible.top() / step).floor() * step;
    // Far from the origin one step no longer changes an f32 coordinate
    if left + step == left || top + step == top {
        log::trace!("Grid step {} below float precision at {:?}", step, visible.top_left());
        return Vec::new();
    }

    let cols = (((visible.right() - left) / step).floor() as usize).saturating_add(1);
    let rows = (((visible.bottom() - top) / step).floor() as usize).saturating_add(1);
    let mut points = Vec::with_capacity(cols.saturating_mul(rows).min(GRID_MAX_POINTS));
    'rows: for row in 0..rows {
        for col in 0..cols {
            if points.len() == GRID_MAX_POINTS {
                break 'rows;
            }
            points.push(Vec2::new(left + col as f32 * step, top + row as f32 * step));
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_when_zoomed_out() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(dot_grid(&rect, 40.0, 0.1).is_empty());
        assert!(dot_grid(&rect, 0.0, 1.0).is_empty());
    }

    #[test]
    fn test_points_aligned_to_grid() {
        let rect = Rect::new(-50.0, 10.0, 100.0, 60.0);
        let points = dot_grid(&rect, 40.0, 1.0);

        assert!(!points.is_empty());
        for p in &points {
            assert_eq!(p.x % 40.0, 0.0);
            assert_eq!(p.y % 40.0, 0.0);
        }
        assert!(points.contains(&Vec2::new(-80.0, 0.0)));
        assert!(points.contains(&Vec2::new(40.0, 40.0)));
    }

    #[test]
    fn test_point_count_bounded() {
        let rect = Rect::new(0.0, 0.0, 100_000.0, 100_000.0);
        let points = dot_grid(&rect, 10.0, 1.0);
        assert!(points.len() <= GRID_MAX_POINTS);
        assert!(points.len() > 100);
    }

    #[test]
    fn test_far_from_origin() {
        let rect = Rect::new(3.0e9, 0.0, 800.0, 600.0);
        assert!(dot_grid(&rect, 40.0, 1.0).is_empty());

        let rect = Rect::new(1.0e6, 0.0, 800.0, 600.0);
        let points = dot_grid(&rect, 40.0, 1.0);
        assert!(!points.is_empty() && points.len() <= GRID_MAX_POINTS);
        assert!(points.iter().all(|p| p.x >= 1.0e6 - 40.0 && p.x <= 1.0e6 + 840.0));
    }
}
