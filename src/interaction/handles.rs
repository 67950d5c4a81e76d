//! Corner resize handles of the selection box.

use crate::geometry::{Camera, Rect, Size, Vec2, world_to_screen};

/// A corner of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// The diagonally opposite corner.
    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }

    /// This corner of `rect`.
    pub fn of(self, rect: &Rect) -> Vec2 {
        match self {
            Corner::TopLeft => rect.top_left(),
            Corner::TopRight => rect.top_right(),
            Corner::BottomLeft => rect.bottom_left(),
            Corner::BottomRight => rect.bottom_right(),
        }
    }
}

/// Handle of the world-space `bounds` under `pointer`, if any.
///
/// The grab radius is in screen pixels so handles stay usable at any zoom.
/// When handles overlap (tiny boxes) the nearest wins.
pub fn hit_handle(
    bounds: &Rect,
    pointer: Vec2,
    viewport: Size,
    camera: &Camera,
    radius: f32,
) -> Option<Corner> {
    Corner::ALL
        .into_iter()
        .map(|corner| {
            let screen = world_to_screen(corner.of(bounds), viewport, camera);
            (corner, screen.distance_to(pointer))
        })
        .filter(|(_, distance)| *distance <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(corner, _)| corner)
}
