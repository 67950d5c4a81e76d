//! Auto-arrange: shelf packing of items into rows.
//!
//! Items are walked in their current order (never re-sorted). Each item is
//! appended to the current row until the row would exceed the virtual row
//! width, at which point a new row starts below the tallest item of the
//! previous one, leaving room for the filename labels.

use super::item::CanvasItem;
use crate::constants::{LAYOUT_ITEM_GAP, LAYOUT_LABEL_HEIGHT, LAYOUT_MAX_ROW_WIDTH, LAYOUT_ROW_GAP};
use crate::geometry::{Camera, Rect, Vec2};

/// Layout tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub max_row_width: f32,
    pub item_gap: f32,
    pub row_gap: f32,
    pub label_height: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            max_row_width: LAYOUT_MAX_ROW_WIDTH,
            item_gap: LAYOUT_ITEM_GAP,
            row_gap: LAYOUT_ROW_GAP,
            label_height: LAYOUT_LABEL_HEIGHT,
        }
    }
}

/// Result of an arrangement.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrangement {
    /// New center for each input item, in input order.
    pub positions: Vec<Vec2>,
    /// Bounding box of the placed items, `None` for no items.
    pub bounds: Option<Rect>,
    /// Camera centering the cluster at zoom 1.
    pub camera: Camera,
}

/// Compute a shelf layout for `items` (sizes are `base_size * item_scale`).
pub fn auto_arrange(items: &[CanvasItem], params: &LayoutParams) -> Arrangement {
    let mut cursor_x = 0.0_f32;
    let mut cursor_y = 0.0_f32;
    let mut row_height = 0.0_f32;
    let mut positions = Vec::with_capacity(items.len());

    for item in items {
        let size = item.scaled_size();

        // An item wider than a row still gets a row of its own
        if cursor_x > 0.0 && cursor_x + size.width > params.max_row_width {
            cursor_y += row_height + params.row_gap + params.label_height;
            cursor_x = 0.0;
            row_height = 0.0;
        }

        positions.push(Vec2::new(
            cursor_x + size.width / 2.0,
            cursor_y + size.height / 2.0,
        ));

        cursor_x += size.width + params.item_gap;
        row_height = row_height.max(size.height);
    }

    let bounds = items
        .iter()
        .zip(&positions)
        .map(|(item, &position)| Rect::from_center_size(position, item.scaled_size()))
        .reduce(|a, b| a.union(&b));

    let camera = match bounds {
        Some(rect) => Camera::new(-rect.center(), 1.0),
        None => Camera::identity(),
    };

    log::debug!(
        "Arranged {} items, bounds {:?}",
        positions.len(),
        bounds
    );

    Arrangement {
        positions,
        bounds,
        camera,
    }
}
