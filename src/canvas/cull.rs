//! View-frustum culling for the overview canvas.

use super::item::CanvasItem;
use crate::geometry::{Camera, CullMargin, Size, expanded_viewport_world_rect};

/// Culling parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CullSettings {
    /// Item counts below this skip culling entirely.
    pub threshold: usize,
    pub margin: CullMargin,
}

impl Default for CullSettings {
    fn default() -> Self {
        Self {
            threshold: crate::constants::CULL_THRESHOLD,
            margin: CullMargin::Pixels(crate::constants::CULL_MARGIN_PX),
        }
    }
}

/// Items worth drawing for the given viewport and camera.
///
/// Pure: the result depends only on the arguments.
pub fn visible_items<'a>(
    items: &'a [CanvasItem],
    viewport: Size,
    camera: &Camera,
    settings: &CullSettings,
) -> Vec<&'a CanvasItem> {
    if items.len() < settings.threshold {
        return items.iter().collect();
    }

    let view = expanded_viewport_world_rect(viewport, camera, settings.margin);
    items
        .iter()
        .filter(|item| item.footprint().intersects(&view))
        .collect()
}
