//! Selected items and the uncommitted transform of the current gesture.

use std::collections::HashSet;

use crate::canvas::{CanvasItem, ItemId};
use crate::constants::{MAX_ITEM_SCALE, MIN_ITEM_SCALE};
use crate::geometry::{Rect, Vec2, anchored_scale};

/// Where an item is drawn, including any gesture preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec2,
    pub scale: f32,
}

/// Selected ids plus the transient move/scale applied to them while a
/// gesture is in progress.
///
/// The transient fields are back at identity whenever no gesture runs.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    selected: HashSet<ItemId>,
    drag_offset: Vec2,
    group_scale: f32,
    group_anchor: Vec2,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionState {
    pub fn new() -> Self {
        Self {
            selected: HashSet::new(),
            drag_offset: Vec2::ZERO,
            group_scale: 1.0,
            group_anchor: Vec2::ZERO,
        }
    }

    pub fn ids(&self) -> &HashSet<ItemId> {
        &self.selected
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.selected.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Select exactly `id`. Returns `true` if the selection changed.
    pub fn select_only(&mut self, id: ItemId) -> bool {
        if self.selected.len() == 1 && self.selected.contains(&id) {
            return false;
        }
        self.selected.clear();
        self.selected.insert(id);
        true
    }

    pub fn add(&mut self, id: ItemId) -> bool {
        self.selected.insert(id)
    }

    pub fn remove(&mut self, id: ItemId) -> bool {
        self.selected.remove(&id)
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.selected.is_empty();
        self.selected.clear();
        changed
    }

    /// Replace the selection with `ids`, or add them when `additive`.
    pub fn apply_box(&mut self, ids: impl IntoIterator<Item = ItemId>, additive: bool) -> bool {
        let before = self.selected.clone();
        if !additive {
            self.selected.clear();
        }
        self.selected.extend(ids);
        self.selected != before
    }

    pub fn drag_offset(&self) -> Vec2 {
        self.drag_offset
    }

    pub fn group_scale(&self) -> f32 {
        self.group_scale
    }

    pub fn group_anchor(&self) -> Vec2 {
        self.group_anchor
    }

    /// Add a world-space delta to the move preview.
    pub fn add_drag_offset(&mut self, delta: Vec2) {
        if delta.is_finite() {
            self.drag_offset += delta;
        }
    }

    /// Set the group-resize preview.
    pub fn set_group_scale(&mut self, anchor: Vec2, factor: f32) {
        if anchor.is_finite() && factor.is_finite() && factor > 0.0 {
            self.group_anchor = anchor;
            self.group_scale = factor;
        }
    }

    /// Whether a move or scale preview is active.
    pub fn has_preview(&self) -> bool {
        self.drag_offset != Vec2::ZERO || self.group_scale != 1.0
    }

    /// Return the transient fields to identity.
    pub fn reset_transient(&mut self) {
        self.drag_offset = Vec2::ZERO;
        self.group_scale = 1.0;
        self.group_anchor = Vec2::ZERO;
    }

    /// Where `item` is drawn right now.
    pub fn placement(&self, item: &CanvasItem) -> Placement {
        if !self.contains(item.id()) {
            return Placement {
                position: item.position(),
                scale: item.item_scale(),
            };
        }
        let position = anchored_scale(item.position(), self.group_anchor, self.group_scale)
            + self.drag_offset;
        let scale = (item.item_scale() * self.group_scale).clamp(MIN_ITEM_SCALE, MAX_ITEM_SCALE);
        Placement { position, scale }
    }

    /// Footprint of `item` as drawn right now.
    pub fn preview_footprint(&self, item: &CanvasItem) -> Rect {
        let placement = self.placement(item);
        Rect::from_center_size(placement.position, item.base_size().scaled(placement.scale))
    }
}
