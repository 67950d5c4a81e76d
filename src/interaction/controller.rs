//! Gesture state machine for the overview canvas.
//!
//! Pointer input is interpreted as panning, box selection, moving the
//! selection or resizing it, depending on what lies under the pointer when
//! the button goes down. Moves and resizes are previewed through the
//! transient fields of [`SelectionState`] and only written to the store on
//! release, so cancelling a gesture costs nothing.

use super::event::{InputEvent, Key, Modifiers, PointerButton};
use super::handles::{Corner, hit_handle};
use super::selection::{Placement, SelectionState};
use crate::canvas::{CanvasItem, ItemId, ItemStore};
use crate::config::Tuning;
use crate::constants::{
    DEGENERATE_DISTANCE, DRAG_THRESHOLD_PX, HANDLE_HIT_RADIUS_PX, MAX_ITEM_SCALE,
    MIN_GESTURE_FACTOR, MIN_ITEM_SCALE, WHEEL_ZOOM_STEP,
};
use crate::events::{OverviewEvent, StoreEvent};
use crate::geometry::{Camera, Rect, Size, Vec2, anchored_scale, screen_to_world, zoom_at};

/// Screen-space thresholds for gesture recognition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionSettings {
    /// Pointer travel before a press becomes a drag.
    pub drag_threshold: f32,
    /// Grab radius of the resize handles.
    pub handle_radius: f32,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            drag_threshold: DRAG_THRESHOLD_PX,
            handle_radius: HANDLE_HIT_RADIUS_PX,
        }
    }
}

impl InteractionSettings {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            drag_threshold: tuning.drag_threshold_px,
            handle_radius: tuning.handle_hit_radius_px,
        }
    }
}

/// State the controller reads and writes while handling one event.
pub struct InteractionContext<'a> {
    pub store: &'a mut ItemStore,
    pub camera: &'a mut Camera,
    pub viewport: Size,
}

/// What was under the pointer when the primary button went down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressTarget {
    Empty,
    Item {
        id: ItemId,
        /// Whether the item was selected before this press.
        selected_on_press: bool,
    },
    Handle(Corner),
}

/// Position and scale of a selected item when a resize began.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ItemSnapshot {
    id: ItemId,
    position: Vec2,
    scale: f32,
}

/// A group resize in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeGesture {
    /// Corner opposite the dragged handle, fixed for the whole gesture.
    pub anchor: Vec2,
    /// Distance from the anchor to where the handle was grabbed.
    start_distance: f32,
    snapshot: Vec<ItemSnapshot>,
    /// Factor bounds that keep every item scale within range.
    min_factor: f32,
    max_factor: f32,
}

impl ResizeGesture {
    /// Scale factor for the pointer at world position `pointer`.
    ///
    /// A degenerate grab distance yields `1.0`.
    pub fn factor_at(&self, pointer: Vec2) -> f32 {
        if self.start_distance < DEGENERATE_DISTANCE {
            return 1.0;
        }
        let raw = self.anchor.distance_to(pointer) / self.start_distance;
        if !raw.is_finite() {
            return 1.0;
        }
        raw.max(self.min_factor).min(self.max_factor)
    }
}

/// Interaction states.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Idle,
    /// Primary button down, not yet moved past the drag threshold.
    Pressed {
        origin: Vec2,
        modifiers: Modifiers,
        target: PressTarget,
    },
    Panning {
        last: Vec2,
    },
    /// Marquee from `origin` to `current`, in screen space.
    BoxSelecting {
        origin: Vec2,
        current: Vec2,
        additive: bool,
    },
    MovingSelection {
        last: Vec2,
    },
    Resizing(ResizeGesture),
}

/// Interprets [`InputEvent`]s against the item store and camera.
#[derive(Debug)]
pub struct InteractionController {
    settings: InteractionSettings,
    selection: SelectionState,
    gesture: Gesture,
    space_held: bool,
    /// Number of edits written to the store.
    commits: u64,
}

impl InteractionController {
    pub fn new(settings: InteractionSettings) -> Self {
        Self {
            settings,
            selection: SelectionState::new(),
            gesture: Gesture::Idle,
            space_held: false,
            commits: 0,
        }
    }

    /// How many moves and resizes have been committed so far.
    pub fn commits(&self) -> u64 {
        self.commits
    }

    pub fn settings(&self) -> &InteractionSettings {
        &self.settings
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn is_gesture_active(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    /// Drop everything; used when the item set is replaced.
    pub fn reset(&mut self) {
        self.gesture = Gesture::Idle;
        self.selection = SelectionState::new();
    }

    /// Handle one input event. Returns the view changes it caused.
    pub fn handle(
        &mut self,
        event: &InputEvent,
        ctx: &mut InteractionContext<'_>,
    ) -> Vec<OverviewEvent> {
        let mut events = Vec::new();
        match *event {
            InputEvent::PointerDown {
                position,
                button,
                modifiers,
            } => self.pointer_down(position, button, modifiers, ctx, &mut events),
            InputEvent::PointerMove { position } => self.pointer_move(position, ctx, &mut events),
            InputEvent::PointerUp {
                position,
                modifiers,
                ..
            } => self.pointer_up(position, modifiers, ctx, &mut events),
            InputEvent::Wheel {
                delta,
                position,
                modifiers,
            } => {
                let factor = WHEEL_ZOOM_STEP.powf(delta);
                if modifiers.ctrl && !self.selection.is_empty() {
                    self.scale_selection(factor, ctx.store);
                } else {
                    self.zoom_by(factor, position, ctx, &mut events);
                }
            }
            InputEvent::Pinch { factor, position } => {
                self.zoom_by(factor, position, ctx, &mut events)
            }
            InputEvent::DoubleClick { position, button } => {
                if button == PointerButton::Primary {
                    let world = screen_to_world(position, ctx.viewport, ctx.camera);
                    if let Some(id) = ctx.store.hit_test(world) {
                        events.push(OverviewEvent::OpenInEditor(id));
                    }
                }
            }
            InputEvent::KeyDown { key, .. } => match key {
                Key::Space => self.space_held = true,
                Key::Escape => events.extend(self.cancel()),
            },
            InputEvent::KeyUp { key, .. } => {
                if key == Key::Space {
                    self.space_held = false;
                }
            }
            InputEvent::Cancel => events.extend(self.cancel()),
        }
        events
    }

    /// Abort the current gesture, discarding any preview.
    pub fn cancel(&mut self) -> Vec<OverviewEvent> {
        let was_active = self.is_gesture_active();
        self.gesture = Gesture::Idle;
        self.selection.reset_transient();
        if was_active {
            log::debug!("Gesture cancelled");
            vec![OverviewEvent::PreviewChanged]
        } else {
            Vec::new()
        }
    }

    fn pointer_down(
        &mut self,
        position: Vec2,
        button: PointerButton,
        modifiers: Modifiers,
        ctx: &mut InteractionContext<'_>,
        events: &mut Vec<OverviewEvent>,
    ) {
        if self.is_gesture_active() {
            return;
        }
        let pans = button == PointerButton::Middle
            || (button == PointerButton::Primary && self.space_held);
        if pans {
            self.gesture = Gesture::Panning { last: position };
            return;
        }
        if button != PointerButton::Primary {
            return;
        }
        let target = self.press_target(position, modifiers, ctx, events);
        self.gesture = Gesture::Pressed {
            origin: position,
            modifiers,
            target,
        };
    }

    /// Resolve what a primary press hit, selecting a pressed item right away.
    fn press_target(
        &mut self,
        position: Vec2,
        modifiers: Modifiers,
        ctx: &InteractionContext<'_>,
        events: &mut Vec<OverviewEvent>,
    ) -> PressTarget {
        // Handles sit on the selection box edges and win over the items below
        if let Some(bounds) = ctx.store.bounding_box(self.selection.ids(), Vec2::ZERO) {
            if let Some(corner) =
                hit_handle(&bounds, position, ctx.viewport, ctx.camera, self.settings.handle_radius)
            {
                return PressTarget::Handle(corner);
            }
        }

        let world = screen_to_world(position, ctx.viewport, ctx.camera);
        let Some(id) = ctx.store.hit_test(world) else {
            return PressTarget::Empty;
        };

        let selected_on_press = self.selection.contains(id);
        if !selected_on_press {
            let changed = if modifiers.extends_selection() {
                self.selection.add(id)
            } else {
                self.selection.select_only(id)
            };
            if changed {
                events.push(OverviewEvent::SelectionChanged);
            }
        }
        PressTarget::Item { id, selected_on_press }
    }

    fn pointer_move(
        &mut self,
        position: Vec2,
        ctx: &mut InteractionContext<'_>,
        events: &mut Vec<OverviewEvent>,
    ) {
        if let Gesture::Pressed {
            origin,
            modifiers,
            target,
        } = self.gesture
        {
            if origin.distance_to(position) <= self.settings.drag_threshold {
                return;
            }
            self.begin_drag(origin, modifiers, target, ctx);
        }

        match &mut self.gesture {
            Gesture::Idle | Gesture::Pressed { .. } => {}
            Gesture::Panning { last } => {
                let delta = position - *last;
                *last = position;
                if delta != Vec2::ZERO {
                    ctx.camera.pan_by_screen(delta);
                    events.push(OverviewEvent::CameraChanged);
                }
            }
            Gesture::BoxSelecting { current, .. } => {
                *current = position;
                events.push(OverviewEvent::PreviewChanged);
            }
            Gesture::MovingSelection { last } => {
                // Divide by the zoom in effect now, not at gesture start
                let delta = (position - *last) / ctx.camera.zoom();
                *last = position;
                self.selection.add_drag_offset(delta);
                events.push(OverviewEvent::PreviewChanged);
            }
            Gesture::Resizing(resize) => {
                let pointer = screen_to_world(position, ctx.viewport, ctx.camera);
                let factor = resize.factor_at(pointer);
                self.selection.set_group_scale(resize.anchor, factor);
                events.push(OverviewEvent::PreviewChanged);
            }
        }
    }

    fn begin_drag(
        &mut self,
        origin: Vec2,
        modifiers: Modifiers,
        target: PressTarget,
        ctx: &InteractionContext<'_>,
    ) {
        self.gesture = match target {
            PressTarget::Empty => Gesture::BoxSelecting {
                origin,
                current: origin,
                additive: modifiers.extends_selection(),
            },
            PressTarget::Item { .. } => Gesture::MovingSelection { last: origin },
            PressTarget::Handle(corner) => match self.begin_resize(corner, origin, ctx) {
                Some(resize) => Gesture::Resizing(resize),
                None => Gesture::Idle,
            },
        };
        log::trace!("Drag started: {:?}", self.gesture);
    }

    fn begin_resize(
        &self,
        corner: Corner,
        press: Vec2,
        ctx: &InteractionContext<'_>,
    ) -> Option<ResizeGesture> {
        let bounds = ctx.store.bounding_box(self.selection.ids(), Vec2::ZERO)?;
        let anchor = corner.opposite().of(&bounds);
        let grab = screen_to_world(press, ctx.viewport, ctx.camera);

        let mut snapshot: Vec<ItemSnapshot> = self
            .selection
            .ids()
            .iter()
            .filter_map(|&id| ctx.store.get(id))
            .map(|item| ItemSnapshot {
                id: item.id(),
                position: item.position(),
                scale: item.item_scale(),
            })
            .collect();
        snapshot.sort_by_key(|s| s.id);

        let min_factor = snapshot
            .iter()
            .map(|s| MIN_ITEM_SCALE / s.scale)
            .fold(MIN_GESTURE_FACTOR, f32::max);
        let max_factor = snapshot
            .iter()
            .map(|s| MAX_ITEM_SCALE / s.scale)
            .fold(f32::INFINITY, f32::min);

        Some(ResizeGesture {
            anchor,
            start_distance: anchor.distance_to(grab),
            snapshot,
            min_factor,
            max_factor,
        })
    }

    fn pointer_up(
        &mut self,
        position: Vec2,
        modifiers: Modifiers,
        ctx: &mut InteractionContext<'_>,
        events: &mut Vec<OverviewEvent>,
    ) {
        // Account for travel since the last move event
        self.pointer_move(position, ctx, events);

        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Idle | Gesture::Panning { .. } => {}
            Gesture::Pressed { target, .. } => self.click(target, modifiers, events),
            Gesture::BoxSelecting {
                origin,
                current,
                additive,
            } => {
                // All four corners: the marquee is axis-aligned on screen
                let corners = [
                    origin,
                    Vec2::new(current.x, origin.y),
                    current,
                    Vec2::new(origin.x, current.y),
                ];
                let world = corners.map(|corner| screen_to_world(corner, ctx.viewport, ctx.camera));
                if let Some(rect) = Rect::bounding(world) {
                    let hits = ctx.store.intersecting(&rect);
                    if self.selection.apply_box(hits, additive) {
                        events.push(OverviewEvent::SelectionChanged);
                    }
                }
                events.push(OverviewEvent::PreviewChanged);
            }
            Gesture::MovingSelection { .. } => self.commit_move(ctx.store),
            Gesture::Resizing(resize) => self.commit_resize(&resize, ctx.store),
        }
        self.selection.reset_transient();
    }

    fn click(
        &mut self,
        target: PressTarget,
        modifiers: Modifiers,
        events: &mut Vec<OverviewEvent>,
    ) {
        let changed = match target {
            PressTarget::Item { id, selected_on_press } => {
                if modifiers.extends_selection() {
                    // Added on press if it was not selected yet
                    selected_on_press && self.selection.remove(id)
                } else {
                    self.selection.select_only(id)
                }
            }
            PressTarget::Empty => self.selection.clear(),
            PressTarget::Handle(_) => false,
        };
        if changed {
            events.push(OverviewEvent::SelectionChanged);
        }
    }

    fn commit_move(&mut self, store: &mut ItemStore) {
        let offset = self.selection.drag_offset();
        if offset == Vec2::ZERO {
            return;
        }
        let mut moved: Vec<ItemId> = self
            .selection
            .ids()
            .iter()
            .copied()
            .filter(|&id| {
                store.update(id, |item| {
                    item.set_position(item.position() + offset);
                })
            })
            .collect();
        moved.sort();
        log::debug!("Moved {} items by {:?}", moved.len(), offset);
        self.commits += 1;
        store.notify(StoreEvent::Moved(moved));
    }

    fn commit_resize(&mut self, resize: &ResizeGesture, store: &mut ItemStore) {
        let factor = self.selection.group_scale();
        if factor == 1.0 {
            return;
        }
        let moved: Vec<ItemId> = resize
            .snapshot
            .iter()
            .filter(|snap| {
                store.update(snap.id, |item| {
                    item.set_position(anchored_scale(snap.position, resize.anchor, factor));
                    item.set_item_scale(snap.scale * factor);
                })
            })
            .map(|snap| snap.id)
            .collect();
        log::debug!("Resized {} items by {:.3}", moved.len(), factor);
        self.commits += 1;
        store.notify(StoreEvent::Moved(moved));
    }

    /// Scale every selected item about its own center.
    fn scale_selection(&mut self, factor: f32, store: &mut ItemStore) {
        if self.is_gesture_active() || !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let mut scaled: Vec<ItemId> = self
            .selection
            .ids()
            .iter()
            .copied()
            .filter(|&id| store.update(id, |item| item.set_item_scale(item.item_scale() * factor)))
            .collect();
        scaled.sort();
        self.commits += 1;
        store.notify(StoreEvent::Moved(scaled));
    }

    fn zoom_by(
        &mut self,
        factor: f32,
        position: Vec2,
        ctx: &mut InteractionContext<'_>,
        events: &mut Vec<OverviewEvent>,
    ) {
        if self.is_gesture_active() {
            log::trace!("Ignoring zoom during {:?}", self.gesture);
            return;
        }
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let next = zoom_at(ctx.camera, position, ctx.viewport, ctx.camera.zoom() * factor);
        if next != *ctx.camera {
            *ctx.camera = next;
            events.push(OverviewEvent::CameraChanged);
        }
    }

    /// Where `item` is drawn, including the preview of a move or resize.
    pub fn placement(&self, item: &CanvasItem) -> Placement {
        self.selection.placement(item)
    }

    /// Footprint of `item` as drawn right now.
    pub fn preview_footprint(&self, item: &CanvasItem) -> Rect {
        self.selection.preview_footprint(item)
    }

    /// World-space box around the selection as drawn, for the handle overlay.
    pub fn selection_bounds(&self, store: &ItemStore) -> Option<Rect> {
        self.selection
            .ids()
            .iter()
            .filter_map(|&id| store.get(id))
            .map(|item| self.selection.preview_footprint(item))
            .reduce(|acc, rect| acc.union(&rect))
    }

    /// Screen-space marquee of an active box selection.
    pub fn marquee(&self) -> Option<Rect> {
        match self.gesture {
            Gesture::BoxSelecting { origin, current, .. } => {
                Some(Rect::from_corners(origin, current))
            }
            _ => None,
        }
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(InteractionSettings::default())
    }
}
