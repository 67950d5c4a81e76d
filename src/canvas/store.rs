//! Storage for the items placed on the overview canvas.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::Receiver;

use super::item::{CanvasItem, ItemId};
use crate::events::{Notifier, StoreEvent};
use crate::geometry::{Rect, Vec2};
use crate::project::FileRef;

/// Owns every canvas item, in draw order.
///
/// Operations naming an id that is not (or no longer) present are silent
/// no-ops: stale callbacks after a folder switch are expected.
#[derive(Debug, Default)]
pub struct ItemStore {
    items: Vec<CanvasItem>,
    /// id -> index into `items`
    index: HashMap<ItemId, usize>,
    /// Counter for generating unique item IDs.
    next_id: u64,
    notifier: Notifier<StoreEvent>,
    /// Bumped on every mutation; lets hosts skip redraws cheaply.
    revision: u64,
}

impl ItemStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Subscribe to change events.
    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        self.notifier.subscribe()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Allocate a fresh id for a new item.
    pub fn allocate_id(&mut self) -> ItemId {
        let id = ItemId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        id
    }

    /// Build one item per file, all at the origin, with fresh ids.
    pub fn items_for_files(&mut self, files: &[FileRef]) -> Vec<CanvasItem> {
        files
            .iter()
            .map(|file| CanvasItem::new(self.allocate_id(), file.clone(), Vec2::ZERO))
            .collect()
    }

    /// Swap the entire collection.
    ///
    /// Items with duplicate ids are dropped (first one wins) so ids stay unique.
    pub fn replace_all(&mut self, items: Vec<CanvasItem>) {
        let mut seen = HashSet::with_capacity(items.len());
        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            if seen.insert(item.id()) {
                self.next_id = self.next_id.max(item.id().0 + 1);
                kept.push(item);
            } else {
                log::warn!("Dropping item with duplicate id {}", item.id());
            }
        }

        self.index = kept
            .iter()
            .enumerate()
            .map(|(i, item)| (item.id(), i))
            .collect();
        self.items = kept;
        self.revision += 1;

        log::debug!("Item store replaced: {} items", self.items.len());
        self.notifier.emit(StoreEvent::Replaced {
            count: self.items.len(),
        });
    }

    pub fn get(&self, id: ItemId) -> Option<&CanvasItem> {
        self.index.get(&id).map(|&i| &self.items[i])
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.index.contains_key(&id)
    }

    /// All items in draw order (later items are drawn on top).
    pub fn all(&self) -> &[CanvasItem] {
        &self.items
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.iter().map(CanvasItem::id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Apply `mutator` to one item. Returns `false` if the id is unknown.
    ///
    /// Does not notify; callers batch their own events via [`Self::notify`].
    pub fn update<F>(&mut self, id: ItemId, mutator: F) -> bool
    where
        F: FnOnce(&mut CanvasItem),
    {
        let Some(&i) = self.index.get(&id) else {
            log::trace!("Ignoring update for unknown item {}", id);
            return false;
        };
        mutator(&mut self.items[i]);
        self.revision += 1;
        true
    }

    /// Emit a change event to subscribers.
    pub fn notify(&mut self, event: StoreEvent) {
        self.notifier.emit(event);
    }

    /// Union of the footprints of `ids`, each shifted by `offset`.
    ///
    /// Unknown ids are skipped; `None` when nothing is left.
    pub fn bounding_box(&self, ids: &HashSet<ItemId>, offset: Vec2) -> Option<Rect> {
        ids.iter()
            .filter_map(|&id| self.get(id))
            .map(|item| item.footprint().translated(offset))
            .reduce(|acc, rect| acc.union(&rect))
    }

    /// Topmost item whose footprint contains `point`.
    pub fn hit_test(&self, point: Vec2) -> Option<ItemId> {
        self.items
            .iter()
            .rev()
            .find(|item| item.footprint().contains(point))
            .map(CanvasItem::id)
    }

    /// Every item whose footprint intersects `rect`.
    pub fn intersecting(&self, rect: &Rect) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|item| item.footprint().intersects(rect))
            .map(CanvasItem::id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;

    fn store_with(positions: &[(f32, f32)]) -> (ItemStore, Vec<ItemId>) {
        let mut store = ItemStore::new();
        let items: Vec<CanvasItem> = positions
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| {
                let id = store.allocate_id();
                let file = FileRef::new(format!("{i}.png"));
                let mut item = CanvasItem::new(id, file, Vec2::new(x, y));
                item.set_base_size(Size::new(100.0, 50.0));
                item
            })
            .collect();
        let ids = items.iter().map(CanvasItem::id).collect();
        store.replace_all(items);
        (store, ids)
    }

    #[test]
    fn test_replace_and_get() {
        let (store, ids) = store_with(&[(0.0, 0.0), (200.0, 0.0)]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(ids[1]).map(CanvasItem::position), Some(Vec2::new(200.0, 0.0)));
    }

    #[test]
    fn test_update_unknown_id_is_ignored() {
        let (mut store, ids) = store_with(&[(0.0, 0.0)]);
        let revision = store.revision();

        let stale = ItemId(ids[0].0 + 100);
        let called = store.update(stale, |item| {
            item.set_position(Vec2::new(1.0, 1.0));
        });

        assert!(!called);
        assert_eq!(store.revision(), revision);
        assert_eq!(store.get(ids[0]).map(CanvasItem::position), Some(Vec2::ZERO));
    }

    #[test]
    fn test_ids_not_reused_after_replace() {
        let (mut store, first) = store_with(&[(0.0, 0.0), (1.0, 1.0)]);
        let files = vec![FileRef::new("x.png")];
        let items = store.items_for_files(&files);
        store.replace_all(items);

        let new_id = store.ids().next().unwrap();
        assert!(!first.contains(&new_id));
        assert!(!store.contains(first[0]));
    }

    #[test]
    fn test_replace_drops_duplicate_ids() {
        let mut store = ItemStore::new();
        let id = store.allocate_id();
        store.replace_all(vec![
            CanvasItem::new(id, FileRef::new("a.png"), Vec2::ZERO),
            CanvasItem::new(id, FileRef::new("b.png"), Vec2::ZERO),
        ]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id).map(CanvasItem::filename), Some("a.png"));
    }

    #[test]
    fn test_bounding_box() {
        let (store, ids) = store_with(&[(0.0, 0.0), (200.0, 100.0)]);

        assert_eq!(store.bounding_box(&HashSet::new(), Vec2::ZERO), None);

        let all: HashSet<ItemId> = ids.iter().copied().collect();
        let bbox = store.bounding_box(&all, Vec2::ZERO).unwrap();
        assert_eq!(bbox, Rect::new(-50.0, -25.0, 300.0, 150.0));

        let shifted = store.bounding_box(&all, Vec2::new(10.0, -5.0)).unwrap();
        assert_eq!(shifted, Rect::new(-40.0, -30.0, 300.0, 150.0));
    }

    #[test]
    fn test_bounding_box_skips_unknown_ids() {
        let (store, ids) = store_with(&[(0.0, 0.0)]);
        let only_stale: HashSet<ItemId> = [ItemId(ids[0].0 + 10)].into_iter().collect();
        assert_eq!(store.bounding_box(&only_stale, Vec2::ZERO), None);
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let (store, ids) = store_with(&[(0.0, 0.0), (20.0, 0.0)]);
        assert_eq!(store.hit_test(Vec2::new(10.0, 0.0)), Some(ids[1]));
        assert_eq!(store.hit_test(Vec2::new(-45.0, 0.0)), Some(ids[0]));
        assert_eq!(store.hit_test(Vec2::new(500.0, 0.0)), None);
    }

    #[test]
    fn test_replace_notifies() {
        let mut store = ItemStore::new();
        let rx = store.subscribe();
        store.replace_all(Vec::new());
        assert_eq!(rx.try_recv().ok(), Some(StoreEvent::Replaced { count: 0 }));
    }
}
