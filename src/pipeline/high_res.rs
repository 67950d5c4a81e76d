//! Level-of-detail bookkeeping for full-resolution promotion.
//!
//! Promotion only runs once the camera has been still for the settle delay,
//! only when few items are visible, and at most once per item: requests are
//! de-duplicated while in flight, and failed items are not retried. Items
//! that leave the view drop back to their thumbnails.

use std::collections::HashSet;
use std::time::Duration;
use web_time::Instant;

use crate::canvas::{CanvasItem, ItemId};

/// Tracks which items have full-resolution decodes pending or failed.
#[derive(Debug)]
pub struct HighResPromoter {
    visible_limit: usize,
    settle_delay: Duration,
    /// Time of the last camera change not yet evaluated.
    last_camera_change: Option<Instant>,
    in_flight: HashSet<ItemId>,
    failed: HashSet<ItemId>,
    /// Items allowed to show full resolution as of the last evaluation.
    wanted: HashSet<ItemId>,
}

impl HighResPromoter {
    pub fn new(visible_limit: usize, settle_delay: Duration) -> Self {
        Self {
            visible_limit,
            settle_delay,
            last_camera_change: None,
            in_flight: HashSet::new(),
            failed: HashSet::new(),
            wanted: HashSet::new(),
        }
    }

    /// Forget everything; used when the item set is replaced.
    pub fn reset(&mut self) {
        self.in_flight.clear();
        self.failed.clear();
        self.wanted.clear();
        self.last_camera_change = None;
    }

    /// Note that pan or zoom changed at `now`.
    pub fn camera_moved(&mut self, now: Instant) {
        self.last_camera_change = Some(now);
    }

    /// Whether a camera change has settled and should be evaluated.
    pub fn is_settled(&self, now: Instant) -> bool {
        self.last_camera_change
            .is_some_and(|changed| now.saturating_duration_since(changed) >= self.settle_delay)
    }

    /// Consume a settled camera change. Returns `true` once per change.
    pub fn take_settled(&mut self, now: Instant) -> bool {
        if self.is_settled(now) {
            self.last_camera_change = None;
            true
        } else {
            false
        }
    }

    /// Items among `visible` that should be promoted now.
    pub fn candidates<'a>(&self, visible: &[&'a CanvasItem]) -> Vec<&'a CanvasItem> {
        if visible.len() > self.visible_limit {
            return Vec::new();
        }
        visible
            .iter()
            .copied()
            .filter(|item| {
                !item.is_high_res()
                    && !self.in_flight.contains(&item.id())
                    && !self.failed.contains(&item.id())
            })
            .collect()
    }

    /// Record which of `visible` may keep full resolution and return them.
    ///
    /// Nothing qualifies when more than the visible limit are on screen.
    pub fn retain_visible(&mut self, visible: &[ItemId]) -> &HashSet<ItemId> {
        self.wanted.clear();
        if visible.len() <= self.visible_limit {
            self.wanted.extend(visible.iter().copied());
        }
        &self.wanted
    }

    /// Whether a finished full decode for `id` should still be shown.
    pub fn is_wanted(&self, id: ItemId) -> bool {
        self.wanted.contains(&id)
    }

    /// Claim `id` for a decode. Returns `false` if one is already pending.
    pub fn begin(&mut self, id: ItemId) -> bool {
        if self.failed.contains(&id) {
            return false;
        }
        let claimed = self.in_flight.insert(id);
        if claimed {
            self.wanted.insert(id);
        }
        claimed
    }

    /// Record the outcome of a decode started with [`Self::begin`].
    pub fn finish(&mut self, id: ItemId, succeeded: bool) {
        self.in_flight.remove(&id);
        if !succeeded {
            self.failed.insert(id);
        }
    }

    pub fn is_in_flight(&self, id: ItemId) -> bool {
        self.in_flight.contains(&id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec2;
    use crate::project::FileRef;

    fn items(n: u64) -> Vec<CanvasItem> {
        (1..=n)
            .map(|i| CanvasItem::new(ItemId(i), FileRef::new(format!("{i}.png")), Vec2::ZERO))
            .collect()
    }

    #[test]
    fn test_settle_delay() {
        let mut promoter = HighResPromoter::new(5, Duration::from_millis(200));
        let start = Instant::now();
        assert!(!promoter.is_settled(start));

        promoter.camera_moved(start);
        assert!(!promoter.take_settled(start + Duration::from_millis(100)));
        assert!(promoter.take_settled(start + Duration::from_millis(200)));
        // Consumed
        assert!(!promoter.take_settled(start + Duration::from_millis(300)));
    }

    #[test]
    fn test_no_candidates_when_too_many_visible() {
        let promoter = HighResPromoter::new(5, Duration::ZERO);
        let items = items(6);
        let visible: Vec<&CanvasItem> = items.iter().collect();
        assert!(promoter.candidates(&visible).is_empty());
        assert_eq!(promoter.candidates(&visible[..5]).len(), 5);
    }

    #[test]
    fn test_in_flight_and_failed_are_skipped() {
        let mut promoter = HighResPromoter::new(5, Duration::ZERO);
        let items = items(3);
        let visible: Vec<&CanvasItem> = items.iter().collect();

        assert!(promoter.begin(ItemId(1)));
        assert!(!promoter.begin(ItemId(1)));
        assert!(promoter.begin(ItemId(2)));
        promoter.finish(ItemId(2), false);
        assert!(!promoter.begin(ItemId(2)));

        let ids: Vec<ItemId> = promoter.candidates(&visible).iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec![ItemId(3)]);
    }

    #[test]
    fn test_retain_visible() {
        let mut promoter = HighResPromoter::new(2, Duration::ZERO);
        assert!(promoter.begin(ItemId(9)));
        assert!(promoter.is_wanted(ItemId(9)));

        let kept = promoter.retain_visible(&[ItemId(1), ItemId(2)]);
        assert_eq!(kept.len(), 2);
        assert!(!promoter.is_wanted(ItemId(9)));

        // Zoomed out past the limit: nothing keeps full resolution
        assert!(promoter.retain_visible(&[ItemId(1), ItemId(2), ItemId(3)]).is_empty());
        assert!(!promoter.is_wanted(ItemId(1)));
    }
}
