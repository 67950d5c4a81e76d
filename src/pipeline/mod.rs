//! Asynchronous image loading for the overview.
//!
//! Two workflows share one pool of decoder threads:
//! - thumbnail generation, started once per folder load and flushed into
//!   the item store in batches
//! - full-resolution promotion of the few items on screen once the camera
//!   settles, and release of those that left the view
//!
//! Decoder threads never mutate canvas state; [`ImagePipeline::poll`] applies
//! their results on the thread that owns the [`ItemStore`].

mod codec;
mod high_res;
mod thumbnails;
mod worker;

pub use codec::{ImageCodec, ImageCrateCodec};
pub use high_res::HighResPromoter;
pub use thumbnails::{ThumbnailBatch, ThumbnailProgress, ThumbnailUpdate};
pub use worker::{DecodeJob, DecoderPool, FullImageResult};

use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;
use web_time::Instant;

use crate::canvas::{CanvasItem, ItemId, ItemStore};
use crate::config::Tuning;
use crate::events::StoreEvent;

/// Pipeline tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub threads: usize,
    pub thumbnail_max_size: u32,
    pub batch_size: usize,
    pub high_res_visible_limit: usize,
    pub settle_delay: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_tuning(
            &Tuning::default(),
            crate::constants::DEFAULT_DECODER_THREADS,
            crate::constants::THUMBNAIL_MAX_SIZE,
        )
    }
}

impl PipelineSettings {
    pub fn from_tuning(tuning: &Tuning, threads: usize, thumbnail_max_size: u32) -> Self {
        Self {
            threads,
            thumbnail_max_size,
            batch_size: tuning.thumbnail_batch_size,
            high_res_visible_limit: tuning.high_res_visible_limit,
            settle_delay: Duration::from_millis(tuning.settle_delay_ms),
        }
    }
}

/// What one [`ImagePipeline::poll`] applied to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub thumbnails: Vec<ItemId>,
    pub full_images: Vec<ItemId>,
}

impl PollSummary {
    pub fn is_empty(&self) -> bool {
        self.thumbnails.is_empty() && self.full_images.is_empty()
    }
}

/// Outcome of one settled level-of-detail evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LodSummary {
    /// Full-resolution decodes requested.
    pub requested: usize,
    /// Items switched back to their thumbnails.
    pub released: Vec<ItemId>,
}

/// Coordinates thumbnail generation and full-resolution promotion.
pub struct ImagePipeline {
    pool: DecoderPool,
    batch: Arc<ThumbnailBatch>,
    full_rx: Receiver<FullImageResult>,
    promoter: HighResPromoter,
    thumbnail_max_size: u32,
}

impl ImagePipeline {
    pub fn new(codec: Arc<dyn ImageCodec>, settings: PipelineSettings) -> std::io::Result<Self> {
        let batch = Arc::new(ThumbnailBatch::new(settings.batch_size));
        let (pool, full_rx) = DecoderPool::spawn(settings.threads, codec, batch.clone())?;
        Ok(Self {
            pool,
            batch,
            full_rx,
            promoter: HighResPromoter::new(settings.high_res_visible_limit, settings.settle_delay),
            thumbnail_max_size: settings.thumbnail_max_size,
        })
    }

    /// Queue thumbnail decodes for `items`, abandoning any previous run.
    pub fn start_thumbnails(&mut self, items: &[CanvasItem]) {
        self.promoter.reset();
        let epoch = self.batch.begin(items.len());
        for item in items {
            self.pool.submit(DecodeJob::Thumbnail {
                epoch,
                id: item.id(),
                file: item.file().clone(),
                max_size: self.thumbnail_max_size,
            });
        }
        log::info!("Queued {} thumbnail decodes", items.len());
    }

    /// Request the full-resolution image for `item`.
    ///
    /// Returns `false` (and does nothing) if the item is already high-res, a
    /// request for it is in flight, or an earlier attempt failed.
    pub fn request_high_res(&mut self, item: &CanvasItem) -> bool {
        if item.is_high_res() || !self.promoter.begin(item.id()) {
            return false;
        }
        log::debug!("Requesting full resolution for {}", item.filename());
        let submitted = self.pool.submit(DecodeJob::Full {
            id: item.id(),
            file: item.file().clone(),
        });
        if !submitted {
            self.promoter.finish(item.id(), false);
        }
        submitted
    }

    /// Note a camera change; promotion waits until it settles.
    pub fn camera_moved(&mut self, now: Instant) {
        self.promoter.camera_moved(now);
    }

    /// Re-evaluate level of detail once the camera has settled.
    ///
    /// High-res items outside `visible`, or every high-res item when too many
    /// are visible, go back to their thumbnails. Visible items are then
    /// promoted if few enough are on screen.
    pub fn update_lod(
        &mut self,
        store: &mut ItemStore,
        visible: &[ItemId],
        now: Instant,
    ) -> LodSummary {
        let mut summary = LodSummary::default();
        if !self.promoter.take_settled(now) {
            return summary;
        }

        let kept = self.promoter.retain_visible(visible);
        let released: Vec<ItemId> = store
            .all()
            .iter()
            .filter(|item| item.is_high_res() && !kept.contains(&item.id()))
            .map(CanvasItem::id)
            .collect();
        for &id in &released {
            store.update(id, |item| {
                item.release_full_image();
            });
        }
        if !released.is_empty() {
            log::debug!("Released {} full-resolution images", released.len());
            store.notify(StoreEvent::ImagesUpdated(released.clone()));
        }
        summary.released = released;

        let items: Vec<&CanvasItem> = visible.iter().filter_map(|&id| store.get(id)).collect();
        let candidates = self.promoter.candidates(&items);
        summary.requested = candidates
            .into_iter()
            .filter(|item| self.request_high_res(item))
            .count();
        summary
    }

    /// Apply finished decodes to `store` and notify its subscribers.
    pub fn poll(&mut self, store: &mut ItemStore) -> PollSummary {
        let mut summary = PollSummary::default();

        if let Some(updates) = self.batch.take_ready() {
            for update in updates {
                let Ok((bitmap, size)) = update.result else {
                    continue;
                };
                let mut applied = false;
                store.update(update.id, |item| applied = item.apply_thumbnail(bitmap, size));
                if applied {
                    summary.thumbnails.push(update.id);
                }
            }
        }

        loop {
            match self.full_rx.try_recv() {
                Ok(FullImageResult { id, result }) => {
                    self.promoter.finish(id, result.is_ok());
                    if !self.promoter.is_wanted(id) {
                        log::trace!("Dropping full image for {}: no longer in view", id);
                        continue;
                    }
                    if let Ok(bitmap) = result {
                        if store.update(id, |item| {
                            item.apply_full_image(bitmap);
                        }) {
                            summary.full_images.push(id);
                        }
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("Decoder threads disconnected");
                    break;
                }
            }
        }

        let mut changed = summary.thumbnails.clone();
        changed.extend(&summary.full_images);
        if !changed.is_empty() {
            store.notify(StoreEvent::ImagesUpdated(changed));
        }
        summary
    }

    pub fn progress(&self) -> ThumbnailProgress {
        self.batch.progress()
    }

    /// No thumbnails outstanding and no full-resolution decodes in flight.
    pub fn is_idle(&self) -> bool {
        self.batch.progress().is_done() && self.promoter.in_flight_count() == 0
    }

    pub fn is_high_res_pending(&self, id: ItemId) -> bool {
        self.promoter.is_in_flight(id)
    }

    pub fn thread_count(&self) -> usize {
        self.pool.thread_count()
    }
}
