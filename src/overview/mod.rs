//! The overview: an infinite canvas of every image in the reviewed folder.
//!
//! [`Overview`] ties the pieces together on the thread that owns the canvas:
//!
//! - folder listing fills the [`ItemStore`] and the layout places the items
//! - the [`ImagePipeline`] decodes thumbnails off-thread; [`Overview::tick`]
//!   applies them and promotes visible items to full resolution once the
//!   camera settles
//! - [`Overview::handle_input`] feeds pointer and key events to the
//!   [`InteractionController`]
//!
//! Hosts render from [`Overview::visible_items`], [`Overview::placement`] and
//! [`Overview::dot_grid`], and redraw when a subscription reports a change.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use web_time::Instant;

use crate::canvas::{
    CanvasItem, CullSettings, ItemId, ItemStore, LayoutParams, auto_arrange, dot_grid,
    visible_items,
};
use crate::config::OverviewConfig;
use crate::error::OverviewError;
use crate::events::{Notifier, OverviewEvent, StoreEvent};
use crate::geometry::{Camera, CullMargin, Rect, Size, Vec2, viewport_world_rect, world_to_screen};
use crate::interaction::{
    InputEvent, InteractionContext, InteractionController, InteractionSettings, Placement,
    SelectionState,
};
use crate::pipeline::{
    ImageCodec, ImagePipeline, PipelineSettings, PollSummary, ThumbnailProgress,
};
use crate::project::{FileRef, FileSystemProvider};
use crate::results::{JsonResultsStore, ResultsStore, ReviewResults, ReviewStats, ReviewStatus};

/// The overview canvas for one folder at a time.
pub struct Overview {
    provider: Box<dyn FileSystemProvider>,
    pipeline: ImagePipeline,
    store: ItemStore,
    camera: Camera,
    viewport: Size,
    controller: InteractionController,
    notifier: Notifier<OverviewEvent>,
    cull: CullSettings,
    layout: LayoutParams,
    grid_size: f32,
    max_items: usize,
    folder: Option<PathBuf>,
    /// Every image in the folder, including those beyond `max_items`.
    files: Vec<FileRef>,
    results: ReviewResults,
    /// Re-arrange once the thumbnails are in, unless the user edited first.
    relayout_pending: Option<u64>,
}

impl Overview {
    pub fn new(
        config: &OverviewConfig,
        provider: Box<dyn FileSystemProvider>,
        codec: Arc<dyn ImageCodec>,
    ) -> Result<Self, OverviewError> {
        let tuning = &config.tuning;
        let preferences = &config.preferences;
        let pipeline = ImagePipeline::new(
            codec,
            PipelineSettings::from_tuning(
                tuning,
                preferences.decoder_threads,
                preferences.thumbnail_max_size,
            ),
        )?;

        Ok(Self {
            provider,
            pipeline,
            store: ItemStore::new(),
            camera: Camera::identity(),
            viewport: Size::new(800.0, 600.0),
            controller: InteractionController::new(InteractionSettings::from_tuning(tuning)),
            notifier: Notifier::new(),
            cull: CullSettings {
                threshold: tuning.cull_threshold,
                margin: CullMargin::Pixels(tuning.cull_margin_px),
            },
            layout: LayoutParams::default(),
            grid_size: preferences.grid_size,
            max_items: tuning.max_items,
            folder: None,
            files: Vec::new(),
            results: ReviewResults::new(),
            relayout_pending: None,
        })
    }

    /// Load `folder`, replacing whatever was shown before.
    ///
    /// Only the first `max_items` images become canvas items. Returns how
    /// many were loaded.
    pub fn open(&mut self, folder: &Path) -> Result<usize, OverviewError> {
        let files = self.provider.list_image_files(folder)?;
        let shown = files.len().min(self.max_items);
        if shown < files.len() {
            log::info!(
                "Folder has {} images, showing the first {} in the overview",
                files.len(),
                shown
            );
        }

        let items = self.store.items_for_files(&files[..shown]);
        self.controller.reset();
        self.store.replace_all(items);
        self.results = JsonResultsStore::for_folder(folder).load();
        self.files = files;
        self.folder = Some(folder.to_path_buf());

        self.arrange_and_fit();
        self.pipeline.start_thumbnails(self.store.all());
        // A fresh folder counts as a camera change for promotion
        self.pipeline.camera_moved(Instant::now());
        self.relayout_pending = Some(self.controller.commits());
        self.notifier.emit(OverviewEvent::SelectionChanged);

        log::info!("Opened {:?}: {} items", folder, shown);
        Ok(shown)
    }

    /// Apply finished decodes and re-evaluate level of detail.
    ///
    /// Call once per frame (or on a timer) from the thread that owns the overview.
    pub fn tick(&mut self, now: Instant) -> PollSummary {
        // Checked before polling: once the run is done, this poll drains the rest
        let thumbnails_done = self.pipeline.progress().is_done();
        let summary = self.pipeline.poll(&mut self.store);

        if thumbnails_done {
            if let Some(commits) = self.relayout_pending.take() {
                if commits == self.controller.commits() {
                    log::debug!("Thumbnails loaded, re-arranging with final sizes");
                    self.arrange_and_fit();
                }
            }
        }

        let visible: Vec<ItemId> =
            visible_items(self.store.all(), self.viewport, &self.camera, &self.cull)
                .into_iter()
                .map(CanvasItem::id)
                .collect();
        let lod = self.pipeline.update_lod(&mut self.store, &visible, now);
        if lod.requested > 0 {
            log::debug!("Promoting {} visible items to full resolution", lod.requested);
        }
        summary
    }

    /// Feed one input event to the interaction controller.
    pub fn handle_input(&mut self, event: &InputEvent, now: Instant) -> Vec<OverviewEvent> {
        let mut ctx = InteractionContext {
            store: &mut self.store,
            camera: &mut self.camera,
            viewport: self.viewport,
        };
        let events = self.controller.handle(event, &mut ctx);
        for event in &events {
            if *event == OverviewEvent::CameraChanged {
                self.pipeline.camera_moved(now);
            }
            self.notifier.emit(event.clone());
        }
        events
    }

    /// Shelf-pack all items and center the camera on them at zoom 1.
    pub fn auto_arrange(&mut self) {
        let arrangement = auto_arrange(self.store.all(), &self.layout);
        let ids: Vec<ItemId> = self.store.ids().collect();
        for (&id, &position) in ids.iter().zip(&arrangement.positions) {
            self.store.update(id, |item| {
                item.set_position(position);
            });
        }
        if !ids.is_empty() {
            self.store.notify(StoreEvent::Moved(ids));
        }
        log::info!("Arranged {} items", arrangement.positions.len());
        self.set_camera(arrangement.camera);
    }

    /// Fit every item into the viewport.
    pub fn fit_all(&mut self) {
        let bounds = self
            .store
            .all()
            .iter()
            .map(CanvasItem::footprint)
            .reduce(|acc, rect| acc.union(&rect));
        let camera = match bounds {
            Some(bounds) => Camera::fit_rect(&bounds, self.viewport),
            None => Camera::identity(),
        };
        self.set_camera(camera);
    }

    fn arrange_and_fit(&mut self) {
        self.auto_arrange();
        self.fit_all();
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Replace the camera.
    pub fn set_camera(&mut self, camera: Camera) {
        if camera != self.camera {
            self.camera = camera;
            self.pipeline.camera_moved(Instant::now());
            self.notifier.emit(OverviewEvent::CameraChanged);
        }
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Set the canvas size in screen pixels.
    pub fn set_viewport(&mut self, viewport: Size) {
        if viewport.width > 0.0 && viewport.height > 0.0 && viewport != self.viewport {
            self.viewport = viewport;
            self.pipeline.camera_moved(Instant::now());
            self.notifier.emit(OverviewEvent::CameraChanged);
        }
    }

    /// Items to draw this frame.
    pub fn visible_items(&self) -> Vec<&CanvasItem> {
        visible_items(self.store.all(), self.viewport, &self.camera, &self.cull)
    }

    /// Where `item` is drawn, including any gesture preview.
    pub fn placement(&self, item: &CanvasItem) -> Placement {
        self.controller.placement(item)
    }

    /// Screen-space rectangle of `item` as drawn.
    pub fn item_screen_rect(&self, item: &CanvasItem) -> Rect {
        let footprint = self.controller.preview_footprint(item);
        Rect::from_corners(
            world_to_screen(footprint.top_left(), self.viewport, &self.camera),
            world_to_screen(footprint.bottom_right(), self.viewport, &self.camera),
        )
    }

    /// World-space box for the selection overlay and its handles.
    pub fn selection_bounds(&self) -> Option<Rect> {
        self.controller.selection_bounds(&self.store)
    }

    /// Screen-space marquee while box selecting.
    pub fn marquee(&self) -> Option<Rect> {
        self.controller.marquee()
    }

    /// World positions of the background dots in view.
    pub fn dot_grid(&self) -> Vec<Vec2> {
        dot_grid(
            &viewport_world_rect(self.viewport, &self.camera),
            self.grid_size,
            self.camera.zoom(),
        )
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn items(&self) -> &[CanvasItem] {
        self.store.all()
    }

    pub fn selection(&self) -> &SelectionState {
        self.controller.selection()
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    /// Subscribe to camera, selection and preview changes.
    pub fn subscribe(&mut self) -> Receiver<OverviewEvent> {
        self.notifier.subscribe()
    }

    /// Subscribe to item changes.
    pub fn subscribe_items(&mut self) -> Receiver<StoreEvent> {
        self.store.subscribe()
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    /// Every image file in the folder, including those not shown.
    pub fn files(&self) -> &[FileRef] {
        &self.files
    }

    /// Review decision for `item`, for status badges.
    pub fn status_for(&self, item: &CanvasItem) -> Option<ReviewStatus> {
        self.results.get(item.filename())
    }

    pub fn results(&self) -> &ReviewResults {
        &self.results
    }

    /// Re-read the results file after another view saved it.
    pub fn reload_results(&mut self) {
        if let Some(folder) = &self.folder {
            self.results = JsonResultsStore::for_folder(folder).load();
        }
    }

    pub fn stats(&self) -> ReviewStats {
        ReviewStats::compute(&self.files, &self.results)
    }

    pub fn progress(&self) -> ThumbnailProgress {
        self.pipeline.progress()
    }

    /// Whether decodes are still outstanding.
    pub fn is_loading(&self) -> bool {
        !self.pipeline.is_idle()
    }

    pub fn decoder_threads(&self) -> usize {
        self.pipeline.thread_count()
    }
}

#[cfg(test)]
mod tests;
