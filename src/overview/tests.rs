//! End-to-end scenarios: folder load, layout, culling and promotion.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use super::*;
use crate::canvas::Bitmap;
use crate::error::DecodeError;
use crate::geometry::screen_to_world;
use crate::interaction::{Modifiers, PointerButton};

const EPSILON: f32 = 0.001;

fn approx_vec(a: Vec2, b: Vec2) -> bool {
    (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
}

/// Folders that exist only in memory.
#[derive(Default)]
struct FakeFolders {
    folders: HashMap<PathBuf, Vec<String>>,
}

impl FakeFolders {
    fn with(mut self, folder: impl Into<PathBuf>, names: impl IntoIterator<Item = String>) -> Self {
        self.folders.insert(folder.into(), names.into_iter().collect());
        self
    }
}

impl FileSystemProvider for FakeFolders {
    fn list_image_files(&self, dir: &Path) -> Result<Vec<FileRef>, OverviewError> {
        let names = self.folders.get(dir).ok_or_else(|| OverviewError::FolderNotFound {
            path: dir.to_path_buf(),
        })?;
        let mut files: Vec<FileRef> =
            names.iter().map(|name| FileRef::new(dir.join(name))).collect();
        files.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(files)
    }
}

/// Fabricates bitmaps from file names: `wide` is 2:1, `tall` is 1:2, the rest square.
///
/// Thumbnail decodes block while the gate is closed.
struct FakeCodec {
    gate_open: Mutex<bool>,
    gate: Condvar,
    full_calls: AtomicUsize,
}

impl FakeCodec {
    fn new(gate_open: bool) -> Arc<Self> {
        Arc::new(Self {
            gate_open: Mutex::new(gate_open),
            gate: Condvar::new(),
            full_calls: AtomicUsize::new(0),
        })
    }

    fn open_gate(&self) {
        *self.gate_open.lock().unwrap() = true;
        self.gate.notify_all();
    }

    fn bitmap(file: &FileRef, scale: u32) -> Bitmap {
        let (w, h) = if file.name().contains("wide") {
            (40, 20)
        } else if file.name().contains("tall") {
            (20, 40)
        } else {
            (20, 20)
        };
        let (w, h) = (w * scale, h * scale);
        Bitmap::from_rgba8(vec![128; (w * h * 4) as usize], w, h).unwrap()
    }
}

impl ImageCodec for FakeCodec {
    fn decode_thumbnail(
        &self,
        file: &FileRef,
        _max_size: (u32, u32),
    ) -> Result<Bitmap, DecodeError> {
        let mut open = self.gate_open.lock().unwrap();
        while !*open {
            open = self.gate.wait(open).unwrap();
        }
        Ok(Self::bitmap(file, 1))
    }

    fn decode_full(&self, file: &FileRef) -> Result<Bitmap, DecodeError> {
        self.full_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::bitmap(file, 8))
    }
}

fn names(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}_{i:03}.png")).collect()
}

fn overview_with(folders: FakeFolders, codec: Arc<FakeCodec>, config: &OverviewConfig) -> Overview {
    let mut config = config.clone();
    config.preferences.decoder_threads = 2;
    Overview::new(&config, Box::new(folders), codec).unwrap()
}

/// Tick until every decode has landed, then once more to settle the layout.
fn tick_until_loaded(overview: &mut Overview, now: Instant) {
    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    while overview.is_loading() {
        overview.tick(now);
        assert!(std::time::Instant::now() < deadline, "decodes did not finish in time");
        std::thread::sleep(Duration::from_millis(2));
    }
    overview.tick(now);
}

fn place(overview: &mut Overview, index: usize, position: Vec2) {
    let id = overview.items()[index].id();
    overview.store.update(id, |item| {
        item.set_position(position);
    });
}

#[test]
fn test_three_aspect_ratios_fit_one_row() {
    let folders = FakeFolders::default().with(
        "/virtual/mixed",
        ["a_square.png", "b_wide.png", "c_tall.png"].map(String::from),
    );
    let mut overview = overview_with(folders, FakeCodec::new(true), &OverviewConfig::new());

    assert_eq!(overview.open(Path::new("/virtual/mixed")).unwrap(), 3);
    tick_until_loaded(&mut overview, Instant::now());

    let items = overview.items();
    assert_eq!(items[0].base_size(), Size::new(200.0, 200.0));
    assert_eq!(items[1].base_size(), Size::new(200.0, 100.0));
    assert_eq!(items[2].base_size(), Size::new(100.0, 200.0));

    // Re-arranged with the decoded sizes: one row, tops aligned
    let rects: Vec<Rect> = items.iter().map(CanvasItem::footprint).collect();
    for rect in &rects {
        assert!(rect.top().abs() < EPSILON, "{rect:?}");
    }
    let row_width: f32 =
        rects.iter().map(|r| r.width).sum::<f32>() + 2.0 * crate::constants::LAYOUT_ITEM_GAP;
    assert!(row_width < crate::constants::LAYOUT_MAX_ROW_WIDTH);
    for (i, a) in rects.iter().enumerate() {
        for b in &rects[i + 1..] {
            assert!(!a.overlaps_strictly(b));
        }
    }

    // The recommended camera puts the cluster midpoint at the viewport center
    overview.auto_arrange();
    assert_eq!(overview.camera().zoom(), 1.0);
    let bounds = rects.iter().copied().reduce(|acc, r| acc.union(&r)).unwrap();
    assert!(approx_vec(bounds.center() + overview.camera().pan, Vec2::ZERO));
    assert!(approx_vec(
        world_to_screen(bounds.center(), overview.viewport(), overview.camera()),
        overview.viewport().center()
    ));
}

#[test]
fn test_item_screen_position() {
    let folders = FakeFolders::default().with("/virtual/one", ["only.png".to_string()]);
    let mut overview = overview_with(folders, FakeCodec::new(true), &OverviewConfig::new());
    overview.open(Path::new("/virtual/one")).unwrap();
    tick_until_loaded(&mut overview, Instant::now());

    place(&mut overview, 0, Vec2::new(100.0, 100.0));
    let id = overview.items()[0].id();
    overview.store.update(id, |item| {
        item.set_base_size(Size::new(50.0, 50.0));
    });
    overview.set_viewport(Size::new(800.0, 600.0));
    overview.set_camera(Camera::identity());

    let rect = overview.item_screen_rect(&overview.items()[0]);
    assert!(approx_vec(rect.center(), Vec2::new(500.0, 400.0)));
    assert_eq!(rect.size(), Size::new(50.0, 50.0));
}

#[test]
fn test_culling_over_scattered_items() {
    let folders = FakeFolders::default()
        .with("/virtual/sixty", names("grid", 60))
        .with("/virtual/forty", names("grid", 40));
    let mut overview = overview_with(folders, FakeCodec::new(true), &OverviewConfig::new());
    let camera = Camera::new(Vec2::new(-2500.0, -2500.0), 1.0);

    // 10 x 6 grid over a 5000 x 5000 area
    let scatter = |overview: &mut Overview| {
        for index in 0..overview.items().len() {
            let (col, row) = ((index % 10) as f32, (index / 10) as f32);
            place(overview, index, Vec2::new(250.0 + 500.0 * col, 400.0 + 850.0 * row));
        }
    };

    overview.open(Path::new("/virtual/sixty")).unwrap();
    tick_until_loaded(&mut overview, Instant::now());
    scatter(&mut overview);
    overview.set_viewport(Size::new(1000.0, 800.0));
    overview.set_camera(camera);

    let visible = overview.visible_items().len();
    assert!(visible > 0 && visible < 60, "{visible} visible");
    // Columns 3..=6 of rows 2..=3 reach into the expanded viewport
    assert_eq!(visible, 8);

    overview.open(Path::new("/virtual/forty")).unwrap();
    tick_until_loaded(&mut overview, Instant::now());
    scatter(&mut overview);
    overview.set_camera(camera);
    assert_eq!(overview.visible_items().len(), 40);
}

#[test]
fn test_open_caps_item_count() {
    let folders = FakeFolders::default().with("/virtual/big", names("img", 8));
    let mut config = OverviewConfig::new();
    config.tuning.max_items = 5;
    let mut overview = overview_with(folders, FakeCodec::new(true), &config);

    assert_eq!(overview.open(Path::new("/virtual/big")).unwrap(), 5);
    assert_eq!(overview.items().len(), 5);
    assert_eq!(overview.files().len(), 8);
    assert_eq!(overview.items()[4].filename(), "img_004.png");
    assert_eq!(overview.stats().unreviewed, 8);
    tick_until_loaded(&mut overview, Instant::now());
    assert_eq!(overview.progress().total, 5);
}

#[test]
fn test_open_missing_folder_keeps_state() {
    let folders = FakeFolders::default().with("/virtual/ok", names("img", 2));
    let mut overview = overview_with(folders, FakeCodec::new(true), &OverviewConfig::new());
    overview.open(Path::new("/virtual/ok")).unwrap();

    let result = overview.open(Path::new("/virtual/missing"));
    assert!(matches!(result, Err(OverviewError::FolderNotFound { .. })));
    assert_eq!(overview.items().len(), 2);
    assert_eq!(overview.folder(), Some(Path::new("/virtual/ok")));
    tick_until_loaded(&mut overview, Instant::now());
}

#[test]
fn test_settled_camera_promotes_visible_items() {
    let folders = FakeFolders::default().with("/virtual/few", names("img", 3));
    let codec = FakeCodec::new(true);
    let mut overview = overview_with(folders, codec.clone(), &OverviewConfig::new());
    overview.open(Path::new("/virtual/few")).unwrap();

    // Nothing is promoted before the camera settles
    let now = Instant::now();
    tick_until_loaded(&mut overview, now);
    assert_eq!(codec.full_calls.load(Ordering::SeqCst), 0);

    let later = Instant::now() + Duration::from_secs(1);
    overview.tick(later);
    tick_until_loaded(&mut overview, later);
    assert!(overview.items().iter().all(CanvasItem::is_high_res));
    assert_eq!(codec.full_calls.load(Ordering::SeqCst), 3);

    // Base sizes still come from the thumbnails
    assert_eq!(overview.items()[0].base_size(), Size::new(200.0, 200.0));
}

#[test]
fn test_panning_away_releases_full_images() {
    let folders = FakeFolders::default().with("/virtual/sixty", names("grid", 60));
    let codec = FakeCodec::new(true);
    let mut overview = overview_with(folders, codec.clone(), &OverviewConfig::new());
    overview.open(Path::new("/virtual/sixty")).unwrap();
    tick_until_loaded(&mut overview, Instant::now());
    for index in 0..overview.items().len() {
        let (col, row) = ((index % 10) as f32, (index / 10) as f32);
        place(&mut overview, index, Vec2::new(250.0 + 500.0 * col, 400.0 + 850.0 * row));
    }
    overview.set_viewport(Size::new(1000.0, 800.0));

    // Zoomed in on the first item
    overview.set_camera(Camera::new(Vec2::new(-250.0, -400.0), 2.0));
    let visible: Vec<ItemId> = overview.visible_items().iter().map(|item| item.id()).collect();
    assert!(!visible.is_empty() && visible.len() <= 5, "{} visible", visible.len());
    let later = Instant::now() + Duration::from_secs(1);
    overview.tick(later);
    tick_until_loaded(&mut overview, later);
    for &id in &visible {
        assert!(overview.store().get(id).unwrap().is_high_res());
    }

    let rx = overview.subscribe_items();
    overview.set_camera(Camera::new(Vec2::new(-40_000.0, -40_000.0), 2.0));
    assert!(overview.visible_items().is_empty());
    overview.tick(Instant::now() + Duration::from_secs(1));

    assert!(overview.items().iter().all(|item| !item.is_high_res()));
    for &id in &visible {
        let item = overview.store().get(id).unwrap();
        assert_eq!(item.bitmap().map(Bitmap::width), Some(20));
    }
    assert_eq!(rx.try_recv(), Ok(StoreEvent::ImagesUpdated(visible)));
}

#[test]
fn test_user_edit_suppresses_relayout() {
    let folders = FakeFolders::default()
        .with("/virtual/wide", ["a_wide.png", "b_wide.png"].map(String::from));
    let codec = FakeCodec::new(false);
    let mut overview = overview_with(folders, codec.clone(), &OverviewConfig::new());
    overview.open(Path::new("/virtual/wide")).unwrap();
    overview.set_camera(Camera::identity());

    // Drag the first placeholder while thumbnails are still decoding
    let start = world_to_screen(
        overview.items()[0].position(),
        overview.viewport(),
        overview.camera(),
    );
    let now = Instant::now();
    overview.handle_input(
        &InputEvent::PointerDown {
            position: start,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
        },
        now,
    );
    overview.handle_input(
        &InputEvent::PointerMove {
            position: start + Vec2::new(0.0, 300.0),
        },
        now,
    );
    overview.handle_input(
        &InputEvent::PointerUp {
            position: start + Vec2::new(0.0, 300.0),
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
        },
        now,
    );
    let moved = overview.items()[0].position();

    codec.open_gate();
    tick_until_loaded(&mut overview, now);
    assert_eq!(overview.items()[0].base_size(), Size::new(200.0, 100.0));
    assert_eq!(overview.items()[0].position(), moved);
}

#[test]
fn test_input_notifies_subscribers() {
    let folders = FakeFolders::default().with("/virtual/one", ["only.png".to_string()]);
    let mut overview = overview_with(folders, FakeCodec::new(true), &OverviewConfig::new());
    overview.open(Path::new("/virtual/one")).unwrap();
    tick_until_loaded(&mut overview, Instant::now());
    let rx = overview.subscribe();

    let cursor = Vec2::new(100.0, 100.0);
    let before = screen_to_world(cursor, overview.viewport(), overview.camera());
    let events = overview.handle_input(
        &InputEvent::Wheel {
            delta: -1.0,
            position: cursor,
            modifiers: Modifiers::NONE,
        },
        Instant::now(),
    );
    assert_eq!(events, vec![OverviewEvent::CameraChanged]);
    assert_eq!(rx.try_recv(), Ok(OverviewEvent::CameraChanged));
    assert!(approx_vec(screen_to_world(cursor, overview.viewport(), overview.camera()), before));

    overview.set_camera(Camera::identity());
    let item_screen = world_to_screen(
        overview.items()[0].position(),
        overview.viewport(),
        overview.camera(),
    );
    let events = overview.handle_input(
        &InputEvent::DoubleClick {
            position: item_screen,
            button: PointerButton::Primary,
        },
        Instant::now(),
    );
    assert_eq!(events, vec![OverviewEvent::OpenInEditor(overview.items()[0].id())]);
}

#[test]
fn test_status_badges_from_results_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(crate::results::RESULTS_FILENAME),
        r#"{ "a.png": "pass", "gone.png": "fail" }"#,
    )
    .unwrap();
    let folders = FakeFolders::default().with(dir.path(), ["a.png", "b.png"].map(String::from));
    let mut overview = overview_with(folders, FakeCodec::new(true), &OverviewConfig::new());
    overview.open(dir.path()).unwrap();

    let items = overview.items();
    assert_eq!(overview.status_for(&items[0]), Some(ReviewStatus::Pass));
    assert_eq!(overview.status_for(&items[1]), None);
    let stats = overview.stats();
    assert_eq!((stats.total, stats.passed, stats.failed, stats.unreviewed), (2, 1, 0, 1));

    // Another view records a decision
    let store = JsonResultsStore::for_folder(dir.path());
    let mut results = store.load();
    results.set("b.png", ReviewStatus::Invalid);
    store.save(&results).unwrap();
    overview.reload_results();
    assert_eq!(overview.status_for(&overview.items()[1]), Some(ReviewStatus::Invalid));
    tick_until_loaded(&mut overview, Instant::now());
}

#[test]
fn test_fit_all_and_grid() {
    let folders = FakeFolders::default().with("/virtual/many", names("img", 30));
    let mut overview = overview_with(folders, FakeCodec::new(true), &OverviewConfig::new());
    overview.open(Path::new("/virtual/many")).unwrap();
    tick_until_loaded(&mut overview, Instant::now());

    overview.fit_all();
    let viewport = Rect::new(0.0, 0.0, overview.viewport().width, overview.viewport().height)
        .expanded(0.5, 0.5);
    for item in overview.items() {
        let rect = overview.item_screen_rect(item);
        assert!(
            viewport.contains(rect.top_left()) && viewport.contains(rect.bottom_right()),
            "{rect:?}"
        );
    }

    overview.set_camera(Camera::identity());
    assert!(!overview.dot_grid().is_empty());
    overview.set_camera(Camera::new(Vec2::ZERO, 0.1));
    assert!(overview.dot_grid().is_empty());

    // Far from the origin the grid step vanishes in f32 precision
    overview.set_camera(Camera::new(Vec2::new(-3.0e9, 0.0), 1.0));
    assert!(overview.dot_grid().is_empty());
    overview.set_camera(Camera::new(Vec2::new(-1.0e6, 0.0), 1.0));
    assert!(!overview.dot_grid().is_empty());
}
