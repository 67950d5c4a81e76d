//! Global constants for the overview canvas.
//!
//! Thresholds here are the defaults for [`crate::config::Tuning`]; the
//! configuration file can override most of them.

// ============================================================================
// Camera and item scale
// ============================================================================

/// Smallest camera zoom.
pub const MIN_ZOOM: f32 = 0.1;

/// Largest camera zoom.
pub const MAX_ZOOM: f32 = 10.0;

/// Smallest per-item scale multiplier.
pub const MIN_ITEM_SCALE: f32 = 0.1;

/// Largest per-item scale multiplier.
pub const MAX_ITEM_SCALE: f32 = 5.0;

/// Smallest factor a resize gesture may apply in one go.
pub const MIN_GESTURE_FACTOR: f32 = 0.1;

/// Anchor-to-handle distances below this (world units) are degenerate.
pub const DEGENERATE_DISTANCE: f32 = 1e-3;

/// Zoom multiplier for one wheel notch.
pub const WHEEL_ZOOM_STEP: f32 = 1.1;

// ============================================================================
// Items
// ============================================================================

/// Longer side of an item's base size, in world units.
pub const ITEM_LONG_SIDE: f32 = 200.0;

/// Maximum pixel size requested from the codec for thumbnails.
pub const THUMBNAIL_MAX_SIZE: u32 = 800;

/// Number of files the overview loads from a folder.
pub const MAX_OVERVIEW_ITEMS: usize = 300;

// ============================================================================
// Culling and level of detail
// ============================================================================

/// Below this many items the culler returns everything.
pub const CULL_THRESHOLD: usize = 50;

/// Screen-space margin added around the viewport before culling.
pub const CULL_MARGIN_PX: f32 = 600.0;

/// High-res promotion only happens when at most this many items are visible.
pub const HIGH_RES_VISIBLE_LIMIT: usize = 5;

/// How long the camera must be still before high-res promotion runs.
pub const SETTLE_DELAY_MS: u64 = 200;

// ============================================================================
// Async pipeline
// ============================================================================

/// Completed thumbnails are flushed to the store in groups of this size.
pub const THUMBNAIL_BATCH_SIZE: usize = 15;

/// Default number of decoder threads.
pub const DEFAULT_DECODER_THREADS: usize = 4;

// ============================================================================
// Layout
// ============================================================================

/// Virtual width of a row in the auto-arrange layout.
pub const LAYOUT_MAX_ROW_WIDTH: f32 = 2000.0;

/// Horizontal gap between items in a row.
pub const LAYOUT_ITEM_GAP: f32 = 20.0;

/// Vertical gap between rows.
pub const LAYOUT_ROW_GAP: f32 = 20.0;

/// Height reserved above each row for the filename label.
pub const LAYOUT_LABEL_HEIGHT: f32 = 40.0;

// ============================================================================
// Interaction
// ============================================================================

/// Pointer travel (screen px) that turns a press into a drag.
pub const DRAG_THRESHOLD_PX: f32 = 4.0;

/// Radius (screen px) around a corner that counts as grabbing its handle.
pub const HANDLE_HIT_RADIUS_PX: f32 = 10.0;

// ============================================================================
// Background grid
// ============================================================================

/// Default spacing of the background dot grid, in world units.
pub const DEFAULT_GRID_SIZE: f32 = 40.0;

/// The grid is hidden below this zoom.
pub const GRID_MIN_ZOOM: f32 = 0.2;

/// Upper bound on dots produced for one frame.
pub const GRID_MAX_POINTS: usize = 10_000;
