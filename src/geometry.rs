//! Screen/world coordinate mathematics.
//!
//! Every conversion between screen space and world space goes through the
//! functions in this module. The render chain is
//!
//! ```text
//! screen = (world + pan) * zoom + viewport_center
//! ```
//!
//! and [`screen_to_world`] is its exact inverse. Nothing else in the crate
//! rebuilds this chain by hand.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_ZOOM, MIN_ZOOM};

// ============================================================================
// Core Geometry Types
// ============================================================================

/// A 2D point or vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Calculate distance to another point.
    pub fn distance_to(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;
    fn div(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Width and height.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn scaled(self, factor: f32) -> Size {
        Size::new(self.width * factor, self.height * factor)
    }

    /// Size whose longer side is `long_side`, keeping this size's aspect ratio.
    ///
    /// Returns `None` when either dimension is not positive.
    pub fn fit_long_side(self, long_side: f32) -> Option<Size> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return None;
        }
        let ratio = long_side / self.width.max(self.height);
        Some(Size::new(self.width * ratio, self.height * ratio))
    }
}

/// An axis-aligned rectangle (top-left corner plus size, y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from two opposite corners, in any order.
    pub fn from_corners(p1: Vec2, p2: Vec2) -> Self {
        let x = p1.x.min(p2.x);
        let y = p1.y.min(p2.y);
        Self::new(x, y, (p1.x - p2.x).abs(), (p1.y - p2.y).abs())
    }

    pub fn from_center_size(center: Vec2, size: Size) -> Self {
        Self::new(
            center.x - size.width / 2.0,
            center.y - size.height / 2.0,
            size.width,
            size.height,
        )
    }

    /// Smallest rectangle containing all points, `None` for an empty iterator.
    pub fn bounding(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| {
            (
                Vec2::new(min.x.min(p.x), min.y.min(p.y)),
                Vec2::new(max.x.max(p.x), max.y.max(p.y)),
            )
        });
        Some(Self::from_corners(min, max))
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.left(), self.top())
    }

    pub fn top_right(&self) -> Vec2 {
        Vec2::new(self.right(), self.top())
    }

    pub fn bottom_left(&self) -> Vec2 {
        Vec2::new(self.left(), self.bottom())
    }

    pub fn bottom_right(&self) -> Vec2 {
        Vec2::new(self.right(), self.bottom())
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Check if a point is inside the rectangle (edges included).
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// Overlap test; rectangles that share an edge intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() <= other.right()
            && other.left() <= self.right()
            && self.top() <= other.bottom()
            && other.top() <= self.bottom()
    }

    /// Overlap test that ignores shared edges.
    pub fn overlaps_strictly(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_corners(
            Vec2::new(self.left().min(other.left()), self.top().min(other.top())),
            Vec2::new(
                self.right().max(other.right()),
                self.bottom().max(other.bottom()),
            ),
        )
    }

    pub fn translated(&self, offset: Vec2) -> Rect {
        Rect::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    /// Grow by `dx` on the left and right and `dy` on the top and bottom.
    pub fn expanded(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(
            self.x - dx,
            self.y - dy,
            self.width + 2.0 * dx,
            self.height + 2.0 * dy,
        )
    }
}

// ============================================================================
// Camera
// ============================================================================

/// Pan/zoom state of the overview.
///
/// `pan` is a world-space translation applied before scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "CameraState")]
pub struct Camera {
    pub pan: Vec2,
    zoom: f32,
}

/// Wire form of [`Camera`]; loading goes through [`Camera::new`].
#[derive(Deserialize)]
struct CameraState {
    pan: Vec2,
    zoom: f32,
}

impl From<CameraState> for Camera {
    fn from(state: CameraState) -> Self {
        Camera::new(state.pan, state.zoom)
    }
}

impl Camera {
    /// Create a camera; the zoom is clamped to the allowed range.
    pub fn new(pan: Vec2, zoom: f32) -> Self {
        Self {
            pan,
            zoom: clamp_zoom(zoom, 1.0),
        }
    }

    /// Identity camera (zoom=1, no pan).
    pub fn identity() -> Self {
        Self::new(Vec2::ZERO, 1.0)
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Set the zoom, clamped to `[MIN_ZOOM, MAX_ZOOM]`. Non-finite input is ignored.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = clamp_zoom(zoom, self.zoom);
    }

    /// Move the camera by a screen-space delta.
    pub fn pan_by_screen(&mut self, delta: Vec2) {
        let world_delta = delta / self.zoom;
        if world_delta.is_finite() {
            self.pan += world_delta;
        }
    }

    /// Camera that shows `rect` centered in the viewport, as large as fits.
    pub fn fit_rect(rect: &Rect, viewport: Size) -> Camera {
        let zoom = if rect.width > 0.0 && rect.height > 0.0 {
            (viewport.width / rect.width).min(viewport.height / rect.height)
        } else {
            1.0
        };
        Camera::new(-rect.center(), zoom)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::identity()
    }
}

fn clamp_zoom(zoom: f32, fallback: f32) -> f32 {
    if zoom.is_finite() {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        fallback
    }
}

/// Margin added around the viewport before culling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CullMargin {
    /// Fixed screen pixels on every side; shrinks in world units as zoom grows.
    Pixels(f32),
    /// Fraction of the viewport's width/height on every side.
    Ratio(f32),
}

// ============================================================================
// Transforms
// ============================================================================

/// Convert a screen-space point to world space.
pub fn screen_to_world(screen: Vec2, viewport: Size, camera: &Camera) -> Vec2 {
    (screen - viewport.center()) / camera.zoom() - camera.pan
}

/// Convert a world-space point to screen space.
pub fn world_to_screen(world: Vec2, viewport: Size, camera: &Camera) -> Vec2 {
    (world + camera.pan) * camera.zoom() + viewport.center()
}

/// World-space rectangle covering the viewport plus `margin`.
pub fn expanded_viewport_world_rect(viewport: Size, camera: &Camera, margin: CullMargin) -> Rect {
    let (mx, my) = match margin {
        CullMargin::Pixels(px) => (px, px),
        CullMargin::Ratio(ratio) => (viewport.width * ratio, viewport.height * ratio),
    };
    let top_left = screen_to_world(Vec2::new(-mx, -my), viewport, camera);
    let bottom_right = screen_to_world(
        Vec2::new(viewport.width + mx, viewport.height + my),
        viewport,
        camera,
    );
    Rect::from_corners(top_left, bottom_right)
}

/// World-space rectangle exactly covering the viewport.
pub fn viewport_world_rect(viewport: Size, camera: &Camera) -> Rect {
    expanded_viewport_world_rect(viewport, camera, CullMargin::Pixels(0.0))
}

/// Scale `point` about `anchor`: `anchor + (point - anchor) * factor`.
pub fn anchored_scale(point: Vec2, anchor: Vec2, factor: f32) -> Vec2 {
    anchor + (point - anchor) * factor
}

/// Zoom to `new_zoom` keeping the world point under `cursor` fixed.
///
/// The algorithm:
/// 1. Find the world point under the cursor
/// 2. Clamp the new zoom
/// 3. Solve the render chain for the pan that puts that point back under the cursor
pub fn zoom_at(camera: &Camera, cursor: Vec2, viewport: Size, new_zoom: f32) -> Camera {
    let anchor = screen_to_world(cursor, viewport, camera);
    let mut next = *camera;
    next.set_zoom(new_zoom);
    next.pan = (cursor - viewport.center()) / next.zoom() - anchor;
    next
}
