//! Canvas item model.

use std::fmt;
use std::sync::Arc;

use crate::constants::{ITEM_LONG_SIDE, MAX_ITEM_SCALE, MIN_ITEM_SCALE};
use crate::geometry::{Rect, Size, Vec2};
use crate::project::FileRef;

/// Stable identifier of a canvas item. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub(crate) u64);

impl ItemId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Decoded RGBA8 pixels.
///
/// Cloning shares the pixel buffer; it is never mutated after creation.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl Bitmap {
    /// Wrap raw RGBA8 data. Returns `None` if the buffer length does not match.
    pub fn from_rgba8(data: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        if data.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: data.into(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as f32, self.height as f32)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Which decode produced an item's bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Thumbnail,
    Full,
}

/// The bitmap an item currently displays.
///
/// Bitmap and resolution are replaced together so readers never observe a
/// full-resolution flag next to a thumbnail bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemImage {
    pub bitmap: Bitmap,
    pub resolution: Resolution,
    /// Thumbnail held back while the full image is shown.
    pub thumbnail: Option<Bitmap>,
}

/// One reviewed file placed on the canvas.
#[derive(Debug, Clone)]
pub struct CanvasItem {
    id: ItemId,
    file: FileRef,
    /// World-space center.
    position: Vec2,
    base_size: Size,
    item_scale: f32,
    image: Option<ItemImage>,
    /// Bumped on every image replacement; renderers compare it by value.
    generation: u64,
}

impl CanvasItem {
    /// New item with a square placeholder size and no image.
    pub fn new(id: ItemId, file: FileRef, position: Vec2) -> Self {
        Self {
            id,
            file,
            position,
            base_size: Size::new(ITEM_LONG_SIDE, ITEM_LONG_SIDE),
            item_scale: 1.0,
            image: None,
            generation: 0,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn file(&self) -> &FileRef {
        &self.file
    }

    pub fn filename(&self) -> &str {
        self.file.name()
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Move the item. Non-finite positions are rejected.
    pub fn set_position(&mut self, position: Vec2) -> bool {
        if !position.is_finite() {
            log::warn!("Rejected non-finite position {:?} for item {}", position, self.id);
            return false;
        }
        self.position = position;
        true
    }

    pub fn base_size(&self) -> Size {
        self.base_size
    }

    /// Replace the intrinsic size. Non-positive sizes are rejected.
    pub fn set_base_size(&mut self, size: Size) -> bool {
        let finite = size.width.is_finite() && size.height.is_finite();
        if !(finite && size.width > 0.0 && size.height > 0.0) {
            return false;
        }
        self.base_size = size;
        true
    }

    pub fn item_scale(&self) -> f32 {
        self.item_scale
    }

    /// Set the per-item scale, clamped to `[MIN_ITEM_SCALE, MAX_ITEM_SCALE]`.
    pub fn set_item_scale(&mut self, scale: f32) {
        if scale.is_finite() {
            self.item_scale = scale.clamp(MIN_ITEM_SCALE, MAX_ITEM_SCALE);
        }
    }

    /// World-space size: `base_size * item_scale`.
    pub fn scaled_size(&self) -> Size {
        self.base_size.scaled(self.item_scale)
    }

    /// World-space bounding box.
    pub fn footprint(&self) -> Rect {
        Rect::from_center_size(self.position, self.scaled_size())
    }

    pub fn image(&self) -> Option<&ItemImage> {
        self.image.as_ref()
    }

    /// The bitmap on display, whichever resolution it is.
    pub fn bitmap(&self) -> Option<&Bitmap> {
        self.image.as_ref().map(|image| &image.bitmap)
    }

    pub fn is_high_res(&self) -> bool {
        matches!(
            self.image,
            Some(ItemImage {
                resolution: Resolution::Full,
                ..
            })
        )
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Install a decoded thumbnail and the base size derived from it.
    ///
    /// No-op once the item shows its full-resolution image, so a thumbnail
    /// that was delayed in a batch cannot overwrite a later promotion.
    pub fn apply_thumbnail(&mut self, bitmap: Bitmap, base_size: Size) -> bool {
        if self.is_high_res() {
            return false;
        }
        self.set_base_size(base_size);
        self.replace_image(ItemImage {
            bitmap,
            resolution: Resolution::Thumbnail,
            thumbnail: None,
        });
        true
    }

    /// Install the full-resolution image.
    ///
    /// The base size stays as derived from the thumbnail; items that never
    /// got a thumbnail derive it from the full image instead.
    pub fn apply_full_image(&mut self, bitmap: Bitmap) -> bool {
        if self.image.is_none() {
            if let Some(size) = bitmap.size().fit_long_side(ITEM_LONG_SIDE) {
                self.set_base_size(size);
            }
        }
        let thumbnail = self.image.as_ref().and_then(|image| match image.resolution {
            Resolution::Thumbnail => Some(image.bitmap.clone()),
            Resolution::Full => image.thumbnail.clone(),
        });
        self.replace_image(ItemImage {
            bitmap,
            resolution: Resolution::Full,
            thumbnail,
        });
        true
    }

    /// Drop the full-resolution image and show the thumbnail again.
    ///
    /// Items promoted without a thumbnail fall back to the placeholder.
    /// Returns `false` if the item was not high-res.
    pub fn release_full_image(&mut self) -> bool {
        if !self.is_high_res() {
            return false;
        }
        let thumbnail = self.image.take().and_then(|image| image.thumbnail);
        self.image = thumbnail.map(|bitmap| ItemImage {
            bitmap,
            resolution: Resolution::Thumbnail,
            thumbnail: None,
        });
        self.generation += 1;
        true
    }

    fn replace_image(&mut self, image: ItemImage) {
        self.image = Some(image);
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap(width: u32, height: u32) -> Bitmap {
        Bitmap::from_rgba8(vec![0; (width * height * 4) as usize], width, height).unwrap()
    }

    fn item() -> CanvasItem {
        CanvasItem::new(ItemId(1), FileRef::new("/tmp/a.png"), Vec2::new(100.0, 50.0))
    }

    #[test]
    fn test_bitmap_rejects_wrong_length() {
        assert!(Bitmap::from_rgba8(vec![0; 7], 1, 2).is_none());
        assert!(Bitmap::from_rgba8(vec![0; 8], 1, 2).is_some());
    }

    #[test]
    fn test_footprint_uses_scale() {
        let mut item = item();
        item.set_base_size(Size::new(50.0, 20.0));
        item.set_item_scale(2.0);
        assert_eq!(item.footprint(), Rect::new(50.0, 30.0, 100.0, 40.0));
    }

    #[test]
    fn test_scale_clamped() {
        let mut item = item();
        item.set_item_scale(0.0);
        assert_eq!(item.item_scale(), MIN_ITEM_SCALE);
        item.set_item_scale(99.0);
        assert_eq!(item.item_scale(), MAX_ITEM_SCALE);
        item.set_item_scale(f32::INFINITY);
        assert_eq!(item.item_scale(), MAX_ITEM_SCALE);
    }

    #[test]
    fn test_non_finite_position_rejected() {
        let mut item = item();
        assert!(!item.set_position(Vec2::new(f32::NAN, 0.0)));
        assert_eq!(item.position(), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn test_thumbnail_after_high_res_is_ignored() {
        let mut item = item();
        assert!(item.apply_thumbnail(bitmap(4, 2), Size::new(200.0, 100.0)));
        assert!(item.apply_full_image(bitmap(8, 4)));
        assert!(item.is_high_res());
        let generation = item.generation();

        assert!(!item.apply_thumbnail(bitmap(4, 2), Size::new(200.0, 100.0)));
        assert!(item.is_high_res());
        assert_eq!(item.bitmap().map(Bitmap::width), Some(8));
        assert_eq!(item.generation(), generation);
    }

    #[test]
    fn test_full_image_keeps_thumbnail_size() {
        let mut item = item();
        item.apply_thumbnail(bitmap(4, 2), Size::new(200.0, 100.0));
        item.apply_full_image(bitmap(40, 40));
        assert_eq!(item.base_size(), Size::new(200.0, 100.0));
    }

    #[test]
    fn test_full_image_without_thumbnail_sets_size() {
        let mut item = item();
        item.apply_full_image(bitmap(10, 20));
        assert_eq!(item.base_size(), Size::new(100.0, 200.0));
    }

    #[test]
    fn test_release_restores_thumbnail() {
        let mut item = item();
        assert!(!item.release_full_image());
        item.apply_thumbnail(bitmap(4, 2), Size::new(200.0, 100.0));
        item.apply_full_image(bitmap(40, 20));
        let generation = item.generation();

        assert!(item.release_full_image());
        assert!(!item.is_high_res());
        assert_eq!(item.bitmap().map(Bitmap::width), Some(4));
        assert_eq!(item.base_size(), Size::new(200.0, 100.0));
        assert!(item.generation() > generation);

        // Promoting again still remembers the thumbnail
        item.apply_full_image(bitmap(40, 20));
        assert!(item.release_full_image());
        assert_eq!(item.bitmap().map(Bitmap::width), Some(4));
    }

    #[test]
    fn test_release_without_thumbnail_shows_placeholder() {
        let mut item = item();
        item.apply_full_image(bitmap(10, 20));
        assert!(item.release_full_image());
        assert!(item.image().is_none());
        assert_eq!(item.base_size(), Size::new(100.0, 200.0));
    }
}
