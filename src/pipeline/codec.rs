//! Image decoding backends.

use crate::canvas::Bitmap;
use crate::error::DecodeError;
use crate::project::FileRef;

/// Decodes image files into bitmaps.
///
/// Called concurrently from every decoder thread.
pub trait ImageCodec: Send + Sync {
    /// Decode `file`, downscaled to fit inside `max_size` (aspect ratio kept).
    fn decode_thumbnail(&self, file: &FileRef, max_size: (u32, u32)) -> Result<Bitmap, DecodeError>;

    /// Decode `file` at its native resolution.
    fn decode_full(&self, file: &FileRef) -> Result<Bitmap, DecodeError>;
}

/// Codec backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateCodec;

impl ImageCrateCodec {
    fn to_bitmap(img: image::DynamicImage) -> Result<Bitmap, DecodeError> {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::Empty);
        }
        Bitmap::from_rgba8(rgba.into_raw(), width, height).ok_or(DecodeError::Empty)
    }
}

impl ImageCodec for ImageCrateCodec {
    fn decode_thumbnail(
        &self,
        file: &FileRef,
        max_size: (u32, u32),
    ) -> Result<Bitmap, DecodeError> {
        let img = image::open(file.path())?;
        let (max_w, max_h) = max_size;
        let img = if img.width() > max_w || img.height() > max_h {
            img.thumbnail(max_w, max_h)
        } else {
            img
        };
        log::trace!("Thumbnail {}: {}x{}", file.name(), img.width(), img.height());
        Self::to_bitmap(img)
    }

    fn decode_full(&self, file: &FileRef) -> Result<Bitmap, DecodeError> {
        let img = image::open(file.path())?;
        log::debug!("Full image {}: {}x{}", file.name(), img.width(), img.height());
        Self::to_bitmap(img)
    }
}
