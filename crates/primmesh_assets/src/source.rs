//! # Asset Sources
//!
//! The capability the converter uses to obtain dependent assets.
//!
//! ```text
//! PrimToMesh ──fetch_texture(handle)───▶ AssetSource ──▶ Deferred<TextureAsset>
//!            ──fetch_raw_asset(handle)─▶             ──▶ Deferred<Vec<u8>>
//! ```
//!
//! Fetches never block the caller. A result may arrive on any thread,
//! possibly before `fetch_*` returns.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use primmesh_core::Deferred;

use crate::error::{DecodeError, FetchError};
use crate::handle::EntityHandle;

/// Decoded RGBA8 image.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Bitmap {
    /// Creates a bitmap from row-major pixels.
    ///
    /// Returns `None` if `pixels` does not hold exactly `width * height`
    /// entries.
    #[must_use]
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 4]>) -> Option<Self> {
        let expected = (width as usize).checked_mul(height as usize)?;
        (pixels.len() == expected).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Row-major pixels.
    #[must_use]
    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    /// Pixel at column `x`, row `y`.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// True if the bitmap has no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// A fetched texture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureAsset {
    /// The handle it was fetched with.
    pub handle: EntityHandle,
    /// Decoded image.
    pub bitmap: Arc<Bitmap>,
}

/// Turns encoded image bytes into a bitmap.
pub trait TextureDecoder: Send + Sync {
    /// Decodes `bytes`.
    ///
    /// # Errors
    ///
    /// [`DecodeError`] if the format is unknown or the data is damaged.
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, DecodeError>;
}

/// [`TextureDecoder`] backed by the `image` crate.
///
/// Handles the formats the crate was built with (PNG and TGA here).
/// JPEG 2000 needs a different decoder.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageDecoder;

impl TextureDecoder for ImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, DecodeError> {
        let rgba = image::load_from_memory(bytes)
            .map_err(|e| DecodeError(e.to_string()))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        let pixels = rgba.pixels().map(|p| p.0).collect();
        Bitmap::new(width, height, pixels)
            .ok_or_else(|| DecodeError(format!("pixel count mismatch for {width}x{height}")))
    }
}

/// Capability to fetch dependent assets.
///
/// Implementations release their resources in `Drop`, after any
/// outstanding fetches have settled.
pub trait AssetSource: Send + Sync {
    /// Fetches and decodes a texture.
    fn fetch_texture(&self, handle: &EntityHandle) -> Deferred<TextureAsset, FetchError>;

    /// Fetches an asset's raw bytes.
    fn fetch_raw_asset(&self, handle: &EntityHandle) -> Deferred<Vec<u8>, FetchError>;
}

impl<S: AssetSource + ?Sized> AssetSource for Arc<S> {
    fn fetch_texture(&self, handle: &EntityHandle) -> Deferred<TextureAsset, FetchError> {
        (**self).fetch_texture(handle)
    }

    fn fetch_raw_asset(&self, handle: &EntityHandle) -> Deferred<Vec<u8>, FetchError> {
        (**self).fetch_raw_asset(handle)
    }
}

/// Request counters.
#[derive(Debug, Default)]
pub struct SourceStats {
    texture_requests: AtomicU64,
    raw_requests: AtomicU64,
    failures: AtomicU64,
}

impl SourceStats {
    /// Texture fetches issued.
    #[must_use]
    pub fn texture_requests(&self) -> u64 {
        self.texture_requests.load(Ordering::Relaxed)
    }

    /// Raw fetches issued.
    #[must_use]
    pub fn raw_requests(&self) -> u64 {
        self.raw_requests.load(Ordering::Relaxed)
    }

    /// Fetches that were rejected.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub(crate) fn record_texture(&self) {
        self.texture_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_raw(&self) {
        self.raw_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// In-memory source; every fetch settles before it returns.
#[derive(Debug, Default)]
pub struct MemoryAssetSource {
    textures: RwLock<HashMap<EntityHandle, Arc<Bitmap>>>,
    raw: RwLock<HashMap<EntityHandle, Arc<Vec<u8>>>>,
    stats: SourceStats,
}

impl MemoryAssetSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a decoded texture.
    pub fn insert_texture(&self, handle: EntityHandle, bitmap: Bitmap) {
        self.textures.write().insert(handle, Arc::new(bitmap));
    }

    /// Registers raw asset bytes.
    pub fn insert_raw(&self, handle: EntityHandle, bytes: Vec<u8>) {
        self.raw.write().insert(handle, Arc::new(bytes));
    }

    /// Request counters.
    #[must_use]
    pub fn stats(&self) -> &SourceStats {
        &self.stats
    }
}

impl AssetSource for MemoryAssetSource {
    fn fetch_texture(&self, handle: &EntityHandle) -> Deferred<TextureAsset, FetchError> {
        self.stats.record_texture();
        match self.textures.read().get(handle) {
            Some(bitmap) => Deferred::resolved(TextureAsset {
                handle: *handle,
                bitmap: Arc::clone(bitmap),
            }),
            None => {
                self.stats.record_failure();
                Deferred::failed(FetchError::NotFound(*handle))
            }
        }
    }

    fn fetch_raw_asset(&self, handle: &EntityHandle) -> Deferred<Vec<u8>, FetchError> {
        self.stats.record_raw();
        match self.raw.read().get(handle) {
            Some(bytes) => Deferred::resolved(bytes.as_ref().clone()),
            None => {
                self.stats.record_failure();
                Deferred::failed(FetchError::NotFound(*handle))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primmesh_core::Uuid;
    use std::time::Duration;

    #[test]
    fn test_bitmap_shape_is_checked() {
        assert!(Bitmap::new(2, 2, vec![[0; 4]; 4]).is_some());
        assert!(Bitmap::new(2, 2, vec![[0; 4]; 3]).is_none());

        let bitmap = Bitmap::new(2, 1, vec![[1, 2, 3, 4], [5, 6, 7, 8]]).unwrap();
        assert_eq!(bitmap.pixel(1, 0), Some([5, 6, 7, 8]));
        assert_eq!(bitmap.pixel(2, 0), None);
    }

    #[test]
    fn test_image_decoder_png() {
        let mut png = Vec::new();
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let bitmap = ImageDecoder.decode(&png).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (3, 2));
        assert_eq!(bitmap.pixel(2, 1), Some([10, 20, 30, 255]));
    }

    #[test]
    fn test_image_decoder_rejects_garbage() {
        assert!(ImageDecoder.decode(b"not an image").is_err());
    }

    #[test]
    fn test_memory_source_counts_requests() {
        let source = MemoryAssetSource::new();
        let known = EntityHandle::new(Uuid::from_u128(1));
        let unknown = EntityHandle::new(Uuid::from_u128(2));
        source.insert_raw(known, vec![1, 2, 3]);

        let got = source
            .fetch_raw_asset(&known)
            .wait_timeout(Duration::from_secs(1));
        assert_eq!(got, Some(Ok(vec![1, 2, 3])));

        let missing = source
            .fetch_texture(&unknown)
            .wait_timeout(Duration::from_secs(1));
        assert_eq!(missing, Some(Err(FetchError::NotFound(unknown))));

        assert_eq!(source.stats().raw_requests(), 1);
        assert_eq!(source.stats().texture_requests(), 1);
        assert_eq!(source.stats().failures(), 1);
    }
}
