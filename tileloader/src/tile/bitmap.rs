//! Decoded tile bitmaps and their release contract

use image::{ImageFormat, RgbaImage};
use std::fmt;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type ReleaseHook = Box<dyn Fn() + Send + Sync>;

/// A decoded RGBA tile bitmap.
///
/// Cloning is cheap and shares the pixel buffer. The image carries an
/// explicit release contract: when a cache evicts it, [`release`] runs the
/// optional release hook exactly once no matter how many clones observe the
/// eviction. Pinned images (placeholders) ignore release entirely.
///
/// Holders that still have a clone after release can keep reading the
/// pixels; the buffer is freed when the last clone is dropped.
///
/// [`release`]: TileImage::release
#[derive(Clone)]
pub struct TileImage {
    inner: Arc<Inner>,
}

struct Inner {
    pixels: RgbaImage,
    pinned: bool,
    released: AtomicBool,
    on_release: Option<ReleaseHook>,
}

impl TileImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self::build(pixels, false, None)
    }

    /// Creates an image that runs `hook` when released.
    pub fn with_release_hook<F>(pixels: RgbaImage, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::build(pixels, false, Some(Box::new(hook)))
    }

    /// Creates an image that is never released.
    pub fn pinned(pixels: RgbaImage) -> Self {
        Self::build(pixels, true, None)
    }

    fn build(pixels: RgbaImage, pinned: bool, on_release: Option<ReleaseHook>) -> Self {
        Self {
            inner: Arc::new(Inner {
                pixels,
                pinned,
                released: AtomicBool::new(false),
                on_release,
            }),
        }
    }

    /// Decodes PNG or JPEG bytes (format sniffed from the content).
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(Self::new(decoded.to_rgba8()))
    }

    /// Encodes the bitmap as PNG for the disk tier.
    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buffer = Cursor::new(Vec::new());
        self.inner
            .pixels
            .write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }

    pub fn width(&self) -> u32 {
        self.inner.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.inner.pixels
    }

    /// Estimated memory footprint: `width * height * 4`.
    pub fn byte_size(&self) -> u64 {
        self.width() as u64 * self.height() as u64 * 4
    }

    pub fn is_pinned(&self) -> bool {
        self.inner.pinned
    }

    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::Acquire)
    }

    /// Runs the release contract.
    ///
    /// Returns `true` only for the call that actually released the image.
    /// Pinned images always return `false`.
    pub fn release(&self) -> bool {
        if self.inner.pinned {
            return false;
        }
        if self.inner.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(hook) = &self.inner.on_release {
            hook();
        }
        true
    }

    /// Copy the pixels into a new, independently released image.
    ///
    /// Used when one download is published under several keys, so evicting
    /// one key never releases the bitmap another key still caches.
    pub fn deep_clone(&self) -> TileImage {
        Self::new(self.inner.pixels.clone())
    }

    /// True if both handles share the same bitmap.
    pub fn ptr_eq(a: &TileImage, b: &TileImage) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl fmt::Debug for TileImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("pinned", &self.inner.pinned)
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::atomic::AtomicUsize;

    fn solid(size: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba(rgba))
    }

    #[test]
    fn test_byte_size() {
        let image = TileImage::new(solid(256, [0, 0, 0, 255]));
        assert_eq!(image.byte_size(), 256 * 256 * 4);
    }

    #[test]
    fn test_release_runs_hook_once_across_clones() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let image = TileImage::with_release_hook(solid(4, [1, 2, 3, 4]), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let clone = image.clone();

        assert!(image.release());
        assert!(!clone.release());
        assert!(!image.release());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(clone.is_released());
    }

    #[test]
    fn test_pinned_image_is_never_released() {
        let image = TileImage::pinned(solid(4, [0, 0, 0, 0]));
        assert!(!image.release());
        assert!(!image.is_released());
    }

    #[test]
    fn test_png_roundtrip_preserves_pixels() {
        let image = TileImage::new(solid(8, [10, 20, 30, 255]));
        let png = image.encode_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let decoded = TileImage::decode(&png).unwrap();
        assert_eq!(decoded.pixels(), image.pixels());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(TileImage::decode(b"not an image").is_err());
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let image = TileImage::new(solid(2, [5, 5, 5, 5]));
        let copy = image.deep_clone();

        assert!(!TileImage::ptr_eq(&image, &copy));
        assert_eq!(image.pixels(), copy.pixels());
        assert!(image.release());
        assert!(!copy.is_released());
    }

    #[test]
    fn test_ptr_eq() {
        let a = TileImage::new(solid(2, [0, 0, 0, 0]));
        let b = a.clone();
        let c = TileImage::new(solid(2, [0, 0, 0, 0]));
        assert!(TileImage::ptr_eq(&a, &b));
        assert!(!TileImage::ptr_eq(&a, &c));
    }
}
