//! The decoded texture descriptor.

use std::fmt;

use bytes::Bytes;
use image::DynamicImage;
use tracing::debug;

use super::ReleaseHandle;
use crate::error::TextureError;
use crate::gl;

/// Raw pixel data plus the format metadata needed to upload it to the GPU.
///
/// Produced by exactly one decoder and consumed by at most one upload.
/// `width` and `height` describe mip level 0. There is one buffer per mip
/// level supplied by the file, or a single buffer when the file carries no
/// mip chain.
///
/// # Release
///
/// [`release`](TextureData::release) is idempotent. The first call drops the
/// pixel buffers and runs the attached [`ReleaseHandle`]; later calls do
/// nothing. Dropping an unreleased descriptor releases it.
pub struct TextureData {
    internal_format: u32,
    pixel_format: u32,
    pixel_type: u32,
    width: u32,
    height: u32,
    border: u32,
    mipmap: bool,
    compressed: bool,
    must_flip_vertically: bool,
    buffers: Vec<Bytes>,
    release: ReleaseHandle,
    released: bool,
}

impl TextureData {
    /// Create a descriptor over one buffer per mip level.
    ///
    /// Formats start unspecified (`0`), the pixel type is
    /// `GL_UNSIGNED_BYTE`, border is 0 and no mipmaps are requested.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `buffers` is empty.
    pub fn new(width: u32, height: u32, buffers: Vec<Bytes>) -> Result<Self, TextureError> {
        if buffers.is_empty() {
            return Err(TextureError::InvalidArgument(
                "texture data needs at least one pixel buffer".to_string(),
            ));
        }

        Ok(Self {
            internal_format: gl::UNSPECIFIED,
            pixel_format: gl::UNSPECIFIED,
            pixel_type: gl::GL_UNSIGNED_BYTE,
            width,
            height,
            border: 0,
            mipmap: false,
            compressed: false,
            must_flip_vertically: false,
            buffers,
            release: ReleaseHandle::noop(),
            released: false,
        })
    }

    /// Wrap an already decoded in-memory image.
    ///
    /// Pixel rows of an `image` buffer run top to bottom, so the result is
    /// flagged [`must_flip_vertically`](TextureData::must_flip_vertically).
    /// A zero format is replaced by one derived from the channel layout.
    pub fn from_image(
        image: DynamicImage,
        internal_format: u32,
        pixel_format: u32,
        mipmap: bool,
    ) -> Self {
        let (width, height) = (image.width(), image.height());
        let (pixels, channels, layout) = match image {
            DynamicImage::ImageLuma8(img) => (img.into_raw(), 1, gl::GL_LUMINANCE),
            DynamicImage::ImageLumaA8(img) => (img.into_raw(), 2, gl::GL_LUMINANCE_ALPHA),
            DynamicImage::ImageRgb8(img) => (img.into_raw(), 3, gl::GL_RGB),
            DynamicImage::ImageRgba8(img) => (img.into_raw(), 4, gl::GL_RGBA),
            other if other.color().has_alpha() => (other.to_rgba8().into_raw(), 4, gl::GL_RGBA),
            other => (other.to_rgb8().into_raw(), 3, gl::GL_RGB),
        };

        let internal_format = if internal_format == gl::UNSPECIFIED {
            gl::rgb_or_rgba(channels)
        } else {
            internal_format
        };
        let pixel_format = if pixel_format == gl::UNSPECIFIED {
            layout
        } else {
            pixel_format
        };

        Self {
            internal_format,
            pixel_format,
            pixel_type: gl::GL_UNSIGNED_BYTE,
            width,
            height,
            border: 0,
            mipmap,
            compressed: false,
            must_flip_vertically: true,
            buffers: vec![Bytes::from(pixels)],
            release: ReleaseHandle::noop(),
            released: false,
        }
    }

    /// Set the GPU internal format and the client pixel format.
    pub fn with_formats(mut self, internal_format: u32, pixel_format: u32) -> Self {
        self.internal_format = internal_format;
        self.pixel_format = pixel_format;
        self
    }

    /// Set the pixel component type.
    pub fn with_pixel_type(mut self, pixel_type: u32) -> Self {
        self.pixel_type = pixel_type;
        self
    }

    pub fn with_border(mut self, border: u32) -> Self {
        self.border = border;
        self
    }

    /// Set whether mipmaps are wanted.
    pub fn with_mipmap(mut self, mipmap: bool) -> Self {
        self.mipmap = mipmap;
        self
    }

    /// Mark the buffers as GPU block-compressed data.
    pub fn with_compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    pub fn with_flip_vertically(mut self, flip: bool) -> Self {
        self.must_flip_vertically = flip;
        self
    }

    /// Attach the handle that frees whatever backs the buffers.
    pub fn with_release(mut self, release: ReleaseHandle) -> Self {
        self.release = release;
        self
    }

    pub fn internal_format(&self) -> u32 {
        self.internal_format
    }

    pub fn pixel_format(&self) -> u32 {
        self.pixel_format
    }

    pub fn pixel_type(&self) -> u32 {
        self.pixel_type
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn border(&self) -> u32 {
        self.border
    }

    /// Whether mipmaps are wanted. When the buffers hold a file-supplied mip
    /// chain this is `true` and no mipmaps should be generated.
    pub fn mipmap(&self) -> bool {
        self.mipmap
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Whether rows are stored top-down and must be flipped for GL.
    pub fn must_flip_vertically(&self) -> bool {
        self.must_flip_vertically
    }

    /// Pixel buffers, level 0 first. Empty once released.
    pub fn buffers(&self) -> &[Bytes] {
        &self.buffers
    }

    /// Number of mip levels carried by the buffers.
    pub fn mipmap_levels(&self) -> usize {
        self.buffers.len()
    }

    /// Total bytes held by the pixel buffers.
    pub fn estimated_memory_size(&self) -> usize {
        self.buffers.iter().map(Bytes::len).sum()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Drop the pixel buffers and free the resources behind them.
    ///
    /// Safe to call more than once.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.buffers.clear();
        if self.release.release() {
            debug!(
                width = self.width,
                height = self.height,
                "Released texture data resources"
            );
        }
    }
}

impl fmt::Debug for TextureData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sizes: Vec<usize> = self.buffers.iter().map(Bytes::len).collect();
        f.debug_struct("TextureData")
            .field("internal_format", &format_args!("{:#06x}", self.internal_format))
            .field("pixel_format", &format_args!("{:#06x}", self.pixel_format))
            .field("pixel_type", &format_args!("{:#06x}", self.pixel_type))
            .field("width", &self.width)
            .field("height", &self.height)
            .field("border", &self.border)
            .field("mipmap", &self.mipmap)
            .field("compressed", &self.compressed)
            .field("must_flip_vertically", &self.must_flip_vertically)
            .field("buffer_sizes", &sizes)
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Rgb32FImage, RgbImage, RgbaImage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_new_rejects_empty_buffers() {
        let result = TextureData::new(4, 4, Vec::new());
        assert!(matches!(result, Err(TextureError::InvalidArgument(_))));
    }

    #[test]
    fn test_new_defaults() {
        let data = TextureData::new(2, 2, vec![Bytes::from(vec![0u8; 16])]).unwrap();
        assert_eq!(data.internal_format(), gl::UNSPECIFIED);
        assert_eq!(data.pixel_format(), gl::UNSPECIFIED);
        assert_eq!(data.pixel_type(), gl::GL_UNSIGNED_BYTE);
        assert_eq!(data.border(), 0);
        assert!(!data.mipmap());
        assert!(!data.is_compressed());
        assert_eq!(data.mipmap_levels(), 1);
        assert_eq!(data.estimated_memory_size(), 16);
    }

    #[test]
    fn test_builder_setters() {
        let data = TextureData::new(8, 8, vec![Bytes::from(vec![0u8; 32])])
            .unwrap()
            .with_formats(gl::GL_COMPRESSED_RGBA_S3TC_DXT5_EXT, gl::GL_RGBA)
            .with_compressed(true)
            .with_mipmap(true)
            .with_border(1)
            .with_flip_vertically(true);

        assert_eq!(data.internal_format(), gl::GL_COMPRESSED_RGBA_S3TC_DXT5_EXT);
        assert_eq!(data.pixel_format(), gl::GL_RGBA);
        assert!(data.is_compressed());
        assert!(data.mipmap());
        assert_eq!(data.border(), 1);
        assert!(data.must_flip_vertically());
    }

    #[test]
    fn test_from_image_rgb_defaults() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(3, 2));
        let data = TextureData::from_image(image, 0, 0, false);
        assert_eq!(data.internal_format(), gl::GL_RGB);
        assert_eq!(data.pixel_format(), gl::GL_RGB);
        assert_eq!(data.estimated_memory_size(), 3 * 2 * 3);
        assert!(data.must_flip_vertically());
    }

    #[test]
    fn test_from_image_rgba_keeps_caller_formats() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(2, 2));
        let data = TextureData::from_image(image, gl::GL_RGBA8, gl::GL_RGBA, true);
        assert_eq!(data.internal_format(), gl::GL_RGBA8);
        assert_eq!(data.pixel_format(), gl::GL_RGBA);
        assert!(data.mipmap());
    }

    #[test]
    fn test_from_image_gray() {
        let image = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
        let data = TextureData::from_image(image, 0, 0, false);
        assert_eq!(data.internal_format(), gl::GL_RGBA);
        assert_eq!(data.pixel_format(), gl::GL_LUMINANCE);
        assert_eq!(data.estimated_memory_size(), 16);
    }

    #[test]
    fn test_from_image_float_converted_to_bytes() {
        let image = DynamicImage::ImageRgb32F(Rgb32FImage::new(2, 2));
        let data = TextureData::from_image(image, 0, 0, false);
        assert_eq!(data.pixel_format(), gl::GL_RGB);
        assert_eq!(data.estimated_memory_size(), 2 * 2 * 3);
    }

    #[test]
    fn test_release_is_idempotent() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut data = TextureData::new(1, 1, vec![Bytes::from_static(&[1, 2, 3, 4])])
            .unwrap()
            .with_release(ReleaseHandle::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));

        data.release();
        data.release();

        assert!(data.is_released());
        assert!(data.buffers().is_empty());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        drop(data);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let data = TextureData::new(1, 1, vec![Bytes::from_static(&[0])])
            .unwrap()
            .with_release(ReleaseHandle::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));

        drop(data);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
