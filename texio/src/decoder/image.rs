//! Fallback decoder backed by the `image` crate.

use std::path::Path;

use ::image::{DynamicImage, ImageError, ImageFormat};
use tracing::trace;

use super::{decode_file_as_stream, probe_stream, DecodeOutcome, DecodeRequest, DecodeResult, TextureDecoder};
use crate::error::TextureError;
use crate::stream::TextureStream;
use crate::texture::TextureData;

/// Decodes any format the `image` crate can identify from its signature
/// (PNG, JPEG, GIF, TIFF, BMP, ...).
///
/// Input whose format cannot be identified is rejected. Input that is
/// identified but fails to decode is a `Malformed` error. The registry keeps
/// this decoder last.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDecoder;

impl ImageDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Wrap an image that is already decoded in memory.
    pub fn decode_image(&self, image: DynamicImage, request: &DecodeRequest) -> TextureData {
        TextureData::from_image(
            image,
            request.internal_format,
            request.pixel_format,
            request.mipmap,
        )
    }
}

impl TextureDecoder for ImageDecoder {
    fn name(&self) -> &'static str {
        "image"
    }

    fn decode_file(&self, path: &Path, request: &DecodeRequest) -> DecodeResult {
        decode_file_as_stream(self, path, request)
    }

    fn decode_stream(&self, stream: &mut TextureStream<'_>, request: &DecodeRequest) -> DecodeResult {
        probe_stream(stream, |stream| {
            let bytes = stream.read_remaining()?;
            let format = match ::image::guess_format(&bytes) {
                Ok(format) => format,
                Err(_) => {
                    trace!(bytes = bytes.len(), "No image signature found");
                    return Ok(DecodeOutcome::Rejected);
                }
            };

            let image = ::image::load_from_memory_with_format(&bytes, format)
                .map_err(|e| decode_error(format, e))?;
            Ok(DecodeOutcome::Decoded(self.decode_image(image, request)))
        })
    }
}

fn decode_error(format: ImageFormat, err: ImageError) -> TextureError {
    match err {
        ImageError::IoError(io) => TextureError::Io(io),
        ImageError::Unsupported(e) => TextureError::unsupported(format_name(format), e.to_string()),
        other => TextureError::malformed(format_name(format), other.to_string()),
    }
}

fn format_name(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("image")
}
