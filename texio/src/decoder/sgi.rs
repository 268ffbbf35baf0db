//! SGI decoder.

use std::path::Path;

use bytes::Bytes;

use super::{decode_file_as_stream, probe_stream, DecodeOutcome, DecodeRequest, DecodeResult, TextureDecoder};
use crate::codec::sgi::{is_sgi_image, SgiImage};
use crate::source::{SGI, SGI_RGB};
use crate::stream::TextureStream;
use crate::texture::TextureData;

/// Decodes SGI images.
///
/// Accepts input whose hint is `sgi` or `rgb`, or whose first two bytes are
/// the SGI magic number. Formats default to the image's channel layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SgiDecoder;

impl SgiDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl TextureDecoder for SgiDecoder {
    fn name(&self) -> &'static str {
        "sgi"
    }

    fn decode_file(&self, path: &Path, request: &DecodeRequest) -> DecodeResult {
        decode_file_as_stream(self, path, request)
    }

    fn decode_stream(&self, stream: &mut TextureStream<'_>, request: &DecodeRequest) -> DecodeResult {
        probe_stream(stream, |stream| {
            let hinted = request.suffix_is(SGI) || request.suffix_is(SGI_RGB);
            if !hinted && !is_sgi_image(stream.peek(2)?) {
                return Ok(DecodeOutcome::Rejected);
            }

            let image = SgiImage::read(&stream.read_remaining()?)?;
            let format = image.gl_format();
            let (width, height) = (image.width(), image.height());
            let data = TextureData::new(width, height, vec![Bytes::from(image.into_data())])?
                .with_formats(request.internal_format_or(format), request.pixel_format_or(format))
                .with_mipmap(request.mipmap);

            Ok(DecodeOutcome::Decoded(data))
        })
    }
}
