//! Targa decoder.

use std::path::Path;

use bytes::Bytes;

use super::{decode_file_as_stream, probe_stream, DecodeOutcome, DecodeRequest, DecodeResult, TextureDecoder};
use crate::codec::tga::TgaImage;
use crate::gl;
use crate::source::TGA;
use crate::stream::TextureStream;
use crate::texture::TextureData;

/// Decodes Targa images.
///
/// TGA has no magic number, so input is only accepted when the hint is
/// `tga`. Once accepted, content that is not valid Targa is a decode error.
/// The internal format defaults to `GL_RGBA8`; the pixel format to the
/// image's BGR(A) or luminance layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct TgaDecoder;

impl TgaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl TextureDecoder for TgaDecoder {
    fn name(&self) -> &'static str {
        "tga"
    }

    fn decode_file(&self, path: &Path, request: &DecodeRequest) -> DecodeResult {
        decode_file_as_stream(self, path, request)
    }

    fn decode_stream(&self, stream: &mut TextureStream<'_>, request: &DecodeRequest) -> DecodeResult {
        if !request.suffix_is(TGA) {
            return Ok(DecodeOutcome::Rejected);
        }

        probe_stream(stream, |stream| {
            let image = TgaImage::read(&stream.read_remaining()?)?;
            let (width, height) = (image.width(), image.height());
            let pixel_format = request.pixel_format_or(image.gl_format());
            let data = TextureData::new(width, height, vec![Bytes::from(image.into_data())])?
                .with_formats(request.internal_format_or(gl::GL_RGBA8), pixel_format)
                .with_mipmap(request.mipmap);

            Ok(DecodeOutcome::Decoded(data))
        })
    }
}
