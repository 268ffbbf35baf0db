//! Format decoders and the registry that orders them.
//!
//! A [`TextureDecoder`] turns one file format into [`TextureData`]. Each
//! decode call reports one of three outcomes:
//!
//! | Outcome                             | Meaning                                   | Dispatcher |
//! |-------------------------------------|-------------------------------------------|------------|
//! | `Ok(DecodeOutcome::Decoded)`        | Input accepted and decoded                | stop       |
//! | `Ok(DecodeOutcome::Rejected)`       | Not this decoder's format                 | next       |
//! | `Ok(DecodeOutcome::UnsupportedSource)` | Decoder never reads this source kind   | next       |
//! | `Err(_)`                            | Format recognized but the read failed     | propagate  |
//!
//! A decoder that rejects a stream must leave it where it found it, so the
//! next decoder can probe the same bytes.

mod dds;
mod image;
mod registry;
mod sgi;
mod tga;

pub use self::dds::DdsDecoder;
pub use self::image::ImageDecoder;
pub use self::registry::DecoderRegistry;
pub use self::sgi::SgiDecoder;
pub use self::tga::TgaDecoder;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::TextureError;
use crate::fetch::UrlSource;
use crate::gl;
use crate::source::{normalize_hint, suffix_of_path};
use crate::stream::TextureStream;
use crate::texture::TextureData;

/// What a decoder did with an input.
#[derive(Debug)]
pub enum DecodeOutcome {
    /// The input was decoded.
    Decoded(TextureData),
    /// The input is not in this decoder's format.
    Rejected,
    /// This decoder never reads this kind of source.
    UnsupportedSource,
}

impl DecodeOutcome {
    pub fn is_decoded(&self) -> bool {
        matches!(self, DecodeOutcome::Decoded(_))
    }

    pub fn into_data(self) -> Option<TextureData> {
        match self {
            DecodeOutcome::Decoded(data) => Some(data),
            DecodeOutcome::Rejected | DecodeOutcome::UnsupportedSource => None,
        }
    }
}

/// Result of a single decode attempt.
pub type DecodeResult = Result<DecodeOutcome, TextureError>;

/// Caller preferences passed to every decoder.
///
/// Formats of `0` ([`gl::UNSPECIFIED`]) let the decoder pick one from the
/// file's content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeRequest {
    pub internal_format: u32,
    pub pixel_format: u32,
    pub mipmap: bool,
    suffix: Option<String>,
}

impl DecodeRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_formats(mut self, internal_format: u32, pixel_format: u32) -> Self {
        self.internal_format = internal_format;
        self.pixel_format = pixel_format;
        self
    }

    pub fn with_mipmap(mut self, mipmap: bool) -> Self {
        self.mipmap = mipmap;
        self
    }

    /// Set the format-suffix hint. It is stored lowercased; an empty hint is
    /// treated as none.
    pub fn with_suffix(mut self, suffix: Option<&str>) -> Self {
        self.suffix = normalize_hint(suffix);
        self
    }

    /// The lowercased format-suffix hint.
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Whether the hint equals `suffix`.
    pub fn suffix_is(&self, suffix: &str) -> bool {
        self.suffix.as_deref() == Some(suffix)
    }

    /// The caller's internal format, or `default` when it is unspecified.
    pub fn internal_format_or(&self, default: u32) -> u32 {
        if self.internal_format == gl::UNSPECIFIED {
            default
        } else {
            self.internal_format
        }
    }

    /// The caller's pixel format, or `default` when it is unspecified.
    pub fn pixel_format_or(&self, default: u32) -> u32 {
        if self.pixel_format == gl::UNSPECIFIED {
            default
        } else {
            self.pixel_format
        }
    }
}

/// Decodes one texture file format.
///
/// Decoders are shared between dispatches and must hold no per-call state.
///
/// # Implementors
///
/// - [`DdsDecoder`] - DirectDraw Surface files, memory-mapped
/// - [`SgiDecoder`] - SGI images, detected by suffix or magic number
/// - [`TgaDecoder`] - Targa images, selected by the `tga` hint only
/// - [`ImageDecoder`] - everything the `image` crate reads; the fallback
pub trait TextureDecoder: Send + Sync {
    /// Short lowercase name used in logs and listings.
    fn name(&self) -> &'static str;

    /// Decode a file on disk.
    ///
    /// # Arguments
    ///
    /// * `path` - File to read
    /// * `request` - Formats, mipmap preference and suffix hint
    fn decode_file(&self, path: &Path, request: &DecodeRequest) -> DecodeResult;

    /// Decode from a stream positioned at the start of the image.
    ///
    /// On rejection the stream must be left at the position it had on entry.
    fn decode_stream(&self, stream: &mut TextureStream<'_>, request: &DecodeRequest)
        -> DecodeResult;

    /// Decode a URL. The default reads the URL's contents as a stream.
    fn decode_url(&self, url: &mut UrlSource<'_>, request: &DecodeRequest) -> DecodeResult {
        self.decode_stream(url.stream()?, request)
    }
}

/// Decode `path` through `decoder`'s stream path.
///
/// When the request has no suffix hint, the file name's suffix is used.
pub(crate) fn decode_file_as_stream<D>(
    decoder: &D,
    path: &Path,
    request: &DecodeRequest,
) -> DecodeResult
where
    D: TextureDecoder + ?Sized,
{
    let file = File::open(path)?;
    let mut stream = TextureStream::new(BufReader::new(file));

    if request.suffix().is_some() {
        return decoder.decode_stream(&mut stream, request);
    }
    let request = request
        .clone()
        .with_suffix(suffix_of_path(path).as_deref());
    decoder.decode_stream(&mut stream, &request)
}

/// Run `probe` with the stream marked; if it does not decode, rewind.
///
/// A caller's mark is set aside and reinstated afterwards. Errors are
/// returned without rewinding, since dispatch stops at the first error.
pub(crate) fn probe_stream<F>(stream: &mut TextureStream<'_>, probe: F) -> DecodeResult
where
    F: FnOnce(&mut TextureStream<'_>) -> DecodeResult,
{
    let outer = stream.mark_nested();

    let outcome = probe(stream)?;
    if !outcome.is_decoded() {
        stream.reset()?;
    }
    stream.restore_mark(outer);
    Ok(outcome)
}
