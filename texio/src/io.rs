//! Texture I/O dispatcher.
//!
//! [`TextureIo`] owns a [`DecoderRegistry`] and tries its decoders in order
//! against one input source until a decoder accepts it:
//!
//! ```text
//!   TextureSource ──▶ TextureIo::decode
//!                          │
//!            ┌─────────────┼─────────────┬──────────────┐
//!            ▼             ▼             ▼              ▼
//!        custom...        TGA    ──▶    SGI    ──▶    DDS    ──▶  image
//!            │  Rejected / UnsupportedSource: try the next decoder
//!            │  Decoded: return Some(data)
//!            │  Err: return the error, no further decoders
//!            ▼
//!   all rejected: Ok(None)
//! ```
//!
//! Registration takes `&mut self`, so it cannot overlap a dispatch on the
//! same instance. Sharing one instance across threads is up to the caller.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, trace};

use crate::config::TextureIoConfig;
use crate::decoder::{
    DecodeOutcome, DecodeRequest, DecodeResult, DecoderRegistry, ImageDecoder, TextureDecoder,
};
use crate::error::TextureError;
use crate::fetch::{UrlFetcher, UrlSource};
use crate::gl;
use crate::source::TextureSource;
use crate::stream::TextureStream;
use crate::texture::{upload_and_release, TextureData, TextureUploader};

/// Decodes textures from files, streams, URLs and in-memory images.
///
/// # Example
///
/// ```no_run
/// use texio::{TextureIo, TextureIoConfig};
///
/// let io = TextureIo::new(&TextureIoConfig::default())?;
/// match io.decode_file("terrain.dds", true, None)? {
///     Some(data) => println!("{}x{}, {} levels", data.width(), data.height(), data.mipmap_levels()),
///     None => println!("no decoder recognized the file"),
/// }
/// # Ok::<(), texio::TextureError>(())
/// ```
#[derive(Debug)]
pub struct TextureIo {
    registry: DecoderRegistry,
    fetcher: UrlFetcher,
    image_decoder: ImageDecoder,
}

impl TextureIo {
    /// Create a dispatcher with the built-in decoders.
    ///
    /// # Errors
    ///
    /// Returns `Http` if the HTTP client cannot be built.
    pub fn new(config: &TextureIoConfig) -> Result<Self, TextureError> {
        Ok(Self::with_registry(
            DecoderRegistry::with_defaults(config),
            UrlFetcher::from_config(config)?,
        ))
    }

    /// Create a dispatcher over an explicit registry and URL fetcher.
    pub fn with_registry(registry: DecoderRegistry, fetcher: UrlFetcher) -> Self {
        Self {
            registry,
            fetcher,
            image_decoder: ImageDecoder::new(),
        }
    }

    pub fn registry(&self) -> &DecoderRegistry {
        &self.registry
    }

    /// Add a decoder ahead of all others. The fallback stays last.
    pub fn register_decoder(&mut self, decoder: Arc<dyn TextureDecoder>) {
        debug!(decoder = decoder.name(), "Registered texture decoder");
        self.registry.register(decoder);
    }

    /// Decode `source`, letting decoders pick formats where the request
    /// leaves them at 0.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no decoder recognizes the input.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an empty path or URL
    /// - `Malformed` / `Unsupported` when the accepting decoder fails
    /// - `Io` / `Http` when the source cannot be read
    pub fn decode(
        &self,
        source: TextureSource<'_>,
        request: &DecodeRequest,
    ) -> Result<Option<TextureData>, TextureError> {
        match source {
            TextureSource::File(path) => {
                if path.as_os_str().is_empty() {
                    return Err(TextureError::InvalidArgument("file path was empty".to_string()));
                }
                self.first_decoded("file", |decoder| decoder.decode_file(&path, request))
            }
            TextureSource::Stream(reader) => {
                let mut stream = TextureStream::new(reader);
                self.decode_texture_stream(&mut stream, request)
            }
            TextureSource::Url(url) => {
                if url.is_empty() {
                    return Err(TextureError::InvalidArgument("URL was empty".to_string()));
                }
                let mut url = UrlSource::new(url, &self.fetcher);
                self.first_decoded("url", |decoder| decoder.decode_url(&mut url, request))
            }
            TextureSource::Image(image) => Ok(Some(self.image_decoder.decode_image(image, request))),
        }
    }

    /// Decode with caller-chosen formats.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` before any decoder runs if either format is
    /// 0. Otherwise as [`decode`](TextureIo::decode).
    pub fn decode_with_formats(
        &self,
        source: TextureSource<'_>,
        internal_format: u32,
        pixel_format: u32,
        mipmap: bool,
        hint: Option<&str>,
    ) -> Result<Option<TextureData>, TextureError> {
        if internal_format == gl::UNSPECIFIED {
            return Err(TextureError::InvalidArgument(
                "internal format must be non-zero".to_string(),
            ));
        }
        if pixel_format == gl::UNSPECIFIED {
            return Err(TextureError::InvalidArgument(
                "pixel format must be non-zero".to_string(),
            ));
        }

        let request = DecodeRequest::new()
            .with_formats(internal_format, pixel_format)
            .with_mipmap(mipmap)
            .with_suffix(hint);
        self.decode(source, &request)
    }

    pub fn decode_file(
        &self,
        path: impl AsRef<Path>,
        mipmap: bool,
        hint: Option<&str>,
    ) -> Result<Option<TextureData>, TextureError> {
        self.decode(
            TextureSource::File(path.as_ref().to_path_buf()),
            &Self::request(mipmap, hint),
        )
    }

    pub fn decode_stream<R: Read>(
        &self,
        reader: R,
        mipmap: bool,
        hint: Option<&str>,
    ) -> Result<Option<TextureData>, TextureError> {
        let mut stream = TextureStream::new(reader);
        self.decode_texture_stream(&mut stream, &Self::request(mipmap, hint))
    }

    pub fn decode_url(
        &self,
        url: &str,
        mipmap: bool,
        hint: Option<&str>,
    ) -> Result<Option<TextureData>, TextureError> {
        self.decode(TextureSource::url(url), &Self::request(mipmap, hint))
    }

    /// Wrap an in-memory image. Formats are derived from its channels.
    pub fn decode_image(&self, image: DynamicImage, mipmap: bool) -> TextureData {
        self.image_decoder
            .decode_image(image, &DecodeRequest::new().with_mipmap(mipmap))
    }

    /// Dispatch over a caller-owned stream.
    ///
    /// Every decoder sees the stream from its current position. If no
    /// decoder accepts, the stream is left at that position. A mark the
    /// caller set before the call is reinstated afterwards.
    pub fn decode_texture_stream(
        &self,
        stream: &mut TextureStream<'_>,
        request: &DecodeRequest,
    ) -> Result<Option<TextureData>, TextureError> {
        let outer = stream.mark_nested();

        let result = self.first_decoded("stream", |decoder| {
            let outcome = decoder.decode_stream(stream, request)?;
            if !outcome.is_decoded() {
                stream.reset()?;
            }
            Ok(outcome)
        });

        if !stream.restore_mark(outer) {
            debug!("Caller's stream mark was discarded during dispatch");
        }
        result
    }

    /// Decode `source`, upload it and release the decoded data.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no decoder recognizes the input; the uploader is not
    /// called.
    pub fn load_texture<U>(
        &self,
        uploader: &mut U,
        source: TextureSource<'_>,
        mipmap: bool,
        hint: Option<&str>,
    ) -> Result<Option<U::Texture>, TextureError>
    where
        U: TextureUploader + ?Sized,
    {
        match self.decode(source, &Self::request(mipmap, hint))? {
            Some(data) => upload_and_release(uploader, data).map(Some),
            None => Ok(None),
        }
    }

    fn request(mipmap: bool, hint: Option<&str>) -> DecodeRequest {
        DecodeRequest::new().with_mipmap(mipmap).with_suffix(hint)
    }

    fn first_decoded<F>(&self, kind: &str, mut attempt: F) -> Result<Option<TextureData>, TextureError>
    where
        F: FnMut(&dyn TextureDecoder) -> DecodeResult,
    {
        for decoder in self.registry.iter() {
            match attempt(decoder.as_ref())? {
                DecodeOutcome::Decoded(data) => {
                    debug!(
                        decoder = decoder.name(),
                        source = kind,
                        width = data.width(),
                        height = data.height(),
                        levels = data.mipmap_levels(),
                        compressed = data.is_compressed(),
                        "Decoder accepted texture"
                    );
                    return Ok(Some(data));
                }
                DecodeOutcome::Rejected => {
                    trace!(decoder = decoder.name(), source = kind, "Decoder rejected input");
                }
                DecodeOutcome::UnsupportedSource => {
                    trace!(decoder = decoder.name(), source = kind, "Decoder skips this source kind");
                }
            }
        }

        trace!(source = kind, "No decoder recognized input");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::sgi::tests::build_verbatim;
    use crate::codec::tga::tests::build_bgra;
    use crate::fetch::MockHttpClient;
    use crate::texture::RecordingUploader;
    use bytes::Bytes;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn texture_io(client: MockHttpClient) -> (TextureIo, Arc<MockHttpClient>) {
        let client = Arc::new(client);
        let fetcher = UrlFetcher::new(client.clone(), 1 << 20);
        let registry = DecoderRegistry::with_defaults(&TextureIoConfig::default());
        (TextureIo::with_registry(registry, fetcher), client)
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 4]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    /// Accepts everything, counting calls.
    struct CountingDecoder {
        calls: AtomicUsize,
    }

    impl TextureDecoder for CountingDecoder {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn decode_file(&self, _path: &Path, _request: &DecodeRequest) -> DecodeResult {
            Ok(DecodeOutcome::Rejected)
        }

        fn decode_stream(
            &self,
            _stream: &mut TextureStream<'_>,
            _request: &DecodeRequest,
        ) -> DecodeResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let data = TextureData::new(1, 1, vec![Bytes::from_static(&[0, 0, 0, 0])])?
                .with_formats(gl::GL_RGBA8, gl::GL_RGBA);
            Ok(DecodeOutcome::Decoded(data))
        }
    }

    /// Reads a byte and rejects without rewinding.
    struct SloppyDecoder;

    impl TextureDecoder for SloppyDecoder {
        fn name(&self) -> &'static str {
            "sloppy"
        }

        fn decode_file(&self, _path: &Path, _request: &DecodeRequest) -> DecodeResult {
            Ok(DecodeOutcome::Rejected)
        }

        fn decode_stream(
            &self,
            stream: &mut TextureStream<'_>,
            _request: &DecodeRequest,
        ) -> DecodeResult {
            let mut byte = [0u8; 1];
            stream.read_exact(&mut byte)?;
            Ok(DecodeOutcome::Rejected)
        }
    }

    #[test]
    fn test_stream_dispatch_falls_through_to_image() {
        let (io, _) = texture_io(MockHttpClient::ok(Vec::new()));

        let data = io.decode_stream(&png_bytes()[..], false, None).unwrap().unwrap();

        assert_eq!((data.width(), data.height()), (2, 2));
        assert!(data.must_flip_vertically());
    }

    #[test]
    fn test_unrecognized_stream_is_none() {
        let (io, _) = texture_io(MockHttpClient::ok(Vec::new()));
        let mut stream = TextureStream::new(&b"\x00\x01 unknown"[..]);

        let result = io
            .decode_texture_stream(&mut stream, &DecodeRequest::new())
            .unwrap();

        assert!(result.is_none());
        assert_eq!(stream.position(), 0);
        assert!(!stream.is_marked());
    }

    #[test]
    fn test_stream_dispatch_keeps_caller_mark() {
        use std::io::Read as _;

        let (io, _) = texture_io(MockHttpClient::ok(Vec::new()));
        let mut stream = TextureStream::new(&b"hdr\x00\x01 unknown"[..]);
        stream.mark();
        let mut header = [0u8; 3];
        stream.read_exact(&mut header).unwrap();

        let result = io
            .decode_texture_stream(&mut stream, &DecodeRequest::new())
            .unwrap();

        assert!(result.is_none());
        assert_eq!(stream.position(), 3);
        assert_eq!(stream.marked_position(), Some(0));
        stream.reset().unwrap();
        assert_eq!(stream.read_remaining().unwrap(), b"hdr\x00\x01 unknown");
    }

    #[test]
    fn test_tga_hint_on_garbage_is_error() {
        let (io, _) = texture_io(MockHttpClient::ok(Vec::new()));

        let err = io.decode_stream(&png_bytes()[..], false, Some("TGA")).unwrap_err();

        assert!(err.is_decode_error());
    }

    #[test]
    fn test_url_fetched_once_across_decoders() {
        let body = build_verbatim(1, 1, &[vec![5], vec![6], vec![7]]);
        let (io, client) = texture_io(MockHttpClient::ok(png_bytes()));

        let data = io.decode_url("https://example.com/tex", false, None).unwrap().unwrap();
        assert_eq!(data.width(), 2);
        assert_eq!(client.call_count(), 1);

        let (io, client) = texture_io(MockHttpClient::ok(body));
        let data = io.decode_url("http://example.com/tex", false, None).unwrap().unwrap();
        assert_eq!(data.pixel_format(), gl::GL_RGB);
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn test_url_fetch_failure_propagates() {
        let (io, _) = texture_io(MockHttpClient::failing("connection refused"));

        let result = io.decode_url("https://example.com/x.png", false, None);

        assert!(matches!(result, Err(TextureError::Http(_))));
    }

    #[test]
    fn test_empty_sources_are_invalid() {
        let (io, client) = texture_io(MockHttpClient::ok(Vec::new()));

        assert!(matches!(
            io.decode_url("", false, None),
            Err(TextureError::InvalidArgument(_))
        ));
        assert!(matches!(
            io.decode_file("", false, None),
            Err(TextureError::InvalidArgument(_))
        ));
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn test_explicit_formats_must_be_non_zero() {
        let (io, _) = texture_io(MockHttpClient::ok(Vec::new()));

        for pixel in [0, gl::GL_RGBA] {
            let result = io.decode_with_formats(
                TextureSource::stream(&png_bytes()[..]),
                0,
                pixel,
                false,
                None,
            );
            assert!(matches!(result, Err(TextureError::InvalidArgument(_))));
        }

        let result = io.decode_with_formats(
            TextureSource::stream(&png_bytes()[..]),
            gl::GL_RGBA8,
            0,
            false,
            None,
        );
        assert!(matches!(result, Err(TextureError::InvalidArgument(_))));
    }

    #[test]
    fn test_explicit_formats_reach_decoder() {
        let (io, _) = texture_io(MockHttpClient::ok(Vec::new()));
        let bytes = build_bgra(1, 1, &[1, 2, 3, 4]);

        let data = io
            .decode_with_formats(
                TextureSource::stream(&bytes[..]),
                gl::GL_RGBA,
                gl::GL_BGRA,
                false,
                Some("tga"),
            )
            .unwrap()
            .unwrap();

        assert_eq!(data.internal_format(), gl::GL_RGBA);
        assert_eq!(data.pixel_format(), gl::GL_BGRA);
    }

    #[test]
    fn test_registered_decoder_wins() {
        let (mut io, _) = texture_io(MockHttpClient::ok(Vec::new()));
        let counting = Arc::new(CountingDecoder {
            calls: AtomicUsize::new(0),
        });
        io.register_decoder(counting.clone());

        let data = io.decode_stream(&png_bytes()[..], false, None).unwrap().unwrap();

        assert_eq!(data.width(), 1);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
        assert_eq!(io.registry().names()[0], "counting");
        assert_eq!(io.registry().names().last(), Some(&"image"));
    }

    #[test]
    fn test_stream_rewound_after_sloppy_rejection() {
        let (mut io, _) = texture_io(MockHttpClient::ok(Vec::new()));
        io.register_decoder(Arc::new(SloppyDecoder));

        let data = io.decode_stream(&png_bytes()[..], false, None).unwrap();

        assert!(data.is_some());
    }

    #[test]
    fn test_image_source() {
        let (io, _) = texture_io(MockHttpClient::ok(Vec::new()));
        let img = DynamicImage::ImageLuma8(image::GrayImage::new(4, 4));

        let data = io
            .decode(TextureSource::Image(img), &DecodeRequest::new())
            .unwrap()
            .unwrap();

        assert_eq!(data.pixel_format(), gl::GL_LUMINANCE);
        assert_eq!(data.buffers()[0].len(), 16);
    }

    #[test]
    fn test_load_texture_uploads_and_releases() {
        let (io, _) = texture_io(MockHttpClient::ok(Vec::new()));
        let mut uploader = RecordingUploader::default();

        let texture = io
            .load_texture(&mut uploader, TextureSource::stream(&png_bytes()[..]), true, None)
            .unwrap();

        assert_eq!(texture, Some(1));
        assert_eq!(uploader.uploads, vec![(2, 2, 1)]);
    }

    #[test]
    fn test_load_texture_unrecognized_skips_upload() {
        let (io, _) = texture_io(MockHttpClient::ok(Vec::new()));
        let mut uploader = RecordingUploader::default();

        let texture = io
            .load_texture(&mut uploader, TextureSource::stream(&b"????"[..]), false, None)
            .unwrap();

        assert!(texture.is_none());
        assert!(uploader.uploads.is_empty());
    }
}
