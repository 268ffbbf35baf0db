//! DDS decoder. Reads files only; streams and URLs are never attempted.

use std::path::Path;

use tracing::debug;

use super::{DecodeOutcome, DecodeRequest, DecodeResult, TextureDecoder};
use crate::codec::dds::{DdsCompression, DdsImage, DdsPixelFormat};
use crate::config::TextureIoConfig;
use crate::fetch::UrlSource;
use crate::gl;
use crate::source::{suffix_of_path, DDS};
use crate::stream::TextureStream;
use crate::texture::{ReleaseHandle, TextureData};

/// Decodes DirectDraw Surface files.
///
/// Accepts a file when the hint or the file's own suffix is `dds`.
///
/// The file is memory-mapped unless disabled. Each mip level buffer is a
/// reference-counted slice of the mapping, and the mapping is unmapped when
/// the last slice is dropped. [`TextureData::release`] drops the slices the
/// texture data holds; a buffer the caller cloned out of it keeps the file
/// mapped until that clone is dropped too. The release callback itself only
/// records the release.
#[derive(Debug, Clone)]
pub struct DdsDecoder {
    memory_map: bool,
}

impl Default for DdsDecoder {
    fn default() -> Self {
        Self { memory_map: true }
    }
}

impl DdsDecoder {
    pub fn new(memory_map: bool) -> Self {
        Self { memory_map }
    }

    pub fn from_config(config: &TextureIoConfig) -> Self {
        Self::new(config.memory_map_files)
    }

    fn accepts(path: &Path, request: &DecodeRequest) -> bool {
        request.suffix_is(DDS) || suffix_of_path(path).as_deref() == Some(DDS)
    }

    fn build(&self, path: &Path, image: DdsImage, request: &DecodeRequest) -> DecodeResult {
        let pixel_format = request.pixel_format_or(layout_format(image.pixel_format()));
        let internal_format = match image.pixel_format() {
            DdsPixelFormat::Compressed(compression) => compressed_format(compression),
            _ => request.internal_format_or(pixel_format),
        };

        let use_chain = request.mipmap && image.mip_levels() > 1;
        let levels = if use_chain {
            image.levels()
        } else {
            image.level(0).into_iter().collect()
        };
        debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            stored_levels = image.mip_levels(),
            used_levels = levels.len(),
            compressed = image.is_compressed(),
            cubemap = image.is_cubemap(),
            volume = image.is_volume(),
            "Walked DDS mip chain"
        );

        let buffers = levels.into_iter().map(|level| level.data).collect();
        let display_path = path.display().to_string();
        let data = TextureData::new(image.width(), image.height(), buffers)?
            .with_formats(internal_format, pixel_format)
            .with_mipmap(use_chain)
            .with_compressed(image.is_compressed())
            .with_release(ReleaseHandle::new(move || {
                debug!(path = %display_path, "Released DDS level buffers");
            }));

        Ok(DecodeOutcome::Decoded(data))
    }
}

impl TextureDecoder for DdsDecoder {
    fn name(&self) -> &'static str {
        "dds"
    }

    fn decode_file(&self, path: &Path, request: &DecodeRequest) -> DecodeResult {
        if !Self::accepts(path, request) {
            return Ok(DecodeOutcome::Rejected);
        }
        let image = DdsImage::open(path, self.memory_map)?;
        self.build(path, image, request)
    }

    fn decode_stream(&self, _stream: &mut TextureStream<'_>, _request: &DecodeRequest) -> DecodeResult {
        Ok(DecodeOutcome::UnsupportedSource)
    }

    fn decode_url(&self, _url: &mut UrlSource<'_>, _request: &DecodeRequest) -> DecodeResult {
        Ok(DecodeOutcome::UnsupportedSource)
    }
}

/// Client pixel layout of a DDS pixel format.
fn layout_format(format: DdsPixelFormat) -> u32 {
    match format {
        DdsPixelFormat::R8G8B8 => gl::GL_RGB,
        _ => gl::GL_RGBA,
    }
}

fn compressed_format(compression: DdsCompression) -> u32 {
    match compression {
        DdsCompression::Dxt1 => gl::GL_COMPRESSED_RGB_S3TC_DXT1_EXT,
        DdsCompression::Dxt3 => gl::GL_COMPRESSED_RGBA_S3TC_DXT3_EXT,
        DdsCompression::Dxt5 => gl::GL_COMPRESSED_RGBA_S3TC_DXT5_EXT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::dds::tests::build_dds;
    use crate::error::TextureError;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(bytes)
            .unwrap();
        path
    }

    fn decode(decoder: &DdsDecoder, path: &Path, request: &DecodeRequest) -> TextureData {
        decoder
            .decode_file(path, request)
            .unwrap()
            .into_data()
            .expect("DDS should be decoded")
    }

    #[test]
    fn test_dxt1_single_level() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "tex.dds", &build_dds(8, 8, 1, Some(b"DXT1"), 0));

        let data = decode(
            &DdsDecoder::default(),
            &path,
            &DecodeRequest::new().with_mipmap(true),
        );

        assert!(data.is_compressed());
        assert!(!data.mipmap());
        assert_eq!(data.mipmap_levels(), 1);
        assert_eq!(data.buffers()[0].len(), 32);
        assert_eq!(data.internal_format(), gl::GL_COMPRESSED_RGB_S3TC_DXT1_EXT);
        assert_eq!(data.pixel_format(), gl::GL_RGBA);
    }

    #[test]
    fn test_mip_chain_when_requested() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "chain.dds", &build_dds(16, 16, 4, Some(b"DXT5"), 0));

        let data = decode(
            &DdsDecoder::new(false),
            &path,
            &DecodeRequest::new().with_mipmap(true),
        );

        assert!(data.mipmap());
        let sizes: Vec<usize> = data.buffers().iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![256, 64, 16, 16]);
        assert_eq!(data.buffers()[3][0], 3);
    }

    #[test]
    fn test_mip_chain_ignored_without_request() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "chain.dds", &build_dds(16, 16, 4, Some(b"DXT3"), 0));

        let data = decode(&DdsDecoder::default(), &path, &DecodeRequest::new());

        assert!(!data.mipmap());
        assert_eq!(data.mipmap_levels(), 1);
        assert_eq!(data.internal_format(), gl::GL_COMPRESSED_RGBA_S3TC_DXT3_EXT);
    }

    #[test]
    fn test_uncompressed_formats() {
        let dir = TempDir::new().unwrap();
        let rgb = write(&dir, "rgb.dds", &build_dds(4, 4, 1, None, 24));
        let rgba = write(&dir, "rgba.dds", &build_dds(4, 4, 1, None, 32));
        let decoder = DdsDecoder::default();

        let data = decode(&decoder, &rgb, &DecodeRequest::new());
        assert!(!data.is_compressed());
        assert_eq!(data.pixel_format(), gl::GL_RGB);
        assert_eq!(data.internal_format(), gl::GL_RGB);
        assert_eq!(data.buffers()[0].len(), 48);

        let data = decode(
            &decoder,
            &rgba,
            &DecodeRequest::new().with_formats(gl::GL_RGBA8, 0),
        );
        assert_eq!(data.pixel_format(), gl::GL_RGBA);
        assert_eq!(data.internal_format(), gl::GL_RGBA8);
    }

    #[test]
    fn test_compressed_ignores_requested_internal_format() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "tex.dds", &build_dds(4, 4, 1, Some(b"DXT1"), 0));

        let data = decode(
            &DdsDecoder::default(),
            &path,
            &DecodeRequest::new().with_formats(gl::GL_RGBA8, gl::GL_BGRA),
        );

        assert_eq!(data.internal_format(), gl::GL_COMPRESSED_RGB_S3TC_DXT1_EXT);
        assert_eq!(data.pixel_format(), gl::GL_BGRA);
    }

    #[test]
    fn test_hint_selects_file_without_suffix() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "texture.bin", &build_dds(4, 4, 1, Some(b"DXT1"), 0));
        let decoder = DdsDecoder::default();

        let outcome = decoder.decode_file(&path, &DecodeRequest::new()).unwrap();
        assert!(matches!(outcome, DecodeOutcome::Rejected));

        let outcome = decoder
            .decode_file(&path, &DecodeRequest::new().with_suffix(Some("DDS")))
            .unwrap();
        assert!(outcome.is_decoded());
    }

    #[test]
    fn test_unknown_fourcc_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "odd.dds", &build_dds(4, 4, 1, Some(b"ATI2"), 0));

        let err = DdsDecoder::default()
            .decode_file(&path, &DecodeRequest::new())
            .unwrap_err();

        assert!(matches!(err, TextureError::Unsupported { .. }));
        assert!(err.to_string().contains("ATI2"));
    }

    #[test]
    fn test_streams_are_unsupported() {
        let bytes = build_dds(4, 4, 1, Some(b"DXT1"), 0);
        let mut stream = TextureStream::new(&bytes[..]);
        let request = DecodeRequest::new().with_suffix(Some(DDS));

        let outcome = DdsDecoder::default()
            .decode_stream(&mut stream, &request)
            .unwrap();

        assert!(matches!(outcome, DecodeOutcome::UnsupportedSource));
        assert_eq!(stream.position(), 0);
    }

    #[test]
    fn test_release_keeps_mapping_until_release() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "tex.dds", &build_dds(8, 8, 2, Some(b"DXT1"), 0));

        let mut data = decode(
            &DdsDecoder::new(true),
            &path,
            &DecodeRequest::new().with_mipmap(true),
        );
        assert_eq!(data.buffers()[1][0], 1);

        data.release();
        assert!(data.is_released());
        assert!(data.buffers().is_empty());
    }

    #[test]
    fn test_cloned_level_outlives_release() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "tex.dds", &build_dds(8, 8, 2, Some(b"DXT1"), 0));

        let mut data = decode(
            &DdsDecoder::new(true),
            &path,
            &DecodeRequest::new().with_mipmap(true),
        );
        let level = data.buffers()[1].clone();

        data.release();

        assert_eq!(level.len(), 8);
        assert!(level.iter().all(|b| *b == 1));
    }
}
