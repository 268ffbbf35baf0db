//! Texture input sources and format-suffix hints.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use image::DynamicImage;

/// DirectDraw Surface.
pub const DDS: &str = "dds";
/// SGI image.
pub const SGI: &str = "sgi";
/// SGI image, alternate suffix.
pub const SGI_RGB: &str = "rgb";
pub const GIF: &str = "gif";
pub const JPG: &str = "jpg";
pub const PNG: &str = "png";
/// Targa. TGA files have no signature, so this hint is the only way to
/// select the TGA decoder.
pub const TGA: &str = "tga";
pub const TIFF: &str = "tiff";

/// Where texture bytes come from.
pub enum TextureSource<'a> {
    /// A file on the local filesystem.
    File(PathBuf),
    /// Any byte stream.
    Stream(Box<dyn Read + 'a>),
    /// A `file://`, `http://` or `https://` URL.
    Url(String),
    /// An image that has already been decoded in memory.
    Image(DynamicImage),
}

impl<'a> TextureSource<'a> {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        TextureSource::File(path.into())
    }

    pub fn stream<R: Read + 'a>(reader: R) -> Self {
        TextureSource::Stream(Box::new(reader))
    }

    pub fn url(url: impl Into<String>) -> Self {
        TextureSource::Url(url.into())
    }

    /// Short name of the source kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            TextureSource::File(_) => "file",
            TextureSource::Stream(_) => "stream",
            TextureSource::Url(_) => "url",
            TextureSource::Image(_) => "image",
        }
    }
}

impl fmt::Debug for TextureSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureSource::File(path) => f.debug_tuple("File").field(path).finish(),
            TextureSource::Stream(_) => f.write_str("Stream(..)"),
            TextureSource::Url(url) => f.debug_tuple("Url").field(url).finish(),
            TextureSource::Image(img) => f
                .debug_struct("Image")
                .field("width", &img.width())
                .field("height", &img.height())
                .finish(),
        }
    }
}

/// Lowercased text after the last `.` in `name`, or `None` if there is no
/// dot.
///
/// # Examples
///
/// ```
/// use texio::source::suffix_of;
///
/// assert_eq!(suffix_of("a.b.TGA").as_deref(), Some("tga"));
/// assert_eq!(suffix_of("noext"), None);
/// ```
pub fn suffix_of(name: &str) -> Option<String> {
    name.rfind('.')
        .map(|dot| name[dot + 1..].to_lowercase())
}

/// [`suffix_of`] applied to the final component of `path`.
pub fn suffix_of_path(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(suffix_of)
}

/// Lowercase a caller-supplied hint; an empty hint counts as none.
pub(crate) fn normalize_hint(hint: Option<&str>) -> Option<String> {
    hint.filter(|h| !h.is_empty()).map(str::to_lowercase)
}
