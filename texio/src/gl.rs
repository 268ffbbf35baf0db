//! OpenGL enum values used to describe decoded textures.
//!
//! Only the values a decoder can produce are listed. A value of `0` in a
//! format field means "unspecified, let the decoder choose".

/// No format preference.
pub const UNSPECIFIED: u32 = 0;

pub const GL_UNSIGNED_BYTE: u32 = 0x1401;

pub const GL_RGB: u32 = 0x1907;
pub const GL_RGBA: u32 = 0x1908;
pub const GL_LUMINANCE: u32 = 0x1909;
pub const GL_LUMINANCE_ALPHA: u32 = 0x190A;
pub const GL_BGR: u32 = 0x80E0;
pub const GL_BGRA: u32 = 0x80E1;

pub const GL_RGB8: u32 = 0x8051;
pub const GL_RGBA8: u32 = 0x8058;

pub const GL_COMPRESSED_RGB_S3TC_DXT1_EXT: u32 = 0x83F0;
pub const GL_COMPRESSED_RGBA_S3TC_DXT1_EXT: u32 = 0x83F1;
pub const GL_COMPRESSED_RGBA_S3TC_DXT3_EXT: u32 = 0x83F2;
pub const GL_COMPRESSED_RGBA_S3TC_DXT5_EXT: u32 = 0x83F3;

const NAMES: &[(u32, &str)] = &[
    (GL_UNSIGNED_BYTE, "GL_UNSIGNED_BYTE"),
    (GL_RGB, "GL_RGB"),
    (GL_RGBA, "GL_RGBA"),
    (GL_LUMINANCE, "GL_LUMINANCE"),
    (GL_LUMINANCE_ALPHA, "GL_LUMINANCE_ALPHA"),
    (GL_BGR, "GL_BGR"),
    (GL_BGRA, "GL_BGRA"),
    (GL_RGB8, "GL_RGB8"),
    (GL_RGBA8, "GL_RGBA8"),
    (GL_COMPRESSED_RGB_S3TC_DXT1_EXT, "GL_COMPRESSED_RGB_S3TC_DXT1_EXT"),
    (GL_COMPRESSED_RGBA_S3TC_DXT1_EXT, "GL_COMPRESSED_RGBA_S3TC_DXT1_EXT"),
    (GL_COMPRESSED_RGBA_S3TC_DXT3_EXT, "GL_COMPRESSED_RGBA_S3TC_DXT3_EXT"),
    (GL_COMPRESSED_RGBA_S3TC_DXT5_EXT, "GL_COMPRESSED_RGBA_S3TC_DXT5_EXT"),
];

/// Symbolic name for a GL enum value, for diagnostics.
pub fn enum_name(value: u32) -> Option<&'static str> {
    NAMES
        .iter()
        .find(|(v, _)| *v == value)
        .map(|(_, name)| *name)
}

/// GL enum value for a symbolic name. The `GL_` prefix and case are
/// optional.
pub fn enum_value(name: &str) -> Option<u32> {
    let upper = name.to_ascii_uppercase();
    let wanted = upper.strip_prefix("GL_").unwrap_or(&upper);
    NAMES
        .iter()
        .find(|(_, n)| n.strip_prefix("GL_") == Some(wanted))
        .map(|(v, _)| *v)
}

/// Default RGB/RGBA choice from a channel count: 3 channels map to RGB,
/// everything else to RGBA.
pub fn rgb_or_rgba(channels: u8) -> u32 {
    if channels == 3 {
        GL_RGB
    } else {
        GL_RGBA
    }
}
