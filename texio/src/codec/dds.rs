//! DirectDraw Surface (DDS) reader.
//!
//! Parses the 128-byte DDS header and exposes the stored mip chain as
//! zero-copy slices of the file contents. Files can be memory-mapped, in
//! which case every level slice keeps the mapping alive.
//!
//! # Layout
//!
//! ```text
//! offset  size  field
//!      0     4  magic "DDS "
//!      4   124  DDS_HEADER (size, flags, height, width, pitch, depth,
//!               mipMapCount, reserved[11], DDS_PIXELFORMAT, caps[4], reserved)
//!    128     …  surface data
//! ```
//!
//! Cube maps store each face's full mip chain in turn, so the first face's
//! chain starts right after the header. Volume textures store every slice
//! of a level before the next level; only the first slice of each level is
//! exposed, the rest are skipped.
//!
//! Supported content: FourCC `DXT1`, `DXT3`, `DXT5`, and uncompressed
//! 24-bit RGB or 32-bit RGBA/RGBX.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use bytes::{Buf, Bytes};
use memmap2::Mmap;

use super::ensure_remaining;
use crate::error::TextureError;

const FORMAT: &str = "DDS";

/// `"DDS "` read as a little-endian u32.
pub const DDS_MAGIC: u32 = 0x2053_4444;

/// Magic plus `DDS_HEADER`.
pub const HEADER_SIZE: usize = 128;

const DDS_HEADER_STRUCT_SIZE: u32 = 124;
const DDS_PIXELFORMAT_SIZE: u32 = 32;

/// Upper bound on stored levels; a 2^31 texture has 32.
const MAX_MIP_LEVELS: u32 = 32;

// DDS_HEADER.dwFlags
pub const DDSD_MIPMAPCOUNT: u32 = 0x0002_0000;

// DDS_PIXELFORMAT.dwFlags
pub const DDPF_ALPHAPIXELS: u32 = 0x0000_0001;
pub const DDPF_FOURCC: u32 = 0x0000_0004;
pub const DDPF_RGB: u32 = 0x0000_0040;

// DDS_HEADER.dwCaps2
pub const DDSCAPS2_CUBEMAP: u32 = 0x0000_0200;
pub const DDSCAPS2_VOLUME: u32 = 0x0020_0000;

/// A four-character code such as `DXT1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const DXT1: FourCc = FourCc(*b"DXT1");
    pub const DXT3: FourCc = FourCc(*b"DXT3");
    pub const DXT5: FourCc = FourCc(*b"DXT5");
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            for b in self.0 {
                write!(f, "{}", b as char)?;
            }
            Ok(())
        } else {
            write!(f, "{:#010x}", u32::from_le_bytes(self.0))
        }
    }
}

/// S3TC block compression schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DdsCompression {
    Dxt1,
    Dxt3,
    Dxt5,
}

impl DdsCompression {
    /// Bytes per 4×4 block.
    pub fn block_size(self) -> usize {
        match self {
            DdsCompression::Dxt1 => 8,
            DdsCompression::Dxt3 | DdsCompression::Dxt5 => 16,
        }
    }

    fn from_fourcc(fourcc: FourCc) -> Result<Self, TextureError> {
        match fourcc {
            FourCc::DXT1 => Ok(DdsCompression::Dxt1),
            FourCc::DXT3 => Ok(DdsCompression::Dxt3),
            FourCc::DXT5 => Ok(DdsCompression::Dxt5),
            other => Err(TextureError::unsupported(
                FORMAT,
                format!("compression format \"{}\"", other),
            )),
        }
    }
}

/// Pixel layout of the stored data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DdsPixelFormat {
    /// 24-bit, no alpha.
    R8G8B8,
    /// 32-bit with alpha.
    A8R8G8B8,
    /// 32-bit, alpha byte unused.
    X8R8G8B8,
    Compressed(DdsCompression),
}

impl DdsPixelFormat {
    pub fn is_compressed(self) -> bool {
        matches!(self, DdsPixelFormat::Compressed(_))
    }

    /// Number of bytes needed for one level of the given size, or `None`
    /// if that does not fit in `usize`.
    pub fn level_size(self, width: u32, height: u32) -> Option<usize> {
        let (width, height) = (width as usize, height as usize);
        match self {
            DdsPixelFormat::Compressed(compression) => width
                .div_ceil(4)
                .max(1)
                .checked_mul(height.div_ceil(4).max(1))?
                .checked_mul(compression.block_size()),
            DdsPixelFormat::R8G8B8 => width.checked_mul(height)?.checked_mul(3),
            DdsPixelFormat::A8R8G8B8 | DdsPixelFormat::X8R8G8B8 => {
                width.checked_mul(height)?.checked_mul(4)
            }
        }
    }
}

/// The fields of `DDS_HEADER` this reader uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdsHeader {
    pub flags: u32,
    pub height: u32,
    pub width: u32,
    pub pitch_or_linear_size: u32,
    pub depth: u32,
    pub mip_map_count: u32,
    pub pixel_format_flags: u32,
    pub fourcc: FourCc,
    pub rgb_bit_count: u32,
    pub red_mask: u32,
    pub green_mask: u32,
    pub blue_mask: u32,
    pub alpha_mask: u32,
    pub caps1: u32,
    pub caps2: u32,
}

impl DdsHeader {
    /// Parse the magic and header from the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, TextureError> {
        let mut buf = bytes;
        ensure_remaining(&buf, HEADER_SIZE, FORMAT, "header")?;

        if buf.get_u32_le() != DDS_MAGIC {
            return Err(TextureError::malformed(FORMAT, "missing \"DDS \" magic"));
        }
        let size = buf.get_u32_le();
        if size != DDS_HEADER_STRUCT_SIZE {
            return Err(TextureError::malformed(
                FORMAT,
                format!("header size {} (expected {})", size, DDS_HEADER_STRUCT_SIZE),
            ));
        }

        let flags = buf.get_u32_le();
        let height = buf.get_u32_le();
        let width = buf.get_u32_le();
        let pitch_or_linear_size = buf.get_u32_le();
        let depth = buf.get_u32_le();
        let mip_map_count = buf.get_u32_le();
        buf.advance(11 * 4);

        let pf_size = buf.get_u32_le();
        if pf_size != DDS_PIXELFORMAT_SIZE {
            return Err(TextureError::malformed(
                FORMAT,
                format!("pixel format size {} (expected {})", pf_size, DDS_PIXELFORMAT_SIZE),
            ));
        }
        let pixel_format_flags = buf.get_u32_le();
        let mut fourcc = [0u8; 4];
        buf.copy_to_slice(&mut fourcc);
        let rgb_bit_count = buf.get_u32_le();
        let red_mask = buf.get_u32_le();
        let green_mask = buf.get_u32_le();
        let blue_mask = buf.get_u32_le();
        let alpha_mask = buf.get_u32_le();
        let caps1 = buf.get_u32_le();
        let caps2 = buf.get_u32_le();

        if width == 0 || height == 0 {
            return Err(TextureError::malformed(
                FORMAT,
                format!("zero dimension {}×{}", width, height),
            ));
        }

        Ok(Self {
            flags,
            height,
            width,
            pitch_or_linear_size,
            depth,
            mip_map_count,
            pixel_format_flags,
            fourcc: FourCc(fourcc),
            rgb_bit_count,
            red_mask,
            green_mask,
            blue_mask,
            alpha_mask,
            caps1,
            caps2,
        })
    }

    /// Number of stored mip levels (at least 1).
    pub fn mip_levels(&self) -> u32 {
        if self.flags & DDSD_MIPMAPCOUNT != 0 && self.mip_map_count > 0 {
            self.mip_map_count
        } else {
            1
        }
    }

    pub fn is_cubemap(&self) -> bool {
        self.caps2 & DDSCAPS2_CUBEMAP != 0
    }

    pub fn is_volume(&self) -> bool {
        self.caps2 & DDSCAPS2_VOLUME != 0
    }

    /// Slices stored for level `index` of a volume texture; 1 otherwise.
    pub fn slices(&self, index: u32) -> u32 {
        if self.is_volume() {
            (self.depth >> index.min(31)).max(1)
        } else {
            1
        }
    }

    /// Map the declared pixel format onto a supported layout.
    pub fn pixel_format(&self) -> Result<DdsPixelFormat, TextureError> {
        if self.pixel_format_flags & DDPF_FOURCC != 0 {
            return DdsCompression::from_fourcc(self.fourcc).map(DdsPixelFormat::Compressed);
        }
        if self.pixel_format_flags & DDPF_RGB != 0 {
            return match self.rgb_bit_count {
                24 => Ok(DdsPixelFormat::R8G8B8),
                32 if self.pixel_format_flags & DDPF_ALPHAPIXELS != 0 => {
                    Ok(DdsPixelFormat::A8R8G8B8)
                }
                32 => Ok(DdsPixelFormat::X8R8G8B8),
                bits => Err(TextureError::unsupported(
                    FORMAT,
                    format!("{}-bit RGB pixel format", bits),
                )),
            };
        }
        Err(TextureError::unsupported(
            FORMAT,
            format!("pixel format flags {:#x}", self.pixel_format_flags),
        ))
    }
}

/// One stored mip level.
#[derive(Debug, Clone)]
pub struct DdsLevel {
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
}

/// Where a level's first face or slice sits in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LevelSpan {
    width: u32,
    height: u32,
    offset: usize,
    size: usize,
}

/// A parsed DDS file.
#[derive(Debug, Clone)]
pub struct DdsImage {
    header: DdsHeader,
    pixel_format: DdsPixelFormat,
    spans: Vec<LevelSpan>,
    contents: Bytes,
}

impl DdsImage {
    /// Read a DDS file, memory-mapping it when `memory_map` is set.
    pub fn open(path: &Path, memory_map: bool) -> Result<Self, TextureError> {
        let mut file = File::open(path)?;
        let len = file.metadata()?.len();
        if len < HEADER_SIZE as u64 {
            return Err(TextureError::malformed(
                FORMAT,
                format!("file is {} bytes, shorter than the header", len),
            ));
        }

        let contents = if memory_map {
            // SAFETY: the mapping is read-only; the file must not be truncated
            // while texture data referencing it is alive.
            let map = unsafe { Mmap::map(&file)? };
            Bytes::from_owner(map)
        } else {
            let mut data = Vec::with_capacity(len as usize);
            file.read_to_end(&mut data)?;
            Bytes::from(data)
        };

        Self::from_bytes(contents)
    }

    /// Parse a complete DDS file held in memory.
    pub fn from_bytes(contents: Bytes) -> Result<Self, TextureError> {
        let header = DdsHeader::parse(&contents)?;
        let pixel_format = header.pixel_format()?;

        let levels = header.mip_levels();
        if levels > MAX_MIP_LEVELS {
            return Err(TextureError::malformed(
                FORMAT,
                format!("{} mip levels declared", levels),
            ));
        }

        let (spans, needed) = layout(&header, pixel_format)?;
        let available = contents.len() - HEADER_SIZE;
        if needed > available {
            return Err(TextureError::malformed(
                FORMAT,
                format!(
                    "mip chain needs {} bytes, file holds {} after the header",
                    needed, available
                ),
            ));
        }

        Ok(Self {
            header,
            pixel_format,
            spans,
            contents,
        })
    }

    pub fn header(&self) -> &DdsHeader {
        &self.header
    }

    pub fn width(&self) -> u32 {
        self.header.width
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    pub fn pixel_format(&self) -> DdsPixelFormat {
        self.pixel_format
    }

    pub fn is_compressed(&self) -> bool {
        self.pixel_format.is_compressed()
    }

    pub fn mip_levels(&self) -> u32 {
        self.header.mip_levels()
    }

    pub fn is_cubemap(&self) -> bool {
        self.header.is_cubemap()
    }

    pub fn is_volume(&self) -> bool {
        self.header.is_volume()
    }

    /// Level `index` of the first face or slice, or `None` past the end of
    /// the chain.
    pub fn level(&self, index: u32) -> Option<DdsLevel> {
        let span = self.spans.get(index as usize)?;
        Some(DdsLevel {
            width: span.width,
            height: span.height,
            data: self.contents.slice(span.offset..span.offset + span.size),
        })
    }

    /// All stored levels, largest first.
    pub fn levels(&self) -> Vec<DdsLevel> {
        (0..self.mip_levels()).filter_map(|i| self.level(i)).collect()
    }
}

/// Locate every level of the first face or slice.
///
/// Returns the spans and the number of bytes after the header they reach
/// into. Sizes that overflow `usize` are malformed.
fn layout(
    header: &DdsHeader,
    pixel_format: DdsPixelFormat,
) -> Result<(Vec<LevelSpan>, usize), TextureError> {
    let overflow = || {
        TextureError::malformed(
            FORMAT,
            format!("{}×{} mip chain size overflows", header.width, header.height),
        )
    };

    let levels = header.mip_levels();
    let mut spans = Vec::with_capacity(levels as usize);
    let mut offset = HEADER_SIZE;
    let (mut width, mut height) = (header.width, header.height);
    for index in 0..levels {
        let size = pixel_format.level_size(width, height).ok_or_else(overflow)?;
        spans.push(LevelSpan {
            width,
            height,
            offset,
            size,
        });
        let stride = size
            .checked_mul(header.slices(index) as usize)
            .ok_or_else(overflow)?;
        offset = offset.checked_add(stride).ok_or_else(overflow)?;
        width = (width / 2).max(1);
        height = (height / 2).max(1);
    }
    Ok((spans, offset - HEADER_SIZE))
}
