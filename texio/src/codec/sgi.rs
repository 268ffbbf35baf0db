//! SGI image (`.rgb`, `.sgi`) reader.
//!
//! The format stores each channel as a separate plane of scanlines, bottom
//! row first, optionally run-length encoded. The reader interleaves the
//! planes into one pixel buffer and keeps the bottom-up row order, which is
//! what GL expects.
//!
//! Header fields are big-endian:
//!
//! ```text
//! offset  size  field
//!      0     2  magic (474)
//!      2     1  storage (0 = verbatim, 1 = RLE)
//!      3     1  bytes per channel (1 or 2)
//!      4     2  dimension
//!      6     6  xsize, ysize, zsize
//!     12   500  pixmin, pixmax, name, colormap, padding
//! ```

use bytes::Buf;

use super::ensure_remaining;
use crate::error::TextureError;
use crate::gl;

const FORMAT: &str = "SGI";

pub const SGI_MAGIC: u16 = 474;
pub const HEADER_SIZE: usize = 512;

const STORAGE_VERBATIM: u8 = 0;
const STORAGE_RLE: u8 = 1;

/// Whether `bytes` starts with the SGI magic number.
pub fn is_sgi_image(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && u16::from_be_bytes([bytes[0], bytes[1]]) == SGI_MAGIC
}

/// Parsed SGI header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SgiHeader {
    pub storage: u8,
    pub bytes_per_channel: u8,
    pub dimension: u16,
    pub xsize: u16,
    pub ysize: u16,
    pub zsize: u16,
}

impl SgiHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, TextureError> {
        let mut buf = bytes;
        ensure_remaining(&buf, HEADER_SIZE, FORMAT, "header")?;

        let magic = buf.get_u16();
        if magic != SGI_MAGIC {
            return Err(TextureError::malformed(
                FORMAT,
                format!("bad magic {} (expected {})", magic, SGI_MAGIC),
            ));
        }

        let storage = buf.get_u8();
        let bytes_per_channel = buf.get_u8();
        let dimension = buf.get_u16();
        let xsize = buf.get_u16();
        let mut ysize = buf.get_u16();
        let mut zsize = buf.get_u16();

        // Lower-dimensional images leave the unused sizes undefined.
        match dimension {
            1 => {
                ysize = 1;
                zsize = 1;
            }
            2 => zsize = 1,
            3 => {}
            other => {
                return Err(TextureError::malformed(
                    FORMAT,
                    format!("dimension {}", other),
                ))
            }
        }

        if storage != STORAGE_VERBATIM && storage != STORAGE_RLE {
            return Err(TextureError::malformed(
                FORMAT,
                format!("storage type {}", storage),
            ));
        }
        if bytes_per_channel != 1 && bytes_per_channel != 2 {
            return Err(TextureError::unsupported(
                FORMAT,
                format!("{} bytes per channel", bytes_per_channel),
            ));
        }
        if !(1..=4).contains(&zsize) {
            return Err(TextureError::unsupported(
                FORMAT,
                format!("{} channels", zsize),
            ));
        }
        if xsize == 0 || ysize == 0 {
            return Err(TextureError::malformed(
                FORMAT,
                format!("zero dimension {}×{}", xsize, ysize),
            ));
        }

        Ok(Self {
            storage,
            bytes_per_channel,
            dimension,
            xsize,
            ysize,
            zsize,
        })
    }

    pub fn is_rle(&self) -> bool {
        self.storage == STORAGE_RLE
    }
}

/// A decoded SGI image with interleaved 8-bit channels.
#[derive(Debug, Clone)]
pub struct SgiImage {
    header: SgiHeader,
    data: Vec<u8>,
}

impl SgiImage {
    /// Decode a complete SGI file.
    pub fn read(bytes: &[u8]) -> Result<Self, TextureError> {
        let header = SgiHeader::parse(bytes)?;
        let planes = if header.is_rle() {
            read_rle_planes(&header, bytes)?
        } else {
            read_verbatim_planes(&header, bytes)?
        };

        let (width, height) = (header.xsize as usize, header.ysize as usize);
        let channels = header.zsize as usize;
        let mut data = vec![0u8; width * height * channels];
        for (z, plane) in planes.iter().enumerate() {
            for (i, value) in plane.iter().enumerate() {
                data[i * channels + z] = *value;
            }
        }

        Ok(Self { header, data })
    }

    pub fn header(&self) -> &SgiHeader {
        &self.header
    }

    pub fn width(&self) -> u32 {
        self.header.xsize as u32
    }

    pub fn height(&self) -> u32 {
        self.header.ysize as u32
    }

    pub fn channels(&self) -> u8 {
        self.header.zsize as u8
    }

    /// GL pixel format matching the channel count.
    pub fn gl_format(&self) -> u32 {
        match self.header.zsize {
            1 => gl::GL_LUMINANCE,
            2 => gl::GL_LUMINANCE_ALPHA,
            3 => gl::GL_RGB,
            _ => gl::GL_RGBA,
        }
    }

    /// Interleaved pixels, bottom row first.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Channel planes of `xsize * ysize` 8-bit values each.
fn read_verbatim_planes(header: &SgiHeader, bytes: &[u8]) -> Result<Vec<Vec<u8>>, TextureError> {
    let bpc = header.bytes_per_channel as usize;
    let plane_len = header.xsize as usize * header.ysize as usize;
    let mut buf = &bytes[HEADER_SIZE..];
    ensure_remaining(&buf, plane_len * bpc * header.zsize as usize, FORMAT, "pixel data")?;

    let mut planes = Vec::with_capacity(header.zsize as usize);
    for _ in 0..header.zsize {
        let mut plane = Vec::with_capacity(plane_len);
        for _ in 0..plane_len {
            plane.push(read_channel(&mut buf, bpc));
        }
        planes.push(plane);
    }
    Ok(planes)
}

fn read_rle_planes(header: &SgiHeader, bytes: &[u8]) -> Result<Vec<Vec<u8>>, TextureError> {
    let rows = header.ysize as usize * header.zsize as usize;
    let mut tables = &bytes[HEADER_SIZE..];
    ensure_remaining(&tables, rows * 8, FORMAT, "RLE offset tables")?;

    let starts: Vec<usize> = (0..rows).map(|_| tables.get_u32() as usize).collect();
    let lengths: Vec<usize> = (0..rows).map(|_| tables.get_u32() as usize).collect();

    let width = header.xsize as usize;
    let mut planes = Vec::with_capacity(header.zsize as usize);
    for z in 0..header.zsize as usize {
        let mut plane = Vec::with_capacity(width * header.ysize as usize);
        for y in 0..header.ysize as usize {
            let index = y + z * header.ysize as usize;
            let (start, len) = (starts[index], lengths[index]);
            let row = start
                .checked_add(len)
                .and_then(|end| bytes.get(start..end))
                .ok_or_else(|| {
                    TextureError::malformed(
                        FORMAT,
                        format!("RLE row {} of channel {} lies outside the file", y, z),
                    )
                })?;
            decode_rle_row(row, header.bytes_per_channel as usize, width, &mut plane)
                .map_err(|reason| {
                    TextureError::malformed(
                        FORMAT,
                        format!("row {} of channel {}: {}", y, z, reason),
                    )
                })?;
        }
        planes.push(plane);
    }
    Ok(planes)
}

/// Expand one RLE scanline of `width` values into `out`.
fn decode_rle_row(mut row: &[u8], bpc: usize, width: usize, out: &mut Vec<u8>) -> Result<(), String> {
    let mut produced = 0;
    loop {
        if row.remaining() < bpc {
            return Err("run header past end of row".to_string());
        }
        let control = read_control(&mut row, bpc);
        let count = (control & 0x7f) as usize;
        if count == 0 {
            break;
        }
        if produced + count > width {
            return Err(format!("run overflows the {}-pixel row", width));
        }

        if control & 0x80 != 0 {
            if row.remaining() < count * bpc {
                return Err("literal run past end of row".to_string());
            }
            for _ in 0..count {
                out.push(read_channel(&mut row, bpc));
            }
        } else {
            if row.remaining() < bpc {
                return Err("repeat value past end of row".to_string());
            }
            let value = read_channel(&mut row, bpc);
            out.extend(std::iter::repeat(value).take(count));
        }
        produced += count;
    }

    if produced != width {
        return Err(format!("row decoded to {} of {} pixels", produced, width));
    }
    Ok(())
}

/// Read one channel value; 16-bit channels keep their high byte.
fn read_channel(buf: &mut &[u8], bpc: usize) -> u8 {
    if bpc == 2 {
        (buf.get_u16() >> 8) as u8
    } else {
        buf.get_u8()
    }
}

fn read_control(buf: &mut &[u8], bpc: usize) -> u16 {
    if bpc == 2 {
        buf.get_u16()
    } else {
        buf.get_u8() as u16
    }
}
