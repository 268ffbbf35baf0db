//! Truevision Targa (`.tga`) reader.
//!
//! Targa files have no signature, so this reader is only ever handed data
//! the caller already labelled as TGA. Anything that does not parse is a
//! decode error.
//!
//! Supported image types: colour-mapped (1), true-colour (2) and grayscale
//! (3), plus their run-length encoded variants (9, 10, 11). True-colour data
//! keeps the file's BGR(A) byte order. Rows are normalized to bottom-up,
//! left-to-right order regardless of the file's declared origin.

use bytes::Buf;

use super::ensure_remaining;
use crate::error::TextureError;
use crate::gl;

const FORMAT: &str = "TGA";

pub const HEADER_SIZE: usize = 18;

const TYPE_COLOR_MAPPED: u8 = 1;
const TYPE_TRUE_COLOR: u8 = 2;
const TYPE_GRAYSCALE: u8 = 3;
const TYPE_RLE_COLOR_MAPPED: u8 = 9;
const TYPE_RLE_TRUE_COLOR: u8 = 10;
const TYPE_RLE_GRAYSCALE: u8 = 11;

const DESCRIPTOR_RIGHT_TO_LEFT: u8 = 0x10;
const DESCRIPTOR_TOP_TO_BOTTOM: u8 = 0x20;

/// The fixed 18-byte TGA header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TgaHeader {
    pub id_length: u8,
    pub color_map_type: u8,
    pub image_type: u8,
    pub color_map_first: u16,
    pub color_map_length: u16,
    pub color_map_entry_size: u8,
    pub x_origin: u16,
    pub y_origin: u16,
    pub width: u16,
    pub height: u16,
    pub pixel_depth: u8,
    pub descriptor: u8,
}

impl TgaHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, TextureError> {
        let mut buf = bytes;
        ensure_remaining(&buf, HEADER_SIZE, FORMAT, "header")?;

        let header = Self {
            id_length: buf.get_u8(),
            color_map_type: buf.get_u8(),
            image_type: buf.get_u8(),
            color_map_first: buf.get_u16_le(),
            color_map_length: buf.get_u16_le(),
            color_map_entry_size: buf.get_u8(),
            x_origin: buf.get_u16_le(),
            y_origin: buf.get_u16_le(),
            width: buf.get_u16_le(),
            height: buf.get_u16_le(),
            pixel_depth: buf.get_u8(),
            descriptor: buf.get_u8(),
        };

        if header.color_map_type > 1 {
            return Err(TextureError::malformed(
                FORMAT,
                format!("colour map type {}", header.color_map_type),
            ));
        }
        if header.width == 0 || header.height == 0 {
            return Err(TextureError::malformed(
                FORMAT,
                format!("zero dimension {}×{}", header.width, header.height),
            ));
        }

        Ok(header)
    }

    pub fn is_rle(&self) -> bool {
        matches!(
            self.image_type,
            TYPE_RLE_COLOR_MAPPED | TYPE_RLE_TRUE_COLOR | TYPE_RLE_GRAYSCALE
        )
    }

    fn is_color_mapped(&self) -> bool {
        matches!(self.image_type, TYPE_COLOR_MAPPED | TYPE_RLE_COLOR_MAPPED)
    }

    /// Bytes per stored pixel (index or colour).
    fn stored_pixel_size(&self) -> usize {
        (self.pixel_depth as usize).div_ceil(8)
    }

    fn color_map_entry_bytes(&self) -> usize {
        (self.color_map_entry_size as usize).div_ceil(8)
    }

    /// Channels of the decoded output.
    fn output_channels(&self) -> Result<u8, TextureError> {
        let channels = match (self.image_type, self.pixel_depth) {
            (TYPE_TRUE_COLOR | TYPE_RLE_TRUE_COLOR, 24) => 3,
            (TYPE_TRUE_COLOR | TYPE_RLE_TRUE_COLOR, 32) => 4,
            (TYPE_GRAYSCALE | TYPE_RLE_GRAYSCALE, 8) => 1,
            (TYPE_GRAYSCALE | TYPE_RLE_GRAYSCALE, 16) => 2,
            (TYPE_COLOR_MAPPED | TYPE_RLE_COLOR_MAPPED, 8 | 16) => {
                if self.color_map_type != 1 {
                    return Err(TextureError::malformed(
                        FORMAT,
                        "colour-mapped image without a colour map",
                    ));
                }
                match self.color_map_entry_size {
                    24 => 3,
                    32 => 4,
                    bits => {
                        return Err(TextureError::unsupported(
                            FORMAT,
                            format!("{}-bit colour map entries", bits),
                        ))
                    }
                }
            }
            (TYPE_TRUE_COLOR | TYPE_RLE_TRUE_COLOR, bits)
            | (TYPE_GRAYSCALE | TYPE_RLE_GRAYSCALE, bits)
            | (TYPE_COLOR_MAPPED | TYPE_RLE_COLOR_MAPPED, bits) => {
                return Err(TextureError::unsupported(
                    FORMAT,
                    format!("{}-bit pixels for image type {}", bits, self.image_type),
                ))
            }
            (image_type, _) => {
                return Err(TextureError::malformed(
                    FORMAT,
                    format!("image type {}", image_type),
                ))
            }
        };
        Ok(channels)
    }
}

/// A decoded Targa image.
#[derive(Debug, Clone)]
pub struct TgaImage {
    header: TgaHeader,
    channels: u8,
    data: Vec<u8>,
}

impl TgaImage {
    /// Decode a complete TGA file.
    pub fn read(bytes: &[u8]) -> Result<Self, TextureError> {
        let header = TgaHeader::parse(bytes)?;
        let channels = header.output_channels()?;

        let mut buf = &bytes[HEADER_SIZE..];
        ensure_remaining(&buf, header.id_length as usize, FORMAT, "image ID")?;
        buf.advance(header.id_length as usize);

        let map_len = if header.color_map_type == 1 {
            header.color_map_length as usize * header.color_map_entry_bytes()
        } else {
            0
        };
        ensure_remaining(&buf, map_len, FORMAT, "colour map")?;
        let (color_map, rest) = buf.split_at(map_len);
        buf = rest;

        let pixel_count = header.width as usize * header.height as usize;
        let stored = if header.is_rle() {
            decode_rle(&mut buf, header.stored_pixel_size(), pixel_count)?
        } else {
            let len = pixel_count * header.stored_pixel_size();
            ensure_remaining(&buf, len, FORMAT, "pixel data")?;
            buf[..len].to_vec()
        };

        let pixels = if header.is_color_mapped() {
            apply_color_map(&header, color_map, &stored)?
        } else {
            stored
        };

        let data = normalize_orientation(&header, channels as usize, pixels);
        Ok(Self {
            header,
            channels,
            data,
        })
    }

    pub fn header(&self) -> &TgaHeader {
        &self.header
    }

    pub fn width(&self) -> u32 {
        self.header.width as u32
    }

    pub fn height(&self) -> u32 {
        self.header.height as u32
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// GL pixel format describing [`data`](TgaImage::data).
    pub fn gl_format(&self) -> u32 {
        match self.channels {
            1 => gl::GL_LUMINANCE,
            2 => gl::GL_LUMINANCE_ALPHA,
            3 => gl::GL_BGR,
            _ => gl::GL_BGRA,
        }
    }

    /// Pixels, bottom row first, left to right.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Expand RLE packets into `pixel_count` stored pixels of `pixel_size` bytes.
fn decode_rle(buf: &mut &[u8], pixel_size: usize, pixel_count: usize) -> Result<Vec<u8>, TextureError> {
    let mut out = Vec::with_capacity(pixel_count * pixel_size);
    let mut produced = 0;
    while produced < pixel_count {
        ensure_remaining(&*buf, 1, FORMAT, "RLE packet")?;
        let packet = buf.get_u8();
        let count = (packet & 0x7f) as usize + 1;
        if produced + count > pixel_count {
            return Err(TextureError::malformed(
                FORMAT,
                format!(
                    "RLE packet of {} pixels overruns the image ({} of {} done)",
                    count, produced, pixel_count
                ),
            ));
        }

        if packet & 0x80 != 0 {
            ensure_remaining(&*buf, pixel_size, FORMAT, "RLE pixel")?;
            let pixel = &buf[..pixel_size];
            for _ in 0..count {
                out.extend_from_slice(pixel);
            }
            buf.advance(pixel_size);
        } else {
            let len = count * pixel_size;
            ensure_remaining(&*buf, len, FORMAT, "RLE raw packet")?;
            out.extend_from_slice(&buf[..len]);
            buf.advance(len);
        }
        produced += count;
    }
    Ok(out)
}

fn apply_color_map(header: &TgaHeader, color_map: &[u8], indices: &[u8]) -> Result<Vec<u8>, TextureError> {
    let entry = header.color_map_entry_bytes();
    let index_size = header.stored_pixel_size();
    let mut out = Vec::with_capacity(indices.len() / index_size * entry);

    for raw in indices.chunks_exact(index_size) {
        let index = if index_size == 2 {
            u16::from_le_bytes([raw[0], raw[1]])
        } else {
            raw[0] as u16
        };
        let slot = index
            .checked_sub(header.color_map_first)
            .map(usize::from)
            .filter(|slot| *slot < header.color_map_length as usize)
            .ok_or_else(|| {
                TextureError::malformed(FORMAT, format!("colour index {} outside the map", index))
            })?;
        out.extend_from_slice(&color_map[slot * entry..(slot + 1) * entry]);
    }
    Ok(out)
}

/// Reorder rows bottom-up and columns left-to-right.
fn normalize_orientation(header: &TgaHeader, channels: usize, pixels: Vec<u8>) -> Vec<u8> {
    let top_down = header.descriptor & DESCRIPTOR_TOP_TO_BOTTOM != 0;
    let right_to_left = header.descriptor & DESCRIPTOR_RIGHT_TO_LEFT != 0;
    if !top_down && !right_to_left {
        return pixels;
    }

    let row_len = header.width as usize * channels;
    let mut rows: Vec<&[u8]> = pixels.chunks_exact(row_len).collect();
    if top_down {
        rows.reverse();
    }

    let mut out = Vec::with_capacity(pixels.len());
    for row in rows {
        if right_to_left {
            for pixel in row.chunks_exact(channels).rev() {
                out.extend_from_slice(pixel);
            }
        } else {
            out.extend_from_slice(row);
        }
    }
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use bytes::BufMut;

    /// Header for an image without a colour map.
    pub fn tga_header(image_type: u8, width: u16, height: u16, depth: u8, descriptor: u8) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE);
        out.put_u8(0);
        out.put_u8(0);
        out.put_u8(image_type);
        out.put_bytes(0, 5);
        out.put_u16_le(0);
        out.put_u16_le(0);
        out.put_u16_le(width);
        out.put_u16_le(height);
        out.put_u8(depth);
        out.put_u8(descriptor);
        out
    }

    /// Uncompressed 32-bit TGA, bottom-left origin.
    pub fn build_bgra(width: u16, height: u16, pixels: &[u8]) -> Vec<u8> {
        let mut out = tga_header(TYPE_TRUE_COLOR, width, height, 32, 8);
        out.extend_from_slice(pixels);
        out
    }

    #[test]
    fn test_uncompressed_bgr() {
        let mut file = tga_header(TYPE_TRUE_COLOR, 2, 1, 24, 0);
        file.extend_from_slice(&[1, 2, 3, 4, 5, 6]);

        let image = TgaImage::read(&file).unwrap();
        assert_eq!(image.channels(), 3);
        assert_eq!(image.gl_format(), gl::GL_BGR);
        assert_eq!(image.data(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_top_down_rows_are_flipped() {
        let mut file = tga_header(TYPE_GRAYSCALE, 2, 2, 8, DESCRIPTOR_TOP_TO_BOTTOM);
        file.extend_from_slice(&[1, 2, 3, 4]);

        let image = TgaImage::read(&file).unwrap();
        assert_eq!(image.gl_format(), gl::GL_LUMINANCE);
        assert_eq!(image.data(), &[3, 4, 1, 2]);
    }

    #[test]
    fn test_right_to_left_columns_are_flipped() {
        let mut file = tga_header(TYPE_GRAYSCALE, 3, 1, 8, DESCRIPTOR_RIGHT_TO_LEFT);
        file.extend_from_slice(&[1, 2, 3]);

        let image = TgaImage::read(&file).unwrap();
        assert_eq!(image.data(), &[3, 2, 1]);
    }

    #[test]
    fn test_rle_true_color() {
        let mut file = tga_header(TYPE_RLE_TRUE_COLOR, 4, 1, 32, 8);
        // Run of 3 identical pixels, then 1 raw pixel.
        file.extend_from_slice(&[0x82, 10, 20, 30, 255, 0x00, 1, 2, 3, 4]);

        let image = TgaImage::read(&file).unwrap();
        assert_eq!(image.gl_format(), gl::GL_BGRA);
        assert_eq!(
            image.data(),
            &[10, 20, 30, 255, 10, 20, 30, 255, 10, 20, 30, 255, 1, 2, 3, 4]
        );
    }

    #[test]
    fn test_rle_overrun_is_malformed() {
        let mut file = tga_header(TYPE_RLE_GRAYSCALE, 2, 1, 8, 0);
        file.extend_from_slice(&[0x84, 9]);

        let err = TgaImage::read(&file).unwrap_err();
        assert!(matches!(err, TextureError::Malformed { .. }));
    }

    #[test]
    fn test_color_mapped() {
        let mut file = Vec::new();
        file.put_u8(0);
        file.put_u8(1);
        file.put_u8(TYPE_COLOR_MAPPED);
        file.put_u16_le(0);
        file.put_u16_le(2);
        file.put_u8(24);
        file.put_u16_le(0);
        file.put_u16_le(0);
        file.put_u16_le(3);
        file.put_u16_le(1);
        file.put_u8(8);
        file.put_u8(0);
        file.extend_from_slice(&[0, 0, 255, 255, 0, 0]);
        file.extend_from_slice(&[1, 0, 1]);

        let image = TgaImage::read(&file).unwrap();
        assert_eq!(image.gl_format(), gl::GL_BGR);
        assert_eq!(image.data(), &[255, 0, 0, 0, 0, 255, 255, 0, 0]);
    }

    #[test]
    fn test_color_index_out_of_range() {
        let mut file = Vec::new();
        file.put_u8(0);
        file.put_u8(1);
        file.put_u8(TYPE_COLOR_MAPPED);
        file.put_u16_le(0);
        file.put_u16_le(1);
        file.put_u8(32);
        file.put_bytes(0, 4);
        file.put_u16_le(1);
        file.put_u16_le(1);
        file.put_u8(8);
        file.put_u8(0);
        file.extend_from_slice(&[0, 0, 0, 0]);
        file.push(5);

        let err = TgaImage::read(&file).unwrap_err();
        assert!(err.to_string().contains("outside the map"));
    }

    #[test]
    fn test_not_tga_is_decode_error() {
        let err = TgaImage::read(b"this is plainly not a targa file").unwrap_err();
        assert!(err.is_decode_error());
    }

    #[test]
    fn test_truncated_pixels() {
        let file = build_bgra(2, 2, &[0; 15]);
        let err = TgaImage::read(&file).unwrap_err();
        assert!(err.to_string().contains("pixel data truncated"));
    }

    #[test]
    fn test_sixteen_bit_true_color_unsupported() {
        let file = tga_header(TYPE_TRUE_COLOR, 1, 1, 16, 0);
        let err = TgaImage::read(&file).unwrap_err();
        assert!(matches!(err, TextureError::Unsupported { .. }));
    }
}
