//! Binary format readers.
//!
//! Each reader turns the bytes of one container format into pixel data and
//! metadata, with no knowledge of dispatch or GPU formats beyond what the
//! format itself declares. The decoders in [`crate::decoder`] wrap them.

pub mod dds;
pub mod sgi;
pub mod tga;

use bytes::Buf;

use crate::error::TextureError;

/// Fail with a `Malformed` error unless `buf` holds at least `len` bytes.
pub(crate) fn ensure_remaining(
    buf: &impl Buf,
    len: usize,
    format: &'static str,
    what: &str,
) -> Result<(), TextureError> {
    if buf.remaining() < len {
        return Err(TextureError::malformed(
            format,
            format!(
                "{} truncated: need {} bytes, {} available",
                what,
                len,
                buf.remaining()
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_remaining() {
        let buf: &[u8] = &[1, 2, 3];
        assert!(ensure_remaining(&buf, 3, "TGA", "header").is_ok());

        let err = ensure_remaining(&buf, 4, "TGA", "header").unwrap_err();
        assert!(err.is_decode_error());
        assert!(err.to_string().contains("header truncated"));
    }
}
