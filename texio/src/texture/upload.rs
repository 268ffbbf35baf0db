//! GPU upload boundary.
//!
//! Uploading needs a live GPU context, which this crate does not own. The
//! [`TextureUploader`] trait is the seam: a renderer implements it, and
//! [`upload_and_release`] guarantees the descriptor is released whatever the
//! upload outcome.

use super::TextureData;
use crate::error::TextureError;
use crate::gl;

/// Creates a GPU texture object from decoded data.
pub trait TextureUploader {
    /// Handle to the created GPU texture.
    type Texture;

    /// Upload `data` to the current GPU context.
    ///
    /// Implementations must not release `data`; the caller does.
    fn upload(&mut self, data: &TextureData) -> Result<Self::Texture, TextureError>;
}

/// Upload `data` and release it afterwards, on success and failure alike.
///
/// # Errors
///
/// Returns `InvalidArgument` without calling the uploader if the descriptor
/// was already released or still carries an unspecified (zero) format.
/// Otherwise returns whatever the uploader returns.
pub fn upload_and_release<U>(uploader: &mut U, mut data: TextureData) -> Result<U::Texture, TextureError>
where
    U: TextureUploader + ?Sized,
{
    let result = check_uploadable(&data).and_then(|()| uploader.upload(&data));
    data.release();
    result
}

fn check_uploadable(data: &TextureData) -> Result<(), TextureError> {
    if data.is_released() {
        return Err(TextureError::InvalidArgument(
            "texture data was already released".to_string(),
        ));
    }
    if data.internal_format() == gl::UNSPECIFIED || data.pixel_format() == gl::UNSPECIFIED {
        return Err(TextureError::InvalidArgument(
            "texture data has an unspecified internal or pixel format".to_string(),
        ));
    }
    Ok(())
}
