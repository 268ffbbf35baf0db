//! Decoded texture descriptor and the GPU upload boundary.
//!
//! Every decoder produces the same [`TextureData`] value, regardless of the
//! file format it read. A renderer turns it into a GPU texture through the
//! [`TextureUploader`] trait.
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌──────────────────┐
//! │   Decoder    │ ──▶ │ TextureData │ ──▶ │ TextureUploader  │
//! │ (DDS/SGI/…)  │     │  + release  │     │ (renderer-owned) │
//! └──────────────┘     └─────────────┘     └──────────────────┘
//!                             ▲                      │
//!                             └──── release() ◀──────┘
//! ```
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use texio::gl;
//! use texio::texture::TextureData;
//!
//! let mut data = TextureData::new(1, 1, vec![Bytes::from_static(&[255, 0, 0, 255])])
//!     .unwrap()
//!     .with_formats(gl::GL_RGBA8, gl::GL_RGBA);
//!
//! assert_eq!(data.mipmap_levels(), 1);
//! data.release();
//! data.release(); // idempotent
//! ```

mod data;
mod release;
mod upload;

pub use data::TextureData;
pub use release::ReleaseHandle;
pub use upload::{upload_and_release, TextureUploader};

#[cfg(test)]
pub(crate) use upload::tests::RecordingUploader;
