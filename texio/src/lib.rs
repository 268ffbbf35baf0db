//! Texio - pluggable texture decoding
//!
//! This library decodes texture files into GPU-upload-ready pixel buffers.
//! DDS, SGI and TGA have dedicated decoders; everything else goes through
//! the `image` crate. Decoders are tried in order until one recognizes the
//! input, and callers can register their own ahead of the built-ins.
//!
//! # Example
//!
//! ```no_run
//! use texio::{TextureIo, TextureIoConfig};
//!
//! let io = TextureIo::new(&TextureIoConfig::default())?;
//! if let Some(mut data) = io.decode_file("sprite.tga", false, Some("tga"))? {
//!     println!("{:?}", data);
//!     data.release();
//! }
//! # Ok::<(), texio::TextureError>(())
//! ```

pub mod codec;
pub mod config;
pub mod decoder;
pub mod error;
pub mod fetch;
pub mod gl;
pub mod io;
pub mod source;
pub mod stream;
pub mod texture;

pub use bytes::Bytes;
pub use config::TextureIoConfig;
pub use decoder::{DecodeOutcome, DecodeRequest, DecoderRegistry, TextureDecoder};
pub use error::TextureError;
pub use io::TextureIo;
pub use source::{suffix_of, suffix_of_path, TextureSource};
pub use texture::{upload_and_release, ReleaseHandle, TextureData, TextureUploader};
