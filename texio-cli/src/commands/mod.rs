//! CLI command implementations.

pub mod common;
pub mod decoders;
pub mod inspect;
pub mod suffix;
