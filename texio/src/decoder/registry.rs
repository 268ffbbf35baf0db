//! Ordered decoder list.

use std::sync::Arc;

use super::{DdsDecoder, ImageDecoder, SgiDecoder, TextureDecoder, TgaDecoder};
use crate::config::TextureIoConfig;

/// Decoders in dispatch order.
///
/// Registered decoders are tried most recent first. The fallback decoder, if
/// set, is always tried last, after every registered decoder.
#[derive(Clone, Default)]
pub struct DecoderRegistry {
    decoders: Vec<Arc<dyn TextureDecoder>>,
    fallback: Option<Arc<dyn TextureDecoder>>,
}

impl DecoderRegistry {
    /// An empty registry with no fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in decoders: TGA, SGI, DDS, then the `image` fallback.
    pub fn with_defaults(config: &TextureIoConfig) -> Self {
        let mut registry = Self::new();
        registry.set_fallback(Arc::new(ImageDecoder::new()));
        registry.register(Arc::new(DdsDecoder::from_config(config)));
        registry.register(Arc::new(SgiDecoder::new()));
        registry.register(Arc::new(TgaDecoder::new()));
        registry
    }

    /// Add a decoder ahead of every decoder registered so far.
    pub fn register(&mut self, decoder: Arc<dyn TextureDecoder>) {
        self.decoders.insert(0, decoder);
    }

    /// Replace the fallback decoder, returning the previous one.
    pub fn set_fallback(
        &mut self,
        decoder: Arc<dyn TextureDecoder>,
    ) -> Option<Arc<dyn TextureDecoder>> {
        self.fallback.replace(decoder)
    }

    pub fn fallback(&self) -> Option<&Arc<dyn TextureDecoder>> {
        self.fallback.as_ref()
    }

    /// Decoders in the order dispatch tries them.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn TextureDecoder>> + '_ {
        self.decoders.iter().chain(self.fallback.iter())
    }

    /// Decoder names in dispatch order.
    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|d| d.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.decoders.len() + usize::from(self.fallback.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("order", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{DecodeOutcome, DecodeRequest, DecodeResult};
    use crate::stream::TextureStream;
    use proptest::prelude::*;
    use std::path::Path;

    struct NamedDecoder(&'static str);

    impl TextureDecoder for NamedDecoder {
        fn name(&self) -> &'static str {
            self.0
        }

        fn decode_file(&self, _path: &Path, _request: &DecodeRequest) -> DecodeResult {
            Ok(DecodeOutcome::Rejected)
        }

        fn decode_stream(
            &self,
            _stream: &mut TextureStream<'_>,
            _request: &DecodeRequest,
        ) -> DecodeResult {
            Ok(DecodeOutcome::Rejected)
        }
    }

    const NAMES: [&str; 4] = ["a", "b", "c", "d"];

    #[test]
    fn test_default_order() {
        let registry = DecoderRegistry::with_defaults(&TextureIoConfig::default());
        assert_eq!(registry.names(), vec!["tga", "sgi", "dds", "image"]);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_register_goes_first() {
        let mut registry = DecoderRegistry::with_defaults(&TextureIoConfig::default());
        registry.register(Arc::new(NamedDecoder("custom")));
        assert_eq!(registry.names(), vec!["custom", "tga", "sgi", "dds", "image"]);
    }

    #[test]
    fn test_empty_registry() {
        let registry = DecoderRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.iter().count(), 0);
        assert!(registry.fallback().is_none());
    }

    #[test]
    fn test_set_fallback_replaces() {
        let mut registry = DecoderRegistry::new();
        assert!(registry.set_fallback(Arc::new(NamedDecoder("one"))).is_none());
        let previous = registry.set_fallback(Arc::new(NamedDecoder("two")));
        assert_eq!(previous.map(|d| d.name()), Some("one"));
        assert_eq!(registry.names(), vec!["two"]);
    }

    proptest! {
        #[test]
        fn prop_fallback_always_last(
            before in proptest::collection::vec(0usize..4, 0..6),
            after in proptest::collection::vec(0usize..4, 0..6),
        ) {
            let mut registry = DecoderRegistry::new();
            for i in &before {
                registry.register(Arc::new(NamedDecoder(NAMES[*i])));
            }
            registry.set_fallback(Arc::new(NamedDecoder("fallback")));
            for i in &after {
                registry.register(Arc::new(NamedDecoder(NAMES[*i])));
            }

            let names = registry.names();
            prop_assert_eq!(names.len(), before.len() + after.len() + 1);
            prop_assert_eq!(names.last().copied(), Some("fallback"));
            if let Some(last) = after.last() {
                prop_assert_eq!(names[0], NAMES[*last]);
            }
        }
    }
}
