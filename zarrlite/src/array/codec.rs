//! Compressors.
//!
//! A compressor encodes the bytes of a chunk before it is stored, and decodes them when the chunk is retrieved.
//! Compressors are identified in `.zarray` by the `id` of the `compressor` field, with parameters alongside it:
//! ```json
//! "compressor": {"id": "gzip", "level": 5}
//! ```
//! A `null` compressor stores the bytes of a chunk unchanged.
//!
//! Compressors implement [`CompressorTraits`] and are registered as a [`CompressorPlugin`] with [`inventory::submit!`].
//! [`compressor_from_metadata`] creates a compressor from metadata by matching its `id` against the registered plugins.
//!
//! The following compressors are included (behind their matching cargo feature):
//!  - [`gzip`](GzipCompressor) (feature `gzip`),
//!  - [`zlib`](ZlibCompressor) (feature `zlib`), and
//!  - [`zstd`](ZstdCompressor) (feature `zstd`).

#[cfg(feature = "gzip")]
mod gzip;
#[cfg(feature = "zlib")]
mod zlib;
#[cfg(feature = "zstd")]
mod zstd;

#[cfg(feature = "gzip")]
pub use gzip::{GzipCompressor, GzipCompressorConfiguration};
#[cfg(feature = "zlib")]
pub use zlib::{ZlibCompressor, ZlibCompressorConfiguration};
#[cfg(feature = "zstd")]
pub use zstd::{ZstdCompressor, ZstdCompressorConfiguration};

use std::sync::Arc;

use thiserror::Error;

use crate::{
    metadata::v2::MetadataV2,
    plugin::{Plugin, PluginCreateError, PluginUnsupportedError},
};

/// Traits for a compressor.
pub trait CompressorTraits: core::fmt::Debug + Send + Sync {
    /// Create the metadata of the compressor, as written to the `compressor` field of `.zarray`.
    fn create_metadata(&self) -> MetadataV2;

    /// Encode `decoded_value`.
    ///
    /// Encoding is deterministic.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the value cannot be encoded.
    fn encode(&self, decoded_value: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Decode `encoded_value` into `decoded_value`.
    ///
    /// The existing contents of `decoded_value` are replaced.
    ///
    /// # Errors
    /// Returns [`CodecError::DecodeError`] if `encoded_value` is malformed.
    fn decode(&self, encoded_value: &[u8], decoded_value: &mut Vec<u8>) -> Result<(), CodecError>;
}

/// A shared compressor.
pub type Compressor = Arc<dyn CompressorTraits>;

/// A compressor plugin.
pub type CompressorPlugin = Plugin<Compressor, MetadataV2>;
inventory::collect!(CompressorPlugin);

/// Create a compressor from metadata.
///
/// # Errors
/// Returns [`PluginCreateError`] if no registered compressor matches the `id`, or if the configuration is invalid.
pub fn compressor_from_metadata(metadata: &MetadataV2) -> Result<Compressor, PluginCreateError> {
    for plugin in inventory::iter::<CompressorPlugin> {
        if plugin.matches(metadata.id()) {
            return plugin.create(metadata);
        }
    }
    Err(PluginUnsupportedError::new(metadata.id().to_string(), "compressor").into())
}

/// A codec error.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// An encoded value could not be decoded.
    #[error("failed to decode: {_0}")]
    DecodeError(String),
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] Arc<std::io::Error>),
    /// Any other error.
    #[error("{_0}")]
    Other(String),
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(Arc::new(err))
    }
}

impl From<&str> for CodecError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for CodecError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}
