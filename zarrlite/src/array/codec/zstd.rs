//! The `zstd` compressor.
//!
//! Applies [Zstandard](https://datatracker.ietf.org/doc/html/rfc8878) compression, optionally with a content checksum.
//!
//! ### Configuration Example - [`ZstdCompressorConfiguration`]:
//! ```json
//! {
//!     "id": "zstd",
//!     "level": 5,
//!     "checksum": false
//! }
//! ```

use std::{io::Write, sync::Arc};

use serde::{Deserialize, Serialize};

use super::{CodecError, Compressor, CompressorPlugin, CompressorTraits};
use crate::{
    metadata::v2::MetadataV2,
    plugin::{PluginConfigurationInvalidError, PluginCreateError},
};

const IDENTIFIER: &str = "zstd";

// Register the compressor.
inventory::submit! {
    CompressorPlugin::new(IDENTIFIER, create_compressor_zstd)
}

fn create_compressor_zstd(metadata: &MetadataV2) -> Result<Compressor, PluginCreateError> {
    let configuration: ZstdCompressorConfiguration = metadata
        .to_typed_configuration()
        .map_err(|err| PluginConfigurationInvalidError::new(err.to_string()))?;
    Ok(Arc::new(ZstdCompressor::new(
        configuration.level,
        configuration.checksum,
    )?))
}

/// Configuration parameters for the `zstd` compressor.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Debug)]
pub struct ZstdCompressorConfiguration {
    /// The compression level. An integer from -131072 to 22.
    ///
    /// A value of 0 indicates to use the default compression level.
    pub level: i32,
    /// Whether to store a checksum when writing that is verified when reading.
    #[serde(default)]
    pub checksum: bool,
}

/// A `zstd` compressor implementation.
#[derive(Clone, Debug)]
pub struct ZstdCompressor {
    compression_level: i32,
    checksum: bool,
}

impl ZstdCompressor {
    /// Create a new `zstd` compressor.
    ///
    /// # Errors
    /// Returns [`PluginConfigurationInvalidError`] if `compression_level` is not between -131072 and 22.
    pub fn new(compression_level: i32, checksum: bool) -> Result<Self, PluginConfigurationInvalidError> {
        if !(-131_072..=22).contains(&compression_level) {
            return Err(PluginConfigurationInvalidError::new(format!(
                "zstd compression level {compression_level} must be between -131072 and 22"
            )));
        }
        Ok(Self {
            compression_level,
            checksum,
        })
    }
}

impl CompressorTraits for ZstdCompressor {
    fn create_metadata(&self) -> MetadataV2 {
        let configuration = serde_json::Map::from_iter([
            ("level".to_string(), self.compression_level.into()),
            ("checksum".to_string(), self.checksum.into()),
        ]);
        MetadataV2::new(IDENTIFIER, configuration.into())
    }

    fn encode(&self, decoded_value: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut encoder = ::zstd::Encoder::new(Vec::new(), self.compression_level)?;
        encoder.include_checksum(self.checksum)?;
        encoder.write_all(decoded_value)?;
        Ok(encoder.finish()?)
    }

    fn decode(&self, encoded_value: &[u8], decoded_value: &mut Vec<u8>) -> Result<(), CodecError> {
        decoded_value.clear();
        ::zstd::stream::copy_decode(encoded_value, &mut *decoded_value)
            .map_err(|err| CodecError::DecodeError(err.to_string()))
    }
}
