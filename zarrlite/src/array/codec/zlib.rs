//! The `zlib` compressor.
//!
//! Applies [zlib](https://datatracker.ietf.org/doc/html/rfc1950) compression.
//!
//! ### Configuration Example - [`ZlibCompressorConfiguration`]:
//! ```json
//! {
//!     "id": "zlib",
//!     "level": 1
//! }
//! ```

use std::{
    io::{Cursor, Read},
    sync::Arc,
};

use flate2::bufread::{ZlibDecoder, ZlibEncoder};
use serde::{Deserialize, Serialize};

use super::{CodecError, Compressor, CompressorPlugin, CompressorTraits};
use crate::{
    metadata::v2::MetadataV2,
    plugin::{PluginConfigurationInvalidError, PluginCreateError},
};

const IDENTIFIER: &str = "zlib";

// Register the compressor.
inventory::submit! {
    CompressorPlugin::new(IDENTIFIER, create_compressor_zlib)
}

fn create_compressor_zlib(metadata: &MetadataV2) -> Result<Compressor, PluginCreateError> {
    let configuration: ZlibCompressorConfiguration = metadata
        .to_typed_configuration()
        .map_err(|err| PluginConfigurationInvalidError::new(err.to_string()))?;
    Ok(Arc::new(ZlibCompressor::new(configuration.level)?))
}

/// Configuration parameters for the `zlib` compressor.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Debug)]
pub struct ZlibCompressorConfiguration {
    /// The compression level, an integer from 0 to 9.
    pub level: u32,
}

/// A `zlib` compressor implementation.
#[derive(Clone, Debug)]
pub struct ZlibCompressor {
    compression_level: u32,
}

impl ZlibCompressor {
    /// Create a new `zlib` compressor.
    ///
    /// # Errors
    /// Returns [`PluginConfigurationInvalidError`] if `compression_level` is not between 0 and 9.
    pub fn new(compression_level: u32) -> Result<Self, PluginConfigurationInvalidError> {
        if compression_level > 9 {
            return Err(PluginConfigurationInvalidError::new(format!(
                "zlib compression level {compression_level} must be between 0 and 9"
            )));
        }
        Ok(Self { compression_level })
    }
}

impl CompressorTraits for ZlibCompressor {
    fn create_metadata(&self) -> MetadataV2 {
        let configuration =
            serde_json::Map::from_iter([("level".to_string(), self.compression_level.into())]);
        MetadataV2::new(IDENTIFIER, configuration.into())
    }

    fn encode(&self, decoded_value: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut encoder = ZlibEncoder::new(
            Cursor::new(decoded_value),
            flate2::Compression::new(self.compression_level),
        );
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(out)
    }

    fn decode(&self, encoded_value: &[u8], decoded_value: &mut Vec<u8>) -> Result<(), CodecError> {
        decoded_value.clear();
        let mut decoder = ZlibDecoder::new(Cursor::new(encoded_value));
        decoder
            .read_to_end(decoded_value)
            .map_err(|err| CodecError::DecodeError(err.to_string()))?;
        Ok(())
    }
}
