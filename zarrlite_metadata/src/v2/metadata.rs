use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{Configuration, ConfigurationError};

/// Zarr V2 generic metadata with an `id` and optional flattened `configuration`.
///
/// For example:
/// ```json
/// {
///     "id": "zstd",
///     "level": 5,
///     "checksum": false
/// }
/// ```
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
pub struct MetadataV2 {
    id: String,
    #[serde(flatten)]
    configuration: Configuration,
}

impl MetadataV2 {
    /// Create metadata from an `id` and `configuration`.
    #[must_use]
    pub fn new(id: impl Into<String>, configuration: Configuration) -> Self {
        Self {
            id: id.into(),
            configuration,
        }
    }

    /// Create metadata from an `id` and a serializable configuration.
    ///
    /// # Errors
    /// Returns a [`ConfigurationError`] if `configuration` does not serialize to a JSON object.
    pub fn new_with_serializable_configuration<TConfiguration: Serialize>(
        id: impl Into<String>,
        configuration: &TConfiguration,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self::new(
            id,
            Configuration::from_serializable(configuration)?,
        ))
    }

    /// Return the value of the `id` field.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Return the configuration, which includes all fields excluding the `id`.
    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Try and convert [`Configuration`] to a specific serializable configuration.
    ///
    /// # Errors
    /// Returns a [`ConfigurationError`] if the metadata cannot be converted.
    pub fn to_typed_configuration<TConfiguration: DeserializeOwned>(
        &self,
    ) -> Result<TConfiguration, ConfigurationError> {
        self.configuration.to_typed()
    }
}

impl std::fmt::Display for MetadataV2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", serde_json::to_string(self).unwrap_or_default())
    }
}
