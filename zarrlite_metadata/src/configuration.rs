use derive_more::{Deref, From, Into};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// A free-form JSON configuration, such as the parameters of a compressor.
#[derive(Default, Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Deref, From, Into)]
pub struct Configuration(serde_json::Map<String, serde_json::Value>);

/// A configuration could not be converted to or from a typed representation.
#[derive(Clone, Debug, Error)]
#[error("invalid configuration {configuration}: {reason}")]
pub struct ConfigurationError {
    configuration: String,
    reason: String,
}

impl ConfigurationError {
    fn new(configuration: String, reason: impl ToString) -> Self {
        Self {
            configuration,
            reason: reason.to_string(),
        }
    }
}

impl Configuration {
    /// Create a configuration from a serializable value.
    ///
    /// # Errors
    /// Returns a [`ConfigurationError`] if `value` does not serialize to a JSON object.
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, ConfigurationError> {
        match serde_json::to_value(value) {
            Ok(serde_json::Value::Object(map)) => Ok(Self(map)),
            Ok(value) => Err(ConfigurationError::new(
                value.to_string(),
                "not a JSON object",
            )),
            Err(err) => Err(ConfigurationError::new(String::new(), err)),
        }
    }

    /// Try and convert the configuration to a specific deserializable type.
    ///
    /// # Errors
    /// Returns a [`ConfigurationError`] if the configuration is not compatible with `T`.
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T, ConfigurationError> {
        serde_json::from_value(serde_json::Value::Object(self.0.clone()))
            .map_err(|err| ConfigurationError::new(self.to_string(), err))
    }
}

impl std::fmt::Display for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", serde_json::to_string(&self.0).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Level {
        level: u32,
    }

    #[test]
    fn configuration_typed() {
        let configuration = Configuration::from_serializable(&Level { level: 5 }).unwrap();
        assert_eq!(configuration.to_string(), r#"{"level":5}"#);
        assert_eq!(configuration.to_typed::<Level>().unwrap(), Level { level: 5 });
        assert!(Configuration::from_serializable(&5).is_err());
        assert!(Configuration::default().to_typed::<Level>().is_err());
    }
}
