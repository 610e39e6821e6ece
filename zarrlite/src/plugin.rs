//! Compile time plugins.
//!
//! A [`Plugin`] builds an implementation of an extension point (such as a compressor) from its metadata.
//! Plugins are registered with [`inventory::submit!`], collected with [`inventory::iter`], and selected by identifier.

use thiserror::Error;

/// A plugin creating a `TPlugin` from a `TInput`.
pub struct Plugin<TPlugin, TInput> {
    identifier: &'static str,
    create_fn: fn(input: &TInput) -> Result<TPlugin, PluginCreateError>,
}

impl<TPlugin, TInput> Plugin<TPlugin, TInput> {
    /// Create a new plugin with `identifier` (e.g. `gzip`) for registration.
    pub const fn new(
        identifier: &'static str,
        create_fn: fn(input: &TInput) -> Result<TPlugin, PluginCreateError>,
    ) -> Self {
        Self {
            identifier,
            create_fn,
        }
    }

    /// Returns the identifier of the plugin.
    #[must_use]
    pub const fn identifier(&self) -> &'static str {
        self.identifier
    }

    /// Returns true if `identifier` selects this plugin.
    #[must_use]
    pub fn matches(&self, identifier: &str) -> bool {
        self.identifier == identifier
    }

    /// Create a `TPlugin` from `input`.
    ///
    /// # Errors
    /// Returns a [`PluginCreateError`] if `input` is not a valid configuration of the plugin.
    pub fn create(&self, input: &TInput) -> Result<TPlugin, PluginCreateError> {
        (self.create_fn)(input)
    }
}

/// No plugin is registered for an identifier.
#[derive(Clone, Debug, Error)]
#[error("{kind} {identifier} is not supported")]
pub struct PluginUnsupportedError {
    identifier: String,
    kind: &'static str,
}

impl PluginUnsupportedError {
    /// Create a new [`PluginUnsupportedError`] for a `kind` of plugin, such as `compressor`.
    #[must_use]
    pub fn new(identifier: String, kind: &'static str) -> Self {
        Self { identifier, kind }
    }

    /// Returns the unsupported identifier.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// The configuration of a plugin is invalid.
#[derive(Clone, Debug, Error)]
#[error("invalid configuration: {_0}")]
pub struct PluginConfigurationInvalidError(String);

impl PluginConfigurationInvalidError {
    /// Create a new [`PluginConfigurationInvalidError`] with a `reason`.
    #[must_use]
    pub fn new(reason: String) -> Self {
        Self(reason)
    }
}

/// A plugin creation error.
#[derive(Clone, Debug, Error)]
pub enum PluginCreateError {
    /// No plugin matched.
    #[error(transparent)]
    Unsupported(#[from] PluginUnsupportedError),
    /// The configuration is invalid.
    #[error(transparent)]
    ConfigurationInvalid(#[from] PluginConfigurationInvalidError),
}
