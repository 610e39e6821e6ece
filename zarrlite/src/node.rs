//! Zarr nodes.
//!
//! A node is addressed by a [`NodePath`], such as `/` (the root) or `/group/array`.
//! The store keys of an array (metadata, attributes and chunks) are derived from its path.

use derive_more::Display;
use thiserror::Error;

use crate::storage::{StoreKey, StoreKeyError, StorePrefix, StorePrefixError};

/// A Zarr hierarchy node path.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct NodePath(String);

/// An invalid node path.
#[derive(Clone, Debug, Error)]
#[error("invalid node path {0}")]
pub struct NodePathError(String);

impl NodePath {
    /// Create a new Zarr node path from `path`.
    ///
    /// # Errors
    /// Returns [`NodePathError`] if `path` is not valid according to [`NodePath::validate`()].
    pub fn new(path: &str) -> Result<Self, NodePathError> {
        if Self::validate(path) {
            Ok(Self(path.to_string()))
        } else {
            Err(NodePathError(path.to_string()))
        }
    }

    /// The root node.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Extracts a string slice containing the node path `String`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates a path:
    /// - a path always starts with `/`,
    /// - a non-root path cannot end with `/`, and
    /// - a path cannot contain an empty node name (i.e. a `//` substring).
    #[must_use]
    pub fn validate(path: &str) -> bool {
        path.eq("/") || (path.starts_with('/') && !path.ends_with('/') && !path.contains("//"))
    }

    /// Returns the name of the node, the final component of its path.
    ///
    /// The name of the root node is an empty string.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Returns the store prefix of the node.
    ///
    /// # Errors
    /// Returns a [`StorePrefixError`] if the path does not map to a valid prefix.
    pub fn prefix(&self) -> Result<StorePrefix, StorePrefixError> {
        match self.0.strip_prefix('/') {
            Some("") | None => Ok(StorePrefix::root()),
            Some(path) => StorePrefix::new(path.to_string() + "/"),
        }
    }
}

impl TryFrom<&str> for NodePath {
    type Error = NodePathError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}

fn meta_key_any(path: &NodePath, name: &str) -> Result<StoreKey, StoreKeyError> {
    let prefix = path
        .prefix()
        .map_err(|err| StoreKeyError::from(err.to_string()))?;
    prefix.key(name)
}

/// Return the Zarr V2 array metadata key (`.zarray`) given a node path.
///
/// # Errors
/// Returns a [`StoreKeyError`] if the key is invalid.
pub fn meta_key_v2_array(path: &NodePath) -> Result<StoreKey, StoreKeyError> {
    meta_key_any(path, ".zarray")
}

/// Return the Zarr V2 user-defined attributes key (`.zattrs`) given a node path.
///
/// # Errors
/// Returns a [`StoreKeyError`] if the key is invalid.
pub fn meta_key_v2_attributes(path: &NodePath) -> Result<StoreKey, StoreKeyError> {
    meta_key_any(path, ".zattrs")
}

/// Return the data key given a node path and an encoded chunk key, such as `0.1`.
///
/// # Errors
/// Returns a [`StoreKeyError`] if the key is invalid.
pub fn data_key(path: &NodePath, chunk_key: &str) -> Result<StoreKey, StoreKeyError> {
    meta_key_any(path, chunk_key)
}
