//! [Zarr](https://zarr-specs.readthedocs.io/) V2 metadata support for the [`zarrlite`](https://docs.rs/zarrlite/latest/zarrlite/index.html) crate.
//!
//! This crate holds the serialisable models of the `.zarray` document and the compressor descriptor embedded in it.
//! Interpretation of the metadata (data types, fill values, codecs) is performed by `zarrlite`.
//!
//! ## Licence
//! `zarrlite_metadata` is licensed under either of
//! - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//! - the MIT license <http://opensource.org/licenses/MIT>, at your option.

mod configuration;
pub mod v2;

pub use configuration::{Configuration, ConfigurationError};

/// The shape of an array: the length of each dimension.
pub type ArrayShape = Vec<u64>;

/// The shape of a chunk: the length of each dimension.
pub type ChunkShape = Vec<u64>;

/// User defined attributes, stored in `.zattrs`.
pub type Attributes = serde_json::Map<String, serde_json::Value>;
