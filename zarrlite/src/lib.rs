//! `zarrlite` is a Rust library for chunked, compressed N-dimensional arrays in the [Zarr V2](https://zarr-specs.readthedocs.io/en/latest/v2/v2.0.html) storage format.
//!
//! An array is partitioned into fixed-size rectangular chunks.
//! Each chunk is independently compressed and stored as an addressable value in a store (a file, an in-memory slot, ...).
//! Arbitrary rectangular regions of an array can be read and written without materialising the whole array in memory.
//!
//! ## Getting Started
//! - Create a new array with an [`ArrayBuilder`](crate::array::ArrayBuilder), or open an existing array with [`Array::open`](crate::array::Array::open).
//! - Read and write regions with [`ArraySubset`](crate::array_subset::ArraySubset)s or with the [`Index`](crate::indexer::Index) based API.
//!
//! ### Data Types
//! `|b1`, `|i1`, `<i2`, `<i4`, `<i8`, `|u1`, `<u2`, `<u4`, `<u8`, `<f2`, `<f4`, `<f8` and fixed-length unicode strings `<U{n}`.
//! Big endian variants (`>`) of the multi-byte types are supported.
//!
//! ### Compressors
//! `gzip` (feature `gzip`), `zlib` (feature `zlib`), `zstd` (feature `zstd`), or no compressor.
//!
//! ### Stores
//! - [`MemoryStore`](crate::storage::store::MemoryStore): an in-memory store.
//! - [`FilesystemStore`](crate::filesystem::FilesystemStore): a filesystem store (feature `filesystem`).
//!
//! ## Dimension Order
//! Arrays are addressed with indices in *memory order*: dimension 0 varies fastest in every buffer returned or accepted by `zarrlite`.
//! The `shape` and `chunks` written to `.zarray` and the chunk keys list dimensions in the reverse order, so a chunk written by `zarrlite` is byte-identical to a C order chunk of the reversed shape.
//!
//! ## Example
#![cfg_attr(feature = "ndarray", doc = "```rust")]
#![cfg_attr(not(feature = "ndarray"), doc = "```rust,ignore")]
//! # use std::sync::Arc;
//! use zarrlite::array::{ArrayBuilder, DataType};
//! use zarrlite::array_subset::ArraySubset;
//! use zarrlite::storage::store::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::new());
//! let array = ArrayBuilder::new(vec![4, 4], DataType::Int32)
//!     .chunk_shape(vec![2, 2])
//!     .fill_value(0i32)
//!     .build(store, "/array")?;
//!
//! let subset = ArraySubset::new_with_start_end_inc(vec![1, 1], vec![2, 2])?;
//! array.store_array_subset_elements(&subset, &[7i32; 4])?;
//!
//! let elements = array.retrieve_array_subset_elements::<i32>(&array.subset_all())?;
//! assert_eq!(elements.iter().filter(|&&v| v == 7).count(), 4);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Logging
//! `zarrlite` logs through the [`log`] facade and does not install a logger.
//!
//! ## Licence
//! `zarrlite` is licensed under either of
//! - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//! - the MIT license <http://opensource.org/licenses/MIT>, at your option.
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(clippy::wildcard_enum_match_arm)]

pub mod array;
pub mod array_subset;
pub mod config;
pub mod indexer;
pub mod node;
pub mod plugin;

#[cfg(feature = "filesystem")]
pub use zarrlite_filesystem as filesystem;
pub use zarrlite_metadata as metadata;
pub use zarrlite_storage as storage;
