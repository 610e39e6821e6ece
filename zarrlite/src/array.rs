//! Zarr V2 arrays.
//!
//! An array is a rectangular grid of elements of a single [`DataType`], partitioned into chunks by a [`RegularChunkGrid`].
//! Each chunk is stored at a key derived from its chunk grid indices by a [`V2ChunkKeyEncoding`], optionally compressed.
//!
//! Use [`ArrayBuilder`] to create a new array and [`Array::open`] to open an existing array.
//!
//! ## Dimension Order
//! Array indices, shapes and element buffers are in memory order where dimension 0 varies fastest.
//! The metadata and chunk keys list dimensions in reverse order.
//! For example, an array created with shape `[10, 20]` and chunk shape `[5, 4]` has the following `.zarray`
//! ```json
//! { "shape": [20, 10], "chunks": [4, 5], ... }
//! ```
//! and its chunk at chunk grid indices `[1, 3]` has the key `3.1`.

mod array_builder;
mod array_errors;
mod array_sync_readable;
mod array_sync_writable;
pub mod chunk_grid;
pub mod chunk_key_encoding;
mod chunk_lock;
pub mod codec;
pub mod data_type;
mod element;
mod fill_value;

use std::sync::Arc;

pub use self::{
    array_builder::{ArrayBuilder, ChunkInitialization},
    array_errors::{ArrayCreateError, ArrayError},
    chunk_grid::{BlockRange, ChunkRanges, RegularChunkGrid},
    chunk_key_encoding::{ChunkKeySeparator, V2ChunkKeyEncoding},
    codec::{Compressor, CompressorTraits},
    data_type::{DataType, Endianness},
    element::Element,
    fill_value::FillValue,
};
pub use crate::metadata::{
    v2::{ArrayMetadataV2, ArrayMetadataV2Order},
    ArrayShape, Attributes, ChunkShape,
};

use chunk_lock::ChunkLocks;

use crate::{
    array_subset::{iterators::ContiguousLinearisedIndices, ArraySubset},
    config::global_config,
    node::{data_key, NodePath},
    storage::StoreKey,
};

/// An ND index to an element in an array or a chunk in a chunk grid.
pub type ArrayIndices = Vec<u64>;

/// The access mode of an opened array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// The array can only be read.
    #[default]
    ReadOnly,
    /// The array can be read and written.
    ReadWrite,
}

/// A Zarr V2 array.
///
/// See <https://zarr-specs.readthedocs.io/en/latest/v2/v2.0.html#metadata>.
///
/// ### Initialisation
///
/// A *new* array is created with an [`ArrayBuilder`], which writes its metadata (and optionally every chunk) to the store.
///
/// An *existing* array is opened with [`Array::open`] or [`Array::open_with_mode`], its metadata is read from the store.
/// An array opened with [`AccessMode::ReadOnly`] rejects every write with [`ArrayError::ReadOnly`].
///
/// The description of an array (shape, chunk shape, data type, fill value, compressor) is immutable.
///
/// ### Methods
///
/// Array operations are divided into several categories based on the traits implemented for the backing [storage](crate::storage):
///  - [`ReadableStorageTraits`](crate::storage::ReadableStorageTraits): read array data and metadata
///    - [`retrieve_chunk`](Array::retrieve_chunk) / [`retrieve_chunk_if_exists`](Array::retrieve_chunk_if_exists) / [`retrieve_encoded_chunk`](Array::retrieve_encoded_chunk)
///    - [`retrieve_array_subset`](Array::retrieve_array_subset)
///  - [`WritableStorageTraits`](crate::storage::WritableStorageTraits): write array data and metadata
///    - [`store_metadata`](Array::store_metadata) / [`store_attributes`](Array::store_attributes)
///    - [`store_chunk`](Array::store_chunk) / [`erase_chunk`](Array::erase_chunk)
///  - [`ReadableWritableStorageTraits`](crate::storage::ReadableWritableStorageTraits): operations requiring both reading and writing
///    - [`store_array_subset`](Array::store_array_subset) / [`fill_array_subset`](Array::fill_array_subset)
///
/// The `retrieve` and `store` methods have multiple variants:
///   - The above variants store or retrieve data represented as bytes in native byte order.
///   - Variants with an `_elements` suffix read and write elements of a known [`Element`] type.
///   - With the `ndarray` feature, variants with an `_ndarray` suffix read and write [`ndarray::ArrayD`]s.
///
/// ### Concurrency
///
/// Array methods take `&self` and may be called from multiple threads.
/// [`store_array_subset`](Array::store_array_subset) retrieves each partially covered chunk, updates it, then stores it.
/// Without chunk locking, concurrent writes to the same chunk may lose updates.
/// Enable [chunk locking](Array::with_chunk_locking) to hold an in-process lock per chunk during this process.
/// Locks are not shared between array handles or processes.
#[derive(Debug)]
pub struct Array<TStorage: ?Sized> {
    /// The storage.
    storage: Arc<TStorage>,
    /// The path of the array in a store.
    path: NodePath,
    /// The data type.
    data_type: DataType,
    /// The byte order of elements in stored chunks.
    endianness: Endianness,
    /// The chunk grid, in memory order.
    chunk_grid: RegularChunkGrid,
    /// The mapping from chunk grid indices to keys in the store.
    chunk_key_encoding: V2ChunkKeyEncoding,
    /// The element value of uninitialised portions of the array.
    fill_value: FillValue,
    /// The compressor, or [`None`] if chunks are stored uncompressed.
    compressor: Option<Compressor>,
    /// User defined attributes.
    attributes: Attributes,
    /// The array metadata.
    metadata: ArrayMetadataV2,
    writable: bool,
    chunk_locks: Option<Arc<ChunkLocks>>,
}

impl<TStorage: ?Sized> Array<TStorage> {
    /// Create an array in `storage` at `path` with `metadata` and `attributes`.
    ///
    /// This does **not** read from or write to the store.
    /// The array is writable.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if the metadata is invalid or unsupported.
    pub fn new_with_metadata(
        storage: Arc<TStorage>,
        path: &str,
        metadata: ArrayMetadataV2,
        attributes: Attributes,
    ) -> Result<Self, ArrayCreateError> {
        let path = NodePath::new(path)?;

        if metadata.zarr_format != 2 {
            return Err(ArrayCreateError::UnsupportedFormatVersion(
                metadata.zarr_format,
            ));
        }
        if let Some(filters) = metadata.filters.as_ref().filter(|f| !f.is_empty()) {
            return Err(ArrayCreateError::UnsupportedFilters(
                serde_json::to_string(filters).unwrap_or_default(),
            ));
        }
        if metadata.shape.len() != metadata.chunks.len() {
            return Err(ArrayCreateError::ShapeMismatch(
                metadata.shape.clone(),
                metadata.chunks.clone(),
            ));
        }
        let shape = metadata.shape.iter().rev().copied().collect();
        let chunk_shape = metadata.chunks.iter().rev().copied().collect();
        let chunk_grid = RegularChunkGrid::new(shape, chunk_shape).map_err(|_| {
            ArrayCreateError::InvalidShape(metadata.shape.clone(), metadata.chunks.clone())
        })?;
        let (data_type, endianness) = DataType::from_dtype(&metadata.dtype)
            .map_err(|_| ArrayCreateError::UnknownDataType(metadata.dtype.clone()))?;
        if usize::try_from(chunk_grid.chunk_num_elements())
            .ok()
            .and_then(|num_elements| num_elements.checked_mul(data_type.size()))
            .is_none()
        {
            return Err(ArrayCreateError::InvalidShape(
                metadata.shape.clone(),
                metadata.chunks.clone(),
            ));
        }
        let fill_value = data_type
            .fill_value_from_metadata(&metadata.fill_value)
            .map_err(|_| ArrayCreateError::InvalidFillValue {
                data_type: metadata.dtype.clone(),
                fill_value: serde_json::to_string(&metadata.fill_value).unwrap_or_default(),
            })?;
        let compressor = metadata
            .compressor
            .as_ref()
            .map(codec::compressor_from_metadata)
            .transpose()?;
        if metadata.order == ArrayMetadataV2Order::F {
            log::warn!(
                "array {path} has order F, chunks are read and written with dimension 0 varying fastest"
            );
        }

        Ok(Self {
            storage,
            path,
            data_type,
            endianness,
            chunk_grid,
            chunk_key_encoding: V2ChunkKeyEncoding::new(metadata.dimension_separator),
            fill_value,
            compressor,
            attributes,
            metadata,
            writable: true,
            chunk_locks: global_config()
                .chunk_locking()
                .then(|| Arc::new(ChunkLocks::default())),
        })
    }

    /// Enable or disable per-chunk locking.
    ///
    /// If enabled, each chunk is locked while it is retrieved, updated and stored by a write.
    /// The default is set by the [global config](crate::config::Config#chunk-locking).
    #[must_use]
    pub fn with_chunk_locking(mut self, chunk_locking: bool) -> Self {
        self.chunk_locks = chunk_locking.then(|| Arc::new(ChunkLocks::default()));
        self
    }

    /// Set the access mode.
    #[must_use]
    pub(crate) fn with_access_mode(mut self, access_mode: AccessMode) -> Self {
        self.writable = access_mode == AccessMode::ReadWrite;
        self
    }

    /// Get the underlying storage backing the array.
    #[must_use]
    pub fn storage(&self) -> Arc<TStorage> {
        self.storage.clone()
    }

    /// Get the node path.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Get the name of the array, the final component of its path.
    ///
    /// The name of an array at the root of a store is an empty string.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// Get the data type.
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Get the byte order of elements in stored chunks.
    #[must_use]
    pub const fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Get the fill value.
    #[must_use]
    pub const fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// Get the array shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        self.chunk_grid.array_shape()
    }

    /// Get the chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &[u64] {
        self.chunk_grid.chunk_shape()
    }

    /// Get the number of chunks along each dimension.
    #[must_use]
    pub fn chunk_grid_shape(&self) -> &[u64] {
        self.chunk_grid.grid_shape()
    }

    /// Get the chunk grid.
    #[must_use]
    pub const fn chunk_grid(&self) -> &RegularChunkGrid {
        &self.chunk_grid
    }

    /// Get the chunk key encoding.
    #[must_use]
    pub const fn chunk_key_encoding(&self) -> &V2ChunkKeyEncoding {
        &self.chunk_key_encoding
    }

    /// Get the dimensionality of the array.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.chunk_grid.dimensionality()
    }

    /// Get the order recorded in the metadata.
    ///
    /// The order does not change how chunks are read or written.
    #[must_use]
    pub fn order(&self) -> ArrayMetadataV2Order {
        self.metadata.order
    }

    /// Get the compressor.
    #[must_use]
    pub fn compressor(&self) -> Option<&Compressor> {
        self.compressor.as_ref()
    }

    /// Get the attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Mutably borrow the attributes.
    ///
    /// Use [`store_attributes`](Array::store_attributes) to write changes to the store.
    #[must_use]
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Returns true if the array can be written.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        self.writable
    }

    /// Get the array metadata.
    #[must_use]
    pub const fn metadata(&self) -> &ArrayMetadataV2 {
        &self.metadata
    }

    /// Return an array subset that spans the entire array.
    #[must_use]
    pub fn subset_all(&self) -> ArraySubset {
        ArraySubset::new_with_shape(self.shape().to_vec())
    }

    /// Return the key of the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndices`] if `chunk_indices` is outside the chunk grid.
    pub fn chunk_key(&self, chunk_indices: &[u64]) -> Result<StoreKey, ArrayError> {
        if !self.chunk_grid.contains(chunk_indices) {
            return Err(ArrayError::InvalidChunkGridIndices(chunk_indices.to_vec()));
        }
        Ok(data_key(
            &self.path,
            &self.chunk_key_encoding.encode(chunk_indices),
        )?)
    }

    /// Return the array subset of the chunk at `chunk_indices`.
    ///
    /// The subset of a chunk on the upper boundary of the array may extend beyond the array.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndices`] if `chunk_indices` is outside the chunk grid.
    pub fn chunk_subset(&self, chunk_indices: &[u64]) -> Result<ArraySubset, ArrayError> {
        self.chunk_grid
            .subset(chunk_indices)
            .ok_or_else(|| ArrayError::InvalidChunkGridIndices(chunk_indices.to_vec()))
    }

    /// Return the array subset of the chunk at `chunk_indices` clipped to the array bounds.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndices`] if `chunk_indices` is outside the chunk grid.
    pub fn chunk_subset_bounded(&self, chunk_indices: &[u64]) -> Result<ArraySubset, ArrayError> {
        self.chunk_grid
            .subset_bounded(chunk_indices)
            .ok_or_else(|| ArrayError::InvalidChunkGridIndices(chunk_indices.to_vec()))
    }

    /// The size in bytes of a decoded chunk.
    fn chunk_size_bytes(&self) -> usize {
        to_usize(self.chunk_grid.chunk_num_elements()).saturating_mul(self.data_type.size())
    }

    /// Check that `array_subset` is within the bounds of the array.
    fn validate_array_subset(&self, array_subset: &ArraySubset) -> Result<(), ArrayError> {
        if array_subset.dimensionality() != self.dimensionality() {
            Err(crate::array_subset::IncompatibleDimensionalityError::new(
                array_subset.dimensionality(),
                self.dimensionality(),
            )
            .into())
        } else if array_subset.inbounds_shape(self.shape()) {
            Ok(())
        } else {
            Err(ArrayError::OutOfBoundsSelection(
                array_subset.clone(),
                self.shape().to_vec(),
            ))
        }
    }

    /// Decode the stored bytes of the chunk at `chunk_indices` into `chunk`.
    ///
    /// A missing chunk is decoded as the fill value.
    fn decode_chunk_into(
        &self,
        chunk_indices: &[u64],
        encoded_chunk: Option<&[u8]>,
        chunk: &mut Vec<u8>,
    ) -> Result<(), ArrayError> {
        let chunk_size = self.chunk_size_bytes();
        let Some(encoded_chunk) = encoded_chunk else {
            chunk.resize(chunk_size, 0);
            self.fill_value.fill(chunk);
            return Ok(());
        };
        if let Some(compressor) = &self.compressor {
            compressor.decode(encoded_chunk, chunk)?;
        } else {
            chunk.clear();
            chunk.extend_from_slice(encoded_chunk);
        }
        if chunk.len() != chunk_size {
            return Err(ArrayError::CorruptChunk(
                chunk_indices.to_vec(),
                chunk.len(),
                chunk_size,
            ));
        }
        if !self.endianness.is_native() {
            reverse_endianness(chunk, self.data_type.swap_size());
        }
        Ok(())
    }

    /// Encode a chunk for storage.
    ///
    /// `chunk` is byte swapped in place if the stored endianness is not native.
    fn encode_chunk(&self, chunk: &mut [u8]) -> Result<Vec<u8>, ArrayError> {
        if !self.endianness.is_native() {
            reverse_endianness(chunk, self.data_type.swap_size());
        }
        match &self.compressor {
            Some(compressor) => Ok(compressor.encode(chunk)?),
            None => Ok(chunk.to_vec()),
        }
    }
}

/// Reverse the byte order of each `swap_size` unit of `bytes`.
fn reverse_endianness(bytes: &mut [u8], swap_size: usize) {
    if swap_size > 1 {
        for unit in bytes.chunks_exact_mut(swap_size) {
            unit.reverse();
        }
    }
}

/// Copy the elements of `src_subset` within `src` (with shape `src_shape`) to `dst_subset` within `dst` (with shape `dst_shape`).
///
/// The subsets must have the same shape.
fn copy_array_subset(
    src: &[u8],
    src_shape: &[u64],
    src_subset: &ArraySubset,
    dst: &mut [u8],
    dst_shape: &[u64],
    dst_subset: &ArraySubset,
    element_size: usize,
) -> Result<(), ArrayError> {
    debug_assert_eq!(src_subset.shape(), dst_subset.shape());
    let merged_dims = std::cmp::min(
        ContiguousLinearisedIndices::merged_dims(src_subset, src_shape),
        ContiguousLinearisedIndices::merged_dims(dst_subset, dst_shape),
    );
    let src_indices = ContiguousLinearisedIndices::new_with_merged_dims(
        src_subset,
        src_shape.to_vec(),
        merged_dims,
    )?;
    let dst_indices = ContiguousLinearisedIndices::new_with_merged_dims(
        dst_subset,
        dst_shape.to_vec(),
        merged_dims,
    )?;
    let length = to_usize(src_indices.contiguous_elements()) * element_size;
    for ((src_index, _), (dst_index, _)) in std::iter::zip(src_indices.iter(), dst_indices.iter())
    {
        let src_offset = to_usize(src_index) * element_size;
        let dst_offset = to_usize(dst_index) * element_size;
        dst[dst_offset..dst_offset + length].copy_from_slice(&src[src_offset..src_offset + length]);
    }
    Ok(())
}

/// Ravel ND indices to a linearised index.
///
/// Dimension 0 varies fastest.
#[must_use]
pub fn ravel_indices(indices: &[u64], shape: &[u64]) -> u64 {
    let mut index: u64 = 0;
    let mut count = 1;
    for (i, s) in std::iter::zip(indices, shape) {
        index += i * count;
        count *= s;
    }
    index
}

/// Unravel a linearised index to ND indices.
///
/// Dimension 0 varies fastest.
#[must_use]
pub fn unravel_index(mut index: u64, shape: &[u64]) -> ArrayIndices {
    shape
        .iter()
        .map(|&dim| {
            let i = index % dim;
            index /= dim;
            i
        })
        .collect()
}

/// Convert a `u64` to a `usize`, saturating if it does not fit.
pub(crate) fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[cfg(feature = "ndarray")]
fn iter_u64_to_usize<'a, I: Iterator<Item = &'a u64>>(iter: I) -> Vec<usize> {
    iter.map(|v| to_usize(*v)).collect::<Vec<_>>()
}

/// Convert elements in memory order (dimension 0 varies fastest) to an [`ndarray::ArrayD`].
#[cfg(feature = "ndarray")]
pub(crate) fn elements_to_ndarray<T>(
    shape: &[u64],
    elements: Vec<T>,
) -> Result<ndarray::ArrayD<T>, ArrayError> {
    use ndarray::ShapeBuilder;
    let length = elements.len();
    ndarray::ArrayD::<T>::from_shape_vec(iter_u64_to_usize(shape.iter()).f(), elements).map_err(
        |_| ArrayError::InvalidDataShape(vec![length], iter_u64_to_usize(shape.iter())),
    )
}

/// Convert an [`ndarray::ArrayViewD`] to its shape and elements in memory order (dimension 0 varies fastest).
#[cfg(feature = "ndarray")]
pub(crate) fn ndarray_into_elements<T: Clone>(
    array: &ndarray::ArrayViewD<'_, T>,
) -> (ArrayShape, Vec<T>) {
    let shape = array.shape().iter().map(|&s| s as u64).collect();
    (shape, array.t().iter().cloned().collect())
}
