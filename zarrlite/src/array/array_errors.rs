use thiserror::Error;

use super::{codec::CodecError, ArrayIndices, ArrayShape};
use crate::{
    array_subset::{
        ArraySubset, ArraySubsetError, IncompatibleArraySubsetAndShapeError,
        IncompatibleDimensionalityError,
    },
    node::NodePathError,
    plugin::PluginCreateError,
    storage::{StorageError, StoreKeyError, StorePrefixError},
};

/// An array creation error.
///
/// Returned when creating a new array with an [`ArrayBuilder`](super::ArrayBuilder) or opening an existing array.
#[derive(Clone, Debug, Error)]
pub enum ArrayCreateError {
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// The `zarr_format` of the array metadata is not 2.
    #[error("unsupported zarr format {_0}, expected 2")]
    UnsupportedFormatVersion(u64),
    /// The data type is unknown or unsupported.
    #[error("unknown data type {_0}")]
    UnknownDataType(String),
    /// The array already exists.
    #[error("an array or group already exists at {_0}")]
    AlreadyExists(String),
    /// The dimensionality of the array shape and chunk shape differ.
    #[error("chunk shape {_1:?} does not match the dimensionality of array shape {_0:?}")]
    ShapeMismatch(ArrayShape, ArrayShape),
    /// The array or chunk shape is zero dimensional, has a zero length dimension, or a chunk is too large to address in memory.
    #[error("invalid array shape {_0:?} or chunk shape {_1:?}: dimensions must be non-zero and a chunk must fit in memory")]
    InvalidShape(ArrayShape, ArrayShape),
    /// The fill value is incompatible with the data type.
    #[error("invalid fill value {fill_value} for data type {data_type}")]
    InvalidFillValue {
        /// The data type.
        data_type: String,
        /// The fill value.
        fill_value: String,
    },
    /// Error creating the compressor.
    #[error(transparent)]
    CompressorCreateError(#[from] PluginCreateError),
    /// Non-null filters are not supported.
    #[error("filters are not supported: {_0}")]
    UnsupportedFilters(String),
    /// The array metadata is missing.
    #[error("array metadata is missing")]
    MissingMetadata,
    /// The array metadata or attributes could not be parsed.
    #[error("invalid array metadata: {_0}")]
    InvalidMetadata(String),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// An array error, such as a failure initializing chunks.
    #[error(transparent)]
    ArrayError(#[from] ArrayError),
}

impl From<StoreKeyError> for ArrayCreateError {
    fn from(err: StoreKeyError) -> Self {
        Self::StorageError(err.into())
    }
}

impl From<StorePrefixError> for ArrayCreateError {
    fn from(err: StorePrefixError) -> Self {
        Self::StorageError(err.into())
    }
}

/// Array errors.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ArrayError {
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// A codec error.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// The array is read only.
    #[error("the array is read only")]
    ReadOnly,
    /// The selection is out of the bounds of the array.
    #[error("selection {_0} is out of bounds of array shape {_1:?}")]
    OutOfBoundsSelection(ArraySubset, ArrayShape),
    /// The number of elements does not match the selection.
    #[error("got {_0} elements, expected {_1}")]
    ShapeMismatch(u64, u64),
    /// The number of bytes does not match the selection or chunk.
    #[error("got {_0} bytes, expected {_1}")]
    InvalidBytesLength(usize, usize),
    /// Incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// An [`ArraySubsetError`].
    #[error(transparent)]
    ArraySubsetError(#[from] ArraySubsetError),
    /// An array subset is not compatible with the shape of an array or chunk.
    #[error(transparent)]
    IncompatibleArraySubsetAndShape(#[from] IncompatibleArraySubsetAndShapeError),
    /// Invalid chunk grid indices.
    #[error("invalid chunk grid indices: {_0:?}")]
    InvalidChunkGridIndices(ArrayIndices),
    /// A decoded chunk does not have the expected size.
    #[error("chunk {_0:?} decoded to {_1} bytes, expected {_2}")]
    CorruptChunk(ArrayIndices, usize, usize),
    /// The element type does not match the data type.
    #[error("the element type does not match the data type")]
    IncompatibleElementType,
    /// An element value is invalid for the data type.
    ///
    /// For example a bool array with a value not equal to 0 (false) or 1 (true).
    #[error("invalid element value")]
    InvalidElementValue,
    /// An invalid data shape.
    #[error("data has shape {_0:?}, expected {_1:?}")]
    InvalidDataShape(Vec<usize>, Vec<usize>),
}

impl From<StoreKeyError> for ArrayError {
    fn from(err: StoreKeyError) -> Self {
        Self::StorageError(err.into())
    }
}
