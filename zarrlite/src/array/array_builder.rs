use std::sync::Arc;

use crate::{
    config::global_config,
    metadata::v2::{FillValueMetadataV2, MetadataV2},
    storage::{Bytes, ListableStorageTraits, WritableStorageTraits},
};

use super::{
    chunk_grid::RegularChunkGrid, Array, ArrayCreateError, ArrayMetadataV2, ArrayMetadataV2Order,
    ArrayShape, Attributes, ChunkKeySeparator, ChunkShape, Compressor, DataType, Endianness,
    FillValue,
};

/// The chunk initialization policy of a new array.
///
/// The default is set by the [global config](crate::config::Config#chunk-initialization).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkInitialization {
    /// Write every chunk of the array filled with the fill value.
    Eager,
    /// Write no chunks. Missing chunks are read as the fill value.
    Lazy,
}

/// An [`Array`] builder.
///
/// [`ArrayBuilder`] is initialised from an array shape and data type.
///  - The chunk shape is the array shape (a single chunk) by default.
///  - The fill value is `null` in the metadata by default, which reads as zero, false or an empty string.
///  - There is no compressor by default.
///  - Multi-byte elements are stored little endian, and the metadata order is `C`.
///  - The chunk key separator is `.`.
///  - Attributes are empty.
///
/// [`build`](ArrayBuilder::build) writes the array metadata and attributes to the store, and writes every chunk unless [chunk initialization](ArrayBuilder::chunk_initialization) is [`Lazy`](ChunkInitialization::Lazy).
///
/// ### Example
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # use std::sync::Arc;
/// use zarrlite::array::{ArrayBuilder, DataType};
/// # let store = Arc::new(zarrlite::storage::store::MemoryStore::new());
/// let array = ArrayBuilder::new(vec![10], DataType::Float64)
///     .chunk_shape(vec![3])
///     .fill_value(f64::NAN)
///     .build(store.clone(), "/group/array")?;
/// assert_eq!(array.chunk_grid_shape(), &[4]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ArrayBuilder {
    shape: ArrayShape,
    data_type: DataType,
    chunk_shape: Option<ChunkShape>,
    fill_value: Option<FillValue>,
    compressor: Option<Compressor>,
    endianness: Endianness,
    order: ArrayMetadataV2Order,
    dimension_separator: ChunkKeySeparator,
    attributes: Attributes,
    chunk_initialization: Option<ChunkInitialization>,
    chunk_locking: Option<bool>,
}

impl ArrayBuilder {
    /// Create a new array builder for an array with `shape` and `data_type`.
    #[must_use]
    pub fn new(shape: ArrayShape, data_type: DataType) -> Self {
        Self {
            shape,
            data_type,
            chunk_shape: None,
            fill_value: None,
            compressor: None,
            endianness: Endianness::Little,
            order: ArrayMetadataV2Order::C,
            dimension_separator: ChunkKeySeparator::Dot,
            attributes: Attributes::default(),
            chunk_initialization: None,
            chunk_locking: None,
        }
    }

    /// Set the chunk shape.
    ///
    /// If left unmodified, the chunk shape is the array shape.
    #[must_use]
    pub fn chunk_shape(mut self, chunk_shape: ChunkShape) -> Self {
        self.chunk_shape = Some(chunk_shape);
        self
    }

    /// Set the fill value.
    #[must_use]
    pub fn fill_value(mut self, fill_value: impl Into<FillValue>) -> Self {
        self.fill_value = Some(fill_value.into());
        self
    }

    /// Set the compressor.
    ///
    /// If left unmodified, chunks are stored uncompressed.
    #[must_use]
    pub fn compressor(mut self, compressor: Option<Compressor>) -> Self {
        self.compressor = compressor;
        self
    }

    /// Set the compressor from compressor metadata, such as `{"id": "zstd", "level": 5}`.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError::CompressorCreateError`] if the compressor is unsupported or its configuration is invalid.
    pub fn compressor_metadata(mut self, metadata: &MetadataV2) -> Result<Self, ArrayCreateError> {
        self.compressor = Some(super::codec::compressor_from_metadata(metadata)?);
        Ok(self)
    }

    /// Set the byte order of multi-byte elements in stored chunks.
    ///
    /// If left unmodified, elements are stored little endian.
    #[must_use]
    pub fn endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    /// Set the order written to the metadata.
    ///
    /// The order does not change how chunks are written.
    #[must_use]
    pub fn order(mut self, order: ArrayMetadataV2Order) -> Self {
        self.order = order;
        self
    }

    /// Set the chunk key separator.
    #[must_use]
    pub fn dimension_separator(mut self, dimension_separator: ChunkKeySeparator) -> Self {
        self.dimension_separator = dimension_separator;
        self
    }

    /// Set the user defined attributes.
    #[must_use]
    pub fn attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set the [`ChunkInitialization`] policy.
    ///
    /// If left unmodified, the policy of the [global config](crate::config::Config#chunk-initialization) is used.
    #[must_use]
    pub fn chunk_initialization(mut self, chunk_initialization: ChunkInitialization) -> Self {
        self.chunk_initialization = Some(chunk_initialization);
        self
    }

    /// Enable or disable [chunk locking](Array::with_chunk_locking) on the built array.
    #[must_use]
    pub fn chunk_locking(mut self, chunk_locking: bool) -> Self {
        self.chunk_locking = Some(chunk_locking);
        self
    }

    /// Build the array metadata.
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if the shape, chunk shape, data type or fill value are invalid.
    pub fn build_metadata(&self) -> Result<ArrayMetadataV2, ArrayCreateError> {
        if self.data_type.size() == 0 {
            return Err(ArrayCreateError::UnknownDataType(
                self.data_type.to_dtype(self.endianness),
            ));
        }
        let chunk_shape = self.chunk_shape.as_ref().unwrap_or(&self.shape);
        if chunk_shape.len() != self.shape.len() {
            return Err(ArrayCreateError::ShapeMismatch(
                self.shape.clone(),
                chunk_shape.clone(),
            ));
        }
        RegularChunkGrid::new(self.shape.clone(), chunk_shape.clone())
            .map_err(|_| ArrayCreateError::InvalidShape(self.shape.clone(), chunk_shape.clone()))?;

        let fill_value = match &self.fill_value {
            Some(fill_value) => {
                let fill_value = self
                    .data_type
                    .validate_fill_value(fill_value.clone())
                    .map_err(|err| ArrayCreateError::InvalidFillValue {
                        data_type: self.data_type.name(),
                        fill_value: err.fill_value().to_string(),
                    })?;
                self.data_type.metadata_fill_value(&fill_value)
            }
            None => FillValueMetadataV2::Null,
        };

        Ok(ArrayMetadataV2::new(
            self.shape.iter().rev().copied().collect(),
            chunk_shape.iter().rev().copied().collect(),
            self.data_type.to_dtype(self.endianness),
            fill_value,
            self.compressor
                .as_ref()
                .map(|compressor| compressor.create_metadata()),
        )
        .with_order(self.order)
        .with_dimension_separator(self.dimension_separator))
    }

    /// Build into an [`Array`].
    ///
    /// Writes the array metadata (`.zarray`) and attributes (`.zattrs`) to `storage` at `path`.
    /// Every chunk is then written filled with the fill value if chunk initialization is [`Eager`](ChunkInitialization::Eager).
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if
    ///  - the array metadata is invalid,
    ///  - there is already a node at `path`, or
    ///  - there is a storage error.
    pub fn build<TStorage: ?Sized + WritableStorageTraits + ListableStorageTraits + 'static>(
        &self,
        storage: Arc<TStorage>,
        path: &str,
    ) -> Result<Array<TStorage>, ArrayCreateError> {
        let metadata = self.build_metadata()?;
        let mut array =
            Array::new_with_metadata(storage.clone(), path, metadata, self.attributes.clone())?;
        if let Some(chunk_locking) = self.chunk_locking {
            array = array.with_chunk_locking(chunk_locking);
        }

        let prefix = array.path().prefix()?;
        if !storage.list_prefix(&prefix)?.is_empty() {
            return Err(ArrayCreateError::AlreadyExists(array.path().to_string()));
        }

        array.store_metadata()?;
        array.store_attributes()?;

        let chunk_initialization = self
            .chunk_initialization
            .unwrap_or_else(|| global_config().chunk_initialization());
        if chunk_initialization == ChunkInitialization::Eager {
            // Every chunk encodes to the same bytes
            let mut chunk = array.fill_value().repeat(super::to_usize(
                array.chunk_grid().chunk_num_elements(),
            ));
            let encoded_chunk = Bytes::from(array.encode_chunk(&mut chunk)?);
            let chunks = array.chunk_grid().chunks();
            for chunk_indices in chunks.iter() {
                storage.set(&array.chunk_key(&chunk_indices)?, encoded_chunk.clone())?;
            }
            log::debug!("initialised {} chunks of array {}", chunks.len(), array.path());
        }
        log::debug!(
            "created array {} with metadata {}",
            array.path(),
            array.metadata()
        );

        Ok(array)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{store::MemoryStore, ListableStorageTraits, ReadableStorageTraits, StoreKey};

    use super::*;

    #[test]
    fn array_builder_metadata() {
        let builder = ArrayBuilder::new(vec![10, 20], DataType::Float32)
            .chunk_shape(vec![5, 4])
            .fill_value(f32::NAN)
            .order(ArrayMetadataV2Order::F);
        let metadata = builder.build_metadata().unwrap();
        assert_eq!(metadata.shape, vec![20, 10]);
        assert_eq!(metadata.chunks, vec![4, 5]);
        assert_eq!(metadata.dtype, "<f4");
        assert_eq!(metadata.fill_value, FillValueMetadataV2::NaN);
        assert_eq!(metadata.order, ArrayMetadataV2Order::F);
        assert!(metadata.compressor.is_none());
        assert!(metadata.filters.is_none());

        let metadata = ArrayBuilder::new(vec![10], DataType::Int16)
            .endianness(Endianness::Big)
            .build_metadata()
            .unwrap();
        assert_eq!(metadata.chunks, vec![10]);
        assert_eq!(metadata.dtype, ">i2");
        assert_eq!(metadata.fill_value, FillValueMetadataV2::Null);
    }

    #[test]
    fn array_builder_invalid() {
        assert!(matches!(
            ArrayBuilder::new(vec![10, 10], DataType::Int8)
                .chunk_shape(vec![5])
                .build_metadata(),
            Err(ArrayCreateError::ShapeMismatch(_, _))
        ));
        assert!(matches!(
            ArrayBuilder::new(vec![10, 0], DataType::Int8).build_metadata(),
            Err(ArrayCreateError::InvalidShape(_, _))
        ));
        assert!(matches!(
            ArrayBuilder::new(vec![], DataType::Int8).build_metadata(),
            Err(ArrayCreateError::InvalidShape(_, _))
        ));
        assert!(matches!(
            ArrayBuilder::new(vec![10], DataType::Int8)
                .fill_value(0i32)
                .build_metadata(),
            Err(ArrayCreateError::InvalidFillValue { .. })
        ));
        assert!(matches!(
            ArrayBuilder::new(vec![10], DataType::String(0)).build_metadata(),
            Err(ArrayCreateError::UnknownDataType(_))
        ));
    }

    #[test]
    fn array_builder_build() {
        let store = Arc::new(MemoryStore::new());
        let array = ArrayBuilder::new(vec![10], DataType::Float64)
            .chunk_shape(vec![3])
            .fill_value(f64::NAN)
            .chunk_initialization(ChunkInitialization::Eager)
            .build(store.clone(), "/array")
            .unwrap();
        assert!(array.is_writable());
        assert_eq!(array.chunk_grid_shape(), &[4]);
        for key in ["array/.zarray", "array/.zattrs", "array/0", "array/3"] {
            assert!(store.get(&StoreKey::new(key).unwrap()).unwrap().is_some());
        }
        assert_eq!(
            store.get(&StoreKey::new("array/.zattrs").unwrap()).unwrap().unwrap(),
            "{}".as_bytes()
        );

        assert!(matches!(
            ArrayBuilder::new(vec![10], DataType::Float64).build(store.clone(), "/array"),
            Err(ArrayCreateError::AlreadyExists(_))
        ));
    }

    #[test]
    fn array_builder_build_lazy() {
        let store = Arc::new(MemoryStore::new());
        ArrayBuilder::new(vec![10], DataType::UInt8)
            .chunk_shape(vec![3])
            .chunk_initialization(ChunkInitialization::Lazy)
            .build(store.clone(), "/")
            .unwrap();
        let keys = store.list().unwrap();
        assert_eq!(keys.len(), 2);
        assert!(store.get(&StoreKey::new("0").unwrap()).unwrap().is_none());
    }
}
