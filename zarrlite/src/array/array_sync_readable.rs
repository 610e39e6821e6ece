use std::sync::Arc;

use super::{
    copy_array_subset, AccessMode, Array, ArrayCreateError, ArrayError, ArrayMetadataV2,
    Attributes, Element,
};
use crate::{
    array_subset::ArraySubset,
    node::{meta_key_v2_array, meta_key_v2_attributes, NodePath},
    storage::ReadableStorageTraits,
};

impl<TStorage: ?Sized + ReadableStorageTraits + 'static> Array<TStorage> {
    /// Open an existing read only array in `storage` at `path`.
    /// The metadata and attributes are read from the store.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if there is a storage error or any metadata is missing or invalid.
    pub fn open(storage: Arc<TStorage>, path: &str) -> Result<Self, ArrayCreateError> {
        Self::open_with_mode(storage, path, AccessMode::ReadOnly)
    }

    /// Open an existing array in `storage` at `path` with `access_mode`.
    /// The metadata and attributes are read from the store.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if there is a storage error or any metadata is missing or invalid.
    pub fn open_with_mode(
        storage: Arc<TStorage>,
        path: &str,
        access_mode: AccessMode,
    ) -> Result<Self, ArrayCreateError> {
        let (metadata, attributes) = Self::open_metadata(&storage, path)?;
        let array = Self::new_with_metadata(storage, path, metadata, attributes)?
            .with_access_mode(access_mode);
        log::debug!("opened array {} ({access_mode:?})", array.path());
        Ok(array)
    }

    fn open_metadata(
        storage: &Arc<TStorage>,
        path: &str,
    ) -> Result<(ArrayMetadataV2, Attributes), ArrayCreateError> {
        let node_path = NodePath::new(path)?;

        let metadata = storage
            .get(&meta_key_v2_array(&node_path)?)?
            .ok_or(ArrayCreateError::MissingMetadata)?;
        let metadata: serde_json::Value = serde_json::from_slice(&metadata)
            .map_err(|err| ArrayCreateError::InvalidMetadata(err.to_string()))?;
        if let Some(zarr_format) = metadata
            .get("zarr_format")
            .and_then(serde_json::Value::as_u64)
            .filter(|&zarr_format| zarr_format != 2)
        {
            return Err(ArrayCreateError::UnsupportedFormatVersion(zarr_format));
        }
        let metadata: ArrayMetadataV2 = serde_json::from_value(metadata)
            .map_err(|err| ArrayCreateError::InvalidMetadata(err.to_string()))?;

        let attributes = match storage.get(&meta_key_v2_attributes(&node_path)?)? {
            Some(attributes) => serde_json::from_slice(&attributes)
                .map_err(|err| ArrayCreateError::InvalidMetadata(err.to_string()))?,
            None => Attributes::default(),
        };

        Ok((metadata, attributes))
    }

    /// Read and decode the chunk at `chunk_indices` into its bytes if it exists.
    ///
    /// The chunk has the full chunk shape, including any elements beyond the array boundary.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk_if_exists(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Option<Vec<u8>>, ArrayError> {
        let Some(encoded_chunk) = self.retrieve_encoded_chunk(chunk_indices)? else {
            return Ok(None);
        };
        let mut chunk = Vec::with_capacity(self.chunk_size_bytes());
        self.decode_chunk_into(chunk_indices, Some(encoded_chunk.as_slice()), &mut chunk)?;
        Ok(Some(chunk))
    }

    /// Read and decode the chunk at `chunk_indices` into a vector of its elements if it exists.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the element type `T` does not match the data type or [`Array::retrieve_chunk_if_exists`] fails.
    pub fn retrieve_chunk_elements_if_exists<T: Element>(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Option<Vec<T>>, ArrayError> {
        T::validate_data_type(self.data_type())?;
        self.retrieve_chunk_if_exists(chunk_indices)?
            .map(|bytes| T::from_bytes(self.data_type(), &bytes))
            .transpose()
    }

    /// Read and decode the chunk at `chunk_indices` into its bytes.
    ///
    /// A chunk missing from the store is filled with the fill value.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk(&self, chunk_indices: &[u64]) -> Result<Vec<u8>, ArrayError> {
        let encoded_chunk = self.retrieve_encoded_chunk(chunk_indices)?;
        let mut chunk = Vec::with_capacity(self.chunk_size_bytes());
        self.decode_chunk_into(chunk_indices, encoded_chunk.as_deref(), &mut chunk)?;
        Ok(chunk)
    }

    /// Read and decode the chunk at `chunk_indices` into a vector of its elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the element type `T` does not match the data type or [`Array::retrieve_chunk`] fails.
    pub fn retrieve_chunk_elements<T: Element>(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Vec<T>, ArrayError> {
        T::validate_data_type(self.data_type())?;
        T::from_bytes(self.data_type(), &self.retrieve_chunk(chunk_indices)?)
    }

    #[cfg(feature = "ndarray")]
    /// Read and decode the chunk at `chunk_indices` into an [`ndarray::ArrayD`].
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the element type `T` does not match the data type or [`Array::retrieve_chunk`] fails.
    pub fn retrieve_chunk_ndarray<T: Element>(
        &self,
        chunk_indices: &[u64],
    ) -> Result<ndarray::ArrayD<T>, ArrayError> {
        let elements = self.retrieve_chunk_elements(chunk_indices)?;
        super::elements_to_ndarray(self.chunk_shape(), elements)
    }

    /// Read the encoded bytes of the chunk at `chunk_indices`.
    ///
    /// Returns [`None`] if the chunk is not stored.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `chunk_indices` are invalid or there is an underlying store error.
    pub fn retrieve_encoded_chunk(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Option<Vec<u8>>, ArrayError> {
        let key = self.chunk_key(chunk_indices)?;
        let encoded_chunk = self.storage.get(&key)?;
        log::trace!(
            "retrieved chunk {key} ({})",
            encoded_chunk
                .as_ref()
                .map_or("missing".to_string(), |bytes| format!("{} bytes", bytes.len()))
        );
        Ok(encoded_chunk.map(|bytes| bytes.to_vec()))
    }

    /// Read and decode the `array_subset` of the array into its bytes.
    ///
    /// The bytes are in memory order (dimension 0 varies fastest) in the native byte order.
    /// Elements within chunks missing from the store are the fill value.
    /// An empty `array_subset` returns an empty vector.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the `array_subset` dimensionality does not match the array dimensionality,
    ///  - the `array_subset` is out of bounds of the array,
    ///  - a chunk is corrupt,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_array_subset(&self, array_subset: &ArraySubset) -> Result<Vec<u8>, ArrayError> {
        self.validate_array_subset(array_subset)?;
        let Some(block_range) = self.chunk_grid.block_range(array_subset)? else {
            return Ok(Vec::new());
        };

        let element_size = self.data_type.size();
        let mut output =
            vec![0; super::to_usize(array_subset.num_elements()).saturating_mul(element_size)];
        let mut chunk = Vec::with_capacity(self.chunk_size_bytes());
        for chunk_indices in block_range.chunks().iter() {
            let key = self.chunk_key(&chunk_indices)?;
            let encoded_chunk = self.storage.get(&key)?;
            log::trace!(
                "retrieve_array_subset {array_subset}: chunk {key} {}",
                if encoded_chunk.is_some() { "read" } else { "missing" }
            );
            self.decode_chunk_into(&chunk_indices, encoded_chunk.as_deref(), &mut chunk)?;

            let ranges = self
                .chunk_grid
                .chunk_ranges(array_subset, &block_range, &chunk_indices);
            copy_array_subset(
                &chunk,
                self.chunk_shape(),
                ranges.chunk(),
                &mut output,
                array_subset.shape(),
                ranges.selection(),
                element_size,
            )?;
        }
        Ok(output)
    }

    /// Read and decode the `array_subset` of the array into a vector of its elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the element type `T` does not match the data type or [`Array::retrieve_array_subset`] fails.
    pub fn retrieve_array_subset_elements<T: Element>(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<Vec<T>, ArrayError> {
        T::validate_data_type(self.data_type())?;
        T::from_bytes(self.data_type(), &self.retrieve_array_subset(array_subset)?)
    }

    #[cfg(feature = "ndarray")]
    /// Read and decode the `array_subset` of the array into an [`ndarray::ArrayD`].
    ///
    /// The `ndarray` has the shape of `array_subset` and is indexed in the same order as the array.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the element type `T` does not match the data type or [`Array::retrieve_array_subset`] fails.
    pub fn retrieve_array_subset_ndarray<T: Element>(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<ndarray::ArrayD<T>, ArrayError> {
        let elements = self.retrieve_array_subset_elements(array_subset)?;
        super::elements_to_ndarray(array_subset.shape(), elements)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        array::{ArrayBuilder, ChunkInitialization, DataType},
        storage::{store::MemoryStore, StoreKey, WritableStorageTraits},
    };

    use super::*;

    fn array_4x4(store: &Arc<MemoryStore>) -> Array<MemoryStore> {
        let array = ArrayBuilder::new(vec![4, 4], DataType::UInt8)
            .chunk_shape(vec![2, 2])
            .fill_value(9u8)
            .chunk_initialization(ChunkInitialization::Lazy)
            .build(store.clone(), "/")
            .unwrap();
        // chunk [1, 0] holds elements [2..4, 0..2]
        store
            .set(&StoreKey::new("0.1").unwrap(), vec![0, 1, 2, 3].into())
            .unwrap();
        array
    }

    #[test]
    fn array_retrieve_array_subset() {
        let store = Arc::new(MemoryStore::new());
        let array = array_4x4(&store);

        let subset = ArraySubset::new_with_ranges(&[1..4, 0..2]);
        assert_eq!(
            array.retrieve_array_subset(&subset).unwrap(),
            vec![9, 0, 1, 9, 2, 3]
        );
        let elements = array
            .retrieve_array_subset_elements::<u8>(&array.subset_all())
            .unwrap();
        assert_eq!(elements.iter().filter(|&&e| e == 9).count(), 12);
        assert!(array
            .retrieve_array_subset_elements::<i8>(&subset)
            .is_err());
        assert!(array
            .retrieve_array_subset(&ArraySubset::new_with_ranges(&[1..1, 0..2]))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn array_retrieve_array_subset_out_of_bounds() {
        let store = Arc::new(MemoryStore::new());
        let array = array_4x4(&store);
        assert!(matches!(
            array.retrieve_array_subset(&ArraySubset::new_with_ranges(&[0..5, 0..2])),
            Err(ArrayError::OutOfBoundsSelection(_, _))
        ));
        assert!(matches!(
            array.retrieve_array_subset(&ArraySubset::new_with_ranges(&[0..4])),
            Err(ArrayError::IncompatibleDimensionality(_))
        ));
    }

    #[test]
    fn array_retrieve_chunk() {
        let store = Arc::new(MemoryStore::new());
        let array = array_4x4(&store);
        assert_eq!(array.retrieve_chunk(&[1, 0]).unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(array.retrieve_chunk(&[0, 0]).unwrap(), vec![9; 4]);
        assert_eq!(array.retrieve_chunk_if_exists(&[0, 0]).unwrap(), None);
        assert_eq!(
            array.retrieve_chunk_elements_if_exists::<u8>(&[1, 0]).unwrap(),
            Some(vec![0, 1, 2, 3])
        );
        assert_eq!(
            array.retrieve_encoded_chunk(&[1, 0]).unwrap(),
            Some(vec![0, 1, 2, 3])
        );
        assert!(matches!(
            array.retrieve_chunk(&[2, 0]),
            Err(ArrayError::InvalidChunkGridIndices(_))
        ));
    }

    #[test]
    fn array_retrieve_corrupt_chunk() {
        let store = Arc::new(MemoryStore::new());
        let array = array_4x4(&store);
        store
            .set(&StoreKey::new("1.1").unwrap(), vec![0, 1, 2].into())
            .unwrap();
        assert!(matches!(
            array.retrieve_array_subset(&array.subset_all()),
            Err(ArrayError::CorruptChunk(indices, 3, 4)) if indices == vec![1, 1]
        ));
    }

    #[test]
    fn array_open() {
        let store = Arc::new(MemoryStore::new());
        assert!(matches!(
            Array::open(store.clone(), "/"),
            Err(ArrayCreateError::MissingMetadata)
        ));

        let array = array_4x4(&store);
        let opened = Array::open(store.clone(), "/").unwrap();
        assert!(!opened.is_writable());
        assert_eq!(opened.metadata(), array.metadata());
        assert_eq!(
            opened.retrieve_array_subset(&opened.subset_all()).unwrap(),
            array.retrieve_array_subset(&array.subset_all()).unwrap()
        );
        assert!(Array::open_with_mode(store.clone(), "/", AccessMode::ReadWrite)
            .unwrap()
            .is_writable());

        store
            .set(&StoreKey::new(".zattrs").unwrap(), "[".into())
            .unwrap();
        assert!(matches!(
            Array::open(store.clone(), "/"),
            Err(ArrayCreateError::InvalidMetadata(_))
        ));
    }

    #[test]
    fn array_open_unsupported_format() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                &StoreKey::new(".zarray").unwrap(),
                r#"{"zarr_format": 3, "node_type": "array"}"#.into(),
            )
            .unwrap();
        assert!(matches!(
            Array::open(store.clone(), "/"),
            Err(ArrayCreateError::UnsupportedFormatVersion(3))
        ));

        store
            .set(
                &StoreKey::new(".zarray").unwrap(),
                r#"{"zarr_format": 2, "shape": [4], "chunks": [2], "dtype": "<c8", "compressor": null, "fill_value": 0, "order": "C", "filters": null}"#.into(),
            )
            .unwrap();
        assert!(matches!(
            Array::open(store.clone(), "/"),
            Err(ArrayCreateError::UnknownDataType(dtype)) if dtype == "<c8"
        ));
    }
}
