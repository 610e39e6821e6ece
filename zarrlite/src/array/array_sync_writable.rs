use crate::{
    array_subset::ArraySubset,
    node::{meta_key_v2_array, meta_key_v2_attributes},
    storage::{
        Bytes, ReadableWritableStorageTraits, StorageError, StoreKey, WritableStorageTraits,
    },
};

use super::{copy_array_subset, Array, ArrayError, Element};

impl<TStorage: ?Sized + WritableStorageTraits + 'static> Array<TStorage> {
    /// Return [`ArrayError::ReadOnly`] if the array is read only.
    pub(crate) fn check_writable(&self) -> Result<(), ArrayError> {
        if self.is_writable() {
            Ok(())
        } else {
            Err(ArrayError::ReadOnly)
        }
    }

    fn store_json<T: serde::Serialize>(&self, key: StoreKey, value: &T) -> Result<(), ArrayError> {
        self.check_writable()?;
        let json = serde_json::to_vec_pretty(value)
            .map_err(|err| StorageError::InvalidMetadata(key.clone(), err.to_string()))?;
        self.storage.set(&key, json.into())?;
        Ok(())
    }

    /// Store metadata (`.zarray`).
    ///
    /// # Errors
    /// Returns [`ArrayError::ReadOnly`] if the array is read only, or an [`ArrayError::StorageError`] if there is an underlying store error.
    pub fn store_metadata(&self) -> Result<(), ArrayError> {
        self.store_json(meta_key_v2_array(self.path())?, self.metadata())
    }

    /// Store attributes (`.zattrs`).
    ///
    /// # Errors
    /// Returns [`ArrayError::ReadOnly`] if the array is read only, or an [`ArrayError::StorageError`] if there is an underlying store error.
    pub fn store_attributes(&self) -> Result<(), ArrayError> {
        self.store_json(meta_key_v2_attributes(self.path())?, self.attributes())
    }

    /// Encode `chunk_bytes` and store at `chunk_indices`.
    ///
    /// `chunk_bytes` are the elements of the full chunk shape in memory order and native byte order.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the array is read only,
    ///  - `chunk_indices` are invalid,
    ///  - the length of `chunk_bytes` is not equal to the expected length (the product of the number of elements in the chunk and the data type size in bytes),
    ///  - there is a codec encoding error, or
    ///  - an underlying store error.
    pub fn store_chunk(&self, chunk_indices: &[u64], chunk_bytes: &[u8]) -> Result<(), ArrayError> {
        self.check_writable()?;
        let key = self.chunk_key(chunk_indices)?;
        if chunk_bytes.len() != self.chunk_size_bytes() {
            return Err(ArrayError::InvalidBytesLength(
                chunk_bytes.len(),
                self.chunk_size_bytes(),
            ));
        }
        let mut chunk = chunk_bytes.to_vec();
        let encoded_chunk = self.encode_chunk(&mut chunk)?;

        let mutex = self
            .chunk_locks
            .as_ref()
            .map(|locks| locks.mutex(chunk_indices));
        let _guard = mutex.as_ref().map(|mutex| mutex.lock());
        log::trace!("store_chunk: {key} ({} bytes)", encoded_chunk.len());
        self.storage.set(&key, Bytes::from(encoded_chunk))?;
        Ok(())
    }

    /// Encode `chunk_elements` and store at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the element type `T` does not match the data type or [`Array::store_chunk`] fails.
    pub fn store_chunk_elements<T: Element>(
        &self,
        chunk_indices: &[u64],
        chunk_elements: &[T],
    ) -> Result<(), ArrayError> {
        self.check_writable()?;
        let chunk_bytes = T::into_bytes(self.data_type(), chunk_elements)?;
        self.store_chunk(chunk_indices, &chunk_bytes)
    }

    /// Erase the chunk at `chunk_indices`.
    ///
    /// Succeeds if the chunk does not exist.
    /// An erased chunk reads as the fill value.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the array is read only, `chunk_indices` are invalid, or there is an underlying store error.
    pub fn erase_chunk(&self, chunk_indices: &[u64]) -> Result<(), ArrayError> {
        self.check_writable()?;
        let key = self.chunk_key(chunk_indices)?;
        log::trace!("erase_chunk: {key}");
        self.storage.erase(&key)?;
        Ok(())
    }
}

impl<TStorage: ?Sized + ReadableWritableStorageTraits + 'static> Array<TStorage> {
    /// Encode `subset_bytes` and store in `array_subset`.
    ///
    /// `subset_bytes` are the elements of `array_subset` in memory order (dimension 0 varies fastest) and native byte order.
    ///
    /// Each chunk intersecting `array_subset` is rewritten.
    /// A chunk that is only partially covered by `array_subset` is retrieved and updated before it is stored.
    /// If a chunk fails to store, chunks stored before it are not restored.
    /// An empty `array_subset` stores nothing.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the array is read only,
    ///  - the dimensionality of `array_subset` does not match the chunk grid dimensionality,
    ///  - `array_subset` is out of bounds of the array,
    ///  - `subset_bytes` holds a different number of elements than `array_subset` ([`ArrayError::ShapeMismatch`]),
    ///  - the length of `subset_bytes` is not a multiple of the data type size ([`ArrayError::InvalidBytesLength`]),
    ///  - a partially covered chunk is corrupt,
    ///  - there is a codec encoding or decoding error, or
    ///  - an underlying store error.
    pub fn store_array_subset(
        &self,
        array_subset: &ArraySubset,
        subset_bytes: &[u8],
    ) -> Result<(), ArrayError> {
        self.check_writable()?;
        self.validate_array_subset(array_subset)?;
        let element_size = self.data_type().size();
        let expected_length =
            super::to_usize(array_subset.num_elements()).saturating_mul(element_size);
        if subset_bytes.len() != expected_length {
            return Err(if subset_bytes.len() % element_size == 0 {
                ArrayError::ShapeMismatch(
                    (subset_bytes.len() / element_size) as u64,
                    array_subset.num_elements(),
                )
            } else {
                ArrayError::InvalidBytesLength(subset_bytes.len(), expected_length)
            });
        }
        let Some(block_range) = self.chunk_grid.block_range(array_subset)? else {
            return Ok(());
        };

        let chunk_num_elements = self.chunk_grid.chunk_num_elements();
        let chunk_size = self.chunk_size_bytes();
        let mut chunk = Vec::with_capacity(chunk_size);
        for chunk_indices in block_range.chunks().iter() {
            let key = self.chunk_key(&chunk_indices)?;
            let ranges = self
                .chunk_grid
                .chunk_ranges(array_subset, &block_range, &chunk_indices);

            let mutex = self
                .chunk_locks
                .as_ref()
                .map(|locks| locks.mutex(&chunk_indices));
            let _guard = mutex.as_ref().map(|mutex| mutex.lock());

            if ranges.fully_covered() {
                chunk.resize(chunk_size, 0);
                if ranges.chunk().num_elements() != chunk_num_elements {
                    // Elements beyond the array boundary
                    self.fill_value().fill(&mut chunk);
                }
            } else {
                let encoded_chunk = self.storage.get(&key)?;
                self.decode_chunk_into(&chunk_indices, encoded_chunk.as_deref(), &mut chunk)?;
            }
            copy_array_subset(
                subset_bytes,
                array_subset.shape(),
                ranges.selection(),
                &mut chunk,
                self.chunk_shape(),
                ranges.chunk(),
                element_size,
            )?;

            let encoded_chunk = self.encode_chunk(&mut chunk)?;
            log::trace!(
                "store_array_subset {array_subset}: chunk {key} {} ({} bytes)",
                if ranges.fully_covered() { "replaced" } else { "updated" },
                encoded_chunk.len()
            );
            self.storage.set(&key, Bytes::from(encoded_chunk))?;
        }
        Ok(())
    }

    /// Encode `subset_elements` and store in `array_subset`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the element type `T` does not match the data type,
    ///  - the number of elements does not match the number of elements in `array_subset`, or
    ///  - [`Array::store_array_subset`] fails.
    pub fn store_array_subset_elements<T: Element>(
        &self,
        array_subset: &ArraySubset,
        subset_elements: &[T],
    ) -> Result<(), ArrayError> {
        self.check_writable()?;
        T::validate_data_type(self.data_type())?;
        if subset_elements.len() as u64 != array_subset.num_elements() {
            return Err(ArrayError::ShapeMismatch(
                subset_elements.len() as u64,
                array_subset.num_elements(),
            ));
        }
        let subset_bytes = T::into_bytes(self.data_type(), subset_elements)?;
        self.store_array_subset(array_subset, &subset_bytes)
    }

    #[cfg(feature = "ndarray")]
    /// Encode `subset_array` and store in the array subset starting at `subset_start`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the dimensionality of `subset_start` does not match the dimensionality of `subset_array`, or
    ///  - [`Array::store_array_subset_elements`] fails.
    pub fn store_array_subset_ndarray<T: Element>(
        &self,
        subset_start: &[u64],
        subset_array: ndarray::ArrayViewD<'_, T>,
    ) -> Result<(), ArrayError> {
        self.check_writable()?;
        let (shape, elements) = super::ndarray_into_elements(&subset_array);
        let array_subset = ArraySubset::new_with_start_shape(subset_start.to_vec(), shape)?;
        self.store_array_subset_elements(&array_subset, &elements)
    }

    /// Store `element` to every element of `array_subset`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the element type `T` does not match the data type or [`Array::store_array_subset`] fails.
    pub fn fill_array_subset<T: Element>(
        &self,
        array_subset: &ArraySubset,
        element: T,
    ) -> Result<(), ArrayError> {
        self.check_writable()?;
        let element_bytes = T::into_bytes(self.data_type(), std::slice::from_ref(&element))?;
        let subset_bytes = element_bytes.repeat(super::to_usize(array_subset.num_elements()));
        self.store_array_subset(array_subset, &subset_bytes)
    }
}
