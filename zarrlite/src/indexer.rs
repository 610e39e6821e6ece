//! Index based array access.
//!
//! An array can be indexed by one [`Index`] per dimension:
//!  - a single index, such as `3u64`, selects one position and drops the dimension from the result,
//!  - a range, such as `2..5` or `2..=4`, selects a contiguous run of positions, and
//!  - the wildcard `..` selects every position of the dimension.
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # use std::sync::Arc;
//! use zarrlite::array::{ArrayBuilder, DataType};
//! use zarrlite::indexer::{Index, Indexed};
//! # let store = Arc::new(zarrlite::storage::store::MemoryStore::new());
//! let array = ArrayBuilder::new(vec![4, 6], DataType::UInt16)
//!     .chunk_shape(vec![2, 4])
//!     .build(store, "/array")?;
//! array.store_index(&[(1..3u64).into(), Index::All], Indexed::Element(5u16))?;
//! assert_eq!(array.index::<u16>(&[1u64.into(), 2u64.into()])?, Indexed::Element(5));
//! assert_eq!(
//!     array.index::<u16>(&[(0..4u64).into(), 0u64.into()])?,
//!     Indexed::Elements { shape: vec![4], elements: vec![0, 5, 5, 0] }
//! );
//! # Ok(())
//! # }
//! ```

use std::ops::{Range, RangeFull, RangeInclusive};

use crate::{
    array::{to_usize, Array, ArrayError, ArrayShape, Element},
    array_subset::{ArraySubset, IncompatibleDimensionalityError},
    storage::{ReadableStorageTraits, ReadableWritableStorageTraits},
};

/// An index into one dimension of an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Index {
    /// A single position. The dimension is dropped from the result.
    Single(u64),
    /// A contiguous range of positions.
    Range(Range<u64>),
    /// Every position of the dimension.
    All,
}

impl From<u64> for Index {
    fn from(index: u64) -> Self {
        Self::Single(index)
    }
}

impl From<Range<u64>> for Index {
    fn from(range: Range<u64>) -> Self {
        Self::Range(range)
    }
}

impl From<RangeInclusive<u64>> for Index {
    fn from(range: RangeInclusive<u64>) -> Self {
        let (start, end) = range.into_inner();
        Self::Range(start..end.saturating_add(1))
    }
}

impl From<RangeFull> for Index {
    fn from(_: RangeFull) -> Self {
        Self::All
    }
}

/// The elements selected by indexing an array.
#[derive(Debug, Clone, PartialEq)]
pub enum Indexed<T> {
    /// A single element, selected when every dimension is indexed by [`Index::Single`].
    Element(T),
    /// Elements in memory order (dimension 0 varies fastest).
    ///
    /// `shape` holds the length of each dimension indexed by a [`Index::Range`] or [`Index::All`], in dimension order.
    Elements {
        /// The shape of the elements.
        shape: ArrayShape,
        /// The elements.
        elements: Vec<T>,
    },
}

impl<T> Indexed<T> {
    /// Return the elements as a vector.
    #[must_use]
    pub fn into_elements(self) -> Vec<T> {
        match self {
            Self::Element(element) => vec![element],
            Self::Elements { elements, .. } => elements,
        }
    }
}

/// Return the array subset selected by `indices` in an array with `array_shape`.
///
/// The array subset is not checked against the bounds of the array.
///
/// # Errors
/// Returns an [`ArrayError`] if the number of indices does not match the dimensionality of the array or a range ends before it starts.
pub fn indices_to_array_subset(
    indices: &[Index],
    array_shape: &[u64],
) -> Result<ArraySubset, ArrayError> {
    if indices.len() != array_shape.len() {
        return Err(IncompatibleDimensionalityError::new(indices.len(), array_shape.len()).into());
    }
    let (start, end): (Vec<u64>, Vec<u64>) = std::iter::zip(indices, array_shape)
        .map(|(index, &length)| match index {
            Index::Single(index) => (*index, index.saturating_add(1)),
            Index::Range(range) => (range.start, range.end),
            Index::All => (0, length),
        })
        .unzip();
    Ok(ArraySubset::new_with_start_end_exc(start, end)?)
}

/// Return the shape of the result of indexing with `indices`, or [`None`] if every index is [`Index::Single`].
fn indexed_shape(indices: &[Index], array_subset: &ArraySubset) -> Option<ArrayShape> {
    if indices.iter().all(|index| matches!(index, Index::Single(_))) {
        None
    } else {
        Some(
            std::iter::zip(indices, array_subset.shape())
                .filter(|(index, _)| !matches!(index, Index::Single(_)))
                .map(|(_, &length)| length)
                .collect(),
        )
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits + 'static> Array<TStorage> {
    /// Read the elements selected by `indices`, one per dimension.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the number of indices does not match the dimensionality of the array,
    ///  - the selection is out of bounds, or
    ///  - [`Array::retrieve_array_subset_elements`] fails.
    pub fn index<T: Element>(&self, indices: &[Index]) -> Result<Indexed<T>, ArrayError> {
        let array_subset = indices_to_array_subset(indices, self.shape())?;
        let elements = self.retrieve_array_subset_elements::<T>(&array_subset)?;
        match indexed_shape(indices, &array_subset) {
            Some(shape) => Ok(Indexed::Elements { shape, elements }),
            None => elements
                .into_iter()
                .next()
                .map(Indexed::Element)
                .ok_or(ArrayError::ShapeMismatch(0, 1)),
        }
    }

    #[cfg(feature = "ndarray")]
    /// Read the elements selected by `indices` into an [`ndarray::ArrayD`].
    ///
    /// Dimensions indexed by [`Index::Single`] are dropped, so a single element is returned as a zero dimensional array.
    ///
    /// # Errors
    /// See [`Array::index`].
    pub fn index_ndarray<T: Element>(
        &self,
        indices: &[Index],
    ) -> Result<ndarray::ArrayD<T>, ArrayError> {
        let array_subset = indices_to_array_subset(indices, self.shape())?;
        let elements = self.retrieve_array_subset_elements::<T>(&array_subset)?;
        let shape = indexed_shape(indices, &array_subset).unwrap_or_default();
        crate::array::elements_to_ndarray(&shape, elements)
    }
}

impl<TStorage: ?Sized + ReadableWritableStorageTraits + 'static> Array<TStorage> {
    /// Store `value` to the elements selected by `indices`, one per dimension.
    ///
    /// An [`Indexed::Element`] is stored to every selected element.
    /// An [`Indexed::Elements`] must have the shape that [`Array::index`] returns for `indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the array is read only,
    ///  - the number of indices does not match the dimensionality of the array,
    ///  - the selection is out of bounds,
    ///  - the shape of `value` does not match the selection, or
    ///  - [`Array::store_array_subset_elements`] fails.
    pub fn store_index<T: Element>(
        &self,
        indices: &[Index],
        value: Indexed<T>,
    ) -> Result<(), ArrayError> {
        self.check_writable()?;
        let array_subset = indices_to_array_subset(indices, self.shape())?;
        match value {
            Indexed::Element(element) => self.fill_array_subset(&array_subset, element),
            Indexed::Elements { shape, elements } => {
                let expected_shape = indexed_shape(indices, &array_subset).unwrap_or_default();
                if shape != expected_shape {
                    return Err(ArrayError::InvalidDataShape(
                        shape.into_iter().map(to_usize).collect(),
                        expected_shape.into_iter().map(to_usize).collect(),
                    ));
                }
                self.store_array_subset_elements(&array_subset, &elements)
            }
        }
    }

    #[cfg(feature = "ndarray")]
    /// Store `value` to the elements selected by `indices`, one per dimension.
    ///
    /// # Errors
    /// See [`Array::store_index`].
    pub fn store_index_ndarray<T: Element>(
        &self,
        indices: &[Index],
        value: ndarray::ArrayViewD<'_, T>,
    ) -> Result<(), ArrayError> {
        let (shape, elements) = crate::array::ndarray_into_elements(&value);
        self.store_index(indices, Indexed::Elements { shape, elements })
    }
}
