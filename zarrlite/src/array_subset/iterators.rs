//! Array subset iterators.
//!
//! The iterators are:
//!  - [`Indices`]: iterate over the multidimensional indices of the elements in the subset.
//!  - [`ContiguousLinearisedIndices`]: iterate over contiguous runs of elements in the subset with the start a linearised index.
//!
//! These can be created with [`indices`](super::ArraySubset::indices) and
//! [`contiguous_linearised_indices`](super::ArraySubset::contiguous_linearised_indices).

use std::iter::FusedIterator;
use std::ops::Range;

use super::{ArraySubset, IncompatibleArraySubsetAndShapeError};
use crate::array::{ravel_indices, ArrayIndices, ArrayShape};

/// An iterator over the indices in an array subset.
///
/// Iterates in lexicographic order: the last dimension varies fastest.
/// For example, a subset `[1..3, 1..3]` produces `[1, 1]`, `[1, 2]`, `[2, 1]`, `[2, 2]`.
#[derive(Clone)]
pub struct Indices {
    subset: ArraySubset,
    range: Range<u64>,
}

impl Indices {
    /// Create a new indices struct.
    #[must_use]
    pub fn new(subset: ArraySubset) -> Self {
        let range = 0..subset.num_elements();
        Self { subset, range }
    }

    /// Return the number of indices.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.range.end - self.range.start
    }

    /// Returns true if the number of indices is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create a new serial iterator.
    #[must_use]
    pub fn iter(&self) -> IndicesIterator<'_> {
        IndicesIterator {
            subset: &self.subset,
            range: self.range.clone(),
        }
    }
}

impl<'a> IntoIterator for &'a Indices {
    type Item = ArrayIndices;
    type IntoIter = IndicesIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Indices {
    type Item = ArrayIndices;
    type IntoIter = IndicesIntoIterator;

    fn into_iter(self) -> Self::IntoIter {
        IndicesIntoIterator {
            subset: self.subset,
            range: self.range,
        }
    }
}

/// Unravel a lexicographic linearised index within `subset`.
fn unravel_lexicographic(mut index: u64, subset: &ArraySubset) -> ArrayIndices {
    let mut indices = vec![0; subset.dimensionality()];
    for (indices_i, &start, &dim) in itertools::izip!(
        indices.iter_mut().rev(),
        subset.start().iter().rev(),
        subset.shape().iter().rev()
    ) {
        *indices_i = start + index % dim;
        index /= dim;
    }
    indices
}

/// Serial indices iterator.
///
/// See [`Indices`].
pub struct IndicesIterator<'a> {
    subset: &'a ArraySubset,
    range: Range<u64>,
}

impl Iterator for IndicesIterator<'_> {
    type Item = ArrayIndices;

    fn next(&mut self) -> Option<Self::Item> {
        self.range
            .next()
            .map(|index| unravel_lexicographic(index, self.subset))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl DoubleEndedIterator for IndicesIterator<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.range
            .next_back()
            .map(|index| unravel_lexicographic(index, self.subset))
    }
}

impl FusedIterator for IndicesIterator<'_> {}

/// Serial indices iterator which owns its subset.
///
/// See [`Indices`].
pub struct IndicesIntoIterator {
    subset: ArraySubset,
    range: Range<u64>,
}

impl Iterator for IndicesIntoIterator {
    type Item = ArrayIndices;

    fn next(&mut self) -> Option<Self::Item> {
        self.range
            .next()
            .map(|index| unravel_lexicographic(index, &self.subset))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl DoubleEndedIterator for IndicesIntoIterator {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.range
            .next_back()
            .map(|index| unravel_lexicographic(index, &self.subset))
    }
}

impl FusedIterator for IndicesIntoIterator {}

/// Iterates over contiguous runs of elements of an array subset within an array.
///
/// The array is linearised in memory order (dimension 0 varies fastest).
/// The iterator item is a (linearised index, number of elements) tuple.
/// Leading dimensions that the subset spans entirely are merged into a single run.
pub struct ContiguousLinearisedIndices {
    outer: Indices,
    array_shape: ArrayShape,
    contiguous_elements: u64,
}

impl ContiguousLinearisedIndices {
    /// Create a new contiguous linearised indices iterator.
    ///
    /// # Errors
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if `array_shape` does not encapsulate `subset`.
    pub fn new(
        subset: &ArraySubset,
        array_shape: ArrayShape,
    ) -> Result<Self, IncompatibleArraySubsetAndShapeError> {
        let merged_dims = Self::merged_dims(subset, &array_shape);
        Self::new_with_merged_dims(subset, array_shape, merged_dims)
    }

    /// Return the number of leading dimensions of `subset` which are entirely spanned within `array_shape`.
    #[must_use]
    pub fn merged_dims(subset: &ArraySubset, array_shape: &[u64]) -> usize {
        std::iter::zip(subset.shape(), array_shape)
            .take_while(|(subset_shape, array_shape)| subset_shape == array_shape)
            .count()
    }

    /// Create a new contiguous linearised indices iterator merging at most `merged_dims` leading dimensions.
    ///
    /// Two iterators over equally shaped subsets in differently shaped arrays produce runs of equal length if they are created with the same `merged_dims`.
    ///
    /// # Errors
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if `array_shape` does not encapsulate `subset` or more dimensions are merged than are spanned.
    pub fn new_with_merged_dims(
        subset: &ArraySubset,
        array_shape: ArrayShape,
        merged_dims: usize,
    ) -> Result<Self, IncompatibleArraySubsetAndShapeError> {
        if !subset.inbounds_shape(&array_shape)
            || merged_dims > Self::merged_dims(subset, &array_shape)
        {
            return Err(IncompatibleArraySubsetAndShapeError(
                subset.clone(),
                array_shape,
            ));
        }

        // The run spans the merged dimensions and the first unmerged dimension
        let run_dims = std::cmp::min(merged_dims + 1, subset.dimensionality());
        let contiguous_elements = subset.shape()[..run_dims].iter().product();
        let mut outer_shape = subset.shape().to_vec();
        if !subset.is_empty() {
            outer_shape[..run_dims].fill(1);
        }
        let outer = ArraySubset::new_with_start_shape(subset.start().to_vec(), outer_shape)
            .map_err(|_| IncompatibleArraySubsetAndShapeError(subset.clone(), array_shape.clone()))?;
        Ok(Self {
            outer: outer.indices(),
            array_shape,
            contiguous_elements,
        })
    }

    /// Return the number of elements in each contiguous run.
    #[must_use]
    pub fn contiguous_elements(&self) -> u64 {
        self.contiguous_elements
    }

    /// Return the number of contiguous runs.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.outer.len()
    }

    /// Returns true if there are no contiguous runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outer.is_empty()
    }

    /// Create a new serial iterator.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.outer.iter().map(|indices| {
            (
                ravel_indices(&indices, &self.array_shape),
                self.contiguous_elements,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_subset_iter_indices() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 1..3]);
        let indices = subset.indices();

        let mut iter = indices.iter();
        assert_eq!(iter.size_hint(), (4, Some(4)));
        assert_eq!(iter.next(), Some(vec![1, 1]));
        assert_eq!(iter.next_back(), Some(vec![2, 2]));
        assert_eq!(iter.next(), Some(vec![1, 2]));
        assert_eq!(iter.next(), Some(vec![2, 1]));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);

        let expected = vec![vec![1, 1], vec![1, 2], vec![2, 1], vec![2, 2]];
        assert_eq!(indices.iter().collect::<Vec<_>>(), expected);
        assert_eq!(indices.clone().into_iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn array_subset_iter_indices_empty() {
        let subset = ArraySubset::new_with_ranges(&[1..1, 1..3]);
        assert!(subset.indices().is_empty());
        assert_eq!(subset.indices().into_iter().next(), None);
    }

    #[test]
    fn array_subset_iter_contiguous_linearised_indices() {
        // Memory order, dimension 0 fastest, shape [4, 4]
        //  0  4  8 12
        //  1  5  9 13
        //  2  6 10 14
        //  3  7 11 15
        let subset = ArraySubset::new_with_ranges(&[1..3, 1..3]);
        assert!(subset.contiguous_linearised_indices(&[4, 4, 4]).is_err());
        assert!(subset.contiguous_linearised_indices(&[2, 4]).is_err());
        let indices = subset.contiguous_linearised_indices(&[4, 4]).unwrap();
        assert_eq!(indices.len(), 2);
        assert_eq!(indices.iter().collect::<Vec<_>>(), vec![(5, 2), (9, 2)]);

        let subset = ArraySubset::new_with_ranges(&[0..4, 1..3]);
        let indices = subset.contiguous_linearised_indices(&[4, 4]).unwrap();
        assert_eq!(indices.iter().collect::<Vec<_>>(), vec![(4, 8)]);

        let indices =
            ContiguousLinearisedIndices::new_with_merged_dims(&subset, vec![4, 4], 0).unwrap();
        assert_eq!(indices.iter().collect::<Vec<_>>(), vec![(4, 4), (8, 4)]);
        assert!(ContiguousLinearisedIndices::new_with_merged_dims(&subset, vec![4, 4], 2).is_err());

        let subset = ArraySubset::new_with_ranges(&[0..4, 0..4]);
        let indices = subset.contiguous_linearised_indices(&[4, 4]).unwrap();
        assert_eq!(indices.iter().collect::<Vec<_>>(), vec![(0, 16)]);
    }
}
