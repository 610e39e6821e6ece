//! The regular chunk grid and chunk index translation.
//!
//! A [`RegularChunkGrid`] partitions an array into chunks of equal shape.
//! Chunks on the upper boundary of the array may extend beyond it.
//!
//! Given a selection ([`ArraySubset`]), the grid computes:
//!  - the [`BlockRange`] of chunks that intersect the selection, and
//!  - for each chunk in the block range, the [`ChunkRanges`] pairing the region of the chunk with the region of the selection buffer it maps to.
//!
//! The chunk ranges of every chunk in a block range partition the selection exactly.

use itertools::izip;
use thiserror::Error;

use crate::{
    array::{ArrayIndices, ArrayShape, ChunkShape},
    array_subset::{iterators::Indices, ArraySubset, IncompatibleDimensionalityError},
};

/// A regular chunk grid.
#[allow(clippy::struct_field_names)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularChunkGrid {
    array_shape: ArrayShape,
    grid_shape: ArrayShape,
    chunk_shape: ChunkShape,
}

/// A [`RegularChunkGrid`] creation error.
#[derive(Clone, Debug, Error)]
#[error("regular chunk shape {_1:?} not compatible with array shape {_0:?}")]
pub struct RegularChunkGridCreateError(ArrayShape, ChunkShape);

impl RegularChunkGrid {
    /// Create a new regular chunk grid with chunk shape `chunk_shape`.
    ///
    /// # Errors
    /// Returns a [`RegularChunkGridCreateError`] if the dimensionality of `array_shape` and `chunk_shape` differ, if they are zero dimensional, if any chunk or array dimension is zero, or if the number of elements in a chunk exceeds [`u64::MAX`].
    pub fn new(
        array_shape: ArrayShape,
        chunk_shape: ChunkShape,
    ) -> Result<Self, RegularChunkGridCreateError> {
        if array_shape.len() != chunk_shape.len()
            || array_shape.is_empty()
            || array_shape.contains(&0)
            || chunk_shape.contains(&0)
            || chunk_shape
                .iter()
                .try_fold(1u64, |acc, &size| acc.checked_mul(size))
                .is_none()
        {
            return Err(RegularChunkGridCreateError(array_shape, chunk_shape));
        }

        let grid_shape = std::iter::zip(&array_shape, &chunk_shape)
            .map(|(a, c)| a.div_ceil(*c))
            .collect();
        Ok(Self {
            array_shape,
            grid_shape,
            chunk_shape,
        })
    }

    /// Return the dimensionality of the grid.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.chunk_shape.len()
    }

    /// Return the array shape.
    #[must_use]
    pub fn array_shape(&self) -> &[u64] {
        &self.array_shape
    }

    /// Return the chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &[u64] {
        &self.chunk_shape
    }

    /// Return the number of chunks along each dimension, `ceil(array_shape / chunk_shape)`.
    #[must_use]
    pub fn grid_shape(&self) -> &[u64] {
        &self.grid_shape
    }

    /// Return the number of elements in a chunk.
    #[must_use]
    pub fn chunk_num_elements(&self) -> u64 {
        self.chunk_shape.iter().product()
    }

    /// Returns true if `chunk_indices` identifies a chunk within the grid.
    #[must_use]
    pub fn contains(&self, chunk_indices: &[u64]) -> bool {
        chunk_indices.len() == self.dimensionality()
            && std::iter::zip(chunk_indices, &self.grid_shape).all(|(i, g)| i < g)
    }

    /// Return the origin (first element) of the chunk at `chunk_indices`.
    ///
    /// Returns [`None`] if `chunk_indices` is outside the grid.
    #[must_use]
    pub fn chunk_origin(&self, chunk_indices: &[u64]) -> Option<ArrayIndices> {
        self.contains(chunk_indices).then(|| {
            std::iter::zip(chunk_indices, &self.chunk_shape)
                .map(|(i, c)| i * c)
                .collect()
        })
    }

    /// Return the array subset of the chunk at `chunk_indices`.
    ///
    /// The subset of a chunk on the upper boundary of the array may extend beyond the array.
    /// Returns [`None`] if `chunk_indices` is outside the grid.
    #[must_use]
    pub fn subset(&self, chunk_indices: &[u64]) -> Option<ArraySubset> {
        let origin = self.chunk_origin(chunk_indices)?;
        ArraySubset::new_with_start_shape(origin, self.chunk_shape.clone()).ok()
    }

    /// Return the array subset of the chunk at `chunk_indices` clipped to the array bounds.
    ///
    /// Returns [`None`] if `chunk_indices` is outside the grid.
    #[must_use]
    pub fn subset_bounded(&self, chunk_indices: &[u64]) -> Option<ArraySubset> {
        let subset = self.subset(chunk_indices)?;
        subset
            .overlap(&ArraySubset::new_with_shape(self.array_shape.clone()))
            .ok()
    }

    /// Return the chunks in the grid.
    #[must_use]
    pub fn chunks(&self) -> Indices {
        ArraySubset::new_with_shape(self.grid_shape.clone()).indices()
    }

    /// Return the range of chunks intersecting `selection`.
    ///
    /// Along each dimension the range spans `floor(lo / c)` to `floor(hi / c)`, where `lo` and `hi` are the inclusive bounds of the selection.
    /// Returns [`None`] if `selection` is empty.
    /// The caller is responsible for checking that `selection` is within the bounds of the array.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `selection` does not match the grid.
    pub fn block_range(
        &self,
        selection: &ArraySubset,
    ) -> Result<Option<BlockRange>, IncompatibleDimensionalityError> {
        if selection.dimensionality() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                selection.dimensionality(),
                self.dimensionality(),
            ));
        }
        let Some(end_inc) = selection.end_inc() else {
            return Ok(None);
        };
        let first = std::iter::zip(selection.start(), &self.chunk_shape)
            .map(|(lo, c)| lo / c)
            .collect();
        let last = std::iter::zip(&end_inc, &self.chunk_shape)
            .map(|(hi, c)| hi / c)
            .collect();
        Ok(Some(BlockRange { first, last }))
    }

    /// Return the ranges of the chunk at `chunk_indices` and of the `selection` buffer that correspond.
    ///
    /// Along each dimension `d` with chunk size `c`:
    ///  - the chunk range starts at `lo mod c` in the first chunk of the block range and at `0` otherwise,
    ///  - the chunk range ends at `hi mod c` in the last chunk of the block range and at `c - 1` otherwise, and
    ///  - the selection range starts at `chunk_indices[d] * c + start - lo`.
    ///
    /// `block_range` must be the block range of `selection` and contain `chunk_indices`.
    #[must_use]
    pub fn chunk_ranges(
        &self,
        selection: &ArraySubset,
        block_range: &BlockRange,
        chunk_indices: &[u64],
    ) -> ChunkRanges {
        debug_assert!(block_range.contains(chunk_indices));
        let end_inc = selection.end_inc().unwrap_or_default();
        let mut chunk_start = Vec::with_capacity(self.dimensionality());
        let mut selection_start = Vec::with_capacity(self.dimensionality());
        let mut shape = Vec::with_capacity(self.dimensionality());
        let mut fully_covered = true;
        for (&index, &lo, &hi, &c, &a, &first, &last) in izip!(
            chunk_indices,
            selection.start(),
            &end_inc,
            &self.chunk_shape,
            &self.array_shape,
            &block_range.first,
            &block_range.last,
        ) {
            let source_start = if index == first { lo % c } else { 0 };
            let source_end = if index == last { hi % c } else { c - 1 };
            let origin = index * c;
            chunk_start.push(source_start);
            selection_start.push(origin + source_start - lo);
            shape.push(source_end - source_start + 1);
            fully_covered &=
                source_start == 0 && origin + source_end + 1 >= std::cmp::min(origin + c, a);
        }
        ChunkRanges {
            chunk: ArraySubset::new_with_start_shape(chunk_start, shape.clone())
                .unwrap_or_default(),
            selection: ArraySubset::new_with_start_shape(selection_start, shape)
                .unwrap_or_default(),
            fully_covered,
        }
    }
}

/// The range of chunks intersecting a selection.
///
/// The cartesian product across dimensions of `first[d]..=last[d]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockRange {
    first: ArrayIndices,
    last: ArrayIndices,
}

impl BlockRange {
    /// Return the indices of the first chunk.
    #[must_use]
    pub fn first(&self) -> &[u64] {
        &self.first
    }

    /// Return the indices of the last chunk.
    #[must_use]
    pub fn last(&self) -> &[u64] {
        &self.last
    }

    /// Returns true if the block range contains the chunk at `chunk_indices`.
    #[must_use]
    pub fn contains(&self, chunk_indices: &[u64]) -> bool {
        chunk_indices.len() == self.first.len()
            && izip!(chunk_indices, &self.first, &self.last).all(|(i, f, l)| f <= i && i <= l)
    }

    /// Return the number of chunks in the block range.
    #[must_use]
    pub fn num_chunks(&self) -> u64 {
        std::iter::zip(&self.first, &self.last)
            .map(|(f, l)| l - f + 1)
            .product()
    }

    /// Return the block range as an [`ArraySubset`] of the chunk grid.
    #[must_use]
    pub fn to_subset(&self) -> ArraySubset {
        ArraySubset::from(
            std::iter::zip(&self.first, &self.last).map(|(&first, &last)| first..last + 1),
        )
    }

    /// Return an iterator over the chunk indices in the block range.
    ///
    /// Chunks are visited in lexicographic order (the first dimension is the most significant).
    #[must_use]
    pub fn chunks(&self) -> Indices {
        self.to_subset().indices()
    }
}

/// Corresponding ranges of a chunk and of a selection buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkRanges {
    chunk: ArraySubset,
    selection: ArraySubset,
    fully_covered: bool,
}

impl ChunkRanges {
    /// The region of the chunk, relative to the chunk origin.
    #[must_use]
    pub fn chunk(&self) -> &ArraySubset {
        &self.chunk
    }

    /// The region of the selection buffer, relative to the selection start.
    #[must_use]
    pub fn selection(&self) -> &ArraySubset {
        &self.selection
    }

    /// Returns true if the selection covers every element of the chunk that is inside the array.
    ///
    /// A fully covered chunk can be written without reading it first.
    #[must_use]
    pub fn fully_covered(&self) -> bool {
        self.fully_covered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_grid_regular() {
        let chunk_grid = RegularChunkGrid::new(vec![5, 7, 52], vec![1, 2, 3]).unwrap();
        assert_eq!(chunk_grid.dimensionality(), 3);
        assert_eq!(chunk_grid.grid_shape(), &[5, 4, 18]);
        assert_eq!(chunk_grid.chunk_num_elements(), 6);
        assert_eq!(chunk_grid.chunk_origin(&[1, 1, 1]), Some(vec![1, 2, 3]));
        assert_eq!(chunk_grid.chunk_origin(&[5, 0, 0]), None);
        assert_eq!(
            chunk_grid.subset(&[4, 3, 17]),
            Some(ArraySubset::new_with_ranges(&[4..5, 6..8, 51..54]))
        );
        assert_eq!(
            chunk_grid.subset_bounded(&[4, 3, 17]),
            Some(ArraySubset::new_with_ranges(&[4..5, 6..7, 51..52]))
        );
        assert_eq!(chunk_grid.chunks().len(), 5 * 4 * 18);
    }

    #[test]
    fn chunk_grid_regular_invalid() {
        assert!(RegularChunkGrid::new(vec![5, 7], vec![1, 2, 3]).is_err());
        assert!(RegularChunkGrid::new(vec![5, 7], vec![1, 0]).is_err());
        assert!(RegularChunkGrid::new(vec![5, 0], vec![1, 2]).is_err());
        assert!(RegularChunkGrid::new(vec![], vec![]).is_err());
        assert!(RegularChunkGrid::new(vec![10, 10], vec![1 << 32, 1 << 32]).is_err());
        assert!(RegularChunkGrid::new(vec![10, 10], vec![1 << 32, 1 << 31]).is_ok());
    }

    #[test]
    fn block_range() {
        let chunk_grid = RegularChunkGrid::new(vec![10, 10], vec![3, 4]).unwrap();
        let selection = ArraySubset::new_with_ranges(&[2..9, 4..5]);
        let block_range = chunk_grid.block_range(&selection).unwrap().unwrap();
        assert_eq!(block_range.first(), &[0, 1]);
        assert_eq!(block_range.last(), &[2, 1]);
        assert_eq!(block_range.num_chunks(), 3);
        assert_eq!(
            block_range.chunks().into_iter().collect::<Vec<_>>(),
            vec![vec![0, 1], vec![1, 1], vec![2, 1]]
        );
        assert!(chunk_grid
            .block_range(&ArraySubset::new_with_ranges(&[2..2, 4..5]))
            .unwrap()
            .is_none());
        assert!(chunk_grid
            .block_range(&ArraySubset::new_with_ranges(&[2..3]))
            .is_err());
    }

    #[test]
    fn chunk_ranges_single_chunk() {
        let chunk_grid = RegularChunkGrid::new(vec![10], vec![5]).unwrap();
        let selection = ArraySubset::new_with_ranges(&[6..9]);
        let block_range = chunk_grid.block_range(&selection).unwrap().unwrap();
        assert_eq!(block_range.first(), block_range.last());
        let ranges = chunk_grid.chunk_ranges(&selection, &block_range, &[1]);
        assert_eq!(ranges.chunk(), &ArraySubset::new_with_ranges(&[1..4]));
        assert_eq!(ranges.selection(), &ArraySubset::new_with_ranges(&[0..3]));
        assert!(!ranges.fully_covered());
    }

    #[test]
    fn chunk_ranges_multiple_chunks() {
        let chunk_grid = RegularChunkGrid::new(vec![4, 4], vec![2, 2]).unwrap();
        let selection = ArraySubset::new_with_ranges(&[1..3, 1..3]);
        let block_range = chunk_grid.block_range(&selection).unwrap().unwrap();
        assert_eq!(block_range.num_chunks(), 4);
        let ranges = block_range
            .chunks()
            .into_iter()
            .map(|chunk_indices| chunk_grid.chunk_ranges(&selection, &block_range, &chunk_indices))
            .collect::<Vec<_>>();
        assert_eq!(
            ranges[0].chunk(),
            &ArraySubset::new_with_ranges(&[1..2, 1..2])
        );
        assert_eq!(
            ranges[0].selection(),
            &ArraySubset::new_with_ranges(&[0..1, 0..1])
        );
        assert_eq!(
            ranges[3].chunk(),
            &ArraySubset::new_with_ranges(&[0..1, 0..1])
        );
        assert_eq!(
            ranges[3].selection(),
            &ArraySubset::new_with_ranges(&[1..2, 1..2])
        );
        assert!(ranges.iter().all(|ranges| !ranges.fully_covered()));
    }

    #[test]
    fn chunk_ranges_fully_covered_edge() {
        // The last chunk holds one element inside the array
        let chunk_grid = RegularChunkGrid::new(vec![10], vec![3]).unwrap();
        let selection = ArraySubset::new_with_ranges(&[3..10]);
        let block_range = chunk_grid.block_range(&selection).unwrap().unwrap();
        let covered = block_range
            .chunks()
            .into_iter()
            .map(|chunk_indices| {
                chunk_grid
                    .chunk_ranges(&selection, &block_range, &chunk_indices)
                    .fully_covered()
            })
            .collect::<Vec<_>>();
        assert_eq!(covered, vec![true, true, true]);

        let ranges = chunk_grid.chunk_ranges(&selection, &block_range, &[3]);
        assert_eq!(ranges.chunk(), &ArraySubset::new_with_ranges(&[0..1]));
        assert_eq!(ranges.selection(), &ArraySubset::new_with_ranges(&[6..7]));

        let selection = ArraySubset::new_with_ranges(&[4..10]);
        let block_range = chunk_grid.block_range(&selection).unwrap().unwrap();
        assert!(!chunk_grid
            .chunk_ranges(&selection, &block_range, &[1])
            .fully_covered());
        assert!(chunk_grid
            .chunk_ranges(&selection, &block_range, &[2])
            .fully_covered());
    }
}
