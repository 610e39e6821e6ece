//! The Zarr V2 chunk key encoding.

use itertools::Itertools;

pub use crate::metadata::v2::ChunkKeySeparator;

/// The Zarr V2 chunk key encoding.
///
/// The key of a chunk is formed by joining the ASCII decimal representation of its chunk grid indices with the separator.
/// Indices are written in the reverse of the in-memory dimension order, matching the `shape` and `chunks` of `.zarray`.
/// For example, the chunk at in-memory indices `[1, 23, 45]` has the key `45.23.1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct V2ChunkKeyEncoding {
    separator: ChunkKeySeparator,
}

impl V2ChunkKeyEncoding {
    /// Create a new chunk key encoding with separator `separator`.
    #[must_use]
    pub const fn new(separator: ChunkKeySeparator) -> Self {
        Self { separator }
    }

    /// Return the separator.
    #[must_use]
    pub const fn separator(&self) -> ChunkKeySeparator {
        self.separator
    }

    /// Encode chunk grid indices (in memory order) to a chunk key.
    #[must_use]
    pub fn encode(&self, chunk_grid_indices: &[u64]) -> String {
        if chunk_grid_indices.is_empty() {
            '0'.to_string()
        } else {
            let separator = match self.separator {
                ChunkKeySeparator::Dot => ".",
                ChunkKeySeparator::Slash => "/",
            };

            // Reversed to the metadata dimension order
            let mut buffers = vec![itoa::Buffer::new(); chunk_grid_indices.len()];
            chunk_grid_indices
                .iter()
                .rev()
                .zip(&mut buffers)
                .map(|(&n, buffer)| buffer.format(n))
                .join(separator)
        }
    }
}
