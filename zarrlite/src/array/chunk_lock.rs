use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use super::ArrayIndices;

/// In-process mutexes keyed by chunk grid indices.
///
/// A chunk is locked while it is retrieved, updated and stored, so that writers sharing an array do not lose updates to the same chunk.
#[derive(Debug, Default)]
pub(crate) struct ChunkLocks {
    locks: Mutex<HashMap<ArrayIndices, Arc<Mutex<()>>>>,
}

impl ChunkLocks {
    /// Return the mutex of the chunk at `chunk_indices`.
    ///
    /// Mutexes no longer referenced outside of the map are dropped, so the map only holds chunks that are in use.
    pub(crate) fn mutex(&self, chunk_indices: &[u64]) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        locks.entry(chunk_indices.to_vec()).or_default().clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().len()
    }
}
