//! `zarrlite` global configuration options.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::OnceLock;

use crate::array::ChunkInitialization;

/// Global configuration options for the `zarrlite` crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// ## Chunk Initialization
/// > default: [`ChunkInitialization::Eager`]
///
/// Determines whether [`ArrayBuilder::build`](crate::array::ArrayBuilder::build) writes every chunk of a new array filled with the fill value ([`ChunkInitialization::Eager`]) or writes no chunks ([`ChunkInitialization::Lazy`]).
/// Missing chunks read as the fill value, so the choice only affects what is persisted.
/// The default can be overridden per array with [`ArrayBuilder::chunk_initialization`](crate::array::ArrayBuilder::chunk_initialization).
///
/// ## Chunk Locking
/// > default: [`false`]
///
/// If enabled, arrays hold an in-process lock per chunk while it is read, modified and written.
/// Concurrent writers sharing an array then cannot lose updates to a shared boundary chunk.
/// The default can be overridden per array with [`Array::with_chunk_locking`](crate::array::Array::with_chunk_locking).
#[derive(Debug, Clone)]
pub struct Config {
    chunk_initialization: ChunkInitialization,
    chunk_locking: bool,
}

#[allow(clippy::derivable_impls)]
impl Default for Config {
    fn default() -> Self {
        Config {
            chunk_initialization: ChunkInitialization::Eager,
            chunk_locking: false,
        }
    }
}

impl Config {
    /// Get the [chunk initialization](#chunk-initialization) configuration.
    #[must_use]
    pub fn chunk_initialization(&self) -> ChunkInitialization {
        self.chunk_initialization
    }

    /// Set the [chunk initialization](#chunk-initialization) configuration.
    pub fn set_chunk_initialization(&mut self, chunk_initialization: ChunkInitialization) {
        self.chunk_initialization = chunk_initialization;
    }

    /// Get the [chunk locking](#chunk-locking) configuration.
    #[must_use]
    pub fn chunk_locking(&self) -> bool {
        self.chunk_locking
    }

    /// Set the [chunk locking](#chunk-locking) configuration.
    pub fn set_chunk_locking(&mut self, chunk_locking: bool) {
        self.chunk_locking = chunk_locking;
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global `zarrlite` configuration.
///
/// The global config must not already be mutably held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG.get_or_init(|| RwLock::new(Config::default())).read()
}

/// Returns a mutable reference to the global `zarrlite` configuration.
///
/// The global config must not already be held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG.get_or_init(|| RwLock::new(Config::default())).write()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn config_chunk_initialization() {
        assert_eq!(
            global_config().chunk_initialization(),
            ChunkInitialization::Eager
        );
        global_config_mut().set_chunk_initialization(ChunkInitialization::Lazy);
        assert_eq!(
            global_config().chunk_initialization(),
            ChunkInitialization::Lazy
        );
        global_config_mut().set_chunk_initialization(ChunkInitialization::Eager);
    }

    #[test]
    #[serial_test::serial]
    fn config_chunk_locking() {
        assert!(!global_config().chunk_locking());
        global_config_mut().set_chunk_locking(true);
        assert!(global_config().chunk_locking());
        global_config_mut().set_chunk_locking(false);
    }
}
