//! Zarr V2 metadata.

mod array;
mod metadata;

pub use array::{
    ArrayMetadataV2, ArrayMetadataV2Order, ChunkKeySeparator, FillValueMetadataV2,
};
pub use metadata::MetadataV2;
