#![allow(missing_docs)]

use std::sync::Arc;

use zarrlite::array::{
    AccessMode, Array, ArrayBuilder, ArrayCreateError, ArrayError, ArrayMetadataV2Order,
    ChunkInitialization, ChunkKeySeparator, DataType, Endianness,
};
use zarrlite::array_subset::ArraySubset;
use zarrlite::filesystem::FilesystemStore;
use zarrlite::metadata::v2::FillValueMetadataV2;
use zarrlite::storage::{
    store::MemoryStore, ListableStorageTraits, ReadableStorageTraits, StoreKey,
    WritableStorageTraits,
};

#[test]
fn array_sync_4x4_int32() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![4, 4], DataType::Int32)
        .chunk_shape(vec![2, 2])
        .fill_value(0i32)
        .chunk_initialization(ChunkInitialization::Eager)
        .build(store.clone(), "/array")?;

    let subset = ArraySubset::new_with_start_end_inc(vec![1, 1], vec![2, 2])?;
    array.store_array_subset_elements(&subset, &[7i32; 4])?;

    let elements = array.retrieve_array_subset_elements::<i32>(&array.subset_all())?;
    assert_eq!(elements.iter().filter(|&&v| v == 7).count(), 4);
    #[rustfmt::skip]
    assert_eq!(elements, vec![
        0, 0, 0, 0,
        0, 7, 7, 0,
        0, 7, 7, 0,
        0, 0, 0, 0,
    ]);
    // Each of the four chunks holds one 7
    for chunk_indices in [[0, 0], [0, 1], [1, 0], [1, 1]] {
        let chunk = array.retrieve_chunk_elements::<i32>(&chunk_indices)?;
        assert_eq!(chunk.iter().filter(|&&v| v == 7).count(), 1);
    }
    Ok(())
}

#[test]
fn array_sync_float64_nan() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![10], DataType::Float64)
        .chunk_shape(vec![3])
        .fill_value(f64::NAN)
        .chunk_initialization(ChunkInitialization::Eager)
        .build(store.clone(), "/")?;
    assert_eq!(array.chunk_grid_shape(), &[4]);

    let mut chunk_keys: Vec<String> = store
        .list()?
        .iter()
        .map(|key| key.as_str().to_string())
        .filter(|key| !key.starts_with('.'))
        .collect();
    chunk_keys.sort();
    assert_eq!(chunk_keys, vec!["0", "1", "2", "3"]);

    let elements = array.retrieve_array_subset_elements::<f64>(&array.subset_all())?;
    assert_eq!(elements.len(), 10);
    assert!(elements.iter().all(|v| v.is_nan()));

    let metadata: serde_json::Value =
        serde_json::from_slice(&store.get(&StoreKey::new(".zarray")?)?.unwrap_or_default())?;
    assert_eq!(metadata["fill_value"], "NaN");
    assert_eq!(metadata["dtype"], "<f8");
    assert_eq!(metadata["zarr_format"], 2);
    assert_eq!(metadata["filters"], serde_json::Value::Null);
    Ok(())
}

#[test]
fn array_sync_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![7, 5, 3], DataType::UInt16)
        .chunk_shape(vec![3, 2, 3])
        .fill_value(42u16)
        .compressor_metadata(&serde_json::from_str(r#"{"id": "zstd", "level": 1}"#)?)?
        .chunk_initialization(ChunkInitialization::Lazy)
        .build(store.clone(), "/group/array")?;
    let elements: Vec<u16> = (0..105).collect();
    array.store_array_subset_elements(&array.subset_all(), &elements)?;

    let reopened = Array::open(store.clone(), "/group/array")?;
    assert_eq!(reopened.shape(), array.shape());
    assert_eq!(reopened.chunk_shape(), array.chunk_shape());
    assert_eq!(reopened.data_type(), array.data_type());
    assert_eq!(reopened.fill_value(), array.fill_value());
    assert_eq!(
        reopened.compressor().map(|c| c.create_metadata()),
        array.compressor().map(|c| c.create_metadata())
    );
    assert_eq!(reopened.metadata(), array.metadata());
    assert_eq!(
        reopened.retrieve_array_subset_elements::<u16>(&reopened.subset_all())?,
        elements
    );
    Ok(())
}

#[test]
fn array_sync_boundary_preservation() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![6, 6], DataType::UInt8)
        .chunk_shape(vec![4, 4])
        .compressor_metadata(&serde_json::from_str(r#"{"id": "gzip", "level": 5}"#)?)?
        .chunk_initialization(ChunkInitialization::Lazy)
        .build(store.clone(), "/")?;
    let initial: Vec<u8> = (0..36).collect();
    array.store_array_subset_elements(&array.subset_all(), &initial)?;

    let subset = ArraySubset::new_with_ranges(&[3..5, 2..5]);
    array.fill_array_subset(&subset, 255u8)?;

    let elements = array.retrieve_array_subset_elements::<u8>(&array.subset_all())?;
    for (i, (&element, &initial)) in std::iter::zip(&elements, &initial).enumerate() {
        let indices = [i as u64 % 6, i as u64 / 6];
        if subset.contains(&indices) {
            assert_eq!(element, 255);
        } else {
            assert_eq!(element, initial);
        }
    }
    Ok(())
}

#[test]
fn array_sync_read_only() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    ArrayBuilder::new(vec![4], DataType::Int8).build(store.clone(), "/")?;

    let array = Array::open(store.clone(), "/")?;
    assert!(matches!(
        array.store_array_subset_elements(&array.subset_all(), &[1i8; 4]),
        Err(ArrayError::ReadOnly)
    ));
    assert_eq!(
        array.retrieve_array_subset_elements::<i8>(&array.subset_all())?,
        vec![0; 4]
    );

    let array = Array::open_with_mode(store, "/", AccessMode::ReadWrite)?;
    array.store_array_subset_elements(&array.subset_all(), &[1i8; 4])?;
    Ok(())
}

#[test]
fn array_sync_already_exists() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let builder = ArrayBuilder::new(vec![4], DataType::Int8);
    builder.build(store.clone(), "/a")?;
    assert!(matches!(
        builder.build(store.clone(), "/a"),
        Err(ArrayCreateError::AlreadyExists(_))
    ));
    builder.build(store, "/b")?;
    Ok(())
}

#[test]
fn array_sync_corrupt_chunk() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![8], DataType::Float32)
        .chunk_shape(vec![4])
        .compressor_metadata(&serde_json::from_str(r#"{"id": "zstd", "level": 3}"#)?)?
        .build(store.clone(), "/")?;

    // A valid zstd frame of the wrong decoded length
    let other = ArrayBuilder::new(vec![2], DataType::Float32)
        .compressor(array.compressor().cloned())
        .chunk_initialization(ChunkInitialization::Lazy)
        .build(store.clone(), "/other")?;
    other.store_chunk_elements(&[0], &[1.0f32, 2.0])?;
    let short_chunk = other.retrieve_encoded_chunk(&[0])?.unwrap_or_default();
    array.storage().set(&StoreKey::new("1")?, short_chunk.into())?;

    assert!(matches!(
        array.retrieve_array_subset(&array.subset_all()),
        Err(ArrayError::CorruptChunk(_, 8, 16))
    ));
    assert!(array
        .retrieve_array_subset(&ArraySubset::new_with_ranges(&[0..4]))
        .is_ok());

    array
        .storage()
        .set(&StoreKey::new("1")?, vec![0u8, 1, 2, 3].into())?;
    assert!(matches!(
        array.retrieve_chunk(&[1]),
        Err(ArrayError::CodecError(_))
    ));
    Ok(())
}

#[test]
fn array_sync_big_endian() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![3], DataType::UInt32)
        .endianness(Endianness::Big)
        .chunk_initialization(ChunkInitialization::Lazy)
        .build(store.clone(), "/")?;
    assert_eq!(array.metadata().dtype, ">u4");
    array.store_array_subset_elements(&array.subset_all(), &[1u32, 0x0102_0304, 3])?;
    assert_eq!(
        array.retrieve_encoded_chunk(&[0])?,
        Some(vec![0, 0, 0, 1, 1, 2, 3, 4, 0, 0, 0, 3])
    );
    assert_eq!(
        Array::open(store, "/")?.retrieve_array_subset_elements::<u32>(&array.subset_all())?,
        vec![1, 0x0102_0304, 3]
    );
    Ok(())
}

#[test]
fn array_sync_string() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![5], DataType::String(3))
        .chunk_shape(vec![2])
        .fill_value("n/a")
        .chunk_initialization(ChunkInitialization::Lazy)
        .build(store.clone(), "/")?;
    assert_eq!(array.metadata().dtype, "<U3");
    assert_eq!(
        array.metadata().fill_value,
        FillValueMetadataV2::String("n/a".to_string())
    );

    array.store_array_subset_elements(
        &ArraySubset::new_with_ranges(&[1..3]),
        &["ab".to_string(), "xyz".to_string()],
    )?;
    assert_eq!(
        array.retrieve_array_subset_elements::<String>(&array.subset_all())?,
        vec!["n/a", "ab", "xyz", "n/a", "n/a"]
    );
    assert!(matches!(
        array.store_array_subset_elements(
            &ArraySubset::new_with_ranges(&[0..1]),
            &["abcd".to_string()]
        ),
        Err(ArrayError::InvalidElementValue)
    ));
    Ok(())
}

#[test]
fn array_sync_order_f_and_separator() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![4, 2], DataType::Int64)
        .chunk_shape(vec![2, 1])
        .order(ArrayMetadataV2Order::F)
        .dimension_separator(ChunkKeySeparator::Slash)
        .chunk_initialization(ChunkInitialization::Lazy)
        .build(store.clone(), "/array")?;
    array.store_array_subset_elements(&ArraySubset::new_with_ranges(&[2..4, 1..2]), &[5i64, 6])?;
    assert!(store.get(&StoreKey::new("array/1/1")?)?.is_some());
    assert_eq!(store.list()?.len(), 3);

    let reopened = Array::open(store, "/array")?;
    assert_eq!(reopened.order(), ArrayMetadataV2Order::F);
    assert_eq!(
        reopened.retrieve_array_subset_elements::<i64>(&reopened.subset_all())?,
        vec![0, 0, 0, 0, 0, 0, 5, 6]
    );
    Ok(())
}

#[test]
fn array_sync_filesystem() -> Result<(), Box<dyn std::error::Error>> {
    let path = tempfile::TempDir::new()?;
    let store = Arc::new(FilesystemStore::new(path.path())?);
    let array = ArrayBuilder::new(vec![5, 5], DataType::Float32)
        .chunk_shape(vec![2, 3])
        .fill_value(-1.0f32)
        .compressor_metadata(&serde_json::from_str(r#"{"id": "gzip", "level": 1}"#)?)?
        .build(store.clone(), "/group/array")?;
    assert!(path.path().join("group/array/.zarray").is_file());
    assert!(path.path().join("group/array/1.2").is_file());

    let subset = ArraySubset::new_with_ranges(&[1..4, 2..5]);
    let elements: Vec<f32> = (0..9u8).map(f32::from).collect();
    array.store_array_subset_elements(&subset, &elements)?;

    let store = Arc::new(FilesystemStore::new(path.path())?);
    let reopened = Array::open(store, "/group/array")?;
    assert_eq!(
        reopened.retrieve_array_subset_elements::<f32>(&subset)?,
        elements
    );
    assert_eq!(
        reopened.retrieve_array_subset_elements::<f32>(&ArraySubset::new_with_ranges(&[0..1, 0..5]))?,
        vec![-1.0; 5]
    );
    Ok(())
}

#[cfg(feature = "ndarray")]
#[test]
fn array_sync_ndarray() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![3, 4], DataType::Int16)
        .chunk_shape(vec![2, 3])
        .chunk_initialization(ChunkInitialization::Lazy)
        .build(store, "/")?;
    let data = ndarray::array![[1i16, 2], [3, 4]].into_dyn();
    array.store_array_subset_ndarray(&[1, 2], data.view())?;

    let subset = ArraySubset::new_with_ranges(&[1..3, 2..4]);
    assert_eq!(array.retrieve_array_subset_ndarray::<i16>(&subset)?, data);
    // Memory order, dimension 0 fastest
    assert_eq!(
        array.retrieve_array_subset_elements::<i16>(&subset)?,
        vec![1, 3, 2, 4]
    );
    let all = array.retrieve_array_subset_ndarray::<i16>(&array.subset_all())?;
    assert_eq!(all.shape(), &[3, 4]);
    assert_eq!(all[[2, 3]], 4);
    assert_eq!(all[[0, 0]], 0);
    Ok(())
}

#[test]
fn array_sync_open_oversized_metadata() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let zarray = |dtype: &str, chunks: &str| {
        format!(
            r#"{{"zarr_format": 2, "shape": [4, 4], "chunks": {chunks}, "dtype": "{dtype}",
                "compressor": null, "fill_value": null, "order": "C", "filters": null}}"#
        )
    };

    store.set(
        &StoreKey::new("a/.zarray")?,
        zarray("<U4611686018427387904", "[2, 2]").into_bytes().into(),
    )?;
    assert!(matches!(
        Array::open(store.clone(), "/a"),
        Err(ArrayCreateError::UnknownDataType(_))
    ));

    store.set(
        &StoreKey::new("b/.zarray")?,
        zarray("<i4", "[4294967296, 4294967296]").into_bytes().into(),
    )?;
    assert!(matches!(
        Array::open(store.clone(), "/b"),
        Err(ArrayCreateError::InvalidShape(_, _))
    ));
    Ok(())
}

#[test]
fn array_sync_selection_past_u64_max() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![4], DataType::Int32)
        .chunk_initialization(ChunkInitialization::Lazy)
        .build(store, "/")?;
    let subset = ArraySubset::new_with_start_shape(vec![u64::MAX], vec![2])?;
    assert!(matches!(
        array.retrieve_array_subset(&subset),
        Err(ArrayError::OutOfBoundsSelection(_, _))
    ));
    assert!(matches!(
        array.store_array_subset_elements(&subset, &[1i32, 2]),
        Err(ArrayError::OutOfBoundsSelection(_, _))
    ));
    Ok(())
}
