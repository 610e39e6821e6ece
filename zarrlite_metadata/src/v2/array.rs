use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{ArrayShape, ChunkShape};

use super::MetadataV2;

/// Zarr array metadata (storage specification v2).
///
/// An example `JSON` document for a Zarr V2 array:
/// ```json
/// {
///     "chunks": [
///         1000,
///         1000
///     ],
///     "compressor": {
///         "id": "zstd",
///         "level": 3,
///         "checksum": false
///     },
///     "dtype": "<f8",
///     "fill_value": "NaN",
///     "filters": null,
///     "order": "C",
///     "shape": [
///         10000,
///         10000
///     ],
///     "zarr_format": 2
/// }
/// ```
///
/// `shape` and `chunks` are in the order written to disk, which is the reverse of the in-memory dimension order used by `zarrlite`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ArrayMetadataV2 {
    /// An integer defining the version of the storage specification to which the array adheres.
    ///
    /// Deserialization accepts any integer so that the version can be reported when unsupported.
    pub zarr_format: u64,
    /// An array of integers providing the length of each dimension of the Zarr array.
    pub shape: ArrayShape,
    /// A list of integers defining the length of each dimension of a chunk of the array.
    pub chunks: ChunkShape,
    /// The data type of the Zarr array, e.g. `<f8` or `<U12`.
    pub dtype: String,
    /// A JSON object identifying the primary compression codec and providing configuration parameters, or null if no compressor is to be used.
    pub compressor: Option<MetadataV2>,
    /// A scalar value providing the default value to use for uninitialized portions of the array, or null if no fill value is to be used.
    pub fill_value: FillValueMetadataV2,
    /// Either “C” or “F”, defining the layout of bytes within each chunk of the array.
    pub order: ArrayMetadataV2Order,
    /// A list of JSON objects providing codec configurations, or null if no filters are to be applied.
    #[serde(default)]
    pub filters: Option<Vec<MetadataV2>>,
    /// If present, either the string "." or "/" defining the separator placed between the dimensions of a chunk.
    #[serde(default)]
    pub dimension_separator: ChunkKeySeparator,
}

impl ArrayMetadataV2 {
    /// Create Zarr V2 array metadata with `C` order, no filters and a `.` chunk key separator.
    #[must_use]
    pub fn new(
        shape: ArrayShape,
        chunks: ChunkShape,
        dtype: impl Into<String>,
        fill_value: FillValueMetadataV2,
        compressor: Option<MetadataV2>,
    ) -> Self {
        Self {
            zarr_format: 2,
            shape,
            chunks,
            dtype: dtype.into(),
            compressor,
            fill_value,
            order: ArrayMetadataV2Order::C,
            filters: None,
            dimension_separator: ChunkKeySeparator::Dot,
        }
    }

    /// Set the order.
    #[must_use]
    pub fn with_order(mut self, order: ArrayMetadataV2Order) -> Self {
        self.order = order;
        self
    }

    /// Set the chunk key separator.
    #[must_use]
    pub fn with_dimension_separator(mut self, dimension_separator: ChunkKeySeparator) -> Self {
        self.dimension_separator = dimension_separator;
        self
    }
}

/// The separator placed between the dimensions of a chunk key.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default, Display)]
pub enum ChunkKeySeparator {
    /// The `.` separator, e.g. `0.1`.
    #[default]
    #[serde(rename = ".")]
    #[display(".")]
    Dot,
    /// The `/` separator, e.g. `0/1`.
    #[serde(rename = "/")]
    #[display("/")]
    Slash,
}

/// A scalar value providing the default value to use for uninitialized portions of the array, or null if no fill value is to be used.
#[derive(Clone, PartialEq, Debug)]
pub enum FillValueMetadataV2 {
    /// No fill value.
    Null,
    /// NaN (not-a-number).
    NaN,
    /// Positive infinity.
    Infinity,
    /// Negative infinity.
    NegInfinity,
    /// A number.
    Number(serde_json::Number),
    /// A boolean.
    Bool(bool),
    /// A string, for string data types.
    String(String),
}

impl<'de> serde::Deserialize<'de> for FillValueMetadataV2 {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum FillValueMetadataV2Type {
            Bool(bool),
            String(String),
            Number(serde_json::Number),
            Null,
        }
        let fill_value = FillValueMetadataV2Type::deserialize(d)?;
        match fill_value {
            FillValueMetadataV2Type::String(string) => match string.as_str() {
                "NaN" => Ok(Self::NaN),
                "Infinity" => Ok(Self::Infinity),
                "-Infinity" => Ok(Self::NegInfinity),
                _ => Ok(Self::String(string)),
            },
            FillValueMetadataV2Type::Number(number) => Ok(Self::Number(number)),
            FillValueMetadataV2Type::Bool(bool) => Ok(Self::Bool(bool)),
            FillValueMetadataV2Type::Null => Ok(Self::Null),
        }
    }
}

impl Serialize for FillValueMetadataV2 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::NaN => serializer.serialize_str("NaN"),
            Self::Infinity => serializer.serialize_str("Infinity"),
            Self::NegInfinity => serializer.serialize_str("-Infinity"),
            Self::Number(number) => number.serialize(serializer),
            Self::Bool(bool) => serializer.serialize_bool(*bool),
            Self::String(string) => serializer.serialize_str(string),
        }
    }
}

impl From<f64> for FillValueMetadataV2 {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            Self::NaN
        } else if value == f64::INFINITY {
            Self::Infinity
        } else if value == f64::NEG_INFINITY {
            Self::NegInfinity
        } else {
            serde_json::Number::from_f64(value).map_or(Self::Null, Self::Number)
        }
    }
}

impl From<i64> for FillValueMetadataV2 {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for FillValueMetadataV2 {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<bool> for FillValueMetadataV2 {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// The layout of bytes within each chunk of the array.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ArrayMetadataV2Order {
    /// Row-major order. The last dimension varies fastest.
    #[default]
    C,
    /// Column-major order. The first dimension varies fastest.
    F,
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON_VALID: &str = r#"{
        "chunks": [2, 3],
        "compressor": {"id": "zstd", "level": 3, "checksum": false},
        "dtype": "<f8",
        "fill_value": "NaN",
        "filters": null,
        "order": "C",
        "shape": [4, 7],
        "zarr_format": 2
    }"#;

    #[test]
    fn array_metadata_v2() {
        let metadata: ArrayMetadataV2 = serde_json::from_str(JSON_VALID).unwrap();
        assert_eq!(metadata.zarr_format, 2);
        assert_eq!(metadata.shape, vec![4, 7]);
        assert_eq!(metadata.chunks, vec![2, 3]);
        assert_eq!(metadata.dtype, "<f8");
        assert_eq!(metadata.fill_value, FillValueMetadataV2::NaN);
        assert_eq!(metadata.order, ArrayMetadataV2Order::C);
        assert_eq!(metadata.filters, None);
        assert_eq!(metadata.dimension_separator, ChunkKeySeparator::Dot);
        assert_eq!(metadata.compressor.as_ref().map(MetadataV2::id), Some("zstd"));

        let json = serde_json::to_string(&metadata).unwrap();
        let metadata_roundtrip: ArrayMetadataV2 = serde_json::from_str(&json).unwrap();
        assert_eq!(metadata, metadata_roundtrip);
    }

    #[test]
    fn array_metadata_v2_other_format() {
        let metadata: ArrayMetadataV2 =
            serde_json::from_str(&JSON_VALID.replace(r#""zarr_format": 2"#, r#""zarr_format": 3"#))
                .unwrap();
        assert_eq!(metadata.zarr_format, 3);
    }

    #[test]
    fn array_metadata_v2_missing_field() {
        assert!(serde_json::from_str::<ArrayMetadataV2>(r#"{"zarr_format": 2}"#).is_err());
        assert!(serde_json::from_str::<ArrayMetadataV2>(
            &JSON_VALID.replace(r#""order": "C""#, r#""order": "K""#)
        )
        .is_err());
    }

    #[test]
    fn array_metadata_v2_new() {
        let metadata = ArrayMetadataV2::new(
            vec![10],
            vec![3],
            "<i4",
            FillValueMetadataV2::from(0i64),
            None,
        )
        .with_dimension_separator(ChunkKeySeparator::Slash);
        assert_eq!(
            metadata.to_string(),
            r#"{"zarr_format":2,"shape":[10],"chunks":[3],"dtype":"<i4","compressor":null,"fill_value":0,"order":"C","filters":null,"dimension_separator":"/"}"#
        );
    }

    #[test]
    fn fill_value_metadata_v2() {
        let parse = |json: &str| serde_json::from_str::<FillValueMetadataV2>(json).unwrap();
        assert_eq!(parse("null"), FillValueMetadataV2::Null);
        assert_eq!(parse(r#""NaN""#), FillValueMetadataV2::NaN);
        assert_eq!(parse(r#""Infinity""#), FillValueMetadataV2::Infinity);
        assert_eq!(parse(r#""-Infinity""#), FillValueMetadataV2::NegInfinity);
        assert_eq!(parse("true"), FillValueMetadataV2::Bool(true));
        assert_eq!(parse(r#""abc""#), FillValueMetadataV2::String("abc".to_string()));
        assert_eq!(parse("-1"), FillValueMetadataV2::from(-1i64));
        assert_eq!(parse("1.5"), FillValueMetadataV2::from(1.5f64));
        assert_eq!(
            serde_json::to_string(&FillValueMetadataV2::from(f64::NEG_INFINITY)).unwrap(),
            r#""-Infinity""#
        );
        assert!(serde_json::from_str::<FillValueMetadataV2>("[1]").is_err());
    }
}
