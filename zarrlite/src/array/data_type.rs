//! Zarr V2 data types.
//!
//! A [`DataType`] is parsed from, and written to, the `dtype` field of `.zarray` together with an [`Endianness`].
//! For example `<f8` is a little endian [`DataType::Float64`] and `<U12` is a [`DataType::String`] of 12 characters.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v2/v2.0.html#data-type-encoding>.

use half::f16;
use thiserror::Error;

use super::FillValue;
use crate::metadata::v2::FillValueMetadataV2;

/// A data type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum DataType {
    /// `|b1` Boolean.
    Bool,
    /// `|i1` Integer in `[-2^7, 2^7-1]`.
    Int8,
    /// `<i2` Integer in `[-2^15, 2^15-1]`.
    Int16,
    /// `<i4` Integer in `[-2^31, 2^31-1]`.
    Int32,
    /// `<i8` Integer in `[-2^63, 2^63-1]`.
    Int64,
    /// `|u1` Integer in `[0, 2^8-1]`.
    UInt8,
    /// `<u2` Integer in `[0, 2^16-1]`.
    UInt16,
    /// `<u4` Integer in `[0, 2^32-1]`.
    UInt32,
    /// `<u8` Integer in `[0, 2^64-1]`.
    UInt64,
    /// `<f2` IEEE 754 half-precision floating point: sign bit, 5 bits exponent, 10 bits mantissa.
    Float16,
    /// `<f4` IEEE 754 single-precision floating point: sign bit, 8 bits exponent, 23 bits mantissa.
    Float32,
    /// `<f8` IEEE 754 double-precision floating point: sign bit, 11 bits exponent, 52 bits mantissa.
    Float64,
    /// `<U{n}` A fixed-length string of `n` UCS-4 code units.
    String(usize), // the stored usize is the number of characters
}

/// The byte order of multi-byte elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endianness {
    /// Little endian (`<`).
    Little,
    /// Big endian (`>`).
    Big,
}

impl Endianness {
    /// Return the endianness of the target.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    /// Returns true if this is the endianness of the target.
    #[must_use]
    pub fn is_native(self) -> bool {
        self == Self::native()
    }
}

/// An unknown data type error.
#[derive(Clone, Debug, Error)]
#[error("unknown data type {_0}")]
pub struct UnknownDataTypeError(String);

/// A data type and fill value metadata incompatibility error.
#[derive(Clone, Debug, Error)]
#[error("incompatible fill value {} for data type {_0}", serde_json::to_string(_1).unwrap_or_default())]
pub struct IncompatibleFillValueMetadataError(String, FillValueMetadataV2);

/// A data type and fill value incompatibility error.
#[derive(Clone, Debug, Error)]
#[error("incompatible fill value {1} for data type {0}")]
pub struct IncompatibleFillValueError(String, FillValue);

impl IncompatibleFillValueError {
    /// Create a new incompatible fill value error.
    #[must_use]
    pub const fn new(data_type_name: String, fill_value: FillValue) -> Self {
        Self(data_type_name, fill_value)
    }

    /// Return the fill value.
    #[must_use]
    pub fn fill_value(&self) -> &FillValue {
        &self.1
    }
}

impl DataType {
    /// Returns the name of the data type, e.g. `int32` or `string(12)`.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Bool => "bool".to_string(),
            Self::Int8 => "int8".to_string(),
            Self::Int16 => "int16".to_string(),
            Self::Int32 => "int32".to_string(),
            Self::Int64 => "int64".to_string(),
            Self::UInt8 => "uint8".to_string(),
            Self::UInt16 => "uint16".to_string(),
            Self::UInt32 => "uint32".to_string(),
            Self::UInt64 => "uint64".to_string(),
            Self::Float16 => "float16".to_string(),
            Self::Float32 => "float32".to_string(),
            Self::Float64 => "float64".to_string(),
            Self::String(length) => format!("string({length})"),
        }
    }

    /// Returns the size of an element in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 | Self::Float16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
            Self::String(length) => 4 * *length,
        }
    }

    /// Returns the size of the unit reversed when converting between little and big endian.
    ///
    /// This is the element size for numeric types, and the size of a code unit for strings.
    #[must_use]
    pub const fn swap_size(&self) -> usize {
        match self {
            Self::String(_) => 4,
            _ => self.size(),
        }
    }

    /// Create a data type and endianness from a Zarr V2 `dtype` string.
    ///
    /// # Errors
    /// Returns an [`UnknownDataTypeError`] if `dtype` is not a supported data type.
    pub fn from_dtype(dtype: &str) -> Result<(Self, Endianness), UnknownDataTypeError> {
        let err = || UnknownDataTypeError(dtype.to_string());
        let mut chars = dtype.chars();
        let byte_order = chars.next().ok_or_else(err)?;
        let kind = chars.next().ok_or_else(err)?;
        let size: usize = chars.as_str().parse().map_err(|_| err())?;
        let data_type = match (kind, size) {
            ('b', 1) => Self::Bool,
            ('i', 1) => Self::Int8,
            ('i', 2) => Self::Int16,
            ('i', 4) => Self::Int32,
            ('i', 8) => Self::Int64,
            ('u', 1) => Self::UInt8,
            ('u', 2) => Self::UInt16,
            ('u', 4) => Self::UInt32,
            ('u', 8) => Self::UInt64,
            ('f', 2) => Self::Float16,
            ('f', 4) => Self::Float32,
            ('f', 8) => Self::Float64,
            ('U', length) if length > 0 && length.checked_mul(4).is_some() => {
                Self::String(length)
            }
            _ => return Err(err()),
        };
        let endianness = match byte_order {
            '<' => Endianness::Little,
            '>' => Endianness::Big,
            '|' if data_type.swap_size() == 1 => Endianness::native(),
            _ => return Err(err()),
        };
        Ok((data_type, endianness))
    }

    /// Return the Zarr V2 `dtype` string of the data type with `endianness`.
    ///
    /// Single byte data types are written with the `|` (not applicable) byte order.
    #[must_use]
    pub fn to_dtype(&self, endianness: Endianness) -> String {
        let byte_order = if self.swap_size() == 1 {
            '|'
        } else if endianness == Endianness::Little {
            '<'
        } else {
            '>'
        };
        let kind = match self {
            Self::Bool => 'b',
            Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 => 'i',
            Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64 => 'u',
            Self::Float16 | Self::Float32 | Self::Float64 => 'f',
            Self::String(length) => return format!("{byte_order}U{length}"),
        };
        format!("{byte_order}{kind}{}", self.size())
    }

    /// Return the default fill value of the data type: zero, false, or an empty string.
    #[must_use]
    pub fn default_fill_value(&self) -> FillValue {
        FillValue::new(vec![0; self.size()])
    }

    /// Create a fill value from metadata.
    ///
    /// A `null` fill value is the [default fill value](DataType::default_fill_value).
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueMetadataError`] if the fill value is incompatible with the data type.
    #[allow(clippy::cast_possible_truncation)]
    pub fn fill_value_from_metadata(
        &self,
        fill_value: &FillValueMetadataV2,
    ) -> Result<FillValue, IncompatibleFillValueMetadataError> {
        use FillValue as FV;
        use FillValueMetadataV2 as FVM;
        let err = || IncompatibleFillValueMetadataError(self.name(), fill_value.clone());
        if fill_value == &FVM::Null {
            return Ok(self.default_fill_value());
        }
        let fill_value = match self {
            Self::Bool => match fill_value {
                FVM::Bool(value) => FV::from(*value),
                FVM::Number(number) => match number.as_u64() {
                    Some(0) => FV::from(false),
                    Some(1) => FV::from(true),
                    _ => return Err(err()),
                },
                _ => return Err(err()),
            },
            Self::Int8 => FV::from(i8::try_from(as_i64(fill_value).ok_or_else(err)?).map_err(|_| err())?),
            Self::Int16 => FV::from(i16::try_from(as_i64(fill_value).ok_or_else(err)?).map_err(|_| err())?),
            Self::Int32 => FV::from(i32::try_from(as_i64(fill_value).ok_or_else(err)?).map_err(|_| err())?),
            Self::Int64 => FV::from(as_i64(fill_value).ok_or_else(err)?),
            Self::UInt8 => FV::from(u8::try_from(as_u64(fill_value).ok_or_else(err)?).map_err(|_| err())?),
            Self::UInt16 => FV::from(u16::try_from(as_u64(fill_value).ok_or_else(err)?).map_err(|_| err())?),
            Self::UInt32 => FV::from(u32::try_from(as_u64(fill_value).ok_or_else(err)?).map_err(|_| err())?),
            Self::UInt64 => FV::from(as_u64(fill_value).ok_or_else(err)?),
            Self::Float16 => {
                let value = as_f64(fill_value).ok_or_else(err)?;
                let narrowed = f16::from_f64(value);
                if value.is_finite() && !narrowed.is_finite() {
                    return Err(err());
                }
                FV::from(narrowed)
            }
            Self::Float32 => {
                let value = as_f64(fill_value).ok_or_else(err)?;
                let narrowed = value as f32;
                if value.is_finite() && !narrowed.is_finite() {
                    return Err(err());
                }
                FV::from(narrowed)
            }
            Self::Float64 => FV::from(as_f64(fill_value).ok_or_else(err)?),
            Self::String(_) => match fill_value {
                FVM::String(string) => FV::from(string.as_str()),
                _ => return Err(err()),
            },
        };
        self.validate_fill_value(fill_value).map_err(|_| err())
    }

    /// Check that `fill_value` is compatible with the data type.
    ///
    /// String fill values shorter than the string length are padded with NUL code units.
    ///
    /// # Errors
    /// Returns an [`IncompatibleFillValueError`] if the fill value has the wrong size, is an invalid bool, or is a string that is too long.
    pub fn validate_fill_value(
        &self,
        fill_value: FillValue,
    ) -> Result<FillValue, IncompatibleFillValueError> {
        match self {
            Self::String(_) => {
                if fill_value.size() % 4 == 0 && fill_value.size() <= self.size() {
                    let mut bytes = fill_value.as_ne_bytes().to_vec();
                    bytes.resize(self.size(), 0);
                    Ok(FillValue::new(bytes))
                } else {
                    Err(IncompatibleFillValueError::new(self.name(), fill_value))
                }
            }
            Self::Bool if fill_value.as_ne_bytes() != [0] && fill_value.as_ne_bytes() != [1] => {
                Err(IncompatibleFillValueError::new(self.name(), fill_value))
            }
            _ if fill_value.size() != self.size() => {
                Err(IncompatibleFillValueError::new(self.name(), fill_value))
            }
            _ => Ok(fill_value),
        }
    }

    /// Return the fill value metadata of a fill value of this data type.
    ///
    /// `fill_value` is expected to have been validated with [`DataType::validate_fill_value`].
    /// Returns [`FillValueMetadataV2::Null`] if the fill value cannot be represented.
    #[must_use]
    pub fn metadata_fill_value(&self, fill_value: &FillValue) -> FillValueMetadataV2 {
        let bytes = fill_value.as_ne_bytes();
        let metadata: Option<FillValueMetadataV2> = match self {
            Self::Bool => bytes.first().map(|&b| FillValueMetadataV2::Bool(b != 0)),
            Self::Int8 => ne_array(bytes).map(|b| i64::from(i8::from_ne_bytes(b)).into()),
            Self::Int16 => ne_array(bytes).map(|b| i64::from(i16::from_ne_bytes(b)).into()),
            Self::Int32 => ne_array(bytes).map(|b| i64::from(i32::from_ne_bytes(b)).into()),
            Self::Int64 => ne_array(bytes).map(|b| i64::from_ne_bytes(b).into()),
            Self::UInt8 => ne_array(bytes).map(|b| u64::from(u8::from_ne_bytes(b)).into()),
            Self::UInt16 => ne_array(bytes).map(|b| u64::from(u16::from_ne_bytes(b)).into()),
            Self::UInt32 => ne_array(bytes).map(|b| u64::from(u32::from_ne_bytes(b)).into()),
            Self::UInt64 => ne_array(bytes).map(|b| u64::from_ne_bytes(b).into()),
            Self::Float16 => ne_array(bytes).map(|b| f64::from(f16::from_ne_bytes(b)).into()),
            Self::Float32 => ne_array(bytes).map(|b| f64::from(f32::from_ne_bytes(b)).into()),
            Self::Float64 => ne_array(bytes).map(|b| f64::from_ne_bytes(b).into()),
            Self::String(_) => bytes
                .chunks_exact(4)
                .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                .take_while(|&c| c != 0)
                .map(char::from_u32)
                .collect::<Option<String>>()
                .map(FillValueMetadataV2::String),
        };
        metadata.unwrap_or(FillValueMetadataV2::Null)
    }
}

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn ne_array<const N: usize>(bytes: &[u8]) -> Option<[u8; N]> {
    bytes.try_into().ok()
}

fn as_i64(fill_value: &FillValueMetadataV2) -> Option<i64> {
    match fill_value {
        FillValueMetadataV2::Number(number) => number.as_i64(),
        _ => None,
    }
}

fn as_u64(fill_value: &FillValueMetadataV2) -> Option<u64> {
    match fill_value {
        FillValueMetadataV2::Number(number) => number.as_u64(),
        _ => None,
    }
}

fn as_f64(fill_value: &FillValueMetadataV2) -> Option<f64> {
    match fill_value {
        FillValueMetadataV2::Number(number) => number.as_f64(),
        FillValueMetadataV2::NaN => Some(f64::NAN),
        FillValueMetadataV2::Infinity => Some(f64::INFINITY),
        FillValueMetadataV2::NegInfinity => Some(f64::NEG_INFINITY),
        _ => None,
    }
}
