use super::{ArrayError, DataType};

/// A trait representing an array element type.
///
/// Elements are converted to and from the native byte order representation of a [`DataType`].
pub trait Element: Sized + Clone {
    /// Validate the data type.
    ///
    /// # Errors
    /// Returns [`ArrayError::IncompatibleElementType`] if the data type is incompatible with [`Element`].
    fn validate_data_type(data_type: &DataType) -> Result<(), ArrayError>;

    /// Convert a slice of elements into bytes.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the data type is incompatible with [`Element`] or an element cannot be represented by the data type.
    fn into_bytes(data_type: &DataType, elements: &[Self]) -> Result<Vec<u8>, ArrayError>;

    /// Convert bytes into a [`Vec<Element>`].
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the data type is incompatible with [`Element`] or the bytes hold an invalid element value.
    fn from_bytes(data_type: &DataType, bytes: &[u8]) -> Result<Vec<Self>, ArrayError>;
}

macro_rules! impl_element_pod {
    ($raw_type:ty, $data_type:pat) => {
        impl Element for $raw_type {
            fn validate_data_type(data_type: &DataType) -> Result<(), ArrayError> {
                if matches!(data_type, $data_type) {
                    Ok(())
                } else {
                    Err(ArrayError::IncompatibleElementType)
                }
            }

            fn into_bytes(
                data_type: &DataType,
                elements: &[Self],
            ) -> Result<Vec<u8>, ArrayError> {
                Self::validate_data_type(data_type)?;
                Ok(bytemuck::cast_slice(elements).to_vec())
            }

            fn from_bytes(data_type: &DataType, bytes: &[u8]) -> Result<Vec<Self>, ArrayError> {
                Self::validate_data_type(data_type)?;
                if bytes.len() % data_type.size() != 0 {
                    return Err(ArrayError::IncompatibleElementType);
                }
                Ok(bytemuck::pod_collect_to_vec(bytes))
            }
        }
    };
}

impl_element_pod!(i8, DataType::Int8);
impl_element_pod!(i16, DataType::Int16);
impl_element_pod!(i32, DataType::Int32);
impl_element_pod!(i64, DataType::Int64);
impl_element_pod!(u8, DataType::UInt8);
impl_element_pod!(u16, DataType::UInt16);
impl_element_pod!(u32, DataType::UInt32);
impl_element_pod!(u64, DataType::UInt64);
impl_element_pod!(half::f16, DataType::Float16);
impl_element_pod!(f32, DataType::Float32);
impl_element_pod!(f64, DataType::Float64);

impl Element for bool {
    fn validate_data_type(data_type: &DataType) -> Result<(), ArrayError> {
        if data_type == &DataType::Bool {
            Ok(())
        } else {
            Err(ArrayError::IncompatibleElementType)
        }
    }

    fn into_bytes(data_type: &DataType, elements: &[Self]) -> Result<Vec<u8>, ArrayError> {
        Self::validate_data_type(data_type)?;
        Ok(elements.iter().map(|&element| u8::from(element)).collect())
    }

    fn from_bytes(data_type: &DataType, bytes: &[u8]) -> Result<Vec<Self>, ArrayError> {
        Self::validate_data_type(data_type)?;
        bytes
            .iter()
            .map(|byte| match byte {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(ArrayError::InvalidElementValue),
            })
            .collect()
    }
}

/// Fixed-length strings are stored as UCS-4 code units padded with NUL.
///
/// Trailing NUL characters are removed when decoding.
impl Element for String {
    fn validate_data_type(data_type: &DataType) -> Result<(), ArrayError> {
        if matches!(data_type, DataType::String(_)) {
            Ok(())
        } else {
            Err(ArrayError::IncompatibleElementType)
        }
    }

    fn into_bytes(data_type: &DataType, elements: &[Self]) -> Result<Vec<u8>, ArrayError> {
        Self::validate_data_type(data_type)?;
        let element_size = data_type.size();
        let mut bytes = Vec::with_capacity(elements.len() * element_size);
        for element in elements {
            let start = bytes.len();
            bytes.extend(element.chars().flat_map(|c| u32::from(c).to_ne_bytes()));
            if bytes.len() - start > element_size {
                return Err(ArrayError::InvalidElementValue);
            }
            bytes.resize(start + element_size, 0);
        }
        Ok(bytes)
    }

    fn from_bytes(data_type: &DataType, bytes: &[u8]) -> Result<Vec<Self>, ArrayError> {
        Self::validate_data_type(data_type)?;
        let element_size = data_type.size();
        if bytes.len() % element_size != 0 {
            return Err(ArrayError::IncompatibleElementType);
        }
        bytes
            .chunks_exact(element_size)
            .map(|element| {
                let mut string = element
                    .chunks_exact(4)
                    .map(|c| char::from_u32(u32::from_ne_bytes([c[0], c[1], c[2], c[3]])))
                    .collect::<Option<String>>()
                    .ok_or(ArrayError::InvalidElementValue)?;
                string.truncate(string.trim_end_matches('\0').len());
                Ok(string)
            })
            .collect()
    }
}
