//! Fill values.
//!
//! A [`FillValue`] is the element value used for any region of an array that has never been written.

/// A fill value.
///
/// The bytes of a single element in native byte order.
/// String fill values hold UCS-4 code units and are padded with NUL code units to the element size of the data type.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FillValue(Vec<u8>);

impl core::fmt::Display for FillValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<&[u8]> for FillValue {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for FillValue {
    fn from(value: [u8; N]) -> Self {
        Self(value.to_vec())
    }
}

impl From<Vec<u8>> for FillValue {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<bool> for FillValue {
    fn from(value: bool) -> Self {
        Self(vec![u8::from(value)])
    }
}

macro_rules! impl_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FillValue {
                fn from(value: $t) -> Self {
                    Self(value.to_ne_bytes().to_vec())
                }
            }
        )*
    };
}

impl_from_number!(u8, u16, u32, u64, i8, i16, i32, i64, half::f16, f32, f64);

impl From<&str> for FillValue {
    /// Encode a string as UCS-4 code units.
    fn from(value: &str) -> Self {
        Self(
            value
                .chars()
                .flat_map(|c| u32::from(c).to_ne_bytes())
                .collect(),
        )
    }
}

impl From<String> for FillValue {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl FillValue {
    /// Create a new fill value composed of `bytes`.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the size in bytes of the fill value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return the byte representation of the fill value.
    #[must_use]
    pub fn as_ne_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Return `num_elements` repetitions of the fill value.
    #[must_use]
    pub fn repeat(&self, num_elements: usize) -> Vec<u8> {
        self.0.repeat(num_elements)
    }

    /// Overwrite `bytes` with repetitions of the fill value.
    ///
    /// `bytes` should have a length that is a multiple of the fill value size.
    pub fn fill(&self, bytes: &mut [u8]) {
        match self.0.as_slice() {
            [] => {}
            [byte] => bytes.fill(*byte),
            fill_value => {
                for element in bytes.chunks_exact_mut(fill_value.len()) {
                    element.copy_from_slice(fill_value);
                }
            }
        }
    }

    /// Check if the bytes are equal to a sequence of the fill value.
    #[must_use]
    pub fn equals_all(&self, bytes: &[u8]) -> bool {
        match self.0.as_slice() {
            [] => bytes.is_empty(),
            [byte] => bytes.iter().all(|b| b == byte),
            fill_value => {
                bytes.len() % fill_value.len() == 0
                    && bytes.chunks_exact(fill_value.len()).all(|e| e == fill_value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_value() {
        assert_eq!(FillValue::from(true).as_ne_bytes(), &[1]);
        assert_eq!(FillValue::from(7i32).size(), 4);
        assert_eq!(FillValue::from(7i32).as_ne_bytes(), 7i32.to_ne_bytes());
        assert_eq!(
            FillValue::from(half::f16::ONE).as_ne_bytes(),
            half::f16::ONE.to_ne_bytes()
        );
        assert_eq!(FillValue::from([1u8, 2]).to_string(), "[1, 2]");
    }

    #[test]
    fn fill_value_string() {
        let fill_value = FillValue::from("ab");
        assert_eq!(fill_value.size(), 8);
        assert_eq!(&fill_value.as_ne_bytes()[..4], u32::from('a').to_ne_bytes());
        assert_eq!(FillValue::from(String::new()).size(), 0);
    }

    #[test]
    fn fill_value_fill() {
        let fill_value = FillValue::from(-1i16);
        let mut bytes = vec![0u8; 6];
        fill_value.fill(&mut bytes);
        assert!(fill_value.equals_all(&bytes));
        assert_eq!(bytes, fill_value.repeat(3));
        bytes[5] = 0;
        assert!(!fill_value.equals_all(&bytes));
        assert!(!fill_value.equals_all(&bytes[..5]));
    }
}
