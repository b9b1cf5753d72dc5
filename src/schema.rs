use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type descriptor for a column of equal-length byte strings.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawFixedSizeBinaryType"))]
pub struct FixedSizeBinaryType {
    byte_width: i32,
}

impl FixedSizeBinaryType {
    pub fn new(byte_width: i32) -> Result<Self> {
        if byte_width <= 0 {
            return Err(Error::InvalidWidth {
                byte_width: i64::from(byte_width),
            });
        }
        Ok(Self { byte_width })
    }

    pub fn byte_width(&self) -> usize {
        self.byte_width as usize
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawFixedSizeBinaryType {
    byte_width: i32,
}

#[cfg(feature = "serde")]
impl TryFrom<RawFixedSizeBinaryType> for FixedSizeBinaryType {
    type Error = Error;

    fn try_from(raw: RawFixedSizeBinaryType) -> Result<Self> {
        FixedSizeBinaryType::new(raw.byte_width)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Field {
    pub name: String,
    pub ty: FixedSizeBinaryType,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: FixedSizeBinaryType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}
