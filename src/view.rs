use crate::validity::{ValidityBitmap, count_set_bits};
use crate::{Error, Result};

/// Borrowed read-only window over the first `len` slots of a column.
///
/// Holding a view borrows the column, so the column cannot be written to or
/// reallocated while the view (or any slice taken from it) is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSizeBinaryView<'a> {
    pub byte_width: usize,
    pub len: usize,
    pub validity: &'a [u8],
    pub values: &'a [u8],
}

impl<'a> FixedSizeBinaryView<'a> {
    pub fn validate(&self) -> Result<()> {
        if self.byte_width == 0 {
            return Err(Error::InvalidWidth { byte_width: 0 });
        }
        let expected_validity = ValidityBitmap::len_for_row_count(self.len)?;
        if self.validity.len() != expected_validity {
            return Err(Error::Other("validity length mismatch".to_string()));
        }
        let expected_values = self
            .len
            .checked_mul(self.byte_width)
            .ok_or_else(|| Error::Other("size overflow".to_string()))?;
        if self.values.len() != expected_values {
            return Err(Error::Other("values length mismatch".to_string()));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_null(&self, index: usize) -> Result<bool> {
        if index >= self.len {
            return Err(Error::IndexOutOfBounds {
                index,
                bound: self.len,
            });
        }
        let byte = self
            .validity
            .get(index / 8)
            .ok_or_else(|| Error::Other("validity length mismatch".to_string()))?;
        Ok(byte & (1u8 << (index % 8)) == 0)
    }

    pub fn get(&self, index: usize) -> Result<Option<&'a [u8]>> {
        if self.is_null(index)? {
            return Ok(None);
        }
        let start = index
            .checked_mul(self.byte_width)
            .ok_or_else(|| Error::Other("size overflow".to_string()))?;
        let end = start
            .checked_add(self.byte_width)
            .ok_or_else(|| Error::Other("size overflow".to_string()))?;
        self.values
            .get(start..end)
            .map(Some)
            .ok_or_else(|| Error::Other("values length mismatch".to_string()))
    }

    pub fn null_count(&self) -> usize {
        let bits = self.len.min(self.validity.len() * 8);
        self.len - count_set_bits(self.validity, bits)
    }

    pub fn iter(&self) -> FixedSizeBinaryIter<'a> {
        FixedSizeBinaryIter {
            view: *self,
            pos: 0,
        }
    }
}

impl<'a> IntoIterator for FixedSizeBinaryView<'a> {
    type Item = Option<&'a [u8]>;
    type IntoIter = FixedSizeBinaryIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Yields `None` for null slots. Stops early if the view is malformed, so the
/// reported length is only exact for views that pass `validate`.
#[derive(Debug, Clone)]
pub struct FixedSizeBinaryIter<'a> {
    view: FixedSizeBinaryView<'a>,
    pos: usize,
}

impl<'a> Iterator for FixedSizeBinaryIter<'a> {
    type Item = Option<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.view.len {
            return None;
        }
        match self.view.get(self.pos) {
            Ok(item) => {
                self.pos += 1;
                Some(item)
            }
            Err(_) => {
                self.pos = self.view.len;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.view.len.saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FixedSizeBinaryIter<'_> {}
