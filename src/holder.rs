/// A fixed-width value passed by reference into someone else's buffer.
///
/// `byte_width` is the width the caller claims for the value. Writers check it
/// against the column width before reading any bytes, so a holder that claims
/// the wrong width is rejected even when `buffer` is long enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSizeBinaryHolder<'a> {
    pub byte_width: i32,
    pub buffer: &'a [u8],
    /// Byte offset of the value within `buffer`.
    pub offset: usize,
}

impl<'a> FixedSizeBinaryHolder<'a> {
    pub fn new(buffer: &'a [u8], offset: usize, byte_width: i32) -> Self {
        Self {
            byte_width,
            buffer,
            offset,
        }
    }
}

/// Same as [`FixedSizeBinaryHolder`], plus a null flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullableFixedSizeBinaryHolder<'a> {
    pub is_set: bool,
    pub byte_width: i32,
    pub buffer: &'a [u8],
    pub offset: usize,
}

impl<'a> NullableFixedSizeBinaryHolder<'a> {
    pub fn null(byte_width: i32) -> Self {
        Self {
            is_set: false,
            byte_width,
            buffer: &[],
            offset: 0,
        }
    }

    pub fn as_value(&self) -> Option<FixedSizeBinaryHolder<'a>> {
        self.is_set.then_some(FixedSizeBinaryHolder {
            byte_width: self.byte_width,
            buffer: self.buffer,
            offset: self.offset,
        })
    }
}

impl<'a> From<FixedSizeBinaryHolder<'a>> for NullableFixedSizeBinaryHolder<'a> {
    fn from(holder: FixedSizeBinaryHolder<'a>) -> Self {
        Self {
            is_set: true,
            byte_width: holder.byte_width,
            buffer: holder.buffer,
            offset: holder.offset,
        }
    }
}
