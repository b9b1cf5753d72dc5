use crate::memory::{Buffer, BufferAllocator};
use crate::{Error, Result};

fn ceil_div_8(n: usize) -> Result<usize> {
    n.checked_add(7)
        .ok_or_else(|| Error::Other("size overflow".to_string()))
        .map(|v| v / 8)
}

#[inline]
pub(crate) fn bit_is_set(bytes: &[u8], idx: usize) -> bool {
    (bytes[idx / 8] & (1u8 << (idx % 8))) != 0
}

/// Counts set bits among the first `len` bits of `bytes`.
pub(crate) fn count_set_bits(bytes: &[u8], len: usize) -> usize {
    let full = len / 8;
    let mut count: usize = bytes[..full].iter().map(|b| b.count_ones() as usize).sum();
    let rem = len % 8;
    if rem != 0 {
        let mask = (1u8 << rem) - 1;
        count += (bytes[full] & mask).count_ones() as usize;
    }
    count
}

/// One bit per slot, 1 = non-null. Bits past the tracked capacity are always 0.
#[derive(Debug)]
pub struct ValidityBitmap {
    buf: Buffer,
}

impl ValidityBitmap {
    pub fn empty() -> Self {
        Self {
            buf: Buffer::empty(),
        }
    }

    pub fn new_all_invalid(allocator: &dyn BufferAllocator, row_count: usize) -> Result<Self> {
        let len = ceil_div_8(row_count)?;
        Ok(Self {
            buf: allocator.buffer(len)?,
        })
    }

    pub fn len_for_row_count(row_count: usize) -> Result<usize> {
        ceil_div_8(row_count)
    }

    /// Returns a bitmap sized for `row_count` rows that starts with a copy of
    /// this one. New bits are null. `self` is untouched on failure.
    pub fn grown(&self, allocator: &dyn BufferAllocator, row_count: usize) -> Result<Self> {
        let mut next = Self::new_all_invalid(allocator, row_count)?;
        let keep = self.buf.len().min(next.buf.len());
        next.buf[..keep].copy_from_slice(&self.buf[..keep]);
        Ok(next)
    }

    pub fn set(&mut self, row_idx: usize, is_valid: bool) -> Result<()> {
        let byte_idx = row_idx / 8;
        let bit_idx = row_idx % 8;
        if byte_idx >= self.buf.len() {
            return Err(Error::IndexOutOfBounds {
                index: row_idx,
                bound: self.bit_capacity(),
            });
        }
        let mask = 1u8 << bit_idx;
        if is_valid {
            self.buf[byte_idx] |= mask;
        } else {
            self.buf[byte_idx] &= !mask;
        }
        Ok(())
    }

    pub fn is_valid(&self, row_idx: usize) -> Result<bool> {
        if row_idx / 8 >= self.buf.len() {
            return Err(Error::IndexOutOfBounds {
                index: row_idx,
                bound: self.bit_capacity(),
            });
        }
        Ok(bit_is_set(&self.buf, row_idx))
    }

    pub fn count_valid(&self, row_count: usize) -> usize {
        count_set_bits(&self.buf, row_count.min(self.bit_capacity()))
    }

    pub fn clear_all(&mut self) {
        self.buf.fill(0);
    }

    pub fn bit_capacity(&self) -> usize {
        self.buf.len() * 8
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }
}
