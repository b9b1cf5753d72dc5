use core::fmt;
use std::mem;
use std::sync::Arc;

use crate::holder::{FixedSizeBinaryHolder, NullableFixedSizeBinaryHolder};
use crate::memory::{Buffer, BufferAllocator};
use crate::schema::{Field, FixedSizeBinaryType};
use crate::validity::ValidityBitmap;
use crate::view::{FixedSizeBinaryIter, FixedSizeBinaryView};
use crate::{Error, Result};

/// Slots reserved by [`FixedSizeBinaryVector::allocate_new`] unless
/// [`FixedSizeBinaryVector::set_initial_capacity`] says otherwise.
pub const DEFAULT_INITIAL_CAPACITY: usize = 4096;

fn size_overflow() -> Error {
    Error::Other("size overflow".to_string())
}

/// Returns `source[offset..offset + len]` or an out-of-bounds error naming the
/// end of the requested range.
fn source_range(source: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    let end = offset.checked_add(len).ok_or_else(size_overflow)?;
    source.get(offset..end).ok_or(Error::IndexOutOfBounds {
        index: end,
        bound: source.len(),
    })
}

/// Nullable column of byte strings that all have the same length.
///
/// Element `i` lives at `[i * byte_width, (i + 1) * byte_width)` of a single
/// value buffer; a separate bitmap records which slots hold a value. A new
/// column has no capacity until [`allocate_new`](Self::allocate_new) is called.
///
/// Writes come in two flavours. `set*` requires the slot to be inside the
/// current capacity; `set*_safe` grows the buffers (doubling) first. Both
/// reject any input whose length is not exactly `byte_width` with
/// [`Error::WidthMismatch`] before touching the column.
pub struct FixedSizeBinaryVector {
    field: Field,
    byte_width: usize,
    allocator: Arc<dyn BufferAllocator>,
    values: Buffer,
    validity: ValidityBitmap,
    value_capacity: usize,
    value_count: usize,
    initial_capacity: usize,
}

impl fmt::Debug for FixedSizeBinaryVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedSizeBinaryVector")
            .field("field", &self.field)
            .field("value_capacity", &self.value_capacity)
            .field("value_count", &self.value_count)
            .finish_non_exhaustive()
    }
}

impl FixedSizeBinaryVector {
    pub fn new(field: Field, allocator: Arc<dyn BufferAllocator>) -> Self {
        let byte_width = field.ty.byte_width();
        Self {
            field,
            byte_width,
            allocator,
            values: Buffer::empty(),
            validity: ValidityBitmap::empty(),
            value_capacity: 0,
            value_count: 0,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }

    pub fn with_byte_width(
        name: impl Into<String>,
        byte_width: i32,
        allocator: Arc<dyn BufferAllocator>,
    ) -> Result<Self> {
        let ty = FixedSizeBinaryType::new(byte_width)?;
        Ok(Self::new(Field::new(name, ty), allocator))
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn byte_width(&self) -> usize {
        self.byte_width
    }

    pub fn value_capacity(&self) -> usize {
        self.value_capacity
    }

    pub fn value_count(&self) -> usize {
        self.value_count
    }

    pub fn is_empty(&self) -> bool {
        self.value_count == 0
    }

    pub fn null_count(&self) -> usize {
        self.value_count - self.validity.count_valid(self.value_count)
    }

    /// Bytes currently held by the value buffer and the validity bitmap.
    pub fn buffer_size(&self) -> usize {
        self.values.len() + self.validity.as_bytes().len()
    }

    pub fn set_initial_capacity(&mut self, capacity: usize) {
        self.initial_capacity = capacity;
    }

    pub fn allocate_new(&mut self) -> Result<()> {
        self.allocate_new_with_capacity(self.initial_capacity)
    }

    /// Replaces both buffers with fresh zeroed ones holding `capacity` null
    /// slots. Previous contents are released; on failure they are kept.
    pub fn allocate_new_with_capacity(&mut self, capacity: usize) -> Result<()> {
        let len = capacity
            .checked_mul(self.byte_width)
            .ok_or_else(|| self.capacity_overflow())?;
        let values = self.allocator.buffer(len)?;
        let validity = ValidityBitmap::new_all_invalid(self.allocator.as_ref(), capacity)?;
        log::trace!(
            "allocated column '{}' with {capacity} slots of {} bytes",
            self.field.name,
            self.byte_width
        );
        self.values = values;
        self.validity = validity;
        self.value_capacity = capacity;
        self.value_count = 0;
        Ok(())
    }

    /// Doubles the capacity, or allocates the initial capacity if there is none.
    pub fn realloc(&mut self) -> Result<()> {
        let target = self.next_capacity(self.value_capacity)?;
        self.grow_to(target)
    }

    /// Growth targets that cannot be addressed are reported like any other
    /// allocation the allocator cannot satisfy.
    fn capacity_overflow(&self) -> Error {
        Error::AllocationFailure {
            requested: usize::MAX,
            limit: self.allocator.limit(),
        }
    }

    fn next_capacity(&self, current: usize) -> Result<usize> {
        if current == 0 {
            Ok(self.initial_capacity.max(1))
        } else {
            current.checked_mul(2).ok_or_else(|| self.capacity_overflow())
        }
    }

    /// Grows until at least `required` slots are backed by memory.
    fn reserve_slots(&mut self, required: usize) -> Result<()> {
        if required <= self.value_capacity {
            return Ok(());
        }
        let mut target = self.next_capacity(self.value_capacity)?;
        while target < required {
            target = target.checked_mul(2).ok_or_else(|| self.capacity_overflow())?;
        }
        self.grow_to(target)
    }

    fn reserve_index(&mut self, index: usize) -> Result<()> {
        let required = index.checked_add(1).ok_or_else(|| self.capacity_overflow())?;
        self.reserve_slots(required)
    }

    fn grow_to(&mut self, capacity: usize) -> Result<()> {
        let len = capacity
            .checked_mul(self.byte_width)
            .ok_or_else(|| self.capacity_overflow())?;
        let mut values = self.allocator.buffer(len)?;
        let kept = self.values.len().min(len);
        values[..kept].copy_from_slice(&self.values[..kept]);
        let validity = self.validity.grown(self.allocator.as_ref(), capacity)?;
        log::debug!(
            "reallocating column '{}': {} -> {capacity} slots",
            self.field.name,
            self.value_capacity
        );
        self.values = values;
        self.validity = validity;
        self.value_capacity = capacity;
        Ok(())
    }

    pub fn set_value_count(&mut self, value_count: usize) -> Result<()> {
        self.reserve_slots(value_count)?;
        self.value_count = value_count;
        Ok(())
    }

    pub fn is_null(&self, index: usize) -> Result<bool> {
        self.check_readable(index)?;
        Ok(!self.validity.is_valid(index)?)
    }

    /// Borrowed slice of the element at `index`, or `None` for a null slot.
    pub fn get(&self, index: usize) -> Result<Option<&[u8]>> {
        if self.is_null(index)? {
            return Ok(None);
        }
        let start = index * self.byte_width;
        Ok(Some(&self.values[start..start + self.byte_width]))
    }

    pub fn get_holder(&self, index: usize) -> Result<NullableFixedSizeBinaryHolder<'_>> {
        let byte_width = self.field.ty.byte_width() as i32;
        if self.is_null(index)? {
            return Ok(NullableFixedSizeBinaryHolder::null(byte_width));
        }
        Ok(NullableFixedSizeBinaryHolder {
            is_set: true,
            byte_width,
            buffer: &self.values,
            offset: index * self.byte_width,
        })
    }

    pub fn view(&self) -> FixedSizeBinaryView<'_> {
        let validity_len = self.value_count.div_ceil(8);
        FixedSizeBinaryView {
            byte_width: self.byte_width,
            len: self.value_count,
            validity: &self.validity.as_bytes()[..validity_len],
            values: &self.values[..self.value_count * self.byte_width],
        }
    }

    pub fn iter(&self) -> FixedSizeBinaryIter<'_> {
        self.view().iter()
    }

    fn check_readable(&self, index: usize) -> Result<()> {
        if index >= self.value_count {
            return Err(Error::IndexOutOfBounds {
                index,
                bound: self.value_count,
            });
        }
        Ok(())
    }

    fn check_writable(&self, index: usize) -> Result<()> {
        if index >= self.value_capacity {
            return Err(Error::IndexOutOfBounds {
                index,
                bound: self.value_capacity,
            });
        }
        Ok(())
    }

    fn check_width(&self, actual: i64) -> Result<()> {
        if actual != self.byte_width as i64 {
            return Err(Error::WidthMismatch {
                expected: self.byte_width,
                actual,
            });
        }
        Ok(())
    }

    fn holder_bytes<'h>(&self, holder: &FixedSizeBinaryHolder<'h>) -> Result<&'h [u8]> {
        self.check_width(i64::from(holder.byte_width))?;
        source_range(holder.buffer, holder.offset, self.byte_width)
    }

    /// `src` must already be exactly `byte_width` long.
    fn write_slot(&mut self, index: usize, src: &[u8]) -> Result<()> {
        self.check_writable(index)?;
        let start = index * self.byte_width;
        self.values[start..start + self.byte_width].copy_from_slice(src);
        self.validity.set(index, true)
    }

    pub fn set(&mut self, index: usize, bytes: &[u8]) -> Result<()> {
        self.check_width(bytes.len() as i64)?;
        self.write_slot(index, bytes)
    }

    pub fn set_safe(&mut self, index: usize, bytes: &[u8]) -> Result<()> {
        self.check_width(bytes.len() as i64)?;
        self.reserve_index(index)?;
        self.write_slot(index, bytes)
    }

    /// Copies `source[source_offset..source_offset + source_length]` into the
    /// slot. `source_length` has to equal the column width.
    pub fn set_from_buffer(
        &mut self,
        index: usize,
        source: &[u8],
        source_offset: usize,
        source_length: usize,
    ) -> Result<()> {
        self.check_width(source_length as i64)?;
        let src = source_range(source, source_offset, source_length)?;
        self.write_slot(index, src)
    }

    pub fn set_from_buffer_safe(
        &mut self,
        index: usize,
        source: &[u8],
        source_offset: usize,
        source_length: usize,
    ) -> Result<()> {
        self.check_width(source_length as i64)?;
        let src = source_range(source, source_offset, source_length)?;
        self.reserve_index(index)?;
        self.write_slot(index, src)
    }

    pub fn set_holder(&mut self, index: usize, holder: FixedSizeBinaryHolder<'_>) -> Result<()> {
        let src = self.holder_bytes(&holder)?;
        self.write_slot(index, src)
    }

    pub fn set_holder_safe(
        &mut self,
        index: usize,
        holder: FixedSizeBinaryHolder<'_>,
    ) -> Result<()> {
        let src = self.holder_bytes(&holder)?;
        self.reserve_index(index)?;
        self.write_slot(index, src)
    }

    /// A holder with `is_set == false` nulls the slot; its width is not checked.
    pub fn set_nullable_holder(
        &mut self,
        index: usize,
        holder: NullableFixedSizeBinaryHolder<'_>,
    ) -> Result<()> {
        match holder.as_value() {
            Some(value) => self.set_holder(index, value),
            None => self.set_null(index),
        }
    }

    pub fn set_nullable_holder_safe(
        &mut self,
        index: usize,
        holder: NullableFixedSizeBinaryHolder<'_>,
    ) -> Result<()> {
        match holder.as_value() {
            Some(value) => self.set_holder_safe(index, value),
            None => self.set_null_safe(index),
        }
    }

    pub fn set_with_validity(&mut self, index: usize, is_set: bool, bytes: &[u8]) -> Result<()> {
        if is_set {
            self.set(index, bytes)
        } else {
            self.set_null(index)
        }
    }

    pub fn set_with_validity_safe(
        &mut self,
        index: usize,
        is_set: bool,
        bytes: &[u8],
    ) -> Result<()> {
        if is_set {
            self.set_safe(index, bytes)
        } else {
            self.set_null_safe(index)
        }
    }

    /// Clears the validity bit. The slot's bytes are left as they were.
    pub fn set_null(&mut self, index: usize) -> Result<()> {
        self.check_writable(index)?;
        self.validity.set(index, false)
    }

    pub fn set_null_safe(&mut self, index: usize) -> Result<()> {
        self.reserve_index(index)?;
        self.validity.set(index, false)
    }

    /// Copies element `from_index` of `from` (value or null) into `this_index`.
    pub fn copy_from(
        &mut self,
        from_index: usize,
        this_index: usize,
        from: &FixedSizeBinaryVector,
    ) -> Result<()> {
        self.check_width(from.byte_width as i64)?;
        match from.get(from_index)? {
            Some(bytes) => self.write_slot(this_index, bytes),
            None => self.set_null(this_index),
        }
    }

    pub fn copy_from_safe(
        &mut self,
        from_index: usize,
        this_index: usize,
        from: &FixedSizeBinaryVector,
    ) -> Result<()> {
        self.check_width(from.byte_width as i64)?;
        let value = from.get(from_index)?;
        self.reserve_index(this_index)?;
        match value {
            Some(bytes) => self.write_slot(this_index, bytes),
            None => self.set_null(this_index),
        }
    }

    /// Zeroes every slot and marks it null. Capacity is kept.
    pub fn reset(&mut self) {
        self.values.fill(0);
        self.validity.clear_all();
        self.value_count = 0;
    }

    /// Releases both buffers back to the allocator.
    pub fn clear(&mut self) {
        self.values = Buffer::empty();
        self.validity = ValidityBitmap::empty();
        self.value_capacity = 0;
        self.value_count = 0;
    }

    /// Moves the buffers into a new column with the same field and allocator,
    /// leaving this one cleared.
    pub fn transfer(&mut self) -> FixedSizeBinaryVector {
        let target = FixedSizeBinaryVector {
            field: self.field.clone(),
            byte_width: self.byte_width,
            allocator: Arc::clone(&self.allocator),
            values: mem::replace(&mut self.values, Buffer::empty()),
            validity: mem::replace(&mut self.validity, ValidityBitmap::empty()),
            value_capacity: self.value_capacity,
            value_count: self.value_count,
            initial_capacity: self.initial_capacity,
        };
        self.value_capacity = 0;
        self.value_count = 0;
        target
    }
}
