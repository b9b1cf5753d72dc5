use std::sync::Arc;

use crate::Error;
use crate::holder::{FixedSizeBinaryHolder, NullableFixedSizeBinaryHolder};
use crate::memory::{BufferAllocator, RootAllocator};
use crate::vector::FixedSizeBinaryVector;

const WIDTH: usize = 7;

fn new_vector(allocator: &RootAllocator, capacity: usize) -> FixedSizeBinaryVector {
    let mut v = FixedSizeBinaryVector::with_byte_width(
        "fixedSizeBinary",
        WIDTH as i32,
        Arc::new(allocator.clone()),
    )
    .unwrap();
    v.allocate_new_with_capacity(capacity).unwrap();
    v
}

fn mismatch(actual: i64) -> Error {
    Error::WidthMismatch {
        expected: WIDTH,
        actual,
    }
}

fn counting_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| i as u8).collect()
}

#[test]
fn every_write_rejects_short_and_long_input() {
    let allocator = RootAllocator::new(i32::MAX as usize);
    let mut v = new_vector(&allocator, 4);

    let small_width = WIDTH - 2;
    let large_width = WIDTH + 2;
    let small_bytes = counting_bytes(small_width);
    let large_bytes = counting_bytes(large_width);

    let mut small_buf = allocator.buffer(small_width).unwrap();
    small_buf.set_bytes(0, &small_bytes).unwrap();
    let mut large_buf = allocator.buffer(large_width).unwrap();
    large_buf.set_bytes(0, &large_bytes).unwrap();

    let small_holder = FixedSizeBinaryHolder::new(&small_buf, 0, small_width as i32);
    let large_holder = FixedSizeBinaryHolder::new(&large_buf, 0, large_width as i32);

    for (bytes, holder) in [(&small_bytes, small_holder), (&large_bytes, large_holder)] {
        let actual = bytes.len() as i64;
        assert_eq!(v.set(0, bytes).unwrap_err(), mismatch(actual));
        assert_eq!(v.set_safe(0, bytes).unwrap_err(), mismatch(actual));

        assert_eq!(v.set_holder(0, holder).unwrap_err(), mismatch(actual));
        assert_eq!(v.set_holder_safe(0, holder).unwrap_err(), mismatch(actual));
        assert_eq!(
            v.set_nullable_holder(0, holder.into()).unwrap_err(),
            mismatch(actual)
        );
        assert_eq!(
            v.set_nullable_holder_safe(0, holder.into()).unwrap_err(),
            mismatch(actual)
        );

        assert_eq!(
            v.set_from_buffer(0, bytes, 0, bytes.len()).unwrap_err(),
            mismatch(actual)
        );
        assert_eq!(
            v.set_from_buffer_safe(0, bytes, 0, bytes.len()).unwrap_err(),
            mismatch(actual)
        );

        assert_eq!(
            v.set_with_validity(0, true, bytes).unwrap_err(),
            mismatch(actual)
        );
        assert_eq!(
            v.set_with_validity_safe(0, true, bytes).unwrap_err(),
            mismatch(actual)
        );
    }
}

#[test]
fn rejected_write_leaves_slot_untouched() {
    let allocator = RootAllocator::default();
    let mut v = new_vector(&allocator, 2);
    v.set(0, &[42u8; WIDTH]).unwrap();

    let long = [1u8; WIDTH + 1];
    assert!(v.set(0, &long).is_err());
    assert!(v.set_safe(0, &long[..WIDTH - 1]).is_err());
    assert!(
        v.set_holder(0, FixedSizeBinaryHolder::new(&long, 0, (WIDTH + 1) as i32))
            .is_err()
    );
    assert!(v.set_from_buffer(0, &long, 1, WIDTH - 1).is_err());
    // a rejected write must not flip the validity bit of an empty slot either
    assert!(v.set(1, &long).is_err());

    v.set_value_count(2).unwrap();
    assert_eq!(v.get(0).unwrap(), Some(&[42u8; WIDTH][..]));
    assert!(v.is_null(1).unwrap());
}

#[test]
fn holder_width_is_checked_even_when_buffer_is_large_enough() {
    let allocator = RootAllocator::default();
    let mut v = new_vector(&allocator, 1);
    let backing = counting_bytes(32);

    for declared in [5, 9] {
        let holder = FixedSizeBinaryHolder::new(&backing, 0, declared);
        assert_eq!(
            v.set_holder(0, holder).unwrap_err(),
            mismatch(i64::from(declared))
        );
        assert_eq!(
            v.set_holder_safe(0, holder).unwrap_err(),
            mismatch(i64::from(declared))
        );
    }
    let negative = FixedSizeBinaryHolder::new(&backing, 0, -7);
    assert_eq!(v.set_holder(0, negative).unwrap_err(), mismatch(-7));

    let ok = FixedSizeBinaryHolder::new(&backing, 10, WIDTH as i32);
    v.set_holder(0, ok).unwrap();
    v.set_value_count(1).unwrap();
    assert_eq!(v.get(0).unwrap(), Some(&backing[10..17]));
}

#[test]
fn safe_write_with_bad_width_does_not_grow() {
    let allocator = RootAllocator::default();
    let mut v = new_vector(&allocator, 2);
    let before = allocator.allocated_bytes();

    assert_eq!(v.set_safe(100, &[0u8; 3]).unwrap_err(), mismatch(3));
    assert_eq!(
        v.set_from_buffer_safe(100, &[0u8; 16], 0, 8).unwrap_err(),
        mismatch(8)
    );
    assert_eq!(v.value_capacity(), 2);
    assert_eq!(allocator.allocated_bytes(), before);
}

#[test]
fn sub_buffer_must_cover_the_requested_range() {
    let allocator = RootAllocator::default();
    let mut v = new_vector(&allocator, 1);
    let source = counting_bytes(10);

    let err = v.set_from_buffer(0, &source, 5, WIDTH).unwrap_err();
    assert_eq!(
        err,
        Error::IndexOutOfBounds {
            index: 12,
            bound: 10
        }
    );
    let err = v
        .set_holder(0, FixedSizeBinaryHolder::new(&source, 4, WIDTH as i32))
        .unwrap_err();
    assert_eq!(
        err,
        Error::IndexOutOfBounds {
            index: 11,
            bound: 10
        }
    );

    v.set_from_buffer(0, &source, 3, WIDTH).unwrap();
    v.set_value_count(1).unwrap();
    assert_eq!(v.get(0).unwrap(), Some(&source[3..10]));
}

#[test]
fn null_holder_skips_width_check() {
    let allocator = RootAllocator::default();
    let mut v = new_vector(&allocator, 1);
    v.set(0, &[1u8; WIDTH]).unwrap();
    v.set_nullable_holder(0, NullableFixedSizeBinaryHolder::null(3))
        .unwrap();
    v.set_nullable_holder_safe(3, NullableFixedSizeBinaryHolder::null(99))
        .unwrap();
    v.set_value_count(4).unwrap();
    assert!(v.is_null(0).unwrap());
    assert!(v.is_null(3).unwrap());
}
