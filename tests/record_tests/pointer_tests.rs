//! Tests for the pointer model
//!
//! These tests verify:
//! - Offset <-> (block, in-block) conversions
//! - Sentinel encoding as -1
//! - Rejection of negative and out-of-range pointers

use seqfile::error::SeqFileError;
use seqfile::pointer::{decode_pointer, encode_pointer, RecordPointer, NULL_POINTER};

// =============================================================================
// Coordinate Conversion Tests
// =============================================================================

#[test]
fn test_from_offset_splits_block_and_position() {
    let ptr = RecordPointer::from_offset(70, 32);

    assert_eq!(ptr.block, 2);
    assert_eq!(ptr.in_block, 6);
    assert_eq!(ptr.to_offset(32), 70);
}

#[test]
fn test_offset_at_block_start() {
    let ptr = RecordPointer::from_offset(64, 32);

    assert_eq!(ptr, RecordPointer::new(2, 0));
    assert_eq!(ptr.remaining_in_block(32), 32);
}

#[test]
fn test_remaining_in_block() {
    let ptr = RecordPointer::from_offset(60, 32);

    assert_eq!(ptr.remaining_in_block(32), 4);
}

#[test]
fn test_display_shows_coordinates() {
    let ptr = RecordPointer::new(3, 17);

    assert_eq!(ptr.to_string(), "block #3, offset 17");
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_sentinel_encodes_as_minus_one() {
    let bytes = encode_pointer(None).unwrap();

    assert_eq!(bytes, [0xFF, 0xFF, 0xFF, 0xFF]);
    assert_eq!(i32::from_be_bytes(bytes), NULL_POINTER);
    assert_eq!(decode_pointer(bytes).unwrap(), None);
}

#[test]
fn test_pointer_is_big_endian() {
    let bytes = encode_pointer(Some(0x0102_0304)).unwrap();

    assert_eq!(bytes, [0x01, 0x02, 0x03, 0x04]);
    assert_eq!(decode_pointer(bytes).unwrap(), Some(0x0102_0304));
}

#[test]
fn test_zero_is_a_valid_pointer() {
    assert_eq!(decode_pointer([0, 0, 0, 0]).unwrap(), Some(0));
}

#[test]
fn test_negative_pointer_is_corrupt() {
    let result = decode_pointer((-7i32).to_be_bytes());

    assert!(matches!(
        result,
        Err(SeqFileError::CorruptPointer { pointer: -7, .. })
    ));
}

#[test]
fn test_offset_beyond_i32_cannot_be_encoded() {
    let result = encode_pointer(Some(i32::MAX as u64 + 1));

    assert!(matches!(result, Err(SeqFileError::CorruptPointer { .. })));
}
