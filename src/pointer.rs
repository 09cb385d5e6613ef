//! Pointer Model
//!
//! A record pointer is a logical byte offset into a table file. The same
//! position can be expressed as a (block number, in-block offset) pair:
//!
//! ```text
//! offset = block * block_size + in_block
//! ```
//!
//! On disk a pointer is a big-endian `i32`. The sentinel `-1` (all bits set)
//! means "no successor" in a record trailer and "empty chain" in the header.
//! In memory the sentinel is `None`, so it can never be turned into a
//! [`RecordPointer`] by accident.

use std::fmt;

use crate::error::{Result, SeqFileError};

/// Width of an encoded pointer in bytes
pub const POINTER_WIDTH: usize = 4;

/// Raw on-disk value of the sentinel pointer
pub const NULL_POINTER: i32 = -1;

/// A record position split into block coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordPointer {
    /// Block number (block 0 is the header)
    pub block: u64,
    /// Byte offset inside the block
    pub in_block: usize,
}

impl RecordPointer {
    pub fn new(block: u64, in_block: usize) -> Self {
        Self { block, in_block }
    }

    /// Split a logical offset into (block, in-block offset)
    pub fn from_offset(offset: u64, block_size: usize) -> Self {
        let block_size = block_size as u64;
        Self {
            block: offset / block_size,
            in_block: (offset % block_size) as usize,
        }
    }

    /// Join the coordinates back into a logical offset
    pub fn to_offset(self, block_size: usize) -> u64 {
        self.block * block_size as u64 + self.in_block as u64
    }

    /// Bytes left in this pointer's block, counting the byte it points at
    pub fn remaining_in_block(self, block_size: usize) -> usize {
        block_size - self.in_block
    }
}

impl fmt::Display for RecordPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block #{}, offset {}", self.block, self.in_block)
    }
}

/// Encode an optional offset into its fixed-width form
///
/// `None` becomes the sentinel. Offsets that do not fit a non-negative
/// `i32` cannot be represented.
pub fn encode_pointer(offset: Option<u64>) -> Result<[u8; POINTER_WIDTH]> {
    let raw = match offset {
        None => NULL_POINTER,
        Some(off) => i32::try_from(off).map_err(|_| SeqFileError::CorruptPointer {
            offset: off,
            pointer: off as i64,
        })?,
    };
    Ok(raw.to_be_bytes())
}

/// Decode a fixed-width pointer
///
/// Negative values other than the sentinel are corrupt. The `offset` in the
/// returned error is 0 because the caller knows the owning record; chain
/// code re-tags it.
pub fn decode_pointer(bytes: [u8; POINTER_WIDTH]) -> Result<Option<u64>> {
    match i32::from_be_bytes(bytes) {
        NULL_POINTER => Ok(None),
        raw if raw < 0 => Err(SeqFileError::CorruptPointer {
            offset: 0,
            pointer: raw as i64,
        }),
        raw => Ok(Some(raw as u64)),
    }
}
