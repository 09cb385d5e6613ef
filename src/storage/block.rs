//! Block
//!
//! A fixed-size byte buffer, the unit of file I/O.

use crate::error::{Result, SeqFileError};
use crate::pointer::{decode_pointer, encode_pointer, POINTER_WIDTH};

/// Offset of the head pointer inside the header block
pub const HEADER_POINTER_OFFSET: usize = 0;

/// Offset of the stored append cursor
pub const HEADER_CURSOR_OFFSET: usize = HEADER_POINTER_OFFSET + POINTER_WIDTH;

/// Offset of the block size the file was created with
pub const HEADER_BLOCK_SIZE_OFFSET: usize = HEADER_CURSOR_OFFSET + POINTER_WIDTH;

/// Bytes of the header block that carry data
pub const HEADER_LEN: usize = HEADER_BLOCK_SIZE_OFFSET + POINTER_WIDTH;

/// One block worth of bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    data: Vec<u8>,
}

impl Block {
    /// Create a zero-filled block
    pub fn new(block_size: usize) -> Self {
        Self {
            data: vec![0u8; block_size],
        }
    }

    /// Wrap existing bytes; the length must equal the block size
    pub fn from_bytes(data: Vec<u8>, block_size: usize) -> Result<Self> {
        if data.len() != block_size {
            return Err(SeqFileError::Storage(format!(
                "block data must be {} bytes, got {}",
                block_size,
                data.len()
            )));
        }
        Ok(Self { data })
    }

    /// Create an initialized header block: empty chain, cursor right
    /// after the header
    pub fn header(block_size: usize) -> Result<Self> {
        if block_size < HEADER_LEN {
            return Err(SeqFileError::Storage(format!(
                "block size {} cannot hold a {}-byte header",
                block_size, HEADER_LEN
            )));
        }
        let mut block = Self::new(block_size);
        block.set_head_pointer(None)?;
        block.set_stored_cursor(block_size as u64)?;
        block.write_u32(HEADER_BLOCK_SIZE_OFFSET, block_size as u64)?;
        Ok(block)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Read the head pointer (header block only)
    pub fn head_pointer(&self) -> Result<Option<u64>> {
        let end = HEADER_POINTER_OFFSET + POINTER_WIDTH;
        let raw: [u8; POINTER_WIDTH] = self.data[HEADER_POINTER_OFFSET..end]
            .try_into()
            .map_err(|_| SeqFileError::Storage("header block too small".to_string()))?;
        decode_pointer(raw)
    }

    /// Overwrite the head pointer (header block only)
    pub fn set_head_pointer(&mut self, head: Option<u64>) -> Result<()> {
        let bytes = encode_pointer(head)?;
        self.data[HEADER_POINTER_OFFSET..HEADER_POINTER_OFFSET + POINTER_WIDTH]
            .copy_from_slice(&bytes);
        Ok(())
    }

    /// Append cursor recorded in the header block
    pub fn stored_cursor(&self) -> Result<u64> {
        self.read_u32(HEADER_CURSOR_OFFSET)
    }

    pub fn set_stored_cursor(&mut self, cursor: u64) -> Result<()> {
        self.write_u32(HEADER_CURSOR_OFFSET, cursor)
    }

    /// Block size recorded in the header block
    pub fn stored_block_size(&self) -> Result<usize> {
        Ok(self.read_u32(HEADER_BLOCK_SIZE_OFFSET)? as usize)
    }

    fn read_u32(&self, at: usize) -> Result<u64> {
        let raw: [u8; 4] = self
            .data
            .get(at..at + 4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| SeqFileError::Storage("header block too small".to_string()))?;
        Ok(u32::from_be_bytes(raw) as u64)
    }

    fn write_u32(&mut self, at: usize, value: u64) -> Result<()> {
        let value = u32::try_from(value).map_err(|_| {
            SeqFileError::Storage(format!("header value {} does not fit 4 bytes", value))
        })?;
        self.data
            .get_mut(at..at + 4)
            .ok_or_else(|| SeqFileError::Storage("header block too small".to_string()))?
            .copy_from_slice(&value.to_be_bytes());
        Ok(())
    }
}
