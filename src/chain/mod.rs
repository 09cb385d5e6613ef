//! Chain Module
//!
//! The key-ordered, singly linked list of records rooted at the header
//! block.
//!
//! ## Responsibilities
//! - Append records at the table's cursor (splitting across blocks)
//! - Thread new records into sorted position by rewriting pointers only
//! - Walk the chain with cycle, bounds and iteration-limit guards
//! - Field projection and key-range scans
//! - Read-only verification and explicit repair
//!
//! ## Chain Layout
//! ```text
//! header ──► [a | next] ──► [b | next] ──► [c | -1]
//!  blk 0      blk 1          blk 1..2       blk 3
//! ```
//! Physical order is append order; logical order follows the pointers.

mod insert;
mod maintenance;
mod scan;
mod walker;

use crate::config::Config;
use crate::error::{Result, SeqFileError};
use crate::pointer::{RecordPointer, POINTER_WIDTH};
use crate::record::{self, Record};
use crate::schema::Schema;
use crate::storage::{Block, BlockStore};

pub use insert::InsertSummary;
pub use maintenance::{ChainDump, ChainLink, ChainReport, RepairOutcome};
pub use scan::Scan;
pub use walker::{ChainEntry, ChainWalker, ScanStop};

/// Handle on one table: its schema and append cursor
///
/// The cursor is owned here rather than in shared state, so every mutating
/// chain operation needs `&mut Table`.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    schema: Schema,
    field_lengths: Vec<usize>,
    /// Next free byte offset for appends
    cursor: u64,
}

impl Table {
    pub(crate) fn new(name: impl Into<String>, schema: Schema, cursor: u64) -> Self {
        let field_lengths = schema.field_lengths();
        Self {
            name: name.into(),
            schema,
            field_lengths,
            cursor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn field_lengths(&self) -> &[usize] {
        &self.field_lengths
    }

    /// Next append position (logical byte offset)
    pub fn cursor(&self) -> u64 {
        self.cursor
    }
}

/// Owns the block store and implements all chain policy
pub struct ChainManager {
    store: BlockStore,
    block_size: usize,
    max_chain_length: usize,
}

impl ChainManager {
    /// Create a chain manager over the config's data directory
    pub fn new(config: &Config) -> Result<Self> {
        let store = BlockStore::open(config)?;
        Ok(Self {
            store,
            block_size: config.block_size,
            max_chain_length: config.max_chain_length,
        })
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn max_chain_length(&self) -> usize {
        self.max_chain_length
    }

    /// Create (or truncate) a table file with an empty chain
    pub fn create_table(&self, name: &str, schema: Schema) -> Result<Table> {
        self.store.create_file(name)?;
        tracing::info!(table = name, fields = schema.len(), "created table");
        Ok(Table::new(name, schema, self.first_record_offset()))
    }

    /// Open an existing table file, recovering its append cursor
    pub fn open_table(&self, name: &str, schema: Schema) -> Result<Table> {
        if !self.store.table_exists(name) {
            return Err(SeqFileError::TableNotFound(name.to_string()));
        }
        let stored = self.store.stored_block_size(name)?;
        if stored != self.block_size {
            return Err(SeqFileError::Config(format!(
                "table {} was written with block size {}, opened with {}",
                name, stored, self.block_size
            )));
        }
        let mut table = Table::new(name, schema, self.first_record_offset());
        table.cursor = self.recover_cursor(&table)?;
        tracing::debug!(table = name, cursor = table.cursor, "opened table");
        Ok(table)
    }

    /// Reinitialize the header and rewind the cursor
    pub fn reset(&self, table: &mut Table) -> Result<()> {
        self.store.create_file(&table.name)?;
        table.cursor = self.first_record_offset();
        tracing::debug!(table = %table.name, "reset table");
        Ok(())
    }

    /// Offset of the first byte after the header block
    pub fn first_record_offset(&self) -> u64 {
        self.block_size as u64
    }

    // =========================================================================
    // Header access
    // =========================================================================

    /// Head pointer stored in block 0
    pub fn head(&self, table: &Table) -> Result<Option<u64>> {
        self.store.read_block(&table.name, 0)?.head_pointer()
    }

    fn set_head(&self, table: &Table, head: Option<u64>) -> Result<()> {
        let mut header = self.store.read_block(&table.name, 0)?;
        header.set_head_pointer(head)?;
        self.store.write_block(&table.name, 0, &header)
    }

    /// Record the append cursor in block 0 so a reopen never rewinds it
    fn store_cursor(&self, table: &Table, cursor: u64) -> Result<()> {
        let mut header = self.store.read_block(&table.name, 0)?;
        header.set_stored_cursor(cursor)?;
        self.store.write_block(&table.name, 0, &header)
    }

    // =========================================================================
    // Byte-span I/O across block boundaries
    // =========================================================================

    /// Read `len` bytes starting at a logical offset, crossing blocks
    pub fn read_bytes(&self, table: &Table, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(len);
        let mut pos = RecordPointer::from_offset(offset, self.block_size);

        while out.len() < len {
            let block = self.store.read_block(&table.name, pos.block)?;
            let take = (len - out.len()).min(pos.remaining_in_block(self.block_size));
            out.extend_from_slice(&block.as_bytes()[pos.in_block..pos.in_block + take]);
            pos = RecordPointer::new(pos.block + 1, 0);
        }

        Ok(out)
    }

    /// Write bytes at a logical offset, crossing blocks and growing the file
    ///
    /// Each touched block is read, patched and written back whole.
    pub fn write_bytes(&self, table: &Table, offset: u64, bytes: &[u8]) -> Result<()> {
        let existing = self.store.block_count(&table.name)?;
        let mut pos = RecordPointer::from_offset(offset, self.block_size);
        let mut written = 0;

        while written < bytes.len() {
            let mut block = if pos.block < existing {
                self.store.read_block(&table.name, pos.block)?
            } else {
                Block::new(self.block_size)
            };

            let take = (bytes.len() - written).min(pos.remaining_in_block(self.block_size));
            block.as_bytes_mut()[pos.in_block..pos.in_block + take]
                .copy_from_slice(&bytes[written..written + take]);
            self.store.write_block(&table.name, pos.block, &block)?;

            written += take;
            pos = RecordPointer::new(pos.block + 1, 0);
        }

        Ok(())
    }

    // =========================================================================
    // Record access
    // =========================================================================

    /// Read and decode the record starting at `offset`
    ///
    /// `file_len` bounds the read: a pointer outside the record area is a
    /// `CorruptPointer`, a record running past the end is a
    /// `TruncatedRecord`. Neither touches a missing block. Bytes that do
    /// not decode as a record of this schema are a `CorruptRecord`.
    pub fn read_record(&self, table: &Table, offset: u64, file_len: u64) -> Result<Record> {
        if offset < self.first_record_offset() || offset >= file_len {
            return Err(SeqFileError::CorruptPointer {
                offset,
                pointer: offset as i64,
            });
        }

        let bitmap = self.read_bytes(table, offset, record::NULL_BITMAP_SIZE)?[0];
        let len = record::encoded_len(bitmap, &table.field_lengths);
        let available = file_len - offset;
        if (len as u64) > available {
            return Err(SeqFileError::TruncatedRecord {
                needed: len,
                available: available as usize,
            });
        }

        let bytes = self.read_bytes(table, offset, len)?;
        record::decode(&bytes, &table.field_lengths).map_err(|e| match e {
            SeqFileError::CorruptPointer { pointer, .. } => {
                SeqFileError::CorruptPointer { offset, pointer }
            }
            SeqFileError::SchemaMismatch(reason) => SeqFileError::CorruptRecord { offset, reason },
            other => other,
        })
    }

    /// Rewrite only the next-pointer trailer of the record at `offset`
    ///
    /// The record's size is re-derived from its own bitmap; the trailer may
    /// straddle a block boundary.
    fn write_next_pointer(
        &self,
        table: &Table,
        offset: u64,
        record: &Record,
        next: Option<u64>,
    ) -> Result<()> {
        let len = record.encoded_len(&table.field_lengths);
        let trailer_at = offset + (len - POINTER_WIDTH) as u64;
        let bytes = crate::pointer::encode_pointer(next)?;
        self.write_bytes(table, trailer_at, &bytes)
    }
}
