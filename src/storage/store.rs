//! Block Store
//!
//! Whole-block reads and writes over one file per table.
//!
//! ## Responsibilities
//! - Create/truncate table files with an initialized header block
//! - Read block N (fails past end of file)
//! - Write block N (zero-extends the file as needed)
//! - Keep the optional block cache coherent

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Result, SeqFileError};

use super::{Block, BlockCache, CacheStats, HEADER_LEN};

/// File extension of table files
const TABLE_EXTENSION: &str = "seq";

/// Block-granular access to table files
///
/// ## Concurrency:
/// - `cache`: behind a Mutex so reads can take `&self`
/// - File handles are opened per call; there is no shared file state
pub struct BlockStore {
    /// Directory where table files live
    tables_dir: PathBuf,

    /// Fixed block size for every file
    block_size: usize,

    /// fsync after each write
    sync_writes: bool,

    /// Recently read blocks
    cache: Mutex<BlockCache>,
}

impl BlockStore {
    /// Open a store rooted at the config's tables directory, creating it
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        let tables_dir = config.tables_dir();
        fs::create_dir_all(&tables_dir)?;

        Ok(Self {
            tables_dir,
            block_size: config.block_size,
            sync_writes: config.sync_writes,
            cache: Mutex::new(BlockCache::new(config.cache_capacity)),
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Path of a table's block file
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.tables_dir.join(format!("{}.{}", table, TABLE_EXTENSION))
    }

    /// Whether the table's block file exists
    pub fn table_exists(&self, table: &str) -> bool {
        self.table_path(table).is_file()
    }

    /// Create (or truncate) a table file and write an empty header block
    pub fn create_file(&self, table: &str) -> Result<()> {
        let path = self.table_path(table);
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        let header = Block::header(self.block_size)?;
        file.write_all(header.as_bytes())?;
        file.sync_all()?;

        self.cache.lock().invalidate_table(table);
        tracing::debug!(table, path = %path.display(), "created table file");
        Ok(())
    }

    /// Delete a table file
    pub fn remove_file(&self, table: &str) -> Result<()> {
        self.cache.lock().invalidate_table(table);
        match fs::remove_file(self.table_path(table)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(SeqFileError::TableNotFound(table.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Current file length in bytes
    pub fn file_len(&self, table: &str) -> Result<u64> {
        let file = self.open_file(table, false)?;
        Ok(file.metadata()?.len())
    }

    /// Number of whole blocks in the file
    pub fn block_count(&self, table: &str) -> Result<u64> {
        Ok(self.file_len(table)? / self.block_size as u64)
    }

    /// Block size recorded in a table's header
    ///
    /// Reads only the fixed header prefix, so it works whatever block size
    /// this store is configured with.
    pub fn stored_block_size(&self, table: &str) -> Result<usize> {
        let mut file = self.open_file(table, false)?;
        let mut prefix = vec![0u8; HEADER_LEN];
        file.read_exact(&mut prefix).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => SeqFileError::Storage(format!(
                "table {} has a truncated header",
                table
            )),
            _ => SeqFileError::Io(e),
        })?;
        Block::from_bytes(prefix, HEADER_LEN)?.stored_block_size()
    }

    /// Read one block
    ///
    /// Fails with `BlockNotFound` if the file is shorter than
    /// `(block_number + 1) * block_size`.
    pub fn read_block(&self, table: &str, block_number: u64) -> Result<Block> {
        if let Some(block) = self.cache.lock().get(table, block_number) {
            return Ok(block);
        }

        let mut file = self.open_file(table, false)?;
        let position = block_number * self.block_size as u64;
        if file.metadata()?.len() < position + self.block_size as u64 {
            return Err(SeqFileError::BlockNotFound {
                table: table.to_string(),
                block: block_number,
            });
        }

        file.seek(SeekFrom::Start(position))?;
        let mut data = vec![0u8; self.block_size];
        file.read_exact(&mut data)?;
        let block = Block::from_bytes(data, self.block_size)?;

        tracing::trace!(table, block = block_number, "read block");
        self.cache.lock().put(table, block_number, block.clone());
        Ok(block)
    }

    /// Write one whole block, extending the file with zeros if needed
    pub fn write_block(&self, table: &str, block_number: u64, block: &Block) -> Result<()> {
        if block.len() != self.block_size {
            return Err(SeqFileError::Storage(format!(
                "refusing partial write: block is {} bytes, expected {}",
                block.len(),
                self.block_size
            )));
        }

        let mut file = self.open_file(table, true)?;
        let position = block_number * self.block_size as u64;
        let end = position + self.block_size as u64;
        if file.metadata()?.len() < end {
            file.set_len(end)?;
        }

        file.seek(SeekFrom::Start(position))?;
        file.write_all(block.as_bytes())?;
        if self.sync_writes {
            file.sync_data()?;
        }

        self.cache.lock().invalidate(table, block_number);
        tracing::trace!(table, block = block_number, "wrote block");
        Ok(())
    }

    /// Snapshot of the cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    fn open_file(&self, table: &str, write: bool) -> Result<File> {
        let path = self.table_path(table);
        open_existing(&path, write).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SeqFileError::TableNotFound(table.to_string()),
            _ => SeqFileError::Io(e),
        })
    }
}

fn open_existing(path: &Path, write: bool) -> std::io::Result<File> {
    OpenOptions::new().read(true).write(write).open(path)
}
