//! Configuration for seqfile
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, SeqFileError};
use crate::pointer::POINTER_WIDTH;
use crate::storage::HEADER_LEN;

/// Smallest block size accepted: the header block must fit its head
/// pointer, append cursor and block size.
pub const MIN_BLOCK_SIZE: usize = HEADER_LEN;

/// Main configuration for a seqfile database
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── catalog.bin      (schema catalog)
    ///     └── tables/          (one block file per table)
    pub data_dir: PathBuf,

    /// Size of every block in bytes; block 0 of each file is the header
    pub block_size: usize,

    /// fsync after every block write
    pub sync_writes: bool,

    // -------------------------------------------------------------------------
    // Cache Configuration
    // -------------------------------------------------------------------------
    /// Number of blocks kept in the LRU read cache (0 disables it)
    pub cache_capacity: usize,

    // -------------------------------------------------------------------------
    // Chain Configuration
    // -------------------------------------------------------------------------
    /// Upper bound on records visited by a single chain walk
    pub max_chain_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./seqfile_data"),
            block_size: 32,
            sync_writes: true,
            cache_capacity: 8,
            max_chain_length: 100_000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the values that the on-disk format depends on
    pub fn validate(&self) -> Result<()> {
        if self.block_size < MIN_BLOCK_SIZE {
            return Err(SeqFileError::Config(format!(
                "block size {} is below the minimum of {}",
                self.block_size, MIN_BLOCK_SIZE
            )));
        }
        if self.block_size > i32::MAX as usize {
            return Err(SeqFileError::Config(format!(
                "block size {} is not addressable by a {}-byte pointer",
                self.block_size, POINTER_WIDTH
            )));
        }
        if self.max_chain_length == 0 {
            return Err(SeqFileError::Config(
                "max chain length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory holding the table files
    pub fn tables_dir(&self) -> PathBuf {
        self.data_dir.join("tables")
    }

    /// Path of the schema catalog file
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("catalog.bin")
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the block size (in bytes)
    pub fn block_size(mut self, size: usize) -> Self {
        self.config.block_size = size;
        self
    }

    /// Enable or disable fsync after each block write
    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.config.sync_writes = sync;
        self
    }

    /// Set the block cache capacity (in blocks)
    pub fn cache_capacity(mut self, blocks: usize) -> Self {
        self.config.cache_capacity = blocks;
        self
    }

    /// Set the maximum number of records a chain walk may visit
    pub fn max_chain_length(mut self, count: usize) -> Self {
        self.config.max_chain_length = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
