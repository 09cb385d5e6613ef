//! Error types for seqfile
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using SeqFileError
pub type Result<T> = std::result::Result<T, SeqFileError>;

/// Unified error type for seqfile operations
#[derive(Debug, Error)]
pub enum SeqFileError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Block {block} not found in table {table}")]
    BlockNotFound { table: String, block: u64 },

    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Chain Corruption Errors (recovered locally by chain walks)
    // -------------------------------------------------------------------------
    #[error("Truncated record: needed {needed} bytes, {available} available")]
    TruncatedRecord { needed: usize, available: usize },

    #[error("Corrupt pointer {pointer} in record at offset {offset}")]
    CorruptPointer { offset: u64, pointer: i64 },

    #[error("Cycle detected: offset {offset} already visited")]
    CycleDetected { offset: u64 },

    #[error("Corrupt record at offset {offset}: {reason}")]
    CorruptRecord { offset: u64, reason: String },

    // -------------------------------------------------------------------------
    // Schema Errors
    // -------------------------------------------------------------------------
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Field {field} not found in table {table}")]
    FieldNotFound { table: String, field: String },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid table name: {0:?}")]
    InvalidName(String),

    // -------------------------------------------------------------------------
    // Catalog / Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Input Errors
    // -------------------------------------------------------------------------
    #[error("Parse error: {0}")]
    Parse(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SeqFileError {
    /// True for the errors a chain walk absorbs as "end of chain".
    pub fn is_chain_corruption(&self) -> bool {
        matches!(
            self,
            SeqFileError::TruncatedRecord { .. }
                | SeqFileError::CorruptPointer { .. }
                | SeqFileError::CycleDetected { .. }
                | SeqFileError::CorruptRecord { .. }
        )
    }
}

impl From<bincode::Error> for SeqFileError {
    fn from(e: bincode::Error) -> Self {
        SeqFileError::Serialization(e.to_string())
    }
}
