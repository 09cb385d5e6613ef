//! # seqfile
//!
//! A block-addressed, key-ordered sequential record file with:
//! - Fixed-size blocks, one file per table, block 0 as the header
//! - Fixed-length text fields with a null bitmap per record
//! - A singly linked chain kept sorted by the first field
//! - Append-only writes: inserts only ever rewrite pointers
//! - Corruption-tolerant scans plus explicit verify and repair
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 CLI / Database facade                        │
//! │           (catalog lookups, name validation)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Catalog   │          │    Chain    │
//!   │  (schemas)  │          │  (insert,   │
//!   └─────────────┘          │  walk, scan)│
//!                            └──────┬──────┘
//!                                   │  record codec
//!                                   ▼
//!                           ┌─────────────┐
//!                           │ Block Store │
//!                           │ + LRU cache │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod pointer;

pub mod storage;
pub mod record;
pub mod schema;
pub mod chain;
pub mod loader;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{SeqFileError, Result};
pub use config::Config;
pub use engine::Database;
pub use schema::{FieldDef, Schema};
pub use record::Record;
pub use chain::{ChainManager, Scan, ScanStop, Table};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of seqfile
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
