//! Storage Module
//!
//! Fixed-size block storage, one file per table.
//!
//! ## Responsibilities
//! - Whole-block reads and writes
//! - Grow files on demand (zero-filled)
//! - Header block initialization
//! - Optional LRU block cache, invalidated on write
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Block 0: Header                        │
//! │ ┌──────────┬────────────┬──────────┬─┐ │
//! │ │ Head (4) │ Cursor (4) │ Size (4) │0│ │
//! │ └──────────┴────────────┴──────────┴─┘ │
//! ├────────────────────────────────────────┤
//! │ Block 1..N: Record bytes               │
//! │ ┌────────┬──────────┬──────┬────────┐  │
//! │ │Rec A   │ Rec B    │ Rec C (part)  │  │
//! │ └────────┴──────────┴──────┴────────┘  │
//! │ (records may continue into the next    │
//! │  block; no block header, no checksum)  │
//! └────────────────────────────────────────┘
//! ```

mod block;
mod cache;
mod store;

pub use block::{
    Block, HEADER_BLOCK_SIZE_OFFSET, HEADER_CURSOR_OFFSET, HEADER_LEN, HEADER_POINTER_OFFSET,
};
pub use cache::{BlockCache, CacheStats};
pub use store::BlockStore;
