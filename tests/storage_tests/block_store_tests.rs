//! Tests for BlockStore
//!
//! These tests verify:
//! - Table file creation with an initialized header block
//! - Header fields: head pointer, append cursor, block size
//! - Whole-block reads and writes
//! - Zero extension when writing past the end
//! - BlockNotFound / TableNotFound errors
//! - Cache coherence across writes

use seqfile::error::SeqFileError;
use seqfile::storage::{Block, BlockStore};
use seqfile::Config;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store(cache_capacity: usize) -> (TempDir, BlockStore) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .block_size(32)
        .cache_capacity(cache_capacity)
        .build();
    let store = BlockStore::open(&config).unwrap();
    (temp_dir, store)
}

fn filled_block(byte: u8) -> Block {
    Block::from_bytes(vec![byte; 32], 32).unwrap()
}

// =============================================================================
// File Lifecycle Tests
// =============================================================================

#[test]
fn test_open_creates_tables_dir() {
    let (temp, _store) = setup_temp_store(0);

    assert!(temp.path().join("tables").is_dir());
}

#[test]
fn test_create_file_writes_empty_header() {
    let (_temp, store) = setup_temp_store(0);

    store.create_file("people").unwrap();

    assert!(store.table_exists("people"));
    assert!(store.table_path("people").ends_with("people.seq"));
    assert_eq!(store.file_len("people").unwrap(), 32);

    let header = store.read_block("people", 0).unwrap();
    assert_eq!(header.head_pointer().unwrap(), None);
    assert_eq!(&header.as_bytes()[..4], &[0xFF; 4]);
    assert_eq!(header.stored_cursor().unwrap(), 32);
    assert_eq!(header.stored_block_size().unwrap(), 32);
    assert_eq!(&header.as_bytes()[4..12], &[0, 0, 0, 32, 0, 0, 0, 32]);
    assert!(header.as_bytes()[12..].iter().all(|&b| b == 0));
}

#[test]
fn test_stored_block_size_ignores_configured_size() {
    let (temp, store) = setup_temp_store(0);
    store.create_file("t").unwrap();

    let config = Config::builder()
        .data_dir(temp.path())
        .block_size(64)
        .build();
    let wider = BlockStore::open(&config).unwrap();

    assert_eq!(wider.stored_block_size("t").unwrap(), 32);
    assert!(matches!(
        wider.stored_block_size("missing"),
        Err(SeqFileError::TableNotFound(_))
    ));
}

#[test]
fn test_stored_block_size_of_short_file() {
    let (_temp, store) = setup_temp_store(0);
    std::fs::write(store.table_path("stub"), [0xFF; 6]).unwrap();

    assert!(matches!(
        store.stored_block_size("stub"),
        Err(SeqFileError::Storage(_))
    ));
}

#[test]
fn test_header_cursor_round_trip() {
    let mut header = Block::header(64).unwrap();

    header.set_stored_cursor(1_000).unwrap();

    assert_eq!(header.stored_cursor().unwrap(), 1_000);
    assert_eq!(header.head_pointer().unwrap(), None);
    assert_eq!(header.stored_block_size().unwrap(), 64);
    assert!(header.set_stored_cursor(u64::MAX).is_err());
}

#[test]
fn test_header_needs_room_for_fields() {
    assert!(matches!(Block::header(8), Err(SeqFileError::Storage(_))));
    assert!(Block::header(12).is_ok());
}

#[test]
fn test_create_file_truncates_existing() {
    let (_temp, store) = setup_temp_store(0);
    store.create_file("t").unwrap();
    store.write_block("t", 3, &filled_block(9)).unwrap();

    store.create_file("t").unwrap();

    assert_eq!(store.block_count("t").unwrap(), 1);
}

#[test]
fn test_remove_file() {
    let (_temp, store) = setup_temp_store(0);
    store.create_file("gone").unwrap();

    store.remove_file("gone").unwrap();

    assert!(!store.table_exists("gone"));
    assert!(matches!(
        store.remove_file("gone"),
        Err(SeqFileError::TableNotFound(_))
    ));
}

// =============================================================================
// Read / Write Tests
// =============================================================================

#[test]
fn test_write_then_read_block() {
    let (_temp, store) = setup_temp_store(0);
    store.create_file("t").unwrap();

    store.write_block("t", 1, &filled_block(0xAB)).unwrap();

    assert_eq!(store.read_block("t", 1).unwrap(), filled_block(0xAB));
}

#[test]
fn test_write_past_end_zero_extends() {
    let (_temp, store) = setup_temp_store(0);
    store.create_file("t").unwrap();

    store.write_block("t", 4, &filled_block(1)).unwrap();

    assert_eq!(store.file_len("t").unwrap(), 5 * 32);
    assert_eq!(store.read_block("t", 2).unwrap(), Block::new(32));
    assert_eq!(store.read_block("t", 4).unwrap(), filled_block(1));
}

#[test]
fn test_read_past_end_is_block_not_found() {
    let (_temp, store) = setup_temp_store(0);
    store.create_file("t").unwrap();

    let result = store.read_block("t", 1);

    assert!(matches!(
        result,
        Err(SeqFileError::BlockNotFound { block: 1, .. })
    ));
}

#[test]
fn test_missing_table_is_table_not_found() {
    let (_temp, store) = setup_temp_store(0);

    assert!(matches!(
        store.read_block("nope", 0),
        Err(SeqFileError::TableNotFound(_))
    ));
    assert!(matches!(
        store.file_len("nope"),
        Err(SeqFileError::TableNotFound(_))
    ));
}

#[test]
fn test_write_rejects_wrong_sized_block() {
    let (_temp, store) = setup_temp_store(0);
    store.create_file("t").unwrap();

    let result = store.write_block("t", 1, &Block::new(16));

    assert!(matches!(result, Err(SeqFileError::Storage(_))));
}

#[test]
fn test_block_from_bytes_rejects_wrong_length() {
    assert!(Block::from_bytes(vec![0; 31], 32).is_err());
}

#[test]
fn test_open_rejects_tiny_block_size() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .block_size(4)
        .build();

    assert!(matches!(
        BlockStore::open(&config),
        Err(SeqFileError::Config(_))
    ));
}

// =============================================================================
// Cache Coherence Tests
// =============================================================================

#[test]
fn test_cached_read_sees_later_write() {
    let (_temp, store) = setup_temp_store(4);
    store.create_file("t").unwrap();
    store.write_block("t", 1, &filled_block(1)).unwrap();

    // Populate the cache, then overwrite
    assert_eq!(store.read_block("t", 1).unwrap(), filled_block(1));
    store.write_block("t", 1, &filled_block(2)).unwrap();

    assert_eq!(store.read_block("t", 1).unwrap(), filled_block(2));
}

#[test]
fn test_repeated_reads_hit_cache() {
    let (_temp, store) = setup_temp_store(4);
    store.create_file("t").unwrap();

    store.read_block("t", 0).unwrap();
    store.read_block("t", 0).unwrap();
    store.read_block("t", 0).unwrap();

    let stats = store.cache_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 2);
}

#[test]
fn test_recreate_drops_cached_blocks() {
    let (_temp, store) = setup_temp_store(4);
    store.create_file("t").unwrap();
    let mut header = store.read_block("t", 0).unwrap();
    header.set_head_pointer(Some(32)).unwrap();
    store.write_block("t", 0, &header).unwrap();
    assert_eq!(store.read_block("t", 0).unwrap().head_pointer().unwrap(), Some(32));

    store.create_file("t").unwrap();

    assert_eq!(store.read_block("t", 0).unwrap().head_pointer().unwrap(), None);
}
