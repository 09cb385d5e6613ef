//! Tests for ChainManager insertion
//!
//! These tests verify:
//! - Sorted insertion regardless of arrival order
//! - No record points at itself
//! - Append-only placement and a monotonic cursor
//! - Records straddling block boundaries
//! - Null keys and duplicate keys
//! - Bulk insert validation and reset
//! - Cursor recovery when a table is reopened
//! - Block size mismatch on reopen

use std::fs;

use seqfile::chain::ChainManager;
use seqfile::error::SeqFileError;
use seqfile::record::{self, Record};
use seqfile::{Config, Schema, Table};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_chain(block_size: usize) -> (TempDir, ChainManager) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .block_size(block_size)
        .sync_writes(false)
        .build();
    let chain = ChainManager::new(&config).unwrap();
    (temp_dir, chain)
}

fn key_value_schema() -> Schema {
    Schema::from_pairs([("key", 4), ("val", 4)]).unwrap()
}

fn row(key: &str, val: &str) -> Vec<Option<String>> {
    vec![Some(key.to_string()), Some(val.to_string())]
}

fn insert(chain: &ChainManager, table: &mut Table, key: &str, val: &str) -> u64 {
    let record = Record::from_values(table.schema(), row(key, val)).unwrap();
    chain.sorted_insert(table, record).unwrap()
}

fn keys(chain: &ChainManager, table: &Table) -> Vec<Option<String>> {
    chain.scan_field(table, "key").unwrap().items
}

fn strings(values: &[&str]) -> Vec<Option<String>> {
    values.iter().map(|v| Some(v.to_string())).collect()
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_insert_out_of_order_yields_sorted_chain() {
    let (_temp, chain) = setup_temp_chain(32);
    let mut table = chain.create_table("t", key_value_schema()).unwrap();

    insert(&chain, &mut table, "b", "2");
    insert(&chain, &mut table, "a", "1");
    insert(&chain, &mut table, "c", "3");

    assert_eq!(keys(&chain, &table), strings(&["a", "b", "c"]));
}

#[test]
fn test_empty_table_has_no_head() {
    let (_temp, chain) = setup_temp_chain(32);
    let table = chain.create_table("t", key_value_schema()).unwrap();

    assert_eq!(chain.head(&table).unwrap(), None);
    assert!(keys(&chain, &table).is_empty());
}

#[test]
fn test_no_record_points_to_itself() {
    let (_temp, chain) = setup_temp_chain(32);
    let mut table = chain.create_table("t", key_value_schema()).unwrap();

    for key in ["m", "c", "x", "a", "q", "d"] {
        insert(&chain, &mut table, key, "v");
    }

    let dump = chain.chain_links(&table).unwrap();
    assert_eq!(dump.links.len(), 6);
    for link in &dump.links {
        assert_ne!(link.next, Some(link.offset));
    }
    assert!(dump.stop.is_clean());
}

#[test]
fn test_duplicate_keys_keep_arrival_order() {
    let (_temp, chain) = setup_temp_chain(32);
    let mut table = chain.create_table("t", key_value_schema()).unwrap();

    insert(&chain, &mut table, "k", "1");
    insert(&chain, &mut table, "k", "2");
    insert(&chain, &mut table, "a", "0");

    let vals = chain.scan_field(&table, "val").unwrap().items;
    assert_eq!(vals, strings(&["0", "1", "2"]));
}

#[test]
fn test_null_keys_sort_first() {
    let (_temp, chain) = setup_temp_chain(32);
    let mut table = chain.create_table("t", key_value_schema()).unwrap();

    insert(&chain, &mut table, "b", "1");
    let null_key = Record::from_values(table.schema(), vec![None, Some("n".to_string())]).unwrap();
    chain.sorted_insert(&mut table, null_key).unwrap();
    insert(&chain, &mut table, "a", "2");

    assert_eq!(
        keys(&chain, &table),
        vec![None, Some("a".to_string()), Some("b".to_string())]
    );
}

// =============================================================================
// Placement Tests
// =============================================================================

#[test]
fn test_offsets_and_cursor_only_grow() {
    let (_temp, chain) = setup_temp_chain(32);
    let mut table = chain.create_table("t", key_value_schema()).unwrap();
    let mut last_offset = 0;
    let mut last_cursor = table.cursor();

    for key in ["z", "y", "x", "w", "v", "u", "t"] {
        let offset = insert(&chain, &mut table, key, "v");
        assert!(offset > last_offset);
        assert!(table.cursor() > last_cursor);
        assert!(offset >= chain.first_record_offset());
        last_offset = offset;
        last_cursor = table.cursor();
    }
}

#[test]
fn test_first_record_starts_after_header() {
    let (_temp, chain) = setup_temp_chain(32);
    let mut table = chain.create_table("t", key_value_schema()).unwrap();

    let offset = insert(&chain, &mut table, "a", "1");

    assert_eq!(offset, 32);
    assert_eq!(chain.head(&table).unwrap(), Some(32));
    // bitmap + 4 + 4 + pointer
    assert_eq!(table.cursor(), 32 + 13);
}

#[test]
fn test_place_moves_to_next_block_when_record_does_not_fit() {
    let (_temp, chain) = setup_temp_chain(32);

    assert_eq!(chain.place(57, 25), 64);
    assert_eq!(chain.place(40, 8), 40);
    assert_eq!(chain.place(56, 8), 56);
}

#[test]
fn test_place_never_skips_from_block_start() {
    let (_temp, chain) = setup_temp_chain(32);

    // Longer than a block: spans blocks instead of moving
    assert_eq!(chain.place(64, 45), 64);
}

#[test]
fn test_record_spanning_blocks_matches_encoding() {
    let (temp, chain) = setup_temp_chain(16);
    let schema = Schema::from_pairs([("key", 12), ("val", 12)]).unwrap();
    let mut table = chain.create_table("wide", schema).unwrap();

    insert(&chain, &mut table, "bbbbbbbbbbbb", "second");
    insert(&chain, &mut table, "aaaaaaaaaaaa", "first");

    let raw = fs::read(temp.path().join("tables").join("wide.seq")).unwrap();
    let dump = chain.chain_links(&table).unwrap();
    assert_eq!(dump.links.len(), 2);

    for link in &dump.links {
        // 1 + 24 + 4 bytes never fit in a 16-byte block
        assert_eq!(link.len, 29);
        let last_byte = link.offset + link.len as u64 - 1;
        assert_ne!(link.offset / 16, last_byte / 16);

        let rec = chain.read_record(&table, link.offset, raw.len() as u64).unwrap();
        let encoded = record::encode(&rec, table.field_lengths()).unwrap();
        let start = link.offset as usize;
        assert_eq!(&raw[start..start + link.len], &encoded[..]);
    }

    let vals = chain.scan_field(&table, "val").unwrap().items;
    assert_eq!(vals, strings(&["first", "second"]));
}

#[test]
fn test_record_moved_to_block_start_leaves_gap_unlinked() {
    let (_temp, chain) = setup_temp_chain(32);
    let schema = Schema::from_pairs([("key", 10), ("val", 10)]).unwrap();
    let mut table = chain.create_table("t", schema).unwrap();

    let first = insert(&chain, &mut table, "a", "1");
    let second = insert(&chain, &mut table, "b", "2");

    // 25-byte records: the second does not fit after the first
    assert_eq!(first, 32);
    assert_eq!(second, 64);
    assert_eq!(table.cursor(), 89);
}

// =============================================================================
// Bulk Insert Tests
// =============================================================================

#[test]
fn test_bulk_insert_sorts_rows() {
    let (_temp, chain) = setup_temp_chain(32);
    let mut table = chain.create_table("t", key_value_schema()).unwrap();

    let summary = chain
        .bulk_insert(&mut table, vec![row("d", "4"), row("b", "2"), row("c", "3"), row("a", "1")])
        .unwrap();

    assert_eq!(summary.inserted, 4);
    assert_eq!(summary.bytes_written, 4 * 13);
    assert_eq!(keys(&chain, &table), strings(&["a", "b", "c", "d"]));
}

#[test]
fn test_bulk_insert_replaces_contents() {
    let (_temp, chain) = setup_temp_chain(32);
    let mut table = chain.create_table("t", key_value_schema()).unwrap();
    chain.bulk_insert(&mut table, vec![row("x", "1"), row("y", "2")]).unwrap();

    chain.bulk_insert(&mut table, vec![row("b", "1"), row("a", "2")]).unwrap();

    assert_eq!(keys(&chain, &table), strings(&["a", "b"]));
}

#[test]
fn test_bulk_insert_bad_row_leaves_table_untouched() {
    let (_temp, chain) = setup_temp_chain(32);
    let mut table = chain.create_table("t", key_value_schema()).unwrap();
    chain.bulk_insert(&mut table, vec![row("a", "1")]).unwrap();
    let cursor = table.cursor();

    let result = chain.bulk_insert(
        &mut table,
        vec![row("b", "2"), vec![Some("c".to_string())]],
    );

    match result {
        Err(SeqFileError::SchemaMismatch(msg)) => assert!(msg.starts_with("row 2")),
        other => panic!("expected SchemaMismatch, got {:?}", other),
    }
    assert_eq!(table.cursor(), cursor);
    assert_eq!(keys(&chain, &table), strings(&["a"]));
}

#[test]
fn test_sorted_insert_rejects_wrong_arity() {
    let (_temp, chain) = setup_temp_chain(32);
    let mut table = chain.create_table("t", key_value_schema()).unwrap();

    let result = chain.sorted_insert(&mut table, Record::new(vec![None], None));

    assert!(matches!(result, Err(SeqFileError::SchemaMismatch(_))));
    assert_eq!(chain.head(&table).unwrap(), None);
}

// =============================================================================
// Reopen Tests
// =============================================================================

#[test]
fn test_reopen_recovers_cursor() {
    let (_temp, chain) = setup_temp_chain(32);
    let mut table = chain.create_table("t", key_value_schema()).unwrap();
    chain
        .bulk_insert(&mut table, vec![row("c", "3"), row("a", "1"), row("b", "2")])
        .unwrap();
    let cursor = table.cursor();

    let mut reopened = chain.open_table("t", key_value_schema()).unwrap();
    assert_eq!(reopened.cursor(), cursor);

    insert(&chain, &mut reopened, "bb", "9");
    assert_eq!(keys(&chain, &reopened), strings(&["a", "b", "bb", "c"]));
}

#[test]
fn test_append_persists_cursor_in_header() {
    let (_temp, chain) = setup_temp_chain(32);
    let mut table = chain.create_table("t", key_value_schema()).unwrap();

    for (key, val) in [("b", "2"), ("a", "1"), ("c", "3")] {
        insert(&chain, &mut table, key, val);
        let header = chain.store().read_block("t", 0).unwrap();
        assert_eq!(header.stored_cursor().unwrap(), table.cursor());
    }

    chain.reset(&mut table).unwrap();
    let header = chain.store().read_block("t", 0).unwrap();
    assert_eq!(header.stored_cursor().unwrap(), 32);
}

#[test]
fn test_reopen_with_other_block_size_is_rejected() {
    let (temp, chain) = setup_temp_chain(32);
    let mut table = chain.create_table("t", key_value_schema()).unwrap();
    chain
        .bulk_insert(&mut table, vec![row("b", "2"), row("a", "1")])
        .unwrap();

    let wider = ChainManager::new(
        &Config::builder()
            .data_dir(temp.path())
            .block_size(64)
            .sync_writes(false)
            .build(),
    )
    .unwrap();
    let result = wider.open_table("t", key_value_schema());

    match result {
        Err(SeqFileError::Config(msg)) => assert!(msg.contains("32") && msg.contains("64")),
        other => panic!("expected Config error, got {:?}", other),
    }

    let reopened = chain.open_table("t", key_value_schema()).unwrap();
    assert_eq!(keys(&chain, &reopened), strings(&["a", "b"]));
}

#[test]
fn test_open_missing_table() {
    let (_temp, chain) = setup_temp_chain(32);

    let result = chain.open_table("missing", key_value_schema());

    assert!(matches!(result, Err(SeqFileError::TableNotFound(_))));
}
