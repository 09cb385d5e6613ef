//! Sorted insertion
//!
//! New records are always appended at the table's cursor; only the head
//! pointer or the predecessor's next pointer is rewritten to thread them
//! into key order.

use crate::error::{Result, SeqFileError};
use crate::pointer::RecordPointer;
use crate::record::{self, Record};

use super::{ChainEntry, ChainManager, ScanStop, Table};

/// Outcome of a bulk insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InsertSummary {
    /// Records threaded into the chain
    pub inserted: usize,
    /// Encoded bytes appended (padding excluded)
    pub bytes_written: u64,
}

/// Where a new record goes relative to the existing chain
enum Position {
    /// New head; the old head becomes its successor
    Head { old_head: Option<u64> },
    /// After an existing record, linking to `next`
    After { pred: ChainEntry, next: Option<u64> },
}

impl ChainManager {
    /// Reset the table and insert every row in sorted position
    ///
    /// All rows are validated before the file is touched, so a malformed
    /// row leaves the table as it was.
    pub fn bulk_insert<I>(&self, table: &mut Table, rows: I) -> Result<InsertSummary>
    where
        I: IntoIterator<Item = Vec<Option<String>>>,
    {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, values)| {
                Record::from_values(table.schema(), values).map_err(|e| match e {
                    SeqFileError::SchemaMismatch(msg) => {
                        SeqFileError::SchemaMismatch(format!("row {}: {}", i + 1, msg))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.reset(table)?;

        let mut summary = InsertSummary::default();
        for record in records {
            summary.bytes_written += record.encoded_len(table.field_lengths()) as u64;
            self.sorted_insert(table, record)?;
            summary.inserted += 1;
        }

        tracing::info!(
            table = %table.name(),
            inserted = summary.inserted,
            cursor = table.cursor(),
            "bulk insert finished"
        );
        Ok(summary)
    }

    /// Insert one record in key order; returns its offset
    pub fn sorted_insert(&self, table: &mut Table, mut record: Record) -> Result<u64> {
        if record.values().len() != table.schema().len() {
            return Err(SeqFileError::SchemaMismatch(format!(
                "expected {} values, got {}",
                table.schema().len(),
                record.values().len()
            )));
        }

        match self.find_position(table, record.key())? {
            Position::Head { old_head } => {
                record.set_next(old_head);
                let offset = self.append(table, &record)?;
                self.set_head(table, Some(offset))?;
                tracing::debug!(table = %table.name(), offset, key = ?record.key(), "inserted at head");
                Ok(offset)
            }
            Position::After { pred, next } => {
                record.set_next(next);
                let offset = self.append(table, &record)?;
                self.write_next_pointer(table, pred.offset, &pred.record, Some(offset))?;
                tracing::debug!(
                    table = %table.name(),
                    offset,
                    after = pred.offset,
                    key = ?record.key(),
                    "inserted after predecessor"
                );
                Ok(offset)
            }
        }
    }

    /// Append a record at the cursor without linking it; returns its offset
    ///
    /// A record that does not fit in what is left of the current block
    /// starts at the next block. Records longer than a block span several.
    pub fn append(&self, table: &mut Table, record: &Record) -> Result<u64> {
        let bytes = record::encode(record, table.field_lengths())?;
        let offset = self.place(table.cursor(), bytes.len());
        let end = offset + bytes.len() as u64;
        if end > i32::MAX as u64 {
            return Err(SeqFileError::Storage(format!(
                "table {} is full: offset {} exceeds the pointer range",
                table.name(),
                end
            )));
        }

        self.write_bytes(table, offset, &bytes)?;
        self.store_cursor(table, end)?;
        table.cursor = end;
        Ok(offset)
    }

    /// Placement rule for a record of `len` bytes at `cursor`
    pub fn place(&self, cursor: u64, len: usize) -> u64 {
        let pos = RecordPointer::from_offset(cursor, self.block_size);
        if pos.in_block != 0 && pos.remaining_in_block(self.block_size) < len {
            RecordPointer::new(pos.block + 1, 0).to_offset(self.block_size)
        } else {
            cursor
        }
    }

    /// Walk the chain to find the insertion point for `key`
    ///
    /// Stops at the last record whose key is `<= key` and whose successor's
    /// key is `> key`. If the walk runs into corruption before finding a
    /// successor, the last record read becomes the predecessor and the new
    /// record ends the chain instead of inheriting the broken link.
    fn find_position(&self, table: &Table, key: Option<&str>) -> Result<Position> {
        let old_head = self.head(table)?;
        if old_head.is_none() {
            return Ok(Position::Head { old_head });
        }

        let mut walker = self.walk(table)?;
        let mut pred: Option<ChainEntry> = None;
        let mut found_successor = false;
        for entry in walker.by_ref() {
            let entry = entry?;
            if key < entry.key() {
                found_successor = true;
                break;
            }
            pred = Some(entry);
        }

        // A successor that was read proves the link to it is sound
        let broken = walker
            .stop()
            .filter(|s| !s.is_clean() && !matches!(s, ScanStop::IterationLimit { .. }))
            .filter(|_| !found_successor);
        if let Some(stop) = broken {
            tracing::warn!(
                table = %table.name(),
                reason = %stop,
                "insert position chosen from a partial chain"
            );
        }

        Ok(match pred {
            Some(pred) => {
                let next = if broken.is_some() {
                    None
                } else {
                    pred.record.next()
                };
                Position::After { pred, next }
            }
            None => Position::Head {
                old_head: old_head.filter(|_| broken.is_none()),
            },
        })
    }
}
