//! Chain diagnostics and repair
//!
//! Everything here except [`ChainManager::repair`] is read-only. Scans never
//! fix what they find; repair is a separate, explicit step.

use crate::error::{Result, SeqFileError};
use crate::pointer::RecordPointer;

use super::{ChainManager, ScanStop, Table};

/// One visited record as seen by [`ChainManager::chain_links`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLink {
    pub offset: u64,
    pub pointer: RecordPointer,
    pub key: Option<String>,
    pub next: Option<u64>,
    /// Encoded length in bytes
    pub len: usize,
}

/// The whole chain as far as it could be followed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainDump {
    pub head: Option<u64>,
    pub links: Vec<ChainLink>,
    pub stop: ScanStop,
}

/// Summary produced by [`ChainManager::verify`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport {
    /// Records reachable from the head
    pub records: usize,
    /// Keys are non-decreasing along the chain
    pub ordered: bool,
    /// End of the furthest reachable record
    pub furthest_end: u64,
    pub stop: ScanStop,
}

impl ChainReport {
    pub fn is_healthy(&self) -> bool {
        self.ordered && self.stop.is_clean()
    }
}

/// Result of [`ChainManager::repair`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairOutcome {
    /// Nothing to do
    Healthy,
    /// The chain was cut after `last_good` (or emptied at the header when
    /// `None`); `reason` is what the walk ran into
    Truncated {
        last_good: Option<u64>,
        reason: ScanStop,
    },
}

impl ChainManager {
    /// Every record reachable from the head, with its coordinates
    pub fn chain_links(&self, table: &Table) -> Result<ChainDump> {
        let head = match self.head(table) {
            Ok(head) => head,
            Err(SeqFileError::CorruptPointer { .. }) => None,
            Err(e) => return Err(e),
        };
        let mut walker = self.walk(table)?;
        let mut links = Vec::new();

        for entry in walker.by_ref() {
            let entry = entry?;
            links.push(ChainLink {
                offset: entry.offset,
                pointer: RecordPointer::from_offset(entry.offset, self.block_size),
                key: entry.record.key().map(str::to_string),
                next: entry.record.next(),
                len: entry.record.encoded_len(table.field_lengths()),
            });
        }

        let stop = walker.stop().cloned().unwrap_or(ScanStop::End);
        Ok(ChainDump { head, links, stop })
    }

    /// Walk the chain and check ordering, without writing anything
    pub fn verify(&self, table: &Table) -> Result<ChainReport> {
        let mut walker = self.walk(table)?;
        let mut records = 0;
        let mut ordered = true;
        let mut furthest_end = self.first_record_offset();
        let mut previous: Option<Option<String>> = None;

        for entry in walker.by_ref() {
            let entry = entry?;
            records += 1;
            furthest_end = furthest_end
                .max(entry.offset + entry.record.encoded_len(table.field_lengths()) as u64);

            let key = entry.record.key().map(str::to_string);
            if let Some(prev) = &previous {
                if key < *prev {
                    tracing::warn!(table = %table.name(), offset = entry.offset, "chain out of order");
                    ordered = false;
                }
            }
            previous = Some(key);
        }

        let stop = walker.stop().cloned().unwrap_or(ScanStop::End);
        Ok(ChainReport {
            records,
            ordered,
            furthest_end,
            stop,
        })
    }

    /// Cut the chain at the first broken link
    ///
    /// The last record read successfully gets the sentinel as its next
    /// pointer (or the header does, if even the head is unreadable).
    /// Records past the break stay on disk but are no longer linked. A walk
    /// stopped by the iteration limit is left alone.
    pub fn repair(&self, table: &mut Table) -> Result<RepairOutcome> {
        let (stop, last_good) = {
            let mut walker = self.walk(table)?;
            for entry in walker.by_ref() {
                entry?;
            }
            (
                walker.stop().cloned().unwrap_or(ScanStop::End),
                walker.last_good(),
            )
        };

        if stop.is_clean() || matches!(stop, ScanStop::IterationLimit { .. }) {
            return Ok(RepairOutcome::Healthy);
        }

        match last_good {
            Some(offset) => {
                let file_len = self.store.file_len(table.name())?;
                let record = self.read_record(table, offset, file_len)?;
                self.write_next_pointer(table, offset, &record, None)?;
            }
            None => self.set_head(table, None)?,
        }

        tracing::warn!(table = %table.name(), ?last_good, reason = %stop, "chain truncated by repair");
        Ok(RepairOutcome::Truncated {
            last_good,
            reason: stop,
        })
    }

    /// Append cursor for a reopened table
    ///
    /// The cursor stored in the header, raised to the end of the furthest
    /// chained record. A stored cursor outside the file or a damaged chain
    /// raises it to the end of the file. Records unlinked by a repair keep
    /// their bytes because the stored cursor never moves back.
    pub fn recover_cursor(&self, table: &Table) -> Result<u64> {
        let file_len = self.store.file_len(table.name())?;
        let stored = self.store.read_block(table.name(), 0)?.stored_cursor()?;
        let stored_ok = (self.first_record_offset()..=file_len).contains(&stored);
        if !stored_ok {
            tracing::warn!(
                table = %table.name(),
                stored,
                file_len,
                "stored cursor outside the file, resuming at end of file"
            );
        }

        let report = self.verify(table)?;
        let mut cursor = report.furthest_end.max(stored.min(file_len));
        if !stored_ok || !report.stop.is_clean() {
            cursor = cursor.max(file_len);
        }
        Ok(cursor)
    }
}
