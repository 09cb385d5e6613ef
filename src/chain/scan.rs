//! Field and key-range scans

use crate::error::{Result, SeqFileError};
use crate::record::Record;

use super::{ChainManager, ScanStop, Table};

/// Results of a scan plus the reason it ended
///
/// A scan cut short by corruption still returns everything collected
/// before the damage; check [`Scan::is_complete`] to tell the cases apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan<T> {
    pub items: Vec<T>,
    pub stop: ScanStop,
}

impl<T> Scan<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True if the walk ended without hitting corruption or the limit
    pub fn is_complete(&self) -> bool {
        self.stop.is_clean()
    }
}

impl ChainManager {
    /// Project one field from every record, in key order
    pub fn scan_field(&self, table: &Table, field: &str) -> Result<Scan<Option<String>>> {
        let index = table
            .schema()
            .field_index(field)
            .ok_or_else(|| SeqFileError::FieldNotFound {
                table: table.name().to_string(),
                field: field.to_string(),
            })?;

        let mut walker = self.walk(table)?;
        let mut items = Vec::new();
        for entry in walker.by_ref() {
            let entry = entry?;
            items.push(entry.record.value(index).map(str::to_string));
        }

        let stop = walker.stop().cloned().unwrap_or(ScanStop::End);
        tracing::debug!(table = %table.name(), field, found = items.len(), "field scan done");
        Ok(Scan { items, stop })
    }

    /// Records with `min_key <= key <= max_key`, in key order
    ///
    /// The walk stops at the first key above `max_key`. Records with a
    /// null key sort first and never match.
    pub fn scan_range(&self, table: &Table, min_key: &str, max_key: &str) -> Result<Scan<Record>> {
        let mut walker = self.walk(table)?;
        let mut items = Vec::new();
        let mut past_max = false;

        for entry in walker.by_ref() {
            let entry = entry?;
            let Some(key) = entry.key() else {
                continue;
            };
            if key > max_key {
                past_max = true;
                break;
            }
            if key >= min_key {
                items.push(entry.record);
            }
        }

        let stop = if past_max {
            ScanStop::PastMaxKey
        } else {
            walker.stop().cloned().unwrap_or(ScanStop::End)
        };
        tracing::debug!(
            table = %table.name(),
            min_key,
            max_key,
            found = items.len(),
            "range scan done"
        );
        Ok(Scan { items, stop })
    }
}
