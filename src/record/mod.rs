//! Record Module
//!
//! In-memory records and their on-disk encoding.
//!
//! ## Record Format
//! ```text
//! ┌────────────┬───────────────────────────────────┬──────────────────┐
//! │ Bitmap (1) │ Non-null field bytes, field order │ Next pointer (4) │
//! └────────────┴───────────────────────────────────┴──────────────────┘
//! ```
//! - Bitmap bit i set ⇔ field i is null; null fields take no bytes
//! - Each present field takes exactly its declared length (zero padded)
//! - Next pointer: big-endian i32 offset of the successor, -1 for none

mod codec;

use std::fmt;

use crate::error::{Result, SeqFileError};
use crate::schema::Schema;

pub use codec::{decode, encode, encoded_len, is_null, null_bitmap, NULL_BITMAP_SIZE};

/// A record: one optional text value per schema field plus the chain link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    values: Vec<Option<String>>,
    next: Option<u64>,
}

impl Record {
    /// Raw constructor, no schema checks
    pub fn new(values: Vec<Option<String>>, next: Option<u64>) -> Self {
        Self { values, next }
    }

    /// Build a record from user input
    ///
    /// The value count must match the schema. Values are cut to their
    /// field's byte length (on a char boundary) and lose trailing NUL bytes,
    /// so the record compares equal to what decoding it later yields.
    pub fn from_values(schema: &Schema, values: Vec<Option<String>>) -> Result<Self> {
        if values.len() != schema.len() {
            return Err(SeqFileError::SchemaMismatch(format!(
                "expected {} values, got {}",
                schema.len(),
                values.len()
            )));
        }

        let values = values
            .into_iter()
            .zip(schema.fields())
            .map(|(value, field)| value.map(|v| normalize(&v, field.length)))
            .collect();

        Ok(Self { values, next: None })
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Option<String>> {
        self.values
    }

    /// Value at a field position, `None` when null or out of range
    pub fn value(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    /// Value of a named field
    pub fn field(&self, schema: &Schema, name: &str) -> Option<&str> {
        schema.field_index(name).and_then(|i| self.value(i))
    }

    /// The search key (field 0)
    pub fn key(&self) -> Option<&str> {
        self.value(0)
    }

    pub fn next(&self) -> Option<u64> {
        self.next
    }

    pub fn set_next(&mut self, next: Option<u64>) {
        self.next = next;
    }

    pub fn null_bitmap(&self) -> u8 {
        null_bitmap(&self.values)
    }

    /// On-disk size of this record
    pub fn encoded_len(&self, field_lengths: &[usize]) -> usize {
        encoded_len(self.null_bitmap(), field_lengths)
    }

    /// `name: value, ...` rendering with `null` for absent fields
    pub fn display<'a>(&'a self, schema: &'a Schema) -> RecordDisplay<'a> {
        RecordDisplay {
            record: self,
            schema,
        }
    }
}

/// Helper returned by [`Record::display`]
pub struct RecordDisplay<'a> {
    record: &'a Record,
    schema: &'a Schema,
}

impl fmt::Display for RecordDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.schema.fields().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", field.name, self.record.value(i).unwrap_or("null"))?;
        }
        Ok(())
    }
}

/// Cut a value to `max_len` bytes without splitting a char, then drop
/// trailing NULs
fn normalize(value: &str, max_len: usize) -> String {
    let mut end = value.len().min(max_len);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].trim_end_matches('\0').to_string()
}
