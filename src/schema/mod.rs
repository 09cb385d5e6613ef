//! Schema Module
//!
//! Field layout of a table and the catalog that stores it.
//!
//! Every field is fixed-length text. Field 0 is the search key that orders
//! the record chain. A record's null bitmap is a single byte, which caps a
//! schema at [`MAX_FIELDS`] fields.

mod catalog;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SeqFileError};
use crate::pointer::POINTER_WIDTH;
use crate::record::NULL_BITMAP_SIZE;

pub use catalog::{Catalog, FileCatalog, MemoryCatalog};

/// Fields addressable by a one-byte null bitmap
pub const MAX_FIELDS: usize = 8 * NULL_BITMAP_SIZE;

/// One fixed-length field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    /// Length in bytes
    pub length: usize,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, length: usize) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

/// Ordered field list shared by every record of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<FieldDef>,
}

impl Schema {
    /// Build a schema, rejecting empty, oversized or ambiguous layouts
    pub fn new(fields: Vec<FieldDef>) -> Result<Self> {
        if fields.is_empty() {
            return Err(SeqFileError::InvalidSchema(
                "a schema needs at least one field".to_string(),
            ));
        }
        if fields.len() > MAX_FIELDS {
            return Err(SeqFileError::InvalidSchema(format!(
                "{} fields given, at most {} supported",
                fields.len(),
                MAX_FIELDS
            )));
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if field.name.trim().is_empty() {
                return Err(SeqFileError::InvalidSchema(
                    "field names must not be empty".to_string(),
                ));
            }
            if field.length == 0 {
                return Err(SeqFileError::InvalidSchema(format!(
                    "field {} has zero length",
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SeqFileError::InvalidSchema(format!(
                    "duplicate field name {}",
                    field.name
                )));
            }
        }

        Ok(Self { fields })
    }

    /// Build a schema from `(name, length)` pairs
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, usize)>) -> Result<Self> {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, length)| FieldDef::new(name, length))
                .collect(),
        )
    }

    /// Parse a `name:length` field spec
    pub fn parse_field(spec: &str) -> Result<FieldDef> {
        let (name, length) = spec
            .rsplit_once(':')
            .ok_or_else(|| SeqFileError::Parse(format!("expected name:length, got {:?}", spec)))?;
        let length = length
            .trim()
            .parse::<usize>()
            .map_err(|e| SeqFileError::Parse(format!("bad length in {:?}: {}", spec, e)))?;
        Ok(FieldDef::new(name.trim(), length))
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn field_lengths(&self) -> Vec<usize> {
        self.fields.iter().map(|f| f.length).collect()
    }

    /// Position of a field by name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// The search key field
    pub fn key_field(&self) -> &FieldDef {
        &self.fields[0]
    }

    /// Encoded size of a record with no null fields
    pub fn max_record_len(&self) -> usize {
        NULL_BITMAP_SIZE + self.fields.iter().map(|f| f.length).sum::<usize>() + POINTER_WIDTH
    }
}
