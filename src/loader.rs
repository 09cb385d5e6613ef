//! Bulk-Load Parser
//!
//! Reads the plain-text bulk-load format into rows for
//! [`ChainManager::bulk_insert`](crate::chain::ChainManager::bulk_insert).
//!
//! ## File Format
//! ```text
//! students            <- table name
//! 3                   <- record count
//! 1042;Ada;null       <- one row per line, ';' separated
//! 0007;Grace;CS
//! 0311;Linus          <- missing trailing values are null
//! ```
//! Values are trimmed. `null` in any case marks a null field. Blank lines
//! are ignored.

use std::fs;
use std::path::Path;

use crate::error::{Result, SeqFileError};
use crate::schema::Schema;

/// Separator between the values of a row
pub const DELIMITER: char = ';';

/// Token for a null field
pub const NULL_TOKEN: &str = "null";

/// A parsed bulk-load file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkLoad {
    /// Table name from the first line
    pub table: String,
    /// Record count from the second line
    pub expected: usize,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Parse a bulk-load document against a schema
pub fn parse_str(input: &str, schema: &Schema) -> Result<BulkLoad> {
    let mut lines = input
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let table = lines
        .next()
        .map(|(_, line)| line.to_string())
        .ok_or_else(|| SeqFileError::Parse("missing table name line".to_string()))?;

    let (count_line, count) = lines
        .next()
        .ok_or_else(|| SeqFileError::Parse("missing record count line".to_string()))?;
    let expected = count.parse::<usize>().map_err(|e| {
        SeqFileError::Parse(format!("line {}: bad record count {:?}: {}", count_line, count, e))
    })?;

    let rows = lines
        .map(|(line_no, line)| {
            parse_row(line, schema).map_err(|e| match e {
                SeqFileError::SchemaMismatch(msg) => {
                    SeqFileError::SchemaMismatch(format!("line {}: {}", line_no, msg))
                }
                other => other,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if rows.len() != expected {
        tracing::warn!(
            table = %table,
            expected,
            found = rows.len(),
            "record count line does not match the rows present"
        );
    }

    Ok(BulkLoad {
        table,
        expected,
        rows,
    })
}

/// Read and parse a bulk-load file
pub fn parse_file(path: &Path, schema: &Schema) -> Result<BulkLoad> {
    let input = fs::read_to_string(path)?;
    let load = parse_str(&input, schema)?;
    tracing::debug!(path = %path.display(), rows = load.rows.len(), "parsed bulk-load file");
    Ok(load)
}

/// Split one data line into exactly `schema.len()` values
pub fn parse_row(line: &str, schema: &Schema) -> Result<Vec<Option<String>>> {
    let mut values: Vec<Option<String>> = line.split(DELIMITER).map(parse_value).collect();

    if values.len() > schema.len() {
        return Err(SeqFileError::SchemaMismatch(format!(
            "{} values for {} fields",
            values.len(),
            schema.len()
        )));
    }
    values.resize(schema.len(), None);
    Ok(values)
}

/// One trimmed value, `None` for the null token
pub fn parse_value(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.eq_ignore_ascii_case(NULL_TOKEN) {
        None
    } else {
        Some(value.to_string())
    }
}
