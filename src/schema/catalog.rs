//! Schema Catalog
//!
//! Maps table names to schemas. The chain code only consumes schemas; the
//! catalog is the one place that stores them.
//!
//! ## Catalog File Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────────────┐
//! │ CRC (4)  │ Len (4)  │ bincode(BTreeMap<String, Schema>)   │
//! └──────────┴──────────┴─────────────────────────────────────┘
//! ```
//! CRC32 covers the payload; both integers are little-endian.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::error::{Result, SeqFileError};

use super::Schema;

/// Catalog header: CRC (4) + payload length (4)
const CATALOG_HEADER_SIZE: usize = 8;

/// Source of table schemas
pub trait Catalog {
    /// Full schema of a table, `TableNotFound` if unknown
    fn schema(&self, table: &str) -> Result<Schema>;

    /// Register (or replace) a table's schema
    fn register(&self, table: &str, schema: Schema) -> Result<()>;

    /// Forget a table
    fn drop_table(&self, table: &str) -> Result<()>;

    /// Known table names, sorted
    fn tables(&self) -> Vec<String>;

    fn table_exists(&self, table: &str) -> bool;

    fn field_names(&self, table: &str) -> Result<Vec<String>> {
        Ok(self.schema(table)?.field_names())
    }

    fn field_lengths(&self, table: &str) -> Result<Vec<usize>> {
        Ok(self.schema(table)?.field_lengths())
    }

    /// Index of a field, `Ok(None)` if the table has no such field
    fn field_index(&self, table: &str, field: &str) -> Result<Option<usize>> {
        Ok(self.schema(table)?.field_index(field))
    }
}

// =============================================================================
// In-memory catalog
// =============================================================================

/// Catalog without persistence, useful for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    schemas: RwLock<BTreeMap<String, Schema>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Catalog for MemoryCatalog {
    fn schema(&self, table: &str) -> Result<Schema> {
        self.schemas
            .read()
            .get(table)
            .cloned()
            .ok_or_else(|| SeqFileError::TableNotFound(table.to_string()))
    }

    fn register(&self, table: &str, schema: Schema) -> Result<()> {
        self.schemas.write().insert(table.to_string(), schema);
        Ok(())
    }

    fn drop_table(&self, table: &str) -> Result<()> {
        self.schemas
            .write()
            .remove(table)
            .map(|_| ())
            .ok_or_else(|| SeqFileError::TableNotFound(table.to_string()))
    }

    fn tables(&self) -> Vec<String> {
        self.schemas.read().keys().cloned().collect()
    }

    fn table_exists(&self, table: &str) -> bool {
        self.schemas.read().contains_key(table)
    }
}

// =============================================================================
// File-backed catalog
// =============================================================================

/// Catalog persisted to a single checksummed file
///
/// The whole map is rewritten on every change (temp file + rename), which
/// is fine for the handful of tables a data directory holds.
pub struct FileCatalog {
    path: PathBuf,
    schemas: RwLock<BTreeMap<String, Schema>>,
}

impl FileCatalog {
    /// Load the catalog at `path`, or start empty if the file is absent
    pub fn open(path: &Path) -> Result<Self> {
        let schemas = match fs::read(path) {
            Ok(bytes) => Self::decode(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), tables = schemas.len(), "opened catalog");
        Ok(Self {
            path: path.to_path_buf(),
            schemas: RwLock::new(schemas),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, schemas: &BTreeMap<String, Schema>) -> Result<()> {
        let bytes = Self::encode(schemas)?;
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn encode(schemas: &BTreeMap<String, Schema>) -> Result<Vec<u8>> {
        let payload = bincode::serialize(schemas)?;
        let crc = crc32fast::hash(&payload);

        let mut bytes = Vec::with_capacity(CATALOG_HEADER_SIZE + payload.len());
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    fn decode(bytes: &[u8]) -> Result<BTreeMap<String, Schema>> {
        if bytes.len() < CATALOG_HEADER_SIZE {
            return Err(SeqFileError::Catalog(format!(
                "catalog file too short: {} bytes",
                bytes.len()
            )));
        }

        let crc = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
        let payload = &bytes[CATALOG_HEADER_SIZE..];
        if payload.len() != len {
            return Err(SeqFileError::Catalog(format!(
                "catalog payload length mismatch: header says {}, found {}",
                len,
                payload.len()
            )));
        }
        if crc32fast::hash(payload) != crc {
            return Err(SeqFileError::Catalog("catalog checksum mismatch".to_string()));
        }

        Ok(bincode::deserialize(payload)?)
    }
}

impl Catalog for FileCatalog {
    fn schema(&self, table: &str) -> Result<Schema> {
        self.schemas
            .read()
            .get(table)
            .cloned()
            .ok_or_else(|| SeqFileError::TableNotFound(table.to_string()))
    }

    fn register(&self, table: &str, schema: Schema) -> Result<()> {
        let mut schemas = self.schemas.write();
        schemas.insert(table.to_string(), schema);
        self.persist(&schemas)
    }

    fn drop_table(&self, table: &str) -> Result<()> {
        let mut schemas = self.schemas.write();
        if schemas.remove(table).is_none() {
            return Err(SeqFileError::TableNotFound(table.to_string()));
        }
        self.persist(&schemas)
    }

    fn tables(&self) -> Vec<String> {
        self.schemas.read().keys().cloned().collect()
    }

    fn table_exists(&self, table: &str) -> bool {
        self.schemas.read().contains_key(table)
    }
}
