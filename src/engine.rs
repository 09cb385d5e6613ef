//! Engine Module
//!
//! The database facade that ties the catalog to the chain manager.
//!
//! ## Responsibilities
//! - Own the data directory layout
//! - Keep the catalog and the table files in step
//! - Validate table names and rows before anything is written
//! - Expose the chain operations under table handles

use std::fs;
use std::path::Path;

use crate::chain::{
    ChainDump, ChainManager, ChainReport, InsertSummary, RepairOutcome, Scan, Table,
};
use crate::config::Config;
use crate::error::{Result, SeqFileError};
use crate::loader;
use crate::record::Record;
use crate::schema::{Catalog, FileCatalog, Schema};

/// A directory of key-ordered sequential tables
///
/// ## Ownership Model
/// - The catalog is the source of truth for which tables exist
/// - Each [`Table`] handle owns its own append cursor, so writes go through
///   `&mut Table` while the database itself is shared as `&self`
pub struct Database<C: Catalog = FileCatalog> {
    config: Config,
    catalog: C,
    chain: ChainManager,
}

impl Database<FileCatalog> {
    /// Open or create a database with a file-backed catalog
    ///
    /// Creates `data_dir` and its `tables/` directory if missing.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;
        let catalog = FileCatalog::open(&config.catalog_path())?;
        Self::with_catalog(config, catalog)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }
}

impl<C: Catalog> Database<C> {
    /// Open a database over any catalog implementation
    pub fn with_catalog(config: Config, catalog: C) -> Result<Self> {
        let chain = ChainManager::new(&config)?;
        tracing::info!(
            data_dir = %config.data_dir.display(),
            block_size = config.block_size,
            tables = catalog.tables().len(),
            "database opened"
        );
        Ok(Self {
            config,
            catalog,
            chain,
        })
    }

    // =========================================================================
    // Table lifecycle
    // =========================================================================

    /// Register a table and create its file with an empty chain
    ///
    /// An existing table of the same name is replaced.
    pub fn create_table(&self, name: &str, schema: Schema) -> Result<Table> {
        validate_name(name)?;
        let table = self.chain.create_table(name, schema.clone())?;
        self.catalog.register(name, schema)?;
        Ok(table)
    }

    /// Open an existing table, recovering its append cursor
    pub fn open_table(&self, name: &str) -> Result<Table> {
        validate_name(name)?;
        let schema = self.catalog.schema(name)?;
        self.chain.open_table(name, schema)
    }

    /// Remove a table from the catalog and delete its file
    pub fn drop_table(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        self.catalog.drop_table(name)?;
        match self.chain.store().remove_file(name) {
            Err(SeqFileError::TableNotFound(_)) => {
                tracing::warn!(table = name, "dropped table had no file");
            }
            other => other?,
        }
        tracing::info!(table = name, "dropped table");
        Ok(())
    }

    /// Known table names, sorted
    pub fn tables(&self) -> Vec<String> {
        self.catalog.tables()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Replace the table's contents with `rows`, in key order
    pub fn bulk_insert<I>(&self, table: &mut Table, rows: I) -> Result<InsertSummary>
    where
        I: IntoIterator<Item = Vec<Option<String>>>,
    {
        self.chain.bulk_insert(table, rows)
    }

    /// Add one row to the existing chain; returns its offset
    pub fn insert(&self, table: &mut Table, values: Vec<Option<String>>) -> Result<u64> {
        let record = Record::from_values(table.schema(), values)?;
        self.chain.sorted_insert(table, record)
    }

    /// Bulk-load a text file into the table
    pub fn load_file(&self, table: &mut Table, path: &Path) -> Result<InsertSummary> {
        let load = loader::parse_file(path, table.schema())?;
        if load.table != table.name() {
            tracing::warn!(
                table = %table.name(),
                file_table = %load.table,
                path = %path.display(),
                "bulk-load file names a different table"
            );
        }
        self.chain.bulk_insert(table, load.rows)
    }

    // =========================================================================
    // Reads and diagnostics
    // =========================================================================

    pub fn scan_field(&self, table: &Table, field: &str) -> Result<Scan<Option<String>>> {
        self.chain.scan_field(table, field)
    }

    pub fn scan_range(&self, table: &Table, min_key: &str, max_key: &str) -> Result<Scan<Record>> {
        self.chain.scan_range(table, min_key, max_key)
    }

    pub fn chain_links(&self, table: &Table) -> Result<ChainDump> {
        self.chain.chain_links(table)
    }

    pub fn verify(&self, table: &Table) -> Result<ChainReport> {
        self.chain.verify(table)
    }

    pub fn repair(&self, table: &mut Table) -> Result<RepairOutcome> {
        self.chain.repair(table)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn chain(&self) -> &ChainManager {
        &self.chain
    }
}

/// Table names become file names: ASCII alphanumerics, `_` and `-` only
fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(SeqFileError::InvalidName(name.to_string()))
    }
}
