//! seqfile CLI
//!
//! Command-line interface for creating, loading and inspecting tables.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use seqfile::chain::RepairOutcome;
use seqfile::loader;
use seqfile::{Config, Database, Result, Schema};
use tracing_subscriber::{fmt, EnvFilter};

/// seqfile CLI
#[derive(Parser, Debug)]
#[command(name = "seqfile")]
#[command(about = "Key-ordered sequential record files")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./seqfile_data")]
    data_dir: PathBuf,

    /// Block size in bytes (must match the one the data was written with)
    #[arg(short, long, default_value = "32")]
    block_size: usize,

    /// Blocks kept in the read cache (0 disables it)
    #[arg(short, long, default_value = "8")]
    cache_blocks: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create (or replace) a table
    Create {
        /// Table name
        table: String,

        /// Field definitions as name:length; the first is the search key
        #[arg(required = true)]
        fields: Vec<String>,
    },

    /// Replace a table's contents from a bulk-load file
    Load {
        table: String,

        /// Path to the bulk-load file
        file: PathBuf,
    },

    /// Insert one record in key order
    Insert {
        table: String,

        /// Field values in schema order ("null" for a null field)
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Print one field of every record, in key order
    ScanField {
        table: String,

        field: String,
    },

    /// Print records whose key lies in [min, max]
    ScanRange {
        table: String,

        min: String,

        max: String,
    },

    /// Dump the chain with every record's position
    Chain {
        table: String,
    },

    /// Check the chain without modifying it
    Verify {
        table: String,
    },

    /// Cut the chain at the first broken link
    Repair {
        table: String,
    },

    /// List known tables
    Tables,
}

fn main() {
    // Logs go to stderr so scan output stays clean
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,seqfile=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .block_size(args.block_size)
        .cache_capacity(args.cache_blocks)
        .build();

    let db = match Database::open(config) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&db, args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(db: &Database, command: Commands) -> Result<()> {
    match command {
        Commands::Create { table, fields } => {
            let fields = fields
                .iter()
                .map(|f| Schema::parse_field(f))
                .collect::<Result<Vec<_>>>()?;
            let schema = Schema::new(fields)?;
            db.create_table(&table, schema)?;
            println!("created table {}", table);
        }

        Commands::Load { table, file } => {
            let mut table = db.open_table(&table)?;
            let summary = db.load_file(&mut table, &file)?;
            println!(
                "loaded {} records into {} ({} bytes)",
                summary.inserted,
                table.name(),
                summary.bytes_written
            );
        }

        Commands::Insert { table, values } => {
            let mut table = db.open_table(&table)?;
            let values = values.iter().map(|v| loader::parse_value(v)).collect();
            let offset = db.insert(&mut table, values)?;
            println!("inserted at offset {}", offset);
        }

        Commands::ScanField { table, field } => {
            let table = db.open_table(&table)?;
            let scan = db.scan_field(&table, &field)?;
            for value in &scan.items {
                println!("{}", value.as_deref().unwrap_or(loader::NULL_TOKEN));
            }
            report_partial(&scan.stop);
        }

        Commands::ScanRange { table, min, max } => {
            let table = db.open_table(&table)?;
            let scan = db.scan_range(&table, &min, &max)?;
            for record in &scan.items {
                println!("{}", record.display(table.schema()));
            }
            report_partial(&scan.stop);
        }

        Commands::Chain { table } => {
            let table = db.open_table(&table)?;
            let dump = db.chain_links(&table)?;
            match dump.head {
                Some(head) => println!("head -> {}", head),
                None => println!("head -> none"),
            }
            for link in &dump.links {
                let next = link
                    .next
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "none".to_string());
                println!(
                    "{:>8} ({}) key={} len={} next={}",
                    link.offset,
                    link.pointer,
                    link.key.as_deref().unwrap_or(loader::NULL_TOKEN),
                    link.len,
                    next
                );
            }
            println!("stopped: {}", dump.stop);
        }

        Commands::Verify { table } => {
            let table = db.open_table(&table)?;
            let report = db.verify(&table)?;
            println!(
                "{} records, ordered: {}, stopped: {}",
                report.records, report.ordered, report.stop
            );
            if !report.is_healthy() {
                println!("chain is damaged; run `seqfile repair {}`", table.name());
            }
        }

        Commands::Repair { table } => {
            let mut table = db.open_table(&table)?;
            match db.repair(&mut table)? {
                RepairOutcome::Healthy => println!("chain is healthy, nothing to do"),
                RepairOutcome::Truncated { last_good, reason } => match last_good {
                    Some(offset) => println!("chain cut after offset {} ({})", offset, reason),
                    None => println!("chain emptied at the header ({})", reason),
                },
            }
        }

        Commands::Tables => {
            for name in db.tables() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

fn report_partial(stop: &seqfile::ScanStop) {
    if !stop.is_clean() {
        eprintln!("warning: scan ended early: {}", stop);
    }
}
