//! CLI for maintaining configured tables.
//!
//! Provides commands for:
//! - Listing configured tables
//! - Loading a table and reporting its size
//! - Exporting a table to a spreadsheet
//! - Importing a spreadsheet, reconciling it and optionally saving

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rowsync_core::config::{AppSettings, TableConfig};
use rowsync_core::persistence::SqliteStore;
#[cfg(feature = "xlsx")]
use rowsync_core::tabular::XlsxTabular;
use rowsync_core::{SyncError, TableSession};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file
    #[arg(long, global = true, default_value = "rowsync.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List configured tables
    Tables,

    /// Load a table and print its row count
    Load {
        /// Table name or display name
        #[arg(long)]
        table: String,
    },

    /// Export a table to an .xlsx file
    Export {
        /// Table name or display name
        #[arg(long)]
        table: String,

        /// Destination file
        #[arg(long)]
        out: PathBuf,
    },

    /// Reconcile an .xlsx file against a table
    Import {
        /// Table name or display name
        #[arg(long)]
        table: String,

        /// Source file
        #[arg(long)]
        file: PathBuf,

        /// Save the reconciled rows
        #[arg(long)]
        apply: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = AppSettings::load(&args.config)
        .with_context(|| format!("Failed to read settings from {}", args.config.display()))?;
    tracing::debug!(
        "Loaded {} table configurations from {}",
        settings.tables.len(),
        args.config.display()
    );

    match args.command {
        Command::Tables => {
            for table in &settings.tables {
                println!("{}\t{}\t{}", table.name, table.label(), table.primary_keys.join(","));
            }
        }
        Command::Load { table } => {
            let session = open_session(&settings, &table)?;
            println!("{}: {} rows", session.table().label(), session.working_set().len());
        }
        Command::Export { table, out } => {
            let session = open_session(&settings, &table)?;
            let count = export(&session, &out)?;
            println!("Exported {} rows to {}", count, out.display());
        }
        Command::Import { table, file, apply } => {
            let mut session = open_session(&settings, &table)?;
            import(&mut session, &file, apply)?;
        }
    }

    Ok(())
}

fn table_config(settings: &AppSettings, name: &str) -> Result<TableConfig> {
    settings
        .table(name)
        .cloned()
        .ok_or_else(|| anyhow!("Table '{}' is not configured", name))
}

fn open_session(settings: &AppSettings, name: &str) -> Result<TableSession<SqliteStore>> {
    let table = table_config(settings, name)?;
    let store = SqliteStore::open_path(&settings.database_path).with_context(|| {
        format!("Failed to open database {}", settings.database_path.display())
    })?;
    let mut session = TableSession::new(store, table);
    session.load()?;
    Ok(session)
}

#[cfg(feature = "xlsx")]
fn export(session: &TableSession<SqliteStore>, out: &std::path::Path) -> Result<usize> {
    Ok(session.export_to(&XlsxTabular::default(), out)?)
}

#[cfg(not(feature = "xlsx"))]
fn export(_session: &TableSession<SqliteStore>, _out: &std::path::Path) -> Result<usize> {
    Err(anyhow!("Spreadsheet support is disabled in this build"))
}

#[cfg(feature = "xlsx")]
fn import(session: &mut TableSession<SqliteStore>, file: &std::path::Path, apply: bool) -> Result<()> {
    let summary = session.import_from(&XlsxTabular::default(), file)?;
    for warning in &summary.warnings {
        println!("warning: {}", warning);
    }
    if !summary.applied {
        println!("No rows in {}; nothing to do", file.display());
        return Ok(());
    }

    let states = summary.states;
    println!(
        "added: {}, modified: {}, unchanged: {}, delete pending: {}",
        states.added, states.modified, states.unchanged, states.delete_pending
    );

    let violations = session.validate();
    for violation in &violations {
        println!("invalid: {}", violation);
    }

    if !apply {
        return Ok(());
    }
    if !violations.is_empty() {
        return Err(SyncError::ValidationFailure(violations).into());
    }

    let saved = session.save()?;
    println!(
        "Saved: {} inserted, {} updated, {} deleted",
        saved.inserted, saved.updated, saved.deleted
    );
    Ok(())
}

#[cfg(not(feature = "xlsx"))]
fn import(_session: &mut TableSession<SqliteStore>, _file: &std::path::Path, _apply: bool) -> Result<()> {
    Err(anyhow!("Spreadsheet support is disabled in this build"))
}
