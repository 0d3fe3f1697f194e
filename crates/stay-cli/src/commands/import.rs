//! Import command for replacing all entries from a JSON export.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use stay_core::parse_entries_json;

use crate::Config;
use crate::commands::util::open_database;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// JSON file to read. Reads stdin when omitted.
    pub file: Option<PathBuf>,
}

fn read_input(args: &ImportArgs) -> Result<String> {
    match &args.file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            Ok(input)
        }
    }
}

/// Parses `input` and replaces the stored entries with it.
///
/// Nothing is written unless the whole document parses. Returns the number
/// of entries stored, after duplicate IDs collapse.
pub fn import_str(input: &str, config: &Config) -> Result<usize> {
    let entries = parse_entries_json(input).context("failed to import entries")?;
    let mut db = open_database(config)?;
    let replaced = db.list_entries()?.len();
    let imported = db.replace_entries(&entries)?;
    tracing::info!(imported, replaced, "imported entries");
    Ok(imported)
}

pub fn run<W: Write>(writer: &mut W, args: &ImportArgs, config: &Config) -> Result<usize> {
    let input = read_input(args)?;
    let imported = import_str(&input, config)?;
    writeln!(writer, "Imported {imported} entries")?;
    Ok(imported)
}
