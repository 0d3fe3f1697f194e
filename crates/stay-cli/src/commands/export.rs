//! Export command for writing all entries as a JSON array.
//!
//! The output is the interchange format `stay import` reads back.

use std::io::Write;

use anyhow::Result;

use stay_core::entries_to_json;

use crate::Config;
use crate::commands::util::open_database;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<usize> {
    let entries = open_database(config)?.list_entries()?;
    writeln!(writer, "{}", entries_to_json(&entries)?)?;
    Ok(entries.len())
}
