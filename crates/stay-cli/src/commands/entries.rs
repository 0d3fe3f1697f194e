//! Entry commands: add, edit, remove, list and clear travel entries.
//!
//! The store is always rewritten as a whole collection; no command edits a
//! single row in place.

use std::io::Write;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::Args;
use uuid::Uuid;

use stay_core::{CountryCode, EntryId, RuleSet, TravelEntry, entries_to_json};

use crate::Config;
use crate::commands::util::{open_database, parse_country};

/// Number of ID characters shown in listings.
const SHORT_ID_LEN: usize = 8;

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Country departed from (e.g., US).
    #[arg(long, value_parser = parse_country)]
    pub from: CountryCode,
    /// Country arrived in (e.g., AU).
    #[arg(long, value_parser = parse_country)]
    pub to: CountryCode,
    /// Departure date (YYYY-MM-DD).
    #[arg(long)]
    pub departed: NaiveDate,
    /// Arrival date (YYYY-MM-DD).
    #[arg(long)]
    pub arrived: NaiveDate,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Entry ID or unique ID prefix.
    pub id: String,
    #[arg(long, value_parser = parse_country)]
    pub from: Option<CountryCode>,
    #[arg(long, value_parser = parse_country)]
    pub to: Option<CountryCode>,
    #[arg(long)]
    pub departed: Option<NaiveDate>,
    #[arg(long)]
    pub arrived: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Entry ID or unique ID prefix.
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

fn check_dates(entry: &TravelEntry) -> Result<()> {
    if entry.arrival_date < entry.departure_date {
        bail!(
            "arrival date {} is before departure date {}",
            entry.arrival_date,
            entry.departure_date
        );
    }
    Ok(())
}

fn warn_unknown_countries(entry: &TravelEntry, rules: &RuleSet) {
    for code in [&entry.departure_country, &entry.arrival_country] {
        if !rules.contains(code) {
            tracing::warn!(
                country = %code,
                "no residency rule for country; it will not be counted"
            );
        }
    }
}

/// Finds the index of the entry whose ID equals or uniquely starts with `id`.
fn find_entry(entries: &[TravelEntry], id: &str) -> Result<usize> {
    if let Some(idx) = entries.iter().position(|e| e.id.as_str() == id) {
        return Ok(idx);
    }
    let mut matches = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.id.as_str().starts_with(id));
    match (matches.next(), matches.next()) {
        (Some((idx, _)), None) => Ok(idx),
        (None, _) => bail!("entry not found: {id}"),
        (Some(_), Some(_)) => bail!("entry ID prefix is ambiguous: {id}"),
    }
}

fn describe(entry: &TravelEntry) -> String {
    format!(
        "{} → {} ({} → {})",
        entry.departure_country, entry.arrival_country, entry.departure_date, entry.arrival_date
    )
}

fn short_id(id: &EntryId) -> &str {
    let id = id.as_str();
    id.char_indices()
        .nth(SHORT_ID_LEN)
        .map_or(id, |(end, _)| &id[..end])
}

pub fn add<W: Write>(writer: &mut W, args: &AddArgs, config: &Config) -> Result<EntryId> {
    let entry = TravelEntry {
        id: EntryId::new(Uuid::new_v4().to_string())?,
        departure_country: args.from.clone(),
        arrival_country: args.to.clone(),
        departure_date: args.departed,
        arrival_date: args.arrived,
    };
    check_dates(&entry)?;

    let mut db = open_database(config)?;
    warn_unknown_countries(&entry, &db.load_rules()?);

    let mut entries = db.list_entries()?;
    let description = describe(&entry);
    let id = entry.id.clone();
    entries.push(entry);
    db.replace_entries(&entries)?;

    writeln!(writer, "Added entry {}: {description}", short_id(&id))?;
    Ok(id)
}

pub fn edit<W: Write>(writer: &mut W, args: &EditArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let mut entries = db.list_entries()?;
    let idx = find_entry(&entries, &args.id)?;

    let mut entry = entries[idx].clone();
    if let Some(from) = &args.from {
        entry.departure_country = from.clone();
    }
    if let Some(to) = &args.to {
        entry.arrival_country = to.clone();
    }
    if let Some(departed) = args.departed {
        entry.departure_date = departed;
    }
    if let Some(arrived) = args.arrived {
        entry.arrival_date = arrived;
    }
    check_dates(&entry)?;
    warn_unknown_countries(&entry, &db.load_rules()?);

    let message = format!("Updated entry {}: {}", short_id(&entry.id), describe(&entry));
    entries[idx] = entry;
    db.replace_entries(&entries)?;

    writeln!(writer, "{message}")?;
    Ok(())
}

pub fn remove<W: Write>(writer: &mut W, args: &RemoveArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let mut entries = db.list_entries()?;
    let idx = find_entry(&entries, &args.id)?;
    let removed = entries.remove(idx);
    db.replace_entries(&entries)?;

    writeln!(
        writer,
        "Removed entry {}: {}",
        short_id(&removed.id),
        describe(&removed)
    )?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, args: &ListArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let mut entries = db.list_entries()?;

    if args.json {
        writeln!(writer, "{}", entries_to_json(&entries)?)?;
        return Ok(());
    }

    if entries.is_empty() {
        writeln!(writer, "No travel entries recorded.")?;
        return Ok(());
    }

    entries.sort_by_key(|e| e.departure_date);
    writeln!(writer, "ID        FROM  TO    DEPARTED    ARRIVED")?;
    for entry in &entries {
        writeln!(
            writer,
            "{:<8}  {:<4}  {:<4}  {}  {}",
            short_id(&entry.id),
            entry.departure_country,
            entry.arrival_country,
            entry.departure_date,
            entry.arrival_date
        )?;
    }
    Ok(())
}

pub fn clear<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let count = db.list_entries()?.len();
    db.replace_entries(&[])?;
    writeln!(writer, "Cleared {count} entries")?;
    Ok(())
}
