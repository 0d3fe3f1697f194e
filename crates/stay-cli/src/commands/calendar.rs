//! Calendar command: a month grid of the country occupied on each day.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Datelike, Months, NaiveDate};
use clap::Args;

use stay_core::{TravelEntry, available_years, country_on};

use crate::Config;
use crate::commands::util::{open_database, parse_month};

#[derive(Debug, Args)]
pub struct CalendarArgs {
    /// Month to show (YYYY-MM). Defaults to the current month.
    #[arg(long)]
    pub month: Option<String>,
}

/// Renders `month` (any date inside it) as a Sunday-first grid.
///
/// Each cell is the day number followed by the country code; days in the
/// future or before the first arrival have no code.
pub fn format_month(
    entries: &[TravelEntry],
    month: NaiveDate,
    today: NaiveDate,
) -> Result<String> {
    let first = month.with_day(1).context("month has no first day")?;
    let next = first
        .checked_add_months(Months::new(1))
        .context("month out of range")?;

    let mut output = String::new();
    writeln!(output, "{}", first.format("%B %Y")).unwrap();
    writeln!(output, "Sun    Mon    Tue    Wed    Thu    Fri    Sat").unwrap();

    let mut totals: BTreeMap<&str, u32> = BTreeMap::new();
    let mut cells: Vec<String> = (0..first.weekday().num_days_from_sunday())
        .map(|_| "      ".to_string())
        .collect();

    for day in first.iter_days().take_while(|d| *d < next) {
        let code = country_on(entries, day, today).map(|c| c.as_str());
        if let Some(code) = code {
            *totals.entry(code).or_default() += 1;
        }
        cells.push(format!("{:>2} {:<3}", day.day(), code.unwrap_or("")));

        if cells.len() == 7 {
            writeln!(output, "{}", cells.join(" ").trim_end()).unwrap();
            cells.clear();
        }
    }
    if !cells.is_empty() {
        writeln!(output, "{}", cells.join(" ").trim_end()).unwrap();
    }

    if !totals.is_empty() {
        writeln!(output).unwrap();
        for (code, days) in &totals {
            let unit = if *days == 1 { "day" } else { "days" };
            writeln!(output, "{code}: {days} {unit}").unwrap();
        }
    }

    Ok(output)
}

pub fn run<W: Write>(
    writer: &mut W,
    args: &CalendarArgs,
    config: &Config,
    today: NaiveDate,
) -> Result<()> {
    let month = match &args.month {
        Some(month) => parse_month(month)?,
        None => today,
    };
    let entries = open_database(config)?.list_entries()?;
    write!(writer, "{}", format_month(&entries, month, today)?)?;
    Ok(())
}

/// Prints the years that have travel data, newest first.
pub fn years<W: Write>(writer: &mut W, config: &Config, today: NaiveDate) -> Result<()> {
    let entries = open_database(config)?.list_entries()?;
    for year in available_years(&entries, today) {
        writeln!(writer, "{year}")?;
    }
    Ok(())
}
