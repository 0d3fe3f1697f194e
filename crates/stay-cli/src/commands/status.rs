//! Status command for showing days present and residency status per country.
//!
//! Live status evaluates calendar-year rules over the current year and rolling
//! rules over the twelve months ending today. `--year` switches to the
//! historical view anchored at December 31 of that year.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;

use stay_core::{Reference, StaySummary, available_years, displayed, evaluate};

use crate::Config;
use crate::commands::util::open_database;

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Show status as of December 31 of this year.
    #[arg(long, conflicts_with = "as_of")]
    pub year: Option<i32>,
    /// Show status as of this date instead of today (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub as_of: Option<NaiveDate>,
    /// Include countries with zero days.
    #[arg(long)]
    pub all: bool,
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Computed status data.
#[derive(Debug)]
pub struct StatusReport {
    pub reference: Reference,
    pub year: Option<i32>,
    pub summaries: Vec<StaySummary>,
    pub available_years: Vec<i32>,
    pub has_entries: bool,
}

/// Generates status data from the database.
pub fn generate_status(
    args: &StatusArgs,
    config: &Config,
    today: NaiveDate,
) -> Result<StatusReport> {
    let db = open_database(config)?;
    let entries = db.list_entries()?;
    let rules = db.load_rules()?;

    let reference = match args.year {
        Some(year) => Reference::year_end(year, today).context("invalid --year")?,
        None => Reference::today(args.as_of.unwrap_or(today)),
    };
    tracing::debug!(
        entries = entries.len(),
        rules = rules.len(),
        as_of = %reference.anchor(),
        "evaluating status"
    );

    let summaries = evaluate(&entries, &rules, reference, config.evaluation_options());
    Ok(StatusReport {
        reference,
        year: args.year,
        summaries,
        available_years: available_years(&entries, today),
        has_entries: !entries.is_empty(),
    })
}

// ========== Progress Bar ==========

/// Generates a 10-character bar of days against threshold.
/// Values <5% of the threshold get a single block for visibility.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress_bar(days: i64, threshold: i64) -> String {
    if threshold <= 0 {
        return "█".repeat(10);
    }

    let ratio = days.max(0) as f64 / threshold as f64;
    let filled = if ratio < 0.05 && days > 0 {
        1
    } else {
        (ratio * 10.0).round().min(10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

// ========== Human Output ==========

/// Summaries to print. A past year lists only countries with days; the live
/// view falls back to the first rules when nothing was counted.
fn shown(report: &StatusReport, all: bool) -> Vec<&StaySummary> {
    if all {
        report.summaries.iter().collect()
    } else if report.year.is_some() {
        report.summaries.iter().filter(|s| s.days > 0).collect()
    } else {
        displayed(&report.summaries)
    }
}

fn format_heading(report: &StatusReport) -> String {
    match report.year {
        Some(year) => format!("{year} (year end)"),
        None => format!("as of {}", report.reference.anchor().format("%b %-d, %Y")),
    }
}

/// Formats the human-readable status output.
pub fn format_status(report: &StatusReport, all: bool) -> String {
    let mut output = String::new();

    writeln!(output, "RESIDENCY STATUS: {}", format_heading(report)).unwrap();
    writeln!(output).unwrap();

    for stay in shown(report, all) {
        writeln!(
            output,
            "{:<16} {:<3} {:>4} / {:<4} {}  {:<17}  {}",
            stay.country,
            stay.country_code.as_str(),
            stay.days,
            stay.threshold,
            progress_bar(stay.days, stay.threshold),
            stay.status.label(),
            stay.window.label()
        )
        .unwrap();
    }

    if !report.has_entries {
        writeln!(output).unwrap();
        writeln!(output, "No travel entries recorded.").unwrap();
        writeln!(output, "Hint: Run 'stay add' to record a border crossing.").unwrap();
        return output;
    }

    let years: Vec<String> = report.available_years.iter().map(i32::to_string).collect();
    writeln!(output).unwrap();
    writeln!(output, "Years with travel data: {}", years.join(", ")).unwrap();

    output
}

// ========== JSON Output ==========

/// JSON status structure.
#[derive(Debug, Serialize)]
pub struct JsonStatus<'a> {
    pub as_of: String,
    pub year: Option<i32>,
    pub stays: Vec<&'a StaySummary>,
}

/// Formats status data as JSON.
pub fn format_status_json(report: &StatusReport, all: bool) -> Result<String> {
    let status = JsonStatus {
        as_of: report.reference.anchor().format("%Y-%m-%d").to_string(),
        year: report.year,
        stays: shown(report, all),
    };
    Ok(serde_json::to_string_pretty(&status)?)
}

// ========== Public Interface ==========

pub fn run<W: Write>(
    writer: &mut W,
    args: &StatusArgs,
    config: &Config,
    today: NaiveDate,
) -> Result<()> {
    let report = generate_status(args, config, today)?;
    if args.json {
        writeln!(writer, "{}", format_status_json(&report, args.all)?)?;
    } else {
        write!(writer, "{}", format_status(&report, args.all))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use stay_core::{CountryCode, EntryId, Status, TravelEntry};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn entry(id: &str, from: &str, to: &str, departed: &str, arrived: &str) -> TravelEntry {
        TravelEntry {
            id: EntryId::new(id).unwrap(),
            departure_country: CountryCode::new(from).unwrap(),
            arrival_country: CountryCode::new(to).unwrap(),
            departure_date: date(departed),
            arrival_date: date(arrived),
        }
    }

    fn config_with(temp: &tempfile::TempDir, entries: &[TravelEntry]) -> Config {
        let config = Config {
            database_path: temp.path().join("stay.db"),
            ..Config::default()
        };
        open_database(&config)
            .unwrap()
            .replace_entries(entries)
            .unwrap();
        config
    }

    fn args() -> StatusArgs {
        StatusArgs {
            year: None,
            as_of: None,
            all: false,
            json: false,
        }
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 183), "░░░░░░░░░░");
        assert_eq!(progress_bar(1, 183), "█░░░░░░░░░");
        assert_eq!(progress_bar(183, 183), "██████████");
        assert_eq!(progress_bar(400, 183), "██████████");
        assert_eq!(progress_bar(0, 0), "██████████");
    }

    #[test]
    fn status_shows_countries_with_days() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_with(
            &temp,
            &[
                entry("1", "US", "AU", "2024-01-01", "2024-01-10"),
                entry("2", "AU", "NZ", "2024-06-01", "2024-06-01"),
            ],
        );

        let mut output = Vec::new();
        run(&mut output, &args(), &config, date("2024-06-30")).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        RESIDENCY STATUS: as of Jun 30, 2024

        Australia        AU   144 / 183  ████████░░  Safe               Calendar Year
        New Zealand      NZ    30 / 183  ██░░░░░░░░  Safe               Rolling 12mo

        Years with travel data: 2024
        ");
    }

    #[test]
    fn status_without_entries_shows_first_five_rules() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_with(&temp, &[]);

        let report = generate_status(&args(), &config, date("2024-06-30")).unwrap();
        let output = format_status(&report, false);
        assert_eq!(output.matches("/ 18").count(), 5);
        assert!(output.contains("Hint: Run 'stay add'"));

        let all = format_status(&report, true);
        assert_eq!(all.matches("/ 18").count(), 10);
    }

    #[test]
    fn historical_year_uses_year_end() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_with(&temp, &[entry("1", "US", "JP", "2023-07-01", "2023-07-01")]);

        let status_args = StatusArgs {
            year: Some(2023),
            ..args()
        };
        let report = generate_status(&status_args, &config, date("2024-03-01")).unwrap();
        let jp = &report.summaries[0];
        assert_eq!(jp.country_code.as_str(), "JP");
        // Jul 1 through Dec 31 2023.
        assert_eq!(jp.days, 184);
        assert_eq!(jp.status, Status::Danger);
        assert!(format_status(&report, false).starts_with("RESIDENCY STATUS: 2023 (year end)\n"));
    }

    #[test]
    fn historical_year_without_days_lists_no_countries() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_with(&temp, &[entry("1", "US", "JP", "2024-07-01", "2024-07-01")]);

        let status_args = StatusArgs {
            year: Some(2022),
            ..args()
        };
        let report = generate_status(&status_args, &config, date("2024-08-01")).unwrap();
        assert!(!format_status(&report, false).contains("/ 18"));
        assert_eq!(format_status(&report, true).matches("/ 18").count(), 10);

        let json: serde_json::Value =
            serde_json::from_str(&format_status_json(&report, false).unwrap()).unwrap();
        assert!(json["stays"].as_array().unwrap().is_empty());
    }

    #[test]
    fn status_json_lists_stays() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_with(&temp, &[entry("1", "US", "HK", "2024-01-01", "2024-01-01")]);

        let json_args = StatusArgs {
            json: true,
            ..args()
        };
        let mut output = Vec::new();
        run(&mut output, &json_args, &config, date("2024-05-24")).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["as_of"], "2024-05-24");
        assert_eq!(value["stays"].as_array().unwrap().len(), 1);
        assert_eq!(value["stays"][0]["countryCode"], "HK");
        assert_eq!(value["stays"][0]["days"], 145);
        assert_eq!(value["stays"][0]["status"], "warning");
    }

    #[test]
    fn out_of_range_year_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_with(&temp, &[]);
        let status_args = StatusArgs {
            year: Some(i32::MAX),
            ..args()
        };
        let err = generate_status(&status_args, &config, date("2024-01-01")).unwrap_err();
        assert!(err.to_string().contains("invalid --year"));
    }
}
