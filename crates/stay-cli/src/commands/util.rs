//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;

use stay_core::CountryCode;
use stay_db::Database;

use crate::Config;

/// Codes accepted for new custom rules.
static RULE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,3}$").expect("rule code pattern is valid"));

/// Clap value parser for country codes. Input is trimmed and upper-cased.
pub fn parse_country(s: &str) -> Result<CountryCode, String> {
    CountryCode::new(s.trim().to_uppercase()).map_err(|e| e.to_string())
}

/// Validates a code for a new custom rule (2-3 ASCII letters).
pub fn validate_rule_code(code: &CountryCode) -> Result<()> {
    if !RULE_CODE_RE.is_match(code.as_str()) {
        anyhow::bail!("Invalid country code: {code}. Use 2-3 letters (e.g., FR, DE)");
    }
    Ok(())
}

/// Parses a `YYYY-MM` month into its first day.
pub fn parse_month(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
        .with_context(|| format!("Invalid month: {s}. Use YYYY-MM (e.g., 2024-03)"))
}

/// Opens the configured database, creating its parent directory if needed.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}
