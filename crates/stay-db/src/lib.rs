//! Storage layer for the stay tracker.
//!
//! Persists travel entries and country rules using `rusqlite`. Summaries are
//! never stored; they are recomputed from entries and rules on demand.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! Dates are stored as TEXT in `YYYY-MM-DD` form. Both tables carry a
//! `position` column so collections come back in the order they were saved;
//! the evaluator relies on input order to break same-day ties.
//!
//! Saves replace the whole collection inside a transaction, matching how the
//! front end edits entries and rules.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, params};
use thiserror::Error;

use stay_core::{
    CountryCode, CountryRule, EntryId, RuleSet, TravelEntry, ValidationError, WindowPolicy,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored date could not be parsed.
    #[error("invalid date for entry {entry_id}: {value}")]
    DateParse {
        entry_id: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored value failed core validation.
    #[error("invalid stored value in {table}: {source}")]
    Validation {
        table: &'static str,
        #[source]
        source: ValidationError,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Raw entry row, converted to a [`TravelEntry`] outside the row callback.
struct EntryRow {
    id: String,
    departure_country: String,
    arrival_country: String,
    departure_date: String,
    arrival_date: String,
}

/// Raw rule row.
struct RuleRow {
    code: String,
    name: String,
    threshold: i64,
    calendar_type: String,
    description: String,
    is_custom: bool,
}

fn validation(table: &'static str) -> impl Fn(ValidationError) -> DbError {
    move |source| DbError::Validation { table, source }
}

fn parse_date(entry_id: &str, value: String) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|source| DbError::DateParse {
        entry_id: entry_id.to_string(),
        value,
        source,
    })
}

impl EntryRow {
    fn into_entry(self) -> Result<TravelEntry, DbError> {
        let departure_date = parse_date(&self.id, self.departure_date)?;
        let arrival_date = parse_date(&self.id, self.arrival_date)?;
        Ok(TravelEntry {
            id: EntryId::new(self.id).map_err(validation("entries"))?,
            departure_country: CountryCode::new(self.departure_country)
                .map_err(validation("entries"))?,
            arrival_country: CountryCode::new(self.arrival_country)
                .map_err(validation("entries"))?,
            departure_date,
            arrival_date,
        })
    }
}

impl RuleRow {
    fn into_rule(self) -> Result<CountryRule, DbError> {
        Ok(CountryRule {
            code: CountryCode::new(self.code).map_err(validation("rules"))?,
            name: self.name,
            threshold: self.threshold,
            window: self
                .calendar_type
                .parse::<WindowPolicy>()
                .map_err(validation("rules"))?,
            description: self.description,
            is_custom: self.is_custom,
        })
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Travel entries: one border crossing per row
            -- position: save order, used as the tiebreak for same-day departures
            CREATE TABLE IF NOT EXISTS entries (
                position INTEGER PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                departure_country TEXT NOT NULL,
                arrival_country TEXT NOT NULL,
                departure_date TEXT NOT NULL,
                arrival_date TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_entries_departure ON entries(departure_date);

            -- Country rules: built-in overrides and custom rules
            CREATE TABLE IF NOT EXISTS rules (
                position INTEGER PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                threshold INTEGER NOT NULL,
                calendar_type TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                is_custom INTEGER NOT NULL DEFAULT 0
            );
            ",
        )?;
        Ok(())
    }

    /// Lists all entries in save order.
    pub fn list_entries(&self) -> Result<Vec<TravelEntry>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, departure_country, arrival_country, departure_date, arrival_date
            FROM entries
            ORDER BY position ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(EntryRow {
                id: row.get(0)?,
                departure_country: row.get(1)?,
                arrival_country: row.get(2)?,
                departure_date: row.get(3)?,
                arrival_date: row.get(4)?,
            })
        })?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.into_entry()?);
        }
        Ok(entries)
    }

    /// Replaces every stored entry with `entries`, preserving their order.
    ///
    /// Entries sharing an ID collapse to the last one written. Returns the
    /// number of rows stored.
    pub fn replace_entries(&mut self, entries: &[TravelEntry]) -> Result<usize, DbError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM entries", [])?;
        {
            let mut stmt = tx.prepare(
                "
                INSERT OR REPLACE INTO entries
                (position, id, departure_country, arrival_country, departure_date, arrival_date)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
            )?;
            for (position, entry) in (0_i64..).zip(entries) {
                stmt.execute(params![
                    position,
                    entry.id.as_str(),
                    entry.departure_country.as_str(),
                    entry.arrival_country.as_str(),
                    entry.departure_date.format(DATE_FORMAT).to_string(),
                    entry.arrival_date.format(DATE_FORMAT).to_string(),
                ])?;
            }
        }
        let stored: i64 = tx.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        tx.commit()?;
        tracing::debug!(given = entries.len(), stored, "replaced entries");
        Ok(usize::try_from(stored).unwrap_or_default())
    }

    /// Lists stored rules in save order, without the built-in seed.
    pub fn list_rules(&self) -> Result<Vec<CountryRule>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT code, name, threshold, calendar_type, description, is_custom
            FROM rules
            ORDER BY position ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RuleRow {
                code: row.get(0)?,
                name: row.get(1)?,
                threshold: row.get(2)?,
                calendar_type: row.get(3)?,
                description: row.get(4)?,
                is_custom: row.get(5)?,
            })
        })?;
        let mut rules = Vec::new();
        for row in rows {
            rules.push(row?.into_rule()?);
        }
        Ok(rules)
    }

    /// Loads the effective rule set: built-ins overlaid with stored rules.
    pub fn load_rules(&self) -> Result<RuleSet, DbError> {
        Ok(RuleSet::with_overrides(self.list_rules()?))
    }

    /// Replaces every stored rule with the contents of `rules`.
    pub fn save_rules(&mut self, rules: &RuleSet) -> Result<usize, DbError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM rules", [])?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO rules
                (position, code, name, threshold, calendar_type, description, is_custom)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            for (position, rule) in (0_i64..).zip(rules) {
                written += stmt.execute(params![
                    position,
                    rule.code.as_str(),
                    rule.name,
                    rule.threshold,
                    rule.window.as_str(),
                    rule.description,
                    rule.is_custom,
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(written, "saved rules");
        Ok(written)
    }
}
