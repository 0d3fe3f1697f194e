//! Stay reconstruction.
//!
//! Turns an entry log into the date intervals during which the traveler was
//! present in one country.
//!
//! # Algorithm Summary
//!
//! 1. Stable-sort all entries by departure date (input order breaks ties)
//! 2. Each non-domestic arrival into the target country opens an interval at
//!    its arrival date
//! 3. The interval closes at the departure date of the next entry, or stays
//!    open until the reference date when there is no next entry

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::entry::TravelEntry;
use crate::types::{CountryCode, ValidationError};

/// An inclusive date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Interval {
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Clips the interval to `[start, end]`. `None` when nothing remains,
    /// which includes intervals whose end precedes their start.
    pub fn clip(&self, start: NaiveDate, end: NaiveDate) -> Option<Self> {
        let start = self.start.max(start);
        let end = self.end.min(end);
        (start <= end).then_some(Self { start, end })
    }

    /// Number of calendar days covered, counting both boundary days.
    pub fn days(&self) -> i64 {
        if self.end < self.start {
            return 0;
        }
        (self.end - self.start).num_days() + 1
    }
}

/// Which entry ends a stay that an arrival opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClosingPolicy {
    /// The next entry in departure order closes the stay, whatever country
    /// it departs from.
    #[default]
    NextEntry,
    /// The next later entry departing from the same country closes the stay.
    /// Without one the stay is open-ended.
    MatchingDeparture,
}

impl ClosingPolicy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NextEntry => "next-entry",
            Self::MatchingDeparture => "matching-departure",
        }
    }
}

impl fmt::Display for ClosingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ClosingPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "next-entry" => Ok(Self::NextEntry),
            "matching-departure" => Ok(Self::MatchingDeparture),
            _ => Err(ValidationError::InvalidClosingPolicy {
                value: s.to_string(),
            }),
        }
    }
}

/// Entries in departure order.
fn chronological(entries: &[TravelEntry]) -> Vec<&TravelEntry> {
    let mut sorted: Vec<&TravelEntry> = entries.iter().collect();
    // sort_by_key is stable, so input order breaks same-day ties
    sorted.sort_by_key(|e| e.departure_date);
    sorted
}

/// Reconstructs presence intervals for `country`.
///
/// Domestic entries open no interval but still close the stay before them.
/// Intervals come out in departure order. Open-ended stays end at
/// `open_until`. Overlaps from malformed logs are kept as-is; see
/// [`merge_overlapping`].
pub fn presence_intervals(
    entries: &[TravelEntry],
    country: &CountryCode,
    open_until: NaiveDate,
    closing: ClosingPolicy,
) -> Vec<Interval> {
    let sorted = chronological(entries);

    sorted
        .iter()
        .enumerate()
        .filter(|(_, entry)| &entry.arrival_country == country && !entry.is_domestic())
        .map(|(i, entry)| {
            let later = &sorted[i + 1..];
            let closer = match closing {
                ClosingPolicy::NextEntry => later.first(),
                ClosingPolicy::MatchingDeparture => {
                    later.iter().find(|e| &e.departure_country == country)
                }
            };
            let end = closer.map_or(open_until, |e| e.departure_date);
            Interval::new(entry.arrival_date, end)
        })
        .collect()
}

/// Coalesces overlapping or adjacent intervals.
///
/// Inverted intervals (end before start) are dropped.
pub fn merge_overlapping(intervals: &[Interval]) -> Vec<Interval> {
    let mut sorted: Vec<Interval> = intervals
        .iter()
        .copied()
        .filter(|i| i.start <= i.end)
        .collect();
    sorted.sort_by_key(|i| (i.start, i.end));

    let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end.succ_opt().unwrap_or(last.end) => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

/// The country the traveler was in on `date`.
///
/// That is the arrival country of the latest entry arriving on or before
/// `date`. Returns `None` for dates after `today` and before the first arrival.
pub fn country_on<'a>(
    entries: &'a [TravelEntry],
    date: NaiveDate,
    today: NaiveDate,
) -> Option<&'a CountryCode> {
    if date > today {
        return None;
    }
    let mut by_arrival: Vec<&TravelEntry> = entries.iter().collect();
    by_arrival.sort_by_key(|e| e.arrival_date);
    by_arrival
        .into_iter()
        .rev()
        .find(|e| e.arrival_date <= date)
        .map(|e| &e.arrival_country)
}

/// Distinct years touched by any entry date, newest first.
///
/// An empty log yields the current year.
pub fn available_years(entries: &[TravelEntry], today: NaiveDate) -> Vec<i32> {
    let mut years: Vec<i32> = entries
        .iter()
        .flat_map(|e| [e.departure_date.year(), e.arrival_date.year()])
        .collect();
    if years.is_empty() {
        return vec![today.year()];
    }
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;

    use crate::entry::TravelEntry;
    use crate::types::{CountryCode, EntryId};

    pub fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    pub fn code(s: &str) -> CountryCode {
        CountryCode::new(s).unwrap()
    }

    /// Builds an entry: `entry("e1", "US", "AU", "2024-01-01", "2024-01-10")`.
    pub fn entry(id: &str, from: &str, to: &str, departed: &str, arrived: &str) -> TravelEntry {
        TravelEntry {
            id: EntryId::new(id).unwrap(),
            departure_country: code(from),
            arrival_country: code(to),
            departure_date: date(departed),
            arrival_date: date(arrived),
        }
    }
}
