//! Core domain logic for the stay tracker.
//!
//! This crate contains the residency day-counting engine:
//! - Stay reconstruction: deriving presence intervals from a border-crossing log
//! - Residency evaluation: clipping stays to each rule's window and classifying
//!   the day count against its threshold
//! - Country rules: the built-in rule table and immutable rule-set edits
//!
//! Nothing here performs I/O or reads the clock; callers pass the reference
//! date in.

pub mod entry;
pub mod residency;
pub mod rules;
pub mod stay;
pub mod types;

pub use entry::{ImportError, TravelEntry, entries_to_json, parse_entries_json};
pub use residency::{
    EvaluationOptions, Reference, StaySummary, Window, classify, days_present, displayed, evaluate,
    evaluate_rule,
};
pub use rules::{CountryRule, RuleError, RuleSet, RuleUpdate};
pub use stay::{
    ClosingPolicy, Interval, available_years, country_on, merge_overlapping, presence_intervals,
};
pub use types::{CountryCode, EntryId, Status, ValidationError, WindowPolicy};
