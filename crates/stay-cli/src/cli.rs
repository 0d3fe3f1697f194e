//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::commands::calendar::CalendarArgs;
use crate::commands::entries::{AddArgs, EditArgs, ListArgs, RemoveArgs};
use crate::commands::import::ImportArgs;
use crate::commands::rules::{RuleAddArgs, RuleListArgs, RuleRemoveArgs, RuleUpdateArgs};
use crate::commands::status::StatusArgs;

/// Tax-residency day tracker.
///
/// Records border crossings and reports, per country, how close the days of
/// presence are to that country's residency threshold.
#[derive(Debug, Parser)]
#[command(name = "stay", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Treat this date as today (YYYY-MM-DD).
    #[arg(long, global = true, value_name = "DATE")]
    pub today: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record a border crossing.
    Add(AddArgs),

    /// Change fields of an existing entry.
    Edit(EditArgs),

    /// Delete an entry.
    Remove(RemoveArgs),

    /// List recorded entries.
    Entries(ListArgs),

    /// Delete every entry.
    Clear,

    /// Show or edit country rules.
    #[command(subcommand)]
    Rules(RulesAction),

    /// Show days present and residency status per country.
    Status(StatusArgs),

    /// Show which country you were in on each day of a month.
    Calendar(CalendarArgs),

    /// List the years that have travel data.
    Years,

    /// Write all entries to stdout as a JSON array.
    Export,

    /// Replace all entries with a JSON array read from a file or stdin.
    Import(ImportArgs),
}

/// Rule subcommands.
#[derive(Debug, Subcommand)]
pub enum RulesAction {
    /// List rules.
    List(RuleListArgs),
    /// Add a custom country rule.
    Add(RuleAddArgs),
    /// Change an existing rule.
    Update(RuleUpdateArgs),
    /// Delete a custom rule.
    Remove(RuleRemoveArgs),
}
