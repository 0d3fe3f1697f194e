//! CLI subcommand implementations.

pub mod calendar;
pub mod entries;
pub mod export;
pub mod import;
pub mod rules;
pub mod status;
pub mod util;
