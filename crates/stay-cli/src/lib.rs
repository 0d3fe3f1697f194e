//! Stay tracker CLI library.
//!
//! This crate provides the command-line interface over the residency engine
//! and the local entry/rule store.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, RulesAction};
pub use config::Config;
