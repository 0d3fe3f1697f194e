use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stay_cli::commands::{calendar, entries, export, import, rules, status};
use stay_cli::{Cli, Commands, Config, RulesAction};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init so a subscriber installed by a test harness is left alone
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Add(args)) => {
            entries::add(&mut out, args, &config)?;
        }
        Some(Commands::Edit(args)) => entries::edit(&mut out, args, &config)?,
        Some(Commands::Remove(args)) => entries::remove(&mut out, args, &config)?,
        Some(Commands::Entries(args)) => entries::list(&mut out, args, &config)?,
        Some(Commands::Clear) => entries::clear(&mut out, &config)?,
        Some(Commands::Rules(action)) => match action {
            RulesAction::List(args) => rules::list(&mut out, args, &config)?,
            RulesAction::Add(args) => rules::add(&mut out, args, &config)?,
            RulesAction::Update(args) => rules::update(&mut out, args, &config)?,
            RulesAction::Remove(args) => rules::remove(&mut out, args, &config)?,
        },
        Some(Commands::Status(args)) => status::run(&mut out, args, &config, today)?,
        Some(Commands::Calendar(args)) => calendar::run(&mut out, args, &config, today)?,
        Some(Commands::Years) => calendar::years(&mut out, &config, today)?,
        Some(Commands::Export) => {
            let count = export::run(&mut out, &config)?;
            tracing::debug!(count, "exported entries");
        }
        Some(Commands::Import(args)) => {
            import::run(&mut out, args, &config)?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            writeln!(out)?;
        }
    }

    out.flush()?;
    Ok(())
}
