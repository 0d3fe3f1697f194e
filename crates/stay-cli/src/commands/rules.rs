//! Rule commands for listing and editing country residency rules.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use stay_core::{CountryCode, CountryRule, RuleUpdate, WindowPolicy};

use crate::Config;
use crate::commands::util::{open_database, parse_country, validate_rule_code};

#[derive(Debug, Args)]
pub struct RuleListArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RuleAddArgs {
    /// Country code, 2-3 letters (e.g., FR).
    #[arg(long, value_parser = parse_country)]
    pub code: CountryCode,
    /// Display name.
    #[arg(long)]
    pub name: String,
    /// Day threshold.
    #[arg(long, default_value_t = 183)]
    pub threshold: i64,
    /// Observation window: calendar-year or rolling-12-month.
    #[arg(long, default_value = "calendar-year")]
    pub window: WindowPolicy,
    /// Description; defaults to a generated one.
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Debug, Args)]
pub struct RuleUpdateArgs {
    /// Country code of the rule to change.
    #[arg(value_parser = parse_country)]
    pub code: CountryCode,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    pub threshold: Option<i64>,
    #[arg(long)]
    pub window: Option<WindowPolicy>,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Debug, Args)]
pub struct RuleRemoveArgs {
    /// Country code of the custom rule to delete.
    #[arg(value_parser = parse_country)]
    pub code: CountryCode,
}

pub fn list<W: Write>(writer: &mut W, args: &RuleListArgs, config: &Config) -> Result<()> {
    let rules = open_database(config)?.load_rules()?;

    if args.json {
        let rules: Vec<&CountryRule> = rules.iter().collect();
        writeln!(writer, "{}", serde_json::to_string_pretty(&rules)?)?;
        return Ok(());
    }

    for rule in &rules {
        let custom = if rule.is_custom { "(custom)" } else { "" };
        let line = format!(
            "{:<4} {:<16} {:>4} days  {:<13}  {custom}",
            rule.code.as_str(),
            rule.name,
            rule.threshold,
            rule.window.label()
        );
        writeln!(writer, "{}", line.trim_end())?;
        if !rule.description.is_empty() {
            writeln!(writer, "     {}", rule.description)?;
        }
    }
    Ok(())
}

pub fn add<W: Write>(writer: &mut W, args: &RuleAddArgs, config: &Config) -> Result<()> {
    validate_rule_code(&args.code)?;
    let name = args.name.trim();
    if name.is_empty() {
        anyhow::bail!("country name cannot be empty");
    }

    let mut rule = CountryRule::custom(args.code.clone(), name, args.threshold, args.window);
    if let Some(description) = &args.description {
        rule.description.clone_from(description);
    }

    let mut db = open_database(config)?;
    let rules = db.load_rules()?.with_added(rule)?;
    db.save_rules(&rules)?;

    writeln!(
        writer,
        "Added rule {}: {name}, {} days, {}",
        args.code,
        args.threshold,
        args.window.label()
    )?;
    Ok(())
}

pub fn update<W: Write>(writer: &mut W, args: &RuleUpdateArgs, config: &Config) -> Result<()> {
    let update = RuleUpdate {
        name: args.name.clone(),
        threshold: args.threshold,
        window: args.window,
        description: args.description.clone(),
    };
    if update == RuleUpdate::default() {
        anyhow::bail!("nothing to update: pass --name, --threshold, --window or --description");
    }

    let mut db = open_database(config)?;
    let rules = db.load_rules()?.with_updated(&args.code, update)?;
    db.save_rules(&rules)?;

    if let Some(rule) = rules.get(&args.code) {
        writeln!(
            writer,
            "Updated rule {}: {}, {} days, {}",
            rule.code,
            rule.name,
            rule.threshold,
            rule.window.label()
        )?;
    }
    Ok(())
}

pub fn remove<W: Write>(writer: &mut W, args: &RuleRemoveArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let rules = db.load_rules()?.without(&args.code)?;
    db.save_rules(&rules)?;
    writeln!(writer, "Removed rule {}", args.code)?;
    Ok(())
}
