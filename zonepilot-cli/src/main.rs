//! Zonepilot CLI
//!
//! Replays recorded settings-app sessions against the automation engine and
//! inspects the built-in tables.
//!
//! Usage from workspace root:
//!   cargo run --bin zonepilot -- replay session.json     # Replay a recorded session
//!   cargo run --bin zonepilot -- zones                   # List built-in time zones
//!   cargo run --bin zonepilot -- zones --at 2026-01-15T00:00:00Z
//!   cargo run --bin zonepilot -- offset -- -3.5          # Format an hour offset
//!   cargo run --bin zonepilot -- find tree.json "text:time zone"
//!   cargo run --bin zonepilot -- config                  # Print the effective config

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zonepilot::platforms::synthetic::SyntheticEngine;
use zonepilot::replay::{self, ReplayScript};
use zonepilot::{format_offset, AutomationConfig, SerializableNode, TimeZoneOption};

mod report;

#[derive(Parser)]
#[command(name = "zonepilot")]
#[command(about = "Time zone automation through the settings app's accessibility tree")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[clap(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser, Debug)]
struct ReplayArgs {
    /// Replay script (JSON or YAML)
    script: PathBuf,

    /// Print the report as JSON
    #[clap(long)]
    json: bool,

    /// Exit with an error unless the search query was entered
    #[clap(long)]
    strict: bool,
}

#[derive(Parser, Debug)]
struct FindArgs {
    /// Tree snapshot (JSON)
    tree: PathBuf,

    /// Selector, e.g. "text:time zone" or "class:android.widget.Switch && checkable"
    selector: String,

    /// Resolve the first match to its nearest clickable ancestor
    #[clap(long)]
    clickable: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded session against the synthetic engine
    Replay(ReplayArgs),
    /// List the built-in time zones, sorted by offset
    Zones {
        #[clap(long)]
        json: bool,

        /// RFC 3339 instant to compute offsets at (defaults to now)
        #[clap(long)]
        at: Option<String>,
    },
    /// Format an hour offset the way notices show it
    Offset {
        #[clap(allow_hyphen_values = true)]
        hours: f64,
    },
    /// Evaluate a selector against a tree snapshot
    Find(FindArgs),
    /// Print the effective configuration
    Config {
        /// Configuration file to validate and print instead of the defaults
        #[clap(long, env = "ZONEPILOT_CONFIG")]
        file: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    let default_filter = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Replay(args) => run_replay(args).await,
        Commands::Zones { json, at } => {
            let options = match at {
                Some(at) => {
                    let instant = DateTime::parse_from_rfc3339(&at)
                        .with_context(|| format!("Invalid instant {at}"))?;
                    TimeZoneOption::default_list_at(instant.with_timezone(&Utc))
                }
                None => TimeZoneOption::default_list(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&options)?);
            } else {
                report::display_zones(&options);
            }
            Ok(())
        }
        Commands::Offset { hours } => {
            if !hours.is_finite() {
                bail!("offset must be a finite number of hours");
            }
            println!("{}", format_offset(hours));
            Ok(())
        }
        Commands::Find(args) => run_find(args),
        Commands::Config { file } => {
            let config = match file {
                Some(path) => AutomationConfig::from_file(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => AutomationConfig::default(),
            };
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

fn load_script(path: &Path) -> Result<ReplayScript> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read replay script {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let script = if is_yaml {
        serde_yaml::from_str(&content).context("Invalid YAML replay script")?
    } else {
        ReplayScript::from_json_str(&content).context("Invalid JSON replay script")?
    };
    Ok(script)
}

async fn run_replay(args: ReplayArgs) -> Result<()> {
    let script = load_script(&args.script)?;
    info!(script = %args.script.display(), events = script.events.len(), "Replaying session");

    let report = replay::run(&script).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report::display_replay(&report);
    }

    if args.strict && !report.completed() {
        match report.failure() {
            Some(e) => bail!("replay of {} failed: {}", report.zone_id, e),
            None => bail!("replay of {} did not reach the search field", report.zone_id),
        }
    }
    Ok(())
}

fn run_find(args: FindArgs) -> Result<()> {
    let content = fs::read_to_string(&args.tree)
        .with_context(|| format!("Failed to read tree {}", args.tree.display()))?;
    let data = SerializableNode::from_json(&content).context("Invalid tree snapshot")?;

    let engine = SyntheticEngine::new();
    let root = engine.tree(&data);
    let locator = root.locator(args.selector.as_str());
    if !locator.selector().is_valid() {
        bail!("invalid selector: {}", locator.selector());
    }
    debug!(selector = %locator.selector(), "Searching tree");

    let matches = if args.clickable {
        vec![locator.clickable()?]
    } else {
        locator.all()
    };
    if matches.is_empty() {
        println!("No node matches {}", locator.selector());
    }
    for node in matches {
        println!("{}", serde_json::to_string(&node.attributes())?);
    }
    Ok(())
}
