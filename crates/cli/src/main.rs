//! Gatecheck CLI - Main Entry Point
//!
//! Inspects rule tables, computes expectations from captured backend
//! responses and lists YAML scenarios, all without a browser.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use gatecheck_cli::commands::{classify, config, expect, rules, scenarios};
use gatecheck_cli::output;
use gatecheck_common::GatecheckConfig;

/// Gatecheck - UI entitlement verification
#[derive(Parser)]
#[command(name = "gatecheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(
        short,
        long,
        default_value = "gatecheck.toml",
        env = "GATECHECK_CONFIG",
        global = true
    )]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify entity identifiers as organization, workspace or unknown
    Classify(classify::ClassifyArgs),

    /// List the visibility rule table
    Rules(rules::RulesArgs),

    /// Compute expectations from captured backend responses
    Expect(expect::ExpectArgs),

    /// List YAML scenarios
    Scenarios(scenarios::ScenariosArgs),

    /// Show or create the configuration file
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = GatecheckConfig::load(&cli.config)?;

    match cli.command {
        Commands::Classify(args) => classify::execute(args, cli.format)?,
        Commands::Rules(args) => rules::execute(args, &settings, cli.format)?,
        Commands::Expect(args) => expect::execute(args, &settings, cli.format)?,
        Commands::Scenarios(args) => scenarios::execute(args, cli.format)?,
        Commands::Config(cmd) => config::execute(cmd, &cli.config, &settings)?,
        Commands::Version => {
            println!("Gatecheck CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Common library v{}", gatecheck_common::VERSION);
        }
    }

    Ok(())
}
