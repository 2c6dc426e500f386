//! Config Commands

use anyhow::{bail, Result};
use clap::Subcommand;
use std::path::Path;
use tracing::info;

use gatecheck_common::GatecheckConfig;

use crate::output::print_success;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,

    /// Write the default configuration to the config path
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn execute(cmd: ConfigCommands, path: &Path, settings: &GatecheckConfig) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            if !path.exists() {
                info!("{} not found, showing defaults", path.display());
            }
            print!("{}", settings.to_toml()?);
        }

        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            GatecheckConfig::default().save(path)?;
            print_success(&format!("Wrote {}", path.display()));
        }
    }
    Ok(())
}
