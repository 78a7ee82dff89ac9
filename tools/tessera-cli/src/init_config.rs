//! Init-config command - write a config.toml to start editing from

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use tessera_core::config;

use crate::settings::load_config;

/// Arguments for the init-config command
#[derive(Args)]
pub struct InitConfigArgs {
    /// Destination file (defaults to the platform config directory)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Write the built-in defaults instead of the currently loaded settings
    #[arg(long)]
    pub defaults: bool,
}

/// Execute the init-config command
pub fn execute(args: InitConfigArgs) -> Result<()> {
    let settings = if args.defaults {
        tessera_core::Config::default()
    } else {
        load_config(None)?
    };

    let path = match args.out {
        Some(path) => {
            config::save_to(&settings, &path)
                .with_context(|| format!("Failed to write config to {}", path.display()))?;
            path
        }
        None => {
            let Some(dir) = config::config_dir() else {
                bail!("No platform config directory; pass --out");
            };
            config::save(&settings).context("Failed to write config")?;
            dir.join("config.toml")
        }
    };

    println!("Wrote configuration to {}", path.display());
    Ok(())
}
