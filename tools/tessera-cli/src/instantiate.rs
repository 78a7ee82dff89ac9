//! Instantiate command - read a scene file and create its bodies

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::settings::{instantiate_and_report, load_config};

/// Arguments for the instantiate command
#[derive(Args)]
pub struct InstantiateArgs {
    /// Scene file to load
    pub file: PathBuf,

    /// Path to a config.toml (defaults to the platform config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Execute the instantiate command
pub fn execute(args: InstantiateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let scene = tessera_stream::read_file(&args.file)
        .with_context(|| format!("Failed to read scene from {}", args.file.display()))?;

    let world = instantiate_and_report(&scene, &config)?;
    println!("World holds {} live bodies", world.body_count());
    Ok(())
}
