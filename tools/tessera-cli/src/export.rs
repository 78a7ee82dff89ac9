//! Export command - build the reference scene and write it to a file

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::settings::load_config;

/// Arguments for the export command
#[derive(Args)]
pub struct ExportArgs {
    /// Output scene file
    #[arg(short, long)]
    pub out: PathBuf,

    /// Path to a config.toml (defaults to the platform config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write compact JSON regardless of the configured setting
    #[arg(long)]
    pub compact: bool,
}

/// Execute the export command
pub fn execute(args: ExportArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let scene = tessera_core::build_reference_scene(&config);

    let pretty = config.stream.pretty && !args.compact;
    tessera_stream::write_file(&args.out, &scene, pretty)
        .with_context(|| format!("Failed to write scene to {}", args.out.display()))?;

    println!(
        "Wrote {} bodies, {} soft bodies, {} constraints to {}",
        scene.bodies().len(),
        scene.soft_bodies().len(),
        scene.constraints().len(),
        args.out.display()
    );
    Ok(())
}
