//! Tessera CLI - Build, persist and instantiate physics scenes
//!
//! # Commands
//!
//! - `tessera roundtrip` - Build the reference scene, write it, read it back and instantiate it
//! - `tessera export` - Build the reference scene and write it to a file
//! - `tessera inspect` - Show object counts and sharing of a scene file
//! - `tessera instantiate` - Read a scene file and create its bodies in a fresh world
//! - `tessera init-config` - Write a config.toml to the platform config directory
//!
//! # Usage
//!
//! ```bash
//! # Full pipeline in memory, keeping the stream on disk
//! tessera roundtrip --out scene.json
//!
//! # Write, look inside, load
//! tessera export --out scene.json
//! tessera inspect scene.json
//! tessera instantiate scene.json
//!
//! # Start from the defaults, then edit
//! tessera init-config --defaults
//! ```
//!
//! Every command accepts `--config` to read settings from an explicit TOML file
//! instead of the platform config directory. Log verbosity follows `RUST_LOG`.

mod export;
mod init_config;
mod inspect;
mod instantiate;
mod roundtrip;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Tessera CLI - Build, persist and instantiate physics scenes
#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Build, persist and instantiate Tessera physics scenes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the reference scene, write it, read it back and instantiate it
    Roundtrip(roundtrip::RoundtripArgs),

    /// Build the reference scene and write it to a file
    Export(export::ExportArgs),

    /// Show object counts and sharing of a scene file
    Inspect(inspect::InspectArgs),

    /// Read a scene file and create its bodies in a fresh world
    Instantiate(instantiate::InstantiateArgs),

    /// Write a config.toml to start editing from
    InitConfig(init_config::InitConfigArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Roundtrip(args) => roundtrip::execute(args),
        Commands::Export(args) => export::execute(args),
        Commands::Inspect(args) => inspect::execute(args),
        Commands::Instantiate(args) => instantiate::execute(args),
        Commands::InitConfig(args) => init_config::execute(args),
    }
}
