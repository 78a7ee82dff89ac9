//! Inspect command - object counts and sharing of a scene file

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

/// Arguments for the inspect command
#[derive(Args)]
pub struct InspectArgs {
    /// Scene file to inspect
    pub file: PathBuf,
}

/// Execute the inspect command
pub fn execute(args: InspectArgs) -> Result<()> {
    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let stats = tessera_stream::inspect(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;

    println!("{} (format {} v{})", args.file.display(), stats.format, stats.version);
    println!("  Objects:    {}", stats.total_objects);
    println!("  References: {}", stats.references);
    println!("  Shared:     {}", stats.shared_objects);
    println!();

    let width = stats
        .objects_by_type
        .keys()
        .map(String::len)
        .max()
        .unwrap_or(0);
    for (type_name, count) in &stats.objects_by_type {
        println!("  {:<width$}  {}", type_name, count);
    }
    Ok(())
}
