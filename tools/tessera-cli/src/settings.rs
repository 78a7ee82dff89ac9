//! Shared command helpers: configuration loading and report printing

use std::path::Path;

use anyhow::{Result, bail};
use tessera_core::{Config, InstantiationReport, World};
use tessera_shared::PhysicsScene;

/// Load the configuration from `path`, or from the platform config directory.
///
/// An explicit path must exist and parse; the platform file falls back to
/// defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(tessera_core::config::load_from(path)?),
        None => Ok(tessera_core::config::load()),
    }
}

/// Create every body of `scene` in a fresh world and print the outcome.
///
/// Fails after printing when any item could not be created.
pub fn instantiate_and_report(scene: &PhysicsScene, config: &Config) -> Result<World> {
    let mut world = World::new(config.world.clone());
    let report = tessera_core::create_bodies(scene, &mut world);
    print_report(&report);

    if !report.is_complete() {
        bail!(
            "{} of {} scene items could not be instantiated",
            report.errors.len(),
            scene.bodies().len() + scene.soft_bodies().len() + scene.constraints().len()
        );
    }
    Ok(world)
}

fn print_report(report: &InstantiationReport) {
    println!("Instantiated:");
    println!(
        "  Bodies:      {}/{}",
        report.created_bodies(),
        report.bodies.len()
    );
    println!(
        "  Soft bodies: {}/{}",
        report.created_soft_bodies(),
        report.soft_bodies.len()
    );
    println!(
        "  Constraints: {}/{}",
        report.created_constraints(),
        report.constraints.len()
    );
    println!("  Templates optimized: {}", report.optimized_templates);

    for (item, error) in &report.errors {
        println!("  {:?}: {}", item, error);
    }
}
