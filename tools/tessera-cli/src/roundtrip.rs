//! Roundtrip command - build, write, read back, check sharing, instantiate
//!
//! The stream is kept in memory unless `--out` is given, in which case it is
//! written to that file and read back from disk.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail, ensure};
use clap::Args;
use tessera_shared::{PhysicsScene, ShapeKind};
use tracing::info;

use crate::settings::{instantiate_and_report, load_config};

/// Arguments for the roundtrip command
#[derive(Args)]
pub struct RoundtripArgs {
    /// Keep the written scene in this file
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Path to a config.toml (defaults to the platform config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Execute the roundtrip command
pub fn execute(args: RoundtripArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let scene = tessera_core::build_reference_scene(&config);

    let reloaded = match &args.out {
        Some(path) => {
            tessera_stream::write_file(path, &scene, config.stream.pretty)
                .with_context(|| format!("Failed to write scene to {}", path.display()))?;
            info!(path = %path.display(), "reading scene back from disk");
            tessera_stream::read_file(path)
                .with_context(|| format!("Failed to read scene from {}", path.display()))?
        }
        None => {
            let text = tessera_stream::to_string(&scene, config.stream.pretty)
                .context("Failed to write scene")?;
            tessera_stream::from_str(&text).context("Failed to read scene")?
        }
    };

    check_structure(&scene, &reloaded)?;
    check_sharing(&reloaded)?;
    println!("Round trip preserved structure and sharing");

    let optimized = reloaded.optimize_soft_bodies();
    println!("Recomputed {} soft body templates", optimized);

    instantiate_and_report(&reloaded, &config)?;
    Ok(())
}

fn check_structure(before: &PhysicsScene, after: &PhysicsScene) -> Result<()> {
    ensure!(
        before.bodies().len() == after.bodies().len()
            && before.soft_bodies().len() == after.soft_bodies().len()
            && before.constraints().len() == after.constraints().len(),
        "scene counts changed: {}/{}/{} bodies/soft bodies/constraints became {}/{}/{}",
        before.bodies().len(),
        before.soft_bodies().len(),
        before.constraints().len(),
        after.bodies().len(),
        after.soft_bodies().len(),
        after.constraints().len()
    );

    for (index, (a, b)) in before.bodies().iter().zip(after.bodies()).enumerate() {
        let same = a.shape.kind() == b.shape.kind()
            && a.position == b.position
            && a.rotation.abs_diff_eq(b.rotation, 1e-6)
            && a.motion_type == b.motion_type
            && a.layer == b.layer;
        if !same {
            bail!("body {} differs after the round trip", index);
        }
    }
    Ok(())
}

fn check_sharing(scene: &PhysicsScene) -> Result<()> {
    let find = |kind: ShapeKind| {
        scene
            .bodies()
            .iter()
            .find(|body| body.shape.kind() == kind)
            .with_context(|| format!("scene has no {:?} body", kind))
    };

    let compound = find(ShapeKind::StaticCompound)?;
    let children = compound.shape.children();
    ensure!(
        children.len() == 2 && Arc::ptr_eq(children[0], children[1]),
        "static compound no longer shares its sub-compound"
    );

    let hull = find(ShapeKind::ConvexHull)?;
    let wrapper = find(ShapeKind::RotatedTranslated)?;
    let inner = wrapper.shape.children();
    ensure!(
        inner.first().is_some_and(|shape| Arc::ptr_eq(*shape, &hull.shape)),
        "rotated/translated shape no longer shares the convex hull"
    );

    let soft = scene.soft_bodies();
    ensure!(
        soft.len() >= 2 && Arc::ptr_eq(&soft[0].settings, &soft[1].settings),
        "soft cubes no longer share their template"
    );
    Ok(())
}
