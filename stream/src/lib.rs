//! Persistence for Tessera physics scenes.
//!
//! A scene is written as one JSON document: a flat list of type-tagged records in
//! dependency order, followed by the scene record. Shared settings objects
//! (shapes, materials, soft-body templates, constraint settings) are emitted once
//! and referenced by id everywhere else, and reading restores that sharing.
//!
//! Soft-body update groups are not part of the stream. Call
//! [`PhysicsScene::optimize_soft_bodies`] after reading.
//!
//! # Example
//! ```no_run
//! use tessera_shared::PhysicsScene;
//!
//! let scene = PhysicsScene::new();
//! let text = tessera_stream::to_string(&scene, true).unwrap();
//! let reloaded = tessera_stream::from_str(&text).unwrap();
//! assert_eq!(reloaded.bodies().len(), 0);
//! ```

pub mod error;
pub mod reader;
pub mod record;
pub mod stats;
pub mod writer;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tessera_shared::PhysicsScene;
use tracing::info;

pub use error::StreamError;
pub use reader::ObjectStreamIn;
pub use record::{Document, FORMAT_NAME, FORMAT_VERSION, Record, Ref};
pub use stats::StreamStats;
pub use writer::ObjectStreamOut;

/// Encode a scene into a document
pub fn encode(scene: &PhysicsScene) -> Result<Document, StreamError> {
    ObjectStreamOut::new().write_scene(scene)
}

/// Write a scene as JSON
pub fn write_scene<W: Write>(
    mut writer: W,
    scene: &PhysicsScene,
    pretty: bool,
) -> Result<(), StreamError> {
    let document = encode(scene)?;
    if pretty {
        serde_json::to_writer_pretty(&mut writer, &document)?;
    } else {
        serde_json::to_writer(&mut writer, &document)?;
    }
    writer.flush()?;

    log_written(&document, scene);
    Ok(())
}

fn log_written(document: &Document, scene: &PhysicsScene) {
    info!(
        objects = document.objects.len(),
        bodies = scene.bodies().len(),
        soft_bodies = scene.soft_bodies().len(),
        constraints = scene.constraints().len(),
        "scene written"
    );
}

/// Read a scene written by [`write_scene`]
pub fn read_scene<R: Read>(reader: R) -> Result<PhysicsScene, StreamError> {
    let document: Document = serde_json::from_reader(reader)?;
    let objects = document.objects.len();
    let scene = ObjectStreamIn::read_document(document)?;

    info!(
        objects,
        bodies = scene.bodies().len(),
        soft_bodies = scene.soft_bodies().len(),
        constraints = scene.constraints().len(),
        "scene read"
    );
    Ok(scene)
}

/// Write a scene as a JSON string
pub fn to_string(scene: &PhysicsScene, pretty: bool) -> Result<String, StreamError> {
    let document = encode(scene)?;
    let text = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };

    log_written(&document, scene);
    Ok(text)
}

pub fn from_str(text: &str) -> Result<PhysicsScene, StreamError> {
    read_scene(text.as_bytes())
}

pub fn write_file(
    path: impl AsRef<Path>,
    scene: &PhysicsScene,
    pretty: bool,
) -> Result<(), StreamError> {
    let file = File::create(path.as_ref())?;
    write_scene(BufWriter::new(file), scene, pretty)
}

pub fn read_file(path: impl AsRef<Path>) -> Result<PhysicsScene, StreamError> {
    let file = File::open(path.as_ref())?;
    read_scene(BufReader::new(file))
}

/// Count the objects in a stream without decoding them
pub fn inspect<R: Read>(reader: R) -> Result<StreamStats, StreamError> {
    let document: Document = serde_json::from_reader(reader)?;
    Ok(StreamStats::from_document(&document))
}
