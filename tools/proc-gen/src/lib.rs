//! Procedural collision geometry for Tessera scenes
//!
//! Turns a noise field into collidable terrain: a triangulated mesh with a raised
//! rim, and a sampled height field with a hole. Both come with materials banded
//! by distance from the grid origin, one distinct color per band.
//!
//! # Example
//! ```no_run
//! use proc_gen::noise_field::PerlinField;
//! use proc_gen::terrain::{TerrainParams, build_height_field, build_mesh};
//!
//! let noise = PerlinField::new(0);
//!
//! let mesh = build_mesh(&TerrainParams::mesh(), &noise);
//! println!("{} triangles, {} materials", mesh.triangles.len(), mesh.materials.len());
//!
//! let field = build_height_field(&TerrainParams::height_field(), &noise);
//! let settings = field.into_settings();
//! assert_eq!(settings.holes().len(), 1);
//! ```

pub mod noise_field;
pub mod palette;
pub mod terrain;

pub use noise_field::{NoiseField, PerlinField};
pub use palette::{ColorSequence, distinct_color};
pub use terrain::{HeightFieldData, TerrainMesh, TerrainParams, build_height_field, build_mesh};
