//! Tessera Core - reference scene assembly and instantiation
//!
//! This crate builds the reference physics scene from generated terrain and
//! hand-placed shapes, and turns a (possibly reloaded) scene into live bodies.
//!
//! # Architecture
//!
//! - [`ReferenceSceneBuilder`] - Appends terrain, primitives, compounds, hulls,
//!   constraints and soft bodies with explicit color/position allocators
//! - [`ShapeBaker`] - Bakes shape settings into runtime shapes, once per shared object
//! - [`PhysicsWorld`] - Target of instantiation; [`World`] is the in-memory implementation
//! - [`create_bodies`] - Partial-success instantiation into a world
//! - [`Config`] - TOML configuration (terrain, stream, world)

pub mod builder;
pub mod config;
pub mod instantiate;
pub mod shape;
pub mod world;

pub use builder::{
    ColorAllocator, PositionAllocator, ReferenceSceneBuilder, build_reference_scene,
};
pub use config::{Config, ConfigError, StreamConfig, TerrainConfig, WorldConfig};
pub use instantiate::{InstantiationReport, SceneItem, create_bodies};
pub use shape::{Aabb, Shape, ShapeBaker, ShapeError};
pub use world::{
    Body, BodyDesc, BodyId, Constraint, ConstraintId, InstantiationError, PhysicsWorld, SoftBody,
    SoftBodyDesc, World,
};
