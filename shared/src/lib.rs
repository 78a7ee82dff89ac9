//! Scene description types for Tessera.
//!
//! A [`PhysicsScene`] is the serializable description of a physics world prior to
//! instantiation: rigid bodies, soft bodies and the constraints between them.
//! Shapes, materials, soft-body templates and constraint settings are held behind
//! `Arc`, so a single settings object can be referenced from several places. That
//! sharing is part of the scene's structure and is preserved by the persistence
//! layer (`tessera-stream`).
//!
//! # Modules
//!
//! - [`color`] - RGBA8 colors for debug rendering of materials
//! - [`material`] - Physics materials referenced by shapes
//! - [`layers`] - Object layers and motion types
//! - [`shape`] - The closed set of shape settings
//! - [`body`] - Rigid body creation settings
//! - [`soft_body`] - Soft-body templates and creation settings
//! - [`constraint`] - Constraint settings
//! - [`scene`] - The scene aggregate and its invariants

pub mod body;
pub mod color;
pub mod constraint;
pub mod layers;
pub mod material;
pub mod scene;
pub mod shape;
pub mod soft_body;

pub use body::BodySettings;
pub use color::Color;
pub use constraint::{
    ConstraintSettings, ConstraintSpace, DistanceConstraintSettings, FixedConstraintSettings,
    PointConstraintSettings,
};
pub use layers::{MotionType, ObjectLayer};
pub use material::PhysicsMaterial;
pub use scene::{ConstraintEntry, PhysicsScene, SceneError};
pub use shape::{
    BoxShapeSettings, CapsuleShapeSettings, CompoundShapeSettings, ConvexHullShapeSettings,
    CylinderShapeSettings, DEFAULT_CONVEX_RADIUS, EmptyShapeSettings, HeightFieldShapeSettings,
    MeshShapeSettings, MeshTriangle, NO_COLLISION_VALUE, RotatedTranslatedShapeSettings,
    ScaledShapeSettings, ShapeKind, ShapeSettings, SphereShapeSettings, SubShape,
    TaperedCapsuleShapeSettings, TaperedCylinderShapeSettings, TriangleShapeSettings,
};
pub use soft_body::{
    SoftBodySettings, SoftBodySharedSettings, SoftEdge, SoftFace, SoftVertex, SoftVolume,
    UpdateGroups,
};

/// Returns a stable identity key for a shared object.
///
/// Two `Arc`s yield the same key exactly when they point at the same allocation.
/// Structurally equal but separately allocated objects get different keys.
///
/// Keys are only distinct while both objects are alive: once an allocation is
/// freed its address, and so its key, can be reused. Maps keyed on this value
/// must keep the `Arc` alive alongside the key.
#[inline]
pub fn identity_key<T>(object: &std::sync::Arc<T>) -> usize {
    std::sync::Arc::as_ptr(object) as *const () as usize
}
