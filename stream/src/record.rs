//! Wire records
//!
//! A stream is one [`Document`] holding a flat, ordered list of [`Record`]s. Each
//! record carries an id, a type name and a JSON payload. Payloads refer to other
//! records with `{"ref": id}`; because the writer emits dependencies first, every
//! reference points at an earlier record.
//!
//! The payload structs below mirror the shared settings types, with every `Arc`
//! replaced by a [`Ref`]. Derived data (soft-body update groups) has no field here
//! and is therefore never persisted.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use tessera_shared::{
    Color, MeshTriangle, MotionType, ObjectLayer, ShapeKind, SoftEdge, SoftFace, SoftVertex,
    SoftVolume,
};

/// Value of [`Document::format`]
pub const FORMAT_NAME: &str = "tessera-scene";

/// Current stream version
pub const FORMAT_VERSION: u32 = 1;

/// Top-level stream document
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub format: String,
    pub version: u32,
    pub objects: Vec<Record>,
    /// Id of the scene record
    pub root: u32,
}

/// One emitted object
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Record {
    pub id: u32,
    #[serde(rename = "type")]
    pub type_name: String,
    pub data: serde_json::Value,
}

/// Back-reference to an earlier record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ref {
    #[serde(rename = "ref")]
    pub id: u32,
}

impl Ref {
    pub fn new(id: u32) -> Self {
        Self { id }
    }
}

// =============================================================================
// Record type names
// =============================================================================

pub const MATERIAL: &str = "PhysicsMaterial";
pub const SOFT_BODY_TEMPLATE: &str = "SoftBodySharedSettings";
pub const DISTANCE_CONSTRAINT: &str = "DistanceConstraint";
pub const POINT_CONSTRAINT: &str = "PointConstraint";
pub const FIXED_CONSTRAINT: &str = "FixedConstraint";
pub const SCENE: &str = "PhysicsScene";

/// Record type name of a shape kind
pub fn shape_type_name(kind: ShapeKind) -> &'static str {
    match kind {
        ShapeKind::Mesh => "MeshShape",
        ShapeKind::HeightField => "HeightFieldShape",
        ShapeKind::Box => "BoxShape",
        ShapeKind::Sphere => "SphereShape",
        ShapeKind::Capsule => "CapsuleShape",
        ShapeKind::TaperedCapsule => "TaperedCapsuleShape",
        ShapeKind::Cylinder => "CylinderShape",
        ShapeKind::TaperedCylinder => "TaperedCylinderShape",
        ShapeKind::Empty => "EmptyShape",
        ShapeKind::StaticCompound => "StaticCompoundShape",
        ShapeKind::MutableCompound => "MutableCompoundShape",
        ShapeKind::ConvexHull => "ConvexHullShape",
        ShapeKind::RotatedTranslated => "RotatedTranslatedShape",
        ShapeKind::Scaled => "ScaledShape",
        ShapeKind::Triangle => "TriangleShape",
    }
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaterialData {
    pub name: String,
    pub color: Color,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeshData {
    pub triangles: Vec<MeshTriangle>,
    pub materials: Vec<Ref>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeightFieldData {
    pub offset: Vec3,
    pub scale: Vec3,
    pub sample_count: u32,
    pub height_samples: Vec<f32>,
    pub material_indices: Vec<u8>,
    pub materials: Vec<Ref>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoxData {
    pub half_extent: Vec3,
    pub convex_radius: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Ref>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SphereData {
    pub radius: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Ref>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CapsuleData {
    pub half_height_of_cylinder: f32,
    pub radius: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Ref>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaperedCapsuleData {
    pub half_height_of_tapered_cylinder: f32,
    pub top_radius: f32,
    pub bottom_radius: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Ref>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CylinderData {
    pub half_height: f32,
    pub radius: f32,
    pub convex_radius: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Ref>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaperedCylinderData {
    pub half_height: f32,
    pub top_radius: f32,
    pub bottom_radius: f32,
    pub convex_radius: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Ref>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmptyData {
    pub center_of_mass: Vec3,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubShapeData {
    pub position: Vec3,
    pub rotation: Quat,
    pub shape: Ref,
    #[serde(default)]
    pub user_data: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompoundData {
    pub sub_shapes: Vec<SubShapeData>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConvexHullData {
    pub points: Vec<Vec3>,
    pub max_convex_radius: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Ref>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RotatedTranslatedData {
    pub position: Vec3,
    pub rotation: Quat,
    pub inner: Ref,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScaledData {
    pub scale: Vec3,
    pub inner: Ref,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TriangleData {
    pub vertices: [Vec3; 3],
    pub convex_radius: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Ref>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SoftBodyTemplateData {
    pub vertices: Vec<SoftVertex>,
    pub faces: Vec<SoftFace>,
    pub edges: Vec<SoftEdge>,
    #[serde(default)]
    pub volumes: Vec<SoftVolume>,
    #[serde(default)]
    pub materials: Vec<Ref>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BodyData {
    pub shape: Ref,
    pub position: Vec3,
    pub rotation: Quat,
    pub motion_type: MotionType,
    pub layer: ObjectLayer,
    pub friction: f32,
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub gravity_factor: f32,
    pub allow_sleeping: bool,
    #[serde(default)]
    pub user_data: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SoftBodyData {
    pub settings: Ref,
    pub position: Vec3,
    pub rotation: Quat,
    pub layer: ObjectLayer,
    pub pressure: f32,
    pub num_iterations: u32,
    pub linear_damping: f32,
    pub friction: f32,
    pub gravity_factor: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConstraintData {
    pub settings: Ref,
    pub body_a: u32,
    pub body_b: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SceneData {
    pub bodies: Vec<BodyData>,
    pub soft_bodies: Vec<SoftBodyData>,
    pub constraints: Vec<ConstraintData>,
}

/// Every reference id inside a payload, in document order
pub fn collect_refs(value: &serde_json::Value, out: &mut Vec<u32>) {
    match value {
        serde_json::Value::Object(map) => {
            if map.len() == 1 {
                if let Some(id) = map.get("ref").and_then(|v| v.as_u64()) {
                    out.push(id as u32);
                    return;
                }
            }
            for child in map.values() {
                collect_refs(child, out);
            }
        }
        serde_json::Value::Array(items) => {
            for child in items {
                collect_refs(child, out);
            }
        }
        _ => {}
    }
}
