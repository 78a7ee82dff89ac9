//! Shape settings
//!
//! Shape settings describe a collision shape before it is baked into a runtime
//! shape. The set of shape kinds is closed: [`ShapeSettings`] has one variant per
//! kind and every consumer (baking, persistence) matches on it exhaustively.
//!
//! Decorator and compound shapes hold their children as `Arc<ShapeSettings>`. The
//! same child may be referenced from several parents; it is never copied. Because
//! settings are immutable once wrapped in an `Arc`, a shape cannot end up
//! referencing itself.

mod compound;
mod convex;
mod mesh;

use std::sync::Arc;

pub use compound::{
    CompoundShapeSettings, RotatedTranslatedShapeSettings, ScaledShapeSettings, SubShape,
};
pub use convex::{
    BoxShapeSettings, CapsuleShapeSettings, ConvexHullShapeSettings, CylinderShapeSettings,
    DEFAULT_CONVEX_RADIUS, EmptyShapeSettings, SphereShapeSettings, TaperedCapsuleShapeSettings,
    TaperedCylinderShapeSettings, TriangleShapeSettings,
};
pub use mesh::{HeightFieldShapeSettings, MeshShapeSettings, MeshTriangle, NO_COLLISION_VALUE};

use crate::material::PhysicsMaterial;

/// Discriminant of [`ShapeSettings`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    Mesh,
    HeightField,
    Box,
    Sphere,
    Capsule,
    TaperedCapsule,
    Cylinder,
    TaperedCylinder,
    Empty,
    StaticCompound,
    MutableCompound,
    ConvexHull,
    RotatedTranslated,
    Scaled,
    Triangle,
}

impl ShapeKind {
    /// All shape kinds, in declaration order
    pub const ALL: [ShapeKind; 15] = [
        ShapeKind::Mesh,
        ShapeKind::HeightField,
        ShapeKind::Box,
        ShapeKind::Sphere,
        ShapeKind::Capsule,
        ShapeKind::TaperedCapsule,
        ShapeKind::Cylinder,
        ShapeKind::TaperedCylinder,
        ShapeKind::Empty,
        ShapeKind::StaticCompound,
        ShapeKind::MutableCompound,
        ShapeKind::ConvexHull,
        ShapeKind::RotatedTranslated,
        ShapeKind::Scaled,
        ShapeKind::Triangle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Mesh => "Mesh",
            ShapeKind::HeightField => "HeightField",
            ShapeKind::Box => "Box",
            ShapeKind::Sphere => "Sphere",
            ShapeKind::Capsule => "Capsule",
            ShapeKind::TaperedCapsule => "TaperedCapsule",
            ShapeKind::Cylinder => "Cylinder",
            ShapeKind::TaperedCylinder => "TaperedCylinder",
            ShapeKind::Empty => "Empty",
            ShapeKind::StaticCompound => "StaticCompound",
            ShapeKind::MutableCompound => "MutableCompound",
            ShapeKind::ConvexHull => "ConvexHull",
            ShapeKind::RotatedTranslated => "RotatedTranslated",
            ShapeKind::Scaled => "Scaled",
            ShapeKind::Triangle => "Triangle",
        }
    }

    /// Compound kinds hold a list of sub shapes
    pub fn is_compound(self) -> bool {
        matches!(self, ShapeKind::StaticCompound | ShapeKind::MutableCompound)
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Serializable description of a collision shape.
#[derive(Clone, Debug)]
pub enum ShapeSettings {
    Mesh(MeshShapeSettings),
    HeightField(HeightFieldShapeSettings),
    Box(BoxShapeSettings),
    Sphere(SphereShapeSettings),
    Capsule(CapsuleShapeSettings),
    TaperedCapsule(TaperedCapsuleShapeSettings),
    Cylinder(CylinderShapeSettings),
    TaperedCylinder(TaperedCylinderShapeSettings),
    Empty(EmptyShapeSettings),
    StaticCompound(CompoundShapeSettings),
    MutableCompound(CompoundShapeSettings),
    ConvexHull(ConvexHullShapeSettings),
    RotatedTranslated(RotatedTranslatedShapeSettings),
    Scaled(ScaledShapeSettings),
    Triangle(TriangleShapeSettings),
}

impl ShapeSettings {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeSettings::Mesh(_) => ShapeKind::Mesh,
            ShapeSettings::HeightField(_) => ShapeKind::HeightField,
            ShapeSettings::Box(_) => ShapeKind::Box,
            ShapeSettings::Sphere(_) => ShapeKind::Sphere,
            ShapeSettings::Capsule(_) => ShapeKind::Capsule,
            ShapeSettings::TaperedCapsule(_) => ShapeKind::TaperedCapsule,
            ShapeSettings::Cylinder(_) => ShapeKind::Cylinder,
            ShapeSettings::TaperedCylinder(_) => ShapeKind::TaperedCylinder,
            ShapeSettings::Empty(_) => ShapeKind::Empty,
            ShapeSettings::StaticCompound(_) => ShapeKind::StaticCompound,
            ShapeSettings::MutableCompound(_) => ShapeKind::MutableCompound,
            ShapeSettings::ConvexHull(_) => ShapeKind::ConvexHull,
            ShapeSettings::RotatedTranslated(_) => ShapeKind::RotatedTranslated,
            ShapeSettings::Scaled(_) => ShapeKind::Scaled,
            ShapeSettings::Triangle(_) => ShapeKind::Triangle,
        }
    }

    /// Wrap into an `Arc` so the settings can be shared
    pub fn shared(self) -> Arc<ShapeSettings> {
        Arc::new(self)
    }

    /// Direct child shapes, in declaration order
    pub fn children(&self) -> Vec<&Arc<ShapeSettings>> {
        match self {
            ShapeSettings::StaticCompound(compound) | ShapeSettings::MutableCompound(compound) => {
                compound.sub_shapes.iter().map(|sub| &sub.shape).collect()
            }
            ShapeSettings::RotatedTranslated(decorated) => vec![&decorated.inner],
            ShapeSettings::Scaled(decorated) => vec![&decorated.inner],
            _ => Vec::new(),
        }
    }

    /// Materials referenced directly by this shape (not by its children)
    pub fn materials(&self) -> Vec<&Arc<PhysicsMaterial>> {
        match self {
            ShapeSettings::Mesh(mesh) => mesh.materials.iter().collect(),
            ShapeSettings::HeightField(height_field) => height_field.materials.iter().collect(),
            ShapeSettings::Box(s) => s.material.iter().collect(),
            ShapeSettings::Sphere(s) => s.material.iter().collect(),
            ShapeSettings::Capsule(s) => s.material.iter().collect(),
            ShapeSettings::TaperedCapsule(s) => s.material.iter().collect(),
            ShapeSettings::Cylinder(s) => s.material.iter().collect(),
            ShapeSettings::TaperedCylinder(s) => s.material.iter().collect(),
            ShapeSettings::ConvexHull(s) => s.material.iter().collect(),
            ShapeSettings::Triangle(s) => s.material.iter().collect(),
            ShapeSettings::Empty(_)
            | ShapeSettings::StaticCompound(_)
            | ShapeSettings::MutableCompound(_)
            | ShapeSettings::RotatedTranslated(_)
            | ShapeSettings::Scaled(_) => Vec::new(),
        }
    }
}

macro_rules! impl_from_settings {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ShapeSettings {
                fn from(settings: $ty) -> Self {
                    ShapeSettings::$variant(settings)
                }
            }
        )*
    };
}

impl_from_settings! {
    Mesh => MeshShapeSettings,
    HeightField => HeightFieldShapeSettings,
    Box => BoxShapeSettings,
    Sphere => SphereShapeSettings,
    Capsule => CapsuleShapeSettings,
    TaperedCapsule => TaperedCapsuleShapeSettings,
    Cylinder => CylinderShapeSettings,
    TaperedCylinder => TaperedCylinderShapeSettings,
    Empty => EmptyShapeSettings,
    ConvexHull => ConvexHullShapeSettings,
    RotatedTranslated => RotatedTranslatedShapeSettings,
    Scaled => ScaledShapeSettings,
    Triangle => TriangleShapeSettings,
}
