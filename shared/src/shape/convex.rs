//! Convex primitive shape settings

use std::sync::Arc;

use glam::Vec3;

use crate::material::PhysicsMaterial;

/// Convex radius used when a shape does not specify one
pub const DEFAULT_CONVEX_RADIUS: f32 = 0.05;

/// Axis-aligned box, centered on the origin
#[derive(Clone, Debug)]
pub struct BoxShapeSettings {
    pub half_extent: Vec3,
    pub convex_radius: f32,
    pub material: Option<Arc<PhysicsMaterial>>,
}

impl BoxShapeSettings {
    pub fn new(
        half_extent: Vec3,
        convex_radius: f32,
        material: Option<Arc<PhysicsMaterial>>,
    ) -> Self {
        Self {
            half_extent,
            convex_radius,
            material,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SphereShapeSettings {
    pub radius: f32,
    pub material: Option<Arc<PhysicsMaterial>>,
}

impl SphereShapeSettings {
    pub fn new(radius: f32, material: Option<Arc<PhysicsMaterial>>) -> Self {
        Self { radius, material }
    }
}

/// Capsule along the Y axis
#[derive(Clone, Debug)]
pub struct CapsuleShapeSettings {
    pub half_height_of_cylinder: f32,
    pub radius: f32,
    pub material: Option<Arc<PhysicsMaterial>>,
}

impl CapsuleShapeSettings {
    pub fn new(
        half_height_of_cylinder: f32,
        radius: f32,
        material: Option<Arc<PhysicsMaterial>>,
    ) -> Self {
        Self {
            half_height_of_cylinder,
            radius,
            material,
        }
    }
}

/// Capsule along the Y axis with different radii for the top and bottom sphere
#[derive(Clone, Debug)]
pub struct TaperedCapsuleShapeSettings {
    pub half_height_of_tapered_cylinder: f32,
    pub top_radius: f32,
    pub bottom_radius: f32,
    pub material: Option<Arc<PhysicsMaterial>>,
}

impl TaperedCapsuleShapeSettings {
    pub fn new(
        half_height_of_tapered_cylinder: f32,
        top_radius: f32,
        bottom_radius: f32,
        material: Option<Arc<PhysicsMaterial>>,
    ) -> Self {
        Self {
            half_height_of_tapered_cylinder,
            top_radius,
            bottom_radius,
            material,
        }
    }
}

/// Cylinder along the Y axis
#[derive(Clone, Debug)]
pub struct CylinderShapeSettings {
    pub half_height: f32,
    pub radius: f32,
    pub convex_radius: f32,
    pub material: Option<Arc<PhysicsMaterial>>,
}

impl CylinderShapeSettings {
    pub fn new(
        half_height: f32,
        radius: f32,
        convex_radius: f32,
        material: Option<Arc<PhysicsMaterial>>,
    ) -> Self {
        Self {
            half_height,
            radius,
            convex_radius,
            material,
        }
    }
}

/// Cylinder along the Y axis with different top and bottom radii.
///
/// A zero top (or bottom) radius with a zero convex radius gives a cone.
#[derive(Clone, Debug)]
pub struct TaperedCylinderShapeSettings {
    pub half_height: f32,
    pub top_radius: f32,
    pub bottom_radius: f32,
    pub convex_radius: f32,
    pub material: Option<Arc<PhysicsMaterial>>,
}

impl TaperedCylinderShapeSettings {
    pub fn new(
        half_height: f32,
        top_radius: f32,
        bottom_radius: f32,
        convex_radius: f32,
        material: Option<Arc<PhysicsMaterial>>,
    ) -> Self {
        Self {
            half_height,
            top_radius,
            bottom_radius,
            convex_radius,
            material,
        }
    }

    /// Build a cone of the given half height and base radius
    pub fn cone(half_height: f32, radius: f32, material: Option<Arc<PhysicsMaterial>>) -> Self {
        Self::new(half_height, radius, 0.0, 0.0, material)
    }
}

/// Shape without any collision volume
#[derive(Clone, Debug, Default)]
pub struct EmptyShapeSettings {
    pub center_of_mass: Vec3,
}

/// Convex hull of a point cloud
#[derive(Clone, Debug)]
pub struct ConvexHullShapeSettings {
    pub points: Vec<Vec3>,
    pub max_convex_radius: f32,
    pub material: Option<Arc<PhysicsMaterial>>,
}

impl ConvexHullShapeSettings {
    pub fn new(
        points: Vec<Vec3>,
        max_convex_radius: f32,
        material: Option<Arc<PhysicsMaterial>>,
    ) -> Self {
        Self {
            points,
            max_convex_radius,
            material,
        }
    }
}

/// Single triangle, optionally inflated by a convex radius
#[derive(Clone, Debug)]
pub struct TriangleShapeSettings {
    pub vertices: [Vec3; 3],
    pub convex_radius: f32,
    pub material: Option<Arc<PhysicsMaterial>>,
}

impl TriangleShapeSettings {
    pub fn new(
        v1: Vec3,
        v2: Vec3,
        v3: Vec3,
        convex_radius: f32,
        material: Option<Arc<PhysicsMaterial>>,
    ) -> Self {
        Self {
            vertices: [v1, v2, v3],
            convex_radius,
            material,
        }
    }
}
