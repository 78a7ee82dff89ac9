//! Shape baking
//!
//! [`ShapeBaker`] turns [`ShapeSettings`] into runtime [`Shape`]s: validated,
//! with local bounds and the flags the world needs to decide which motion types
//! a shape supports. Baking is memoized per settings allocation, so settings
//! shared between bodies (or between compound children) bake into one shared
//! `Arc<Shape>`.

use std::sync::Arc;

use glam::{Quat, Vec3};
use hashbrown::HashMap;
use tessera_shared::{
    CompoundShapeSettings, HeightFieldShapeSettings, MeshShapeSettings, NO_COLLISION_VALUE,
    ShapeKind, ShapeSettings, identity_key,
};
use thiserror::Error;
use tracing::debug;

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box spanning `-half_extent..half_extent`
    pub fn centered(half_extent: Vec3) -> Self {
        Self::new(-half_extent, half_extent)
    }

    pub fn point(p: Vec3) -> Self {
        Self::new(p, p)
    }

    /// Smallest box containing all points, `None` when there are none
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        points.into_iter().fold(None, |bounds: Option<Aabb>, p| {
            Some(match bounds {
                Some(b) => Aabb::new(b.min.min(p), b.max.max(p)),
                None => Aabb::point(p),
            })
        })
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounds of this box after rotating, then translating it
    pub fn transformed(&self, rotation: Quat, translation: Vec3) -> Aabb {
        let corners = self.corners().map(|c| rotation * c + translation);
        // Eight corners, never empty
        Aabb::from_points(corners).unwrap_or(*self)
    }

    /// Bounds after a per-axis scale; negative components mirror the box
    pub fn scaled(&self, scale: Vec3) -> Aabb {
        let a = self.min * scale;
        let b = self.max * scale;
        Aabb::new(a.min(b), a.max(b))
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// Runtime shape produced by [`ShapeBaker::bake`]
#[derive(Clone, Debug)]
pub struct Shape {
    pub kind: ShapeKind,
    /// Bounds in the shape's local space
    pub bounds: Aabb,
    /// Whether the shape has volume, and can therefore carry mass
    pub has_mass: bool,
    /// Mesh-like shapes that can only be used by static bodies
    pub static_only: bool,
    /// Baked children (compound sub shapes, decorated inner shape)
    pub children: Vec<Arc<Shape>>,
}

impl Shape {
    /// Whether a dynamic body may use this shape
    pub fn supports_dynamic(&self) -> bool {
        self.has_mass && !self.static_only
    }

    fn leaf(kind: ShapeKind, bounds: Aabb) -> Self {
        Self {
            kind,
            bounds,
            has_mass: true,
            static_only: false,
            children: Vec::new(),
        }
    }
}

/// Errors raised while baking shape settings
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("{kind} shape: {what} must be positive, got {value}")]
    NonPositive {
        kind: ShapeKind,
        what: &'static str,
        value: f32,
    },

    #[error("{kind} shape: convex radius {radius} must be within [0, {limit}]")]
    ConvexRadius {
        kind: ShapeKind,
        radius: f32,
        limit: f32,
    },

    #[error("{kind} shape contains a non-finite value")]
    NonFinite { kind: ShapeKind },

    #[error("convex hull needs at least 4 points, got {0}")]
    TooFewHullPoints(usize),

    #[error("triangle is degenerate (zero area)")]
    DegenerateTriangle,

    #[error("mesh shape has no triangles")]
    EmptyMesh,

    #[error("height field with {sample_count}² samples has {actual} height samples")]
    HeightFieldSize { sample_count: u32, actual: usize },

    #[error("height field has no collidable samples")]
    HeightFieldEmpty,

    #[error("static compound shape has no sub shapes")]
    EmptyCompound,

    #[error("scaled shape has a zero scale component: {0}")]
    ZeroScale(Vec3),
}

/// Bakes shape settings, memoizing results per settings allocation
#[derive(Default)]
pub struct ShapeBaker {
    /// Keeps the settings alive so their identity keys cannot be reused
    cache: HashMap<usize, (Arc<ShapeSettings>, Arc<Shape>)>,
}

impl ShapeBaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bake settings into a runtime shape.
    ///
    /// Baking the same `Arc` twice returns the same `Arc<Shape>`.
    pub fn bake(&mut self, settings: &Arc<ShapeSettings>) -> Result<Arc<Shape>, ShapeError> {
        let key = identity_key(settings);
        if let Some((_, shape)) = self.cache.get(&key) {
            return Ok(shape.clone());
        }

        let shape = Arc::new(self.bake_uncached(settings)?);
        debug!(kind = %shape.kind, "shape baked");
        self.cache.insert(key, (settings.clone(), shape.clone()));
        Ok(shape)
    }

    /// Number of distinct settings baked so far
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn bake_uncached(&mut self, settings: &ShapeSettings) -> Result<Shape, ShapeError> {
        let kind = settings.kind();
        match settings {
            ShapeSettings::Mesh(mesh) => bake_mesh(mesh),
            ShapeSettings::HeightField(field) => bake_height_field(field),
            ShapeSettings::Box(s) => {
                finite(kind, [s.half_extent.x, s.half_extent.y, s.half_extent.z, s.convex_radius])?;
                let smallest = s.half_extent.min_element();
                positive(kind, "half extent", smallest)?;
                convex_radius(kind, s.convex_radius, smallest)?;
                Ok(Shape::leaf(kind, Aabb::centered(s.half_extent)))
            }
            ShapeSettings::Sphere(s) => {
                finite(kind, [s.radius])?;
                positive(kind, "radius", s.radius)?;
                Ok(Shape::leaf(kind, Aabb::centered(Vec3::splat(s.radius))))
            }
            ShapeSettings::Capsule(s) => {
                finite(kind, [s.half_height_of_cylinder, s.radius])?;
                positive(kind, "half height", s.half_height_of_cylinder)?;
                positive(kind, "radius", s.radius)?;
                let half = Vec3::new(s.radius, s.half_height_of_cylinder + s.radius, s.radius);
                Ok(Shape::leaf(kind, Aabb::centered(half)))
            }
            ShapeSettings::TaperedCapsule(s) => {
                finite(kind, [s.half_height_of_tapered_cylinder, s.top_radius, s.bottom_radius])?;
                positive(kind, "half height", s.half_height_of_tapered_cylinder)?;
                positive(kind, "top radius", s.top_radius)?;
                positive(kind, "bottom radius", s.bottom_radius)?;
                let r = s.top_radius.max(s.bottom_radius);
                let h = s.half_height_of_tapered_cylinder;
                Ok(Shape::leaf(
                    kind,
                    Aabb::new(
                        Vec3::new(-r, -h - s.bottom_radius, -r),
                        Vec3::new(r, h + s.top_radius, r),
                    ),
                ))
            }
            ShapeSettings::Cylinder(s) => {
                finite(kind, [s.half_height, s.radius, s.convex_radius])?;
                positive(kind, "half height", s.half_height)?;
                positive(kind, "radius", s.radius)?;
                convex_radius(kind, s.convex_radius, s.half_height.min(s.radius))?;
                let half = Vec3::new(s.radius, s.half_height, s.radius);
                Ok(Shape::leaf(kind, Aabb::centered(half)))
            }
            ShapeSettings::TaperedCylinder(s) => {
                finite(kind, [s.half_height, s.top_radius, s.bottom_radius, s.convex_radius])?;
                positive(kind, "half height", s.half_height)?;
                // A cone has one zero radius, but not both
                positive(kind, "largest radius", s.top_radius.max(s.bottom_radius))?;
                if s.top_radius < 0.0 || s.bottom_radius < 0.0 {
                    return Err(ShapeError::NonPositive {
                        kind,
                        what: "radius",
                        value: s.top_radius.min(s.bottom_radius),
                    });
                }
                let smallest = s.half_height.min(s.top_radius.min(s.bottom_radius));
                convex_radius(kind, s.convex_radius, smallest)?;
                let r = s.top_radius.max(s.bottom_radius);
                Ok(Shape::leaf(
                    kind,
                    Aabb::centered(Vec3::new(r, s.half_height, r)),
                ))
            }
            ShapeSettings::Empty(s) => {
                finite(kind, s.center_of_mass.to_array())?;
                Ok(Shape::leaf(kind, Aabb::point(s.center_of_mass)))
            }
            ShapeSettings::StaticCompound(compound) => {
                if compound.is_empty() {
                    return Err(ShapeError::EmptyCompound);
                }
                self.bake_compound(kind, compound)
            }
            ShapeSettings::MutableCompound(compound) => self.bake_compound(kind, compound),
            ShapeSettings::ConvexHull(s) => {
                if s.points.len() < 4 {
                    return Err(ShapeError::TooFewHullPoints(s.points.len()));
                }
                finite(kind, s.points.iter().flat_map(|p| p.to_array()))?;
                if s.max_convex_radius < 0.0 {
                    return Err(ShapeError::ConvexRadius {
                        kind,
                        radius: s.max_convex_radius,
                        limit: f32::INFINITY,
                    });
                }
                let bounds = Aabb::from_points(s.points.iter().copied())
                    .ok_or(ShapeError::TooFewHullPoints(0))?;
                Ok(Shape::leaf(kind, bounds))
            }
            ShapeSettings::RotatedTranslated(s) => {
                finite(kind, s.position.to_array())?;
                let inner = self.bake(&s.inner)?;
                let rotation = s.rotation.normalize();
                Ok(Shape {
                    kind,
                    bounds: inner.bounds.transformed(rotation, s.position),
                    has_mass: inner.has_mass,
                    static_only: inner.static_only,
                    children: vec![inner],
                })
            }
            ShapeSettings::Scaled(s) => {
                finite(kind, s.scale.to_array())?;
                if s.scale.abs().min_element() == 0.0 {
                    return Err(ShapeError::ZeroScale(s.scale));
                }
                let inner = self.bake(&s.inner)?;
                Ok(Shape {
                    kind,
                    bounds: inner.bounds.scaled(s.scale),
                    has_mass: inner.has_mass,
                    static_only: inner.static_only,
                    children: vec![inner],
                })
            }
            ShapeSettings::Triangle(s) => {
                finite(kind, s.vertices.iter().flat_map(|v| v.to_array()))?;
                let [a, b, c] = s.vertices;
                if (b - a).cross(c - a).length_squared() <= f32::EPSILON * f32::EPSILON {
                    return Err(ShapeError::DegenerateTriangle);
                }
                if s.convex_radius < 0.0 {
                    return Err(ShapeError::ConvexRadius {
                        kind,
                        radius: s.convex_radius,
                        limit: f32::INFINITY,
                    });
                }
                let bounds = Aabb::from_points(s.vertices)
                    .ok_or(ShapeError::DegenerateTriangle)?;
                let padding = Vec3::splat(s.convex_radius);
                Ok(Shape {
                    kind,
                    bounds: Aabb::new(bounds.min - padding, bounds.max + padding),
                    // A triangle has no volume
                    has_mass: false,
                    static_only: false,
                    children: Vec::new(),
                })
            }
        }
    }

    fn bake_compound(
        &mut self,
        kind: ShapeKind,
        compound: &CompoundShapeSettings,
    ) -> Result<Shape, ShapeError> {
        let mut children = Vec::with_capacity(compound.len());
        let mut bounds: Option<Aabb> = None;
        for sub in &compound.sub_shapes {
            finite(kind, sub.position.to_array())?;
            let child = self.bake(&sub.shape)?;
            let child_bounds = child.bounds.transformed(sub.rotation.normalize(), sub.position);
            bounds = Some(match bounds {
                Some(b) => b.union(&child_bounds),
                None => child_bounds,
            });
            children.push(child);
        }

        Ok(Shape {
            kind,
            bounds: bounds.unwrap_or(Aabb::point(Vec3::ZERO)),
            has_mass: children.iter().any(|c| c.has_mass),
            static_only: children.iter().any(|c| c.static_only),
            children,
        })
    }
}

fn bake_mesh(mesh: &MeshShapeSettings) -> Result<Shape, ShapeError> {
    let kind = ShapeKind::Mesh;
    finite(kind, mesh.triangles.iter().flat_map(|t| t.vertices).flat_map(|v| v.to_array()))?;
    let bounds = Aabb::from_points(mesh.triangles.iter().flat_map(|t| t.vertices))
        .ok_or(ShapeError::EmptyMesh)?;
    Ok(Shape {
        kind,
        bounds,
        has_mass: false,
        static_only: true,
        children: Vec::new(),
    })
}

fn bake_height_field(field: &HeightFieldShapeSettings) -> Result<Shape, ShapeError> {
    let kind = ShapeKind::HeightField;
    let n = field.sample_count as usize;
    if n < 2 || field.height_samples.len() != n * n {
        return Err(ShapeError::HeightFieldSize {
            sample_count: field.sample_count,
            actual: field.height_samples.len(),
        });
    }
    finite(kind, field.offset.to_array().into_iter().chain(field.scale.to_array()))?;

    // Holes are skipped, not treated as heights
    let (low, high) = field
        .height_samples
        .iter()
        .filter(|&&h| h != NO_COLLISION_VALUE)
        .fold(None, |range: Option<(f32, f32)>, &h| {
            Some(match range {
                Some((lo, hi)) => (lo.min(h), hi.max(h)),
                None => (h, h),
            })
        })
        .ok_or(ShapeError::HeightFieldEmpty)?;

    let span = (n - 1) as f32;
    let corner_a = field.offset + field.scale * Vec3::new(0.0, low, 0.0);
    let corner_b = field.offset + field.scale * Vec3::new(span, high, span);
    Ok(Shape {
        kind,
        bounds: Aabb::new(corner_a.min(corner_b), corner_a.max(corner_b)),
        has_mass: false,
        static_only: true,
        children: Vec::new(),
    })
}

fn finite(kind: ShapeKind, values: impl IntoIterator<Item = f32>) -> Result<(), ShapeError> {
    if values.into_iter().all(f32::is_finite) {
        Ok(())
    } else {
        Err(ShapeError::NonFinite { kind })
    }
}

fn positive(kind: ShapeKind, what: &'static str, value: f32) -> Result<(), ShapeError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ShapeError::NonPositive { kind, what, value })
    }
}

fn convex_radius(kind: ShapeKind, radius: f32, limit: f32) -> Result<(), ShapeError> {
    if (0.0..=limit).contains(&radius) {
        Ok(())
    } else {
        Err(ShapeError::ConvexRadius {
            kind,
            radius,
            limit,
        })
    }
}
