//! Simulation world
//!
//! [`PhysicsWorld`] is the seam between scene instantiation and a simulation
//! backend. [`World`] is the in-memory implementation: it applies the same
//! admission rules a real backend would (layers, motion types, capacity,
//! prepared soft-body templates) and keeps the live bodies, but does not step
//! dynamics.

use std::sync::Arc;

use glam::{Quat, Vec3};
use tessera_shared::{
    ConstraintSettings, ConstraintSpace, MotionType, ObjectLayer, SoftBodySharedSettings,
};
use thiserror::Error;
use tracing::debug;

use crate::config::WorldConfig;
use crate::shape::Shape;

/// Handle of a live rigid or soft body
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

/// Handle of a live constraint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(pub u32);

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Reasons a world refuses to create a body or constraint
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstantiationError {
    #[error("layer {layer} does not exist (world has {num_layers} layers)")]
    UnknownLayer { layer: ObjectLayer, num_layers: u16 },

    #[error("{motion_type:?} body cannot use a static-only {kind} shape")]
    StaticOnlyShape {
        kind: tessera_shared::ShapeKind,
        motion_type: MotionType,
    },

    #[error("dynamic body cannot use a massless {0} shape")]
    MasslessShape(tessera_shared::ShapeKind),

    #[error("world is full ({max_bodies} bodies)")]
    TooManyBodies { max_bodies: u32 },

    #[error("soft body template has not been optimized")]
    TemplateNotOptimized,

    #[error("body {0} does not exist")]
    UnknownBody(BodyId),

    #[error("shape could not be baked: {0}")]
    Shape(#[from] crate::shape::ShapeError),

    #[error("constraint references body {ordinal}, which failed to instantiate")]
    ConstraintBodyMissing { ordinal: u32 },
}

/// Rigid body creation request
#[derive(Clone, Debug)]
pub struct BodyDesc {
    pub shape: Arc<Shape>,
    pub position: Vec3,
    pub rotation: Quat,
    pub motion_type: MotionType,
    pub layer: ObjectLayer,
    pub friction: f32,
    pub restitution: f32,
}

/// Soft body creation request
#[derive(Clone, Debug)]
pub struct SoftBodyDesc {
    pub settings: Arc<SoftBodySharedSettings>,
    pub position: Vec3,
    pub rotation: Quat,
    pub layer: ObjectLayer,
    pub pressure: f32,
}

/// A simulation backend able to host scene content
pub trait PhysicsWorld {
    fn create_body(&mut self, desc: BodyDesc) -> Result<BodyId, InstantiationError>;

    fn create_soft_body(&mut self, desc: SoftBodyDesc) -> Result<BodyId, InstantiationError>;

    fn create_constraint(
        &mut self,
        settings: &ConstraintSettings,
        body_a: BodyId,
        body_b: BodyId,
    ) -> Result<ConstraintId, InstantiationError>;
}

/// A live rigid body
#[derive(Clone, Debug)]
pub struct Body {
    pub id: BodyId,
    /// Owned by the body; outlives the settings it was baked from
    pub shape: Arc<Shape>,
    pub position: Vec3,
    pub rotation: Quat,
    pub motion_type: MotionType,
    pub layer: ObjectLayer,
    pub friction: f32,
    pub restitution: f32,
}

impl Body {
    /// Shape bounds in world space
    pub fn world_bounds(&self) -> crate::shape::Aabb {
        self.shape.bounds.transformed(self.rotation, self.position)
    }
}

/// A live soft body with its own particle state
#[derive(Clone, Debug)]
pub struct SoftBody {
    pub id: BodyId,
    pub settings: Arc<SoftBodySharedSettings>,
    pub layer: ObjectLayer,
    pub pressure: f32,
    /// World-space particle positions
    pub particles: Vec<Vec3>,
}

impl SoftBody {
    pub fn center(&self) -> Vec3 {
        if self.particles.is_empty() {
            return Vec3::ZERO;
        }
        self.particles.iter().copied().sum::<Vec3>() / self.particles.len() as f32
    }
}

/// A live constraint with its parameters resolved against the bodies
#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    Distance {
        body_a: BodyId,
        body_b: BodyId,
        min_distance: f32,
        max_distance: f32,
    },
    Point {
        body_a: BodyId,
        body_b: BodyId,
        anchor: Vec3,
    },
    Fixed {
        body_a: BodyId,
        body_b: BodyId,
        anchor: Vec3,
    },
}

/// In-memory world
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    bodies: Vec<Body>,
    soft_bodies: Vec<SoftBody>,
    constraints: Vec<Constraint>,
    next_body: u32,
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            bodies: Vec::new(),
            soft_bodies: Vec::new(),
            constraints: Vec::new(),
            next_body: 0,
        }
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn soft_bodies(&self) -> &[SoftBody] {
        &self.soft_bodies
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn soft_body(&self, id: BodyId) -> Option<&SoftBody> {
        self.soft_bodies.iter().find(|b| b.id == id)
    }

    /// Rigid plus soft bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len() + self.soft_bodies.len()
    }

    fn check_layer(&self, layer: ObjectLayer) -> Result<(), InstantiationError> {
        if layer.0 < self.config.num_layers {
            Ok(())
        } else {
            Err(InstantiationError::UnknownLayer {
                layer,
                num_layers: self.config.num_layers,
            })
        }
    }

    fn allocate_id(&mut self) -> Result<BodyId, InstantiationError> {
        if self.body_count() >= self.config.max_bodies as usize {
            return Err(InstantiationError::TooManyBodies {
                max_bodies: self.config.max_bodies,
            });
        }
        let id = BodyId(self.next_body);
        self.next_body += 1;
        Ok(id)
    }

    /// Position and rotation of any live body
    fn transform(&self, id: BodyId) -> Result<(Vec3, Quat), InstantiationError> {
        if let Some(body) = self.body(id) {
            return Ok((body.position, body.rotation));
        }
        if let Some(soft) = self.soft_body(id) {
            return Ok((soft.center(), Quat::IDENTITY));
        }
        Err(InstantiationError::UnknownBody(id))
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl PhysicsWorld for World {
    fn create_body(&mut self, desc: BodyDesc) -> Result<BodyId, InstantiationError> {
        self.check_layer(desc.layer)?;

        if !desc.motion_type.is_static() && desc.shape.static_only {
            return Err(InstantiationError::StaticOnlyShape {
                kind: desc.shape.kind,
                motion_type: desc.motion_type,
            });
        }
        if desc.motion_type.is_dynamic() && !desc.shape.has_mass {
            return Err(InstantiationError::MasslessShape(desc.shape.kind));
        }

        let id = self.allocate_id()?;
        debug!(%id, kind = %desc.shape.kind, layer = %desc.layer, "body created");
        self.bodies.push(Body {
            id,
            shape: desc.shape,
            position: desc.position,
            rotation: desc.rotation,
            motion_type: desc.motion_type,
            layer: desc.layer,
            friction: desc.friction,
            restitution: desc.restitution,
        });
        Ok(id)
    }

    fn create_soft_body(&mut self, desc: SoftBodyDesc) -> Result<BodyId, InstantiationError> {
        self.check_layer(desc.layer)?;
        if !desc.settings.is_optimized() {
            return Err(InstantiationError::TemplateNotOptimized);
        }

        let id = self.allocate_id()?;
        let particles = desc
            .settings
            .vertices
            .iter()
            .map(|v| desc.position + desc.rotation * v.position)
            .collect();

        debug!(%id, vertices = desc.settings.vertices.len(), "soft body created");
        self.soft_bodies.push(SoftBody {
            id,
            settings: desc.settings,
            layer: desc.layer,
            pressure: desc.pressure,
            particles,
        });
        Ok(id)
    }

    fn create_constraint(
        &mut self,
        settings: &ConstraintSettings,
        body_a: BodyId,
        body_b: BodyId,
    ) -> Result<ConstraintId, InstantiationError> {
        let (pos_a, rot_a) = self.transform(body_a)?;
        let (pos_b, rot_b) = self.transform(body_b)?;

        let to_world = |space: ConstraintSpace, point1: Vec3, point2: Vec3| match space {
            ConstraintSpace::WorldSpace => (point1, point2),
            ConstraintSpace::LocalToBodyCOM => (pos_a + rot_a * point1, pos_b + rot_b * point2),
        };

        let constraint = match settings {
            ConstraintSettings::Distance(s) => {
                let (p1, p2) = to_world(s.space, s.point1, s.point2);
                let (min_distance, max_distance) =
                    resolve_distance_range(p1.distance(p2), s.min_distance, s.max_distance);
                Constraint::Distance {
                    body_a,
                    body_b,
                    min_distance,
                    max_distance,
                }
            }
            ConstraintSettings::Point(s) => {
                let (p1, p2) = to_world(s.space, s.point1, s.point2);
                Constraint::Point {
                    body_a,
                    body_b,
                    anchor: (p1 + p2) * 0.5,
                }
            }
            ConstraintSettings::Fixed(s) => {
                let anchor = if s.auto_detect_point {
                    (pos_a + pos_b) * 0.5
                } else {
                    pos_a
                };
                Constraint::Fixed {
                    body_a,
                    body_b,
                    anchor,
                }
            }
        };

        let id = ConstraintId(self.constraints.len() as u32);
        debug!(constraint = settings.name(), %body_a, %body_b, "constraint created");
        self.constraints.push(constraint);
        Ok(id)
    }
}

/// Fill in negative (unset) distance limits from the spawn distance
fn resolve_distance_range(spawn_distance: f32, min: f32, max: f32) -> (f32, f32) {
    match (min < 0.0, max < 0.0) {
        (true, true) => (spawn_distance, spawn_distance),
        (true, false) => (spawn_distance.min(max), max),
        (false, true) => (min, spawn_distance.max(min)),
        (false, false) => (min, max.max(min)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeBaker;
    use tessera_shared::{
        DistanceConstraintSettings, FixedConstraintSettings, MeshShapeSettings, MeshTriangle,
        ShapeSettings, SphereShapeSettings, TriangleShapeSettings,
    };

    fn baked(settings: impl Into<ShapeSettings>) -> Arc<Shape> {
        ShapeBaker::new().bake(&settings.into().shared()).unwrap()
    }

    fn sphere_desc(y: f32) -> BodyDesc {
        BodyDesc {
            shape: baked(SphereShapeSettings::new(0.5, None)),
            position: Vec3::new(0.0, y, 0.0),
            rotation: Quat::IDENTITY,
            motion_type: MotionType::Dynamic,
            layer: ObjectLayer::MOVING,
            friction: 0.2,
            restitution: 0.0,
        }
    }

    // =============================================================
    // Rigid bodies
    // =============================================================

    #[test]
    fn test_create_body() {
        let mut world = World::default();
        let id = world.create_body(sphere_desc(1.0)).unwrap();
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.body(id).unwrap().position, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_unknown_layer_rejected() {
        let mut world = World::default();
        let mut desc = sphere_desc(1.0);
        desc.layer = ObjectLayer(7);
        assert!(matches!(
            world.create_body(desc),
            Err(InstantiationError::UnknownLayer { num_layers: 2, .. })
        ));
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_dynamic_mesh_rejected() {
        let mesh = MeshShapeSettings::new(
            vec![MeshTriangle::new(Vec3::ZERO, Vec3::X, Vec3::Z, 0)],
            Vec::new(),
        );
        let mut desc = sphere_desc(0.0);
        desc.shape = baked(mesh);
        assert!(matches!(
            world_create(desc.clone()),
            Err(InstantiationError::StaticOnlyShape { .. })
        ));

        desc.motion_type = MotionType::Static;
        desc.layer = ObjectLayer::NON_MOVING;
        assert!(world_create(desc).is_ok());
    }

    #[test]
    fn test_dynamic_triangle_rejected() {
        let mut desc = sphere_desc(0.0);
        desc.shape = baked(TriangleShapeSettings::new(Vec3::ZERO, Vec3::X, Vec3::Y, 0.0, None));
        assert!(matches!(
            world_create(desc),
            Err(InstantiationError::MasslessShape(_))
        ));
    }

    #[test]
    fn test_capacity_enforced() {
        let mut world = World::new(WorldConfig {
            max_bodies: 2,
            num_layers: 2,
        });
        world.create_body(sphere_desc(1.0)).unwrap();
        world.create_body(sphere_desc(2.0)).unwrap();
        assert_eq!(
            world.create_body(sphere_desc(3.0)).unwrap_err(),
            InstantiationError::TooManyBodies { max_bodies: 2 }
        );
    }

    fn world_create(desc: BodyDesc) -> Result<BodyId, InstantiationError> {
        World::default().create_body(desc)
    }

    // =============================================================
    // Soft bodies
    // =============================================================

    #[test]
    fn test_soft_body_requires_optimized_template() {
        let template = Arc::new(SoftBodySharedSettings::create_cube(2, 1.0));
        let desc = SoftBodyDesc {
            settings: template.clone(),
            position: Vec3::new(0.0, 5.0, 0.0),
            rotation: Quat::IDENTITY,
            layer: ObjectLayer::MOVING,
            pressure: 0.0,
        };

        let mut world = World::default();
        assert_eq!(
            world.create_soft_body(desc.clone()).unwrap_err(),
            InstantiationError::TemplateNotOptimized
        );

        template.optimize();
        let id = world.create_soft_body(desc).unwrap();
        let soft = world.soft_body(id).unwrap();
        assert_eq!(soft.particles.len(), 8);
        assert!(soft.center().abs_diff_eq(Vec3::new(0.0, 5.0, 0.0), 1e-5));
    }

    // =============================================================
    // Constraints
    // =============================================================

    #[test]
    fn test_distance_constraint_uses_spawn_distance() {
        let mut world = World::default();
        let a = world.create_body(sphere_desc(1.0)).unwrap();
        let b = world.create_body(sphere_desc(4.0)).unwrap();

        let settings = ConstraintSettings::Distance(DistanceConstraintSettings {
            space: ConstraintSpace::LocalToBodyCOM,
            ..Default::default()
        });
        world.create_constraint(&settings, a, b).unwrap();

        assert_eq!(
            world.constraints()[0],
            Constraint::Distance {
                body_a: a,
                body_b: b,
                min_distance: 3.0,
                max_distance: 3.0,
            }
        );
    }

    #[test]
    fn test_distance_range_resolution() {
        assert_eq!(resolve_distance_range(2.0, -1.0, -1.0), (2.0, 2.0));
        assert_eq!(resolve_distance_range(2.0, -1.0, 1.5), (1.5, 1.5));
        assert_eq!(resolve_distance_range(2.0, 0.5, -1.0), (0.5, 2.0));
        assert_eq!(resolve_distance_range(2.0, 1.0, 3.0), (1.0, 3.0));
    }

    #[test]
    fn test_constraint_unknown_body_rejected() {
        let mut world = World::default();
        let a = world.create_body(sphere_desc(1.0)).unwrap();
        let settings = ConstraintSettings::Fixed(FixedConstraintSettings::default());
        assert_eq!(
            world.create_constraint(&settings, a, BodyId(99)).unwrap_err(),
            InstantiationError::UnknownBody(BodyId(99))
        );
    }

    #[test]
    fn test_bodies_outlive_settings() {
        let settings = ShapeSettings::from(SphereShapeSettings::new(0.5, None)).shared();
        let shape = ShapeBaker::new().bake(&settings).unwrap();
        drop(settings);

        let mut world = World::default();
        let mut desc = sphere_desc(0.0);
        desc.shape = shape;
        let id = world.create_body(desc).unwrap();
        assert_eq!(world.body(id).unwrap().shape.kind, tessera_shared::ShapeKind::Sphere);
    }
}
