//! The scene aggregate
//!
//! A [`PhysicsScene`] is built once, append-only, and then handed to the
//! persistence layer or instantiated. Constraints refer to bodies by their ordinal
//! position in [`PhysicsScene::bodies`], which is why bodies can only be appended.

use std::sync::Arc;

use hashbrown::HashSet;
use thiserror::Error;

use crate::body::BodySettings;
use crate::constraint::ConstraintSettings;
use crate::identity_key;
use crate::shape::{ShapeKind, ShapeSettings};
use crate::soft_body::{SoftBodySettings, SoftBodySharedSettings};

/// A constraint between two bodies, addressed by ordinal position
#[derive(Clone, Debug)]
pub struct ConstraintEntry {
    pub settings: Arc<ConstraintSettings>,
    pub body_a: u32,
    pub body_b: u32,
}

/// Invariant violations found by [`PhysicsScene::validate`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("constraint {constraint} references body {body} but the scene has {body_count} bodies")]
    ConstraintBodyOutOfRange {
        constraint: usize,
        body: u32,
        body_count: usize,
    },

    #[error("{shape} shape uses material index {index} but has {material_count} materials")]
    MaterialIndexOutOfRange {
        shape: ShapeKind,
        index: u32,
        material_count: usize,
    },

    #[error("height field with {sample_count}² samples has {actual} {what} (expected {expected})")]
    HeightFieldSize {
        sample_count: u32,
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("soft body template references vertex {vertex} but has {vertex_count} vertices")]
    SoftBodyVertexOutOfRange { vertex: u32, vertex_count: usize },

    #[error("soft body face uses material index {index} but the template has {material_count} materials")]
    SoftBodyMaterialOutOfRange { index: u32, material_count: usize },
}

/// Bodies, soft bodies and constraints of one physics scene.
#[derive(Clone, Debug, Default)]
pub struct PhysicsScene {
    bodies: Vec<BodySettings>,
    soft_bodies: Vec<SoftBodySettings>,
    constraints: Vec<ConstraintEntry>,
}

impl PhysicsScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a body and return its ordinal position
    pub fn add_body(&mut self, body: BodySettings) -> u32 {
        self.bodies.push(body);
        (self.bodies.len() - 1) as u32
    }

    /// Append a soft body and return its ordinal position among soft bodies
    pub fn add_soft_body(&mut self, soft_body: SoftBodySettings) -> u32 {
        self.soft_bodies.push(soft_body);
        (self.soft_bodies.len() - 1) as u32
    }

    /// Append a constraint between the bodies at ordinals `body_a` and `body_b`.
    ///
    /// # Panics
    /// Panics if either ordinal does not refer to a body that has already been
    /// added.
    pub fn add_constraint(&mut self, settings: Arc<ConstraintSettings>, body_a: u32, body_b: u32) {
        let body_count = self.bodies.len();
        assert!(
            (body_a as usize) < body_count && (body_b as usize) < body_count,
            "constraint between bodies {} and {} added while the scene has {} bodies",
            body_a,
            body_b,
            body_count
        );
        self.constraints.push(ConstraintEntry {
            settings,
            body_a,
            body_b,
        });
    }

    pub fn bodies(&self) -> &[BodySettings] {
        &self.bodies
    }

    pub fn soft_bodies(&self) -> &[SoftBodySettings] {
        &self.soft_bodies
    }

    pub fn constraints(&self) -> &[ConstraintEntry] {
        &self.constraints
    }

    /// Rebuild a scene from already validated parts (used by readers).
    ///
    /// Unlike the `add_*` methods this does not check constraint ordinals; call
    /// [`validate`](Self::validate) afterwards.
    pub fn from_parts(
        bodies: Vec<BodySettings>,
        soft_bodies: Vec<SoftBodySettings>,
        constraints: Vec<ConstraintEntry>,
    ) -> Self {
        Self {
            bodies,
            soft_bodies,
            constraints,
        }
    }

    /// Every distinct shape reachable from the bodies, parents before children,
    /// each listed once no matter how often it is referenced
    pub fn distinct_shapes(&self) -> Vec<&Arc<ShapeSettings>> {
        let mut seen = HashSet::new();
        let mut shapes = Vec::new();
        let mut stack: Vec<&Arc<ShapeSettings>> =
            self.bodies.iter().rev().map(|body| &body.shape).collect();

        while let Some(shape) = stack.pop() {
            if !seen.insert(identity_key(shape)) {
                continue;
            }
            shapes.push(shape);
            stack.extend(shape.children().into_iter().rev());
        }
        shapes
    }

    /// Distinct soft-body templates, in first-use order
    pub fn distinct_soft_body_templates(&self) -> Vec<&Arc<SoftBodySharedSettings>> {
        let mut seen = HashSet::new();
        self.soft_bodies
            .iter()
            .map(|soft_body| &soft_body.settings)
            .filter(|settings| seen.insert(identity_key(*settings)))
            .collect()
    }

    /// Recompute derived soft-body data for every template that lacks it.
    ///
    /// Returns how many templates were optimized by this call.
    pub fn optimize_soft_bodies(&self) -> usize {
        self.distinct_soft_body_templates()
            .into_iter()
            .filter(|settings| settings.optimize())
            .count()
    }

    /// Check the scene's structural invariants
    pub fn validate(&self) -> Result<(), SceneError> {
        let body_count = self.bodies.len();
        for (constraint, entry) in self.constraints.iter().enumerate() {
            for body in [entry.body_a, entry.body_b] {
                if body as usize >= body_count {
                    return Err(SceneError::ConstraintBodyOutOfRange {
                        constraint,
                        body,
                        body_count,
                    });
                }
            }
        }

        for shape in self.distinct_shapes() {
            validate_shape(shape)?;
        }

        for template in self.distinct_soft_body_templates() {
            validate_soft_body(template)?;
        }

        Ok(())
    }
}

fn check_material_index(shape: ShapeKind, index: u32, material_count: usize) -> Result<(), SceneError> {
    // Without a material list every index must refer to the default material
    let limit = material_count.max(1);
    if index as usize >= limit {
        return Err(SceneError::MaterialIndexOutOfRange {
            shape,
            index,
            material_count,
        });
    }
    Ok(())
}

fn validate_shape(shape: &ShapeSettings) -> Result<(), SceneError> {
    match shape {
        ShapeSettings::Mesh(mesh) => {
            for triangle in &mesh.triangles {
                check_material_index(ShapeKind::Mesh, triangle.material_index, mesh.materials.len())?;
            }
        }
        ShapeSettings::HeightField(field) => {
            let n = field.sample_count as usize;
            if field.height_samples.len() != n * n {
                return Err(SceneError::HeightFieldSize {
                    sample_count: field.sample_count,
                    what: "height samples",
                    expected: n * n,
                    actual: field.height_samples.len(),
                });
            }
            let cells = n.saturating_sub(1) * n.saturating_sub(1);
            if !field.material_indices.is_empty() && field.material_indices.len() != cells {
                return Err(SceneError::HeightFieldSize {
                    sample_count: field.sample_count,
                    what: "material indices",
                    expected: cells,
                    actual: field.material_indices.len(),
                });
            }
            for &index in &field.material_indices {
                check_material_index(ShapeKind::HeightField, index as u32, field.materials.len())?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_soft_body(settings: &SoftBodySharedSettings) -> Result<(), SceneError> {
    let vertex_count = settings.vertices.len();
    let vertices = settings
        .faces
        .iter()
        .flat_map(|f| f.vertex)
        .chain(settings.edges.iter().flat_map(|e| e.vertex))
        .chain(settings.volumes.iter().flat_map(|v| v.vertex));
    for vertex in vertices {
        if vertex as usize >= vertex_count {
            return Err(SceneError::SoftBodyVertexOutOfRange {
                vertex,
                vertex_count,
            });
        }
    }

    let material_count = settings.materials.len();
    for face in &settings.faces {
        if face.material_index as usize >= material_count.max(1) {
            return Err(SceneError::SoftBodyMaterialOutOfRange {
                index: face.material_index,
                material_count,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::constraint::DistanceConstraintSettings;
    use crate::layers::{MotionType, ObjectLayer};
    use crate::material::PhysicsMaterial;
    use crate::shape::{
        CompoundShapeSettings, MeshShapeSettings, MeshTriangle, SphereShapeSettings,
    };
    use glam::{Quat, Vec3};

    fn sphere_body(shape: Arc<ShapeSettings>) -> BodySettings {
        BodySettings::new(
            shape,
            Vec3::ZERO,
            Quat::IDENTITY,
            MotionType::Dynamic,
            ObjectLayer::MOVING,
        )
    }

    fn sphere() -> Arc<ShapeSettings> {
        ShapeSettings::from(SphereShapeSettings::new(0.5, None)).shared()
    }

    // =============================================================
    // Construction
    // =============================================================

    #[test]
    fn test_add_returns_ordinals() {
        let mut scene = PhysicsScene::new();
        assert_eq!(scene.add_body(sphere_body(sphere())), 0);
        assert_eq!(scene.add_body(sphere_body(sphere())), 1);
        scene.add_constraint(Arc::new(DistanceConstraintSettings::default().into()), 0, 1);
        assert_eq!(scene.constraints().len(), 1);
        assert!(scene.validate().is_ok());
    }

    #[test]
    #[should_panic(expected = "while the scene has 1 bodies")]
    fn test_constraint_to_future_body_panics() {
        let mut scene = PhysicsScene::new();
        scene.add_body(sphere_body(sphere()));
        scene.add_constraint(Arc::new(DistanceConstraintSettings::default().into()), 0, 1);
    }

    // =============================================================
    // Validation
    // =============================================================

    #[test]
    fn test_validate_rejects_dangling_constraint_from_parts() {
        let entry = ConstraintEntry {
            settings: Arc::new(DistanceConstraintSettings::default().into()),
            body_a: 0,
            body_b: 5,
        };
        let scene = PhysicsScene::from_parts(vec![sphere_body(sphere())], Vec::new(), vec![entry]);
        assert_eq!(
            scene.validate(),
            Err(SceneError::ConstraintBodyOutOfRange {
                constraint: 0,
                body: 5,
                body_count: 1
            })
        );
    }

    #[test]
    fn test_validate_rejects_material_index_out_of_range() {
        let mesh = MeshShapeSettings::new(
            vec![MeshTriangle::new(Vec3::ZERO, Vec3::X, Vec3::Z, 2)],
            vec![
                PhysicsMaterial::shared("a", Color::WHITE),
                PhysicsMaterial::shared("b", Color::WHITE),
            ],
        );
        let mut scene = PhysicsScene::new();
        scene.add_body(sphere_body(ShapeSettings::from(mesh).shared()));
        assert!(matches!(
            scene.validate(),
            Err(SceneError::MaterialIndexOutOfRange { index: 2, material_count: 2, .. })
        ));
    }

    // =============================================================
    // Sharing
    // =============================================================

    #[test]
    fn test_distinct_shapes_lists_shared_child_once() {
        let child = sphere();
        let compound = CompoundShapeSettings::new()
            .with_shape(Vec3::ZERO, Quat::IDENTITY, child.clone())
            .with_shape(Vec3::Y, Quat::IDENTITY, child.clone());
        let compound = ShapeSettings::StaticCompound(compound).shared();

        let mut scene = PhysicsScene::new();
        scene.add_body(sphere_body(compound.clone()));
        scene.add_body(sphere_body(child.clone()));

        let shapes = scene.distinct_shapes();
        assert_eq!(shapes.len(), 2);
        assert!(Arc::ptr_eq(shapes[0], &compound));
        assert!(Arc::ptr_eq(shapes[1], &child));
    }

    #[test]
    fn test_shared_template_optimized_once() {
        let template = Arc::new(SoftBodySharedSettings::create_cube(3, 0.5));
        let mut scene = PhysicsScene::new();
        for x in 0..2 {
            scene.add_soft_body(SoftBodySettings::new(
                template.clone(),
                Vec3::X * x as f32,
                Quat::IDENTITY,
                ObjectLayer::MOVING,
            ));
        }

        assert_eq!(scene.distinct_soft_body_templates().len(), 1);
        assert_eq!(scene.optimize_soft_bodies(), 1);
        assert_eq!(scene.optimize_soft_bodies(), 0);
        assert!(template.is_optimized());
    }
}
