//! Stream writer
//!
//! [`ObjectStreamOut`] walks a scene depth-first and emits every shared object the
//! first time it is reached, after everything it references. Later encounters of
//! the same `Arc` reuse the id of the first emission, so shared objects are
//! written exactly once. Identity is the `Arc` allocation: two separately
//! allocated but equal objects are written twice.

use std::sync::Arc;

use hashbrown::HashMap;
use serde::Serialize;
use tessera_shared::{
    ConstraintSettings, PhysicsMaterial, PhysicsScene, ShapeSettings, SoftBodySharedSettings,
    identity_key,
};
use tracing::debug;

use crate::error::StreamError;
use crate::record::*;

/// Objects already written, by identity key.
///
/// Holding the `Arc` keeps the allocation alive, so its key cannot be handed to
/// a different object while the writer exists.
type Written<T> = HashMap<usize, (Arc<T>, Ref)>;

fn lookup<T>(written: &Written<T>, object: &Arc<T>) -> Option<Ref> {
    written.get(&identity_key(object)).map(|(_, reference)| *reference)
}

fn remember<T>(written: &mut Written<T>, object: &Arc<T>, reference: Ref) {
    written.insert(identity_key(object), (object.clone(), reference));
}

/// Collects records for one document
#[derive(Default)]
pub struct ObjectStreamOut {
    records: Vec<Record>,
    materials: Written<PhysicsMaterial>,
    shapes: Written<ShapeSettings>,
    templates: Written<SoftBodySharedSettings>,
    constraints: Written<ConstraintSettings>,
}

impl ObjectStreamOut {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode a whole scene; the scene record is emitted last and becomes the root
    pub fn write_scene(mut self, scene: &PhysicsScene) -> Result<Document, StreamError> {
        let mut data = SceneData::default();

        for body in scene.bodies() {
            data.bodies.push(BodyData {
                shape: self.write_shape(&body.shape)?,
                position: body.position,
                rotation: body.rotation,
                motion_type: body.motion_type,
                layer: body.layer,
                friction: body.friction,
                restitution: body.restitution,
                linear_damping: body.linear_damping,
                angular_damping: body.angular_damping,
                gravity_factor: body.gravity_factor,
                allow_sleeping: body.allow_sleeping,
                user_data: body.user_data,
            });
        }

        for soft_body in scene.soft_bodies() {
            data.soft_bodies.push(SoftBodyData {
                settings: self.write_soft_body_template(&soft_body.settings)?,
                position: soft_body.position,
                rotation: soft_body.rotation,
                layer: soft_body.layer,
                pressure: soft_body.pressure,
                num_iterations: soft_body.num_iterations,
                linear_damping: soft_body.linear_damping,
                friction: soft_body.friction,
                gravity_factor: soft_body.gravity_factor,
            });
        }

        for entry in scene.constraints() {
            data.constraints.push(ConstraintData {
                settings: self.write_constraint(&entry.settings)?,
                body_a: entry.body_a,
                body_b: entry.body_b,
            });
        }

        let root = self.push(SCENE, &data)?;
        debug!(
            objects = self.records.len(),
            shapes = self.shapes.len(),
            materials = self.materials.len(),
            "scene encoded"
        );

        Ok(Document {
            format: FORMAT_NAME.to_string(),
            version: FORMAT_VERSION,
            objects: self.records,
            root: root.id,
        })
    }

    pub fn write_material(&mut self, material: &Arc<PhysicsMaterial>) -> Result<Ref, StreamError> {
        if let Some(existing) = lookup(&self.materials, material) {
            return Ok(existing);
        }

        let data = MaterialData {
            name: material.name.clone(),
            color: material.color,
        };
        let reference = self.push(MATERIAL, &data)?;
        remember(&mut self.materials, material, reference);
        Ok(reference)
    }

    fn write_optional_material(
        &mut self,
        material: &Option<Arc<PhysicsMaterial>>,
    ) -> Result<Option<Ref>, StreamError> {
        material.as_ref().map(|m| self.write_material(m)).transpose()
    }

    fn write_material_list(
        &mut self,
        materials: &[Arc<PhysicsMaterial>],
    ) -> Result<Vec<Ref>, StreamError> {
        materials.iter().map(|m| self.write_material(m)).collect()
    }

    /// Emit a shape and, before it, every shape and material it references
    pub fn write_shape(&mut self, shape: &Arc<ShapeSettings>) -> Result<Ref, StreamError> {
        if let Some(existing) = lookup(&self.shapes, shape) {
            return Ok(existing);
        }

        let type_name = shape_type_name(shape.kind());
        let reference = match shape.as_ref() {
            ShapeSettings::Mesh(s) => {
                let data = MeshData {
                    triangles: s.triangles.clone(),
                    materials: self.write_material_list(&s.materials)?,
                };
                self.push(type_name, &data)?
            }
            ShapeSettings::HeightField(s) => {
                let data = HeightFieldData {
                    offset: s.offset,
                    scale: s.scale,
                    sample_count: s.sample_count,
                    height_samples: s.height_samples.clone(),
                    material_indices: s.material_indices.clone(),
                    materials: self.write_material_list(&s.materials)?,
                };
                self.push(type_name, &data)?
            }
            ShapeSettings::Box(s) => {
                let data = BoxData {
                    half_extent: s.half_extent,
                    convex_radius: s.convex_radius,
                    material: self.write_optional_material(&s.material)?,
                };
                self.push(type_name, &data)?
            }
            ShapeSettings::Sphere(s) => {
                let data = SphereData {
                    radius: s.radius,
                    material: self.write_optional_material(&s.material)?,
                };
                self.push(type_name, &data)?
            }
            ShapeSettings::Capsule(s) => {
                let data = CapsuleData {
                    half_height_of_cylinder: s.half_height_of_cylinder,
                    radius: s.radius,
                    material: self.write_optional_material(&s.material)?,
                };
                self.push(type_name, &data)?
            }
            ShapeSettings::TaperedCapsule(s) => {
                let data = TaperedCapsuleData {
                    half_height_of_tapered_cylinder: s.half_height_of_tapered_cylinder,
                    top_radius: s.top_radius,
                    bottom_radius: s.bottom_radius,
                    material: self.write_optional_material(&s.material)?,
                };
                self.push(type_name, &data)?
            }
            ShapeSettings::Cylinder(s) => {
                let data = CylinderData {
                    half_height: s.half_height,
                    radius: s.radius,
                    convex_radius: s.convex_radius,
                    material: self.write_optional_material(&s.material)?,
                };
                self.push(type_name, &data)?
            }
            ShapeSettings::TaperedCylinder(s) => {
                let data = TaperedCylinderData {
                    half_height: s.half_height,
                    top_radius: s.top_radius,
                    bottom_radius: s.bottom_radius,
                    convex_radius: s.convex_radius,
                    material: self.write_optional_material(&s.material)?,
                };
                self.push(type_name, &data)?
            }
            ShapeSettings::Empty(s) => {
                let data = EmptyData {
                    center_of_mass: s.center_of_mass,
                };
                self.push(type_name, &data)?
            }
            ShapeSettings::StaticCompound(s) | ShapeSettings::MutableCompound(s) => {
                let mut sub_shapes = Vec::with_capacity(s.sub_shapes.len());
                for sub in &s.sub_shapes {
                    sub_shapes.push(SubShapeData {
                        position: sub.position,
                        rotation: sub.rotation,
                        shape: self.write_shape(&sub.shape)?,
                        user_data: sub.user_data,
                    });
                }
                self.push(type_name, &CompoundData { sub_shapes })?
            }
            ShapeSettings::ConvexHull(s) => {
                let data = ConvexHullData {
                    points: s.points.clone(),
                    max_convex_radius: s.max_convex_radius,
                    material: self.write_optional_material(&s.material)?,
                };
                self.push(type_name, &data)?
            }
            ShapeSettings::RotatedTranslated(s) => {
                let data = RotatedTranslatedData {
                    position: s.position,
                    rotation: s.rotation,
                    inner: self.write_shape(&s.inner)?,
                };
                self.push(type_name, &data)?
            }
            ShapeSettings::Scaled(s) => {
                let data = ScaledData {
                    scale: s.scale,
                    inner: self.write_shape(&s.inner)?,
                };
                self.push(type_name, &data)?
            }
            ShapeSettings::Triangle(s) => {
                let data = TriangleData {
                    vertices: s.vertices,
                    convex_radius: s.convex_radius,
                    material: self.write_optional_material(&s.material)?,
                };
                self.push(type_name, &data)?
            }
        };

        remember(&mut self.shapes, shape, reference);
        Ok(reference)
    }

    pub fn write_soft_body_template(
        &mut self,
        template: &Arc<SoftBodySharedSettings>,
    ) -> Result<Ref, StreamError> {
        if let Some(existing) = lookup(&self.templates, template) {
            return Ok(existing);
        }

        let data = SoftBodyTemplateData {
            vertices: template.vertices.clone(),
            faces: template.faces.clone(),
            edges: template.edges.clone(),
            volumes: template.volumes.clone(),
            materials: self.write_material_list(&template.materials)?,
        };
        let reference = self.push(SOFT_BODY_TEMPLATE, &data)?;
        remember(&mut self.templates, template, reference);
        Ok(reference)
    }

    pub fn write_constraint(
        &mut self,
        constraint: &Arc<ConstraintSettings>,
    ) -> Result<Ref, StreamError> {
        if let Some(existing) = lookup(&self.constraints, constraint) {
            return Ok(existing);
        }

        let reference = match constraint.as_ref() {
            ConstraintSettings::Distance(s) => self.push(DISTANCE_CONSTRAINT, s)?,
            ConstraintSettings::Point(s) => self.push(POINT_CONSTRAINT, s)?,
            ConstraintSettings::Fixed(s) => self.push(FIXED_CONSTRAINT, s)?,
        };
        remember(&mut self.constraints, constraint, reference);
        Ok(reference)
    }

    /// Number of records emitted so far
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn push(&mut self, type_name: &str, data: &impl Serialize) -> Result<Ref, StreamError> {
        let id = self.records.len() as u32 + 1;
        self.records.push(Record {
            id,
            type_name: type_name.to_string(),
            data: serde_json::to_value(data)?,
        });
        Ok(Ref::new(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};
    use tessera_shared::{
        BodySettings, BoxShapeSettings, Color, CompoundShapeSettings, MotionType, ObjectLayer,
        SphereShapeSettings,
    };

    fn sphere() -> Arc<ShapeSettings> {
        ShapeSettings::from(SphereShapeSettings::new(0.5, None)).shared()
    }

    #[test]
    fn test_shared_shape_written_once() {
        let shared = sphere();
        let compound = ShapeSettings::StaticCompound(
            CompoundShapeSettings::new()
                .with_shape(Vec3::X, Quat::IDENTITY, shared.clone())
                .with_shape(-Vec3::X, Quat::IDENTITY, shared.clone()),
        )
        .shared();

        let mut out = ObjectStreamOut::new();
        let compound_ref = out.write_shape(&compound).unwrap();
        let again = out.write_shape(&shared).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(again, Ref::new(1));
        assert_eq!(compound_ref, Ref::new(2));
    }

    #[test]
    fn test_equal_but_distinct_shapes_written_twice() {
        let mut out = ObjectStreamOut::new();
        let a = out.write_shape(&sphere()).unwrap();
        let b = out.write_shape(&sphere()).unwrap();
        assert_ne!(a, b);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_dropped_objects_never_alias() {
        let mut out = ObjectStreamOut::new();
        let steel = out
            .write_material(&PhysicsMaterial::shared("steel", Color::WHITE))
            .unwrap();
        let rubber = out
            .write_material(&PhysicsMaterial::shared("rubber", Color::GREY))
            .unwrap();

        assert_ne!(steel, rubber);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_material_emitted_before_shape() {
        let material = PhysicsMaterial::shared("steel", Color::WHITE);
        let shape = ShapeSettings::from(BoxShapeSettings::new(
            Vec3::ONE,
            0.05,
            Some(material.clone()),
        ))
        .shared();

        let mut scene = PhysicsScene::new();
        scene.add_body(BodySettings::new(
            shape,
            Vec3::ZERO,
            Quat::IDENTITY,
            MotionType::Dynamic,
            ObjectLayer::MOVING,
        ));

        let document = ObjectStreamOut::new().write_scene(&scene).unwrap();
        let types: Vec<_> = document.objects.iter().map(|r| r.type_name.as_str()).collect();
        assert_eq!(types, vec![MATERIAL, "BoxShape", SCENE]);
        assert_eq!(document.root, 3);
        assert_eq!(document.objects[1].data["material"]["ref"], 1);
    }

    #[test]
    fn test_empty_scene_has_only_root() {
        let document = ObjectStreamOut::new()
            .write_scene(&PhysicsScene::new())
            .unwrap();
        assert_eq!(document.objects.len(), 1);
        assert_eq!(document.format, FORMAT_NAME);
        assert_eq!(document.version, FORMAT_VERSION);
    }
}
