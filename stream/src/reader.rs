//! Stream reader
//!
//! [`ObjectStreamIn`] decodes records strictly in order. Each record type has one
//! decoder in [`DECODERS`]; a decoder turns the JSON payload into a settings value
//! and resolves its references against objects decoded earlier. Resolving a
//! reference hands out a clone of the already decoded `Arc`, so objects shared
//! when written are shared again after reading.

use std::sync::Arc;

use hashbrown::HashMap;
use serde::de::DeserializeOwned;
use tessera_shared::{
    BodySettings, BoxShapeSettings, CapsuleShapeSettings, CompoundShapeSettings, ConstraintEntry,
    ConstraintSettings, ConvexHullShapeSettings, CylinderShapeSettings,
    DistanceConstraintSettings, EmptyShapeSettings, FixedConstraintSettings,
    HeightFieldShapeSettings, MeshShapeSettings, PhysicsMaterial, PhysicsScene,
    PointConstraintSettings, RotatedTranslatedShapeSettings, ScaledShapeSettings, ShapeSettings,
    SoftBodySettings, SoftBodySharedSettings, SphereShapeSettings, SubShape,
    TaperedCapsuleShapeSettings, TaperedCylinderShapeSettings, TriangleShapeSettings,
};
use tracing::debug;

use crate::error::StreamError;
use crate::record::*;

/// A decoded object, kept until the end of the stream so later records can
/// reference it
#[derive(Clone, Debug)]
enum Decoded {
    Material(Arc<PhysicsMaterial>),
    Shape(Arc<ShapeSettings>),
    SoftBodyTemplate(Arc<SoftBodySharedSettings>),
    Constraint(Arc<ConstraintSettings>),
    Scene(Box<PhysicsScene>),
}

impl Decoded {
    fn kind_name(&self) -> &'static str {
        match self {
            Decoded::Material(_) => "material",
            Decoded::Shape(_) => "shape",
            Decoded::SoftBodyTemplate(_) => "soft body template",
            Decoded::Constraint(_) => "constraint",
            Decoded::Scene(_) => "scene",
        }
    }
}

/// Decoding context for one record
struct Resolver<'a> {
    objects: &'a HashMap<u32, Decoded>,
    id: u32,
    type_name: &'a str,
}

impl Resolver<'_> {
    fn parse<T: DeserializeOwned>(&self, data: serde_json::Value) -> Result<T, StreamError> {
        serde_json::from_value(data).map_err(|source| StreamError::Malformed {
            id: self.id,
            type_name: self.type_name.to_string(),
            source,
        })
    }

    fn lookup(&self, reference: Ref) -> Result<&Decoded, StreamError> {
        self.objects
            .get(&reference.id)
            .ok_or(StreamError::DanglingReference {
                id: self.id,
                reference: reference.id,
            })
    }

    fn wrong_kind(&self, reference: Ref, expected: &'static str, found: &Decoded) -> StreamError {
        StreamError::WrongReferenceKind {
            id: self.id,
            reference: reference.id,
            expected,
            found: found.kind_name(),
        }
    }

    fn material(&self, reference: Ref) -> Result<Arc<PhysicsMaterial>, StreamError> {
        match self.lookup(reference)? {
            Decoded::Material(material) => Ok(material.clone()),
            other => Err(self.wrong_kind(reference, "material", other)),
        }
    }

    fn optional_material(
        &self,
        reference: Option<Ref>,
    ) -> Result<Option<Arc<PhysicsMaterial>>, StreamError> {
        reference.map(|r| self.material(r)).transpose()
    }

    fn materials(&self, references: &[Ref]) -> Result<Vec<Arc<PhysicsMaterial>>, StreamError> {
        references.iter().map(|&r| self.material(r)).collect()
    }

    fn shape(&self, reference: Ref) -> Result<Arc<ShapeSettings>, StreamError> {
        match self.lookup(reference)? {
            Decoded::Shape(shape) => Ok(shape.clone()),
            other => Err(self.wrong_kind(reference, "shape", other)),
        }
    }

    fn soft_body_template(
        &self,
        reference: Ref,
    ) -> Result<Arc<SoftBodySharedSettings>, StreamError> {
        match self.lookup(reference)? {
            Decoded::SoftBodyTemplate(template) => Ok(template.clone()),
            other => Err(self.wrong_kind(reference, "soft body template", other)),
        }
    }

    fn constraint(&self, reference: Ref) -> Result<Arc<ConstraintSettings>, StreamError> {
        match self.lookup(reference)? {
            Decoded::Constraint(constraint) => Ok(constraint.clone()),
            other => Err(self.wrong_kind(reference, "constraint", other)),
        }
    }
}

type Decoder = fn(&Resolver<'_>, serde_json::Value) -> Result<Decoded, StreamError>;

/// Record type name → decoder
const DECODERS: &[(&str, Decoder)] = &[
    (MATERIAL, decode_material),
    ("MeshShape", decode_mesh),
    ("HeightFieldShape", decode_height_field),
    ("BoxShape", decode_box),
    ("SphereShape", decode_sphere),
    ("CapsuleShape", decode_capsule),
    ("TaperedCapsuleShape", decode_tapered_capsule),
    ("CylinderShape", decode_cylinder),
    ("TaperedCylinderShape", decode_tapered_cylinder),
    ("EmptyShape", decode_empty),
    ("StaticCompoundShape", decode_static_compound),
    ("MutableCompoundShape", decode_mutable_compound),
    ("ConvexHullShape", decode_convex_hull),
    ("RotatedTranslatedShape", decode_rotated_translated),
    ("ScaledShape", decode_scaled),
    ("TriangleShape", decode_triangle),
    (SOFT_BODY_TEMPLATE, decode_soft_body_template),
    (DISTANCE_CONSTRAINT, decode_distance_constraint),
    (POINT_CONSTRAINT, decode_point_constraint),
    (FIXED_CONSTRAINT, decode_fixed_constraint),
    (SCENE, decode_scene),
];

fn decoder_for(type_name: &str) -> Option<Decoder> {
    DECODERS
        .iter()
        .find(|(name, _)| *name == type_name)
        .map(|&(_, decoder)| decoder)
}

/// Rebuilds a scene from stream records
#[derive(Default)]
pub struct ObjectStreamIn {
    objects: HashMap<u32, Decoded>,
    last_id: Option<u32>,
}

impl ObjectStreamIn {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a whole document and validate the resulting scene
    pub fn read_document(document: Document) -> Result<PhysicsScene, StreamError> {
        if document.format != FORMAT_NAME || document.version != FORMAT_VERSION {
            return Err(StreamError::UnsupportedFormat {
                format: document.format,
                version: document.version,
            });
        }

        let mut stream = Self::new();
        for record in document.objects {
            stream.read_record(record)?;
        }
        stream.finish(document.root)
    }

    /// Decode the next record
    pub fn read_record(&mut self, record: Record) -> Result<(), StreamError> {
        if let Some(previous) = self.last_id {
            if record.id <= previous {
                return Err(StreamError::OutOfOrder {
                    id: record.id,
                    previous,
                });
            }
        }

        let decoder = decoder_for(&record.type_name).ok_or_else(|| StreamError::UnknownType {
            id: record.id,
            type_name: record.type_name.clone(),
        })?;

        let resolver = Resolver {
            objects: &self.objects,
            id: record.id,
            type_name: &record.type_name,
        };
        let decoded = decoder(&resolver, record.data)?;

        debug!(id = record.id, kind = decoded.kind_name(), "object decoded");
        self.objects.insert(record.id, decoded);
        self.last_id = Some(record.id);
        Ok(())
    }

    /// Number of objects decoded so far
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Take the root scene out of the stream and validate it
    pub fn finish(mut self, root: u32) -> Result<PhysicsScene, StreamError> {
        let scene = match self.objects.remove(&root) {
            Some(Decoded::Scene(scene)) => *scene,
            Some(other) => {
                return Err(StreamError::RootNotScene {
                    root,
                    found: other.kind_name(),
                });
            }
            None => return Err(StreamError::MissingRoot(root)),
        };

        scene.validate()?;
        Ok(scene)
    }
}

// =============================================================================
// Decoders
// =============================================================================

fn decode_material(ctx: &Resolver<'_>, data: serde_json::Value) -> Result<Decoded, StreamError> {
    let data: MaterialData = ctx.parse(data)?;
    Ok(Decoded::Material(PhysicsMaterial::shared(data.name, data.color)))
}

fn shape(settings: impl Into<ShapeSettings>) -> Result<Decoded, StreamError> {
    Ok(Decoded::Shape(settings.into().shared()))
}

fn decode_mesh(ctx: &Resolver<'_>, data: serde_json::Value) -> Result<Decoded, StreamError> {
    let data: MeshData = ctx.parse(data)?;
    shape(MeshShapeSettings::new(data.triangles, ctx.materials(&data.materials)?))
}

fn decode_height_field(ctx: &Resolver<'_>, data: serde_json::Value) -> Result<Decoded, StreamError> {
    let data: HeightFieldData = ctx.parse(data)?;
    shape(HeightFieldShapeSettings::new(
        data.height_samples,
        data.offset,
        data.scale,
        data.sample_count,
        data.material_indices,
        ctx.materials(&data.materials)?,
    ))
}

fn decode_box(ctx: &Resolver<'_>, data: serde_json::Value) -> Result<Decoded, StreamError> {
    let data: BoxData = ctx.parse(data)?;
    shape(BoxShapeSettings::new(
        data.half_extent,
        data.convex_radius,
        ctx.optional_material(data.material)?,
    ))
}

fn decode_sphere(ctx: &Resolver<'_>, data: serde_json::Value) -> Result<Decoded, StreamError> {
    let data: SphereData = ctx.parse(data)?;
    shape(SphereShapeSettings::new(
        data.radius,
        ctx.optional_material(data.material)?,
    ))
}

fn decode_capsule(ctx: &Resolver<'_>, data: serde_json::Value) -> Result<Decoded, StreamError> {
    let data: CapsuleData = ctx.parse(data)?;
    shape(CapsuleShapeSettings::new(
        data.half_height_of_cylinder,
        data.radius,
        ctx.optional_material(data.material)?,
    ))
}

fn decode_tapered_capsule(
    ctx: &Resolver<'_>,
    data: serde_json::Value,
) -> Result<Decoded, StreamError> {
    let data: TaperedCapsuleData = ctx.parse(data)?;
    shape(TaperedCapsuleShapeSettings::new(
        data.half_height_of_tapered_cylinder,
        data.top_radius,
        data.bottom_radius,
        ctx.optional_material(data.material)?,
    ))
}

fn decode_cylinder(ctx: &Resolver<'_>, data: serde_json::Value) -> Result<Decoded, StreamError> {
    let data: CylinderData = ctx.parse(data)?;
    shape(CylinderShapeSettings::new(
        data.half_height,
        data.radius,
        data.convex_radius,
        ctx.optional_material(data.material)?,
    ))
}

fn decode_tapered_cylinder(
    ctx: &Resolver<'_>,
    data: serde_json::Value,
) -> Result<Decoded, StreamError> {
    let data: TaperedCylinderData = ctx.parse(data)?;
    shape(TaperedCylinderShapeSettings::new(
        data.half_height,
        data.top_radius,
        data.bottom_radius,
        data.convex_radius,
        ctx.optional_material(data.material)?,
    ))
}

fn decode_empty(ctx: &Resolver<'_>, data: serde_json::Value) -> Result<Decoded, StreamError> {
    let data: EmptyData = ctx.parse(data)?;
    shape(EmptyShapeSettings {
        center_of_mass: data.center_of_mass,
    })
}

fn compound(ctx: &Resolver<'_>, data: serde_json::Value) -> Result<CompoundShapeSettings, StreamError> {
    let data: CompoundData = ctx.parse(data)?;
    let mut compound = CompoundShapeSettings::new();
    for sub in data.sub_shapes {
        compound.sub_shapes.push(SubShape {
            position: sub.position,
            rotation: sub.rotation,
            shape: ctx.shape(sub.shape)?,
            user_data: sub.user_data,
        });
    }
    Ok(compound)
}

fn decode_static_compound(
    ctx: &Resolver<'_>,
    data: serde_json::Value,
) -> Result<Decoded, StreamError> {
    Ok(Decoded::Shape(
        ShapeSettings::StaticCompound(compound(ctx, data)?).shared(),
    ))
}

fn decode_mutable_compound(
    ctx: &Resolver<'_>,
    data: serde_json::Value,
) -> Result<Decoded, StreamError> {
    Ok(Decoded::Shape(
        ShapeSettings::MutableCompound(compound(ctx, data)?).shared(),
    ))
}

fn decode_convex_hull(ctx: &Resolver<'_>, data: serde_json::Value) -> Result<Decoded, StreamError> {
    let data: ConvexHullData = ctx.parse(data)?;
    shape(ConvexHullShapeSettings::new(
        data.points,
        data.max_convex_radius,
        ctx.optional_material(data.material)?,
    ))
}

fn decode_rotated_translated(
    ctx: &Resolver<'_>,
    data: serde_json::Value,
) -> Result<Decoded, StreamError> {
    let data: RotatedTranslatedData = ctx.parse(data)?;
    shape(RotatedTranslatedShapeSettings::new(
        data.position,
        data.rotation,
        ctx.shape(data.inner)?,
    ))
}

fn decode_scaled(ctx: &Resolver<'_>, data: serde_json::Value) -> Result<Decoded, StreamError> {
    let data: ScaledData = ctx.parse(data)?;
    shape(ScaledShapeSettings::new(ctx.shape(data.inner)?, data.scale))
}

fn decode_triangle(ctx: &Resolver<'_>, data: serde_json::Value) -> Result<Decoded, StreamError> {
    let data: TriangleData = ctx.parse(data)?;
    let [v1, v2, v3] = data.vertices;
    shape(TriangleShapeSettings::new(
        v1,
        v2,
        v3,
        data.convex_radius,
        ctx.optional_material(data.material)?,
    ))
}

fn decode_soft_body_template(
    ctx: &Resolver<'_>,
    data: serde_json::Value,
) -> Result<Decoded, StreamError> {
    let data: SoftBodyTemplateData = ctx.parse(data)?;
    let template = SoftBodySharedSettings::new(
        data.vertices,
        data.faces,
        data.edges,
        data.volumes,
        ctx.materials(&data.materials)?,
    );
    Ok(Decoded::SoftBodyTemplate(Arc::new(template)))
}

fn decode_distance_constraint(
    ctx: &Resolver<'_>,
    data: serde_json::Value,
) -> Result<Decoded, StreamError> {
    let settings: DistanceConstraintSettings = ctx.parse(data)?;
    Ok(Decoded::Constraint(Arc::new(settings.into())))
}

fn decode_point_constraint(
    ctx: &Resolver<'_>,
    data: serde_json::Value,
) -> Result<Decoded, StreamError> {
    let settings: PointConstraintSettings = ctx.parse(data)?;
    Ok(Decoded::Constraint(Arc::new(settings.into())))
}

fn decode_fixed_constraint(
    ctx: &Resolver<'_>,
    data: serde_json::Value,
) -> Result<Decoded, StreamError> {
    let settings: FixedConstraintSettings = ctx.parse(data)?;
    Ok(Decoded::Constraint(Arc::new(settings.into())))
}

fn decode_scene(ctx: &Resolver<'_>, data: serde_json::Value) -> Result<Decoded, StreamError> {
    let data: SceneData = ctx.parse(data)?;

    let mut bodies = Vec::with_capacity(data.bodies.len());
    for body in data.bodies {
        let mut settings = BodySettings::new(
            ctx.shape(body.shape)?,
            body.position,
            body.rotation,
            body.motion_type,
            body.layer,
        );
        settings.friction = body.friction;
        settings.restitution = body.restitution;
        settings.linear_damping = body.linear_damping;
        settings.angular_damping = body.angular_damping;
        settings.gravity_factor = body.gravity_factor;
        settings.allow_sleeping = body.allow_sleeping;
        settings.user_data = body.user_data;
        bodies.push(settings);
    }

    let mut soft_bodies = Vec::with_capacity(data.soft_bodies.len());
    for soft_body in data.soft_bodies {
        let mut settings = SoftBodySettings::new(
            ctx.soft_body_template(soft_body.settings)?,
            soft_body.position,
            soft_body.rotation,
            soft_body.layer,
        );
        settings.pressure = soft_body.pressure;
        settings.num_iterations = soft_body.num_iterations;
        settings.linear_damping = soft_body.linear_damping;
        settings.friction = soft_body.friction;
        settings.gravity_factor = soft_body.gravity_factor;
        soft_bodies.push(settings);
    }

    let mut constraints = Vec::with_capacity(data.constraints.len());
    for entry in data.constraints {
        constraints.push(ConstraintEntry {
            settings: ctx.constraint(entry.settings)?,
            body_a: entry.body_a,
            body_b: entry.body_b,
        });
    }

    Ok(Decoded::Scene(Box::new(PhysicsScene::from_parts(
        bodies,
        soft_bodies,
        constraints,
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tessera_shared::ShapeKind;

    fn record(id: u32, type_name: &str, data: serde_json::Value) -> Record {
        Record {
            id,
            type_name: type_name.to_string(),
            data,
        }
    }

    #[test]
    fn test_every_shape_kind_has_decoder() {
        for kind in ShapeKind::ALL {
            assert!(
                decoder_for(shape_type_name(kind)).is_some(),
                "no decoder for {kind}"
            );
        }
    }

    #[test]
    fn test_unknown_type_fails() {
        let mut stream = ObjectStreamIn::new();
        let err = stream
            .read_record(record(1, "Teapot", json!({})))
            .unwrap_err();
        assert!(matches!(err, StreamError::UnknownType { id: 1, .. }));
    }

    #[test]
    fn test_forward_reference_fails() {
        let mut stream = ObjectStreamIn::new();
        let err = stream
            .read_record(record(
                1,
                "ScaledShape",
                json!({ "scale": [1.0, 1.0, 1.0], "inner": { "ref": 2 } }),
            ))
            .unwrap_err();
        assert!(matches!(
            err,
            StreamError::DanglingReference {
                id: 1,
                reference: 2
            }
        ));
    }

    #[test]
    fn test_wrong_reference_kind_fails() {
        let mut stream = ObjectStreamIn::new();
        stream
            .read_record(record(
                1,
                MATERIAL,
                json!({ "name": "m", "color": { "r": 1, "g": 2, "b": 3, "a": 255 } }),
            ))
            .unwrap();
        let err = stream
            .read_record(record(
                2,
                "ScaledShape",
                json!({ "scale": [1.0, 1.0, 1.0], "inner": { "ref": 1 } }),
            ))
            .unwrap_err();
        assert!(matches!(
            err,
            StreamError::WrongReferenceKind {
                expected: "shape",
                found: "material",
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_id_fails() {
        let mut stream = ObjectStreamIn::new();
        let sphere = json!({ "radius": 1.0 });
        stream.read_record(record(1, "SphereShape", sphere.clone())).unwrap();
        let err = stream.read_record(record(1, "SphereShape", sphere)).unwrap_err();
        assert!(matches!(err, StreamError::OutOfOrder { id: 1, previous: 1 }));
    }

    #[test]
    fn test_malformed_payload_fails() {
        let mut stream = ObjectStreamIn::new();
        let err = stream
            .read_record(record(1, "SphereShape", json!({ "radius": "big" })))
            .unwrap_err();
        assert!(matches!(err, StreamError::Malformed { id: 1, .. }));
    }

    #[test]
    fn test_shared_reference_resolves_to_same_arc() {
        let mut stream = ObjectStreamIn::new();
        stream
            .read_record(record(1, "SphereShape", json!({ "radius": 0.5 })))
            .unwrap();
        stream
            .read_record(record(
                2,
                "StaticCompoundShape",
                json!({ "sub_shapes": [
                    { "position": [1.0, 0.0, 0.0], "rotation": [0.0, 0.0, 0.0, 1.0], "shape": { "ref": 1 } },
                    { "position": [-1.0, 0.0, 0.0], "rotation": [0.0, 0.0, 0.0, 1.0], "shape": { "ref": 1 } },
                ] }),
            ))
            .unwrap();

        let Some(Decoded::Shape(compound)) = stream.objects.get(&2) else {
            panic!("compound not decoded");
        };
        let children = compound.children();
        assert!(Arc::ptr_eq(children[0], children[1]));
    }

    #[test]
    fn test_missing_root_fails() {
        let stream = ObjectStreamIn::new();
        assert!(matches!(stream.finish(4), Err(StreamError::MissingRoot(4))));
    }

    #[test]
    fn test_root_must_be_scene() {
        let mut stream = ObjectStreamIn::new();
        stream
            .read_record(record(1, "SphereShape", json!({ "radius": 0.5 })))
            .unwrap();
        assert!(matches!(
            stream.finish(1),
            Err(StreamError::RootNotScene { root: 1, found: "shape" })
        ));
    }

    #[test]
    fn test_unsupported_version_fails() {
        let document = Document {
            format: FORMAT_NAME.to_string(),
            version: FORMAT_VERSION + 1,
            objects: Vec::new(),
            root: 1,
        };
        assert!(matches!(
            ObjectStreamIn::read_document(document),
            Err(StreamError::UnsupportedFormat { .. })
        ));
    }
}
