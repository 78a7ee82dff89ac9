//! Stream round trips through text and files

use std::sync::Arc;

use glam::{Quat, Vec3};
use tessera_shared::{
    BodySettings, BoxShapeSettings, Color, CompoundShapeSettings, ConstraintSettings,
    DistanceConstraintSettings, HeightFieldShapeSettings, MotionType, NO_COLLISION_VALUE,
    ObjectLayer, PhysicsMaterial, PhysicsScene, RotatedTranslatedShapeSettings, ShapeSettings,
    SoftBodySettings, SoftBodySharedSettings, SphereShapeSettings, identity_key,
};
use tessera_stream::{StreamError, from_str, read_file, to_string, write_file};

// =============================================================================
// Fixtures
// =============================================================================

fn dynamic_body(shape: Arc<ShapeSettings>, y: f32) -> BodySettings {
    BodySettings::new(
        shape,
        Vec3::new(0.0, y, 0.0),
        Quat::IDENTITY,
        MotionType::Dynamic,
        ObjectLayer::MOVING,
    )
}

fn sphere(radius: f32) -> Arc<ShapeSettings> {
    ShapeSettings::from(SphereShapeSettings::new(radius, None)).shared()
}

/// A compound using one child twice, plus that child's sibling in a wrapper
fn sharing_scene() -> PhysicsScene {
    let steel = PhysicsMaterial::shared("steel", Color::rgb(200, 200, 210));
    let child = ShapeSettings::from(BoxShapeSettings::new(
        Vec3::splat(0.5),
        0.05,
        Some(steel),
    ))
    .shared();

    let compound = ShapeSettings::StaticCompound(
        CompoundShapeSettings::new()
            .with_shape(Vec3::X, Quat::IDENTITY, child.clone())
            .with_shape(-Vec3::X, Quat::IDENTITY, child.clone()),
    )
    .shared();
    let wrapper = ShapeSettings::from(RotatedTranslatedShapeSettings::new(
        Vec3::Y,
        Quat::from_rotation_z(0.25 * std::f32::consts::PI),
        child.clone(),
    ))
    .shared();

    let mut scene = PhysicsScene::new();
    scene.add_body(dynamic_body(child, 1.0));
    scene.add_body(dynamic_body(compound, 2.0));
    scene.add_body(dynamic_body(wrapper, 3.0));
    scene
}

fn soft_body_scene() -> PhysicsScene {
    let template = Arc::new(SoftBodySharedSettings::create_cube(3, 0.2));
    let mut scene = PhysicsScene::new();
    for x in [-1.0, 1.0] {
        scene.add_soft_body(SoftBodySettings::new(
            template.clone(),
            Vec3::new(x, 2.0, 0.0),
            Quat::IDENTITY,
            ObjectLayer::MOVING,
        ));
    }
    scene
}

fn first_child(shape: &ShapeSettings, index: usize) -> Arc<ShapeSettings> {
    shape.children()[index].clone()
}

// =============================================================================
// Identity
// =============================================================================

#[test]
fn test_shared_shape_identity_preserved() {
    let text = to_string(&sharing_scene(), true).unwrap();
    let scene = from_str(&text).unwrap();

    let bodies = scene.bodies();
    assert_eq!(bodies.len(), 3);

    let direct = bodies[0].shape.clone();
    let in_compound_a = first_child(&bodies[1].shape, 0);
    let in_compound_b = first_child(&bodies[1].shape, 1);
    let in_wrapper = first_child(&bodies[2].shape, 0);

    assert!(Arc::ptr_eq(&direct, &in_compound_a));
    assert!(Arc::ptr_eq(&in_compound_a, &in_compound_b));
    assert!(Arc::ptr_eq(&direct, &in_wrapper));
    assert_eq!(scene.distinct_shapes().len(), 3);
}

#[test]
fn test_shared_shape_written_once() {
    let text = to_string(&sharing_scene(), false).unwrap();
    assert_eq!(text.matches("\"BoxShape\"").count(), 1);
    assert_eq!(text.matches("\"PhysicsMaterial\"").count(), 1);
}

#[test]
fn test_equal_objects_stay_distinct() {
    let mut scene = PhysicsScene::new();
    scene.add_body(dynamic_body(sphere(0.5), 1.0));
    scene.add_body(dynamic_body(sphere(0.5), 2.0));

    let reloaded = from_str(&to_string(&scene, true).unwrap()).unwrap();
    let bodies = reloaded.bodies();
    assert!(!Arc::ptr_eq(&bodies[0].shape, &bodies[1].shape));
    assert_ne!(identity_key(&bodies[0].shape), identity_key(&bodies[1].shape));
}

#[test]
fn test_soft_body_template_shared_and_not_optimized() {
    let scene = soft_body_scene();
    assert_eq!(scene.optimize_soft_bodies(), 1);

    let text = to_string(&scene, true).unwrap();
    assert!(!text.contains("edge_groups"));

    let reloaded = from_str(&text).unwrap();
    let templates = reloaded.distinct_soft_body_templates();
    assert_eq!(templates.len(), 1);
    assert!(!templates[0].is_optimized());

    assert_eq!(reloaded.optimize_soft_bodies(), 1);
    assert_eq!(reloaded.optimize_soft_bodies(), 0);
}

// =============================================================================
// Values
// =============================================================================

#[test]
fn test_height_field_hole_survives() {
    let n = 4u32;
    let mut heights = vec![0.5; (n * n) as usize];
    heights[(2 * n + 2) as usize] = NO_COLLISION_VALUE;
    let material = PhysicsMaterial::shared("ground", Color::GREY);
    let field = HeightFieldShapeSettings::new(
        heights,
        Vec3::new(-2.0, 0.0, -2.0),
        Vec3::ONE,
        n,
        vec![0; 9],
        vec![material],
    );

    let mut scene = PhysicsScene::new();
    scene.add_body(BodySettings::new(
        ShapeSettings::from(field).shared(),
        Vec3::ZERO,
        Quat::IDENTITY,
        MotionType::Static,
        ObjectLayer::NON_MOVING,
    ));

    let reloaded = from_str(&to_string(&scene, false).unwrap()).unwrap();
    let ShapeSettings::HeightField(field) = reloaded.bodies()[0].shape.as_ref() else {
        panic!("expected a height field");
    };
    assert_eq!(field.height(2, 2), Some(NO_COLLISION_VALUE));
    assert_eq!(field.holes(), vec![(2, 2)]);
    assert!(field.material_at(1, 1).is_none());
    assert!(field.material_at(0, 0).is_some());
}

#[test]
fn test_body_fields_survive() {
    let mut body = dynamic_body(sphere(0.25), 4.0);
    body.rotation = Quat::from_rotation_y(0.5);
    body.friction = 0.7;
    body.restitution = 0.3;
    body.allow_sleeping = false;
    body.user_data = 42;

    let mut scene = PhysicsScene::new();
    scene.add_body(body);
    scene.add_body(dynamic_body(sphere(0.25), 5.0));
    scene.add_constraint(
        Arc::new(ConstraintSettings::from(DistanceConstraintSettings::default())),
        0,
        1,
    );

    let reloaded = from_str(&to_string(&scene, true).unwrap()).unwrap();
    let body = &reloaded.bodies()[0];
    assert_eq!(body.position, Vec3::new(0.0, 4.0, 0.0));
    assert!(body.rotation.abs_diff_eq(Quat::from_rotation_y(0.5), 1e-6));
    assert_eq!(body.friction, 0.7);
    assert_eq!(body.restitution, 0.3);
    assert!(!body.allow_sleeping);
    assert_eq!(body.user_data, 42);

    let constraint = &reloaded.constraints()[0];
    assert_eq!((constraint.body_a, constraint.body_b), (0, 1));
    assert!(matches!(
        constraint.settings.as_ref(),
        ConstraintSettings::Distance(d) if d.min_distance < 0.0
    ));
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.json");

    write_file(&path, &sharing_scene(), true).unwrap();
    let scene = read_file(&path).unwrap();
    assert_eq!(scene.bodies().len(), 3);

    let stats = tessera_stream::inspect(std::fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(stats.count("BoxShape"), 1);
    assert_eq!(stats.count("PhysicsScene"), 1);
    assert!(stats.shared_objects >= 1);
}

#[test]
fn test_text_matches_writer_output() {
    let mut scene = sharing_scene();
    let acier = PhysicsMaterial::shared("acier trempé ✓", Color::WHITE);
    let shape = ShapeSettings::from(BoxShapeSettings::new(Vec3::ONE, 0.05, Some(acier))).shared();
    scene.add_body(dynamic_body(shape, 4.0));

    for pretty in [true, false] {
        let text = to_string(&scene, pretty).unwrap();
        let mut bytes = Vec::new();
        tessera_stream::write_scene(&mut bytes, &scene, pretty).unwrap();
        assert_eq!(text.as_bytes(), bytes.as_slice());
        assert!(text.contains("acier trempé ✓"));
    }

    let reloaded = from_str(&to_string(&scene, false).unwrap()).unwrap();
    let ShapeSettings::Box(shape) = reloaded.bodies()[3].shape.as_ref() else {
        panic!("expected a box");
    };
    assert_eq!(
        shape.material.as_ref().map(|m| m.name.as_str()),
        Some("acier trempé ✓")
    );
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_unknown_type_rejected() {
    let text = r#"{
        "format": "tessera-scene",
        "version": 1,
        "objects": [
            { "id": 1, "type": "TeapotShape", "data": {} },
            { "id": 2, "type": "PhysicsScene", "data": { "bodies": [], "soft_bodies": [], "constraints": [] } }
        ],
        "root": 2
    }"#;
    assert!(matches!(from_str(text), Err(StreamError::UnknownType { id: 1, .. })));
}

#[test]
fn test_dangling_reference_rejected() {
    let text = r#"{
        "format": "tessera-scene",
        "version": 1,
        "objects": [
            { "id": 1, "type": "SphereShape", "data": { "radius": 0.5 } },
            { "id": 2, "type": "ScaledShape", "data": { "scale": [1, 1, 1], "inner": { "ref": 9 } } }
        ],
        "root": 2
    }"#;
    assert!(matches!(
        from_str(text),
        Err(StreamError::DanglingReference { id: 2, reference: 9 })
    ));
}

#[test]
fn test_invalid_scene_rejected() {
    let text = r#"{
        "format": "tessera-scene",
        "version": 1,
        "objects": [
            { "id": 1, "type": "FixedConstraint", "data": { "auto_detect_point": true } },
            { "id": 2, "type": "PhysicsScene", "data": {
                "bodies": [],
                "soft_bodies": [],
                "constraints": [ { "settings": { "ref": 1 }, "body_a": 0, "body_b": 1 } ]
            } }
        ],
        "root": 2
    }"#;
    assert!(matches!(from_str(text), Err(StreamError::InvalidScene(_))));
}

#[test]
fn test_wrong_format_rejected() {
    let text = r#"{ "format": "something-else", "version": 1, "objects": [], "root": 1 }"#;
    assert!(matches!(
        from_str(text),
        Err(StreamError::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_truncated_text_rejected() {
    let text = to_string(&sharing_scene(), true).unwrap();
    let truncated = &text[..text.len() / 2];
    assert!(matches!(from_str(truncated), Err(StreamError::Json(_))));
}
