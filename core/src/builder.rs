//! Reference scene assembly
//!
//! [`ReferenceSceneBuilder`] appends terrain, one body per primitive shape kind,
//! compounds, convex hulls, a constraint and soft bodies to a [`PhysicsScene`].
//! Colors and spawn heights come from explicit allocators owned by the builder,
//! so two builds with the same configuration produce the same scene.
//!
//! Three objects are deliberately shared: the sub-compound used twice inside the
//! static compound, the convex hull used directly and inside a rotated/translated
//! wrapper, and the soft cube template used by two soft bodies.

use std::f32::consts::PI;
use std::sync::Arc;

use glam::{Quat, Vec3};
use proc_gen::{ColorSequence, PerlinField, TerrainParams, build_height_field, build_mesh};
use tessera_shared::{
    BodySettings, BoxShapeSettings, CapsuleShapeSettings, Color, CompoundShapeSettings,
    ConstraintSettings, ConstraintSpace, ConvexHullShapeSettings, CylinderShapeSettings,
    DEFAULT_CONVEX_RADIUS, DistanceConstraintSettings, EmptyShapeSettings, MotionType,
    ObjectLayer, PhysicsMaterial, PhysicsScene, RotatedTranslatedShapeSettings,
    ScaledShapeSettings, ShapeSettings, SoftBodySettings, SoftBodySharedSettings,
    SphereShapeSettings, TaperedCapsuleShapeSettings, TaperedCylinderShapeSettings,
    TriangleShapeSettings,
};
use tracing::{debug, info};

use crate::config::{Config, TerrainConfig};

/// Position of the height-field body, clear of the scaled mesh floor
pub const HEIGHT_FIELD_POSITION: Vec3 = Vec3::new(50.0, 0.0, 0.0);

/// Non-uniform scale applied to the mesh floor
pub const MESH_SCALE: Vec3 = Vec3::new(2.5, 1.0, 1.5);

/// Pressure of the soft sphere
pub const SOFT_SPHERE_PRESSURE: f32 = 2000.0;

/// Hands out material colors in sequence
#[derive(Debug, Default)]
pub struct ColorAllocator {
    sequence: ColorSequence,
}

impl ColorAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_color(&mut self) -> Color {
        self.sequence.next_color()
    }

    /// Number of colors handed out so far
    pub fn issued(&self) -> u32 {
        self.sequence.issued()
    }
}

/// Hands out spawn positions one unit apart on Y.
///
/// The position is advanced before it is returned, so the first position is one
/// step above the start.
#[derive(Clone, Copy, Debug)]
pub struct PositionAllocator {
    current: Vec3,
    step: Vec3,
}

impl PositionAllocator {
    pub fn new(start: Vec3) -> Self {
        Self {
            current: start,
            step: Vec3::Y,
        }
    }

    pub fn next_position(&mut self) -> Vec3 {
        self.current += self.step;
        self.current
    }
}

/// Appends the parts of the reference scene.
///
/// Each `add_*` method appends to the scene in call order. Constraint ordinals
/// refer to bodies already added.
pub struct ReferenceSceneBuilder {
    scene: PhysicsScene,
    terrain: TerrainConfig,
    colors: ColorAllocator,
    positions: PositionAllocator,
}

impl ReferenceSceneBuilder {
    pub fn new(terrain: TerrainConfig) -> Self {
        let positions = PositionAllocator::new(Vec3::new(0.0, terrain.max_height, 0.0));
        Self {
            scene: PhysicsScene::new(),
            terrain,
            colors: ColorAllocator::new(),
            positions,
        }
    }

    /// Number of rigid bodies added so far
    pub fn body_count(&self) -> u32 {
        self.scene.bodies().len() as u32
    }

    /// Static mesh terrain, scaled by [`MESH_SCALE`], at the origin
    pub fn add_mesh_terrain(&mut self) -> &mut Self {
        let params = TerrainParams {
            grid: self.terrain.mesh_grid,
            cell_size: self.terrain.mesh_cell_size,
            max_height: self.terrain.max_height,
            rim_height: self.terrain.rim_height,
            noise_period: self.terrain.noise_period,
        };
        let mesh = build_mesh(&params, &PerlinField::new(self.terrain.noise_seed));
        debug!(
            triangles = mesh.triangles.len(),
            materials = mesh.materials.len(),
            "mesh terrain generated"
        );

        let shape = ShapeSettings::from(mesh.into_settings()).shared();
        let scaled = ShapeSettings::from(ScaledShapeSettings::new(shape, MESH_SCALE)).shared();
        self.add_static(scaled, Vec3::ZERO, Quat::IDENTITY)
    }

    /// Static height field at [`HEIGHT_FIELD_POSITION`], with one hole
    pub fn add_height_field(&mut self) -> &mut Self {
        let params = TerrainParams {
            grid: self.terrain.height_field_grid,
            cell_size: self.terrain.height_field_cell_size,
            max_height: self.terrain.max_height,
            rim_height: 0.0,
            noise_period: self.terrain.noise_period,
        };
        let field = build_height_field(&params, &PerlinField::new(self.terrain.noise_seed));
        debug!(
            samples = field.sample_count,
            materials = field.materials.len(),
            "height field generated"
        );

        let shape = ShapeSettings::from(field.into_settings()).shared();
        self.add_static(shape, HEIGHT_FIELD_POSITION, Quat::IDENTITY)
    }

    /// One body per primitive shape kind, stacked upwards.
    ///
    /// The triangle is static; it has no volume to simulate.
    pub fn add_primitives(&mut self) -> &mut Self {
        let material = self.material("Triangle Material");
        let triangle = ShapeSettings::from(TriangleShapeSettings::new(
            Vec3::new(-2.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            0.0,
            Some(material),
        ))
        .shared();
        let position = self.positions.next_position();
        self.add_static(triangle, position, Quat::from_rotation_x(0.5 * PI));

        let material = self.material("Sphere Material");
        let sphere = ShapeSettings::from(SphereShapeSettings::new(0.2, Some(material)));
        self.add_stacked(sphere.shared(), Quat::IDENTITY);

        let material = self.material("Box Material");
        let cube = ShapeSettings::from(BoxShapeSettings::new(
            Vec3::new(0.2, 0.2, 0.4),
            0.01,
            Some(material),
        ));
        self.add_stacked(cube.shared(), Quat::IDENTITY);

        let material = self.material("Capsule Material");
        let capsule = ShapeSettings::from(CapsuleShapeSettings::new(1.5, 0.2, Some(material)));
        self.add_stacked(capsule.shared(), Quat::from_rotation_x(0.5 * PI));

        let material = self.material("Tapered Capsule Material");
        let tapered_capsule = ShapeSettings::from(TaperedCapsuleShapeSettings::new(
            0.5,
            0.1,
            0.2,
            Some(material),
        ));
        self.add_stacked(tapered_capsule.shared(), Quat::from_rotation_z(0.5 * PI));

        let material = self.material("Cylinder Material");
        let cylinder = ShapeSettings::from(CylinderShapeSettings::new(
            0.5,
            0.2,
            DEFAULT_CONVEX_RADIUS,
            Some(material),
        ));
        self.add_stacked(cylinder.shared(), Quat::from_rotation_x(0.5 * PI));

        let material = self.material("Tapered Cylinder Material");
        let tapered_cylinder = ShapeSettings::from(TaperedCylinderShapeSettings::new(
            0.5,
            0.2,
            0.4,
            DEFAULT_CONVEX_RADIUS,
            Some(material),
        ));
        self.add_stacked(tapered_cylinder.shared(), Quat::from_rotation_x(0.5 * PI));

        let material = self.material("Cone Material");
        let cone = ShapeSettings::from(TaperedCylinderShapeSettings::cone(0.5, 0.4, Some(material)));
        self.add_stacked(cone.shared(), Quat::from_rotation_x(0.5 * PI));

        let empty = ShapeSettings::from(EmptyShapeSettings::default());
        self.add_stacked(empty.shared(), Quat::IDENTITY)
    }

    /// Static compound holding one sub-compound at two local transforms
    pub fn add_static_compound(&mut self) -> &mut Self {
        let box_material = self.material("Compound Box Material");
        let cylinder_material = self.material("Compound Cylinder Material");
        let capsule_material = self.material("Compound Tapered Capsule Material");

        let sub_compound = ShapeSettings::StaticCompound(
            CompoundShapeSettings::new()
                .with_shape(
                    Vec3::new(0.0, 0.5, 0.0),
                    Quat::from_rotation_z(0.5 * PI),
                    ShapeSettings::from(BoxShapeSettings::new(
                        Vec3::new(0.5, 0.1, 0.2),
                        DEFAULT_CONVEX_RADIUS,
                        Some(box_material),
                    ))
                    .shared(),
                )
                .with_shape(
                    Vec3::new(0.5, 0.0, 0.0),
                    Quat::from_rotation_z(0.5 * PI),
                    ShapeSettings::from(CylinderShapeSettings::new(
                        0.5,
                        0.2,
                        DEFAULT_CONVEX_RADIUS,
                        Some(cylinder_material),
                    ))
                    .shared(),
                )
                .with_shape(
                    Vec3::new(0.0, 0.0, 0.5),
                    Quat::from_rotation_x(0.5 * PI),
                    ShapeSettings::from(TaperedCapsuleShapeSettings::new(
                        0.5,
                        0.1,
                        0.2,
                        Some(capsule_material),
                    ))
                    .shared(),
                ),
        )
        .shared();

        let compound = ShapeSettings::StaticCompound(
            CompoundShapeSettings::new()
                .with_shape(
                    Vec3::ZERO,
                    Quat::from_rotation_x(-0.25 * PI) * Quat::from_rotation_z(0.25 * PI),
                    sub_compound.clone(),
                )
                .with_shape(
                    Vec3::new(0.0, -0.1, 0.0),
                    Quat::from_rotation_x(0.25 * PI) * Quat::from_rotation_z(-0.75 * PI),
                    sub_compound,
                ),
        );
        self.add_stacked(compound.shared(), Quat::from_rotation_z(0.5 * PI))
    }

    /// A tetrahedral hull, then the same hull inside a rotated/translated shape
    pub fn add_convex_hulls(&mut self) -> &mut Self {
        let material = self.material("Convex Hull Material");
        let hull = ShapeSettings::from(ConvexHullShapeSettings::new(
            vec![
                Vec3::new(-0.5, 0.0, -0.5),
                Vec3::new(0.0, 0.0, 0.5),
                Vec3::new(0.5, 0.0, -0.5),
                Vec3::new(0.0, -0.5, 0.0),
            ],
            DEFAULT_CONVEX_RADIUS,
            Some(material),
        ))
        .shared();
        self.add_stacked(hull.clone(), Quat::IDENTITY);

        let wrapped = ShapeSettings::from(RotatedTranslatedShapeSettings::new(
            Vec3::splat(0.5),
            Quat::from_rotation_z(0.25 * PI),
            hull,
        ));
        self.add_stacked(wrapped.shared(), Quat::IDENTITY)
    }

    /// Mutable compound with three independent children
    pub fn add_mutable_compound(&mut self) -> &mut Self {
        let box_material = self.material("MutableCompound Box Material");
        let capsule_material = self.material("MutableCompound Capsule Material");
        let tapered_material = self.material("MutableCompound Tapered Capsule Material");

        let mut compound = CompoundShapeSettings::new();
        compound.add_shape(
            Vec3::new(0.0, 0.5, 0.0),
            Quat::from_rotation_z(0.5 * PI),
            ShapeSettings::from(BoxShapeSettings::new(
                Vec3::new(0.5, 0.1, 0.2),
                DEFAULT_CONVEX_RADIUS,
                Some(box_material),
            ))
            .shared(),
        );
        compound.add_shape(
            Vec3::new(0.5, 0.0, 0.0),
            Quat::from_rotation_z(0.5 * PI),
            ShapeSettings::from(CapsuleShapeSettings::new(0.5, 0.1, Some(capsule_material)))
                .shared(),
        );
        compound.add_shape(
            Vec3::new(0.0, 0.0, 0.5),
            Quat::from_rotation_x(0.5 * PI),
            ShapeSettings::from(TaperedCapsuleShapeSettings::new(
                0.5,
                0.2,
                0.1,
                Some(tapered_material),
            ))
            .shared(),
        );

        let shape = ShapeSettings::MutableCompound(compound).shared();
        self.add_stacked(shape, Quat::from_rotation_z(0.5 * PI))
    }

    /// Distance constraint between two bodies already in the scene.
    ///
    /// The range is derived from the bodies' spawn positions.
    ///
    /// # Panics
    ///
    /// Panics if either ordinal is not below [`Self::body_count`].
    pub fn add_distance_constraint(&mut self, body_a: u32, body_b: u32) -> &mut Self {
        let settings = DistanceConstraintSettings {
            space: ConstraintSpace::LocalToBodyCOM,
            ..Default::default()
        };
        self.scene
            .add_constraint(Arc::new(ConstraintSettings::from(settings)), body_a, body_b);
        self
    }

    /// Two soft cubes sharing one template, then a pressurised soft sphere
    pub fn add_soft_bodies(&mut self) -> &mut Self {
        let material = self.material("Soft Body Cube Material");
        let cube = Arc::new(SoftBodySharedSettings::create_cube(5, 0.2).with_materials(vec![material]));
        for _ in 0..2 {
            let position = self.positions.next_position();
            self.scene.add_soft_body(SoftBodySettings::new(
                cube.clone(),
                position,
                Quat::IDENTITY,
                ObjectLayer::MOVING,
            ));
        }

        let material = self.material("Soft Body Sphere Material");
        let sphere =
            Arc::new(SoftBodySharedSettings::create_sphere(0.5, 10, 20).with_materials(vec![material]));
        let mut settings = SoftBodySettings::new(
            sphere,
            self.positions.next_position(),
            Quat::IDENTITY,
            ObjectLayer::MOVING,
        );
        settings.pressure = SOFT_SPHERE_PRESSURE;
        self.scene.add_soft_body(settings);
        self
    }

    pub fn build(self) -> PhysicsScene {
        info!(
            bodies = self.scene.bodies().len(),
            soft_bodies = self.scene.soft_bodies().len(),
            constraints = self.scene.constraints().len(),
            materials = self.colors.issued(),
            "reference scene built"
        );
        self.scene
    }

    fn material(&mut self, name: &str) -> Arc<PhysicsMaterial> {
        PhysicsMaterial::shared(name, self.colors.next_color())
    }

    fn add_static(&mut self, shape: Arc<ShapeSettings>, position: Vec3, rotation: Quat) -> &mut Self {
        self.scene.add_body(BodySettings::new(
            shape,
            position,
            rotation,
            MotionType::Static,
            ObjectLayer::NON_MOVING,
        ));
        self
    }

    fn add_stacked(&mut self, shape: Arc<ShapeSettings>, rotation: Quat) -> &mut Self {
        let position = self.positions.next_position();
        self.scene.add_body(BodySettings::new(
            shape,
            position,
            rotation,
            MotionType::Dynamic,
            ObjectLayer::MOVING,
        ));
        self
    }
}

/// Build the full reference scene.
///
/// Bodies, in order: mesh floor, height field, triangle, sphere, box, capsule,
/// tapered capsule, cylinder, tapered cylinder, cone, empty, static compound,
/// convex hull, rotated hull, mutable compound. The distance constraint links
/// the box and the capsule (ordinals 3 and 4).
pub fn build_reference_scene(config: &Config) -> PhysicsScene {
    let mut builder = ReferenceSceneBuilder::new(config.terrain.clone());
    builder
        .add_mesh_terrain()
        .add_height_field()
        .add_primitives()
        .add_static_compound()
        .add_convex_hulls()
        .add_mutable_compound()
        .add_distance_constraint(3, 4)
        .add_soft_bodies();
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_shared::{ShapeKind, identity_key};

    fn small_config() -> Config {
        let mut config = Config::default();
        config.terrain.mesh_grid = 4;
        config.terrain.height_field_grid = 8;
        config
    }

    // =============================================================
    // Allocator tests
    // =============================================================

    #[test]
    fn test_position_allocator_steps_before_returning() {
        let mut positions = PositionAllocator::new(Vec3::new(0.0, 4.0, 0.0));
        assert_eq!(positions.next_position(), Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(positions.next_position(), Vec3::new(0.0, 6.0, 0.0));
    }

    #[test]
    fn test_color_allocator_counts() {
        let mut colors = ColorAllocator::new();
        let first = colors.next_color();
        let second = colors.next_color();
        assert_ne!(first, second);
        assert_eq!(colors.issued(), 2);
    }

    // =============================================================
    // Scene layout tests
    // =============================================================

    #[test]
    fn test_reference_scene_counts() {
        let scene = build_reference_scene(&small_config());
        assert_eq!(scene.bodies().len(), 15);
        assert_eq!(scene.soft_bodies().len(), 3);
        assert_eq!(scene.constraints().len(), 1);

        let constraint = &scene.constraints()[0];
        assert_eq!((constraint.body_a, constraint.body_b), (3, 4));
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_reference_scene_body_kinds() {
        let scene = build_reference_scene(&small_config());
        let kinds: Vec<ShapeKind> = scene.bodies().iter().map(|b| b.shape.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ShapeKind::Scaled,
                ShapeKind::HeightField,
                ShapeKind::Triangle,
                ShapeKind::Sphere,
                ShapeKind::Box,
                ShapeKind::Capsule,
                ShapeKind::TaperedCapsule,
                ShapeKind::Cylinder,
                ShapeKind::TaperedCylinder,
                ShapeKind::TaperedCylinder,
                ShapeKind::Empty,
                ShapeKind::StaticCompound,
                ShapeKind::ConvexHull,
                ShapeKind::RotatedTranslated,
                ShapeKind::MutableCompound,
            ]
        );
    }

    #[test]
    fn test_motion_types_and_layers() {
        let scene = build_reference_scene(&small_config());
        for (index, body) in scene.bodies().iter().enumerate() {
            if index <= 2 {
                assert_eq!(body.motion_type, MotionType::Static, "body {index}");
                assert_eq!(body.layer, ObjectLayer::NON_MOVING, "body {index}");
            } else {
                assert_eq!(body.motion_type, MotionType::Dynamic, "body {index}");
                assert_eq!(body.layer, ObjectLayer::MOVING, "body {index}");
            }
        }
    }

    #[test]
    fn test_stacked_bodies_rise() {
        let config = small_config();
        let scene = build_reference_scene(&config);

        let mut heights: Vec<f32> = scene.bodies()[2..].iter().map(|b| b.position.y).collect();
        heights.extend(scene.soft_bodies().iter().map(|s| s.position.y));

        assert!(heights[0] > config.terrain.max_height);
        assert!(heights.windows(2).all(|pair| pair[1] > pair[0]));
    }

    #[test]
    fn test_terrain_placement() {
        let scene = build_reference_scene(&small_config());
        assert_eq!(scene.bodies()[0].position, Vec3::ZERO);
        assert_eq!(scene.bodies()[1].position, HEIGHT_FIELD_POSITION);
        let ShapeSettings::Scaled(scaled) = scene.bodies()[0].shape.as_ref() else {
            panic!("mesh floor should be scaled");
        };
        assert_eq!(scaled.scale, MESH_SCALE);
        assert_eq!(scaled.inner.kind(), ShapeKind::Mesh);
    }

    // =============================================================
    // Sharing tests
    // =============================================================

    #[test]
    fn test_sub_compound_shared() {
        let scene = build_reference_scene(&small_config());
        let children = scene.bodies()[11].shape.children();
        assert_eq!(children.len(), 2);
        assert!(Arc::ptr_eq(children[0], children[1]));
    }

    #[test]
    fn test_hull_shared_with_wrapper() {
        let scene = build_reference_scene(&small_config());
        let hull = &scene.bodies()[12].shape;
        let wrapper = scene.bodies()[13].shape.children();
        assert!(Arc::ptr_eq(hull, wrapper[0]));
    }

    #[test]
    fn test_soft_cube_template_shared() {
        let scene = build_reference_scene(&small_config());
        let soft = scene.soft_bodies();
        assert!(Arc::ptr_eq(&soft[0].settings, &soft[1].settings));
        assert!(!Arc::ptr_eq(&soft[0].settings, &soft[2].settings));
        assert_eq!(scene.distinct_soft_body_templates().len(), 2);
        assert_eq!(soft[2].pressure, SOFT_SPHERE_PRESSURE);
        assert_eq!(soft[0].pressure, 0.0);
    }

    #[test]
    fn test_mutable_compound_children_distinct() {
        let scene = build_reference_scene(&small_config());
        let children = scene.bodies()[14].shape.children();
        assert_eq!(children.len(), 3);
        let keys: hashbrown::HashSet<usize> = children.iter().map(|child| identity_key(child)).collect();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = small_config();
        let a = build_reference_scene(&config);
        let b = build_reference_scene(&config);
        for (left, right) in a.bodies().iter().zip(b.bodies()) {
            assert_eq!(left.position, right.position);
            assert_eq!(left.shape.kind(), right.shape.kind());
        }
        let color = |scene: &PhysicsScene| scene.bodies()[3].shape.materials()[0].color;
        assert_eq!(color(&a), color(&b));
    }

    #[test]
    #[should_panic]
    fn test_constraint_on_missing_body_panics() {
        let mut builder = ReferenceSceneBuilder::new(TerrainConfig::default());
        builder.add_mesh_terrain().add_distance_constraint(0, 1);
    }
}
