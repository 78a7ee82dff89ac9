//! Scene instantiation
//!
//! Turns a (possibly reloaded) [`PhysicsScene`] into live bodies in a
//! [`PhysicsWorld`]. Bodies are independent, so one rejected body does not stop
//! the others; every failure is collected in the returned report.

use glam::Quat;
use tessera_shared::PhysicsScene;
use tracing::{info, warn};

use crate::shape::ShapeBaker;
use crate::world::{BodyDesc, BodyId, ConstraintId, InstantiationError, PhysicsWorld, SoftBodyDesc};

/// Which part of the scene a failure belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneItem {
    /// Rigid body, by ordinal
    Body(usize),
    /// Soft body, by ordinal
    SoftBody(usize),
    /// Constraint, by ordinal
    Constraint(usize),
}

/// Outcome of [`create_bodies`]
#[derive(Debug, Default)]
pub struct InstantiationReport {
    /// Live id of each rigid body, `None` where creation failed
    pub bodies: Vec<Option<BodyId>>,
    /// Live id of each soft body, `None` where creation failed
    pub soft_bodies: Vec<Option<BodyId>>,
    pub constraints: Vec<Option<ConstraintId>>,
    pub errors: Vec<(SceneItem, InstantiationError)>,
    /// Distinct soft-body templates optimized during instantiation
    pub optimized_templates: usize,
}

impl InstantiationReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn created_bodies(&self) -> usize {
        self.bodies.iter().flatten().count()
    }

    pub fn created_soft_bodies(&self) -> usize {
        self.soft_bodies.iter().flatten().count()
    }

    pub fn created_constraints(&self) -> usize {
        self.constraints.iter().flatten().count()
    }

    fn fail(&mut self, item: SceneItem, error: InstantiationError) {
        warn!(?item, %error, "scene item not instantiated");
        self.errors.push((item, error));
    }
}

/// Create every body, soft body and constraint of `scene` in `world`.
///
/// Bodies are created in scene order, then soft bodies, then constraints against
/// the live ids of their ordinal bodies. Shapes shared between bodies are baked
/// once. Each distinct soft-body template that lacks derived data is optimized
/// once before its first use.
pub fn create_bodies(scene: &PhysicsScene, world: &mut impl PhysicsWorld) -> InstantiationReport {
    let mut report = InstantiationReport::default();
    let mut baker = ShapeBaker::new();

    for (index, body) in scene.bodies().iter().enumerate() {
        let created = baker
            .bake(&body.shape)
            .map_err(InstantiationError::from)
            .and_then(|shape| {
                world.create_body(BodyDesc {
                    shape,
                    position: body.position,
                    rotation: normalized(body.rotation),
                    motion_type: body.motion_type,
                    layer: body.layer,
                    friction: body.friction,
                    restitution: body.restitution,
                })
            });

        match created {
            Ok(id) => report.bodies.push(Some(id)),
            Err(error) => {
                report.bodies.push(None);
                report.fail(SceneItem::Body(index), error);
            }
        }
    }

    // Templates already optimized (for example by the caller after reading) are
    // left alone
    report.optimized_templates = scene.optimize_soft_bodies();

    for (index, soft_body) in scene.soft_bodies().iter().enumerate() {
        let created = world.create_soft_body(SoftBodyDesc {
            settings: soft_body.settings.clone(),
            position: soft_body.position,
            rotation: normalized(soft_body.rotation),
            layer: soft_body.layer,
            pressure: soft_body.pressure,
        });

        match created {
            Ok(id) => report.soft_bodies.push(Some(id)),
            Err(error) => {
                report.soft_bodies.push(None);
                report.fail(SceneItem::SoftBody(index), error);
            }
        }
    }

    for (index, entry) in scene.constraints().iter().enumerate() {
        let live = |ordinal: u32| {
            report
                .bodies
                .get(ordinal as usize)
                .copied()
                .flatten()
                .ok_or(InstantiationError::ConstraintBodyMissing { ordinal })
        };

        let created = live(entry.body_a)
            .and_then(|a| live(entry.body_b).map(|b| (a, b)))
            .and_then(|(a, b)| world.create_constraint(&entry.settings, a, b));

        match created {
            Ok(id) => report.constraints.push(Some(id)),
            Err(error) => {
                report.constraints.push(None);
                report.fail(SceneItem::Constraint(index), error);
            }
        }
    }

    info!(
        bodies = report.created_bodies(),
        soft_bodies = report.created_soft_bodies(),
        constraints = report.created_constraints(),
        shapes = baker.len(),
        optimized_templates = report.optimized_templates,
        errors = report.errors.len(),
        "scene instantiated"
    );
    report
}

fn normalized(rotation: Quat) -> Quat {
    if rotation.length_squared() > 0.0 {
        rotation.normalize()
    } else {
        Quat::IDENTITY
    }
}
