//! Rigid body creation settings

use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::layers::{MotionType, ObjectLayer};
use crate::shape::ShapeSettings;

/// Everything needed to create one rigid body.
#[derive(Clone, Debug)]
pub struct BodySettings {
    /// Shared shape description, baked when the body is created
    pub shape: Arc<ShapeSettings>,
    pub position: Vec3,
    pub rotation: Quat,
    pub motion_type: MotionType,
    pub layer: ObjectLayer,
    pub friction: f32,
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub gravity_factor: f32,
    pub allow_sleeping: bool,
    pub user_data: u64,
}

impl BodySettings {
    pub fn new(
        shape: Arc<ShapeSettings>,
        position: Vec3,
        rotation: Quat,
        motion_type: MotionType,
        layer: ObjectLayer,
    ) -> Self {
        Self {
            shape,
            position,
            rotation,
            motion_type,
            layer,
            friction: 0.2,
            restitution: 0.0,
            linear_damping: 0.05,
            angular_damping: 0.05,
            gravity_factor: 1.0,
            allow_sleeping: true,
            user_data: 0,
        }
    }
}
