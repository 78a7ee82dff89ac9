//! Compound and decorator shape settings

use std::sync::Arc;

use glam::{Quat, Vec3};

use super::ShapeSettings;

/// Child of a compound shape, placed with a local transform
#[derive(Clone, Debug)]
pub struct SubShape {
    pub position: Vec3,
    pub rotation: Quat,
    pub shape: Arc<ShapeSettings>,
    pub user_data: u32,
}

/// Settings shared by the static and mutable compound kinds.
///
/// Which kind a compound is depends on the [`ShapeSettings`] variant that wraps it.
/// Children are shared references: adding the same `Arc` twice places one shape
/// at two transforms.
#[derive(Clone, Debug, Default)]
pub struct CompoundShapeSettings {
    pub sub_shapes: Vec<SubShape>,
}

impl CompoundShapeSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child shape with the given local transform
    pub fn add_shape(&mut self, position: Vec3, rotation: Quat, shape: Arc<ShapeSettings>) {
        self.sub_shapes.push(SubShape {
            position,
            rotation,
            shape,
            user_data: 0,
        });
    }

    /// Builder-style variant of [`add_shape`](Self::add_shape)
    pub fn with_shape(mut self, position: Vec3, rotation: Quat, shape: Arc<ShapeSettings>) -> Self {
        self.add_shape(position, rotation, shape);
        self
    }

    pub fn len(&self) -> usize {
        self.sub_shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_shapes.is_empty()
    }
}

/// Places an inner shape at a fixed offset and rotation
#[derive(Clone, Debug)]
pub struct RotatedTranslatedShapeSettings {
    pub position: Vec3,
    pub rotation: Quat,
    pub inner: Arc<ShapeSettings>,
}

impl RotatedTranslatedShapeSettings {
    pub fn new(position: Vec3, rotation: Quat, inner: Arc<ShapeSettings>) -> Self {
        Self {
            position,
            rotation,
            inner,
        }
    }
}

/// Scales an inner shape per axis
#[derive(Clone, Debug)]
pub struct ScaledShapeSettings {
    pub scale: Vec3,
    pub inner: Arc<ShapeSettings>,
}

impl ScaledShapeSettings {
    pub fn new(inner: Arc<ShapeSettings>, scale: Vec3) -> Self {
        Self { scale, inner }
    }
}
