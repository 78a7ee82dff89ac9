//! Physics materials.

use std::sync::Arc;

use crate::color::Color;

/// A named physics material.
///
/// Materials are always handled as `Arc<PhysicsMaterial>`: mesh and height-field
/// shapes keep a material list and address it by index, convex shapes reference a
/// single material directly.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsMaterial {
    pub name: String,
    pub color: Color,
}

impl PhysicsMaterial {
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }

    /// Create a material ready to be shared between shapes
    pub fn shared(name: impl Into<String>, color: Color) -> Arc<Self> {
        Arc::new(Self::new(name, color))
    }
}
