//! Object layers and motion types.

use serde::{Deserialize, Serialize};

/// Collision-filtering group a body belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectLayer(pub u16);

impl ObjectLayer {
    /// Static geometry (floors, terrain)
    pub const NON_MOVING: Self = Self(0);
    /// Everything that can move
    pub const MOVING: Self = Self(1);
    /// Number of layers in the default layer setup
    pub const NUM_LAYERS: u16 = 2;

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ObjectLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::NON_MOVING => write!(f, "NON_MOVING"),
            Self::MOVING => write!(f, "MOVING"),
            Self(other) => write!(f, "layer {other}"),
        }
    }
}

/// Whether and how a body is integrated by the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionType {
    /// Never moves
    Static,
    /// Moved by velocities only, not affected by forces
    Kinematic,
    /// Fully simulated
    #[default]
    Dynamic,
}

impl MotionType {
    pub fn is_static(self) -> bool {
        matches!(self, MotionType::Static)
    }

    pub fn is_dynamic(self) -> bool {
        matches!(self, MotionType::Dynamic)
    }
}
