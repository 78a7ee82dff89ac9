//! Constraint settings

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Space in which constraint attachment points are expressed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintSpace {
    /// Points are relative to each body's center of mass
    LocalToBodyCOM,
    /// Points are world-space positions
    #[default]
    WorldSpace,
}

/// Keeps two attachment points within a distance range.
///
/// Negative `min_distance` / `max_distance` mean "use the distance between the
/// attachment points at the moment the constraint is created".
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistanceConstraintSettings {
    pub space: ConstraintSpace,
    pub point1: Vec3,
    pub point2: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for DistanceConstraintSettings {
    fn default() -> Self {
        Self {
            space: ConstraintSpace::WorldSpace,
            point1: Vec3::ZERO,
            point2: Vec3::ZERO,
            min_distance: -1.0,
            max_distance: -1.0,
        }
    }
}

/// Pins two attachment points together
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointConstraintSettings {
    pub space: ConstraintSpace,
    pub point1: Vec3,
    pub point2: Vec3,
}

/// Removes all relative motion between two bodies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedConstraintSettings {
    /// Use the midpoint of the two bodies as the attachment point
    pub auto_detect_point: bool,
}

impl Default for FixedConstraintSettings {
    fn default() -> Self {
        Self {
            auto_detect_point: true,
        }
    }
}

/// Closed set of constraint kinds
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConstraintSettings {
    Distance(DistanceConstraintSettings),
    Point(PointConstraintSettings),
    Fixed(FixedConstraintSettings),
}

impl ConstraintSettings {
    pub fn name(&self) -> &'static str {
        match self {
            ConstraintSettings::Distance(_) => "Distance",
            ConstraintSettings::Point(_) => "Point",
            ConstraintSettings::Fixed(_) => "Fixed",
        }
    }
}

impl From<DistanceConstraintSettings> for ConstraintSettings {
    fn from(settings: DistanceConstraintSettings) -> Self {
        ConstraintSettings::Distance(settings)
    }
}

impl From<PointConstraintSettings> for ConstraintSettings {
    fn from(settings: PointConstraintSettings) -> Self {
        ConstraintSettings::Point(settings)
    }
}

impl From<FixedConstraintSettings> for ConstraintSettings {
    fn from(settings: FixedConstraintSettings) -> Self {
        ConstraintSettings::Fixed(settings)
    }
}
