//! Triangle mesh and height field shape settings

use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::material::PhysicsMaterial;

/// Height sample value marking a hole in a height field.
///
/// Cells touching a sample with this value have no collision and no material.
pub const NO_COLLISION_VALUE: f32 = f32::MAX;

/// One triangle of a mesh shape, with an index into the mesh's material list
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshTriangle {
    pub vertices: [Vec3; 3],
    pub material_index: u32,
}

impl MeshTriangle {
    pub fn new(v1: Vec3, v2: Vec3, v3: Vec3, material_index: u32) -> Self {
        Self {
            vertices: [v1, v2, v3],
            material_index,
        }
    }
}

/// Static triangle mesh
#[derive(Clone, Debug, Default)]
pub struct MeshShapeSettings {
    pub triangles: Vec<MeshTriangle>,
    pub materials: Vec<Arc<PhysicsMaterial>>,
}

impl MeshShapeSettings {
    pub fn new(triangles: Vec<MeshTriangle>, materials: Vec<Arc<PhysicsMaterial>>) -> Self {
        Self {
            triangles,
            materials,
        }
    }

    /// Highest material index used by any triangle
    pub fn max_material_index(&self) -> Option<u32> {
        self.triangles.iter().map(|t| t.material_index).max()
    }

    /// Material of a triangle, `None` when the index is out of range
    pub fn triangle_material(&self, triangle: usize) -> Option<&Arc<PhysicsMaterial>> {
        let index = self.triangles.get(triangle)?.material_index as usize;
        self.materials.get(index)
    }
}

/// Regular grid of height samples.
///
/// `height_samples` holds `sample_count × sample_count` values in row-major order
/// (`y * sample_count + x`). `material_indices` holds one index per cell,
/// `(sample_count - 1)²` values in the same order. A sample is placed at
/// `offset + scale * (x, height, y)`.
#[derive(Clone, Debug)]
pub struct HeightFieldShapeSettings {
    pub offset: Vec3,
    pub scale: Vec3,
    pub sample_count: u32,
    pub height_samples: Vec<f32>,
    pub material_indices: Vec<u8>,
    pub materials: Vec<Arc<PhysicsMaterial>>,
}

impl HeightFieldShapeSettings {
    pub fn new(
        height_samples: Vec<f32>,
        offset: Vec3,
        scale: Vec3,
        sample_count: u32,
        material_indices: Vec<u8>,
        materials: Vec<Arc<PhysicsMaterial>>,
    ) -> Self {
        Self {
            offset,
            scale,
            sample_count,
            height_samples,
            material_indices,
            materials,
        }
    }

    /// Number of cells along one side
    pub fn cell_count(&self) -> u32 {
        self.sample_count.saturating_sub(1)
    }

    pub fn height(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.sample_count || y >= self.sample_count {
            return None;
        }
        self.height_samples
            .get((y * self.sample_count + x) as usize)
            .copied()
    }

    /// True when the sample is the no-collision marker
    pub fn is_no_collision(&self, x: u32, y: u32) -> bool {
        self.height(x, y) == Some(NO_COLLISION_VALUE)
    }

    /// True when all four corners of the cell are collidable samples
    pub fn cell_has_collision(&self, x: u32, y: u32) -> bool {
        if x >= self.cell_count() || y >= self.cell_count() {
            return false;
        }
        [(x, y), (x + 1, y), (x, y + 1), (x + 1, y + 1)]
            .into_iter()
            .all(|(sx, sy)| matches!(self.height(sx, sy), Some(h) if h != NO_COLLISION_VALUE))
    }

    /// Material index of a cell, `None` for cells touching a hole
    pub fn material_index_at(&self, x: u32, y: u32) -> Option<u8> {
        if !self.cell_has_collision(x, y) {
            return None;
        }
        self.material_indices
            .get((y * self.cell_count() + x) as usize)
            .copied()
    }

    /// Material of a cell, `None` for cells touching a hole
    pub fn material_at(&self, x: u32, y: u32) -> Option<&Arc<PhysicsMaterial>> {
        let index = self.material_index_at(x, y)?;
        self.materials.get(index as usize)
    }

    /// Coordinates of all samples equal to [`NO_COLLISION_VALUE`]
    pub fn holes(&self) -> Vec<(u32, u32)> {
        let n = self.sample_count;
        (0..n)
            .flat_map(|y| (0..n).map(move |x| (x, y)))
            .filter(|&(x, y)| self.is_no_collision(x, y))
            .collect()
    }
}
