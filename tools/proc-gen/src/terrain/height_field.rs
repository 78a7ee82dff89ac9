//! Sampled height-field terrain with a hole

use std::sync::Arc;

use glam::Vec3;
use tessera_shared::{HeightFieldShapeSettings, NO_COLLISION_VALUE, PhysicsMaterial};

use super::{TerrainParams, band_materials, dense_rank};
use crate::noise_field::NoiseField;

/// Sample forced to [`NO_COLLISION_VALUE`]
pub const HOLE_SAMPLE: (u32, u32) = (2, 2);

/// Width of a material band, in world units from the field center
const BAND_WIDTH: f32 = 10.0;

/// Generated height-field terrain
#[derive(Clone, Debug)]
pub struct HeightFieldData {
    pub sample_count: u32,
    /// `sample_count²` heights, row-major
    pub heights: Vec<f32>,
    /// `(sample_count - 1)²` cell material indices, row-major
    pub material_indices: Vec<u8>,
    pub materials: Vec<Arc<PhysicsMaterial>>,
    pub offset: Vec3,
    pub scale: Vec3,
}

impl HeightFieldData {
    pub fn into_settings(self) -> HeightFieldShapeSettings {
        HeightFieldShapeSettings::new(
            self.heights,
            self.offset,
            self.scale,
            self.sample_count,
            self.material_indices,
            self.materials,
        )
    }
}

/// Build a `grid × grid` sample height field, centered on the origin in XZ.
///
/// Sample [`HOLE_SAMPLE`] is replaced by [`NO_COLLISION_VALUE`]. Cell materials
/// are banded by `round(planar distance from center / 10)` and ranked so that
/// indices are contiguous from 0. Banding depends only on cell position, never
/// on sample heights, so the hole has no effect on it.
///
/// # Panics
/// Panics if `grid` is too small to contain the hole, if `cell_size` is not
/// positive, or if there are more than 256 bands.
pub fn build_height_field(params: &TerrainParams, noise: &impl NoiseField) -> HeightFieldData {
    let n = params.grid;
    assert!(
        n > HOLE_SAMPLE.0 && n > HOLE_SAMPLE.1,
        "height field of {n} samples cannot contain hole sample {HOLE_SAMPLE:?}"
    );
    assert!(
        params.cell_size > 0.0,
        "terrain cell size must be positive, got {}",
        params.cell_size
    );

    let mut heights = Vec::with_capacity((n * n) as usize);
    for y in 0..n {
        for x in 0..n {
            heights.push(params.sample_height(noise, x, y));
        }
    }
    heights[(HOLE_SAMPLE.1 * n + HOLE_SAMPLE.0) as usize] = NO_COLLISION_VALUE;

    let cell = params.cell_size;
    let center = n as f32 * cell * 0.5;
    let cells = n - 1;
    let mut raw_bands = Vec::with_capacity((cells * cells) as usize);
    for y in 0..cells {
        for x in 0..cells {
            let dx = x as f32 * cell - center;
            let dz = y as f32 * cell - center;
            raw_bands.push(((dx * dx + dz * dz).sqrt() / BAND_WIDTH).round() as u32);
        }
    }

    let (bands, band_count) = dense_rank(&raw_bands);
    assert!(
        band_count <= u8::MAX as u32 + 1,
        "height field has {band_count} material bands, at most 256 are supported"
    );

    HeightFieldData {
        sample_count: n,
        heights,
        material_indices: bands.into_iter().map(|b| b as u8).collect(),
        materials: band_materials("HeightField Material", band_count),
        offset: Vec3::new(-center, 0.0, -center),
        scale: Vec3::new(cell, 1.0, cell),
    }
}
