//! Noise-driven terrain
//!
//! Both generators sample the same height function: the noise field at
//! `(x / n, 0, z / n)`, remapped from `[-1, 1]` into `[0, max_height]`.

mod height_field;
mod mesh;

pub use height_field::{HOLE_SAMPLE, HeightFieldData, build_height_field};
pub use mesh::{TerrainMesh, build_mesh};

use std::sync::Arc;

use tessera_shared::PhysicsMaterial;

use crate::noise_field::NoiseField;
use crate::palette::distinct_color;

/// Default noise period used on every axis
pub const DEFAULT_NOISE_PERIOD: u32 = 256;

/// Parameters shared by the mesh and height-field generators
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainParams {
    /// Cells per side (mesh) or samples per side (height field)
    pub grid: u32,
    pub cell_size: f32,
    pub max_height: f32,
    /// Extra height added to the mesh perimeter. Ignored by height fields.
    pub rim_height: f32,
    pub noise_period: u32,
}

impl TerrainParams {
    /// 10×10 cells of size 2 with a rim of 2
    pub fn mesh() -> Self {
        Self {
            grid: 10,
            cell_size: 2.0,
            max_height: 4.0,
            rim_height: 2.0,
            noise_period: DEFAULT_NOISE_PERIOD,
        }
    }

    /// 32×32 samples spaced 1 apart
    pub fn height_field() -> Self {
        Self {
            grid: 32,
            cell_size: 1.0,
            max_height: 4.0,
            rim_height: 0.0,
            noise_period: DEFAULT_NOISE_PERIOD,
        }
    }

    /// Height at grid coordinate `(x, z)`, in `[0, max_height]`
    pub fn sample_height(&self, noise: &impl NoiseField, x: u32, z: u32) -> f32 {
        let n = self.grid.max(1) as f64;
        let p = self.noise_period;
        let value = noise.sample(x as f64 / n, 0.0, z as f64 / n, p, p, p);
        self.max_height * ((value as f32 + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

/// Remap raw band values onto contiguous indices.
///
/// Returns the ranked indices and the number of distinct bands. The smallest raw
/// value maps to 0 and every index in `0..count` is used at least once.
pub(crate) fn dense_rank(raw: &[u32]) -> (Vec<u32>, u32) {
    let mut distinct = raw.to_vec();
    distinct.sort_unstable();
    distinct.dedup();

    let ranked = raw
        .iter()
        .map(|value| distinct.binary_search(value).unwrap_or_default() as u32)
        .collect();
    (ranked, distinct.len() as u32)
}

/// One material per band, named `"{prefix} {i}"` and colored by index
pub(crate) fn band_materials(prefix: &str, count: u32) -> Vec<Arc<PhysicsMaterial>> {
    (0..count)
        .map(|i| PhysicsMaterial::shared(format!("{prefix} {i}"), distinct_color(i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_rank_closes_gaps() {
        let (ranked, count) = dense_rank(&[5, 2, 9, 2, 5]);
        assert_eq!(ranked, vec![1, 0, 2, 0, 1]);
        assert_eq!(count, 3);
    }

    #[test]
    fn test_dense_rank_empty() {
        let (ranked, count) = dense_rank(&[]);
        assert!(ranked.is_empty());
        assert_eq!(count, 0);
    }

    #[test]
    fn test_sample_height_range() {
        let params = TerrainParams::mesh();
        let low = |_: f64, _: f64, _: f64| -1.0;
        let high = |_: f64, _: f64, _: f64| 1.0;
        let mid = |_: f64, _: f64, _: f64| 0.0;
        assert_eq!(params.sample_height(&low, 3, 4), 0.0);
        assert_eq!(params.sample_height(&high, 3, 4), params.max_height);
        assert_eq!(params.sample_height(&mid, 3, 4), params.max_height * 0.5);
    }

    #[test]
    fn test_band_materials_named_and_colored() {
        let materials = band_materials("Mesh Material", 3);
        assert_eq!(materials.len(), 3);
        assert_eq!(materials[2].name, "Mesh Material 2");
        assert_eq!(materials[1].color, distinct_color(1));
    }
}
