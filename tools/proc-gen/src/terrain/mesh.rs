//! Triangulated terrain with a raised rim

use std::sync::Arc;

use glam::Vec3;
use tessera_shared::{MeshShapeSettings, MeshTriangle, PhysicsMaterial};

use super::{TerrainParams, band_materials, dense_rank};
use crate::noise_field::NoiseField;

/// Generated mesh terrain, centered on the origin in XZ
#[derive(Clone, Debug)]
pub struct TerrainMesh {
    pub triangles: Vec<MeshTriangle>,
    pub materials: Vec<Arc<PhysicsMaterial>>,
}

impl TerrainMesh {
    pub fn into_settings(self) -> MeshShapeSettings {
        MeshShapeSettings::new(self.triangles, self.materials)
    }

    /// Number of triangles using each material
    pub fn material_usage(&self) -> Vec<usize> {
        let mut usage = vec![0; self.materials.len()];
        for triangle in &self.triangles {
            if let Some(count) = usage.get_mut(triangle.material_index as usize) {
                *count += 1;
            }
        }
        usage
    }
}

/// Build a `grid × grid` cell mesh.
///
/// Heights come from [`TerrainParams::sample_height`] at each of the
/// `(grid + 1)²` corners; the outermost ring of corners is raised by
/// `rim_height`. Every cell emits two triangles sharing one material band,
/// `floor(|v1 + v2 + v3 + v4| / (4 · cell_size))`, ranked so that material
/// indices are contiguous from 0.
///
/// A material index is the rank of its band, not the raw band value: when the
/// lowest populated band is above 0, `"Mesh Material 0"` covers that band.
///
/// # Panics
/// Panics if `grid` is zero or `cell_size` is not positive.
pub fn build_mesh(params: &TerrainParams, noise: &impl NoiseField) -> TerrainMesh {
    assert!(params.grid > 0, "terrain mesh needs at least one cell");
    assert!(
        params.cell_size > 0.0,
        "terrain cell size must be positive, got {}",
        params.cell_size
    );

    let n = params.grid;
    let stride = (n + 1) as usize;
    let mut heights = Vec::with_capacity(stride * stride);
    for x in 0..=n {
        for z in 0..=n {
            let mut h = params.sample_height(noise, x, z);
            if x == 0 || x == n || z == 0 || z == n {
                h += params.rim_height;
            }
            heights.push(h);
        }
    }
    let height = |x: u32, z: u32| heights[x as usize * stride + z as usize];

    let cell = params.cell_size;
    let center = n as f32 * cell * 0.5;

    let mut corners = Vec::with_capacity((n * n) as usize);
    let mut raw_bands = Vec::with_capacity((n * n) as usize);
    for x in 0..n {
        for z in 0..n {
            let x1 = cell * x as f32 - center;
            let z1 = cell * z as f32 - center;
            let x2 = x1 + cell;
            let z2 = z1 + cell;

            let v1 = Vec3::new(x1, height(x, z), z1);
            let v2 = Vec3::new(x2, height(x + 1, z), z1);
            let v3 = Vec3::new(x1, height(x, z + 1), z2);
            let v4 = Vec3::new(x2, height(x + 1, z + 1), z2);

            raw_bands.push(((v1 + v2 + v3 + v4).length() / (4.0 * cell)).floor() as u32);
            corners.push([v1, v2, v3, v4]);
        }
    }

    let (bands, band_count) = dense_rank(&raw_bands);

    let triangles = corners
        .iter()
        .zip(&bands)
        .flat_map(|(&[v1, v2, v3, v4], &band)| {
            [
                MeshTriangle::new(v1, v3, v4, band),
                MeshTriangle::new(v1, v4, v2, band),
            ]
        })
        .collect();

    TerrainMesh {
        triangles,
        materials: band_materials("Mesh Material", band_count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise_field::PerlinField;

    fn flat(_: f64, _: f64, _: f64) -> f64 {
        -1.0
    }

    #[test]
    fn test_mesh_triangle_count() {
        let mesh = build_mesh(&TerrainParams::mesh(), &PerlinField::new(0));
        assert_eq!(mesh.triangles.len(), 2 * 10 * 10);
    }

    #[test]
    fn test_mesh_every_material_used() {
        let mesh = build_mesh(&TerrainParams::mesh(), &PerlinField::new(0));
        assert!(!mesh.materials.is_empty());
        assert!(mesh.material_usage().iter().all(|&count| count > 0));

        let max = mesh.triangles.iter().map(|t| t.material_index).max();
        assert_eq!(max, Some(mesh.materials.len() as u32 - 1));
    }

    #[test]
    fn test_mesh_rim_is_raised() {
        let params = TerrainParams::mesh();
        let mesh = build_mesh(&params, &flat);

        // Flat noise puts the interior at height 0; only rim corners are lifted
        for triangle in &mesh.triangles {
            for v in triangle.vertices {
                let half = params.grid as f32 * params.cell_size * 0.5;
                let on_rim = (v.x.abs() - half).abs() < 1e-4 || (v.z.abs() - half).abs() < 1e-4;
                let expected = if on_rim { params.rim_height } else { 0.0 };
                assert!((v.y - expected).abs() < 1e-5, "vertex {v:?}");
            }
        }
    }

    #[test]
    fn test_mesh_cell_triangles_share_band() {
        let mesh = build_mesh(&TerrainParams::mesh(), &PerlinField::new(4));
        for pair in mesh.triangles.chunks(2) {
            assert_eq!(pair[0].material_index, pair[1].material_index);
            assert_eq!(pair[0].vertices[0], pair[1].vertices[0]);
        }
    }

    #[test]
    fn test_mesh_is_deterministic() {
        let params = TerrainParams::mesh();
        let a = build_mesh(&params, &PerlinField::new(11));
        let b = build_mesh(&params, &PerlinField::new(11));
        assert_eq!(a.triangles, b.triangles);
        let names_a: Vec<_> = a.materials.iter().map(|m| m.name.clone()).collect();
        let names_b: Vec<_> = b.materials.iter().map(|m| m.name.clone()).collect();
        assert_eq!(names_a, names_b);
    }

    #[test]
    fn test_mesh_index_is_band_rank() {
        let params = TerrainParams::mesh();
        let high = |_: f64, _: f64, _: f64| 1.0;
        let mesh = build_mesh(&params, &high);

        // Every corner sits at max_height or above, so no cell falls in raw band 0
        let center_cell = (4 * params.grid + 4) as usize;
        let first = &mesh.triangles[2 * center_cell];
        let second = &mesh.triangles[2 * center_cell + 1];
        // (v1, v3, v4) then (v1, v4, v2)
        let sum = first.vertices[0] + first.vertices[1] + first.vertices[2] + second.vertices[2];
        let raw = (sum.length() / (4.0 * params.cell_size)).floor() as u32;
        assert!(raw > 0);

        assert_eq!(first.material_index, 0);
        assert_eq!(mesh.material_usage().len(), mesh.materials.len());
        assert!(mesh.material_usage().iter().all(|&count| count > 0));
    }

    #[test]
    fn test_mesh_material_names() {
        let mesh = build_mesh(&TerrainParams::mesh(), &flat);
        assert_eq!(mesh.materials[0].name, "Mesh Material 0");
    }

    #[test]
    #[should_panic(expected = "at least one cell")]
    fn test_mesh_rejects_empty_grid() {
        let params = TerrainParams {
            grid: 0,
            ..TerrainParams::mesh()
        };
        build_mesh(&params, &flat);
    }
}
