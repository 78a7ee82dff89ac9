//! Soft-body templates and creation settings
//!
//! A [`SoftBodySharedSettings`] is the template of a soft body: its particles,
//! faces, constraints and materials. Several [`SoftBodySettings`] may point at the
//! same template, each placing its own instance in the world.
//!
//! The update groups computed by [`SoftBodySharedSettings::optimize`] are derived
//! data. They are never persisted and must be recomputed after a template has
//! been read back.

use std::sync::{Arc, OnceLock};

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::layers::ObjectLayer;
use crate::material::PhysicsMaterial;

/// A simulated particle
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoftVertex {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Zero pins the vertex in place
    pub inv_mass: f32,
}

impl SoftVertex {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            inv_mass: 1.0,
        }
    }
}

/// Surface triangle, used for collision and pressure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftFace {
    pub vertex: [u32; 3],
    pub material_index: u32,
}

/// Distance constraint between two particles
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoftEdge {
    pub vertex: [u32; 2],
    pub rest_length: f32,
    pub compliance: f32,
}

/// Volume constraint over a tetrahedron
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoftVolume {
    pub vertex: [u32; 4],
    pub six_rest_volume: f32,
    pub compliance: f32,
}

/// Edge constraints partitioned so that no two edges in a group share a vertex.
///
/// Edges in one group can be solved independently of each other.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateGroups {
    pub edge_groups: Vec<Vec<u32>>,
}

impl UpdateGroups {
    pub fn edge_count(&self) -> usize {
        self.edge_groups.iter().map(Vec::len).sum()
    }
}

/// Soft-body template
#[derive(Clone, Debug, Default)]
pub struct SoftBodySharedSettings {
    pub vertices: Vec<SoftVertex>,
    pub faces: Vec<SoftFace>,
    pub edges: Vec<SoftEdge>,
    pub volumes: Vec<SoftVolume>,
    pub materials: Vec<Arc<PhysicsMaterial>>,
    optimized: OnceLock<UpdateGroups>,
}

impl SoftBodySharedSettings {
    pub fn new(
        vertices: Vec<SoftVertex>,
        faces: Vec<SoftFace>,
        edges: Vec<SoftEdge>,
        volumes: Vec<SoftVolume>,
        materials: Vec<Arc<PhysicsMaterial>>,
    ) -> Self {
        Self {
            vertices,
            faces,
            edges,
            volumes,
            materials,
            optimized: OnceLock::new(),
        }
    }

    /// Create a cube of `grid_size³` particles spaced `spacing` apart, centered on
    /// the origin.
    ///
    /// Particles are connected to their axis neighbours and across the diagonals
    /// of every grid square; the outer surface is triangulated.
    pub fn create_cube(grid_size: u32, spacing: f32) -> Self {
        assert!(grid_size >= 2, "cube needs at least 2 particles per side");
        assert!(spacing > 0.0, "cube spacing must be positive");

        let n = grid_size;
        let index = |x: u32, y: u32, z: u32| x + y * n + z * n * n;
        let half = 0.5 * spacing * (n - 1) as f32;

        let mut vertices = Vec::with_capacity((n * n * n) as usize);
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    let position = Vec3::new(x as f32, y as f32, z as f32) * spacing - half;
                    vertices.push(SoftVertex::new(position));
                }
            }
        }

        let mut pairs = Vec::new();
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    let v = index(x, y, z);
                    if x + 1 < n {
                        pairs.push([v, index(x + 1, y, z)]);
                    }
                    if y + 1 < n {
                        pairs.push([v, index(x, y + 1, z)]);
                    }
                    if z + 1 < n {
                        pairs.push([v, index(x, y, z + 1)]);
                    }
                    if x + 1 < n && y + 1 < n {
                        pairs.push([v, index(x + 1, y + 1, z)]);
                        pairs.push([index(x + 1, y, z), index(x, y + 1, z)]);
                    }
                    if x + 1 < n && z + 1 < n {
                        pairs.push([v, index(x + 1, y, z + 1)]);
                        pairs.push([index(x + 1, y, z), index(x, y, z + 1)]);
                    }
                    if y + 1 < n && z + 1 < n {
                        pairs.push([v, index(x, y + 1, z + 1)]);
                        pairs.push([index(x, y + 1, z), index(x, y, z + 1)]);
                    }
                }
            }
        }

        // Outer surface: the two faces perpendicular to each axis
        let last = n - 1;
        let mut quads = Vec::new();
        for a in 0..last {
            for b in 0..last {
                for side in [0, last] {
                    quads.push([
                        index(side, a, b),
                        index(side, a + 1, b),
                        index(side, a + 1, b + 1),
                        index(side, a, b + 1),
                    ]);
                    quads.push([
                        index(a, side, b),
                        index(a + 1, side, b),
                        index(a + 1, side, b + 1),
                        index(a, side, b + 1),
                    ]);
                    quads.push([
                        index(a, b, side),
                        index(a + 1, b, side),
                        index(a + 1, b + 1, side),
                        index(a, b + 1, side),
                    ]);
                }
            }
        }

        let edges = edges_from_pairs(&vertices, &pairs);
        let faces = outward_faces(&vertices, &quads, Vec3::ZERO);
        Self::new(vertices, faces, edges, Vec::new(), Vec::new())
    }

    /// Create a UV sphere with `num_theta` latitude steps and `num_phi` longitude
    /// steps.
    ///
    /// The surface is closed, so the sphere can be inflated with pressure.
    pub fn create_sphere(radius: f32, num_theta: u32, num_phi: u32) -> Self {
        assert!(radius > 0.0, "sphere radius must be positive");
        assert!(num_theta >= 2 && num_phi >= 3, "sphere tessellation too coarse");

        // Vertex 0 is the north pole, the last vertex the south pole, rings in between
        let rings = num_theta - 1;
        let ring_vertex = |ring: u32, step: u32| 1 + ring * num_phi + (step % num_phi);
        let south = 1 + rings * num_phi;

        let mut vertices = vec![SoftVertex::new(Vec3::Y * radius)];
        for ring in 0..rings {
            let theta = std::f32::consts::PI * (ring + 1) as f32 / num_theta as f32;
            for step in 0..num_phi {
                let phi = std::f32::consts::TAU * step as f32 / num_phi as f32;
                let direction = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
                vertices.push(SoftVertex::new(direction * radius));
            }
        }
        vertices.push(SoftVertex::new(Vec3::NEG_Y * radius));

        let mut pairs = Vec::new();
        let mut quads = Vec::new();
        let mut triangles = Vec::new();
        for step in 0..num_phi {
            pairs.push([0, ring_vertex(0, step)]);
            pairs.push([south, ring_vertex(rings - 1, step)]);
            triangles.push([0, ring_vertex(0, step), ring_vertex(0, step + 1)]);
            triangles.push([
                south,
                ring_vertex(rings - 1, step + 1),
                ring_vertex(rings - 1, step),
            ]);
        }
        for ring in 0..rings {
            for step in 0..num_phi {
                pairs.push([ring_vertex(ring, step), ring_vertex(ring, step + 1)]);
                if ring + 1 < rings {
                    pairs.push([ring_vertex(ring, step), ring_vertex(ring + 1, step)]);
                    pairs.push([ring_vertex(ring, step), ring_vertex(ring + 1, step + 1)]);
                    quads.push([
                        ring_vertex(ring, step),
                        ring_vertex(ring, step + 1),
                        ring_vertex(ring + 1, step + 1),
                        ring_vertex(ring + 1, step),
                    ]);
                }
            }
        }

        let edges = edges_from_pairs(&vertices, &pairs);
        let mut faces = outward_faces(&vertices, &quads, Vec3::ZERO);
        faces.extend(
            triangles
                .into_iter()
                .map(|vertex| orient_outward(&vertices, vertex, Vec3::ZERO)),
        );
        Self::new(vertices, faces, edges, Vec::new(), Vec::new())
    }

    /// Replace the material list
    pub fn with_materials(mut self, materials: Vec<Arc<PhysicsMaterial>>) -> Self {
        self.materials = materials;
        self
    }

    /// Compute the update groups if they have not been computed yet.
    ///
    /// Returns true when this call did the work, false when the template was
    /// already optimized.
    pub fn optimize(&self) -> bool {
        let mut computed = false;
        self.optimized.get_or_init(|| {
            computed = true;
            build_update_groups(&self.edges, self.vertices.len())
        });
        computed
    }

    pub fn is_optimized(&self) -> bool {
        self.optimized.get().is_some()
    }

    /// Update groups, `None` until [`optimize`](Self::optimize) has run
    pub fn update_groups(&self) -> Option<&UpdateGroups> {
        self.optimized.get()
    }
}

/// Everything needed to create one soft body from a (possibly shared) template.
#[derive(Clone, Debug)]
pub struct SoftBodySettings {
    pub settings: Arc<SoftBodySharedSettings>,
    pub position: Vec3,
    pub rotation: Quat,
    pub layer: ObjectLayer,
    /// Internal pressure; zero disables the pressure constraint
    pub pressure: f32,
    pub num_iterations: u32,
    pub linear_damping: f32,
    pub friction: f32,
    pub gravity_factor: f32,
}

impl SoftBodySettings {
    pub fn new(
        settings: Arc<SoftBodySharedSettings>,
        position: Vec3,
        rotation: Quat,
        layer: ObjectLayer,
    ) -> Self {
        Self {
            settings,
            position,
            rotation,
            layer,
            pressure: 0.0,
            num_iterations: 5,
            linear_damping: 0.1,
            friction: 0.2,
            gravity_factor: 1.0,
        }
    }
}

fn edges_from_pairs(vertices: &[SoftVertex], pairs: &[[u32; 2]]) -> Vec<SoftEdge> {
    pairs
        .iter()
        .map(|&[a, b]| SoftEdge {
            vertex: [a, b],
            rest_length: vertices[a as usize]
                .position
                .distance(vertices[b as usize].position),
            compliance: 0.0,
        })
        .collect()
}

fn outward_faces(vertices: &[SoftVertex], quads: &[[u32; 4]], center: Vec3) -> Vec<SoftFace> {
    quads
        .iter()
        .flat_map(|&[a, b, c, d]| {
            [
                orient_outward(vertices, [a, b, c], center),
                orient_outward(vertices, [a, c, d], center),
            ]
        })
        .collect()
}

fn orient_outward(vertices: &[SoftVertex], vertex: [u32; 3], center: Vec3) -> SoftFace {
    let [p0, p1, p2] = vertex.map(|v| vertices[v as usize].position);
    let normal = (p1 - p0).cross(p2 - p0);
    let outward = (p0 + p1 + p2) / 3.0 - center;
    let vertex = if normal.dot(outward) < 0.0 {
        [vertex[0], vertex[2], vertex[1]]
    } else {
        vertex
    };
    SoftFace {
        vertex,
        material_index: 0,
    }
}

/// Greedy edge colouring: each edge goes into the first group that does not
/// touch either of its vertices yet.
fn build_update_groups(edges: &[SoftEdge], vertex_count: usize) -> UpdateGroups {
    let mut edge_groups: Vec<Vec<u32>> = Vec::new();
    let mut used: Vec<Vec<bool>> = Vec::new();

    for (edge_index, edge) in edges.iter().enumerate() {
        let [a, b] = edge.vertex.map(|v| v as usize);
        let group = match used.iter().position(|u| !u[a] && !u[b]) {
            Some(group) => group,
            None => {
                edge_groups.push(Vec::new());
                used.push(vec![false; vertex_count]);
                edge_groups.len() - 1
            }
        };
        used[group][a] = true;
        used[group][b] = true;
        edge_groups[group].push(edge_index as u32);
    }

    UpdateGroups { edge_groups }
}
