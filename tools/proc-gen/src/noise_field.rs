//! Scalar noise fields using the `noise` crate
//!
//! Generators only see the [`NoiseField`] trait, so any deterministic function can
//! stand in for Perlin noise (tests use flat or analytic fields).

use noise::{NoiseFn, Perlin};

/// A pure, deterministic 3D scalar field with values in `[-1, 1]`.
///
/// Coordinates wrap at the given periods; a period of zero disables wrapping on
/// that axis.
pub trait NoiseField {
    fn sample(&self, x: f64, y: f64, z: f64, period_x: u32, period_y: u32, period_z: u32) -> f64;
}

impl<F> NoiseField for F
where
    F: Fn(f64, f64, f64) -> f64,
{
    fn sample(&self, x: f64, y: f64, z: f64, period_x: u32, period_y: u32, period_z: u32) -> f64 {
        self(wrap(x, period_x), wrap(y, period_y), wrap(z, period_z)).clamp(-1.0, 1.0)
    }
}

/// Perlin noise field
#[derive(Clone)]
pub struct PerlinField {
    perlin: Perlin,
}

impl PerlinField {
    /// Create a Perlin field with the given seed
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
        }
    }
}

impl Default for PerlinField {
    fn default() -> Self {
        Self::new(0)
    }
}

impl NoiseField for PerlinField {
    fn sample(&self, x: f64, y: f64, z: f64, period_x: u32, period_y: u32, period_z: u32) -> f64 {
        let point = [wrap(x, period_x), wrap(y, period_y), wrap(z, period_z)];
        self.perlin.get(point).clamp(-1.0, 1.0)
    }
}

fn wrap(value: f64, period: u32) -> f64 {
    if period == 0 {
        value
    } else {
        value.rem_euclid(period as f64)
    }
}
