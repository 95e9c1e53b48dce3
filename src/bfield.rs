//! Magnetic field point queries.
//!
//! The fit only ever asks for the field vector at a position; the concrete
//! map lives outside the core. Two simple implementations cover the test
//! drivers: a uniform field and a linear z-gradient.

use crate::vectors::Vec3;

/// A magnetic field map, queried by position. Implementations are
/// immutable and may be shared read-only between fits.
pub trait BFieldMap: Send + Sync {
    /// Field vector (Tesla) at a position (mm).
    fn field_at(&self, pos: &Vec3) -> Vec3;
}

/// A spatially uniform field.
#[derive(Clone, Copy, Debug)]
pub struct UniformBFieldMap {
    field: Vec3,
}

impl UniformBFieldMap {
    pub fn new(field: Vec3) -> Self {
        Self { field }
    }

    /// Uniform field along z.
    pub fn along_z(bz: f64) -> Self {
        Self { field: Vec3::new(0.0, 0.0, bz) }
    }
}

impl BFieldMap for UniformBFieldMap {
    fn field_at(&self, _pos: &Vec3) -> Vec3 {
        self.field
    }
}

/// A field with a linear gradient in Bz between two z planes, constant
/// outside them.
#[derive(Clone, Copy, Debug)]
pub struct GradBFieldMap {
    b0: f64,
    b1: f64,
    z0: f64,
    z1: f64,
}

impl GradBFieldMap {
    pub fn new(b0: f64, b1: f64, z0: f64, z1: f64) -> Self {
        Self { b0, b1, z0, z1 }
    }
}

impl BFieldMap for GradBFieldMap {
    fn field_at(&self, pos: &Vec3) -> Vec3 {
        let z = pos[2].max(self.z0).min(self.z1);
        let frac = (z - self.z0) / (self.z1 - self.z0);
        Vec3::new(0.0, 0.0, self.b0 + frac * (self.b1 - self.b0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_uniform_field() {
        let bf = UniformBFieldMap::along_z(1.0);
        let b = bf.field_at(&Vec3::new(100.0, -50.0, 3000.0));
        assert_relative_eq!(b[2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(b[0], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gradient_field() {
        let bf = GradBFieldMap::new(0.9, 1.1, -1000.0, 1000.0);
        assert_relative_eq!(bf.field_at(&Vec3::zeros())[2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(bf.field_at(&Vec3::new(0.0, 0.0, -1000.0))[2], 0.9, epsilon = 1e-12);
        // constant outside the gradient region
        assert_relative_eq!(bf.field_at(&Vec3::new(0.0, 0.0, 5000.0))[2], 1.1, epsilon = 1e-12);
    }
}
