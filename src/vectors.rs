//! Vector type aliases and four-vector conventions.
//!
//! All linear algebra is statically sized nalgebra. Four-vectors are plain
//! `Vector4` with fixed slot conventions: a space-time point is
//! `[x, y, z, t]` and a four-momentum is `[px, py, pz, mass]`.

use nalgebra::{SMatrix, SVector, Vector3, Vector4};

/// Spatial 3-vector (mm) or momentum 3-vector (MeV/c).
pub type Vec3 = Vector3<f64>;

/// Space-time point `[x, y, z, t]` in (mm, mm, mm, ns).
pub type Vec4 = Vector4<f64>;

/// Four-momentum `[px, py, pz, mass]` in (MeV/c, MeV/c, MeV/c, MeV/c^2).
pub type Mom4 = Vector4<f64>;

/// Number of helix parameters.
pub const NPARAMS: usize = 6;

/// Fixed-size parameter vector.
pub type ParamVec = SVector<f64, NPARAMS>;

/// Symmetric parameter-space matrix (covariance or weight).
pub type ParamMat = SMatrix<f64, NPARAMS, NPARAMS>;

/// Derivatives of the parameters with respect to a 3-vector
/// (position or momentum).
pub type ParDer3 = SMatrix<f64, NPARAMS, 3>;

/// Derivatives of a 3-vector with respect to the parameters.
pub type Der3Par = SMatrix<f64, 3, NPARAMS>;

/// Spatial part of a space-time point or four-momentum.
#[inline]
pub fn spatial(v: &Vec4) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}

/// Build a space-time point from a position and a time.
#[inline]
pub fn four_pos(pos: &Vec3, t: f64) -> Vec4 {
    Vec4::new(pos[0], pos[1], pos[2], t)
}

/// Build a four-momentum from a momentum vector and a mass.
#[inline]
pub fn four_mom(mom: &Vec3, mass: f64) -> Mom4 {
    Mom4::new(mom[0], mom[1], mom[2], mass)
}

/// Transverse magnitude of a 3-vector.
#[inline]
pub fn perp(v: &Vec3) -> f64 {
    v[0].hypot(v[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_four_vector_slots() {
        let p = four_pos(&Vec3::new(1.0, 2.0, 3.0), 4.0);
        assert_relative_eq!(p[3], 4.0, epsilon = 1e-12);
        assert_relative_eq!(spatial(&p)[2], 3.0, epsilon = 1e-12);

        let m = four_mom(&Vec3::new(3.0, 4.0, 0.0), 0.511);
        assert_relative_eq!(perp(&spatial(&m)), 5.0, epsilon = 1e-12);
        assert_relative_eq!(m[3], 0.511, epsilon = 1e-12);
    }
}
