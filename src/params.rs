//! Parameter-space state in its two algebraic forms.
//!
//! `Parameters` is the (value, covariance) form used to materialize
//! trajectory pieces; `Weights` is the information form `(W, W*p)` in which
//! Kalman sweeps accumulate, because independent measurements add there.
//! Conversion between the two is exact whenever the matrix is positive
//! definite, and is an error otherwise.

use crate::vectors::{ParamMat, ParamVec};
use crate::{Error, Result};

/// Index of a loop-helix parameter in storage order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamIndex {
    /// Signed transverse radius (mm).
    Rad = 0,
    /// Signed longitudinal wavelength per radian (mm).
    Lam = 1,
    /// X coordinate of the helix axis (mm).
    Cx = 2,
    /// Y coordinate of the helix axis (mm).
    Cy = 3,
    /// Azimuth at the z=0 crossing (radians).
    Phi0 = 4,
    /// Time at the z=0 crossing (ns).
    T0 = 5,
}

impl ParamIndex {
    pub const ALL: [ParamIndex; 6] = [
        ParamIndex::Rad,
        ParamIndex::Lam,
        ParamIndex::Cx,
        ParamIndex::Cy,
        ParamIndex::Phi0,
        ParamIndex::T0,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ParamIndex::Rad => "Radius",
            ParamIndex::Lam => "Lambda",
            ParamIndex::Cx => "CenterX",
            ParamIndex::Cy => "CenterY",
            ParamIndex::Phi0 => "Phi0",
            ParamIndex::T0 => "Time0",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ParamIndex::Rad => "Transverse Radius",
            ParamIndex::Lam => "Longitudinal Wavelength",
            ParamIndex::Cx => "Cylinder Center X",
            ParamIndex::Cy => "Cylinder Center Y",
            ParamIndex::Phi0 => "Azimuth at Z=0 Plane",
            ParamIndex::T0 => "Time at Z=0 Plane",
        }
    }
}

/// Parameter vector with its covariance.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameters {
    params: ParamVec,
    cov: ParamMat,
}

impl Default for Parameters {
    fn default() -> Self {
        Self { params: ParamVec::zeros(), cov: ParamMat::zeros() }
    }
}

impl Parameters {
    pub fn new(params: ParamVec, cov: ParamMat) -> Self {
        Self { params, cov }
    }

    pub fn parameters(&self) -> &ParamVec {
        &self.params
    }

    pub fn parameters_mut(&mut self) -> &mut ParamVec {
        &mut self.params
    }

    pub fn covariance(&self) -> &ParamMat {
        &self.cov
    }

    pub fn covariance_mut(&mut self) -> &mut ParamMat {
        &mut self.cov
    }

    /// Diagonal sigma of one parameter.
    pub fn sigma(&self, index: ParamIndex) -> f64 {
        self.cov[(index as usize, index as usize)].sqrt()
    }

    /// Scale the covariance, leaving the values unchanged. Used to
    /// deweight a seed estimate into a loose prior.
    pub fn deweighted(&self, factor: f64) -> Self {
        Self { params: self.params, cov: self.cov * factor }
    }
}

/// Information-form state: weight matrix `W = C^-1` and weight vector
/// `w = W * p`.
#[derive(Clone, Debug, PartialEq)]
pub struct Weights {
    wmat: ParamMat,
    wvec: ParamVec,
}

impl Default for Weights {
    fn default() -> Self {
        Self { wmat: ParamMat::zeros(), wvec: ParamVec::zeros() }
    }
}

impl Weights {
    pub fn new(wmat: ParamMat, wvec: ParamVec) -> Self {
        Self { wmat, wvec }
    }

    pub fn weight_matrix(&self) -> &ParamMat {
        &self.wmat
    }

    pub fn weight_vector(&self) -> &ParamVec {
        &self.wvec
    }

    /// Add another information contribution.
    pub fn accumulate(&mut self, other: &Weights) {
        self.wmat += other.wmat;
        self.wvec += other.wvec;
    }
}

impl std::ops::AddAssign<&Weights> for Weights {
    fn add_assign(&mut self, other: &Weights) {
        self.accumulate(other);
    }
}

impl TryFrom<&Weights> for Parameters {
    type Error = Error;

    /// Invert the information form. Fails when the weight matrix is not
    /// positive definite, i.e. the state is not yet fully constrained.
    fn try_from(w: &Weights) -> Result<Parameters> {
        let chol = w.wmat.cholesky().ok_or(Error::NonPositiveDefinite)?;
        let params = chol.solve(&w.wvec);
        let cov = chol.inverse();
        Ok(Parameters { params, cov })
    }
}

impl TryFrom<&Parameters> for Weights {
    type Error = Error;

    fn try_from(p: &Parameters) -> Result<Weights> {
        let chol = p.cov.cholesky().ok_or(Error::NonPositiveDefinite)?;
        let wmat = chol.inverse();
        let wvec = wmat * p.params;
        Ok(Weights { wmat, wvec })
    }
}
