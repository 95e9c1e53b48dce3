//! Kinematic helix trajectory for a charged particle in a uniform field.
//!
//! The loop-helix parameterization describes the particle by its signed
//! transverse radius `rad`, signed longitudinal wavelength per radian
//! `lam`, the transverse axis position `(cx, cy)`, and the azimuth `phi0`
//! and time `t0` at the z=0 crossing. Curvature algebra is carried in mm
//! units: `mbar`, `pbar` and `ebar` are the mass, momentum and energy
//! scaled by the field, with `mbar` carrying the combined charge and
//! field sign.

use crate::constants::C_LIGHT;
use crate::params::{ParamIndex, Parameters};
use crate::time_range::TimeRange;
use crate::vectors::{
    four_mom, four_pos, perp, spatial, Der3Par, Mom4, ParDer3, ParamMat, ParamVec, Vec3, Vec4,
};
use crate::{Error, Result};

use std::f64::consts::TAU;

/// Named direction in the local momentum basis at a point on a trajectory.
///
/// The three directions form a right-handed orthonormal frame:
/// `momdir x perpdir = phidir`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MomBasis {
    /// Along the momentum.
    MomDir,
    /// Polar bending direction, perpendicular to the momentum and to
    /// `phidir`.
    PerpDir,
    /// Azimuthal bending direction, purely transverse.
    PhiDir,
}

impl MomBasis {
    pub const ALL: [MomBasis; 3] = [MomBasis::MomDir, MomBasis::PerpDir, MomBasis::PhiDir];
}

/// Smaller radii or wavelengths than this (mm) are degenerate: the
/// parameterization loses a dimension.
const MIN_PARAM: f64 = 1.0e-10;

/// A single helical trajectory piece with kinematic identity and a
/// validity range. Immutable after construction except for its range.
#[derive(Clone, Debug)]
pub struct LoopHelix {
    pars: Parameters,
    mass: f64,
    charge: i32,
    bnom: f64,
    mbar: f64,
    trange: TimeRange,
}

impl LoopHelix {
    /// Construct from a space-time point, four-momentum, charge (proton
    /// units) and nominal Bz (Tesla), via the closed-form inversion.
    pub fn new(pos: Vec4, mom: Mom4, charge: i32, bnom: f64, range: TimeRange) -> Result<Self> {
        if !(pos.iter().all(|v| v.is_finite()) && mom.iter().all(|v| v.is_finite())) {
            return Err(Error::InvalidArgument("non-finite position or momentum".into()));
        }
        if charge == 0 || bnom == 0.0 {
            return Err(Error::InvalidArgument("charge and nominal field must be non-zero".into()));
        }
        let mass = mom[3];
        let mom3 = spatial(&mom);
        let pt = perp(&mom3);
        let phibar = mom3[1].atan2(mom3[0]);
        // translation from MeV/c to curvature radius in mm, signed by the charge
        let momtorad = 1000.0 / (charge as f64 * bnom * C_LIGHT);
        let mbar = -mass * momtorad;
        let rad = -pt * momtorad;
        let lam = -mom3[2] * momtorad;
        if rad.abs() < MIN_PARAM || lam.abs() < MIN_PARAM {
            return Err(Error::DegenerateHelix { rad, lam });
        }
        let ebar = (rad * rad + lam * lam + mbar * mbar).sqrt();
        let omega = C_LIGHT.copysign(mbar) / ebar;
        let t0 = pos[3] - pos[2] / (omega * lam);
        // winding that minimizes the z displacement of the reference crossing
        let nwind = ((pos[2] / lam - phibar) / TAU).round();
        let phi0 = phibar - omega * (pos[3] - t0) + TAU * nwind;
        let cx = pos[0] + mom3[1] * momtorad;
        let cy = pos[1] - mom3[0] * momtorad;
        let params = ParamVec::from_row_slice(&[rad, lam, cx, cy, phi0, t0]);
        Ok(Self {
            pars: Parameters::new(params, ParamMat::zeros()),
            mass,
            charge,
            bnom,
            mbar,
            trange: range,
        })
    }

    /// Construct from explicit parameters and kinematic identity; the
    /// canonical inverse of parameter extraction.
    pub fn from_parameters(
        pars: Parameters,
        mass: f64,
        charge: i32,
        bnom: f64,
        range: TimeRange,
    ) -> Result<Self> {
        if charge == 0 || bnom == 0.0 {
            return Err(Error::InvalidArgument("charge and nominal field must be non-zero".into()));
        }
        let rad = pars.parameters()[ParamIndex::Rad as usize];
        let lam = pars.parameters()[ParamIndex::Lam as usize];
        if !rad.is_finite() || !lam.is_finite() {
            return Err(Error::InvalidArgument("non-finite helix parameters".into()));
        }
        if rad.abs() < MIN_PARAM || lam.abs() < MIN_PARAM {
            return Err(Error::DegenerateHelix { rad, lam });
        }
        let momtorad = 1000.0 / (charge as f64 * bnom * C_LIGHT);
        Ok(Self { pars, mass, charge, bnom, mbar: -mass * momtorad, trange: range })
    }

    /// Copy of `other` with overridden parameters; same kinematic identity
    /// and range.
    pub fn with_parameters(pars: Parameters, other: &LoopHelix) -> Result<Self> {
        Self::from_parameters(pars, other.mass, other.charge, other.bnom, other.trange)
    }

    // named parameter accessors
    pub fn param(&self, index: ParamIndex) -> f64 {
        self.pars.parameters()[index as usize]
    }
    pub fn rad(&self) -> f64 {
        self.param(ParamIndex::Rad)
    }
    pub fn lam(&self) -> f64 {
        self.param(ParamIndex::Lam)
    }
    pub fn cx(&self) -> f64 {
        self.param(ParamIndex::Cx)
    }
    pub fn cy(&self) -> f64 {
        self.param(ParamIndex::Cy)
    }
    pub fn phi0(&self) -> f64 {
        self.param(ParamIndex::Phi0)
    }
    pub fn t0(&self) -> f64 {
        self.param(ParamIndex::T0)
    }

    pub fn params(&self) -> &Parameters {
        &self.pars
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn charge(&self) -> i32 {
        self.charge
    }

    pub fn bnom(&self) -> f64 {
        self.bnom
    }

    /// Mass in mm; carries the combined charge and field sign.
    pub fn mbar(&self) -> f64 {
        self.mbar
    }

    /// Momentum in mm.
    pub fn pbar(&self) -> f64 {
        self.rad().hypot(self.lam())
    }

    /// Energy in mm.
    pub fn ebar(&self) -> f64 {
        let pb = self.pbar();
        (pb * pb + self.mbar * self.mbar).sqrt()
    }

    /// Signed angular frequency (radians/ns); the sign is set by the
    /// magnetic force.
    pub fn omega(&self) -> f64 {
        C_LIGHT.copysign(self.mbar) / self.ebar()
    }

    pub fn beta(&self) -> f64 {
        (self.pbar() / self.ebar()).abs()
    }

    pub fn gamma(&self) -> f64 {
        (self.ebar() / self.mbar).abs()
    }

    pub fn beta_gamma(&self) -> f64 {
        (self.pbar() / self.mbar).abs()
    }

    /// Rotation with respect to the z=0 crossing at a given time.
    pub fn dphi(&self, t: f64) -> f64 {
        self.omega() * (t - self.t0())
    }

    /// Absolute azimuth at a given time.
    pub fn phi(&self, t: f64) -> f64 {
        self.dphi(t) + self.phi0()
    }

    /// Scalar momentum in MeV/c.
    pub fn momentum(&self, _t: f64) -> f64 {
        (self.mass * self.pbar() / self.mbar).abs()
    }

    /// Energy in MeV.
    pub fn energy(&self, _t: f64) -> f64 {
        (self.mass * self.ebar() / self.mbar).abs()
    }

    /// Speed in mm/ns.
    pub fn speed(&self, _t: f64) -> f64 {
        C_LIGHT * self.beta()
    }

    pub fn position3(&self, t: f64) -> Vec3 {
        let df = self.dphi(t);
        let phival = df + self.phi0();
        Vec3::new(
            self.cx() + self.rad() * phival.sin(),
            self.cy() - self.rad() * phival.cos(),
            df * self.lam(),
        )
    }

    pub fn position4(&self, t: f64) -> Vec4 {
        four_pos(&self.position3(t), t)
    }

    pub fn momentum3(&self, t: f64) -> Vec3 {
        let phival = self.phi(t);
        let factor = self.mass / self.mbar;
        Vec3::new(
            factor * self.rad() * phival.cos(),
            factor * self.rad() * phival.sin(),
            factor * self.lam(),
        )
    }

    pub fn momentum4(&self, t: f64) -> Mom4 {
        four_mom(&self.momentum3(t), self.mass)
    }

    /// Velocity (mm/ns); the exact time derivative of `position3`.
    pub fn velocity(&self, t: f64) -> Vec3 {
        let phival = self.phi(t);
        let om = self.omega();
        Vec3::new(
            om * self.rad() * phival.cos(),
            om * self.rad() * phival.sin(),
            om * self.lam(),
        )
    }

    /// Unit vector of the local momentum basis at a given time.
    pub fn direction(&self, t: f64, basis: MomBasis) -> Vec3 {
        let phival = self.phi(t);
        match basis {
            MomBasis::MomDir => {
                let norm = 1.0 / self.pbar().copysign(self.mbar);
                Vec3::new(
                    self.rad() * phival.cos(),
                    self.rad() * phival.sin(),
                    self.lam(),
                ) * norm
            }
            MomBasis::PerpDir => {
                let norm = 1.0 / self.pbar().copysign(self.mbar);
                Vec3::new(
                    self.lam() * phival.cos(),
                    self.lam() * phival.sin(),
                    -self.rad(),
                ) * norm
            }
            MomBasis::PhiDir => Vec3::new(-phival.sin(), phival.cos(), 0.0),
        }
    }

    /// Acceleration (mm/ns^2); the exact time derivative of `velocity`.
    pub fn acceleration(&self, t: f64) -> Vec3 {
        let phival = self.phi(t);
        let om = self.omega();
        Vec3::new(-phival.sin(), phival.cos(), 0.0) * (om * om * self.rad())
    }

    /// Time derivative of the momentum direction; drives the curvature
    /// term of the closest-approach Jacobian.
    pub fn direction_rate(&self, t: f64) -> Vec3 {
        let phival = self.phi(t);
        let scale = self.rad() * self.omega() / self.pbar().copysign(self.mbar);
        Vec3::new(-phival.sin(), phival.cos(), 0.0) * scale
    }

    /// First-order parameter change corresponding to an infinitesimal
    /// fractional momentum change along a basis direction, at fixed
    /// position.
    pub fn mom_deriv(&self, t: f64, basis: MomBasis) -> ParamVec {
        let om = self.omega();
        let pb = self.pbar();
        let phival = self.phi(t);
        let dt = t - self.t0();
        let mut der = ParamVec::zeros();
        match basis {
            MomBasis::PerpDir => {
                // polar bending: momentum magnitude and position unchanged
                der[ParamIndex::Rad as usize] = self.lam();
                der[ParamIndex::Lam as usize] = -self.rad();
                der[ParamIndex::Cx as usize] = -self.lam() * phival.sin();
                der[ParamIndex::Cy as usize] = self.lam() * phival.cos();
                der[ParamIndex::Phi0 as usize] = -om * dt * self.rad() / self.lam();
                der[ParamIndex::T0 as usize] = -dt * self.rad() / self.lam();
            }
            MomBasis::PhiDir => {
                // azimuthal bending: radius, wavelength and t0 unchanged
                let sign = 1.0_f64.copysign(om);
                der[ParamIndex::Phi0 as usize] = sign * pb / self.rad();
                der[ParamIndex::Cx as usize] = -sign * pb * phival.cos();
                der[ParamIndex::Cy as usize] = -sign * pb * phival.sin();
            }
            MomBasis::MomDir => {
                // fractional momentum change: position and direction unchanged
                let bval = self.beta();
                der[ParamIndex::Rad as usize] = self.rad();
                der[ParamIndex::Lam as usize] = self.lam();
                der[ParamIndex::Cx as usize] = -self.rad() * phival.sin();
                der[ParamIndex::Cy as usize] = self.rad() * phival.cos();
                der[ParamIndex::Phi0 as usize] = om * dt;
                der[ParamIndex::T0 as usize] = dt * (1.0 - bval * bval);
            }
        }
        der
    }

    /// Derivatives of the position at fixed time with respect to the
    /// parameters: a 3x6 matrix with position rows and parameter columns.
    pub fn dx_dpar(&self, t: f64) -> Der3Par {
        let om = self.omega();
        let eb = self.ebar();
        let phival = self.phi(t);
        let (sphi, cphi) = phival.sin_cos();
        let dt = t - self.t0();
        let rad = self.rad();
        let lam = self.lam();
        // omega depends on rad and lam through ebar
        let domdr = -om * rad / (eb * eb);
        let domdl = -om * lam / (eb * eb);
        let mut dxdp = Der3Par::zeros();
        // x = cx + rad*sin(phi)
        dxdp[(0, ParamIndex::Rad as usize)] = sphi + rad * cphi * dt * domdr;
        dxdp[(0, ParamIndex::Lam as usize)] = rad * cphi * dt * domdl;
        dxdp[(0, ParamIndex::Cx as usize)] = 1.0;
        dxdp[(0, ParamIndex::Phi0 as usize)] = rad * cphi;
        dxdp[(0, ParamIndex::T0 as usize)] = -om * rad * cphi;
        // y = cy - rad*cos(phi)
        dxdp[(1, ParamIndex::Rad as usize)] = -cphi + rad * sphi * dt * domdr;
        dxdp[(1, ParamIndex::Lam as usize)] = rad * sphi * dt * domdl;
        dxdp[(1, ParamIndex::Cy as usize)] = 1.0;
        dxdp[(1, ParamIndex::Phi0 as usize)] = rad * sphi;
        dxdp[(1, ParamIndex::T0 as usize)] = -om * rad * sphi;
        // z = omega*(t-t0)*lam
        dxdp[(2, ParamIndex::Rad as usize)] = lam * dt * domdr;
        dxdp[(2, ParamIndex::Lam as usize)] = om * dt + lam * dt * domdl;
        dxdp[(2, ParamIndex::T0 as usize)] = -om * lam;
        dxdp
    }

    /// Derivatives of the momentum direction at fixed time with respect
    /// to the parameters: a 3x6 matrix with direction rows and parameter
    /// columns.
    pub fn dn_dpar(&self, t: f64) -> Der3Par {
        let om = self.omega();
        let eb = self.ebar();
        let pb = self.pbar();
        let phival = self.phi(t);
        let (sphi, cphi) = phival.sin_cos();
        let dt = t - self.t0();
        let rad = self.rad();
        let lam = self.lam();
        let sign = 1.0_f64.copysign(self.mbar);
        let domdr = -om * rad / (eb * eb);
        let domdl = -om * lam / (eb * eb);
        let pb3 = pb * pb * pb;
        // transverse fraction rad/pbar and longitudinal fraction lam/pbar
        // change with rad and lam; the azimuth changes through omega
        let mut dndp = Der3Par::zeros();
        dndp[(0, ParamIndex::Rad as usize)] =
            sign * (lam * lam / pb3 * cphi - rad / pb * sphi * dt * domdr);
        dndp[(1, ParamIndex::Rad as usize)] =
            sign * (lam * lam / pb3 * sphi + rad / pb * cphi * dt * domdr);
        dndp[(2, ParamIndex::Rad as usize)] = -sign * lam * rad / pb3;
        dndp[(0, ParamIndex::Lam as usize)] =
            sign * (-rad * lam / pb3 * cphi - rad / pb * sphi * dt * domdl);
        dndp[(1, ParamIndex::Lam as usize)] =
            sign * (-rad * lam / pb3 * sphi + rad / pb * cphi * dt * domdl);
        dndp[(2, ParamIndex::Lam as usize)] = sign * rad * rad / pb3;
        dndp[(0, ParamIndex::Phi0 as usize)] = -sign * rad / pb * sphi;
        dndp[(1, ParamIndex::Phi0 as usize)] = sign * rad / pb * cphi;
        dndp[(0, ParamIndex::T0 as usize)] = sign * rad / pb * sphi * om;
        dndp[(1, ParamIndex::T0 as usize)] = -sign * rad / pb * cphi * om;
        dndp
    }

    /// Derivatives of the parameters with respect to the momentum
    /// 3-vector (MeV/c): a 6x3 matrix assembled from the momentum-basis
    /// derivatives.
    pub fn dpar_dm(&self, t: f64) -> ParDer3 {
        let pmag = self.momentum(t);
        let mut dpdm = ParDer3::zeros();
        for basis in MomBasis::ALL {
            let dir = self.direction(t, basis);
            let der = self.mom_deriv(t, basis);
            dpdm += der * dir.transpose() / pmag;
        }
        dpdm
    }

    pub fn range(&self) -> &TimeRange {
        &self.trange
    }

    pub fn set_range(&mut self, range: TimeRange) {
        self.trange = range;
    }

    pub fn in_range(&self, t: f64) -> bool {
        self.trange.in_range(t)
    }
}

impl std::fmt::Display for LoopHelix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoopHelix parameters:")?;
        for (i, index) in ParamIndex::ALL.iter().enumerate() {
            if i > 0 {
                write!(f, " ,")?;
            }
            write!(f, " {} : {:.6}", index.name(), self.param(*index))?;
        }
        write!(f, " mass {} charge {}", self.mass, self.charge)
    }
}
