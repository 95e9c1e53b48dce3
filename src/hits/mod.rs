//! Hit models.
//!
//! A hit owns one or more residuals computed from the closest approach of
//! the reference trajectory to its sensor, and contributes their
//! information to the fit. The supported kinds form a closed set
//! dispatched without vtable lookups.

mod scint;
mod straw;

pub use scint::ScintHit;
pub use straw::StrawHit;

use crate::ca::ClosestApproachData;
use crate::fit::{Chisq, MetaIterConfig};
use crate::params::{Parameters, Weights};
use crate::residual::Residual;
use crate::trajectory::PiecewiseTrajectory;
use crate::vectors::{ParamMat, ParamVec};
use crate::Result;

/// Closed set of hit kinds with inline dispatch.
#[derive(Clone, Debug)]
pub enum Hit {
    Scint(ScintHit),
    Straw(StrawHit),
}

impl Hit {
    #[inline]
    pub fn time(&self) -> f64 {
        match self {
            Hit::Scint(h) => h.time(),
            Hit::Straw(h) => h.time(),
        }
    }

    #[inline]
    pub fn active(&self) -> bool {
        match self {
            Hit::Scint(h) => h.active(),
            Hit::Straw(h) => h.active(),
        }
    }

    pub fn set_active(&mut self, active: bool) {
        match self {
            Hit::Scint(h) => h.set_active(active),
            Hit::Straw(h) => h.set_active(active),
        }
    }

    pub fn set_refresh_hint(&mut self, refresh: bool) {
        match self {
            Hit::Scint(h) => h.set_refresh_hint(refresh),
            Hit::Straw(h) => h.set_refresh_hint(refresh),
        }
    }

    /// Re-linearize against a new reference trajectory.
    pub fn update(&mut self, reference: &PiecewiseTrajectory) -> Result<()> {
        match self {
            Hit::Scint(h) => h.update(reference),
            Hit::Straw(h) => h.update(reference),
        }
    }

    /// Apply the meta-iteration state (annealing temperature).
    pub fn update_state(&mut self, miconfig: &MetaIterConfig) {
        match self {
            Hit::Scint(h) => h.update_state(miconfig),
            Hit::Straw(h) => h.update_state(miconfig),
        }
    }

    /// Information contribution of this hit.
    pub fn weight(&self) -> Weights {
        match self {
            Hit::Scint(h) => h.weight(),
            Hit::Straw(h) => h.weight(),
        }
    }

    /// Consistency of a parameter set with this hit's residuals.
    pub fn chisq(&self, pdata: &Parameters) -> Chisq {
        match self {
            Hit::Scint(h) => h.chisq(pdata),
            Hit::Straw(h) => h.chisq(pdata),
        }
    }

    pub fn residual(&self) -> &Residual {
        match self {
            Hit::Scint(h) => h.residual(),
            Hit::Straw(h) => h.residual(),
        }
    }

    pub fn closest_approach(&self) -> &ClosestApproachData {
        match self {
            Hit::Scint(h) => h.closest_approach(),
            Hit::Straw(h) => h.closest_approach(),
        }
    }
}

/// Assemble the information contribution of a set of residuals
/// linearized at `refpar`, with the annealing weight scale applied.
///
/// `W = sum dRdP dRdP^T / var`, `w = W p_ref + sum dRdP value / var`; the
/// reference term makes the information absolute in parameter space.
pub(crate) fn residual_weight(resids: &[&Residual], refpar: &ParamVec, wscale: f64) -> Weights {
    let mut wmat = ParamMat::zeros();
    let mut corr = ParamVec::zeros();
    for resid in resids {
        let ivar = wscale / resid.variance();
        wmat += resid.drdp() * resid.drdp().transpose() * ivar;
        corr += resid.drdp() * (resid.value() * ivar);
    }
    Weights::new(wmat, wmat * refpar + corr)
}

/// Chi-squared of a set of residuals against a parameter set.
pub(crate) fn residual_chisq(
    resids: &[&Residual],
    refpar: &ParamVec,
    pdata: &Parameters,
    wscale: f64,
) -> Chisq {
    let dp = pdata.parameters() - refpar;
    let mut total = Chisq::default();
    for resid in resids {
        let r = resid.at(&dp);
        total += Chisq::new(r * r * wscale / resid.variance(), 1);
    }
    total
}
