//! Scintillator time hit.

use crate::ca::{piecewise_closest_approach, CaHint, CaStatus, ClosestApproachData};
use crate::fit::{Chisq, MetaIterConfig};
use crate::params::{Parameters, Weights};
use crate::residual::Residual;
use crate::trajectory::{Line, PiecewiseTrajectory};
use crate::vectors::ParamVec;
use crate::{Error, Result};

use super::{residual_chisq, residual_weight};

/// A time measurement along a scintillator sensor axis.
///
/// The sensor axis line encapsulates both the measured time (through its
/// anchor time) and the light propagation model (through its speed). The
/// residual is the time difference at closest approach; its variance
/// couples the intrinsic time resolution to the transverse sensor size
/// through the relative direction of track and sensor.
#[derive(Clone, Debug)]
pub struct ScintHit {
    saxis: Line,
    tvar: f64,
    wvar: f64,
    active: bool,
    refresh_hint: bool,
    hint: CaHint,
    precision: f64,
    max_iter: usize,
    wscale: f64,
    tpdata: ClosestApproachData,
    rresid: Residual,
    ref_params: ParamVec,
}

impl ScintHit {
    /// Construct and linearize against the reference trajectory. The
    /// measured time doubles as the closest-approach hint: light
    /// propagation is fast on the scale of a helix period.
    ///
    /// `tvar` is the time measurement variance (ns^2), `wvar` the
    /// transverse sensor size variance (mm^2).
    pub fn new(
        saxis: Line,
        tvar: f64,
        wvar: f64,
        reference: &PiecewiseTrajectory,
        precision: f64,
        max_iter: usize,
    ) -> Result<Self> {
        let hint = CaHint::new(saxis.t0(), saxis.t0());
        let mut hit = Self {
            saxis,
            tvar,
            wvar,
            active: true,
            refresh_hint: false,
            hint,
            precision,
            max_iter,
            wscale: 1.0,
            tpdata: ClosestApproachData::unusable(CaStatus::Failed),
            rresid: Residual::default(),
            ref_params: ParamVec::zeros(),
        };
        hit.update(reference)?;
        Ok(hit)
    }

    pub fn sensor_axis(&self) -> &Line {
        &self.saxis
    }

    pub fn time_variance(&self) -> f64 {
        self.tvar
    }

    pub fn width_variance(&self) -> f64 {
        self.wvar
    }

    pub fn time(&self) -> f64 {
        self.tpdata.particle_toca
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn set_refresh_hint(&mut self, refresh: bool) {
        self.refresh_hint = refresh;
    }

    pub fn closest_approach(&self) -> &ClosestApproachData {
        &self.tpdata
    }

    pub fn residual(&self) -> &Residual {
        &self.rresid
    }

    /// Recompute the closest approach and residual against a new
    /// reference trajectory.
    pub fn update(&mut self, reference: &PiecewiseTrajectory) -> Result<()> {
        // by default the hint is not carried over from the previous
        // iteration: a poor seed time can push the solve onto the wrong
        // helix loop, from which it cannot recover
        let hint = if self.refresh_hint && self.tpdata.usable() {
            CaHint::new(self.tpdata.particle_toca, self.tpdata.sensor_toca)
        } else {
            self.hint
        };
        let (pca, index) =
            piecewise_closest_approach(reference, &self.saxis, &hint, self.precision, self.max_iter);
        if !pca.usable() {
            return Err(Error::PcaFailure(pca.status));
        }
        self.ref_params = *reference.pieces()[index].params().parameters();
        let dd2 = pca.dirdot * pca.dirdot;
        let speed2 = self.saxis.speed() * self.saxis.speed();
        let totvar = self.tvar + self.wvar * dd2 / (speed2 * (1.0 - dd2));
        self.rresid = Residual::new(pca.deltat(), totvar, -pca.dtdp);
        self.tpdata = pca;
        Ok(())
    }

    pub fn update_state(&mut self, miconfig: &MetaIterConfig) {
        self.wscale = miconfig.weight_scale();
    }

    pub fn weight(&self) -> Weights {
        if !self.active {
            return Weights::default();
        }
        residual_weight(&[&self.rresid], &self.ref_params, self.wscale)
    }

    pub fn chisq(&self, pdata: &Parameters) -> Chisq {
        if !self.active {
            return Chisq::default();
        }
        residual_chisq(&[&self.rresid], &self.ref_params, pdata, self.wscale)
    }
}
