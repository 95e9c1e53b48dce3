//! Drift-tube (straw) hit.

use crate::ca::{piecewise_closest_approach, CaHint, CaStatus, ClosestApproachData};
use crate::fit::{Chisq, MetaIterConfig};
use crate::params::{Parameters, Weights};
use crate::residual::Residual;
use crate::trajectory::{Line, PiecewiseTrajectory};
use crate::vectors::ParamVec;
use crate::{Error, Result};

use super::{residual_chisq, residual_weight};

/// A drift-time measurement in a wire chamber straw.
///
/// The wire line's anchor time carries the measured signal time; the
/// residual compares the time difference at closest approach with the
/// drift-time prediction at the DOCA. The left/right ambiguity is frozen
/// from the reference trajectory once the |DOCA| exceeds the ambiguity
/// cut; below the cut the hit is deactivated.
#[derive(Clone, Debug)]
pub struct StrawHit {
    wire: Line,
    /// Drift speed (mm/ns).
    vdrift: f64,
    /// Drift-time measurement variance (ns^2).
    tvar: f64,
    /// Minimum |DOCA| (mm) resolving the ambiguity.
    ambig_cut: f64,
    /// Resolved left/right sign; 0 while unresolved.
    ambig: f64,
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

impl StrawHit {
    /// Construct and linearize against the reference trajectory.
    ///
    /// The wire anchor time is the measured signal time, which trails the
    /// particle crossing by the drift time; that offset can exceed a
    /// helix period, so the caller supplies the crossing-time hint
    /// explicitly.
    pub fn new(
        wire: Line,
        vdrift: f64,
        tvar: f64,
        ambig_cut: f64,
        reference: &PiecewiseTrajectory,
        hint: CaHint,
        precision: f64,
        max_iter: usize,
    ) -> Result<Self> {
        if !(vdrift.is_finite() && vdrift > 0.0) {
            return Err(Error::InvalidArgument("drift speed must be positive".into()));
        }
        let mut hit = Self {
            wire,
            vdrift,
            tvar,
            ambig_cut,
            ambig: 0.0,
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

    pub fn wire(&self) -> &Line {
        &self.wire
    }

    pub fn drift_speed(&self) -> f64 {
        self.vdrift
    }

    /// Resolved left/right sign; 0 while unresolved.
    pub fn ambig(&self) -> f64 {
        self.ambig
    }

    pub fn time(&self) -> f64 {
        self.tpdata.particle_toca
    }

    pub fn active(&self) -> bool {
        self.active && self.ambig != 0.0
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

    /// Recompute the closest approach, ambiguity, and residual against a
    /// new reference trajectory.
    pub fn update(&mut self, reference: &PiecewiseTrajectory) -> Result<()> {
        let hint = if self.refresh_hint && self.tpdata.usable() {
            CaHint::new(self.tpdata.particle_toca, self.tpdata.sensor_toca)
        } else {
            self.hint
        };
        let (pca, index) =
            piecewise_closest_approach(reference, &self.wire, &hint, self.precision, self.max_iter);
        if !pca.usable() {
            return Err(Error::PcaFailure(pca.status));
        }
        self.ref_params = *reference.pieces()[index].params().parameters();
        self.ambig = if pca.doca.abs() > self.ambig_cut { pca.doca.signum() } else { 0.0 };
        // drift prediction is linear in the signed DOCA at fixed ambiguity
        let value = pca.deltat() + self.ambig * pca.doca / self.vdrift;
        let drdp = -(pca.dtdp + pca.dddp * (self.ambig / self.vdrift));
        self.rresid = Residual::new(value, self.tvar, drdp);
        self.tpdata = pca;
        Ok(())
    }

    pub fn update_state(&mut self, miconfig: &MetaIterConfig) {
        self.wscale = miconfig.weight_scale();
    }

    pub fn weight(&self) -> Weights {
        if !self.active() {
            return Weights::default();
        }
        residual_weight(&[&self.rresid], &self.ref_params, self.wscale)
    }

    pub fn chisq(&self, pdata: &Parameters) -> Chisq {
        if !self.active() {
            return Chisq::default();
        }
        residual_chisq(&[&self.rresid], &self.ref_params, pdata, self.wscale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::C_LIGHT;
    use crate::time_range::TimeRange;
    use crate::trajectory::{LoopHelix, MomBasis};
    use crate::vectors::{Mom4, Vec4};
    use approx::assert_relative_eq;

    const VDRIFT: f64 = 0.065;

    fn reference() -> PiecewiseTrajectory {
        let mom4 = Mom4::new(60.0, 30.0, 80.0, 105.66);
        let helix = LoopHelix::new(Vec4::zeros(), mom4, 1, 1.0, TimeRange::infinite()).unwrap();
        PiecewiseTrajectory::new(helix)
    }

    /// Wire offset by `gap` along perpdir, anchored at the measured
    /// arrival time of the drifted signal.
    fn wire_line(reference: &PiecewiseTrajectory, time: f64, gap: f64, tnoise: f64) -> Line {
        let pos = reference.position3(time);
        let docadir = reference.direction(time, MomBasis::PerpDir);
        let wdir = reference.direction(time, MomBasis::PhiDir);
        let tmeas = time + gap.abs() / VDRIFT + tnoise;
        Line::new(pos + docadir * gap, tmeas, wdir * (0.9 * C_LIGHT), 800.0).unwrap()
    }

    #[test]
    fn test_consistent_drift_measurement() {
        let reference = reference();
        let wire = wire_line(&reference, 1.5, 1.0, 0.0);
        let hint = CaHint::new(1.5, wire.t0());
        let hit = StrawHit::new(wire, VDRIFT, 9.0, 0.25, &reference, hint, 1e-8, 10).unwrap();
        assert!(hit.active());
        assert_eq!(hit.ambig().abs(), 1.0);
        assert!(hit.residual().value().abs() < 1e-6, "residual {}", hit.residual().value());
    }

    #[test]
    fn test_drift_noise_appears_in_residual() {
        let reference = reference();
        let tnoise = 2.0;
        let wire = wire_line(&reference, 1.5, 1.0, tnoise);
        let hint = CaHint::new(1.5, wire.t0());
        let hit = StrawHit::new(wire, VDRIFT, 9.0, 0.25, &reference, hint, 1e-8, 10).unwrap();
        assert_relative_eq!(hit.residual().value(), -tnoise, epsilon = 1e-6);
    }

    #[test]
    fn test_small_doca_deactivates() {
        let reference = reference();
        let wire = wire_line(&reference, 1.5, 0.1, 0.0);
        let hint = CaHint::new(1.5, wire.t0());
        let hit = StrawHit::new(wire, VDRIFT, 9.0, 0.25, &reference, hint, 1e-8, 10).unwrap();
        assert_eq!(hit.ambig(), 0.0);
        assert!(!hit.active());
        assert_eq!(hit.weight(), Weights::default());
    }
}
