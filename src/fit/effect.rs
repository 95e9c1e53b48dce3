//! Kalman effects.
//!
//! An effect is a contribution to the fit at a specific time: a
//! measurement adds information, a material crossing shifts the
//! parameters and adds process noise. The two kinds form a closed set
//! dispatched inline.

use crate::constants::TBUFF;
use crate::hits::Hit;
use crate::material::ElementXing;
use crate::params::{Parameters, Weights};
use crate::time_range::TimeRange;
use crate::trajectory::{LoopHelix, MomBasis, PiecewiseTrajectory};
use crate::vectors::ParamVec;
use crate::Result;

use super::{Chisq, FitState, MetaIterConfig, TimeDir};

/// Which sweeps have processed an effect since its last update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProcessedState {
    #[default]
    Unprocessed,
    Forward,
    Backward,
    Both,
}

impl ProcessedState {
    fn mark(&mut self, tdir: TimeDir) {
        *self = match (*self, tdir) {
            (ProcessedState::Unprocessed, TimeDir::Forwards) => ProcessedState::Forward,
            (ProcessedState::Unprocessed, TimeDir::Backwards) => ProcessedState::Backward,
            (ProcessedState::Forward, TimeDir::Backwards) => ProcessedState::Both,
            (ProcessedState::Backward, TimeDir::Forwards) => ProcessedState::Both,
            (state, _) => state,
        };
    }
}

/// A measurement effect wrapping a hit.
#[derive(Clone, Debug)]
pub struct Measurement {
    hit: Hit,
    state: ProcessedState,
}

impl Measurement {
    pub fn new(hit: Hit) -> Self {
        Self { hit, state: ProcessedState::default() }
    }

    pub fn hit(&self) -> &Hit {
        &self.hit
    }

    pub fn hit_mut(&mut self) -> &mut Hit {
        &mut self.hit
    }

    pub fn time(&self) -> f64 {
        self.hit.time()
    }

    pub fn active(&self) -> bool {
        self.hit.active()
    }

    /// Add the hit's information; sweep-direction independent.
    pub fn process(&mut self, fitstate: &mut FitState, tdir: TimeDir) -> Result<()> {
        if self.active() {
            fitstate.append_weight(&self.hit.weight());
        }
        self.state.mark(tdir);
        Ok(())
    }

    pub fn update(
        &mut self,
        reference: &PiecewiseTrajectory,
        miconfig: &MetaIterConfig,
    ) -> Result<()> {
        self.state = ProcessedState::default();
        self.hit.update_state(miconfig);
        self.hit.update(reference)
    }

    /// Measurements add no trajectory pieces.
    pub fn append(&mut self, _fit: &mut PiecewiseTrajectory) -> Result<()> {
        Ok(())
    }

    pub fn chisq(&self, pdata: &Parameters) -> Chisq {
        self.hit.chisq(pdata)
    }
}

/// A material effect wrapping a detector-element crossing.
///
/// The effect adds no information, only a parameter shift and process
/// noise, applied in parameter space.
#[derive(Clone, Debug)]
pub struct Material {
    xing: ElementXing,
    ref_piece: LoopHelix,
    mateff: Parameters,
    cache: Weights,
    vscale: f64,
    disabled: bool,
    state: ProcessedState,
}

impl Material {
    /// Create from a crossing and the reference trajectory it sits on.
    pub fn new(xing: ElementXing, reference: &PiecewiseTrajectory) -> Self {
        let ref_piece = reference.nearest_piece(xing.time()).clone();
        let mut mat = Self {
            xing,
            ref_piece,
            mateff: Parameters::default(),
            cache: Weights::default(),
            vscale: 1.0,
            disabled: false,
            state: ProcessedState::default(),
        };
        mat.update_cache();
        mat
    }

    pub fn element_xing(&self) -> &ElementXing {
        &self.xing
    }

    /// Parameter-space description of the crossing.
    pub fn effect(&self) -> &Parameters {
        &self.mateff
    }

    /// Smoothed information cached by the two sweeps.
    pub fn cache(&self) -> &Weights {
        &self.cache
    }

    /// The buffer orders this effect just after a coincident measurement.
    pub fn time(&self) -> f64 {
        self.xing.time() + TBUFF
    }

    pub fn active(&self) -> bool {
        !self.disabled && self.xing.active()
    }

    pub fn deactivate(&mut self) {
        self.disabled = true;
    }

    /// Transport the sweep state across the crossing.
    ///
    /// Forwards the cache is taken after processing, backwards before, so
    /// the combined cache never double-counts this effect's own noise.
    pub fn process(&mut self, fitstate: &mut FitState, tdir: TimeDir) -> Result<()> {
        if self.active() {
            match tdir {
                TimeDir::Forwards => {
                    fitstate.append_effect(&self.mateff, tdir)?;
                    self.cache += fitstate.weights();
                }
                TimeDir::Backwards => {
                    self.cache += fitstate.weights();
                    fitstate.append_effect(&self.mateff, tdir)?;
                }
            }
        }
        self.state.mark(tdir);
        Ok(())
    }

    pub fn update(
        &mut self,
        reference: &PiecewiseTrajectory,
        miconfig: &MetaIterConfig,
    ) -> Result<()> {
        self.vscale = miconfig.variance_scale;
        self.cache = Weights::default();
        self.ref_piece = reference.nearest_piece(self.xing.time()).clone();
        self.update_cache();
        self.state = ProcessedState::default();
        Ok(())
    }

    fn update_cache(&mut self) {
        self.mateff = Parameters::default();
        if !self.active() {
            return;
        }
        let time = self.xing.time();
        let (dmom, momvar) = self.xing.material_effects(&self.ref_piece, TimeDir::Forwards);
        let dpdm = self.ref_piece.dpar_dm(time);
        let mommag = self.ref_piece.momentum(time);
        for (idir, basis) in MomBasis::ALL.iter().enumerate() {
            let dir = self.ref_piece.direction(time, *basis);
            // parameter change per fractional momentum change along this
            // basis direction
            let pder: ParamVec = dpdm * dir * mommag;
            *self.mateff.parameters_mut() += pder * dmom[idir];
            *self.mateff.covariance_mut() += pder * pder.transpose() * (momvar[idir] * self.vscale);
        }
    }

    /// Materialize a new trajectory piece from the smoothed cache and
    /// append it after this crossing.
    pub fn append(&mut self, fit: &mut PiecewiseTrajectory) -> Result<()> {
        if self.active() {
            let time = self.time();
            let pars = Parameters::try_from(&self.cache)?;
            let mut piece = LoopHelix::with_parameters(pars, &self.ref_piece)?;
            // the absolute time can shift between iterations; keep the
            // piece extendable to the fit end
            piece.set_range(TimeRange::new(time, (time + TBUFF).max(fit.range().end())));
            fit.append(piece);
        }
        Ok(())
    }

    pub fn chisq(&self, _pdata: &Parameters) -> Chisq {
        Chisq::default()
    }
}

/// Closed set of effect kinds with inline dispatch, time-ordered by the
/// fit driver.
#[derive(Clone, Debug)]
pub enum Effect {
    Measurement(Measurement),
    Material(Material),
}

impl Effect {
    pub fn measurement(hit: Hit) -> Self {
        Effect::Measurement(Measurement::new(hit))
    }

    pub fn material(xing: ElementXing, reference: &PiecewiseTrajectory) -> Self {
        Effect::Material(Material::new(xing, reference))
    }

    #[inline]
    pub fn time(&self) -> f64 {
        match self {
            Effect::Measurement(e) => e.time(),
            Effect::Material(e) => e.time(),
        }
    }

    #[inline]
    pub fn active(&self) -> bool {
        match self {
            Effect::Measurement(e) => e.active(),
            Effect::Material(e) => e.active(),
        }
    }

    pub fn process(&mut self, fitstate: &mut FitState, tdir: TimeDir) -> Result<()> {
        match self {
            Effect::Measurement(e) => e.process(fitstate, tdir),
            Effect::Material(e) => e.process(fitstate, tdir),
        }
    }

    pub fn update(
        &mut self,
        reference: &PiecewiseTrajectory,
        miconfig: &MetaIterConfig,
    ) -> Result<()> {
        match self {
            Effect::Measurement(e) => e.update(reference, miconfig),
            Effect::Material(e) => e.update(reference, miconfig),
        }
    }

    pub fn append(&mut self, fit: &mut PiecewiseTrajectory) -> Result<()> {
        match self {
            Effect::Measurement(e) => e.append(fit),
            Effect::Material(e) => e.append(fit),
        }
    }

    pub fn chisq(&self, pdata: &Parameters) -> Chisq {
        match self {
            Effect::Measurement(e) => e.chisq(pdata),
            Effect::Material(e) => e.chisq(pdata),
        }
    }

    /// Remove the effect from the rest of the fit after a linearization
    /// failure.
    pub fn deactivate(&mut self) {
        match self {
            Effect::Measurement(e) => e.hit_mut().set_active(false),
            Effect::Material(e) => e.deactivate(),
        }
    }

    pub fn set_refresh_hint(&mut self, refresh: bool) {
        if let Effect::Measurement(e) = self {
            e.hit_mut().set_refresh_hint(refresh);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_range::TimeRange;
    use crate::vectors::{Mom4, ParamMat, Vec4};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn reference() -> PiecewiseTrajectory {
        let mom4 = Mom4::new(60.0, 30.0, 80.0, 105.66);
        let helix = LoopHelix::new(Vec4::zeros(), mom4, 1, 1.0, TimeRange::new(-10.0, 10.0))
            .unwrap();
        PiecewiseTrajectory::new(helix)
    }

    fn wall_material(reference: &PiecewiseTrajectory, time: f64) -> Material {
        let wall = Arc::new(crate::material::DetMaterial::straw_wall());
        let xing =
            ElementXing::new(time, vec![crate::material::MaterialXing::new(wall, 0.3)]);
        Material::new(xing, reference)
    }

    fn constrained_state(reference: &PiecewiseTrajectory) -> FitState {
        let pars = Parameters::new(
            *reference.front().params().parameters(),
            ParamMat::identity() * 1e-4,
        );
        FitState::new(Weights::try_from(&pars).unwrap())
    }

    #[test]
    fn test_material_effect_shifts_momentum_down() {
        let reference = reference();
        let mat = wall_material(&reference, 0.0);
        assert!(mat.active());
        // the parameter shift reduces |momentum|: project onto the
        // momentum-direction derivative
        let helix = reference.front();
        let momderiv = helix.mom_deriv(0.0, MomBasis::MomDir);
        let dfrac = momderiv.dot(mat.effect().parameters()) / momderiv.norm_squared();
        assert!(dfrac < 0.0, "momentum should shrink, got {dfrac}");
        // process noise is positive semi-definite: diagonal entries
        for i in 0..6 {
            assert!(mat.effect().covariance()[(i, i)] >= 0.0);
        }
    }

    #[test]
    fn test_material_process_ordering_keeps_cache_symmetric() {
        let reference = reference();
        // forwards: append then cache; backwards: cache then append.
        // with the same incoming state both orders must cache the same
        // information content apart from the effect noise itself.
        let mut fwd = wall_material(&reference, 0.0);
        let mut bwd = wall_material(&reference, 0.0);
        let mut fstate = constrained_state(&reference);
        let mut bstate = constrained_state(&reference);
        fwd.process(&mut fstate, TimeDir::Forwards).unwrap();
        bwd.process(&mut bstate, TimeDir::Backwards).unwrap();
        // the forward cache includes the transported state, the backward
        // cache the untransported one
        let fpars = Parameters::try_from(fwd.cache()).unwrap();
        let bpars = Parameters::try_from(bwd.cache()).unwrap();
        let shift = fpars.parameters() - bpars.parameters();
        let expected = fwd.effect().parameters();
        for i in 0..6 {
            assert_relative_eq!(shift[i], expected[i], epsilon = 1e-8);
        }
    }

    #[test]
    fn test_material_append_preserves_position_and_drops_momentum() {
        let reference = reference();
        let tsplit = 0.0;
        let mut mat = wall_material(&reference, tsplit);
        // run both sweeps so the cache holds the smoothed estimate
        let mut fstate = constrained_state(&reference);
        mat.process(&mut fstate, TimeDir::Forwards).unwrap();
        let mut bstate = constrained_state(&reference);
        mat.process(&mut bstate, TimeDir::Backwards).unwrap();
        let mut fit = PiecewiseTrajectory::new(reference.front().clone());
        mat.append(&mut fit).unwrap();
        assert_eq!(fit.pieces().len(), 2);
        // position continuous across the boundary
        let eps = 1e-6;
        let before = fit.position3(tsplit - eps);
        let after = fit.position3(tsplit + 2.0 * TBUFF + eps);
        for i in 0..3 {
            assert_relative_eq!(before[i], after[i], epsilon = 1e-3);
        }
    }

    #[test]
    fn test_inactive_crossing_is_inert() {
        let reference = reference();
        let xing = ElementXing::new(0.0, Vec::new());
        let mut mat = Material::new(xing, &reference);
        assert!(!mat.active());
        let mut state = FitState::default();
        // processing an inactive material through an empty state must not
        // touch the state (which would fail on inversion)
        assert!(mat.process(&mut state, TimeDir::Forwards).is_ok());
        let mut fit = PiecewiseTrajectory::new(reference.front().clone());
        mat.append(&mut fit).unwrap();
        assert_eq!(fit.pieces().len(), 1);
    }

    #[test]
    fn test_processed_state_tracking() {
        let reference = reference();
        let mut mat = wall_material(&reference, 0.0);
        assert_eq!(mat.state, ProcessedState::Unprocessed);
        let mut fstate = constrained_state(&reference);
        mat.process(&mut fstate, TimeDir::Forwards).unwrap();
        assert_eq!(mat.state, ProcessedState::Forward);
        mat.process(&mut fstate, TimeDir::Backwards).unwrap();
        assert_eq!(mat.state, ProcessedState::Both);
        mat.update(&reference, &MetaIterConfig::new(0, 1.0)).unwrap();
        assert_eq!(mat.state, ProcessedState::Unprocessed);
    }
}
