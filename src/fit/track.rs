//! The fit driver: annealed meta-iteration around a bidirectional
//! information sweep.

use log::warn;

use crate::params::{Parameters, Weights};
use crate::trajectory::{LoopHelix, PiecewiseTrajectory};
use crate::vectors::{ParamMat, NPARAMS};

use super::{Chisq, Config, Effect, FailPolicy, FitState, MetaIterConfig, TimeDir};

/// Terminal state of a fit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FitStatus {
    /// The chi-squared change fell below the tolerance.
    Converged,
    /// The iteration cap was reached, or an iteration could not be
    /// completed (an information matrix failed to invert); the result
    /// holds the last good iterate.
    Unconverged,
    /// The fit was aborted by the failure policy; the result holds the
    /// last good iterate.
    Failed,
}

/// Result of a fit: the trajectory, its quality, and the effects with
/// their final linearizations.
#[derive(Debug)]
pub struct FitResult {
    pub pktraj: PiecewiseTrajectory,
    pub chisq: Chisq,
    pub status: FitStatus,
    pub iterations: usize,
    pub effects: Vec<Effect>,
}

impl FitResult {
    /// Smoothed parameters at the front of the fitted trajectory.
    pub fn front_params(&self) -> &Parameters {
        self.pktraj.front().params()
    }
}

/// Loose prior built from the seed estimate. A seed without a usable
/// covariance gets an uncorrelated one at the deweighted scale, so the
/// sweeps always start from invertible information.
fn seed_weight(seed: &Parameters, deweight: f64) -> Weights {
    Weights::try_from(&seed.deweighted(deweight)).unwrap_or_else(|_| {
        let wmat = ParamMat::identity() / deweight;
        Weights::new(wmat, wmat * seed.parameters())
    })
}

/// Run the meta-iteration loop over a seed trajectory and a set of
/// effects.
///
/// Each iteration re-linearizes every effect against the current
/// reference, sweeps the information state forward and backward through
/// the time-ordered effects, rebuilds the trajectory from the smoothed
/// information, and tests the global chi-squared for convergence.
/// Measurement variances start scaled by the annealing temperature, which
/// cools by `anneal_factor` each iteration until it reaches one.
pub fn run_fit(
    seed: &PiecewiseTrajectory,
    mut effects: Vec<Effect>,
    config: &Config,
) -> FitResult {
    for effect in &mut effects {
        effect.set_refresh_hint(config.refresh_ca_hint);
    }
    effects.sort_by(|a, b| a.time().total_cmp(&b.time()));
    let seedw = seed_weight(seed.front().params(), config.seed_deweight);

    let mut reference = seed.clone();
    let mut chisq = Chisq::default();
    let mut prev_chisq: Option<f64> = None;
    let mut temp = config.anneal_start.max(1.0);
    let mut status = FitStatus::Unconverged;
    let mut iterations = 0;

    'meta: for iter in 0..config.max_fit_iter {
        iterations = iter + 1;
        let miconfig = MetaIterConfig::new(iter, temp);

        // re-linearize every effect against the current reference
        for effect in &mut effects {
            if let Err(err) = effect.update(&reference, &miconfig) {
                match config.fail_policy {
                    FailPolicy::SkipEffect => {
                        warn!("effect update failed ({err}); deactivating");
                        effect.deactivate();
                    }
                    FailPolicy::Abort => {
                        status = FitStatus::Failed;
                        break 'meta;
                    }
                }
            }
        }

        // forward and backward information sweeps
        let mut fstate = FitState::new(seedw.clone());
        for effect in effects.iter_mut() {
            if effect.process(&mut fstate, TimeDir::Forwards).is_err() {
                status = FitStatus::Unconverged;
                break 'meta;
            }
        }
        let mut bstate = FitState::new(seedw.clone());
        for effect in effects.iter_mut().rev() {
            if effect.process(&mut bstate, TimeDir::Backwards).is_err() {
                status = FitStatus::Unconverged;
                break 'meta;
            }
        }

        // the completed backward state is the smoothed estimate at the
        // front; materialize it and let each effect extend the trajectory
        let front_pars = match Parameters::try_from(bstate.weights()) {
            Ok(pars) => pars,
            Err(_) => {
                status = FitStatus::Unconverged;
                break 'meta;
            }
        };
        let mut front = match LoopHelix::with_parameters(front_pars, reference.front()) {
            Ok(helix) => helix,
            Err(_) => {
                status = FitStatus::Unconverged;
                break 'meta;
            }
        };
        front.set_range(reference.range());
        let mut fit_traj = PiecewiseTrajectory::new(front);
        for effect in effects.iter_mut() {
            if effect.append(&mut fit_traj).is_err() {
                status = FitStatus::Unconverged;
                break 'meta;
            }
        }

        // global fit quality against the rebuilt trajectory
        let mut total = Chisq::default();
        for effect in &effects {
            total += effect.chisq(fit_traj.nearest_piece(effect.time()).params());
        }
        chisq = total;
        reference = fit_traj;

        // converge on relative chi-squared change, once annealing is done
        if let Some(prev) = prev_chisq {
            let dchisq = (prev - chisq.chisq()).abs();
            if temp <= 1.0 && dchisq < config.tolerance * prev.abs().max(1.0) {
                status = FitStatus::Converged;
                break;
            }
        }
        prev_chisq = Some(chisq.chisq());
        temp = (temp * config.anneal_factor).max(1.0);
    }

    FitResult {
        pktraj: reference,
        chisq: chisq.with_constrained(NPARAMS),
        status,
        iterations,
        effects,
    }
}
