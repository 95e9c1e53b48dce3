//! Fit configuration records.

/// What the driver does when an effect fails to linearize.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailPolicy {
    /// Deactivate the effect for the rest of the fit and continue.
    SkipEffect,
    /// Abort the fit.
    Abort,
}

/// Fit-wide configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Closest-approach precision (mm).
    pub prec: f64,
    /// Closest-approach iteration cap.
    pub max_ca_iter: usize,
    /// Meta-iteration cap.
    pub max_fit_iter: usize,
    /// Annealing temperature multiplier per meta-iteration.
    pub anneal_factor: f64,
    /// Starting annealing temperature; 1.0 disables annealing.
    pub anneal_start: f64,
    /// Relative chi-squared change declaring convergence.
    pub tolerance: f64,
    /// Minimum |DOCA| (mm) resolving the drift left/right ambiguity.
    pub ambig_doca: f64,
    /// Covariance inflation of the seed estimate used to initialize the
    /// information sweeps.
    pub seed_deweight: f64,
    /// Refresh the closest-approach hint from the previous iteration.
    /// Off by default: poor seed times can push the solve onto the wrong
    /// helix loop, from which it cannot recover.
    pub refresh_ca_hint: bool,
    pub fail_policy: FailPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prec: crate::constants::DEFAULT_PRECISION,
            max_ca_iter: 10,
            max_fit_iter: 10,
            anneal_factor: 0.5,
            anneal_start: 1.0,
            tolerance: 1e-3,
            ambig_doca: 0.25,
            seed_deweight: 1e6,
            refresh_ca_hint: false,
            fail_policy: FailPolicy::SkipEffect,
        }
    }
}

/// Per-meta-iteration state handed to every effect.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetaIterConfig {
    pub iteration: usize,
    /// Annealing temperature: multiplies every measurement variance.
    pub variance_scale: f64,
}

impl MetaIterConfig {
    pub fn new(iteration: usize, variance_scale: f64) -> Self {
        Self { iteration, variance_scale }
    }

    /// Multiplier on measurement weights, the inverse of the variance
    /// scale.
    pub fn weight_scale(&self) -> f64 {
        1.0 / self.variance_scale
    }
}
