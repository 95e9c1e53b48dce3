//! # kinfit - Kinematic Kalman trajectory fitter
//!
//! Reconstructs charged-particle trajectories in a near-uniform magnetic
//! field from drift-tube and scintillator-time measurements, by
//! iteratively estimating a parametric helix that jointly minimizes the
//! measurement residuals and accounts for stochastic material
//! interactions along the path.
//!
//! ## Features
//!
//! - Loop-helix kinematic trajectory with exact analytic derivatives
//! - Piecewise trajectories patched across material crossings
//! - Newton closest-approach solver with DOCA/TOCA parameter sensitivities
//! - Bidirectional Kalman sweep in information form with annealing
//!
//! ## Example
//!
//! ```rust,ignore
//! use kinfit_rs::{run_fit, Config, Effect, LoopHelix, PiecewiseTrajectory};
//!
//! // seed trajectory from a position/momentum estimate
//! let seed = PiecewiseTrajectory::new(LoopHelix::new(pos4, mom4, -1, 1.0, range)?);
//!
//! // wrap hits and crossings as effects
//! let effects: Vec<Effect> = hits.into_iter().map(Effect::measurement).collect();
//!
//! // run the annealed meta-iteration
//! let result = run_fit(&seed, effects, &Config::default());
//! ```

pub mod bfield;
pub mod ca;
pub mod constants;
pub mod fit;
pub mod hits;
pub mod material;
pub mod params;
pub mod residual;
pub mod time_range;
pub mod trajectory;
pub mod vectors;

// Re-exports for convenience
pub use bfield::{BFieldMap, GradBFieldMap, UniformBFieldMap};
pub use ca::{CaHint, CaStatus, ClosestApproachData};
pub use fit::{run_fit, Chisq, Config, Effect, FitResult, FitStatus, MetaIterConfig, TimeDir};
pub use hits::{Hit, ScintHit, StrawHit};
pub use material::{DetMaterial, ElementXing, MaterialXing, StrawMat};
pub use params::{ParamIndex, Parameters, Weights};
pub use residual::Residual;
pub use time_range::TimeRange;
pub use trajectory::{Line, LoopHelix, MomBasis, PiecewiseTrajectory};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    use crate::ca::CaStatus;

    /// Errors that can occur in the fitter.
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid argument: {0}")]
        InvalidArgument(String),

        #[error("Degenerate helix: rad = {rad}, lam = {lam}")]
        DegenerateHelix { rad: f64, lam: f64 },

        #[error("Closest approach failed: {0:?}")]
        PcaFailure(CaStatus),

        #[error("Effect update failed: {0}")]
        UpdateFailed(String),

        #[error("Fit unconverged after {iterations} iterations (chisq {chisq})")]
        Unconverged { iterations: usize, chisq: f64 },

        #[error("Information matrix is not positive definite")]
        NonPositiveDefinite,
    }

    /// Result type for fitter operations.
    pub type Result<T> = std::result::Result<T, Error>;
}
