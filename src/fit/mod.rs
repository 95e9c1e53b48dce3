//! The Kalman fit: effects, sweep state, configuration, and the
//! meta-iteration driver.

mod chisq;
mod config;
mod effect;
mod state;
mod track;

pub use chisq::Chisq;
pub use config::{Config, FailPolicy, MetaIterConfig};
pub use effect::{Effect, Material, Measurement, ProcessedState};
pub use state::{FitState, TimeDir};
pub use track::{run_fit, FitResult, FitStatus};
