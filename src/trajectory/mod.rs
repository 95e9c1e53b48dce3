//! Trajectory models: the kinematic loop helix, the straight-line sensor
//! axis, and the piecewise particle trajectory patching helix pieces
//! together across material crossings.

mod line;
mod loop_helix;
mod piecewise;

pub use line::Line;
pub use loop_helix::{LoopHelix, MomBasis};
pub use piecewise::PiecewiseTrajectory;
