//! Physical and numerical constants shared across the fit.
//!
//! Lengths are mm, times ns, momenta MeV/c, energies MeV, fields Tesla.

/// Speed of light in mm/ns.
pub const C_LIGHT: f64 = 299.792458;

/// Electron mass in MeV/c^2, used by the material energy-loss model.
pub const ELECTRON_MASS: f64 = 0.510998;

/// Small time buffer (ns) separating adjacent trajectory pieces and
/// disambiguating coincident effects.
pub const TBUFF: f64 = 1.0e-6;

/// Default precision (mm) for the closest-approach solver.
pub const DEFAULT_PRECISION: f64 = 1.0e-8;

/// Path lengths are carried in mm; the material tables work in cm.
/// The conversion happens exactly once, at the radiation-fraction boundary.
pub const MM_PER_CM: f64 = 10.0;
