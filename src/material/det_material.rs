//! Material properties and stochastic interaction moments.
//!
//! The fit consumes only the four moment functions below; the concrete
//! numbers normally come from an external materials database. The
//! built-in presets cover the straw-tracker materials the test drivers
//! use.

use crate::constants::{ELECTRON_MASS, MM_PER_CM};

/// Coefficient of the stopping-power formula, MeV cm^2 / mol.
const K_DEDX: f64 = 0.307075;

/// Scattering constant of the Highland form, MeV.
const SCATTER_MOM: f64 = 13.6;

/// Properties of a single detector material.
///
/// Densities are g/cm^3, Z/A mol/g, the mean excitation energy MeV, the
/// radiation length g/cm^2. Path lengths passed to the moment functions
/// are mm except where noted.
#[derive(Clone, Debug)]
pub struct DetMaterial {
    name: String,
    density: f64,
    z_over_a: f64,
    exc_energy: f64,
    radlen: f64,
}

impl DetMaterial {
    pub fn new(name: &str, density: f64, z_over_a: f64, exc_energy: f64, radlen: f64) -> Self {
        Self { name: name.to_string(), density, z_over_a, exc_energy, radlen }
    }

    /// 80/20 Ar/CO2 drift gas.
    pub fn straw_gas() -> Self {
        Self::new("straw-gas", 1.78e-3, 0.459, 188.0e-6, 19.55)
    }

    /// Mylar straw wall.
    pub fn straw_wall() -> Self {
        Self::new("straw-wall", 1.40, 0.520, 78.7e-6, 39.95)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn kinematics(mom: f64, mass: f64) -> (f64, f64, f64) {
        let energy = mom.hypot(mass);
        let beta2 = (mom / energy) * (mom / energy);
        let gamma = energy / mass;
        (energy, beta2, gamma)
    }

    fn tmax(mom: f64, mass: f64) -> f64 {
        let bg = mom / mass;
        let ratio = ELECTRON_MASS / mass;
        2.0 * ELECTRON_MASS * bg * bg / (1.0 + 2.0 * gammaf(mom, mass) * ratio + ratio * ratio)
    }

    /// Mean energy change (MeV, negative) of a particle of momentum `mom`
    /// (MeV/c) and mass (MeV/c^2) crossing `plen` mm of this material.
    pub fn energy_loss(&self, mom: f64, plen: f64, mass: f64) -> f64 {
        if plen <= 0.0 {
            return 0.0;
        }
        let (_, beta2, _) = Self::kinematics(mom, mass);
        let bg2 = (mom / mass) * (mom / mass);
        let tmax = Self::tmax(mom, mass);
        let arg = 2.0 * ELECTRON_MASS * bg2 * tmax / (self.exc_energy * self.exc_energy);
        let dedx = K_DEDX * self.z_over_a * self.density / beta2 * (0.5 * arg.ln() - beta2);
        -dedx * plen / MM_PER_CM
    }

    /// Variance (MeV^2) of the energy change over `plen` mm, Bohr form.
    pub fn energy_loss_var(&self, mom: f64, plen: f64, mass: f64) -> f64 {
        if plen <= 0.0 {
            return 0.0;
        }
        let (_, beta2, _) = Self::kinematics(mom, mass);
        let xi = 0.5 * K_DEDX * self.z_over_a * self.density * (plen / MM_PER_CM) / beta2;
        xi * Self::tmax(mom, mass) * (1.0 - 0.5 * beta2)
    }

    /// Variance (radians^2) of the projected scattering angle over `plen`
    /// mm, Highland form.
    pub fn scatter_angle_var(&self, mom: f64, plen: f64, mass: f64) -> f64 {
        if plen <= 0.0 {
            return 0.0;
        }
        let (energy, _, _) = Self::kinematics(mom, mass);
        let beta = mom / energy;
        let xfrac = self.radiation_fraction(plen / MM_PER_CM);
        // the logarithmic correction loses validity for very thin
        // scatterers; bound it away from zero
        let corr = (1.0 + 0.038 * xfrac.ln()).max(0.1);
        let theta0 = SCATTER_MOM / (beta * mom) * xfrac.sqrt() * corr;
        theta0 * theta0
    }

    /// Thickness in radiation lengths for a path of `plen_cm` cm.
    pub fn radiation_fraction(&self, plen_cm: f64) -> f64 {
        self.density * plen_cm / self.radlen
    }
}

fn gammaf(mom: f64, mass: f64) -> f64 {
    mom.hypot(mass) / mass
}
