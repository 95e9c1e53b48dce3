//! Detector-element crossings.
//!
//! An element crossing collects the material crossings of one physical
//! detector piece and turns path lengths through materials into momentum
//! change and noise in the local momentum basis.

use std::sync::Arc;

use crate::constants::MM_PER_CM;
use crate::fit::TimeDir;
use crate::trajectory::LoopHelix;

use super::DetMaterial;

/// Path length through one material of a detector element.
#[derive(Clone, Debug)]
pub struct MaterialXing {
    pub dmat: Arc<DetMaterial>,
    /// Path length in mm.
    pub plen: f64,
}

impl MaterialXing {
    pub fn new(dmat: Arc<DetMaterial>, plen: f64) -> Self {
        Self { dmat, plen }
    }
}

/// A crossing of one detector element, at a fixed trajectory time.
/// Crossings without material are inactive.
#[derive(Clone, Debug)]
pub struct ElementXing {
    time: f64,
    mxings: Vec<MaterialXing>,
}

impl ElementXing {
    pub fn new(time: f64, mxings: Vec<MaterialXing>) -> Self {
        Self { time, mxings }
    }

    /// Time the particle crosses this element.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    pub fn active(&self) -> bool {
        !self.mxings.is_empty()
    }

    pub fn mat_xings(&self) -> &[MaterialXing] {
        &self.mxings
    }

    /// Cumulative fractional momentum change and variance from these
    /// crossings, in the local momentum basis
    /// `[momdir, perpdir, phidir]`.
    ///
    /// Energy loss shifts and smears the momentum magnitude only;
    /// scattering adds noise to the two transverse directions with no
    /// mean deflection. The shift sign follows the time direction.
    pub fn material_effects(&self, reftraj: &LoopHelix, tdir: TimeDir) -> ([f64; 3], [f64; 3]) {
        let mom = reftraj.momentum(self.time);
        let mass = reftraj.mass();
        let mut dmfde = mom.hypot(mass) / (mom * mom);
        if tdir == TimeDir::Backwards {
            dmfde = -dmfde;
        }
        let mut dmom = [0.0; 3];
        let mut momvar = [0.0; 3];
        for mxing in &self.mxings {
            dmom[0] += mxing.dmat.energy_loss(mom, mxing.plen, mass) * dmfde;
            momvar[0] += mxing.dmat.energy_loss_var(mom, mxing.plen, mass) * dmfde * dmfde;
            let scatvar = mxing.dmat.scatter_angle_var(mom, mxing.plen, mass);
            momvar[1] += scatvar;
            momvar[2] += scatvar;
        }
        (dmom, momvar)
    }

    /// Summed thickness in radiation lengths.
    pub fn radiation_fraction(&self) -> f64 {
        self.mxings
            .iter()
            .map(|mxing| mxing.dmat.radiation_fraction(mxing.plen / MM_PER_CM))
            .sum()
    }
}
