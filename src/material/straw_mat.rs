//! Straw-tube material description.
//!
//! Converts the DOCA of a track to a straw into path lengths through the
//! straw gas and wall, and packages those into an element crossing.

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use super::{DetMaterial, ElementXing, MaterialXing};

#[derive(Clone, Debug)]
pub struct StrawMat {
    /// Straw outer radius (mm).
    rstraw: f64,
    /// Wall thickness (mm).
    thick: f64,
    wall: Arc<DetMaterial>,
    gas: Arc<DetMaterial>,
}

impl StrawMat {
    pub fn new(rstraw: f64, thick: f64, wall: Arc<DetMaterial>, gas: Arc<DetMaterial>) -> Self {
        Self { rstraw, thick, wall, gas }
    }

    /// A typical 2.5 mm straw with a 15 micron mylar wall.
    pub fn standard() -> Self {
        Self::new(
            2.5,
            0.015,
            Arc::new(DetMaterial::straw_wall()),
            Arc::new(DetMaterial::straw_gas()),
        )
    }

    pub fn rstraw(&self) -> f64 {
        self.rstraw
    }

    /// Path length through the gas for a track at `doca` with uncertainty
    /// `ddoca`, at angle cosine `adot` to the wire. When the DOCA is
    /// poorly known the chord is replaced by its average over the straw.
    pub fn gas_path(&self, doca: f64, ddoca: f64, adot: f64) -> f64 {
        let doca = doca.abs();
        let afac = 1.0 / (1.0 - adot * adot).sqrt();
        let path = if ddoca < 0.25 * self.rstraw && doca < self.rstraw {
            2.0 * (self.rstraw * self.rstraw - doca * doca).sqrt()
        } else {
            FRAC_PI_2 * self.rstraw
        };
        path * afac
    }

    /// Path length through the two wall crossings; diverges at grazing
    /// incidence, so near the edge it falls back to the average.
    pub fn wall_path(&self, doca: f64, ddoca: f64, adot: f64) -> f64 {
        let doca = doca.abs();
        let afac = 1.0 / (1.0 - adot * adot).sqrt();
        let path = if ddoca < 0.25 * self.rstraw && doca < 0.95 * self.rstraw {
            2.0 * self.thick * self.rstraw
                / (self.rstraw * self.rstraw - doca * doca).sqrt()
        } else {
            2.0 * FRAC_PI_2 * self.thick
        };
        path * afac
    }

    /// Build the element crossing for a straw traversal.
    pub fn element_xing(&self, time: f64, doca: f64, ddoca: f64, adot: f64) -> ElementXing {
        ElementXing::new(
            time,
            vec![
                MaterialXing::new(self.gas.clone(), self.gas_path(doca, ddoca, adot)),
                MaterialXing::new(self.wall.clone(), self.wall_path(doca, ddoca, adot)),
            ],
        )
    }
}
