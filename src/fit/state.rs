//! Kalman sweep state.

use crate::params::{Parameters, Weights};
use crate::Result;

/// Direction of a Kalman sweep in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeDir {
    Forwards,
    Backwards,
}

/// Information accumulated along one sweep. Measurements add directly in
/// weight space; material transport detours through parameter space.
#[derive(Clone, Debug, Default)]
pub struct FitState {
    wdata: Weights,
}

impl FitState {
    pub fn new(wdata: Weights) -> Self {
        Self { wdata }
    }

    pub fn weights(&self) -> &Weights {
        &self.wdata
    }

    /// Add a measurement's information; direction-independent.
    pub fn append_weight(&mut self, weight: &Weights) {
        self.wdata += weight;
    }

    /// Transport the state across a material effect: shift the parameters
    /// by the effect (sign by sweep direction) and add its process noise.
    /// Fails when the accumulated information is not yet invertible.
    pub fn append_effect(&mut self, effect: &Parameters, tdir: TimeDir) -> Result<()> {
        let mut pdata = Parameters::try_from(&self.wdata)?;
        let sign = match tdir {
            TimeDir::Forwards => 1.0,
            TimeDir::Backwards => -1.0,
        };
        *pdata.parameters_mut() += effect.parameters() * sign;
        *pdata.covariance_mut() += effect.covariance();
        self.wdata = Weights::try_from(&pdata)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectors::{ParamMat, ParamVec};
    use approx::assert_relative_eq;

    fn well_constrained() -> Weights {
        let pars = Parameters::new(
            ParamVec::from_row_slice(&[250.0, -80.0, 10.0, -20.0, 0.5, 1.5]),
            ParamMat::identity() * 0.01,
        );
        Weights::try_from(&pars).unwrap()
    }

    #[test]
    fn test_material_shift_round_trip() {
        let mut state = FitState::new(well_constrained());
        let mut effect = Parameters::default();
        effect.parameters_mut()[0] = 1.0;
        effect.covariance_mut()[(0, 0)] = 0.04;
        state.append_effect(&effect, TimeDir::Forwards).unwrap();
        let shifted = Parameters::try_from(state.weights()).unwrap();
        assert_relative_eq!(shifted.parameters()[0], 251.0, epsilon = 1e-9);
        assert_relative_eq!(shifted.covariance()[(0, 0)], 0.05, epsilon = 1e-9);
        // backwards transport undoes the shift but noise accumulates
        state.append_effect(&effect, TimeDir::Backwards).unwrap();
        let back = Parameters::try_from(state.weights()).unwrap();
        assert_relative_eq!(back.parameters()[0], 250.0, epsilon = 1e-9);
        assert_relative_eq!(back.covariance()[(0, 0)], 0.09, epsilon = 1e-9);
    }

    #[test]
    fn test_unconstrained_transport_fails() {
        let mut state = FitState::default();
        let effect = Parameters::default();
        assert!(state.append_effect(&effect, TimeDir::Forwards).is_err());
    }
}
