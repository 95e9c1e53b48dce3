//! Closest approach of a helix to a fixed space-time point.

use crate::constants::C_LIGHT;
use crate::trajectory::{LoopHelix, MomBasis};
use crate::vectors::{spatial, ParamVec, Vec4};

use super::{CaStatus, ClosestApproachData};

/// Solve the 1-D closest-approach problem between a helix and a fixed
/// space-time point, starting the Newton iteration at the point's time.
///
/// The stationarity condition is `(H(t) - p) . v(t) = 0`; its derivative
/// carries the helix acceleration.
pub fn point_closest_approach(
    helix: &LoopHelix,
    point: Vec4,
    prec: f64,
    max_iter: usize,
) -> ClosestApproachData {
    let pos = spatial(&point);
    let mut th = point[3];
    if !th.is_finite() || !pos.iter().all(|v| v.is_finite()) {
        return ClosestApproachData::unusable(CaStatus::Failed);
    }
    let mut doca = f64::MAX;
    let mut status = CaStatus::Diverged;
    for _ in 0..max_iter {
        let d = helix.position3(th) - pos;
        let vel = helix.velocity(th);
        let acc = helix.acceleration(th);
        let g = d.dot(&vel);
        let gprime = vel.norm_squared() + d.dot(&acc);
        if !gprime.is_finite() || gprime.abs() < f64::EPSILON {
            return ClosestApproachData::unusable(CaStatus::Failed);
        }
        let dt = -g / gprime;
        th += dt;
        if !th.is_finite() {
            return ClosestApproachData::unusable(CaStatus::Failed);
        }
        let newdoca = (helix.position3(th) - pos).norm();
        if (newdoca - doca).abs() < prec || dt.abs() < prec / C_LIGHT {
            status = CaStatus::Converged;
            break;
        }
        doca = newdoca;
    }
    if status != CaStatus::Converged {
        return ClosestApproachData::unusable(CaStatus::Diverged);
    }
    let particle_poca = helix.position3(th);
    let particle_direction = helix.direction(th, MomBasis::MomDir);
    let delta = particle_poca - pos;
    let dmag = delta.norm();
    // sign by the z component of the angular momentum about the point
    let lsign = delta.cross(&particle_direction)[2];
    let dsign = 1.0_f64.copysign(lsign);
    let dxdp = helix.dx_dpar(th);
    let ddir = if dmag > 0.0 { delta / dmag } else { delta };
    let dddp: ParamVec = dxdp.transpose() * ddir * dsign;
    let speed = helix.speed(th);
    let denom = speed + delta.dot(&helix.acceleration(th)) / speed;
    let dtdp: ParamVec = -dxdp.transpose() * particle_direction / denom;
    let mut data = ClosestApproachData::unusable(CaStatus::Converged);
    data.doca = dsign * dmag;
    data.particle_toca = th;
    data.sensor_toca = point[3];
    data.particle_poca = particle_poca;
    data.sensor_poca = pos;
    data.particle_direction = particle_direction;
    data.dddp = dddp;
    data.dtdp = dtdp;
    data
}
