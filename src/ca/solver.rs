//! Newton solver for helix-to-line closest approach.

use crate::constants::C_LIGHT;
use crate::trajectory::{Line, LoopHelix, MomBasis, PiecewiseTrajectory};
use crate::vectors::ParamVec;

use super::{CaHint, CaStatus, ClosestApproachData};

/// Directions closer than this to parallel make the two-trajectory
/// stationarity system singular.
const PARALLEL_EPS: f64 = 1.0e-6;

/// Find the closest approach between a helix and a line.
///
/// Newton iteration on the stationarity conditions
/// `f1 = (H(th) - L(tl)) . h(th)` and `f2 = (H(th) - L(tl)) . l`, with the
/// analytic Jacobian including the helix curvature term. Convergence is
/// declared when the DOCA change falls below `prec` (mm) or the particle
/// time step below `prec / c`.
pub fn closest_approach(
    helix: &LoopHelix,
    line: &Line,
    hint: &CaHint,
    prec: f64,
    max_iter: usize,
) -> ClosestApproachData {
    let ldir = line.direction();
    let lspeed = line.speed();
    let mut th = hint.particle_time;
    let mut tl = hint.sensor_time;
    if !(th.is_finite() && tl.is_finite()) {
        return ClosestApproachData::unusable(CaStatus::Failed);
    }
    let mut doca = f64::MAX;
    let mut status = CaStatus::Diverged;
    for _ in 0..max_iter {
        let hdir = helix.direction(th, MomBasis::MomDir);
        let udot = hdir.dot(&ldir);
        if udot.abs() > 1.0 - PARALLEL_EPS {
            return parallel_fallback(helix, line, hint);
        }
        let d = helix.position3(th) - line.position3(tl);
        let f1 = d.dot(&hdir);
        let f2 = d.dot(&ldir);
        let hspeed = helix.speed(th);
        // Jacobian of (f1, f2) in (th, tl); the d.h' term carries the
        // local curvature
        let j11 = hspeed + d.dot(&helix.direction_rate(th));
        let j12 = -lspeed * udot;
        let j21 = hspeed * udot;
        let j22 = -lspeed;
        let det = j11 * j22 - j12 * j21;
        if !det.is_finite() || det.abs() < f64::EPSILON {
            return ClosestApproachData::unusable(CaStatus::Failed);
        }
        let dth = (-j22 * f1 + j12 * f2) / det;
        let dtl = (j21 * f1 - j11 * f2) / det;
        th += dth;
        tl += dtl;
        if !(th.is_finite() && tl.is_finite()) {
            return ClosestApproachData::unusable(CaStatus::Failed);
        }
        let newdoca = (helix.position3(th) - line.position3(tl)).norm();
        if (newdoca - doca).abs() < prec || dth.abs() < prec / C_LIGHT {
            doca = newdoca;
            status = CaStatus::Converged;
            break;
        }
        doca = newdoca;
    }
    if status != CaStatus::Converged {
        return ClosestApproachData::unusable(CaStatus::Diverged);
    }
    finalize(helix, line, th, tl)
}

/// Fill the result record and the DOCA/TOCA parameter derivatives at the
/// converged times.
fn finalize(helix: &LoopHelix, line: &Line, th: f64, tl: f64) -> ClosestApproachData {
    let particle_poca = helix.position3(th);
    let sensor_poca = line.position3(tl);
    let particle_direction = helix.direction(th, MomBasis::MomDir);
    let sensor_direction = line.direction();
    let delta = particle_poca - sensor_poca;
    let dmag = delta.norm();
    // sign DOCA by the angular momentum of the particle about the sensor
    let lsign = sensor_direction.cross(&particle_direction).dot(&delta);
    let dsign = 1.0_f64.copysign(lsign);
    let udot = particle_direction.dot(&sensor_direction);
    let dxdp = helix.dx_dpar(th);
    // DOCA derivatives: at stationarity only the direct position shift
    // projected on the DOCA direction survives
    let ddir = if dmag > 0.0 { delta / dmag } else { delta };
    let dddp: ParamVec = dxdp.transpose() * ddir * dsign;
    // TOCA derivatives from the implicit-function theorem applied to the
    // two stationarity conditions; the denominator carries the same
    // curvature term as the Newton Jacobian, and the direct dependence of
    // the particle direction on the parameters enters the numerator
    let hspeed = helix.speed(th);
    let dndp = helix.dn_dpar(th);
    let proj = sensor_direction * udot - particle_direction;
    let denom = hspeed * (1.0 - udot * udot) + delta.dot(&helix.direction_rate(th));
    let dtdp: ParamVec = (dxdp.transpose() * proj - dndp.transpose() * delta) / denom;
    ClosestApproachData {
        status: CaStatus::Converged,
        doca: dsign * dmag,
        dirdot: udot,
        particle_toca: th,
        sensor_toca: tl,
        particle_poca,
        sensor_poca,
        particle_direction,
        sensor_direction,
        dddp,
        dtdp,
    }
}

/// Near-parallel geometry: hold the hint times and measure the DOCA along
/// the common perpendicular.
fn parallel_fallback(helix: &LoopHelix, line: &Line, hint: &CaHint) -> ClosestApproachData {
    let th = hint.particle_time;
    let tl = hint.sensor_time;
    let particle_poca = helix.position3(th);
    let sensor_poca = line.position3(tl);
    let ldir = line.direction();
    let delta = particle_poca - sensor_poca;
    let perp = delta - ldir * delta.dot(&ldir);
    let mut data = ClosestApproachData::unusable(CaStatus::CloseToParallel);
    data.doca = perp.norm();
    data.particle_toca = th;
    data.sensor_toca = tl;
    data.particle_poca = particle_poca;
    data.sensor_poca = sensor_poca;
    data.particle_direction = helix.direction(th, MomBasis::MomDir);
    data.sensor_direction = ldir;
    data.dirdot = data.particle_direction.dot(&ldir);
    data
}

/// Closest approach against a piecewise trajectory.
///
/// The piece containing the particle hint time is tried first; when the
/// Newton solution leaves that piece's range the containing piece is
/// re-selected and the solve repeated. A hint outside the piecewise range
/// fails with `OutOfRange`.
pub fn piecewise_closest_approach(
    pktraj: &PiecewiseTrajectory,
    line: &Line,
    hint: &CaHint,
    prec: f64,
    max_iter: usize,
) -> (ClosestApproachData, usize) {
    if !pktraj.in_range(hint.particle_time) {
        return (ClosestApproachData::unusable(CaStatus::OutOfRange), 0);
    }
    let mut hint = *hint;
    let mut index = pktraj.nearest_index(hint.particle_time);
    // each piece is visited at most once
    for _ in 0..pktraj.pieces().len() {
        let data = closest_approach(&pktraj.pieces()[index], line, &hint, prec, max_iter);
        if !data.usable() {
            return (data, index);
        }
        let newindex = pktraj.nearest_index(data.particle_toca);
        if newindex == index {
            return (data, index);
        }
        hint = CaHint::new(data.particle_toca, data.sensor_toca);
        index = newindex;
    }
    let data = closest_approach(&pktraj.pieces()[index], line, &hint, prec, max_iter);
    (data, index)
}
