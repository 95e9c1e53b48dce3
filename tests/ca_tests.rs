//! Closest-approach scenario tests: perpendicularity, the gap scenario,
//! and the DOCA/TOCA derivative grid.

use kinfit_rs::constants::C_LIGHT;
use kinfit_rs::vectors::ParamMat;
use kinfit_rs::{
    ca, CaHint, CaStatus, Line, LoopHelix, MomBasis, Parameters, PiecewiseTrajectory, TimeRange,
};
use nalgebra::Vector4;

fn electron_helix() -> LoopHelix {
    let mom = 105.0;
    let cost: f64 = 0.7;
    let sint = (1.0 - cost * cost).sqrt();
    let phi: f64 = 0.5;
    let mom4 = Vector4::new(
        mom * sint * phi.cos(),
        mom * sint * phi.sin(),
        mom * cost,
        0.511,
    );
    LoopHelix::new(Vector4::zeros(), mom4, -1, 1.0, TimeRange::infinite()).unwrap()
}

/// Line perpendicular to the helix at `time`, offset by `gap` along the
/// direction picked by `eta` in the transverse basis plane.
fn perpendicular_line(helix: &LoopHelix, time: f64, gap: f64, eta: f64, vprop: f64) -> Line {
    let pos = helix.position3(time);
    let perp1 = helix.direction(time, MomBasis::PerpDir);
    let perp2 = helix.direction(time, MomBasis::PhiDir);
    let docadir = perp1 * eta.cos() + perp2 * eta.sin();
    let pdir = perp1 * eta.sin() - perp2 * eta.cos();
    Line::new(pos + docadir * gap, time, pdir * (C_LIGHT * vprop), 1000.0).unwrap()
}

/// Least-squares line through a point cloud.
fn linear_fit(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    let sx: f64 = points.iter().map(|p| p.0).sum();
    let sy: f64 = points.iter().map(|p| p.1).sum();
    let sxx: f64 = points.iter().map(|p| p.0 * p.0).sum();
    let sxy: f64 = points.iter().map(|p| p.0 * p.1).sum();
    let det = n * sxx - sx * sx;
    ((n * sxy - sx * sy) / det, (sy * sxx - sx * sxy) / det)
}

fn x_variance(points: &[(f64, f64)]) -> f64 {
    let n = points.len() as f64;
    let mean: f64 = points.iter().map(|p| p.0).sum::<f64>() / n;
    points.iter().map(|p| (p.0 - mean) * (p.0 - mean)).sum::<f64>() / n
}

#[test]
fn test_gap_scenario() {
    // line perpendicular to the helix at t = 0, offset by 2 mm, signal at
    // 0.7c: the DOCA is the gap and the time difference vanishes
    let helix = electron_helix();
    let line = perpendicular_line(&helix, 0.0, 2.0, 0.0, 0.7);
    let data = ca::closest_approach(&helix, &line, &CaHint::new(0.0, 0.0), 1e-8, 10);
    assert_eq!(data.status, CaStatus::Converged);
    assert!((data.doca.abs() - 2.0).abs() < 1e-8);
    assert!(data.deltat().abs() < 1e-8);
}

#[test]
fn test_delta_perpendicular_to_both() {
    let helix = electron_helix();
    for itime in 0..10 {
        let time = -10.0 + 20.0 * itime as f64 / 9.0;
        let line = perpendicular_line(&helix, time, 2.0, 0.3, 0.7);
        let data = ca::closest_approach(&helix, &line, &CaHint::new(time, time), 1e-8, 10);
        assert_eq!(data.status, CaStatus::Converged);
        let del = data.delta();
        assert!(del.dot(&data.particle_direction).abs() < 1e-9);
        assert!(del.dot(&data.sensor_direction).abs() < 1e-9);
    }
}

#[test]
fn test_point_closest_approach_gap() {
    let helix = electron_helix();
    for itime in 0..10 {
        let time = -10.0 + 20.0 * itime as f64 / 9.0;
        let offset = helix.direction(time, MomBasis::PerpDir) * 2.0;
        let point = helix.position3(time) + offset;
        let point4 = Vector4::new(point[0], point[1], point[2], time - 1.0);
        let data = ca::point_closest_approach(&helix, point4, 1e-8, 10);
        assert_eq!(data.status, CaStatus::Converged);
        assert!((data.doca.abs() - 2.0).abs() < 1e-8);
    }
}

#[test]
fn test_piecewise_matches_single_piece() {
    let helix = electron_helix();
    let mut piece = helix.clone();
    piece.set_range(TimeRange::new(-20.0, 20.0));
    let pktraj = PiecewiseTrajectory::new(piece);
    let line = perpendicular_line(&helix, 3.0, 2.0, 0.0, 0.7);
    let hint = CaHint::new(3.0, 3.0);
    let single = ca::closest_approach(&helix, &line, &hint, 1e-8, 10);
    let (pca, _) = ca::piecewise_closest_approach(&pktraj, &line, &hint, 1e-8, 10);
    assert_eq!(pca.status, CaStatus::Converged);
    assert!((pca.doca - single.doca).abs() < 1e-10);
    assert!((pca.particle_toca - single.particle_toca).abs() < 1e-10);
}

/// Step each parameter over a grid of offsets at ten reference times and
/// compare the exact DOCA and TOCA changes with the first-derivative
/// predictions through a linear fit.
#[test]
fn test_doca_toca_derivative_grid() {
    let helix = electron_helix();
    let pchange = [10.0, 0.1, 1e-4, 10.0, 0.01, 0.1];
    let nstep = 50;
    let ntime = 10;
    let prec = 1e-14;
    for ipar in 0..6 {
        let mut dpoints: Vec<(f64, f64)> = Vec::new();
        let mut tpoints: Vec<(f64, f64)> = Vec::new();
        for itime in 0..ntime {
            let time = -10.0 + 20.0 * itime as f64 / (ntime - 1) as f64;
            let line = perpendicular_line(&helix, time, 1.0, 0.2, 0.7);
            let hint = CaHint::new(time, time);
            let refdata = ca::closest_approach(&helix, &line, &hint, prec, 20);
            assert_eq!(refdata.status, CaStatus::Converged);
            let dstep = pchange[ipar] / (nstep - 1) as f64;
            let dstart = -0.5 * pchange[ipar];
            for istep in 0..nstep {
                let dpar = dstart + dstep * istep as f64;
                let mut params = *helix.params().parameters();
                params[ipar] += dpar;
                let shifted = LoopHelix::with_parameters(
                    Parameters::new(params, ParamMat::zeros()),
                    &helix,
                )
                .unwrap();
                let sdata = ca::closest_approach(&shifted, &line, &hint, prec, 20);
                assert_eq!(sdata.status, CaStatus::Converged);
                dpoints.push((sdata.doca - refdata.doca, refdata.dddp[ipar] * dpar));
                tpoints.push((
                    sdata.particle_toca - refdata.particle_toca,
                    refdata.dtdp[ipar] * dpar,
                ));
            }
        }
        for (label, points) in [("DOCA", &dpoints), ("TOCA", &tpoints)] {
            if x_variance(points) < 1e-16 {
                // a parameter with no leverage on this quantity produces a
                // degenerate cloud; the prediction must vanish with it
                for (x, y) in points.iter() {
                    assert!((y - x).abs() < 1e-6, "param {ipar} {label}: {x} vs {y}");
                }
            } else {
                let (slope, intercept) = linear_fit(points);
                assert!(
                    (slope - 1.0).abs() < 0.01,
                    "param {ipar} {label} slope {slope}"
                );
                assert!(
                    intercept.abs() < pchange[ipar],
                    "param {ipar} {label} intercept {intercept}"
                );
            }
        }
    }
}
