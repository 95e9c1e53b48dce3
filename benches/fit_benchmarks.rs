//! Fit benchmarks using Criterion.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use kinfit_rs::constants::C_LIGHT;
use kinfit_rs::{
    ca, run_fit, CaHint, Config, Effect, Hit, Line, LoopHelix, MomBasis, PiecewiseTrajectory,
    StrawHit, TimeRange,
};
use nalgebra::Vector4;

const VDRIFT: f64 = 0.065;

fn truth_helix() -> LoopHelix {
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
    LoopHelix::new(Vector4::zeros(), mom4, -1, 1.0, TimeRange::new(-5.0, 5.0)).unwrap()
}

/// Noiseless drift-wire effects along the trajectory.
fn toy_effects(seed: &PiecewiseTrajectory, n: usize) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(n);
    for ihit in 0..n {
        let time = -4.5 + 9.0 * ihit as f64 / (n - 1) as f64;
        let eta = 0.7 * ihit as f64;
        let perp1 = seed.direction(time, MomBasis::PerpDir);
        let perp2 = seed.direction(time, MomBasis::PhiDir);
        let docadir = perp1 * eta.cos() + perp2 * eta.sin();
        let wdir = perp1 * eta.sin() - perp2 * eta.cos();
        let gap = if ihit % 2 == 0 { 1.5 } else { -1.5 };
        let tmeas = time + gap.abs() / VDRIFT;
        let wire = Line::new(
            seed.position3(time) + docadir * gap,
            tmeas,
            wdir * (0.9 * C_LIGHT),
            800.0,
        )
        .unwrap();
        let hit = StrawHit::new(
            wire,
            VDRIFT,
            1.0,
            0.25,
            seed,
            CaHint::new(time, tmeas),
            1e-8,
            10,
        )
        .unwrap();
        effects.push(Effect::measurement(Hit::Straw(hit)));
    }
    effects
}

fn benchmark_closest_approach(c: &mut Criterion) {
    let helix = truth_helix();
    let time = 2.0;
    let docadir = helix.direction(time, MomBasis::PerpDir);
    let wdir = helix.direction(time, MomBasis::PhiDir);
    let line = Line::new(
        helix.position3(time) + docadir * 2.0,
        time,
        wdir * (0.9 * C_LIGHT),
        800.0,
    )
    .unwrap();
    let hint = CaHint::new(time, time);

    c.bench_function("closest_approach", |b| {
        b.iter(|| ca::closest_approach(black_box(&helix), black_box(&line), &hint, 1e-8, 10))
    });
}

fn benchmark_fit_40_hits(c: &mut Criterion) {
    let seed = PiecewiseTrajectory::new(truth_helix());
    let effects = toy_effects(&seed, 40);
    let config = Config::default();

    c.bench_function("fit_40_hits", |b| {
        b.iter(|| run_fit(black_box(&seed), effects.clone(), &config))
    });
}

fn benchmark_fit_100_hits(c: &mut Criterion) {
    let seed = PiecewiseTrajectory::new(truth_helix());
    let effects = toy_effects(&seed, 100);
    let config = Config::default();

    c.bench_function("fit_100_hits", |b| {
        b.iter(|| run_fit(black_box(&seed), effects.clone(), &config))
    });
}

criterion_group!(
    benches,
    benchmark_closest_approach,
    benchmark_fit_40_hits,
    benchmark_fit_100_hits
);
criterion_main!(benches);
