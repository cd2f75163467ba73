use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use trajmatch::{
    compare, CompareOptions, Matcher, OptimalMatcher, ThresholdMatcher, TrackPoint,
    Trajectory, TrajectorySet,
};

const FRAMES: usize = 600;

/* ----------------------------------------------------------------------------
 * Synthetic crowd
 * ---------------------------------------------------------------------------- */

/// `persons` walkers crossing a 1000x1000 px scene at random times.
fn crowd(rng: &mut StdRng, persons: usize) -> TrajectorySet {
    (0..persons)
        .map(|_| {
            let first = rng.gen_range(0..FRAMES / 2);
            let len = rng.gen_range(50..FRAMES / 2);
            let (mut x, mut y) = (rng.gen_range(0.0..1000.0), rng.gen_range(0.0..1000.0));
            let (vx, vy) = (rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0));
            let points = (0..len)
                .map(|_| {
                    x += vx;
                    y += vy;
                    TrackPoint::new(x, y)
                })
                .collect();
            Trajectory::starting_at(first, points).unwrap()
        })
        .collect()
}

/// Re-tracked copy of `truth`: jittered positions, shuffled order.
fn retracked(rng: &mut StdRng, truth: &TrajectorySet) -> TrajectorySet {
    let mut trajectories: Vec<Trajectory> = truth
        .iter()
        .map(|t| {
            let points = t
                .points()
                .iter()
                .map(|p| {
                    TrackPoint::new(
                        p.x() + rng.gen_range(-1.5..1.5),
                        p.y() + rng.gen_range(-1.5..1.5),
                    )
                })
                .collect();
            Trajectory::starting_at(t.first_frame(), points).unwrap()
        })
        .collect();
    trajectories.shuffle(rng);
    trajectories.into_iter().collect()
}

fn bench_association(c: &mut Criterion) {
    let mut group = c.benchmark_group("association");
    for persons in [20, 80] {
        let mut rng = StdRng::seed_from_u64(persons as u64);
        let truth = crowd(&mut rng, persons);
        let test = retracked(&mut rng, &truth);

        group.bench_with_input(BenchmarkId::new("optimal", persons), &persons, |b, _| {
            let matcher = OptimalMatcher::default();
            b.iter(|| matcher.associate(&truth, &test).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("threshold", persons), &persons, |b, _| {
            let matcher = ThresholdMatcher::default();
            b.iter(|| matcher.associate(&truth, &test).unwrap());
        });
    }
    group.finish();
}

fn bench_report(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let truth = crowd(&mut rng, 80);
    let test = retracked(&mut rng, &truth);
    let options = CompareOptions::all_checks();
    let association = OptimalMatcher::default().associate(&truth, &test).unwrap();

    c.bench_function("report", |b| {
        b.iter(|| compare(&truth, &test, &association, &options));
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(20)
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(3));
    targets = bench_association, bench_report
}
criterion_main!(benches);
