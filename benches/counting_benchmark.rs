//! Counting benchmark — measure the streaming ingestion hot path for
//! varying class counts and input lengths.
//!
//! Both cycle-extraction algorithms are covered: the four-point method
//! (residue held as a flat `Vec`, linear rescans) and the Clormann-Seeger
//! HCM stack method (amortized constant-time per sample).

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use rainflow_core::{ClassParams, CyclePolicy, Flags, RainflowEngine, ResiduePolicy, WohlerParams};

/// A deterministic pseudo-random-looking load curve: sum of a few
/// incommensurate sinusoids, enough to keep the detector busy without
/// ever settling into a flat run.
fn load_curve(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            50.0 * (t * 0.013).sin() + 20.0 * (t * 0.047).sin() + 5.0 * (t * 0.231).sin()
        })
        .collect()
}

fn reference_wohler() -> WohlerParams {
    WohlerParams::elementary(30.0, 1.0e6, -5.0, 0.0).unwrap()
}

fn bench_feed(c: &mut Criterion) {
    let mut group = c.benchmark_group("feed");
    group.significance_level(0.01);
    group.sample_size(50);

    for &n in &[1_000usize, 10_000, 100_000] {
        let samples = load_curve(n);

        group.bench_with_input(BenchmarkId::new("four_point", n), &n, |b, _| {
            b.iter(|| {
                let classes = ClassParams::new(-100.0, 1.0, 256).unwrap();
                let mut engine = RainflowEngine::new(classes, 1.0, reference_wohler())
                    .unwrap()
                    .with_cycle_policy(CyclePolicy::FourPoint)
                    .with_flags(Flags::COUNT_ALL);
                engine.feed(&samples).unwrap();
                engine.finalize(ResiduePolicy::Discard).unwrap();
            });
        });

        group.bench_with_input(BenchmarkId::new("hcm", n), &n, |b, _| {
            b.iter(|| {
                let classes = ClassParams::new(-100.0, 1.0, 256).unwrap();
                let mut engine = RainflowEngine::new(classes, 1.0, reference_wohler())
                    .unwrap()
                    .with_cycle_policy(CyclePolicy::Hcm)
                    .with_flags(Flags::COUNT_ALL);
                engine.feed(&samples).unwrap();
                engine.finalize(ResiduePolicy::Discard).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_class_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("feed_by_class_count");
    group.significance_level(0.01);
    group.sample_size(50);

    let samples = load_curve(20_000);
    for &count in &[16u32, 64, 256, 512] {
        group.bench_with_input(BenchmarkId::new("classes", count), &count, |b, &count| {
            b.iter(|| {
                let classes = ClassParams::new(-100.0, 200.0 / count as f64, count).unwrap();
                let mut engine = RainflowEngine::new(classes, 1.0, reference_wohler()).unwrap();
                engine.feed(&samples).unwrap();
                engine.finalize(ResiduePolicy::Discard).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_feed, bench_class_count);
criterion_main!(benches);
