//! Fit benchmarks: region selection and OLS on noisy closure curves
//!
//! Typical assays have tens of time points per well; the large size checks
//! that both steps stay linear.
//!
//! Run with: cargo bench --bench fit_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scratch_assay::fit::{fit_linear, select_fit_region};

const SIZES: [usize; 3] = [48, 1_000, 100_000];

/// Saturating covered-area curve with multiplicative noise
fn closure_curve(len: usize) -> (Vec<f64>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(42);
    let times: Vec<f64> = (0..len).map(|i| i as f64 * 15.0).collect();
    let span = times.last().copied().unwrap_or(1.0).max(1.0);
    let covered = times
        .iter()
        .map(|t| {
            let clean = 1.0e5 * (1.0 - (-3.0 * t / span).exp());
            clean * rng.gen_range(0.97..1.03)
        })
        .collect();
    (times, covered)
}

fn bench_select_region(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_fit_region");
    for size in SIZES {
        let (_, covered) = closure_curve(size);
        group.bench_with_input(BenchmarkId::new("f=0.6", size), &covered, |b, data| {
            b.iter(|| select_fit_region(black_box(data), 0.6));
        });
    }
    group.finish();
}

fn bench_fit_linear(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit_linear");
    for size in SIZES {
        let (times, covered) = closure_curve(size);
        group.bench_with_input(
            BenchmarkId::new("ols", size),
            &(times, covered),
            |b, (x, y)| {
                b.iter(|| fit_linear(black_box(x), black_box(y)));
            },
        );
    }
    group.finish();
}

fn bench_region_then_fit(c: &mut Criterion) {
    let (times, covered) = closure_curve(SIZES[0]);
    c.bench_function("region_then_fit_48", |b| {
        b.iter(|| {
            let region = select_fit_region(black_box(&covered), 0.6)?;
            fit_linear(&times[region.range()], &covered[region.range()])
        });
    });
}

criterion_group!(benches, bench_select_region, bench_fit_linear, bench_region_then_fit);
criterion_main!(benches);
