use criterion::black_box;
use criterion::BatchSize;
use criterion::Criterion;
use criterion::{criterion_group, criterion_main};
use ibp::monte_carlo::simulate;
use ibp::prior::IbpParams;
use ibp::recursion::{PriorRecursion, RecursionConfig};

fn bench_recursion(c: &mut Criterion) {
    let mut group = c.benchmark_group("PriorRecursion, compute");
    let config = RecursionConfig::default();
    for (alpha, beta) in [(1.1, 1.0), (10.37, 0.58), (30.91, 8.7)] {
        let params = IbpParams::new(alpha, beta).unwrap();
        for n in [10, 100] {
            group.bench_function(format!("α={alpha}, β={beta}, T={n}"), |b| {
                b.iter(|| {
                    black_box(PriorRecursion::compute(params, n, &config))
                })
            });
        }
    }
}

fn bench_simulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("Monte Carlo, simulate");
    let params = IbpParams::new(5.98, 1.0).unwrap();
    for n_samples in [10, 100, 1_000] {
        group.bench_with_input(
            format!("{n_samples} buffets"),
            &n_samples,
            |b, &n_samples| {
                b.iter_batched_ref(
                    rand::thread_rng,
                    |rng| black_box(simulate(params, 20, n_samples, rng)),
                    BatchSize::SmallInput,
                )
            },
        );
    }
}

criterion_group!(recursion_benches, bench_recursion, bench_simulate);
criterion_main!(recursion_benches);
