use criterion::black_box;
use criterion::BatchSize;
use criterion::Criterion;
use criterion::{criterion_group, criterion_main};
use ibp::predictive::*;
use ibp::prior::IbpParams;
use ibp::synthetic::{generate, FeaturePrior, SyntheticConfig};
use nalgebra::DMatrix;
use rand::SeedableRng;

fn bench_estimate(c: &mut Criterion) {
    let mut rng = rand::rngs::SmallRng::seed_from_u64(0x1b9);
    let prior = FeaturePrior::Ibp(IbpParams::new(5.0, 1.0).unwrap());
    let data = generate(&SyntheticConfig::new(100, 10, prior), &mut rng)
        .unwrap();
    let (_, held_out) = data.split(80);
    let k = data.allocations.n_dishes();
    let d = data.loadings.ncols();

    let mut group = c.benchmark_group("PredictiveEstimator, 100 draws");
    for (name, alg, summary) in [
        (
            "exact",
            InferenceAlgorithm::RecursiveIbp,
            PosteriorSummary {
                activation_probs: Some(data.feature_frequencies()),
                stick_params: None,
                loadings: LoadingPosterior::degenerate(data.loadings.clone()),
            },
        ),
        (
            "stick-breaking",
            InferenceAlgorithm::Widjaja,
            PosteriorSummary {
                activation_probs: None,
                stick_params: Some(StickParams::new(vec![5.0; k], vec![1.0; k])),
                loadings: LoadingPosterior::new(
                    data.loadings.clone(),
                    vec![DMatrix::identity(d, d) * 0.01; k],
                ),
            },
        ),
    ] {
        let estimator = PredictiveEstimator::new(
            alg,
            LikelihoodModel::LinearGaussian,
            &summary,
            0.1,
            PredictiveConfig::default(),
        )
        .unwrap();
        group.bench_function(name, |b| {
            b.iter_batched_ref(
                rand::thread_rng,
                |rng| black_box(estimator.estimate(&held_out, rng)),
                BatchSize::SmallInput,
            )
        });
    }
}

criterion_group!(predictive_benches, bench_estimate);
criterion_main!(predictive_benches);
