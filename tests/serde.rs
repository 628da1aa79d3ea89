#![cfg(feature = "serde1")]

use ibp::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

#[test]
fn sweep_config_from_json_uses_defaults() {
    let json = r#"{"alphas": [1.1, 5.98], "betas": [1.0], "n_customers": 8}"#;
    let config: SweepConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.recursion, RecursionConfig::default());
    assert_eq!(config.discrepancy, DiscrepancyConfig::default());
    assert_eq!(config.grid().len(), 2);
}

#[test]
fn sweep_records_serialize() {
    let mut rng = Xoshiro256Plus::seed_from_u64(5);
    let config = SweepConfig::new(vec![2.0], vec![1.0], 3).with_discrepancy(
        DiscrepancyConfig::default()
            .with_budgets(vec![5, 10])
            .with_n_repeats(2),
    );
    let records = run_prior_sweep(&config, &mut rng).unwrap();
    let json = serde_json::to_string(&records).unwrap();
    let back: Vec<ibp::sweep::PriorSweepRecord> =
        serde_json::from_str(&json).unwrap();
    assert_eq!(back[0].point, records[0].point);
    assert_eq!(back[0].discrepancy.len(), 2);
}

#[test]
fn algorithm_names_deserialize() {
    let alg: InferenceAlgorithm = serde_json::from_str("\"HMC-Gibbs\"").unwrap();
    assert_eq!(alg, InferenceAlgorithm::HmcGibbs);
}
