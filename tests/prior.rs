use ibp::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

const HARMONIC_5: f64 = 1.0 + 1.0 / 2.0 + 1.0 / 3.0 + 1.0 / 4.0 + 1.0 / 5.0;

#[test]
fn expected_dish_count_after_five_customers() {
    let params = IbpParams::new(1.1, 1.0).unwrap();
    let exact =
        PriorRecursion::compute(params, 5, &RecursionConfig::default()).unwrap();

    let closed_form: f64 = (1..=5)
        .map(|t| ibp::prior::new_dish_rate(t, 1.1, 1.0).unwrap())
        .sum();
    assert::close(closed_form, 1.1 * HARMONIC_5, 1E-12);
    assert::close(exact.cumulative_rates()[4], closed_form, 1E-12);

    let dish_count = exact.dish_count(5).unwrap();
    assert::close(dish_count.mean().unwrap(), closed_form, 1E-12);

    let mut rng = Xoshiro256Plus::seed_from_u64(0x1b9);
    let est = simulate(params, 5, 50_000, &mut rng).unwrap();
    let mc_mean = est.dish_counts().mean()[4];
    assert!((mc_mean - closed_form).abs() / closed_form < 0.05);
}

#[test]
fn single_customer_is_poisson_alpha() {
    for (alpha, beta) in [(1.1, 1.0), (5.98, 0.3), (15.78, 8.7)] {
        let params = IbpParams::new(alpha, beta).unwrap();
        let exact =
            PriorRecursion::compute(params, 1, &RecursionConfig::default())
                .unwrap();
        let pois = Poisson::new(alpha).unwrap();
        let pmf = exact.dish_count_pmf_table(40);
        for ell in 0..=40_u32 {
            assert::close(pmf[(0, ell as usize)], pois.f(&ell), 1E-14);
        }
    }
}

#[test]
fn monte_carlo_agrees_with_recursion_for_two_parameter_prior() {
    let params = IbpParams::new(3.0, 0.5).unwrap();
    let exact =
        PriorRecursion::compute(params, 6, &RecursionConfig::default()).unwrap();
    let mut rng = Xoshiro256Plus::seed_from_u64(17);
    let est = simulate(params, 6, 20_000, &mut rng).unwrap();

    for t in 0..6 {
        for k in 0..4 {
            let p = exact.table().get(t, k);
            let p_hat = est.table().get(t, k);
            assert!((p - p_hat).abs() < 0.02, "t = {t}, k = {k}: {p} vs {p_hat}");
        }
    }
}

#[test]
fn discrepancy_decreases_with_budget() {
    let params = IbpParams::new(1.1, 1.0).unwrap();
    let exact =
        PriorRecursion::compute(params, 5, &RecursionConfig::default()).unwrap();
    let mut rng = Xoshiro256Plus::seed_from_u64(99);
    let config = DiscrepancyConfig::default()
        .with_budgets(vec![10, 100, 1_000, 10_000])
        .with_n_repeats(5);
    let curve = track(&exact, &config, &mut rng).unwrap();

    let means = curve.means();
    assert!(means.windows(2).all(|w| w[1] < w[0]), "means = {means:?}");
    assert!(curve.points.iter().all(|p| p.sem >= 0.0));
}

#[test]
fn errors_classify_by_kind() {
    let bad = IbpParams::new_unchecked(0.0, 1.0);
    let err =
        PriorRecursion::compute(bad, 3, &RecursionConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);

    let params = IbpParams::new(1.0, 1.0).unwrap();
    let mut rng = Xoshiro256Plus::seed_from_u64(1);
    let err = simulate(params, 3, 0, &mut rng).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
}
