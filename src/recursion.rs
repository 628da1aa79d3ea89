//! Exact marginals of the IBP prior, computed without sampling
//!
//! Write Λ_t for the number of dishes after `t` customers. Λ_t is a sum of
//! independent Poisson arrivals, so Λ_t ~ Poisson(λ_t) with
//! λ_t = Σ_{s ≤ t} `new_dish_rate(s)`. Dish `k` (in arrival order) is brought
//! out by customer `t` exactly when Λ_{t-1} < k ≤ Λ_t, and otherwise customer
//! `t` takes it with probability `m_k / (t - 1 + β)`. Taking expectations,
//!
//! ```text
//! P[t, k] = stick_update(Σ_{t' < t} P[t', k], t) + P(Λ_t ≥ k) - P(Λ_{t-1} ≥ k)
//! ```
//!
//! The rate sequence λ_t is computed first and on its own. Truncating the
//! per-dish table at a probability cutoff never touches it.
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use log::{debug, trace};
use nalgebra::DMatrix;
use std::fmt;

use crate::consts::DISH_CUTOFF;
use crate::dist::{Poisson, PoissonError};
use crate::misc::cumsum;
use crate::prior::{IbpError, IbpParams};
use crate::result::{Classify, ErrorKind};
use crate::table::ActivationTable;
use crate::traits::HasDensity;

/// Rounding slack allowed before a probability counts as outside [0, 1]
const UNIT_SLACK: f64 = 1e-9;

/// Parameters for the analytical recursion
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case", default))]
pub struct RecursionConfig {
    /// Dish `k` is tracked from the first customer `t` with P(Λ_t ≥ k) above
    /// this value.
    pub cutoff: f64,
    /// Upper bound on the number of tracked dishes
    pub max_dishes: usize,
}

impl Default for RecursionConfig {
    fn default() -> Self {
        Self {
            cutoff: DISH_CUTOFF,
            max_dishes: 100_000,
        }
    }
}

impl RecursionConfig {
    pub fn with_cutoff(self, cutoff: f64) -> Self {
        Self { cutoff, ..self }
    }

    pub fn with_max_dishes(self, max_dishes: usize) -> Self {
        Self { max_dishes, ..self }
    }

    fn validate(&self) -> Result<(), RecursionError> {
        if self.cutoff > 0.0 && self.cutoff < 1.0 {
            Ok(())
        } else {
            Err(RecursionError::InvalidCutoff {
                cutoff: self.cutoff,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecursionError {
    /// Invalid IBP hyperparameters
    Prior(IbpError),
    /// The cutoff must lie in (0, 1)
    InvalidCutoff { cutoff: f64 },
    /// More than `max_dishes` dishes carry probability above the cutoff
    TableTooWide { customer: usize, max_dishes: usize },
    /// The dish-count rate after `customer` customers is not finite
    RateNotFinite { customer: usize, rate: f64 },
    /// The dish-count rate after `customer` customers rounded to zero
    RateUnderflow { customer: usize },
    /// A table entry is not finite, or is not a probability
    InvalidProbability {
        customer: usize,
        dish: usize,
        value: f64,
    },
}

impl From<IbpError> for RecursionError {
    fn from(err: IbpError) -> Self {
        RecursionError::Prior(err)
    }
}

/// One entry of the activation table, indexed from one
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct ActivationRecord {
    pub customer: usize,
    pub dish: usize,
    pub probability: f64,
}

/// New-dish rate of one customer and the dish-count rate after them
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct DishRateRecord {
    pub customer: usize,
    pub rate: f64,
    pub cumulative_rate: f64,
}

/// Per-customer new-dish rates and their cumulative sums λ_1, ..., λ_n.
///
/// # Example
///
/// ```
/// use ibp::prior::IbpParams;
/// use ibp::recursion::dish_count_rates;
///
/// let params = IbpParams::new(1.0, 1.0).unwrap();
/// let (rates, cumulative) = dish_count_rates(&params, 3).unwrap();
///
/// assert_eq!(rates, vec![1.0, 0.5, 1.0 / 3.0]);
/// assert_eq!(cumulative[2], 1.0 + 0.5 + 1.0 / 3.0);
/// ```
pub fn dish_count_rates(
    params: &IbpParams,
    n_customers: usize,
) -> Result<(Vec<f64>, Vec<f64>), RecursionError> {
    let rates: Vec<f64> =
        (1..=n_customers).map(|t| params.new_dish_rate(t)).collect();
    let cumulative = cumsum(&rates);
    if let Some(ix) = cumulative.iter().position(|r| !r.is_finite()) {
        return Err(RecursionError::RateNotFinite {
            customer: ix + 1,
            rate: cumulative[ix],
        });
    }
    Ok((rates, cumulative))
}

/// The exact activation table and dish-count rates for one (α, β)
///
/// # Example
///
/// ```
/// use ibp::prior::IbpParams;
/// use ibp::recursion::{PriorRecursion, RecursionConfig};
///
/// let params = IbpParams::new(1.1, 1.0).unwrap();
/// let rec = PriorRecursion::compute(params, 5, &RecursionConfig::default()).unwrap();
///
/// // Expected total dishes after five customers is α H_5
/// let h5 = 1.0 + 1.0 / 2.0 + 1.0 / 3.0 + 1.0 / 4.0 + 1.0 / 5.0;
/// assert!((rec.cumulative_rates()[4] - 1.1 * h5).abs() < 1e-12);
///
/// // Each customer takes α dishes on average
/// for total in rec.table().row_sums() {
///     assert!((total - 1.1).abs() < 1e-6);
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct PriorRecursion {
    params: IbpParams,
    rates: Vec<f64>,
    cumulative_rates: Vec<f64>,
    table: ActivationTable,
    /// Number of dishes tracked at each customer
    widths: Vec<usize>,
}

impl PriorRecursion {
    /// Run the recursion for customers `1..=n_customers`
    pub fn compute(
        params: IbpParams,
        n_customers: usize,
        config: &RecursionConfig,
    ) -> Result<Self, RecursionError> {
        config.validate()?;
        let params = IbpParams::new(params.alpha(), params.beta())?;
        debug!(
            "recursion: {params}, n_customers = {n_customers}, cutoff = {}",
            config.cutoff
        );

        let (rates, cumulative_rates) =
            dish_count_rates(&params, n_customers)?;

        // running_mass[k] = Σ_{t' < t} P[t', k]
        let mut running_mass: Vec<f64> = Vec::new();
        // prev_tail[k] = P(Λ_{t-1} ≥ k + 1)
        let mut prev_tail: Vec<f64> = Vec::new();
        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(n_customers);
        let mut widths: Vec<usize> = Vec::with_capacity(n_customers);

        for (ix, &lambda) in cumulative_rates.iter().enumerate() {
            let t = ix + 1;
            let dish_count = Poisson::new(lambda).map_err(|err| match err {
                PoissonError::RateTooLow { .. } => {
                    RecursionError::RateUnderflow { customer: t }
                }
                PoissonError::RateNotFinite { .. } => {
                    RecursionError::RateNotFinite {
                        customer: t,
                        rate: lambda,
                    }
                }
            })?;

            // Start tracking every dish that has arrived with probability
            // above the cutoff
            let mut tail: Vec<f64> = (1..=prev_tail.len())
                .map(|k| dish_count.at_least(k as u32))
                .collect();
            loop {
                let p_arrived = dish_count.at_least(tail.len() as u32 + 1);
                if p_arrived <= config.cutoff {
                    break;
                }
                if tail.len() >= config.max_dishes {
                    return Err(RecursionError::TableTooWide {
                        customer: t,
                        max_dishes: config.max_dishes,
                    });
                }
                tail.push(p_arrived);
            }
            prev_tail.resize(tail.len(), 0.0);
            running_mass.resize(tail.len(), 0.0);

            let mut row: Vec<f64> = Vec::with_capacity(tail.len());
            for (k, mass) in running_mass.iter_mut().enumerate() {
                let p_new = (tail[k] - prev_tail[k]).max(0.0);
                let p = params.stick_update(*mass, t) + p_new;
                if !p.is_finite() || !(-UNIT_SLACK..=1.0 + UNIT_SLACK).contains(&p) {
                    return Err(RecursionError::InvalidProbability {
                        customer: t,
                        dish: k + 1,
                        value: p,
                    });
                }
                let p = p.clamp(0.0, 1.0);
                *mass += p;
                row.push(p);
            }
            trace!(
                "recursion: t = {t}, λ_t = {lambda}, tracked dishes = {}",
                row.len()
            );

            widths.push(row.len());
            rows.push(row);
            prev_tail = tail;
        }

        let table = ActivationTable::from_ragged_rows(&rows);
        debug!(
            "recursion: done, {} customers x {} dishes",
            table.n_customers(),
            table.n_dishes()
        );

        Ok(PriorRecursion {
            params,
            rates,
            cumulative_rates,
            table,
            widths,
        })
    }

    #[inline]
    pub fn params(&self) -> &IbpParams {
        &self.params
    }

    #[inline]
    pub fn n_customers(&self) -> usize {
        self.rates.len()
    }

    /// `new_dish_rate(t)` for t = 1, ..., n
    #[inline]
    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    /// λ_t, the rate of the dish-count distribution after t customers
    #[inline]
    pub fn cumulative_rates(&self) -> &[f64] {
        &self.cumulative_rates
    }

    /// The exact activation table `P[t, k]`
    #[inline]
    pub fn table(&self) -> &ActivationTable {
        &self.table
    }

    /// Number of dishes tracked when customer `t` (one-based) was processed
    pub fn n_tracked(&self, t: usize) -> Option<usize> {
        t.checked_sub(1).and_then(|ix| self.widths.get(ix).copied())
    }

    /// Distribution over the number of dishes after `t` customers
    /// (one-based). `None` for `t = 0` or past the last customer.
    pub fn dish_count(&self, t: usize) -> Option<Poisson> {
        t.checked_sub(1)
            .and_then(|ix| self.cumulative_rates.get(ix))
            .and_then(|&rate| Poisson::new(rate).ok())
    }

    /// `p(Λ_t = ℓ)` with rows t = 1..=n and columns ℓ = 0..=max_dishes
    pub fn dish_count_pmf_table(&self, max_dishes: u32) -> DMatrix<f64> {
        let n_cols = max_dishes as usize + 1;
        let mut out = DMatrix::zeros(self.n_customers(), n_cols);
        for t in 1..=self.n_customers() {
            if let Some(dish_count) = self.dish_count(t) {
                for ell in 0..=max_dishes {
                    out[(t - 1, ell as usize)] = dish_count.f(&ell);
                }
            }
        }
        out
    }

    /// The running sum `Σ_{t' < t} P[t', k]`
    pub fn running_mass(&self) -> DMatrix<f64> {
        self.table.running_mass()
    }

    /// Non-zero table entries as one-based records
    pub fn records(&self) -> Vec<ActivationRecord> {
        let mut out = Vec::new();
        for customer in 0..self.table.n_customers() {
            for dish in 0..self.table.n_dishes() {
                let probability = self.table.get(customer, dish);
                if probability > 0.0 {
                    out.push(ActivationRecord {
                        customer: customer + 1,
                        dish: dish + 1,
                        probability,
                    });
                }
            }
        }
        out
    }

    /// Dish-rate records, one per customer
    pub fn rate_records(&self) -> Vec<DishRateRecord> {
        self.rates
            .iter()
            .zip(self.cumulative_rates.iter())
            .enumerate()
            .map(|(ix, (&rate, &cumulative_rate))| DishRateRecord {
                customer: ix + 1,
                rate,
                cumulative_rate,
            })
            .collect()
    }
}

impl std::error::Error for RecursionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Prior(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for RecursionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prior(err) => write!(f, "invalid prior: {err}"),
            Self::InvalidCutoff { cutoff } => {
                write!(f, "cutoff ({cutoff}) must be in (0, 1)")
            }
            Self::TableTooWide {
                customer,
                max_dishes,
            } => write!(
                f,
                "more than {max_dishes} dishes are tracked at customer {customer}"
            ),
            Self::RateNotFinite { customer, rate } => write!(
                f,
                "dish-count rate after customer {customer} is {rate}"
            ),
            Self::RateUnderflow { customer } => write!(
                f,
                "dish-count rate after customer {customer} underflowed to zero"
            ),
            Self::InvalidProbability {
                customer,
                dish,
                value,
            } => write!(
                f,
                "P[{customer}, {dish}] = {value} is not a probability"
            ),
        }
    }
}

impl Classify for RecursionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Prior(err) => err.kind(),
            Self::InvalidCutoff { .. } | Self::TableTooWide { .. } => {
                ErrorKind::InvalidParameter
            }
            Self::RateNotFinite { .. }
            | Self::RateUnderflow { .. }
            | Self::InvalidProbability { .. } => ErrorKind::NumericalInstability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Cdf;
    use proptest::prelude::*;

    const TOL: f64 = 1E-12;

    fn compute(alpha: f64, beta: f64, n: usize) -> PriorRecursion {
        let params = IbpParams::new(alpha, beta).unwrap();
        PriorRecursion::compute(params, n, &RecursionConfig::default())
            .unwrap()
    }

    crate::test_basic_impls!(compute(1.1, 1.0, 3));

    #[test]
    fn zero_customers_is_empty() {
        let rec = compute(2.0, 1.0, 0);
        assert!(rec.rates().is_empty());
        assert!(rec.cumulative_rates().is_empty());
        assert_eq!(rec.table().n_customers(), 0);
        assert_eq!(rec.table().n_dishes(), 0);
        assert!(rec.dish_count(1).is_none());
        assert!(rec.records().is_empty());
    }

    #[test]
    fn first_customer_dish_count_is_poisson_alpha() {
        let alphas = [1.1, 10.37, 15.78, 30.91, 5.98, 1.17];
        let betas = [0.3, 0.58, 2.4, 8.7, 1.0];
        for alpha in alphas {
            for beta in betas {
                let rec = compute(alpha, beta, 1);
                assert_eq!(rec.rates()[0], alpha);
                assert_eq!(rec.cumulative_rates()[0], alpha);
                assert_eq!(rec.dish_count(1), Some(Poisson::new(alpha).unwrap()));
            }
        }
    }

    #[test]
    fn first_customer_row_is_poisson_tail() {
        let rec = compute(2.3, 0.7, 1);
        let pois = Poisson::new(2.3).unwrap();
        let row = rec.table().row(0);
        for (k, p) in row.iter().enumerate() {
            assert::close(*p, pois.sf(&(k as u32)), 1E-10);
        }
        assert!(pois.at_least(row.len() as u32 + 1) <= DISH_CUTOFF);
    }

    #[test]
    fn second_customer_one_parameter_by_hand() {
        // α = 1, β = 1: λ_1 = 1, λ_2 = 1.5
        let rec = compute(1.0, 1.0, 2);
        let l1 = Poisson::new(1.0).unwrap();
        let l2 = Poisson::new(1.5).unwrap();
        let p_1_1 = l1.at_least(1);
        let expected = p_1_1 / 2.0 + l2.at_least(1) - l1.at_least(1);
        assert::close(rec.table().get(1, 0), expected, 1E-10);
    }

    #[test]
    fn rows_sum_to_alpha() {
        for (alpha, beta) in [(1.1, 1.0), (5.98, 2.4), (1.17, 0.58), (10.37, 8.7)]
        {
            let rec = compute(alpha, beta, 30);
            for total in rec.table().row_sums() {
                assert::close(total, alpha, 1E-5);
            }
        }
    }

    #[test]
    fn expected_dish_count_is_closed_form() {
        let rec = compute(1.1, 1.0, 5);
        let closed_form: f64 = (1..=5).map(|t| 1.1 / t as f64).sum();
        assert::close(rec.cumulative_rates()[4], closed_form, TOL);
    }

    #[test]
    fn tracked_dishes_grow() {
        let rec = compute(3.0, 1.0, 20);
        let widths: Vec<usize> =
            (1..=20).map(|t| rec.n_tracked(t).unwrap()).collect();
        assert!(widths.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(rec.n_tracked(0), None);
        assert_eq!(rec.n_tracked(21), None);
    }

    #[test]
    fn untracked_cells_are_zero() {
        let rec = compute(3.0, 1.0, 20);
        let first_width = rec.n_tracked(1).unwrap();
        for k in first_width..rec.table().n_dishes() {
            assert_eq!(rec.table().get(0, k), 0.0);
        }
    }

    #[test]
    fn larger_cutoff_tracks_fewer_dishes() {
        let params = IbpParams::new(4.0, 1.0).unwrap();
        let fine = PriorRecursion::compute(params, 10, &RecursionConfig::default())
            .unwrap();
        let coarse = PriorRecursion::compute(
            params,
            10,
            &RecursionConfig::default().with_cutoff(1e-3),
        )
        .unwrap();
        assert!(coarse.table().n_dishes() < fine.table().n_dishes());
        // the dish-count rates are unaffected by truncation
        assert_eq!(coarse.cumulative_rates(), fine.cumulative_rates());
    }

    #[test]
    fn invalid_cutoff_is_rejected() {
        let params = IbpParams::new(1.0, 1.0).unwrap();
        for cutoff in [0.0, 1.0, -1.0, f64::NAN] {
            let err = PriorRecursion::compute(
                params,
                3,
                &RecursionConfig::default().with_cutoff(cutoff),
            )
            .unwrap_err();
            assert!(matches!(err, RecursionError::InvalidCutoff { .. }));
            assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        }
    }

    #[test]
    fn invalid_params_fail_before_recursing() {
        let params = IbpParams::new_unchecked(-1.0, 1.0);
        let err =
            PriorRecursion::compute(params, 3, &RecursionConfig::default())
                .unwrap_err();
        assert_eq!(
            err,
            RecursionError::Prior(IbpError::AlphaTooLow { alpha: -1.0 })
        );
    }

    #[test]
    fn too_many_dishes_is_an_error() {
        let params = IbpParams::new(50.0, 1.0).unwrap();
        let err = PriorRecursion::compute(
            params,
            2,
            &RecursionConfig::default().with_max_dishes(10),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RecursionError::TableTooWide {
                customer: 1,
                max_dishes: 10
            }
        );
    }

    #[test]
    fn overflowing_rates_are_numerical_errors() {
        let params = IbpParams::new(f64::MAX, 1.0).unwrap();
        let err = PriorRecursion::compute(params, 3, &RecursionConfig::default())
            .unwrap_err();
        assert!(matches!(err, RecursionError::RateNotFinite { customer: 2, .. }));
        assert_eq!(err.kind(), ErrorKind::NumericalInstability);
    }

    #[test]
    fn dish_count_pmf_rows_sum_to_one() {
        let rec = compute(2.0, 1.0, 6);
        let pmf = rec.dish_count_pmf_table(60);
        for row in pmf.row_iter() {
            assert::close(row.sum(), 1.0, 1E-10);
        }
    }

    #[test]
    fn running_mass_never_exceeds_earlier_customers() {
        let rec = compute(2.0, 0.3, 15);
        let mass = rec.running_mass();
        for t in 0..15 {
            for k in 0..mass.ncols() {
                assert!(mass[(t, k)] <= t as f64 + 1E-9);
            }
        }
    }

    #[test]
    fn records_are_one_based() {
        let rec = compute(1.0, 1.0, 2);
        let first = rec.records()[0];
        assert_eq!((first.customer, first.dish), (1, 1));
        let rates = rec.rate_records();
        assert_eq!(rates.len(), 2);
        assert::close(rates[1].rate, 0.5, TOL);
        assert::close(rates[1].cumulative_rate, 1.5, TOL);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn table_entries_are_probabilities(
            alpha in 0.1..20.0_f64,
            beta in 0.1..10.0_f64,
            n in 0_usize..25,
        ) {
            let rec = compute(alpha, beta, n);
            prop_assert!(rec
                .table()
                .as_matrix()
                .iter()
                .all(|p| (0.0..=1.0).contains(p)));
        }

        #[test]
        fn cumulative_rates_are_non_decreasing(
            alpha in 0.1..20.0_f64,
            beta in 0.1..10.0_f64,
            n in 1_usize..50,
        ) {
            let rec = compute(alpha, beta, n);
            prop_assert!(rec
                .cumulative_rates()
                .windows(2)
                .all(|w| w[0] <= w[1]));
        }
    }
}
