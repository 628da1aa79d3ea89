//! Agreement between the exact activation table and Monte Carlo estimates as
//! a function of the number of simulated buffets
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use log::debug;
use rand::Rng;
use std::fmt;

use crate::misc::mean_and_sem;
use crate::monte_carlo::{simulate, MonteCarloError};
use crate::recursion::PriorRecursion;
use crate::result::{Classify, ErrorKind};
use crate::table::ActivationTable;

/// Sample budgets and repeats for [`track`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case", default))]
pub struct DiscrepancyConfig {
    /// Strictly increasing numbers of buffets per estimate
    pub budgets: Vec<usize>,
    /// Independent estimates per budget
    pub n_repeats: usize,
}

impl Default for DiscrepancyConfig {
    fn default() -> Self {
        Self {
            budgets: vec![10, 100, 1_000, 10_000],
            n_repeats: 10,
        }
    }
}

impl DiscrepancyConfig {
    pub fn with_budgets(self, budgets: Vec<usize>) -> Self {
        Self { budgets, ..self }
    }

    pub fn with_n_repeats(self, n_repeats: usize) -> Self {
        Self { n_repeats, ..self }
    }

    fn validate(&self) -> Result<(), DiscrepancyError> {
        if self.n_repeats == 0 {
            return Err(DiscrepancyError::NoRepeats);
        }
        if self.budgets.is_empty() {
            return Err(DiscrepancyError::NoBudgets);
        }
        if self.budgets[0] == 0 {
            return Err(DiscrepancyError::ZeroBudget);
        }
        if self.budgets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DiscrepancyError::BudgetsNotIncreasing {
                budgets: self.budgets.clone(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiscrepancyError {
    /// At least one repeat per budget is required
    NoRepeats,
    /// No sample budgets were given
    NoBudgets,
    /// Sample budgets must be positive
    ZeroBudget,
    /// Sample budgets must be strictly increasing
    BudgetsNotIncreasing { budgets: Vec<usize> },
    /// An estimate covers a different number of customers than the exact
    /// table
    CustomerMismatch { expected: usize, found: usize },
    /// No estimates were given for a budget
    NoEstimates { num_samples: usize },
    /// Simulation failed
    MonteCarlo(MonteCarloError),
}

impl From<MonteCarloError> for DiscrepancyError {
    fn from(err: MonteCarloError) -> Self {
        DiscrepancyError::MonteCarlo(err)
    }
}

/// Mean squared error over repeats and its standard error at one budget
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct DiscrepancyPoint {
    pub num_samples: usize,
    pub mean: f64,
    pub sem: f64,
}

/// Discrepancy points ordered by increasing sample budget
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct DiscrepancyCurve {
    pub points: Vec<DiscrepancyPoint>,
}

impl DiscrepancyCurve {
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The point at a given sample budget
    pub fn at(&self, num_samples: usize) -> Option<&DiscrepancyPoint> {
        self.points.iter().find(|p| p.num_samples == num_samples)
    }

    pub fn means(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.mean).collect()
    }

    pub fn sems(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.sem).collect()
    }
}

/// Summarize the squared error of independent estimates against the exact
/// table.
///
/// The error of each estimate is summed over dishes and averaged over
/// customers; see [`ActivationTable::sq_err`].
pub fn summarize(
    exact: &ActivationTable,
    num_samples: usize,
    estimates: &[ActivationTable],
) -> Result<DiscrepancyPoint, DiscrepancyError> {
    let errors = estimates
        .iter()
        .map(|est| {
            exact.sq_err(est).ok_or(DiscrepancyError::CustomerMismatch {
                expected: exact.n_customers(),
                found: est.n_customers(),
            })
        })
        .collect::<Result<Vec<f64>, DiscrepancyError>>()?;

    let (mean, sem) = mean_and_sem(&errors)
        .ok_or(DiscrepancyError::NoEstimates { num_samples })?;

    Ok(DiscrepancyPoint {
        num_samples,
        mean,
        sem,
    })
}

/// Compare fresh Monte Carlo estimates against the exact table at every
/// budget in `config`.
///
/// Each repeat at each budget simulates its own buffets; nothing is shared
/// between repeats.
///
/// # Example
///
/// ```
/// use ibp::discrepancy::{track, DiscrepancyConfig};
/// use ibp::prior::IbpParams;
/// use ibp::recursion::{PriorRecursion, RecursionConfig};
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::SmallRng::seed_from_u64(0x1b9);
/// let params = IbpParams::new(1.1, 1.0).unwrap();
/// let exact = PriorRecursion::compute(params, 5, &RecursionConfig::default()).unwrap();
///
/// let config = DiscrepancyConfig::default()
///     .with_budgets(vec![10, 1_000])
///     .with_n_repeats(5);
/// let curve = track(&exact, &config, &mut rng).unwrap();
///
/// assert_eq!(curve.len(), 2);
/// assert!(curve.points[1].mean < curve.points[0].mean);
/// ```
pub fn track<R: Rng>(
    exact: &PriorRecursion,
    config: &DiscrepancyConfig,
    rng: &mut R,
) -> Result<DiscrepancyCurve, DiscrepancyError> {
    config.validate()?;
    let params = *exact.params();
    let n_customers = exact.n_customers();

    let mut points = Vec::with_capacity(config.budgets.len());
    for &num_samples in config.budgets.iter() {
        let estimates = (0..config.n_repeats)
            .map(|_| {
                simulate(params, n_customers, num_samples, rng)
                    .map(|est| est.table().clone())
            })
            .collect::<Result<Vec<ActivationTable>, MonteCarloError>>()?;
        let point = summarize(exact.table(), num_samples, &estimates)?;
        debug!(
            "discrepancy: {params}, S = {num_samples}, mean = {}, sem = {}",
            point.mean, point.sem
        );
        points.push(point);
    }

    Ok(DiscrepancyCurve { points })
}

impl std::error::Error for DiscrepancyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MonteCarlo(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for DiscrepancyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRepeats => write!(f, "number of repeats must be positive"),
            Self::NoBudgets => write!(f, "no sample budgets given"),
            Self::ZeroBudget => write!(f, "sample budgets must be positive"),
            Self::BudgetsNotIncreasing { budgets } => write!(
                f,
                "sample budgets must be strictly increasing: {budgets:?}"
            ),
            Self::CustomerMismatch { expected, found } => write!(
                f,
                "estimate covers {found} customers but the exact table covers {expected}"
            ),
            Self::NoEstimates { num_samples } => {
                write!(f, "no estimates for budget {num_samples}")
            }
            Self::MonteCarlo(err) => write!(f, "simulation failed: {err}"),
        }
    }
}

impl Classify for DiscrepancyError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::CustomerMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::MonteCarlo(err) => err.kind(),
            _ => ErrorKind::InvalidParameter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prior::IbpParams;
    use crate::recursion::RecursionConfig;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    fn exact(alpha: f64, beta: f64, n: usize) -> PriorRecursion {
        let params = IbpParams::new(alpha, beta).unwrap();
        PriorRecursion::compute(params, n, &RecursionConfig::default())
            .unwrap()
    }

    crate::test_basic_impls!(DiscrepancyConfig::default());

    #[test]
    fn config_validation() {
        let mut rng = Xoshiro256Plus::seed_from_u64(1);
        let rec = exact(1.0, 1.0, 3);
        let bad = [
            (
                DiscrepancyConfig::default().with_n_repeats(0),
                DiscrepancyError::NoRepeats,
            ),
            (
                DiscrepancyConfig::default().with_budgets(vec![]),
                DiscrepancyError::NoBudgets,
            ),
            (
                DiscrepancyConfig::default().with_budgets(vec![0, 10]),
                DiscrepancyError::ZeroBudget,
            ),
            (
                DiscrepancyConfig::default().with_budgets(vec![10, 10]),
                DiscrepancyError::BudgetsNotIncreasing {
                    budgets: vec![10, 10],
                },
            ),
        ];
        for (config, expected) in bad {
            let err = track(&rec, &config, &mut rng).unwrap_err();
            assert_eq!(err, expected);
            assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        }
    }

    #[test]
    fn exact_table_has_no_discrepancy() {
        let rec = exact(2.0, 1.0, 4);
        let estimates = vec![rec.table().clone(); 3];
        let point = summarize(rec.table(), 1, &estimates).unwrap();
        assert_eq!(point.mean, 0.0);
        assert_eq!(point.sem, 0.0);
    }

    #[test]
    fn summarize_rejects_customer_mismatch() {
        let rec = exact(2.0, 1.0, 4);
        let estimates = vec![ActivationTable::zeros(3, 2)];
        let err = summarize(rec.table(), 10, &estimates).unwrap_err();
        assert_eq!(
            err,
            DiscrepancyError::CustomerMismatch {
                expected: 4,
                found: 3
            }
        );
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
    }

    #[test]
    fn single_repeat_has_zero_sem() {
        let mut rng = Xoshiro256Plus::seed_from_u64(2);
        let rec = exact(1.5, 1.0, 4);
        let config = DiscrepancyConfig::default()
            .with_budgets(vec![10, 20])
            .with_n_repeats(1);
        let curve = track(&rec, &config, &mut rng).unwrap();
        assert_eq!(curve.sems(), vec![0.0, 0.0]);
        assert!(curve.means().iter().all(|&m| m > 0.0));
    }

    #[test]
    fn error_shrinks_with_budget() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0xdead);
        let rec = exact(1.5, 1.0, 5);
        let config = DiscrepancyConfig::default()
            .with_budgets(vec![10, 100, 1_000])
            .with_n_repeats(10);
        let curve = track(&rec, &config, &mut rng).unwrap();
        let means = curve.means();
        assert!(
            means.windows(2).all(|w| w[1] < w[0]),
            "means = {means:?}"
        );
        assert_eq!(curve.at(100).unwrap().num_samples, 100);
        assert!(curve.at(50).is_none());
    }

    #[test]
    fn sem_halves_with_four_times_the_repeats() {
        let rec = exact(1.5, 1.0, 5);
        let sem_for = |n_repeats: usize, seed: u64| {
            let mut rng = Xoshiro256Plus::seed_from_u64(seed);
            let config = DiscrepancyConfig::default()
                .with_budgets(vec![50])
                .with_n_repeats(n_repeats);
            track(&rec, &config, &mut rng).unwrap().points[0].sem
        };
        // average over a few seeds to tame the noise in the SEM itself
        let seeds = [11_u64, 12, 13, 14];
        let sem_r: f64 =
            seeds.iter().map(|&s| sem_for(25, s)).sum::<f64>() / 4.0;
        let sem_4r: f64 =
            seeds.iter().map(|&s| sem_for(100, s)).sum::<f64>() / 4.0;
        let ratio = sem_r / sem_4r;
        assert!((1.4..3.0).contains(&ratio), "ratio = {ratio}");
    }
}
