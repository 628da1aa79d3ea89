//! Empirical activation tables from forward simulation of the IBP
use log::debug;
use nalgebra::DMatrix;
use rand::Rng;
use std::fmt;

use crate::prior::{AllocationMatrix, Ibp, IbpError, IbpParams};
use crate::result::{Classify, ErrorKind};
use crate::table::ActivationTable;
use crate::traits::Sampleable;

#[derive(Debug, Clone, PartialEq)]
pub enum MonteCarloError {
    /// Invalid IBP hyperparameters
    Prior(IbpError),
    /// At least one sample is required
    NoSamples,
}

impl From<IbpError> for MonteCarloError {
    fn from(err: IbpError) -> Self {
        MonteCarloError::Prior(err)
    }
}

/// Per-customer statistics of the number of dishes served so far, over all
/// simulated buffets
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalDishCounts {
    /// `counts[s][t]`: dishes served to customers `1..=t + 1` in sample `s`
    counts: Vec<Vec<usize>>,
}

impl EmpiricalDishCounts {
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.counts.len()
    }

    /// Dish counts after each customer in one sample
    pub fn sample(&self, ix: usize) -> Option<&[usize]> {
        self.counts.get(ix).map(|c| c.as_slice())
    }

    /// Mean number of dishes after each customer
    pub fn mean(&self) -> Vec<f64> {
        let n_customers = self.counts.first().map_or(0, |c| c.len());
        let n = self.counts.len() as f64;
        (0..n_customers)
            .map(|t| self.counts.iter().map(|c| c[t] as f64).sum::<f64>() / n)
            .collect()
    }

    /// Empirical `p(Λ_t = ℓ)` with rows t = 1..=n and columns ℓ = 0..=max
    /// where max is the largest count observed.
    pub fn pmf_table(&self) -> DMatrix<f64> {
        let n_customers = self.counts.first().map_or(0, |c| c.len());
        let max = self
            .counts
            .iter()
            .flat_map(|c| c.iter().copied())
            .max()
            .unwrap_or(0);
        let mut out = DMatrix::zeros(n_customers, max + 1);
        let weight = 1.0 / self.counts.len() as f64;
        for sample in self.counts.iter() {
            for (t, &ell) in sample.iter().enumerate() {
                out[(t, ell)] += weight;
            }
        }
        out
    }
}

/// Averages of many simulated buffets
#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloEstimate {
    table: ActivationTable,
    dish_counts: EmpiricalDishCounts,
}

impl MonteCarloEstimate {
    /// Mean allocation matrix, narrower draws padded with zeros
    #[inline]
    pub fn table(&self) -> &ActivationTable {
        &self.table
    }

    #[inline]
    pub fn dish_counts(&self) -> &EmpiricalDishCounts {
        &self.dish_counts
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.dish_counts.n_samples()
    }
}

/// Simulate `n_samples` independent buffets of `n_customers` customers and
/// average them.
///
/// # Example
///
/// ```
/// use ibp::monte_carlo::simulate;
/// use ibp::prior::IbpParams;
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::SmallRng::seed_from_u64(1337);
/// let params = IbpParams::new(2.0, 1.0).unwrap();
/// let est = simulate(params, 4, 200, &mut rng).unwrap();
///
/// assert_eq!(est.n_samples(), 200);
/// assert_eq!(est.table().n_customers(), 4);
/// ```
pub fn simulate<R: Rng>(
    params: IbpParams,
    n_customers: usize,
    n_samples: usize,
    rng: &mut R,
) -> Result<MonteCarloEstimate, MonteCarloError> {
    if n_samples == 0 {
        return Err(MonteCarloError::NoSamples);
    }
    let params = IbpParams::new(params.alpha(), params.beta())?;
    let ibp = Ibp::new(params, n_customers)?;

    let mut sums: DMatrix<f64> = DMatrix::zeros(n_customers, 0);
    let mut counts: Vec<Vec<usize>> = Vec::with_capacity(n_samples);

    for z in ibp.sample_stream(rng).take(n_samples) {
        accumulate(&mut sums, &z);
        counts.push((0..n_customers).map(|t| z.n_dishes_after(t)).collect());
    }
    sums /= n_samples as f64;

    debug!(
        "monte carlo: {params}, {n_samples} samples, widest buffet {} dishes",
        sums.ncols()
    );

    Ok(MonteCarloEstimate {
        table: ActivationTable::new_unchecked(sums),
        dish_counts: EmpiricalDishCounts { counts },
    })
}

fn accumulate(sums: &mut DMatrix<f64>, z: &AllocationMatrix) {
    if z.n_dishes() > sums.ncols() {
        let narrow = std::mem::replace(sums, DMatrix::zeros(0, 0));
        *sums = narrow.resize_horizontally(z.n_dishes(), 0.0);
    }
    for k in 0..z.n_dishes() {
        for t in 0..z.n_customers() {
            if z.get(t, k) {
                sums[(t, k)] += 1.0;
            }
        }
    }
}

impl std::error::Error for MonteCarloError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Prior(err) => Some(err),
            Self::NoSamples => None,
        }
    }
}

impl fmt::Display for MonteCarloError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prior(err) => write!(f, "invalid prior: {err}"),
            Self::NoSamples => write!(f, "number of samples must be positive"),
        }
    }
}

impl Classify for MonteCarloError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Prior(err) => err.kind(),
            Self::NoSamples => ErrorKind::InvalidParameter,
        }
    }
}
