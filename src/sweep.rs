//! Typed records over a grid of IBP hyperparameters
//!
//! Each grid point is independent of the others; a driver that distributes
//! them across processes only needs [`GridPoint`] to key the results.
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use itertools::iproduct;
use log::info;
use rand::Rng;
use std::fmt;

use crate::discrepancy::{track, DiscrepancyConfig, DiscrepancyCurve, DiscrepancyError};
use crate::prior::{IbpError, IbpParams};
use crate::recursion::{PriorRecursion, RecursionConfig, RecursionError};
use crate::result::{Classify, ErrorKind};

/// One (α, β) combination
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct GridPoint {
    pub alpha: f64,
    pub beta: f64,
}

impl GridPoint {
    pub fn params(&self) -> Result<IbpParams, IbpError> {
        IbpParams::new(self.alpha, self.beta)
    }
}

impl From<IbpParams> for GridPoint {
    fn from(params: IbpParams) -> Self {
        GridPoint {
            alpha: params.alpha(),
            beta: params.beta(),
        }
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(α = {}, β = {})", self.alpha, self.beta)
    }
}

/// Hyperparameter grid and the settings shared by every point
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct SweepConfig {
    pub alphas: Vec<f64>,
    pub betas: Vec<f64>,
    pub n_customers: usize,
    #[cfg_attr(feature = "serde1", serde(default))]
    pub recursion: RecursionConfig,
    #[cfg_attr(feature = "serde1", serde(default))]
    pub discrepancy: DiscrepancyConfig,
}

impl SweepConfig {
    pub fn new(alphas: Vec<f64>, betas: Vec<f64>, n_customers: usize) -> Self {
        Self {
            alphas,
            betas,
            n_customers,
            recursion: RecursionConfig::default(),
            discrepancy: DiscrepancyConfig::default(),
        }
    }

    pub fn with_recursion(self, recursion: RecursionConfig) -> Self {
        Self { recursion, ..self }
    }

    pub fn with_discrepancy(self, discrepancy: DiscrepancyConfig) -> Self {
        Self {
            discrepancy,
            ..self
        }
    }

    /// Every (α, β) pair, α varying slowest
    pub fn grid(&self) -> Vec<GridPoint> {
        iproduct!(self.alphas.iter(), self.betas.iter())
            .map(|(&alpha, &beta)| GridPoint { alpha, beta })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SweepError {
    /// A grid point holds invalid hyperparameters
    Prior { point: GridPoint, err: IbpError },
    /// The recursion failed at a grid point
    Recursion { point: GridPoint, err: RecursionError },
    /// Discrepancy tracking failed at a grid point
    Discrepancy {
        point: GridPoint,
        err: DiscrepancyError,
    },
}

impl SweepError {
    /// The grid point at which the sweep failed
    pub fn point(&self) -> GridPoint {
        match self {
            Self::Prior { point, .. }
            | Self::Recursion { point, .. }
            | Self::Discrepancy { point, .. } => *point,
        }
    }
}

/// Exact prior quantities and their Monte Carlo discrepancy at one point
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct PriorSweepRecord {
    pub point: GridPoint,
    pub recursion: PriorRecursion,
    pub discrepancy: DiscrepancyCurve,
}

/// Run the recursion and discrepancy tracker at one grid point
pub fn run_grid_point<R: Rng>(
    point: GridPoint,
    config: &SweepConfig,
    rng: &mut R,
) -> Result<PriorSweepRecord, SweepError> {
    let params = point
        .params()
        .map_err(|err| SweepError::Prior { point, err })?;
    let recursion =
        PriorRecursion::compute(params, config.n_customers, &config.recursion)
            .map_err(|err| SweepError::Recursion { point, err })?;
    let discrepancy = track(&recursion, &config.discrepancy, rng)
        .map_err(|err| SweepError::Discrepancy { point, err })?;
    info!(
        "sweep: {point} done, {} dishes tracked, final mean sq err {:?}",
        recursion.table().n_dishes(),
        discrepancy.points.last().map(|p| p.mean)
    );
    Ok(PriorSweepRecord {
        point,
        recursion,
        discrepancy,
    })
}

/// Run every grid point in order, stopping at the first failure
///
/// # Example
///
/// ```
/// use ibp::discrepancy::DiscrepancyConfig;
/// use ibp::sweep::{run_prior_sweep, SweepConfig};
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::SmallRng::seed_from_u64(1);
/// let config = SweepConfig::new(vec![1.0, 2.0], vec![0.5, 1.0], 4)
///     .with_discrepancy(
///         DiscrepancyConfig::default()
///             .with_budgets(vec![10, 100])
///             .with_n_repeats(3),
///     );
///
/// let records = run_prior_sweep(&config, &mut rng).unwrap();
/// assert_eq!(records.len(), 4);
/// assert_eq!(records[1].point.alpha, 1.0);
/// assert_eq!(records[1].point.beta, 1.0);
/// ```
pub fn run_prior_sweep<R: Rng>(
    config: &SweepConfig,
    rng: &mut R,
) -> Result<Vec<PriorSweepRecord>, SweepError> {
    config
        .grid()
        .into_iter()
        .map(|point| run_grid_point(point, config, rng))
        .collect()
}

impl std::error::Error for SweepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Prior { err, .. } => Some(err),
            Self::Recursion { err, .. } => Some(err),
            Self::Discrepancy { err, .. } => Some(err),
        }
    }
}

impl fmt::Display for SweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prior { point, err } => write!(f, "at {point}: {err}"),
            Self::Recursion { point, err } => write!(f, "at {point}: {err}"),
            Self::Discrepancy { point, err } => write!(f, "at {point}: {err}"),
        }
    }
}

impl Classify for SweepError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Prior { err, .. } => err.kind(),
            Self::Recursion { err, .. } => err.kind(),
            Self::Discrepancy { err, .. } => err.kind(),
        }
    }
}
