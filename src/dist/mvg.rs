use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;
use std::fmt;

use crate::result::{Classify, ErrorKind};
use crate::traits::{Mean, Sampleable, Variance};

/// [Multivariate Gaussian/Normal Distribution](https://en.wikipedia.org/wiki/Multivariate_normal_distribution),
/// 𝒩(μ, Σ), with positive semi-definite Σ.
///
/// Factor loading posteriors frequently collapse to (near) point masses, so the
/// covariance is only required to be positive semi-definite. A zero covariance
/// yields draws that are exactly μ.
///
/// # Example
///
/// ```
/// use nalgebra::{DMatrix, DVector};
/// use ibp::dist::MvGaussian;
/// use ibp::traits::*;
///
/// let mu = DVector::from_column_slice(&[1.0, -2.0]);
/// let mvg = MvGaussian::new(mu.clone(), DMatrix::zeros(2, 2)).unwrap();
///
/// let mut rng = rand::thread_rng();
/// let x: DVector<f64> = mvg.draw(&mut rng);
/// assert_eq!(x, mu);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MvGaussian {
    mu: DVector<f64>,
    cov: DMatrix<f64>,
    /// Any matrix L with L Lᵀ = Σ
    factor: DMatrix<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MvGaussianError {
    /// The covariance matrix is not square
    CovNotSquare { nrows: usize, ncols: usize },
    /// The dimensions of the mean and covariance do not match
    MuCovDimensionMismatch { n_mu: usize, n_cov: usize },
    /// Some entry of the mean or covariance is infinite or NaN
    NotFinite,
    /// The covariance has a clearly negative eigenvalue
    CovNotPositiveSemiDefinite { min_eigenvalue: f64 },
}

impl MvGaussian {
    /// Create a new multivariate Gaussian with mean `mu` and covariance `cov`.
    pub fn new(
        mu: DVector<f64>,
        cov: DMatrix<f64>,
    ) -> Result<Self, MvGaussianError> {
        if cov.nrows() != cov.ncols() {
            return Err(MvGaussianError::CovNotSquare {
                nrows: cov.nrows(),
                ncols: cov.ncols(),
            });
        }
        if mu.len() != cov.nrows() {
            return Err(MvGaussianError::MuCovDimensionMismatch {
                n_mu: mu.len(),
                n_cov: cov.nrows(),
            });
        }
        if mu.iter().chain(cov.iter()).any(|x| !x.is_finite()) {
            return Err(MvGaussianError::NotFinite);
        }
        let factor = psd_factor(&cov)?;
        Ok(MvGaussian { mu, cov, factor })
    }

    /// A point mass at `mu`
    pub fn degenerate(mu: DVector<f64>) -> Self {
        let n = mu.len();
        MvGaussian {
            mu,
            cov: DMatrix::zeros(n, n),
            factor: DMatrix::zeros(n, n),
        }
    }

    /// Number of dimensions
    #[inline]
    pub fn ndims(&self) -> usize {
        self.mu.len()
    }

    #[inline]
    pub fn mu(&self) -> &DVector<f64> {
        &self.mu
    }

    #[inline]
    pub fn cov(&self) -> &DMatrix<f64> {
        &self.cov
    }
}

fn psd_factor(cov: &DMatrix<f64>) -> Result<DMatrix<f64>, MvGaussianError> {
    if let Some(chol) = cov.clone().cholesky() {
        return Ok(chol.l());
    }

    // Singular covariance. Fall back to the eigendecomposition and clip the
    // round-off negatives.
    let eig = cov.clone().symmetric_eigen();
    let scale = eig
        .eigenvalues
        .iter()
        .fold(0.0_f64, |acc, &l| acc.max(l.abs()));
    let min_eigenvalue = eig.eigenvalues.iter().copied().fold(f64::INFINITY, f64::min);
    if min_eigenvalue < -1e-10 * scale.max(1.0) {
        return Err(MvGaussianError::CovNotPositiveSemiDefinite { min_eigenvalue });
    }
    let roots = eig.eigenvalues.map(|l| l.max(0.0).sqrt());
    Ok(eig.eigenvectors * DMatrix::from_diagonal(&roots))
}

impl Sampleable<DVector<f64>> for MvGaussian {
    fn draw<R: Rng>(&self, rng: &mut R) -> DVector<f64> {
        let dims = self.mu.len();
        let z: DVector<f64> =
            DVector::from_fn(dims, |_, _| rng.sample(StandardNormal));
        &self.mu + &self.factor * z
    }
}

impl Mean<DVector<f64>> for MvGaussian {
    fn mean(&self) -> Option<DVector<f64>> {
        Some(self.mu.clone())
    }
}

impl Variance<DMatrix<f64>> for MvGaussian {
    fn variance(&self) -> Option<DMatrix<f64>> {
        Some(self.cov.clone())
    }
}

impl std::error::Error for MvGaussianError {}

impl fmt::Display for MvGaussianError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CovNotSquare { nrows, ncols } => {
                write!(f, "covariance must be square but is {nrows}x{ncols}")
            }
            Self::MuCovDimensionMismatch { n_mu, n_cov } => write!(
                f,
                "number of dimensions in μ ({n_mu}) and Σ ({n_cov}) must match"
            ),
            Self::NotFinite => write!(f, "non-finite entry in μ or Σ"),
            Self::CovNotPositiveSemiDefinite { min_eigenvalue } => write!(
                f,
                "Σ is not positive semi-definite (min eigenvalue {min_eigenvalue})"
            ),
        }
    }
}

impl Classify for MvGaussianError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::CovNotSquare { .. } | Self::MuCovDimensionMismatch { .. } => {
                ErrorKind::DimensionMismatch
            }
            Self::NotFinite => ErrorKind::NumericalInstability,
            Self::CovNotPositiveSemiDefinite { .. } => {
                ErrorKind::InvalidParameter
            }
        }
    }
}
