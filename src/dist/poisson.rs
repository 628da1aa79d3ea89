//! Poisson distribution on unsigned integers
use rand::Rng;
use rand_distr::Poisson as RPoisson;
use special::Gamma as _;
use std::fmt;

use crate::impl_display;
use crate::result::{Classify, ErrorKind};
use crate::traits::{Cdf, HasDensity, Mean, Sampleable, Variance};

/// [Poisson distribution](https://en.wikipedia.org/wiki/Poisson_distribution)
/// over x in {0, 1, ... }.
///
/// Used as the distribution over the number of dishes in the buffet after a
/// given number of customers.
///
/// # Example
///
/// ```
/// use ibp::dist::Poisson;
/// use ibp::traits::*;
///
/// // Create Poisson(λ=5.3)
/// let pois = Poisson::new(5.3).unwrap();
///
/// // CDF at 5
/// assert!((pois.cdf(&5_u32) - 0.563_473_392_288_071_7).abs() < 1E-12);
///
/// // Draw 100 samples
/// let mut rng = rand::thread_rng();
/// let xs: Vec<u32> = pois.sample(100, &mut rng);
/// assert_eq!(xs.len(), 100)
/// ```
#[derive(Debug, Clone)]
pub struct Poisson {
    rate: f64,
    sampler: RPoisson<f64>,
}

impl PartialEq for Poisson {
    fn eq(&self, other: &Poisson) -> bool {
        self.rate == other.rate
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PoissonError {
    /// The rate parameter is less than or equal to zero
    RateTooLow { rate: f64 },
    /// The rate parameter is infinite or NaN
    RateNotFinite { rate: f64 },
}

impl Poisson {
    /// Create a new Poisson distribution with given rate
    pub fn new(rate: f64) -> Result<Self, PoissonError> {
        if !rate.is_finite() {
            Err(PoissonError::RateNotFinite { rate })
        } else if rate <= 0.0 {
            Err(PoissonError::RateTooLow { rate })
        } else {
            RPoisson::new(rate)
                .map(|sampler| Poisson { rate, sampler })
                .map_err(|_| PoissonError::RateNotFinite { rate })
        }
    }

    /// Get the rate parameter
    ///
    /// # Example
    ///
    /// ```
    /// # use ibp::dist::Poisson;
    /// let pois = Poisson::new(2.0).unwrap();
    /// assert_eq!(pois.rate(), 2.0);
    /// ```
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Probability that a draw is at least `k`, P(X ≥ k).
    ///
    /// Computed through the regularized lower incomplete gamma function so that
    /// small tail probabilities keep their relative precision.
    pub fn at_least(&self, k: u32) -> f64 {
        if k == 0 {
            1.0
        } else {
            self.rate.inc_gamma(f64::from(k))
        }
    }

    /// Probability mass for x = 0, 1, ..., `max_x`
    pub fn pmf_table(&self, max_x: u32) -> Vec<f64> {
        (0..=max_x).map(|x| self.f(&x)).collect()
    }
}

impl From<&Poisson> for String {
    fn from(pois: &Poisson) -> String {
        format!("Poisson(λ: {})", pois.rate)
    }
}

impl_display!(Poisson);

impl HasDensity<u32> for Poisson {
    fn ln_f(&self, x: &u32) -> f64 {
        let kf = f64::from(*x);
        kf * self.rate.ln() - self.rate - (kf + 1.0).ln_gamma().0
    }
}

impl Sampleable<u32> for Poisson {
    fn draw<R: Rng>(&self, rng: &mut R) -> u32 {
        let x: f64 = rng.sample(self.sampler);
        x as u32
    }
}

impl Cdf<u32> for Poisson {
    fn cdf(&self, x: &u32) -> f64 {
        1.0 - self.sf(x)
    }

    fn sf(&self, x: &u32) -> f64 {
        self.rate.inc_gamma(f64::from(*x) + 1.0)
    }
}

impl Mean<f64> for Poisson {
    fn mean(&self) -> Option<f64> {
        Some(self.rate)
    }
}

impl Variance<f64> for Poisson {
    fn variance(&self) -> Option<f64> {
        Some(self.rate)
    }
}

impl std::error::Error for PoissonError {}

impl fmt::Display for PoissonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateTooLow { rate } => {
                write!(f, "rate ({rate}) must be greater than zero")
            }
            Self::RateNotFinite { rate } => {
                write!(f, "non-finite rate: {rate}")
            }
        }
    }
}

impl Classify for PoissonError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::RateTooLow { .. } => ErrorKind::InvalidParameter,
            Self::RateNotFinite { .. } => ErrorKind::NumericalInstability,
        }
    }
}
