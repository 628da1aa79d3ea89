//! Two-parameter Indian Buffet Process prior
//!
//! Customer `t` (counting from 1) takes each previously served dish `k` with
//! probability `m_k / (t - 1 + β)`, where `m_k` is the number of earlier
//! customers that took it, and then tries `Poisson(α β / (t - 1 + β))` new
//! dishes. With β = 1 this is the one-parameter IBP of Griffiths and
//! Ghahramani.
//!
//! Both the analytical recursion and the Monte Carlo simulator go through
//! [`IbpParams::new_dish_rate`] and [`IbpParams::stick_update`], so the two
//! code paths share one definition of the prior.
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::impl_display;
use crate::result::{Classify, ErrorKind};

mod allocation;
mod process;

pub use allocation::AllocationMatrix;
pub use process::Ibp;

/// Hyperparameters (α, β) of the two-parameter IBP.
///
/// α controls how many dishes each customer samples (on average α) and β the
/// degree to which customers share dishes.
///
/// # Example
///
/// ```
/// use ibp::prior::IbpParams;
///
/// let params = IbpParams::new(1.1, 1.0).unwrap();
///
/// // The first customer tries Poisson(α) dishes
/// assert_eq!(params.new_dish_rate(1), 1.1);
///
/// // Invalid parameters fail fast
/// assert!(IbpParams::new(0.0, 1.0).is_err());
/// assert!(IbpParams::new(1.0, -2.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct IbpParams {
    alpha: f64,
    beta: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum IbpError {
    /// The alpha parameter is less than or equal to zero
    AlphaTooLow { alpha: f64 },
    /// The alpha parameter is infinite or NaN
    AlphaNotFinite { alpha: f64 },
    /// The beta parameter is less than or equal to zero
    BetaTooLow { beta: f64 },
    /// The beta parameter is infinite or NaN
    BetaNotFinite { beta: f64 },
    /// Customers are counted from one
    CustomerIndexZero,
    /// A dish cannot have been taken by more than all earlier customers
    PriorMassOutOfRange { prior_mass: f64, customer: usize },
    /// The new dish rate of some customer overflowed
    RateNotFinite { customer: usize, rate: f64 },
    /// The new dish rate of some customer underflowed to zero
    RateUnderflow { customer: usize },
}

impl IbpParams {
    /// Create new IBP hyperparameters
    pub fn new(alpha: f64, beta: f64) -> Result<Self, IbpError> {
        if !alpha.is_finite() {
            Err(IbpError::AlphaNotFinite { alpha })
        } else if alpha <= 0.0 {
            Err(IbpError::AlphaTooLow { alpha })
        } else if !beta.is_finite() {
            Err(IbpError::BetaNotFinite { beta })
        } else if beta <= 0.0 {
            Err(IbpError::BetaTooLow { beta })
        } else {
            Ok(IbpParams { alpha, beta })
        }
    }

    /// Creates new hyperparameters without checking whether they are valid
    #[inline]
    pub fn new_unchecked(alpha: f64, beta: f64) -> Self {
        IbpParams { alpha, beta }
    }

    /// The one-parameter IBP, β = 1
    pub fn one_parameter(alpha: f64) -> Result<Self, IbpError> {
        IbpParams::new(alpha, 1.0)
    }

    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    #[inline]
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Poisson rate of the number of new dishes tried by customer `t`,
    /// `α β / (t - 1 + β)`.
    ///
    /// Customers are counted from one; `t = 0` (no customer) has rate zero.
    ///
    /// # Example
    ///
    /// ```
    /// # use ibp::prior::IbpParams;
    /// let ibp = IbpParams::new(2.0, 1.0).unwrap();
    /// assert_eq!(ibp.new_dish_rate(4), 0.5);
    ///
    /// let ibp = IbpParams::new(2.0, 3.0).unwrap();
    /// assert_eq!(ibp.new_dish_rate(4), 1.0);
    /// ```
    #[inline]
    pub fn new_dish_rate(&self, t: usize) -> f64 {
        if t == 0 {
            0.0
        } else {
            // β / β is exactly one, so the first customer's rate is α
            self.alpha * (self.beta / ((t - 1) as f64 + self.beta))
        }
    }

    /// Probability that customer `t` takes an existing dish, given the
    /// (expected) number `prior_mass` of the first `t - 1` customers that took
    /// it: `prior_mass / (t - 1 + β)`.
    ///
    /// For `0 <= prior_mass <= t - 1` the result lies in [0, 1). With β = 1
    /// this is the one-parameter rule `m / t`.
    #[inline]
    pub fn stick_update(&self, prior_mass: f64, t: usize) -> f64 {
        if t == 0 {
            0.0
        } else {
            prior_mass / ((t - 1) as f64 + self.beta)
        }
    }

    /// Sum of [`new_dish_rate`](IbpParams::new_dish_rate) over customers
    /// `1..=n`: the expected number of dishes after `n` customers.
    pub fn expected_dishes(&self, n: usize) -> f64 {
        (1..=n).map(|t| self.new_dish_rate(t)).sum()
    }
}

impl From<&IbpParams> for String {
    fn from(params: &IbpParams) -> String {
        format!("IBP(α: {}, β: {})", params.alpha, params.beta)
    }
}

impl_display!(IbpParams);

/// Poisson rate of new dishes for customer `t` under IBP(α, β).
///
/// Validates the hyperparameters first. `new_dish_rate(1, α, β) == α`.
///
/// # Example
///
/// ```
/// use ibp::prior::new_dish_rate;
///
/// assert_eq!(new_dish_rate(1, 3.5, 0.2).unwrap(), 3.5);
/// assert!(new_dish_rate(1, 3.5, 0.0).is_err());
/// assert!(new_dish_rate(0, 3.5, 1.0).is_err());
/// ```
pub fn new_dish_rate(t: usize, alpha: f64, beta: f64) -> Result<f64, IbpError> {
    let params = IbpParams::new(alpha, beta)?;
    if t == 0 {
        return Err(IbpError::CustomerIndexZero);
    }
    Ok(params.new_dish_rate(t))
}

/// Marginal probability that customer `t` takes an existing dish, given the
/// expected number of earlier customers `prior_weight` that took it.
///
/// # Example
///
/// ```
/// use ibp::prior::stick_update;
///
/// // one-parameter IBP: m / t
/// assert_eq!(stick_update(2.0, 4, 1.0).unwrap(), 0.5);
///
/// // a dish cannot have more takers than there were customers
/// assert!(stick_update(4.0, 4, 1.0).is_err());
/// ```
pub fn stick_update(
    prior_weight: f64,
    t: usize,
    beta: f64,
) -> Result<f64, IbpError> {
    if !beta.is_finite() {
        return Err(IbpError::BetaNotFinite { beta });
    } else if beta <= 0.0 {
        return Err(IbpError::BetaTooLow { beta });
    } else if t == 0 {
        return Err(IbpError::CustomerIndexZero);
    }
    let max_mass = (t - 1) as f64;
    if !(0.0..=max_mass).contains(&prior_weight) {
        return Err(IbpError::PriorMassOutOfRange {
            prior_mass: prior_weight,
            customer: t,
        });
    }
    // α does not enter the update
    Ok(IbpParams::new_unchecked(1.0, beta).stick_update(prior_weight, t))
}

impl std::error::Error for IbpError {}

impl fmt::Display for IbpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlphaTooLow { alpha } => {
                write!(f, "alpha ({alpha}) must be greater than zero")
            }
            Self::AlphaNotFinite { alpha } => {
                write!(f, "non-finite alpha: {alpha}")
            }
            Self::BetaTooLow { beta } => {
                write!(f, "beta ({beta}) must be greater than zero")
            }
            Self::BetaNotFinite { beta } => {
                write!(f, "non-finite beta: {beta}")
            }
            Self::CustomerIndexZero => {
                write!(f, "customers are indexed from 1")
            }
            Self::PriorMassOutOfRange {
                prior_mass,
                customer,
            } => write!(
                f,
                "prior mass {prior_mass} is outside [0, {}] for customer {customer}",
                customer.saturating_sub(1)
            ),
            Self::RateNotFinite { customer, rate } => {
                write!(f, "new dish rate of customer {customer} is {rate}")
            }
            Self::RateUnderflow { customer } => write!(
                f,
                "new dish rate of customer {customer} underflowed to zero"
            ),
        }
    }
}

impl Classify for IbpError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::RateNotFinite { .. } | Self::RateUnderflow { .. } => {
                ErrorKind::NumericalInstability
            }
            _ => ErrorKind::InvalidParameter,
        }
    }
}
