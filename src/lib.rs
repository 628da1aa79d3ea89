//! Exact and simulated quantities of the Indian Buffet Process prior, and
//! held-out likelihood estimates for fitted IBP latent feature models.
//!
//! The crate covers four tasks:
//!
//! - [`recursion`]: exact per-dish activation probabilities and the exact
//!   dish-count distribution of the two-parameter IBP, without sampling
//! - [`monte_carlo`]: the same quantities estimated by forward simulation
//! - [`discrepancy`]: squared-error curves between the two as the number of
//!   simulated buffets grows
//! - [`predictive`]: Monte Carlo estimates of held-out log-likelihood under
//!   a posterior produced by an external inference algorithm
//!
//! Both the exact and the simulated paths take their transition rules from
//! [`prior::IbpParams`].
//!
//! # Example
//!
//! ```
//! use ibp::prelude::*;
//! use rand::SeedableRng;
//!
//! let params = IbpParams::new(1.1, 1.0).unwrap();
//! let exact = PriorRecursion::compute(params, 5, &RecursionConfig::default()).unwrap();
//!
//! let mut rng = rand::rngs::SmallRng::seed_from_u64(42);
//! let est = simulate(params, 5, 5_000, &mut rng).unwrap();
//!
//! let err = exact.table().sq_err(est.table()).unwrap();
//! assert!(err < 0.05);
//! ```

#[cfg(test)]
mod test;

pub mod consts;
pub mod discrepancy;
pub mod dist;
pub mod misc;
pub mod monte_carlo;
pub mod predictive;
pub mod prelude;
pub mod prior;
pub mod recursion;
pub mod result;
pub mod sweep;
pub mod synthetic;
pub mod table;
pub mod traits;

/// Implements `Display` through an existing `From<&T> for String`
#[macro_export]
macro_rules! impl_display {
    ($kind: ty) => {
        impl ::std::fmt::Display for $kind {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}", String::from(self))
            }
        }
    };
}
