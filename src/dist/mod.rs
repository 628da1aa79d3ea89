//! Probability distributions used by the prior and the estimator
mod mvg;
mod poisson;

pub use mvg::{MvGaussian, MvGaussianError};
pub use poisson::{Poisson, PoissonError};
