//! Re-imports for convenience
#[doc(no_inline)]
pub use crate::discrepancy::{
    track, DiscrepancyConfig, DiscrepancyCurve, DiscrepancyPoint,
};
#[doc(no_inline)]
pub use crate::dist::*;
#[doc(no_inline)]
pub use crate::monte_carlo::{simulate, MonteCarloEstimate};
#[doc(no_inline)]
pub use crate::predictive::{
    predictive_log_likelihood, HeldOutSampling, InferenceAlgorithm,
    LikelihoodModel, LoadingPosterior, PosteriorSummary, PredictiveConfig,
    PredictiveEstimate, PredictiveEstimator, StickParams,
};
#[doc(no_inline)]
pub use crate::prior::{AllocationMatrix, Ibp, IbpParams};
#[doc(no_inline)]
pub use crate::recursion::{PriorRecursion, RecursionConfig};
#[doc(no_inline)]
pub use crate::result::{Classify, ErrorKind};
#[doc(no_inline)]
pub use crate::sweep::{run_prior_sweep, GridPoint, SweepConfig};
#[doc(no_inline)]
pub use crate::table::ActivationTable;
#[doc(no_inline)]
pub use crate::traits::*;
