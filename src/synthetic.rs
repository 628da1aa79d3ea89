//! Synthetic linear-Gaussian data, `X = Z A + ε`
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use log::debug;
use nalgebra::DMatrix;
use rand::distributions::WeightedIndex;
use rand::Rng;
use rand_distr::StandardNormal;
use std::fmt;

use crate::prior::{AllocationMatrix, Ibp, IbpError, IbpParams};
use crate::result::{Classify, ErrorKind};
use crate::traits::Sampleable;

/// How the allocations of the synthetic observations are drawn
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum FeaturePrior {
    /// Draw Z from the IBP
    Ibp(IbpParams),
    /// Every observation takes exactly one of `probs.len()` features
    Categorical { probs: Vec<f64> },
}

/// Parameters of a synthetic data set
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct SyntheticConfig {
    pub n_obs: usize,
    pub obs_dim: usize,
    pub feature_prior: FeaturePrior,
    /// Standard deviation σ_A of each loading entry
    pub loading_std: f64,
    /// Variance σ_x² of the observation noise
    pub noise_variance: f64,
}

impl SyntheticConfig {
    pub fn new(n_obs: usize, obs_dim: usize, feature_prior: FeaturePrior) -> Self {
        Self {
            n_obs,
            obs_dim,
            feature_prior,
            loading_std: 1.0,
            noise_variance: 0.1,
        }
    }

    pub fn with_loading_std(self, loading_std: f64) -> Self {
        Self {
            loading_std,
            ..self
        }
    }

    pub fn with_noise_variance(self, noise_variance: f64) -> Self {
        Self {
            noise_variance,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyntheticError {
    /// Invalid IBP hyperparameters
    Prior(IbpError),
    /// Categorical probabilities must be non-negative with a positive sum
    InvalidCategoricalProbs { probs: Vec<f64> },
    /// The loading standard deviation must be non-negative and finite
    InvalidLoadingStd { loading_std: f64 },
    /// The noise variance must be non-negative and finite
    InvalidNoiseVariance { noise_variance: f64 },
}

impl From<IbpError> for SyntheticError {
    fn from(err: IbpError) -> Self {
        SyntheticError::Prior(err)
    }
}

/// A generated data set and the latent quantities that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGaussianData {
    /// `n_obs x obs_dim`
    pub observations: DMatrix<f64>,
    pub allocations: AllocationMatrix,
    /// `n_features x obs_dim`
    pub loadings: DMatrix<f64>,
}

impl LinearGaussianData {
    /// The noiseless means `Z A`
    pub fn means(&self) -> DMatrix<f64> {
        self.allocations.to_dmatrix() * &self.loadings
    }

    /// Fraction of observations that took each feature
    pub fn feature_frequencies(&self) -> Vec<f64> {
        let n = self.allocations.n_customers().max(1) as f64;
        self.allocations
            .dish_counts()
            .iter()
            .map(|&m| m as f64 / n)
            .collect()
    }

    /// Split the observations into the first `n_train` rows and the rest
    pub fn split(&self, n_train: usize) -> (DMatrix<f64>, DMatrix<f64>) {
        let n_train = n_train.min(self.observations.nrows());
        let n_held_out = self.observations.nrows() - n_train;
        (
            self.observations.rows(0, n_train).into_owned(),
            self.observations.rows(n_train, n_held_out).into_owned(),
        )
    }
}

fn draw_allocations<R: Rng>(
    prior: &FeaturePrior,
    n_obs: usize,
    rng: &mut R,
) -> Result<AllocationMatrix, SyntheticError> {
    match prior {
        FeaturePrior::Ibp(params) => {
            let params = IbpParams::new(params.alpha(), params.beta())?;
            Ok(Ibp::new(params, n_obs)?.draw(rng))
        }
        FeaturePrior::Categorical { probs } => {
            let cat = WeightedIndex::new(probs).map_err(|_| {
                SyntheticError::InvalidCategoricalProbs {
                    probs: probs.clone(),
                }
            })?;
            let mut z = AllocationMatrix::new(n_obs);
            for _ in 0..probs.len() {
                z.push_empty_dish();
            }
            for t in 0..n_obs {
                z.set(t, rng.sample(&cat));
            }
            Ok(z)
        }
    }
}

/// Draw a data set.
///
/// Loadings are i.i.d. `N(0, σ_A²)`, noise i.i.d. `N(0, σ_x²)`.
///
/// # Example
///
/// ```
/// use ibp::prior::IbpParams;
/// use ibp::synthetic::{generate, FeaturePrior, SyntheticConfig};
///
/// let mut rng = rand::thread_rng();
/// let prior = FeaturePrior::Ibp(IbpParams::new(3.0, 1.0).unwrap());
/// let config = SyntheticConfig::new(20, 5, prior).with_noise_variance(0.0);
///
/// let data = generate(&config, &mut rng).unwrap();
/// assert_eq!(data.observations.shape(), (20, 5));
/// assert_eq!(data.observations, data.means());
/// ```
pub fn generate<R: Rng>(
    config: &SyntheticConfig,
    rng: &mut R,
) -> Result<LinearGaussianData, SyntheticError> {
    let loading_std = config.loading_std;
    if !(loading_std.is_finite() && loading_std >= 0.0) {
        return Err(SyntheticError::InvalidLoadingStd { loading_std });
    }
    let noise_variance = config.noise_variance;
    if !(noise_variance.is_finite() && noise_variance >= 0.0) {
        return Err(SyntheticError::InvalidNoiseVariance { noise_variance });
    }

    let allocations = draw_allocations(&config.feature_prior, config.n_obs, rng)?;
    let n_features = allocations.n_dishes();

    let loadings = DMatrix::from_fn(n_features, config.obs_dim, |_, _| {
        loading_std * rng.sample::<f64, _>(StandardNormal)
    });
    let noise_std = noise_variance.sqrt();
    let noise = DMatrix::from_fn(config.n_obs, config.obs_dim, |_, _| {
        noise_std * rng.sample::<f64, _>(StandardNormal)
    });
    let observations = allocations.to_dmatrix() * &loadings + noise;

    debug!(
        "synthetic: {} observations, {n_features} features, dim {}",
        config.n_obs, config.obs_dim
    );

    Ok(LinearGaussianData {
        observations,
        allocations,
        loadings,
    })
}

impl std::error::Error for SyntheticError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Prior(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for SyntheticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prior(err) => write!(f, "invalid prior: {err}"),
            Self::InvalidCategoricalProbs { probs } => {
                write!(f, "invalid categorical probabilities: {probs:?}")
            }
            Self::InvalidLoadingStd { loading_std } => write!(
                f,
                "loading std ({loading_std}) must be non-negative and finite"
            ),
            Self::InvalidNoiseVariance { noise_variance } => write!(
                f,
                "noise variance ({noise_variance}) must be non-negative and finite"
            ),
        }
    }
}

impl Classify for SyntheticError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Prior(err) => err.kind(),
            _ => ErrorKind::InvalidParameter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    fn categorical() -> FeaturePrior {
        FeaturePrior::Categorical {
            probs: vec![0.4, 0.25, 0.2, 0.1, 0.05],
        }
    }

    #[test]
    fn categorical_rows_take_one_feature() {
        let mut rng = Xoshiro256Plus::seed_from_u64(1);
        let config = SyntheticConfig::new(50, 3, categorical());
        let data = generate(&config, &mut rng).unwrap();
        assert_eq!(data.allocations.n_dishes(), 5);
        for t in 0..50 {
            assert_eq!(data.allocations.n_taken(t), 1);
        }
        assert::close(data.feature_frequencies().iter().sum::<f64>(), 1.0, 1E-12);
    }

    #[test]
    fn categorical_features_survive_empty_data() {
        let mut rng = Xoshiro256Plus::seed_from_u64(5);
        let config = SyntheticConfig::new(0, 3, categorical());
        let data = generate(&config, &mut rng).unwrap();
        assert_eq!(data.allocations.n_customers(), 0);
        assert_eq!(data.allocations.n_dishes(), 5);
        assert_eq!(data.loadings.shape(), (5, 3));
        assert_eq!(data.observations.shape(), (0, 3));
    }

    #[test]
    fn noiseless_observations_are_means() {
        let mut rng = Xoshiro256Plus::seed_from_u64(2);
        let prior = FeaturePrior::Ibp(IbpParams::new(2.0, 1.5).unwrap());
        let config = SyntheticConfig::new(10, 4, prior).with_noise_variance(0.0);
        let data = generate(&config, &mut rng).unwrap();
        assert_eq!(data.observations, data.means());
        assert_eq!(data.loadings.nrows(), data.allocations.n_dishes());
    }

    #[test]
    fn split_partitions_rows() {
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let config = SyntheticConfig::new(10, 2, categorical());
        let data = generate(&config, &mut rng).unwrap();
        let (train, held_out) = data.split(7);
        assert_eq!(train.nrows(), 7);
        assert_eq!(held_out.nrows(), 3);
        assert_eq!(held_out.row(0), data.observations.row(7));
        let (train, held_out) = data.split(100);
        assert_eq!(train.nrows(), 10);
        assert_eq!(held_out.nrows(), 0);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let mut rng = Xoshiro256Plus::seed_from_u64(4);
        let bad_probs = SyntheticConfig::new(
            5,
            2,
            FeaturePrior::Categorical {
                probs: vec![0.0, 0.0],
            },
        );
        assert!(matches!(
            generate(&bad_probs, &mut rng),
            Err(SyntheticError::InvalidCategoricalProbs { .. })
        ));

        let bad_std = SyntheticConfig::new(5, 2, categorical()).with_loading_std(-1.0);
        assert_eq!(
            generate(&bad_std, &mut rng).unwrap_err().kind(),
            ErrorKind::InvalidParameter
        );

        let bad_prior = SyntheticConfig::new(
            5,
            2,
            FeaturePrior::Ibp(IbpParams::new_unchecked(0.0, 1.0)),
        );
        assert_eq!(
            generate(&bad_prior, &mut rng).unwrap_err(),
            SyntheticError::Prior(IbpError::AlphaTooLow { alpha: 0.0 })
        );
    }
}
