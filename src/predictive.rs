//! Monte Carlo estimates of held-out log-likelihood under a fitted posterior
//!
//! The estimator integrates
//!
//! ```text
//! p(X_test | X_train) = ∫ p(X_test | Z, A) p(Z, A | X_train) dZ dA
//! ```
//!
//! by drawing allocations `Z` for the held-out customers and loadings `A`
//! from the posterior, under the linear-Gaussian model `X = Z A + ε`,
//! `ε ~ N(0, σ² I)`.
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use log::debug;
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::Beta;
use std::fmt;
use std::str::FromStr;

use crate::consts::{BETA_PARAM_FLOOR, LN_2PI};
use crate::dist::{MvGaussian, MvGaussianError};
use crate::misc::{cumprod, logsumexp, mean_and_std};
use crate::result::{Classify, ErrorKind};
use crate::traits::Sampleable;

/// Inference algorithms whose posterior summaries the estimator can read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum InferenceAlgorithm {
    /// Recursive IBP: reports exact activation probabilities
    #[cfg_attr(feature = "serde1", serde(rename = "R-IBP"))]
    RecursiveIbp,
    /// Variational stick-breaking posterior
    #[cfg_attr(feature = "serde1", serde(rename = "Widjaja"))]
    Widjaja,
    /// Variational stick-breaking posterior
    #[cfg_attr(feature = "serde1", serde(rename = "Doshi-Velez"))]
    DoshiVelez,
    /// Sampled stick-breaking posterior
    #[cfg_attr(feature = "serde1", serde(rename = "HMC-Gibbs"))]
    HmcGibbs,
}

impl InferenceAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecursiveIbp => "R-IBP",
            Self::Widjaja => "Widjaja",
            Self::DoshiVelez => "Doshi-Velez",
            Self::HmcGibbs => "HMC-Gibbs",
        }
    }

    /// Whether the posterior carries activation probabilities directly
    /// rather than stick-breaking Beta parameters
    pub fn has_exact_activations(&self) -> bool {
        matches!(self, Self::RecursiveIbp)
    }
}

impl FromStr for InferenceAlgorithm {
    type Err = PredictiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "R-IBP" => Ok(Self::RecursiveIbp),
            "Widjaja" => Ok(Self::Widjaja),
            "Doshi-Velez" => Ok(Self::DoshiVelez),
            "HMC-Gibbs" => Ok(Self::HmcGibbs),
            _ => Err(PredictiveError::UnknownAlgorithm {
                name: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for InferenceAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Observation models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum LikelihoodModel {
    /// `X = Z A + ε` with isotropic Gaussian noise
    LinearGaussian,
}

impl FromStr for LikelihoodModel {
    type Err = PredictiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear_gaussian" => Ok(Self::LinearGaussian),
            _ => Err(PredictiveError::UnknownLikelihood {
                name: s.to_owned(),
            }),
        }
    }
}

/// How held-out customers share stick-breaking draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum HeldOutSampling {
    /// One activation vector per posterior sample, reused for every
    /// held-out customer
    #[default]
    Exchangeable,
    /// A fresh stick-breaking draw for every held-out customer
    PerCustomer,
}

/// Parameters for the estimator
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case", default))]
pub struct PredictiveConfig {
    /// Number of posterior draws
    pub num_samples: usize,
    pub held_out: HeldOutSampling,
}

impl Default for PredictiveConfig {
    fn default() -> Self {
        Self {
            num_samples: 100,
            held_out: HeldOutSampling::Exchangeable,
        }
    }
}

impl PredictiveConfig {
    pub fn with_num_samples(self, num_samples: usize) -> Self {
        Self {
            num_samples,
            ..self
        }
    }

    pub fn with_held_out(self, held_out: HeldOutSampling) -> Self {
        Self { held_out, ..self }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictiveError {
    /// The inference algorithm identifier is not recognized
    UnknownAlgorithm { name: String },
    /// The likelihood model identifier is not recognized
    UnknownLikelihood { name: String },
    /// The posterior summary lacks a field the algorithm needs
    MissingPosteriorField { field: &'static str },
    /// A posterior trajectory has no time slices
    EmptyTrajectory { field: &'static str },
    /// Loading means and covariances cover different numbers of time slices
    TrajectoryLengthMismatch { n_mean: usize, n_cov: usize },
    /// The two stick parameter arrays have different lengths
    StickParamsLengthMismatch { n_param_1: usize, n_param_2: usize },
    /// A stick parameter is infinite or NaN
    StickParamNotFinite { dish: usize, value: f64 },
    /// An exact activation probability lies outside [0, 1]
    ActivationOutOfRange { dish: usize, probability: f64 },
    /// The number of dishes differs between activations and loadings
    DishCountMismatch { n_activations: usize, n_loadings: usize },
    /// Loading means and covariances cover different numbers of dishes
    LoadingCovCountMismatch { n_mean: usize, n_cov: usize },
    /// The loading dimension differs from the held-out observation dimension
    ObservationDimMismatch { n_loading: usize, n_obs: usize },
    /// The loading posterior of a dish is invalid
    Loading { dish: usize, err: MvGaussianError },
    /// At least one posterior draw is required
    NoSamples,
    /// The noise variance must be positive and finite
    InvalidNoiseVariance { noise_variance: f64 },
    /// A sampled stick length is not finite
    StickDrawNotFinite { dish: usize },
    /// A log-likelihood sample is not finite
    LogLikelihoodNotFinite { value: f64 },
}

/// Beta shape parameters of the stick lengths, one pair per dish
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct StickParams {
    pub param_1: Vec<f64>,
    pub param_2: Vec<f64>,
}

impl StickParams {
    pub fn new(param_1: Vec<f64>, param_2: Vec<f64>) -> Self {
        StickParams { param_1, param_2 }
    }

    /// The final iterate of a trajectory with one row per iteration and one
    /// column per dish
    pub fn from_trajectory(
        param_1: &DMatrix<f64>,
        param_2: &DMatrix<f64>,
    ) -> Result<Self, PredictiveError> {
        let last_row = |m: &DMatrix<f64>| -> Result<Vec<f64>, PredictiveError> {
            match m.nrows() {
                0 => Err(PredictiveError::EmptyTrajectory {
                    field: "stick_params",
                }),
                n => Ok(m.row(n - 1).iter().copied().collect()),
            }
        };
        Ok(StickParams {
            param_1: last_row(param_1)?,
            param_2: last_row(param_2)?,
        })
    }

    #[inline]
    pub fn n_dishes(&self) -> usize {
        self.param_1.len()
    }
}

/// Per-dish Gaussian posterior over factor loadings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct LoadingPosterior {
    /// `n_dishes x obs_dim` means
    pub mean: DMatrix<f64>,
    /// One `obs_dim x obs_dim` covariance per dish
    pub cov: Vec<DMatrix<f64>>,
}

impl LoadingPosterior {
    pub fn new(mean: DMatrix<f64>, cov: Vec<DMatrix<f64>>) -> Self {
        LoadingPosterior { mean, cov }
    }

    /// Point masses at `mean`
    pub fn degenerate(mean: DMatrix<f64>) -> Self {
        let d = mean.ncols();
        let cov = vec![DMatrix::zeros(d, d); mean.nrows()];
        LoadingPosterior { mean, cov }
    }

    /// The final time slice of a trajectory of loading posteriors
    pub fn from_trajectory(
        mean: &[DMatrix<f64>],
        cov: &[Vec<DMatrix<f64>>],
    ) -> Result<Self, PredictiveError> {
        if mean.len() != cov.len() {
            return Err(PredictiveError::TrajectoryLengthMismatch {
                n_mean: mean.len(),
                n_cov: cov.len(),
            });
        }
        match (mean.last(), cov.last()) {
            (Some(m), Some(c)) => Ok(LoadingPosterior {
                mean: m.clone(),
                cov: c.clone(),
            }),
            _ => Err(PredictiveError::EmptyTrajectory { field: "loadings" }),
        }
    }

    #[inline]
    pub fn n_dishes(&self) -> usize {
        self.mean.nrows()
    }

    #[inline]
    pub fn obs_dim(&self) -> usize {
        self.mean.ncols()
    }

    fn samplers(&self) -> Result<Vec<MvGaussian>, PredictiveError> {
        if self.cov.len() != self.n_dishes() {
            return Err(PredictiveError::LoadingCovCountMismatch {
                n_mean: self.n_dishes(),
                n_cov: self.cov.len(),
            });
        }
        self.mean
            .row_iter()
            .zip(self.cov.iter())
            .enumerate()
            .map(|(dish, (mu, cov))| {
                MvGaussian::new(mu.transpose(), cov.clone())
                    .map_err(|err| PredictiveError::Loading { dish, err })
            })
            .collect()
    }
}

/// What an inference algorithm reports about the held-out allocations and
/// the loadings. Fields an algorithm does not produce are `None`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct PosteriorSummary {
    pub activation_probs: Option<Vec<f64>>,
    pub stick_params: Option<StickParams>,
    pub loadings: LoadingPosterior,
}

/// Beta distribution over one stick length
#[derive(Debug, Clone)]
pub struct StickLength {
    param_1: f64,
    param_2: f64,
    sampler: Beta<f64>,
}

impl PartialEq for StickLength {
    fn eq(&self, other: &StickLength) -> bool {
        self.param_1 == other.param_1 && self.param_2 == other.param_2
    }
}

impl StickLength {
    #[inline]
    pub fn param_1(&self) -> f64 {
        self.param_1
    }

    #[inline]
    pub fn param_2(&self) -> f64 {
        self.param_2
    }
}

/// Posterior over per-dish activation probabilities, resolved once from the
/// algorithm identifier
#[derive(Debug, Clone, PartialEq)]
pub enum ActivationPosterior {
    /// Probabilities used as given
    Exact(Vec<f64>),
    /// Probabilities are cumulative products of Beta stick lengths
    StickBreaking { sticks: Vec<StickLength> },
}

impl ActivationPosterior {
    /// Read the representation `alg` produces out of `summary`
    pub fn load(
        alg: InferenceAlgorithm,
        summary: &PosteriorSummary,
    ) -> Result<Self, PredictiveError> {
        if alg.has_exact_activations() {
            let probs = summary.activation_probs.as_ref().ok_or(
                PredictiveError::MissingPosteriorField {
                    field: "activation_probs",
                },
            )?;
            Self::exact(probs.clone())
        } else {
            let params = summary.stick_params.as_ref().ok_or(
                PredictiveError::MissingPosteriorField {
                    field: "stick_params",
                },
            )?;
            Self::stick_breaking(params)
        }
    }

    pub fn exact(probs: Vec<f64>) -> Result<Self, PredictiveError> {
        if let Some((dish, &probability)) = probs
            .iter()
            .enumerate()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(PredictiveError::ActivationOutOfRange {
                dish,
                probability,
            });
        }
        Ok(ActivationPosterior::Exact(probs))
    }

    /// Shape parameters are clipped to at least
    /// [`BETA_PARAM_FLOOR`](crate::consts::BETA_PARAM_FLOOR).
    pub fn stick_breaking(
        params: &StickParams,
    ) -> Result<Self, PredictiveError> {
        if params.param_1.len() != params.param_2.len() {
            return Err(PredictiveError::StickParamsLengthMismatch {
                n_param_1: params.param_1.len(),
                n_param_2: params.param_2.len(),
            });
        }
        let sticks = params
            .param_1
            .iter()
            .zip(params.param_2.iter())
            .enumerate()
            .map(|(dish, (&a, &b))| {
                let value = if a.is_finite() { b } else { a };
                if !a.is_finite() || !b.is_finite() {
                    return Err(PredictiveError::StickParamNotFinite {
                        dish,
                        value,
                    });
                }
                let (param_1, param_2) =
                    (a.max(BETA_PARAM_FLOOR), b.max(BETA_PARAM_FLOOR));
                Beta::new(param_1, param_2)
                    .map(|sampler| StickLength {
                        param_1,
                        param_2,
                        sampler,
                    })
                    .map_err(|_| PredictiveError::StickParamNotFinite {
                        dish,
                        value,
                    })
            })
            .collect::<Result<Vec<StickLength>, PredictiveError>>()?;
        Ok(ActivationPosterior::StickBreaking { sticks })
    }

    pub fn n_dishes(&self) -> usize {
        match self {
            Self::Exact(probs) => probs.len(),
            Self::StickBreaking { sticks } => sticks.len(),
        }
    }

    /// Draw one vector of per-dish activation probabilities
    pub fn draw_probs<R: Rng>(
        &self,
        rng: &mut R,
    ) -> Result<Vec<f64>, PredictiveError> {
        match self {
            Self::Exact(probs) => Ok(probs.clone()),
            Self::StickBreaking { sticks } => {
                let lengths: Vec<f64> =
                    sticks.iter().map(|v| rng.sample(&v.sampler)).collect();
                if let Some(dish) = lengths
                    .iter()
                    .position(|v| !(0.0..=1.0).contains(v))
                {
                    return Err(PredictiveError::StickDrawNotFinite { dish });
                }
                Ok(cumprod(&lengths))
            }
        }
    }
}

/// Summary of the per-draw log-likelihoods
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct PredictiveEstimate {
    /// Mean of the per-draw log-likelihoods
    pub mean: f64,
    /// Population standard deviation of the per-draw log-likelihoods
    pub std: f64,
    /// `ln((1/S) Σ_s p(X | Z_s, A_s))`
    pub ln_mean_exp: f64,
    pub samples: Vec<f64>,
}

/// Linear-Gaussian log-likelihood of `x` given allocations `z` and loadings
/// `a`:
///
/// ```text
/// -‖X - Z A‖² / (2σ²) - (N D / 2) ln(2π σ²)
/// ```
///
/// # Example
///
/// ```
/// use nalgebra::DMatrix;
/// use ibp::predictive::linear_gaussian_ln_likelihood;
///
/// let z = DMatrix::from_row_slice(2, 1, &[1.0, 0.0]);
/// let a = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
/// let x = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 0.0, 1.0]);
///
/// let ll = linear_gaussian_ln_likelihood(&x, &z, &a, 1.0).unwrap();
/// let expected = -0.5 - 2.0 * (2.0 * std::f64::consts::PI).ln();
/// assert!((ll - expected).abs() < 1e-12);
/// ```
pub fn linear_gaussian_ln_likelihood(
    x: &DMatrix<f64>,
    z: &DMatrix<f64>,
    a: &DMatrix<f64>,
    noise_variance: f64,
) -> Result<f64, PredictiveError> {
    validate_noise_variance(noise_variance)?;
    if z.ncols() != a.nrows() {
        return Err(PredictiveError::DishCountMismatch {
            n_activations: z.ncols(),
            n_loadings: a.nrows(),
        });
    }
    if a.ncols() != x.ncols() || z.nrows() != x.nrows() {
        return Err(PredictiveError::ObservationDimMismatch {
            n_loading: a.ncols(),
            n_obs: x.ncols(),
        });
    }
    let ssr = (x - z * a).norm_squared();
    let n_entries = (x.nrows() * x.ncols()) as f64;
    let ll = -ssr / (2.0 * noise_variance)
        - 0.5 * n_entries * (LN_2PI + noise_variance.ln());
    if ll.is_finite() {
        Ok(ll)
    } else {
        Err(PredictiveError::LogLikelihoodNotFinite { value: ll })
    }
}

fn validate_noise_variance(noise_variance: f64) -> Result<(), PredictiveError> {
    if noise_variance.is_finite() && noise_variance > 0.0 {
        Ok(())
    } else {
        Err(PredictiveError::InvalidNoiseVariance { noise_variance })
    }
}

/// Held-out log-likelihood estimator for one fitted posterior.
///
/// The posterior representation and the per-dish loading samplers are
/// resolved at construction; [`estimate`](PredictiveEstimator::estimate)
/// only draws.
///
/// # Example
///
/// ```
/// use nalgebra::DMatrix;
/// use ibp::predictive::*;
///
/// let a = DMatrix::from_row_slice(2, 3, &[1.0, 0.0, 2.0, 0.0, -1.0, 1.0]);
/// let z = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 1.0, 0.0]);
/// let x = &z * &a;
///
/// let summary = PosteriorSummary {
///     activation_probs: Some(vec![1.0, 0.0]),
///     stick_params: None,
///     loadings: LoadingPosterior::degenerate(a),
/// };
/// let estimator = PredictiveEstimator::new(
///     InferenceAlgorithm::RecursiveIbp,
///     LikelihoodModel::LinearGaussian,
///     &summary,
///     0.01,
///     PredictiveConfig::default().with_num_samples(10),
/// ).unwrap();
///
/// let mut rng = rand::thread_rng();
/// let est = estimator.estimate(&x, &mut rng).unwrap();
/// assert!(est.std < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PredictiveEstimator {
    model: LikelihoodModel,
    activations: ActivationPosterior,
    loadings: Vec<MvGaussian>,
    obs_dim: usize,
    noise_variance: f64,
    config: PredictiveConfig,
}

impl PredictiveEstimator {
    pub fn new(
        alg: InferenceAlgorithm,
        model: LikelihoodModel,
        summary: &PosteriorSummary,
        noise_variance: f64,
        config: PredictiveConfig,
    ) -> Result<Self, PredictiveError> {
        if config.num_samples == 0 {
            return Err(PredictiveError::NoSamples);
        }
        validate_noise_variance(noise_variance)?;

        let activations = ActivationPosterior::load(alg, summary)?;
        let loadings = summary.loadings.samplers()?;
        if activations.n_dishes() != loadings.len() {
            return Err(PredictiveError::DishCountMismatch {
                n_activations: activations.n_dishes(),
                n_loadings: loadings.len(),
            });
        }
        debug!(
            "predictive: {alg}, {} dishes, obs dim {}, σ² = {noise_variance}",
            loadings.len(),
            summary.loadings.obs_dim()
        );

        Ok(PredictiveEstimator {
            model,
            activations,
            loadings,
            obs_dim: summary.loadings.obs_dim(),
            noise_variance,
            config,
        })
    }

    #[inline]
    pub fn activations(&self) -> &ActivationPosterior {
        &self.activations
    }

    #[inline]
    pub fn n_dishes(&self) -> usize {
        self.loadings.len()
    }

    #[inline]
    pub fn config(&self) -> &PredictiveConfig {
        &self.config
    }

    fn draw_allocations<R: Rng>(
        &self,
        n_obs: usize,
        rng: &mut R,
    ) -> Result<DMatrix<f64>, PredictiveError> {
        let mut z = DMatrix::zeros(n_obs, self.n_dishes());
        let mut probs = self.activations.draw_probs(rng)?;
        for t in 0..n_obs {
            if t > 0 && self.config.held_out == HeldOutSampling::PerCustomer {
                probs = self.activations.draw_probs(rng)?;
            }
            for (k, &p) in probs.iter().enumerate() {
                if rng.gen_bool(p) {
                    z[(t, k)] = 1.0;
                }
            }
        }
        Ok(z)
    }

    fn draw_loadings<R: Rng>(&self, rng: &mut R) -> DMatrix<f64> {
        let mut a = DMatrix::zeros(self.n_dishes(), self.obs_dim);
        for (k, mvg) in self.loadings.iter().enumerate() {
            let row: DVector<f64> = mvg.draw(rng);
            a.set_row(k, &row.transpose());
        }
        a
    }

    /// Estimate the log-likelihood of `held_out` (one row per customer)
    pub fn estimate<R: Rng>(
        &self,
        held_out: &DMatrix<f64>,
        rng: &mut R,
    ) -> Result<PredictiveEstimate, PredictiveError> {
        if held_out.ncols() != self.obs_dim {
            return Err(PredictiveError::ObservationDimMismatch {
                n_loading: self.obs_dim,
                n_obs: held_out.ncols(),
            });
        }

        let samples = (0..self.config.num_samples)
            .map(|_| {
                let z = self.draw_allocations(held_out.nrows(), rng)?;
                let a = self.draw_loadings(rng);
                match self.model {
                    LikelihoodModel::LinearGaussian => {
                        linear_gaussian_ln_likelihood(
                            held_out,
                            &z,
                            &a,
                            self.noise_variance,
                        )
                    }
                }
            })
            .collect::<Result<Vec<f64>, PredictiveError>>()?;

        // num_samples > 0 is checked at construction
        let (mean, std) = mean_and_std(&samples).unwrap_or((f64::NAN, 0.0));
        let ln_mean_exp = logsumexp(&samples).unwrap_or(f64::NAN)
            - (samples.len() as f64).ln();
        debug!(
            "predictive: {} draws, mean = {mean}, std = {std}",
            samples.len()
        );

        Ok(PredictiveEstimate {
            mean,
            std,
            ln_mean_exp,
            samples,
        })
    }
}

/// Estimate held-out log-likelihood from string identifiers, as an external
/// sweep driver supplies them.
pub fn predictive_log_likelihood<R: Rng>(
    held_out: &DMatrix<f64>,
    inference_alg: &str,
    likelihood_model: &str,
    summary: &PosteriorSummary,
    noise_variance: f64,
    config: PredictiveConfig,
    rng: &mut R,
) -> Result<PredictiveEstimate, PredictiveError> {
    let model: LikelihoodModel = likelihood_model.parse()?;
    let alg: InferenceAlgorithm = inference_alg.parse()?;
    PredictiveEstimator::new(alg, model, summary, noise_variance, config)?
        .estimate(held_out, rng)
}

impl std::error::Error for PredictiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Loading { err, .. } => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for PredictiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAlgorithm { name } => {
                write!(f, "inference algorithm '{name}' is not implemented")
            }
            Self::UnknownLikelihood { name } => {
                write!(f, "likelihood model '{name}' is not implemented")
            }
            Self::MissingPosteriorField { field } => {
                write!(f, "posterior summary has no '{field}'")
            }
            Self::EmptyTrajectory { field } => {
                write!(f, "trajectory of '{field}' is empty")
            }
            Self::TrajectoryLengthMismatch { n_mean, n_cov } => write!(
                f,
                "loading trajectory has {n_mean} means but {n_cov} covariances"
            ),
            Self::StickParamsLengthMismatch {
                n_param_1,
                n_param_2,
            } => write!(
                f,
                "stick parameters have lengths {n_param_1} and {n_param_2}"
            ),
            Self::StickParamNotFinite { dish, value } => {
                write!(f, "stick parameter of dish {dish} is {value}")
            }
            Self::ActivationOutOfRange { dish, probability } => write!(
                f,
                "activation probability of dish {dish} ({probability}) is outside [0, 1]"
            ),
            Self::DishCountMismatch {
                n_activations,
                n_loadings,
            } => write!(
                f,
                "{n_activations} activation probabilities but {n_loadings} loadings"
            ),
            Self::LoadingCovCountMismatch { n_mean, n_cov } => write!(
                f,
                "{n_mean} loading means but {n_cov} loading covariances"
            ),
            Self::ObservationDimMismatch { n_loading, n_obs } => write!(
                f,
                "loadings have dimension {n_loading} but observations have {n_obs}"
            ),
            Self::Loading { dish, err } => {
                write!(f, "invalid loading posterior for dish {dish}: {err}")
            }
            Self::NoSamples => write!(f, "number of samples must be positive"),
            Self::InvalidNoiseVariance { noise_variance } => write!(
                f,
                "noise variance ({noise_variance}) must be positive and finite"
            ),
            Self::StickDrawNotFinite { dish } => {
                write!(f, "stick draw for dish {dish} is not in [0, 1]")
            }
            Self::LogLikelihoodNotFinite { value } => {
                write!(f, "log-likelihood sample is {value}")
            }
        }
    }
}

impl Classify for PredictiveError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownAlgorithm { .. } | Self::UnknownLikelihood { .. } => {
                ErrorKind::NotImplemented
            }
            Self::MissingPosteriorField { .. }
            | Self::EmptyTrajectory { .. }
            | Self::TrajectoryLengthMismatch { .. }
            | Self::StickParamsLengthMismatch { .. }
            | Self::DishCountMismatch { .. }
            | Self::LoadingCovCountMismatch { .. }
            | Self::ObservationDimMismatch { .. } => {
                ErrorKind::DimensionMismatch
            }
            Self::Loading { err, .. } => err.kind(),
            Self::ActivationOutOfRange { .. }
            | Self::NoSamples
            | Self::InvalidNoiseVariance { .. } => ErrorKind::InvalidParameter,
            Self::StickParamNotFinite { .. }
            | Self::StickDrawNotFinite { .. }
            | Self::LogLikelihoodNotFinite { .. } => {
                ErrorKind::NumericalInstability
            }
        }
    }
}
