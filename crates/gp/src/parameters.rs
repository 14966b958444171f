use crate::errors::{GpError, Result};
use crate::kernels::Kernel;
use crate::{GP_COBYLA_MAX_EVAL, GP_COBYLA_MIN_EVAL, GP_OPTIM_N_START};
use linfa::{Float, ParamGuard};

use ndarray::Array1;

/// An enum to represent a n-dim hyper parameter tuning
#[derive(Clone, Debug, PartialEq)]
pub enum ThetaTuning<F: Float> {
    /// Constant parameter (ie given not estimated)
    Fixed(Array1<F>),
    /// Parameter is optimized between given bounds (lower, upper) starting from the inital guess
    Full {
        /// Initial guess for the parameter
        init: Array1<F>,
        /// Bounds for the parameter array(lower, upper)
        bounds: Array1<(F, F)>,
    },
}

impl<F: Float> ThetaTuning<F> {
    /// Default bounds for theta values
    pub const DEFAULT_BOUNDS: (f64, f64) = (1e-5, 1e5);

    /// Optimized tuning starting from `init` within default bounds
    pub fn full(init: Array1<F>) -> Self {
        let bounds = Array1::from_elem(
            init.len(),
            (
                F::cast(Self::DEFAULT_BOUNDS.0),
                F::cast(Self::DEFAULT_BOUNDS.1),
            ),
        );
        ThetaTuning::Full { init, bounds }
    }

    /// Get initial theta value
    pub fn init(&self) -> &Array1<F> {
        match self {
            ThetaTuning::Full { init, bounds: _ } => init,
            ThetaTuning::Fixed(init) => init,
        }
    }

    /// Get bounds for theta value
    pub fn bounds(&self) -> Option<&Array1<(F, F)>> {
        match self {
            ThetaTuning::Full { init: _, bounds } => Some(bounds),
            ThetaTuning::Fixed(_) => None,
        }
    }
}

/// A set of validated GP parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct GpValidParams<F: Float, K: Kernel<F>> {
    /// Covariance kernel k(x, x')
    pub(crate) kernel: K,
    /// Parameter tuning hint of the kernel
    pub(crate) theta_tuning: ThetaTuning<F>,
    /// Observation noise variance added to the diagonal of the covariance matrix
    pub(crate) noise: F,
    /// Number of internal likelihood optimization restart
    pub(crate) n_start: usize,
    /// Max number of internal likelihood evaluation during optimization
    pub(crate) max_eval: usize,
    /// Whether targets are centered and scaled before fitting
    pub(crate) normalize_y: bool,
    /// Seed of the random generator drawing restart points
    pub(crate) seed: u64,
}

impl<F: Float, K: Kernel<F>> Default for GpValidParams<F, K> {
    fn default() -> GpValidParams<F, K> {
        let kernel = K::default();
        GpValidParams {
            kernel,
            theta_tuning: ThetaTuning::full(kernel.default_theta()),
            noise: F::cast(1e-10),
            n_start: GP_OPTIM_N_START,
            max_eval: GP_COBYLA_MAX_EVAL,
            normalize_y: false,
            seed: 0,
        }
    }
}

impl<F: Float, K: Kernel<F>> GpValidParams<F, K> {
    /// Get covariance kernel
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Get theta tuning
    pub fn theta_tuning(&self) -> &ThetaTuning<F> {
        &self.theta_tuning
    }

    /// Get observation noise variance
    pub fn noise(&self) -> F {
        self.noise
    }

    /// Get the number of internal optimization restart
    pub fn n_start(&self) -> usize {
        self.n_start
    }

    /// Get the max number of internal likelihood evaluations during one optimization
    pub fn max_eval(&self) -> usize {
        self.max_eval
    }

    /// Whether targets are normalized
    pub fn normalize_y(&self) -> bool {
        self.normalize_y
    }

    /// Get the seed used to draw restart points
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[derive(Clone, Debug)]
/// The set of hyperparameters that can be specified for the execution of
/// the [GP algorithm](struct.GaussianProcess.html).
pub struct GpParams<F: Float, K: Kernel<F>>(GpValidParams<F, K>);

impl<F: Float, K: Kernel<F>> GpParams<F, K> {
    /// A constructor for GP parameters given a kernel
    pub fn new(kernel: K) -> GpParams<F, K> {
        Self(GpValidParams {
            kernel,
            theta_tuning: ThetaTuning::full(kernel.default_theta()),
            ..Default::default()
        })
    }

    /// A constructor for GP parameters from validated parameters
    pub fn new_from_valid(params: &GpValidParams<F, K>) -> Self {
        Self(params.clone())
    }

    /// Set value for theta hyper parameter.
    ///
    /// When theta is optimized, the internal optimization is started from `theta_init`.
    /// When theta is fixed, this set theta constant value.
    pub fn theta_init(mut self, theta_init: Array1<F>) -> Self {
        self.0.theta_tuning = match self.0.theta_tuning {
            ThetaTuning::Full { init: _, bounds } => ThetaTuning::Full {
                init: theta_init,
                bounds,
            },
            ThetaTuning::Fixed(_) => ThetaTuning::Fixed(theta_init),
        };
        self
    }

    /// Set theta hyper parameter search space.
    ///
    /// This function is no-op when theta tuning is fixed
    pub fn theta_bounds(mut self, theta_bounds: Array1<(F, F)>) -> Self {
        self.0.theta_tuning = match self.0.theta_tuning {
            ThetaTuning::Full { init, bounds: _ } => ThetaTuning::Full {
                init,
                bounds: theta_bounds,
            },
            ThetaTuning::Fixed(f) => ThetaTuning::Fixed(f),
        };
        self
    }

    /// Set theta hyper parameter tuning
    pub fn theta_tuning(mut self, theta_tuning: ThetaTuning<F>) -> Self {
        self.0.theta_tuning = theta_tuning;
        self
    }

    /// Set observation noise variance.
    ///
    /// Noise is added to the diagonal of the covariance matrix, it also improves numerical stability
    pub fn noise(mut self, noise: F) -> Self {
        self.0.noise = noise;
        self
    }

    /// Set the number of internal GP hyperparameter theta optimization restarts
    pub fn n_start(mut self, n_start: usize) -> Self {
        self.0.n_start = n_start;
        self
    }

    /// Set the max number of internal likelihood evaluations during one optimization
    /// Given max_eval has to be greater than [crate::GP_COBYLA_MIN_EVAL] otherwise
    /// max_eval is set to [crate::GP_COBYLA_MIN_EVAL].
    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.0.max_eval = GP_COBYLA_MIN_EVAL.max(max_eval);
        self
    }

    /// Set whether targets are centered and scaled before fitting
    pub fn normalize_y(mut self, normalize_y: bool) -> Self {
        self.0.normalize_y = normalize_y;
        self
    }

    /// Set the seed of the random generator drawing restart points
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }
}

impl<F: Float, K: Kernel<F>> From<GpValidParams<F, K>> for GpParams<F, K> {
    fn from(valid: GpValidParams<F, K>) -> Self {
        GpParams(valid)
    }
}

impl<F: Float, K: Kernel<F>> ParamGuard for GpParams<F, K> {
    type Checked = GpValidParams<F, K>;
    type Error = GpError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let n_theta = self.0.kernel.n_theta();
        let init = self.0.theta_tuning.init();
        if init.len() != n_theta {
            return Err(GpError::InvalidValueError(format!(
                "{} kernel expects {} theta values, got {}",
                self.0.kernel,
                n_theta,
                init.len()
            )));
        }
        if init.iter().any(|v| !(*v > F::zero())) {
            return Err(GpError::InvalidValueError(format!(
                "theta values should be strictly positive, got {init}"
            )));
        }
        if let Some(bounds) = self.0.theta_tuning.bounds() {
            if bounds.len() != n_theta {
                return Err(GpError::InvalidValueError(format!(
                    "{} kernel expects {} theta bounds, got {}",
                    self.0.kernel,
                    n_theta,
                    bounds.len()
                )));
            }
            for ((lo, up), v) in bounds.iter().zip(init.iter()) {
                if !(*lo > F::zero()) || lo > up {
                    return Err(GpError::InvalidValueError(format!(
                        "theta bounds should satisfy 0 < lower <= upper, got ({lo}, {up})"
                    )));
                }
                if v < lo || v > up {
                    return Err(GpError::InvalidValueError(format!(
                        "initial theta {v} is out of bounds ({lo}, {up})"
                    )));
                }
            }
        }
        if !(self.0.noise >= F::zero()) {
            return Err(GpError::InvalidValueError(format!(
                "noise should be positive or null, got {}",
                self.0.noise
            )));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
