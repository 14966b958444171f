use crate::errors::{GpError, Result};
use crate::kernels::*;
use crate::optimization::{into_f64, optimize_params, prepare_multistart, CobylaParams};
use crate::parameters::{GpParams, GpValidParams};
use crate::utils::{differences, DiffMatrix, NormalizedTargets};
use crate::ThetaTuning;

use linfa::prelude::{DatasetBase, Fit, Float, PredictInplace};
use linfa_linalg::{cholesky::*, triangular::*};
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Ix1, Ix2, Zip};

use log::{debug, warn};
use rayon::prelude::*;
use std::fmt;
use std::time::Instant;

/// Default number of multistart for hyperparameters optimization
pub const GP_OPTIM_N_START: usize = 10;
/// Minimum of function evaluations for COBYLA optimizer
pub const GP_COBYLA_MIN_EVAL: usize = 25;
/// Maximum of function evaluations for COBYLA optimizer
pub const GP_COBYLA_MAX_EVAL: usize = 1000;
/// Number of query points processed at once during prediction
pub const GP_PREDICT_BATCH_SIZE: usize = 2048;

/// Internal parameters computed Gp during training
/// used later on in prediction computations
#[derive(Clone, Debug)]
pub(crate) struct GpInnerParams<F: Float> {
    /// Gaussian Process weights `K^-1.y` as a (n, 1) column
    alpha: Array2<F>,
    /// Lower triangular Cholesky factor of the covariance matrix \[K\]
    k_chol: Array2<F>,
}

/// A GP regression models the target as a zero mean gaussian process
/// governed by a stationary covariance kernel whose hyperparameters
/// `theta` are estimated by maximizing the log marginal likelihood.
///
/// Observations are assumed corrupted by a gaussian noise of variance `noise`:
///
/// `y = f(x) + e` where `f ~ GP(0, k(x, x'))` and `e ~ Normal(0, noise)`
///
/// # Implementation
///
/// * Based on [ndarray](https://github.com/rust-ndarray/ndarray)
///   and [linfa](https://github.com/rust-ml/linfa) and strive to follow [linfa guidelines](https://github.com/rust-ml/linfa/blob/master/CONTRIBUTE.md)
/// * Kernels: rational quadratic, squared exponential (see [crate::kernels])
/// * Hyperparameters are optimized with COBYLA in log10 space, from the given
///   initial guess and from `n_start` random starting points run in parallel.
///
/// # Example
///
/// ```no_run
/// use pollumap_gp::{kernels::RationalQuadraticKernel, GaussianProcess};
/// use linfa::prelude::*;
/// use ndarray::{array, Array, Axis};
///
/// let xt = array![[0.0, 0.0], [0.5, 0.2], [1.0, 0.4], [0.2, 0.9], [0.8, 0.8]];
/// let yt = array![10., 20., 15., 12., 30.];
///
/// let gp = GaussianProcess::<f64, RationalQuadraticKernel>::params(RationalQuadraticKernel())
///     .noise(0.01)
///     .fit(&Dataset::new(xt, yt))
///     .expect("GP fitted");
///
/// let xtest = array![[0.1, 0.1], [0.6, 0.6]];
/// let (mean, std) = gp.predict_valstd(&xtest).expect("GP prediction");
/// ```
#[derive(Clone, Debug)]
pub struct GaussianProcess<F: Float, K: Kernel<F>> {
    /// Kernel hyperparameters
    theta: Array1<F>,
    /// Log marginal likelihood value (result from internal optimization)
    /// Maybe used to compare different trained models
    likelihood: F,
    /// Gaussian process internal fitted params
    inner_params: GpInnerParams<F>,
    /// Training outputs
    yt_norm: NormalizedTargets<F>,
    /// Training dataset (input, output)
    pub(crate) training_data: (Array2<F>, Array1<F>),
    /// Parameters used to fit this model
    pub(crate) params: GpValidParams<F, K>,
}

impl<F: Float, K: Kernel<F>> fmt::Display for GaussianProcess<F, K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "GP(kernel={}, theta={}, noise={}, likelihood={})",
            self.params.kernel, self.theta, self.params.noise, self.likelihood,
        )
    }
}

impl<F: Float, K: Kernel<F>> GaussianProcess<F, K> {
    /// Gp parameters contructor
    pub fn params<NewK: Kernel<F>>(kernel: NewK) -> GpParams<F, NewK> {
        GpParams::new(kernel)
    }

    /// Predict output values at n given `x` points of nx components specified as a (n, nx) matrix.
    /// Returns n scalar output values as a vector (n,).
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        self.check_dims(x)?;
        let mut y = Array1::zeros(x.nrows());
        for (xb, mut yb) in x
            .axis_chunks_iter(Axis(0), GP_PREDICT_BATCH_SIZE)
            .zip(y.axis_chunks_iter_mut(Axis(0), GP_PREDICT_BATCH_SIZE))
        {
            let kstar = self.compute_cross_covariance(&xb);
            yb.assign(&self.mean_from(&kstar));
        }
        Ok(y)
    }

    /// Predict variance values at n given `x` points of nx components specified as a (n, nx) matrix.
    /// Returns n variance values as (n,) column vector.
    pub fn predict_var(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        self.check_dims(x)?;
        let mut var = Array1::zeros(x.nrows());
        for (xb, mut vb) in x
            .axis_chunks_iter(Axis(0), GP_PREDICT_BATCH_SIZE)
            .zip(var.axis_chunks_iter_mut(Axis(0), GP_PREDICT_BATCH_SIZE))
        {
            let kstar = self.compute_cross_covariance(&xb);
            vb.assign(&self.variance_from(&kstar)?);
        }
        Ok(var)
    }

    /// Predict standard deviation values at n given `x` points specified as a (n, nx) matrix.
    pub fn predict_std(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        Ok(self.predict_var(x)?.mapv(|v| v.sqrt()))
    }

    /// Predict both output values and variance at n given `x` points of nx components
    pub fn predict_valvar(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<(Array1<F>, Array1<F>)> {
        self.check_dims(x)?;
        let mut y = Array1::zeros(x.nrows());
        let mut var = Array1::zeros(x.nrows());
        for ((xb, mut yb), mut vb) in x
            .axis_chunks_iter(Axis(0), GP_PREDICT_BATCH_SIZE)
            .zip(y.axis_chunks_iter_mut(Axis(0), GP_PREDICT_BATCH_SIZE))
            .zip(var.axis_chunks_iter_mut(Axis(0), GP_PREDICT_BATCH_SIZE))
        {
            let kstar = self.compute_cross_covariance(&xb);
            yb.assign(&self.mean_from(&kstar));
            vb.assign(&self.variance_from(&kstar)?);
        }
        Ok((y, var))
    }

    /// Predict both output values and standard deviation at n given `x` points of nx components
    pub fn predict_valstd(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<(Array1<F>, Array1<F>)> {
        let (y, var) = self.predict_valvar(x)?;
        Ok((y, var.mapv(|v| v.sqrt())))
    }

    fn check_dims(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<()> {
        let nx = self.training_data.0.ncols();
        if x.ncols() != nx {
            return Err(GpError::InvalidValueError(format!(
                "Query points should have {} components, got {}",
                nx,
                x.ncols()
            )));
        }
        Ok(())
    }

    /// Covariance between query points and training points as a (n, nt) matrix
    fn compute_cross_covariance(&self, x: &ArrayView2<F>) -> Array2<F> {
        let xt = &self.training_data.0;
        let mut k = Array2::zeros((x.nrows(), xt.nrows()));
        Zip::from(k.rows_mut()).and(x.rows()).for_each(|mut k_i, x_i| {
            let dx = differences(&x_i, xt);
            k_i.assign(&self.params.kernel.value(&dx, &self.theta));
        });
        k
    }

    fn mean_from(&self, kstar: &Array2<F>) -> Array1<F> {
        let y_ = kstar.dot(&self.inner_params.alpha).remove_axis(Axis(1));
        y_.mapv(|v| v * self.yt_norm.std + self.yt_norm.mean)
    }

    fn variance_from(&self, kstar: &Array2<F>) -> Result<Array1<F>> {
        // v = L^-1.k(X, x*)
        let v = self
            .inner_params
            .k_chol
            .solve_triangular(&kstar.t(), UPLO::Lower)?;
        let std2 = self.yt_norm.std * self.yt_norm.std;
        let var = v.mapv(|e| e * e).sum_axis(Axis(0)).mapv(|s| F::one() - s);
        // Variance might be slightly negative depending on
        // machine precision: set to zero in that case
        Ok(var.mapv(|v| if v < F::zero() { F::zero() } else { v * std2 }))
    }

    /// Retrieve optimized hyperparameters theta
    pub fn theta(&self) -> &Array1<F> {
        &self.theta
    }

    /// Retrieve log marginal likelihood value
    pub fn likelihood(&self) -> F {
        self.likelihood
    }

    /// Retrieve observation noise variance
    pub fn noise(&self) -> F {
        self.params.noise
    }

    /// Retrieve the covariance kernel
    pub fn kernel(&self) -> &K {
        &self.params.kernel
    }

    /// Retrieve input and output dimensions
    pub fn dims(&self) -> (usize, usize) {
        (self.training_data.0.ncols(), 1)
    }

    /// Retrieve training dataset (inputs, outputs)
    pub fn training_data(&self) -> &(Array2<F>, Array1<F>) {
        &self.training_data
    }

    /// Retrieve parameters used to fit this model
    pub fn valid_params(&self) -> &GpValidParams<F, K> {
        &self.params
    }
}

impl<F, D, K> PredictInplace<ArrayBase<D, Ix2>, Array1<F>> for GaussianProcess<F, K>
where
    F: Float,
    D: Data<Elem = F>,
    K: Kernel<F>,
{
    /// *Panics* if `x` has not the number of components of the training inputs,
    /// use [GaussianProcess::predict] to get an error instead.
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        let values = self.predict(x).expect("GP Prediction");
        *y = values;
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros((x.nrows(),))
    }
}

impl<F: Float, K: Kernel<F>, D: Data<Elem = F>>
    Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>, GpError> for GpValidParams<F, K>
{
    type Object = GaussianProcess<F, K>;

    /// Fit GP parameters using maximum likelihood
    fn fit(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>>,
    ) -> Result<Self::Object> {
        let x = dataset.records();
        let y = dataset.targets();
        if x.nrows() == 0 {
            return Err(GpError::InvalidValueError(
                "At least one training point is required".to_string(),
            ));
        }
        if x.nrows() != y.len() {
            return Err(GpError::InvalidValueError(format!(
                "Training inputs ({}) and outputs ({}) should have the same number of rows",
                x.nrows(),
                y.len()
            )));
        }

        let ytrain = if self.normalize_y() {
            NormalizedTargets::new(y)
        } else {
            NormalizedTargets::identity(y)
        };
        let x_distances = DiffMatrix::new(x);
        let sums = x_distances.d.sum_axis(Axis(1));
        if sums.iter().any(|v| *v == F::zero()) {
            warn!("Multiple x input features have the same value (at least same row twice).");
        }

        let opt_params = match self.theta_tuning() {
            ThetaTuning::Fixed(init) => {
                // Easy path no optimization
                init.to_owned()
            }
            ThetaTuning::Full { init, bounds } => {
                let base: f64 = 10.;
                let objfn = |x: &[f64], _gradient: Option<&mut [f64]>, _params: &mut ()| -> f64 {
                    let theta: Array1<F> = x.iter().map(|v| F::cast(base.powf(*v))).collect();
                    for v in theta.iter() {
                        // check theta as optimizer may return nan values
                        if v.is_nan() {
                            // shortcut return worst value wrt to nlml minimization
                            return f64::INFINITY;
                        }
                    }
                    match log_marginal_likelihood(
                        self.kernel(),
                        &theta,
                        &x_distances,
                        &ytrain.data,
                        self.noise(),
                    ) {
                        Ok(r) => -into_f64(&r.0),
                        Err(_) => f64::INFINITY,
                    }
                };

                let bounds = bounds.to_vec();
                let (theta_inits, bounds) =
                    prepare_multistart(self.n_start(), init, &bounds, self.seed());
                debug!("Optimize with multistart theta = {theta_inits:?} and bounds = {bounds:?}");
                let now = Instant::now();
                let opt_params = (0..theta_inits.nrows())
                    .into_par_iter()
                    .map(|i| {
                        optimize_params(
                            objfn,
                            &theta_inits.row(i).to_owned(),
                            &bounds,
                            CobylaParams {
                                maxeval: (10 * theta_inits.ncols())
                                    .clamp(GP_COBYLA_MIN_EVAL, self.max_eval()),
                                ..CobylaParams::default()
                            },
                        )
                    })
                    .reduce(
                        || (f64::INFINITY, Array1::zeros((theta_inits.ncols(),))),
                        |a, b| if b.0 < a.0 { b } else { a },
                    );
                debug!("elapsed optim = {:?}", now.elapsed().as_millis());
                if opt_params.0.is_finite() {
                    debug!("Optimum nlml = {} at log10(theta) = {}", opt_params.0, opt_params.1);
                    opt_params.1.mapv(|v| F::cast(base.powf(v)))
                } else {
                    warn!("Likelihood optimization failed for every start, keep initial theta");
                    init.to_owned()
                }
            }
        };

        let (lkh, inner_params) = log_marginal_likelihood(
            self.kernel(),
            &opt_params,
            &x_distances,
            &ytrain.data,
            self.noise(),
        )?;
        Ok(GaussianProcess {
            theta: opt_params,
            likelihood: lkh,
            inner_params,
            yt_norm: ytrain,
            training_data: (x.to_owned(), y.to_owned()),
            params: self.clone(),
        })
    }
}

/// Compute the log marginal likelihood
/// kernel: covariance kernel,
/// theta: kernel hyperparameters,
/// x_distances: pairwise distances between x samples
/// ytrain: (normalized) output training values
/// noise: observation noise variance added to the diagonal
fn log_marginal_likelihood<F: Float, K: Kernel<F>>(
    kernel: &K,
    theta: &Array1<F>,
    x_distances: &DiffMatrix<F>,
    ytrain: &Array1<F>,
    noise: F,
) -> Result<(F, GpInnerParams<F>)> {
    // Set up K, unit amplitude kernels have k(x, x) = 1
    let kxx = kernel.value(&x_distances.d, theta);
    let mut k_mx: Array2<F> = Array2::<F>::eye(x_distances.n_obs).mapv(|v| v + v * noise);
    for (i, ij) in x_distances.d_indices.outer_iter().enumerate() {
        k_mx[[ij[0], ij[1]]] = kxx[i];
        k_mx[[ij[1], ij[0]]] = kxx[i];
    }
    // K cholesky decomposition
    let k_chol = k_mx.cholesky()?;

    let yt = ytrain.to_owned().insert_axis(Axis(1));
    let rho = k_chol.solve_triangular(&yt, UPLO::Lower)?;
    let alpha = k_chol.t().solve_triangular(&rho, UPLO::Upper)?;

    let data_fit = yt.column(0).dot(&alpha.column(0));
    // The determinant of K is equal to the squared product of
    // the diagonal elements of its Cholesky decomposition k_chol
    let half_logdet = k_chol.diag().mapv(|v: F| v.ln()).sum();
    let n_obs: F = F::cast(x_distances.n_obs);
    let two_pi = F::cast(2. * std::f64::consts::PI);

    let likelihood =
        -F::cast(0.5) * data_fit - half_logdet - F::cast(0.5) * n_obs * two_pi.ln();
    if !likelihood.is_finite() {
        return Err(GpError::LikelihoodComputationError(format!(
            "non finite likelihood with theta = {theta}"
        )));
    }

    Ok((likelihood, GpInnerParams { alpha, k_chol }))
}
