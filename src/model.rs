use crate::config::{GpMeanMode, ModelConfig};
use crate::errors::{PollumapError, Result};
use crate::surrogate::{Surrogate, SurrogateParams};

use log::{debug, info};
use ndarray::{arr1, s, Array1, ArrayBase, Data, Ix1, Ix2};
use pollumap_gp::kernels::RationalQuadraticKernel;
use pollumap_gp::GpParams;
use pollumap_sampling::StratifiedSampling;
use rand_xoshiro::Xoshiro256Plus;
use std::time::Instant;

/// Result of a pollution model prediction at n query points
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    /// Predicted concentrations, GP posterior mean plus bias
    pub predictions: Array1<f64>,
    /// GP mean as specified by [GpMeanMode]
    pub gp_mean: Array1<f64>,
    /// GP posterior standard deviation
    pub gp_std: Array1<f64>,
}

/// Default surrogate: a GP with a rational quadratic kernel whose hyperparameters
/// are optimized starting from and within the values given by `config`.
pub fn default_surrogate_params(config: &ModelConfig) -> GpParams<f64, RationalQuadraticKernel> {
    GpParams::new(RationalQuadraticKernel())
        .theta_init(arr1(&config.theta_init()))
        .theta_bounds(arr1(&config.theta_bounds()))
        .noise(config.get_noise())
        .n_start(config.get_n_start())
        .seed(config.get_seed())
}

/// Pollution concentration model.
///
/// The training set is first reduced by a spatial stratified sampling then a
/// surrogate is trained on the sampled points. Predictions are shifted by a
/// constant bias as under-prediction is costly (see [crate::metrics]).
pub struct PollutionModel {
    config: ModelConfig,
    sampling: StratifiedSampling<Xoshiro256Plus>,
    surrogate_params: Box<dyn SurrogateParams>,
    surrogate: Option<Box<dyn Surrogate>>,
}

impl Default for PollutionModel {
    fn default() -> Self {
        Self::with_default_surrogate(ModelConfig::default())
    }
}

impl PollutionModel {
    /// Constructor given a configuration and surrogate parameters
    pub fn new(config: ModelConfig, surrogate_params: Box<dyn SurrogateParams>) -> Self {
        let sampling = StratifiedSampling::seeded(config.sampling(), config.get_seed());
        PollutionModel {
            config,
            sampling,
            surrogate_params,
            surrogate: None,
        }
    }

    /// Constructor using the [default surrogate](default_surrogate_params)
    pub fn with_default_surrogate(config: ModelConfig) -> Self {
        let params = default_surrogate_params(&config);
        Self::new(config, Box::new(params))
    }

    /// Model configuration
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Trained surrogate if any
    pub fn surrogate(&self) -> Option<&dyn Surrogate> {
        self.surrogate.as_deref()
    }

    /// Whether [PollutionModel::fit] was called successfully
    pub fn is_fitted(&self) -> bool {
        self.surrogate.is_some()
    }

    /// Fit the model given `train_targets` concentrations (n,) measured at
    /// `train_features` (lon, lat) locations given as a (n, 2) matrix.
    pub fn fit(
        &mut self,
        train_targets: &ArrayBase<impl Data<Elem = f64>, Ix1>,
        train_features: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    ) -> Result<()> {
        check_features(train_features)?;
        if train_features.nrows() != train_targets.len() {
            return Err(PollumapError::ShapeMismatch(format!(
                "training features ({}) and targets ({}) should have the same number of rows",
                train_features.nrows(),
                train_targets.len()
            )));
        }

        let samples = self.sampling.sample(
            &train_features.column(0),
            &train_features.column(1),
            train_targets,
        )?;
        info!(
            "Training on {} sampled points out of {}",
            samples.nrows(),
            train_targets.len()
        );
        let xt = samples.slice(s![.., ..2]).to_owned();
        let yt = samples.column(2).to_owned();

        let now = Instant::now();
        let surrogate = self.surrogate_params.train(&xt, &yt)?;
        info!("Surrogate fitted in {:?}", now.elapsed());
        debug!("Surrogate {surrogate}");
        self.surrogate = Some(surrogate);
        Ok(())
    }

    /// Predict concentrations at `test_features` (lon, lat) locations given as a (n, 2) matrix.
    pub fn predict(
        &self,
        test_features: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    ) -> Result<Prediction> {
        let surrogate = self.surrogate.as_ref().ok_or(PollumapError::NotFitted)?;
        check_features(test_features)?;

        let (mean, gp_std) = surrogate.predict_valstd(&test_features.view())?;
        let predictions = &mean + self.config.get_bias();
        let gp_mean = match self.config.get_gp_mean_mode() {
            GpMeanMode::FeatureAverage => {
                let avg = test_features.mean().unwrap_or(0.);
                Array1::from_elem(test_features.nrows(), avg)
            }
            GpMeanMode::Posterior => mean,
        };
        Ok(Prediction {
            predictions,
            gp_mean,
            gp_std,
        })
    }
}

fn check_features(features: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<()> {
    if features.ncols() != 2 {
        return Err(PollumapError::ShapeMismatch(format!(
            "features should have 2 columns (lon, lat), got {}",
            features.ncols()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2, ArrayView2};
    use pollumap_sampling::CellIndexing;
    use std::fmt;

    /// Predicts the mean of the training targets with a standard deviation
    /// equal to the number of training points
    struct MeanSurrogateParams;

    struct MeanSurrogate {
        mean: f64,
        n: usize,
    }

    impl SurrogateParams for MeanSurrogateParams {
        fn train(&self, _x: &Array2<f64>, y: &Array1<f64>) -> Result<Box<dyn Surrogate>> {
            let mean = y
                .mean()
                .ok_or_else(|| PollumapError::InvalidValue("no training data".to_string()))?;
            Ok(Box::new(MeanSurrogate { mean, n: y.len() }))
        }
    }

    impl Surrogate for MeanSurrogate {
        fn predict(&self, x: &ArrayView2<f64>) -> Result<Array1<f64>> {
            Ok(Array1::from_elem(x.nrows(), self.mean))
        }

        fn predict_valstd(&self, x: &ArrayView2<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
            Ok((
                self.predict(x)?,
                Array1::from_elem(x.nrows(), self.n as f64),
            ))
        }
    }

    impl fmt::Display for MeanSurrogate {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "Mean({})", self.mean)
        }
    }

    fn training_set() -> (Array1<f64>, Array2<f64>) {
        let features = array![[0., 0.], [0.1, 0.2], [0.2, 0.1], [0.9, 0.9], [1., 1.]];
        let targets = array![10., 20., 30., 40., 50.];
        (targets, features)
    }

    #[test]
    fn test_predict_before_fit() {
        let model = PollutionModel::new(ModelConfig::default(), Box::new(MeanSurrogateParams));
        assert!(!model.is_fitted());
        let res = model.predict(&array![[0.5, 0.5]]);
        assert!(matches!(res, Err(PollumapError::NotFitted)));
    }

    #[test]
    fn test_fit_predict_with_bias() {
        let (targets, features) = training_set();
        let mut model =
            PollutionModel::new(ModelConfig::default(), Box::new(MeanSurrogateParams));
        model.fit(&targets, &features).expect("fit");
        assert!(model.is_fitted());

        let test = array![[0.5, 0.5], [0.2, 0.6]];
        let pred = model.predict(&test).expect("predict");
        // default budget keeps every point
        assert_abs_diff_eq!(array![32.2, 32.2], pred.predictions, epsilon = 1e-12);
        assert_abs_diff_eq!(array![5., 5.], pred.gp_std);
        // average of all query coordinates
        assert_abs_diff_eq!(array![0.45, 0.45], pred.gp_mean, epsilon = 1e-12);
    }

    #[test]
    fn test_posterior_gp_mean() {
        let (targets, features) = training_set();
        let config = ModelConfig::default()
            .gp_mean_mode(GpMeanMode::Posterior)
            .bias(0.);
        let mut model = PollutionModel::new(config, Box::new(MeanSurrogateParams));
        model.fit(&targets, &features).expect("fit");
        let pred = model.predict(&array![[0.5, 0.5]]).expect("predict");
        assert_abs_diff_eq!(array![30.], pred.gp_mean, epsilon = 1e-12);
        assert_abs_diff_eq!(pred.gp_mean, pred.predictions);
    }

    #[test]
    fn test_fit_uses_sampled_points() {
        let (targets, features) = training_set();
        // 2x2 grid with one point per cell, only 2 cells are not empty
        let config = ModelConfig::default()
            .grid(2, 2)
            .tot_points(4)
            .indexing(CellIndexing::Offset);
        let mut model = PollutionModel::new(config, Box::new(MeanSurrogateParams));
        model.fit(&targets, &features).expect("fit");
        let pred = model.predict(&array![[0.5, 0.5]]).expect("predict");
        assert_abs_diff_eq!(array![2.], pred.gp_std);
    }

    #[test]
    fn test_invalid_shapes() {
        let (targets, features) = training_set();
        let mut model =
            PollutionModel::new(ModelConfig::default(), Box::new(MeanSurrogateParams));
        let res = model.fit(&targets.slice(s![..4]), &features);
        assert!(matches!(res, Err(PollumapError::ShapeMismatch(_))));
        let res = model.fit(&targets, &Array2::<f64>::zeros((5, 3)));
        assert!(matches!(res, Err(PollumapError::ShapeMismatch(_))));

        model.fit(&targets, &features).expect("fit");
        let res = model.predict(&array![[0.5], [0.2]]);
        assert!(matches!(res, Err(PollumapError::ShapeMismatch(_))));
    }

    #[test]
    fn test_default_surrogate_params() {
        let params = default_surrogate_params(&ModelConfig::default());
        let valid = linfa::ParamGuard::check_ref(&params).expect("valid params");
        assert_eq!(&array![0.09, 2.], valid.theta_tuning().init());
        assert_eq!(0.01, valid.noise());
        assert_eq!(50, valid.n_start());
        assert_eq!(0, valid.seed());
    }
}
