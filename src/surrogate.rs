//! Surrogate model abstraction used by [crate::PollutionModel].
//!
//! Any GP of the `pollumap-gp` crate, whatever its kernel, is a surrogate.
use crate::errors::Result;
use linfa::prelude::{Dataset, Fit};
use ndarray::{Array1, Array2, ArrayView2};
use pollumap_gp::{kernels::Kernel, GaussianProcess, GpParams};

/// A trait for surrogate parameters to build surrogate once fitted.
pub trait SurrogateParams {
    /// Train the surrogate with given training dataset (x, y)
    fn train(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Box<dyn Surrogate>>;
}

/// A trait for a trained surrogate model
pub trait Surrogate: std::fmt::Display + Send + Sync {
    /// Predict output values at n points given as (n, nx) matrix.
    fn predict(&self, x: &ArrayView2<f64>) -> Result<Array1<f64>>;
    /// Predict output values and standard deviations at n points given as (n, nx) matrix.
    fn predict_valstd(&self, x: &ArrayView2<f64>) -> Result<(Array1<f64>, Array1<f64>)>;
}

impl<K: Kernel<f64> + 'static> SurrogateParams for GpParams<f64, K> {
    fn train(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Box<dyn Surrogate>> {
        let gp = self.fit(&Dataset::new(x.to_owned(), y.to_owned()))?;
        Ok(Box::new(gp))
    }
}

impl<K: Kernel<f64> + 'static> Surrogate for GaussianProcess<f64, K> {
    fn predict(&self, x: &ArrayView2<f64>) -> Result<Array1<f64>> {
        Ok(GaussianProcess::predict(self, x)?)
    }

    fn predict_valstd(&self, x: &ArrayView2<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
        Ok(GaussianProcess::predict_valstd(self, x)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use pollumap_gp::kernels::{RationalQuadraticKernel, SquaredExponentialKernel};
    use pollumap_gp::ThetaTuning;

    #[test]
    fn test_gp_as_surrogate() {
        let xt = array![[0.1, 0.1], [0.4, 0.2], [0.3, 0.8], [0.9, 0.5]];
        let yt = array![1., 3., 2., 4.];
        let params: Box<dyn SurrogateParams> = Box::new(
            GaussianProcess::<f64, RationalQuadraticKernel>::params(RationalQuadraticKernel())
                .theta_tuning(ThetaTuning::Fixed(array![0.3, 2.]))
                .noise(1e-8),
        );
        let surrogate = params.train(&xt, &yt).expect("GP training");
        let (y, std) = surrogate.predict_valstd(&xt.view()).expect("GP prediction");
        assert_abs_diff_eq!(yt, y, epsilon = 1e-3);
        assert_abs_diff_eq!(Array1::<f64>::zeros(4), std, epsilon = 1e-2);
        assert_abs_diff_eq!(y, surrogate.predict(&xt.view()).expect("GP prediction"));
    }

    #[test]
    fn test_gp_surrogate_propagates_errors() {
        let params = GaussianProcess::<f64, SquaredExponentialKernel>::params(
            SquaredExponentialKernel(),
        );
        let xt = Array2::<f64>::zeros((0, 2));
        let yt = Array1::<f64>::zeros(0);
        assert!(params.train(&xt, &yt).is_err());
    }
}
