//! A module for stationary isotropic covariance kernels with unit amplitude.
//!
//! The following kernels are implemented:
//! * rational quadratic,
//! * squared exponential.
//!
//! A kernel only depends on the squared euclidean distance `r^2` between two points,
//! it is evaluated on the componentwise differences of pairs of points.

use linfa::Float;
use ndarray::{Array1, ArrayBase, Axis, Data, Ix1, Ix2};
use std::fmt;

/// A trait for using a covariance kernel in GP regression
pub trait Kernel<F: Float>: Clone + Copy + Default + fmt::Debug + fmt::Display + Send + Sync {
    /// Number of hyperparameters of the kernel
    fn n_theta(&self) -> usize;

    /// Default hyperparameter values
    fn default_theta(&self) -> Array1<F>;

    /// Compute kernel values k(x, x') given differences `d` between x and x' as a (n, nx) matrix
    /// and hyperparameters `theta`. Returns a (n,) vector.
    fn value(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        theta: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array1<F>;
}

fn squared_distances<F: Float>(d: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
    d.mapv(|v| v * v).sum_axis(Axis(1))
}

/// Rational quadratic kernel, a scale mixture of squared exponential kernels
/// with different length scales.
///
/// `theta = [length_scale, alpha]`
///
/// `k(r) = (1 + r^2 / (2 * alpha * length_scale^2))^(-alpha)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RationalQuadraticKernel();

impl<F: Float> Kernel<F> for RationalQuadraticKernel {
    fn n_theta(&self) -> usize {
        2
    }

    fn default_theta(&self) -> Array1<F> {
        Array1::from_elem(2, F::one())
    }

    fn value(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        theta: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array1<F> {
        let (length_scale, alpha) = (theta[0], theta[1]);
        let scale = F::cast(2.) * alpha * length_scale * length_scale;
        squared_distances(d).mapv(|r2| (F::one() + r2 / scale).powf(-alpha))
    }
}

impl fmt::Display for RationalQuadraticKernel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RationalQuadratic")
    }
}

/// Squared exponential kernel
///
/// `theta = [length_scale]`
///
/// `k(r) = exp(-r^2 / (2 * length_scale^2))`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SquaredExponentialKernel();

impl<F: Float> Kernel<F> for SquaredExponentialKernel {
    fn n_theta(&self) -> usize {
        1
    }

    fn default_theta(&self) -> Array1<F> {
        Array1::from_elem(1, F::one())
    }

    fn value(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        theta: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array1<F> {
        let length_scale = theta[0];
        let scale = F::cast(2.) * length_scale * length_scale;
        squared_distances(d).mapv(|r2| F::exp(-r2 / scale))
    }
}

impl fmt::Display for SquaredExponentialKernel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SquaredExponential")
    }
}
