use linfa::Float;
use ndarray::{s, Array1, Array2, ArrayBase, Data, Ix1, Ix2};

/// Scalar centering and scaling of a target vector.
#[derive(Clone, Debug)]
pub(crate) struct NormalizedTargets<F: Float> {
    /// normalized data
    pub data: Array1<F>,
    /// mean computed from data (0 when not normalized)
    pub mean: F,
    /// standard deviation computed from data (1 when not normalized)
    pub std: F,
}

impl<F: Float> NormalizedTargets<F> {
    /// Center and scale `y` by its mean and standard deviation.
    /// A null standard deviation is replaced by 1.
    pub fn new(y: &ArrayBase<impl Data<Elem = F>, Ix1>) -> NormalizedTargets<F> {
        let mean = y.mean().unwrap_or_else(F::zero);
        let std = y.std(F::zero());
        let std = if std == F::zero() { F::one() } else { std };
        NormalizedTargets {
            data: y.mapv(|v| (v - mean) / std),
            mean,
            std,
        }
    }

    /// Targets used as is
    pub fn identity(y: &ArrayBase<impl Data<Elem = F>, Ix1>) -> NormalizedTargets<F> {
        NormalizedTargets {
            data: y.to_owned(),
            mean: F::zero(),
            std: F::one(),
        }
    }
}

/// A structure to retain absolute differences computation used to compute covariance matrix
#[derive(Debug)]
pub struct DiffMatrix<F: Float> {
    /// Differences as (n_obs * (n_obs-1))/2, nx) array
    pub d: Array2<F>,
    /// Indices of the differences in the original data array
    pub d_indices: Array2<usize>,
    /// Number of observations
    pub n_obs: usize,
}

impl<F: Float> DiffMatrix<F> {
    /// Compute differences given points given as an array (n_obs, nx)
    pub fn new(x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> DiffMatrix<F> {
        let (d, d_indices) = Self::cross_diff(x);
        let n_obs = x.nrows();

        DiffMatrix {
            d,
            d_indices,
            n_obs,
        }
    }

    fn cross_diff(x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> (Array2<F>, Array2<usize>) {
        let n_obs = x.nrows();
        let nx = x.ncols();
        let n_non_zero_cross_dist = n_obs * n_obs.saturating_sub(1) / 2;
        let mut indices = Array2::<usize>::zeros((n_non_zero_cross_dist, 2));
        let mut d = Array2::zeros((n_non_zero_cross_dist, nx));
        let mut idx = 0;
        for k in 0..n_obs.saturating_sub(1) {
            let idx0 = idx;
            let offset = n_obs - k - 1;
            idx = idx0 + offset;

            for i in (k + 1)..n_obs {
                let r = idx0 + i - k - 1;
                indices[[r, 0]] = k;
                indices[[r, 1]] = i;
            }

            let diff = &x.slice(s![k, ..]) - &x.slice(s![k + 1..n_obs, ..]);
            d.slice_mut(s![idx0..idx, ..]).assign(&diff);
        }
        d.mapv_inplace(|v| v.abs());

        (d, indices)
    }
}

/// Computes differences between x and each element of y
/// resulting in a 2d array of shape (nrows(y), ncols(x));
/// *Panics* if x and y have not the same number of components
pub fn differences<F: Float>(
    x: &ArrayBase<impl Data<Elem = F>, Ix1>,
    y: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Array2<F> {
    assert!(x.len() == y.ncols());
    x.to_owned() - y
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_differences() {
        let x = array![-0.9486833, 1.];
        let y = array![[-1.26491106, 0.], [0., 0.5], [1.26491106, 2.]];
        assert_abs_diff_eq!(
            &array![[0.31622777, 1.], [-0.9486833, 0.5], [-2.21359436, -1.]],
            &differences(&x, &y),
            epsilon = 1e-6
        )
    }

    #[test]
    fn test_normalized_targets() {
        let y = array![1., 3.];
        let ynorm = NormalizedTargets::new(&y);
        assert_abs_diff_eq!(ynorm.mean, 2.);
        assert_abs_diff_eq!(ynorm.std, 1.);
        assert_abs_diff_eq!(ynorm.data, array![-1., 1.]);

        let constant = NormalizedTargets::new(&array![4., 4., 4.]);
        assert_abs_diff_eq!(constant.std, 1.);
        assert_abs_diff_eq!(constant.data, array![0., 0., 0.]);
    }

    #[test]
    fn test_diff_matrix() {
        let xt = array![[0.5, 0.], [1.2, 1.], [2.0, -1.]];
        let dm = DiffMatrix::new(&xt);
        assert_abs_diff_eq!(
            array![[0.7, 1.], [1.5, 1.], [0.8, 2.]],
            dm.d,
            epsilon = 1e-12
        );
        assert_eq!(array![[0, 1], [0, 2], [1, 2]], dm.d_indices);
        assert_eq!(3, dm.n_obs);
    }

    #[test]
    fn test_diff_matrix_single_point() {
        let dm = DiffMatrix::new(&array![[0.5, 0.]]);
        assert_eq!((0, 2), dm.d.dim());
        assert_eq!(1, dm.n_obs);
    }
}
