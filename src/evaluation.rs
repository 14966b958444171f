//! Extended evaluation of a fitted model over a uniform grid of the unit square.
use crate::config::EvaluationConfig;
use crate::errors::{PollumapError, Result};
use crate::io::save_npy;
use crate::model::{PollutionModel, Prediction};

use log::info;
use ndarray::{Array1, Array2};

/// Uniform `n x n` grid of the unit square, coordinates being `i / n` for `i` in `0..n`.
///
/// Returns the (n*n, 2) matrix of (lon, lat) points, the point `k = i * n + j`
/// being located at `(i / n, j / n)`.
pub fn evaluation_grid(n: usize) -> Array2<f64> {
    let coords = Array1::linspace(0., n.saturating_sub(1) as f64, n) / n as f64;
    let mut grid = Array2::zeros((n * n, 2));
    for (k, mut row) in grid.rows_mut().into_iter().enumerate() {
        row[0] = coords[k / n];
        row[1] = coords[k % n];
    }
    grid
}

fn to_square(values: Array1<f64>, n: usize) -> Result<Array2<f64>> {
    values
        .into_shape((n, n))
        .map_err(|err| PollumapError::ShapeMismatch(err.to_string()))
}

/// Predict on the evaluation grid and save `(n, n)` matrices of predictions,
/// GP mean, GP standard deviation and grid coordinates as npy files
/// `extended_evaluation_{predictions,gp_mean,gp_stddev,lon,lat}.npy`
/// in the configured output directory.
pub fn perform_extended_evaluation(
    model: &PollutionModel,
    config: &EvaluationConfig,
) -> Result<Prediction> {
    let n = config.get_grid_points();
    if n == 0 {
        return Err(PollumapError::InvalidValue(
            "evaluation grid should have at least one point".to_string(),
        ));
    }
    info!("Performing extended evaluation on a {n}x{n} grid");
    let grid = evaluation_grid(n);
    let prediction = model.predict(&grid)?;

    let outdir = config.get_outdir();
    let outputs = [
        ("predictions", prediction.predictions.clone()),
        ("gp_mean", prediction.gp_mean.clone()),
        ("gp_stddev", prediction.gp_std.clone()),
        ("lon", grid.column(0).to_owned()),
        ("lat", grid.column(1).to_owned()),
    ];
    for (name, values) in outputs {
        let filename = format!("extended_evaluation_{name}.npy");
        save_npy(outdir, &filename, &to_square(values, n)?)?;
    }
    info!("Saved extended evaluation to {}", outdir.display());
    Ok(prediction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_evaluation_grid() {
        let grid = evaluation_grid(3);
        let third = 1. / 3.;
        let two_thirds = 2. / 3.;
        assert_abs_diff_eq!(
            array![
                [0., 0.],
                [0., third],
                [0., two_thirds],
                [third, 0.],
                [third, third],
                [third, two_thirds],
                [two_thirds, 0.],
                [two_thirds, third],
                [two_thirds, two_thirds]
            ],
            grid,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_evaluation_grid_single_point() {
        assert_eq!(array![[0., 0.]], evaluation_grid(1));
        assert_eq!((0, 2), evaluation_grid(0).dim());
    }

    #[test]
    fn test_to_square() {
        let square = to_square(array![1., 2., 3., 4.], 2).expect("square");
        assert_eq!(array![[1., 2.], [3., 4.]], square);
        assert!(to_square(array![1., 2., 3.], 2).is_err());
    }
}
