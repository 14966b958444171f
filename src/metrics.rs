//! Asymmetric weighted cost of pollution predictions.
//!
//! Under-predicting a concentration is penalized much more than predicting it
//! correctly, and grossly over-predicting it (by a ratio of at least 1.2) is
//! penalized too.
use crate::errors::{PollumapError, Result};
use ndarray::{ArrayBase, Data, Ix1, Zip};

/// Weights applied to the squared errors
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CostWeights {
    /// Weight when the prediction is below the ground truth
    pub underpredict: f64,
    /// Weight otherwise
    pub normal: f64,
    /// Weight when the prediction is at least `overpredict_ratio` times the ground truth
    pub overpredict: f64,
    /// Ratio triggering the over-prediction weight
    pub overpredict_ratio: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        CostWeights {
            underpredict: 25.0,
            normal: 1.0,
            overpredict: 10.0,
            overpredict_ratio: 1.2,
        }
    }
}

impl CostWeights {
    /// Weight of the error of `pred` against `gt`.
    /// Over-prediction takes precedence over under-prediction.
    pub fn weight(&self, gt: f64, pred: f64) -> f64 {
        if pred >= self.overpredict_ratio * gt {
            self.overpredict
        } else if pred < gt {
            self.underpredict
        } else {
            self.normal
        }
    }
}

/// Mean of weighted squared errors between `ground_truth` and `predictions`
pub fn cost_function(
    ground_truth: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    predictions: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    weights: &CostWeights,
) -> Result<f64> {
    if ground_truth.len() != predictions.len() {
        return Err(PollumapError::ShapeMismatch(format!(
            "ground truth ({}) and predictions ({}) should have the same length",
            ground_truth.len(),
            predictions.len()
        )));
    }
    if ground_truth.is_empty() {
        return Err(PollumapError::InvalidValue(
            "cost of an empty prediction is undefined".to_string(),
        ));
    }
    let total = Zip::from(ground_truth)
        .and(predictions)
        .fold(0., |acc, &gt, &pred| {
            acc + weights.weight(gt, pred) * (gt - pred) * (gt - pred)
        });
    Ok(total / ground_truth.len() as f64)
}
