use thiserror::Error;

/// A result type for sampling methods
pub type Result<T> = std::result::Result<T, SamplingError>;

/// An error when using [`StratifiedSampling`](crate::StratifiedSampling) or building a [`Grid`](crate::Grid)
#[derive(Error, Debug)]
pub enum SamplingError {
    /// When coordinates and target arrays do not have the same length
    #[error("Length mismatch: {0}")]
    LengthMismatch(String),
    /// When the grid has no row or no column
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),
    /// When a coordinate is NaN or infinite
    #[error("Non finite coordinate at index {0}")]
    NonFiniteCoordinate(usize),
    /// When bounds cannot be computed
    #[error(transparent)]
    MinMaxError(#[from] ndarray_stats::errors::MinMaxError),
}
