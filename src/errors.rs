use pollumap_gp::GpError;
use pollumap_sampling::SamplingError;
use thiserror::Error;

/// A result type for pollution model fitting, prediction and scoring
pub type Result<T> = std::result::Result<T, PollumapError>;

/// An error when loading data, fitting or evaluating the pollution model
#[derive(Error, Debug)]
pub enum PollumapError {
    /// When the stratified sampling of the training set fails
    #[error("Sampling error: {0}")]
    SamplingError(#[from] SamplingError),
    /// When the surrogate training or prediction fails
    #[error("GP error: {0}")]
    GpError(#[from] GpError),
    /// When arrays do not have the expected shapes
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
    /// When a value is invalid
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// When predictions are requested from a model which is not fitted yet
    #[error("Model is not fitted, call fit() before predict()")]
    NotFitted,
    /// When an IO operation fails
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    /// When a csv file cannot be read
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    /// When csv records cannot be read as a numeric matrix
    #[error("CSV array error: {0}")]
    CsvArrayError(#[from] ndarray_csv::ReadError),
    /// When an array cannot be saved in npy format
    #[error("Write npy error: {0}")]
    WriteNpyError(#[from] ndarray_npy::WriteNpyError),
}
