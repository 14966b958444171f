//! This library implements [Gaussian Process](https://en.wikipedia.org/wiki/Gaussian_process) regression
//! with a zero mean prior, a stationary isotropic covariance kernel and gaussian observation noise.
//!
//! Kernel hyperparameters are estimated by maximizing the log marginal likelihood
//! with the COBYLA optimizer restarted from several starting points.
//!
//! GP methods are implemented by [GaussianProcess] parameterized by [GpParams],
//! kernels are available in the [kernels] module.
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod algorithm;
mod errors;
pub mod kernels;

mod parameters;
mod utils;

mod optimization;

pub use algorithm::*;
pub use errors::*;
pub use parameters::*;
pub use utils::DiffMatrix;
