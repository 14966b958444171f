//! Pollution model and evaluation configurations.
//!
//! Default values reproduce the historical settings of the model:
//! a 20x20 sampling grid over a budget of 10000 training points,
//! a rational quadratic GP kernel started at `length_scale = 0.09`, `alpha = 2.0`
//! and a prediction bias of `2.2`.
use pollumap_sampling::{CellIndexing, SamplingConfig};
use std::path::{Path, PathBuf};

/// Default number of rows and columns of the sampling grid
pub const DEFAULT_GRID_SIZE: usize = 20;
/// Default budget of training points kept by the stratified sampling
pub const DEFAULT_TOT_POINTS: usize = 10000;
/// Default number of points per axis of the extended evaluation grid
pub const EVALUATION_GRID_POINTS: usize = 300;

/// Content of the `gp_mean` field of a prediction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GpMeanMode {
    /// Every entry is the average of all query feature coordinates (historical behavior)
    #[default]
    FeatureAverage,
    /// GP posterior mean at each query point, without bias
    Posterior,
}

/// Pollution model configuration
#[derive(Clone, Debug, PartialEq)]
pub struct ModelConfig {
    /// Number of rows of the sampling grid (latitude axis)
    pub(crate) rows: usize,
    /// Number of columns of the sampling grid (longitude axis)
    pub(crate) cols: usize,
    /// Training points budget, the per-cell cap is `tot_points / (rows * cols)`
    pub(crate) tot_points: usize,
    /// Cell index computation of the sampling grid
    pub(crate) indexing: CellIndexing,
    /// Initial length scale of the rational quadratic kernel
    pub(crate) length_scale: f64,
    /// Length scale search interval
    pub(crate) length_scale_bounds: (f64, f64),
    /// Initial scale mixture parameter of the rational quadratic kernel
    pub(crate) alpha: f64,
    /// Scale mixture parameter search interval
    pub(crate) alpha_bounds: (f64, f64),
    /// Observation noise variance added to the GP covariance diagonal
    pub(crate) noise: f64,
    /// Number of GP hyperparameters optimization restarts
    pub(crate) n_start: usize,
    /// Random generator seed used by sampling and GP restarts
    pub(crate) seed: u64,
    /// Constant added to the GP posterior mean to get predictions
    pub(crate) bias: f64,
    /// See [GpMeanMode]
    pub(crate) gp_mean_mode: GpMeanMode,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            rows: DEFAULT_GRID_SIZE,
            cols: DEFAULT_GRID_SIZE,
            tot_points: DEFAULT_TOT_POINTS,
            indexing: CellIndexing::default(),
            length_scale: 0.09,
            length_scale_bounds: (1e-5, 1e5),
            alpha: 2.0,
            alpha_bounds: (1e-5, 1e5),
            noise: 0.01,
            n_start: 50,
            seed: 0,
            bias: 2.2,
            gp_mean_mode: GpMeanMode::default(),
        }
    }
}

impl ModelConfig {
    /// Sets sampling grid dimensions
    pub fn grid(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    /// Sets the training points budget
    pub fn tot_points(mut self, tot_points: usize) -> Self {
        self.tot_points = tot_points;
        self
    }

    /// Sets the cell index computation of the sampling grid
    pub fn indexing(mut self, indexing: CellIndexing) -> Self {
        self.indexing = indexing;
        self
    }

    /// Sets initial length scale and its search interval
    pub fn length_scale(mut self, init: f64, bounds: (f64, f64)) -> Self {
        self.length_scale = init;
        self.length_scale_bounds = bounds;
        self
    }

    /// Sets initial scale mixture parameter and its search interval
    pub fn alpha(mut self, init: f64, bounds: (f64, f64)) -> Self {
        self.alpha = init;
        self.alpha_bounds = bounds;
        self
    }

    /// Sets observation noise variance
    pub fn noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    /// Sets the number of GP hyperparameters optimization restarts
    pub fn n_start(mut self, n_start: usize) -> Self {
        self.n_start = n_start;
        self
    }

    /// Sets the random generator seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the constant added to GP posterior mean
    pub fn bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }

    /// Sets the `gp_mean` computation
    pub fn gp_mean_mode(mut self, gp_mean_mode: GpMeanMode) -> Self {
        self.gp_mean_mode = gp_mean_mode;
        self
    }

    /// Sampling configuration derived from grid dimensions and points budget
    pub fn sampling(&self) -> SamplingConfig {
        SamplingConfig::from_budget(self.tot_points, self.rows, self.cols).indexing(self.indexing)
    }

    /// Kernel hyperparameters initial values `[length_scale, alpha]`
    pub fn theta_init(&self) -> [f64; 2] {
        [self.length_scale, self.alpha]
    }

    /// Kernel hyperparameters search intervals
    pub fn theta_bounds(&self) -> [(f64, f64); 2] {
        [self.length_scale_bounds, self.alpha_bounds]
    }

    /// Observation noise variance
    pub fn get_noise(&self) -> f64 {
        self.noise
    }

    /// Number of GP optimization restarts
    pub fn get_n_start(&self) -> usize {
        self.n_start
    }

    /// Random generator seed
    pub fn get_seed(&self) -> u64 {
        self.seed
    }

    /// Prediction bias
    pub fn get_bias(&self) -> f64 {
        self.bias
    }

    /// `gp_mean` computation
    pub fn get_gp_mean_mode(&self) -> GpMeanMode {
        self.gp_mean_mode
    }
}

/// Extended evaluation configuration
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationConfig {
    pub(crate) grid_points: usize,
    pub(crate) outdir: PathBuf,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            grid_points: EVALUATION_GRID_POINTS,
            outdir: PathBuf::from("."),
        }
    }
}

impl EvaluationConfig {
    /// Sets the number of points per axis of the evaluation grid
    pub fn grid_points(mut self, grid_points: usize) -> Self {
        self.grid_points = grid_points;
        self
    }

    /// Sets the directory where evaluation results are saved
    pub fn outdir<P: AsRef<Path>>(mut self, outdir: P) -> Self {
        self.outdir = outdir.as_ref().to_path_buf();
        self
    }

    /// Number of points per axis of the evaluation grid
    pub fn get_grid_points(&self) -> usize {
        self.grid_points
    }

    /// Output directory
    pub fn get_outdir(&self) -> &Path {
        &self.outdir
    }
}
