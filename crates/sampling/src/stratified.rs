use std::sync::{Arc, RwLock};

use crate::errors::{Result, SamplingError};
use crate::grid::{CellIndexing, Grid};
use linfa::Float;
use log::debug;
use ndarray::{Array2, ArrayBase, Data, Ix1};
use ndarray_rand::rand::seq::index;
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

/// Default number of grid rows
pub const DEFAULT_ROWS: usize = 20;
/// Default number of grid columns
pub const DEFAULT_COLS: usize = 20;
/// Default maximum number of points kept in a cell
pub const DEFAULT_MAX_POINTS_PER_CELL: usize = 25;

type RngRef<R> = Arc<RwLock<R>>;

/// Stratified sampling configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplingConfig {
    rows: usize,
    cols: usize,
    max_points_per_cell: usize,
    indexing: CellIndexing,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            max_points_per_cell: DEFAULT_MAX_POINTS_PER_CELL,
            indexing: CellIndexing::default(),
        }
    }
}

impl SamplingConfig {
    /// Constructor given the grid shape and the cell capacity
    pub fn new(rows: usize, cols: usize, max_points_per_cell: usize) -> Self {
        SamplingConfig {
            rows,
            cols,
            max_points_per_cell,
            ..Default::default()
        }
    }

    /// Constructor spreading a total budget of points evenly over the cells,
    /// the capacity of a cell being `tot_points / (rows * cols)` (integer division).
    pub fn from_budget(tot_points: usize, rows: usize, cols: usize) -> Self {
        let n_cells = (rows * cols).max(1);
        Self::new(rows, cols, tot_points / n_cells)
    }

    /// Sets the cell indexing rule
    pub fn indexing(mut self, indexing: CellIndexing) -> Self {
        self.indexing = indexing;
        self
    }

    /// Number of grid rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of grid columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Maximum number of points kept in a cell
    pub fn max_points_per_cell(&self) -> usize {
        self.max_points_per_cell
    }

    /// Cell indexing rule
    pub fn cell_indexing(&self) -> CellIndexing {
        self.indexing
    }

    /// Upper bound of the number of sampled points
    pub fn capacity(&self) -> usize {
        self.rows * self.cols * self.max_points_per_cell
    }
}

/// The stratified sampling partitions 2D points into a uniform grid
/// and draws at most `max_points_per_cell` points from each cell
/// uniformly at random without replacement.
///
/// The random generator is owned by the sampling method: repeated calls
/// to [StratifiedSampling::sample] keep consuming the same random stream.
#[derive(Clone, Debug)]
pub struct StratifiedSampling<R: Rng> {
    config: SamplingConfig,
    rng: RngRef<R>,
}

impl StratifiedSampling<Xoshiro256Plus> {
    /// Constructor given a sampling configuration
    pub fn new(config: SamplingConfig) -> Self {
        Self::new_with_rng(config, Xoshiro256Plus::from_entropy())
    }

    /// Constructor using a random generator seeded with `seed`
    pub fn seeded(config: SamplingConfig, seed: u64) -> Self {
        Self::new_with_rng(config, Xoshiro256Plus::seed_from_u64(seed))
    }
}

impl<R: Rng> StratifiedSampling<R> {
    /// Constructor given a sampling configuration and a random generator
    pub fn new_with_rng(config: SamplingConfig, rng: R) -> Self {
        StratifiedSampling {
            config,
            rng: Arc::new(RwLock::new(rng)),
        }
    }

    /// Set random generator
    pub fn with_rng<R2: Rng>(self, rng: R2) -> StratifiedSampling<R2> {
        StratifiedSampling {
            config: self.config,
            rng: Arc::new(RwLock::new(rng)),
        }
    }

    /// Sampling configuration
    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    /// Sample the points `(x[i], y[i])` with their target values `z[i]`.
    ///
    /// Returns a (n, 3) matrix of `[x, y, z]` rows taken from the input,
    /// cells being visited row by row. Within a cell the order is random.
    pub fn sample<F: Float>(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix1>,
        y: &ArrayBase<impl Data<Elem = F>, Ix1>,
        z: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<Array2<F>> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(SamplingError::LengthMismatch(format!(
                "x, y and z should have the same length, got {}, {} and {}",
                x.len(),
                y.len(),
                z.len()
            )));
        }
        if x.is_empty() {
            return Ok(Array2::zeros((0, 3)));
        }

        let grid = Grid::new(x, y, self.config.rows, self.config.cols)?;
        debug!(
            "Sampling grid {}x{} over x={:?} y={:?}",
            grid.rows(),
            grid.cols(),
            grid.x_bounds(),
            grid.y_bounds()
        );
        let buckets = grid.buckets(x, y, self.config.indexing);

        let mut rng = self.rng.write().unwrap_or_else(|err| err.into_inner());
        let mut selected = Vec::with_capacity(self.config.capacity().min(x.len()));
        for bucket in buckets.iter().filter(|b| !b.is_empty()) {
            let amount = self.config.max_points_per_cell.min(bucket.len());
            let picks = index::sample(&mut *rng, bucket.len(), amount);
            selected.extend(picks.into_iter().map(|k| bucket[k]));
        }
        debug!("Sampled {} points out of {}", selected.len(), x.len());

        let mut samples = Array2::zeros((selected.len(), 3));
        for (mut row, &i) in samples.rows_mut().into_iter().zip(selected.iter()) {
            row[0] = x[i];
            row[1] = y[i];
            row[2] = z[i];
        }
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Axis};
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;

    fn make_points(n: usize, seed: u64) -> (Array1<f64>, Array1<f64>, Array1<f64>) {
        let mut rng = Xoshiro256Plus::seed_from_u64(seed);
        let x = Array1::random_using(n, Uniform::new(0., 1.), &mut rng);
        let y = Array1::random_using(n, Uniform::new(0., 1.), &mut rng);
        let z = Array1::random_using(n, Uniform::new(5., 60.), &mut rng);
        (x, y, z)
    }

    #[test]
    fn test_sample_size_is_bounded() {
        let (x, y, z) = make_points(500, 42);
        for (rows, cols, cap) in [(5, 5, 3), (20, 20, 25), (2, 3, 1000), (4, 4, 0)] {
            let config = SamplingConfig::new(rows, cols, cap);
            let samples = StratifiedSampling::seeded(config, 0)
                .sample(&x, &y, &z)
                .expect("sampling");
            assert!(samples.nrows() <= x.len().min(config.capacity()));
        }
    }

    #[test]
    fn test_samples_are_input_points() {
        let (x, y, z) = make_points(300, 1);
        let samples = StratifiedSampling::seeded(SamplingConfig::new(4, 4, 5), 0)
            .sample(&x, &y, &z)
            .expect("sampling");
        for row in samples.rows() {
            let found = (0..x.len()).any(|i| x[i] == row[0] && y[i] == row[1] && z[i] == row[2]);
            assert!(found, "{row} is not an input point");
        }
    }

    #[test]
    fn test_same_seed_same_samples() {
        let (x, y, z) = make_points(400, 7);
        let config = SamplingConfig::new(5, 5, 4);
        let sampling1 = StratifiedSampling::seeded(config, 0);
        let sampling2 = StratifiedSampling::seeded(config, 0);
        for _ in 0..3 {
            let s1 = sampling1.sample(&x, &y, &z).unwrap();
            let s2 = sampling2.sample(&x, &y, &z).unwrap();
            assert_eq!(s1, s2);
        }
    }

    #[test]
    fn test_three_points_in_one_cell() {
        let x = array![0., 0.1, 0.2, 1.];
        let y = array![0., 0.1, 0.2, 1.];
        let z = array![1., 2., 3., 4.];
        let samples = StratifiedSampling::seeded(SamplingConfig::new(2, 2, 2), 3)
            .sample(&x, &y, &z)
            .unwrap();
        assert_eq!(3, samples.nrows());
        // first cell comes first, then the upper right one
        let first_cell = samples.slice(ndarray::s![0..2, ..]);
        for row in first_cell.rows() {
            assert!(row[2] < 4.);
        }
        assert_ne!(first_cell.row(0), first_cell.row(1));
        assert_eq!(array![1., 1., 4.], samples.row(2));
    }

    #[test]
    fn test_cell_smaller_than_capacity_is_kept() {
        let x = array![0., 0.1, 1.];
        let y = array![0., 0.1, 1.];
        let z = array![1., 2., 3.];
        let samples = StratifiedSampling::seeded(SamplingConfig::new(2, 2, 10), 0)
            .sample(&x, &y, &z)
            .unwrap();
        assert_eq!(3, samples.nrows());
        let mut targets = samples.column(2).to_vec();
        targets.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(vec![1., 2., 3.], targets);
    }

    #[test]
    fn test_zero_capacity() {
        let (x, y, z) = make_points(50, 0);
        let samples = StratifiedSampling::seeded(SamplingConfig::new(3, 3, 0), 0)
            .sample(&x, &y, &z)
            .unwrap();
        assert_eq!(0, samples.len_of(Axis(0)));
    }

    #[test]
    fn test_empty_input() {
        let empty: Array1<f64> = Array1::zeros(0);
        let samples = StratifiedSampling::seeded(SamplingConfig::default(), 0)
            .sample(&empty, &empty, &empty)
            .unwrap();
        assert_eq!((0, 3), samples.dim());
    }

    #[test]
    fn test_length_mismatch() {
        let x = array![0., 1.];
        let res = StratifiedSampling::seeded(SamplingConfig::default(), 0).sample(
            &x,
            &x,
            &array![1.],
        );
        assert!(matches!(res, Err(SamplingError::LengthMismatch(_))));
    }

    #[test]
    fn test_from_budget() {
        let config = SamplingConfig::from_budget(10000, 20, 20);
        assert_eq!(25, config.max_points_per_cell());
        let config = SamplingConfig::from_budget(10, 2, 3);
        assert_eq!(1, config.max_points_per_cell());
        assert_eq!(CellIndexing::Offset, config.cell_indexing());
    }

    #[test]
    fn test_raw_indexing_folds_shifted_points() {
        // with raw indexing every point lies beyond the grid and is clamped in the last cell
        let x = array![10., 11., 19., 20.];
        let y = array![10., 11., 19., 20.];
        let z = array![1., 2., 3., 4.];
        let config = SamplingConfig::new(2, 2, 1);
        let raw = StratifiedSampling::seeded(config.indexing(CellIndexing::Raw), 0)
            .sample(&x, &y, &z)
            .unwrap();
        assert_eq!(1, raw.nrows());
        let offset = StratifiedSampling::seeded(config, 0)
            .sample(&x, &y, &z)
            .unwrap();
        assert_eq!(2, offset.nrows());
    }
}
