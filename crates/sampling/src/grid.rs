use crate::errors::{Result, SamplingError};
use linfa::Float;
use ndarray::{ArrayBase, Data, Ix1};
use ndarray_stats::QuantileExt;

/// Rule used to compute the cell index of a coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CellIndexing {
    /// `index = floor(coord / resolution)`
    ///
    /// The offset of the bounding box is not taken into account, hence the index
    /// is only meaningful when the lower bound of the axis is 0.
    Raw,
    /// `index = floor((coord - lower bound) / resolution)`
    #[default]
    Offset,
}

/// An axis-aligned partition of the bounding box of a 2D point set
/// into `rows x cols` cells of equal size.
///
/// Columns split the x axis, rows split the y axis.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<F: Float> {
    x_bounds: (F, F),
    y_bounds: (F, F),
    res_x: F,
    res_y: F,
    rows: usize,
    cols: usize,
}

impl<F: Float> Grid<F> {
    /// Constructor computing the bounding box of the points `(x[i], y[i])`.
    pub fn new(
        x: &ArrayBase<impl Data<Elem = F>, Ix1>,
        y: &ArrayBase<impl Data<Elem = F>, Ix1>,
        rows: usize,
        cols: usize,
    ) -> Result<Grid<F>> {
        if rows == 0 || cols == 0 {
            return Err(SamplingError::InvalidGrid(format!(
                "grid should have at least one row and one column, got {rows}x{cols}"
            )));
        }
        if x.len() != y.len() {
            return Err(SamplingError::LengthMismatch(format!(
                "x and y coordinates should have the same length, got {} and {}",
                x.len(),
                y.len()
            )));
        }
        if let Some(i) = x
            .iter()
            .zip(y.iter())
            .position(|(xi, yi)| !(xi.is_finite() && yi.is_finite()))
        {
            return Err(SamplingError::NonFiniteCoordinate(i));
        }

        let x_bounds = (*x.min()?, *x.max()?);
        let y_bounds = (*y.min()?, *y.max()?);
        let res_x = (x_bounds.1 - x_bounds.0) / F::cast(cols);
        let res_y = (y_bounds.1 - y_bounds.0) / F::cast(rows);
        if res_x == F::zero() {
            log::warn!("Degenerate x extent: all points are put in the first column");
        }
        if res_y == F::zero() {
            log::warn!("Degenerate y extent: all points are put in the first row");
        }
        Ok(Grid {
            x_bounds,
            y_bounds,
            res_x,
            res_y,
            rows,
            cols,
        })
    }

    /// Number of rows (y axis divisions)
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (x axis divisions)
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of cells
    pub fn n_cells(&self) -> usize {
        self.rows * self.cols
    }

    /// Bounds (min, max) of x coordinates
    pub fn x_bounds(&self) -> (F, F) {
        self.x_bounds
    }

    /// Bounds (min, max) of y coordinates
    pub fn y_bounds(&self) -> (F, F) {
        self.y_bounds
    }

    /// Cell sizes (x resolution, y resolution)
    pub fn resolution(&self) -> (F, F) {
        (self.res_x, self.res_y)
    }

    /// Cell `(row, col)` of the point `(x, y)`, clamped within the grid.
    pub fn cell_of(&self, x: F, y: F, indexing: CellIndexing) -> (usize, usize) {
        let col = axis_index(x, self.x_bounds.0, self.res_x, self.cols, indexing);
        let row = axis_index(y, self.y_bounds.0, self.res_y, self.rows, indexing);
        (row, col)
    }

    /// Indices of the points grouped by cell.
    /// Cells are stored row-major: cell `(row, col)` is at `row * cols + col`.
    /// Within a cell, indices keep the input order.
    pub fn buckets(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix1>,
        y: &ArrayBase<impl Data<Elem = F>, Ix1>,
        indexing: CellIndexing,
    ) -> Vec<Vec<usize>> {
        let mut buckets = vec![Vec::new(); self.n_cells()];
        for (i, (xi, yi)) in x.iter().zip(y.iter()).enumerate() {
            let (row, col) = self.cell_of(*xi, *yi, indexing);
            buckets[row * self.cols + col].push(i);
        }
        buckets
    }
}

fn axis_index<F: Float>(v: F, lower: F, res: F, n: usize, indexing: CellIndexing) -> usize {
    if res == F::zero() {
        return 0;
    }
    let origin = match indexing {
        CellIndexing::Raw => F::zero(),
        CellIndexing::Offset => lower,
    };
    let pos = ((v - origin) / res).floor();
    if pos <= F::zero() {
        0
    } else {
        pos.to_usize().map_or(n - 1, |i| i.min(n - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_grid_bounds() {
        let x = array![0.5, 2.5, 1.0];
        let y = array![-1., 3., 0.];
        let grid = Grid::new(&x, &y, 4, 2).unwrap();
        assert_eq!((0.5, 2.5), grid.x_bounds());
        assert_eq!((-1., 3.), grid.y_bounds());
        let (res_x, res_y) = grid.resolution();
        assert_abs_diff_eq!(res_x, 1.0);
        assert_abs_diff_eq!(res_y, 1.0);
        assert_eq!(8, grid.n_cells());
    }

    #[test]
    fn test_max_coordinate_in_last_cell() {
        let x = array![0., 0.3, 1.];
        let y = array![0., 0.6, 2.];
        let grid = Grid::new(&x, &y, 5, 4).unwrap();
        assert_eq!((4, 3), grid.cell_of(1., 2., CellIndexing::Offset));
        assert_eq!((4, 3), grid.cell_of(1., 2., CellIndexing::Raw));
        assert_eq!((0, 0), grid.cell_of(0., 0., CellIndexing::Offset));
        assert_eq!((1, 1), grid.cell_of(0.3, 0.6, CellIndexing::Offset));
    }

    #[test]
    fn test_raw_indexing_ignores_lower_bound() {
        // cells are 5 wide on x, 1 high on y
        let x = array![10., 12., 15., 20.];
        let y = array![0., 0.5, 1.5, 2.];
        let grid = Grid::new(&x, &y, 2, 2).unwrap();

        // raw: 10/5 = 2 and above, clamped to the last column
        let raw: Vec<_> = x
            .iter()
            .zip(y.iter())
            .map(|(xi, yi)| grid.cell_of(*xi, *yi, CellIndexing::Raw))
            .collect();
        assert_eq!(vec![(0, 1), (0, 1), (1, 1), (1, 1)], raw);

        let offset: Vec<_> = x
            .iter()
            .zip(y.iter())
            .map(|(xi, yi)| grid.cell_of(*xi, *yi, CellIndexing::Offset))
            .collect();
        assert_eq!(vec![(0, 0), (0, 0), (1, 1), (1, 1)], offset);
    }

    #[test]
    fn test_negative_coordinates_clamped_to_first_cell() {
        let x = array![-3., -1.];
        let y = array![-2., 0.];
        let grid = Grid::new(&x, &y, 2, 2).unwrap();
        assert_eq!((0, 0), grid.cell_of(-3., -2., CellIndexing::Raw));
        assert_eq!((1, 1), grid.cell_of(-1., 0., CellIndexing::Offset));
    }

    #[test]
    fn test_degenerate_axis() {
        let x = array![1., 1., 1.];
        let y = array![0., 0.5, 1.];
        let grid = Grid::new(&x, &y, 2, 3).unwrap();
        let buckets = grid.buckets(&x, &y, CellIndexing::Offset);
        assert_eq!(vec![0], buckets[0]);
        assert_eq!(vec![1, 2], buckets[3]);
        assert_eq!(3, buckets.iter().map(|b| b.len()).sum::<usize>());
    }

    #[test]
    fn test_buckets_row_major() {
        let x = array![0., 0.1, 0.2, 1.];
        let y = array![0., 0.1, 0.2, 1.];
        let grid = Grid::new(&x, &y, 2, 2).unwrap();
        let buckets = grid.buckets(&x, &y, CellIndexing::Offset);
        assert_eq!(vec![vec![0, 1, 2], vec![], vec![], vec![3]], buckets);
    }

    #[test]
    fn test_invalid_grid() {
        let x = array![0., 1.];
        assert!(matches!(
            Grid::new(&x, &x, 0, 2),
            Err(SamplingError::InvalidGrid(_))
        ));
        assert!(matches!(
            Grid::new(&x, &array![0.], 2, 2),
            Err(SamplingError::LengthMismatch(_))
        ));
    }

    #[test]
    fn test_non_finite_coordinate() {
        let x = array![0., f64::NAN, 1.];
        let y = array![0., 1., f64::INFINITY];
        assert!(matches!(
            Grid::new(&x, &y, 2, 2),
            Err(SamplingError::NonFiniteCoordinate(1))
        ));
    }
}
