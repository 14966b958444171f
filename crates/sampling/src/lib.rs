/*!
This library implements a spatial stratified sampling method used to reduce a large
set of 2D located measurements to a bounded, spatially balanced subset before
training a regression model whose cost is super-linear in the number of samples
(typically a gaussian process).

The bounding box of the points is partitioned into a uniform `rows x cols` [Grid].
Each point falls into one cell and, from every non-empty cell, at most
`max_points_per_cell` points are drawn uniformly at random without replacement.

Example:
```
use pollumap_sampling::{SamplingConfig, StratifiedSampling};
use ndarray::array;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

let lon = array![0.0, 0.1, 0.2, 0.9, 1.0];
let lat = array![0.0, 0.1, 0.2, 0.8, 1.0];
let conc = array![10.0, 12.0, 11.0, 30.0, 35.0];

// 2x2 grid keeping at most one point per cell
let sampling = StratifiedSampling::new(SamplingConfig::new(2, 2, 1))
    .with_rng(Xoshiro256Plus::seed_from_u64(42));
let samples = sampling.sample(&lon, &lat, &conc).expect("sampling");
assert_eq!(samples.ncols(), 3);
assert!(samples.nrows() <= 4);
```
*/
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod errors;
mod grid;
mod stratified;

pub use errors::*;
pub use grid::*;
pub use stratified::*;
