/*!
This library predicts fine particulate matter concentrations at arbitrary
(longitude, latitude) locations from a large set of measurements.

The [PollutionModel] reduces the training set with a spatial stratified sampling
(see [pollumap_sampling]) then trains a surrogate, by default a Gaussian Process
with a rational quadratic kernel (see [pollumap_gp]). Predictions are the GP
posterior mean shifted by a constant bias, as under-predicting a concentration is
heavily penalized by the [cost function](metrics::cost_function).

Example:
```no_run
use pollumap::{cost_function, io, CostWeights, ModelConfig, PollutionModel};

let features = io::load_features("train_x.csv")?;
let targets = io::load_targets("train_y.csv")?;

let mut model = PollutionModel::with_default_surrogate(ModelConfig::default());
model.fit(&targets, &features)?;
let prediction = model.predict(&features)?;
let cost = cost_function(&targets, &prediction.predictions, &CostWeights::default())?;
println!("Training cost = {cost}");
# Ok::<(), pollumap::PollumapError>(())
```
*/
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod config;
mod errors;
pub mod evaluation;
pub mod io;
pub mod metrics;
mod model;
pub mod surrogate;

pub use config::*;
pub use errors::*;
pub use evaluation::perform_extended_evaluation;
pub use metrics::{cost_function, CostWeights};
pub use model::*;
pub use surrogate::{Surrogate, SurrogateParams};
