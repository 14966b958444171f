use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use log::info;
use ndarray_stats::QuantileExt;
use std::path::PathBuf;

use pollumap::{
    cost_function, io, perform_extended_evaluation, CostWeights, EvaluationConfig, ModelConfig,
    PollutionModel,
};

#[derive(Parser, Debug)]
#[command(name = "pollumap")]
#[command(about = "Fit a GP pollution model and predict concentrations at test locations")]
struct Args {
    /// Directory containing train_x.csv, train_y.csv and test_x.csv
    #[arg(long = "datadir", default_value = ".")]
    datadir: PathBuf,

    /// Directory where predictions and evaluation results are saved
    #[arg(long = "outdir", default_value = ".")]
    outdir: PathBuf,

    /// Predict on a uniform grid and save results for visualization
    #[arg(long = "extended-evaluation")]
    extended_evaluation: bool,

    /// Number of GP hyperparameters optimization restarts
    #[arg(long = "n-start", default_value_t = 50)]
    n_start: usize,

    /// Number of training points kept by the stratified sampling
    #[arg(long = "tot-points", default_value_t = 10000)]
    tot_points: usize,

    /// Random generator seed
    #[arg(long = "seed", default_value_t = 0)]
    seed: u64,
}

fn main() -> Result<()> {
    let env = Env::new().filter_or("POLLUMAP_LOG", "info");
    let mut builder = Builder::from_env(env);
    let builder = builder.target(env_logger::Target::Stdout);
    builder.try_init().ok();

    let args = Args::parse();

    let train_features = io::load_features(args.datadir.join(io::TRAIN_FEATURES_FILE))?;
    let train_targets = io::load_targets(args.datadir.join(io::TRAIN_TARGETS_FILE))?;
    let test_features = io::load_features(args.datadir.join(io::TEST_FEATURES_FILE))?;
    info!(
        "Ground truth min={} max={} mean={}",
        train_targets.min()?,
        train_targets.max()?,
        train_targets.mean().unwrap_or(f64::NAN)
    );

    let config = ModelConfig::default()
        .n_start(args.n_start)
        .tot_points(args.tot_points)
        .seed(args.seed);
    let mut model = PollutionModel::with_default_surrogate(config);
    info!("Fitting model");
    model.fit(&train_targets, &train_features)?;

    info!("Predicting on test features");
    let prediction = model.predict(&test_features)?;
    info!(
        "Predictions min={} max={}",
        prediction.predictions.min()?,
        prediction.predictions.max()?
    );
    io::save_npy(&args.outdir, io::PREDICTIONS_FILE, &prediction.predictions)?;

    let train_prediction = model.predict(&train_features)?;
    let cost = cost_function(
        &train_targets,
        &train_prediction.predictions,
        &CostWeights::default(),
    )?;
    println!("Training cost = {cost}");

    if args.extended_evaluation {
        let config = EvaluationConfig::default().outdir(&args.outdir);
        perform_extended_evaluation(&model, &config)?;
    }
    Ok(())
}
