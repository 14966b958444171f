use linfa::prelude::*;
use ndarray::{Array, Array1, Array2, Axis, array, concatenate};
use pollumap_gp::{GaussianProcess, kernels::RationalQuadraticKernel};

fn plume(x: &Array2<f64>) -> Array1<f64> {
    x.map_axis(Axis(1), |p| 20. + 40. * f64::exp(-(p[0] - 0.3).powi(2) / 0.05))
}

fn main() {
    let xt = Array::linspace(0., 1., 8)
        .insert_axis(Axis(1))
        .to_owned();
    let xt = concatenate![Axis(1), xt, Array2::<f64>::zeros((8, 1))];
    let yt = plume(&xt);

    println!("Train GP surrogate of a plume at {}", xt.column(0));
    let gp = GaussianProcess::<f64, RationalQuadraticKernel>::params(RationalQuadraticKernel())
        .theta_init(array![0.09, 2.0])
        .noise(0.01)
        .normalize_y(true)
        .fit(&Dataset::new(xt, yt))
        .expect("GP fitting");
    println!("{gp}");

    let xtest = Array::linspace(0., 1., 21).insert_axis(Axis(1));
    let xtest = concatenate![Axis(1), xtest, Array2::<f64>::zeros((21, 1))];
    let ytest = plume(&xtest);
    let (ypred, ystd) = gp.predict_valstd(&xtest).expect("GP prediction");

    println!("Compute prediction errors (x, err(x), std(x))");
    println!(
        "{}",
        concatenate![
            Axis(1),
            xtest.column(0).insert_axis(Axis(1)),
            (ypred - ytest).insert_axis(Axis(1)),
            ystd.insert_axis(Axis(1))
        ]
    );
}
