use criterion::{Criterion, criterion_group, criterion_main};
use linfa::prelude::{Dataset, Fit};
use ndarray::{Array1, Array2, Axis, array};
use ndarray_npy::{read_npy, write_npy};
use ndarray_rand::RandomExt;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use pollumap_gp::GaussianProcess;
use pollumap_gp::kernels::RationalQuadraticKernel;
use rand_xoshiro::Xoshiro256Plus;

fn plume(x: &Array2<f64>) -> Array1<f64> {
    x.map_axis(Axis(1), |p| {
        let (dx, dy) = (p[0] - 0.3, p[1] - 0.6);
        20. + 40. * f64::exp(-(dx * dx + dy * dy) / 0.05)
    })
}

fn criterion_gp(c: &mut Criterion) {
    let nts = [100, 400];

    let mut group = c.benchmark_group("gp");
    group.sample_size(10);
    for nt in nts {
        let prefix = "gp";
        let xfilename = format!("{prefix}_xt_{nt}x2.npy");
        let xt: Array2<f64> = match read_npy(&xfilename) {
            Ok(xt) => xt,
            Err(_) => {
                let mut rng = Xoshiro256Plus::seed_from_u64(42);
                let xt = Array2::random_using((nt, 2), Uniform::new(0., 1.), &mut rng);
                write_npy(&xfilename, &xt).expect("cannot save xt");
                xt
            }
        };
        let yt = plume(&xt);

        group.bench_function(format!("gp-rq-{nt}-points"), |b| {
            b.iter(|| {
                std::hint::black_box(
                    GaussianProcess::<f64, RationalQuadraticKernel>::params(
                        RationalQuadraticKernel(),
                    )
                    .theta_init(array![0.09, 2.0])
                    .noise(0.01)
                    .n_start(4)
                    .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
                    .expect("GP fit error"),
                )
            });
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_gp);
criterion_main!(benches);
