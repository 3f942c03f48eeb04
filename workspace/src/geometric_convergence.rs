use ndarray as nd;
use qmetrics::{
    entanglement::{ geometric_measure, GeometricConfig },
    Gate,
    Result,
    StateVector,
};
use rayon::iter::{ IntoParallelIterator, ParallelIterator };
use tracing::info;
use tracing_subscriber::EnvFilter;

const N: usize = 3; // number of qubits

fn main() -> Result<()> {
    const MC: u64 = 100;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // GHZ state; no real product state has overlap above 1/√2
    let gates: Vec<Gate>
        = std::iter::once(Gate::H(0))
        .chain((1..N).map(|k| Gate::CX(k - 1, k)))
        .collect();
    let ghz = StateVector::from_gates(&gates, N)?;
    let bound = (2.0 - 2.0_f64.sqrt()).sqrt();

    let samples: nd::Array1<usize> = nd::array![100, 250, 500, 1000, 2000, 4000];
    let mut mean: nd::Array1<f64> = nd::Array1::zeros(samples.len());
    let mut std: nd::Array1<f64> = nd::Array1::zeros(samples.len());

    for (k, &s) in samples.iter().enumerate() {
        let config = GeometricConfig { samples: s, ..Default::default() };
        let acc: Vec<f64>
            = (0..MC).into_par_iter()
            .map(|seed| geometric_measure(&ghz, &config.with_seed(seed)))
            .collect::<Result<_>>()?;
        let acc = nd::Array1::from(acc);
        let m = acc.sum() / MC as f64;
        mean[k] = m;
        std[k] = acc.mapv(|d| (d - m).powi(2)).sum().sqrt() / (MC as f64).sqrt();
        info!(samples = s, mean = m, "converged");
    }

    println!("bound = {:.6}", bound);
    for ((s, m), e) in samples.iter().zip(mean.iter()).zip(std.iter()) {
        println!("{:>6}: {:.6} ± {:.6} (excess {:.6})", s, m, e, m - bound);
    }
    Ok(())
}
