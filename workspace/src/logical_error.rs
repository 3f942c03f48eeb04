use itertools::Itertools;
use ndarray as nd;
use qmetrics::{
    code::{ CountModel, ErrorCode, ErrorCodeKind },
    mitigation::{ apply_mitigation_with, Calibration, Mitigation },
    Result,
};
use rayon::iter::{ ParallelBridge, ParallelIterator };
use tracing_subscriber::EnvFilter;

const SHOTS: u64 = 10_000;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let p_err: nd::Array1<f64> = nd::Array1::linspace(0.0, 0.2, 11);
    let codes: Vec<ErrorCode>
        = [ErrorCodeKind::BitFlip, ErrorCodeKind::FiveQubitToy].into_iter()
        .map(|kind| ErrorCode::new(kind, 0))
        .collect::<Result<_>>()?;
    let models = [CountModel::Structural, CountModel::ReadoutFlips];

    let mut rates: Vec<(usize, Result<f64>)>
        = codes.iter()
        .cartesian_product(models.iter())
        .cartesian_product(p_err.iter())
        .enumerate()
        .par_bridge()
        .map(|(k, ((code, &model), &p))| {
            (k, code.logical_error_rate(p, SHOTS, model))
        })
        .collect();
    rates.sort_by_key(|(k, _)| *k);
    let rates: nd::Array1<f64>
        = rates.into_iter()
        .map(|(_, r)| r)
        .collect::<Result<_>>()?;
    let rates = rates.into_shape((codes.len(), models.len(), p_err.len()))
        .map_err(|e| qmetrics::Error::Shape(e.to_string()))?;

    for (i, code) in codes.iter().enumerate() {
        for (j, model) in models.iter().enumerate() {
            let approx = if code.kind.is_teaching_approximation() { " (toy)" } else { "" };
            println!("{}{} / {:?}", code.kind, approx, model);
            for (p, r) in p_err.iter().zip(rates.slice(nd::s![i, j, ..])) {
                println!("  p = {:.3}: {:.4}", p, r);
            }
        }
    }

    // undo the readout flips of the bit-flip syndrome register
    println!();
    let bit_flip = &codes[0];
    for &p in p_err.iter().skip(1) {
        let raw = CountModel::ReadoutFlips.counts(&bit_flip.circuit, p, SHOTS)?;
        let cal = Calibration::from_flip_rate(bit_flip.circuit.num_clbits(), p)?;
        let flat = apply_mitigation_with(&raw, &cal, Mitigation::default())?;
        let unfolded = apply_mitigation_with(&raw, &cal, Mitigation::Unfold)?;
        println!("p = {:.3}", p);
        println!("  raw:      {}", raw);
        println!("  flat:     {}", flat);
        println!("  unfolded: {}", unfolded);
    }
    Ok(())
}
