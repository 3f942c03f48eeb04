use itertools::Itertools;
use qmetrics::{
    bell::{ self, BellKind },
    tomography::full_tomography,
    Result,
};
use tracing_subscriber::EnvFilter;

const SHOTS: u64 = 1024;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let circuits: Vec<_>
        = BellKind::ALL.into_iter()
        .map(|kind| (kind, bell::create_bell_variant(kind)))
        .collect();

    for (kind, circuit) in circuits.iter() {
        let report = bell::verify(circuit)?;
        println!("{}", kind);
        println!("  state: {}", report.state);
        println!("  {}", report);
        let tomo = full_tomography(circuit, SHOTS)?;
        for (basis, counts) in tomo.iter() {
            println!("  {}: {}", basis, counts);
        }
    }

    println!();
    for ((ka, ca), (kb, cb)) in circuits.iter().tuple_combinations() {
        let cmp = bell::compare(ca, cb)?;
        println!(
            "{} vs {}: ΔC = {:?}, ΔN = {:?}, ΔS = {:?}",
            ka, kb, cmp.concurrence_diff, cmp.negativity_diff, cmp.entropy_diff,
        );
    }
    Ok(())
}
