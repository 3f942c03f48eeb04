//! Entanglement measures of density matrices and pure states.
//!
//! Every measure returns [`Error::Unavailable`] rather than a garbage number
//! when the underlying eigen-decomposition fails or the result is not finite.

use std::f64::consts::TAU;
use nalgebra as na;
use num_complex::Complex64 as C64;
use rand::{ rngs::StdRng, Rng, SeedableRng };
use rayon::iter::{ IntoParallelIterator, ParallelIterator };
use rustc_hash::FxHashSet;
use tracing::debug;
use crate::{
    error::{ Error, Result },
    density::{ self, DensityMatrix },
    gate::PAULI_YY,
    state::StateVector,
    tol,
};

fn finite(x: f64, what: &str) -> Result<f64> {
    if x.is_finite() {
        Ok(x)
    } else {
        Err(Error::unavailable(format!("{} is not finite", what)))
    }
}

/// Wootters concurrence of a two-qubit state.
///
/// With ρ̃ = (σ<sub>*y*</sub> ⊗ σ<sub>*y*</sub>) ρ<sup>*</sup> (σ<sub>*y*</sub>
/// ⊗ σ<sub>*y*</sub>) and λ<sub>*i*</sub> the eigenvalues of ρρ̃ in decreasing
/// order, *C* = max(0, √λ<sub>0</sub> − √λ<sub>1</sub> − √λ<sub>2</sub> −
/// √λ<sub>3</sub>). The eigenvalues are computed from the Hermitian matrix
/// √ρ ρ̃ √ρ, which has the same spectrum.
///
/// Fails with a shape error for anything but a 4 × 4 matrix.
pub fn concurrence(rho: &DensityMatrix) -> Result<f64> {
    if rho.dim() != 4 {
        return Err(Error::shape(format!(
            "concurrence requires a two-qubit state, got {} qubits",
            rho.num_qubits())));
    }
    let yy: &na::DMatrix<C64> = &PAULI_YY;
    let flipped = yy * rho.matrix().conjugate() * yy;
    let sqrt_rho = density::sqrtm_psd(rho.matrix())?;
    let r = &sqrt_rho * flipped * &sqrt_rho;
    let (evals, _) = density::eigh(&r)?;
    let mut roots: Vec<f64>
        = evals.iter().map(|l| l.max(0.0).sqrt()).collect();
    roots.sort_by(|a, b| b.total_cmp(a));
    let c = (roots[0] - roots[1..].iter().sum::<f64>()).max(0.0);
    finite(c.min(1.0), "concurrence")
}

/// Negativity with respect to the subsystem `partition`: the sum of the
/// magnitudes of the negative eigenvalues of the partial transpose, halved.
pub fn negativity(rho: &DensityMatrix, partition: &[usize]) -> Result<f64> {
    let pt = density::partial_transpose(rho, partition)?.into_inner();
    let (evals, _) = density::eigh(&pt)?;
    let neg: f64
        = evals.iter()
        .filter(|l| **l < -tol::NEGATIVITY_ZERO)
        .map(|l| l.abs())
        .sum();
    finite(neg / 2.0, "negativity")
}

/// Von Neumann entropy −Tr(ρ log<sub>2</sub> ρ), in bits.
pub fn von_neumann_entropy(rho: &DensityMatrix) -> Result<f64> {
    let (evals, _) = density::eigh(rho.matrix())?;
    let s: f64
        = evals.iter()
        .filter(|l| **l > tol::ENTROPY_CUTOFF)
        .map(|l| -l * l.log2())
        .sum();
    finite(s.max(0.0), "entropy")
}

/// Entropy of the reduced state on `part`.
pub fn subsystem_entropy(rho: &DensityMatrix, part: &[usize]) -> Result<f64> {
    let red = density::partial_trace(rho, part)?.into_inner();
    von_neumann_entropy(&red)
}

/// Quantum mutual information *S*(ρ<sub>*A*</sub>) + *S*(ρ<sub>*B*</sub>) −
/// *S*(ρ<sub>*AB*</sub>), where ρ<sub>*AB*</sub> is the reduced state on
/// *A* ∪ *B*.
///
/// *A* and *B* must be non-empty and disjoint.
pub fn mutual_information(rho: &DensityMatrix, part_a: &[usize], part_b: &[usize])
    -> Result<f64>
{
    let a: FxHashSet<usize> = part_a.iter().copied().collect();
    let b: FxHashSet<usize> = part_b.iter().copied().collect();
    if a.is_empty() || b.is_empty() {
        return Err(Error::shape("mutual information requires non-empty partitions"));
    }
    if !a.is_disjoint(&b) {
        return Err(Error::shape("mutual information requires disjoint partitions"));
    }
    let ab: Vec<usize> = a.union(&b).copied().collect();
    let s_a = subsystem_entropy(rho, part_a)?;
    let s_b = subsystem_entropy(rho, part_b)?;
    let s_ab = subsystem_entropy(rho, &ab)?;
    finite(s_a + s_b - s_ab, "mutual information")
}

/// Expectation value Re ⟨ψ∣*W*∣ψ⟩ of a witness operator *W*.
///
/// A negative value certifies entanglement when *W* is a valid witness; no
/// check is made that it is one. Fails with a shape error unless *W* is square
/// with the state's dimension.
pub fn witness_expectation(state: &StateVector, witness: &na::DMatrix<C64>)
    -> Result<f64>
{
    if !witness.is_square() || witness.nrows() != state.dim() {
        return Err(Error::shape(format!(
            "witness is {}×{} but the state has dimension {}",
            witness.nrows(), witness.ncols(), state.dim())));
    }
    let amps = state.amplitudes();
    finite(amps.dotc(&(witness * amps)).re, "witness expectation")
}

/// Settings for [`geometric_measure`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GeometricConfig {
    /// Number of angles per qubit in the two-qubit grid search.
    pub grid_steps: usize,
    /// Number of random product states drawn for more than two qubits.
    pub samples: usize,
    /// Seed for the Monte Carlo search; `None` seeds from system entropy.
    pub seed: Option<u64>,
}

impl Default for GeometricConfig {
    fn default() -> Self {
        Self { grid_steps: 50, samples: 2000, seed: None }
    }
}

impl GeometricConfig {
    /// Return a copy of `self` with the Monte Carlo seed set.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

// ⊗_k (cos θ_k/2, sin θ_k/2), with θ_k the angle for qubit k
fn product_state(thetas: &[f64], out: &mut [f64]) {
    out.iter_mut()
        .enumerate()
        .for_each(|(idx, a)| {
            *a = thetas.iter()
                .enumerate()
                .map(|(k, th)| {
                    if idx >> k & 1 == 1 { (th / 2.0).sin() } else { (th / 2.0).cos() }
                })
                .product();
        });
}

fn distance(psi: &na::DVector<C64>, phi: &[f64]) -> f64 {
    psi.iter()
        .zip(phi)
        .map(|(a, b)| (a - b).norm_sqr())
        .sum::<f64>()
        .sqrt()
}

/// Estimate the geometric measure of entanglement of a pure state as the
/// smallest Euclidean distance to a product state of the form
/// ⊗<sub>*k*</sub> (cos θ<sub>*k*</sub>/2, sin θ<sub>*k*</sub>/2).
///
/// - One qubit: every state is a product state, so this is 0.
/// - Two qubits: a deterministic `grid_steps` × `grid_steps` search over
///   θ<sub>*k*</sub> = 2π*i* / `grid_steps`, run in parallel.
/// - More qubits: the minimum over `samples` product states with angles drawn
///   uniformly from [0, 2π).
///
/// The search only covers real product states, so the result is an upper
/// bound on the true distance.
pub fn geometric_measure(state: &StateVector, config: &GeometricConfig)
    -> Result<f64>
{
    let n = state.num_qubits();
    let psi = state.amplitudes();
    let d = match n {
        0 | 1 => 0.0,
        2 => {
            if config.grid_steps == 0 {
                return Err(Error::config("geometric measure: grid_steps must be positive"));
            }
            let steps = config.grid_steps;
            (0..steps * steps).into_par_iter()
                .map(|ij| {
                    let th0 = TAU * (ij / steps) as f64 / steps as f64;
                    let th1 = TAU * (ij % steps) as f64 / steps as f64;
                    let mut phi = [0.0; 4];
                    product_state(&[th0, th1], &mut phi);
                    distance(psi, &phi)
                })
                .reduce(|| f64::INFINITY, f64::min)
        },
        _ => {
            if config.samples == 0 {
                return Err(Error::config("geometric measure: samples must be positive"));
            }
            let mut rng
                = config.seed.map(StdRng::seed_from_u64)
                .unwrap_or_else(StdRng::from_entropy);
            let mut thetas: Vec<f64> = vec![0.0; n];
            let mut phi: Vec<f64> = vec![0.0; state.dim()];
            let mut min = f64::INFINITY;
            for _ in 0..config.samples {
                thetas.iter_mut().for_each(|th| { *th = rng.gen_range(0.0..TAU); });
                product_state(&thetas, &mut phi);
                min = min.min(distance(psi, &phi));
            }
            min
        },
    };
    debug!(qubits = n, distance = d, "geometric measure");
    finite(d, "geometric measure")
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use crate::gate::{ Axis, Gate };

    fn rho_of(gates: &[Gate], n: usize) -> DensityMatrix {
        let psi = StateVector::from_gates(gates, n).unwrap();
        DensityMatrix::from_state(&psi).unwrap()
    }

    const PHI_PLUS: [Gate; 2] = [Gate::H(0), Gate::CX(0, 1)];

    #[test]
    fn concurrence_bell_and_product() {
        assert!(concurrence(&rho_of(&PHI_PLUS, 2)).unwrap() > 0.99);
        assert_abs_diff_eq!(
            concurrence(&rho_of(&[], 2)).unwrap(), 0.0, epsilon = 1e-9);
        let prod = rho_of(&[Gate::H(0), Gate::Rot(1, Axis::Y, 0.8)], 2);
        assert_abs_diff_eq!(concurrence(&prod).unwrap(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn concurrence_partial() {
        // cos(θ/2)∣00⟩ + sin(θ/2)∣11⟩ has C = sin θ
        let th = 0.9;
        let rho = rho_of(&[Gate::Rot(0, Axis::Y, th), Gate::CX(0, 1)], 2);
        assert_abs_diff_eq!(concurrence(&rho).unwrap(), th.sin(), epsilon = 1e-6);
    }

    #[test]
    fn concurrence_mixed() {
        let mixed: na::DMatrix<C64> = na::DMatrix::identity(4, 4) / C64::from(4.0);
        let rho = DensityMatrix::new(mixed).unwrap();
        assert_abs_diff_eq!(concurrence(&rho).unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn concurrence_needs_two_qubits() {
        let rho = rho_of(&[Gate::H(0)], 3);
        assert!(matches!(concurrence(&rho), Err(Error::Shape(_))));
    }

    #[test]
    fn bell_witness() {
        let bell = StateVector::from_gates(&PHI_PLUS, 2).unwrap();
        let proj = DensityMatrix::from_state(&bell).unwrap().into_matrix();
        let witness: na::DMatrix<C64>
            = na::DMatrix::identity(4, 4) * C64::from(0.5) - proj;
        assert_abs_diff_eq!(
            witness_expectation(&bell, &witness).unwrap(), -0.5, epsilon = 1e-12);
        let zero = StateVector::new(2).unwrap();
        assert_abs_diff_eq!(
            witness_expectation(&zero, &witness).unwrap(), 0.0, epsilon = 1e-12);
        let small: na::DMatrix<C64> = na::DMatrix::identity(2, 2);
        assert!(matches!(witness_expectation(&bell, &small), Err(Error::Shape(_))));
    }

    #[test]
    fn negativity_values() {
        assert_abs_diff_eq!(
            negativity(&rho_of(&PHI_PLUS, 2), &[0]).unwrap(), 0.25, epsilon = 1e-9);
        let prod = rho_of(&[Gate::H(0), Gate::H(1), Gate::Phase(1, 0.3)], 2);
        assert_abs_diff_eq!(negativity(&prod, &[0]).unwrap(), 0.0, epsilon = 1e-12);
        let ghz = rho_of(&[Gate::H(0), Gate::CX(0, 1), Gate::CX(1, 2)], 3);
        assert_abs_diff_eq!(negativity(&ghz, &[2]).unwrap(), 0.25, epsilon = 1e-9);
    }

    #[test]
    fn entropy_values() {
        let bell = rho_of(&PHI_PLUS, 2);
        assert_abs_diff_eq!(von_neumann_entropy(&bell).unwrap(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(subsystem_entropy(&bell, &[0]).unwrap(), 1.0, epsilon = 1e-6);
        let mixed: na::DMatrix<C64> = na::DMatrix::identity(8, 8) / C64::from(8.0);
        let rho = DensityMatrix::new(mixed).unwrap();
        assert_abs_diff_eq!(von_neumann_entropy(&rho).unwrap(), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn mutual_information_values() {
        let bell = rho_of(&PHI_PLUS, 2);
        assert_abs_diff_eq!(
            mutual_information(&bell, &[0], &[1]).unwrap(), 2.0, epsilon = 1e-6);
        let prod = rho_of(&[Gate::H(0), Gate::X(1)], 2);
        assert_abs_diff_eq!(
            mutual_information(&prod, &[0], &[1]).unwrap(), 0.0, epsilon = 1e-6);
        // ρ_AB on a strict subset of a GHZ state is classically correlated
        let ghz = rho_of(&[Gate::H(0), Gate::CX(0, 1), Gate::CX(1, 2)], 3);
        assert_abs_diff_eq!(
            mutual_information(&ghz, &[0], &[2]).unwrap(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn mutual_information_partitions() {
        let bell = rho_of(&PHI_PLUS, 2);
        assert!(matches!(mutual_information(&bell, &[], &[1]), Err(Error::Shape(_))));
        assert!(matches!(mutual_information(&bell, &[0, 1], &[1]), Err(Error::Shape(_))));
        assert!(matches!(mutual_information(&bell, &[0], &[3]), Err(Error::Shape(_))));
    }

    #[test]
    fn geometric_two_qubits() {
        let config = GeometricConfig::default();
        let bell = StateVector::from_gates(&PHI_PLUS, 2).unwrap();
        let d = geometric_measure(&bell, &config).unwrap();
        assert_abs_diff_eq!(d, (2.0 - 2.0_f64.sqrt()).sqrt(), epsilon = 1e-9);
        let zero = StateVector::new(2).unwrap();
        assert_abs_diff_eq!(geometric_measure(&zero, &config).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn geometric_single_qubit() {
        let plus = StateVector::from_gates(&[Gate::H(0)], 1).unwrap();
        let d = geometric_measure(&plus, &GeometricConfig::default()).unwrap();
        assert_eq!(d, 0.0);
    }

    #[test]
    fn geometric_monte_carlo_reproducible() {
        let ghz = StateVector::from_gates(
            &[Gate::H(0), Gate::CX(0, 1), Gate::CX(1, 2)], 3).unwrap();
        let config = GeometricConfig::default().with_seed(10546);
        let a = geometric_measure(&ghz, &config).unwrap();
        let b = geometric_measure(&ghz, &config).unwrap();
        assert_eq!(a, b);
        // the closest real product state has overlap at most 1/√2
        assert!(a >= (2.0 - 2.0_f64.sqrt()).sqrt() - 1e-9);
        assert!(a <= 2.0);
    }

    #[test]
    fn geometric_rejects_empty_search() {
        let bell = StateVector::from_gates(&PHI_PLUS, 2).unwrap();
        let config = GeometricConfig { grid_steps: 0, ..Default::default() };
        assert!(matches!(geometric_measure(&bell, &config), Err(Error::Configuration(_))));
    }
}
