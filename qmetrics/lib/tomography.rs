//! Theoretical basis-rotated measurement statistics and state fidelity.
//!
//! Counts are computed from exact probabilities rather than sampled, so every
//! result here is deterministic.

use std::fmt;
use tracing::debug;
use crate::{
    circuit::Circuit,
    counts::Counts,
    density::{ self, DensityMatrix },
    error::{ Error, Result },
    gate::{ Basis, Gate },
    state::StateVector,
};

/// Counts of every qubit of `circuit` read out in `basis`, scaled to exactly
/// `shots`.
///
/// Each qubit is first rotated so that a Z-basis readout measures `basis`:
/// nothing for Z, H for X, and S<sup>†</sup> followed by H for Y. Any
/// measurements already in the circuit are ignored.
pub fn measurement_distribution(circuit: &Circuit, basis: Basis, shots: u64)
    -> Result<Counts>
{
    if shots == 0 {
        return Err(Error::precondition("shots must be positive"));
    }
    let n = circuit.num_qubits();
    let rotation: Vec<Gate>
        = (0..n).flat_map(|k| basis.rotation(k)).collect();
    let state = StateVector::from_gates(circuit.gates().chain(rotation.iter()), n)?;
    Counts::from_probabilities(&state.probabilities(), n, shots)
}

/// Counts in each of the three Pauli bases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tomography {
    pub z: Counts,
    pub x: Counts,
    pub y: Counts,
}

impl Tomography {
    /// Counts for a particular basis.
    pub fn get(&self, basis: Basis) -> &Counts {
        match basis {
            Basis::Z => &self.z,
            Basis::X => &self.x,
            Basis::Y => &self.y,
        }
    }

    /// Iterate over `(basis, counts)` in the order Z, X, Y.
    pub fn iter(&self) -> impl Iterator<Item = (Basis, &Counts)> + '_ {
        Basis::ALL.into_iter().map(|b| (b, self.get(b)))
    }

    /// Estimate ⟨σ ⊗ ... ⊗ σ⟩ on `qubits`, with σ the Pauli operator of
    /// `basis`, from the parity of the corresponding bits in each outcome.
    pub fn expectation(&self, basis: Basis, qubits: &[usize]) -> Result<f64> {
        let counts = self.get(basis);
        let total = counts.total();
        if total == 0 {
            return Err(Error::unavailable("no counts recorded"));
        }
        let mut acc: i128 = 0;
        for (bits, c) in counts.iter() {
            let width = bits.len();
            let mut parity = false;
            for &q in qubits.iter() {
                if q >= width {
                    return Err(Error::shape(format!(
                        "qubit {} out of range for {}-bit outcomes", q, width)));
                }
                // qubit 0 is the rightmost character
                parity ^= bits.as_bytes()[width - 1 - q] == b'1';
            }
            acc += if parity { -(c as i128) } else { c as i128 };
        }
        Ok(acc as f64 / total as f64)
    }
}

impl fmt::Display for Tomography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (basis, counts)) in self.iter().enumerate() {
            if i > 0 { writeln!(f)?; }
            write!(f, "{}: {}", basis, counts)?;
        }
        Ok(())
    }
}

/// Counts in the Z, X, and Y bases.
pub fn full_tomography(circuit: &Circuit, shots: u64) -> Result<Tomography> {
    let tomo = Tomography {
        z: measurement_distribution(circuit, Basis::Z, shots)?,
        x: measurement_distribution(circuit, Basis::X, shots)?,
        y: measurement_distribution(circuit, Basis::Y, shots)?,
    };
    debug!(qubits = circuit.num_qubits(), shots, "tomography");
    Ok(tomo)
}

/// Either representation of a quantum state.
#[derive(Clone, Debug, PartialEq)]
pub enum QuantumState {
    Pure(StateVector),
    Mixed(DensityMatrix),
}

impl From<StateVector> for QuantumState {
    fn from(state: StateVector) -> Self { Self::Pure(state) }
}

impl From<DensityMatrix> for QuantumState {
    fn from(rho: DensityMatrix) -> Self { Self::Mixed(rho) }
}

impl QuantumState {
    /// Dimension of the Hilbert space.
    pub fn dim(&self) -> usize {
        match self {
            Self::Pure(psi) => psi.dim(),
            Self::Mixed(rho) => rho.dim(),
        }
    }
}

/// Uhlmann fidelity between two states.
///
/// - pure–pure: |⟨*a*∣*b*⟩|<sup>2</sup>
/// - pure–mixed: ⟨ψ∣ρ∣ψ⟩
/// - mixed–mixed: (Tr √(√ρ σ √ρ))<sup>2</sup>
///
/// The result is clamped to [0, 1]. Fails with a shape error on a dimension
/// mismatch.
pub fn fidelity(a: &QuantumState, b: &QuantumState) -> Result<f64> {
    use QuantumState::*;
    if a.dim() != b.dim() {
        return Err(Error::shape(format!(
            "fidelity between states of dimension {} and {}", a.dim(), b.dim())));
    }
    let f = match (a, b) {
        (Pure(x), Pure(y)) => x.inner(y)?.norm_sqr(),
        (Pure(psi), Mixed(rho)) | (Mixed(rho), Pure(psi)) => {
            let amps = psi.amplitudes();
            amps.dotc(&(rho.matrix() * amps)).re
        },
        (Mixed(rho), Mixed(sigma)) => {
            let sqrt_rho = density::sqrtm_psd(rho.matrix())?;
            let inner = &sqrt_rho * sigma.matrix() * &sqrt_rho;
            let root = density::sqrtm_psd(&inner)?;
            root.trace().re.powi(2)
        },
    };
    if !f.is_finite() {
        return Err(Error::unavailable("fidelity is not finite"));
    }
    Ok(f.clamp(0.0, 1.0))
}
