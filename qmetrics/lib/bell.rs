//! Preparation and verification of the four Bell states.
//!
//! ```text
//! ∣Φ+⟩ = (∣00⟩ + ∣11⟩) / √2    H(0), CX(0, 1)
//! ∣Φ−⟩ = (∣00⟩ − ∣11⟩) / √2    H(0), CX(0, 1), Z(0)
//! ∣Ψ+⟩ = (∣01⟩ + ∣10⟩) / √2    H(0), CX(0, 1), X(1)
//! ∣Ψ−⟩ = (∣01⟩ − ∣10⟩) / √2    H(0), CX(0, 1), X(1), Z(0)
//! ```

use std::{ fmt, str::FromStr };
use crate::{
    circuit::{ Circuit, Op },
    density::DensityMatrix,
    entanglement,
    error::{ Error, MetricResult, Result },
    gate::Gate,
    state::StateVector,
    tol,
};

/// Label for one of the four Bell states.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BellKind {
    PhiPlus,
    PhiMinus,
    PsiPlus,
    PsiMinus,
}

impl BellKind {
    pub const ALL: [Self; 4]
        = [Self::PhiPlus, Self::PhiMinus, Self::PsiPlus, Self::PsiMinus];

    fn gates(self) -> Vec<Gate> {
        let mut gates = vec![Gate::H(0), Gate::CX(0, 1)];
        match self {
            Self::PhiPlus => { },
            Self::PhiMinus => { gates.push(Gate::Z(0)); },
            Self::PsiPlus => { gates.push(Gate::X(1)); },
            Self::PsiMinus => { gates.push(Gate::X(1)); gates.push(Gate::Z(0)); },
        }
        gates
    }
}

impl fmt::Display for BellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PhiPlus => write!(f, "phi_plus"),
            Self::PhiMinus => write!(f, "phi_minus"),
            Self::PsiPlus => write!(f, "psi_plus"),
            Self::PsiMinus => write!(f, "psi_minus"),
        }
    }
}

impl FromStr for BellKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "phi_plus" => Ok(Self::PhiPlus),
            "phi_minus" => Ok(Self::PhiMinus),
            "psi_plus" => Ok(Self::PsiPlus),
            "psi_minus" => Ok(Self::PsiMinus),
            other => Err(Error::config(format!("unknown Bell state `{}`", other))),
        }
    }
}

/// Build the two-qubit circuit preparing a Bell state from ∣00⟩.
pub fn create_bell_variant(kind: BellKind) -> Circuit {
    Circuit {
        n: 2,
        m: 0,
        ops: kind.gates().into_iter().map(Op::Gate).collect(),
    }
}

/// Entanglement measures of a two-qubit circuit's output state.
///
/// `None` marks a measure that could not be computed.
#[derive(Clone, Debug, PartialEq)]
pub struct BellReport {
    pub state: StateVector,
    pub concurrence: Option<f64>,
    /// Negativity with respect to qubit 0.
    pub negativity: Option<f64>,
    /// Von Neumann entropy of the full two-qubit state.
    pub entropy: Option<f64>,
    /// Von Neumann entropy of qubit 0's reduced state.
    pub reduced_entropy: Option<f64>,
    pub is_maximally_entangled: bool,
}

fn fmt_metric(x: Option<f64>) -> String {
    x.map(|x| format!("{:.6}", x)).unwrap_or_else(|| "N/A".to_string())
}

impl fmt::Display for BellReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "C = {}, N = {}, S = {}, S_0 = {}, maximal = {}",
            fmt_metric(self.concurrence),
            fmt_metric(self.negativity),
            fmt_metric(self.entropy),
            fmt_metric(self.reduced_entropy),
            self.is_maximally_entangled,
        )
    }
}

/// Compute the entanglement measures of a circuit's final state.
///
/// Fails with a shape error unless the circuit acts on exactly two qubits.
pub fn verify(circuit: &Circuit) -> Result<BellReport> {
    if circuit.num_qubits() != 2 {
        return Err(Error::shape(format!(
            "Bell verification requires 2 qubits, got {}", circuit.num_qubits())));
    }
    let state = circuit.state()?;
    let rho = DensityMatrix::from_state(&state)?;
    let concurrence = entanglement::concurrence(&rho).available()?;
    let negativity = entanglement::negativity(&rho, &[0]).available()?;
    let entropy = entanglement::von_neumann_entropy(&rho).available()?;
    let reduced_entropy
        = entanglement::subsystem_entropy(&rho, &[0]).available()?;
    let is_maximally_entangled
        = concurrence.is_some_and(|c| c > tol::MAX_ENTANGLED);
    Ok(BellReport {
        state,
        concurrence,
        negativity,
        entropy,
        reduced_entropy,
        is_maximally_entangled,
    })
}

/// Side-by-side reports of two circuits with the absolute difference of each
/// measure, or `None` where either side is unavailable.
#[derive(Clone, Debug, PartialEq)]
pub struct BellComparison {
    pub a: BellReport,
    pub b: BellReport,
    pub concurrence_diff: Option<f64>,
    pub negativity_diff: Option<f64>,
    pub entropy_diff: Option<f64>,
    pub reduced_entropy_diff: Option<f64>,
}

fn abs_diff(x: Option<f64>, y: Option<f64>) -> Option<f64> {
    x.zip(y).map(|(x, y)| (x - y).abs())
}

/// Verify two circuits and compare their measures.
pub fn compare(circuit_a: &Circuit, circuit_b: &Circuit)
    -> Result<BellComparison>
{
    let a = verify(circuit_a)?;
    let b = verify(circuit_b)?;
    Ok(BellComparison {
        concurrence_diff: abs_diff(a.concurrence, b.concurrence),
        negativity_diff: abs_diff(a.negativity, b.negativity),
        entropy_diff: abs_diff(a.entropy, b.entropy),
        reduced_entropy_diff: abs_diff(a.reduced_entropy, b.reduced_entropy),
        a,
        b,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_1_SQRT_2;

    #[test]
    fn parse_kinds() {
        for kind in BellKind::ALL {
            assert_eq!(kind.to_string().parse::<BellKind>(), Ok(kind));
        }
        assert!(matches!("phi".parse::<BellKind>(), Err(Error::Configuration(_))));
    }

    #[test]
    fn variant_amplitudes() {
        let s = FRAC_1_SQRT_2;
        let expected: [(BellKind, [f64; 4]); 4] = [
            (BellKind::PhiPlus,  [s, 0.0, 0.0,  s]),
            (BellKind::PhiMinus, [s, 0.0, 0.0, -s]),
            (BellKind::PsiPlus,  [0.0, s,  s, 0.0]),
            (BellKind::PsiMinus, [0.0, -s, s, 0.0]),
        ];
        for (kind, amps) in expected {
            let state = create_bell_variant(kind).state().unwrap();
            for (a, e) in state.amplitudes().iter().zip(amps) {
                assert_abs_diff_eq!(a.re, e, epsilon = 1e-12);
                assert_abs_diff_eq!(a.im, 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn all_variants_maximal() {
        for kind in BellKind::ALL {
            let report = verify(&create_bell_variant(kind)).unwrap();
            assert!(report.is_maximally_entangled, "{}", kind);
            assert_abs_diff_eq!(report.negativity.unwrap(), 0.25, epsilon = 1e-9);
            assert_abs_diff_eq!(report.entropy.unwrap(), 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!(report.reduced_entropy.unwrap(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn product_not_maximal() {
        let circuit = Circuit::from_gates(2, &[Gate::H(0), Gate::H(1)]).unwrap();
        let report = verify(&circuit).unwrap();
        assert!(!report.is_maximally_entangled);
        assert_abs_diff_eq!(report.concurrence.unwrap(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn wrong_size() {
        let circuit = Circuit::from_gates(3, &[Gate::H(0)]).unwrap();
        assert!(matches!(verify(&circuit), Err(Error::Shape(_))));
    }

    #[test]
    fn comparison() {
        let bell = create_bell_variant(BellKind::PsiMinus);
        let prod = Circuit::from_gates(2, &[Gate::X(0)]).unwrap();
        let cmp = compare(&bell, &prod).unwrap();
        assert_abs_diff_eq!(cmp.concurrence_diff.unwrap(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cmp.negativity_diff.unwrap(), 0.25, epsilon = 1e-9);
        assert_abs_diff_eq!(cmp.entropy_diff.unwrap(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cmp.reduced_entropy_diff.unwrap(), 1.0, epsilon = 1e-6);
        assert!(cmp.a.is_maximally_entangled);
        assert!(!cmp.b.is_maximally_entangled);
    }

    #[test]
    fn missing_metric_gives_no_diff() {
        assert_eq!(abs_diff(Some(1.0), None), None);
        assert_eq!(abs_diff(Some(1.0), Some(0.25)), Some(0.75));
    }
}
