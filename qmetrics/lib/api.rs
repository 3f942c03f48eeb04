//! Entry points for callers working with plain descriptors: gate lists,
//! partitions, counts, and calibration matrices.
//!
//! Everything here is re-exported at the crate root.

use std::{ fmt, str::FromStr };
use nalgebra as na;
use num_complex::Complex64 as C64;
use crate::{
    circuit::Circuit,
    code::{ ErrorCode, ErrorCodeKind },
    counts::Counts,
    density::DensityMatrix,
    entanglement::{ self, GeometricConfig },
    error::{ Error, MetricResult, Result },
    gate::Gate,
    mitigation::{ self, Calibration, Mitigation, MitigationReport },
    state::StateVector,
    tomography::{ self as tomo, QuantumState, Tomography },
};

/// Apply a gate sequence to ∣0...0⟩ on `n` qubits.
pub fn encode_state(gates: &[Gate], n: usize) -> Result<StateVector> {
    StateVector::from_gates(gates, n)
}

/// Entanglement measures available through [`compute_entanglement`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Measure {
    Concurrence,
    Negativity,
    Entropy,
    MutualInfo,
    Geometric,
}

impl Measure {
    pub const ALL: [Self; 5] = [
        Self::Concurrence,
        Self::Negativity,
        Self::Entropy,
        Self::MutualInfo,
        Self::Geometric,
    ];
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concurrence => write!(f, "concurrence"),
            Self::Negativity => write!(f, "negativity"),
            Self::Entropy => write!(f, "entropy"),
            Self::MutualInfo => write!(f, "mutual_info"),
            Self::Geometric => write!(f, "geometric"),
        }
    }
}

impl FromStr for Measure {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "concurrence" => Ok(Self::Concurrence),
            "negativity" => Ok(Self::Negativity),
            "entropy" => Ok(Self::Entropy),
            "mutual_info" => Ok(Self::MutualInfo),
            "geometric" => Ok(Self::Geometric),
            other => Err(Error::config(format!("unknown measure `{}`", other))),
        }
    }
}

/// Compute an entanglement measure with the default [`GeometricConfig`].
///
/// See [`compute_entanglement_with`].
pub fn compute_entanglement(
    state: &QuantumState,
    measure: Measure,
    partition: Option<&[usize]>,
) -> Result<Option<f64>>
{
    compute_entanglement_with(state, measure, partition, &GeometricConfig::default())
}

/// Compute an entanglement measure of a pure or mixed state, returning
/// `Ok(None)` if the measure is numerically unavailable.
///
/// The meaning of `partition` depends on the measure:
/// - negativity: the transposed subsystem, defaulting to qubit 0
/// - entropy: if given, the entropy of the reduced state on the partition
/// - mutual information: subsystem *A*, with *B* its complement; required
/// - concurrence and geometric measure: ignored
///
/// The geometric measure of a density matrix is computed from its principal
/// eigenvector if it is pure, and is unavailable otherwise.
pub fn compute_entanglement_with(
    state: &QuantumState,
    measure: Measure,
    partition: Option<&[usize]>,
    config: &GeometricConfig,
) -> Result<Option<f64>>
{
    let value = match measure {
        Measure::Geometric => match state {
            QuantumState::Pure(psi) => entanglement::geometric_measure(psi, config),
            QuantumState::Mixed(rho) => {
                rho.to_pure_state()
                    .and_then(|psi| entanglement::geometric_measure(&psi, config))
            },
        },
        Measure::Concurrence => with_density(state, entanglement::concurrence),
        Measure::Negativity => with_density(state, |rho| {
            entanglement::negativity(rho, partition.unwrap_or(&[0]))
        }),
        Measure::Entropy => match partition {
            Some(part) => with_density(state, |rho| {
                entanglement::subsystem_entropy(rho, part)
            }),
            None => with_density(state, entanglement::von_neumann_entropy),
        },
        Measure::MutualInfo => {
            let part_a = partition.ok_or_else(|| {
                Error::config("mutual information requires a partition")
            })?;
            with_density(state, |rho| {
                let part_b: Vec<usize>
                    = (0..rho.num_qubits())
                    .filter(|q| !part_a.contains(q))
                    .collect();
                entanglement::mutual_information(rho, part_a, &part_b)
            })
        },
    };
    value.available()
}

fn with_density<F>(state: &QuantumState, f: F) -> Result<f64>
where F: FnOnce(&DensityMatrix) -> Result<f64>
{
    match state {
        QuantumState::Pure(psi) => f(&DensityMatrix::from_state(psi)?),
        QuantumState::Mixed(rho) => f(rho),
    }
}

/// Build an encoding circuit.
pub fn build_error_code(kind: ErrorCodeKind, logical_bit: u8) -> Result<ErrorCode> {
    ErrorCode::new(kind, logical_bit)
}

/// Apply the default measurement-error mitigation.
pub fn mitigate(counts: &Counts, calibration: &Calibration) -> Result<Counts> {
    mitigation::apply_mitigation(counts, calibration)
}

/// Read out a circuit's exact counts and mitigate them with the default
/// strategy against the placeholder calibration of its register.
pub fn mitigate_circuit(circuit: &Circuit, shots: u64) -> Result<MitigationReport> {
    mitigation::mitigate_circuit_with(circuit, shots, Mitigation::default())
}

/// Expectation value of a witness operator in a circuit's final state.
pub fn measure_witness(circuit: &Circuit, witness: &na::DMatrix<C64>) -> Result<f64> {
    entanglement::witness_expectation(&circuit.state()?, witness)
}

/// Counts of a circuit's output in the Z, X, and Y bases.
pub fn tomography(circuit: &Circuit, shots: u64) -> Result<Tomography> {
    tomo::full_tomography(circuit, shots)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use crate::{ code::decode_syndrome, mitigation::build_calibration_matrix };

    fn bell() -> QuantumState {
        encode_state(&[Gate::H(0), Gate::CX(0, 1)], 2).unwrap().into()
    }

    #[test]
    fn bell_scenario() {
        let c = compute_entanglement(&bell(), Measure::Concurrence, None)
            .unwrap().unwrap();
        assert_abs_diff_eq!(c, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn hadamard_tomography_scenario() {
        let circuit = Circuit::from_gates(1, &[Gate::H(0)]).unwrap();
        let tomo = tomography(&circuit, 1024).unwrap();
        let expected: Counts = [("0", 512), ("1", 512)].into_iter().collect();
        assert_eq!(tomo.z, expected);
    }

    #[test]
    fn measures_by_name() {
        for m in Measure::ALL {
            assert_eq!(m.to_string().parse::<Measure>(), Ok(m));
        }
        assert!(matches!("discord".parse::<Measure>(), Err(Error::Configuration(_))));
    }

    #[test]
    fn partition_semantics() {
        let ghz: QuantumState = encode_state(
            &[Gate::H(0), Gate::CX(0, 1), Gate::CX(1, 2)], 3).unwrap().into();
        let neg = compute_entanglement(&ghz, Measure::Negativity, None)
            .unwrap().unwrap();
        assert_abs_diff_eq!(neg, 0.25, epsilon = 1e-9);
        let s = compute_entanglement(&ghz, Measure::Entropy, None).unwrap().unwrap();
        assert_abs_diff_eq!(s, 0.0, epsilon = 1e-9);
        let s1 = compute_entanglement(&ghz, Measure::Entropy, Some(&[1][..]))
            .unwrap().unwrap();
        assert_abs_diff_eq!(s1, 1.0, epsilon = 1e-6);
        // I(A : B) = 2 S(A) for a pure state
        let mi = compute_entanglement(&ghz, Measure::MutualInfo, Some(&[0][..]))
            .unwrap().unwrap();
        assert_abs_diff_eq!(mi, 2.0, epsilon = 1e-6);
        assert!(matches!(
            compute_entanglement(&ghz, Measure::MutualInfo, None),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            compute_entanglement(&ghz, Measure::Concurrence, None),
            Err(Error::Shape(_))
        ));
    }

    #[test]
    fn geometric_from_density() {
        let expected = (2.0 - 2.0_f64.sqrt()).sqrt();
        let pure = compute_entanglement(&bell(), Measure::Geometric, None)
            .unwrap().unwrap();
        assert_abs_diff_eq!(pure, expected, epsilon = 1e-9);

        let QuantumState::Pure(psi) = bell() else { unreachable!() };
        let rho: QuantumState = DensityMatrix::from_state(&psi).unwrap().into();
        let from_rho = compute_entanglement(&rho, Measure::Geometric, None)
            .unwrap().unwrap();
        assert_abs_diff_eq!(from_rho, expected, epsilon = 1e-6);

        let mixed: QuantumState = DensityMatrix::new(
            nalgebra::DMatrix::identity(4, 4) / num_complex::Complex64::from(4.0))
            .unwrap().into();
        assert_eq!(compute_entanglement(&mixed, Measure::Geometric, None), Ok(None));
    }

    #[test]
    fn witness_on_bell_circuit() {
        let circuit = Circuit::from_gates(2, &[Gate::H(0), Gate::CX(0, 1)]).unwrap();
        let proj = DensityMatrix::from_state(&circuit.state().unwrap())
            .unwrap()
            .into_matrix();
        let witness: na::DMatrix<C64>
            = na::DMatrix::identity(4, 4) * C64::from(0.5) - proj;
        assert_abs_diff_eq!(
            measure_witness(&circuit, &witness).unwrap(), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn circuit_mitigation() {
        let code = build_error_code(ErrorCodeKind::BitFlip, 1).unwrap();
        let report = mitigate_circuit(&code.circuit, 1024).unwrap();
        assert_eq!(report.calibration.width(), 2);
        assert_eq!(report.original.get("00"), 1024);
        assert_eq!(report.mitigated.get("00"), 972);
    }

    #[test]
    fn error_code_and_mitigation() {
        let code = build_error_code(ErrorCodeKind::BitFlip, 0).unwrap();
        assert!(!code.decode("00"));
        assert!(decode_syndrome("01"));
        let cal = build_calibration_matrix(2).unwrap();
        let counts: Counts = [("00", 1), ("01", 3), ("11", 1000)].into_iter().collect();
        let out = mitigate(&counts, &cal).unwrap();
        assert!(out.iter().all(|(_, c)| c >= 1));
        assert_eq!(out.get("11"), 950);
    }
}
