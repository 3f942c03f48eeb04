//! Fixed-topology error-correcting encodings and theoretical logical error
//! rates.
//!
//! Both encodings here are small illustrative circuits. The five-qubit
//! encoding in particular is a teaching approximation: it is not the
//! five-qubit perfect code and comes with no correction guarantee.

use std::{ fmt, str::FromStr };
use tracing::debug;
use crate::{
    circuit::Circuit,
    counts::{ self, Counts },
    error::{ Error, Result },
    gate::Gate,
    state::bitstring,
};

/// Supported encodings.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCodeKind {
    /// Three-qubit repetition code against bit flips.
    BitFlip,
    /// Simplified five-qubit encoding.
    FiveQubitToy,
}

impl ErrorCodeKind {
    /// Return `true` for encodings that only illustrate the structure of a
    /// code and make no correction guarantee.
    pub fn is_teaching_approximation(&self) -> bool {
        matches!(self, Self::FiveQubitToy)
    }

    /// Number of physical qubits used by the encoding.
    pub fn num_qubits(&self) -> usize {
        match self {
            Self::BitFlip => 3,
            Self::FiveQubitToy => 5,
        }
    }
}

impl fmt::Display for ErrorCodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BitFlip => write!(f, "bit_flip"),
            Self::FiveQubitToy => write!(f, "five_qubit_toy"),
        }
    }
}

impl FromStr for ErrorCodeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "bit_flip" => Ok(Self::BitFlip),
            "five_qubit_toy" => Ok(Self::FiveQubitToy),
            other => Err(Error::config(format!("unknown error code `{}`", other))),
        }
    }
}

/// An encoded logical bit.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorCode {
    pub kind: ErrorCodeKind,
    pub logical_bit: u8,
    pub circuit: Circuit,
}

impl ErrorCode {
    /// Build the encoding circuit of `kind` for `logical_bit`.
    pub fn new(kind: ErrorCodeKind, logical_bit: u8) -> Result<Self> {
        let circuit = match kind {
            ErrorCodeKind::BitFlip => build_bit_flip_code(logical_bit)?,
            ErrorCodeKind::FiveQubitToy => build_five_qubit_toy_code(logical_bit)?,
        };
        Ok(Self { kind, logical_bit, circuit })
    }

    /// Return `true` if a read-out bitstring signals an error.
    pub fn decode(&self, bits: &str) -> bool { decode_syndrome(bits) }

    /// Estimate the logical error rate of this encoding under `model`.
    pub fn logical_error_rate(&self, p_error: f64, shots: u64, model: CountModel)
        -> Result<f64>
    {
        estimate_logical_error_rate_with(&self.circuit, p_error, shots, model)
    }
}

fn check_logical_bit(logical_bit: u8) -> Result<()> {
    if logical_bit > 1 {
        Err(Error::config(format!(
            "logical bit must be 0 or 1, got {}", logical_bit)))
    } else {
        Ok(())
    }
}

/// Three-qubit bit-flip code.
///
/// Qubit 0 carries the logical bit and is copied onto qubits 1 and 2; a second
/// pair of CNOTs then maps the ancillas back to the syndrome, which is read
/// out as qubit 1 → clbit 0, qubit 2 → clbit 1.
pub fn build_bit_flip_code(logical_bit: u8) -> Result<Circuit> {
    check_logical_bit(logical_bit)?;
    let mut circuit = Circuit::new(3, 2)?;
    if logical_bit == 1 { circuit.gate(Gate::X(0))?; }
    circuit
        .gate(Gate::CX(0, 1))?
        .gate(Gate::CX(0, 2))?
        .gate(Gate::CX(0, 1))?
        .gate(Gate::CX(0, 2))?
        .measure(1, 0)?
        .measure(2, 1)?;
    Ok(circuit)
}

/// Simplified five-qubit encoding with four syndrome bits, qubit *k* read out
/// into clbit *k* − 1.
pub fn build_five_qubit_toy_code(logical_bit: u8) -> Result<Circuit> {
    check_logical_bit(logical_bit)?;
    let mut circuit = Circuit::new(5, 4)?;
    if logical_bit == 1 { circuit.gate(Gate::X(0))?; }
    for k in 1..5 { circuit.gate(Gate::H(k))?; }
    for k in 1..5 { circuit.gate(Gate::CX(0, k))?; }
    for k in 0..5 { circuit.gate(Gate::H(k))?; }
    for k in 1..5 { circuit.measure(k, k - 1)?; }
    Ok(circuit)
}

/// Return `true` if the two rightmost bits of `bits` are not both `'0'`.
///
/// Bitstrings shorter than two characters report no error.
pub fn decode_syndrome(bits: &str) -> bool {
    let n = bits.len();
    n >= 2 && bits.get(n - 2..).is_some_and(|tail| tail != "00")
}

/// Theoretical model generating the counts from which a logical error rate is
/// estimated.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CountModel {
    /// Fixed placeholder distribution over every basis state of the circuit's
    /// `n` qubits: basis state *i* receives ⌊shots / 2<sup>n</sup>⌋ + (*i* mod
    /// 10) counts, independently of the error probability.
    #[default]
    Structural,
    /// Exact distribution of the circuit's classical register after every
    /// measured bit is independently flipped with the error probability,
    /// rounded to `shots` counts.
    ReadoutFlips,
}

impl CountModel {
    /// Generate the model's counts for `circuit`.
    pub fn counts(self, circuit: &Circuit, p_error: f64, shots: u64)
        -> Result<Counts>
    {
        check_params(p_error, shots)?;
        match self {
            Self::Structural => {
                let n = circuit.num_qubits();
                let base = shots >> n.min(63);
                Ok(
                    (0..counts::register_dim(n)?)
                        .map(|i| (bitstring(i, n), base + (i % 10) as u64))
                        .collect()
                )
            },
            Self::ReadoutFlips => {
                let ideal = circuit.clbit_probabilities()?;
                let width = circuit.register_width();
                let noisy = flip_bits(&ideal, width, p_error);
                Counts::from_probabilities(&noisy, width, shots)
            },
        }
    }
}

// push a register distribution through independent bit flips with probability p
fn flip_bits(probs: &[f64], width: usize, p: f64) -> Vec<f64> {
    let mut cur = probs.to_vec();
    for b in 0..width {
        let pw: usize = 1 << b;
        for i0 in (0..cur.len()).filter(|i| i & pw == 0) {
            let i1 = i0 | pw;
            let (a0, a1) = (cur[i0], cur[i1]);
            cur[i0] = (1.0 - p) * a0 + p * a1;
            cur[i1] = p * a0 + (1.0 - p) * a1;
        }
    }
    cur
}

fn check_params(p_error: f64, shots: u64) -> Result<()> {
    if !(0.0..=1.0).contains(&p_error) {
        return Err(Error::precondition(format!(
            "error probability must be in [0, 1], got {}", p_error)));
    }
    if shots == 0 {
        return Err(Error::precondition("shots must be positive"));
    }
    Ok(())
}

/// Estimate the logical error rate of an encoded circuit under the default
/// [`CountModel::Structural`] model.
pub fn estimate_logical_error_rate(circuit: &Circuit, p_error: f64, shots: u64)
    -> Result<f64>
{
    estimate_logical_error_rate_with(circuit, p_error, shots, CountModel::default())
}

/// Estimate the logical error rate of an encoded circuit as the share of
/// model counts whose bitstring [decodes][decode_syndrome] as an error.
pub fn estimate_logical_error_rate_with(
    circuit: &Circuit,
    p_error: f64,
    shots: u64,
    model: CountModel,
) -> Result<f64>
{
    let counts = model.counts(circuit, p_error, shots)?;
    let total = counts.total();
    if total == 0 {
        return Err(Error::unavailable("model produced no counts"));
    }
    let errors: u64
        = counts.iter()
        .filter(|(bits, _)| decode_syndrome(bits))
        .map(|(_, c)| c)
        .sum();
    let rate = errors as f64 / total as f64;
    debug!(?model, p_error, shots, errors, total, rate, "logical error rate");
    Ok(rate)
}
