//! Gate sequences over a fixed register of qubits and classical bits.
//!
//! Measurements are terminal: once a qubit has been measured, no further gate
//! may act on it. This keeps every circuit equivalent to a single unitary
//! followed by a Z-basis readout, which is all the theoretical count models in
//! this crate require.

use std::{ fmt, str::FromStr };
use crate::{
    error::{ Error, Result },
    counts,
    gate::Gate,
    state::{ self, StateVector },
};

/// Largest classical register a circuit may carry.
pub const MAX_CLBITS: usize = state::MAX_QUBITS;

/// A single circuit operation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Op {
    /// Apply a unitary gate.
    Gate(Gate),
    /// Measure a qubit (first index) into a classical bit (second index).
    Measure(usize, usize),
}

impl From<Gate> for Op {
    fn from(gate: Gate) -> Self { Self::Gate(gate) }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gate(g) => g.fmt(f),
            Self::Measure(q, c) => write!(f, "measure {} {}", q, c),
        }
    }
}

impl FromStr for Op {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut toks = s.split_whitespace();
        match toks.next() {
            Some(name) if name.eq_ignore_ascii_case("measure") => {
                let idx: Vec<usize>
                    = toks.map(|t| {
                        t.parse::<usize>()
                            .map_err(|_| Error::config(format!(
                                "measure: invalid index `{}`", t)))
                    })
                    .collect::<Result<_>>()?;
                match idx[..] {
                    [q, c] => Ok(Self::Measure(q, c)),
                    _ => Err(Error::config(
                        "measure: expected a qubit and a classical bit")),
                }
            },
            _ => s.parse::<Gate>().map(Self::Gate),
        }
    }
}

/// An ordered list of operations on `n` qubits and `m` classical bits.
#[derive(Clone, Debug, PartialEq)]
pub struct Circuit {
    pub(crate) n: usize,
    pub(crate) m: usize,
    pub(crate) ops: Vec<Op>,
}

impl Circuit {
    /// Create a new, empty circuit for `n` qubits and `m` classical bits.
    ///
    /// Fails with a shape error if `n` exceeds [`state::MAX_QUBITS`] or `m`
    /// exceeds [`MAX_CLBITS`].
    pub fn new(n: usize, m: usize) -> Result<Self> {
        if n > state::MAX_QUBITS {
            return Err(Error::shape(format!(
                "{} qubits exceeds the limit of {}", n, state::MAX_QUBITS)));
        }
        if m > MAX_CLBITS {
            return Err(Error::shape(format!(
                "{} clbits exceeds the limit of {}", m, MAX_CLBITS)));
        }
        Ok(Self { n, m, ops: Vec::new() })
    }

    /// Convert a series of operations to a new circuit, verifying that all
    /// indices are in range, that two-qubit gates act on distinct qubits, and
    /// that no gate follows a measurement of one of its qubits.
    pub fn from_ops<I>(n: usize, m: usize, ops: I) -> Result<Self>
    where I: IntoIterator<Item = Op>
    {
        let mut circuit = Self::new(n, m)?;
        ops.into_iter().try_for_each(|op| circuit.push(op).map(|_| ()))?;
        Ok(circuit)
    }

    /// Like [`Self::from_ops`], but taking only unitary gates and no classical
    /// bits.
    pub fn from_gates<'a, I>(n: usize, gates: I) -> Result<Self>
    where I: IntoIterator<Item = &'a Gate>
    {
        Self::from_ops(n, 0, gates.into_iter().copied().map(Op::Gate))
    }

    /// Parse one operation per descriptor (see [`Gate`] and `"measure q c"`).
    pub fn from_descriptors<'a, I>(n: usize, m: usize, lines: I)
        -> Result<Self>
    where I: IntoIterator<Item = &'a str>
    {
        let ops: Vec<Op>
            = lines.into_iter()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::parse)
            .collect::<Result<_>>()?;
        Self::from_ops(n, m, ops)
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize { self.n }

    /// Number of classical bits.
    pub fn num_clbits(&self) -> usize { self.m }

    /// All operations, in order.
    pub fn ops(&self) -> &[Op] { &self.ops }

    pub fn len(&self) -> usize { self.ops.len() }

    pub fn is_empty(&self) -> bool { self.ops.is_empty() }

    /// Iterate over the unitary part of the circuit.
    pub fn gates(&self) -> impl Iterator<Item = &Gate> + '_ {
        self.ops.iter()
            .filter_map(|op| match op {
                Op::Gate(g) => Some(g),
                Op::Measure(..) => None,
            })
    }

    /// Iterate over `(qubit, clbit)` pairs of all measurements.
    pub fn measurements(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.ops.iter()
            .filter_map(|op| match *op {
                Op::Measure(q, c) => Some((q, c)),
                Op::Gate(_) => None,
            })
    }

    fn is_measured(&self, k: usize) -> bool {
        self.measurements().any(|(q, _)| q == k)
    }

    /// Append an operation after validating it against the circuit.
    pub fn push(&mut self, op: Op) -> Result<&mut Self> {
        match op {
            Op::Gate(g) => {
                g.validate(self.n)?;
                if let Some(k) = (0..self.n).find(|&k| g.acts_on(k) && self.is_measured(k)) {
                    return Err(Error::config(format!(
                        "gate `{}` acts on qubit {} after its measurement", g, k)));
                }
            },
            Op::Measure(q, c) => {
                if q >= self.n {
                    return Err(Error::config(format!(
                        "measure: qubit {} out of range for {} qubits", q, self.n)));
                }
                if c >= self.m {
                    return Err(Error::config(format!(
                        "measure: clbit {} out of range for {} clbits", c, self.m)));
                }
                if self.measurements().any(|(_, c0)| c0 == c) {
                    return Err(Error::config(format!(
                        "measure: clbit {} written twice", c)));
                }
            },
        }
        self.ops.push(op);
        Ok(self)
    }

    /// Append a gate.
    pub fn gate(&mut self, gate: Gate) -> Result<&mut Self> {
        self.push(Op::Gate(gate))
    }

    /// Append a measurement of qubit `q` into classical bit `c`.
    pub fn measure(&mut self, q: usize, c: usize) -> Result<&mut Self> {
        self.push(Op::Measure(q, c))
    }

    /// Compute the final state of the unitary part of the circuit, starting
    /// from ∣0...0⟩.
    pub fn state(&self) -> Result<StateVector> {
        StateVector::from_gates(self.gates(), self.n)
    }

    /// Compute the theoretical probability of every classical-register value,
    /// indexed by the value of the register (clbit 0 least significant).
    ///
    /// If the circuit contains no measurements, every qubit is read out into a
    /// register of the same width instead.
    pub fn clbit_probabilities(&self) -> Result<Vec<f64>> {
        let probs = self.state()?.probabilities();
        let meas: Vec<(usize, usize)> = self.measurements().collect();
        if meas.is_empty() { return Ok(probs); }
        let mut acc: Vec<f64> = vec![0.0; counts::register_dim(self.m)?];
        for (idx, p) in probs.into_iter().enumerate() {
            let reg: usize
                = meas.iter()
                .filter(|(q, _)| idx >> q & 1 == 1)
                .fold(0, |reg, (_, c)| reg | 1 << c);
            acc[reg] += p;
        }
        Ok(acc)
    }

    /// Width of the register reported by [`Self::clbit_probabilities`].
    pub fn register_width(&self) -> usize {
        if self.measurements().next().is_some() { self.m } else { self.n }
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "circuit({} qubits, {} clbits)", self.n, self.m)?;
        for op in self.ops.iter() {
            write!(f, "; {}", op)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn build_and_validate() {
        let mut c = Circuit::new(2, 1).unwrap();
        c.gate(Gate::H(0)).unwrap()
            .gate(Gate::CX(0, 1)).unwrap()
            .measure(1, 0).unwrap();
        assert_eq!(c.len(), 3);
        assert_eq!(c.gates().count(), 2);
        assert!(c.gate(Gate::X(1)).is_err()); // after measurement
        assert!(c.gate(Gate::X(0)).is_ok());
        assert!(c.measure(0, 0).is_err()); // clbit reused
        assert!(c.measure(0, 1).is_err()); // clbit out of range
    }

    #[test]
    fn descriptors() {
        let c = Circuit::from_descriptors(3, 2, ["h 0", "cx 0 1", "", "measure 1 0"])
            .unwrap();
        assert_eq!(c.ops()[2], Op::Measure(1, 0));
        assert!(Circuit::from_descriptors(2, 0, ["toffoli 0 1 2"]).is_err());
        assert!(Circuit::from_descriptors(2, 1, ["measure 0"]).is_err());
    }

    #[test]
    fn register_marginal() {
        // ∣Φ+⟩ with only qubit 1 read out into clbit 0
        let c = Circuit::from_descriptors(2, 1, ["h 0", "cx 0 1", "measure 1 0"])
            .unwrap();
        let p = c.clbit_probabilities().unwrap();
        assert_eq!(p.len(), 2);
        assert_abs_diff_eq!(p[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(p[1], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn register_defaults_to_all_qubits() {
        let c = Circuit::from_gates(2, &[Gate::X(1)]).unwrap();
        assert_eq!(c.register_width(), 2);
        let p = c.clbit_probabilities().unwrap();
        assert_abs_diff_eq!(p[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn register_size_limits() {
        assert!(matches!(Circuit::new(1, 64), Err(Error::Shape(_))));
        assert!(matches!(Circuit::new(1, MAX_CLBITS + 1), Err(Error::Shape(_))));
        assert!(matches!(Circuit::new(64, 0), Err(Error::Shape(_))));
        assert!(matches!(
            Circuit::from_descriptors(1, 64, ["measure 0 63"]),
            Err(Error::Shape(_))
        ));
        let mut c = Circuit::new(1, MAX_CLBITS).unwrap();
        c.measure(0, MAX_CLBITS - 1).unwrap();
        let p = c.clbit_probabilities().unwrap();
        assert_eq!(p.len(), 1 << MAX_CLBITS);
        assert_abs_diff_eq!(p[0], 1.0, epsilon = 1e-12);
    }
}
