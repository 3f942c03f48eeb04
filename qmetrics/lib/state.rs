//! Dense state vectors of *n*-qubit registers.
//!
//! Amplitudes are indexed so that qubit `k` corresponds to bit `k` of the
//! index; qubit 0 is therefore the least significant bit and appears
//! rightmost in bitstrings, e.g. for three qubits the amplitude at index 6
//! belongs to ∣110⟩, which has qubits 1 and 2 set.

use std::fmt;
use nalgebra as na;
use num_complex::Complex64 as C64;
use crate::{
    error::{ Error, Result },
    gate::Gate,
    tol,
};

/// Largest register for which a state vector will be allocated.
pub const MAX_QUBITS: usize = 20;

/// A normalized pure state of `n` qubits.
#[derive(Clone, Debug, PartialEq)]
pub struct StateVector {
    pub(crate) n: usize,
    pub(crate) amps: na::DVector<C64>,
}

impl StateVector {
    /// Create a new state of `n` qubits initialized to ∣0...0⟩.
    pub fn new(n: usize) -> Result<Self> {
        check_size(n)?;
        let mut amps: na::DVector<C64> = na::DVector::zeros(1 << n);
        amps[0] = C64::from(1.0);
        Ok(Self { n, amps })
    }

    /// Wrap a vector of amplitudes.
    ///
    /// Fails with a shape error if the length is not a power of two, and with
    /// a precondition error if the vector is not normalized to within
    /// [`tol::STATE_NORM`]. The amplitudes are renormalized exactly.
    pub fn from_amplitudes<I>(amps: I) -> Result<Self>
    where I: IntoIterator<Item = C64>
    {
        let amps: Vec<C64> = amps.into_iter().collect();
        let n = num_qubits_for(amps.len())?;
        let amps = na::DVector::from_vec(amps);
        let norm = amps.norm();
        if !norm.is_finite() || (norm - 1.0).abs() > tol::STATE_NORM {
            return Err(Error::precondition(format!(
                "state vector not normalized, norm = {}", norm)));
        }
        Ok(Self { n, amps: amps / C64::from(norm) })
    }

    /// Apply a gate sequence to ∣0...0⟩.
    ///
    /// Deterministic: every gate is a fixed unitary.
    pub fn from_gates<'a, I>(gates: I, n: usize) -> Result<Self>
    where I: IntoIterator<Item = &'a Gate>
    {
        let mut state = Self::new(n)?;
        state.apply_circuit(gates)?;
        state.renormalize();
        Ok(state)
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize { self.n }

    /// Dimension of the Hilbert space, 2<sup>n</sup>.
    pub fn dim(&self) -> usize { self.amps.len() }

    /// Borrow the amplitudes.
    pub fn amplitudes(&self) -> &na::DVector<C64> { &self.amps }

    /// Squared magnitude of every amplitude.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amps.iter().map(|a| a.norm_sqr()).collect()
    }

    /// Euclidean norm of the amplitude vector.
    pub fn norm(&self) -> f64 { self.amps.norm() }

    /// Inner product ⟨self∣other⟩.
    pub fn inner(&self, other: &Self) -> Result<C64> {
        if self.dim() != other.dim() {
            return Err(Error::shape(format!(
                "inner product of {}- and {}-qubit states", self.n, other.n)));
        }
        Ok(self.amps.dotc(&other.amps))
    }

    fn renormalize(&mut self) {
        let norm = self.amps.norm();
        if norm > 0.0 { self.amps /= C64::from(norm); }
    }

    /// Perform the action of a gate.
    pub fn apply_gate(&mut self, gate: &Gate) -> Result<&mut Self> {
        gate.validate(self.n)?;
        match gate.single_qubit_matrix() {
            Some((k, u)) => self.apply_single(k, &u),
            None => {
                if let Gate::CX(c, t) = *gate { self.apply_cx(c, t); }
            },
        }
        Ok(self)
    }

    /// Perform a series of gates.
    pub fn apply_circuit<'a, I>(&mut self, gates: I) -> Result<&mut Self>
    where I: IntoIterator<Item = &'a Gate>
    {
        gates.into_iter().try_for_each(|g| self.apply_gate(g).map(|_| ()))?;
        Ok(self)
    }

    // act with a 2 × 2 unitary on each (∣..0_k..⟩, ∣..1_k..⟩) amplitude pair
    fn apply_single(&mut self, k: usize, u: &na::Matrix2<C64>) {
        let pw: usize = 1 << k;
        let mut a: C64;
        let mut b: C64;
        for i0 in (0..self.dim()).filter(|i| i & pw == 0) {
            let i1 = i0 | pw;
            a = self.amps[i0];
            b = self.amps[i1];
            self.amps[i0] = u[(0, 0)] * a + u[(0, 1)] * b;
            self.amps[i1] = u[(1, 0)] * a + u[(1, 1)] * b;
        }
    }

    fn apply_cx(&mut self, c: usize, t: usize) {
        let pwc: usize = 1 << c;
        let pwt: usize = 1 << t;
        for i in (0..self.dim()).filter(|i| i & pwc != 0 && i & pwt == 0) {
            self.amps.swap_rows(i, i | pwt);
        }
    }

    /// Format a basis index as a bitstring with qubit 0 rightmost.
    pub fn bitstring(&self, idx: usize) -> String { bitstring(idx, self.n) }
}

/// Format the lowest `width` bits of `idx` with bit 0 rightmost.
pub fn bitstring(idx: usize, width: usize) -> String {
    // `{:00b}` would still print a digit
    if width == 0 { return String::new(); }
    format!("{:0width$b}", idx, width = width)
}

/// Return the number of qubits for a Hilbert space of dimension `dim`.
pub(crate) fn num_qubits_for(dim: usize) -> Result<usize> {
    if dim == 0 || !dim.is_power_of_two() {
        return Err(Error::shape(format!(
            "dimension {} is not a power of two", dim)));
    }
    let n = dim.trailing_zeros() as usize;
    check_size(n)?;
    Ok(n)
}

fn check_size(n: usize) -> Result<()> {
    if n > MAX_QUBITS {
        Err(Error::shape(format!(
            "{} qubits exceeds the limit of {}", n, MAX_QUBITS)))
    } else {
        Ok(())
    }
}

impl fmt::Display for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (idx, a) in self.amps.iter().enumerate() {
            if a.norm_sqr() < tol::DISPLAY_CUTOFF { continue; }
            if !first { write!(f, " ")?; }
            write!(f, "({:+.4}{:+.4}i)∣{}⟩", a.re, a.im, self.bitstring(idx))?;
            first = false;
        }
        Ok(())
    }
}
