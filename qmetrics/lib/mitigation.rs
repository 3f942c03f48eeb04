//! Measurement-error mitigation of read-out counts.
//!
//! A [`Calibration`] holds the column-stochastic response matrix *C* of a
//! *k*-bit register, with *C*<sub>*ij*</sub> the probability of reading value
//! *i* after preparing value *j*. The default placeholder matrices from
//! [`build_calibration_matrix`] can be replaced by a measured one through
//! [`Calibration::new`].

use nalgebra as na;
use tracing::debug;
use crate::{
    circuit::Circuit,
    counts::Counts,
    error::{ Error, Result },
    tol,
};

/// Largest register for which a calibration matrix will be allocated.
pub const MAX_BITS: usize = 10;

/// Read-out response matrix of a register of classical bits.
#[derive(Clone, Debug, PartialEq)]
pub struct Calibration {
    width: usize,
    matrix: na::DMatrix<f64>,
}

impl Calibration {
    /// Validate and wrap a response matrix.
    ///
    /// Fails with a shape error unless the matrix is square with dimension
    /// 2<sup>*k*</sup> for some *k* ≥ 1, and with a precondition error if any
    /// entry is negative or non-finite or any column does not sum to 1 to
    /// within [`tol::PHYSICAL`].
    pub fn new(matrix: na::DMatrix<f64>) -> Result<Self> {
        let dim = matrix.nrows();
        if !matrix.is_square() || dim < 2 || !dim.is_power_of_two() {
            return Err(Error::shape(format!(
                "calibration matrix must be 2^k × 2^k with k ≥ 1, got {}×{}",
                matrix.nrows(), matrix.ncols())));
        }
        let width = dim.trailing_zeros() as usize;
        if width > MAX_BITS {
            return Err(Error::shape(format!(
                "{} bits exceeds the calibration limit of {}", width, MAX_BITS)));
        }
        if matrix.iter().any(|x| !x.is_finite() || *x < -tol::PHYSICAL) {
            return Err(Error::precondition(
                "calibration matrix has negative or non-finite entries"));
        }
        if let Some((j, s))
            = matrix.column_iter()
            .map(|col| col.sum())
            .enumerate()
            .find(|(_, s)| (s - 1.0).abs() > tol::PHYSICAL)
        {
            return Err(Error::precondition(format!(
                "calibration column {} sums to {}", j, s)));
        }
        Ok(Self { width, matrix })
    }

    /// Response matrix for independent, symmetric bit flips with probability
    /// `p` on each of `k` bits.
    pub fn from_flip_rate(k: usize, p: f64) -> Result<Self> {
        check_width(k)?;
        if !(0.0..=1.0).contains(&p) {
            return Err(Error::precondition(format!(
                "flip probability must be in [0, 1], got {}", p)));
        }
        let dim: usize = 1 << k;
        let matrix = na::DMatrix::from_fn(dim, dim, |i, j| {
            let flips = (i ^ j).count_ones() as i32;
            p.powi(flips) * (1.0 - p).powi(k as i32 - flips)
        });
        Self::new(matrix)
    }

    /// Number of bits in the register.
    pub fn width(&self) -> usize { self.width }

    /// Borrow the response matrix.
    pub fn matrix(&self) -> &na::DMatrix<f64> { &self.matrix }

    /// Probability of reading back a prepared register value unchanged.
    pub fn readout_fidelity(&self, value: usize) -> Option<f64> {
        (value < self.matrix.nrows()).then(|| self.matrix[(value, value)])
    }

    /// Mean of [`Self::readout_fidelity`] over all register values.
    pub fn average_fidelity(&self) -> f64 {
        self.matrix.diagonal().mean()
    }
}

fn check_width(k: usize) -> Result<()> {
    if k == 0 {
        return Err(Error::shape("calibration requires at least one measured bit"));
    }
    if k > MAX_BITS {
        return Err(Error::shape(format!(
            "{} bits exceeds the calibration limit of {}", k, MAX_BITS)));
    }
    Ok(())
}

/// Placeholder calibration for `k` measured bits.
///
/// For one and two bits these are fixed cross-talk matrices; for more, 90%
/// read-out fidelity with the remaining 10% spread uniformly over all
/// outcomes.
pub fn build_calibration_matrix(k: usize) -> Result<Calibration> {
    check_width(k)?;
    let matrix = match k {
        1 => na::DMatrix::from_row_slice(2, 2, &[
            0.95, 0.05,
            0.05, 0.95,
        ]),
        2 => na::DMatrix::from_row_slice(4, 4, &[
            0.90, 0.05, 0.03, 0.02,
            0.05, 0.90, 0.02, 0.03,
            0.03, 0.02, 0.90, 0.05,
            0.02, 0.03, 0.05, 0.90,
        ]),
        _ => {
            let dim: usize = 1 << k;
            let off = 0.10 / dim as f64;
            na::DMatrix::from_fn(dim, dim, |i, j| {
                if i == j { 0.90 + off } else { off }
            })
        },
    };
    Calibration::new(matrix)
}

/// Strategy for correcting counts against a calibration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mitigation {
    /// Scale every count to ⌊count · `retain_percent` / 100⌋, but never below
    /// 1. The calibration only fixes the expected bitstring width.
    Flat { retain_percent: u64 },
    /// Solve *C* **x** = **p** for the observed distribution **p**, clip
    /// negative entries, renormalize, and round back to the original number
    /// of shots.
    Unfold,
}

impl Default for Mitigation {
    fn default() -> Self { Self::Flat { retain_percent: 95 } }
}

/// Mitigate counts with the default [`Mitigation::Flat`] strategy.
pub fn apply_mitigation(counts: &Counts, calibration: &Calibration)
    -> Result<Counts>
{
    apply_mitigation_with(counts, calibration, Mitigation::default())
}

/// Mitigate counts with a given strategy.
///
/// Fails with a shape error if any bitstring's length differs from the
/// calibration width.
pub fn apply_mitigation_with(
    counts: &Counts,
    calibration: &Calibration,
    strategy: Mitigation,
) -> Result<Counts>
{
    counts.check_width(calibration.width)?;
    let mitigated = match strategy {
        Mitigation::Flat { retain_percent } => flat(counts, retain_percent)?,
        Mitigation::Unfold => unfold(counts, calibration)?,
    };
    debug!(
        ?strategy,
        before = counts.total(),
        after = mitigated.total(),
        "mitigated counts"
    );
    Ok(mitigated)
}

/// Theoretical counts of a circuit before and after mitigation, with the
/// calibration used.
#[derive(Clone, Debug, PartialEq)]
pub struct MitigationReport {
    pub original: Counts,
    pub mitigated: Counts,
    pub calibration: Calibration,
}

/// Mitigate the exact read-out counts of a circuit against the placeholder
/// calibration of its register.
///
/// The register is the circuit's classical bits if it measures anything and
/// all of its qubits otherwise (see [`Circuit::register_width`]).
pub fn mitigate_circuit_with(circuit: &Circuit, shots: u64, strategy: Mitigation)
    -> Result<MitigationReport>
{
    if shots == 0 {
        return Err(Error::precondition("shots must be positive"));
    }
    let width = circuit.register_width();
    let calibration = build_calibration_matrix(width)?;
    let original
        = Counts::from_probabilities(&circuit.clbit_probabilities()?, width, shots)?;
    let mitigated = apply_mitigation_with(&original, &calibration, strategy)?;
    Ok(MitigationReport { original, mitigated, calibration })
}

fn flat(counts: &Counts, retain_percent: u64) -> Result<Counts> {
    if retain_percent > 100 {
        return Err(Error::config(format!(
            "retained share must be at most 100%, got {}%", retain_percent)));
    }
    // ⌊c·r/100⌋ without overflow
    let scale = |c: u64| c / 100 * retain_percent + c % 100 * retain_percent / 100;
    Ok(counts.iter().map(|(bits, c)| (bits, scale(c).max(1))).collect())
}

fn unfold(counts: &Counts, calibration: &Calibration) -> Result<Counts> {
    let shots = counts.total();
    if shots == 0 { return Ok(Counts::new()); }
    let dense = counts.to_dense(calibration.width)?;
    let p: na::DVector<f64>
        = na::DVector::from_iterator(
            dense.len(), dense.iter().map(|c| *c as f64 / shots as f64));
    let x = calibration.matrix.clone().lu().solve(&p)
        .ok_or_else(|| Error::unavailable("calibration matrix is singular"))?;
    if x.iter().any(|v| !v.is_finite()) {
        return Err(Error::unavailable("unfolded distribution is not finite"));
    }
    let clipped: Vec<f64> = x.iter().map(|v| v.max(0.0)).collect();
    Counts::from_probabilities(&clipped, calibration.width, shots)
        .map_err(|_| Error::unavailable("unfolded distribution has no support"))
}
