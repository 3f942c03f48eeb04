//! Density matrices and the subsystem operations on them.
//!
//! Subsystems are addressed by qubit index using the same bit convention as
//! [`StateVector`]: qubit `k` is bit `k` of a row/column index. Partial traces
//! and transposes are computed for arbitrary register sizes by rearranging
//! those bits directly.

use nalgebra as na;
use num_complex::Complex64 as C64;
use itertools::Itertools;
use tracing::warn;
use crate::{
    error::{ Error, Result },
    state::{ self, StateVector },
    tol,
};

/// Largest register for which a density matrix will be allocated.
pub const MAX_QUBITS: usize = 10;

/// A Hermitian, unit-trace, positive semi-definite matrix over `n` qubits.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityMatrix {
    pub(crate) n: usize,
    pub(crate) mat: na::DMatrix<C64>,
}

impl DensityMatrix {
    /// Validate and wrap a matrix.
    ///
    /// Fails with a shape error if the matrix is not square with a power-of-two
    /// dimension, and with a precondition error if it has non-finite entries or
    /// is not Hermitian, of unit trace, or positive semi-definite to within
    /// [`tol::PHYSICAL`].
    pub fn new(mat: na::DMatrix<C64>) -> Result<Self> {
        if !mat.is_square() {
            return Err(Error::shape(format!(
                "density matrix must be square, got {}×{}",
                mat.nrows(), mat.ncols())));
        }
        let n = num_qubits(mat.nrows())?;
        if mat.iter().any(|z| !z.is_finite()) {
            return Err(Error::precondition("density matrix has non-finite entries"));
        }
        let herm = hermitian_deviation(&mat);
        if herm > tol::PHYSICAL {
            return Err(Error::precondition(format!(
                "density matrix is not Hermitian (deviation {:.3e})", herm)));
        }
        let tr = mat.trace();
        if (tr - 1.0).norm() > tol::PHYSICAL {
            return Err(Error::precondition(format!(
                "density matrix has trace {} ≠ 1", tr)));
        }
        let (evals, _) = eigh(&mat)?;
        let min = evals.iter().copied().fold(f64::INFINITY, f64::min);
        if min < -tol::PHYSICAL {
            return Err(Error::precondition(format!(
                "density matrix is not positive semi-definite (λ_min = {:.3e})",
                min)));
        }
        Ok(Self { n, mat })
    }

    /// Form the projector ∣ψ⟩⟨ψ∣.
    pub fn from_state(state: &StateVector) -> Result<Self> {
        let n = num_qubits(state.dim())?;
        let psi = state.amplitudes();
        Ok(Self { n, mat: psi * psi.adjoint() })
    }

    /// Wrap a matrix without any physical checks. The dimension must still be
    /// a power of two.
    pub fn from_matrix_unchecked(mat: na::DMatrix<C64>) -> Result<Self> {
        if !mat.is_square() {
            return Err(Error::shape(format!(
                "density matrix must be square, got {}×{}",
                mat.nrows(), mat.ncols())));
        }
        let n = num_qubits(mat.nrows())?;
        Ok(Self { n, mat })
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize { self.n }

    /// Dimension of the Hilbert space, 2<sup>n</sup>.
    pub fn dim(&self) -> usize { self.mat.nrows() }

    /// Borrow the underlying matrix.
    pub fn matrix(&self) -> &na::DMatrix<C64> { &self.mat }

    /// Unwrap into the underlying matrix.
    pub fn into_matrix(self) -> na::DMatrix<C64> { self.mat }

    /// Tr(ρ<sup>2</sup>).
    pub fn purity(&self) -> f64 { (&self.mat * &self.mat).trace().re }

    /// Return `true` if Tr(ρ<sup>2</sup>) is 1 to within [`tol::PURITY`].
    pub fn is_pure(&self) -> bool { (self.purity() - 1.0).abs() <= tol::PURITY }

    /// Real eigenvalues in ascending order.
    pub fn eigenvalues(&self) -> Result<Vec<f64>> {
        let (evals, _) = eigh(&self.mat)?;
        Ok(evals.iter().copied().sorted_by(|a, b| a.total_cmp(b)).collect())
    }

    /// Recover ∣ψ⟩ from a pure density matrix as its principal eigenvector.
    ///
    /// Mixed states have no such vector and are reported as unavailable.
    pub fn to_pure_state(&self) -> Result<StateVector> {
        if !self.is_pure() {
            return Err(Error::unavailable(format!(
                "state is mixed (purity {:.6})", self.purity())));
        }
        let (evals, evecs) = eigh(&self.mat)?;
        let imax = evals.iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .ok_or_else(|| Error::unavailable("empty spectrum"))?;
        let psi = evecs.column(imax);
        // fix the global phase so the largest component is real and positive
        let (_, big) = psi.iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.norm_sqr().total_cmp(&b.norm_sqr()))
            .ok_or_else(|| Error::unavailable("empty eigenvector"))?;
        let phase = big.conj() / big.norm();
        StateVector::from_amplitudes(psi.iter().map(|a| a * phase))
    }
}

impl From<StateVector> for DensityMatrix {
    fn from(state: StateVector) -> Self {
        let psi = &state.amps;
        Self { n: state.n, mat: psi * psi.adjoint() }
    }
}

/// Deviation of a result from the properties of a density matrix.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Consistency {
    /// max |M − M<sup>†</sup>| over all entries
    pub hermitian_deviation: f64,
    /// |Tr(M) − 1|
    pub trace_deviation: f64,
}

impl Consistency {
    fn of(mat: &na::DMatrix<C64>) -> Self {
        Self {
            hermitian_deviation: hermitian_deviation(mat),
            trace_deviation: (mat.trace() - 1.0).norm(),
        }
    }

    /// Return `true` if both deviations are within [`tol::PHYSICAL`].
    pub fn is_ok(&self) -> bool {
        self.hermitian_deviation <= tol::PHYSICAL
            && self.trace_deviation <= tol::PHYSICAL
    }
}

/// A computed value along with a consistency report; failures are flagged
/// rather than raised.
#[derive(Clone, Debug, PartialEq)]
pub struct Checked<T> {
    pub value: T,
    pub check: Consistency,
}

impl<T> Checked<T> {
    fn new(value: T, check: Consistency, op: &str) -> Self {
        if !check.is_ok() {
            warn!(
                op,
                hermitian_deviation = check.hermitian_deviation,
                trace_deviation = check.trace_deviation,
                "consistency check failed"
            );
        }
        Self { value, check }
    }

    /// Return `true` if the consistency check passed.
    pub fn is_consistent(&self) -> bool { self.check.is_ok() }

    /// Discard the consistency report.
    pub fn into_inner(self) -> T { self.value }
}

/// Trace out every qubit not in `keep`.
///
/// The `j`-th kept qubit (in ascending order) becomes qubit `j` of the result.
/// An empty `keep` gives the 1 × 1 matrix [Tr ρ].
pub fn partial_trace(rho: &DensityMatrix, keep: &[usize])
    -> Result<Checked<DensityMatrix>>
{
    let keep = normalize_partition(keep, rho.n)?;
    let traced: Vec<usize>
        = (0..rho.n).filter(|q| !keep.contains(q)).collect();
    let dk: usize = 1 << keep.len();
    let dt: usize = 1 << traced.len();
    let env: Vec<usize> = (0..dt).map(|t| scatter(t, &traced)).collect();
    let mut red: na::DMatrix<C64> = na::DMatrix::zeros(dk, dk);
    for a in 0..dk {
        let ia = scatter(a, &keep);
        for b in 0..dk {
            let ib = scatter(b, &keep);
            red[(a, b)] = env.iter().map(|e| rho.mat[(ia | e, ib | e)]).sum();
        }
    }
    let check = Consistency::of(&red);
    let value = DensityMatrix { n: keep.len(), mat: red };
    Ok(Checked::new(value, check, "partial_trace"))
}

/// Transpose the subsystem given by `partition`, swapping the partition's bits
/// between the row and column of every entry.
pub fn partial_transpose(rho: &DensityMatrix, partition: &[usize])
    -> Result<Checked<na::DMatrix<C64>>>
{
    let part = normalize_partition(partition, rho.n)?;
    let mask: usize = part.iter().fold(0, |m, q| m | 1 << q);
    let d = rho.dim();
    let mut out: na::DMatrix<C64> = na::DMatrix::zeros(d, d);
    for i in 0..d {
        for j in 0..d {
            let ni = (i & !mask) | (j & mask);
            let nj = (j & !mask) | (i & mask);
            out[(ni, nj)] = rho.mat[(i, j)];
        }
    }
    let check = Consistency::of(&out);
    Ok(Checked::new(out, check, "partial_transpose"))
}

/// Sort and deduplicate a partition, checking that every index is less than
/// `n`.
pub(crate) fn normalize_partition(part: &[usize], n: usize)
    -> Result<Vec<usize>>
{
    if let Some(q) = part.iter().find(|&&q| q >= n) {
        return Err(Error::shape(format!(
            "partition index {} out of range for {} qubits", q, n)));
    }
    Ok(part.iter().copied().sorted_unstable().dedup().collect())
}

// place bit j of `x` at bit position qubits[j]
fn scatter(x: usize, qubits: &[usize]) -> usize {
    qubits.iter()
        .enumerate()
        .filter(|(j, _)| x >> j & 1 == 1)
        .fold(0, |acc, (_, q)| acc | 1 << q)
}

fn num_qubits(dim: usize) -> Result<usize> {
    let n = state::num_qubits_for(dim)?;
    if n > MAX_QUBITS {
        return Err(Error::shape(format!(
            "{} qubits exceeds the density matrix limit of {}", n, MAX_QUBITS)));
    }
    Ok(n)
}

fn hermitian_deviation(mat: &na::DMatrix<C64>) -> f64 {
    (mat - mat.adjoint()).iter().map(|z| z.norm()).fold(0.0, f64::max)
}

/// Eigen-decomposition of a Hermitian matrix, returning the eigenvalues and
/// the eigenvectors as columns.
///
/// Non-convergence or non-finite eigenvalues are reported as unavailable.
pub(crate) fn eigh(mat: &na::DMatrix<C64>)
    -> Result<(na::DVector<f64>, na::DMatrix<C64>)>
{
    let herm = (mat + mat.adjoint()) * C64::from(0.5);
    let eig = na::SymmetricEigen::try_new(herm, tol::EIGEN_EPS, tol::EIGEN_MAX_ITER)
        .ok_or_else(|| Error::unavailable("eigen-decomposition did not converge"))?;
    if eig.eigenvalues.iter().any(|x| !x.is_finite()) {
        return Err(Error::unavailable("non-finite eigenvalue"));
    }
    Ok((eig.eigenvalues, eig.eigenvectors))
}

/// Square root of a positive semi-definite Hermitian matrix. Small negative
/// eigenvalues from round-off are clipped to zero.
pub(crate) fn sqrtm_psd(mat: &na::DMatrix<C64>) -> Result<na::DMatrix<C64>> {
    let (evals, evecs) = eigh(mat)?;
    let diag: na::DVector<C64>
        = evals.map(|x| C64::from(x.max(0.0).sqrt()));
    Ok(&evecs * na::DMatrix::from_diagonal(&diag) * evecs.adjoint())
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use crate::gate::Gate;

    fn bell() -> DensityMatrix {
        let psi = StateVector::from_gates(&[Gate::H(0), Gate::CX(0, 1)], 2)
            .unwrap();
        DensityMatrix::from_state(&psi).unwrap()
    }

    fn max_abs_diff(a: &na::DMatrix<C64>, b: &na::DMatrix<C64>) -> f64 {
        (a - b).iter().map(|z| z.norm()).fold(0.0, f64::max)
    }

    #[test]
    fn validation() {
        let nonsquare: na::DMatrix<C64> = na::DMatrix::zeros(2, 4);
        assert!(matches!(DensityMatrix::new(nonsquare), Err(Error::Shape(_))));
        let three: na::DMatrix<C64> = na::DMatrix::identity(3, 3);
        assert!(matches!(DensityMatrix::new(three), Err(Error::Shape(_))));
        let trace2: na::DMatrix<C64> = na::DMatrix::identity(2, 2);
        assert!(matches!(DensityMatrix::new(trace2), Err(Error::Precondition(_))));
        let mut nonherm: na::DMatrix<C64> = na::DMatrix::identity(2, 2) / C64::from(2.0);
        nonherm[(0, 1)] = C64::from(0.3);
        assert!(matches!(DensityMatrix::new(nonherm), Err(Error::Precondition(_))));
        // Hermitian, unit trace, but λ = 1.5, –0.5
        let mut neg: na::DMatrix<C64> = na::DMatrix::identity(2, 2) / C64::from(2.0);
        neg[(0, 1)] = C64::from(1.0);
        neg[(1, 0)] = C64::from(1.0);
        assert!(matches!(DensityMatrix::new(neg), Err(Error::Precondition(_))));
        let mixed: na::DMatrix<C64> = na::DMatrix::identity(4, 4) / C64::from(4.0);
        let rho = DensityMatrix::new(mixed).unwrap();
        assert_eq!(rho.num_qubits(), 2);
        assert_abs_diff_eq!(rho.purity(), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn rejects_non_finite() {
        let mut nan: na::DMatrix<C64> = na::DMatrix::identity(2, 2) / C64::from(2.0);
        nan[(0, 1)] = C64::new(f64::NAN, 0.0);
        assert!(matches!(DensityMatrix::new(nan), Err(Error::Precondition(_))));
        let mut inf: na::DMatrix<C64> = na::DMatrix::identity(2, 2) / C64::from(2.0);
        inf[(1, 1)] = C64::from(f64::INFINITY);
        assert!(matches!(DensityMatrix::new(inf), Err(Error::Precondition(_))));
    }

    #[test]
    fn bell_reduced_is_maximally_mixed() {
        let red = partial_trace(&bell(), &[1]).unwrap();
        assert!(red.is_consistent());
        let half: na::DMatrix<C64> = na::DMatrix::identity(2, 2) / C64::from(2.0);
        assert_abs_diff_eq!(max_abs_diff(red.value.matrix(), &half), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn product_state_factors() {
        // qubit 0 in ∣+⟩, qubit 1 in ∣0⟩, qubit 2 in ∣1⟩
        let psi = StateVector::from_gates(&[Gate::H(0), Gate::X(2)], 3).unwrap();
        let rho = DensityMatrix::from_state(&psi).unwrap();
        let red = partial_trace(&rho, &[2, 0]).unwrap().into_inner();
        assert_eq!(red.num_qubits(), 2);
        let plus = StateVector::from_gates(&[Gate::H(0), Gate::X(1)], 2).unwrap();
        let expected = DensityMatrix::from_state(&plus).unwrap();
        assert_abs_diff_eq!(
            max_abs_diff(red.matrix(), expected.matrix()), 0.0, epsilon = 1e-12);
        let q1 = partial_trace(&rho, &[1, 1]).unwrap().into_inner();
        assert_abs_diff_eq!(q1.matrix()[(0, 0)].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_keep_gives_trace() {
        let red = partial_trace(&bell(), &[]).unwrap().into_inner();
        assert_eq!(red.dim(), 1);
        assert_abs_diff_eq!(red.matrix()[(0, 0)].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn out_of_range_partition() {
        assert!(matches!(partial_trace(&bell(), &[2]), Err(Error::Shape(_))));
        assert!(matches!(partial_transpose(&bell(), &[5]), Err(Error::Shape(_))));
    }

    #[test]
    fn transpose_is_involution() {
        let psi = StateVector::from_gates(
            &[Gate::H(0), Gate::Rot(1, crate::gate::Axis::Y, 0.4),
              Gate::CX(0, 2), Gate::Phase(2, 0.9)],
            3,
        ).unwrap();
        let rho = DensityMatrix::from_state(&psi).unwrap();
        let once = partial_transpose(&rho, &[0, 2]).unwrap().into_inner();
        let once = DensityMatrix::from_matrix_unchecked(once).unwrap();
        let twice = partial_transpose(&once, &[0, 2]).unwrap().into_inner();
        assert_abs_diff_eq!(max_abs_diff(&twice, rho.matrix()), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn bell_transpose_has_negative_eigenvalue() {
        let pt = partial_transpose(&bell(), &[0]).unwrap();
        assert!(pt.is_consistent());
        let (evals, _) = eigh(&pt.value).unwrap();
        let min = evals.iter().copied().fold(f64::INFINITY, f64::min);
        assert_abs_diff_eq!(min, -0.5, epsilon = 1e-9);
    }

    #[test]
    fn flags_inconsistent_input() {
        let mut m: na::DMatrix<C64> = na::DMatrix::zeros(4, 4);
        m[(0, 0)] = C64::from(2.0);
        let rho = DensityMatrix::from_matrix_unchecked(m).unwrap();
        let red = partial_trace(&rho, &[0]).unwrap();
        assert!(!red.is_consistent());
        assert_abs_diff_eq!(red.check.trace_deviation, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn pure_state_recovery() {
        let rho = bell();
        assert!(rho.is_pure());
        let psi = rho.to_pure_state().unwrap();
        let orig = StateVector::from_gates(&[Gate::H(0), Gate::CX(0, 1)], 2)
            .unwrap();
        assert_abs_diff_eq!(psi.inner(&orig).unwrap().norm(), 1.0, epsilon = 1e-9);
        let mixed = partial_trace(&rho, &[0]).unwrap().into_inner();
        assert!(matches!(mixed.to_pure_state(), Err(Error::Unavailable(_))));
    }

    #[test]
    fn sqrtm_squares_back() {
        let rho = partial_trace(&bell(), &[0]).unwrap().into_inner();
        let s = sqrtm_psd(rho.matrix()).unwrap();
        assert_abs_diff_eq!(max_abs_diff(&(&s * &s), rho.matrix()), 0.0, epsilon = 1e-12);
    }
}
