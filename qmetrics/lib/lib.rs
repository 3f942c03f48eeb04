//! Tools for computing entanglement and state-quality metrics of small qubit
//! registers, building simple error-correcting encodings, and simulating
//! their theoretical measurement statistics.
//!
//! All computation is exact and dense: circuits are evaluated to a full state
//! vector, so registers are limited to [`state::MAX_QUBITS`] qubits (and
//! [`density::MAX_QUBITS`] for density matrices). Nothing is sampled except
//! the Monte Carlo search in [`entanglement::geometric_measure`], which takes
//! an explicit seed.
//!
//! The library emits [`tracing`] events but never installs a subscriber.

pub mod error;
pub mod gate;
pub mod circuit;
pub mod state;
pub mod density;
pub mod counts;
pub mod entanglement;
pub mod bell;
pub mod code;
pub mod mitigation;
pub mod tomography;
pub mod api;

pub use error::{ Error, MetricResult, Result };
pub use gate::{ Axis, Basis, Gate };
pub use circuit::{ Circuit, Op };
pub use state::StateVector;
pub use density::DensityMatrix;
pub use counts::Counts;
pub use api::*;

/// Numerical tolerances.
pub mod tol {
    /// Allowed deviation of a state vector's norm from 1.
    pub const STATE_NORM: f64 = 1e-6;

    /// Allowed deviation from Hermiticity, unit trace, positivity, or
    /// stochasticity.
    pub const PHYSICAL: f64 = 1e-6;

    /// Allowed deviation of Tr(ρ²) from 1 for a state to count as pure.
    pub const PURITY: f64 = 1e-6;

    /// Eigenvalues of a partial transpose smaller than this in magnitude are
    /// treated as zero.
    pub const NEGATIVITY_ZERO: f64 = 1e-12;

    /// Eigenvalues at or below this contribute nothing to an entropy.
    pub const ENTROPY_CUTOFF: f64 = 1e-10;

    /// Concurrence above which a two-qubit state is maximally entangled.
    pub const MAX_ENTANGLED: f64 = 0.99;

    /// Convergence threshold passed to the Hermitian eigen-solver.
    pub const EIGEN_EPS: f64 = f64::EPSILON;

    /// Iteration limit for the Hermitian eigen-solver.
    pub const EIGEN_MAX_ITER: usize = 10_000;

    /// Amplitudes with squared magnitude below this are omitted when printed.
    pub const DISPLAY_CUTOFF: f64 = 1e-12;
}
