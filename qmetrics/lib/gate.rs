//! Single- and two-qubit gates acting on registers of qubits, along with the
//! measurement bases used for tomography.
//!
//! Gates can be constructed directly or parsed from short textual descriptors
//! of the form `<name> <qubit>... <angle>...`, e.g. `"h 0"`, `"cx 0 1"`, or
//! `"rx 2 1.5708"`. Recognized names:
//!
//! | name            | gate                         |
//! | :-------------- | :--------------------------- |
//! | `i`, `id`       | [`Gate::I`]                  |
//! | `x`, `y`, `z`   | [`Gate::X`], [`Gate::Y`], [`Gate::Z`] |
//! | `h`             | [`Gate::H`]                  |
//! | `cx`, `cnot`    | [`Gate::CX`]                 |
//! | `rx`, `ry`, `rz`| [`Gate::Rot`]                |
//! | `p`, `phase`    | [`Gate::Phase`]              |

use std::{ fmt, str::FromStr };
use nalgebra as na;
use num_complex::Complex64 as C64;
use once_cell::sync::Lazy;
use crate::error::{ Error, Result };

/// Rotation axis on the Bloch sphere.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::X => write!(f, "x"),
            Self::Y => write!(f, "y"),
            Self::Z => write!(f, "z"),
        }
    }
}

/// Description of a single gate for a register of `n` qubits.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Gate {
    /// Identity
    I(usize),
    /// π rotation about X
    X(usize),
    /// π rotation about Y
    Y(usize),
    /// π rotation about Z
    Z(usize),
    /// Hadamard
    H(usize),
    /// Z-controlled π rotation about X.
    ///
    /// The first qubit index is the control.
    CX(usize, usize),
    /// Rotation by an angle about an axis, exp(–iθσ/2).
    Rot(usize, Axis, f64),
    /// Relative phase on ∣1⟩, diag(1, e^iθ).
    Phase(usize, f64),
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::I(k) => write!(f, "i {}", k),
            Self::X(k) => write!(f, "x {}", k),
            Self::Y(k) => write!(f, "y {}", k),
            Self::Z(k) => write!(f, "z {}", k),
            Self::H(k) => write!(f, "h {}", k),
            Self::CX(c, t) => write!(f, "cx {} {}", c, t),
            Self::Rot(k, ax, ang) => write!(f, "r{} {} {}", ax, k, ang),
            Self::Phase(k, ang) => write!(f, "p {} {}", k, ang),
        }
    }
}

impl Gate {
    /// Return `true` if `self` acts on two qubits.
    pub fn is_two_qubit(&self) -> bool { matches!(self, Self::CX(..)) }

    /// Return `true` if `self` acts on qubit `k`.
    pub fn acts_on(&self, k: usize) -> bool {
        match *self {
            Self::CX(c, t) => c == k || t == k,
            Self::I(q)
            | Self::X(q)
            | Self::Y(q)
            | Self::Z(q)
            | Self::H(q)
            | Self::Rot(q, ..)
            | Self::Phase(q, _)
            => q == k,
        }
    }

    /// Check that all qubit indices are less than `n` and that two-qubit gate
    /// indices are non-equal.
    pub fn validate(&self, n: usize) -> Result<()> {
        match *self {
            Self::CX(c, t) if c == t => Err(Error::config(format!(
                "gate `{}`: control and target must differ", self))),
            Self::CX(c, t) if c >= n || t >= n => Err(Error::config(format!(
                "gate `{}`: qubit index out of range for {} qubits", self, n))),
            Self::I(k)
            | Self::X(k)
            | Self::Y(k)
            | Self::Z(k)
            | Self::H(k)
            | Self::Rot(k, ..)
            | Self::Phase(k, _)
            if k >= n => Err(Error::config(format!(
                "gate `{}`: qubit index out of range for {} qubits", self, n))),
            Self::Rot(_, _, ang) | Self::Phase(_, ang) if !ang.is_finite()
                => Err(Error::config(format!(
                    "gate `{}`: angle must be finite", self))),
            _ => Ok(()),
        }
    }

    /// Return the 2 × 2 unitary of a single-qubit gate along with the qubit it
    /// acts on, or `None` for two-qubit gates.
    pub fn single_qubit_matrix(&self) -> Option<(usize, na::Matrix2<C64>)> {
        match *self {
            Self::I(k) => Some((k, gates::id())),
            Self::X(k) => Some((k, gates::x())),
            Self::Y(k) => Some((k, gates::y())),
            Self::Z(k) => Some((k, gates::z())),
            Self::H(k) => Some((k, gates::h())),
            Self::Rot(k, Axis::X, ang) => Some((k, gates::xrot(ang))),
            Self::Rot(k, Axis::Y, ang) => Some((k, gates::yrot(ang))),
            Self::Rot(k, Axis::Z, ang) => Some((k, gates::zrot(ang))),
            Self::Phase(k, ang) => Some((k, gates::phase(ang))),
            Self::CX(..) => None,
        }
    }
}

fn parse_qubit(name: &str, tok: Option<&str>) -> Result<usize> {
    let tok = tok.ok_or_else(|| {
        Error::config(format!("gate `{}`: missing qubit index", name))
    })?;
    tok.parse::<usize>()
        .map_err(|_| Error::config(format!(
            "gate `{}`: invalid qubit index `{}`", name, tok)))
}

fn parse_angle(name: &str, tok: Option<&str>) -> Result<f64> {
    let tok = tok.ok_or_else(|| {
        Error::config(format!("gate `{}`: missing angle", name))
    })?;
    tok.parse::<f64>()
        .map_err(|_| Error::config(format!(
            "gate `{}`: invalid angle `{}`", name, tok)))
}

impl FromStr for Gate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut toks = s.split_whitespace();
        let name = toks.next()
            .ok_or_else(|| Error::config("empty gate descriptor"))?
            .to_lowercase();
        let gate = match name.as_str() {
            "i" | "id" => Self::I(parse_qubit(&name, toks.next())?),
            "x" => Self::X(parse_qubit(&name, toks.next())?),
            "y" => Self::Y(parse_qubit(&name, toks.next())?),
            "z" => Self::Z(parse_qubit(&name, toks.next())?),
            "h" => Self::H(parse_qubit(&name, toks.next())?),
            "cx" | "cnot" => {
                let c = parse_qubit(&name, toks.next())?;
                let t = parse_qubit(&name, toks.next())?;
                Self::CX(c, t)
            },
            "rx" | "ry" | "rz" => {
                let axis = match name.as_str() {
                    "rx" => Axis::X,
                    "ry" => Axis::Y,
                    _ => Axis::Z,
                };
                let k = parse_qubit(&name, toks.next())?;
                let ang = parse_angle(&name, toks.next())?;
                Self::Rot(k, axis, ang)
            },
            "p" | "phase" => {
                let k = parse_qubit(&name, toks.next())?;
                let ang = parse_angle(&name, toks.next())?;
                Self::Phase(k, ang)
            },
            other => {
                return Err(Error::config(format!(
                    "unsupported gate `{}`", other)));
            },
        };
        if let Some(extra) = toks.next() {
            return Err(Error::config(format!(
                "gate `{}`: unexpected argument `{}`", name, extra)));
        }
        Ok(gate)
    }
}

/// Matrix definitions of the single-qubit gates.
pub mod gates {
    use super::*;

    /// Make an identity gate.
    pub fn id() -> na::Matrix2<C64> { na::Matrix2::identity() }

    /// Make an X gate.
    pub fn x() -> na::Matrix2<C64> {
        na::Matrix2::new(
            0.0.into(), 1.0.into(),
            1.0.into(), 0.0.into(),
        )
    }

    /// Make a Y gate.
    pub fn y() -> na::Matrix2<C64> {
        na::Matrix2::new(
            0.0.into(), -C64::i(),
            C64::i(),   0.0.into(),
        )
    }

    /// Make a Z gate.
    pub fn z() -> na::Matrix2<C64> {
        na::Matrix2::new(
            1.0.into(),   0.0.into(),
            0.0.into(), (-1.0).into(),
        )
    }

    /// Make a Hadamard gate.
    pub fn h() -> na::Matrix2<C64> {
        use std::f64::consts::FRAC_1_SQRT_2;
        na::Matrix2::new(
            FRAC_1_SQRT_2.into(),   FRAC_1_SQRT_2.into(),
            FRAC_1_SQRT_2.into(), (-FRAC_1_SQRT_2).into(),
        )
    }

    /// Make an X-rotation gate.
    pub fn xrot(angle: f64) -> na::Matrix2<C64> {
        let ang2 = angle / 2.0;
        let ondiag = C64::from(ang2.cos());
        let offdiag = -C64::i() * ang2.sin();
        na::Matrix2::new(
            ondiag,  offdiag,
            offdiag, ondiag,
        )
    }

    /// Make a Y-rotation gate.
    pub fn yrot(angle: f64) -> na::Matrix2<C64> {
        let ang2 = angle / 2.0;
        let ondiag = C64::from(ang2.cos());
        let offdiag = C64::from(ang2.sin());
        na::Matrix2::new(
            ondiag, -offdiag,
            offdiag, ondiag,
        )
    }

    /// Make a Z-rotation gate.
    pub fn zrot(angle: f64) -> na::Matrix2<C64> {
        let ang2 = angle / 2.0;
        na::Matrix2::new(
            C64::cis(-ang2), 0.0.into(),
            0.0.into(),      C64::cis(ang2),
        )
    }

    /// Make a phase gate.
    pub fn phase(angle: f64) -> na::Matrix2<C64> {
        na::Matrix2::new(
            1.0.into(), 0.0.into(),
            0.0.into(), C64::cis(angle),
        )
    }
}

/// A single-qubit Pauli *Y* matrix.
pub static PAULI_Y: Lazy<na::DMatrix<C64>> =
    Lazy::new(|| {
        let mut y = na::DMatrix::zeros(2, 2);
        y[(0, 1)] = -C64::i();
        y[(1, 0)] =  C64::i();
        y
    });

/// σ<sub>*y*</sub> ⊗ σ<sub>*y*</sub>, the two-qubit spin-flip operator.
pub static PAULI_YY: Lazy<na::DMatrix<C64>> =
    Lazy::new(|| PAULI_Y.kronecker(&*PAULI_Y));

/// Specify the basis in which to perform a projective measurement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Basis {
    /// Z-basis
    Z,
    /// X-basis
    X,
    /// Y-basis
    Y,
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Z => write!(f, "Z"),
            Self::X => write!(f, "X"),
            Self::Y => write!(f, "Y"),
        }
    }
}

impl FromStr for Basis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Z" | "z" => Ok(Self::Z),
            "X" | "x" => Ok(Self::X),
            "Y" | "y" => Ok(Self::Y),
            other => Err(Error::config(format!("unknown basis `{}`", other))),
        }
    }
}

impl Basis {
    /// All three measurement bases, in tomography order.
    pub const ALL: [Self; 3] = [Self::Z, Self::X, Self::Y];

    /// Return the gates rotating qubit `k` so that a Z-basis measurement
    /// afterwards measures in `self`.
    ///
    /// Y uses S<sup>†</sup> followed by H.
    pub fn rotation(self, k: usize) -> Vec<Gate> {
        use std::f64::consts::FRAC_PI_2;
        match self {
            Self::Z => Vec::new(),
            Self::X => vec![Gate::H(k)],
            Self::Y => vec![Gate::Phase(k, -FRAC_PI_2), Gate::H(k)],
        }
    }
}
