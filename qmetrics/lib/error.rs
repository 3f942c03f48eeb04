//! Error taxonomy shared by every module in the crate.
//!
//! Malformed inputs (wrong dimensions, unknown kinds) fail fast, while
//! numerical faults inside a metric surface as [`Error::Unavailable`] so that
//! callers can report "N/A" instead of aborting.

use thiserror::Error;

/// Any failure produced by this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Wrong matrix/vector dimensions or a partition that doesn't fit.
    #[error("shape error: {0}")]
    Shape(String),

    /// Unknown gate, code, basis, or measure kind, or an invalid circuit
    /// description.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An eigen-decomposition or search failed or produced a non-physical
    /// result.
    #[error("numerically unavailable: {0}")]
    Unavailable(String),

    /// An input violates a physical constraint beyond tolerance.
    #[error("precondition failed: {0}")]
    Precondition(String),
}

impl Error {
    /// Return `true` if `self` is the "unavailable" sentinel.
    pub fn is_unavailable(&self) -> bool { matches!(self, Self::Unavailable(..)) }

    pub(crate) fn shape<S: Into<String>>(msg: S) -> Self {
        Self::Shape(msg.into())
    }

    pub(crate) fn config<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn unavailable<S: Into<String>>(msg: S) -> Self {
        Self::Unavailable(msg.into())
    }

    pub(crate) fn precondition<S: Into<String>>(msg: S) -> Self {
        Self::Precondition(msg.into())
    }
}

/// Result type for all fallible operations in the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Conversion of a metric result into an optional value, where `None` stands
/// for [`Error::Unavailable`] and every other error is still propagated.
pub trait MetricResult {
    fn available(self) -> Result<Option<f64>>;
}

impl MetricResult for Result<f64> {
    fn available(self) -> Result<Option<f64>> {
        match self {
            Ok(x) => Ok(Some(x)),
            Err(Error::Unavailable(why)) => {
                tracing::debug!(%why, "metric unavailable");
                Ok(None)
            },
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn available_maps_only_unavailable() {
        let ok: Result<f64> = Ok(0.5);
        assert_eq!(ok.available(), Ok(Some(0.5)));

        let na: Result<f64> = Err(Error::unavailable("eigen"));
        assert_eq!(na.available(), Ok(None));

        let shape: Result<f64> = Err(Error::shape("3x3"));
        assert!(matches!(shape.available(), Err(Error::Shape(_))));
    }

    #[test]
    fn display() {
        let err = Error::config("unknown gate `foo`");
        assert_eq!(err.to_string(), "configuration error: unknown gate `foo`");
        assert!(!err.is_unavailable());
    }
}
