//! Measurement-outcome histograms keyed by bitstring.

use std::{ collections::BTreeMap, fmt };
use crate::{
    circuit::MAX_CLBITS,
    error::{ Error, Result },
    state::bitstring,
};

/// Number of values of a `width`-bit register.
///
/// Fails with a shape error above [`MAX_CLBITS`] bits.
pub(crate) fn register_dim(width: usize) -> Result<usize> {
    u32::try_from(width).ok()
        .filter(|_| width <= MAX_CLBITS)
        .and_then(|w| 1_usize.checked_shl(w))
        .ok_or_else(|| Error::shape(format!(
            "{}-bit register exceeds the limit of {}", width, MAX_CLBITS)))
}

/// Map from a bitstring to the number of times it was observed.
///
/// Bitstrings are written with bit 0 rightmost. Zero counts are never stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Counts(BTreeMap<String, u64>);

impl Counts {
    /// Create a new, empty histogram.
    pub fn new() -> Self { Self::default() }

    /// Scale a probability distribution over `width`-bit register values to
    /// integer counts summing exactly to `shots`.
    ///
    /// Each value first receives ⌊p·shots⌋; the shots left over go one each to
    /// the values with the largest fractional remainders, ties going to the
    /// lower register value. Negative entries are clipped to zero and the
    /// distribution is renormalized.
    pub fn from_probabilities(probs: &[f64], width: usize, shots: u64)
        -> Result<Self>
    {
        if probs.len() > register_dim(width)? {
            return Err(Error::shape(format!(
                "{} probabilities do not fit a {}-bit register",
                probs.len(), width)));
        }
        let clipped: Vec<f64> = probs.iter().map(|p| p.max(0.0)).collect();
        let total: f64 = clipped.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(Error::precondition(
                "probability distribution has no support"));
        }
        let exact: Vec<f64>
            = clipped.iter().map(|p| p / total * shots as f64).collect();
        let mut alloc: Vec<u64> = exact.iter().map(|x| x.floor() as u64).collect();
        let assigned: u64 = alloc.iter().sum();
        let mut order: Vec<usize> = (0..exact.len()).collect();
        // stable sort keeps lower indices first among equal remainders
        order.sort_by(|&a, &b| {
            let ra = exact[a] - exact[a].floor();
            let rb = exact[b] - exact[b].floor();
            rb.total_cmp(&ra)
        });
        order.iter()
            .take(shots.saturating_sub(assigned) as usize)
            .for_each(|&i| { alloc[i] += 1; });
        Ok(
            alloc.into_iter()
                .enumerate()
                .map(|(idx, c)| (bitstring(idx, width), c))
                .collect()
        )
    }

    /// Add `count` observations of `bits`.
    pub fn insert<S: Into<String>>(&mut self, bits: S, count: u64) {
        if count == 0 { return; }
        *self.0.entry(bits.into()).or_insert(0) += count;
    }

    /// Number of observations of `bits`.
    pub fn get(&self, bits: &str) -> u64 {
        self.0.get(bits).copied().unwrap_or(0)
    }

    /// Total number of observations.
    pub fn total(&self) -> u64 { self.0.values().sum() }

    /// Number of distinct outcomes.
    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Iterate over `(bitstring, count)` pairs in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Check that every bitstring has length `width` and consists only of
    /// `'0'` and `'1'`.
    pub fn check_width(&self, width: usize) -> Result<()> {
        for bits in self.0.keys() {
            if bits.len() != width {
                return Err(Error::shape(format!(
                    "bitstring `{}` has length {}, expected {}",
                    bits, bits.len(), width)));
            }
            if !bits.bytes().all(|b| b == b'0' || b == b'1') {
                return Err(Error::shape(format!(
                    "`{}` is not a bitstring", bits)));
            }
        }
        Ok(())
    }

    /// Convert to a dense vector of counts indexed by register value.
    pub fn to_dense(&self, width: usize) -> Result<Vec<u64>> {
        self.check_width(width)?;
        let mut dense: Vec<u64> = vec![0; register_dim(width)?];
        for (bits, c) in self.iter() {
            let idx = usize::from_str_radix(bits, 2)
                .map_err(|_| Error::shape(format!(
                    "`{}` is not a bitstring", bits)))?;
            dense[idx] += c;
        }
        Ok(dense)
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for Counts {
    fn from_iter<I>(iter: I) -> Self
    where I: IntoIterator<Item = (S, u64)>
    {
        let mut counts = Self::new();
        iter.into_iter().for_each(|(bits, c)| counts.insert(bits, c));
        counts
    }
}

impl IntoIterator for Counts {
    type Item = (String, u64);
    type IntoIter = std::collections::btree_map::IntoIter<String, u64>;

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (bits, c)) in self.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            write!(f, "\"{}\": {}", bits, c)?;
        }
        write!(f, "}}")
    }
}
