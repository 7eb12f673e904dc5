//! The analytic "direct destruction" building block of the threshold
//! model: the probability that an error landing inside a minimiser's
//! own k-mer footprint changes that k-mer's hash.

use crate::shape::Shape;

/// Returns whether a base substitution at relative offset `i`
/// (`0 <= i < shape.span()`) changes the hash of the k-mer anchored at
/// the start of that footprint.
///
/// For ungapped shapes every offset inside `[0, span)` participates
/// (always `true`); for gapped shapes only the offsets where the
/// shape's mask bit is set do.
#[inline]
pub fn hits(shape: &Shape, offset: usize) -> bool {
  shape.bit(offset)
}

/// The probability that a substitution error, landing at a position
/// drawn uniformly from a minimiser's `span`-long footprint, changes
/// that k-mer's hash — i.e. the fraction of shape positions that are
/// set. `1.0` for ungapped shapes, `k / span` for gapped ones.
#[inline]
pub fn p_direct(shape: &Shape) -> f64 {
  shape.k() as f64 / shape.span() as f64
}
