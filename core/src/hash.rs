//! Canonical k-mer hashing under a gapped [`Shape`].
//!
//! The hash mixes the 2-bit ranks of the bases selected by the shape
//! through a fixed 64-bit avalanche, seeded by `seed XOR
//! CANON_SEED_XOR`. This matters: for ungapped shapes it keeps the
//! hash distinct from the raw bit-packed k-mer, which would otherwise
//! correlate strongly between successive overlapping k-mers in a
//! sliding window.

use crate::dna::{reverse_complement, Dna4};
use crate::shape::Shape;

/// XORed into the caller-supplied seed before hashing, so that an
/// ungapped shape's hash never degenerates to the bit-packed k-mer.
pub const CANON_SEED_XOR: u64 = 0x8F3F73B5CF1C9ADE;

/// A small, fully specified 64-bit avalanche mix (SplitMix64's
/// finalizer). Used both to mix k-mer bit-patterns into hashes and,
/// via [`crate::rng::SplitMix64`], to drive the threshold engine's
/// Monte-Carlo simulation — the same primitive in both places keeps
/// the crate's only source of "randomness" auditable in one spot.
#[inline]
pub const fn avalanche(mut x: u64) -> u64 {
  x ^= x >> 30;
  x = x.wrapping_mul(0xbf58476d1ce4e5b9);
  x ^= x >> 27;
  x = x.wrapping_mul(0x94d049bb133111eb);
  x ^= x >> 31;
  x
}

/// Packs the bases selected by `shape` out of a `shape.span()`-long
/// window into a dense `2 * shape.k()`-bit value, most significant
/// selected base first.
fn pack(window: &[Dna4], shape: &Shape) -> u64 {
  debug_assert_eq!(window.len(), shape.span());
  let mut packed: u64 = 0;
  for i in shape.selected_positions() {
    packed = (packed << 2) | window[i].rank() as u64;
  }
  packed
}

/// Hashes a `shape.span()`-long window of bases under `shape`, seeded
/// by `seed`.
///
/// # Panics
///
/// Panics (in debug builds) if `window.len() != shape.span()`.
#[inline]
pub fn hash(window: &[Dna4], shape: &Shape, seed: u64) -> u64 {
  let packed = pack(window, shape);
  avalanche(packed ^ (seed ^ CANON_SEED_XOR))
}

/// The canonical hash of a window: `min(hash(window), hash(revcomp(window)))`.
#[inline]
pub fn canonical(window: &[Dna4], shape: &Shape, seed: u64) -> u64 {
  let fwd = hash(window, shape, seed);
  let rc = reverse_complement(window);
  let rev = hash(&rc, shape, seed);
  fwd.min(rev)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn seq(s: &str) -> Vec<Dna4> {
    s.bytes().map(|b| Dna4::from_base(b).unwrap()).collect()
  }

  #[test]
  fn hash_is_deterministic() {
    let shape = Shape::ungapped(4).unwrap();
    let w = seq("ACGT");
    assert_eq!(hash(&w, &shape, 42), hash(&w, &shape, 42));
  }

  #[test]
  fn hash_differs_from_raw_packed_bits_for_ungapped_shape() {
    let shape = Shape::ungapped(4).unwrap();
    let w = seq("ACGT");
    let raw = pack(&w, &shape);
    assert_ne!(hash(&w, &shape, 0), raw);
  }

  #[test]
  fn canonical_is_reverse_complement_invariant() {
    let shape = Shape::ungapped(4).unwrap();
    let fwd = seq("ACGT");
    let rc = reverse_complement(&fwd);
    assert_eq!(canonical(&fwd, &shape, 7), canonical(&rc, &shape, 7));
  }

  #[test]
  fn gapped_shape_ignores_masked_positions() {
    // "11011": position 2 is masked out, so changing only that base
    // must not change the hash.
    let shape = Shape::from_bitstring("11011").unwrap();
    let a = seq("ACGTT");
    let mut b = a.clone();
    b[2] = if b[2] == Dna4::A { Dna4::C } else { Dna4::A };
    assert_eq!(hash(&a, &shape, 1), hash(&b, &shape, 1));
  }

  #[test]
  fn changing_a_selected_position_usually_changes_the_hash() {
    let shape = Shape::ungapped(4).unwrap();
    let a = seq("ACGT");
    let mut b = a.clone();
    b[0] = Dna4::T;
    assert_ne!(hash(&a, &shape, 9), hash(&b, &shape, 9));
  }
}
