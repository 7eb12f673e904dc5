use std::sync::atomic::{AtomicU64, Ordering};

use crate::bits::Layout;
use crate::error::IbfError;
use crate::hasher::{self, MAX_HASH_COUNT};

/// A bit-sliced Bloom filter storing `B` bins side by side, so that a
/// single membership query over one hash returns a `B`-bit occupancy
/// vector in one pass.
///
/// Once built, an [`InterleavedBloomFilter`] is immutable from the
/// point of view of membership queries: [`Self::bulk_contains`] and
/// [`Self::bulk_contains_into`] are pure functions of the bit vector.
/// [`Self::emplace`] is the only mutator, and is safe to call from
/// many threads concurrently: it only ever turns bits on, via relaxed
/// atomic fetch-or, so the result does not depend on call ordering.
/// Reads during a concurrent build are undefined from the caller's
/// perspective; the design requires all writer threads to drain
/// before any query begins (see the crate-level build/query
/// discipline notes).
#[derive(Debug)]
pub struct InterleavedBloomFilter {
  layout: Layout,
  hash_count: usize,
  words: Box<[AtomicU64]>,
}

impl InterleavedBloomFilter {
  /// Creates a filter with `bins` technical bins, each holding at
  /// least `bits_per_bin` bits (rounded up to a multiple of 64), using
  /// `hash_count` hash functions (`1..=5`). All bits start cleared.
  pub fn new(bins: usize, bits_per_bin: usize, hash_count: usize) -> Result<Self, IbfError> {
    if bins == 0 {
      return Err(IbfError::ZeroBins);
    }
    if bits_per_bin == 0 {
      return Err(IbfError::ZeroBits);
    }
    if hash_count == 0 || hash_count > MAX_HASH_COUNT {
      return Err(IbfError::InvalidHashCount {
        requested: hash_count,
      });
    }

    let layout = Layout::new(bins, bits_per_bin);
    let total = layout.total_words();
    if total.checked_mul(8).is_none() {
      return Err(IbfError::OutOfResources { bins, bits_per_bin });
    }

    let mut words = Vec::with_capacity(total);
    words.resize_with(total, || AtomicU64::new(0));

    Ok(Self {
      layout,
      hash_count,
      words: words.into_boxed_slice(),
    })
  }

  /// The number of logical bins (`B`).
  #[inline]
  pub fn bin_count(&self) -> usize {
    self.layout.bins
  }

  /// The number of bits allocated to each bin (`s`, a multiple of 64).
  #[inline]
  pub fn bits_per_bin(&self) -> usize {
    self.layout.bits_per_bin
  }

  /// The number of hash functions this filter uses (`h`).
  #[inline]
  pub fn hash_count(&self) -> usize {
    self.hash_count
  }

  /// Words spanned by one position's occupancy vector (`B_pad / 64`).
  #[inline]
  pub fn row_words(&self) -> usize {
    self.layout.row_words
  }

  /// Sets the `h` bits that `x` maps to in bin `bin`. Idempotent:
  /// calling twice with the same arguments leaves the filter
  /// unchanged the second time. `O(h)`.
  ///
  /// # Panics
  ///
  /// Panics if `bin >= self.bin_count()`.
  pub fn emplace(&self, x: u64, bin: usize) {
    assert!(bin < self.layout.bins, "bin index out of range");
    for i in 0..self.hash_count {
      let p = hasher::position(x, i, self.layout.bits_per_bin);
      let (word_idx, bit_offset) = self.layout.locate(p, bin);
      self.words[word_idx].fetch_or(1u64 << bit_offset, Ordering::Relaxed);
    }
  }

  /// Fills `out` (length must be at least [`Self::row_words`]) with
  /// the AND of the `h` occupancy vectors for `x`: bit `b` of `out` is
  /// set iff `emplace(x, b)` was called (or a collision made it look
  /// that way).
  ///
  /// This is the hot path: callers performing many queries should
  /// reuse one `out` buffer (see [`crate::agent::MembershipAgent`])
  /// rather than allocating per call.
  pub fn bulk_contains_into(&self, x: u64, out: &mut [u64]) {
    let row_words = self.layout.row_words;
    debug_assert!(out.len() >= row_words);

    let p0 = hasher::position(x, 0, self.layout.bits_per_bin);
    let base0 = p0 * row_words;
    for j in 0..row_words {
      out[j] = self.words[base0 + j].load(Ordering::Relaxed);
    }

    for i in 1..self.hash_count {
      let p = hasher::position(x, i, self.layout.bits_per_bin);
      let base = p * row_words;
      for j in 0..row_words {
        out[j] &= self.words[base + j].load(Ordering::Relaxed);
      }
    }
  }

  /// Convenience wrapper over [`Self::bulk_contains_into`] that
  /// allocates and returns one bit per bin.
  pub fn bulk_contains(&self, x: u64) -> Vec<bool> {
    let mut words = vec![0u64; self.layout.row_words];
    self.bulk_contains_into(x, &mut words);
    (0..self.layout.bins)
      .map(|b| (words[b / 64] >> (b % 64)) & 1 != 0)
      .collect()
  }

  /// Grows the filter to `new_bins` bins, preserving every existing
  /// bin's bits at the same logical position. New bins start cleared.
  /// Fails if `new_bins < self.bin_count()`.
  pub fn increase_bin_to(&self, new_bins: usize) -> Result<Self, IbfError> {
    if new_bins < self.layout.bins {
      return Err(IbfError::ShrinkingBinCount {
        current: self.layout.bins,
        requested: new_bins,
      });
    }

    let grown = Self::new(new_bins, self.layout.bits_per_bin, self.hash_count)?;
    for p in 0..self.layout.bits_per_bin {
      for b in 0..self.layout.bins {
        let (src_word, src_bit) = self.layout.locate(p, b);
        if (self.words[src_word].load(Ordering::Relaxed) >> src_bit) & 1 != 0 {
          let (dst_word, dst_bit) = grown.layout.locate(p, b);
          grown.words[dst_word].fetch_or(1u64 << dst_bit, Ordering::Relaxed);
        }
      }
    }
    Ok(grown)
  }

  /// A read-only view over the raw backing words, row-major by
  /// position, used by the on-disk serialiser and by
  /// [`crate::compressed`].
  pub fn raw_words(&self) -> Vec<u64> {
    self.words.iter().map(|w| w.load(Ordering::Relaxed)).collect()
  }

  /// Rebuilds a filter from a previously-serialised word vector. The
  /// caller is responsible for ensuring `words.len()` matches the
  /// layout implied by `(bins, bits_per_bin)`.
  pub fn from_raw_words(
    bins: usize,
    bits_per_bin: usize,
    hash_count: usize,
    words: Vec<u64>,
  ) -> Result<Self, IbfError> {
    let filter = Self::new(bins, bits_per_bin, hash_count)?;
    assert_eq!(words.len(), filter.words.len(), "word count mismatch for layout");
    for (slot, w) in filter.words.iter().zip(words) {
      slot.store(w, Ordering::Relaxed);
    }
    Ok(filter)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn emplace_then_contains_has_no_false_negatives() {
    let filter = InterleavedBloomFilter::new(70, 1024, 3).unwrap();
    for x in 0u64..200 {
      filter.emplace(x, (x % 70) as usize);
    }
    for x in 0u64..200 {
      let result = filter.bulk_contains(x);
      assert!(result[(x % 70) as usize]);
    }
  }

  #[test]
  fn bulk_contains_is_pure() {
    let filter = InterleavedBloomFilter::new(10, 256, 2).unwrap();
    filter.emplace(42, 3);
    let a = filter.bulk_contains(42);
    let b = filter.bulk_contains(42);
    assert_eq!(a, b);
  }

  #[test]
  fn emplace_is_idempotent() {
    let filter = InterleavedBloomFilter::new(10, 256, 2).unwrap();
    filter.emplace(42, 3);
    let once = filter.raw_words();
    filter.emplace(42, 3);
    let twice = filter.raw_words();
    assert_eq!(once, twice);
  }

  #[test]
  fn increase_bin_to_preserves_existing_bins() {
    let filter = InterleavedBloomFilter::new(10, 256, 2).unwrap();
    filter.emplace(99, 4);
    let grown = filter.increase_bin_to(20).unwrap();
    assert!(grown.bulk_contains(99)[4]);
    assert_eq!(grown.bin_count(), 20);
  }

  #[test]
  fn increase_bin_to_rejects_shrinking() {
    let filter = InterleavedBloomFilter::new(10, 256, 2).unwrap();
    assert!(filter.increase_bin_to(5).is_err());
  }

  #[test]
  fn rejects_invalid_construction_arguments() {
    assert!(InterleavedBloomFilter::new(0, 256, 2).is_err());
    assert!(InterleavedBloomFilter::new(10, 0, 2).is_err());
    assert!(InterleavedBloomFilter::new(10, 256, 0).is_err());
    assert!(InterleavedBloomFilter::new(10, 256, 6).is_err());
  }

  #[test]
  fn emplace_out_of_range_bin_panics() {
    let filter = InterleavedBloomFilter::new(10, 256, 2).unwrap();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| filter.emplace(1, 10)));
    assert!(result.is_err());
  }
}
