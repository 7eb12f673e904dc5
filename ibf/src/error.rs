//! Leaf error type for filter construction.

use core::fmt;

/// An [`crate::InterleavedBloomFilter`] could not be built or resized
/// as requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IbfError {
  /// `bin_count` was zero.
  ZeroBins,
  /// `bits_per_bin` was zero.
  ZeroBits,
  /// `hash_count` was zero or greater than [`crate::hasher::MAX_HASH_COUNT`].
  InvalidHashCount {
    /// The requested hash function count.
    requested: usize,
  },
  /// [`crate::InterleavedBloomFilter::increase_bin_to`] was called with
  /// a bin count smaller than the current one.
  ShrinkingBinCount {
    /// The filter's current bin count.
    current: usize,
    /// The requested (smaller) bin count.
    requested: usize,
  },
  /// The requested layout's total bit count overflows addressable
  /// memory on this platform.
  OutOfResources {
    /// The number of bins requested.
    bins: usize,
    /// The number of bits per bin requested.
    bits_per_bin: usize,
  },
}

impl fmt::Display for IbfError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::ZeroBins => write!(f, "bin count must be at least 1"),
      Self::ZeroBits => write!(f, "bits per bin must be at least 1"),
      Self::InvalidHashCount { requested } => {
        write!(f, "hash count {requested} must be in 1..=5")
      }
      Self::ShrinkingBinCount { current, requested } => write!(
        f,
        "increase_bin_to({requested}) would shrink the filter from {current} bins"
      ),
      Self::OutOfResources { bins, bits_per_bin } => write!(
        f,
        "{bins} bins of {bits_per_bin} bits each exceeds addressable memory"
      ),
    }
  }
}

impl std::error::Error for IbfError {}
