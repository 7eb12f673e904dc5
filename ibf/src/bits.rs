//! Layout math for the interleaved bit vector.
//!
//! Logical bit `(position p, bin b)` lives at physical bit index
//! `p * bin_pad + b`, where `bin_pad` rounds the bin count up to a
//! multiple of 64. That keeps every position's occupancy vector
//! aligned to whole 64-bit words, so a bulk query is a sequential scan
//! over `bin_pad / 64` words per hash function.

/// Rounds `n` up to the next multiple of 64 (unchanged if already a
/// multiple, including zero).
#[inline]
pub const fn round_up_64(n: usize) -> usize {
  (n + 63) & !63
}

/// The physical bit-vector layout derived from a bin count and bits
/// per bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
  /// Logical bin count (`B`).
  pub bins: usize,
  /// Bin count rounded up to a multiple of 64 (`B_pad`).
  pub bin_pad: usize,
  /// Bits per bin (`s`), already a multiple of 64.
  pub bits_per_bin: usize,
  /// `bin_pad / 64`: words spanned by one position's occupancy vector.
  pub row_words: usize,
}

impl Layout {
  /// Derives a layout for `bins` bins of at least `bits_per_bin` bits
  /// each (rounded up to a multiple of 64).
  pub const fn new(bins: usize, bits_per_bin: usize) -> Self {
    let bin_pad = round_up_64(bins);
    let bits_per_bin = round_up_64(bits_per_bin);
    Self {
      bins,
      bin_pad,
      bits_per_bin,
      row_words: bin_pad / 64,
    }
  }

  /// Total number of 64-bit words backing the filter.
  #[inline]
  pub const fn total_words(&self) -> usize {
    self.bits_per_bin * self.row_words
  }

  /// The word index holding bit `b` of position `p`'s occupancy
  /// vector, and the bit offset within that word.
  #[inline]
  pub const fn locate(&self, position: usize, bin: usize) -> (usize, u32) {
    let word_offset = bin / 64;
    let bit_offset = (bin % 64) as u32;
    (position * self.row_words + word_offset, bit_offset)
  }
}
