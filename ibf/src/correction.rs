//! Bit-capacity sizing and the false-positive correction factor for
//! bins split across multiple technical bins (spec source:
//! `ibf_fpr.cpp`'s `bin_size_in_bits` / `compute_fp_correction`).

/// The number of bits a single bin needs to hold `elements` keys at
/// hash count `hash_count` while bounding its false-positive rate to
/// `fpr`.
pub fn bin_size_in_bits(elements: usize, hash_count: usize, fpr: f64) -> usize {
  let numerator = -(elements as f64 * hash_count as f64);
  let denominator = (1.0 - (fpr.ln() / hash_count as f64).exp()).ln();
  (numerator / denominator).ceil() as usize
}

/// The bit-capacity correction factor `c(f, h, P)` applied when a
/// single user bin is split across `splits` technical bins: each
/// technical bin's capacity (as sized by [`bin_size_in_bits`] for its
/// share of the elements) is multiplied by this factor to hold the
/// same effective global false-positive rate `f` across the whole
/// split bin.
///
/// Uses `ln_1p` throughout, matching the source's use of `log1p`,
/// because every term here is `log(1 - x)` for `x` close to zero at
/// typical target FPRs.
pub fn correction_factor(fpr: f64, hash_count: usize, splits: usize) -> f64 {
  let numerator = (-(fpr.ln() / hash_count as f64).exp()).ln_1p();
  let log_target_fpr = (-((-fpr).ln_1p() / splits as f64).exp()).ln_1p();
  numerator / (-(log_target_fpr / hash_count as f64).exp()).ln_1p()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn larger_fpr_needs_fewer_bits() {
    let tight = bin_size_in_bits(1000, 2, 0.01);
    let loose = bin_size_in_bits(1000, 2, 0.1);
    assert!(loose < tight);
  }

  #[test]
  fn correction_is_at_least_one_for_multiple_splits() {
    // Splitting a bin can only ever require more (or equal) bits per
    // part to hold the same global FPR, never fewer.
    let c = correction_factor(0.05, 2, 4);
    assert!(c >= 1.0, "correction factor was {c}");
  }

  #[test]
  fn no_split_is_the_identity() {
    let c = correction_factor(0.05, 2, 1);
    assert!((c - 1.0).abs() < 1e-9, "correction factor was {c}");
  }
}
