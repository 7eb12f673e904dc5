//! The `h` position functions `p_i(x) = seeded_mix(x, seed_i) mod s`.

use raptor_core::hash::avalanche;

/// The largest hash function count the filter accepts.
pub const MAX_HASH_COUNT: usize = 5;

/// Fixed per-slot seeds, arbitrary but stable across versions: changing
/// them would silently invalidate every on-disk index built with an
/// older release.
const SEEDS: [u64; MAX_HASH_COUNT] = [
  0x9E3779B97F4A7C15,
  0xC2B2AE3D27D4EB4F,
  0x165667B19E3779F9,
  0x27D4EB2F165667C5,
  0xFF51AFD7ED558CCD,
];

/// Returns `p_i(x) mod bits_per_bin` for hash slot `i` (`i <
/// MAX_HASH_COUNT`).
#[inline]
pub fn position(x: u64, i: usize, bits_per_bin: usize) -> usize {
  let mixed = avalanche(x ^ SEEDS[i]);
  (mixed % bits_per_bin as u64) as usize
}
