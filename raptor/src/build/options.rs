use std::path::PathBuf;

use raptor_core::Shape;

/// Parameters for one `build` invocation.
#[viewit::viewit(getters(style = "ref"), setters(prefix = "with"))]
#[derive(Debug, Clone)]
pub struct BuildOptions {
  /// The bin-list file listing each technical bin's contributing paths.
  #[viewit(getter(const, attrs(doc = "The bin-list input path.")))]
  input: PathBuf,

  /// Where the finished index is written.
  #[viewit(getter(const, attrs(doc = "The index output path.")))]
  output: PathBuf,

  /// The k-mer shape.
  #[viewit(getter(const, attrs(doc = "The k-mer shape.")))]
  shape: Shape,

  /// The minimiser window length (`>= shape.span()`).
  #[viewit(getter(const, attrs(doc = "The minimiser window length.")))]
  window: usize,

  /// Target false-positive rate per technical bin.
  #[viewit(getter(const, attrs(doc = "The target false-positive rate.")))]
  fpr: f64,

  /// Number of hash functions (`1..=5`).
  #[viewit(getter(const, attrs(doc = "The hash function count.")))]
  hash_count: usize,

  /// Expected element count per bin, used to size bit capacity.
  #[viewit(getter(const, attrs(doc = "The expected per-bin element count.")))]
  expected_elements: usize,

  /// Optional partition count (power of two); `None` means unpartitioned.
  #[viewit(getter(const, attrs(doc = "The optional partition count.")))]
  parts: Option<usize>,

  /// Whether to compress the finished index before writing it.
  #[viewit(getter(const, attrs(doc = "Whether the finished index is compressed.")))]
  compressed: bool,

  /// Worker thread count.
  #[viewit(getter(const, attrs(doc = "The worker thread count.")))]
  threads: usize,

  /// The minimiser hash seed.
  #[viewit(getter(const, attrs(doc = "The minimiser hash seed.")))]
  seed: u64,

  /// `--size`: an explicit per-bin bit count, bypassing the
  /// `fpr`/`expected_elements` sizing formula entirely.
  #[viewit(getter(const, attrs(doc = "An optional explicit per-bin bit count.")))]
  explicit_bits_per_bin: Option<usize>,

  /// SOCKS mode: when `true`, each bin-list line's leading colour
  /// token is stripped before its paths are read.
  #[viewit(getter(const, attrs(doc = "Whether the bin-list is in SOCKS colour-token form.")))]
  socks: bool,
}

impl BuildOptions {
  /// Creates options with the given required parameters and
  /// conservative defaults for the rest (`hash_count = 2`, `parts =
  /// None`, `compressed = false`, `threads = 1`, `seed = 0`, `socks =
  /// false`).
  pub fn new(
    input: PathBuf,
    output: PathBuf,
    shape: Shape,
    window: usize,
    fpr: f64,
    expected_elements: usize,
  ) -> Self {
    Self {
      input,
      output,
      shape,
      window,
      fpr,
      hash_count: 2,
      expected_elements,
      parts: None,
      compressed: false,
      threads: 1,
      seed: 0,
      explicit_bits_per_bin: None,
      socks: false,
    }
  }
}
