use std::path::PathBuf;

/// Parameters for one `search` invocation.
#[viewit::viewit(getters(style = "ref"), setters(prefix = "with"))]
#[derive(Debug, Clone)]
pub struct SearchOptions {
  /// The index to query (a single-file index, or a partition manifest).
  #[viewit(getter(const, attrs(doc = "The index path.")))]
  index: PathBuf,

  /// The query file (FASTA or FASTQ).
  #[viewit(getter(const, attrs(doc = "The query input path.")))]
  query: PathBuf,

  /// Where results are written; `None` means standard output.
  #[viewit(getter(const, attrs(doc = "The output path, or `None` for stdout.")))]
  output: Option<PathBuf>,

  /// Tolerated substitution errors per read.
  #[viewit(getter(const, attrs(doc = "The tolerated error count.")))]
  errors: usize,

  /// `--threshold p`: bypasses the statistical model with
  /// `tau(L) = ceil(p * M)`.
  #[viewit(getter(const, attrs(doc = "An optional threshold-fraction override.")))]
  threshold_override: Option<f64>,

  /// `--pattern L`: uses `L` for every read's threshold lookup
  /// instead of each read's own length.
  #[viewit(getter(const, attrs(doc = "An optional fixed pattern length override.")))]
  pattern_override: Option<usize>,

  /// Worker thread count.
  #[viewit(getter(const, attrs(doc = "The worker thread count.")))]
  threads: usize,

  /// Suppresses the `#<tid>\t<path>` / `#QUERY_NAME\tUSER_BINS` header.
  #[viewit(getter(const, attrs(doc = "Whether the header block is suppressed.")))]
  quiet: bool,
}

impl SearchOptions {
  /// Creates options with the given required parameters and
  /// conservative defaults for the rest (`output = None`, no
  /// overrides, `threads = 1`, `quiet = false`).
  pub fn new(index: PathBuf, query: PathBuf, errors: usize) -> Self {
    Self {
      index,
      query,
      output: None,
      errors,
      threshold_override: None,
      pattern_override: None,
      threads: 1,
      quiet: false,
    }
  }
}
