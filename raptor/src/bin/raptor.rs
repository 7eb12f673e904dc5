//! The `raptor` command-line tool: wires [`clap`]-parsed flags into
//! the library's `build`/`search` drivers.
//!
//! Argument parsing itself is an external collaborator's job, kept
//! out of the core crate; this binary is that collaborator. `upgrade`
//! and `layout` are out-of-scope subsystems
//! in their own right (legacy-format migration and HIBF layout
//! computation respectively) and are wired up only as stubs that fail
//! loudly rather than silently doing nothing.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgGroup, Parser, Subcommand};

use raptor::build::{self, bin_list, BuildOptions, FileReader};
use raptor::cancel::CancellationToken;
use raptor::search::{self, SearchOptions};
use raptor_core::Shape;

#[derive(Parser)]
#[command(name = "raptor", version, about = "Approximate-membership search over interleaved Bloom filters")]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Build an index from a bin-list file.
  #[command(group(ArgGroup::new("capacity").args(["size", "fpr"])))]
  Build {
    /// The bin-list input path (one technical bin per line).
    #[arg(long)]
    input: PathBuf,
    /// Where the finished index is written.
    #[arg(long)]
    output: PathBuf,
    /// K-mer size (ignored if `--shape` is given).
    #[arg(long, default_value_t = 19)]
    kmer: usize,
    /// Minimiser window length (must be >= the shape span).
    #[arg(long)]
    window: usize,
    /// An explicit gapped shape bitstring, e.g. `11011`.
    #[arg(long)]
    shape: Option<String>,
    /// An explicit per-bin bit count (`bits`, `Nk`, `Nm`, or `Ng`).
    #[arg(long)]
    size: Option<String>,
    /// Target false-positive rate (mutually exclusive with `--size`).
    #[arg(long)]
    fpr: Option<f64>,
    /// Number of hash functions, `1..=5`.
    #[arg(long, default_value_t = 2)]
    hash: usize,
    /// Optional partition count, a power of two.
    #[arg(long)]
    parts: Option<usize>,
    /// Store the index in its compressed (run-length-encoded) form.
    #[arg(long)]
    compressed: bool,
    /// Worker thread count.
    #[arg(long, default_value_t = 1)]
    threads: usize,
    /// The minimiser hash seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Treat the bin-list as SOCKS-style, with a leading colour token per line.
    #[arg(long)]
    socks: bool,
  },

  /// Search a query file against a built index.
  Search {
    /// The index to query (a single-file index or a partition manifest).
    #[arg(long)]
    index: PathBuf,
    /// The query file (FASTA or FASTQ).
    #[arg(long)]
    query: PathBuf,
    /// Where results are written (defaults to standard output).
    #[arg(long)]
    output: Option<PathBuf>,
    /// Tolerated substitution errors per read.
    #[arg(long, default_value_t = 0)]
    error: usize,
    /// Bypass the statistical model with `tau(L) = ceil(p * M)`.
    #[arg(long)]
    threshold: Option<f64>,
    /// Use a fixed pattern length for every read's threshold lookup.
    #[arg(long)]
    pattern: Option<usize>,
    /// Worker thread count.
    #[arg(long, default_value_t = 1)]
    threads: usize,
    /// Suppress the header block.
    #[arg(long)]
    quiet: bool,
  },

  /// Precompute `.minimiser` sidecar files for a bin-list's reference files.
  Prepare {
    /// The bin-list input path.
    #[arg(long)]
    input: PathBuf,
    /// K-mer size (ignored if `--shape` is given).
    #[arg(long, default_value_t = 19)]
    kmer: usize,
    /// Minimiser window length.
    #[arg(long)]
    window: usize,
    /// An explicit gapped shape bitstring.
    #[arg(long)]
    shape: Option<String>,
    /// The minimiser hash seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Treat the bin-list as SOCKS-style, with a leading colour token per line.
    #[arg(long)]
    socks: bool,
  },

  /// Upgrade a legacy on-disk index to the current format.
  ///
  /// Legacy-format migration is out of scope for this crate; always fails.
  Upgrade {
    /// The legacy index to upgrade.
    #[arg(long)]
    input: PathBuf,
  },

  /// Compute an HIBF layout from a bin-list.
  ///
  /// Out of scope for this crate: layout computation is a separate
  /// optimiser whose output this crate takes as input.
  Layout {
    /// The bin-list input path.
    #[arg(long)]
    input: PathBuf,
  },
}

fn parse_shape(kmer: usize, shape: Option<&str>) -> Result<Shape, String> {
  match shape {
    Some(s) => Shape::from_bitstring(s).map_err(|e| e.to_string()),
    None => Shape::ungapped(kmer).map_err(|e| e.to_string()),
  }
}

/// Parses a `--size` value: a bare integer (bits) or an integer
/// suffixed `k`/`m`/`g` (binary multiples).
fn parse_size(s: &str) -> Result<usize, String> {
  let s = s.trim();
  let (digits, multiplier) = match s.chars().last() {
    Some('k' | 'K') => (&s[..s.len() - 1], 1usize << 10),
    Some('m' | 'M') => (&s[..s.len() - 1], 1usize << 20),
    Some('g' | 'G') => (&s[..s.len() - 1], 1usize << 30),
    _ => (s, 1usize),
  };
  let base: usize = digits.trim().parse().map_err(|_| format!("invalid size '{s}'"))?;
  base.checked_mul(multiplier).ok_or_else(|| format!("size '{s}' overflows"))
}

/// Scans every bin's files to estimate the largest per-bin minimiser
/// count, used to size the filter when `--size` was not given. An
/// element count can also come from cached `.minimiser` sidecar files
/// instead of this sketching pass; this is the sketching path.
fn estimate_expected_elements(
  input: &Path,
  shape: Shape,
  window: usize,
  seed: u64,
  socks: bool,
) -> Result<usize, String> {
  let contents = std::fs::read_to_string(input).map_err(|e| e.to_string())?;
  let bins = bin_list::parse(&contents, socks);
  let mut max_count = 1usize;
  for bin in &bins {
    let mut count = 0usize;
    for file in &bin.files {
      let reader = FileReader::infer(file);
      reader
        .hash_into(file, shape, window, seed, &mut |_m| count += 1)
        .map_err(|e| format!("{}: {e}", file.display()))?;
    }
    max_count = max_count.max(count);
  }
  Ok(max_count)
}

fn run() -> Result<(), String> {
  let cli = Cli::parse();
  let cancel = CancellationToken::new();

  match cli.command {
    Command::Build {
      input,
      output,
      kmer,
      window,
      shape,
      size,
      fpr,
      hash,
      parts,
      compressed,
      threads,
      seed,
      socks,
    } => {
      let shape = parse_shape(kmer, shape.as_deref())?;
      if window < shape.span() {
        return Err(format!("--window {window} must be >= the shape span {}", shape.span()));
      }
      if let Some(p) = parts {
        if !p.is_power_of_two() {
          return Err(format!("--parts {p} must be a power of two"));
        }
      }
      if !(1..=5).contains(&hash) {
        return Err(format!("--hash {hash} must be in 1..=5"));
      }

      let explicit_bits = size.as_deref().map(parse_size).transpose()?;
      let expected_elements = if explicit_bits.is_some() {
        0
      } else {
        estimate_expected_elements(&input, shape, window, seed, socks)?
      };
      let target_fpr = fpr.unwrap_or(0.05);
      if !(0.0..=1.0).contains(&target_fpr) {
        return Err(format!("--fpr {target_fpr} must be in 0..=1"));
      }

      let mut options = BuildOptions::new(input, output, shape, window, target_fpr, expected_elements)
        .with_hash_count(hash)
        .with_parts(parts)
        .with_compressed(compressed)
        .with_threads(threads)
        .with_seed(seed)
        .with_socks(socks);
      if let Some(bits) = explicit_bits {
        options = options.with_explicit_bits_per_bin(Some(bits));
      }

      build::build(&options, &cancel).map_err(|e| e.to_string())?;
      Ok(())
    }

    Command::Search {
      index,
      query,
      output,
      error,
      threshold,
      pattern,
      threads,
      quiet,
    } => {
      if let Some(p) = threshold {
        if !(0.0..=1.0).contains(&p) {
          return Err(format!("--threshold {p} must be in 0..=1"));
        }
      }

      let options = SearchOptions::new(index, query, error)
        .with_output(output.clone())
        .with_threshold_override(threshold)
        .with_pattern_override(pattern)
        .with_threads(threads)
        .with_quiet(quiet);

      let mut stdout_writer;
      let mut file_writer;
      let writer: &mut dyn Write = match &output {
        Some(path) => {
          file_writer = BufWriter::new(std::fs::File::create(path).map_err(|e| e.to_string())?);
          &mut file_writer
        }
        None => {
          stdout_writer = BufWriter::new(io::stdout());
          &mut stdout_writer
        }
      };

      search::search(&options, &cancel, writer).map_err(|e| e.to_string())?;
      writer.flush().map_err(|e| e.to_string())?;
      Ok(())
    }

    Command::Prepare {
      input,
      kmer,
      window,
      shape,
      seed,
      socks,
    } => {
      let shape = parse_shape(kmer, shape.as_deref())?;
      if window < shape.span() {
        return Err(format!("--window {window} must be >= the shape span {}", shape.span()));
      }
      let contents = std::fs::read_to_string(&input).map_err(|e| e.to_string())?;
      let bins = bin_list::parse(&contents, socks);
      for bin in &bins {
        for file in &bin.files {
          let mut words = Vec::new();
          FileReader::infer(file)
            .hash_into(file, shape, window, seed, &mut |m| {
              words.extend_from_slice(&m.hash.to_le_bytes());
              words.extend_from_slice(&(m.begin as u64).to_le_bytes());
            })
            .map_err(|e| format!("{}: {e}", file.display()))?;
          let sidecar = file.with_extension("minimiser");
          std::fs::write(&sidecar, &words).map_err(|e| e.to_string())?;
          tracing::info!(path = %sidecar.display(), minimisers = words.len() / 16, "wrote sidecar");
        }
      }
      Ok(())
    }

    Command::Upgrade { input } => Err(format!(
      "upgrading legacy on-disk formats is out of scope for this rewrite (input: {})",
      input.display()
    )),

    Command::Layout { input } => Err(format!(
      "HIBF layout computation is a separate optimiser external to this crate (input: {})",
      input.display()
    )),
  }
}

fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  match run() {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("error: {e}");
      ExitCode::FAILURE
    }
  }
}
