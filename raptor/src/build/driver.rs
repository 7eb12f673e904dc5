//! The bin-parallel build worker.
//!
//! One worker thread owns a contiguous slice of technical bins. Each
//! worker streams its bins' files through [`FileReader`] and emplaces
//! every minimiser hash into the filter (or, when partitioned, the
//! one part [`partition::hash_partition`] selects). Workers never
//! share mutable state beyond the filter's atomic words, so no
//! cross-worker synchronisation beyond the final `thread::scope` join
//! is needed; `emplace` only ever turns bits on, so write order
//! between workers is immaterial.

use std::sync::Mutex;

use raptor_core::minimiser::Minimiser;
use raptor_ibf::{correction, InterleavedBloomFilter};

use crate::build::bin_list::{self, Bin};
use crate::build::options::BuildOptions;
use crate::build::reader::FileReader;
use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::index::format::{self, IbfBody, Index};
use crate::index::partition::{self, Manifest};

/// The product of a successful build: either one index file, or a
/// manifest plus its parts.
pub enum BuildOutput {
  /// A single, unpartitioned index was written.
  Single,
  /// A partitioned index was written: the manifest plus each part.
  Partitioned {
    /// Number of parts written.
    parts: usize,
  },
}

/// Runs a full build: reads the bin-list, sizes and allocates the
/// filter(s), streams every bin's minimisers across
/// `options.threads()` workers, and writes the finished index.
#[tracing::instrument(skip_all, fields(input = %options.input().display(), threads = options.threads()))]
pub fn build(options: &BuildOptions, cancel: &CancellationToken) -> Result<BuildOutput> {
  let contents = std::fs::read_to_string(options.input()).map_err(|e| Error::InputUnreadable {
    path: options.input().to_path_buf(),
    reason: e.to_string(),
  })?;
  let bins = bin_list::parse(&contents, *options.socks());
  if bins.is_empty() {
    return Err(Error::InvalidArgument("bin-list is empty".to_string()));
  }
  tracing::info!(bins = bins.len(), parts = options.parts().unwrap_or(1), "starting build");

  let hash_count = *options.hash_count();
  let fpr = *options.fpr();
  let parts = options.parts().unwrap_or(1);
  let correction_factor = correction::correction_factor(fpr, hash_count, parts);
  let bits_per_bin = match options.explicit_bits_per_bin() {
    Some(bits) => *bits,
    None => {
      (correction::bin_size_in_bits(*options.expected_elements(), hash_count, fpr) as f64 * correction_factor).ceil()
        as usize
    }
  };

  let filters: Vec<InterleavedBloomFilter> = (0..parts)
    .map(|_| InterleavedBloomFilter::new(bins.len(), bits_per_bin, hash_count))
    .collect::<std::result::Result<_, _>>()?;

  run_workers(options, &bins, &filters, cancel)?;

  if cancel.is_cancelled() {
    tracing::warn!("build cancelled before all workers drained");
    return Err(Error::Cancelled);
  }
  tracing::info!("all workers drained, writing index");

  let bin_paths: Vec<Vec<String>> = bins
    .iter()
    .map(|b| b.files.iter().map(|p| p.to_string_lossy().into_owned()).collect())
    .collect();

  write_output(options, filters, bin_paths, correction_factor)
}

fn run_workers(
  options: &BuildOptions,
  bins: &[Bin],
  filters: &[InterleavedBloomFilter],
  cancel: &CancellationToken,
) -> Result<()> {
  let threads = (*options.threads()).max(1);
  let shape = *options.shape();
  let window = *options.window();
  let seed = *options.seed();
  let partitioned = *options.parts();

  let first_error: Mutex<Option<Error>> = Mutex::new(None);

  std::thread::scope(|scope| {
    let chunk_size = bins.len().div_ceil(threads).max(1);
    for (worker_index, chunk) in bins.chunks(chunk_size).enumerate() {
      let base = worker_index * chunk_size;
      let first_error = &first_error;
      scope.spawn(move || {
        let span = tracing::debug_span!("build_worker", worker_index, bins = chunk.len());
        let _enter = span.enter();
        for (offset, bin) in chunk.iter().enumerate() {
          if cancel.is_cancelled() {
            return;
          }
          let bin_index = base + offset;
          for file in &bin.files {
            if cancel.is_cancelled() {
              return;
            }
            let reader = FileReader::infer(file);
            let emplace = |m: Minimiser| match partitioned {
              Some(p) => filters[partition::hash_partition(m.hash, p)].emplace(m.hash, bin_index),
              None => filters[0].emplace(m.hash, bin_index),
            };
            let mut sink = emplace;
            if let Err(e) = reader.hash_into(file, shape, window, seed, &mut sink) {
              tracing::warn!(path = %file.display(), error = %e, "failed to read input file");
              let mut slot = first_error.lock().unwrap();
              if slot.is_none() {
                *slot = Some(Error::InputUnreadable {
                  path: file.clone(),
                  reason: e.to_string(),
                });
              }
              cancel.cancel();
              return;
            }
          }
        }
        tracing::debug!(worker_index, "worker finished");
      });
    }
  });

  match first_error.into_inner().unwrap() {
    Some(e) => Err(e),
    None => Ok(()),
  }
}

fn write_output(
  options: &BuildOptions,
  filters: Vec<InterleavedBloomFilter>,
  bin_paths: Vec<Vec<String>>,
  fpr_correction: f64,
) -> Result<BuildOutput> {
  let compressed = *options.compressed();
  let shape = *options.shape();
  let window = *options.window();
  let hash_count = *options.hash_count();
  let target_fpr = *options.fpr();
  let seed = *options.seed();

  let body_of = |filter: InterleavedBloomFilter| -> IbfBody {
    if compressed {
      IbfBody::Compressed(raptor_ibf::CompressedInterleavedBloomFilter::compress(&filter))
    } else {
      IbfBody::Plain(filter)
    }
  };

  if filters.len() == 1 {
    let bits_per_bin = filters[0].bits_per_bin();
    let index = Index {
      shape,
      window,
      hash_count,
      bits_per_bin,
      fpr_correction,
      target_fpr,
      seed,
      bin_paths,
      body: body_of(filters.into_iter().next().unwrap()),
    };
    format::write(options.output(), &index)?;
    return Ok(BuildOutput::Single);
  }

  let parts = filters.len();
  let (manifest, paths) = Manifest::conventional(options.output(), parts);
  for (filter, path) in filters.into_iter().zip(paths) {
    let bits_per_bin = filter.bits_per_bin();
    let index = Index {
      shape,
      window,
      hash_count,
      bits_per_bin,
      fpr_correction,
      target_fpr,
      seed,
      bin_paths: bin_paths.clone(),
      body: body_of(filter),
    };
    format::write(&path, &index)?;
  }
  manifest.write(options.output())?;
  Ok(BuildOutput::Partitioned { parts })
}

#[cfg(test)]
mod tests {
  use super::*;
  use raptor_core::Shape;
  use std::io::Write;
  use std::path::PathBuf;

  fn write_fasta(dir: &tempfile::TempDir, name: &str, seq: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, ">r\n{seq}").unwrap();
    path
  }

  #[test]
  fn builds_a_single_bin_index_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_fasta(&dir, "a.fa", "ACGTACGTACGTACGTACGTACGT");
    let b = write_fasta(&dir, "b.fa", "TTTTTTTTTTTTTTTTTTTTTTTT");

    let list_path = dir.path().join("bins.txt");
    std::fs::write(&list_path, format!("{}\n{}\n", a.display(), b.display())).unwrap();

    let output = dir.path().join("index.raptor");
    let options = BuildOptions::new(list_path, output.clone(), Shape::ungapped(8).unwrap(), 12, 0.05, 50)
      .with_threads(2);

    let cancel = CancellationToken::new();
    let result = build(&options, &cancel).unwrap();
    assert!(matches!(result, BuildOutput::Single));

    let index = format::read(&output).unwrap();
    assert_eq!(index.bin_paths.len(), 2);
  }

  #[test]
  fn builds_partitioned_index() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_fasta(&dir, "a.fa", "ACGTACGTACGTACGTACGTACGT");

    let list_path = dir.path().join("bins.txt");
    std::fs::write(&list_path, format!("{}\n", a.display())).unwrap();

    let output = dir.path().join("index.raptor");
    let options = BuildOptions::new(list_path, output.clone(), Shape::ungapped(8).unwrap(), 12, 0.05, 50)
      .with_parts(Some(2));

    let cancel = CancellationToken::new();
    let result = build(&options, &cancel).unwrap();
    assert!(matches!(result, BuildOutput::Partitioned { parts: 2 }));

    let manifest = Manifest::read(&output).unwrap();
    assert_eq!(manifest.parts.len(), 2);
    for part_path in manifest.part_paths(&output) {
      assert!(part_path.exists());
    }
  }

  #[test]
  fn rejects_empty_bin_list() {
    let dir = tempfile::tempdir().unwrap();
    let list_path = dir.path().join("bins.txt");
    std::fs::write(&list_path, "").unwrap();

    let output = dir.path().join("index.raptor");
    let options = BuildOptions::new(list_path, output, Shape::ungapped(8).unwrap(), 12, 0.05, 50);
    let cancel = CancellationToken::new();
    assert!(build(&options, &cancel).is_err());
  }
}
