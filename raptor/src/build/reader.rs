//! The variant file reader: a sequence file is re-hashed into
//! minimisers on the fly, while a minimiser sidecar file has already
//! done that work and is replayed verbatim. Modelled as a sum type
//! with a shared entry point rather than a trait object, so the build
//! worker's hot loop never pays for virtual dispatch.

use std::fs;
use std::io;
use std::path::Path;

use raptor_core::minimiser::{minimisers, Minimiser};
use raptor_core::{Dna4, Shape};

/// Which format a reference file is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileReader {
  /// A FASTA-like sequence file; minimisers are computed on read.
  Sequence,
  /// A `.minimiser` sidecar: pre-computed `(hash, begin)` pairs,
  /// one record per 16 bytes, little-endian, replayed as-is.
  MinimiserSidecar,
}

impl FileReader {
  /// Infers the reader variant from a file's extension: `.minimiser`
  /// selects the sidecar format, anything else is treated as a
  /// sequence file.
  pub fn infer(path: &Path) -> Self {
    match path.extension().and_then(|e| e.to_str()) {
      Some("minimiser") => Self::MinimiserSidecar,
      _ => Self::Sequence,
    }
  }

  /// Reads `path` and invokes `sink` once per minimiser it contributes,
  /// in file order.
  pub fn hash_into(
    &self,
    path: &Path,
    shape: Shape,
    window: usize,
    seed: u64,
    sink: &mut impl FnMut(Minimiser),
  ) -> io::Result<()> {
    match self {
      Self::Sequence => read_sequence(path, shape, window, seed, sink),
      Self::MinimiserSidecar => read_sidecar(path, sink),
    }
  }
}

fn read_sequence(
  path: &Path,
  shape: Shape,
  window: usize,
  seed: u64,
  sink: &mut impl FnMut(Minimiser),
) -> io::Result<()> {
  let contents = fs::read_to_string(path)?;
  let mut bases: Vec<Option<Dna4>> = Vec::with_capacity(contents.len());
  let mut seen_record = false;

  for line in contents.lines() {
    if line.starts_with('>') {
      if seen_record {
        // Force the minimiser window to restart at record boundaries.
        bases.push(None);
      }
      seen_record = true;
      continue;
    }
    bases.extend(line.trim_end().bytes().map(Dna4::from_base));
  }

  let ms = minimisers(&bases, shape, window, seed)
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
  for m in ms {
    sink(m);
  }
  Ok(())
}

fn read_sidecar(path: &Path, sink: &mut impl FnMut(Minimiser)) -> io::Result<()> {
  let bytes = fs::read(path)?;
  for chunk in bytes.chunks_exact(16) {
    let hash = u64::from_le_bytes(chunk[0..8].try_into().unwrap());
    let begin = u64::from_le_bytes(chunk[8..16].try_into().unwrap()) as usize;
    sink(Minimiser { hash, begin });
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn infers_sidecar_from_extension() {
    assert_eq!(FileReader::infer(Path::new("bin1.minimiser")), FileReader::MinimiserSidecar);
    assert_eq!(FileReader::infer(Path::new("bin1.fa")), FileReader::Sequence);
  }

  #[test]
  fn reads_multi_record_fasta_without_crossing_boundaries() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, ">seq1\nACGTACGTACGT\n>seq2\nTTTTACGTACGT").unwrap();

    let shape = Shape::ungapped(4).unwrap();
    let mut count = 0usize;
    FileReader::Sequence
      .hash_into(file.path(), shape, 6, 0, &mut |_m| count += 1)
      .unwrap();
    assert!(count > 0);
  }

  #[test]
  fn replays_sidecar_records_verbatim() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&1u64.to_le_bytes()).unwrap();
    file.write_all(&0u64.to_le_bytes()).unwrap();
    file.write_all(&2u64.to_le_bytes()).unwrap();
    file.write_all(&5u64.to_le_bytes()).unwrap();

    let shape = Shape::ungapped(4).unwrap();
    let mut out = Vec::new();
    FileReader::MinimiserSidecar
      .hash_into(file.path(), shape, 6, 0, &mut |m| out.push(m))
      .unwrap();

    assert_eq!(out, vec![Minimiser { hash: 1, begin: 0 }, Minimiser { hash: 2, begin: 5 }]);
  }
}
