//! The on-disk index container.
//!
//! ```text
//! offset   size   field
//! 0        8      magic "RAPTORIX"
//! 8        4      version (u32)
//! 12       1      kmer_size (u8)
//! 13       4      window_size (u32)
//! 17       4      shape length / span (u32)
//! 21       ceil(span/8)  shape bits, MSB-first
//! ...      1      hash_count (u8)
//! ...      1      flags (bit 0: compressed)
//! ...      8      bin_count (u64)
//! ...      8      bits_per_bin (u64)
//! ...      8      fpr_correction (f64)
//! ...      8      target_fpr (f64)
//! ...      8      seed (u64)
//! ...      var    bin_paths: bin_count * (u32 file_count, file_count * (u32 len, utf8 bytes))
//! ...      var    ibf body (see below)
//! ...      8      checksum: xxhash64 of every preceding byte
//! ```
//!
//! Uncompressed ibf body: `u64 word_count` then that many little-endian
//! `u64` words, row-major by minimiser-hash position (the layout
//! [`raptor_ibf::InterleavedBloomFilter`] already stores internally).
//!
//! Compressed ibf body: `u64 total_bits`, `u64 run_count`, then
//! `run_count` ascending `u64` run-start offsets, then `run_count`
//! bytes of run values (`0`/`1`).
//!
//! The `flags` byte, `target_fpr` and `seed` fields are this
//! rewrite's additions to the literal header table: `flags` lets
//! [`read`] recognise a compressed body without out-of-band knowledge
//! of how the file was built, `target_fpr` lets `search` recover the
//! default threshold-model confidence level, and `seed` lets `search`
//! rehash query reads the same way `build` hashed reference k-mers
//! without the two sides having to agree on a hardcoded constant out
//! of band (see DESIGN.md).

use std::path::Path;

use raptor_core::Shape;
use raptor_ibf::{CompressedInterleavedBloomFilter, InterleavedBloomFilter};

use crate::error::{Error, Result};

const MAGIC: &[u8; 8] = b"RAPTORIX";
const VERSION: u32 = 1;
const COMPRESSED_FLAG: u8 = 0b0000_0001;

/// The body of an index: either a live filter or its compressed view.
/// Exactly one variant round-trips through [`write`] / [`read`].
pub enum IbfBody {
  /// An uncompressed, mutable-at-build-time filter.
  Plain(InterleavedBloomFilter),
  /// A read-only run-length-encoded view.
  Compressed(CompressedInterleavedBloomFilter),
}

/// A fully decoded index: header fields plus the bin paths and the
/// filter body.
pub struct Index {
  /// The shape used to hash k-mers into minimisers.
  pub shape: Shape,
  /// The minimiser window length.
  pub window: usize,
  /// Number of hash functions used by the filter.
  pub hash_count: usize,
  /// Bits allocated per technical bin.
  pub bits_per_bin: usize,
  /// The false-positive correction factor recorded at build time.
  pub fpr_correction: f64,
  /// The target false-positive rate `build` was given. Not part of
  /// the literal header table; recorded so `search` can recover the
  /// default threshold-model confidence level without the caller
  /// having to re-supply it (see DESIGN.md).
  pub target_fpr: f64,
  /// The minimiser hash seed used when this index was built.
  pub seed: u64,
  /// The files contributing to each technical bin, in bin order.
  pub bin_paths: Vec<Vec<String>>,
  /// The filter body.
  pub body: IbfBody,
}

fn push_shape_bits(buf: &mut Vec<u8>, shape: &Shape) {
  let span = shape.span();
  let byte_len = span.div_ceil(8);
  let mut bytes = vec![0u8; byte_len];
  for i in 0..span {
    if shape.bit(i) {
      bytes[i / 8] |= 1 << (7 - (i % 8));
    }
  }
  buf.extend_from_slice(&bytes);
}

fn read_shape_bits(span: usize, bytes: &[u8]) -> String {
  let mut s = String::with_capacity(span);
  for i in 0..span {
    let bit = (bytes[i / 8] >> (7 - (i % 8))) & 1;
    s.push(if bit == 1 { '1' } else { '0' });
  }
  s
}

/// Serialises `index` to `path`, appending the trailing checksum.
pub fn write(path: &Path, index: &Index) -> Result<()> {
  let mut buf = Vec::new();
  buf.extend_from_slice(MAGIC);
  buf.extend_from_slice(&VERSION.to_le_bytes());
  buf.push(index.shape.k() as u8);
  buf.extend_from_slice(&(index.window as u32).to_le_bytes());
  buf.extend_from_slice(&(index.shape.span() as u32).to_le_bytes());
  push_shape_bits(&mut buf, &index.shape);
  buf.push(index.hash_count as u8);

  let compressed = matches!(index.body, IbfBody::Compressed(_));
  buf.push(if compressed { COMPRESSED_FLAG } else { 0 });

  buf.extend_from_slice(&(index.bin_paths.len() as u64).to_le_bytes());
  buf.extend_from_slice(&(index.bits_per_bin as u64).to_le_bytes());
  buf.extend_from_slice(&index.fpr_correction.to_le_bytes());
  buf.extend_from_slice(&index.target_fpr.to_le_bytes());
  buf.extend_from_slice(&index.seed.to_le_bytes());

  for files in &index.bin_paths {
    buf.extend_from_slice(&(files.len() as u32).to_le_bytes());
    for f in files {
      let bytes = f.as_bytes();
      buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
      buf.extend_from_slice(bytes);
    }
  }

  match &index.body {
    IbfBody::Plain(filter) => {
      let words = filter.raw_words();
      buf.extend_from_slice(&(words.len() as u64).to_le_bytes());
      for w in words {
        buf.extend_from_slice(&w.to_le_bytes());
      }
    }
    IbfBody::Compressed(compressed) => {
      compressed.write_runs(&mut buf);
    }
  }

  let checksum = xxhash_rust::xxh64::xxh64(&buf, 0);
  buf.extend_from_slice(&checksum.to_le_bytes());

  std::fs::write(path, &buf).map_err(|source| Error::IoExhausted {
    path: path.to_path_buf(),
    source,
  })
}

/// Parses an index previously written by [`write`], validating the
/// magic, a matching checksum, and that the shape's first/last bits
/// are set.
///
/// Opens the file via [`memmap2`] rather than reading it into an
/// owned buffer: the header and bin paths are decoded straight out of
/// the mapping, and only the filter body's words are copied into the
/// owned [`raptor_ibf::InterleavedBloomFilter`] (which must own its
/// words to serve atomic fetch-or during a later `increase_bin_to`,
/// so a zero-copy filter view is not on offer here — see DESIGN.md).
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn read(path: &Path) -> Result<Index> {
  let file = std::fs::File::open(path).map_err(|e| Error::InputUnreadable {
    path: path.to_path_buf(),
    reason: e.to_string(),
  })?;
  // SAFETY: the mapping is read-only and this crate never grows the
  // file out from under a live mapping's lifetime, which does not
  // escape this function.
  let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| Error::InputUnreadable {
    path: path.to_path_buf(),
    reason: e.to_string(),
  })?;
  tracing::debug!(bytes = mmap.len(), "mapped index file");
  parse(path, &mmap)
}

fn corrupt(path: &Path, reason: impl Into<String>) -> Error {
  Error::IndexCorrupt {
    path: path.to_path_buf(),
    reason: reason.into(),
  }
}

fn parse(path: &Path, bytes: &[u8]) -> Result<Index> {
  if bytes.len() < 21 + 8 {
    return Err(corrupt(path, "file too short for a header"));
  }
  if &bytes[0..8] != MAGIC {
    return Err(corrupt(path, "bad magic"));
  }
  let version = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
  if version != VERSION {
    return Err(corrupt(path, format!("unsupported version {version}")));
  }

  let checksum_at = bytes.len() - 8;
  let expected = u64::from_le_bytes(bytes[checksum_at..].try_into().unwrap());
  let actual = xxhash_rust::xxh64::xxh64(&bytes[..checksum_at], 0);
  if expected != actual {
    return Err(corrupt(path, "checksum mismatch"));
  }

  let mut pos = 12usize;
  let _kmer_size = bytes[pos] as usize;
  pos += 1;
  let window = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize;
  pos += 4;
  let span = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize;
  pos += 4;
  let shape_byte_len = span.div_ceil(8);
  if pos + shape_byte_len > bytes.len() {
    return Err(corrupt(path, "truncated shape bits"));
  }
  let shape_bitstring = read_shape_bits(span, &bytes[pos..pos + shape_byte_len]);
  let shape = Shape::from_bitstring(&shape_bitstring)
    .map_err(|e| corrupt(path, format!("invalid shape in header: {e}")))?;
  pos += shape_byte_len;

  let hash_count = bytes[pos] as usize;
  pos += 1;
  let flags = bytes[pos];
  pos += 1;
  let compressed = flags & COMPRESSED_FLAG != 0;

  let bin_count = u64::from_le_bytes(bytes[pos..pos + 8].try_into().unwrap()) as usize;
  pos += 8;
  let bits_per_bin = u64::from_le_bytes(bytes[pos..pos + 8].try_into().unwrap()) as usize;
  pos += 8;
  let fpr_correction = f64::from_le_bytes(bytes[pos..pos + 8].try_into().unwrap());
  pos += 8;
  let target_fpr = f64::from_le_bytes(bytes[pos..pos + 8].try_into().unwrap());
  pos += 8;
  let seed = u64::from_le_bytes(bytes[pos..pos + 8].try_into().unwrap());
  pos += 8;

  let mut bin_paths = Vec::with_capacity(bin_count);
  for _ in 0..bin_count {
    let count = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize;
    pos += 4;
    let mut files = Vec::with_capacity(count);
    for _ in 0..count {
      let len = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize;
      pos += 4;
      let s = std::str::from_utf8(&bytes[pos..pos + len])
        .map_err(|_| corrupt(path, "non-utf8 bin path"))?
        .to_string();
      pos += len;
      files.push(s);
    }
    bin_paths.push(files);
  }

  let body = if compressed {
    let (view, new_pos) =
      CompressedInterleavedBloomFilter::read_runs(bin_count, bits_per_bin, hash_count, &bytes[pos..checksum_at])
        .map_err(|e| corrupt(path, e))?;
    pos += new_pos;
    IbfBody::Compressed(view)
  } else {
    let word_count = u64::from_le_bytes(bytes[pos..pos + 8].try_into().unwrap()) as usize;
    pos += 8;
    let mut words = Vec::with_capacity(word_count);
    for _ in 0..word_count {
      words.push(u64::from_le_bytes(bytes[pos..pos + 8].try_into().unwrap()));
      pos += 8;
    }
    let filter = InterleavedBloomFilter::from_raw_words(bin_count, bits_per_bin, hash_count, words)?;
    IbfBody::Plain(filter)
  };

  Ok(Index {
    shape,
    window,
    hash_count,
    bits_per_bin,
    fpr_correction,
    target_fpr,
    seed,
    bin_paths,
    body,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use raptor_ibf::InterleavedBloomFilter;

  #[test]
  fn round_trips_an_uncompressed_index() {
    let shape = Shape::ungapped(4).unwrap();
    let filter = InterleavedBloomFilter::new(4, 256, 2).unwrap();
    filter.emplace(123, 2);

    let index = Index {
      shape,
      window: 6,
      hash_count: 2,
      bits_per_bin: filter.bits_per_bin(),
      fpr_correction: 1.0,
      target_fpr: 0.05,
      seed: 0,
      bin_paths: vec![
        vec!["a.fa".into()],
        vec!["b.fa".into()],
        vec!["c.fa".into()],
        vec!["d.fa".into()],
      ],
      body: IbfBody::Plain(filter),
    };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.bin");
    write(&path, &index).unwrap();

    let loaded = read(&path).unwrap();
    assert_eq!(loaded.shape, shape);
    assert_eq!(loaded.window, 6);
    assert_eq!(loaded.bin_paths[1], vec!["b.fa".to_string()]);
    match loaded.body {
      IbfBody::Plain(f) => assert!(f.bulk_contains(123)[2]),
      IbfBody::Compressed(_) => panic!("expected plain body"),
    }
  }

  #[test]
  fn rejects_corrupted_checksum() {
    let shape = Shape::ungapped(4).unwrap();
    let filter = InterleavedBloomFilter::new(4, 256, 2).unwrap();
    let index = Index {
      shape,
      window: 6,
      hash_count: 2,
      bits_per_bin: filter.bits_per_bin(),
      fpr_correction: 1.0,
      target_fpr: 0.05,
      seed: 0,
      bin_paths: vec![vec![]; 4],
      body: IbfBody::Plain(filter),
    };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.bin");
    write(&path, &index).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    std::fs::write(&path, &bytes).unwrap();

    assert!(matches!(read(&path), Err(Error::IndexCorrupt { .. })));
  }
}
