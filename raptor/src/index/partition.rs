//! Optional key-space partitioning: instead of one index file, the
//! key space is split across `P` standalone part files (each a
//! complete index over the same bins), selected by the top
//! `log2(P)` bits of the hash. A small manifest records the part
//! count and naming so the search driver can find every part without
//! guessing.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const MANIFEST_MAGIC: &[u8; 8] = b"RAPTORPT";

/// Selects which partition a hash falls into: the top `log2(parts)`
/// bits of `x`.
///
/// # Panics
///
/// Panics if `parts` is not a power of two.
#[inline]
pub fn hash_partition(x: u64, parts: usize) -> usize {
  assert!(parts.is_power_of_two(), "partition count must be a power of two");
  if parts == 1 {
    return 0;
  }
  let shift = 64 - parts.trailing_zeros();
  (x >> shift) as usize
}

/// A partitioned index's manifest: how many parts there are and the
/// file name each one lives under, all siblings of the manifest file
/// itself.
#[derive(Debug, Clone)]
pub struct Manifest {
  /// File names of each part, in partition order.
  pub parts: Vec<String>,
}

impl Manifest {
  /// Builds the conventional manifest for `base` split into `parts`
  /// pieces: `<base>_0` .. `<base>_{parts-1}`, alongside a manifest
  /// written to `base` itself.
  pub fn conventional(base: &Path, parts: usize) -> (Self, Vec<PathBuf>) {
    let stem = base.to_string_lossy().into_owned();
    let mut names = Vec::with_capacity(parts);
    let mut paths = Vec::with_capacity(parts);
    for i in 0..parts {
      let name = format!("{stem}_{i}");
      paths.push(PathBuf::from(&name));
      names.push(
        Path::new(&name)
          .file_name()
          .unwrap()
          .to_string_lossy()
          .into_owned(),
      );
    }
    (Self { parts: names }, paths)
  }

  /// Resolves each part's file name to a path alongside `manifest_path`.
  pub fn part_paths(&self, manifest_path: &Path) -> Vec<PathBuf> {
    let dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    self.parts.iter().map(|name| dir.join(name)).collect()
  }

  /// Serialises the manifest to `path`.
  pub fn write(&self, path: &Path) -> Result<()> {
    let mut buf = Vec::new();
    buf.extend_from_slice(MANIFEST_MAGIC);
    buf.extend_from_slice(&(self.parts.len() as u32).to_le_bytes());
    for name in &self.parts {
      let bytes = name.as_bytes();
      buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
      buf.extend_from_slice(bytes);
    }
    std::fs::write(path, &buf).map_err(|source| Error::IoExhausted {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Parses a manifest previously written by [`write`](Self::write).
  pub fn read(path: &Path) -> Result<Self> {
    let bytes = std::fs::read(path).map_err(|e| Error::InputUnreadable {
      path: path.to_path_buf(),
      reason: e.to_string(),
    })?;
    if bytes.len() < 12 || &bytes[0..8] != MANIFEST_MAGIC {
      return Err(Error::IndexCorrupt {
        path: path.to_path_buf(),
        reason: "bad manifest magic".to_string(),
      });
    }
    let count = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
    let mut pos = 12usize;
    let mut parts = Vec::with_capacity(count);
    for _ in 0..count {
      let len = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize;
      pos += 4;
      let name = std::str::from_utf8(&bytes[pos..pos + len])
        .map_err(|_| Error::IndexCorrupt {
          path: path.to_path_buf(),
          reason: "non-utf8 part name".to_string(),
        })?
        .to_string();
      pos += len;
      parts.push(name);
    }
    Ok(Self { parts })
  }
}
