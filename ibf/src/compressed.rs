//! A read-only, run-length-encoded view over a built
//! [`InterleavedBloomFilter`]. Trades `emplace` (and some query speed)
//! for a smaller on-disk/in-memory footprint on filters with long runs
//! of unset bits, which is typical once bin counts grow past what any
//! single read's minimisers touch.

use crate::bits::Layout;
use crate::filter::InterleavedBloomFilter;

/// A succinct run-length encoding of the interleaved bit vector: runs
/// of identical bits, stored as (length, value) pairs alongside a
/// prefix-sum array so any bit can be located by binary search without
/// decoding the whole stream.
#[derive(Debug, Clone)]
pub struct CompressedInterleavedBloomFilter {
  layout: Layout,
  hash_count: usize,
  /// Cumulative bit offset where each run starts; `run_starts[i]` is
  /// the first bit index of run `i`, and `run_starts` has one extra
  /// trailing entry equal to the total bit length.
  run_starts: Vec<u64>,
  run_values: Vec<bool>,
}

impl CompressedInterleavedBloomFilter {
  /// Compresses a built filter into its run-length encoding.
  pub fn compress(filter: &InterleavedBloomFilter) -> Self {
    let words = filter.raw_words();
    let total_bits = words.len() as u64 * 64;

    let mut run_starts = Vec::new();
    let mut run_values = Vec::new();
    let mut current_value: Option<bool> = None;
    let mut run_start = 0u64;

    for bit in 0..total_bits {
      let word = words[(bit / 64) as usize];
      let value = (word >> (bit % 64)) & 1 != 0;
      match current_value {
        None => current_value = Some(value),
        Some(v) if v != value => {
          run_starts.push(run_start);
          run_values.push(v);
          run_start = bit;
          current_value = Some(value);
        }
        _ => {}
      }
    }
    if let Some(v) = current_value {
      run_starts.push(run_start);
      run_values.push(v);
    }
    run_starts.push(total_bits);

    Self {
      layout: Layout::new(filter.bin_count(), filter.bits_per_bin()),
      hash_count: filter.hash_count(),
      run_starts,
      run_values,
    }
  }

  /// Number of encoded runs.
  pub fn run_count(&self) -> usize {
    self.run_values.len()
  }

  fn get_bit(&self, index: u64) -> bool {
    // Largest run start <= index.
    let run = self.run_starts.partition_point(|&start| start <= index) - 1;
    self.run_values[run]
  }

  /// See [`InterleavedBloomFilter::bulk_contains_into`]. Each word is
  /// rebuilt bit by bit via binary search into the run table, rather
  /// than a direct array load, in exchange for the encoding's smaller
  /// footprint.
  pub fn bulk_contains_into(&self, x: u64, out: &mut [u64]) {
    let row_words = self.layout.row_words;
    debug_assert!(out.len() >= row_words);

    for w in out.iter_mut().take(row_words) {
      *w = u64::MAX;
    }

    for i in 0..self.hash_count {
      let p = crate::hasher::position(x, i, self.layout.bits_per_bin);
      let base = p as u64 * row_words as u64 * 64;
      for j in 0..row_words {
        let mut word = 0u64;
        for bit in 0..64u64 {
          if self.get_bit(base + j as u64 * 64 + bit) {
            word |= 1 << bit;
          }
        }
        out[j] &= word;
      }
    }
  }

  /// Convenience wrapper returning one bit per bin.
  pub fn bulk_contains(&self, x: u64) -> Vec<bool> {
    let mut words = vec![0u64; self.layout.row_words];
    self.bulk_contains_into(x, &mut words);
    (0..self.layout.bins)
      .map(|b| (words[b / 64] >> (b % 64)) & 1 != 0)
      .collect()
  }

  /// The number of logical bins.
  pub fn bin_count(&self) -> usize {
    self.layout.bins
  }

  /// Appends this view's run table to `buf`: total bit length, run
  /// count, ascending run-start offsets, then one byte per run value.
  pub fn write_runs(&self, buf: &mut Vec<u8>) {
    let total_bits = *self.run_starts.last().unwrap();
    buf.extend_from_slice(&total_bits.to_le_bytes());
    buf.extend_from_slice(&(self.run_values.len() as u64).to_le_bytes());
    for &start in &self.run_starts[..self.run_values.len()] {
      buf.extend_from_slice(&start.to_le_bytes());
    }
    for &v in &self.run_values {
      buf.push(v as u8);
    }
  }

  /// Parses a run table written by [`write_runs`](Self::write_runs)
  /// out of `bytes`, returning the view and the number of bytes
  /// consumed.
  pub fn read_runs(
    bins: usize,
    bits_per_bin: usize,
    hash_count: usize,
    bytes: &[u8],
  ) -> Result<(Self, usize), String> {
    if bytes.len() < 16 {
      return Err("truncated run table".to_string());
    }
    let total_bits = u64::from_le_bytes(bytes[0..8].try_into().unwrap());
    let run_count = u64::from_le_bytes(bytes[8..16].try_into().unwrap()) as usize;
    let mut pos = 16usize;

    let mut run_starts = Vec::with_capacity(run_count + 1);
    for _ in 0..run_count {
      if pos + 8 > bytes.len() {
        return Err("truncated run starts".to_string());
      }
      run_starts.push(u64::from_le_bytes(bytes[pos..pos + 8].try_into().unwrap()));
      pos += 8;
    }
    run_starts.push(total_bits);

    if pos + run_count > bytes.len() {
      return Err("truncated run values".to_string());
    }
    let run_values = bytes[pos..pos + run_count].iter().map(|&b| b != 0).collect();
    pos += run_count;

    Ok((
      Self {
        layout: Layout::new(bins, bits_per_bin),
        hash_count,
        run_starts,
        run_values,
      },
      pos,
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn compressed_view_agrees_with_source_filter() {
    let filter = InterleavedBloomFilter::new(70, 512, 2).unwrap();
    for x in 0u64..150 {
      filter.emplace(x, (x % 70) as usize);
    }
    let compressed = CompressedInterleavedBloomFilter::compress(&filter);

    for x in 0u64..200 {
      assert_eq!(filter.bulk_contains(x), compressed.bulk_contains(x), "x={x}");
    }
  }

  #[test]
  fn all_zero_filter_compresses_to_one_run() {
    let filter = InterleavedBloomFilter::new(10, 256, 2).unwrap();
    let compressed = CompressedInterleavedBloomFilter::compress(&filter);
    assert_eq!(compressed.run_count(), 1);
  }
}
