//! Per-thread membership agent: a reusable scratch buffer over a
//! read-only filter, so that querying many minimisers in a row does
//! one allocation per thread rather than one per minimiser.

use crate::filter::InterleavedBloomFilter;

/// Accumulates per-bin hit counts across the minimisers of one query
/// read, against a single [`InterleavedBloomFilter`].
///
/// Not `Sync`: each querying thread owns one agent. The scratch
/// buffer is sized `ceil(B/64)` words and reused for every minimiser
/// and every read.
pub struct MembershipAgent<'a> {
  filter: &'a InterleavedBloomFilter,
  scratch: Vec<u64>,
  counts: Vec<u32>,
}

impl<'a> MembershipAgent<'a> {
  /// Creates an agent borrowing `filter`.
  pub fn new(filter: &'a InterleavedBloomFilter) -> Self {
    Self {
      filter,
      scratch: vec![0u64; filter.row_words()],
      counts: vec![0u32; filter.bin_count()],
    }
  }

  /// Clears the per-bin counters, starting a new read.
  pub fn reset(&mut self) {
    self.counts.iter_mut().for_each(|c| *c = 0);
  }

  /// Queries one minimiser hash, incrementing the counter of every bin
  /// whose occupancy bit is set.
  pub fn accumulate(&mut self, hash: u64) {
    self.filter.bulk_contains_into(hash, &mut self.scratch);
    for (b, count) in self.counts.iter_mut().enumerate() {
      let word = self.scratch[b / 64];
      if (word >> (b % 64)) & 1 != 0 {
        *count += 1;
      }
    }
  }

  /// The current hit count for `bin`.
  pub fn count(&self, bin: usize) -> u32 {
    self.counts[bin]
  }

  /// The number of bins this agent tracks.
  pub fn bin_count(&self) -> usize {
    self.counts.len()
  }

  /// The bins whose accumulated count has reached `tau`, in ascending
  /// order.
  pub fn passing(&self, tau: usize) -> Vec<usize> {
    self
      .counts
      .iter()
      .enumerate()
      .filter(|&(_, &c)| c as usize >= tau)
      .map(|(b, _)| b)
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accumulates_across_minimisers() {
    let filter = InterleavedBloomFilter::new(10, 256, 2).unwrap();
    filter.emplace(1, 0);
    filter.emplace(2, 0);
    filter.emplace(3, 1);

    let mut agent = MembershipAgent::new(&filter);
    agent.accumulate(1);
    agent.accumulate(2);
    agent.accumulate(3);

    assert_eq!(agent.count(0), 2);
    assert_eq!(agent.count(1), 1);
  }

  #[test]
  fn passing_respects_threshold() {
    let filter = InterleavedBloomFilter::new(4, 256, 2).unwrap();
    filter.emplace(1, 0);
    filter.emplace(1, 1);
    filter.emplace(2, 0);

    let mut agent = MembershipAgent::new(&filter);
    agent.accumulate(1);
    agent.accumulate(2);

    assert_eq!(agent.passing(2), vec![0]);
    let mut both = agent.passing(1);
    both.sort_unstable();
    assert_eq!(both, vec![0, 1]);
  }

  #[test]
  fn reset_clears_counts() {
    let filter = InterleavedBloomFilter::new(4, 256, 2).unwrap();
    filter.emplace(1, 0);
    let mut agent = MembershipAgent::new(&filter);
    agent.accumulate(1);
    assert_eq!(agent.count(0), 1);
    agent.reset();
    assert_eq!(agent.count(0), 0);
  }
}
