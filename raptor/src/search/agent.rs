//! A per-thread query agent generalised over both index body
//! variants. [`raptor_ibf::MembershipAgent`] only knows about the
//! uncompressed filter; this wraps it alongside an equivalent
//! accumulator over the compressed view so the driver's hot loop
//! does not need to match on the body type per minimiser.

use raptor_ibf::{CompressedInterleavedBloomFilter, MembershipAgent};

use crate::index::format::IbfBody;

/// Accumulates per-bin hit counts for one query read, against
/// whichever body variant the opened index holds.
pub enum SearchAgent<'a> {
  /// Backed by a live, uncompressed filter.
  Plain(MembershipAgent<'a>),
  /// Backed by a read-only compressed view.
  Compressed {
    filter: &'a CompressedInterleavedBloomFilter,
    counts: Vec<u32>,
  },
}

impl<'a> SearchAgent<'a> {
  /// Creates an agent over `body`.
  pub fn new(body: &'a IbfBody) -> Self {
    match body {
      IbfBody::Plain(filter) => Self::Plain(MembershipAgent::new(filter)),
      IbfBody::Compressed(filter) => Self::Compressed {
        filter,
        counts: vec![0u32; filter.bin_count()],
      },
    }
  }

  /// Clears the per-bin counters, starting a new read.
  pub fn reset(&mut self) {
    match self {
      Self::Plain(agent) => agent.reset(),
      Self::Compressed { counts, .. } => counts.iter_mut().for_each(|c| *c = 0),
    }
  }

  /// Queries one minimiser hash, incrementing every bin it occupies.
  pub fn accumulate(&mut self, hash: u64) {
    match self {
      Self::Plain(agent) => agent.accumulate(hash),
      Self::Compressed { filter, counts } => {
        for (bin, hit) in filter.bulk_contains(hash).into_iter().enumerate() {
          if hit {
            counts[bin] += 1;
          }
        }
      }
    }
  }

  /// The bins whose accumulated count has reached `tau`, in ascending
  /// order.
  pub fn passing(&self, tau: usize) -> Vec<usize> {
    match self {
      Self::Plain(agent) => agent.passing(tau),
      Self::Compressed { counts, .. } => counts
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c as usize >= tau)
        .map(|(b, _)| b)
        .collect(),
    }
  }

  /// The current hit count for `bin`.
  pub fn count(&self, bin: usize) -> u32 {
    match self {
      Self::Plain(agent) => agent.count(bin),
      Self::Compressed { counts, .. } => counts[bin],
    }
  }

  /// The number of bins this agent tracks.
  pub fn bin_count(&self) -> usize {
    match self {
      Self::Plain(agent) => agent.bin_count(),
      Self::Compressed { counts, .. } => counts.len(),
    }
  }
}
