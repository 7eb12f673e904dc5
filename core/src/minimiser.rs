//! The lazy (k, w)-minimiser stream.
//!
//! [`MinimiserStream`] is a finite, single-pass, non-restartable
//! iterator: a sliding window of `w - span + 1` candidate k-mer hashes
//! is kept in a monotonic deque keyed by hash value, front always the
//! current minimum. Callers that need to re-scan restart a fresh
//! stream from the sequence start.

use std::collections::VecDeque;

use crate::dna::Dna4;
use crate::error::MinimiserError;
use crate::hash;
use crate::shape::Shape;

/// One minimiser emitted by a [`MinimiserStream`]: its canonical hash
/// and the (0-based) begin position of the k-mer that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Minimiser {
  /// The canonical hash of the minimising k-mer.
  pub hash: u64,
  /// The 0-based begin position of the minimising k-mer.
  pub begin: usize,
}

/// A lazy, single-pass stream of minimisers over one contiguous run of
/// valid [`Dna4`] bases.
///
/// Non-ACGT bases are an edge case of the caller: [`minimisers`] below
/// splits a sequence containing gaps into maximal valid runs and
/// restarts a fresh stream (and begin-position offset) for each one,
/// rather than restarting mid-stream.
pub struct MinimiserStream<'a> {
  seq: &'a [Dna4],
  shape: Shape,
  seed: u64,
  window: usize,
  next_p: usize,
  deque: VecDeque<(u64, usize)>,
  last_emitted: Option<(u64, usize)>,
}

impl<'a> MinimiserStream<'a> {
  /// Creates a new stream over `seq` for pattern parameters
  /// `(shape, window)`, seeded by `seed`.
  ///
  /// `window` is the minimiser window length in bases and must be at
  /// least `shape.span()` (SOCKS / exact-k-mer mode is simply
  /// `window == shape.span()`, using this same code path).
  pub fn new(
    seq: &'a [Dna4],
    shape: Shape,
    window: usize,
    seed: u64,
  ) -> Result<Self, MinimiserError> {
    if window < shape.span() {
      return Err(MinimiserError::WindowTooSmall {
        window,
        span: shape.span(),
      });
    }
    Ok(Self {
      seq,
      shape,
      seed,
      window,
      next_p: 0,
      deque: VecDeque::new(),
      last_emitted: None,
    })
  }

  #[inline]
  fn kmer_hash(&self, begin: usize) -> u64 {
    let span = self.shape.span();
    hash::canonical(&self.seq[begin..begin + span], &self.shape, self.seed)
  }

  #[inline]
  fn push(&mut self, h: u64, begin: usize) {
    while matches!(self.deque.back(), Some(&(back_h, _)) if back_h > h) {
      self.deque.pop_back();
    }
    self.deque.push_back((h, begin));
  }
}

impl Iterator for MinimiserStream<'_> {
  type Item = Minimiser;

  fn next(&mut self) -> Option<Self::Item> {
    let span = self.shape.span();
    let candidates_per_window = self.window - span; // w - span, zero-indexed offset range

    loop {
      if self.next_p + self.window > self.seq.len() {
        return None;
      }

      if self.next_p == 0 {
        for j in 0..=candidates_per_window {
          let h = self.kmer_hash(j);
          self.push(h, j);
        }
      } else {
        let out_pos = self.next_p - 1;
        if matches!(self.deque.front(), Some(&(_, front_pos)) if front_pos == out_pos) {
          self.deque.pop_front();
        }
        let new_begin = self.next_p + candidates_per_window;
        let h = self.kmer_hash(new_begin);
        self.push(h, new_begin);
      }

      let front = *self
        .deque
        .front()
        .expect("deque is non-empty once the first window is filled");
      self.next_p += 1;

      if Some(front) != self.last_emitted {
        self.last_emitted = Some(front);
        return Some(Minimiser {
          hash: front.0,
          begin: front.1,
        });
      }
    }
  }
}

/// Scans `bases` (which may contain gaps from non-ACGT input,
/// represented as `None`) for minimisers, restarting the window at
/// each maximal run of valid bases.
pub fn minimisers<'a>(
  bases: &'a [Option<Dna4>],
  shape: Shape,
  window: usize,
  seed: u64,
) -> Result<Vec<Minimiser>, MinimiserError> {
  let mut out = Vec::new();
  let mut run_start = 0usize;
  let mut run: Vec<Dna4> = Vec::new();

  let flush = |run: &mut Vec<Dna4>, run_start: usize, out: &mut Vec<Minimiser>| -> Result<(), MinimiserError> {
    if run.len() >= window {
      let stream = MinimiserStream::new(run, shape, window, seed)?;
      out.extend(stream.map(|m| Minimiser {
        hash: m.hash,
        begin: m.begin + run_start,
      }));
    }
    run.clear();
    Ok(())
  };

  for (i, base) in bases.iter().enumerate() {
    match base {
      Some(b) => run.push(*b),
      None => {
        flush(&mut run, run_start, &mut out)?;
        run_start = i + 1;
      }
    }
  }
  flush(&mut run, run_start, &mut out)?;

  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dna::reverse_complement;

  fn seq(s: &str) -> Vec<Dna4> {
    s.bytes().map(|b| Dna4::from_base(b).unwrap()).collect()
  }

  #[test]
  fn emits_at_most_one_per_position() {
    let shape = Shape::ungapped(3).unwrap();
    let s = seq("ACGTACGTACGT");
    let stream = MinimiserStream::new(&s, shape, 5, 0).unwrap();
    let ms: Vec<_> = stream.collect();
    // Monotonically non-decreasing begin positions, no duplicate begins.
    for pair in ms.windows(2) {
      assert!(pair[1].begin > pair[0].begin);
    }
  }

  #[test]
  fn window_equals_span_is_exact_kmer_mode() {
    // SOCKS mode: w == span, every k-mer is "the window minimum".
    let shape = Shape::ungapped(4).unwrap();
    let s = seq("ACGTACGT");
    let stream = MinimiserStream::new(&s, shape, 4, 0).unwrap();
    let ms: Vec<_> = stream.collect();
    assert_eq!(ms.len(), s.len() - 4 + 1);
    for (i, m) in ms.iter().enumerate() {
      assert_eq!(m.begin, i);
    }
  }

  #[test]
  fn invariant_under_reverse_complement_as_multiset() {
    let shape = Shape::ungapped(5).unwrap();
    let s = seq("ACGTACGTTGCAACGTACGT");
    let rc = reverse_complement(&s);

    let mut fwd: Vec<u64> = MinimiserStream::new(&s, shape, 8, 3)
      .unwrap()
      .map(|m| m.hash)
      .collect();
    let mut rev: Vec<u64> = MinimiserStream::new(&rc, shape, 8, 3)
      .unwrap()
      .map(|m| m.hash)
      .collect();
    fwd.sort_unstable();
    rev.sort_unstable();
    assert_eq!(fwd, rev);
  }

  #[test]
  fn rejects_window_smaller_than_span() {
    let shape = Shape::ungapped(10).unwrap();
    let s = seq("ACGTACGT");
    assert!(MinimiserStream::new(&s, shape, 5, 0).is_err());
  }

  #[test]
  fn gap_restarts_the_window() {
    let shape = Shape::ungapped(3).unwrap();
    let bases: Vec<Option<Dna4>> = "ACGNACGT"
      .bytes()
      .map(Dna4::from_base)
      .collect();
    // "ACG" (len 3) is too short for window=4 and is dropped; "ACGT"
    // (len 4) yields exactly one minimiser, offset by the gap.
    let ms = minimisers(&bases, shape, 4, 0).unwrap();
    assert_eq!(ms.len(), 1);
    assert_eq!(ms[0].begin, 4);
  }
}
