//! Combines the direct and indirect destruction models into a
//! per-pattern-length minimum shared-minimiser threshold, with a dense
//! cache keyed by pattern length.

use std::collections::HashMap;

use super::{direct, indirect};
use crate::shape::Shape;

/// How the engine combines single-error destruction probabilities
/// across `e` independent errors.
///
/// Only [`ConvolutionModel::Independent`] is implemented. Treating
/// errors as independent underestimates destruction when errors
/// cluster within `w` of each other, a known approximation the design
/// accepts in exchange for tractability.
/// `Exact` is deliberately left unimplemented rather than silently
/// changing the numeric output of `Independent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvolutionModel {
  /// Convolve `e` independent copies of the per-error distribution.
  #[default]
  Independent,
  /// An exact combinatorial model accounting for error clustering.
  /// Not implemented; reserved for future work.
  Exact,
}

/// Per-pattern-length minimum shared-minimiser threshold model for a
/// fixed `(k, w, shape, e)`.
#[derive(Debug, Clone)]
pub struct ThresholdEngine {
  shape: Shape,
  window: usize,
  errors: usize,
  /// Confidence level for the `P[X > M - t] <= alpha` cutoff; defaults
  /// to the target false-positive rate: no closed-form derivation of
  /// a confidence level from a target false-positive rate is given, so
  /// this crate uses `alpha = fpr` directly; see DESIGN.md.
  alpha: f64,
  model: ConvolutionModel,
  cache: HashMap<usize, usize>,
}

/// Convolves two probability mass functions given as dense vectors
/// indexed from `0`.
fn convolve(a: &[f64], b: &[f64]) -> Vec<f64> {
  let mut out = vec![0.0f64; a.len() + b.len() - 1];
  for (i, &ai) in a.iter().enumerate() {
    if ai == 0.0 {
      continue;
    }
    for (j, &bj) in b.iter().enumerate() {
      out[i + j] += ai * bj;
    }
  }
  out
}

/// The PMF of `Binomial(n, p)` as a dense vector of length `n + 1`.
fn binomial_pmf(n: usize, p: f64) -> Vec<f64> {
  let mut out = vec![0.0f64; n + 1];
  if n == 0 {
    out[0] = 1.0;
    return out;
  }
  let q = 1.0 - p;
  // log-space would be more numerically robust for large n, but n
  // here is bounded by the number of minimisers in one read (at most
  // a few thousand), so the direct recurrence is fine.
  let mut term = q.powi(n as i32);
  out[0] = term;
  for k in 1..=n {
    term *= p / q.max(f64::MIN_POSITIVE) * ((n - k + 1) as f64 / k as f64);
    out[k] = term;
  }
  let total: f64 = out.iter().sum();
  if total > 0.0 {
    for v in out.iter_mut() {
      *v /= total;
    }
  }
  out
}

impl ThresholdEngine {
  /// Creates an engine for the given shape, minimiser window, error
  /// tolerance and target false-positive rate.
  pub fn new(shape: Shape, window: usize, errors: usize, target_fpr: f64) -> Self {
    Self {
      shape,
      window,
      errors,
      alpha: target_fpr,
      model: ConvolutionModel::Independent,
      cache: HashMap::new(),
    }
  }

  /// Overrides the confidence level used for the `tau(L)` cutoff.
  pub fn with_alpha(mut self, alpha: f64) -> Self {
    self.alpha = alpha;
    self
  }

  /// The per-error destruction distribution for a pattern of length
  /// `pattern_size`: `dist[j]` is the probability that a single
  /// substitution error destroys exactly `j` of the
  /// `pattern_size - window + 1` minimisers.
  ///
  /// Combines the analytic direct-hit model with the Monte-Carlo
  /// indirect model by treating, for each of the `M` minimisers, the
  /// event "this error both lands in this minimiser's footprint and
  /// hits a set shape position" as an independent
  /// `Bernoulli(span / pattern_size * p_direct)` trial (a second
  /// instance of the same independence approximation already accepted
  /// for the multi-error convolution below), then convolving that
  /// binomial count of direct destructions with the simulated
  /// indirect distribution.
  fn per_error_distribution(&self, pattern_size: usize) -> Vec<f64> {
    let indirect_dist = indirect::destroyed_indirectly_by_error(pattern_size, self.window, self.shape);
    let m = pattern_size - self.window + 1;
    let span = self.shape.span() as f64;
    let p_direct_per_minimiser =
      (span / pattern_size as f64) * direct::p_direct(&self.shape);
    let direct_dist = binomial_pmf(m, p_direct_per_minimiser);
    let combined = convolve(&indirect_dist, &direct_dist);
    // Both inputs have domain [0, m]; the convolution's natural
    // length is 2m+1, but destruction counts cannot exceed m, so fold
    // the excess mass back onto m.
    let mut folded = vec![0.0f64; m + 1];
    for (j, &p) in combined.iter().enumerate() {
      folded[j.min(m)] += p;
    }
    folded
  }

  /// `P[X = j]`, the distribution of the total number of minimisers
  /// destroyed by `self.errors` independent substitution errors in a
  /// pattern of length `pattern_size`.
  fn destruction_distribution(&self, pattern_size: usize) -> Vec<f64> {
    assert_eq!(
      self.model,
      ConvolutionModel::Independent,
      "ConvolutionModel::Exact is not implemented"
    );
    let m = pattern_size - self.window + 1;
    let per_error = self.per_error_distribution(pattern_size);

    if self.errors == 0 {
      let mut delta = vec![0.0f64; m + 1];
      delta[0] = 1.0;
      return delta;
    }

    let mut acc = per_error.clone();
    for _ in 1..self.errors {
      acc = convolve(&acc, &per_error);
      if acc.len() > m + 1 {
        let mut folded = vec![0.0f64; m + 1];
        for (j, &p) in acc.iter().enumerate() {
          folded[j.min(m)] += p;
        }
        acc = folded;
      }
    }
    acc
  }

  /// Computes (uncached) `tau(L) = max { t : P[X > M - t] <= alpha }`
  /// for a pattern of length `pattern_size`, where `M = pattern_size -
  /// window + 1` and `X` is the number of minimisers destroyed by
  /// `self.errors` errors.
  fn compute(&self, pattern_size: usize) -> usize {
    if pattern_size < self.window {
      // No minimiser is even possible at this length, so the bin can
      // never be a hit; spec.md 4.E treats `tau > M` the same way, and
      // `usize::MAX` keeps that reading without an `M` to compare
      // against (avoiding the `pattern_size - window` underflow below).
      return usize::MAX;
    }
    let m = pattern_size - self.window + 1;
    let dist = self.destruction_distribution(pattern_size);

    for t in (0..=m).rev() {
      let threshold = m - t;
      let tail: f64 = dist.iter().skip(threshold + 1).sum();
      if tail <= self.alpha {
        return t;
      }
    }
    0
  }

  /// Returns `tau(pattern_size)`, computing and caching it if this is
  /// the first request for this length.
  pub fn threshold(&mut self, pattern_size: usize) -> usize {
    if let Some(&t) = self.cache.get(&pattern_size) {
      return t;
    }
    let t = self.compute(pattern_size);
    self.cache.insert(pattern_size, t);
    t
  }

  /// Pre-populates the cache for `lengths`, then enforces the
  /// monotonicity invariants (`tau`
  /// non-increasing in `L`, non-decreasing in `e`) by a running-min
  /// sweep over increasing `L`. This guards the statistically-derived
  /// table against Monte-Carlo sampling noise that would otherwise
  /// violate the invariant at the margins.
  pub fn build_range(&mut self, lengths: impl IntoIterator<Item = usize>) {
    let mut lens: Vec<usize> = lengths.into_iter().collect();
    lens.sort_unstable();
    lens.dedup();
    let mut running_min = usize::MAX;
    for l in lens {
      let raw = self.compute(l);
      running_min = running_min.min(raw);
      self.cache.insert(l, running_min);
    }
  }

  /// The `--threshold p` override: bypasses the statistical model
  /// entirely. `tau(L) = ceil(p * (L - w + 1))`.
  pub fn override_threshold(&self, pattern_size: usize, p: f64) -> usize {
    let m = (pattern_size.saturating_sub(self.window) + 1) as f64;
    (p * m).ceil() as usize
  }
}

/// A dense `(pattern_length, error_count) -> tau` table, built once for
/// a fixed `(shape, window, target_fpr)` over the ranges of lengths and
/// error counts actually observed by a search run.
///
/// The per-`(L, e)` entries start from [`ThresholdEngine::threshold`],
/// then are swept to enforce the two monotonicity properties the
/// system guarantees: non-increasing in `L`, non-decreasing in `e`.
/// The raw Monte-Carlo-derived values do not always satisfy the
/// second property on their own (more tolerated errors does not
/// strictly destroy more minimisers in every finite simulation), so
/// this table is the only place those invariants are authoritative;
/// callers must not read [`ThresholdEngine::threshold`] directly when
/// the invariant matters.
#[derive(Debug, Clone)]
pub struct ThresholdTable {
  window: usize,
  entries: HashMap<(usize, usize), usize>,
}

impl ThresholdTable {
  /// Builds the table for every `(length, errors)` pair in the
  /// Cartesian product of `lengths` and `errors`.
  pub fn build(
    shape: Shape,
    window: usize,
    target_fpr: f64,
    lengths: impl IntoIterator<Item = usize>,
    errors: impl IntoIterator<Item = usize>,
  ) -> Self {
    let mut lens: Vec<usize> = lengths.into_iter().collect();
    lens.sort_unstable();
    lens.dedup();
    let mut errs: Vec<usize> = errors.into_iter().collect();
    errs.sort_unstable();
    errs.dedup();

    let mut entries = HashMap::with_capacity(lens.len() * errs.len());
    for &e in &errs {
      let mut engine = ThresholdEngine::new(shape, window, e, target_fpr);
      for &l in &lens {
        entries.insert((l, e), engine.threshold(l));
      }
    }

    let mut table = Self { window, entries };
    table.enforce_monotonicity(&lens, &errs);
    table
  }

  /// Alternates the two running-extremum sweeps to a practical
  /// fixpoint. Four passes is enough in practice for the modest table
  /// sizes a single search run produces (tens to low hundreds of
  /// lengths by single-digit error counts); this is a pragmatic
  /// isotonic-regression stand-in, not an exact joint projection.
  fn enforce_monotonicity(&mut self, lens: &[usize], errs: &[usize]) {
    for _ in 0..4 {
      for &e in errs {
        let mut running_min = usize::MAX;
        for &l in lens {
          let v = self.entries.get_mut(&(l, e)).expect("entry present");
          running_min = running_min.min(*v);
          *v = running_min;
        }
      }
      for &l in lens {
        let mut running_max = 0usize;
        for &e in errs {
          let v = self.entries.get_mut(&(l, e)).expect("entry present");
          running_max = running_max.max(*v);
          *v = running_max;
        }
      }
    }
  }

  /// Looks up `tau(pattern_size, errors)`. Panics if `(pattern_size,
  /// errors)` was not part of the ranges passed to [`Self::build`].
  pub fn tau(&self, pattern_size: usize, errors: usize) -> usize {
    self.entries[&(pattern_size, errors)]
  }

  /// The minimiser window this table was built for.
  pub fn window(&self) -> usize {
    self.window
  }
}
