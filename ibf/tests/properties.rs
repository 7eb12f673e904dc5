use raptor_ibf::correction::bin_size_in_bits;
use raptor_ibf::InterleavedBloomFilter;

proptest::proptest! {
  #![proptest_config(proptest::prelude::ProptestConfig::with_cases(64))]

  /// spec.md §8 invariant 1: `emplace(x, b)` followed by `bulk_contains(x)[b]`
  /// is always `true`, for any hash and any bin the filter was built with.
  #[test]
  fn emplace_then_contains_has_no_false_negatives(x: u64, bin in 0usize..32, extra: u64) {
    let filter = InterleavedBloomFilter::new(32, 1024, 3).unwrap();
    filter.emplace(x, bin);
    proptest::prop_assert!(filter.bulk_contains(x)[bin]);
    // A second, unrelated emplace must not clear the first bin's bit.
    filter.emplace(extra, (bin + 1) % 32);
    proptest::prop_assert!(filter.bulk_contains(x)[bin]);
  }

  /// spec.md §8 invariant 2: `bulk_contains` is a pure function of the bit
  /// vector — two calls on the same (unmodified) filter agree.
  #[test]
  fn bulk_contains_is_pure_under_repeated_queries(inserted in proptest::collection::vec((0u64..10_000, 0usize..32), 0..64), query: u64) {
    let filter = InterleavedBloomFilter::new(32, 1024, 3).unwrap();
    for (x, bin) in &inserted {
      filter.emplace(*x, *bin);
    }
    let a = filter.bulk_contains(query);
    let b = filter.bulk_contains(query);
    proptest::prop_assert_eq!(a, b);
  }
}

fn splitmix_stream(seed: u64) -> impl Iterator<Item = u64> {
  let mut state = seed;
  std::iter::from_fn(move || {
    state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut x = state;
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58476d1ce4e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d049bb133111eb);
    x ^= x >> 31;
    Some(x)
  })
}

#[test]
fn fpr_is_within_bound_of_target() {
  let target_fpr = 0.05;
  let elements = 2_000usize;
  let hash_count = 2;
  let bits = bin_size_in_bits(elements, hash_count, target_fpr);

  let filter = InterleavedBloomFilter::new(1, bits, hash_count).unwrap();
  let mut inserted = std::collections::HashSet::new();
  for x in splitmix_stream(1).take(elements) {
    filter.emplace(x, 0);
    inserted.insert(x);
  }

  let trials = 200_000;
  let mut false_positives = 0u64;
  for x in splitmix_stream(0xDEAD_BEEF).take(trials) {
    if inserted.contains(&x) {
      continue;
    }
    if filter.bulk_contains(x)[0] {
      false_positives += 1;
    }
  }

  let empirical = false_positives as f64 / trials as f64;
  assert!(
    empirical <= target_fpr * 1.1,
    "empirical fpr {empirical} exceeded {} * 1.1",
    target_fpr
  );
}

#[test]
fn partition_union_matches_unpartitioned_membership() {
  const BINS: usize = 16;
  const PARTS: usize = 4;
  let whole = InterleavedBloomFilter::new(BINS, 4096, 2).unwrap();
  let parts: Vec<_> = (0..PARTS)
    .map(|_| InterleavedBloomFilter::new(BINS, 4096, 2).unwrap())
    .collect();

  let hash_partition = |x: u64| -> usize { (x >> 62) as usize % PARTS };

  for (i, x) in splitmix_stream(7).take(500).enumerate() {
    let bin = i % BINS;
    whole.emplace(x, bin);
    parts[hash_partition(x)].emplace(x, bin);
  }

  for x in splitmix_stream(7).take(500) {
    let expected = whole.bulk_contains(x);
    let got = parts[hash_partition(x)].bulk_contains(x);
    assert_eq!(expected, got, "mismatch for x={x}");
  }
}
