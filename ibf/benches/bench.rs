use divan::Bencher;
use raptor_ibf::{InterleavedBloomFilter, MembershipAgent};

fn main() {
  divan::main();
}

const BINS: usize = 1024;
const BITS_PER_BIN: usize = 1 << 16;
const HASH_COUNT: usize = 2;

fn hashes() -> Vec<u64> {
  const NUM: usize = 4096;
  (0..NUM as u64).map(|i| i.wrapping_mul(0x9E3779B97F4A7C15)).collect()
}

#[divan::bench]
fn emplace(bencher: Bencher) {
  bencher
    .with_inputs(|| (InterleavedBloomFilter::new(BINS, BITS_PER_BIN, HASH_COUNT).unwrap(), hashes()))
    .bench_local_values(|(filter, hashes)| {
      for (i, h) in hashes.iter().enumerate() {
        filter.emplace(*h, i % BINS);
      }
    });
}

#[divan::bench]
fn bulk_contains(bencher: Bencher) {
  let filter = InterleavedBloomFilter::new(BINS, BITS_PER_BIN, HASH_COUNT).unwrap();
  let hashes = hashes();
  for (i, h) in hashes.iter().enumerate() {
    filter.emplace(*h, i % BINS);
  }

  bencher.bench_local(|| {
    for h in &hashes {
      std::hint::black_box(filter.bulk_contains(*h));
    }
  });
}

#[divan::bench]
fn membership_agent_accumulate(bencher: Bencher) {
  let filter = InterleavedBloomFilter::new(BINS, BITS_PER_BIN, HASH_COUNT).unwrap();
  let hashes = hashes();
  for (i, h) in hashes.iter().enumerate() {
    filter.emplace(*h, i % BINS);
  }

  bencher.bench_local(|| {
    let mut agent = MembershipAgent::new(&filter);
    for h in &hashes {
      agent.accumulate(*h);
    }
    std::hint::black_box(agent.passing(1));
  });
}
