//! A bit-sliced, cache-line-friendly interleaved Bloom filter: `B`
//! Bloom filters stored side by side so that one membership query
//! returns a `B`-bit occupancy vector in a single pass over
//! `O(h * B_pad / 64)` words.
//!
//! [`InterleavedBloomFilter`] is the mutable, build-time structure:
//! many threads may [`InterleavedBloomFilter::emplace`] concurrently
//! (the design's atomic-OR discipline), but no thread may query while
//! another is still writing. Once build workers drain, the filter is
//! read-only; [`agent::MembershipAgent`] is the per-thread scratch
//! buffer queries are meant to go through, and
//! [`compressed::CompressedInterleavedBloomFilter`] is an optional
//! smaller read-only view over a finished filter.

pub mod agent;
pub mod bits;
pub mod compressed;
pub mod correction;
pub mod error;
mod filter;
pub mod hasher;

pub use agent::MembershipAgent;
pub use compressed::CompressedInterleavedBloomFilter;
pub use error::IbfError;
pub use filter::InterleavedBloomFilter;
