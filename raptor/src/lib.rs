//! Approximate-membership search over collections of biological
//! sequences: builds an interleaved Bloom filter index from reference
//! files and answers "which bins likely contain this read?" queries
//! against it.
//!
//! This crate is the driver: it wires [`raptor_core`]'s hashing and
//! threshold model and [`raptor_ibf`]'s filter together into the
//! `build` and `search` pipelines, and owns the on-disk index format.

pub mod build;
pub mod cancel;
pub mod error;
pub mod index;
pub mod search;

pub use cancel::CancellationToken;
pub use error::{Error, Result};
