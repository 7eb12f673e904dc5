//! The on-disk index: a single file (format) or a set of partitions
//! sharing one manifest (partition).

pub mod format;
pub mod partition;

pub use format::{IbfBody, Index};
pub use partition::Manifest;
