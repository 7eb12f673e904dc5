//! The driver's unified error type. Leaf components ([`raptor_core`],
//! [`raptor_ibf`]) return their own small typed errors; this crate
//! folds them into the six kinds the CLI surfaces as diagnostics and
//! exit codes.

use std::io;
use std::path::PathBuf;

/// Every error the build and search drivers can surface.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// A reference or query file was missing, unreadable, or (in strict
  /// mode) contained non-DNA4 content.
  #[error("cannot read input '{path}': {reason}")]
  InputUnreadable {
    /// The offending path.
    path: PathBuf,
    /// Human-readable cause.
    reason: String,
  },

  /// The on-disk index's magic, version, checksum, or shape was
  /// inconsistent with what the header promised.
  #[error("index at '{path}' is corrupt: {reason}")]
  IndexCorrupt {
    /// The index file path.
    path: PathBuf,
    /// Human-readable cause.
    reason: String,
  },

  /// A CLI flag or programmatic option was out of range or internally
  /// inconsistent.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// Writing the index (or intermediate state) failed, typically
  /// because the disk is full.
  #[error("failed to write '{path}': {source}")]
  IoExhausted {
    /// The path being written.
    path: PathBuf,
    /// The underlying I/O error.
    #[source]
    source: io::Error,
  },

  /// The requested bin count and bit width exceed addressable memory.
  #[error("requested layout exceeds available resources: {0}")]
  OutOfResources(String),

  /// A cooperative cancellation token fired before the operation
  /// completed.
  #[error("operation cancelled")]
  Cancelled,
}

impl From<raptor_ibf::IbfError> for Error {
  fn from(e: raptor_ibf::IbfError) -> Self {
    match e {
      raptor_ibf::IbfError::OutOfResources { .. } => Error::OutOfResources(e.to_string()),
      other => Error::InvalidArgument(other.to_string()),
    }
  }
}

impl From<raptor_core::error::ShapeError> for Error {
  fn from(e: raptor_core::error::ShapeError) -> Self {
    Error::InvalidArgument(e.to_string())
  }
}

impl From<raptor_core::error::MinimiserError> for Error {
  fn from(e: raptor_core::error::MinimiserError) -> Self {
    Error::InvalidArgument(e.to_string())
  }
}

/// Convenience alias for driver operations.
pub type Result<T> = std::result::Result<T, Error>;
