//! Leaf error types for shape parsing and minimiser-stream construction.
//!
//! These are intentionally small and local, in the style of
//! `dbutils::error`: each is its own type implementing
//! [`std::error::Error`] rather than a shared umbrella enum, so that
//! the driver crate can fold them into its own error kind with
//! `#[from]`.

use core::fmt;

/// A shape bitstring failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
  /// The shape was empty.
  Empty,
  /// The shape is longer than the maximum supported span of 32.
  TooLong {
    /// The offending length.
    len: usize,
  },
  /// The first or last position of the shape was not set.
  UnanchoredEnds,
  /// The bitstring contained a character other than `'0'` or `'1'`.
  InvalidChar {
    /// The offending character.
    ch: char,
  },
}

impl fmt::Display for ShapeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Empty => write!(f, "shape must not be empty"),
      Self::TooLong { len } => write!(f, "shape span {len} exceeds the maximum of 32"),
      Self::UnanchoredEnds => write!(f, "shape must have its first and last position set"),
      Self::InvalidChar { ch } => write!(f, "shape bitstring contains invalid character '{ch}'"),
    }
  }
}

impl std::error::Error for ShapeError {}

/// A minimiser-stream construction failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinimiserError {
  /// `window_size` was smaller than the shape's physical span.
  WindowTooSmall {
    /// The requested window size.
    window: usize,
    /// The shape's physical span.
    span: usize,
  },
}

impl fmt::Display for MinimiserError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::WindowTooSmall { window, span } => write!(
        f,
        "window size {window} must be at least the shape span {span}"
      ),
    }
  }
}

impl std::error::Error for MinimiserError {}
