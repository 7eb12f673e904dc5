//! The probabilistic threshold model: given a shape, minimiser window,
//! error tolerance and target false-positive rate, computes the
//! minimum number of shared minimisers a query of a given length must
//! contribute to a bin before that bin counts as a match.

pub mod direct;
pub mod engine;
pub mod indirect;

pub use engine::{ConvolutionModel, ThresholdEngine, ThresholdTable};
