//! Dense stereo disparity estimation with windowed ZNCC matching.
//!
//! The [`disparity_pipeline`] module holds the five processing stages, the
//! compute backends that run them and the image I/O around them.

pub mod disparity_pipeline;
pub mod logger;
