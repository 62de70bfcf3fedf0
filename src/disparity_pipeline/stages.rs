//! Processing stages
//!
//! Host implementations of the five pipeline stages. The first three are
//! row-parallel through rayon and are driven by [`CpuBackend`]; occlusion
//! filling and normalization are sequential and always run on the host.
//!
//! [`CpuBackend`]: crate::disparity_pipeline::backend::CpuBackend

pub mod preprocess;
pub mod zncc;
pub mod cross_check;
pub mod occlusion;
pub mod normalize;

pub use preprocess::{downscale_to_gray, luminance};
pub use zncc::{match_disparity, zncc_score};
pub use cross_check::cross_check;
pub use occlusion::fill_occlusions;
pub use normalize::normalize;
