//! Common utilities module
//!
//! Error type, image buffers and stage timing shared across the pipeline.

pub mod error;
pub mod types;
pub mod timing;

pub use error::{DisparityError, Result};
pub use types::{RgbaImage, GrayImage, DisparityMap};
pub use timing::{PipelineTimings, StepTiming, Timer};
