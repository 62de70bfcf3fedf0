//! Run configuration module
//!
//! Every algorithm parameter of a run lives in [`StereoConfig`], which is
//! built once and passed explicitly to each stage.

pub mod types;
mod builder;

pub use types::{
    BackendKind,
    DisparityRange,
    MatchParams,
    MatchWindow,
    OutputFormat,
    StereoConfig,
    TiffCompression,
};
pub use builder::StereoConfigBuilder;
