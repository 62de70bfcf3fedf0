//! Stereo disparity pipeline module
//!
//! This module turns a rectified RGBA stereo pair into a normalized 8-bit
//! disparity map. Stages live in [`stages`], the data-parallel ones run
//! through a [`backend::ComputeBackend`], and [`io`] handles decoding and
//! encoding around them.

pub mod common;
pub mod config;
pub mod io;
pub mod backend;
pub mod stages;
mod pipeline;


pub use common::{
    DisparityError,
    Result,
    RgbaImage,
    GrayImage,
    DisparityMap,
    PipelineTimings,
    StepTiming,
    Timer,
};

pub use config::{
    BackendKind,
    DisparityRange,
    MatchParams,
    MatchWindow,
    OutputFormat,
    StereoConfig,
    StereoConfigBuilder,
    TiffCompression,
};

pub use io::{
    StereoImageReader,
    ImageCrateReader,
    DisparityWriter,
    StandardDisparityWriter,
};

pub use backend::{
    ComputeBackend,
    CpuBackend,
    CudaBackend,
};

pub use pipeline::{
    DisparityPipeline,
    StageOutputs,
};
