//! Compute backends for the data-parallel stages
//!
//! Preprocessing, both matching passes and the cross-check run through a
//! [`ComputeBackend`]. The CPU backend is always available; the CUDA backend
//! only exists on targets built with `jetson_cuda`.

pub mod cpu_backend;
#[cfg(jetson_cuda)]
pub mod cuda_backend;
mod compute_backend;

// Stand-in when NOT on Jetson
#[cfg(not(jetson_cuda))]
pub struct CudaBackend;

#[cfg(not(jetson_cuda))]
impl CudaBackend {
    pub fn new() -> Result<Self> {
        Err(Self::unavailable())
    }

    fn unavailable() -> DisparityError {
        DisparityError::BackendError("CUDA backend is not available on this platform".to_string())
    }
}

#[cfg(not(jetson_cuda))]
impl ComputeBackend for CudaBackend {
    fn name(&self) -> &'static str {
        "cuda"
    }

    fn preprocess(&self, _image: &RgbaImage, _factor: usize) -> Result<GrayImage> {
        Err(Self::unavailable())
    }

    fn match_disparity(&self, _reference: &GrayImage, _target: &GrayImage, _params: &MatchParams) -> Result<DisparityMap> {
        Err(Self::unavailable())
    }

    fn cross_check(&self, _forward: &DisparityMap, _backward: &DisparityMap, _threshold: u8) -> Result<DisparityMap> {
        Err(Self::unavailable())
    }
}

pub use cpu_backend::CpuBackend;
#[cfg(jetson_cuda)]
pub use cuda_backend::CudaBackend;
pub use compute_backend::ComputeBackend;

use tracing::info;

use crate::disparity_pipeline::common::error::Result;
#[cfg(not(jetson_cuda))]
use crate::disparity_pipeline::common::error::DisparityError;
#[cfg(not(jetson_cuda))]
use crate::disparity_pipeline::common::types::{DisparityMap, GrayImage, RgbaImage};
#[cfg(not(jetson_cuda))]
use crate::disparity_pipeline::config::MatchParams;
use crate::disparity_pipeline::config::{BackendKind, StereoConfig};

/// Builds the backend selected by `config.backend`.
pub fn create_backend(config: &StereoConfig) -> Result<Box<dyn ComputeBackend>> {
    let backend: Box<dyn ComputeBackend> = match config.backend {
        BackendKind::Cpu => Box::new(CpuBackend::new(config.threads)?),
        BackendKind::Cuda => Box::new(CudaBackend::new()?),
    };
    info!("Using {} compute backend", backend.name());
    Ok(backend)
}
