use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::info;

use crate::disparity_pipeline::backend::ComputeBackend;
use crate::disparity_pipeline::common::error::{DisparityError, Result};
use crate::disparity_pipeline::common::types::{DisparityMap, GrayImage, RgbaImage};
use crate::disparity_pipeline::config::MatchParams;
use crate::disparity_pipeline::stages;

/// Runs the stages on a rayon pool, rows split across workers.
pub struct CpuBackend {
    pool: ThreadPool,
}

impl CpuBackend {
    /// `threads = None` sizes the pool like rayon's global pool.
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("zncc-worker-{i}"));
        if let Some(threads) = threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| DisparityError::BackendError(format!("failed to start thread pool: {e}")))?;

        info!("CPU backend ready with {} worker threads", pool.current_num_threads());
        Ok(Self { pool })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn preprocess(&self, image: &RgbaImage, factor: usize) -> Result<GrayImage> {
        self.pool.install(|| stages::downscale_to_gray(image, factor))
    }

    fn match_disparity(&self, reference: &GrayImage, target: &GrayImage, params: &MatchParams) -> Result<DisparityMap> {
        self.pool.install(|| stages::match_disparity(reference, target, params))
    }

    fn cross_check(&self, forward: &DisparityMap, backward: &DisparityMap, threshold: u8) -> Result<DisparityMap> {
        self.pool.install(|| stages::cross_check(forward, backward, threshold))
    }
}
