use crate::disparity_pipeline::common::error::Result;
use crate::disparity_pipeline::common::types::{DisparityMap, GrayImage, RgbaImage};
use crate::disparity_pipeline::config::MatchParams;

/// Data-parallel execution of the per-pixel stages. Each call returns only
/// once its whole output is computed.
pub trait ComputeBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Grayscale conversion with `factor x factor` block averaging.
    fn preprocess(&self, image: &RgbaImage, factor: usize) -> Result<GrayImage>;

    /// One ZNCC pass with `reference` as the reference view.
    fn match_disparity(&self, reference: &GrayImage, target: &GrayImage, params: &MatchParams) -> Result<DisparityMap>;

    fn cross_check(&self, forward: &DisparityMap, backward: &DisparityMap, threshold: u8) -> Result<DisparityMap>;
}
