use cudarc::driver::safe::*;
use cudarc::nvrtc::Ptx;
use std::sync::Arc;
use tracing::{debug, info};

use crate::disparity_pipeline::backend::ComputeBackend;
use crate::disparity_pipeline::common::error::{DisparityError, Result};
use crate::disparity_pipeline::common::types::{DisparityMap, GrayImage, RgbaImage};
use crate::disparity_pipeline::config::MatchParams;

const BLOCK_2D: u32 = 16;
const BLOCK_1D: u32 = 256;

fn backend_err(e: impl std::fmt::Display) -> DisparityError {
    DisparityError::BackendError(e.to_string())
}

fn execution_err(kernel: &str, e: impl std::fmt::Display) -> DisparityError {
    DisparityError::ExecutionError(format!("{kernel}: {e}"))
}

fn grid_2d(width: usize, height: usize) -> LaunchConfig {
    LaunchConfig {
        grid_dim: (
            (width as u32).div_ceil(BLOCK_2D),
            (height as u32).div_ceil(BLOCK_2D),
            1,
        ),
        block_dim: (BLOCK_2D, BLOCK_2D, 1),
        shared_mem_bytes: 0,
    }
}

/// Stereo stages as CUDA kernels on the default stream
pub struct CudaBackend {
    stream: Arc<CudaStream>,
    downscale_kernel: CudaFunction,
    zncc_kernel: CudaFunction,
    cross_check_kernel: CudaFunction,
}

impl CudaBackend {
    /// Initialize CUDA context and load the kernels
    pub fn new() -> Result<Self> {
        // Include compiled PTX from build.rs
        let ptx = include_str!(concat!(env!("OUT_DIR"), "/zncc.ptx"));

        let ctx = CudaContext::new(0).map_err(backend_err)?;
        let stream = ctx.default_stream();
        let module = ctx.load_module(Ptx::from_src(ptx)).map_err(backend_err)?;

        let downscale_kernel = module.load_function("downscale_gray").map_err(backend_err)?;
        let zncc_kernel = module.load_function("zncc_match").map_err(backend_err)?;
        let cross_check_kernel = module.load_function("cross_check").map_err(backend_err)?;

        info!("CUDA kernels loaded");
        Ok(Self {
            stream,
            downscale_kernel,
            zncc_kernel,
            cross_check_kernel,
        })
    }
}

impl ComputeBackend for CudaBackend {
    fn name(&self) -> &'static str {
        "cuda"
    }

    fn preprocess(&self, image: &RgbaImage, factor: usize) -> Result<GrayImage> {
        if factor == 0 {
            return Err(DisparityError::InvalidConfig(
                "downscale factor must be at least 1".to_string(),
            ));
        }
        let width = image.width / factor;
        let height = image.height / factor;
        if width == 0 || height == 0 {
            return Err(DisparityError::InvalidDimensions(width, height));
        }

        let d_rgba = self.stream.clone_htod(&image.data).map_err(backend_err)?;
        let mut d_gray = self.stream.alloc_zeros::<u8>(width * height).map_err(backend_err)?;

        let src_width = image.width as i32;
        let width_i32 = width as i32;
        let height_i32 = height as i32;
        let factor_i32 = factor as i32;

        let mut launch_args = self.stream.launch_builder(&self.downscale_kernel);
        launch_args.arg(&d_rgba);
        launch_args.arg(&mut d_gray);
        launch_args.arg(&src_width);
        launch_args.arg(&width_i32);
        launch_args.arg(&height_i32);
        launch_args.arg(&factor_i32);

        unsafe { launch_args.launch(grid_2d(width, height)) }
            .map_err(|e| execution_err("downscale_gray", e))?;

        let data = self
            .stream
            .clone_dtoh(&d_gray)
            .map_err(|e| execution_err("downscale_gray readback", e))?;
        GrayImage::new(width, height, data)
    }

    fn match_disparity(&self, reference: &GrayImage, target: &GrayImage, params: &MatchParams) -> Result<DisparityMap> {
        if reference.dimensions() != target.dimensions() {
            return Err(DisparityError::mismatch(reference.dimensions(), target.dimensions()));
        }
        let (width, height) = reference.dimensions();
        debug!(
            "Launching zncc_match over d in [{}, {}]",
            params.range.min, params.range.max
        );

        let d_ref = self.stream.clone_htod(&reference.data).map_err(backend_err)?;
        let d_tgt = self.stream.clone_htod(&target.data).map_err(backend_err)?;
        let mut d_out = self.stream.alloc_zeros::<u8>(width * height).map_err(backend_err)?;

        let width_i32 = width as i32;
        let height_i32 = height as i32;
        let half_w = params.window.half_width as i32;
        let half_h = params.window.half_height as i32;
        let min_d = params.range.min;
        let max_d = params.range.max;

        let mut launch_args = self.stream.launch_builder(&self.zncc_kernel);
        launch_args.arg(&d_ref);
        launch_args.arg(&d_tgt);
        launch_args.arg(&mut d_out);
        launch_args.arg(&width_i32);
        launch_args.arg(&height_i32);
        launch_args.arg(&half_w);
        launch_args.arg(&half_h);
        launch_args.arg(&min_d);
        launch_args.arg(&max_d);

        unsafe { launch_args.launch(grid_2d(width, height)) }
            .map_err(|e| execution_err("zncc_match", e))?;

        let data = self
            .stream
            .clone_dtoh(&d_out)
            .map_err(|e| execution_err("zncc_match readback", e))?;
        DisparityMap::new(width, height, data)
    }

    fn cross_check(&self, forward: &DisparityMap, backward: &DisparityMap, threshold: u8) -> Result<DisparityMap> {
        if forward.dimensions() != backward.dimensions() {
            return Err(DisparityError::mismatch(forward.dimensions(), backward.dimensions()));
        }
        let count = forward.data.len();

        let d_forward = self.stream.clone_htod(&forward.data).map_err(backend_err)?;
        let d_backward = self.stream.clone_htod(&backward.data).map_err(backend_err)?;
        let mut d_out = self.stream.alloc_zeros::<u8>(count).map_err(backend_err)?;

        let count_i32 = count as i32;
        let threshold_i32 = i32::from(threshold);

        let mut launch_args = self.stream.launch_builder(&self.cross_check_kernel);
        launch_args.arg(&d_forward);
        launch_args.arg(&d_backward);
        launch_args.arg(&mut d_out);
        launch_args.arg(&count_i32);
        launch_args.arg(&threshold_i32);

        let cfg = LaunchConfig {
            grid_dim: ((count as u32).div_ceil(BLOCK_1D), 1, 1),
            block_dim: (BLOCK_1D, 1, 1),
            shared_mem_bytes: 0,
        };
        unsafe { launch_args.launch(cfg) }
            .map_err(|e| execution_err("cross_check", e))?;

        let data = self
            .stream
            .clone_dtoh(&d_out)
            .map_err(|e| execution_err("cross_check readback", e))?;
        DisparityMap::new(forward.width, forward.height, data)
    }
}
