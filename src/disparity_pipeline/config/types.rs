//! Stereo matching configuration types

use std::path::Path;

use crate::disparity_pipeline::common::error::{DisparityError, Result};
use crate::disparity_pipeline::config::builder::StereoConfigBuilder;

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level (good speed/size balance)
    DeflateFast,
    /// Deflate compression - best compression (slower)
    DeflateBest,
    /// Deflate compression - balanced
    DeflateBalanced,
}

/// Container format of the encoded disparity image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Tiff(TiffCompression),
}

impl OutputFormat {
    /// Picks TIFF for `.tif`/`.tiff` paths and PNG for anything else.
    pub fn from_path(path: &Path, compression: TiffCompression) -> Self {
        let is_tiff = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"))
            .unwrap_or(false);
        if is_tiff {
            OutputFormat::Tiff(compression)
        } else {
            OutputFormat::Png
        }
    }
}

/// Where the data-parallel stages run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Rayon thread pool on the host
    Cpu,
    /// CUDA kernels, only on targets built with `jetson_cuda`
    Cuda,
}

/// Half extents of the matching window. The window spans
/// `(2 * half_width + 1) x (2 * half_height + 1)` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchWindow {
    pub half_width: usize,
    pub half_height: usize,
}

impl MatchWindow {
    pub fn new(half_width: usize, half_height: usize) -> Self {
        Self { half_width, half_height }
    }

    pub fn width(&self) -> usize {
        2 * self.half_width + 1
    }

    pub fn height(&self) -> usize {
        2 * self.half_height + 1
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }
}

/// Inclusive range of signed disparities searched by one matching pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisparityRange {
    pub min: i32,
    pub max: i32,
}

impl DisparityRange {
    pub fn new(min: i32, max: i32) -> Result<Self> {
        if min > max {
            return Err(DisparityError::InvalidConfig(format!(
                "disparity range [{min}, {max}] is empty"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> {
        self.min..=self.max
    }

    pub fn len(&self) -> usize {
        (self.max - self.min) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        self.max < self.min
    }

    /// Largest disparity magnitude reachable in this range.
    pub fn max_magnitude(&self) -> u32 {
        self.min.unsigned_abs().max(self.max.unsigned_abs())
    }
}

/// Parameters of a single matching pass. Each pass gets its own value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchParams {
    pub window: MatchWindow,
    pub range: DisparityRange,
}

/// Configuration for one disparity run
#[derive(Debug, Clone)]
pub struct StereoConfig {
    /// Integer downscale factor applied on each axis
    pub downscale: usize,
    /// ZNCC matching window
    pub window: MatchWindow,
    /// Upper bound of the disparity magnitude searched by both passes
    pub max_disparity: u8,
    /// Largest accepted disagreement between the two directional maps
    pub cross_check_threshold: u8,
    /// Backend executing preprocessing, matching and cross-checking
    pub backend: BackendKind,
    /// Worker threads for the CPU backend, `None` uses the rayon default
    pub threads: Option<usize>,
    /// Encoding of the final disparity image
    pub output_format: OutputFormat,
    /// Whether to reject images too small for the matching window
    pub validate_dimensions: bool,
}

impl Default for StereoConfig {
    fn default() -> Self {
        Self {
            downscale: 4,
            window: MatchWindow::new(8, 15),
            max_disparity: 64,
            cross_check_threshold: 2,
            backend: BackendKind::Cpu,
            threads: None,
            output_format: OutputFormat::Png,
            validate_dimensions: true,
        }
    }
}

impl StereoConfig {
    pub fn builder() -> StereoConfigBuilder {
        StereoConfigBuilder::default()
    }

    /// Left image as reference, searching `[0, max_disparity]`.
    pub fn forward_pass(&self) -> MatchParams {
        MatchParams {
            window: self.window,
            range: DisparityRange {
                min: 0,
                max: i32::from(self.max_disparity),
            },
        }
    }

    /// Right image as reference, searching `[-max_disparity, 0]`.
    pub fn backward_pass(&self) -> MatchParams {
        MatchParams {
            window: self.window,
            range: DisparityRange {
                min: -i32::from(self.max_disparity),
                max: 0,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.downscale == 0 {
            return Err(DisparityError::InvalidConfig(
                "downscale factor must be at least 1".to_string(),
            ));
        }
        if self.threads == Some(0) {
            return Err(DisparityError::InvalidConfig(
                "thread count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Rejects matching inputs smaller than the window when validation is on.
    pub fn check_match_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(DisparityError::InvalidDimensions(width, height));
        }
        if !self.validate_dimensions {
            return Ok(());
        }
        if self.window.width() > width || self.window.height() > height {
            return Err(DisparityError::InvalidConfig(format!(
                "{}x{} matching window does not fit a {}x{} image",
                self.window.width(),
                self.window.height(),
                width,
                height
            )));
        }
        Ok(())
    }
}
