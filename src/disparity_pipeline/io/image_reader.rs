//! Stereo image reader backed by the `image` crate.
//!
//! Any format the crate can decode is accepted and converted to 8-bit RGBA,
//! so grayscale or RGB inputs are expanded rather than rejected.

use tracing::debug;

use crate::disparity_pipeline::common::error::{DisparityError, Result};
use crate::disparity_pipeline::common::types::RgbaImage;
use crate::disparity_pipeline::io::reader::StereoImageReader;

pub struct ImageCrateReader;

impl StereoImageReader for ImageCrateReader {
    fn read_rgba(&self, data: &[u8]) -> Result<RgbaImage> {
        debug!("Decoding image, {} bytes", data.len());

        let decoded = image::load_from_memory(data)
            .map_err(|e| DisparityError::DecodeError(e.to_string()))?
            .to_rgba8();

        let (width, height) = (decoded.width() as usize, decoded.height() as usize);
        debug!("Decoded image: {}x{}", width, height);

        RgbaImage::new(width, height, decoded.into_raw())
    }
}
