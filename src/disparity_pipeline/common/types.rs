//! Image and disparity buffer types

use crate::disparity_pipeline::common::error::{DisparityError, Result};

fn check_buffer(width: usize, height: usize, channels: usize, actual: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(DisparityError::InvalidDimensions(width, height));
    }
    if actual != width * height * channels {
        return Err(DisparityError::InvalidBuffer {
            width,
            height,
            channels,
            actual,
        });
    }
    Ok(())
}

/// Decoded source image, 8 bits per channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// Interleaved pixel data [R, G, B, A, R, G, B, A, ...]
    pub data: Vec<u8>,
}

impl RgbaImage {
    pub const CHANNELS: usize = 4;

    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        check_buffer(width, height, Self::CHANNELS, data.len())?;
        Ok(Self { width, height, data })
    }

    /// Builds an opaque image from a per-pixel `(x, y) -> [r, g, b]` function.
    /// The size is not validated; preprocessing rejects empty images.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * Self::CHANNELS);
        for y in 0..height {
            for x in 0..width {
                let [r, g, b] = f(x, y);
                data.extend_from_slice(&[r, g, b, u8::MAX]);
            }
        }
        Self { width, height, data }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

/// Single channel 8-bit image produced by the preprocessor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayImage {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// Row-major luminance values
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        check_buffer(width, height, 1, data.len())?;
        Ok(Self { width, height, data })
    }

    /// Builds an image from a per-pixel function. Unlike [`GrayImage::new`]
    /// this does not validate the size; stages reject empty images.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> u8) -> Self {
        let data = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self { width, height, data }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Pixel lookup with coordinates clamped to the image border.
    #[inline]
    pub fn clamped(&self, x: i64, y: i64) -> u8 {
        let cx = x.clamp(0, self.width as i64 - 1) as usize;
        let cy = y.clamp(0, self.height as i64 - 1) as usize;
        self.data[cy * self.width + cx]
    }
}

/// Per-pixel disparity magnitudes. After the cross-check a value of
/// [`DisparityMap::INVALID`] marks an occluded or inconsistent pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisparityMap {
    /// Width of the map in pixels
    pub width: usize,
    /// Height of the map in pixels
    pub height: usize,
    /// Row-major disparity values
    pub data: Vec<u8>,
}

impl DisparityMap {
    pub const INVALID: u8 = 0;

    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        check_buffer(width, height, 1, data.len())?;
        Ok(Self { width, height, data })
    }

    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![Self::INVALID; width * height],
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    pub fn invalid_count(&self) -> usize {
        self.data.iter().filter(|&&v| v == Self::INVALID).count()
    }
}
