use rayon::prelude::*;
use tracing::debug;

use crate::disparity_pipeline::common::error::{DisparityError, Result};
use crate::disparity_pipeline::common::types::{GrayImage, RgbaImage};

/// Rec.709 luma weights, alpha is ignored.
const LUMA_R: f32 = 0.2126;
const LUMA_G: f32 = 0.7152;
const LUMA_B: f32 = 0.0722;

#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32
}

/// Converts to grayscale while shrinking each axis by `factor`.
///
/// Each output pixel is the mean luminance of the `factor x factor` source
/// block at `(x * factor, y * factor)`. Trailing source rows and columns that
/// do not fill a whole block are dropped.
pub fn downscale_to_gray(image: &RgbaImage, factor: usize) -> Result<GrayImage> {
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

    debug!(
        "Downscaling {}x{} by {} to {}x{}",
        image.width, image.height, factor, width, height
    );

    let src_stride = image.width * RgbaImage::CHANNELS;
    let block_area = (factor * factor) as f32;
    let mut data = vec![0u8; width * height];

    data.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let mut sum = 0.0f32;
                for by in 0..factor {
                    let start = (y * factor + by) * src_stride + x * factor * RgbaImage::CHANNELS;
                    let block_row = &image.data[start..start + factor * RgbaImage::CHANNELS];
                    for px in block_row.chunks_exact(RgbaImage::CHANNELS) {
                        sum += luminance(px[0], px[1], px[2]);
                    }
                }
                *out = (sum / block_area).round().clamp(0.0, 255.0) as u8;
            }
        });

    GrayImage::new(width, height, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_size_truncates() {
        let image = RgbaImage::from_fn(10, 7, |_, _| [0, 0, 0]);
        let gray = downscale_to_gray(&image, 4).unwrap();
        assert_eq!(gray.dimensions(), (2, 1));
        assert_eq!(gray.data.len(), 2);
    }

    #[test]
    fn test_gray_input_keeps_its_value() {
        let image = RgbaImage::from_fn(8, 8, |_, _| [90, 90, 90]);
        let gray = downscale_to_gray(&image, 4).unwrap();
        assert!(gray.data.iter().all(|&v| v == 90));
    }

    #[test]
    fn test_block_average() {
        // Columns alternate between two grays, so every 2x2 block averages them.
        let image = RgbaImage::from_fn(4, 4, |x, _| if x % 2 == 0 { [100, 100, 100] } else { [200, 200, 200] });
        let gray = downscale_to_gray(&image, 2).unwrap();
        assert_eq!(gray.dimensions(), (2, 2));
        assert!(gray.data.iter().all(|&v| v == 150));
    }

    #[test]
    fn test_factor_one_is_plain_conversion() {
        let image = RgbaImage::from_fn(3, 2, |x, y| [(x * 40) as u8, (y * 40) as u8, 200]);
        let gray = downscale_to_gray(&image, 1).unwrap();
        assert_eq!(gray.dimensions(), (3, 2));
        let expected = luminance(80, 40, 200).round() as u8;
        assert_eq!(gray.data[1 * 3 + 2], expected);
    }

    #[test]
    fn test_green_dominates_luminance() {
        assert!(luminance(0, 255, 0) > luminance(255, 0, 0));
        assert!(luminance(255, 0, 0) > luminance(0, 0, 255));
        assert!((luminance(255, 255, 255) - 255.0).abs() < 1e-3);
    }

    #[test]
    fn test_rejects_bad_factor() {
        let image = RgbaImage::from_fn(4, 4, |_, _| [0, 0, 0]);
        assert!(matches!(downscale_to_gray(&image, 0), Err(DisparityError::InvalidConfig(_))));
        assert!(matches!(
            downscale_to_gray(&image, 5),
            Err(DisparityError::InvalidDimensions(0, 0))
        ));
    }
}
