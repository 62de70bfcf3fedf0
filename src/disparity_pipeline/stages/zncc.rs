//! Windowed ZNCC disparity search.
//!
//! Boundary policy: every sample of both windows is clamped to the image
//! border, so each pixel is scored over a full window, including pixels whose
//! disparity-shifted window leaves the image.

use rayon::prelude::*;
use tracing::debug;

use crate::disparity_pipeline::common::error::{DisparityError, Result};
use crate::disparity_pipeline::common::types::{DisparityMap, GrayImage};
use crate::disparity_pipeline::config::{MatchParams, MatchWindow};

/// Mean and root of the summed squared deviation of one window.
#[derive(Debug, Clone, Copy, Default)]
struct WindowStats {
    mean: f64,
    deviation: f64,
}

fn window_stats(image: &GrayImage, cx: i64, cy: i64, window: MatchWindow) -> WindowStats {
    let hw = window.half_width as i64;
    let hh = window.half_height as i64;

    let mut sum = 0.0;
    for j in -hh..=hh {
        for i in -hw..=hw {
            sum += f64::from(image.clamped(cx + i, cy + j));
        }
    }
    let mean = sum / window.area() as f64;

    let mut sq = 0.0;
    for j in -hh..=hh {
        for i in -hw..=hw {
            let v = f64::from(image.clamped(cx + i, cy + j)) - mean;
            sq += v * v;
        }
    }

    WindowStats {
        mean,
        deviation: sq.sqrt(),
    }
}

/// ZNCC between the reference window at `(x, y)` and the target window at
/// `(x + d, y)`. Flat windows, where the denominator vanishes, score 0.
pub fn zncc_score(
    reference: &GrayImage,
    target: &GrayImage,
    x: usize,
    y: usize,
    d: i32,
    window: MatchWindow,
) -> f64 {
    let (x, y) = (x as i64, y as i64);
    let tx = x + i64::from(d);
    let ref_stats = window_stats(reference, x, y, window);
    let tgt_stats = window_stats(target, tx, y, window);

    let hw = window.half_width as i64;
    let hh = window.half_height as i64;
    let mut num = 0.0;
    for j in -hh..=hh {
        for i in -hw..=hw {
            let l = f64::from(reference.clamped(x + i, y + j)) - ref_stats.mean;
            let r = f64::from(target.clamped(tx + i, y + j)) - tgt_stats.mean;
            num += l * r;
        }
    }

    let denom = ref_stats.deviation * tgt_stats.deviation;
    if denom > 0.0 { num / denom } else { 0.0 }
}

/// Window statistics of the target for every centre a pass can visit,
/// including centres shifted past the left and right borders.
struct TargetStats {
    margin: i64,
    stride: usize,
    stats: Vec<WindowStats>,
}

impl TargetStats {
    fn compute(target: &GrayImage, window: MatchWindow, margin: i64) -> Self {
        let stride = target.width + 2 * margin as usize;
        let mut stats = vec![WindowStats::default(); stride * target.height];

        stats
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row)| {
                for (k, slot) in row.iter_mut().enumerate() {
                    *slot = window_stats(target, k as i64 - margin, y as i64, window);
                }
            });

        Self { margin, stride, stats }
    }

    #[inline]
    fn get(&self, cx: i64, y: usize) -> WindowStats {
        self.stats[y * self.stride + (cx + self.margin) as usize]
    }
}

/// Picks the disparity with the highest score; equal scores keep the one
/// with the smaller magnitude.
fn best_disparity(
    reference: &GrayImage,
    target: &GrayImage,
    target_stats: &TargetStats,
    x: usize,
    y: usize,
    params: &MatchParams,
    centered: &mut Vec<f64>,
) -> i32 {
    let window = params.window;
    let hw = window.half_width as i64;
    let hh = window.half_height as i64;
    let (xi, yi) = (x as i64, y as i64);

    let ref_stats = window_stats(reference, xi, yi, window);
    centered.clear();
    for j in -hh..=hh {
        for i in -hw..=hw {
            centered.push(f64::from(reference.clamped(xi + i, yi + j)) - ref_stats.mean);
        }
    }

    let mut best_d = params.range.min;
    let mut best_score = f64::NEG_INFINITY;

    for d in params.range.iter() {
        let tx = xi + i64::from(d);
        let tgt = target_stats.get(tx, y);
        let denom = ref_stats.deviation * tgt.deviation;

        let score = if denom > 0.0 {
            let mut num = 0.0;
            let mut k = 0;
            for j in -hh..=hh {
                for i in -hw..=hw {
                    num += centered[k] * (f64::from(target.clamped(tx + i, yi + j)) - tgt.mean);
                    k += 1;
                }
            }
            num / denom
        } else {
            0.0
        };

        if score > best_score || (score == best_score && d.unsigned_abs() < best_d.unsigned_abs()) {
            best_score = score;
            best_d = d;
        }
    }

    best_d
}

/// Computes the disparity map of `reference` against `target`.
///
/// Every output pixel holds `|d*|`, the magnitude of the best scoring
/// disparity in `params.range`, saturated at 255.
pub fn match_disparity(
    reference: &GrayImage,
    target: &GrayImage,
    params: &MatchParams,
) -> Result<DisparityMap> {
    if reference.dimensions() != target.dimensions() {
        return Err(DisparityError::mismatch(reference.dimensions(), target.dimensions()));
    }
    let (width, height) = reference.dimensions();
    if width == 0 || height == 0 {
        return Err(DisparityError::InvalidDimensions(width, height));
    }
    if params.range.is_empty() {
        return Err(DisparityError::InvalidConfig(format!(
            "disparity range [{}, {}] is empty",
            params.range.min, params.range.max
        )));
    }

    debug!(
        "ZNCC matching {}x{} over d in [{}, {}] with {}x{} window",
        width,
        height,
        params.range.min,
        params.range.max,
        params.window.width(),
        params.window.height()
    );

    let margin = i64::from(params.range.max_magnitude());
    let target_stats = TargetStats::compute(target, params.window, margin);

    let mut data = vec![DisparityMap::INVALID; width * height];
    data.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let mut centered = Vec::with_capacity(params.window.area());
            for (x, out) in row.iter_mut().enumerate() {
                let d = best_disparity(reference, target, &target_stats, x, y, params, &mut centered);
                *out = d.unsigned_abs().min(u32::from(u8::MAX)) as u8;
            }
        });

    DisparityMap::new(width, height, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disparity_pipeline::config::DisparityRange;

    /// Deterministic texture, xorshift per pixel.
    fn noise(width: usize, height: usize, seed: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let mut s = seed ^ ((y * width + x) as u32).wrapping_mul(0x9E37_79B9);
            s ^= s << 13;
            s ^= s >> 17;
            s ^= s << 5;
            (s >> 24) as u8
        })
    }

    fn params(hw: usize, hh: usize, min: i32, max: i32) -> MatchParams {
        MatchParams {
            window: MatchWindow::new(hw, hh),
            range: DisparityRange::new(min, max).unwrap(),
        }
    }

    #[test]
    fn test_flat_windows_score_zero() {
        let flat = GrayImage::from_fn(12, 12, |_, _| 77);
        let textured = noise(12, 12, 3);
        let window = MatchWindow::new(2, 2);

        for d in -4..=4 {
            let a = zncc_score(&flat, &flat, 6, 6, d, window);
            let b = zncc_score(&flat, &textured, 6, 6, d, window);
            let c = zncc_score(&textured, &flat, 6, 6, d, window);
            assert_eq!(a, 0.0);
            assert_eq!(b, 0.0);
            assert_eq!(c, 0.0);
        }
    }

    #[test]
    fn test_identical_images_peak_at_zero() {
        let image = noise(24, 24, 11);
        let window = MatchWindow::new(3, 3);

        let at_zero = zncc_score(&image, &image, 12, 12, 0, window);
        assert!((at_zero - 1.0).abs() < 1e-9);
        for d in (-6..=6).filter(|&d| d != 0) {
            assert!(zncc_score(&image, &image, 12, 12, d, window) < at_zero);
        }
    }

    #[test]
    fn test_score_ignores_brightness_and_contrast() {
        let image = noise(16, 16, 5);
        let brighter = GrayImage::from_fn(16, 16, |x, y| image.data[y * 16 + x] / 2 + 60);
        let score = zncc_score(&image, &brighter, 8, 8, 0, MatchWindow::new(2, 2));
        assert!(score > 0.99);
    }

    #[test]
    fn test_recovers_known_shift() {
        let shift = 4;
        let left = noise(40, 20, 21);
        // right(x) = left(x - shift), so left(x) matches right(x + shift).
        let right = GrayImage::from_fn(40, 20, |x, y| left.clamped(x as i64 - shift, y as i64));

        let forward = match_disparity(&left, &right, &params(3, 3, 0, 8)).unwrap();
        let backward = match_disparity(&right, &left, &params(3, 3, -8, 0)).unwrap();

        for y in 4..16 {
            for x in 4..28 {
                assert_eq!(forward.get(x, y), shift as u8, "forward at ({x}, {y})");
            }
            for x in 10..36 {
                assert_eq!(backward.get(x, y), shift as u8, "backward at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_output_bounded_by_max_disparity() {
        let left = noise(30, 12, 1);
        let right = noise(30, 12, 2);
        let max = 6;

        let forward = match_disparity(&left, &right, &params(2, 1, 0, max)).unwrap();
        let backward = match_disparity(&right, &left, &params(2, 1, -max, 0)).unwrap();

        assert!(forward.data.iter().all(|&v| i32::from(v) <= max));
        assert!(backward.data.iter().all(|&v| i32::from(v) <= max));
    }

    #[test]
    fn test_ties_prefer_smallest_magnitude() {
        // Flat images score 0 everywhere, so every candidate ties.
        let flat = GrayImage::from_fn(10, 6, |_, _| 5);
        let forward = match_disparity(&flat, &flat, &params(1, 1, 0, 4)).unwrap();
        let backward = match_disparity(&flat, &flat, &params(1, 1, -4, 0)).unwrap();
        assert!(forward.data.iter().all(|&v| v == 0));
        assert!(backward.data.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_fast_path_agrees_with_direct_score() {
        let left = noise(18, 10, 8);
        let right = noise(18, 10, 9);
        let p = params(2, 1, -3, 3);
        let map = match_disparity(&left, &right, &p).unwrap();

        for y in 0..10 {
            for x in 0..18 {
                let mut best = (p.range.min, f64::NEG_INFINITY);
                for d in p.range.iter() {
                    let s = zncc_score(&left, &right, x, y, d, p.window);
                    if s > best.1 || (s == best.1 && d.unsigned_abs() < best.0.unsigned_abs()) {
                        best = (d, s);
                    }
                }
                assert_eq!(map.get(x, y), best.0.unsigned_abs() as u8, "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_rejects_mismatched_inputs() {
        let a = noise(10, 10, 1);
        let b = noise(10, 9, 1);
        let result = match_disparity(&a, &b, &params(1, 1, 0, 2));
        assert!(matches!(result, Err(DisparityError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_rejects_empty_images() {
        let empty = GrayImage::from_fn(0, 3, |_, _| 0);
        let result = match_disparity(&empty, &empty, &params(1, 1, 0, 2));
        assert!(matches!(result, Err(DisparityError::InvalidDimensions(0, 3))));
    }
}
