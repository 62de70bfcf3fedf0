//! Nearest-valid-neighbour occlusion filling.

use tracing::{debug, warn};

use crate::disparity_pipeline::common::types::DisparityMap;

/// Value of the first valid pixel on the Chebyshev ring of radius `k` around
/// row `i`, column `j`.
///
/// Scan order: left column top to bottom, right column top to bottom, top row
/// without its corners, then the bottom row without its left corner. The
/// bottom-right corner is therefore visited twice, which does not change the
/// result.
fn scan_ring(map: &DisparityMap, i: i64, j: i64, k: i64) -> Option<u8> {
    let (w, h) = (map.width as i64, map.height as i64);
    let valid = |ii: i64, jj: i64| -> Option<u8> {
        let (r, c) = (i + ii, j + jj);
        if r < 0 || r >= h || c < 0 || c >= w {
            return None;
        }
        let v = map.data[(r * w + c) as usize];
        (v != DisparityMap::INVALID).then_some(v)
    };

    (-k..=k)
        .find_map(|ii| valid(ii, -k))
        .or_else(|| (-k..=k).find_map(|ii| valid(ii, k)))
        .or_else(|| (-k + 1..=k - 1).find_map(|jj| valid(-k, jj)))
        .or_else(|| (-k + 1..=k).find_map(|jj| valid(k, jj)))
}

/// Replaces every invalid pixel with the nearest valid one found by expanding
/// rings. All reads come from `map`, so filled pixels never feed later fills.
///
/// A map without a single valid pixel is returned unchanged.
pub fn fill_occlusions(map: &DisparityMap) -> DisparityMap {
    let invalid = map.invalid_count();
    if invalid == map.data.len() {
        warn!(
            "Disparity map {}x{} has no valid pixel, nothing to fill from",
            map.width, map.height
        );
        return map.clone();
    }
    debug!("Filling {} occluded pixels", invalid);

    let max_radius = map.width.max(map.height) as i64;
    let mut result = map.clone();

    for i in 0..map.height {
        for j in 0..map.width {
            let idx = i * map.width + j;
            if map.data[idx] != DisparityMap::INVALID {
                continue;
            }
            if let Some(v) = (1..=max_radius).find_map(|k| scan_ring(map, i as i64, j as i64, k)) {
                result.data[idx] = v;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_valid_pixel_fills_everything() {
        let mut data = vec![0u8; 25];
        data[2 * 5 + 3] = 42;
        let map = DisparityMap::new(5, 5, data).unwrap();
        let filled = fill_occlusions(&map);
        assert!(filled.data.iter().all(|&v| v == 42));
    }

    #[test]
    fn test_single_valid_pixel_in_corner() {
        let mut data = vec![0u8; 25];
        data[0] = 7;
        let map = DisparityMap::new(5, 5, data).unwrap();
        assert!(fill_occlusions(&map).data.iter().all(|&v| v == 7));
    }

    #[test]
    fn test_all_invalid_map_is_returned_unchanged() {
        let map = DisparityMap::zeros(4, 3);
        assert_eq!(fill_occlusions(&map), map);
    }

    #[test]
    fn test_valid_pixels_untouched() {
        let map = DisparityMap::new(3, 3, vec![1, 2, 3, 4, 0, 6, 7, 8, 9]).unwrap();
        let filled = fill_occlusions(&map);
        for (idx, (&before, &after)) in map.data.iter().zip(filled.data.iter()).enumerate() {
            if idx != 4 {
                assert_eq!(before, after);
            }
        }
        assert_ne!(filled.data[4], 0);
    }

    #[test]
    fn test_ring_order_left_column_first() {
        // Centre (1,1) sees 4 on its top-left corner before the right column.
        let map = DisparityMap::new(3, 3, vec![4, 0, 9, 0, 0, 9, 0, 0, 9]).unwrap();
        assert_eq!(fill_occlusions(&map).data[4], 4);
    }

    #[test]
    fn test_ring_order_right_column_before_rows() {
        // Ring 1 of the centre: left column empty, right column has 5 at the
        // bottom, the top row has 8. Columns are scanned before rows.
        let map = DisparityMap::new(3, 3, vec![0, 8, 0, 0, 0, 0, 0, 0, 5]).unwrap();
        assert_eq!(fill_occlusions(&map).data[4], 5);
    }

    #[test]
    fn test_ring_order_top_row_before_bottom_row() {
        let map = DisparityMap::new(3, 3, vec![0, 8, 0, 0, 0, 0, 0, 6, 0]).unwrap();
        assert_eq!(fill_occlusions(&map).data[4], 8);
    }

    #[test]
    fn test_nearer_ring_wins() {
        // Row 0 is a 1x7 strip: pixel 3 is two away from value 9 and three
        // away from value 1.
        let map = DisparityMap::new(7, 1, vec![1, 0, 0, 0, 0, 9, 0]).unwrap();
        let filled = fill_occlusions(&map);
        assert_eq!(filled.data, vec![1, 1, 1, 9, 9, 9, 9]);
    }

    #[test]
    fn test_fill_reads_original_map_only() {
        // Pixel 2 would pick up 3 from a freshly filled pixel 1 if fills
        // propagated; it takes 8 from its right neighbour instead.
        let map = DisparityMap::new(4, 1, vec![3, 0, 0, 8]).unwrap();
        let filled = fill_occlusions(&map);
        assert_eq!(filled.data, vec![3, 3, 8, 8]);
    }
}
