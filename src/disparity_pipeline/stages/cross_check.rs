use rayon::prelude::*;

use crate::disparity_pipeline::common::error::{DisparityError, Result};
use crate::disparity_pipeline::common::types::DisparityMap;

/// Left/right consistency test.
///
/// `forward` holds magnitudes of the left-referenced pass (signed disparity
/// `+D1`), `backward` those of the right-referenced pass (signed `-D2`). A
/// pixel keeps `D1` when `|D1 + (-D2)| <= threshold` and becomes
/// [`DisparityMap::INVALID`] otherwise.
pub fn cross_check(forward: &DisparityMap, backward: &DisparityMap, threshold: u8) -> Result<DisparityMap> {
    if forward.dimensions() != backward.dimensions() {
        return Err(DisparityError::mismatch(forward.dimensions(), backward.dimensions()));
    }

    let data: Vec<u8> = forward
        .data
        .par_iter()
        .zip(backward.data.par_iter())
        .map(|(&d1, &d2)| {
            if d1.abs_diff(d2) <= threshold {
                d1
            } else {
                DisparityMap::INVALID
            }
        })
        .collect();

    DisparityMap::new(forward.width, forward.height, data)
}
