use tracing::debug;

use crate::disparity_pipeline::common::error::{DisparityError, Result};
use crate::disparity_pipeline::common::types::DisparityMap;

/// Stretches the map in place so its minimum becomes 0 and its maximum 255.
///
/// Each value maps to `floor(255 * (v - min) / (max - min))`. A constant map
/// has no range to stretch and is rejected with
/// [`DisparityError::DegenerateRange`], leaving the map untouched.
pub fn normalize(map: &mut DisparityMap) -> Result<()> {
    let (min, max) = map
        .data
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    if max <= min {
        return Err(DisparityError::DegenerateRange(min));
    }
    debug!("Normalizing disparity range [{}, {}]", min, max);

    let span = u32::from(max - min);
    for v in map.data.iter_mut() {
        *v = (u32::from(u8::MAX) * u32::from(*v - min) / span) as u8;
    }

    Ok(())
}
