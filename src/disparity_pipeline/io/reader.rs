use crate::disparity_pipeline::common::error::Result;
use crate::disparity_pipeline::common::types::RgbaImage;

pub trait StereoImageReader {
    fn read_rgba(&self, data: &[u8]) -> Result<RgbaImage>;
}
