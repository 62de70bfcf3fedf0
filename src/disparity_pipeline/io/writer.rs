use std::io::Write;
use crate::disparity_pipeline::common::error::Result;
use crate::disparity_pipeline::common::types::DisparityMap;
use crate::disparity_pipeline::config::StereoConfig;

pub trait DisparityWriter {
    /// Encodes a row-major 8-bit single channel plane.
    fn write_gray8(
        &self,
        width: usize,
        height: usize,
        data: &[u8],
        output: &mut dyn Write,
        config: &StereoConfig,
    ) -> Result<()>;

    fn write_disparity(&self, map: &DisparityMap, output: &mut dyn Write, config: &StereoConfig) -> Result<()> {
        self.write_gray8(map.width, map.height, &map.data, output, config)
    }
}
