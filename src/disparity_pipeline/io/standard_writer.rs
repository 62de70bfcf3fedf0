use std::io::Write;

use image::{ExtendedColorType, ImageEncoder, codecs::png::PngEncoder};
use tracing::debug;

use crate::disparity_pipeline::common::error::{DisparityError, Result};
use crate::disparity_pipeline::config::{OutputFormat, StereoConfig, TiffCompression};
use crate::disparity_pipeline::io::writer::DisparityWriter;

/// Writes PNG through the `image` crate and TIFF through the `tiff` crate,
/// as selected by `config.output_format`.
pub struct StandardDisparityWriter;

impl StandardDisparityWriter {
    fn write_png(&self, width: usize, height: usize, data: &[u8], output: &mut dyn Write) -> Result<()> {
        PngEncoder::new(output)
            .write_image(data, width as u32, height as u32, ExtendedColorType::L8)
            .map_err(|e| DisparityError::EncodeError(e.to_string()))
    }

    fn write_tiff(
        &self,
        width: usize,
        height: usize,
        data: &[u8],
        output: &mut dyn Write,
        compression: TiffCompression,
    ) -> Result<()> {
        let mut buffer = Vec::new();

        let compression = match compression {
            TiffCompression::None => tiff::encoder::Compression::Uncompressed,
            TiffCompression::Lzw => tiff::encoder::Compression::Lzw,
            TiffCompression::DeflateFast => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Balanced),
            TiffCompression::DeflateBest => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Best),
        };

        let mut encoder = tiff::encoder::TiffEncoder::new(std::io::Cursor::new(&mut buffer))
            .map_err(|e| DisparityError::EncodeError(e.to_string()))?
            .with_compression(compression);

        encoder
            .write_image::<tiff::encoder::colortype::Gray8>(width as u32, height as u32, data)
            .map_err(|e| DisparityError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;
        Ok(())
    }
}

impl DisparityWriter for StandardDisparityWriter {
    fn write_gray8(
        &self,
        width: usize,
        height: usize,
        data: &[u8],
        output: &mut dyn Write,
        config: &StereoConfig,
    ) -> Result<()> {
        if data.len() != width * height {
            return Err(DisparityError::InvalidBuffer {
                width,
                height,
                channels: 1,
                actual: data.len(),
            });
        }

        debug!("Encoding {:?} image: {}x{}", config.output_format, width, height);

        match config.output_format {
            OutputFormat::Png => self.write_png(width, height, data, output)?,
            OutputFormat::Tiff(compression) => self.write_tiff(width, height, data, output, compression)?,
        }

        debug!("Encoding complete");
        Ok(())
    }
}
