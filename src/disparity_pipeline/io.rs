//! Image I/O module
//!
//! Decoding of the stereo pair and encoding of 8-bit grayscale results.

mod reader;
mod image_reader;
mod writer;
mod standard_writer;

pub use reader::StereoImageReader;
pub use image_reader::ImageCrateReader;
pub use writer::DisparityWriter;
pub use standard_writer::StandardDisparityWriter;
