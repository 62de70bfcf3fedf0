use thiserror::Error;

#[derive(Error, Debug)]
pub enum DisparityError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Failed to encode disparity image: {0}")]
    EncodeError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Buffer of {actual} bytes does not match {width}x{height}x{channels}")]
    InvalidBuffer {
        width: usize,
        height: usize,
        channels: usize,
        actual: usize,
    },

    #[error("Image size mismatch: left={left_width}x{left_height}, right={right_width}x{right_height}")]
    DimensionMismatch {
        left_width: usize,
        left_height: usize,
        right_width: usize,
        right_height: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Compute backend error: {0}")]
    BackendError(String),

    #[error("Kernel execution failed: {0}")]
    ExecutionError(String),

    #[error("Cannot normalize a constant disparity map (every value is {0})")]
    DegenerateRange(u8),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DisparityError {
    pub(crate) fn mismatch(left: (usize, usize), right: (usize, usize)) -> Self {
        DisparityError::DimensionMismatch {
            left_width: left.0,
            left_height: left.1,
            right_width: right.0,
            right_height: right.1,
        }
    }
}

pub type Result<T> = std::result::Result<T, DisparityError>;
