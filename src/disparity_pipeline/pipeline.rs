use tracing::{info, instrument};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::disparity_pipeline::{
    backend::{self, ComputeBackend},
    common::error::{DisparityError, Result},
    common::timing::PipelineTimings,
    common::types::{DisparityMap, GrayImage, RgbaImage},
    config::{OutputFormat, StereoConfig},
    io::{DisparityWriter, ImageCrateReader, StandardDisparityWriter, StereoImageReader},
    stages,
};

/// Every intermediate product of one run, in stage order.
#[derive(Debug, Clone)]
pub struct StageOutputs {
    pub left_gray: GrayImage,
    pub right_gray: GrayImage,
    /// Left image as reference
    pub forward: DisparityMap,
    /// Right image as reference
    pub backward: DisparityMap,
    pub checked: DisparityMap,
    pub filled: DisparityMap,
    /// Normalized result
    pub disparity: DisparityMap,
    pub timings: PipelineTimings,
}

pub struct DisparityPipeline<R: StereoImageReader, W: DisparityWriter> {
    reader: R,
    writer: W,
    backend: Box<dyn ComputeBackend>,
    config: StereoConfig,
}

impl DisparityPipeline<ImageCrateReader, StandardDisparityWriter> {
    pub fn new(config: StereoConfig) -> Result<Self> {
        config.validate()?;
        let backend = backend::create_backend(&config)?;
        Ok(Self {
            reader: ImageCrateReader,
            writer: StandardDisparityWriter,
            backend,
            config,
        })
    }
}

impl<R: StereoImageReader, W: DisparityWriter> DisparityPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, backend: Box<dyn ComputeBackend>, config: StereoConfig) -> Self {
        Self {
            reader,
            writer,
            backend,
            config,
        }
    }

    fn validate_pair(&self, left: (usize, usize), right: (usize, usize)) -> Result<()> {
        if left != right {
            return Err(DisparityError::mismatch(left, right));
        }
        if left.0 == 0 || left.1 == 0 {
            return Err(DisparityError::InvalidDimensions(left.0, left.1));
        }
        Ok(())
    }

    /// Stages 2 to 5 on already preprocessed images.
    #[instrument(skip_all, fields(width = left.width, height = left.height))]
    pub fn compute_from_gray_stages(&self, left: &GrayImage, right: &GrayImage) -> Result<StageOutputs> {
        self.config.validate()?;
        self.validate_pair(left.dimensions(), right.dimensions())?;
        self.config.check_match_dimensions(left.width, left.height)?;

        let mut timings = PipelineTimings::new();
        let forward_params = self.config.forward_pass();
        let backward_params = self.config.backward_pass();

        let forward = {
            let _span = tracing::info_span!("match_forward").entered();
            timings.measure("match_forward", || {
                self.backend.match_disparity(left, right, &forward_params)
            })?
        };

        let backward = {
            let _span = tracing::info_span!("match_backward").entered();
            timings.measure("match_backward", || {
                self.backend.match_disparity(right, left, &backward_params)
            })?
        };

        let checked = {
            let _span = tracing::info_span!("cross_check").entered();
            timings.measure("cross_check", || {
                self.backend
                    .cross_check(&forward, &backward, self.config.cross_check_threshold)
            })?
        };
        info!(
            invalid = checked.invalid_count(),
            total = checked.data.len(),
            "Cross-check complete"
        );

        let filled = {
            let _span = tracing::info_span!("occlusion_fill").entered();
            timings.measure("occlusion_fill", || stages::fill_occlusions(&checked))
        };

        let mut disparity = filled.clone();
        {
            let _span = tracing::info_span!("normalize").entered();
            timings.measure("normalize", || stages::normalize(&mut disparity))?;
        }

        Ok(StageOutputs {
            left_gray: left.clone(),
            right_gray: right.clone(),
            forward,
            backward,
            checked,
            filled,
            disparity,
            timings,
        })
    }

    pub fn compute_from_gray(&self, left: &GrayImage, right: &GrayImage) -> Result<DisparityMap> {
        Ok(self.compute_from_gray_stages(left, right)?.disparity)
    }

    /// All five stages on a decoded RGBA pair.
    #[instrument(skip_all, fields(width = left.width, height = left.height))]
    pub fn compute_stages(&self, left: &RgbaImage, right: &RgbaImage) -> Result<StageOutputs> {
        self.config.validate()?;
        self.validate_pair(left.dimensions(), right.dimensions())?;

        let mut timings = PipelineTimings::new();
        let factor = self.config.downscale;

        let (left_gray, right_gray) = {
            let _span = tracing::info_span!("preprocess", factor).entered();
            timings.measure("preprocess", || -> Result<_> {
                Ok((
                    self.backend.preprocess(left, factor)?,
                    self.backend.preprocess(right, factor)?,
                ))
            })?
        };
        info!(
            width = left_gray.width,
            height = left_gray.height,
            "Preprocessing complete"
        );

        let mut outputs = self.compute_from_gray_stages(&left_gray, &right_gray)?;
        timings.merge(&outputs.timings);
        outputs.timings = timings;
        Ok(outputs)
    }

    pub fn compute(&self, left: &RgbaImage, right: &RgbaImage) -> Result<DisparityMap> {
        Ok(self.compute_stages(left, right)?.disparity)
    }

    #[instrument(skip_all, fields(left_size = left_data.len(), right_size = right_data.len()))]
    pub fn convert(&self, left_data: &[u8], right_data: &[u8], output: &mut dyn Write) -> Result<StageOutputs> {
        info!("Starting disparity computation");

        let mut timings = PipelineTimings::new();
        let (left, right) = {
            let _span = tracing::info_span!("decode_images").entered();
            timings.measure("decode_images", || -> Result<_> {
                Ok((self.reader.read_rgba(left_data)?, self.reader.read_rgba(right_data)?))
            })?
        };

        let mut outputs = self.compute_stages(&left, &right)?;
        timings.merge(&outputs.timings);

        {
            let _span = tracing::info_span!("encode_output").entered();
            timings.measure("encode_output", || {
                self.writer.write_disparity(&outputs.disparity, output, &self.config)
            })?;
        }
        outputs.timings = timings;

        info!(
            width = outputs.disparity.width,
            height = outputs.disparity.height,
            "Disparity computation complete"
        );
        Ok(outputs)
    }

    #[instrument(skip(self, left_path, right_path, output_path))]
    pub fn convert_files<P: AsRef<Path>, Q: AsRef<Path>, O: AsRef<Path>>(
        &self,
        left_path: P,
        right_path: Q,
        output_path: O,
    ) -> Result<StageOutputs> {
        let left_path = left_path.as_ref();
        let right_path = right_path.as_ref();
        let output_path = output_path.as_ref();

        info!(
            left = %left_path.display(),
            right = %right_path.display(),
            output = %output_path.display(),
            "Processing stereo pair"
        );

        let (left_data, right_data) = {
            let _span = tracing::info_span!("read_input_files").entered();
            (read_input(left_path)?, read_input(right_path)?)
        };

        // Encode in memory so a failed run leaves no output file behind.
        let mut encoded = Vec::new();
        let outputs = self.convert(&left_data, &right_data, &mut encoded)?;

        {
            let _span = tracing::info_span!("write_output_file").entered();
            std::fs::write(output_path, &encoded).map_err(|e| {
                DisparityError::OutputWriteError(format!("{}: {}", output_path.display(), e))
            })?;
        }

        Ok(outputs)
    }

    /// Writes every intermediate image of `outputs` into `dir`, returning the
    /// written paths.
    pub fn write_intermediates<P: AsRef<Path>>(&self, outputs: &StageOutputs, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            DisparityError::OutputWriteError(format!("{}: {}", dir.display(), e))
        })?;

        let extension = match self.config.output_format {
            OutputFormat::Png => "png",
            OutputFormat::Tiff(_) => "tiff",
        };

        let planes: [(&str, usize, usize, &[u8]); 7] = [
            ("left_gray", outputs.left_gray.width, outputs.left_gray.height, &outputs.left_gray.data),
            ("right_gray", outputs.right_gray.width, outputs.right_gray.height, &outputs.right_gray.data),
            ("disparity_forward", outputs.forward.width, outputs.forward.height, &outputs.forward.data),
            ("disparity_backward", outputs.backward.width, outputs.backward.height, &outputs.backward.data),
            ("cross_checked", outputs.checked.width, outputs.checked.height, &outputs.checked.data),
            ("occlusion_filled", outputs.filled.width, outputs.filled.height, &outputs.filled.data),
            ("normalized", outputs.disparity.width, outputs.disparity.height, &outputs.disparity.data),
        ];

        let mut written = Vec::with_capacity(planes.len());
        for (name, width, height, data) in planes {
            let path = dir.join(format!("{name}.{extension}"));
            let mut file = std::fs::File::create(&path).map_err(|e| {
                DisparityError::OutputWriteError(format!("{}: {}", path.display(), e))
            })?;
            self.writer.write_gray8(width, height, data, &mut file, &self.config)?;
            written.push(path);
        }

        info!(count = written.len(), dir = %dir.display(), "Intermediate images written");
        Ok(written)
    }

    pub fn config(&self) -> &StereoConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        DisparityError::InputReadError(format!("{}: {}", path.display(), e))
    })
}
