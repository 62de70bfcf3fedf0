use crate::disparity_pipeline::config::types::{
    BackendKind, MatchWindow, OutputFormat, StereoConfig,
};

/// Builder for StereoConfig
#[derive(Default)]
pub struct StereoConfigBuilder {
    downscale: Option<usize>,
    window: Option<MatchWindow>,
    max_disparity: Option<u8>,
    cross_check_threshold: Option<u8>,
    backend: Option<BackendKind>,
    threads: Option<Option<usize>>,
    output_format: Option<OutputFormat>,
    validate_dimensions: Option<bool>,
}

impl StereoConfigBuilder {
    pub fn downscale(mut self, factor: usize) -> Self {
        self.downscale = Some(factor);
        self
    }

    pub fn window(mut self, half_width: usize, half_height: usize) -> Self {
        self.window = Some(MatchWindow::new(half_width, half_height));
        self
    }

    pub fn max_disparity(mut self, max_disparity: u8) -> Self {
        self.max_disparity = Some(max_disparity);
        self
    }

    pub fn cross_check_threshold(mut self, threshold: u8) -> Self {
        self.cross_check_threshold = Some(threshold);
        self
    }

    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn threads(mut self, threads: Option<usize>) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn build(self) -> StereoConfig {
        let default = StereoConfig::default();
        StereoConfig {
            downscale: self.downscale.unwrap_or(default.downscale),
            window: self.window.unwrap_or(default.window),
            max_disparity: self.max_disparity.unwrap_or(default.max_disparity),
            cross_check_threshold: self
                .cross_check_threshold
                .unwrap_or(default.cross_check_threshold),
            backend: self.backend.unwrap_or(default.backend),
            threads: self.threads.unwrap_or(default.threads),
            output_format: self.output_format.unwrap_or(default.output_format),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disparity_pipeline::config::types::TiffCompression;

    #[test]
    fn test_config_builder() {
        let config = StereoConfig::builder()
            .downscale(2)
            .window(3, 4)
            .max_disparity(16)
            .cross_check_threshold(1)
            .threads(Some(2))
            .output_format(OutputFormat::Tiff(TiffCompression::DeflateFast))
            .validate_dimensions(false)
            .build();

        assert_eq!(config.downscale, 2);
        assert_eq!(config.window, MatchWindow::new(3, 4));
        assert_eq!(config.max_disparity, 16);
        assert_eq!(config.cross_check_threshold, 1);
        assert_eq!(config.threads, Some(2));
        assert_eq!(config.backend, BackendKind::Cpu);
        assert!(matches!(
            config.output_format,
            OutputFormat::Tiff(TiffCompression::DeflateFast)
        ));
        assert!(!config.validate_dimensions);
    }

    #[test]
    fn test_builder_falls_back_to_defaults() {
        let config = StereoConfig::builder().max_disparity(32).build();
        let default = StereoConfig::default();

        assert_eq!(config.max_disparity, 32);
        assert_eq!(config.downscale, default.downscale);
        assert_eq!(config.window, default.window);
        assert_eq!(config.threads, None);
    }
}
