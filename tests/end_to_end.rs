use zncc_stereo_rs::disparity_pipeline::{
    ComputeBackend, CpuBackend, DisparityError, DisparityPipeline, GrayImage, OutputFormat,
    StereoConfig, TiffCompression, stages,
};

fn texture(x: usize, y: usize) -> u8 {
    let mut s = ((y * 977 + x) as u32).wrapping_mul(0x85EB_CA6B) ^ 0xC2B2_AE35;
    s ^= s << 13;
    s ^= s >> 17;
    s ^= s << 5;
    (s >> 24) as u8
}

fn small_config() -> StereoConfig {
    StereoConfig::builder()
        .downscale(2)
        .window(2, 2)
        .max_disparity(8)
        .cross_check_threshold(1)
        .build()
}

/// Writes a left/right PNG pair where the top half is shifted by `near`
/// and the bottom half by `far` (in source pixels).
fn write_pair(dir: &std::path::Path, width: u32, height: u32, near: u32, far: u32) -> (std::path::PathBuf, std::path::PathBuf) {
    let left = image::RgbaImage::from_fn(width, height, |x, y| {
        let v = texture(x as usize / 2, y as usize / 2);
        image::Rgba([v, v, v, 255])
    });
    let right = image::RgbaImage::from_fn(width, height, |x, y| {
        let shift = if y < height / 2 { near } else { far };
        let v = texture(x.saturating_sub(shift) as usize / 2, y as usize / 2);
        image::Rgba([v, v, v, 255])
    });

    let left_path = dir.join("im0.png");
    let right_path = dir.join("im1.png");
    left.save(&left_path).unwrap();
    right.save(&right_path).unwrap();
    (left_path, right_path)
}

#[test]
fn shifted_pair_recovers_disparity_after_filling() {
    let d0 = 5;
    let left = GrayImage::from_fn(32, 32, texture);
    let right = GrayImage::from_fn(32, 32, |x, y| left.clamped(x as i64 - d0, y as i64));

    let config = StereoConfig::builder()
        .downscale(1)
        .window(2, 2)
        .max_disparity(8)
        .build();
    let backend = CpuBackend::new(Some(2)).unwrap();

    let forward = backend.match_disparity(&left, &right, &config.forward_pass()).unwrap();
    let backward = backend.match_disparity(&right, &left, &config.backward_pass()).unwrap();
    let checked = backend
        .cross_check(&forward, &backward, config.cross_check_threshold)
        .unwrap();
    let filled = stages::fill_occlusions(&checked);

    assert!(filled.data.iter().all(|&v| v != 0));
    for y in 2..30 {
        for x in 8..=24 {
            assert_eq!(filled.get(x, y), d0 as u8, "at ({x}, {y})");
        }
    }
}

#[test]
fn png_files_round_trip_through_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let (left_path, right_path) = write_pair(dir.path(), 80, 64, 4, 12);
    let output_path = dir.path().join("depthmap.png");

    let pipeline = DisparityPipeline::new(small_config()).unwrap();
    let outputs = pipeline
        .convert_files(&left_path, &right_path, &output_path)
        .unwrap();

    let written = image::open(&output_path).unwrap().to_luma8();
    assert_eq!(written.dimensions(), (40, 32));
    assert_eq!(written.as_raw(), &outputs.disparity.data);
    assert_eq!(*written.as_raw().iter().min().unwrap(), 0);
    assert_eq!(*written.as_raw().iter().max().unwrap(), 255);

    // Downscaled shifts are 2 (top) and 6 (bottom).
    for x in 10..28 {
        assert_eq!(outputs.filled.get(x, 5), 2);
        assert_eq!(outputs.filled.get(x, 26), 6);
    }
}

#[test]
fn tiff_output_and_intermediates() {
    let dir = tempfile::tempdir().unwrap();
    let (left_path, right_path) = write_pair(dir.path(), 80, 64, 4, 12);
    let output_path = dir.path().join("depthmap.tiff");

    let config = StereoConfig::builder()
        .downscale(2)
        .window(2, 2)
        .max_disparity(8)
        .cross_check_threshold(1)
        .output_format(OutputFormat::from_path(&output_path, TiffCompression::Lzw))
        .build();
    let pipeline = DisparityPipeline::new(config).unwrap();
    let outputs = pipeline
        .convert_files(&left_path, &right_path, &output_path)
        .unwrap();

    let mut decoder = tiff::decoder::Decoder::new(std::fs::File::open(&output_path).unwrap()).unwrap();
    assert_eq!(decoder.dimensions().unwrap(), (40, 32));

    let dump_dir = dir.path().join("stages");
    let written = pipeline.write_intermediates(&outputs, &dump_dir).unwrap();
    assert_eq!(written.len(), 7);
    assert!(written.iter().all(|p| p.exists() && p.extension().unwrap() == "tiff"));
}

#[test]
fn missing_input_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = DisparityPipeline::new(small_config()).unwrap();

    let result = pipeline.convert_files(
        dir.path().join("nope0.png"),
        dir.path().join("nope1.png"),
        dir.path().join("out.png"),
    );

    match result {
        Err(DisparityError::InputReadError(msg)) => assert!(msg.contains("nope0.png")),
        other => panic!("expected InputReadError, got {other:?}"),
    }
}

#[test]
fn undecodable_input_is_a_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("im0.png");
    std::fs::write(&bogus, b"definitely not a png").unwrap();

    let out = dir.path().join("out.png");

    let pipeline = DisparityPipeline::new(small_config()).unwrap();
    let result = pipeline.convert_files(&bogus, &bogus, &out);
    assert!(matches!(result, Err(DisparityError::DecodeError(_))));
    assert!(!out.exists(), "failed run must not leave an output file");
}
