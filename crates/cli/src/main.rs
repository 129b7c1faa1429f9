use std::path::PathBuf;
use std::process;

use clap::Parser;

use face_anonymizer_core::anonymization::domain::anonymization_method::{
    AnonymizationMethod, METHOD_NAMES,
};
use face_anonymizer_core::detection::domain::detector_options::DetectorOptions;
use face_anonymizer_core::detection::infrastructure::detector_factory::available_detectors;
use face_anonymizer_core::pipeline::anonymize_video_use_case::AnonymizeVideoUseCase;
use face_anonymizer_core::pipeline::pipeline_logger::LogPipelineLogger;
use face_anonymizer_core::pipeline::processing_config::{FrameErrorPolicy, ProcessingConfig};
use face_anonymizer_core::shared::constants::{
    DEFAULT_BLUR_KERNEL_SIZE, DEFAULT_MIN_CONFIDENCE, DEFAULT_PADDING, DEFAULT_PIXEL_BLOCKS,
    PROGRESS_INTERVAL_FRAMES,
};
use face_anonymizer_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use face_anonymizer_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use face_anonymizer_core::video::infrastructure::image_file_writer::ImageFileWriter;
use face_anonymizer_core::video::infrastructure::snapshot_preview::SnapshotPreview;

/// Blur, pixelate or black out every face in a video.
#[derive(Parser)]
#[command(name = "face-anonymizer")]
struct Cli {
    /// Input video file.
    #[arg(required_unless_present = "list_detectors")]
    input: Option<PathBuf>,

    /// Output file. Defaults to `{stem}_{method}_p{padding}_{timestamp}.mp4`
    /// next to the input (or in --output-dir).
    output: Option<PathBuf>,

    /// Anonymization method: blur, pixelate or black.
    #[arg(long, default_value = "blur")]
    method: String,

    /// Fraction of the face size added on each side of the box.
    #[arg(long, default_value_t = DEFAULT_PADDING)]
    padding: f64,

    /// Face detector backend: mediapipe or yolo.
    #[arg(long, default_value = "mediapipe")]
    detector: String,

    /// Minimum detection confidence (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_MIN_CONFIDENCE)]
    confidence: f64,

    /// Use this ONNX model file instead of the cached/bundled one.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Use the short-range BlazeFace model (faces within ~2m of the camera).
    #[arg(long)]
    short_range: bool,

    /// Gaussian blur kernel size (must be odd).
    #[arg(long, default_value_t = DEFAULT_BLUR_KERNEL_SIZE)]
    blur_strength: usize,

    /// Number of blocks across each face when pixelating.
    #[arg(long, default_value_t = DEFAULT_PIXEL_BLOCKS)]
    pixel_blocks: usize,

    /// Directory for auto-named output files.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Drop frames that fail to anonymize instead of aborting.
    #[arg(long)]
    skip_failed_frames: bool,

    /// Save anonymized preview snapshots to this directory.
    #[arg(long)]
    preview_dir: Option<PathBuf>,

    /// Save a preview snapshot every N frames.
    #[arg(long, default_value_t = PROGRESS_INTERVAL_FRAMES)]
    preview_every: usize,

    /// Print the available detectors and exit.
    #[arg(long)]
    list_detectors: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.list_detectors {
        for name in available_detectors() {
            println!("{name}");
        }
        return Ok(());
    }

    let input = validate(&cli)?;
    let config = build_config(&cli)?;

    let progress_interval = config.progress_interval();
    let mut use_case = AnonymizeVideoUseCase::from_config(
        Box::new(FfmpegReader::new()),
        Box::new(FfmpegWriter::new()),
        config,
        Some(Box::new(download_progress)),
    )?
    .with_logger(Box::new(LogPipelineLogger::new(progress_interval)));

    if let Some(dir) = &cli.preview_dir {
        let preview = SnapshotPreview::new(
            Box::new(ImageFileWriter::new()),
            dir.clone(),
            cli.preview_every,
        );
        use_case = use_case.with_preview(Box::new(preview));
    }

    let summary = use_case.execute(&input, cli.output.as_deref())?;
    if summary.frames_skipped > 0 {
        log::warn!(
            "{} frames could not be anonymized and were dropped",
            summary.frames_skipped
        );
    }
    log::info!("Output written to {}", summary.output_path.display());
    Ok(())
}

fn build_config(cli: &Cli) -> Result<ProcessingConfig, Box<dyn std::error::Error>> {
    let method = AnonymizationMethod::parse(&cli.method, cli.blur_strength, cli.pixel_blocks)?;
    let options = DetectorOptions {
        min_confidence: cli.confidence,
        model_path: cli.model.clone(),
        full_range: !cli.short_range,
    };

    let mut config = ProcessingConfig::new(method, cli.padding, &cli.detector, options)?;
    if let Some(dir) = &cli.output_dir {
        config = config.with_output_dir(dir.clone());
    }
    if cli.skip_failed_frames {
        config = config.with_error_policy(FrameErrorPolicy::Skip);
    }
    Ok(config)
}

fn validate(cli: &Cli) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let input = cli.input.clone().ok_or("Input file is required")?;
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    if !METHOD_NAMES.iter().any(|name| *name == cli.method) {
        return Err(format!(
            "Method must be one of: {}, got '{}'",
            METHOD_NAMES.join(", "),
            cli.method
        )
        .into());
    }
    if let Some(dir) = &cli.output_dir {
        if dir.exists() && !dir.is_dir() {
            return Err(format!("Output directory is a file: {}", dir.display()).into());
        }
    }
    Ok(input)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("face-anonymizer").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["clip.mp4"]);
        assert_eq!(cli.method, "blur");
        assert_eq!(cli.padding, 0.3);
        assert_eq!(cli.detector, "mediapipe");
        assert_eq!(cli.confidence, 0.3);
        assert_eq!(cli.blur_strength, 99);
        assert_eq!(cli.pixel_blocks, 10);
        assert_eq!(cli.preview_every, 30);
        assert!(!cli.short_range);
        assert!(!cli.skip_failed_frames);
        assert!(cli.output.is_none());
    }

    #[test]
    fn test_list_detectors_needs_no_input() {
        let cli = parse(&["--list-detectors"]);
        assert!(cli.list_detectors);
        assert!(cli.input.is_none());
    }

    #[test]
    fn test_missing_input_is_rejected() {
        assert!(Cli::try_parse_from(["face-anonymizer"]).is_err());
    }

    #[test]
    fn test_build_config_maps_flags() {
        let cli = parse(&[
            "clip.mp4",
            "--method",
            "pixelate",
            "--pixel-blocks",
            "6",
            "--detector",
            "yolo",
            "--short-range",
            "--skip-failed-frames",
            "--output-dir",
            "/exports",
        ]);
        let config = build_config(&cli).unwrap();

        assert_eq!(config.method(), &AnonymizationMethod::Pixelate { blocks: 6 });
        assert_eq!(config.detector(), "yolo");
        assert!(!config.detector_options().full_range);
        assert_eq!(config.error_policy(), FrameErrorPolicy::Skip);
        assert_eq!(config.output_dir(), Some(std::path::Path::new("/exports")));
    }

    #[test]
    fn test_build_config_rejects_even_blur_strength() {
        let cli = parse(&["clip.mp4", "--blur-strength", "100"]);
        let err = build_config(&cli).unwrap_err();
        assert!(err.to_string().contains("100"), "{err}");
    }

    #[test]
    fn test_build_config_rejects_unknown_detector() {
        let cli = parse(&["clip.mp4", "--detector", "haar"]);
        let err = build_config(&cli).unwrap_err();
        assert!(err.to_string().contains("mediapipe, yolo"), "{err}");
    }

    #[test]
    fn test_validate_rejects_missing_input() {
        let cli = parse(&["/nonexistent/clip.mp4"]);
        let err = validate(&cli).unwrap_err();
        assert!(err.to_string().starts_with("Input file not found"));
    }

    #[test]
    fn test_validate_rejects_unknown_method() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let cli = parse(&[file.path().to_str().unwrap(), "--method", "swirl"]);
        let err = validate(&cli).unwrap_err();
        assert!(err.to_string().contains("blur, pixelate, black"), "{err}");
    }
}
