use std::path::PathBuf;

use crate::anonymization::domain::anonymization_method::AnonymizationMethod;
use crate::detection::domain::detector_options::DetectorOptions;
use crate::detection::infrastructure::detector_factory::available_detectors;
use crate::shared::constants::{DEFAULT_PADDING, PROGRESS_INTERVAL_FRAMES};
use crate::shared::error::ConfigurationError;

/// What to do when anonymizing a single frame fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameErrorPolicy {
    /// Stop the run and report the failure.
    #[default]
    Abort,
    /// Drop the frame from the output, log it, and continue.
    Skip,
}

/// Validated settings for one anonymization run. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessingConfig {
    method: AnonymizationMethod,
    padding: f64,
    detector: String,
    detector_options: DetectorOptions,
    output_dir: Option<PathBuf>,
    error_policy: FrameErrorPolicy,
    progress_interval: usize,
}

impl ProcessingConfig {
    /// Validates every field; the detector name must be registered.
    pub fn new(
        method: AnonymizationMethod,
        padding: f64,
        detector: &str,
        detector_options: DetectorOptions,
    ) -> Result<Self, ConfigurationError> {
        method.validate()?;
        if !padding.is_finite() || padding < 0.0 {
            return Err(ConfigurationError::InvalidPadding(padding));
        }
        let valid = available_detectors();
        if !valid.iter().any(|name| *name == detector) {
            return Err(ConfigurationError::UnknownDetector {
                name: detector.to_string(),
                valid,
            });
        }
        detector_options.validate()?;

        Ok(Self {
            method,
            padding,
            detector: detector.to_string(),
            detector_options,
            output_dir: None,
            error_policy: FrameErrorPolicy::default(),
            progress_interval: PROGRESS_INTERVAL_FRAMES,
        })
    }

    /// Directory for auto-named outputs instead of the source's directory.
    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = Some(dir);
        self
    }

    pub fn with_error_policy(mut self, policy: FrameErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_progress_interval(mut self, frames: usize) -> Self {
        self.progress_interval = frames.max(1);
        self
    }

    pub fn method(&self) -> &AnonymizationMethod {
        &self.method
    }

    pub fn padding(&self) -> f64 {
        self.padding
    }

    pub fn detector(&self) -> &str {
        &self.detector
    }

    pub fn detector_options(&self) -> &DetectorOptions {
        &self.detector_options
    }

    pub fn output_dir(&self) -> Option<&std::path::Path> {
        self.output_dir.as_deref()
    }

    pub fn error_policy(&self) -> FrameErrorPolicy {
        self.error_policy
    }

    pub fn progress_interval(&self) -> usize {
        self.progress_interval
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            method: AnonymizationMethod::default(),
            padding: DEFAULT_PADDING,
            detector: "mediapipe".to_string(),
            detector_options: DetectorOptions::default(),
            output_dir: None,
            error_policy: FrameErrorPolicy::default(),
            progress_interval: PROGRESS_INTERVAL_FRAMES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_config_matches_cli_defaults() {
        let config = ProcessingConfig::default();
        assert_eq!(
            config.method(),
            &AnonymizationMethod::Blur { kernel_size: 99 }
        );
        assert_eq!(config.padding(), 0.3);
        assert_eq!(config.detector(), "mediapipe");
        assert_eq!(config.error_policy(), FrameErrorPolicy::Abort);
        assert_eq!(config.progress_interval(), 30);
        assert!(config.output_dir().is_none());
    }

    #[test]
    fn test_new_accepts_valid_settings() {
        let config = ProcessingConfig::new(
            AnonymizationMethod::Pixelate { blocks: 8 },
            0.25,
            "yolo",
            DetectorOptions::default(),
        )
        .unwrap()
        .with_output_dir(PathBuf::from("/tmp/out"))
        .with_error_policy(FrameErrorPolicy::Skip);

        assert_eq!(config.detector(), "yolo");
        assert_eq!(config.output_dir(), Some(std::path::Path::new("/tmp/out")));
        assert_eq!(config.error_policy(), FrameErrorPolicy::Skip);
    }

    #[rstest]
    #[case(-0.1)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_invalid_padding_rejected(#[case] padding: f64) {
        let err = ProcessingConfig::new(
            AnonymizationMethod::Black,
            padding,
            "mediapipe",
            DetectorOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidPadding(_)));
    }

    #[test]
    fn test_padding_above_one_is_allowed() {
        assert!(ProcessingConfig::new(
            AnonymizationMethod::Black,
            1.5,
            "mediapipe",
            DetectorOptions::default()
        )
        .is_ok());
    }

    #[test]
    fn test_unknown_detector_rejected() {
        let err = ProcessingConfig::new(
            AnonymizationMethod::Black,
            0.3,
            "haar",
            DetectorOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownDetector {
                name: "haar".into(),
                valid: vec!["mediapipe", "yolo"],
            }
        );
    }

    #[test]
    fn test_invalid_method_parameters_rejected() {
        let err = ProcessingConfig::new(
            AnonymizationMethod::Blur { kernel_size: 4 },
            0.3,
            "mediapipe",
            DetectorOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidKernelSize(4));
    }

    #[test]
    fn test_invalid_confidence_rejected() {
        let options = DetectorOptions {
            min_confidence: -0.5,
            ..Default::default()
        };
        let err = ProcessingConfig::new(AnonymizationMethod::Black, 0.3, "yolo", options)
            .unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidConfidence(-0.5));
    }

    #[test]
    fn test_progress_interval_never_zero() {
        assert_eq!(
            ProcessingConfig::default()
                .with_progress_interval(0)
                .progress_interval(),
            1
        );
    }
}
