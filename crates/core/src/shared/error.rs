use std::path::PathBuf;

use thiserror::Error;

/// Invalid settings, rejected before any frame is read.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("unknown detector '{name}', choose from: {}", .valid.join(", "))]
    UnknownDetector {
        name: String,
        valid: Vec<&'static str>,
    },
    #[error("unknown anonymization method '{name}', choose from: {}", .valid.join(", "))]
    UnknownMethod {
        name: String,
        valid: Vec<&'static str>,
    },
    #[error("padding must be a finite value >= 0, got {0}")]
    InvalidPadding(f64),
    #[error("blur kernel size must be a positive odd integer, got {0}")]
    InvalidKernelSize(usize),
    #[error("pixelation block count must be > 0, got {0}")]
    InvalidBlockCount(usize),
    #[error("confidence must be between 0.0 and 1.0, got {0}")]
    InvalidConfidence(f64),
    #[error("failed to initialize {detector} detector: {reason}")]
    DetectorInit {
        detector: &'static str,
        reason: String,
    },
}

/// Failures of a video anonymization run.
///
/// Every variant is raised only after the pipeline has released the
/// resources it acquired.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("cannot open video source {path}: {reason}")]
    SourceOpen { path: PathBuf, reason: String },
    #[error("cannot open output {path}: {reason}")]
    SinkOpen { path: PathBuf, reason: String },
    #[error("failed to read frame {frame_index}: {reason}")]
    SourceRead { frame_index: usize, reason: String },
    #[error("failed to anonymize frame {frame_index}: {reason}")]
    Processing { frame_index: usize, reason: String },
    #[error("failed to write frame {frame_index}: {reason}")]
    SinkWrite { frame_index: usize, reason: String },
    #[error("pipeline already executed")]
    AlreadyExecuted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_detector_lists_valid_names() {
        let err = ConfigurationError::UnknownDetector {
            name: "nonexistent".into(),
            valid: vec!["mediapipe", "yolo"],
        };
        assert_eq!(
            err.to_string(),
            "unknown detector 'nonexistent', choose from: mediapipe, yolo"
        );
    }

    #[test]
    fn test_configuration_error_converts_to_pipeline_error() {
        let err: PipelineError = ConfigurationError::InvalidPadding(-1.0).into();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert_eq!(err.to_string(), "padding must be a finite value >= 0, got -1");
    }

    #[test]
    fn test_processing_error_names_frame() {
        let err = PipelineError::Processing {
            frame_index: 4,
            reason: "boom".into(),
        };
        assert_eq!(err.to_string(), "failed to anonymize frame 4: boom");
    }
}
