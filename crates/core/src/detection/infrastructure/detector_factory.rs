use std::path::Path;

use crate::detection::domain::detector_options::DetectorOptions;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::constants::{BUNDLED_MODEL_DIR, YOLO_MODEL_NAME, YOLO_MODEL_URL};
use crate::shared::error::ConfigurationError;

use super::model_resolver::{self, ModelRequest, ProgressFn};
use super::onnx_blazeface_detector::{BlazefaceRange, OnnxBlazefaceDetector};
use super::onnx_yolo_detector::OnnxYoloDetector;

type DetectorConstructor = fn(
    &DetectorOptions,
    Option<ProgressFn>,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>>;

/// Registered backends, in the order they are listed to users.
const DETECTORS: &[(&str, DetectorConstructor)] = &[
    ("mediapipe", build_blazeface),
    ("yolo", build_yolo),
];

/// Names accepted by [`create_detector`].
pub fn available_detectors() -> Vec<&'static str> {
    DETECTORS.iter().map(|(name, _)| *name).collect()
}

/// Instantiates the backend registered under `name`.
///
/// Model files are resolved (and downloaded when a URL is known) before the
/// session is built; `progress` receives download progress.
pub fn create_detector(
    name: &str,
    options: &DetectorOptions,
    progress: Option<ProgressFn>,
) -> Result<Box<dyn FaceDetector>, ConfigurationError> {
    let &(detector, constructor) = DETECTORS
        .iter()
        .find(|(registered, _)| *registered == name)
        .ok_or_else(|| ConfigurationError::UnknownDetector {
            name: name.to_string(),
            valid: available_detectors(),
        })?;
    options.validate()?;

    log::info!(
        "Using detector: {detector} (min_confidence={})",
        options.min_confidence
    );
    constructor(options, progress).map_err(|e| ConfigurationError::DetectorInit {
        detector,
        reason: e.to_string(),
    })
}

fn build_blazeface(
    options: &DetectorOptions,
    progress: Option<ProgressFn>,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    let range = if options.full_range {
        BlazefaceRange::Full
    } else {
        BlazefaceRange::Short
    };
    let model_path = model_resolver::resolve(
        &ModelRequest {
            name: range.model_name(),
            url: None,
            explicit_path: options.model_path.as_deref(),
            bundled_dir: Some(Path::new(BUNDLED_MODEL_DIR)),
        },
        progress,
    )?;
    log::info!("Loading BlazeFace {range:?}-range model from {}", model_path.display());
    Ok(Box::new(OnnxBlazefaceDetector::new(
        &model_path,
        range,
        options.min_confidence,
    )?))
}

fn build_yolo(
    options: &DetectorOptions,
    progress: Option<ProgressFn>,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    let model_path = model_resolver::resolve(
        &ModelRequest {
            name: YOLO_MODEL_NAME,
            url: Some(YOLO_MODEL_URL),
            explicit_path: options.model_path.as_deref(),
            bundled_dir: Some(Path::new(BUNDLED_MODEL_DIR)),
        },
        progress,
    )?;
    log::info!("Loading YOLO model from {}", model_path.display());
    Ok(Box::new(OnnxYoloDetector::new(
        &model_path,
        options.min_confidence,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn missing_model_options(dir: &TempDir) -> DetectorOptions {
        DetectorOptions {
            model_path: Some(dir.path().join("absent.onnx")),
            ..Default::default()
        }
    }

    #[test]
    fn test_available_detectors_lists_backends_in_order() {
        assert_eq!(available_detectors(), vec!["mediapipe", "yolo"]);
    }

    #[test]
    fn test_unknown_detector_lists_valid_names() {
        let err = create_detector("nonexistent", &DetectorOptions::default(), None)
            .err()
            .unwrap();
        assert_eq!(
            err,
            ConfigurationError::UnknownDetector {
                name: "nonexistent".into(),
                valid: vec!["mediapipe", "yolo"],
            }
        );
        let message = err.to_string();
        assert!(message.contains("mediapipe"));
        assert!(message.contains("yolo"));
    }

    #[test]
    fn test_invalid_confidence_rejected_before_loading() {
        let options = DetectorOptions {
            min_confidence: 2.0,
            ..Default::default()
        };
        let err = create_detector("yolo", &options, None).err().unwrap();
        assert_eq!(err, ConfigurationError::InvalidConfidence(2.0));
    }

    #[test]
    fn test_missing_model_surfaces_detector_init_for_mediapipe() {
        let tmp = TempDir::new().unwrap();
        let err = create_detector("mediapipe", &missing_model_options(&tmp), None)
            .err()
            .unwrap();
        match err {
            ConfigurationError::DetectorInit { detector, reason } => {
                assert_eq!(detector, "mediapipe");
                assert!(reason.contains("absent.onnx"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_model_surfaces_detector_init_for_yolo() {
        let tmp = TempDir::new().unwrap();
        let err = create_detector("yolo", &missing_model_options(&tmp), None)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ConfigurationError::DetectorInit { detector: "yolo", .. }
        ));
    }
}
