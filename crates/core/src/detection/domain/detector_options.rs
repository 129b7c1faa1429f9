use std::path::PathBuf;

use crate::shared::constants::DEFAULT_MIN_CONFIDENCE;
use crate::shared::error::ConfigurationError;

/// Backend-specific detector parameters. Backends ignore fields that do not
/// apply to them (`full_range` only affects `mediapipe`).
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorOptions {
    pub min_confidence: f64,
    /// Explicit model file; skips cache lookup and download.
    pub model_path: Option<PathBuf>,
    pub full_range: bool,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            model_path: None,
            full_range: true,
        }
    }
}

impl DetectorOptions {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigurationError::InvalidConfidence(self.min_confidence));
        }
        Ok(())
    }
}
