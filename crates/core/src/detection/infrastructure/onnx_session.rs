use std::path::Path;

use ort::execution_providers::ExecutionProviderDispatch;
use ort::session::Session;

/// Accelerated providers registered ahead of ort's built-in CPU fallback.
fn platform_providers() -> Vec<ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Human-readable name of the provider requested on this platform.
pub fn accelerator_name() -> &'static str {
    if cfg!(target_os = "macos") {
        "CoreML"
    } else if cfg!(target_os = "windows") {
        "DirectML"
    } else {
        "CPU"
    }
}

/// Opens a detector model, preferring the platform accelerator.
pub fn load_session(model_path: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    if !model_path.is_file() {
        return Err(format!("model file not found: {}", model_path.display()).into());
    }
    let session = Session::builder()?
        .with_execution_providers(platform_providers())?
        .commit_from_file(model_path)?;
    log::debug!(
        "Loaded {} on {} ({} inputs)",
        model_path.display(),
        accelerator_name(),
        session.inputs().len()
    );
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_reports_path() {
        let err = load_session(Path::new("/nonexistent/face.onnx")).unwrap_err();
        assert_eq!(err.to_string(), "model file not found: /nonexistent/face.onnx");
    }

    #[test]
    fn test_garbage_model_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.onnx");
        std::fs::write(&path, b"not a protobuf").unwrap();
        assert!(load_session(&path).is_err());
    }

    #[test]
    fn test_accelerator_matches_platform() {
        let name = accelerator_name();
        if cfg!(target_os = "linux") {
            assert_eq!(name, "CPU");
        }
        assert!(!name.is_empty());
    }
}
