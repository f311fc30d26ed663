use crate::error::AnalysisError;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::path::Path;

/// Build a CPU ONNX Runtime session for the model at `path`.
pub fn load_session(path: &Path, model: &'static str) -> Result<Session, AnalysisError> {
    let load_err = |reason: String| AnalysisError::ModelLoad { model, reason };

    if !path.exists() {
        return Err(load_err(format!("model not found at {}", path.display())));
    }

    let model_bytes = std::fs::read(path)
        .map_err(|e| load_err(format!("read {}: {}", path.display(), e)))?;

    let session = Session::builder()
        .map_err(|e| load_err(format!("session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| load_err(format!("optimization level: {}", e)))?
        .commit_from_memory(&model_bytes)
        .map_err(|e| load_err(format!("load model: {}", e)))?;

    tracing::info!("Loaded {} from {}", model, path.display());
    Ok(session)
}
