use crate::error::{AnalysisError, ClipError};
use crate::pipeline::types::FeatureVector;
use serde::Deserialize;
use std::path::Path;

pub trait FeatureScaler: Send + Sync {
    fn transform(&self, features: &FeatureVector) -> Result<FeatureVector, ClipError>;
}

/// Per-feature standardization, `(x - mean) / scale`, with parameters fitted offline.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f32>,
    pub scale: Vec<f32>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f32>, scale: Vec<f32>) -> Result<Self, AnalysisError> {
        let scaler = Self { mean, scale };
        scaler.check()?;
        Ok(scaler)
    }

    /// Load `{ "mean": [...], "scale": [...] }` from a JSON file.
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let load_err = |reason: String| AnalysisError::ModelLoad {
            model: "feature scaler",
            reason,
        };
        let content = std::fs::read_to_string(path)
            .map_err(|e| load_err(format!("read {}: {}", path.display(), e)))?;
        let parsed: StandardScaler = serde_json::from_str(&content)
            .map_err(|e| load_err(format!("parse {}: {}", path.display(), e)))?;
        let scaler = Self::new(parsed.mean, parsed.scale)?;
        tracing::info!(
            "Loaded feature scaler from {} ({} features)",
            path.display(),
            scaler.mean.len()
        );
        Ok(scaler)
    }

    fn check(&self) -> Result<(), AnalysisError> {
        if self.mean.is_empty() || self.mean.len() != self.scale.len() {
            return Err(AnalysisError::ModelLoad {
                model: "feature scaler",
                reason: format!(
                    "mean has {} entries, scale has {}",
                    self.mean.len(),
                    self.scale.len()
                ),
            });
        }
        Ok(())
    }
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, features: &FeatureVector) -> Result<FeatureVector, ClipError> {
        if features.len() != self.mean.len() {
            return Err(ClipError::Scaling(format!(
                "expected {} features, got {}",
                self.mean.len(),
                features.len()
            )));
        }

        let scaled = features
            .as_slice()
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect();
        Ok(FeatureVector(scaled))
    }
}
