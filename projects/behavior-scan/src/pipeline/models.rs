use crate::error::AnalysisError;
use crate::pipeline::classifier::{BehaviorClassifier, ClassifierOutputs, OnnxClassifier};
use crate::pipeline::feature::{FeatureExtractor, OnnxFeatureExtractor};
use crate::pipeline::scaler::{FeatureScaler, StandardScaler};
use std::path::PathBuf;

/// Locations of the externally trained models.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub feature_extractor: PathBuf,
    pub feature_output: String,
    pub classifier: PathBuf,
    pub classifier_outputs: ClassifierOutputs,
    pub scaler: PathBuf,
}

/// Models loaded once at startup and shared read-only by every analysis.
pub struct BehaviorModels {
    pub extractor: Box<dyn FeatureExtractor>,
    pub scaler: Box<dyn FeatureScaler>,
    pub classifier: Box<dyn BehaviorClassifier>,
}

impl BehaviorModels {
    pub fn new(
        extractor: Box<dyn FeatureExtractor>,
        scaler: Box<dyn FeatureScaler>,
        classifier: Box<dyn BehaviorClassifier>,
    ) -> Self {
        Self {
            extractor,
            scaler,
            classifier,
        }
    }

    pub fn load(paths: &ModelPaths) -> Result<Self, AnalysisError> {
        tracing::info!("Loading models...");
        let extractor =
            OnnxFeatureExtractor::load(&paths.feature_extractor, &paths.feature_output)?;
        let scaler = StandardScaler::load(&paths.scaler)?;
        let classifier = OnnxClassifier::load(&paths.classifier, paths.classifier_outputs.clone())?;
        Ok(Self::new(
            Box::new(extractor),
            Box::new(scaler),
            Box::new(classifier),
        ))
    }
}
