use crate::pipeline::classifier::ClassifierOutputs;
use crate::pipeline::config::AnalysisConfig;
use crate::pipeline::models::ModelPaths;
use crate::pipeline::types::Label;
use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Video file to analyze
    pub video: String,

    /// ONNX export of the video feature extractor (I3D)
    #[arg(long, env = "BEHAVIOR_SCAN_FEATURE_MODEL")]
    pub feature_model: PathBuf,

    /// Output of the feature extractor to use as the clip features
    #[arg(long, env = "BEHAVIOR_SCAN_FEATURE_OUTPUT", default_value = "default")]
    pub feature_output: String,

    /// ONNX export of the behavior classifier
    #[arg(long, env = "BEHAVIOR_SCAN_CLASSIFIER_MODEL")]
    pub classifier_model: PathBuf,

    /// Classifier output holding the per-label decisions
    #[arg(long, env = "BEHAVIOR_SCAN_LABEL_OUTPUT", default_value = "label")]
    pub label_output: String,

    /// Classifier outputs holding per-label probabilities, in label order
    #[arg(
        long,
        env = "BEHAVIOR_SCAN_PROBABILITY_OUTPUTS",
        value_delimiter = ',',
        default_values_t = [
            "probabilities_0".to_string(),
            "probabilities_1".to_string(),
            "probabilities_2".to_string(),
        ]
    )]
    pub probability_outputs: Vec<String>,

    /// Feature scaler parameters (JSON with "mean" and "scale")
    #[arg(long, env = "BEHAVIOR_SCAN_SCALER")]
    pub scaler: PathBuf,

    /// Clip window length in seconds
    #[arg(long, env = "BEHAVIOR_SCAN_CLIP_DURATION", default_value_t = 5.0)]
    pub clip_duration: f64,

    /// Seconds shared by consecutive windows
    #[arg(long, env = "BEHAVIOR_SCAN_OVERLAP", default_value_t = 2.0)]
    pub overlap: f64,

    /// Frames fed to the feature extractor per clip
    #[arg(long, env = "BEHAVIOR_SCAN_FRAMES_PER_CLIP", default_value_t = 16)]
    pub frames_per_clip: usize,

    /// Square input resolution of the feature extractor
    #[arg(long, env = "BEHAVIOR_SCAN_FRAME_SIZE", default_value_t = 224)]
    pub frame_size: i32,

    /// Probability at which "spinning" counts as detected
    #[arg(long, env = "BEHAVIOR_SCAN_SPINNING_THRESHOLD", default_value_t = 0.3)]
    pub spinning_threshold: f64,

    /// Directory for transient clip files
    #[arg(long, env = "BEHAVIOR_SCAN_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Write the JSON result here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Also export per-clip results as CSV
    #[arg(long)]
    pub clips_csv: Option<PathBuf>,

    /// Hide the clip progress bar
    #[arg(long)]
    pub quiet: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            clip_duration: self.clip_duration,
            overlap: self.overlap,
            frames_per_clip: self.frames_per_clip,
            frame_size: self.frame_size,
            spinning_threshold: self.spinning_threshold,
            temp_dir: self.temp_dir.clone(),
            show_progress: !self.quiet,
        }
    }

    pub fn model_paths(&self) -> Result<ModelPaths> {
        if self.probability_outputs.len() != Label::COUNT {
            bail!(
                "--probability-outputs needs {} names, got {}",
                Label::COUNT,
                self.probability_outputs.len()
            );
        }

        let mut outputs = ClassifierOutputs {
            label: self.label_output.clone(),
            ..Default::default()
        };
        for (slot, name) in outputs
            .probabilities
            .iter_mut()
            .zip(&self.probability_outputs)
        {
            *slot = name.clone();
        }

        Ok(ModelPaths {
            feature_extractor: self.feature_model.clone(),
            feature_output: self.feature_output.clone(),
            classifier: self.classifier_model.clone(),
            classifier_outputs: outputs,
            scaler: self.scaler.clone(),
        })
    }
}
