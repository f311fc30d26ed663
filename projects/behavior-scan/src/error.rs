// Error taxonomy for video analysis
//
// Video-level and aggregation-level failures abort an analysis. Clip-level
// failures are caught by the orchestrator, logged, and the clip is skipped.

use thiserror::Error;

/// Fatal errors surfaced to the caller of an analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Cannot open video file {path}: {reason}")]
    VideoOpen { path: String, reason: String },

    #[error("Video has no frames or no usable frame rate: {path}")]
    EmptyVideo { path: String },

    #[error("Video is too short to analyze ({duration:.2}s, need more than 1s)")]
    TooShort { duration: f64 },

    #[error("Invalid analysis config: {0}")]
    InvalidConfig(String),

    #[error("Failed to load {model}: {reason}")]
    ModelLoad { model: &'static str, reason: String },

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while producing the result for a single clip.
#[derive(Debug, Error)]
pub enum ClipError {
    #[error("OpenCV operation failed: {0}")]
    OpenCv(#[from] opencv::Error),

    #[error("No frames could be read for this clip")]
    NoFrames,

    #[error("Failed to write transient clip: {0}")]
    ClipWrite(String),

    #[error("Frame preprocessing failed: {0}")]
    Preprocess(String),

    #[error("Feature extraction failed: {0}")]
    FeatureExtraction(String),

    #[error("Feature scaling failed: {0}")]
    Scaling(String),

    #[error("Classification failed: {0}")]
    Classification(String),
}

impl From<std::io::Error> for ClipError {
    fn from(e: std::io::Error) -> Self {
        ClipError::ClipWrite(e.to_string())
    }
}

/// Raised when a summary cannot be computed from the clip results.
#[derive(Debug, Error, PartialEq)]
pub enum AggregationError {
    #[error("No analyzable clips: all {skipped} clip(s) failed")]
    NoClips { skipped: usize },
}
