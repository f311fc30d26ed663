use crate::error::AnalysisError;
use std::path::PathBuf;

/// Configuration for clip windowing, frame sampling and label policies
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Length of each clip window (seconds)
    pub clip_duration: f64,
    /// Seconds shared by consecutive windows, `0 <= overlap < clip_duration`
    pub overlap: f64,
    /// Frames fed to the feature extractor per clip
    pub frames_per_clip: usize,
    /// Side of the square frame the feature extractor expects
    pub frame_size: i32,
    /// Minimum probability for a positive "spinning" decision
    pub spinning_threshold: f64,
    /// Where transient clips are written (system temp dir when unset)
    pub temp_dir: Option<PathBuf>,
    pub show_progress: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            clip_duration: 5.0,
            overlap: 2.0,
            frames_per_clip: 16,
            frame_size: 224,
            spinning_threshold: 0.3,
            temp_dir: None,
            show_progress: true,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let invalid = |msg: String| Err(AnalysisError::InvalidConfig(msg));

        if !(self.clip_duration > 0.0) || !self.clip_duration.is_finite() {
            return invalid(format!("clip_duration must be > 0, got {}", self.clip_duration));
        }
        if !(self.overlap >= 0.0) || self.overlap >= self.clip_duration {
            return invalid(format!(
                "overlap must satisfy 0 <= overlap < clip_duration ({}), got {}",
                self.clip_duration, self.overlap
            ));
        }
        if self.frames_per_clip == 0 {
            return invalid("frames_per_clip must be > 0".to_string());
        }
        if self.frame_size <= 0 {
            return invalid(format!("frame_size must be > 0, got {}", self.frame_size));
        }
        if !(0.0..=1.0).contains(&self.spinning_threshold) {
            return invalid(format!(
                "spinning_threshold must be within [0, 1], got {}",
                self.spinning_threshold
            ));
        }
        Ok(())
    }

    pub fn clip_dir(&self) -> PathBuf {
        self.temp_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("behavior-scan"))
    }
}
