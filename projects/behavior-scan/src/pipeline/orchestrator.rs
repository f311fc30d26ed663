// Pipeline orchestrator: runs the sliding-window analysis for one video
//
// Windows are processed strictly in order, one at a time. A clip that fails
// is logged and skipped; its window keeps its position-based clip_id.

use crate::error::AnalysisError;
use crate::pipeline::aggregate::{summarize, AnalysisReport};
use crate::pipeline::classifier::LabelPolicies;
use crate::pipeline::clip_result::ClipResultBuilder;
use crate::pipeline::config::AnalysisConfig;
use crate::pipeline::materialize::{ClipFrameSource, ContainerClipSource};
use crate::pipeline::models::BehaviorModels;
use crate::pipeline::types::{ClipResult, SkippedClip, Summary, TimeWindow};
use crate::pipeline::windowing::clip_windows;
use crate::video::opencv_reader::OpencvReader;
use crate::video::VideoSource;
use indicatif::{ProgressBar, ProgressStyle};

/// Everything one analysis produced.
#[derive(Debug, Clone)]
pub struct VideoAnalysis {
    pub video: String,
    pub windows: usize,
    pub clips: Vec<ClipResult>,
    pub skipped: Vec<SkippedClip>,
    pub summary: Summary,
    pub report: AnalysisReport,
}

pub struct BehaviorAnalyzer<'a> {
    models: &'a BehaviorModels,
    config: AnalysisConfig,
}

impl<'a> BehaviorAnalyzer<'a> {
    pub fn new(models: &'a BehaviorModels, config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { models, config })
    }

    /// Open `video_path` and analyze it end to end.
    pub fn analyze_video(&self, video_path: &str) -> Result<VideoAnalysis, AnalysisError> {
        let reader = OpencvReader::open(video_path)?;
        self.analyze_source(video_path, reader)
    }

    /// Window an already opened source and analyze every clip.
    pub fn analyze_source<S: VideoSource>(
        &self,
        video_path: &str,
        reader: S,
    ) -> Result<VideoAnalysis, AnalysisError> {
        let duration = reader.duration_secs();
        tracing::info!(
            "Video duration: {:.2} seconds, FPS: {:.2}",
            duration,
            reader.source_fps()
        );

        if duration <= 0.0 {
            return Err(AnalysisError::EmptyVideo {
                path: video_path.to_string(),
            });
        }

        let windows = clip_windows(duration, self.config.clip_duration, self.config.overlap);
        if windows.is_empty() {
            return Err(AnalysisError::TooShort { duration });
        }

        let mut source = ContainerClipSource::new(reader, self.config.clip_dir());
        self.analyze_windows(video_path, &mut source, &windows)
    }

    /// Run every window through `source` and the models, then aggregate.
    pub fn analyze_windows(
        &self,
        video: &str,
        source: &mut dyn ClipFrameSource,
        windows: &[TimeWindow],
    ) -> Result<VideoAnalysis, AnalysisError> {
        let builder = ClipResultBuilder::new(
            self.models,
            LabelPolicies::with_spinning_threshold(self.config.spinning_threshold),
            self.config.frames_per_clip,
            self.config.frame_size,
        );

        let pb = self.progress_bar(windows.len());
        let mut clips = Vec::with_capacity(windows.len());
        let mut skipped = Vec::new();

        for (clip_id, window) in windows.iter().enumerate() {
            let outcome = source
                .clip_frames(window, builder.frames_per_clip())
                .and_then(|frames| builder.build(clip_id, *window, &frames));

            match outcome {
                Ok(result) => clips.push(result),
                Err(e) => {
                    tracing::warn!(
                        "Clip {} ({:.2}-{:.2}s) skipped: {}",
                        clip_id,
                        window.start(),
                        window.end(),
                        e
                    );
                    skipped.push(SkippedClip {
                        clip_id,
                        start_time: window.start(),
                        end_time: window.end(),
                        reason: e.to_string(),
                    });
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        let summary = summarize(&clips, skipped.len())?;
        let report = AnalysisReport::from_results(video, &clips);
        report.log();

        Ok(VideoAnalysis {
            video: video.to_string(),
            windows: windows.len(),
            clips,
            skipped,
            summary,
            report,
        })
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        match ProgressStyle::default_bar()
            .template("{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} clips ({eta})")
        {
            Ok(style) => pb.set_style(style.progress_chars("#>-")),
            Err(e) => tracing::debug!("Progress template rejected: {}", e),
        }
        pb.set_message("Processing clips");
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AggregationError, ClipError};
    use crate::pipeline::clip_result::tests::{fake_models, gray_frames};
    use crate::pipeline::materialize::tests::FakeSource;
    use crate::pipeline::types::Label;
    use opencv::core::Mat;

    /// Serves uniform gray frames, failing on the listed clip indices.
    struct ScriptedSource {
        calls: usize,
        fail_on: Vec<usize>,
        frames_per_window: usize,
    }

    impl ClipFrameSource for ScriptedSource {
        fn clip_frames(&mut self, _: &TimeWindow, limit: usize) -> Result<Vec<Mat>, ClipError> {
            let index = self.calls;
            self.calls += 1;
            if self.fail_on.contains(&index) {
                return Err(ClipError::FeatureExtraction("model exploded".to_string()));
            }
            // Brightness rises with the clip index
            let mut frames = gray_frames(self.frames_per_window, 51.0 * (index + 1) as f64);
            frames.truncate(limit);
            Ok(frames)
        }
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            frame_size: 8,
            show_progress: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_failed_clip_is_skipped_without_renumbering() {
        let models = fake_models();
        let analyzer = BehaviorAnalyzer::new(&models, config()).unwrap();
        let windows = clip_windows(17.0, 5.0, 2.0);
        assert_eq!(windows.len(), 5);

        let mut source = ScriptedSource {
            calls: 0,
            fail_on: vec![3],
            frames_per_window: 10,
        };
        let analysis = analyzer
            .analyze_windows("test.mp4", &mut source, &windows)
            .unwrap();

        let ids: Vec<usize> = analysis.clips.iter().map(|c| c.clip_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 4]);
        assert_eq!(analysis.skipped.len(), 1);
        assert_eq!(analysis.skipped[0].clip_id, 3);
        assert_eq!(analysis.skipped[0].start_time, 9.0);
        assert_eq!(analysis.clips[3].window, windows[4]);
        assert_eq!(analysis.report.total_clips, 4);
    }

    #[test]
    fn test_summary_reflects_clip_probabilities() {
        let models = fake_models();
        let analyzer = BehaviorAnalyzer::new(&models, config()).unwrap();
        let windows = clip_windows(10.0, 5.0, 0.0);

        let mut source = ScriptedSource {
            calls: 0,
            fail_on: vec![],
            frames_per_window: 3,
        };
        let analysis = analyzer
            .analyze_windows("test.mp4", &mut source, &windows)
            .unwrap();

        // Clip probabilities 0.2 and 0.4 for every label
        assert_eq!(analysis.summary.overall_score, 30.0);
        assert_eq!(analysis.clips[0].prediction(Label::Spinning), 0);
        assert_eq!(analysis.clips[1].prediction(Label::Spinning), 1);
        let spinning = analysis.summary.behaviors[&Label::Spinning];
        assert!(spinning.detected);
        assert_eq!(spinning.confidence, 0.3);
        assert!(analysis.summary.behaviors[&Label::ArmFlapping].detected);
    }

    #[test]
    fn test_all_clips_failing_is_aggregation_error() {
        let models = fake_models();
        let analyzer = BehaviorAnalyzer::new(&models, config()).unwrap();
        let windows = clip_windows(11.0, 5.0, 2.0);

        let mut source = ScriptedSource {
            calls: 0,
            fail_on: vec![0, 1, 2],
            frames_per_window: 3,
        };
        let err = analyzer
            .analyze_windows("test.mp4", &mut source, &windows)
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Aggregation(AggregationError::NoClips { skipped: 3 })
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let models = fake_models();
        let config = AnalysisConfig {
            overlap: 6.0,
            ..config()
        };
        assert!(matches!(
            BehaviorAnalyzer::new(&models, config),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_duration_is_empty_video_error() {
        let models = fake_models();
        let analyzer = BehaviorAnalyzer::new(&models, config()).unwrap();

        for source in [FakeSource::new(0.0, 100), FakeSource::new(25.0, 0)] {
            let err = analyzer.analyze_source("blank.mp4", source).unwrap_err();
            assert!(matches!(err, AnalysisError::EmptyVideo { ref path } if path == "blank.mp4"));
        }
    }

    #[test]
    fn test_sub_second_video_is_too_short() {
        let models = fake_models();
        let analyzer = BehaviorAnalyzer::new(&models, config()).unwrap();

        let err = analyzer
            .analyze_source("blip.mp4", FakeSource::new(10.0, 5))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::TooShort { duration } if duration == 0.5));
    }

    #[test]
    fn test_unreadable_video_is_video_open_error() {
        let models = fake_models();
        let analyzer = BehaviorAnalyzer::new(&models, config()).unwrap();
        assert!(matches!(
            analyzer.analyze_video("/nonexistent/video.mp4"),
            Err(AnalysisError::VideoOpen { .. })
        ));
    }
}
