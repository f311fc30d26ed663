use crate::error::AggregationError;
use crate::pipeline::types::{round_to, BehaviorSummary, ClipResult, Label, Summary};
use serde::Serialize;
use std::collections::BTreeMap;

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    sum / count as f64
}

/// Reduce clip results to an overall score and per-label detection summary.
///
/// Every clip counts equally regardless of its length. `skipped` is only used
/// to describe the failure when no clip succeeded.
pub fn summarize(results: &[ClipResult], skipped: usize) -> Result<Summary, AggregationError> {
    if results.is_empty() {
        return Err(AggregationError::NoClips { skipped });
    }

    let overall = mean(results.iter().map(|r| {
        Label::ALL.iter().map(|l| r.probability(*l)).sum::<f64>() / Label::COUNT as f64
    }));

    let behaviors = Label::ALL
        .iter()
        .map(|&label| {
            let summary = BehaviorSummary {
                detected: results.iter().any(|r| r.prediction(label) == 1),
                confidence: round_to(mean(results.iter().map(|r| r.probability(label))), 2),
            };
            (label, summary)
        })
        .collect();

    Ok(Summary {
        overall_score: round_to(100.0 * overall, 1),
        behaviors,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BehaviorReport {
    pub clips_detected: usize,
    pub percentage: f64,
}

/// Per-label detection counts across the analyzed clips.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub video: String,
    pub total_clips: usize,
    pub analyzed_duration: f64,
    pub behaviors: BTreeMap<Label, BehaviorReport>,
}

impl AnalysisReport {
    pub fn from_results(video: &str, results: &[ClipResult]) -> Self {
        let total = results.len();
        let analyzed_duration = results
            .iter()
            .map(|r| r.window.end())
            .fold(0.0, f64::max);

        let behaviors = Label::ALL
            .iter()
            .map(|&label| {
                let detected = results.iter().filter(|r| r.prediction(label) == 1).count();
                let percentage = if total > 0 {
                    round_to(100.0 * detected as f64 / total as f64, 1)
                } else {
                    0.0
                };
                (
                    label,
                    BehaviorReport {
                        clips_detected: detected,
                        percentage,
                    },
                )
            })
            .collect();

        Self {
            video: video.to_string(),
            total_clips: total,
            analyzed_duration,
            behaviors,
        }
    }

    pub fn log(&self) {
        tracing::info!("Behavior analysis report for {}", self.video);
        tracing::info!(
            "Total clips: {}, duration analyzed: {:.1}s",
            self.total_clips,
            self.analyzed_duration
        );
        for (label, report) in &self.behaviors {
            tracing::info!(
                "{}: {}/{} clips ({:.1}%)",
                label.as_str().to_uppercase(),
                report.clips_detected,
                self.total_clips,
                report.percentage
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{LabelScores, TimeWindow};

    fn clip(id: usize, predictions: [u8; 3], probabilities: [f64; 3]) -> ClipResult {
        ClipResult {
            clip_id: id,
            window: TimeWindow::new(id as f64 * 3.0, id as f64 * 3.0 + 5.0),
            scores: LabelScores {
                predictions,
                probabilities,
            },
        }
    }

    #[test]
    fn test_single_clip_overall_score() {
        let summary = summarize(&[clip(0, [1, 0, 1], [0.9, 0.1, 0.5])], 0).unwrap();
        assert_eq!(summary.overall_score, 50.0);
        assert_eq!(summary.behaviors[&Label::ArmFlapping].confidence, 0.9);
        assert!(summary.behaviors[&Label::ArmFlapping].detected);
        assert!(!summary.behaviors[&Label::HeadBanging].detected);
    }

    #[test]
    fn test_confidence_ignores_binaries() {
        let probs = [0.1, 0.2, 0.3, 0.4, 0.25];
        let results: Vec<ClipResult> = probs
            .iter()
            .enumerate()
            .map(|(i, p)| clip(i, [0, 0, 0], [*p, 0.0, 0.0]))
            .collect();

        let summary = summarize(&results, 0).unwrap();
        let arm = summary.behaviors[&Label::ArmFlapping];
        assert!(!arm.detected);
        assert_eq!(arm.confidence, 0.25);
    }

    #[test]
    fn test_detected_if_any_clip_positive() {
        let results = vec![
            clip(0, [0, 0, 0], [0.1, 0.1, 0.1]),
            clip(1, [0, 0, 1], [0.1, 0.1, 0.35]),
            clip(2, [0, 0, 0], [0.1, 0.1, 0.1]),
        ];
        let summary = summarize(&results, 0).unwrap();
        assert!(summary.behaviors[&Label::Spinning].detected);
        assert!(!summary.behaviors[&Label::ArmFlapping].detected);
        assert_eq!(summary.behaviors[&Label::Spinning].confidence, 0.18);
    }

    #[test]
    fn test_halfway_values_round_to_even() {
        let results = vec![
            clip(0, [0, 0, 0], [0.25, 0.5, 0.0]),
            clip(1, [0, 0, 0], [0.0, 0.375, 0.0]),
        ];
        let summary = summarize(&results, 0).unwrap();
        // Per-clip means 0.25 and 0.125: overall 18.75
        assert_eq!(summary.overall_score, 18.8);
        assert_eq!(summary.behaviors[&Label::ArmFlapping].confidence, 0.12);
        assert_eq!(summary.behaviors[&Label::HeadBanging].confidence, 0.44);

        let single = summarize(&[clip(0, [0, 0, 0], [0.5, 0.4375, 0.0])], 0).unwrap();
        assert_eq!(single.overall_score, 31.2);
    }

    #[test]
    fn test_empty_results_are_an_error() {
        assert_eq!(
            summarize(&[], 4),
            Err(AggregationError::NoClips { skipped: 4 })
        );
    }

    #[test]
    fn test_report_counts() {
        let results = vec![
            clip(0, [1, 0, 0], [0.9, 0.1, 0.1]),
            clip(1, [1, 0, 1], [0.8, 0.1, 0.4]),
            clip(2, [0, 0, 0], [0.2, 0.1, 0.1]),
        ];
        let report = AnalysisReport::from_results("kid.mp4", &results);
        assert_eq!(report.total_clips, 3);
        assert_eq!(report.analyzed_duration, 11.0);
        assert_eq!(report.behaviors[&Label::ArmFlapping].clips_detected, 2);
        assert_eq!(report.behaviors[&Label::ArmFlapping].percentage, 66.7);
        assert_eq!(report.behaviors[&Label::HeadBanging].percentage, 0.0);
    }
}
