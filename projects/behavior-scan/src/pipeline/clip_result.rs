use crate::error::ClipError;
use crate::pipeline::classifier::{classify_features, LabelPolicies};
use crate::pipeline::feature::extract_clip_features;
use crate::pipeline::models::BehaviorModels;
use crate::pipeline::preprocess::preprocess_frame;
use crate::pipeline::types::{ClipResult, TimeWindow};
use opencv::core::Mat;

/// Turns the raw frames of one window into a `ClipResult`.
pub struct ClipResultBuilder<'a> {
    models: &'a BehaviorModels,
    policies: LabelPolicies,
    frames_per_clip: usize,
    frame_size: i32,
}

impl<'a> ClipResultBuilder<'a> {
    pub fn new(
        models: &'a BehaviorModels,
        policies: LabelPolicies,
        frames_per_clip: usize,
        frame_size: i32,
    ) -> Self {
        Self {
            models,
            policies,
            frames_per_clip,
            frame_size,
        }
    }

    pub fn frames_per_clip(&self) -> usize {
        self.frames_per_clip
    }

    pub fn build(
        &self,
        clip_id: usize,
        window: TimeWindow,
        frames: &[Mat],
    ) -> Result<ClipResult, ClipError> {
        let tensors = frames
            .iter()
            .take(self.frames_per_clip)
            .map(|frame| preprocess_frame(frame, self.frame_size))
            .collect::<Result<Vec<_>, _>>()?;

        let features =
            extract_clip_features(self.models.extractor.as_ref(), tensors, self.frames_per_clip)?;
        let scores = classify_features(
            self.models.scaler.as_ref(),
            self.models.classifier.as_ref(),
            &self.policies,
            &features,
        )?;

        Ok(ClipResult {
            clip_id,
            window,
            scores,
        })
    }
}
