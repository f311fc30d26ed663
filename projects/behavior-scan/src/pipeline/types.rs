use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Behavior labels, in the positional order the classifier uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    ArmFlapping,
    HeadBanging,
    Spinning,
}

impl Label {
    pub const COUNT: usize = 3;
    pub const ALL: [Label; Label::COUNT] =
        [Label::ArmFlapping, Label::HeadBanging, Label::Spinning];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::ArmFlapping => "armflapping",
            Label::HeadBanging => "headbanging",
            Label::Spinning => "spinning",
        }
    }
}

/// A `[start, end]` span of the source video, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    start: f64,
    end: f64,
}

impl TimeWindow {
    /// Only the windower builds windows; `start < end` holds by construction.
    pub(crate) fn new(start: f64, end: f64) -> Self {
        debug_assert!(start < end, "window start {} >= end {}", start, end);
        Self { start, end }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A resized, RGB, `[0,1]`-normalized frame in HWC layout.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTensor {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    pub data: Vec<f32>,
}

/// Flat per-clip feature vector produced by the feature extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(pub Vec<f32>);

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Per-label decisions for one clip after threshold policies are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelScores {
    pub predictions: [u8; Label::COUNT],
    pub probabilities: [f64; Label::COUNT],
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipResult {
    pub clip_id: usize,
    pub window: TimeWindow,
    pub scores: LabelScores,
}

impl ClipResult {
    pub fn prediction(&self, label: Label) -> u8 {
        self.scores.predictions[label.index()]
    }

    pub fn probability(&self, label: Label) -> f64 {
        self.scores.probabilities[label.index()]
    }
}

// Flat record: clip_id, start_time, end_time, <label>..., <label>_prob...
impl Serialize for ClipResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + 2 * Label::COUNT))?;
        map.serialize_entry("clip_id", &self.clip_id)?;
        map.serialize_entry("start_time", &self.window.start())?;
        map.serialize_entry("end_time", &self.window.end())?;
        for label in Label::ALL {
            map.serialize_entry(label.as_str(), &self.prediction(label))?;
        }
        for label in Label::ALL {
            map.serialize_entry(&format!("{}_prob", label.as_str()), &self.probability(label))?;
        }
        map.end()
    }
}

/// A window that produced no result, kept for observability.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedClip {
    pub clip_id: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BehaviorSummary {
    pub detected: bool,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    #[serde(rename = "overallScore")]
    pub overall_score: f64,
    #[serde(flatten)]
    pub behaviors: BTreeMap<Label, BehaviorSummary>,
}

/// Round to `decimals` places, halves to even.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}
