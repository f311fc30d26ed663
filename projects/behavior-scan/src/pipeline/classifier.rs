// Behavior classifier adapter
//
// Wraps the externally trained multi-label classifier. Outputs are positional:
// decision `i` and probability output `i` belong to `Label::ALL[i]`.

use crate::error::{AnalysisError, ClipError};
use crate::pipeline::onnx::load_session;
use crate::pipeline::scaler::FeatureScaler;
use crate::pipeline::types::{FeatureVector, Label, LabelScores};
use ort::session::Session;
use ort::value::{Tensor, Value};
use std::path::Path;
use std::sync::Mutex;

/// Per-label probability output as returned by the classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbabilityOutput {
    /// `[rows, cols]` row-major class probabilities; column 1 is the positive class.
    Matrix { cols: usize, values: Vec<f32> },
    /// `[p_neg, p_pos]` for one sample, or `[p_pos]` alone.
    Vector(Vec<f32>),
}

impl ProbabilityOutput {
    pub fn from_tensor(shape: &[i64], values: &[f32]) -> Result<Self, ClipError> {
        match shape {
            [_, cols] => Ok(Self::Matrix {
                cols: *cols as usize,
                values: values.to_vec(),
            }),
            [_] => Ok(Self::Vector(values.to_vec())),
            _ => Err(ClipError::Classification(format!(
                "unsupported probability shape {:?}",
                shape
            ))),
        }
    }

    /// Probability of the positive class for the first (only) sample.
    pub fn positive_class(&self) -> Result<f64, ClipError> {
        let p = match self {
            Self::Matrix { cols, values } if *cols >= 2 && values.len() >= 2 => values[1],
            Self::Vector(values) if values.len() == 2 => values[1],
            Self::Vector(values) if values.len() == 1 => values[0],
            other => {
                return Err(ClipError::Classification(format!(
                    "cannot read positive-class probability from {:?}",
                    other
                )))
            }
        };

        if !(0.0..=1.0).contains(&p) {
            return Err(ClipError::Classification(format!(
                "probability {} outside [0, 1]",
                p
            )));
        }
        Ok(widen(p))
    }
}

/// Widen to f64 keeping the shortest decimal that identifies the f32, so
/// 0.1f32 becomes 0.1 rather than 0.10000000149011612.
fn widen(p: f32) -> f64 {
    p.to_string().parse().unwrap_or(f64::from(p))
}

/// Classifier output for one feature vector, before label policies.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    pub decisions: Vec<i64>,
    pub probabilities: Vec<ProbabilityOutput>,
}

pub trait BehaviorClassifier: Send + Sync {
    fn predict(&self, scaled: &FeatureVector) -> Result<RawPrediction, ClipError>;
}

/// How a label's binary value is derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdPolicy {
    /// Keep the classifier's own decision.
    Native,
    /// Positive iff the probability is at least this value.
    MinProbability(f64),
}

impl ThresholdPolicy {
    pub fn decide(&self, native: u8, probability: f64) -> u8 {
        match self {
            Self::Native => native,
            Self::MinProbability(threshold) => u8::from(probability >= *threshold),
        }
    }
}

/// Policy table indexed by label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPolicies([ThresholdPolicy; Label::COUNT]);

impl LabelPolicies {
    pub fn native() -> Self {
        Self([ThresholdPolicy::Native; Label::COUNT])
    }

    /// Native decisions everywhere except "spinning", which uses `threshold`.
    pub fn with_spinning_threshold(threshold: f64) -> Self {
        Self::native().with(Label::Spinning, ThresholdPolicy::MinProbability(threshold))
    }

    pub fn with(mut self, label: Label, policy: ThresholdPolicy) -> Self {
        self.0[label.index()] = policy;
        self
    }

    pub fn get(&self, label: Label) -> ThresholdPolicy {
        self.0[label.index()]
    }
}

/// Scale `features`, query the classifier, and apply the label policies.
pub fn classify_features(
    scaler: &dyn FeatureScaler,
    classifier: &dyn BehaviorClassifier,
    policies: &LabelPolicies,
    features: &FeatureVector,
) -> Result<LabelScores, ClipError> {
    let scaled = scaler.transform(features)?;
    let raw = classifier.predict(&scaled)?;

    if raw.decisions.len() != Label::COUNT || raw.probabilities.len() != Label::COUNT {
        return Err(ClipError::Classification(format!(
            "expected {} labels, got {} decisions and {} probability outputs",
            Label::COUNT,
            raw.decisions.len(),
            raw.probabilities.len()
        )));
    }

    let mut scores = LabelScores {
        predictions: [0; Label::COUNT],
        probabilities: [0.0; Label::COUNT],
    };
    for label in Label::ALL {
        let i = label.index();
        let probability = raw.probabilities[i].positive_class()?;
        let native = u8::from(raw.decisions[i] != 0);
        scores.probabilities[i] = probability;
        scores.predictions[i] = policies.get(label).decide(native, probability);
    }
    Ok(scores)
}

/// Output names of an exported multi-label classifier.
#[derive(Debug, Clone)]
pub struct ClassifierOutputs {
    pub label: String,
    pub probabilities: [String; Label::COUNT],
}

impl Default for ClassifierOutputs {
    fn default() -> Self {
        Self {
            label: "label".to_string(),
            probabilities: [0, 1, 2].map(|i| format!("probabilities_{}", i)),
        }
    }
}

/// Classifier exported to ONNX: `[1, F]` float32 in, one int64 decision
/// tensor and one probability tensor per label out.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    outputs: ClassifierOutputs,
}

impl OnnxClassifier {
    pub fn load(model_path: &Path, outputs: ClassifierOutputs) -> Result<Self, AnalysisError> {
        let session = load_session(model_path, "behavior classifier")?;
        Ok(Self {
            session: Mutex::new(session),
            outputs,
        })
    }
}

impl BehaviorClassifier for OnnxClassifier {
    fn predict(&self, scaled: &FeatureVector) -> Result<RawPrediction, ClipError> {
        let err = |msg: String| ClipError::Classification(msg);

        let shape = vec![1usize, scaled.len()];
        let input = Tensor::from_array((shape, scaled.as_slice().to_vec().into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| err(format!("ORT tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| err("ORT session poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| err(format!("ORT run failed: {}", e)))?;

        let label_output = outputs
            .get(self.outputs.label.as_str())
            .ok_or_else(|| err(format!("missing output '{}'", self.outputs.label)))?;
        let (_, decisions) = label_output
            .try_extract_tensor::<i64>()
            .map_err(|e| err(format!("ORT extract labels: {}", e)))?;
        let decisions = decisions.to_vec();

        let mut probabilities = Vec::with_capacity(Label::COUNT);
        for name in &self.outputs.probabilities {
            let output = outputs
                .get(name.as_str())
                .ok_or_else(|| err(format!("missing output '{}'", name)))?;
            let (shape, values) = output
                .try_extract_tensor::<f32>()
                .map_err(|e| err(format!("ORT extract {}: {}", name, e)))?;
            probabilities.push(ProbabilityOutput::from_tensor(&shape[..], values)?);
        }

        Ok(RawPrediction {
            decisions,
            probabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct IdentityScaler;

    impl FeatureScaler for IdentityScaler {
        fn transform(&self, features: &FeatureVector) -> Result<FeatureVector, ClipError> {
            Ok(features.clone())
        }
    }

    struct FixedClassifier(RawPrediction);

    impl BehaviorClassifier for FixedClassifier {
        fn predict(&self, _: &FeatureVector) -> Result<RawPrediction, ClipError> {
            Ok(self.0.clone())
        }
    }

    fn two_class(p: f32) -> ProbabilityOutput {
        ProbabilityOutput::Matrix {
            cols: 2,
            values: vec![1.0 - p, p],
        }
    }

    fn classify(decisions: Vec<i64>, probs: [f32; 3], threshold: f64) -> LabelScores {
        let classifier = FixedClassifier(RawPrediction {
            decisions,
            probabilities: probs.iter().map(|p| two_class(*p)).collect(),
        });
        classify_features(
            &IdentityScaler,
            &classifier,
            &LabelPolicies::with_spinning_threshold(threshold),
            &FeatureVector(vec![0.0]),
        )
        .unwrap()
    }

    #[test]
    fn test_matrix_shape_takes_positive_column() {
        let output = ProbabilityOutput::from_tensor(&[1, 2], &[0.25, 0.75]).unwrap();
        assert_eq!(output.positive_class().unwrap(), 0.75);
    }

    #[test]
    fn test_probability_keeps_f32_precision() {
        let output = ProbabilityOutput::Vector(vec![0.9, 0.1]);
        assert_eq!(output.positive_class().unwrap(), 0.1);
        assert_eq!(widen(0.3), 0.3);
        assert_eq!(widen(1.0), 1.0);
    }

    #[test]
    fn test_vector_shapes() {
        let two = ProbabilityOutput::from_tensor(&[2], &[0.25, 0.75]).unwrap();
        assert_eq!(two.positive_class().unwrap(), 0.75);

        let one = ProbabilityOutput::from_tensor(&[1], &[0.5]).unwrap();
        assert_eq!(one.positive_class().unwrap(), 0.5);
    }

    #[test]
    fn test_rejects_bad_probability_outputs() {
        assert!(ProbabilityOutput::from_tensor(&[1, 1, 2], &[0.5, 0.5]).is_err());
        assert!(ProbabilityOutput::Vector(vec![])
            .positive_class()
            .is_err());
        assert!(ProbabilityOutput::Vector(vec![1.5]).positive_class().is_err());
        assert!(ProbabilityOutput::Matrix {
            cols: 1,
            values: vec![0.5]
        }
        .positive_class()
        .is_err());
    }

    #[test]
    fn test_spinning_uses_threshold_over_native_decision() {
        // Native says no, probability clears the threshold.
        let scores = classify(vec![0, 0, 0], [0.1, 0.1, 0.3], 0.3);
        assert_eq!(scores.predictions[Label::Spinning.index()], 1);

        // Native says yes, probability below the threshold.
        let scores = classify(vec![0, 0, 1], [0.1, 0.1, 0.29], 0.3);
        assert_eq!(scores.predictions[Label::Spinning.index()], 0);
    }

    #[test]
    fn test_other_labels_keep_native_decision() {
        let scores = classify(vec![1, 0, 0], [0.05, 0.95, 0.0], 0.3);
        assert_eq!(scores.predictions[Label::ArmFlapping.index()], 1);
        assert_eq!(scores.predictions[Label::HeadBanging.index()], 0);
        assert_eq!(scores.probabilities, [0.05, 0.95, 0.0]);
    }

    #[test]
    fn test_policy_table_is_per_label() {
        let policies = LabelPolicies::with_spinning_threshold(0.3);
        assert_eq!(policies.get(Label::ArmFlapping), ThresholdPolicy::Native);
        assert_eq!(policies.get(Label::HeadBanging), ThresholdPolicy::Native);
        assert_eq!(
            policies.get(Label::Spinning),
            ThresholdPolicy::MinProbability(0.3)
        );

        let policies = policies.with(Label::HeadBanging, ThresholdPolicy::MinProbability(0.6));
        assert_eq!(ThresholdPolicy::MinProbability(0.6).decide(0, 0.6), 1);
        assert_eq!(
            policies.get(Label::HeadBanging),
            ThresholdPolicy::MinProbability(0.6)
        );
    }

    #[test]
    fn test_wrong_label_count_is_rejected() {
        let classifier = FixedClassifier(RawPrediction {
            decisions: vec![0, 1],
            probabilities: vec![two_class(0.1), two_class(0.2)],
        });
        let result = classify_features(
            &IdentityScaler,
            &classifier,
            &LabelPolicies::native(),
            &FeatureVector(vec![0.0]),
        );
        assert!(matches!(result, Err(ClipError::Classification(_))));
    }
}
