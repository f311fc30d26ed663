use crate::error::{AnalysisError, ClipError};
use crate::pipeline::onnx::load_session;
use crate::pipeline::types::{FeatureVector, FrameTensor};
use ort::session::Session;
use ort::value::{Tensor, Value};
use std::path::Path;
use std::sync::Mutex;

/// Maps a fixed-length frame batch to one flat feature vector.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, frames: &[FrameTensor]) -> Result<FeatureVector, ClipError>;
}

/// Truncate or extend `items` to exactly `len` entries by repeating the last one.
/// Returns `None` when there is nothing to repeat.
pub fn pad_to_length<T: Clone>(mut items: Vec<T>, len: usize) -> Option<Vec<T>> {
    let last = items.last()?.clone();
    items.truncate(len);
    items.resize(len, last);
    Some(items)
}

/// Pads the clip's frames to `target_frames` and runs them through `extractor`.
pub fn extract_clip_features(
    extractor: &dyn FeatureExtractor,
    frames: Vec<FrameTensor>,
    target_frames: usize,
) -> Result<FeatureVector, ClipError> {
    let batch = pad_to_length(frames, target_frames).ok_or(ClipError::NoFrames)?;
    let features = extractor.extract(&batch)?;

    if features.is_empty() {
        return Err(ClipError::FeatureExtraction(
            "model returned an empty feature vector".to_string(),
        ));
    }
    if features.as_slice().iter().any(|v| !v.is_finite()) {
        return Err(ClipError::FeatureExtraction(
            "model returned non-finite features".to_string(),
        ));
    }
    Ok(features)
}

/// I3D-style video model exported to ONNX.
///
/// Input is `[1, N, H, W, 3]` float32 RGB in `[0,1]`; the named output is
/// flattened into the feature vector.
pub struct OnnxFeatureExtractor {
    session: Mutex<Session>,
    output_name: String,
}

impl OnnxFeatureExtractor {
    pub fn load(model_path: &Path, output_name: &str) -> Result<Self, AnalysisError> {
        let session = load_session(model_path, "feature extractor")?;
        Ok(Self {
            session: Mutex::new(session),
            output_name: output_name.to_string(),
        })
    }
}

fn to_batch_tensor(frames: &[FrameTensor]) -> Result<Value, ClipError> {
    let first = frames
        .first()
        .ok_or_else(|| ClipError::FeatureExtraction("empty frame batch".to_string()))?;
    let (h, w, c) = (first.height, first.width, first.channels);

    let mut data = Vec::with_capacity(frames.len() * h * w * c);
    for frame in frames {
        if (frame.height, frame.width, frame.channels) != (h, w, c) {
            return Err(ClipError::FeatureExtraction(format!(
                "mixed frame shapes in batch: {}x{}x{} vs {}x{}x{}",
                frame.height, frame.width, frame.channels, h, w, c
            )));
        }
        data.extend_from_slice(&frame.data);
    }

    let shape = vec![1usize, frames.len(), h, w, c];
    Tensor::from_array((shape, data.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| ClipError::FeatureExtraction(format!("ORT tensor: {}", e)))
}

impl FeatureExtractor for OnnxFeatureExtractor {
    fn extract(&self, frames: &[FrameTensor]) -> Result<FeatureVector, ClipError> {
        let input = to_batch_tensor(frames)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ClipError::FeatureExtraction("ORT session poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| ClipError::FeatureExtraction(format!("ORT run failed: {}", e)))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            ClipError::FeatureExtraction(format!("missing output '{}'", self.output_name))
        })?;

        let (_, values) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ClipError::FeatureExtraction(format!("ORT extract: {}", e)))?;

        Ok(FeatureVector(values.to_vec()))
    }
}
