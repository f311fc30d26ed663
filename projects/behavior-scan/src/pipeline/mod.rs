// Sliding-window behavior analysis pipeline

pub mod aggregate;
pub mod classifier;
pub mod clip_result;
pub mod config;
pub mod feature;
pub mod materialize;
pub mod models;
pub mod onnx;
pub mod orchestrator;
pub mod preprocess;
pub mod scaler;
pub mod types;
pub mod windowing;
