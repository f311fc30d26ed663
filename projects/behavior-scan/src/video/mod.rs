pub mod clip_writer;
pub mod opencv_reader;

use opencv::core::{Mat, Size};

/// A seekable video source with sequential frame reads.
pub trait VideoSource {
    fn source_fps(&self) -> f64;
    fn frame_count(&self) -> usize;
    fn frame_size(&self) -> Size;
    fn seek_to_msec(&mut self, msec: f64) -> opencv::Result<()>;
    /// Current read position in milliseconds.
    fn position_msec(&self) -> opencv::Result<f64>;
    /// Returns `None` once the stream is exhausted.
    fn read_frame(&mut self) -> opencv::Result<Option<Mat>>;

    /// Duration in seconds, 0 when the frame rate is unknown.
    fn duration_secs(&self) -> f64 {
        duration_secs(self.frame_count(), self.source_fps())
    }
}

pub fn duration_secs(frame_count: usize, fps: f64) -> f64 {
    if fps > 0.0 && fps.is_finite() {
        frame_count as f64 / fps
    } else {
        0.0
    }
}
