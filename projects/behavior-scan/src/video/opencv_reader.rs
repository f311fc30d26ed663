use super::VideoSource;
use crate::error::AnalysisError;
use opencv::{
    core::{Mat, Size},
    prelude::*,
    videoio::{
        VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_COUNT, CAP_PROP_FRAME_HEIGHT,
        CAP_PROP_FRAME_WIDTH, CAP_PROP_POS_MSEC,
    },
};

pub struct OpencvReader {
    capture: VideoCapture,
    source_fps: f64,
    total_frames: usize,
    frame_size: Size,
}

impl OpencvReader {
    pub fn open(path: &str) -> Result<Self, AnalysisError> {
        let open_err = |reason: String| AnalysisError::VideoOpen {
            path: path.to_string(),
            reason,
        };

        let capture =
            VideoCapture::from_file(path, CAP_ANY).map_err(|e| open_err(e.to_string()))?;
        if !capture.is_opened().map_err(|e| open_err(e.to_string()))? {
            return Err(open_err("decoder could not open the file".to_string()));
        }

        let prop = |id: i32| capture.get(id).map_err(|e| open_err(e.to_string()));
        let fps = prop(CAP_PROP_FPS)?;
        let raw_count = prop(CAP_PROP_FRAME_COUNT)?.max(0.0) as usize;
        let width = prop(CAP_PROP_FRAME_WIDTH)? as i32;
        let height = prop(CAP_PROP_FRAME_HEIGHT)? as i32;

        if fps <= 0.0 {
            tracing::warn!("OpencvReader: no FPS in metadata for {}", path);
        }

        tracing::info!(
            "OpencvReader: opened {}, duration={:.2}s, fps={:.2}, stream_frames={}, size={}x{}",
            path,
            super::duration_secs(raw_count, fps),
            fps,
            raw_count,
            width,
            height
        );

        Ok(Self {
            capture,
            source_fps: fps,
            total_frames: raw_count,
            frame_size: Size::new(width, height),
        })
    }
}

impl VideoSource for OpencvReader {
    fn source_fps(&self) -> f64 {
        self.source_fps
    }

    fn frame_count(&self) -> usize {
        self.total_frames
    }

    fn frame_size(&self) -> Size {
        self.frame_size
    }

    fn seek_to_msec(&mut self, msec: f64) -> opencv::Result<()> {
        self.capture.set(CAP_PROP_POS_MSEC, msec)?;
        Ok(())
    }

    fn position_msec(&self) -> opencv::Result<f64> {
        self.capture.get(CAP_PROP_POS_MSEC)
    }

    fn read_frame(&mut self) -> opencv::Result<Option<Mat>> {
        let mut frame = Mat::default();
        let success = self.capture.read(&mut frame)?;
        if !success || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file_is_video_open_error() {
        let result = OpencvReader::open("/nonexistent/clip.mp4");
        assert!(matches!(result, Err(AnalysisError::VideoOpen { .. })));
    }
}
