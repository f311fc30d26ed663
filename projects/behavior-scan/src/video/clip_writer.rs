// Transient single-clip containers
//
// Frames for one window are encoded to a temporary mp4 matching the source's
// size and frame rate as they are decoded, then read back for feature
// extraction. The file lives in a `TempPath` and is removed when the
// `TransientClip` drops, on success and on every error path.

use super::VideoSource;
use crate::error::ClipError;
use crate::video::opencv_reader::OpencvReader;
use opencv::{
    core::{Mat, Size},
    prelude::*,
    videoio::VideoWriter,
};
use std::path::{Path, PathBuf};
use tempfile::TempPath;

// Field order: the encoder is released before the file is removed.
pub struct TransientClip {
    writer: Option<VideoWriter>,
    path: TempPath,
    frames_written: usize,
}

impl TransientClip {
    /// Open an encoder on a fresh temp file under `dir`.
    pub fn create(dir: &Path, frame_size: Size, fps: f64) -> Result<Self, ClipError> {
        std::fs::create_dir_all(dir)?;
        let path = tempfile::Builder::new()
            .prefix("clip_")
            .suffix(".mp4")
            .tempfile_in(dir)?
            .into_temp_path();

        let path_str = utf8_path(&path)?;
        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = VideoWriter::new(path_str, fourcc, fps, frame_size, true)?;
        if !writer.is_opened()? {
            return Err(ClipError::ClipWrite(format!(
                "encoder refused {} ({}x{} @ {:.2}fps)",
                path_str, frame_size.width, frame_size.height, fps
            )));
        }

        Ok(Self {
            writer: Some(writer),
            path,
            frames_written: 0,
        })
    }

    pub fn append(&mut self, frame: &Mat) -> Result<(), ClipError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ClipError::ClipWrite("clip already finished".to_string()))?;
        writer.write(frame)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Flush and close the encoder. Later appends fail.
    pub fn finish(&mut self) -> Result<(), ClipError> {
        if let Some(mut writer) = self.writer.take() {
            writer.release()?;
        }
        Ok(())
    }

    pub fn path(&self) -> PathBuf {
        self.path.to_path_buf()
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Decode at most `limit` frames from the start of the clip.
    pub fn read_frames(&mut self, limit: usize) -> Result<Vec<Mat>, ClipError> {
        self.finish()?;
        let mut reader = OpencvReader::open(utf8_path(&self.path)?)
            .map_err(|e| ClipError::ClipWrite(e.to_string()))?;

        let mut frames = Vec::with_capacity(limit);
        while frames.len() < limit {
            match reader.read_frame()? {
                Some(frame) => frames.push(frame),
                None => break,
            }
        }
        Ok(frames)
    }
}

fn utf8_path(path: &TempPath) -> Result<&str, ClipError> {
    path.to_str()
        .ok_or_else(|| ClipError::ClipWrite(format!("non-UTF-8 temp path {:?}", path)))
}
