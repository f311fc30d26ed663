// Clip materializer: pulls the raw frames of one time window out of the source
// video and hands the feature stage at most `limit` of them.

use crate::error::ClipError;
use crate::pipeline::types::TimeWindow;
use crate::video::clip_writer::TransientClip;
use crate::video::VideoSource;
use opencv::core::Mat;
use std::path::PathBuf;

/// Supplies the raw frames for a clip window.
pub trait ClipFrameSource {
    fn clip_frames(&mut self, window: &TimeWindow, limit: usize) -> Result<Vec<Mat>, ClipError>;
}

/// Seek to the window start and hand each frame to `on_frame` until the
/// position passes the window end or the stream runs out. Returns the number
/// of frames delivered; it is approximate, depending on the frame rate and on
/// how precisely the decoder seeks.
pub fn read_window_frames<F>(
    source: &mut dyn VideoSource,
    window: &TimeWindow,
    mut on_frame: F,
) -> Result<usize, ClipError>
where
    F: FnMut(&Mat) -> Result<(), ClipError>,
{
    source.seek_to_msec(window.start() * 1000.0)?;

    let mut count = 0;
    while let Some(frame) = source.read_frame()? {
        let position = source.position_msec()? / 1000.0;
        if position > window.end() {
            break;
        }
        on_frame(&frame)?;
        count += 1;
    }
    Ok(count)
}

/// Materializes each window into a transient container under `clip_dir`,
/// then decodes the leading frames back from it.
pub struct ContainerClipSource<S: VideoSource> {
    source: S,
    clip_dir: PathBuf,
}

impl<S: VideoSource> ContainerClipSource<S> {
    pub fn new(source: S, clip_dir: PathBuf) -> Self {
        Self { source, clip_dir }
    }
}

impl<S: VideoSource> ClipFrameSource for ContainerClipSource<S> {
    fn clip_frames(&mut self, window: &TimeWindow, limit: usize) -> Result<Vec<Mat>, ClipError> {
        let clip_dir = &self.clip_dir;
        let frame_size = self.source.frame_size();
        let fps = self.source.source_fps();

        // Opened on the first frame so an empty window never touches the disk.
        let mut clip: Option<TransientClip> = None;
        read_window_frames(&mut self.source, window, |frame| {
            if clip.is_none() {
                clip = Some(TransientClip::create(clip_dir, frame_size, fps)?);
            }
            if let Some(clip) = clip.as_mut() {
                clip.append(frame)?;
            }
            Ok(())
        })?;
        let mut clip = clip.ok_or(ClipError::NoFrames)?;

        tracing::debug!(
            "Materialized {:.2}s window at {:.2}s: {} frames in {:?}",
            window.duration(),
            window.start(),
            clip.frames_written(),
            clip.path()
        );

        // `clip` drops here, removing the container whether or not decoding succeeded.
        clip.read_frames(limit)
    }
}
