use crate::error::ClipError;
use crate::pipeline::types::FrameTensor;
use opencv::core::{self, Mat, Size, CV_8UC3};
use opencv::imgproc;
use opencv::prelude::*;

/// Convert a decoded BGR frame into a `size`x`size` RGB tensor with values in `[0,1]`.
pub fn preprocess_frame(frame: &Mat, size: i32) -> Result<FrameTensor, ClipError> {
    if frame.empty() {
        return Err(ClipError::Preprocess("empty frame".to_string()));
    }
    if frame.typ() != CV_8UC3 {
        return Err(ClipError::Preprocess(format!(
            "expected 8-bit 3-channel frame, got type {}",
            frame.typ()
        )));
    }

    let mut rgb = Mat::default();
    imgproc::cvt_color_def(frame, &mut rgb, imgproc::COLOR_BGR2RGB)?;

    let mut resized = Mat::default();
    imgproc::resize(
        &rgb,
        &mut resized,
        Size::new(size, size),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;

    let resized = if resized.is_continuous() {
        resized
    } else {
        let mut out = core::Mat::default();
        resized.copy_to(&mut out)?;
        out
    };

    let data = resized
        .data_bytes()?
        .iter()
        .map(|&v| v as f32 / 255.0)
        .collect();

    Ok(FrameTensor {
        height: size as usize,
        width: size as usize,
        channels: 3,
        data,
    })
}
