use crate::pipeline::types::TimeWindow;

// Absorbs rounding in `frame_count / fps` durations.
const EPSILON: f64 = 1e-9;

/// Tile `[0, duration]` with fixed-length windows advancing by
/// `clip_duration - overlap`.
///
/// Windows never run past `duration`. If none fits and the video is longer
/// than one second, a single `(0, duration)` window covers it instead.
/// Callers validate `0 <= overlap < clip_duration` beforehand.
pub fn clip_windows(duration: f64, clip_duration: f64, overlap: f64) -> Vec<TimeWindow> {
    let mut windows = Vec::new();
    if !(duration > 0.0) || !(clip_duration > 0.0) {
        return windows;
    }

    let stride = clip_duration - overlap;
    if stride > 0.0 {
        // Starts are computed from the index so strides don't accumulate error.
        let mut i = 0usize;
        loop {
            let start = i as f64 * stride;
            if start + clip_duration > duration + EPSILON {
                break;
            }
            windows.push(TimeWindow::new(start, start + clip_duration));
            i += 1;
        }
    }

    if windows.is_empty() && duration > 1.0 {
        windows.push(TimeWindow::new(0.0, duration));
    }

    windows
}
