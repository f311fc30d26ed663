// Run artifact definitions
//
// The JSON document returned to the caller, and the optional per-clip CSV
// export written next to it.

use crate::pipeline::aggregate::AnalysisReport;
use crate::pipeline::orchestrator::VideoAnalysis;
use crate::pipeline::types::{ClipResult, Label, SkippedClip, Summary};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Serialize, Debug, Clone)]
pub struct AnalysisOutput {
    pub video: String,
    pub analyzed_at: DateTime<Utc>,
    pub windows: usize,
    pub clips: Vec<ClipResult>,
    pub skipped: Vec<SkippedClip>,
    pub summary: Summary,
    pub report: AnalysisReport,
}

impl From<VideoAnalysis> for AnalysisOutput {
    fn from(analysis: VideoAnalysis) -> Self {
        Self {
            video: analysis.video,
            analyzed_at: Utc::now(),
            windows: analysis.windows,
            clips: analysis.clips,
            skipped: analysis.skipped,
            summary: analysis.summary,
            report: analysis.report,
        }
    }
}

/// Body written instead of a result when the analysis fails.
#[derive(Serialize, Debug)]
pub struct ErrorOutput {
    pub error: String,
}

/// Pretty-print `value` as JSON to `path`, or stdout when `path` is `None`.
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write results to {:?}", path))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}

/// One row per clip: clip_id, start_time, end_time, <label>..., <label>_prob...
pub fn write_clips_csv<W: Write>(clips: &[ClipResult], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec![
        "clip_id".to_string(),
        "start_time".to_string(),
        "end_time".to_string(),
    ];
    header.extend(Label::ALL.iter().map(|l| l.as_str().to_string()));
    header.extend(Label::ALL.iter().map(|l| format!("{}_prob", l.as_str())));
    csv.write_record(&header)?;

    for clip in clips {
        let mut record = vec![
            clip.clip_id.to_string(),
            format!("{:.3}", clip.window.start()),
            format!("{:.3}", clip.window.end()),
        ];
        record.extend(Label::ALL.iter().map(|l| clip.prediction(*l).to_string()));
        record.extend(
            Label::ALL
                .iter()
                .map(|l| format!("{:.4}", clip.probability(*l))),
        );
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

pub fn write_clips_csv_file(clips: &[ClipResult], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create clip CSV at {:?}", path))?;
    write_clips_csv(clips, file)?;
    tracing::info!("Wrote {} clip rows to {:?}", clips.len(), path);
    Ok(())
}
