mod cli;
mod error;
mod pipeline;
mod run_artifacts;
mod video;

use anyhow::Result;
use cli::Args;
use pipeline::models::BehaviorModels;
use pipeline::orchestrator::BehaviorAnalyzer;
use run_artifacts::{write_clips_csv_file, write_json, AnalysisOutput, ErrorOutput};

fn run(args: &Args) -> Result<AnalysisOutput> {
    let models = BehaviorModels::load(&args.model_paths()?)?;
    let analyzer = BehaviorAnalyzer::new(&models, args.analysis_config())?;
    let analysis = analyzer.analyze_video(&args.video)?;

    if let Some(path) = &args.clips_csv {
        write_clips_csv_file(&analysis.clips, path)?;
    }

    Ok(AnalysisOutput::from(analysis))
}

fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args = Args::parse_args();

    match run(&args) {
        Ok(output) => write_json(&output, args.output.as_deref()),
        Err(e) => {
            tracing::error!("Analysis failed: {:#}", e);
            write_json(
                &ErrorOutput {
                    error: e.to_string(),
                },
                args.output.as_deref(),
            )?;
            std::process::exit(1);
        }
    }
}
