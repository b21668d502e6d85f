use chunked_video_upscaler::{Arguments, Ffmpeg, Model, Pipeline, RunReport};

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn run(arguments: Arguments) -> Result<RunReport> {
    let config = arguments.into_config().context("invalid configuration")?;
    let inputs = config.input_files()?;

    let ffmpeg = Ffmpeg::new(config.encoder.clone());
    ffmpeg.check()?;
    ffmpeg.validate_encoder()?;
    let model = Model::new(config.upscaler.clone());
    model.check()?;

    info!(files = inputs.len(), "starting with {}", model);
    Ok(Pipeline::new(&ffmpeg, &model, &config).execute(&inputs))
}

fn main() -> ExitCode {
    let arguments = Arguments::parse();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&arguments.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(arguments) {
        Ok(report) => {
            for output in &report.completed {
                info!("completed {}", output.display());
            }
            for (input, e) in &report.failed {
                error!(input = %input.display(), "failed: {}", e);
            }
            if report.is_success() {
                info!("Completed!");
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
