use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("FFmpeg is not available on this system")]
    FfmpegNotAvailable,
    #[error("FFprobe is not available on this system")]
    FfprobeNotAvailable,
    #[error("Upscaler binary is not available: {0}")]
    UpscalerNotAvailable(String),
    #[error("The encoder is not supported: {0}")]
    UnsupportedEncoder(String),
    #[error("{program} failed: {message}")]
    CommandFailed { program: String, message: String },
    #[error("No frames extracted from {0}")]
    ExtractionFailed(PathBuf),
    #[error("Unable to determine frame rate of {0}")]
    FrameRateUnparsable(PathBuf),
    #[error("Frame rate {0} is too low to form a chunk")]
    InvalidFrameRate(f64),
    #[error("Upscaling chunk {chunk} failed: {message}")]
    UpscaleFailed { chunk: usize, message: String },
    #[error("Encoding chunk {chunk} failed: {message}")]
    ChunkEncodeFailed { chunk: usize, message: String },
    #[error("Chunks missing from reassembly: {missing:?}")]
    ReassemblyGap { missing: Vec<usize> },
    #[error("The specified input path is invalid: {0}")]
    InvalidInputPath(PathBuf),
    #[error("Input files not found")]
    InputFilesNotFound,
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn command(program: &str, stderr: &[u8]) -> Self {
        let message = String::from_utf8_lossy(stderr)
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("exited with a non-zero status")
            .trim()
            .to_string();
        Error::CommandFailed { program: program.to_string(), message }
    }
}
