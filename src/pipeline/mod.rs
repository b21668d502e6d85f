mod chunks;
mod extract;
mod merge;
mod progress;
mod upscale;

pub use chunks::{Chunk, ChunkPlan};
pub use extract::{Extract, FrameSet};
pub use merge::Merge;
pub use progress::{Progress, ProgressTracker};
pub use upscale::{ChunkStatus, Upscale};

use crate::config::Config;
use crate::error::Error;
use crate::ffmpeg::MediaTool;
use crate::frame::Frame;
use crate::model::Upscaler;
use crate::video::Video;

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, info, warn};

#[derive(Debug, Default)]
pub struct RunReport {
    pub completed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, Error)>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Pipeline<'a> {
    media: &'a dyn MediaTool,
    upscaler: &'a dyn Upscaler,
    config: &'a Config,
}

impl<'a> Pipeline<'a> {
    pub fn new(media: &'a dyn MediaTool, upscaler: &'a dyn Upscaler, config: &'a Config) -> Self {
        Self { media, upscaler, config }
    }

    pub fn execute(&self, inputs: &[PathBuf]) -> RunReport {
        let mut report = RunReport::default();
        for input in inputs {
            info!(input = %input.display(), "processing");
            match self.process(input) {
                Ok(output) => report.completed.push(output),
                Err(e) => {
                    error!(input = %input.display(), error = %e, "skipping file");
                    report.failed.push((input.clone(), e));
                }
            }
        }
        report
    }

    pub fn process(&self, input: &Path) -> Result<PathBuf, Error> {
        let video = Video::new(input, &self.config.workdir)?;
        let frames = Extract::execute(self.media, &video)?;
        let plan = ChunkPlan::new(frames.total_frames, frames.frame_rate)?;
        info!(
            total_frames = plan.total_frames(),
            frames_per_chunk = plan.frames_per_chunk(),
            chunks = plan.chunk_count(),
            "chunk plan ready"
        );

        std::fs::create_dir_all(video.upscaled_root())?;
        let options = format!(
            "[model: {}] [encoder: {}]",
            self.upscaler, self.config.encoder.video_codec
        );
        let mut progress = Progress::new(&video, plan.total_frames(), options, self.config.progress);
        let source_resolution = Frame::dimensions(&video.frame_path(1));
        let mut resolution_shown = false;

        let upscale = Upscale::new(self.media, self.upscaler, &video, frames.frame_rate);
        let mut failed = Vec::new();
        for chunk in plan.clone() {
            let started = Instant::now();
            match upscale.execute(&chunk) {
                Ok(ChunkStatus::Skipped) => progress.skip(&chunk),
                Ok(ChunkStatus::Encoded { output, resolution }) => {
                    if let (false, Some(source), Some(upscaled)) = (resolution_shown, source_resolution, resolution) {
                        progress.set_resolution(source, upscaled);
                        resolution_shown = true;
                    }
                    progress.suspend(|| {
                        info!(chunk = chunk.index, "successfully generated {}", output.display());
                    });
                    progress.record(&chunk, started.elapsed());
                }
                Err(e) => {
                    progress.suspend(|| warn!(chunk = chunk.index, error = %e, "chunk failed"));
                    failed.push(chunk.index);
                    progress.record(&chunk, started.elapsed());
                }
            }
        }
        progress.finish();

        if !failed.is_empty() {
            warn!(?failed, "chunks failed in this run");
        }
        let output = Merge::new(self.media, &video, self.config.allow_gaps).execute(plan.chunk_count())?;

        for dir in [video.frames_dir(), video.upscaled_root()] {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                warn!(error = %e, "failed to remove {}", dir.display());
            }
        }
        Ok(output)
    }
}
