use crate::error::Error;
use crate::ffmpeg::{EncodeJob, MediaTool};
use crate::frame::Frame;
use crate::model::Upscaler;
use crate::pipeline::chunks::Chunk;
use crate::video::Video;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq)]
pub enum ChunkStatus {
    Skipped,
    Encoded {
        output: PathBuf,
        resolution: Option<(u32, u32)>,
    },
}

pub struct Upscale<'a> {
    media: &'a dyn MediaTool,
    upscaler: &'a dyn Upscaler,
    video: &'a Video,
    frame_rate: f64,
}

impl<'a> Upscale<'a> {
    pub fn new(
        media: &'a dyn MediaTool,
        upscaler: &'a dyn Upscaler,
        video: &'a Video,
        frame_rate: f64,
    ) -> Self {
        Self { media, upscaler, video, frame_rate }
    }

    pub fn execute(&self, chunk: &Chunk) -> Result<ChunkStatus, Error> {
        let output = self.video.chunk_video(chunk.index);
        if output.exists() {
            debug!(chunk = chunk.index, "chunk video {} already exists", output.display());
            return Ok(ChunkStatus::Skipped);
        }

        debug!(
            chunk = chunk.index,
            "processing frames {} to {}", chunk.start_frame, chunk.end_frame
        );
        let result = self.process(chunk, &output);
        self.cleanup(chunk);
        result
    }

    fn process(&self, chunk: &Chunk, output: &Path) -> Result<ChunkStatus, Error> {
        let staging = self.stage(chunk)?;

        let upscaled = self.video.upscaled_chunk_dir(chunk.index);
        Self::recreate_dir(&upscaled)?;
        self.upscaler.upscale(chunk.index, &staging, &upscaled)?;

        let produced = Frame::count(&upscaled)?;
        if produced != chunk.frames() {
            return Err(Error::UpscaleFailed {
                chunk: chunk.index,
                message: format!("expected {} frames, found {}", chunk.frames(), produced),
            });
        }
        let resolution = Frame::dimensions(&upscaled.join(Frame::file_name(chunk.start_frame)));

        self.encode(chunk, &upscaled, output)?;
        Ok(ChunkStatus::Encoded { output: output.to_path_buf(), resolution })
    }

    fn stage(&self, chunk: &Chunk) -> Result<PathBuf, Error> {
        let staging = self.video.staging_dir(chunk.index);
        Self::recreate_dir(&staging)?;
        for index in chunk.frame_indices() {
            std::fs::copy(self.video.frame_path(index), staging.join(Frame::file_name(index)))?;
        }
        debug!(chunk = chunk.index, frames = chunk.frames(), "frames staged");
        Ok(staging)
    }

    // the chunk video only ever appears complete
    fn encode(&self, chunk: &Chunk, upscaled: &Path, output: &Path) -> Result<(), Error> {
        let partial = self.video.partial_chunk_video(chunk.index);
        let job = EncodeJob {
            chunk: chunk.index,
            pattern: upscaled.join(Frame::PATTERN),
            frame_rate: self.frame_rate,
            start_number: chunk.start_frame,
            output: partial.clone(),
        };

        if let Err(e) = self.media.encode(&job) {
            let _ = std::fs::remove_file(&partial);
            return Err(match e {
                Error::ChunkEncodeFailed { .. } => e,
                other => Error::ChunkEncodeFailed { chunk: chunk.index, message: other.to_string() },
            });
        }
        std::fs::rename(&partial, output)?;
        Ok(())
    }

    fn recreate_dir(dir: &Path) -> Result<(), Error> {
        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        std::fs::create_dir_all(dir)?;
        Ok(())
    }

    fn cleanup(&self, chunk: &Chunk) {
        for dir in [self.video.staging_dir(chunk.index), self.video.upscaled_chunk_dir(chunk.index)] {
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(chunk = chunk.index, error = %e, "failed to remove {}", dir.display()),
            }
        }
    }
}
