use crate::error::Error;
use crate::ffmpeg::MediaTool;
use crate::frame::Frame;
use crate::video::Video;

use std::path::PathBuf;

use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct FrameSet {
    pub dir: PathBuf,
    pub total_frames: usize,
    pub frame_rate: f64,
}

pub struct Extract;

impl Extract {
    pub fn execute(media: &dyn MediaTool, video: &Video) -> Result<FrameSet, Error> {
        let dir = video.frames_dir();
        std::fs::create_dir_all(&dir)?;

        let extracted = media.extract_frames(&video.input, &video.frames_pattern());
        let total_frames = Frame::count(&dir)?;

        match extracted {
            Err(e) if total_frames == 0 => {
                warn!(input = %video.input.display(), error = %e, "frame extraction failed");
                return Err(Error::ExtractionFailed(video.input.clone()));
            }
            Err(e) => {
                warn!(input = %video.input.display(), total_frames, error = %e, "extraction exited with an error, keeping the frames it wrote");
            }
            Ok(()) if total_frames == 0 => return Err(Error::ExtractionFailed(video.input.clone())),
            Ok(()) => {}
        }

        if !video.frame_path(total_frames).is_file() {
            warn!(input = %video.input.display(), total_frames, "frame numbering is not contiguous");
            return Err(Error::ExtractionFailed(video.input.clone()));
        }

        let frame_rate = media.frame_rate(&video.input)?;
        info!(input = %video.input.display(), total_frames, frame_rate, "frames extracted");

        Ok(FrameSet { dir, total_frames, frame_rate })
    }
}
