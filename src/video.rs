use crate::error::Error;
use crate::frame::Frame;

use std::path::{Path, PathBuf};

/// One input file. Every artifact path is keyed by its base name.
#[derive(Clone, Debug)]
pub struct Video {
    pub input: PathBuf,
    pub base_name: String,
    pub file_name: String,
    workdir: PathBuf,
}

impl Video {
    const CHUNK_VIDEO_EXTENSION: &'static str = ".mp4";
    const PARTIAL_EXTENSION: &'static str = ".partial.mp4";
    const OUTPUT_PREFIX: &'static str = "upscaled_";

    pub fn new(input: &Path, workdir: &Path) -> Result<Self, Error> {
        let file_name = input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::InvalidInputPath(input.to_path_buf()))?;
        let base_name = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| Error::InvalidInputPath(input.to_path_buf()))?;

        Ok(Self {
            input: input.to_path_buf(),
            base_name,
            file_name,
            workdir: workdir.to_path_buf(),
        })
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.workdir.join(format!("frames_{}", self.base_name))
    }

    pub fn frames_pattern(&self) -> PathBuf {
        self.frames_dir().join(Frame::PATTERN)
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.frames_dir().join(Frame::file_name(index))
    }

    pub fn upscaled_root(&self) -> PathBuf {
        self.workdir.join(format!("upscaled_frames_{}", self.base_name))
    }

    pub fn upscaled_chunk_dir(&self, chunk: usize) -> PathBuf {
        self.upscaled_root().join(format!("chunk_{}", chunk))
    }

    pub fn staging_dir(&self, chunk: usize) -> PathBuf {
        self.workdir.join(format!("chunk_{}_{}", self.base_name, chunk))
    }

    fn chunk_video_prefix(&self) -> String {
        format!("upscaled_video_chunk_{}_", self.base_name)
    }

    pub fn chunk_video(&self, chunk: usize) -> PathBuf {
        self.workdir.join(format!(
            "{}{}{}",
            self.chunk_video_prefix(),
            chunk,
            Self::CHUNK_VIDEO_EXTENSION
        ))
    }

    /// Where a chunk is encoded before being renamed to [`Video::chunk_video`].
    pub fn partial_chunk_video(&self, chunk: usize) -> PathBuf {
        self.workdir.join(format!(
            "{}{}{}",
            self.chunk_video_prefix(),
            chunk,
            Self::PARTIAL_EXTENSION
        ))
    }

    pub fn parse_chunk_index(&self, file_name: &str) -> Option<usize> {
        file_name
            .strip_prefix(&self.chunk_video_prefix())?
            .strip_suffix(Self::CHUNK_VIDEO_EXTENSION)
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))?
            .parse()
            .ok()
    }

    pub fn manifest(&self) -> PathBuf {
        self.workdir.join(format!("file_list_{}.txt", self.base_name))
    }

    pub fn merged_video(&self) -> PathBuf {
        self.workdir.join(format!("upscaled_video_{}.mp4", self.base_name))
    }

    pub fn audio(&self) -> PathBuf {
        self.workdir.join(format!("audio_{}.aac", self.base_name))
    }

    pub fn output(&self) -> PathBuf {
        self.workdir.join(format!("{}{}", Self::OUTPUT_PREFIX, self.file_name))
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Parses `num/den` (as printed by ffprobe) or a plain decimal.
    pub fn parse_frame_rate(value: &str) -> Option<f64> {
        let value = value.trim();
        let rate = match value.split_once('/') {
            Some((num, den)) => {
                let num = num.trim().parse::<f64>().ok()?;
                let den = den.trim().parse::<f64>().ok()?;
                num / den
            }
            None => value.parse::<f64>().ok()?,
        };
        (rate.is_finite() && rate > 0.0).then_some(rate)
    }

    /// Scans ffmpeg's diagnostic output for the first line mentioning `fps`
    /// and reads the number immediately before the marker.
    pub fn parse_fps_diagnostics(diagnostics: &str) -> Option<f64> {
        let line = diagnostics.lines().find(|line| line.contains("fps"))?;
        let before = line.split("fps").next()?;
        let token = before.split_whitespace().last()?;
        Self::parse_frame_rate(token.trim_end_matches(','))
    }
}
