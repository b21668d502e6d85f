use crate::error::Error;

use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct UpscalerConfig {
    pub binary: PathBuf,
    pub model: String,
    pub denoise_level: i32,
    pub tile_size: u32,
    pub compression: u32,
    pub threads: Option<String>,
    pub scale: Option<u32>,
    pub gpu: Option<String>,
}

impl Default for UpscalerConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("./realcugan-ncnn-vulkan"),
            model: String::from("models-pro"),
            denoise_level: 3,
            tile_size: 5000,
            compression: 2,
            threads: None,
            scale: None,
            gpu: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EncoderConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub video_codec: String,
    pub pixel_format: String,
    pub audio_codec: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            video_codec: String::from("libx264"),
            pixel_format: String::from("yuv420p"),
            audio_codec: String::from("aac"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub inputs: Vec<PathBuf>,
    pub workdir: PathBuf,
    pub allow_gaps: bool,
    pub progress: bool,
    pub upscaler: UpscalerConfig,
    pub encoder: EncoderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            workdir: PathBuf::from("."),
            allow_gaps: false,
            progress: true,
            upscaler: UpscalerConfig::default(),
            encoder: EncoderConfig::default(),
        }
    }
}

impl Config {
    const FORMATS: &'static [&'static str] = &["mp4", "mov", "mkv", "webm", "avi", "flv"];

    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, Error> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(-1..=3).contains(&self.upscaler.denoise_level) {
            return Err(Error::Config(format!(
                "denoise_level must be between -1 and 3, got {}",
                self.upscaler.denoise_level
            )));
        }
        if let Some(scale) = self.upscaler.scale {
            if ![1, 2, 3, 4].contains(&scale) {
                return Err(Error::Config(format!("scale must be 1, 2, 3, or 4, got {}", scale)));
            }
        }
        if self.encoder.video_codec.is_empty() || self.encoder.audio_codec.is_empty() {
            return Err(Error::Config("codecs cannot be empty".to_string()));
        }
        if !self.workdir.is_dir() {
            return Err(Error::Config(format!(
                "working directory does not exist: {}",
                self.workdir.display()
            )));
        }
        Ok(())
    }

    /// Expands the configured inputs into the ordered list of files to process.
    /// Directories contribute their supported video files in name order.
    pub fn input_files(&self) -> Result<Vec<PathBuf>, Error> {
        let mut files = Vec::new();
        for input in &self.inputs {
            if input.is_dir() {
                let mut entries = std::fs::read_dir(input)?
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|path| Self::is_supported(path))
                    .collect::<Vec<_>>();
                entries.sort();
                files.extend(entries);
            } else if input.is_file() {
                files.push(input.clone());
            } else {
                return Err(Error::InvalidInputPath(input.clone()));
            }
        }

        if files.is_empty() {
            return Err(Error::InputFilesNotFound);
        }

        // every intermediate artifact is named after the file stem
        let mut stems = std::collections::HashMap::new();
        for file in &files {
            let stem = file.file_stem().map(|stem| stem.to_os_string()).unwrap_or_default();
            if let Some(previous) = stems.insert(stem, file.clone()) {
                return Err(Error::Config(format!(
                    "{} and {} share a base name and would overwrite each other's chunks",
                    previous.display(),
                    file.display()
                )));
            }
        }
        Ok(files)
    }

    fn is_supported(path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .and_then(std::ffi::OsStr::to_str)
                .map(str::to_lowercase)
                .is_some_and(|ext| Self::FORMATS.contains(&ext.as_str()))
    }
}
