use crate::config::Config;
use crate::error::Error;

use std::path::PathBuf;

use clap::Parser;

/// Upscales videos one minute at a time, resuming from finished chunks.
#[derive(Debug, Parser)]
#[command(name = "chunked-upscaler")]
#[command(version)]
#[command(long_about = None)]
pub struct Arguments {
    /// Input video files or directories of videos
    pub inputs: Vec<PathBuf>,

    /// TOML configuration file; command-line flags take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Working directory for frames, chunk videos and the final output
    #[arg(short, long)]
    pub workdir: Option<PathBuf>,

    /// Reassemble even when some chunk videos are missing
    #[arg(long)]
    pub allow_gaps: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Path to the ncnn-vulkan upscaler binary
    #[arg(long)]
    pub upscaler: Option<PathBuf>,

    /// Model directory passed to the upscaler
    #[arg(short, long)]
    pub model: Option<String>,

    /// Denoise level (-1 to 3)
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub denoise_level: Option<i32>,

    /// Tile size, 0 for automatic
    #[arg(short, long)]
    pub tile_size: Option<u32>,

    /// Sync gap compression mode
    #[arg(long)]
    pub compression: Option<u32>,

    /// Upscale ratio (1, 2, 3 or 4)
    #[arg(short, long)]
    pub scale: Option<u32>,

    /// Thread count for load:proc:save
    #[arg(short = 'j', long)]
    pub threads: Option<String>,

    /// GPU device to use
    #[arg(short, long)]
    pub gpu: Option<String>,

    /// Video encoder for chunk videos
    #[arg(short, long)]
    pub encoder: Option<String>,

    #[arg(long)]
    pub pixel_format: Option<String>,

    /// Audio codec of the final output
    #[arg(long)]
    pub audio_codec: Option<String>,

    #[arg(long)]
    pub ffmpeg: Option<PathBuf>,

    #[arg(long)]
    pub ffprobe: Option<PathBuf>,

    /// Logging level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Arguments {
    pub fn into_config(self) -> Result<Config, Error> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if !self.inputs.is_empty() {
            config.inputs = self.inputs;
        }
        if let Some(workdir) = self.workdir {
            config.workdir = workdir;
        }
        config.allow_gaps |= self.allow_gaps;
        if self.no_progress {
            config.progress = false;
        }

        let upscaler = &mut config.upscaler;
        if let Some(binary) = self.upscaler {
            upscaler.binary = binary;
        }
        if let Some(model) = self.model {
            upscaler.model = model;
        }
        if let Some(level) = self.denoise_level {
            upscaler.denoise_level = level;
        }
        if let Some(tile_size) = self.tile_size {
            upscaler.tile_size = tile_size;
        }
        if let Some(compression) = self.compression {
            upscaler.compression = compression;
        }
        if self.scale.is_some() {
            upscaler.scale = self.scale;
        }
        if self.threads.is_some() {
            upscaler.threads = self.threads;
        }
        if self.gpu.is_some() {
            upscaler.gpu = self.gpu;
        }

        let encoder = &mut config.encoder;
        if let Some(codec) = self.encoder {
            encoder.video_codec = codec;
        }
        if let Some(format) = self.pixel_format {
            encoder.pixel_format = format;
        }
        if let Some(codec) = self.audio_codec {
            encoder.audio_codec = codec;
        }
        if let Some(ffmpeg) = self.ffmpeg {
            encoder.ffmpeg = ffmpeg;
        }
        if let Some(ffprobe) = self.ffprobe {
            encoder.ffprobe = ffprobe;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let arguments = Arguments::try_parse_from([
            "chunked-upscaler",
            "a.mp4",
            "b.mkv",
            "-n",
            "-1",
            "-t",
            "0",
            "-s",
            "2",
            "--allow-gaps",
            "--no-progress",
            "-e",
            "libx265",
        ])
        .unwrap();
        let config = arguments.into_config().unwrap();
        assert_eq!(config.inputs, vec![PathBuf::from("a.mp4"), PathBuf::from("b.mkv")]);
        assert_eq!(config.upscaler.denoise_level, -1);
        assert_eq!(config.upscaler.tile_size, 0);
        assert_eq!(config.upscaler.scale, Some(2));
        assert_eq!(config.upscaler.model, "models-pro");
        assert_eq!(config.encoder.video_codec, "libx265");
        assert!(config.allow_gaps);
        assert!(!config.progress);
    }

    #[test]
    fn flags_take_precedence_over_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upscaler.toml");
        std::fs::write(
            &path,
            "inputs = [\"from-file.mp4\"]\n[upscaler]\nmodel = \"models-se\"\ntile_size = 256\n",
        )
        .unwrap();

        let arguments = Arguments::try_parse_from([
            "chunked-upscaler",
            "--config",
            path.to_str().unwrap(),
            "--tile-size",
            "512",
        ])
        .unwrap();
        let config = arguments.into_config().unwrap();
        assert_eq!(config.inputs, vec![PathBuf::from("from-file.mp4")]);
        assert_eq!(config.upscaler.model, "models-se");
        assert_eq!(config.upscaler.tile_size, 512);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let arguments = Arguments::try_parse_from(["chunked-upscaler", "a.mp4", "-s", "8"]).unwrap();
        assert!(matches!(arguments.into_config(), Err(Error::Config(_))));
    }
}
