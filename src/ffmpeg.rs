use crate::config::EncoderConfig;
use crate::error::Error;
use crate::video::Video;

use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tracing::{debug, warn};

#[derive(Clone, Debug)]
pub struct EncodeJob {
    pub chunk: usize,
    pub pattern: PathBuf,
    pub frame_rate: f64,
    pub start_number: usize,
    pub output: PathBuf,
}

pub trait MediaTool: Send + Sync {
    fn extract_frames(&self, input: &Path, pattern: &Path) -> Result<(), Error>;
    fn frame_rate(&self, input: &Path) -> Result<f64, Error>;
    fn has_audio(&self, input: &Path) -> Result<bool, Error>;
    fn encode(&self, job: &EncodeJob) -> Result<(), Error>;
    fn concat(&self, manifest: &Path, output: &Path) -> Result<(), Error>;
    fn extract_audio(&self, input: &Path, output: &Path) -> Result<(), Error>;
    fn mux(&self, video: &Path, audio: Option<&Path>, output: &Path) -> Result<(), Error>;
}

pub struct Ffmpeg {
    config: EncoderConfig,
}

impl Ffmpeg {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    fn program(&self) -> String {
        self.config.ffmpeg.to_string_lossy().into_owned()
    }

    fn run<I, S>(&self, binary: &Path, args: I) -> Result<Output, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(binary);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!(command = ?command, "running");
        command.output().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound if binary == self.config.ffprobe.as_path() => {
                Error::FfprobeNotAvailable
            }
            std::io::ErrorKind::NotFound => Error::FfmpegNotAvailable,
            _ => Error::Io(e),
        })
    }

    fn run_checked<I, S>(&self, args: I) -> Result<Output, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = self.run(&self.config.ffmpeg, args)?;
        if !output.status.success() {
            return Err(Error::command(&self.program(), &output.stderr));
        }
        Ok(output)
    }

    pub fn check(&self) -> Result<(), Error> {
        self.run(&self.config.ffmpeg, ["-hide_banner", "-version"])?;
        self.run(&self.config.ffprobe, ["-hide_banner", "-version"])?;
        Ok(())
    }

    pub fn validate_encoder(&self) -> Result<(), Error> {
        let output = self.run_checked(["-hide_banner", "-encoders"])?;
        let encoders = String::from_utf8_lossy(&output.stdout);
        if !Self::lists_encoder(&encoders, &self.config.video_codec) {
            return Err(Error::UnsupportedEncoder(self.config.video_codec.clone()));
        }
        Ok(())
    }

    fn lists_encoder(encoders: &str, name: &str) -> bool {
        encoders
            .lines()
            .filter_map(|line| line.split_whitespace().nth(1))
            .any(|encoder| encoder == name)
    }

    fn probe_frame_rate(&self, input: &Path) -> Result<Option<f64>, Error> {
        let mut args: Vec<&OsStr> = [
            "-v", "error",
            "-select_streams", "v:0",
            "-show_entries", "stream=r_frame_rate",
            "-of", "default=noprint_wrappers=1:nokey=1",
        ]
        .into_iter()
        .map(OsStr::new)
        .collect();
        args.push(input.as_os_str());

        let output = self.run(&self.config.ffprobe, args)?;
        if !output.status.success() {
            debug!(stderr = %String::from_utf8_lossy(&output.stderr), "ffprobe could not read frame rate");
            return Ok(None);
        }
        let data = String::from_utf8_lossy(&output.stdout);
        Ok(data.lines().find_map(Video::parse_frame_rate))
    }

    fn scan_frame_rate(&self, input: &Path) -> Result<Option<f64>, Error> {
        // Without an output file ffmpeg exits non-zero; only the banner matters.
        let output = self.run(
            &self.config.ffmpeg,
            [OsStr::new("-hide_banner"), OsStr::new("-i"), input.as_os_str()],
        )?;
        let diagnostics = String::from_utf8_lossy(&output.stderr);
        Ok(Video::parse_fps_diagnostics(&diagnostics))
    }

    fn extract_arguments<'a>(input: &'a Path, pattern: &'a Path) -> Vec<Cow<'a, OsStr>> {
        vec![
            Cow::Borrowed(OsStr::new("-hide_banner")),
            Cow::Borrowed(OsStr::new("-y")),
            Cow::Borrowed(OsStr::new("-i")),
            Cow::Borrowed(input.as_os_str()),
            Cow::Borrowed(pattern.as_os_str()),
        ]
    }

    fn encode_arguments<'a>(&'a self, job: &'a EncodeJob) -> Vec<Cow<'a, OsStr>> {
        vec![
            Cow::Borrowed(OsStr::new("-hide_banner")),
            Cow::Borrowed(OsStr::new("-y")),
            Cow::Borrowed(OsStr::new("-framerate")),
            Cow::Owned(job.frame_rate.to_string().into()),
            Cow::Borrowed(OsStr::new("-start_number")),
            Cow::Owned(job.start_number.to_string().into()),
            Cow::Borrowed(OsStr::new("-i")),
            Cow::Borrowed(job.pattern.as_os_str()),
            Cow::Borrowed(OsStr::new("-c:v")),
            Cow::Borrowed(OsStr::new(&self.config.video_codec)),
            Cow::Borrowed(OsStr::new("-pix_fmt")),
            Cow::Borrowed(OsStr::new(&self.config.pixel_format)),
            Cow::Borrowed(OsStr::new("-f")),
            Cow::Borrowed(OsStr::new("mp4")),
            Cow::Borrowed(job.output.as_os_str()),
        ]
    }

    fn concat_arguments<'a>(manifest: &'a Path, output: &'a Path) -> Vec<Cow<'a, OsStr>> {
        vec![
            Cow::Borrowed(OsStr::new("-hide_banner")),
            Cow::Borrowed(OsStr::new("-f")),
            Cow::Borrowed(OsStr::new("concat")),
            Cow::Borrowed(OsStr::new("-safe")),
            Cow::Borrowed(OsStr::new("0")),
            Cow::Borrowed(OsStr::new("-i")),
            Cow::Borrowed(manifest.as_os_str()),
            Cow::Borrowed(OsStr::new("-c")),
            Cow::Borrowed(OsStr::new("copy")),
            Cow::Borrowed(OsStr::new("-y")),
            Cow::Borrowed(output.as_os_str()),
        ]
    }

    fn extract_audio_arguments<'a>(input: &'a Path, output: &'a Path) -> Vec<Cow<'a, OsStr>> {
        vec![
            Cow::Borrowed(OsStr::new("-hide_banner")),
            Cow::Borrowed(OsStr::new("-i")),
            Cow::Borrowed(input.as_os_str()),
            Cow::Borrowed(OsStr::new("-q:a")),
            Cow::Borrowed(OsStr::new("0")),
            Cow::Borrowed(OsStr::new("-map")),
            Cow::Borrowed(OsStr::new("0:a:0")),
            Cow::Borrowed(OsStr::new("-y")),
            Cow::Borrowed(output.as_os_str()),
        ]
    }

    fn mux_arguments<'a>(
        &'a self,
        video: &'a Path,
        audio: Option<&'a Path>,
        output: &'a Path,
    ) -> Vec<Cow<'a, OsStr>> {
        let mut args = vec![
            Cow::Borrowed(OsStr::new("-hide_banner")),
            Cow::Borrowed(OsStr::new("-i")),
            Cow::Borrowed(video.as_os_str()),
        ];
        if let Some(audio) = audio {
            args.push(Cow::Borrowed(OsStr::new("-i")));
            args.push(Cow::Borrowed(audio.as_os_str()));
        }
        args.push(Cow::Borrowed(OsStr::new("-c:v")));
        args.push(Cow::Borrowed(OsStr::new("copy")));
        if audio.is_some() {
            args.push(Cow::Borrowed(OsStr::new("-c:a")));
            args.push(Cow::Borrowed(OsStr::new(&self.config.audio_codec)));
            args.push(Cow::Borrowed(OsStr::new("-strict")));
            args.push(Cow::Borrowed(OsStr::new("experimental")));
        }
        args.push(Cow::Borrowed(OsStr::new("-y")));
        args.push(Cow::Borrowed(output.as_os_str()));
        args
    }
}

impl MediaTool for Ffmpeg {
    fn extract_frames(&self, input: &Path, pattern: &Path) -> Result<(), Error> {
        self.run_checked(Self::extract_arguments(input, pattern)).map(|_| ())
    }

    fn frame_rate(&self, input: &Path) -> Result<f64, Error> {
        if let Some(rate) = self.probe_frame_rate(input)? {
            return Ok(rate);
        }
        warn!(input = %input.display(), "structured probe failed, scanning ffmpeg diagnostics");
        self.scan_frame_rate(input)?
            .ok_or_else(|| Error::FrameRateUnparsable(input.to_path_buf()))
    }

    fn has_audio(&self, input: &Path) -> Result<bool, Error> {
        let mut args: Vec<&OsStr> = [
            "-v", "error",
            "-select_streams", "a",
            "-show_entries", "stream=index",
            "-of", "csv=p=0",
        ]
        .into_iter()
        .map(OsStr::new)
        .collect();
        args.push(input.as_os_str());

        let output = self.run(&self.config.ffprobe, args)?;
        if !output.status.success() {
            return Err(Error::command(&self.config.ffprobe.to_string_lossy(), &output.stderr));
        }
        Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
    }

    fn encode(&self, job: &EncodeJob) -> Result<(), Error> {
        let output = self.run(&self.config.ffmpeg, self.encode_arguments(job))?;
        if !output.status.success() {
            return Err(Error::ChunkEncodeFailed {
                chunk: job.chunk,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn concat(&self, manifest: &Path, output: &Path) -> Result<(), Error> {
        self.run_checked(Self::concat_arguments(manifest, output)).map(|_| ())
    }

    fn extract_audio(&self, input: &Path, output: &Path) -> Result<(), Error> {
        self.run_checked(Self::extract_audio_arguments(input, output)).map(|_| ())
    }

    fn mux(&self, video: &Path, audio: Option<&Path>, output: &Path) -> Result<(), Error> {
        self.run_checked(self.mux_arguments(video, audio, output)).map(|_| ())
    }
}
