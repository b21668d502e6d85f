#![allow(dead_code)]

use chunked_video_upscaler::config::Config;
use chunked_video_upscaler::error::Error;
use chunked_video_upscaler::ffmpeg::{EncodeJob, MediaTool};
use chunked_video_upscaler::frame::Frame;
use chunked_video_upscaler::model::Upscaler;
use chunked_video_upscaler::video::Video;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Describes a fake input file as `key=value` lines understood by [`FakeMedia`].
pub fn write_input(dir: &Path, name: &str, frames: usize, fps: &str, audio: bool) -> PathBuf {
    let path = dir.join(name);
    let audio = if audio { "yes" } else { "no" };
    std::fs::write(&path, format!("frames={frames}\nfps={fps}\naudio={audio}\n")).unwrap();
    path
}

pub fn config(workdir: &Path) -> Config {
    Config { workdir: workdir.to_path_buf(), progress: false, ..Config::default() }
}

fn field<'a>(input: &'a str, key: &str) -> Option<&'a str> {
    input.lines().find_map(|line| line.strip_prefix(key)?.strip_prefix('='))
}

fn read_input(input: &Path) -> String {
    std::fs::read_to_string(input).unwrap_or_default()
}

/// Contents of frame `index` as written by the fake extractor.
pub fn frame_bytes(index: usize) -> Vec<u8> {
    format!("frame {index}\n").into_bytes()
}

/// What the fake tools produce for a chunk range after upscaling and encoding.
pub fn upscaled_bytes(frames: impl IntoIterator<Item = usize>) -> Vec<u8> {
    frames
        .into_iter()
        .flat_map(|index| [b"up:".to_vec(), frame_bytes(index)].concat())
        .collect()
}

pub fn audio_bytes(input: &Path) -> Vec<u8> {
    format!("audio of {}\n", input.file_name().unwrap().to_string_lossy()).into_bytes()
}

/// A media toolkit working on plain files: chunk videos are the concatenated
/// bytes of their frames and muxing appends the audio bytes.
#[derive(Default)]
pub struct FakeMedia {
    pub fail_encode_at: Mutex<Option<usize>>,
    pub encodes: AtomicUsize,
    pub jobs: Mutex<Vec<(usize, f64)>>,
    pub manifests: Mutex<Vec<String>>,
}

impl FakeMedia {
    pub fn failing_at(start_frame: usize) -> Self {
        Self { fail_encode_at: Mutex::new(Some(start_frame)), ..Self::default() }
    }
}

impl MediaTool for FakeMedia {
    fn extract_frames(&self, input: &Path, pattern: &Path) -> Result<(), Error> {
        let content = read_input(input);
        let frames = field(&content, "frames").and_then(|v| v.parse::<usize>().ok()).unwrap_or(0);
        if frames == 0 {
            return Err(Error::CommandFailed {
                program: "ffmpeg".to_string(),
                message: "Invalid data found when processing input".to_string(),
            });
        }
        let dir = pattern.parent().unwrap();
        for index in 1..=frames {
            std::fs::write(dir.join(Frame::file_name(index)), frame_bytes(index))?;
        }
        if field(&content, "exit") == Some("1") {
            return Err(Error::CommandFailed {
                program: "ffmpeg".to_string(),
                message: "Error while decoding stream #0:0".to_string(),
            });
        }
        Ok(())
    }

    fn frame_rate(&self, input: &Path) -> Result<f64, Error> {
        field(&read_input(input), "fps")
            .and_then(Video::parse_frame_rate)
            .ok_or_else(|| Error::FrameRateUnparsable(input.to_path_buf()))
    }

    fn has_audio(&self, input: &Path) -> Result<bool, Error> {
        Ok(field(&read_input(input), "audio") == Some("yes"))
    }

    fn encode(&self, job: &EncodeJob) -> Result<(), Error> {
        self.encodes.fetch_add(1, Ordering::SeqCst);
        self.jobs.lock().unwrap().push((job.start_number, job.frame_rate));
        if *self.fail_encode_at.lock().unwrap() == Some(job.start_number) {
            return Err(Error::ChunkEncodeFailed { chunk: job.chunk, message: "encoder crashed".to_string() });
        }
        // image2 reads consecutive numbers from start_number until one is missing
        let dir = job.pattern.parent().unwrap();
        let mut bytes = Vec::new();
        let mut index = job.start_number;
        while let Ok(frame) = std::fs::read(dir.join(Frame::file_name(index))) {
            bytes.extend(frame);
            index += 1;
        }
        if index == job.start_number {
            return Err(Error::ChunkEncodeFailed {
                chunk: job.chunk,
                message: format!("could not find file with start number {}", job.start_number),
            });
        }
        std::fs::write(&job.output, bytes)?;
        Ok(())
    }

    fn concat(&self, manifest: &Path, output: &Path) -> Result<(), Error> {
        let content = std::fs::read_to_string(manifest)?;
        self.manifests.lock().unwrap().push(content.clone());
        let mut bytes = Vec::new();
        for line in content.lines() {
            let quoted = line.strip_prefix("file '").and_then(|rest| rest.strip_suffix('\'')).unwrap();
            bytes.extend(std::fs::read(quoted.replace("'\\''", "'"))?);
        }
        std::fs::write(output, bytes)?;
        Ok(())
    }

    fn extract_audio(&self, input: &Path, output: &Path) -> Result<(), Error> {
        std::fs::write(output, audio_bytes(input))?;
        Ok(())
    }

    fn mux(&self, video: &Path, audio: Option<&Path>, output: &Path) -> Result<(), Error> {
        let mut bytes = std::fs::read(video)?;
        if let Some(audio) = audio {
            bytes.extend(std::fs::read(audio)?);
        }
        std::fs::write(output, bytes)?;
        Ok(())
    }
}

/// Prefixes every frame with `up:` and counts the chunks it was asked to do.
#[derive(Default)]
pub struct FakeUpscaler {
    pub calls: AtomicUsize,
    pub fail_chunk: Option<usize>,
    pub chunks: Mutex<Vec<usize>>,
}

impl FakeUpscaler {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Upscaler for FakeUpscaler {
    fn upscale(&self, chunk: usize, input: &Path, output: &Path) -> Result<(), Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.chunks.lock().unwrap().push(chunk);
        if self.fail_chunk == Some(chunk) {
            return Err(Error::UpscaleFailed { chunk, message: "vkQueueSubmit failed".to_string() });
        }
        for entry in std::fs::read_dir(input)? {
            let entry = entry?;
            let bytes = [b"up:".to_vec(), std::fs::read(entry.path())?].concat();
            std::fs::write(output.join(entry.file_name()), bytes)?;
        }
        Ok(())
    }
}

impl fmt::Display for FakeUpscaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fake")
    }
}

/// Names of everything left in `dir`, sorted.
pub fn listing(dir: &Path) -> Vec<String> {
    let mut names = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    names.sort();
    names
}
