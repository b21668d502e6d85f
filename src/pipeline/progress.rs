use crate::pipeline::chunks::Chunk;
use crate::video::Video;

use std::fmt::Write;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressState, ProgressStyle};
use tracing::info;

#[derive(Clone, Debug)]
pub struct ProgressTracker {
    total_frames: usize,
    total_time: Duration,
    processed_frames: usize,
}

impl ProgressTracker {
    pub fn new(total_frames: usize) -> Self {
        Self { total_frames, total_time: Duration::ZERO, processed_frames: 0 }
    }

    pub fn record(&mut self, frames: usize, elapsed: Duration) -> Duration {
        self.total_time += elapsed;
        self.processed_frames += frames;
        self.eta()
    }

    pub fn processed_frames(&self) -> usize {
        self.processed_frames
    }

    pub fn average_time_per_frame(&self) -> Option<Duration> {
        (self.processed_frames > 0)
            .then(|| self.total_time.div_f64(self.processed_frames as f64))
    }

    pub fn eta(&self) -> Duration {
        let remaining = self.total_frames.saturating_sub(self.processed_frames);
        self.average_time_per_frame()
            .map(|average| average.mul_f64(remaining as f64))
            .unwrap_or(Duration::ZERO)
    }
}

pub struct Progress {
    progress_bar: ProgressBar,
    tracker: ProgressTracker,
    options: String,
}

impl Progress {
    pub fn new(video: &Video, total_frames: usize, options: String, visible: bool) -> Self {
        let progress_bar = if visible {
            Self::create_progress_bar(video, total_frames)
        } else {
            ProgressBar::hidden()
        };
        progress_bar.set_message(options.clone());
        Self { progress_bar, tracker: ProgressTracker::new(total_frames), options }
    }

    fn create_progress_bar(video: &Video, total_frames: usize) -> ProgressBar {
        let progress_bar = ProgressBar::new(total_frames as u64);
        let progress_template = "[{elapsed_precise}] [{eta}] [{wide_bar:.white/green}] {pos}/{len} {percent} {msg}";
        let file_template = format!("{} -> {}", video.input.display(), video.output().display());
        let style = ProgressStyle::default_bar()
            .template(&format!("{}\n{}", file_template, progress_template))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░-")
            .with_key("eta", |state: &ProgressState, w: &mut dyn Write| {
                let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
            })
            .with_key("percent", |state: &ProgressState, w: &mut dyn Write| {
                let _ = write!(w, "({:.0}%)", state.fraction() * 100.0);
            });
        progress_bar.set_style(style);
        progress_bar
    }

    pub fn set_resolution(&mut self, source: (u32, u32), upscaled: (u32, u32)) {
        self.options = format!(
            "{} [resolution: {}x{} -> {}x{}]",
            self.options, source.0, source.1, upscaled.0, upscaled.1
        );
        self.progress_bar.set_message(self.options.clone());
    }

    pub fn skip(&self, chunk: &Chunk) {
        self.progress_bar.inc(chunk.frames() as u64);
        self.progress_bar.suspend(|| {
            info!(chunk = chunk.index, "chunk video already exists, skipping");
        });
    }

    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.progress_bar.suspend(f)
    }

    pub fn record(&mut self, chunk: &Chunk, elapsed: Duration) -> Duration {
        let eta = self.tracker.record(chunk.frames(), elapsed);
        self.progress_bar.inc(chunk.frames() as u64);
        self.progress_bar.suspend(|| {
            info!(chunk = chunk.index, "time taken: {:.2} seconds", elapsed.as_secs_f64());
            info!(chunk = chunk.index, "estimated remaining time: {:.2} minutes", eta.as_secs_f64() / 60.0);
        });
        eta
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn finish(&self) {
        self.progress_bar.finish();
    }
}
