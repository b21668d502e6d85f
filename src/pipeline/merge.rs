use crate::error::Error;
use crate::ffmpeg::MediaTool;
use crate::video::Video;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

pub struct Merge<'a> {
    media: &'a dyn MediaTool,
    video: &'a Video,
    allow_gaps: bool,
}

impl<'a> Merge<'a> {
    pub fn new(media: &'a dyn MediaTool, video: &'a Video, allow_gaps: bool) -> Self {
        Self { media, video, allow_gaps }
    }

    /// Sorted by chunk index, not by name.
    pub fn chunk_videos(video: &Video) -> Result<Vec<(usize, PathBuf)>, Error> {
        let mut chunks = std::fs::read_dir(video.workdir())?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let index = entry.file_name().to_str().and_then(|name| video.parse_chunk_index(name))?;
                Some((index, entry.path()))
            })
            .collect::<Vec<_>>();
        chunks.sort_by_key(|(index, _)| *index);
        Ok(chunks)
    }

    pub fn missing_chunks(present: &[(usize, PathBuf)], planned: usize) -> Vec<usize> {
        (1..=planned)
            .filter(|index| present.binary_search_by_key(index, |(i, _)| *i).is_err())
            .collect()
    }

    pub fn manifest_entry(path: &Path) -> String {
        format!("file '{}'", path.to_string_lossy().replace('\'', "'\\''"))
    }

    pub fn execute(&self, planned: usize) -> Result<PathBuf, Error> {
        let mut chunks = Self::chunk_videos(self.video)?;
        if chunks.iter().any(|(index, _)| *index > planned) {
            warn!(planned, "ignoring chunk videos beyond the planned range");
            chunks.retain(|(index, _)| *index <= planned);
        }

        let missing = Self::missing_chunks(&chunks, planned);
        if !missing.is_empty() {
            if !self.allow_gaps || chunks.is_empty() {
                return Err(Error::ReassemblyGap { missing });
            }
            warn!(?missing, "reassembling with missing chunks");
        }

        let manifest = self.video.manifest();
        let mut content = String::new();
        for (_, path) in &chunks {
            content.push_str(&Self::manifest_entry(&path.canonicalize()?));
            content.push('\n');
        }
        std::fs::write(&manifest, content)?;

        let merged = self.video.merged_video();
        self.media.concat(&manifest, &merged)?;
        info!(chunks = chunks.len(), "chunks concatenated into {}", merged.display());

        let output = self.video.output();
        let audio = self.video.audio();
        let has_audio = self.media.has_audio(&self.video.input)?;
        if has_audio {
            self.media.extract_audio(&self.video.input, &audio)?;
            self.media.mux(&merged, Some(&audio), &output)?;
        } else {
            info!(input = %self.video.input.display(), "no audio stream, muxing video only");
            self.media.mux(&merged, None, &output)?;
        }

        let mut leftovers = chunks.into_iter().map(|(_, path)| path).collect::<Vec<_>>();
        leftovers.extend([merged, manifest]);
        if has_audio {
            leftovers.push(audio);
        }
        for path in leftovers {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(error = %e, "failed to remove {}", path.display());
            }
        }

        info!("final video saved as {}", output.display());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_videos_sort_numerically() {
        let dir = tempfile::tempdir().unwrap();
        let video = Video::new(Path::new("clip.mp4"), dir.path()).unwrap();
        for index in (1..=11).rev() {
            std::fs::write(video.chunk_video(index), b"x").unwrap();
        }
        std::fs::write(video.partial_chunk_video(12), b"x").unwrap();
        std::fs::write(dir.path().join("upscaled_video_chunk_other_3.mp4"), b"x").unwrap();

        let indices = Merge::chunk_videos(&video)
            .unwrap()
            .into_iter()
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        assert_eq!(indices, (1..=11).collect::<Vec<_>>());
    }

    #[test]
    fn missing_chunks_lists_gaps() {
        let present = [(1, PathBuf::from("a")), (3, PathBuf::from("c"))];
        assert_eq!(Merge::missing_chunks(&present, 4), vec![2, 4]);
        assert!(Merge::missing_chunks(&present[..1], 1).is_empty());
    }

    #[test]
    fn manifest_entry_escapes_quotes() {
        assert_eq!(Merge::manifest_entry(Path::new("/w/a.mp4")), "file '/w/a.mp4'");
        assert_eq!(
            Merge::manifest_entry(Path::new("/w/it's.mp4")),
            r"file '/w/it'\''s.mp4'"
        );
    }
}
