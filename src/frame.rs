use crate::error::Error;

use std::path::Path;

pub struct Frame;

impl Frame {
    pub const PREFIX: &'static str = "frame_";
    pub const EXTENSION: &'static str = ".png";
    /// printf-style pattern understood by the image2 muxer/demuxer.
    pub const PATTERN: &'static str = "frame_%06d.png";

    pub fn file_name(index: usize) -> String {
        format!("{}{:06}{}", Self::PREFIX, index, Self::EXTENSION)
    }

    pub fn parse_index(file_name: &str) -> Option<usize> {
        file_name
            .strip_prefix(Self::PREFIX)?
            .strip_suffix(Self::EXTENSION)
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))?
            .parse()
            .ok()
    }

    pub fn count(dir: &Path) -> Result<usize, Error> {
        if !dir.is_dir() {
            return Ok(0);
        }
        let count = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(Self::parse_index)
                    .is_some()
            })
            .count();
        Ok(count)
    }

    pub fn dimensions(path: &Path) -> Option<(u32, u32)> {
        image::image_dimensions(path).ok()
    }
}
