use crate::error::Error;

use std::ops::RangeInclusive;

/// A contiguous, 1-based, inclusive range of frames processed as one unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub start_frame: usize,
    pub end_frame: usize,
}

impl Chunk {
    pub fn frames(&self) -> usize {
        self.end_frame - self.start_frame + 1
    }

    pub fn frame_indices(&self) -> RangeInclusive<usize> {
        self.start_frame..=self.end_frame
    }
}

/// One minute of footage per chunk, covering `[1, total_frames]`.
#[derive(Clone, Debug)]
pub struct ChunkPlan {
    total_frames: usize,
    frames_per_chunk: usize,
    next_index: usize,
}

impl ChunkPlan {
    const SECONDS_PER_CHUNK: f64 = 60.0;

    pub fn frames_per_minute(frame_rate: f64) -> Result<usize, Error> {
        let frames = (frame_rate * Self::SECONDS_PER_CHUNK).floor();
        if !frames.is_finite() || frames < 1.0 {
            return Err(Error::InvalidFrameRate(frame_rate));
        }
        Ok(frames as usize)
    }

    pub fn new(total_frames: usize, frame_rate: f64) -> Result<Self, Error> {
        Ok(Self::with_chunk_size(total_frames, Self::frames_per_minute(frame_rate)?))
    }

    fn with_chunk_size(total_frames: usize, frames_per_chunk: usize) -> Self {
        Self { total_frames, frames_per_chunk, next_index: 1 }
    }

    pub fn frames_per_chunk(&self) -> usize {
        self.frames_per_chunk
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    pub fn chunk_count(&self) -> usize {
        self.total_frames.div_ceil(self.frames_per_chunk)
    }

    pub fn chunk(&self, index: usize) -> Option<Chunk> {
        if index == 0 {
            return None;
        }
        let start_frame = (index - 1).checked_mul(self.frames_per_chunk)? + 1;
        if start_frame > self.total_frames {
            return None;
        }
        let end_frame = index
            .saturating_mul(self.frames_per_chunk)
            .min(self.total_frames);
        Some(Chunk { index, start_frame, end_frame })
    }
}

impl Iterator for ChunkPlan {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let chunk = self.chunk(self.next_index)?;
        self.next_index += 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.chunk_count().saturating_sub(self.next_index - 1);
        (remaining, Some(remaining))
    }
}
