use crate::error::{Error, Result};

/// Default chunk length: 10 minutes.
pub const DEFAULT_CHUNK_LEN_MS: u64 = 10 * 60 * 1000;

/// Default overlap between consecutive chunks: 5 seconds.
pub const DEFAULT_OVERLAP_MS: u64 = 5 * 1000;

/// One bounded time-range slice of the source audio.
///
/// Invariant: `start_ms < end_ms`, and `end_ms` never exceeds the source
/// duration. The final chunk of a plan may be shorter than the nominal chunk
/// length when less than one chunk of audio remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl ChunkRange {
    pub fn len_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }
}

/// A lazy, finite sequence of overlapping chunk ranges covering `[0, total_ms)`.
///
/// Produced by [`plan`]; consumed once per run by the pipeline driver.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    total_ms: u64,
    chunk_len_ms: u64,
    step_ms: u64,
    offset_ms: u64,
}

/// Build a chunk plan for a recording of `total_ms` milliseconds.
///
/// Each step yields `[offset, offset + chunk_len)` clipped to `total_ms`; the
/// next offset advances by `chunk_len - overlap`, so adjacent chunks share
/// exactly `overlap_ms` of audio. The sequence terminates once the offset
/// reaches the end of the recording.
///
/// We validate `chunk_len > overlap` up front: a non-positive step would never
/// advance, and an infinite plan is strictly worse than an early, descriptive
/// failure.
pub fn plan(total_ms: u64, chunk_len_ms: u64, overlap_ms: u64) -> Result<ChunkPlan> {
    if chunk_len_ms == 0 {
        return Err(Error::Config("chunk length must be greater than zero".into()));
    }

    if overlap_ms >= chunk_len_ms {
        return Err(Error::Config(format!(
            "overlap ({overlap_ms} ms) must be smaller than the chunk length ({chunk_len_ms} ms)"
        )));
    }

    Ok(ChunkPlan {
        total_ms,
        chunk_len_ms,
        step_ms: chunk_len_ms - overlap_ms,
        offset_ms: 0,
    })
}

impl Iterator for ChunkPlan {
    type Item = ChunkRange;

    fn next(&mut self) -> Option<ChunkRange> {
        if self.offset_ms >= self.total_ms {
            return None;
        }

        let start_ms = self.offset_ms;
        let end_ms = (start_ms + self.chunk_len_ms).min(self.total_ms);
        self.offset_ms += self.step_ms;

        Some(ChunkRange { start_ms, end_ms })
    }
}
