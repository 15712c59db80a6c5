//! Output writers for the two transcript formats.
//!
//! Design:
//! - We stream output directly to a `Write` implementation.
//! - Writers are stateful so the document can be built incrementally: each
//!   chunk is flushed as soon as it is written, which bounds data loss on a
//!   mid-run failure to the in-flight chunk.
//! - `close()` is idempotent; writing after close is an error.

use std::io::Write;

use crate::error::{Error, Result};
use crate::prompt::cleanup_prompt;
use crate::reassemble::{SegmentJoin, render_transcript};
use crate::segments::{Transcript, TranscriptSegment};

/// Sink for per-chunk transcription results.
///
/// `index` is 1-based, matching the "Transcription portion N" headers.
pub trait TranscriptWriter {
    fn write_chunk(&mut self, index: usize, transcript: &Transcript) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

/// One portion block: header line, the chunk's text, and a blank line.
///
/// Shared by [`PortionWriter`] and the driver's stdout echo so the file and
/// the console always agree.
pub fn portion_block(index: usize, text: &str) -> String {
    format!("Transcription portion {index}\n{text}\n\n")
}

/// A `TranscriptWriter` that preserves per-chunk boundaries verbatim.
///
/// Each chunk becomes one block:
///
/// ```text
/// Transcription portion 1
/// <text>
///
/// ```
///
/// `close()` appends the fixed cleanup prompt, with the speaker sentence
/// substituted when names were supplied.
pub struct PortionWriter<W: Write> {
    w: W,
    speaker_names: Option<String>,
    closed: bool,
}

impl<W: Write> PortionWriter<W> {
    pub fn new(w: W, speaker_names: Option<String>) -> Self {
        Self {
            w,
            speaker_names,
            closed: false,
        }
    }
}

impl<W: Write> TranscriptWriter for PortionWriter<W> {
    fn write_chunk(&mut self, index: usize, transcript: &Transcript) -> Result<()> {
        if self.closed {
            return Err(Error::msg("cannot write chunk: writer is already closed"));
        }

        self.w
            .write_all(portion_block(index, &transcript.plain_text()).as_bytes())?;

        // Flush now so a failure in a later chunk cannot take this one with it.
        self.w.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.w
            .write_all(cleanup_prompt(self.speaker_names.as_deref()).as_bytes())?;
        self.w.flush()?;

        self.closed = true;
        Ok(())
    }
}

/// A `TranscriptWriter` that merges speaker-labeled segments into one
/// `[MM:SS] Speaker_{id}: {text}` line per speaker turn.
///
/// Segments are buffered until `close()` because reassembly needs to see
/// whether the next segment continues the current speaker's run. No trailing
/// prompt is appended in this mode.
pub struct DiarizedWriter<W: Write> {
    w: W,
    join: SegmentJoin,
    segments: Vec<TranscriptSegment>,
    closed: bool,
}

impl<W: Write> DiarizedWriter<W> {
    pub fn new(w: W, join: SegmentJoin) -> Self {
        Self {
            w,
            join,
            segments: Vec::new(),
            closed: false,
        }
    }
}

impl<W: Write> TranscriptWriter for DiarizedWriter<W> {
    fn write_chunk(&mut self, _index: usize, transcript: &Transcript) -> Result<()> {
        if self.closed {
            return Err(Error::msg("cannot write chunk: writer is already closed"));
        }

        match transcript {
            Transcript::Segments(segments) => self.segments.extend(segments.iter().cloned()),
            // A plain-text result still gets a line; it just has no speaker.
            Transcript::Text(text) => self.segments.push(TranscriptSegment {
                speaker: None,
                text: text.clone(),
                start_ms: 0,
            }),
        }

        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.w
            .write_all(render_transcript(&self.segments, self.join).as_bytes())?;
        self.w.flush()?;

        self.closed = true;
        Ok(())
    }
}
