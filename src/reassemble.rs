//! Merging of consecutive same-speaker segments into labeled, timestamped lines.
//!
//! A diarizing backend returns one segment per recognized span; a speaker turn
//! usually covers several of them. We scan the segments in order, accumulate
//! text while the speaker label is unchanged, and flush one line per maximal
//! run, stamped with the start offset of the run's *first* segment.

use crate::segments::TranscriptSegment;

/// Rendered when a diarized run produced no segments at all. The output file
/// is never left empty.
pub const EMPTY_PLACEHOLDER: &str = "No transcript segments found.";

/// Label used for segments the backend did not attribute to a speaker.
const UNKNOWN_SPEAKER: &str = "Unknown";

/// How the texts of one speaker run are joined.
///
/// The observed behavior concatenates segment texts with no separator at all,
/// which can glue words together when the backend does not pad its texts. We
/// preserve that as the default rather than silently "fixing" it, and expose
/// `Spaced` for callers that want trimmed, space-separated joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentJoin {
    /// Concatenate segment texts exactly as returned, with no separator.
    #[default]
    Verbatim,

    /// Trim each segment text and join with a single space.
    Spaced,
}

/// One speaker turn: every consecutive segment with the same label, merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassembledLine {
    pub speaker: String,
    pub text: String,

    /// Start offset of the first segment in the run, in milliseconds.
    pub start_ms: u64,
}

impl ReassembledLine {
    /// Render as `[MM:SS] Speaker_{id}: {text}`.
    pub fn render(&self) -> String {
        format!(
            "[{}] Speaker_{}: {}",
            format_timestamp(self.start_ms),
            self.speaker,
            self.text
        )
    }
}

/// Merge consecutive segments sharing a speaker label into one line per run.
///
/// The final run is always flushed; an empty input yields an empty vector
/// (the placeholder line is a rendering concern, see [`render_transcript`]).
pub fn reassemble(segments: &[TranscriptSegment], join: SegmentJoin) -> Vec<ReassembledLine> {
    let mut lines = Vec::new();

    let mut current_speaker: Option<&str> = None;
    let mut current_text = String::new();
    let mut current_start_ms = 0;

    for segment in segments {
        let speaker = segment.speaker.as_deref().unwrap_or(UNKNOWN_SPEAKER);

        if current_speaker.is_some_and(|cur| cur != speaker) {
            lines.push(ReassembledLine {
                speaker: current_speaker.unwrap_or(UNKNOWN_SPEAKER).to_owned(),
                text: std::mem::take(&mut current_text),
                start_ms: current_start_ms,
            });
        }

        if current_speaker != Some(speaker) {
            current_speaker = Some(speaker);
            current_start_ms = segment.start_ms;
        }

        match join {
            SegmentJoin::Verbatim => current_text.push_str(&segment.text),
            SegmentJoin::Spaced => {
                if !current_text.is_empty() {
                    current_text.push(' ');
                }
                current_text.push_str(segment.text.trim());
            }
        }
    }

    if let Some(speaker) = current_speaker {
        lines.push(ReassembledLine {
            speaker: speaker.to_owned(),
            text: current_text,
            start_ms: current_start_ms,
        });
    }

    lines
}

/// Render a diarized transcript as newline-joined speaker-turn lines.
///
/// An empty segment list renders as a single human-readable placeholder.
pub fn render_transcript(segments: &[TranscriptSegment], join: SegmentJoin) -> String {
    let lines = reassemble(segments, join);
    if lines.is_empty() {
        return EMPTY_PLACEHOLDER.to_owned();
    }

    lines
        .iter()
        .map(ReassembledLine::render)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a millisecond offset as `MM:SS`.
///
/// Minutes are not wrapped at the hour: a 90-minute offset renders as `90:00`.
pub fn format_timestamp(ms: u64) -> String {
    let total_seconds = ms / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
