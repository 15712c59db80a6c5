use serde::{Deserialize, Serialize};

/// One recognized span of speech returned by a backend.
///
/// `start_ms` is relative to the clip that was submitted, not the whole
/// recording. No global re-basing is performed anywhere in the pipeline; the
/// diarizing backend submits the entire recording as one clip, so its offsets
/// are effectively global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Speaker label when the backend diarizes; `None` otherwise.
    pub speaker: Option<String>,

    pub text: String,

    /// Start offset within the submitted clip, in milliseconds.
    pub start_ms: u64,
}

/// The result of one backend call.
///
/// Plain-text backends (local whisper, cloud whisper) return `Text`; the
/// diarizing backend returns ordered `Segments` with speaker labels.
#[derive(Debug, Clone, PartialEq)]
pub enum Transcript {
    Text(String),
    Segments(Vec<TranscriptSegment>),
}

impl Transcript {
    /// Flatten to plain text.
    ///
    /// Segment texts are concatenated in order with no separator, matching the
    /// reassembler's default join behavior.
    pub fn plain_text(&self) -> String {
        match self {
            Transcript::Text(text) => text.clone(),
            Transcript::Segments(segments) => {
                segments.iter().map(|seg| seg.text.as_str()).collect()
            }
        }
    }
}
