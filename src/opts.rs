use crate::planner::{DEFAULT_CHUNK_LEN_MS, DEFAULT_OVERLAP_MS};
use crate::reassemble::SegmentJoin;

/// Options that control how a transcription run is performed.
///
/// This struct represents *library-level configuration*, not CLI flags
/// directly. The CLI maps user input into this type so that other frontends
/// (tests, batch jobs) can construct options programmatically.
#[derive(Debug, Clone)]
pub struct Opts {
    /// Optional language hint (e.g. `"en"`, `"es"`).
    ///
    /// When `None`, backends auto-detect the spoken language.
    pub language: Option<String>,

    /// Speaker names substituted into the cleanup prompt, e.g.
    /// `"Alice and Bob"`. When `None` the prompt omits the speaker sentence.
    pub speaker_names: Option<String>,

    /// Nominal chunk length in milliseconds.
    pub chunk_len_ms: u64,

    /// Overlap between consecutive chunks in milliseconds. Must be smaller
    /// than `chunk_len_ms`; the planner validates this before any work begins.
    pub overlap_ms: u64,

    /// How same-speaker segment texts are joined in diarized output.
    pub join: SegmentJoin,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            language: None,
            speaker_names: None,
            chunk_len_ms: DEFAULT_CHUNK_LEN_MS,
            overlap_ms: DEFAULT_OVERLAP_MS,
            join: SegmentJoin::default(),
        }
    }
}
