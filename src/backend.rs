use clap::ValueEnum;

use crate::error::Result;
use crate::segments::Transcript;
use crate::source::Clip;

/// Pluggable speech-recognition backend used by [`crate::pipeline::Pipeline`].
///
/// A backend turns one extracted clip into a [`Transcript`]. Every call is
/// synchronous and blocking; the driver issues exactly one call per chunk and
/// never concurrently, so `&mut self` is enough for backends that keep
/// per-call inference state.
pub trait Backend {
    /// Transcribe a single clip, with an optional language hint
    /// (ISO 639-1 code, e.g. `"en"`).
    fn transcribe(&mut self, clip: &Clip, language: Option<&str>) -> Result<Transcript>;

    /// Short backend name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Whether this backend labels speakers.
    ///
    /// Diarizing backends receive the whole recording in a single range and
    /// their segments are reassembled into speaker-turn lines; all other
    /// backends run the overlapping chunk loop with portion output.
    fn diarized(&self) -> bool {
        false
    }
}

/// The supported backend variants, selected by CLI configuration.
///
/// One pipeline serves all three; the variants differ only in who performs
/// the recognition and in the shape of their results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Local whisper.cpp model via `whisper-rs`.
    Local,

    /// OpenAI-compatible Whisper transcription API.
    Cloud,

    /// OpenAI-compatible diarizing transcription API.
    Diarize,
}
