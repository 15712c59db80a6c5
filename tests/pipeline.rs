use std::path::PathBuf;

use longform::backend::Backend;
use longform::error::{BackendError, Error};
use longform::opts::Opts;
use longform::pipeline::Pipeline;
use longform::planner::ChunkRange;
use longform::reassemble::EMPTY_PLACEHOLDER;
use longform::segments::{Transcript, TranscriptSegment};
use longform::source::{Clip, ClipSource};

/// An in-memory source that records which ranges were extracted and whether
/// the whole recording was handed over.
struct FakeSource {
    total_ms: u64,
    extracted: Vec<ChunkRange>,
    whole_calls: usize,
}

impl FakeSource {
    fn new(total_ms: u64) -> Self {
        Self {
            total_ms,
            extracted: Vec::new(),
            whole_calls: 0,
        }
    }
}

impl ClipSource for FakeSource {
    fn duration_ms(&self) -> u64 {
        self.total_ms
    }

    fn extract(&mut self, range: ChunkRange) -> longform::Result<Clip> {
        self.extracted.push(range);
        Ok(Clip {
            path: PathBuf::from("clip.wav"),
            range,
        })
    }

    fn whole(&mut self) -> longform::Result<Clip> {
        self.whole_calls += 1;
        Ok(Clip {
            path: PathBuf::from("recording.m4a"),
            range: ChunkRange {
                start_ms: 0,
                end_ms: self.total_ms,
            },
        })
    }
}

/// A backend that returns one scripted text per call.
struct ScriptedBackend {
    texts: Vec<&'static str>,
    calls: usize,
}

impl ScriptedBackend {
    fn new(texts: Vec<&'static str>) -> Self {
        Self { texts, calls: 0 }
    }
}

impl Backend for ScriptedBackend {
    fn transcribe(&mut self, _clip: &Clip, _language: Option<&str>) -> longform::Result<Transcript> {
        let text = self.texts.get(self.calls).copied().unwrap_or("");
        self.calls += 1;
        Ok(Transcript::Text(text.to_owned()))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// A backend that fails on the given 1-based call.
struct FailingBackend {
    fail_on_call: usize,
    calls: usize,
}

impl Backend for FailingBackend {
    fn transcribe(&mut self, _clip: &Clip, _language: Option<&str>) -> longform::Result<Transcript> {
        self.calls += 1;
        if self.calls == self.fail_on_call {
            return Err(BackendError::RateLimit("simulated 429".into()).into());
        }
        Ok(Transcript::Text(format!("chunk {}", self.calls)))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// A diarizing backend returning fixed speaker-labeled segments.
struct FakeDiarizeBackend {
    segments: Vec<TranscriptSegment>,
    submitted: Vec<PathBuf>,
}

impl Backend for FakeDiarizeBackend {
    fn transcribe(&mut self, clip: &Clip, _language: Option<&str>) -> longform::Result<Transcript> {
        self.submitted.push(clip.path.clone());
        Ok(Transcript::Segments(self.segments.clone()))
    }

    fn name(&self) -> &'static str {
        "fake-diarize"
    }

    fn diarized(&self) -> bool {
        true
    }
}

fn seg(speaker: &str, text: &str, start_ms: u64) -> TranscriptSegment {
    TranscriptSegment {
        speaker: Some(speaker.to_owned()),
        text: text.to_owned(),
        start_ms,
    }
}

fn opts(chunk_len_ms: u64, overlap_ms: u64) -> Opts {
    Opts {
        chunk_len_ms,
        overlap_ms,
        ..Opts::default()
    }
}

#[test]
fn portion_mode_writes_one_block_per_chunk_plus_prompt() -> anyhow::Result<()> {
    // ~21.7 minutes at 10-minute chunks with 5s overlap -> exactly 3 portions.
    let mut source = FakeSource::new(1_300_000);
    let mut out = Vec::new();

    let mut opts = opts(600_000, 5_000);
    opts.speaker_names = Some("Alice and Bob".to_owned());

    let backend = ScriptedBackend::new(vec!["first part", "second part", "third part"]);
    let mut pipeline = Pipeline::with_backend(backend);
    let chunks = pipeline.run_with(&mut source, &mut out, &opts)?;

    assert_eq!(chunks, 3);
    assert_eq!(
        source.extracted,
        vec![
            ChunkRange { start_ms: 0, end_ms: 600_000 },
            ChunkRange { start_ms: 595_000, end_ms: 1_195_000 },
            ChunkRange { start_ms: 1_190_000, end_ms: 1_300_000 },
        ]
    );

    let doc = String::from_utf8(out)?;
    assert!(doc.starts_with(
        "Transcription portion 1\nfirst part\n\n\
         Transcription portion 2\nsecond part\n\n\
         Transcription portion 3\nthird part\n\n"
    ));
    assert_eq!(doc.matches("Transcription portion").count(), 3);
    assert_eq!(doc.matches("You are a helpful assistant.").count(), 1);
    assert!(doc.contains("The speakers are Alice and Bob."));
    Ok(())
}

#[test]
fn failure_reports_the_chunk_index_and_keeps_flushed_output() {
    let mut source = FakeSource::new(1_300_000);
    let mut out = Vec::new();

    let backend = FailingBackend {
        fail_on_call: 2,
        calls: 0,
    };
    let mut pipeline = Pipeline::with_backend(backend);
    let err = pipeline
        .run_with(&mut source, &mut out, &opts(600_000, 5_000))
        .unwrap_err();

    match err {
        Error::Chunk { index, source } => {
            assert_eq!(index, 2);
            assert!(matches!(*source, Error::Backend(BackendError::RateLimit(_))));
        }
        other => panic!("expected a chunk error, got: {other}"),
    }

    // Chunk 1 was flushed before chunk 2 failed; nothing is rolled back.
    let doc = String::from_utf8(out).unwrap();
    assert!(doc.contains("Transcription portion 1\nchunk 1\n\n"));
    assert!(!doc.contains("Transcription portion 2"));
}

#[test]
fn diarized_mode_uploads_the_original_file_once_and_skips_the_prompt() -> anyhow::Result<()> {
    let mut source = FakeSource::new(1_300_000);
    let mut out = Vec::new();

    let backend = FakeDiarizeBackend {
        segments: vec![
            seg("A", "Hi ", 0),
            seg("A", "there.", 1_500),
            seg("B", "Hello.", 4_000),
        ],
        submitted: Vec::new(),
    };
    let mut pipeline = Pipeline::with_backend(backend);
    let chunks = pipeline.run_with(&mut source, &mut out, &Opts::default())?;

    assert_eq!(chunks, 1);
    // The recording goes up as-is; nothing is re-encoded through extract.
    assert_eq!(source.whole_calls, 1);
    assert!(source.extracted.is_empty());
    assert_eq!(
        pipeline.backend().submitted,
        vec![PathBuf::from("recording.m4a")]
    );

    let doc = String::from_utf8(out)?;
    assert_eq!(doc, "[00:00] Speaker_A: Hi there.\n[00:04] Speaker_B: Hello.");
    Ok(())
}

#[test]
fn empty_recording_in_diarized_mode_writes_the_placeholder() -> anyhow::Result<()> {
    let mut source = FakeSource::new(0);
    let mut out = Vec::new();

    let backend = FakeDiarizeBackend {
        segments: Vec::new(),
        submitted: Vec::new(),
    };
    let mut pipeline = Pipeline::with_backend(backend);
    let chunks = pipeline.run_with(&mut source, &mut out, &Opts::default())?;

    // No upload is attempted for zero duration; the document still says so.
    assert_eq!(chunks, 0);
    assert_eq!(source.whole_calls, 0);
    assert!(pipeline.backend().submitted.is_empty());
    assert_eq!(String::from_utf8(out)?, EMPTY_PLACEHOLDER);
    Ok(())
}

#[test]
fn invalid_overlap_fails_before_any_extraction() {
    let mut source = FakeSource::new(1_300_000);
    let mut out = Vec::new();

    let backend = ScriptedBackend::new(vec![]);
    let mut pipeline = Pipeline::with_backend(backend);
    let err = pipeline
        .run_with(&mut source, &mut out, &opts(5_000, 5_000))
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert!(source.extracted.is_empty());
    assert!(out.is_empty());
}

#[test]
fn missing_input_fails_without_touching_the_output_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("does_not_exist.m4a");
    let expected_output = dir.path().join("does_not_exist_transcript.txt");

    let backend = ScriptedBackend::new(vec![]);
    let mut pipeline = Pipeline::with_backend(backend);
    let err = pipeline.run(&input, &Opts::default()).unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("does_not_exist.m4a"));
    assert!(!expected_output.exists());
    Ok(())
}

#[test]
fn empty_recording_produces_prompt_only_output() -> anyhow::Result<()> {
    let mut source = FakeSource::new(0);
    let mut out = Vec::new();

    let backend = ScriptedBackend::new(vec![]);
    let mut pipeline = Pipeline::with_backend(backend);
    let chunks = pipeline.run_with(&mut source, &mut out, &opts(600_000, 5_000))?;

    assert_eq!(chunks, 0);
    let doc = String::from_utf8(out)?;
    assert!(!doc.contains("Transcription portion"));
    assert!(doc.contains("You are a helpful assistant."));
    Ok(())
}
