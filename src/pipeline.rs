//! The pipeline driver: chunk → extract → transcribe → write, sequentially.
//!
//! We expose a single entry point (`Pipeline`) that wires up the chunk
//! planner, the audio source, a backend, and a transcript writer.
//!
//! The intent is:
//! - The backend is constructed once (model loading is expensive) and reused
//!   across every chunk.
//! - Each chunk's text is flushed to the output before the next chunk starts,
//!   so a mid-run failure loses at most the chunk that was in flight.
//! - Execution is strictly single-threaded and synchronous; the only shared
//!   resources are the transient clip file and the output handle, both owned
//!   here for the run's lifetime.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::opts::Opts;
use crate::planner::{self, ChunkRange};
use crate::source::{ClipSource, FfmpegSource};
use crate::writer::{DiarizedWriter, PortionWriter, TranscriptWriter, portion_block};

/// Summary of a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// Number of chunks transcribed (at most 1 for diarized runs).
    pub chunks: usize,

    /// Where the transcript was written.
    pub output_path: PathBuf,
}

/// The transcription pipeline, generic over its backend.
pub struct Pipeline<B: Backend> {
    backend: B,
}

impl<B: Backend> Pipeline<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    /// Access the configured backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run the whole pipeline against an audio file on disk.
    ///
    /// The input path is validated first: a missing file fails before the
    /// output file is created or truncated. The output path is derived
    /// deterministically as `<input-dir>/<input-stem>_transcript.txt` and
    /// truncated on every run.
    pub fn run(&mut self, input: &Path, opts: &Opts) -> Result<RunReport> {
        if !input.is_file() {
            return Err(Error::Config(format!(
                "the file {} does not exist",
                input.display()
            )));
        }

        let source = FfmpegSource::open(input)?;
        let output_path = transcript_path(input);
        let out = File::create(&output_path)?;

        info!(
            input = %input.display(),
            output = %output_path.display(),
            backend = self.backend.name(),
            "starting transcription run"
        );

        let chunks = self.run_with(source, BufWriter::new(out), opts)?;

        info!(chunks, output = %output_path.display(), "transcription run complete");

        Ok(RunReport {
            chunks,
            output_path,
        })
        // The transient clip file is removed when `source` drops.
    }

    /// Drive the chunk loop against any source and output sink.
    ///
    /// Split out from [`run`](Self::run) so tests can substitute in-memory
    /// sources and writers. Returns the number of chunks transcribed.
    pub fn run_with<S, W>(&mut self, mut source: S, out: W, opts: &Opts) -> Result<usize>
    where
        S: ClipSource,
        W: Write,
    {
        let total_ms = source.duration_ms();

        if self.backend.diarized() {
            let mut writer = DiarizedWriter::new(out, opts.join);
            let run = self.run_whole(&mut source, &mut writer, opts);
            return merge_run_and_close(run, writer.close());
        }

        let plan = planner::plan(total_ms, opts.chunk_len_ms, opts.overlap_ms)?;
        let mut writer = PortionWriter::new(out, opts.speaker_names.clone());
        let run = self.run_chunks(&mut source, &mut writer, plan, opts);
        merge_run_and_close(run, writer.close())
    }

    /// Submit the entire recording in one call, as diarizing backends expect.
    ///
    /// The clip is the original input file, not a re-encoded WAV: the service
    /// chunks internally, accepts compressed containers directly, and a PCM
    /// copy of a long recording would blow past upload limits. Segment
    /// offsets are therefore global. An empty recording makes no call at all;
    /// closing the writer renders the placeholder document.
    fn run_whole<S: ClipSource>(
        &mut self,
        source: &mut S,
        writer: &mut dyn TranscriptWriter,
        opts: &Opts,
    ) -> Result<usize> {
        if source.duration_ms() == 0 {
            return Ok(0);
        }

        let clip = source.whole()?;
        debug!(
            clip = %clip.path.display(),
            backend = self.backend.name(),
            "submitting whole recording"
        );

        let transcript = self.backend.transcribe(&clip, opts.language.as_deref())?;
        writer.write_chunk(1, &transcript)?;
        Ok(1)
    }

    fn run_chunks<S: ClipSource>(
        &mut self,
        source: &mut S,
        writer: &mut dyn TranscriptWriter,
        plan: impl Iterator<Item = ChunkRange>,
        opts: &Opts,
    ) -> Result<usize> {
        let mut chunks = 0;

        for (i, range) in plan.enumerate() {
            let index = i + 1;
            self.process_chunk(source, writer, index, range, opts)
                .map_err(|err| Error::chunk(index, err))?;
            chunks += 1;
        }

        Ok(chunks)
    }

    fn process_chunk<S: ClipSource>(
        &mut self,
        source: &mut S,
        writer: &mut dyn TranscriptWriter,
        index: usize,
        range: ChunkRange,
        opts: &Opts,
    ) -> Result<()> {
        debug!(
            index,
            start_ms = range.start_ms,
            end_ms = range.end_ms,
            backend = self.backend.name(),
            "processing chunk"
        );

        let clip = source.extract(range)?;
        let transcript = self.backend.transcribe(&clip, opts.language.as_deref())?;

        // Echo each portion as it completes; chunks take minutes and a
        // silent run reads as a hang.
        print!("{}", portion_block(index, &transcript.plain_text()));

        writer.write_chunk(index, &transcript)
    }
}

/// `<input-dir>/<input-stem>_transcript.txt`
fn transcript_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}_transcript.txt"))
}

fn merge_run_and_close(run: Result<usize>, close: Result<()>) -> Result<usize> {
    match (run, close) {
        (Ok(chunks), Ok(())) => Ok(chunks),
        (Ok(_), Err(close_err)) => Err(close_err),
        // Prefer the run error; the close failure is almost always a symptom.
        (Err(err), _) => Err(err),
    }
}
