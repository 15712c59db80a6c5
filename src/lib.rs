//! `longform` — chunked transcription for long-form audio recordings.
//!
//! This crate provides:
//! - Chunk planning (overlapping fixed-length ranges over a recording)
//! - Audio probing and sub-clip extraction via ffmpeg/ffprobe
//! - Pluggable transcription backends (local whisper.cpp, cloud Whisper,
//!   cloud diarizing API)
//! - Transcript output writers (portion blocks with an LLM-cleanup prompt, or
//!   diarized speaker-turn lines)
//! - Batch re-encoding of voice recordings
//!
//! The library is used by the `longform` and `compress-audio` binaries, with
//! an emphasis on strictly sequential execution and incremental, durable
//! output.

// High-level API (most consumers should start here).
pub mod opts;
pub mod pipeline;

// Chunk planning and audio access.
pub mod planner;
pub mod source;

// Transcription backends.
pub mod backend;
pub mod backends;

// Transcript data, reassembly, and output.
pub mod prompt;
pub mod reassemble;
pub mod segments;
pub mod writer;

// Batch re-encoding.
pub mod convert;

// Errors and logging configuration.
pub mod error;
pub mod logging;

pub use error::{BackendError, Error, Result};
