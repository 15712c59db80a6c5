//! Audio source loading and sub-clip extraction.
//!
//! Decoding is delegated entirely to external tools: `ffprobe` reports the
//! total duration, and `ffmpeg` re-encodes each requested time range into a
//! small mono 16 kHz WAV clip that every backend can consume (whisper.cpp
//! reads it directly; the cloud backends upload it as-is).
//!
//! The clip is written to one fixed per-run temporary filename that is
//! overwritten on every call. Callers must fully consume a clip before
//! requesting the next one; the pipeline is strictly sequential, so this is
//! an invariant rather than a hazard.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};
use crate::planner::ChunkRange;

/// Sample rate of extracted clips. whisper.cpp expects 16 kHz mono.
pub const CLIP_SAMPLE_RATE: u32 = 16_000;

/// A sub-range of the source audio, materialized on disk.
///
/// Clips from [`ClipSource::extract`] point at a transient file that is
/// overwritten by the next call; clips from [`ClipSource::whole`] point at
/// the original input and must not be modified or removed.
#[derive(Debug, Clone)]
pub struct Clip {
    pub path: PathBuf,
    pub range: ChunkRange,
}

/// The seam between the pipeline driver and the audio decoder.
///
/// [`FfmpegSource`] is the production implementation; tests drive the
/// pipeline with in-memory fakes.
pub trait ClipSource {
    /// Total duration of the source, in milliseconds.
    fn duration_ms(&self) -> u64;

    /// Extract `[start_ms, end_ms)` into a clip. Ranges past the end of the
    /// source are clamped by the encoder; the planner never requests one.
    fn extract(&mut self, range: ChunkRange) -> Result<Clip>;

    /// Hand over the entire recording as one clip without re-encoding.
    ///
    /// Used by diarizing backends, which submit the whole (typically
    /// compressed) file in a single upload; extracting it to PCM WAV first
    /// would inflate the upload by an order of magnitude.
    fn whole(&mut self) -> Result<Clip>;
}

impl<S: ClipSource + ?Sized> ClipSource for &mut S {
    fn duration_ms(&self) -> u64 {
        (**self).duration_ms()
    }

    fn extract(&mut self, range: ChunkRange) -> Result<Clip> {
        (**self).extract(range)
    }

    fn whole(&mut self) -> Result<Clip> {
        (**self).whole()
    }
}

/// An audio source backed by `ffprobe`/`ffmpeg` subprocesses.
pub struct FfmpegSource {
    input: PathBuf,
    duration_ms: u64,
    clip_path: PathBuf,
}

impl FfmpegSource {
    /// Open an audio file and probe its duration.
    ///
    /// The caller (the pipeline driver) has already verified the path exists;
    /// a file `ffprobe` cannot parse surfaces as a `Decode` error.
    pub fn open(input: &Path) -> Result<Self> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(input)
            .output()
            .map_err(|err| spawn_error("ffprobe", err))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Decode(format!(
                "ffprobe could not read {}: {}",
                input.display(),
                stderr.trim()
            )));
        }

        let duration_ms = parse_duration_ms(&String::from_utf8_lossy(&output.stdout))?;
        debug!(input = %input.display(), duration_ms, "probed audio source");

        // One fixed clip filename per run, overwritten on every extract call.
        // The PID suffix keeps concurrent runs on the same machine apart.
        let clip_path = std::env::temp_dir().join(format!(
            "longform_clip_{}.wav",
            std::process::id()
        ));

        Ok(Self {
            input: input.to_owned(),
            duration_ms,
            clip_path,
        })
    }

    /// The transient clip path used by this source.
    pub fn clip_path(&self) -> &Path {
        &self.clip_path
    }
}

impl ClipSource for FfmpegSource {
    fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    fn extract(&mut self, range: ChunkRange) -> Result<Clip> {
        let args = extract_args(&self.input, range, &self.clip_path);

        let output = Command::new("ffmpeg")
            .args(&args)
            .output()
            .map_err(|err| spawn_error("ffmpeg", err))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Decode(format!(
                "ffmpeg failed to extract [{}ms, {}ms) from {}: {}",
                range.start_ms,
                range.end_ms,
                self.input.display(),
                stderr.trim()
            )));
        }

        Ok(Clip {
            path: self.clip_path.clone(),
            range,
        })
    }

    fn whole(&mut self) -> Result<Clip> {
        Ok(Clip {
            path: self.input.clone(),
            range: ChunkRange {
                start_ms: 0,
                end_ms: self.duration_ms,
            },
        })
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        // The clip is transient; nothing to report if it was never written.
        let _ = std::fs::remove_file(&self.clip_path);
    }
}

/// Build the ffmpeg argument list for extracting one clip.
///
/// `-ss`/`-t` select the range; the output is mono s16le at
/// [`CLIP_SAMPLE_RATE`], and `-y` overwrites the previous clip.
fn extract_args(input: &Path, range: ChunkRange, out: &Path) -> Vec<String> {
    vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-ss".into(),
        format_seconds(range.start_ms),
        "-t".into(),
        format_seconds(range.len_ms()),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-ac".into(),
        "1".into(),
        "-ar".into(),
        CLIP_SAMPLE_RATE.to_string(),
        "-c:a".into(),
        "pcm_s16le".into(),
        "-y".into(),
        out.to_string_lossy().into_owned(),
    ]
}

fn format_seconds(ms: u64) -> String {
    format!("{:.3}", ms as f64 / 1000.0)
}

fn parse_duration_ms(raw: &str) -> Result<u64> {
    let seconds: f64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::Decode(format!("ffprobe returned an unparseable duration: {raw:?}")))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(Error::Decode(format!(
            "ffprobe returned an invalid duration: {raw:?}"
        )));
    }

    Ok((seconds * 1000.0).round() as u64)
}

fn spawn_error(tool: &str, err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        Error::DependencyMissing(format!(
            "{tool} was not found in PATH; install ffmpeg and try again"
        ))
    } else {
        Error::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fractional_durations_to_milliseconds() {
        assert_eq!(parse_duration_ms("12.345\n").unwrap(), 12_345);
        assert_eq!(parse_duration_ms("0").unwrap(), 0);
        assert_eq!(parse_duration_ms("1303.9996").unwrap(), 1_304_000);
    }

    #[test]
    fn rejects_garbage_durations() {
        assert!(parse_duration_ms("N/A").is_err());
        assert!(parse_duration_ms("").is_err());
        assert!(parse_duration_ms("-5.0").is_err());
    }

    #[test]
    fn extract_args_select_range_and_clip_format() {
        let range = ChunkRange {
            start_ms: 595_000,
            end_ms: 1_195_000,
        };
        let args = extract_args(Path::new("in.m4a"), range, Path::new("/tmp/clip.wav"));

        let joined = args.join(" ");
        assert!(joined.contains("-ss 595.000 -t 600.000 -i in.m4a"));
        assert!(joined.contains("-ac 1 -ar 16000 -c:a pcm_s16le -y /tmp/clip.wav"));
    }
}
