//! Local transcription backend powered by `whisper-rs` / whisper.cpp.

use hound::WavReader;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::backend::Backend;
use crate::error::{BackendError, Error, Result};
use crate::segments::Transcript;
use crate::source::{CLIP_SAMPLE_RATE, Clip};

/// Backend that runs a whisper.cpp model in-process.
///
/// Model loading is expensive, so it happens exactly once at construction and
/// is amortized across every chunk of the run. A load failure is fatal before
/// any work begins.
pub struct WhisperLocalBackend {
    ctx: WhisperContext,
}

impl WhisperLocalBackend {
    /// Load a whisper.cpp model from disk.
    pub fn new(model_path: &str) -> Result<Self> {
        if model_path.trim().is_empty() {
            return Err(Error::Config("model path must be provided".into()));
        }

        let ctx_params = WhisperContextParameters::default();
        let ctx = WhisperContext::new_with_params(model_path, ctx_params).map_err(|err| {
            BackendError::ModelLoad(format!("could not load model from '{model_path}': {err}"))
        })?;

        Ok(Self { ctx })
    }

    /// Access the underlying Whisper context.
    pub fn context(&self) -> &WhisperContext {
        &self.ctx
    }
}

impl Backend for WhisperLocalBackend {
    fn transcribe(&mut self, clip: &Clip, language: Option<&str>) -> Result<Transcript> {
        let samples = read_clip_samples(clip)?;

        // A clip past the end of the recording, or one that is pure silence,
        // yields empty text rather than an error.
        if samples.is_empty() {
            return Ok(Transcript::Text(String::new()));
        }

        let params = build_full_params(language);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|err| BackendError::Other(format!("failed to create whisper state: {err}")))?;

        state
            .full(params, &samples)
            .map_err(|err| BackendError::Other(format!("whisper inference failed: {err}")))?;

        let mut text = String::new();
        for segment in state.as_iter() {
            let seg_text = segment
                .to_str()
                .map_err(|err| BackendError::Other(format!("failed to read segment text: {err}")))?;
            text.push_str(seg_text);
        }

        Ok(Transcript::Text(text))
    }

    fn name(&self) -> &'static str {
        "whisper-local"
    }
}

/// Read the extracted clip back into normalized mono `f32` samples.
///
/// The source always writes mono s16le at [`CLIP_SAMPLE_RATE`], so anything
/// else here means the clip file was tampered with or the extraction went
/// wrong.
fn read_clip_samples(clip: &Clip) -> Result<Vec<f32>> {
    let mut reader = WavReader::open(&clip.path).map_err(|err| {
        Error::Decode(format!(
            "failed to read clip {}: {err}",
            clip.path.display()
        ))
    })?;

    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(Error::Decode(format!(
            "expected mono clip, got {} channels",
            spec.channels
        )));
    }
    if spec.sample_rate != CLIP_SAMPLE_RATE {
        return Err(Error::Decode(format!(
            "expected {CLIP_SAMPLE_RATE} Hz clip, got {} Hz",
            spec.sample_rate
        )));
    }

    let mut samples = Vec::new();
    for sample in reader.samples::<i16>() {
        let pcm =
            sample.map_err(|err| Error::Decode(format!("failed to read clip samples: {err}")))?;
        samples.push(pcm as f32 / i16::MAX as f32);
    }

    Ok(samples)
}

fn build_full_params<'a>(language: Option<&'a str>) -> FullParams<'a, 'a> {
    let mut params = FullParams::new(SamplingStrategy::BeamSearch {
        beam_size: 5,
        patience: 1.0,
    });

    params.set_n_threads(num_cpus::get() as i32);
    params.set_translate(false);
    params.set_language(language);
    params.set_no_context(true);
    params.set_single_segment(false);

    params.set_print_progress(false);
    params.set_print_special(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::ChunkRange;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use std::path::{Path, PathBuf};

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, samples: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn clip(path: PathBuf) -> Clip {
        Clip {
            path,
            range: ChunkRange {
                start_ms: 0,
                end_ms: 1_000,
            },
        }
    }

    #[test]
    fn reads_mono_16k_clips_as_normalized_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        write_wav(&path, 1, CLIP_SAMPLE_RATE, &[0, i16::MAX, -16_384]);

        let samples = read_clip_samples(&clip(path)).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[1], 1.0);
        assert!((samples[2] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn rejects_stereo_clips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, CLIP_SAMPLE_RATE, &[0, 0, 0, 0]);

        let err = read_clip_samples(&clip(path)).unwrap_err();
        assert!(err.to_string().contains("mono"));
    }

    #[test]
    fn rejects_unexpected_sample_rates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hifi.wav");
        write_wav(&path, 1, 44_100, &[0, 0]);

        let err = read_clip_samples(&clip(path)).unwrap_err();
        assert!(err.to_string().contains("44100 Hz"));
    }

    #[test]
    fn missing_clip_file_is_a_decode_error() {
        let err = read_clip_samples(&clip(PathBuf::from("/no/such/clip.wav"))).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
