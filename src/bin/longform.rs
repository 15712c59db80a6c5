use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use longform::backend::BackendKind;
use longform::backends::{CloudDiarizeBackend, CloudWhisperBackend, WhisperLocalBackend};
use longform::opts::Opts;
use longform::pipeline::{Pipeline, RunReport};
use longform::reassemble::SegmentJoin;

#[derive(Parser, Debug)]
#[command(name = "longform")]
#[command(about = "Transcribe long audio recordings in overlapping chunks")]
struct Params {
    /// Path to the input audio file.
    input: PathBuf,

    /// Which transcription backend performs the recognition.
    #[arg(short, long, value_enum, default_value_t = BackendKind::Local)]
    backend: BackendKind,

    /// Path to a whisper.cpp model (local backend only).
    #[arg(short, long, default_value = "./models/ggml-large-v3-turbo.bin")]
    model: String,

    /// Language hint (ISO 639-1 code, e.g. "en"). Auto-detected when omitted.
    #[arg(short, long)]
    language: Option<String>,

    /// Speaker names substituted into the cleanup prompt, e.g. "Alice and Bob".
    #[arg(short, long)]
    speakers: Option<String>,

    /// Chunk length in seconds.
    #[arg(long, default_value_t = 600)]
    chunk_secs: u64,

    /// Overlap between consecutive chunks in seconds.
    #[arg(long, default_value_t = 5)]
    overlap_secs: u64,

    /// Join same-speaker segments with spaces instead of verbatim
    /// concatenation (diarized output only).
    #[arg(long, default_value_t = false)]
    spaced_join: bool,
}

fn main() {
    longform::logging::init();

    // The original contract: bad arguments print usage and exit 1.
    let params = match Params::try_parse() {
        Ok(params) => params,
        Err(err) => {
            println!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(&params) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(params: &Params) -> Result<()> {
    let opts = Opts {
        language: params.language.clone(),
        speaker_names: params.speakers.clone(),
        chunk_len_ms: params.chunk_secs * 1000,
        overlap_ms: params.overlap_secs * 1000,
        join: if params.spaced_join {
            SegmentJoin::Spaced
        } else {
            SegmentJoin::Verbatim
        },
    };

    let report = transcribe(params, &opts)?;

    println!(
        "Transcription completed. Output file located at: {}",
        report.output_path.display()
    );
    Ok(())
}

fn transcribe(params: &Params, opts: &Opts) -> Result<RunReport> {
    // Backends are constructed here (model loading, credential lookup) so
    // configuration failures surface before any output file is touched.
    let report = match params.backend {
        BackendKind::Local => {
            let backend = WhisperLocalBackend::new(&params.model)?;
            Pipeline::with_backend(backend).run(&params.input, opts)?
        }
        BackendKind::Cloud => {
            let backend = CloudWhisperBackend::from_env()?;
            Pipeline::with_backend(backend).run(&params.input, opts)?
        }
        BackendKind::Diarize => {
            let backend = CloudDiarizeBackend::from_env()?;
            Pipeline::with_backend(backend).run(&params.input, opts)?
        }
    };

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_require_an_input_path() {
        let err = Params::try_parse_from(["longform"])
            .err()
            .expect("expected missing-args error");
        assert!(err.to_string().contains("Usage"));
    }

    #[test]
    fn args_default_to_the_local_backend_and_standard_chunking() {
        let params = Params::try_parse_from(["longform", "meeting.m4a"]).unwrap();
        assert_eq!(params.backend, BackendKind::Local);
        assert_eq!(params.chunk_secs, 600);
        assert_eq!(params.overlap_secs, 5);
        assert!(params.language.is_none());
        assert!(params.speakers.is_none());
    }

    #[test]
    fn args_parse_backend_and_speakers() {
        let params = Params::try_parse_from([
            "longform",
            "meeting.m4a",
            "--backend",
            "diarize",
            "--language",
            "en",
            "--speakers",
            "Alice and Bob",
        ])
        .unwrap();
        assert_eq!(params.backend, BackendKind::Diarize);
        assert_eq!(params.language.as_deref(), Some("en"));
        assert_eq!(params.speakers.as_deref(), Some("Alice and Bob"));
    }
}
