//! Cloud transcription backends speaking the OpenAI-compatible
//! `audio/transcriptions` API over blocking HTTP.
//!
//! Two variants share one client:
//! - [`CloudWhisperBackend`] (`whisper-1`) returns plain text per clip.
//! - [`CloudDiarizeBackend`] (`gpt-4o-transcribe-diarize`) returns speaker-
//!   labeled segments; the service does its own internal chunking, so the
//!   pipeline submits the whole recording in one call.
//!
//! Failures map onto the backend error taxonomy (401/403 → `Auth`, 429 →
//! `RateLimit`, transport and 5xx → `Unavailable`) and are never retried.

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response, multipart};
use serde::Deserialize;
use tracing::debug;

use crate::backend::Backend;
use crate::error::{BackendError, Error, Result};
use crate::segments::{Transcript, TranscriptSegment};
use crate::source::Clip;

/// Default API root, overridable through `OPENAI_BASE_URL`.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const TRANSCRIPTIONS_PATH: &str = "audio/transcriptions";

const WHISPER_MODEL: &str = "whisper-1";
const DIARIZE_MODEL: &str = "gpt-4o-transcribe-diarize";

/// Credentials and connection state shared by both cloud variants.
///
/// Environment is read once at construction: `OPENAI_API_KEY` (required) and
/// `OPENAI_BASE_URL` (optional endpoint override).
struct CloudClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl CloudClient {
    fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| BackendError::Auth("OPENAI_API_KEY is not set".into()))?;

        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());

        // No request timeout: a long clip legitimately takes minutes to
        // transcribe, and the run is single-user and interruptible.
        let http = Client::builder()
            .user_agent(concat!("longform/", env!("CARGO_PKG_VERSION")))
            .timeout(None)
            .build()
            .map_err(|err| BackendError::Unavailable(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        join_endpoint(&self.base_url, TRANSCRIPTIONS_PATH)
    }

    /// Upload one clip with the given form fields and return a success response.
    fn post_clip(&self, clip: &Clip, mut form: multipart::Form) -> Result<Response> {
        form = form
            .file("file", &clip.path)
            .map_err(Error::Io)?;

        debug!(endpoint = %self.endpoint(), clip = %clip.path.display(), "uploading clip");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .map_err(|err| {
                BackendError::Unavailable(format!("request to transcription service failed: {err}"))
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(classify_status(status, &body).into())
    }
}

/// Map a non-success HTTP status onto the backend error taxonomy.
fn classify_status(status: StatusCode, body: &str) -> BackendError {
    let detail = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", body.trim())
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => BackendError::RateLimit(detail),
        s if s.is_server_error() => BackendError::Unavailable(detail),
        _ => BackendError::Other(format!("unexpected response: {detail}")),
    }
}

fn join_endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Plain-text transcription via the Whisper API.
pub struct CloudWhisperBackend {
    client: CloudClient,
}

#[derive(Debug, Deserialize)]
struct TextResponse {
    text: String,
}

impl CloudWhisperBackend {
    /// Build a backend from `OPENAI_API_KEY` / `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client: CloudClient::from_env()?,
        })
    }
}

impl Backend for CloudWhisperBackend {
    fn transcribe(&mut self, clip: &Clip, language: Option<&str>) -> Result<Transcript> {
        let mut form = multipart::Form::new().text("model", WHISPER_MODEL);
        if let Some(language) = language {
            form = form.text("language", language.to_owned());
        }

        let response = self.client.post_clip(clip, form)?;
        let parsed: TextResponse = response.json().map_err(|err| {
            BackendError::Other(format!("failed to parse transcription response: {err}"))
        })?;

        Ok(Transcript::Text(parsed.text))
    }

    fn name(&self) -> &'static str {
        "cloud-whisper"
    }
}

/// Diarizing transcription returning speaker-labeled segments.
pub struct CloudDiarizeBackend {
    client: CloudClient,
}

#[derive(Debug, Deserialize)]
struct DiarizedResponse {
    #[serde(default)]
    segments: Vec<DiarizedSegment>,
}

#[derive(Debug, Deserialize)]
struct DiarizedSegment {
    speaker: Option<String>,

    #[serde(default)]
    text: String,

    /// Start offset in seconds, relative to the submitted clip.
    #[serde(default)]
    start: f64,
}

impl CloudDiarizeBackend {
    /// Build a backend from `OPENAI_API_KEY` / `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client: CloudClient::from_env()?,
        })
    }
}

impl Backend for CloudDiarizeBackend {
    fn transcribe(&mut self, clip: &Clip, language: Option<&str>) -> Result<Transcript> {
        let mut form = multipart::Form::new()
            .text("model", DIARIZE_MODEL)
            .text("chunking_strategy", "auto")
            .text("response_format", "diarized_json");
        if let Some(language) = language {
            form = form.text("language", language.to_owned());
        }

        let response = self.client.post_clip(clip, form)?;
        let parsed: DiarizedResponse = response.json().map_err(|err| {
            BackendError::Other(format!("failed to parse diarized response: {err}"))
        })?;

        let segments = parsed
            .segments
            .into_iter()
            .map(|seg| TranscriptSegment {
                speaker: seg.speaker,
                text: seg.text,
                start_ms: (seg.start.max(0.0) * 1000.0).round() as u64,
            })
            .collect();

        Ok(Transcript::Segments(segments))
    }

    fn name(&self) -> &'static str {
        "cloud-diarize"
    }

    fn diarized(&self) -> bool {
        true
    }
}
