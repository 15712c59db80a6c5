use thiserror::Error;

/// Longform's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Longform's crate-wide error type.
///
/// The taxonomy mirrors how failures surface to the user:
/// - configuration problems are detected up front, before any work begins
/// - missing external tools (ffmpeg/ffprobe) are fatal
/// - backend failures are fatal to the run and never retried
/// - chunk failures carry the index of the chunk that was in flight
#[derive(Debug, Error)]
pub enum Error {
    /// Bad arguments or paths. Detected before any output is written.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A required external tool or model is not available.
    #[error("missing dependency: {0}")]
    DependencyMissing(String),

    /// The underlying decoder could not parse the audio container/codec.
    #[error("failed to decode audio: {0}")]
    Decode(String),

    /// A transcription backend failed. Never retried automatically.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A failure while processing one chunk of the run.
    ///
    /// `index` is 1-based, matching the "Transcription portion N" headers, so the
    /// message tells the user exactly which portion never made it to disk.
    #[error("chunk {index} failed: {source}")]
    Chunk {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Message(String),
}

impl Error {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Tag an error with the chunk it occurred in.
    pub fn chunk(index: usize, source: Error) -> Self {
        Self::Chunk {
            index,
            source: Box::new(source),
        }
    }
}

/// Failures originating from a transcription backend.
///
/// None of these are recoverable within a run: the driver surfaces them
/// immediately and whatever was already flushed stays on disk.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Missing or rejected credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The service refused the request due to rate limiting.
    #[error("rate limited: {0}")]
    RateLimit(String),

    /// Connectivity failure or a server-side error.
    #[error("transcription service unavailable: {0}")]
    Unavailable(String),

    /// The local model could not be loaded. Fatal before any chunk is processed.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("{0}")]
    Other(String),
}
