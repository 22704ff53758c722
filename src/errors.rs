/*!
 * Error types for the subtrans application.
 *
 * Each stage of the pipeline has its own error enum, built with thiserror.
 * The orchestrator decides retry behaviour from the error kind alone:
 * transient provider failures are retried, everything else is terminal.
 */

use thiserror::Error;

/// Errors from parsing, serializing or shifting subtitle documents
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// Malformed SRT block structure or unparsable timestamp
    #[error("malformed subtitle document: {0}")]
    Format(String),

    /// None of the supported text encodings could decode the input
    #[error("could not decode subtitle data with any supported encoding (tried {tried})")]
    Encoding {
        /// Comma-separated list of encodings that were attempted
        tried: String,
    },

    /// Time-shift request outside the accepted bounds
    #[error("time shift rejected: {0}")]
    Range(String),
}

/// Errors from invalid configuration values
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Batch size must be a positive number of cues
    #[error("max_batch_size must be at least 1, got {0}")]
    InvalidBatchSize(usize),

    /// Language name or code not recognized
    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    /// The configured provider requires an API key
    #[error("translation API key is required but not configured")]
    MissingApiKey,

    /// A configuration value failed validation
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Errors from the external media tools (ffmpeg/ffprobe)
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// ffmpeg/ffprobe could not be executed
    #[error("media tool unavailable: {0}")]
    ToolUnavailable(String),

    /// The container has no subtitle streams usable as text
    #[error("no usable subtitle streams: {0}")]
    NoSubtitleStreams(String),

    /// The external command ran but reported failure
    #[error("extraction command failed: {0}")]
    CommandFailed(String),

    /// The external command exceeded its time budget
    #[error("extraction timed out after {0}s")]
    Timeout(u64),
}

/// Errors from the remote LLM provider API
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Request never reached the service or the connection dropped
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// The request exceeded the configured per-request timeout
    #[error("API request timed out: {0}")]
    Timeout(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error related to rate limiting
    #[error("rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error parsing an API response body
    #[error("failed to parse API response: {0}")]
    ParseError(String),
}

impl ProviderError {
    /// Whether the orchestrator should retry the same batch.
    ///
    /// Network failures, timeouts, rate limiting and server-side errors are
    /// transient; client-side errors (auth, bad request) and unparsable
    /// responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::Timeout(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::ParseError(_) => false,
        }
    }
}

/// Errors from translating a batch of cues
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Translated segment count does not match the cue count.
    /// Never retried: a structural mismatch will not fix itself.
    #[error("translated segment count mismatch: expected {expected}, got {actual}")]
    Alignment {
        /// Number of cues sent in the batch
        expected: usize,
        /// Number of segments parsed from the reply
        actual: usize,
    },
}

impl TranslationError {
    /// Whether the orchestrator may retry the failed batch
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_transient(),
            Self::Alignment { .. } => false,
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("file error: {0}")]
    File(String),

    /// Error from subtitle processing
    #[error("subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from configuration
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Error from subtitle extraction
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Error from translation
    #[error("translation error: {0}")]
    Translation(#[from] TranslationError),

    /// The run was cancelled by the user
    #[error("aborted by user")]
    Aborted,
}

impl AppError {
    /// Short machine-friendly kind used in per-file summaries
    pub fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Subtitle(SubtitleError::Format(_)) => "format",
            Self::Subtitle(SubtitleError::Encoding { .. }) => "encoding",
            Self::Subtitle(SubtitleError::Range(_)) => "range",
            Self::Config(_) => "config",
            Self::Extraction(_) => "extraction",
            Self::Translation(TranslationError::Alignment { .. }) => "alignment",
            Self::Translation(TranslationError::Provider(_)) => "provider",
            Self::Aborted => "aborted",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
