use std::time::Duration;
use thiserror::Error;

/// Errors produced by the pipeline and its collaborators.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Low-level HTTP transport failure (connection refused, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON decoding failed at the serde level.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error with status code, response body, and optional Retry-After hint.
    ///
    /// Returned by [`Backend`](crate::backend::Backend) implementations when
    /// the provider answers with a non-success status. `retry_after` is
    /// populated from the `Retry-After` response header when present.
    #[error("HTTP {status}: {body}")]
    HttpError {
        /// HTTP status code (e.g. 429, 500, 503).
        status: u16,
        /// Response body text.
        body: String,
        /// Parsed `Retry-After` header value, if present.
        retry_after: Option<Duration>,
    },

    /// The model answered, but with empty or whitespace-only text.
    ///
    /// Treated by the stages as a transient failure, same as a transport error.
    #[error("model returned an empty response in stage '{0}'")]
    EmptyResponse(String),

    /// A pipeline stage failed with a descriptive message.
    #[error("stage '{stage}' failed: {message}")]
    StageFailed { stage: String, message: String },

    /// A required input was absent and the resolver could not supply it.
    ///
    /// Fatal: missing-input errors are never retried.
    #[error("{0}")]
    MissingInput(String),

    /// The run was cancelled via the cancellation flag.
    #[error("pipeline was cancelled")]
    Cancelled,

    /// Invalid configuration detected at build time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        PipelineError::Other(err.to_string())
    }
}

impl PipelineError {
    /// Whether this error may resolve on a re-attempt.
    ///
    /// Transport failures, provider-side HTTP errors, and empty responses are
    /// transient; missing input, cancellation, and configuration errors are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PipelineError::Request(_)
                | PipelineError::HttpError { .. }
                | PipelineError::EmptyResponse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
