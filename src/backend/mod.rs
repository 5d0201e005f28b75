//! Backend trait and normalized request/response types.
//!
//! The [`Backend`] trait abstracts over text-generation providers,
//! translating between the normalized [`LlmRequest`]/[`LlmResponse`] types
//! and a provider-specific HTTP API. The pipeline treats a backend as an
//! opaque synchronous collaborator: one prompt in, one text out, or a
//! transport error.
//!
//! Built-in implementations: [`GroqBackend`], [`MockBackend`].

pub mod groq;
pub mod mock;

pub use groq::GroqBackend;
pub use mock::{MockBackend, MockOutcome};

use crate::error::Result;
use crate::PipelineError;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A normalized generation request — provider-agnostic.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Model identifier (e.g. `"llama3-8b-8192"`).
    pub model: String,

    /// The prompt text.
    pub prompt: String,

    /// Sampling temperature (0.0 = deterministic).
    pub temperature: f64,

    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

impl LlmRequest {
    /// Request with the given model and prompt, default sampling settings.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: 0.7,
            max_tokens: 2048,
        }
    }
}

/// A normalized generation response.
#[derive(Debug)]
pub struct LlmResponse {
    /// The generated text content. May be empty — the stage treats empty
    /// text as a failing response, not this layer.
    pub text: String,

    /// HTTP status code (for diagnostics/logging).
    pub status: u16,

    /// Provider-specific metadata (token counts, timing, model info).
    pub metadata: Option<serde_json::Value>,
}

/// Abstraction over text-generation providers.
///
/// Implementors translate the normalized [`LlmRequest`] into the provider's
/// HTTP API and map non-success statuses to [`PipelineError::HttpError`].
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Execute a generation call and return the full response.
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;
}

/// Transport-level retry configuration with jittered exponential backoff.
///
/// This is below the stage-level retry policy: it covers a single backend
/// call against flaky infrastructure (429, 5xx, dropped connections). The
/// default is no transport retry, so each stage attempt maps to exactly one
/// HTTP call.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Maximum number of transport retries. Default: 0 (no retry).
    pub max_retries: u32,

    /// Initial delay before the first retry.
    pub initial_delay: Duration,

    /// Multiplier applied to the delay after each retry.
    pub multiplier: f64,

    /// Cap on the delay between retries.
    pub max_delay: Duration,

    /// Apply full jitter (random delay in `[0, calculated]`).
    pub jitter: bool,

    /// HTTP status codes that trigger a transport retry.
    pub retryable_statuses: Vec<u16>,

    /// Honor `Retry-After` headers from the provider.
    pub respect_retry_after: bool,
}

impl BackoffConfig {
    /// No transport retry — every stage attempt is a single HTTP call.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::standard()
        }
    }

    /// Sensible defaults for cloud APIs: 3 retries, 1s initial, 2x growth,
    /// 30s cap, full jitter, respects `Retry-After`.
    pub fn standard() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: true,
            retryable_statuses: vec![429, 500, 502, 503, 504],
            respect_retry_after: true,
        }
    }

    /// Delay for attempt N (0-indexed): `initial * multiplier^N`, capped,
    /// then jittered.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_secs_f64());
        let jittered = if self.jitter {
            fastrand::f64() * capped
        } else {
            capped
        };
        Duration::from_secs_f64(jittered)
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::none()
    }
}

/// Whether a [`PipelineError`] warrants a transport retry under `config`.
///
/// Retryable: `HttpError` with a status in `config.retryable_statuses`, and
/// `Request` (connection/transport) errors. Empty responses are a stage-level
/// concern and are not retried here.
pub fn is_retryable(error: &PipelineError, config: &BackoffConfig) -> bool {
    match error {
        PipelineError::HttpError { status, .. } => config.retryable_statuses.contains(status),
        PipelineError::Request(_) => true,
        _ => false,
    }
}

/// Type alias for the callback invoked before each transport retry.
///
/// Arguments: `(attempt_number, delay_before_retry, reason_for_retry)`.
pub type RetryCallback<'a> = Option<&'a mut (dyn FnMut(u32, Duration, &str) + Send)>;

/// Execute a backend call with transport-level retry.
///
/// Returns the first successful response, or the last error once retries are
/// exhausted. Cancellation is checked before each attempt and after each
/// backoff sleep.
pub async fn with_backoff(
    backend: &Arc<dyn Backend>,
    client: &Client,
    base_url: &str,
    request: &LlmRequest,
    config: &BackoffConfig,
    cancel: Option<&AtomicBool>,
    mut on_retry: RetryCallback<'_>,
) -> Result<LlmResponse> {
    let mut last_error: Option<PipelineError> = None;

    for attempt in 0..=config.max_retries {
        if let Some(flag) = cancel {
            if flag.load(Ordering::Relaxed) {
                return Err(PipelineError::Cancelled);
            }
        }

        if attempt > 0 {
            let delay = match &last_error {
                Some(PipelineError::HttpError {
                    retry_after: Some(ra),
                    ..
                }) if config.respect_retry_after => *ra,
                _ => config.delay_for_attempt(attempt - 1),
            };

            let reason = last_error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_default();
            if let Some(ref mut cb) = on_retry {
                cb(attempt, delay, &reason);
            }

            tokio::time::sleep(delay).await;

            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    return Err(PipelineError::Cancelled);
                }
            }
        }

        match backend.complete(client, base_url, request).await {
            Ok(response) => return Ok(response),
            Err(e) => {
                if attempt < config.max_retries && is_retryable(&e, config) {
                    last_error = Some(e);
                    continue;
                }
                return Err(e);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| PipelineError::Other("backoff loop exited unexpectedly".into())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable_429() {
        let config = BackoffConfig::standard();
        let err = PipelineError::HttpError {
            status: 429,
            body: "rate limited".into(),
            retry_after: None,
        };
        assert!(is_retryable(&err, &config));
    }

    #[test]
    fn test_is_retryable_400_not_retried() {
        let config = BackoffConfig::standard();
        let err = PipelineError::HttpError {
            status: 400,
            body: "bad request".into(),
            retry_after: None,
        };
        assert!(!is_retryable(&err, &config));
    }

    #[test]
    fn test_empty_response_not_transport_retried() {
        let config = BackoffConfig::standard();
        assert!(!is_retryable(
            &PipelineError::EmptyResponse("title".into()),
            &config
        ));
    }

    #[test]
    fn test_delay_exponential_without_jitter() {
        let config = BackoffConfig {
            jitter: false,
            ..BackoffConfig::standard()
        };
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(4));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let config = BackoffConfig {
            jitter: false,
            max_delay: Duration::from_secs(5),
            ..BackoffConfig::standard()
        };
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(5));
    }

    #[test]
    fn test_jitter_within_range() {
        let config = BackoffConfig::standard();
        for _ in 0..100 {
            assert!(config.delay_for_attempt(0) <= Duration::from_secs(1));
        }
    }

    #[tokio::test]
    async fn test_backoff_respects_cancellation() {
        let cancel = AtomicBool::new(true);
        let backend: Arc<dyn Backend> = Arc::new(MockBackend::fixed("unused"));
        let client = Client::new();
        let request = LlmRequest::new("test", "prompt");

        let result = with_backoff(
            &backend,
            &client,
            "http://unused",
            &request,
            &BackoffConfig::standard(),
            Some(&cancel),
            None,
        )
        .await;

        assert!(matches!(result.unwrap_err(), PipelineError::Cancelled));
    }

    #[tokio::test]
    async fn test_backoff_retries_until_success() {
        let backend: Arc<dyn Backend> = Arc::new(MockBackend::failing_then(2, "recovered"));
        let client = Client::new();
        let request = LlmRequest::new("test", "prompt");
        let config = BackoffConfig {
            max_retries: 3,
            initial_delay: Duration::from_millis(1),
            jitter: false,
            ..BackoffConfig::standard()
        };

        let mut retries = 0;
        let mut on_retry = |attempt: u32, _delay: Duration, _reason: &str| {
            retries = attempt;
        };
        let response = with_backoff(
            &backend,
            &client,
            "http://unused",
            &request,
            &config,
            None,
            Some(&mut on_retry),
        )
        .await
        .unwrap();

        assert_eq!(response.text, "recovered");
        assert_eq!(retries, 2);
    }

    #[tokio::test]
    async fn test_backoff_none_fails_fast() {
        let backend: Arc<dyn Backend> = Arc::new(MockBackend::failing_then(1, "too late"));
        let client = Client::new();
        let request = LlmRequest::new("test", "prompt");

        let result = with_backoff(
            &backend,
            &client,
            "http://unused",
            &request,
            &BackoffConfig::none(),
            None,
            None,
        )
        .await;

        assert!(result.is_err());
    }
}
