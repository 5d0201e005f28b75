//! Mock backend for testing without a live provider.
//!
//! [`MockBackend`] plays back a script of outcomes in order, allowing
//! deterministic tests of the retry, fallback, and abort paths.
//!
//! # Example
//!
//! ```
//! use blogforge::backend::MockBackend;
//!
//! // Two failures, then a usable response.
//! let mock = MockBackend::failing_then(2, "Generated Title");
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::Client;

use super::{Backend, LlmRequest, LlmResponse};
use crate::error::Result;
use crate::PipelineError;

/// One scripted outcome of a mock call.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Return this text with HTTP 200.
    Text(String),
    /// Fail with a transport-style HTTP error.
    HttpFailure(u16),
    /// Return HTTP 200 with empty text (valid-but-failing response).
    Empty,
}

/// A test backend that plays back scripted outcomes in order.
///
/// Cycles back to the beginning when the script is exhausted.
#[derive(Debug)]
pub struct MockBackend {
    script: Vec<MockOutcome>,
    index: AtomicUsize,
}

impl MockBackend {
    /// Create a mock backend with the given script.
    ///
    /// Outcomes are played in order. When exhausted, cycles from the start.
    pub fn new(script: Vec<MockOutcome>) -> Self {
        assert!(!script.is_empty(), "MockBackend requires at least one outcome");
        Self {
            script,
            index: AtomicUsize::new(0),
        }
    }

    /// A mock that always returns the same text.
    pub fn fixed(text: impl Into<String>) -> Self {
        Self::new(vec![MockOutcome::Text(text.into())])
    }

    /// A mock that returns the given responses in order, cycling.
    pub fn responses(texts: Vec<String>) -> Self {
        Self::new(texts.into_iter().map(MockOutcome::Text).collect())
    }

    /// A mock that fails `failures` times with HTTP 503, then returns `text`.
    pub fn failing_then(failures: usize, text: impl Into<String>) -> Self {
        let mut script: Vec<MockOutcome> =
            std::iter::repeat_with(|| MockOutcome::HttpFailure(503))
                .take(failures)
                .collect();
        script.push(MockOutcome::Text(text.into()));
        Self::new(script)
    }

    /// A mock that always fails with the given HTTP status.
    pub fn always_failing(status: u16) -> Self {
        Self::new(vec![MockOutcome::HttpFailure(status)])
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }

    fn next_outcome(&self) -> MockOutcome {
        let idx = self.index.fetch_add(1, Ordering::Relaxed) % self.script.len();
        self.script[idx].clone()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn complete(
        &self,
        _client: &Client,
        _base_url: &str,
        _request: &LlmRequest,
    ) -> Result<LlmResponse> {
        match self.next_outcome() {
            MockOutcome::Text(text) => Ok(LlmResponse {
                text,
                status: 200,
                metadata: None,
            }),
            MockOutcome::Empty => Ok(LlmResponse {
                text: String::new(),
                status: 200,
                metadata: None,
            }),
            MockOutcome::HttpFailure(status) => Err(PipelineError::HttpError {
                status,
                body: "scripted failure".into(),
                retry_after: None,
            }),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> LlmRequest {
        LlmRequest::new("test", "prompt")
    }

    #[tokio::test]
    async fn test_fixed_response() {
        let mock = MockBackend::fixed("Hello!");
        let client = Client::new();
        let resp = mock.complete(&client, "http://unused", &request()).await.unwrap();
        assert_eq!(resp.text, "Hello!");
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn test_cycles_responses() {
        let mock = MockBackend::responses(vec!["first".into(), "second".into()]);
        let client = Client::new();
        let r1 = mock.complete(&client, "http://unused", &request()).await.unwrap();
        let r2 = mock.complete(&client, "http://unused", &request()).await.unwrap();
        let r3 = mock.complete(&client, "http://unused", &request()).await.unwrap();
        assert_eq!(r1.text, "first");
        assert_eq!(r2.text, "second");
        assert_eq!(r3.text, "first"); // cycles
    }

    #[tokio::test]
    async fn test_failing_then_recovers() {
        let mock = MockBackend::failing_then(2, "ok");
        let client = Client::new();
        assert!(mock.complete(&client, "http://unused", &request()).await.is_err());
        assert!(mock.complete(&client, "http://unused", &request()).await.is_err());
        let resp = mock.complete(&client, "http://unused", &request()).await.unwrap();
        assert_eq!(resp.text, "ok");
    }

    #[tokio::test]
    async fn test_scripted_failure_status() {
        let mock = MockBackend::always_failing(429);
        let client = Client::new();
        let err = mock
            .complete(&client, "http://unused", &request())
            .await
            .unwrap_err();
        match err {
            PipelineError::HttpError { status, .. } => assert_eq!(status, 429),
            other => panic!("expected HttpError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_outcome_is_ok_with_empty_text() {
        let mock = MockBackend::new(vec![MockOutcome::Empty]);
        let client = Client::new();
        let resp = mock.complete(&client, "http://unused", &request()).await.unwrap();
        assert!(resp.text.is_empty());
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn test_call_counter() {
        let mock = MockBackend::fixed("x");
        let client = Client::new();
        assert_eq!(mock.calls(), 0);
        mock.complete(&client, "http://unused", &request()).await.unwrap();
        mock.complete(&client, "http://unused", &request()).await.unwrap();
        assert_eq!(mock.calls(), 2);
    }
}
