//! Execution context shared across a generation run.
//!
//! [`ExecCtx`] carries the HTTP client, backend, base URL, transport retry
//! configuration, cancellation handle, and optional event handler. It is
//! constructed once and borrowed by every stage the engine runs.

use crate::backend::{Backend, BackoffConfig, GroqBackend};
use crate::events::EventHandler;
use reqwest::Client;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

/// Shared execution context for a generation run.
///
/// # Example
///
/// ```
/// use blogforge::{ExecCtx, backend::MockBackend};
/// use std::sync::Arc;
///
/// let ctx = ExecCtx::builder("http://unused")
///     .backend(Arc::new(MockBackend::fixed("Generated Title")))
///     .build();
/// ```
pub struct ExecCtx {
    /// HTTP client (cheap to clone, uses `Arc` internally).
    pub client: Client,
    /// Base URL for the provider (e.g. `https://api.groq.com`).
    pub base_url: String,
    /// Text-generation backend.
    pub backend: Arc<dyn Backend>,
    /// Transport retry configuration. Default: [`BackoffConfig::none()`],
    /// so each stage attempt is exactly one HTTP call.
    pub backoff: BackoffConfig,
    /// Optional cancellation flag; checked between attempts and stages.
    pub cancellation: Option<Arc<AtomicBool>>,
    /// Optional event handler for lifecycle events.
    pub event_handler: Option<Arc<dyn EventHandler>>,
}

impl ExecCtx {
    /// Create a new builder.
    pub fn builder(base_url: impl Into<String>) -> ExecCtxBuilder {
        ExecCtxBuilder {
            client: None,
            base_url: base_url.into(),
            backend: None,
            backoff: None,
            cancellation: None,
            event_handler: None,
            timeout: None,
        }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }

    /// Get a reference to the cancellation flag, if set.
    pub fn cancel_flag(&self) -> Option<&AtomicBool> {
        self.cancellation.as_deref()
    }
}

impl std::fmt::Debug for ExecCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecCtx")
            .field("base_url", &self.base_url)
            .field("backend", &self.backend.name())
            .field("backoff", &self.backoff)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("has_event_handler", &self.event_handler.is_some())
            .finish()
    }
}

/// Builder for [`ExecCtx`].
pub struct ExecCtxBuilder {
    client: Option<Client>,
    base_url: String,
    backend: Option<Arc<dyn Backend>>,
    backoff: Option<BackoffConfig>,
    cancellation: Option<Arc<AtomicBool>>,
    event_handler: Option<Arc<dyn EventHandler>>,
    timeout: Option<Duration>,
}

impl ExecCtxBuilder {
    /// Set the HTTP client. If not set, a default client is created.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the backend.
    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use the Groq backend with the given API key.
    pub fn groq(mut self, api_key: impl Into<String>) -> Self {
        self.backend = Some(Arc::new(GroqBackend::new(api_key)));
        self
    }

    /// Set the transport retry configuration. Default: no transport retry.
    pub fn backoff(mut self, config: BackoffConfig) -> Self {
        self.backoff = Some(config);
        self
    }

    /// Set the cancellation flag.
    pub fn cancellation(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancellation = Some(cancel);
        self
    }

    /// Set the event handler.
    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Set the HTTP request timeout. Default: 60 seconds.
    ///
    /// Ignored when a custom `Client` is provided via [`client`](Self::client)
    /// — the custom client's own timeout applies. This timeout is the only
    /// per-call deadline the pipeline has; a stage blocks until the client
    /// gives up.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the execution context.
    ///
    /// Without an explicit backend, requests go to Groq using an empty API
    /// key — fine for tests that never reach the network, wrong for real use.
    pub fn build(self) -> ExecCtx {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(60));
        let client = self.client.unwrap_or_else(|| {
            Client::builder()
                .timeout(timeout)
                .build()
                .expect("failed to build HTTP client")
        });
        ExecCtx {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            backend: self
                .backend
                .unwrap_or_else(|| Arc::new(GroqBackend::new(String::new()))),
            backoff: self.backoff.unwrap_or_else(BackoffConfig::none),
            cancellation: self.cancellation,
            event_handler: self.event_handler,
        }
    }
}
