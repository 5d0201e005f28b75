//! Backend for the Groq cloud API.
//!
//! Groq exposes an OpenAI-compatible chat-completions API under
//! `/openai/v1/chat/completions`. The normalized prompt is sent as a single
//! user message; the first choice's message content comes back as the
//! generated text.

use super::{Backend, LlmRequest, LlmResponse};
use crate::error::Result;
use crate::PipelineError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Default Groq API base URL.
pub const GROQ_BASE_URL: &str = "https://api.groq.com";

/// Default model, matching the deployment this crate was built for.
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

/// Backend for the Groq chat-completions API.
///
/// # Example
///
/// ```
/// use blogforge::backend::GroqBackend;
///
/// let backend = GroqBackend::new("gsk_...");
/// ```
#[derive(Clone)]
pub struct GroqBackend {
    api_key: String,
}

impl std::fmt::Debug for GroqBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqBackend")
            .field(
                "api_key",
                &if self.api_key.len() > 6 {
                    format!("{}***", &self.api_key[..6])
                } else {
                    "***".to_string()
                },
            )
            .finish()
    }
}

impl GroqBackend {
    /// Create a backend authenticating with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Build the request body for `/openai/v1/chat/completions`.
    fn build_body(request: &LlmRequest) -> Value {
        json!({
            "model": request.model,
            "messages": [{"role": "user", "content": request.prompt}],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": false,
        })
    }

    /// Parse a `Retry-After` header value as seconds.
    fn parse_retry_after(value: &str) -> Option<std::time::Duration> {
        value
            .trim()
            .parse::<u64>()
            .ok()
            .map(std::time::Duration::from_secs)
    }

    /// Extract metadata worth keeping from a chat-completions response.
    fn extract_metadata(json_resp: &Value) -> Option<Value> {
        let mut meta = serde_json::Map::new();
        for key in ["usage", "model", "id"] {
            if let Some(v) = json_resp.get(key) {
                meta.insert(key.into(), v.clone());
            }
        }
        if meta.is_empty() {
            None
        } else {
            Some(Value::Object(meta))
        }
    }
}

#[async_trait]
impl Backend for GroqBackend {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let base = base_url.trim_end_matches('/');
        let url = format!("{}/openai/v1/chat/completions", base);
        let body = Self::build_body(request);

        let resp = client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                PipelineError::Other(format!("failed to connect to LLM at {}: {}", url, e))
            })?;

        let status = resp.status().as_u16();

        if !resp.status().is_success() {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(Self::parse_retry_after);
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::HttpError {
                status,
                body: text,
                retry_after,
            });
        }

        let json_resp: Value = resp.json().await?;

        let text = json_resp
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        Ok(LlmResponse {
            text,
            status,
            metadata: Self::extract_metadata(&json_resp),
        })
    }

    fn name(&self) -> &'static str {
        "groq"
    }
}
