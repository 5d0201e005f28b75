//! Environment-based configuration.
//!
//! [`Settings::from_env`] reads the process environment (after loading a
//! `.env` file when one is present) and fills in defaults for anything
//! unset. Nothing here is required for library use — callers can wire an
//! [`ExecCtx`](crate::ExecCtx) and [`BlogPipeline`](crate::BlogPipeline)
//! by hand — but the CLI demos and HTTP adapters all start from here.

use crate::backend::groq::{DEFAULT_MODEL, GROQ_BASE_URL};
use crate::state::DEFAULT_LANGUAGE;
use std::time::Duration;

/// Runtime settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Groq API key (`GROQ_API_KEY`). Absent means the demos fall back to
    /// the mock backend; a real deployment treats this as required.
    pub api_key: Option<String>,

    /// Provider base URL (`BLOG_BASE_URL`). Default: the Groq cloud.
    pub base_url: String,

    /// Model used by every stage (`BLOG_MODEL`).
    pub model: String,

    /// Stage retry budget (`BLOG_MAX_RETRIES`).
    pub max_retries: u32,

    /// Default target language (`BLOG_LANGUAGE`).
    pub default_language: String,

    /// HTTP request timeout in seconds (`BLOG_TIMEOUT_SECS`).
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: GROQ_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_retries: 3,
            default_language: DEFAULT_LANGUAGE.to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl Settings {
    /// Load settings from the environment, reading `.env` first if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Self {
            api_key: read("GROQ_API_KEY"),
            base_url: read("BLOG_BASE_URL").unwrap_or(defaults.base_url),
            model: read("BLOG_MODEL").unwrap_or(defaults.model),
            max_retries: read("BLOG_MAX_RETRIES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_retries),
            default_language: read("BLOG_LANGUAGE").unwrap_or(defaults.default_language),
            request_timeout: read("BLOG_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }
}

/// Read a non-empty environment variable.
fn read(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
