//! The State Record threaded through a generation run.
//!
//! A [`BlogState`] is created once per invocation, exclusively owned by the
//! engine for the run's lifetime, mutated stage by stage, and returned at
//! termination. Stages additionally hand back a [`StageUpdate`] that the
//! engine merges into the record, so direct mutation and the merged return
//! value always agree.

use serde::{Deserialize, Serialize};

/// Language used when the caller supplies none.
pub const DEFAULT_LANGUAGE: &str = "English";

/// The generated artifact: a title and a body.
///
/// Both fields start unset and are filled exactly once per successful stage.
/// Subsequent writes overwrite, they do not append.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blog {
    /// The title of the blog post.
    pub title: Option<String>,

    /// The main content of the blog post.
    pub content: Option<String>,
}

impl Blog {
    /// Whether both title and content have been produced.
    pub fn is_complete(&self) -> bool {
        self.title.is_some() && self.content.is_some()
    }
}

/// Mutable state carried through the pipeline for one generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogState {
    /// Topic of the blog. Required non-empty before a stage may run; may be
    /// supplied through the input resolver if missing.
    pub topic: Option<String>,

    /// Language in which the blog should be written.
    pub language: String,

    /// The partial blog. Always present as a default value, never null.
    pub blog: Blog,

    /// Fatal failure message. Once set it propagates to termination and is
    /// cleared only at the start of the next stage attempt.
    pub error: Option<String>,

    /// Consecutive failures of the *current* stage. Reset to 0 when that
    /// stage completes; independent per stage.
    pub retry_count: u32,
}

impl BlogState {
    /// Create the state for a new run.
    ///
    /// An empty or whitespace-only topic is recorded as missing so the title
    /// stage routes through the input resolver. An empty language falls back
    /// to [`DEFAULT_LANGUAGE`].
    pub fn new(topic: impl Into<String>, language: impl Into<String>) -> Self {
        let topic = topic.into();
        let topic = if topic.trim().is_empty() {
            None
        } else {
            Some(topic.trim().to_string())
        };
        let language = language.into();
        let language = if language.trim().is_empty() {
            DEFAULT_LANGUAGE.to_string()
        } else {
            language.trim().to_string()
        };
        Self {
            topic,
            language,
            blog: Blog::default(),
            error: None,
            retry_count: 0,
        }
    }

    /// The topic, if present and non-empty.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Deterministic substitute title used when the title stage is skipped.
    pub fn fallback_title(&self) -> String {
        format!("Blog about {}", self.topic().unwrap_or("the requested topic"))
    }

    /// Record a fatal failure. Later stages will not run.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Whether this run has failed.
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Merge a stage's partial update into the record.
    pub fn apply(&mut self, update: StageUpdate) {
        if let Some(title) = update.title {
            self.blog.title = Some(title);
        }
        if let Some(content) = update.content {
            self.blog.content = Some(content);
        }
        if let Some(error) = update.error {
            self.error = Some(error);
        }
    }

    /// Final outcome of the run: the finished blog, or the fatal error message.
    pub fn outcome(&self) -> std::result::Result<&Blog, &str> {
        match self.error.as_deref() {
            Some(err) => Err(err),
            None => Ok(&self.blog),
        }
    }
}

/// Partial update returned by a stage.
///
/// Only the fields a stage actually produced are set; [`BlogState::apply`]
/// leaves everything else untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub error: Option<String>,
}

impl StageUpdate {
    /// Update carrying a generated title.
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Update carrying generated content (title echoed for completeness).
    pub fn content(title: Option<String>, content: impl Into<String>) -> Self {
        Self {
            title,
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Update carrying a fatal error.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Whether this update carries a fatal error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_defaults() {
        let state = BlogState::new("Rust", "");
        assert_eq!(state.topic(), Some("Rust"));
        assert_eq!(state.language, DEFAULT_LANGUAGE);
        assert_eq!(state.blog, Blog::default());
        assert!(state.error.is_none());
        assert_eq!(state.retry_count, 0);
    }

    #[test]
    fn test_empty_topic_recorded_as_missing() {
        let state = BlogState::new("   ", "English");
        assert!(state.topic().is_none());
    }

    #[test]
    fn test_topic_trimmed() {
        let state = BlogState::new("  Quantum Computing  ", "English");
        assert_eq!(state.topic(), Some("Quantum Computing"));
    }

    #[test]
    fn test_fallback_title_uses_topic() {
        let state = BlogState::new("Rust", "English");
        assert_eq!(state.fallback_title(), "Blog about Rust");
    }

    #[test]
    fn test_apply_title_update() {
        let mut state = BlogState::new("Rust", "English");
        state.apply(StageUpdate::title("Why Rust?"));
        assert_eq!(state.blog.title.as_deref(), Some("Why Rust?"));
        assert!(state.blog.content.is_none());
    }

    #[test]
    fn test_apply_preserves_existing_fields() {
        let mut state = BlogState::new("Rust", "English");
        state.blog.title = Some("Kept".into());
        state.apply(StageUpdate::content(None, "Body"));
        assert_eq!(state.blog.title.as_deref(), Some("Kept"));
        assert_eq!(state.blog.content.as_deref(), Some("Body"));
    }

    #[test]
    fn test_apply_error_update() {
        let mut state = BlogState::new("Rust", "English");
        state.apply(StageUpdate::error("boom"));
        assert!(state.is_failed());
        assert_eq!(state.outcome().unwrap_err(), "boom");
    }

    #[test]
    fn test_outcome_success() {
        let mut state = BlogState::new("Rust", "English");
        state.blog.title = Some("T".into());
        state.blog.content = Some("C".into());
        let blog = state.outcome().expect("success");
        assert!(blog.is_complete());
    }
}
