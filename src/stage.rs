//! Generation stages: the units of work the engine schedules.
//!
//! Each stage consumes the State Record, calls the text-generation backend,
//! and produces a partial update or a fatal failure recorded on the state.
//! The title, content, and translation stages share one attempt loop and one
//! retry/fallback procedure; they differ only in required inputs, prompt, and
//! fallback value.
//!
//! Stages never return an error past their boundary: every failure is
//! normalized into either a local retry (invisible to the engine) or a fatal
//! message in the returned [`StageUpdate`].

use crate::backend::{self, LlmRequest};
use crate::error::{PipelineError, Result};
use crate::events::{emit, Event};
use crate::exec_ctx::ExecCtx;
use crate::policy::{Decision, RetryPolicy};
use crate::prompt;
use crate::resolver::{InputResolver, MissingInput, ResolveError};
use crate::state::{BlogState, StageUpdate};
use tracing::{error, info, warn};

/// Which stage this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Generate the blog title from the topic.
    Title,
    /// Generate the blog body from the topic and language.
    Content,
    /// Translate the finished body into the target language.
    Translation,
}

impl StageKind {
    /// Short name used in events and transitions.
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Title => "title",
            StageKind::Content => "content",
            StageKind::Translation => "translation",
        }
    }

    /// Human-readable name used in error messages.
    fn display_name(&self) -> &'static str {
        match self {
            StageKind::Title => "title generation",
            StageKind::Content => "content generation",
            StageKind::Translation => "translation",
        }
    }
}

/// A single generation stage.
#[derive(Debug, Clone)]
pub struct GenerationStage {
    kind: StageKind,
    model: String,
}

impl GenerationStage {
    /// Create a stage of the given kind using `model`.
    pub fn new(kind: StageKind, model: impl Into<String>) -> Self {
        Self {
            kind,
            model: model.into(),
        }
    }

    /// The stage kind.
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    /// Short stage name.
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Execute the stage against the State Record.
    ///
    /// Precondition (guaranteed by the engine): `state.error` is `None` on
    /// entry — a stage is never invoked on an already-failed run. The stage
    /// clears it anyway at the start of the attempt, and resets the retry
    /// counter so each stage gets the full budget.
    pub async fn execute(
        &self,
        ctx: &ExecCtx,
        policy: &RetryPolicy,
        resolver: &dyn InputResolver,
        state: &mut BlogState,
    ) -> StageUpdate {
        state.error = None;
        state.retry_count = 0;

        let update = match self.kind {
            StageKind::Title => self.run_title(ctx, policy, resolver, state).await,
            StageKind::Content => self.run_content(ctx, policy, resolver, state).await,
            StageKind::Translation => self.run_translation(ctx, policy, state).await,
        };

        if let Some(ref message) = update.error {
            state.fail(message.clone());
        }
        update
    }

    /// Title stage: requires a topic; writes `blog.title`.
    async fn run_title(
        &self,
        ctx: &ExecCtx,
        policy: &RetryPolicy,
        resolver: &dyn InputResolver,
        state: &mut BlogState,
    ) -> StageUpdate {
        let topic = match Self::require_topic(resolver, state) {
            Ok(topic) => topic,
            Err(message) => return StageUpdate::error(message),
        };

        let prompt = prompt::title_prompt(&topic);
        match self.attempt_loop(ctx, policy, state, &prompt).await {
            Attempted::Ok(title) => {
                info!(title = %title, "title generated");
                state.blog.title = Some(title.clone());
                state.retry_count = 0;
                StageUpdate::title(title)
            }
            Attempted::Skip => {
                let fallback = state.fallback_title();
                warn!(fallback = %fallback, "skipping title generation");
                emit(
                    &ctx.event_handler,
                    Event::FallbackApplied {
                        stage: self.name().into(),
                        value: fallback.clone(),
                    },
                );
                state.blog.title = Some(fallback.clone());
                state.retry_count = 0;
                StageUpdate::title(fallback)
            }
            Attempted::Fatal(message) => StageUpdate::error(message),
        }
    }

    /// Content stage: requires a topic and a (possibly fallback) title;
    /// writes `blog.content`.
    async fn run_content(
        &self,
        ctx: &ExecCtx,
        policy: &RetryPolicy,
        resolver: &dyn InputResolver,
        state: &mut BlogState,
    ) -> StageUpdate {
        let topic = match Self::require_topic(resolver, state) {
            Ok(topic) => topic,
            Err(message) => return StageUpdate::error(message),
        };

        if state.blog.title.is_none() {
            let fallback = state.fallback_title();
            warn!(fallback = %fallback, "no title found, using topic as fallback");
            state.blog.title = Some(fallback);
        }

        let prompt = prompt::content_prompt(&topic, &state.language);
        match self.attempt_loop(ctx, policy, state, &prompt).await {
            Attempted::Ok(content) => {
                info!(chars = content.len(), "content generated");
                state.blog.content = Some(content.clone());
                state.retry_count = 0;
                StageUpdate::content(state.blog.title.clone(), content)
            }
            Attempted::Skip => {
                let fallback = format!("Content about {} could not be generated.", topic);
                warn!("skipping content generation");
                emit(
                    &ctx.event_handler,
                    Event::FallbackApplied {
                        stage: self.name().into(),
                        value: fallback.clone(),
                    },
                );
                state.blog.content = Some(fallback.clone());
                state.retry_count = 0;
                StageUpdate::content(state.blog.title.clone(), fallback)
            }
            Attempted::Fatal(message) => StageUpdate::error(message),
        }
    }

    /// Translation stage: requires finished content; overwrites
    /// `blog.content` with the translated text.
    async fn run_translation(
        &self,
        ctx: &ExecCtx,
        policy: &RetryPolicy,
        state: &mut BlogState,
    ) -> StageUpdate {
        let content = match state.blog.content.clone() {
            Some(content) => content,
            None => return StageUpdate::error("no content available for translation"),
        };

        let prompt = prompt::translation_prompt(&content, &state.language);
        match self.attempt_loop(ctx, policy, state, &prompt).await {
            Attempted::Ok(translated) => {
                info!(language = %state.language, "content translated");
                state.blog.content = Some(translated.clone());
                state.retry_count = 0;
                StageUpdate::content(state.blog.title.clone(), translated)
            }
            Attempted::Skip => {
                let fallback =
                    format!("Translation to {} could not be completed.", state.language);
                warn!(language = %state.language, "skipping translation");
                emit(
                    &ctx.event_handler,
                    Event::FallbackApplied {
                        stage: self.name().into(),
                        value: fallback.clone(),
                    },
                );
                state.blog.content = Some(fallback.clone());
                state.retry_count = 0;
                StageUpdate::content(state.blog.title.clone(), fallback)
            }
            Attempted::Fatal(message) => StageUpdate::error(message),
        }
    }

    /// Ensure the topic is present, consulting the resolver when it is not.
    ///
    /// Resolver failure is fatal — missing-input errors are never retried.
    fn require_topic(
        resolver: &dyn InputResolver,
        state: &mut BlogState,
    ) -> std::result::Result<String, String> {
        if let Some(topic) = state.topic() {
            return Ok(topic.to_string());
        }

        warn!("missing or empty topic, consulting resolver");
        match resolver.resolve(MissingInput::Topic) {
            Ok(topic) => {
                state.topic = Some(topic.trim().to_string());
                Ok(state.topic.clone().unwrap_or_default())
            }
            Err(ResolveError::Cancelled) => Err("topic input cancelled by user".into()),
            Err(ResolveError::Unavailable) => {
                Err("no input resolver available for topic".into())
            }
            Err(ResolveError::Failed(message)) => Err(message),
        }
    }

    /// The bounded attempt loop shared by every stage.
    ///
    /// Transient failures feed the retry policy; at exhaustion the policy's
    /// three-way decision applies. An explicit `Retry` override at exhaustion
    /// grants one more attempt without advancing the counter, so the next
    /// failure escalates again.
    async fn attempt_loop(
        &self,
        ctx: &ExecCtx,
        policy: &RetryPolicy,
        state: &mut BlogState,
        prompt: &str,
    ) -> Attempted {
        loop {
            if ctx.is_cancelled() {
                return Attempted::Fatal(PipelineError::Cancelled.to_string());
            }

            let err = match self.attempt(ctx, prompt).await {
                Ok(text) => return Attempted::Ok(text),
                Err(err) => err,
            };

            if matches!(err, PipelineError::Cancelled) {
                return Attempted::Fatal(err.to_string());
            }
            if !err.is_transient() {
                // Unexpected failure: fatal at the stage boundary, no retry.
                error!(stage = self.name(), error = %err, "unexpected stage failure");
                return Attempted::Fatal(format!(
                    "unexpected error in {}: {}",
                    self.kind.display_name(),
                    err
                ));
            }

            if state.retry_count < policy.max_retries {
                state.retry_count += 1;
            }

            match policy.resolve(self.name(), &err, state.retry_count) {
                Decision::Retry => {
                    warn!(
                        stage = self.name(),
                        attempt = state.retry_count,
                        max = policy.max_retries,
                        error = %err,
                        "retrying stage"
                    );
                    emit(
                        &ctx.event_handler,
                        Event::RetryAttempt {
                            stage: self.name().into(),
                            attempt: state.retry_count,
                            reason: err.to_string(),
                        },
                    );
                    tokio::time::sleep(policy.pause).await;
                }
                Decision::Skip => return Attempted::Skip,
                Decision::Abort => {
                    error!(stage = self.name(), error = %err, "aborting after maximum retries");
                    return Attempted::Fatal(format!(
                        "{} failed after maximum retries",
                        self.kind.display_name()
                    ));
                }
            }
        }
    }

    /// One backend call. Empty or whitespace-only text is a failure
    /// equivalent to a transport error.
    async fn attempt(&self, ctx: &ExecCtx, prompt: &str) -> Result<String> {
        let request = LlmRequest::new(&self.model, prompt);

        let stage = self.name().to_string();
        let event_handler = ctx.event_handler.clone();
        let mut on_retry = |attempt: u32, delay: std::time::Duration, reason: &str| {
            emit(
                &event_handler,
                Event::TransportRetry {
                    stage: stage.clone(),
                    attempt,
                    delay_ms: delay.as_millis() as u64,
                    reason: reason.to_string(),
                },
            );
        };

        let response = backend::with_backoff(
            &ctx.backend,
            &ctx.client,
            &ctx.base_url,
            &request,
            &ctx.backoff,
            ctx.cancel_flag(),
            Some(&mut on_retry),
        )
        .await?;

        let text = response.text.trim();
        if text.is_empty() {
            return Err(PipelineError::EmptyResponse(self.name().to_string()));
        }
        Ok(text.to_string())
    }
}

/// Internal outcome of the attempt loop.
enum Attempted {
    Ok(String),
    Skip,
    Fatal(String),
}
