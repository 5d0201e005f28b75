//! The pipeline engine: an explicit finite-state machine over the stages.
//!
//! The graph is small and fixed: `Start → title → {content | End}`, then
//! `content → {translate | End}` when translation is enabled, then `End`.
//! Conditional edges inspect only the State Record's `error` and `topic`
//! fields; all reachable nodes and terminal conditions are enumerable, and
//! [`BlogPipeline::next_node`] is a pure function over `(Node, &BlogState)`.
//!
//! The engine never raises: every stage failure is converted into
//! `state.error` before the terminal edge, and [`BlogPipeline::run`] always
//! returns the final State Record.

use crate::backend::groq::DEFAULT_MODEL;
use crate::error::{PipelineError, Result};
use crate::events::{emit, Event};
use crate::exec_ctx::ExecCtx;
use crate::policy::RetryPolicy;
use crate::resolver::{InputResolver, UnattendedResolver};
use crate::stage::{GenerationStage, StageKind};
use crate::state::{Blog, BlogState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Nodes of the generation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    /// Fixed entry point.
    Start,
    /// Title generation stage.
    Title,
    /// Content generation stage.
    Content,
    /// Optional translation stage.
    Translate,
    /// Terminal node. Inspects `state.error`, performs no mutation.
    End,
}

impl Node {
    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Node::Start => "start",
            Node::Title => "title",
            Node::Content => "content",
            Node::Translate => "translate",
            Node::End => "end",
        }
    }

    /// The stage executed at this node, if any.
    fn stage_kind(&self) -> Option<StageKind> {
        match self {
            Node::Title => Some(StageKind::Title),
            Node::Content => Some(StageKind::Content),
            Node::Translate => Some(StageKind::Translation),
            Node::Start | Node::End => None,
        }
    }
}

/// Input to a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogRequest {
    /// The blog topic.
    pub topic: String,

    /// Target language. Empty means the default ("English").
    #[serde(default)]
    pub language: String,
}

impl BlogRequest {
    pub fn new(topic: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            language: language.into(),
        }
    }
}

/// The directed-graph executor for blog generation.
///
/// Holds the run-independent configuration (model, retry policy, input
/// resolver, translation routing). Each invocation of [`run`](Self::run)
/// gets its own State Record; a pipeline can serve requests one at a time
/// from a single-threaded worker, or be cloned per in-flight request.
///
/// # Example
///
/// ```
/// use blogforge::{BlogPipeline, ExecCtx, backend::MockBackend};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let ctx = ExecCtx::builder("http://unused")
///     .backend(Arc::new(MockBackend::responses(vec![
///         "Generated Title".into(),
///         "Generated Content...".into(),
///     ])))
///     .build();
///
/// let pipeline = BlogPipeline::builder().build().unwrap();
/// let blog = pipeline.generate(&ctx, "Artificial Intelligence", "English").await.unwrap();
/// assert_eq!(blog.title.as_deref(), Some("Generated Title"));
/// # });
/// ```
#[derive(Clone)]
pub struct BlogPipeline {
    model: String,
    policy: RetryPolicy,
    resolver: Arc<dyn InputResolver>,
    translate: bool,
    supported_languages: Vec<String>,
}

impl std::fmt::Debug for BlogPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlogPipeline")
            .field("model", &self.model)
            .field("policy", &self.policy)
            .field("translate", &self.translate)
            .field("supported_languages", &self.supported_languages)
            .finish()
    }
}

impl BlogPipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> BlogPipelineBuilder {
        BlogPipelineBuilder::new()
    }

    /// Pure transition function: the edge taken after `node` given `state`.
    pub fn next_node(&self, node: Node, state: &BlogState) -> Node {
        match node {
            Node::Start => Node::Title,
            Node::Title => {
                if state.is_failed() {
                    info!(error = state.error.as_deref(), "stopping: stage failed");
                    return Node::End;
                }
                // Defensive re-check: the stage resolves a missing topic itself.
                if state.topic().is_none() {
                    warn!("stopping: no topic available");
                    return Node::End;
                }
                if state.blog.title.is_none() {
                    warn!("proceeding to content without a title");
                }
                Node::Content
            }
            Node::Content => {
                if !state.is_failed() && self.wants_translation(&state.language) {
                    Node::Translate
                } else {
                    Node::End
                }
            }
            Node::Translate => Node::End,
            Node::End => Node::End,
        }
    }

    /// Whether the run should route through the translation stage.
    fn wants_translation(&self, language: &str) -> bool {
        if !self.translate {
            return false;
        }
        let language = language.to_lowercase();
        if language == "english" {
            return false;
        }
        if self.supported_languages.iter().any(|l| *l == language) {
            true
        } else {
            warn!(language = %language, "unsupported language, skipping translation");
            false
        }
    }

    /// Execute the pipeline for one request.
    ///
    /// Never returns an error: all stage failures are normalized into the
    /// returned State Record's `error` field.
    pub async fn run(&self, ctx: &ExecCtx, request: BlogRequest) -> BlogState {
        let mut state = BlogState::new(request.topic, request.language);
        let mut node = Node::Start;

        while node != Node::End {
            let next = self.next_node(node, &state);
            debug!(from = node.name(), to = next.name(), "transition");
            node = next;

            let Some(kind) = node.stage_kind() else {
                continue;
            };

            let stage = GenerationStage::new(kind, &self.model);
            emit(
                &ctx.event_handler,
                Event::StageStart {
                    stage: stage.name().into(),
                },
            );
            let update = stage
                .execute(ctx, &self.policy, self.resolver.as_ref(), &mut state)
                .await;
            emit(
                &ctx.event_handler,
                Event::StageEnd {
                    stage: stage.name().into(),
                    ok: !update.is_error(),
                },
            );
            // The stage mutates the state directly; merging its partial
            // update keeps both views in agreement.
            state.apply(update);
        }

        match state.outcome() {
            Ok(_) => info!("generation finished"),
            Err(error) => info!(error, "generation failed"),
        }
        state
    }

    /// Convenience wrapper: run and convert the final state into a result.
    ///
    /// Returns the finished [`Blog`] or the run's fatal error.
    pub async fn generate(
        &self,
        ctx: &ExecCtx,
        topic: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Blog> {
        let state = self.run(ctx, BlogRequest::new(topic, language)).await;
        match state.outcome() {
            Ok(blog) => Ok(blog.clone()),
            Err(message) => Err(PipelineError::Other(message.to_string())),
        }
    }
}

/// Builder for [`BlogPipeline`].
pub struct BlogPipelineBuilder {
    model: String,
    policy: RetryPolicy,
    resolver: Arc<dyn InputResolver>,
    translate: bool,
    supported_languages: Vec<String>,
}

impl BlogPipelineBuilder {
    pub fn new() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            policy: RetryPolicy::default(),
            resolver: Arc::new(UnattendedResolver),
            translate: false,
            supported_languages: vec!["hindi".into(), "spanish".into()],
        }
    }

    /// Set the model used by every stage.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the retry policy shared by the stages.
    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the input resolver consulted for missing fields.
    pub fn resolver(mut self, resolver: Arc<dyn InputResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Enable or disable the translation stage.
    pub fn translation(mut self, enabled: bool) -> Self {
        self.translate = enabled;
        self
    }

    /// Set the languages the translation stage accepts (lowercased).
    pub fn supported_languages(mut self, languages: Vec<String>) -> Self {
        self.supported_languages = languages.into_iter().map(|l| l.to_lowercase()).collect();
        self
    }

    /// Build the pipeline, validating configuration.
    pub fn build(self) -> Result<BlogPipeline> {
        if self.model.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "pipeline model cannot be empty".to_string(),
            ));
        }
        Ok(BlogPipeline {
            model: self.model,
            policy: self.policy,
            resolver: self.resolver,
            translate: self.translate,
            supported_languages: self.supported_languages,
        })
    }
}

impl Default for BlogPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, MockOutcome};
    use crate::events::FnEventHandler;
    use crate::policy::{ExhaustedAction, RetryPolicy};
    use crate::resolver::CancelledResolver;
    use std::sync::Mutex;
    use std::time::Duration;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries).with_pause(Duration::from_millis(1))
    }

    fn ctx_with(mock: Arc<MockBackend>) -> ExecCtx {
        ExecCtx::builder("http://unused").backend(mock).build()
    }

    fn pipeline(max_retries: u32, action: ExhaustedAction) -> BlogPipeline {
        BlogPipeline::builder()
            .policy(fast_policy(max_retries).with_exhausted_action(action))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_happy_path_scenario() {
        let ctx = ctx_with(Arc::new(MockBackend::responses(vec![
            "Generated Title".into(),
            "Generated Content...".into(),
        ])));
        let pipeline = pipeline(3, ExhaustedAction::Skip);

        let state = pipeline
            .run(&ctx, BlogRequest::new("Artificial Intelligence", "English"))
            .await;

        assert_eq!(state.blog.title.as_deref(), Some("Generated Title"));
        assert_eq!(state.blog.content.as_deref(), Some("Generated Content..."));
        assert!(state.error.is_none());
        assert_eq!(state.retry_count, 0);
    }

    #[tokio::test]
    async fn test_failures_shorter_than_budget_recover() {
        // Title needs three attempts, content one; both stages end clean.
        let mock = Arc::new(MockBackend::new(vec![
            MockOutcome::HttpFailure(503),
            MockOutcome::HttpFailure(503),
            MockOutcome::Text("Recovered Title".into()),
            MockOutcome::Text("Body".into()),
        ]));
        let ctx = ctx_with(mock.clone());
        let pipeline = pipeline(3, ExhaustedAction::Abort);

        let state = pipeline.run(&ctx, BlogRequest::new("Rust", "English")).await;

        assert_eq!(state.blog.title.as_deref(), Some("Recovered Title"));
        assert_eq!(state.blog.content.as_deref(), Some("Body"));
        assert!(state.error.is_none());
        assert_eq!(state.retry_count, 0, "retry transparency");
        assert_eq!(mock.calls(), 4);
    }

    #[tokio::test]
    async fn test_title_skip_still_generates_content() {
        // Exactly max_retries failures, then the content response.
        let mock = Arc::new(MockBackend::new(vec![
            MockOutcome::HttpFailure(503),
            MockOutcome::HttpFailure(503),
            MockOutcome::HttpFailure(503),
            MockOutcome::Text("Body after skip".into()),
        ]));
        let ctx = ctx_with(mock.clone());
        let pipeline = pipeline(3, ExhaustedAction::Skip);

        let state = pipeline.run(&ctx, BlogRequest::new("X", "English")).await;

        assert_eq!(state.blog.title.as_deref(), Some("Blog about X"));
        assert_eq!(state.blog.content.as_deref(), Some("Body after skip"));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_title_abort_prevents_content_stage() {
        let mock = Arc::new(MockBackend::always_failing(503));
        let ctx = ctx_with(mock.clone());
        let pipeline = pipeline(3, ExhaustedAction::Abort);

        let state = pipeline.run(&ctx, BlogRequest::new("Rust", "English")).await;

        assert_eq!(
            state.error.as_deref(),
            Some("title generation failed after maximum retries")
        );
        assert!(state.blog.content.is_none());
        assert_eq!(mock.calls(), 3, "content stage never called the backend");
    }

    #[tokio::test]
    async fn test_content_abort_surfaces_error() {
        let mock = Arc::new(MockBackend::new(vec![
            MockOutcome::Text("Title".into()),
            MockOutcome::HttpFailure(500),
        ]));
        let ctx = ctx_with(mock);
        let pipeline = pipeline(1, ExhaustedAction::Abort);

        let state = pipeline.run(&ctx, BlogRequest::new("Rust", "English")).await;

        assert_eq!(
            state.error.as_deref(),
            Some("content generation failed after maximum retries")
        );
        assert!(state.outcome().is_err());
    }

    #[tokio::test]
    async fn test_cancelled_topic_resolution_is_fatal() {
        let mock = Arc::new(MockBackend::fixed("never reached"));
        let ctx = ctx_with(mock.clone());
        let pipeline = BlogPipeline::builder()
            .policy(fast_policy(3))
            .resolver(Arc::new(CancelledResolver))
            .build()
            .unwrap();

        let state = pipeline.run(&ctx, BlogRequest::new("", "English")).await;

        assert_eq!(state.error.as_deref(), Some("topic input cancelled by user"));
        assert!(state.blog.title.is_none());
        assert!(state.blog.content.is_none());
        assert_eq!(mock.calls(), 0, "no stage reached the backend");
    }

    #[tokio::test]
    async fn test_idempotent_against_deterministic_backend() {
        let pipeline = pipeline(3, ExhaustedAction::Skip);
        let mut results = Vec::new();
        for _ in 0..2 {
            let ctx = ctx_with(Arc::new(MockBackend::responses(vec![
                "Same Title".into(),
                "Same Content".into(),
            ])));
            let state = pipeline.run(&ctx, BlogRequest::new("Rust", "English")).await;
            results.push(state.blog);
        }
        assert_eq!(results[0], results[1]);
    }

    #[tokio::test]
    async fn test_generate_returns_blog() {
        let ctx = ctx_with(Arc::new(MockBackend::responses(vec![
            "T".into(),
            "C".into(),
        ])));
        let blog = pipeline(3, ExhaustedAction::Skip)
            .generate(&ctx, "Rust", "English")
            .await
            .unwrap();
        assert!(blog.is_complete());
    }

    #[tokio::test]
    async fn test_generate_maps_failure_to_error() {
        let ctx = ctx_with(Arc::new(MockBackend::always_failing(503)));
        let err = pipeline(1, ExhaustedAction::Abort)
            .generate(&ctx, "Rust", "English")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed after maximum retries"));
    }

    #[tokio::test]
    async fn test_translation_routes_supported_language() {
        let mock = Arc::new(MockBackend::responses(vec![
            "Title".into(),
            "English body".into(),
            "Cuerpo en español".into(),
        ]));
        let ctx = ctx_with(mock.clone());
        let pipeline = BlogPipeline::builder()
            .policy(fast_policy(3))
            .translation(true)
            .build()
            .unwrap();

        let state = pipeline.run(&ctx, BlogRequest::new("Rust", "Spanish")).await;

        assert_eq!(state.blog.content.as_deref(), Some("Cuerpo en español"));
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_translation_skipped_for_unsupported_language() {
        let mock = Arc::new(MockBackend::responses(vec![
            "Title".into(),
            "Corps en français".into(),
        ]));
        let ctx = ctx_with(mock.clone());
        let pipeline = BlogPipeline::builder()
            .policy(fast_policy(3))
            .translation(true)
            .build()
            .unwrap();

        let state = pipeline.run(&ctx, BlogRequest::new("Rust", "French")).await;

        assert_eq!(state.blog.content.as_deref(), Some("Corps en français"));
        assert_eq!(mock.calls(), 2, "no translation call");
    }

    #[tokio::test]
    async fn test_translation_disabled_by_default() {
        let mock = Arc::new(MockBackend::responses(vec![
            "Title".into(),
            "Cuerpo".into(),
        ]));
        let ctx = ctx_with(mock.clone());
        let pipeline = pipeline(3, ExhaustedAction::Skip);

        pipeline.run(&ctx, BlogRequest::new("Rust", "Spanish")).await;

        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_stage_events_emitted_in_order() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let ctx = ExecCtx::builder("http://unused")
            .backend(Arc::new(MockBackend::responses(vec![
                "T".into(),
                "C".into(),
            ])))
            .event_handler(Arc::new(FnEventHandler(move |event| {
                let tag = match event {
                    Event::StageStart { stage } => format!("start:{}", stage),
                    Event::StageEnd { stage, ok } => format!("end:{}:{}", stage, ok),
                    _ => return,
                };
                sink.lock().unwrap().push(tag);
            })))
            .build();

        pipeline(3, ExhaustedAction::Skip)
            .run(&ctx, BlogRequest::new("Rust", "English"))
            .await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["start:title", "end:title:true", "start:content", "end:content:true"]
        );
    }

    #[test]
    fn test_transition_table() {
        let pipeline = pipeline(3, ExhaustedAction::Skip);
        let mut state = BlogState::new("Rust", "English");

        assert_eq!(pipeline.next_node(Node::Start, &state), Node::Title);
        assert_eq!(pipeline.next_node(Node::Title, &state), Node::Content);
        assert_eq!(pipeline.next_node(Node::Content, &state), Node::End);
        assert_eq!(pipeline.next_node(Node::End, &state), Node::End);

        state.fail("boom");
        assert_eq!(pipeline.next_node(Node::Title, &state), Node::End);
        assert_eq!(pipeline.next_node(Node::Content, &state), Node::End);
    }

    #[test]
    fn test_transition_stops_without_topic() {
        let pipeline = pipeline(3, ExhaustedAction::Skip);
        let state = BlogState::new("", "English");
        assert_eq!(pipeline.next_node(Node::Title, &state), Node::End);
    }

    #[test]
    fn test_builder_rejects_empty_model() {
        let result = BlogPipeline::builder().model("  ").build();
        assert!(matches!(
            result.unwrap_err(),
            PipelineError::InvalidConfig(_)
        ));
    }
}
