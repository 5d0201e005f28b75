//! # blogforge
//!
//! Blog generation driven by an external language model, structured as a
//! small directed-graph pipeline with per-stage bounded retry and
//! deterministic fallbacks.
//!
//! A run threads one mutable [`BlogState`] through the title and content
//! stages (plus an optional translation stage). Each stage calls the
//! text-generation [`Backend`](backend::Backend), retries transient failures
//! up to a budget, and at exhaustion either degrades to a fallback value or
//! aborts the run — a decision that is configuration, never an interactive
//! prompt.
//!
//! ## Core Concepts
//!
//! - **[`BlogState`]** — the State Record: topic, language, partial blog,
//!   error, retry counter. One instance per run.
//! - **[`BlogPipeline`]** — the engine: an explicit finite-state machine
//!   (`start → title → content → end`) with conditional edges over the
//!   state's `error`/`topic` fields. Never raises; failures travel in the
//!   returned state.
//! - **[`RetryPolicy`]** — bounded retry with a pure decision function and a
//!   configurable exhaustion verdict ([`ExhaustedAction`]).
//! - **[`Backend`](backend::Backend)** — the text-generation collaborator.
//!   [`GroqBackend`](backend::GroqBackend) for the Groq cloud,
//!   [`MockBackend`](backend::MockBackend) for deterministic tests.
//! - **[`InputResolver`](resolver::InputResolver)** — supplies a missing
//!   topic; unattended by default, interactive for CLIs.
//!
//! ## Quick Start
//!
//! ```no_run
//! use blogforge::{BlogPipeline, ExecCtx, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::from_env();
//!     let ctx = ExecCtx::builder(&settings.base_url)
//!         .groq(settings.api_key.clone().unwrap_or_default())
//!         .build();
//!
//!     let pipeline = BlogPipeline::builder()
//!         .model(&settings.model)
//!         .build()?;
//!
//!     let blog = pipeline.generate(&ctx, "Artificial Intelligence", "English").await?;
//!     println!("{}\n\n{}", blog.title.unwrap(), blog.content.unwrap());
//!     Ok(())
//! }
//! ```
//!
//! ## Testing Without a Provider
//!
//! ```
//! use blogforge::{BlogPipeline, ExecCtx, backend::MockBackend};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let ctx = ExecCtx::builder("http://unused")
//!     .backend(Arc::new(MockBackend::responses(vec![
//!         "Generated Title".into(),
//!         "Generated Content...".into(),
//!     ])))
//!     .build();
//!
//! let pipeline = BlogPipeline::builder().build().unwrap();
//! let state = pipeline
//!     .run(&ctx, blogforge::BlogRequest::new("Artificial Intelligence", "English"))
//!     .await;
//! assert!(state.error.is_none());
//! # });
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod exec_ctx;
pub mod graph;
pub mod policy;
pub mod prompt;
pub mod resolver;
pub mod stage;
pub mod state;

pub use config::Settings;
pub use error::{PipelineError, Result};
pub use events::{Event, EventHandler, FnEventHandler};
pub use exec_ctx::{ExecCtx, ExecCtxBuilder};
pub use graph::{BlogPipeline, BlogPipelineBuilder, BlogRequest, Node};
pub use policy::{Decision, EscalationHandler, ExhaustedAction, RetryPolicy};
pub use stage::{GenerationStage, StageKind};
pub use state::{Blog, BlogState, StageUpdate, DEFAULT_LANGUAGE};
