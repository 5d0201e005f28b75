//! Example: retry, fallback, and escalation against a flaky backend.
//!
//! The mock fails the title stage until its budget is spent, so the pipeline
//! degrades to the deterministic fallback title and still produces content.
//!
//! Run with: `cargo run --example flaky_backend`

use blogforge::backend::{MockBackend, MockOutcome};
use blogforge::events::{Event, FnEventHandler};
use blogforge::{BlogPipeline, BlogRequest, ExecCtx, ExhaustedAction, RetryPolicy};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Three failures exhaust the title stage's budget; the next response
    // serves the content stage.
    let mock = MockBackend::new(vec![
        MockOutcome::HttpFailure(503),
        MockOutcome::HttpFailure(503),
        MockOutcome::HttpFailure(503),
        MockOutcome::Text("Even without a title, the show goes on...".into()),
    ]);

    let ctx = ExecCtx::builder("http://unused")
        .backend(Arc::new(mock))
        .event_handler(Arc::new(FnEventHandler(|event: Event| match event {
            Event::RetryAttempt { stage, attempt, reason } => {
                println!("[retry] {} attempt {}: {}", stage, attempt, reason)
            }
            Event::FallbackApplied { stage, value } => {
                println!("[fallback] {} -> {:?}", stage, value)
            }
            Event::StageEnd { stage, ok } => println!("[done] {} ok={}", stage, ok),
            _ => {}
        })))
        .build();

    let pipeline = BlogPipeline::builder()
        .policy(
            RetryPolicy::new(3)
                .with_pause(Duration::from_millis(100))
                .with_exhausted_action(ExhaustedAction::Skip),
        )
        .build()?;

    let state = pipeline
        .run(&ctx, BlogRequest::new("resilience", "English"))
        .await;

    println!("---");
    println!("title:   {:?}", state.blog.title);
    println!("content: {:?}", state.blog.content);
    println!("error:   {:?}", state.error);
    Ok(())
}
