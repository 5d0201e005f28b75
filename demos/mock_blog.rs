//! Example: full pipeline run against the mock backend.
//!
//! Run with: `cargo run --example mock_blog`

use blogforge::backend::MockBackend;
use blogforge::{BlogPipeline, BlogRequest, ExecCtx};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Canned responses: one for the title stage, one for the content stage.
    let mock = MockBackend::responses(vec![
        "The Rise of Rust in Systems Programming".into(),
        "## Why Rust?\n\nRust pairs memory safety with performance...".into(),
    ]);

    let ctx = ExecCtx::builder("http://unused")
        .backend(Arc::new(mock))
        .build();

    let pipeline = BlogPipeline::builder().build()?;
    let state = pipeline
        .run(&ctx, BlogRequest::new("Rust", "English"))
        .await;

    match state.outcome() {
        Ok(blog) => {
            println!("Title: {}", blog.title.as_deref().unwrap_or("<none>"));
            println!("---");
            println!("{}", blog.content.as_deref().unwrap_or("<none>"));
        }
        Err(error) => eprintln!("generation failed: {}", error),
    }

    Ok(())
}
