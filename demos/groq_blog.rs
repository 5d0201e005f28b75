//! Example: generate a real blog post via the Groq API.
//!
//! Requires `GROQ_API_KEY` in the environment (or a `.env` file).
//!
//! Run with: `cargo run --example groq_blog -- "Artificial Intelligence" English`

use blogforge::resolver::StdinResolver;
use blogforge::{BlogPipeline, ExecCtx, RetryPolicy, Settings};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blogforge=info".into()),
        )
        .init();

    let settings = Settings::from_env();
    let api_key = settings
        .api_key
        .clone()
        .ok_or("GROQ_API_KEY is not set; see .env.example")?;

    let mut args = std::env::args().skip(1);
    let topic = args.next().unwrap_or_default();
    let language = args.next().unwrap_or(settings.default_language.clone());

    let ctx = ExecCtx::builder(&settings.base_url)
        .groq(api_key)
        .timeout(settings.request_timeout)
        .build();

    // Interactive resolver: prompts on stdin when the topic is missing,
    // matching unattended defaults everywhere else.
    let pipeline = BlogPipeline::builder()
        .model(&settings.model)
        .policy(RetryPolicy::new(settings.max_retries))
        .resolver(Arc::new(StdinResolver))
        .build()?;

    let blog = pipeline.generate(&ctx, topic, language).await?;
    println!("# {}\n", blog.title.unwrap_or_default());
    println!("{}", blog.content.unwrap_or_default());
    Ok(())
}
