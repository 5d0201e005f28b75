//! Event system for pipeline lifecycle hooks.
//!
//! Provides an optional, non-intrusive way to observe a generation run.
//! The engine and stages emit events as they start, retry, degrade to
//! fallbacks, and finish. Users can implement [`EventHandler`] to receive
//! these events for logging, progress bars, or UI updates.

use std::sync::Arc;

/// Events emitted during a generation run.
#[derive(Debug, Clone)]
pub enum Event {
    /// A stage has started executing.
    StageStart {
        /// Stage name (e.g. `"title"`, `"content"`).
        stage: String,
    },
    /// A stage has finished executing.
    StageEnd {
        /// Stage name.
        stage: String,
        /// Whether the stage produced a value (including a fallback).
        ok: bool,
    },
    /// A failed attempt is about to be retried.
    RetryAttempt {
        /// Stage name.
        stage: String,
        /// Failure count so far for this stage (1-indexed).
        attempt: u32,
        /// Why the retry was triggered.
        reason: String,
    },
    /// The retry budget was exhausted and the stage degraded to its fallback.
    FallbackApplied {
        /// Stage name.
        stage: String,
        /// The deterministic fallback value that was written.
        value: String,
    },
    /// A transport-level retry inside a single backend call.
    TransportRetry {
        /// Stage or operation name.
        stage: String,
        /// The retry attempt number (1-indexed).
        attempt: u32,
        /// Delay before this retry attempt in milliseconds.
        delay_ms: u64,
        /// Reason for the retry (error description).
        reason: String,
    },
}

/// Handler for pipeline lifecycle events.
///
/// Entirely optional — the pipeline works without one.
///
/// # Example
///
/// ```
/// use blogforge::events::{Event, EventHandler};
///
/// struct PrintHandler;
///
/// impl EventHandler for PrintHandler {
///     fn on_event(&self, event: Event) {
///         match event {
///             Event::StageStart { stage } => println!("[start] {}", stage),
///             Event::StageEnd { stage, ok } => println!("[end] {} ok={}", stage, ok),
///             _ => {}
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    /// Called when the pipeline emits an event.
    fn on_event(&self, event: Event);
}

/// Emit an event if a handler is present. No-op otherwise.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: Event) {
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
///
/// # Example
///
/// ```
/// use blogforge::events::{Event, FnEventHandler};
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnEventHandler(|event: Event| {
///     if let Event::FallbackApplied { stage, .. } = event {
///         eprintln!("{} degraded to fallback", stage);
///     }
/// }));
/// ```
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}
