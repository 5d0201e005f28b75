//! Bounded-retry and fallback policy.
//!
//! The decision logic is split from execution so it can be unit-tested
//! without any I/O: [`decide`] is a pure function over the attempt counter,
//! and the stages apply its verdict inside their attempt loops. At budget
//! exhaustion the verdict comes from an [`ExhaustedAction`] configuration or
//! a caller-supplied [`EscalationHandler`] — never an interactive prompt.

use crate::error::PipelineError;
use std::sync::Arc;
use std::time::Duration;

/// What a stage should do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Re-attempt after the configured pause.
    ///
    /// At exhaustion this is an explicit override: it forces one more attempt
    /// without resetting the counter check, so the next failure escalates
    /// again.
    Retry,
    /// Complete the stage with its deterministic fallback value.
    Skip,
    /// Fail the run: a fatal error is recorded on the State Record.
    Abort,
}

/// Configured verdict applied when the retry budget is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExhaustedAction {
    /// Degrade to the stage's fallback value and keep the pipeline moving.
    #[default]
    Skip,
    /// Record a fatal error and stop.
    Abort,
}

impl From<ExhaustedAction> for Decision {
    fn from(action: ExhaustedAction) -> Self {
        match action {
            ExhaustedAction::Skip => Decision::Skip,
            ExhaustedAction::Abort => Decision::Abort,
        }
    }
}

/// Callback consulted when a stage has exhausted its retry budget.
///
/// This is the seam for custom escalation (an operator console, a queue
/// requeue, a metrics-driven circuit breaker). In an unattended context
/// return a fixed [`Decision`], or use [`RetryPolicy::on_exhausted`] and
/// skip the handler entirely.
pub trait EscalationHandler: Send + Sync {
    /// Decide what to do for `stage` after `attempts` consecutive failures.
    fn on_exhausted(&self, stage: &str, error: &PipelineError, attempts: u32) -> Decision;
}

/// An [`EscalationHandler`] backed by a closure.
pub struct FnEscalation<F: Fn(&str, &PipelineError, u32) -> Decision + Send + Sync>(pub F);

impl<F: Fn(&str, &PipelineError, u32) -> Decision + Send + Sync> EscalationHandler
    for FnEscalation<F>
{
    fn on_exhausted(&self, stage: &str, error: &PipelineError, attempts: u32) -> Decision {
        (self.0)(stage, error, attempts)
    }
}

/// Pure decision point: ordinary retry, or escalate.
///
/// Per the decision table: while `retry_count < max_retries` the failure is
/// absorbed by an ordinary retry (the caller increments the counter); at
/// `retry_count == max_retries` the budget is spent and the three-way
/// exhaustion decision applies.
pub fn decide(retry_count: u32, max_retries: u32) -> DecisionPoint {
    if retry_count < max_retries {
        DecisionPoint::Retry
    } else {
        DecisionPoint::Exhausted
    }
}

/// Outcome of the pure decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionPoint {
    /// Budget remains: retry after the pause.
    Retry,
    /// Budget spent: resolve via [`ExhaustedAction`] / [`EscalationHandler`].
    Exhausted,
}

/// Per-stage retry configuration.
///
/// One policy instance is shared by every stage in a pipeline; the counter
/// itself lives on the State Record and is reset between stages, so each
/// stage gets the full budget.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Maximum consecutive failures absorbed before escalation.
    pub max_retries: u32,

    /// Pause between a failed attempt and its re-attempt.
    pub pause: Duration,

    /// Verdict applied at exhaustion when no handler is installed.
    pub on_exhausted: ExhaustedAction,

    /// Optional handler consulted at exhaustion instead of `on_exhausted`.
    pub handler: Option<Arc<dyn EscalationHandler>>,
}

impl RetryPolicy {
    /// Policy with the given retry budget and defaults elsewhere.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            pause: Duration::from_secs(1),
            on_exhausted: ExhaustedAction::default(),
            handler: None,
        }
    }

    /// Set the pause between attempts.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Set the exhaustion verdict.
    pub fn with_exhausted_action(mut self, action: ExhaustedAction) -> Self {
        self.on_exhausted = action;
        self
    }

    /// Install an escalation handler.
    pub fn with_handler(mut self, handler: Arc<dyn EscalationHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Resolve a stage failure into a [`Decision`].
    ///
    /// `retry_count` is the number of failures already recorded for the
    /// current stage, including this one.
    pub fn resolve(&self, stage: &str, error: &PipelineError, retry_count: u32) -> Decision {
        match decide(retry_count, self.max_retries) {
            DecisionPoint::Retry => Decision::Retry,
            DecisionPoint::Exhausted => match &self.handler {
                Some(handler) => handler.on_exhausted(stage, error, retry_count),
                None => self.on_exhausted.into(),
            },
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("pause", &self.pause)
            .field("on_exhausted", &self.on_exhausted)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transient() -> PipelineError {
        PipelineError::EmptyResponse("title".into())
    }

    #[test]
    fn test_decide_under_budget() {
        assert_eq!(decide(0, 3), DecisionPoint::Retry);
        assert_eq!(decide(2, 3), DecisionPoint::Retry);
    }

    #[test]
    fn test_decide_at_budget() {
        assert_eq!(decide(3, 3), DecisionPoint::Exhausted);
    }

    #[test]
    fn test_decide_zero_budget_escalates_immediately() {
        assert_eq!(decide(0, 0), DecisionPoint::Exhausted);
    }

    #[test]
    fn test_resolve_retry_under_budget() {
        let policy = RetryPolicy::new(3);
        assert_eq!(policy.resolve("title", &transient(), 1), Decision::Retry);
    }

    #[test]
    fn test_resolve_default_skip_at_exhaustion() {
        let policy = RetryPolicy::new(3);
        assert_eq!(policy.resolve("title", &transient(), 3), Decision::Skip);
    }

    #[test]
    fn test_resolve_configured_abort() {
        let policy = RetryPolicy::new(2).with_exhausted_action(ExhaustedAction::Abort);
        assert_eq!(policy.resolve("content", &transient(), 2), Decision::Abort);
    }

    #[test]
    fn test_handler_overrides_configured_action() {
        let policy = RetryPolicy::new(1)
            .with_exhausted_action(ExhaustedAction::Abort)
            .with_handler(Arc::new(FnEscalation(|_, _, _| Decision::Retry)));
        assert_eq!(policy.resolve("title", &transient(), 1), Decision::Retry);
    }

    #[test]
    fn test_handler_receives_stage_and_attempts() {
        let policy = RetryPolicy::new(2).with_handler(Arc::new(FnEscalation(
            |stage: &str, _err: &PipelineError, attempts| {
                assert_eq!(stage, "content");
                assert_eq!(attempts, 2);
                Decision::Abort
            },
        )));
        assert_eq!(policy.resolve("content", &transient(), 2), Decision::Abort);
    }

    #[test]
    fn test_handler_not_consulted_under_budget() {
        let policy = RetryPolicy::new(5).with_handler(Arc::new(FnEscalation(|_, _, _| {
            panic!("handler must only run at exhaustion")
        })));
        assert_eq!(policy.resolve("title", &transient(), 4), Decision::Retry);
    }
}
