//! Input resolution for missing State Record fields.
//!
//! When a stage finds a required input absent (a missing topic, usually), it
//! asks an injected [`InputResolver`] rather than reading from a terminal
//! directly. A server installs [`UnattendedResolver`] so a missing field
//! fails immediately with a descriptive error; a CLI can install
//! [`StdinResolver`] to prompt the operator on the terminal instead.

use std::io::{BufRead, Write};

/// Which field the stage is trying to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingInput {
    /// The blog topic, required by every stage.
    Topic,
}

impl MissingInput {
    /// Field name used in prompts and error messages.
    pub fn field(&self) -> &'static str {
        match self {
            MissingInput::Topic => "topic",
        }
    }
}

/// Why resolution failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The operator cancelled the prompt (Ctrl-C / EOF in the interactive case).
    Cancelled,
    /// No resolver capable of supplying the field is available.
    Unavailable,
    /// Something else went wrong.
    Failed(String),
}

/// Collaborator that supplies a missing required input.
///
/// The contract is narrow and synchronous: return a non-empty string or an
/// error. The stage maps any error to a fatal `state.error` — missing-input
/// failures are never retried.
pub trait InputResolver: Send + Sync {
    /// Supply a value for the missing field.
    fn resolve(&self, request: MissingInput) -> Result<String, ResolveError>;
}

/// Resolver for unattended/server execution: always fails, immediately.
///
/// This is the default. A request that reaches generation without a topic is
/// a caller bug in a server context, and blocking on terminal input would
/// hang the worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnattendedResolver;

impl InputResolver for UnattendedResolver {
    fn resolve(&self, request: MissingInput) -> Result<String, ResolveError> {
        Err(ResolveError::Failed(format!(
            "missing required field: {}",
            request.field()
        )))
    }
}

/// Resolver that prompts on standard input, for interactive CLI use.
///
/// Re-prompts on empty input; EOF maps to [`ResolveError::Cancelled`].
/// Blocks the calling thread, so it has no place in a server.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinResolver;

impl InputResolver for StdinResolver {
    fn resolve(&self, request: MissingInput) -> Result<String, ResolveError> {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            print!("Please provide a {} for the blog: ", request.field());
            std::io::stdout()
                .flush()
                .map_err(|e| ResolveError::Failed(e.to_string()))?;

            line.clear();
            let read = stdin
                .lock()
                .read_line(&mut line)
                .map_err(|e| ResolveError::Failed(e.to_string()))?;
            if read == 0 {
                return Err(ResolveError::Cancelled);
            }
            let value = line.trim();
            if !value.is_empty() {
                return Ok(value.to_string());
            }
            println!("Input cannot be empty. Please try again.");
        }
    }
}

/// Resolver returning a fixed value, for tests and scripted runs.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    value: String,
}

impl StaticResolver {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl InputResolver for StaticResolver {
    fn resolve(&self, _request: MissingInput) -> Result<String, ResolveError> {
        Ok(self.value.clone())
    }
}

/// Resolver that always reports cancellation, for tests of the fatal path.
#[derive(Debug, Clone, Copy, Default)]
pub struct CancelledResolver;

impl InputResolver for CancelledResolver {
    fn resolve(&self, _request: MissingInput) -> Result<String, ResolveError> {
        Err(ResolveError::Cancelled)
    }
}
