//! Engine error taxonomy.
//!
//! Every failure the engine can surface is one of these kinds. The taxonomy
//! drives two behaviors:
//!
//! - **Retry classification**: [`EngineError::is_retryable`] decides whether
//!   the step-sequence runner's automatic retry wrapper may re-attempt a
//!   step. Configuration and connectivity problems are never retried.
//! - **Outcome classification**: `Stopped` is a distinguished successful
//!   early-termination signal (not a true error) and `Cancelled` maps to the
//!   cancelled run classification; everything else is a failure.

use thiserror::Error;

/// All failure (and signal) kinds produced by the workflow engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The browser transport is not attached or not connected.
    #[error("browser extension not connected")]
    BrowserNotConnected,

    /// A browser action failed after reaching the transport. Retryable.
    #[error("browser action failed: {0}")]
    Browser(String),

    /// A shell command failed to spawn or exited non-zero. Retryable.
    #[error("shell execution failed: {0}")]
    Shell(String),

    /// A named terminal session does not exist or cannot be used.
    #[error("terminal session unavailable: {0}")]
    TerminalUnavailable(String),

    /// The LLM configuration is unusable (missing credentials, bad provider).
    #[error("LLM configuration error: {0}")]
    LlmConfig(String),

    /// An LLM call failed at runtime (network, HTTP status, bad response).
    /// Retryable.
    #[error("LLM call failed: {0}")]
    Llm(String),

    /// A step kind the engine does not implement.
    #[error("unknown step kind: {0}")]
    UnknownStep(String),

    /// A retryable step failed every automatic attempt.
    #[error("step failed after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },

    /// Successful early termination raised by the stop step. Not a failure.
    #[error("workflow stopped")]
    Stopped { message: Option<String> },

    /// The run's shared cancellation cell was set.
    #[error("workflow cancelled by user")]
    Cancelled,

    /// No workflow with the requested identifier exists in any registry.
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),

    /// A nested call would exceed the maximum nesting depth.
    #[error("maximum call depth {max} exceeded (call chain: {chain})")]
    MaxDepthExceeded { max: u32, chain: String },

    /// A nested call targets a workflow already on the call stack.
    #[error("circular call to '{workflow}' detected (call chain: {chain})")]
    CircularCall { workflow: String, chain: String },

    /// A nested workflow failed; wraps the inner error with the target id.
    #[error("nested workflow '{workflow}' failed: {source}")]
    NestedCall {
        workflow: String,
        #[source]
        source: Box<EngineError>,
    },

    /// A workflow source file is malformed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A workflow definition violates a structural or policy constraint.
    #[error("validation error: {0}")]
    Validation(String),
}

impl EngineError {
    /// Whether the automatic step retry wrapper may re-attempt after this
    /// failure.
    ///
    /// Only transient runtime faults qualify. Terminal signals (`Stopped`,
    /// `Cancelled`), configuration/connectivity problems, and structural
    /// errors propagate immediately on first occurrence.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Browser(_) | EngineError::Shell(_) | EngineError::Llm(_)
        )
    }

    /// Whether this is the distinguished terminal-stop signal.
    pub fn is_stop(&self) -> bool {
        matches!(self, EngineError::Stopped { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_faults_are_retryable() {
        assert!(EngineError::Browser("click missed".into()).is_retryable());
        assert!(EngineError::Shell("exit 1".into()).is_retryable());
        assert!(EngineError::Llm("HTTP 503".into()).is_retryable());
    }

    #[test]
    fn configuration_and_signal_kinds_are_not_retryable() {
        let never = [
            EngineError::BrowserNotConnected,
            EngineError::TerminalUnavailable("build".into()),
            EngineError::LlmConfig("missing api key".into()),
            EngineError::UnknownStep("teleport".into()),
            EngineError::Stopped { message: None },
            EngineError::Cancelled,
            EngineError::WorkflowNotFound("ghost".into()),
            EngineError::NestedCall {
                workflow: "child".into(),
                source: Box::new(EngineError::Cancelled),
            },
        ];
        assert!(never.iter().all(|e| !e.is_retryable()));
    }

    #[test]
    fn nested_call_display_names_the_target() {
        let err = EngineError::NestedCall {
            workflow: "fetch-prices".into(),
            source: Box::new(EngineError::WorkflowNotFound("helper".into())),
        };
        let text = err.to_string();
        assert!(text.contains("fetch-prices"));
        assert!(text.contains("workflow not found: helper"));
    }

    #[test]
    fn cancelled_display_is_the_fixed_message() {
        assert_eq!(
            EngineError::Cancelled.to_string(),
            "workflow cancelled by user"
        );
    }
}
