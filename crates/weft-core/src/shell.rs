//! Shell and terminal execution contract.
//!
//! The shell step runs a one-shot command; the terminal step runs inside a
//! named long-lived session. Process mechanics live in weft-infra.

use async_trait::async_trait;

use weft_types::error::EngineError;

/// Command execution backend for the shell and terminal step kinds.
#[async_trait]
pub trait ShellRunner: Send + Sync {
    /// Run a one-shot command and return its stdout.
    ///
    /// A non-zero exit or spawn failure is [`EngineError::Shell`]
    /// (retryable).
    async fn run(&self, command: &str) -> Result<String, EngineError>;

    /// Run a command inside a named terminal session.
    ///
    /// An unknown or dead session is [`EngineError::TerminalUnavailable`]
    /// (never retried).
    async fn run_in_session(&self, session: &str, command: &str) -> Result<String, EngineError>;
}
