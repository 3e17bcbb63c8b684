//! Process-backed [`ShellRunner`].
//!
//! One-shot commands run through `sh -c`; terminal sessions are a named
//! working-directory table, so a "session" is a registered cwd rather than a
//! live PTY. An unregistered session name is `TerminalUnavailable`, which
//! the engine never retries.

use std::path::PathBuf;
use std::process::Output;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::process::Command;

use weft_core::shell::ShellRunner;
use weft_types::error::EngineError;

/// Shell runner spawning `sh -c` child processes.
#[derive(Default)]
pub struct ProcessShellRunner {
    /// session name -> working directory
    sessions: DashMap<String, PathBuf>,
}

impl ProcessShellRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-point) a named terminal session.
    pub fn register_session(&self, name: impl Into<String>, cwd: impl Into<PathBuf>) {
        let name = name.into();
        let cwd = cwd.into();
        tracing::debug!(session = name.as_str(), cwd = %cwd.display(), "registering terminal session");
        self.sessions.insert(name, cwd);
    }

    async fn spawn(&self, command: &str, cwd: Option<PathBuf>) -> Result<String, EngineError> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| EngineError::Shell(format!("failed to spawn: {e}")))?;
        collect_stdout(command, output)
    }
}

/// Turn a finished process into trimmed stdout, or a shell error carrying
/// stderr (or the exit status when stderr is empty).
fn collect_stdout(command: &str, output: Output) -> Result<String, EngineError> {
    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.trim_end_matches('\n').to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = if stderr.trim().is_empty() {
            output.status.to_string()
        } else {
            stderr.trim().to_string()
        };
        tracing::warn!(command, %detail, "shell command failed");
        Err(EngineError::Shell(detail))
    }
}

#[async_trait]
impl ShellRunner for ProcessShellRunner {
    async fn run(&self, command: &str) -> Result<String, EngineError> {
        self.spawn(command, None).await
    }

    async fn run_in_session(&self, session: &str, command: &str) -> Result<String, EngineError> {
        let Some(cwd) = self.sessions.get(session).map(|entry| entry.value().clone()) else {
            return Err(EngineError::TerminalUnavailable(session.to_string()));
        };
        self.spawn(command, Some(cwd)).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
