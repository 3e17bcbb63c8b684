//! The workflow engine.
//!
//! - `interpolate` -- `{{name}}` substitution and condition evaluation
//! - `context` -- per-run mutable state and the event protocol
//! - `runner` -- workflow-level lifecycle and outcome classification
//! - `sequence` -- the step-sequence state machine and automatic retry
//! - `steps` -- one handler per step kind, plus the dispatcher
//!
//! `WorkflowEngine` wires the collaborators together and exposes the
//! run/cancel facade. Collaborators and the registry are shared by reference
//! across an entire context tree; all mutation happens in per-run
//! `ExecutionContext` values, strictly sequentially.

pub mod context;
pub mod interpolate;
pub mod runner;
pub mod sequence;
pub mod steps;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use weft_types::error::EngineError;
use weft_types::event::RunEvent;
use weft_types::llm::LlmConfig;

use crate::llm::LlmBackend;
use crate::registry::WorkflowRegistry;
use crate::shell::ShellRunner;
use crate::transport::BrowserTransport;

use self::context::{EventSink, ExecutionContext};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunable engine limits and delays.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Automatic retries beyond the first attempt for retryable step
    /// failures (3 retries = 4 total tries).
    pub max_step_retries: u32,
    /// Base inter-attempt delay; the n-th retry waits `base * n`.
    pub retry_base_delay: Duration,
    /// Maximum nested-call depth (top-level run is depth 0).
    pub max_call_depth: u32,
    /// Default attempt count for the retry block step.
    pub retry_block_attempts: u32,
    /// Default fixed delay between retry block attempts (no backoff growth).
    pub retry_block_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_step_retries: 3,
            retry_base_delay: Duration::from_millis(500),
            max_call_depth: 10,
            retry_block_attempts: 3,
            retry_block_delay: Duration::from_millis(1000),
        }
    }
}

// ---------------------------------------------------------------------------
// Run outcome
// ---------------------------------------------------------------------------

/// Terminal classification of a run. Exactly one per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Completed, including early termination via the stop step.
    Success,
    /// A step or nested call failed and retries (if any) were exhausted.
    Failed,
    /// The shared cancellation cell was set and observed at a checkpoint.
    Cancelled,
}

/// Final report for one run: classification, message, and the full ordered
/// event log for diagnosis.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub status: RunStatus,
    /// Stop message on success, error message on failure, fixed text when
    /// cancelled.
    pub message: Option<String>,
    pub events: Vec<RunEvent>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Per-run inputs supplied by the caller.
#[derive(Default)]
pub struct RunOptions {
    /// Top-level call parameters.
    pub params: HashMap<String, String>,
    /// LLM configuration for generate/classify steps.
    pub llm: Option<LlmConfig>,
    /// User context blocks prepended to LLM prompts.
    pub user_contexts: Vec<String>,
    /// Repo-path table for `{{_repo:org/repo}}` interpolation.
    pub repos: HashMap<String, String>,
    /// Optional synchronous event sink.
    pub sink: Option<EventSink>,
}

// ---------------------------------------------------------------------------
// WorkflowEngine
// ---------------------------------------------------------------------------

/// Drives workflow definitions through the step-execution state machine.
pub struct WorkflowEngine {
    pub(crate) registry: Arc<WorkflowRegistry>,
    pub(crate) browser: Option<Arc<dyn BrowserTransport>>,
    pub(crate) llm: Arc<dyn LlmBackend>,
    pub(crate) shell: Arc<dyn ShellRunner>,
    pub(crate) config: EngineConfig,
    /// Live cancellation cells keyed by run id.
    cancellations: DashMap<Uuid, CancellationToken>,
}

impl WorkflowEngine {
    /// Create an engine over the given collaborators.
    pub fn new(
        registry: Arc<WorkflowRegistry>,
        browser: Option<Arc<dyn BrowserTransport>>,
        llm: Arc<dyn LlmBackend>,
        shell: Arc<dyn ShellRunner>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            browser,
            llm,
            shell,
            config,
            cancellations: DashMap::new(),
        }
    }

    /// Run a workflow to completion under a fresh run id.
    pub async fn run(&self, workflow_id: &str, options: RunOptions) -> RunReport {
        self.run_with_id(Uuid::now_v7(), workflow_id, options).await
    }

    /// Run a workflow under a caller-chosen run id, so the caller can
    /// [`cancel`](Self::cancel) it while in flight.
    pub async fn run_with_id(
        &self,
        run_id: Uuid,
        workflow_id: &str,
        options: RunOptions,
    ) -> RunReport {
        let started_at = Utc::now();
        let token = CancellationToken::new();
        self.cancellations.insert(run_id, token.clone());

        let report = match self.registry.resolve(workflow_id) {
            None => {
                let message = EngineError::WorkflowNotFound(workflow_id.to_string()).to_string();
                RunReport {
                    run_id,
                    status: RunStatus::Failed,
                    message: Some(message.clone()),
                    events: vec![RunEvent::Error { message, depth: 0 }],
                    started_at,
                    finished_at: Utc::now(),
                }
            }
            Some(workflow) => {
                let mut ctx = ExecutionContext::new(
                    run_id,
                    options.llm.unwrap_or_else(LlmConfig::local),
                    options.user_contexts,
                    options.repos,
                    token,
                    options.sink,
                );
                ctx.params.extend(options.params);
                ctx.call_stack.push(workflow.id.clone());

                tracing::info!(
                    run_id = %run_id,
                    workflow = workflow.id.as_str(),
                    "starting workflow run"
                );

                let outcome = self.run_workflow(workflow, &mut ctx).await;
                let (status, message) = match outcome {
                    Ok(message) => (RunStatus::Success, message),
                    Err(EngineError::Cancelled) => {
                        (RunStatus::Cancelled, Some(EngineError::Cancelled.to_string()))
                    }
                    Err(error) => (RunStatus::Failed, Some(error.to_string())),
                };

                RunReport {
                    run_id,
                    status,
                    message,
                    events: ctx.into_events(),
                    started_at,
                    finished_at: Utc::now(),
                }
            }
        };

        self.cancellations.remove(&run_id);
        report
    }

    /// Request cancellation of an in-flight run.
    ///
    /// The run aborts at its next checkpoint (before the next step or retry
    /// attempt); a suspended network call already in flight is allowed to
    /// finish first. Returns false if the run id is unknown or already done.
    pub fn cancel(&self, run_id: Uuid) -> bool {
        match self.cancellations.get(&run_id) {
            Some(token) => {
                token.cancel();
                tracing::info!(run_id = %run_id, "cancellation requested");
                true
            }
            None => false,
        }
    }
}
