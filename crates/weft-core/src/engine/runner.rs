//! Workflow-level run state machine.
//!
//! Wraps the step-sequence runner with lifecycle events and final outcome
//! classification. A successful classification (including stop) returns
//! normally; a failed one re-raises so a nested caller sees the error.

use weft_types::error::EngineError;
use weft_types::event::{LogLevel, RunEvent};
use weft_types::workflow::WorkflowDefinition;

use super::WorkflowEngine;
use super::context::ExecutionContext;
use super::steps::contains_browser_steps;

impl WorkflowEngine {
    /// Execute one workflow invocation level.
    ///
    /// Returns the run's output message on success (`Some` only when a stop
    /// step set one). Cancellation and failures propagate as errors.
    pub(crate) async fn run_workflow(
        &self,
        workflow: &WorkflowDefinition,
        ctx: &mut ExecutionContext,
    ) -> Result<Option<String>, EngineError> {
        // The run id identifies the whole tree; nested start events omit it.
        let run_id = (ctx.depth == 0).then_some(ctx.run_id);
        ctx.emit(RunEvent::WorkflowStarted {
            workflow: workflow.id.clone(),
            run_id,
            depth: ctx.depth,
        });

        ctx.allowed_domains = workflow.allowed_domains.clone();

        if ctx.depth == 0 {
            self.focus_browser_if_needed(workflow, ctx).await;
        }

        let result = self.run_steps(&workflow.steps, ctx).await;

        let (success, message, outcome) = match result {
            Ok(()) => {
                let message = ctx.output_message().map(str::to_string);
                (true, message.clone(), Ok(message))
            }
            Err(EngineError::Stopped { message }) => {
                let message = message.or_else(|| ctx.output_message().map(str::to_string));
                (true, message.clone(), Ok(message))
            }
            Err(EngineError::Cancelled) => (
                false,
                Some(EngineError::Cancelled.to_string()),
                Err(EngineError::Cancelled),
            ),
            Err(error) => (false, Some(error.to_string()), Err(error)),
        };

        ctx.emit(RunEvent::WorkflowFinished {
            workflow: workflow.id.clone(),
            success,
            message,
            depth: ctx.depth,
        });

        outcome
    }

    /// Bring the automation surface forward before a browser-driving run.
    ///
    /// Only attempted at depth 0 when the workflow (recursively) contains
    /// browser steps and a connected transport is attached. Focus failure is
    /// a warning, never fatal.
    async fn focus_browser_if_needed(
        &self,
        workflow: &WorkflowDefinition,
        ctx: &mut ExecutionContext,
    ) {
        if !contains_browser_steps(&workflow.steps) {
            return;
        }
        let Some(browser) = &self.browser else {
            return;
        };
        if !browser.is_connected() {
            return;
        }
        if let Err(error) = browser.focus().await {
            ctx.log(
                LogLevel::Warn,
                format!("failed to focus browser window: {error}"),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
