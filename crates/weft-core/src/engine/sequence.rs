//! Step-sequence runner.
//!
//! Executes an ordered step list with cancellation checkpoints, automatic
//! retry-with-backoff for transient failures, and the step-start/step-end
//! event protocol. Exactly one start/end pair is emitted per attempted step
//! no matter how many retry attempts happen inside it; retries are visible
//! only as intermediate log lines.
//!
//! The stop signal is the one way a sequence ends early while still counting
//! as success: the stop step's error variant propagates upward (so enclosing
//! sequences also unwind) and the workflow runner converts it to a
//! successful classification.

use weft_types::error::EngineError;
use weft_types::event::{LogLevel, RunEvent};
use weft_types::workflow::Step;

use super::WorkflowEngine;
use super::context::ExecutionContext;
use super::steps::{StepSuccess, owns_control_flow};

impl WorkflowEngine {
    /// Run an ordered list of steps against a context.
    ///
    /// `Err(Stopped)` is successful early termination; every other error is
    /// a failure that aborts the sequence.
    pub(crate) async fn run_steps(
        &self,
        steps: &[Step],
        ctx: &mut ExecutionContext,
    ) -> Result<(), EngineError> {
        for (index, step) in steps.iter().enumerate() {
            // Checkpoint: no partial step is attempted once cancelled.
            if ctx.is_cancelled() {
                ctx.log(LogLevel::Warn, "cancellation requested, aborting sequence");
                return Err(EngineError::Cancelled);
            }

            ctx.emit(RunEvent::StepStarted {
                index,
                kind: step.kind_name().to_string(),
                detail: step.summary(),
                depth: ctx.depth,
            });

            // Control-flow steps own their retry/branch semantics; wrapping
            // them again would double-retry nested content.
            let result = if owns_control_flow(step) {
                self.run_step(step, ctx).await
            } else {
                self.run_step_with_retry(step, ctx).await
            };

            match result {
                Ok(StepSuccess {
                    message,
                    last_result,
                }) => {
                    ctx.emit(RunEvent::StepFinished {
                        index,
                        success: true,
                        message,
                        last_result,
                        depth: ctx.depth,
                    });
                }
                Err(EngineError::Stopped { message }) => {
                    ctx.emit(RunEvent::StepFinished {
                        index,
                        success: true,
                        message: message.clone(),
                        last_result: None,
                        depth: ctx.depth,
                    });
                    return Err(EngineError::Stopped { message });
                }
                Err(error) => {
                    ctx.emit(RunEvent::StepFinished {
                        index,
                        success: false,
                        message: Some(error.to_string()),
                        last_result: None,
                        depth: ctx.depth,
                    });
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    /// Automatic retry wrapper for steps without their own control flow.
    ///
    /// Up to `max_step_retries` re-attempts with linearly growing delay
    /// (`base * n` before the n-th retry). Non-retryable classifications
    /// propagate on first occurrence with zero delay; cancellation is
    /// checked before every attempt.
    async fn run_step_with_retry(
        &self,
        step: &Step,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let mut failures: u32 = 0;
        loop {
            if ctx.is_cancelled() {
                return Err(EngineError::Cancelled);
            }

            match self.run_step(step, ctx).await {
                Ok(success) => return Ok(success),
                Err(error) if !error.is_retryable() => return Err(error),
                Err(error) => {
                    failures += 1;
                    if failures > self.config.max_step_retries {
                        return Err(EngineError::RetryExhausted {
                            attempts: failures,
                            last_error: error.to_string(),
                        });
                    }
                    ctx.log(
                        LogLevel::Warn,
                        format!(
                            "step '{}' failed (attempt {failures}), retrying: {error}",
                            step.kind_name()
                        ),
                    );
                    tokio::time::sleep(self.config.retry_base_delay * failures).await;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
