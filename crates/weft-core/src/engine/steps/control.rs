//! Control-flow step handlers: if, retry block, stop, nested call.
//!
//! These handlers re-enter the step-sequence runner (boxed, since the
//! recursion goes through an async fn cycle) and are exempt from the
//! automatic retry wrapper. The nested-call handler owns the depth and
//! cycle guards, child-context derivation, and the namespaced variable
//! flow-back.

use std::collections::HashMap;
use std::time::Duration;

use weft_types::error::EngineError;
use weft_types::event::LogLevel;

use crate::engine::WorkflowEngine;
use crate::engine::context::ExecutionContext;
use crate::engine::interpolate::evaluate_condition;

use super::StepSuccess;

impl WorkflowEngine {
    pub(crate) async fn step_if(
        &self,
        condition: &str,
        then_steps: &[weft_types::workflow::Step],
        else_steps: &[weft_types::workflow::Step],
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let interpolated = ctx.interpolate(condition);
        let outcome = evaluate_condition(&interpolated);
        ctx.log(
            LogLevel::Info,
            format!("condition '{interpolated}' evaluated to {outcome}"),
        );

        let branch = if outcome { then_steps } else { else_steps };
        Box::pin(self.run_steps(branch, ctx)).await?;
        Ok(StepSuccess::with_message(format!(
            "took {} branch",
            if outcome { "then" } else { "else" }
        )))
    }

    /// Re-run an embedded sequence until it succeeds, with a fixed delay
    /// between attempts (no backoff growth, unlike the automatic per-step
    /// wrapper).
    pub(crate) async fn step_retry(
        &self,
        steps: &[weft_types::workflow::Step],
        max_attempts: Option<u32>,
        delay_ms: Option<u64>,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let attempts = max_attempts.unwrap_or(self.config.retry_block_attempts).max(1);
        let delay = delay_ms
            .map(Duration::from_millis)
            .unwrap_or(self.config.retry_block_delay);

        let mut attempt = 1;
        loop {
            if ctx.is_cancelled() {
                return Err(EngineError::Cancelled);
            }

            match Box::pin(self.run_steps(steps, ctx)).await {
                Ok(()) => {
                    return Ok(StepSuccess::with_message(format!(
                        "succeeded on attempt {attempt}"
                    )));
                }
                // Terminal signals pass straight through the block.
                Err(error @ (EngineError::Stopped { .. } | EngineError::Cancelled)) => {
                    return Err(error);
                }
                Err(error) if attempt >= attempts => return Err(error),
                Err(error) => {
                    ctx.log(
                        LogLevel::Warn,
                        format!(
                            "retry block attempt {attempt}/{attempts} failed: {error}"
                        ),
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    pub(crate) fn step_stop(
        &self,
        message: Option<&str>,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let message = message.map(|m| ctx.interpolate(m));
        if let Some(message) = &message {
            ctx.set_output_message(message.clone());
        }
        ctx.log(LogLevel::Info, "stop requested, terminating workflow");
        Err(EngineError::Stopped { message })
    }

    /// Invoke another workflow in a child context.
    ///
    /// Guards run before resolution: a call that would nest too deep or
    /// close a cycle fails without touching the registry. On success the
    /// child's variables flow back under `alias.` (or the target id when no
    /// alias is given); the child's event log is merged contiguously either
    /// way, so failed nested runs remain diagnosable.
    pub(crate) async fn step_call(
        &self,
        workflow: &str,
        alias: Option<&str>,
        params: &HashMap<String, String>,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        if ctx.depth >= self.config.max_call_depth {
            return Err(EngineError::MaxDepthExceeded {
                max: self.config.max_call_depth,
                chain: ctx.call_chain(workflow),
            });
        }
        if ctx.call_stack.iter().any(|id| id == workflow) {
            return Err(EngineError::CircularCall {
                workflow: workflow.to_string(),
                chain: ctx.call_chain(workflow),
            });
        }
        let Some(definition) = self.registry.resolve(workflow) else {
            return Err(EngineError::WorkflowNotFound(workflow.to_string()));
        };

        let mut child = ctx.child();
        child.call_stack.push(workflow.to_string());
        for (name, value) in params {
            child.params.insert(name.clone(), ctx.interpolate(value));
        }

        ctx.log(
            LogLevel::Info,
            format!("calling nested workflow '{workflow}'"),
        );
        let result = Box::pin(self.run_workflow(definition, &mut child)).await;

        match result {
            Ok(message) => {
                let prefix = alias.unwrap_or(workflow);
                let variables = std::mem::take(&mut child.variables);
                for (name, value) in variables {
                    ctx.variables.insert(format!("{prefix}.{name}"), value);
                }
                ctx.merge_child_events(child);
                Ok(StepSuccess {
                    message,
                    last_result: None,
                })
            }
            // Cancellation is a run-level signal, never a call failure.
            Err(EngineError::Cancelled) => {
                ctx.merge_child_events(child);
                Err(EngineError::Cancelled)
            }
            Err(error) => {
                ctx.merge_child_events(child);
                Err(EngineError::NestedCall {
                    workflow: workflow.to_string(),
                    source: Box::new(error),
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
