//! Step dispatch and per-kind handlers.
//!
//! `run_step` maps a step's declared kind to its handler. Handlers are
//! grouped by family: `browser`, `shell`, `llm`, `control` (if, retry,
//! stop, nested call), and `data`. The control-flow handlers re-enter the
//! step-sequence runner and manage their own scoping, so the automatic
//! retry wrapper skips them (see [`owns_control_flow`]).

pub mod browser;
pub mod control;
pub mod data;
pub mod llm;
pub mod shell;

use weft_types::error::EngineError;
use weft_types::workflow::Step;

use super::WorkflowEngine;
use super::context::ExecutionContext;

/// Successful handler outcome: an optional trailing message plus the last
/// result the handler recorded (extract text, shell output, LLM response).
#[derive(Debug, Default)]
pub struct StepSuccess {
    pub message: Option<String>,
    pub last_result: Option<String>,
}

impl StepSuccess {
    /// Plain success with nothing to report.
    pub fn done() -> Self {
        Self::default()
    }

    /// Success carrying a recorded result value.
    pub fn with_result(result: impl Into<String>) -> Self {
        Self {
            message: None,
            last_result: Some(result.into()),
        }
    }

    /// Success carrying a trailing message.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            last_result: None,
        }
    }
}

/// Whether a step kind owns its own retry/branching semantics.
///
/// These kinds are exempt from the automatic retry wrapper: re-wrapping
/// them would double-retry their nested content.
pub fn owns_control_flow(step: &Step) -> bool {
    matches!(
        step,
        Step::If { .. } | Step::Retry { .. } | Step::Call { .. }
    )
}

/// Whether a step subtree contains any browser operation, looking through
/// `if`/`retry` bodies. Nested calls are not inspected -- the callee's own
/// run handles its focus needs.
pub fn contains_browser_steps(steps: &[Step]) -> bool {
    steps.iter().any(|step| match step {
        Step::Navigate { .. }
        | Step::Click { .. }
        | Step::Type { .. }
        | Step::Scroll { .. }
        | Step::Extract { .. }
        | Step::ExtractAll { .. }
        | Step::Wait { .. }
        | Step::Exists { .. }
        | Step::Hover { .. }
        | Step::Key { .. } => true,
        Step::If {
            then_steps,
            else_steps,
            ..
        } => contains_browser_steps(then_steps) || contains_browser_steps(else_steps),
        Step::Retry { steps, .. } => contains_browser_steps(steps),
        _ => false,
    })
}

impl WorkflowEngine {
    /// Dispatch one step to its handler.
    pub(crate) async fn run_step(
        &self,
        step: &Step,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        tracing::debug!(kind = step.kind_name(), depth = ctx.depth, "dispatching step");
        match step {
            Step::Navigate { url } => self.step_navigate(url, ctx).await,
            Step::Click { selector } => self.step_click(selector, ctx).await,
            Step::Type {
                selector,
                text,
                submit,
            } => self.step_type(selector, text, *submit, ctx).await,
            Step::Scroll { direction, amount } => self.step_scroll(*direction, *amount, ctx).await,
            Step::Extract { selector, variable } => {
                self.step_extract(selector, variable, ctx).await
            }
            Step::ExtractAll {
                selector,
                variable,
                separator,
            } => self.step_extract_all(selector, variable, separator, ctx).await,
            Step::Wait {
                selector,
                timeout_ms,
            } => self.step_wait(selector, *timeout_ms, ctx).await,
            Step::Exists {
                selector,
                variable,
                timeout_ms,
            } => self.step_exists(selector, variable, *timeout_ms, ctx).await,
            Step::Hover { selector } => self.step_hover(selector, ctx).await,
            Step::Key { key, selector } => self.step_key(key, selector.as_deref(), ctx).await,

            Step::Shell { command, variable } => {
                self.step_shell(command, variable.as_deref(), ctx).await
            }
            Step::Terminal {
                command,
                session,
                variable,
            } => {
                self.step_terminal(command, session, variable.as_deref(), ctx)
                    .await
            }

            Step::Generate {
                prompt,
                variable,
                model,
            } => {
                self.step_generate(prompt, variable, model.as_deref(), ctx)
                    .await
            }
            Step::Classify {
                input,
                classes,
                variable,
            } => self.step_classify(input, classes, variable, ctx).await,

            Step::If {
                condition,
                then_steps,
                else_steps,
            } => self.step_if(condition, then_steps, else_steps, ctx).await,
            Step::Retry {
                steps,
                max_attempts,
                delay_ms,
            } => self.step_retry(steps, *max_attempts, *delay_ms, ctx).await,
            Step::Stop { message } => self.step_stop(message.as_deref(), ctx),
            Step::Call {
                workflow,
                alias,
                params,
            } => self.step_call(workflow, alias.as_deref(), params, ctx).await,

            Step::SetVariable { name, value } => self.step_set_variable(name, value, ctx),
            Step::First { from, variable } => self.step_first(from, variable, ctx),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
