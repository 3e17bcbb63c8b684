//! Shell and terminal step handlers.

use weft_types::error::EngineError;

use crate::engine::WorkflowEngine;
use crate::engine::context::ExecutionContext;

use super::StepSuccess;

impl WorkflowEngine {
    pub(crate) async fn step_shell(
        &self,
        command: &str,
        variable: Option<&str>,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let command = ctx.interpolate(command);
        let output = self.shell.run(&command).await?;
        if let Some(variable) = variable {
            ctx.variables.insert(variable.to_string(), output.clone());
        }
        Ok(StepSuccess::with_result(output))
    }

    pub(crate) async fn step_terminal(
        &self,
        command: &str,
        session: &str,
        variable: Option<&str>,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let command = ctx.interpolate(command);
        let session = ctx.interpolate(session);
        let output = self.shell.run_in_session(&session, &command).await?;
        if let Some(variable) = variable {
            ctx.variables.insert(variable.to_string(), output.clone());
        }
        Ok(StepSuccess::with_result(output))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
