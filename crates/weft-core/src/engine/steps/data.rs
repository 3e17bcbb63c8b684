//! Variable assignment handlers.

use weft_types::error::EngineError;

use crate::engine::WorkflowEngine;
use crate::engine::context::ExecutionContext;

use super::StepSuccess;

impl WorkflowEngine {
    pub(crate) fn step_set_variable(
        &self,
        name: &str,
        value: &str,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let value = ctx.interpolate(value);
        ctx.variables.insert(name.to_string(), value.clone());
        Ok(StepSuccess::with_result(value))
    }

    /// Store the first candidate that interpolates to non-whitespace text.
    /// All candidates empty leaves the variable set to the empty string.
    pub(crate) fn step_first(
        &self,
        from: &[String],
        variable: &str,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let value = from
            .iter()
            .map(|candidate| ctx.interpolate(candidate))
            .find(|value| !value.trim().is_empty())
            .unwrap_or_default();
        ctx.variables.insert(variable.to_string(), value.clone());
        Ok(StepSuccess::with_result(value))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
