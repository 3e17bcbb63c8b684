//! LLM step handlers.
//!
//! `generate` assembles the final prompt from the run's user context blocks
//! plus the interpolated step prompt. `classify` wraps the backend in a
//! constrained-output prompt and normalizes the response back onto the
//! declared class list; a response that names no class is a retryable LLM
//! failure, since re-sampling may well produce a usable answer.

use weft_types::error::EngineError;
use weft_types::event::LogLevel;

use crate::engine::WorkflowEngine;
use crate::engine::context::ExecutionContext;

use super::StepSuccess;

impl WorkflowEngine {
    pub(crate) async fn step_generate(
        &self,
        prompt: &str,
        variable: &str,
        model: Option<&str>,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let prompt = assemble_prompt(&ctx.user_contexts, &ctx.interpolate(prompt));
        let config = match model {
            Some(model) => ctx.llm.clone().with_model(model),
            None => ctx.llm.clone(),
        };

        let response = self.llm.generate(&prompt, &config).await?;
        ctx.variables.insert(variable.to_string(), response.clone());
        Ok(StepSuccess::with_result(response))
    }

    pub(crate) async fn step_classify(
        &self,
        input: &str,
        classes: &[String],
        variable: &str,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let input = ctx.interpolate(input);
        let prompt = format!(
            "Classify the following input into exactly one of these categories: {}.\n\
             Respond with only the category name, nothing else.\n\nInput:\n{input}",
            classes.join(", ")
        );

        let response = self.llm.generate(&prompt, &ctx.llm).await?;
        let Some(class) = match_class(&response, classes) else {
            return Err(EngineError::Llm(format!(
                "classification response '{}' names none of the expected classes",
                response.trim()
            )));
        };

        ctx.log(LogLevel::Info, format!("classified input as '{class}'"));
        ctx.variables.insert(variable.to_string(), class.clone());
        Ok(StepSuccess::with_result(class))
    }
}

/// Prepend the run's user context blocks to a prompt.
fn assemble_prompt(user_contexts: &[String], prompt: &str) -> String {
    if user_contexts.is_empty() {
        return prompt.to_string();
    }
    let mut parts: Vec<&str> = user_contexts.iter().map(String::as_str).collect();
    parts.push(prompt);
    parts.join("\n\n")
}

/// Map a free-form model response onto the declared class list.
///
/// An exact (case-insensitive, trimmed) match wins; otherwise the first
/// class the response mentions as a whole word -- boundary-checked, so
/// class "no" does not fire inside "cannot". The returned value is always
/// the declared spelling, never the model's.
fn match_class(response: &str, classes: &[String]) -> Option<String> {
    let normalized = response.trim().to_lowercase();
    if let Some(exact) = classes.iter().find(|c| c.to_lowercase() == normalized) {
        return Some(exact.clone());
    }
    classes
        .iter()
        .find(|c| contains_word(&normalized, &c.to_lowercase()))
        .cloned()
}

/// Whether `needle` occurs in `haystack` bounded by non-alphanumeric
/// characters (or the ends of the string) on both sides.
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let mut from = 0;
    while let Some(offset) = haystack[from..].find(needle) {
        let start = from + offset;
        let end = start + needle.len();
        let open = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let closed = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        if open && closed {
            return true;
        }
        from = end;
    }
    false
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
